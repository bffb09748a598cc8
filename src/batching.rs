// Copyright (c) 2025 - Cowboy AI, Inc.
//! Upload Batch Coalescer
//!
//! A user who sends an album of photos should get one confirmation, not one
//! per photo. Each burst key holds a counter and a single pending delayed
//! action:
//!
//! ```text
//! upload → count += 1 → abort pending action → schedule new action(delay)
//!                                                   ↓ (delay elapses)
//!                              read count, read order total, emit, clear key
//! ```
//!
//! Every rescheduling bumps the key's generation. A fired action only emits
//! if its generation is still current, so a superseded action never emits
//! even if it was already past its sleep when aborted. Once an action has
//! removed its entry it owns the confirmation and a new upload starts a
//! fresh burst. The order total is read with retries; if it stays
//! unavailable the confirmation still goes out, carrying the burst count.

use async_trait::async_trait;
use backon::Retryable;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RetrySettings;
use crate::domain::{OrderId, UserId};
use crate::errors::{OrderError, OrderResult};

/// Grouping key for a burst of uploads
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BurstKey {
    /// Photos sent together as one album
    Album(String),
    /// Single photos from one user
    User(UserId),
}

impl BurstKey {
    /// Album id when present, otherwise the user
    pub fn for_upload(album_id: Option<&str>, user_id: UserId) -> Self {
        match album_id {
            Some(album) => BurstKey::Album(album.to_string()),
            None => BurstKey::User(user_id),
        }
    }
}

impl fmt::Display for BurstKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BurstKey::Album(id) => write!(f, "album:{}", id),
            BurstKey::User(id) => write!(f, "user:{}", id),
        }
    }
}

/// One confirmation for a whole burst
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfirmation {
    pub key: BurstKey,
    pub order_id: OrderId,
    /// Uploads coalesced into this confirmation
    pub added_count: u32,
    /// Order's photo count when the confirmation fired
    pub total_photo_count: u32,
}

/// Where confirmations go (the chat layer)
#[async_trait]
pub trait ConfirmationSink: Send + Sync {
    async fn emit(&self, confirmation: BatchConfirmation);
}

/// Current photo count of an order
#[async_trait]
pub trait PhotoCountSource: Send + Sync {
    async fn photo_count(&self, order_id: OrderId) -> OrderResult<u32>;
}

/// Debounce delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub album_delay: Duration,
    pub single_delay: Duration,
    /// Retries for the order total read when a burst fires
    pub count_retry: RetrySettings,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            album_delay: Duration::from_millis(1500),
            single_delay: Duration::from_millis(800),
            count_retry: RetrySettings::default(),
        }
    }
}

impl BatchSettings {
    fn delay_for(&self, key: &BurstKey) -> Duration {
        match key {
            BurstKey::Album(_) => self.album_delay,
            BurstKey::User(_) => self.single_delay,
        }
    }
}

struct PendingBurst {
    count: u32,
    generation: u64,
    order_id: OrderId,
    handle: JoinHandle<()>,
}

type Bursts = Mutex<HashMap<BurstKey, PendingBurst>>;

/// Per-key debounced upload confirmations
pub struct UploadBatcher {
    bursts: Arc<Bursts>,
    counts: Arc<dyn PhotoCountSource>,
    sink: Arc<dyn ConfirmationSink>,
    settings: BatchSettings,
}

impl UploadBatcher {
    pub fn new(
        counts: Arc<dyn PhotoCountSource>,
        sink: Arc<dyn ConfirmationSink>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            bursts: Arc::new(Mutex::new(HashMap::new())),
            counts,
            sink,
            settings,
        }
    }

    /// Record an upload that was already added to `order_id`
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_photo_uploaded(&self, key: BurstKey, order_id: OrderId) {
        let delay = self.settings.delay_for(&key);
        let mut bursts = lock(&self.bursts);

        let (count, generation) = match bursts.remove(&key) {
            Some(pending) => {
                pending.handle.abort();
                (pending.count + 1, pending.generation + 1)
            }
            None => (1, 0),
        };
        debug!("Upload burst {} now has {} photo(s)", key, count);

        let handle = tokio::spawn(fire_after(
            delay,
            key.clone(),
            generation,
            self.settings.count_retry,
            Arc::clone(&self.bursts),
            Arc::clone(&self.counts),
            Arc::clone(&self.sink),
        ));

        bursts.insert(
            key,
            PendingBurst {
                count,
                generation,
                order_id,
                handle,
            },
        );
    }

    /// Number of bursts waiting to fire
    pub fn pending(&self) -> usize {
        lock(&self.bursts).len()
    }
}

impl Drop for UploadBatcher {
    fn drop(&mut self) {
        for (_, pending) in lock(&self.bursts).drain() {
            pending.handle.abort();
        }
    }
}

fn lock(bursts: &Bursts) -> MutexGuard<'_, HashMap<BurstKey, PendingBurst>> {
    bursts.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn fire_after(
    delay: Duration,
    key: BurstKey,
    generation: u64,
    retry: RetrySettings,
    bursts: Arc<Bursts>,
    counts: Arc<dyn PhotoCountSource>,
    sink: Arc<dyn ConfirmationSink>,
) {
    tokio::time::sleep(delay).await;

    let (added_count, order_id) = {
        let mut bursts = lock(&bursts);
        match bursts.get(&key) {
            Some(pending) if pending.generation == generation => {}
            _ => return,
        }
        match bursts.remove(&key) {
            Some(pending) => (pending.count, pending.order_id),
            None => return,
        }
    };

    let total = (|| counts.photo_count(order_id))
        .retry(retry.backoff())
        .when(OrderError::is_retryable)
        .notify(|e: &OrderError, delay: Duration| {
            debug!("Photo count for order {} failed, retrying in {:?}: {}", order_id, delay, e);
        })
        .await;

    let total_photo_count = match total {
        Ok(count) => count,
        Err(e) if e.is_not_found() => {
            debug!("Order {} is gone, dropping burst {}", order_id, key);
            return;
        }
        // the order holds at least the photos of this burst
        Err(e) => {
            warn!("Photo count for order {} unavailable: {}", order_id, e);
            added_count
        }
    };

    info!(
        "Upload burst {} confirmed: {} added, {} total",
        key, added_count, total_photo_count
    );
    sink.emit(BatchConfirmation {
        key,
        order_id,
        added_count,
        total_photo_count,
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FixedCount(AtomicU32);

    #[async_trait]
    impl PhotoCountSource for FixedCount {
        async fn photo_count(&self, _order_id: OrderId) -> OrderResult<u32> {
            Ok(self.0.load(Ordering::SeqCst))
        }
    }

    /// Fails transiently `failures` times, then reports `count`
    struct FlakyCount {
        failures: AtomicU32,
        count: u32,
    }

    #[async_trait]
    impl PhotoCountSource for FlakyCount {
        async fn photo_count(&self, _order_id: OrderId) -> OrderResult<u32> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(OrderError::Transient("store unavailable".to_string()));
            }
            Ok(self.count)
        }
    }

    #[derive(Default)]
    struct Collected(Mutex<Vec<BatchConfirmation>>);

    fn fast_retry() -> BatchSettings {
        BatchSettings {
            count_retry: RetrySettings {
                max_attempts: 3,
                min_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
            },
            ..BatchSettings::default()
        }
    }

    #[async_trait]
    impl ConfirmationSink for Collected {
        async fn emit(&self, confirmation: BatchConfirmation) {
            self.0.lock().unwrap().push(confirmation);
        }
    }

    #[test]
    fn test_burst_key_prefers_album() {
        assert_eq!(
            BurstKey::for_upload(Some("a1"), UserId(5)),
            BurstKey::Album("a1".to_string())
        );
        assert_eq!(BurstKey::for_upload(None, UserId(5)), BurstKey::User(UserId(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_upload_uses_single_delay() {
        let sink = Arc::new(Collected::default());
        let batcher = UploadBatcher::new(
            Arc::new(FixedCount(AtomicU32::new(1))),
            sink.clone(),
            BatchSettings::default(),
        );

        batcher.on_photo_uploaded(BurstKey::User(UserId(1)), OrderId::new());

        tokio::time::sleep(Duration::from_millis(799)).await;
        assert!(sink.0.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        let emitted = sink.0.lock().unwrap().clone();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].added_count, 1);
        assert_eq!(batcher.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_lookup_retried() {
        let sink = Arc::new(Collected::default());
        let source = FlakyCount {
            failures: AtomicU32::new(2),
            count: 12,
        };
        let batcher = UploadBatcher::new(Arc::new(source), sink.clone(), fast_retry());

        batcher.on_photo_uploaded(BurstKey::User(UserId(1)), OrderId::new());
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let emitted = sink.0.lock().unwrap().clone();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].total_photo_count, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_confirmed_when_count_unavailable() {
        let sink = Arc::new(Collected::default());
        let source = FlakyCount {
            failures: AtomicU32::new(u32::MAX),
            count: 12,
        };
        let batcher = UploadBatcher::new(Arc::new(source), sink.clone(), fast_retry());
        let key = BurstKey::Album("a1".to_string());

        batcher.on_photo_uploaded(key.clone(), OrderId::new());
        batcher.on_photo_uploaded(key, OrderId::new());
        tokio::time::sleep(Duration::from_millis(2000)).await;

        let emitted = sink.0.lock().unwrap().clone();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].added_count, 2);
        assert_eq!(emitted[0].total_photo_count, 2);
        assert_eq!(batcher.pending(), 0);
    }
}
