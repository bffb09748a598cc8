// Copyright (c) 2025 - Cowboy AI, Inc.
//! Order Store Abstraction
//!
//! Event storage for orders plus the promo-code table whose usage counters
//! must change in the same transaction as the order.
//!
//! # Architecture
//!
//! ```text
//! Command → Aggregate → Events → OrderStore → Persistent Storage
//!                                    ↓
//!                              promo usage (same transaction)
//! ```
//!
//! # Store Requirements
//!
//! 1. **Append-Only**: Events are never updated or deleted
//! 2. **Ordered**: Events keep their sequence within an order
//! 3. **Optimistic Concurrency**: Appends carry the expected version
//! 4. **Atomic**: Events and promo usage changes commit together or not at all
//!
//! # Example
//!
//! ```rust
//! use photo_order_engine::event_store::{InMemoryOrderStore, OrderStore};
//! use photo_order_engine::domain::OrderId;
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryOrderStore::new();
//! assert_eq!(store.get_version(OrderId::new()).await.unwrap(), 0);
//! # });
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{OrderId, OrderNumber, PromoCode, Promocode, UserId};
use crate::events::OrderEvent;

pub mod memory;

pub use memory::InMemoryOrderStore;

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by an [`OrderStore`]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Someone else appended first
    #[error("Version conflict on order {order_id}: expected {expected}, found {actual}")]
    VersionConflict {
        order_id: OrderId,
        expected: u64,
        actual: u64,
    },

    #[error("Order number {0} is already taken")]
    DuplicateOrderNumber(OrderNumber),

    #[error("Promo code {0} not found")]
    PromoNotFound(PromoCode),

    /// Usage cap was reached by a concurrent application
    #[error("Promo code {code} reached its usage limit of {max_uses}")]
    PromoExhausted { code: PromoCode, max_uses: u32 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Worth retrying the whole load-decide-append cycle
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::VersionConflict { .. } | StoreError::Unavailable(_)
        )
    }
}

/// Promo usage changes committed with an append
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromoUsage {
    /// Increment usage, failing if the cap was reached meanwhile
    pub consume: Option<PromoCode>,
    /// Give one use back (saturating)
    pub release: Option<PromoCode>,
}

impl PromoUsage {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.consume.is_none() && self.release.is_none()
    }
}

/// Event envelope as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub order_id: OrderId,

    /// Position in the order stream, starting at 1
    pub sequence: u64,

    /// When the store accepted the event
    pub recorded_at: DateTime<Utc>,

    /// Event type name, matches the serde tag
    pub event_type: String,

    pub data: OrderEvent,
}

/// Order event store with a transactional promo table
///
/// Implementations must make `append` atomic: the version check, the
/// order-number uniqueness check, the promo usage changes and the event
/// writes succeed or fail together.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Append events to an order stream
    ///
    /// # Arguments
    ///
    /// * `order_id` - The order these events belong to
    /// * `events` - Events to append, in order
    /// * `expected_version` - Number of events the caller folded (0 for a new order)
    /// * `promo_usage` - Usage counter changes committed with the events
    ///
    /// # Returns
    ///
    /// The new version after appending events
    ///
    /// # Errors
    ///
    /// - `VersionConflict` if `expected_version` doesn't match
    /// - `DuplicateOrderNumber` if an `OrderCreated` reuses a number
    /// - `PromoNotFound` / `PromoExhausted` for the promo being consumed
    async fn append(
        &self,
        order_id: OrderId,
        events: Vec<OrderEvent>,
        expected_version: u64,
        promo_usage: PromoUsage,
    ) -> StoreResult<u64>;

    /// Read all events for an order in sequence order
    async fn read_events(&self, order_id: OrderId) -> StoreResult<Vec<StoredEvent>>;

    /// Number of events stored for an order, 0 if none
    async fn get_version(&self, order_id: OrderId) -> StoreResult<u64>;

    /// Orders owned by a user, oldest first
    async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<OrderId>>;

    async fn find_by_number(&self, number: &OrderNumber) -> StoreResult<Option<OrderId>>;

    /// Look up a promo code (already normalised)
    async fn get_promocode(&self, code: &PromoCode) -> StoreResult<Option<Promocode>>;

    /// Insert or replace a promo code record
    async fn save_promocode(&self, promo: Promocode) -> StoreResult<()>;
}
