// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Order Store
//!
//! Keeps events in their serialized JSON form, so every read goes through the
//! same serde round trip a durable store would. A single mutex makes each
//! append one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

use super::{OrderStore, PromoUsage, StoreError, StoreResult, StoredEvent};
use crate::domain::{OrderId, OrderNumber, PromoCode, Promocode, UserId};
use crate::events::OrderEvent;

#[derive(Debug, Clone)]
struct StoredRecord {
    event_id: Uuid,
    sequence: u64,
    recorded_at: DateTime<Utc>,
    event_type: String,
    payload: serde_json::Value,
}

#[derive(Debug, Default)]
struct Inner {
    streams: HashMap<OrderId, Vec<StoredRecord>>,
    user_orders: HashMap<UserId, Vec<OrderId>>,
    numbers: HashMap<OrderNumber, OrderId>,
    promos: HashMap<PromoCode, Promocode>,
}

/// Order store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: Mutex<Inner>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with promo codes
    pub fn with_promocodes(promos: impl IntoIterator<Item = Promocode>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for promo in promos {
                inner.promos.insert(promo.code.clone(), promo);
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn append(
        &self,
        order_id: OrderId,
        events: Vec<OrderEvent>,
        expected_version: u64,
        promo_usage: PromoUsage,
    ) -> StoreResult<u64> {
        let mut inner = self.lock();

        let actual = inner.streams.get(&order_id).map(Vec::len).unwrap_or(0) as u64;
        if actual != expected_version {
            return Err(StoreError::VersionConflict {
                order_id,
                expected: expected_version,
                actual,
            });
        }

        let mut created = Vec::new();
        for event in &events {
            if let OrderEvent::OrderCreated(e) = event {
                if inner.numbers.contains_key(&e.order_number) {
                    return Err(StoreError::DuplicateOrderNumber(e.order_number.clone()));
                }
                created.push((e.user_id, e.order_number.clone()));
            }
        }

        if let Some(code) = &promo_usage.consume {
            let promo = inner
                .promos
                .get(code)
                .ok_or_else(|| StoreError::PromoNotFound(code.clone()))?;
            if promo.is_exhausted() {
                return Err(StoreError::PromoExhausted {
                    code: code.clone(),
                    max_uses: promo.max_uses.unwrap_or(0),
                });
            }
        }

        let recorded_at = Utc::now();
        let records = events
            .iter()
            .zip(actual + 1..)
            .map(|(event, sequence)| {
                Ok(StoredRecord {
                    event_id: event.metadata().event_id,
                    sequence,
                    recorded_at,
                    event_type: event.event_type().to_string(),
                    payload: serde_json::to_value(event)?,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        // Nothing below can fail
        if let Some(code) = promo_usage.consume {
            if let Some(promo) = inner.promos.get_mut(&code) {
                promo.current_uses += 1;
            }
        }
        if let Some(code) = promo_usage.release {
            match inner.promos.get_mut(&code) {
                Some(promo) => promo.current_uses = promo.current_uses.saturating_sub(1),
                None => debug!("Released promo code {} is no longer stored", code),
            }
        }
        for (user_id, number) in created {
            inner.numbers.insert(number, order_id);
            inner.user_orders.entry(user_id).or_default().push(order_id);
        }

        let stream = inner.streams.entry(order_id).or_default();
        stream.extend(records);
        Ok(stream.len() as u64)
    }

    async fn read_events(&self, order_id: OrderId) -> StoreResult<Vec<StoredEvent>> {
        let records = self
            .lock()
            .streams
            .get(&order_id)
            .cloned()
            .unwrap_or_default();

        records
            .into_iter()
            .map(|record| {
                Ok(StoredEvent {
                    event_id: record.event_id,
                    order_id,
                    sequence: record.sequence,
                    recorded_at: record.recorded_at,
                    event_type: record.event_type,
                    data: serde_json::from_value(record.payload)?,
                })
            })
            .collect()
    }

    async fn get_version(&self, order_id: OrderId) -> StoreResult<u64> {
        Ok(self
            .lock()
            .streams
            .get(&order_id)
            .map(Vec::len)
            .unwrap_or(0) as u64)
    }

    async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<OrderId>> {
        Ok(self
            .lock()
            .user_orders
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_by_number(&self, number: &OrderNumber) -> StoreResult<Option<OrderId>> {
        Ok(self.lock().numbers.get(number).copied())
    }

    async fn get_promocode(&self, code: &PromoCode) -> StoreResult<Option<Promocode>> {
        Ok(self.lock().promos.get(code).cloned())
    }

    async fn save_promocode(&self, promo: Promocode) -> StoreResult<()> {
        self.lock().promos.insert(promo.code.clone(), promo);
        Ok(())
    }
}
