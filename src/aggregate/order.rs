// Copyright (c) 2025 - Cowboy AI, Inc.
//! Order Aggregate State
//!
//! Implements the event sourcing pattern with pure functions:
//!
//! ```text
//! Command → handle_command() → Result<Event, Error>
//!                                    ↓
//! Events → apply_event() → New State
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Amount, AppliedPromo, DeliveryDetails, OrderId, OrderNumber, Photo, PhotoId, UserId,
};
use crate::events::{CostSnapshot, OrderEvent};
use crate::pricing::PhotoCounts;
use crate::state_machine::{OrderStatus, StateInvariant};

/// Order state reconstructed from events
///
/// ```rust,ignore
/// let state = OrderState::from_events(&events);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderState {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: Option<OrderNumber>,
    pub status: OrderStatus,

    /// Photos in insertion order
    pub photos: Vec<Photo>,

    /// Position the next photo receives; never decreases
    pub next_position: u32,

    pub delivery: Option<DeliveryDetails>,
    pub photos_cost: Amount,
    pub delivery_cost: Amount,
    pub discount: Amount,
    pub promo: Option<AppliedPromo>,

    pub receipt_ref: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub manager_notes: Option<String>,

    /// When this aggregate was created (first event timestamp)
    pub created_at: Option<DateTime<Utc>>,

    /// When this aggregate was last modified (latest event timestamp)
    pub updated_at: Option<DateTime<Utc>>,

    /// Number of applied events
    pub version: u64,
}

impl OrderState {
    /// Empty state used as the fold seed
    pub fn default_for(id: OrderId) -> Self {
        Self {
            id,
            user_id: UserId(0),
            order_number: None,
            status: OrderStatus::Draft,
            photos: Vec::new(),
            next_position: 0,
            delivery: None,
            photos_cost: 0,
            delivery_cost: 0,
            discount: 0,
            promo: None,
            receipt_ref: None,
            paid_at: None,
            manager_notes: None,
            created_at: None,
            updated_at: None,
            version: 0,
        }
    }

    /// Reconstruct state from an event stream
    ///
    /// ```text
    /// State = fold(Events, InitialState, apply_event)
    /// ```
    pub fn from_events(events: &[OrderEvent]) -> Self {
        let id = events
            .first()
            .map(OrderEvent::order_id)
            .unwrap_or_default();

        events
            .iter()
            .fold(Self::default_for(id), apply_event)
    }

    pub fn is_initialized(&self) -> bool {
        self.created_at.is_some()
    }

    /// `photos_cost + delivery_cost - discount`, never stored
    pub fn total_cost(&self) -> Amount {
        self.costs().total()
    }

    pub fn costs(&self) -> CostSnapshot {
        CostSnapshot {
            photos_cost: self.photos_cost,
            delivery_cost: self.delivery_cost,
            discount: self.discount,
        }
    }

    pub fn photo_count(&self) -> u32 {
        self.photos.len() as u32
    }

    pub fn photo(&self, photo_id: PhotoId) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == photo_id)
    }

    /// Photo count per product, the pricing engine's input
    pub fn photo_counts(&self) -> PhotoCounts {
        let mut counts = PhotoCounts::new();
        for photo in &self.photos {
            *counts.entry(photo.product_id).or_default() += 1;
        }
        counts
    }

    /// Auto-crop confidence per photo, `None` where the classifier has not run
    pub fn crop_scores(&self) -> Vec<Option<f64>> {
        self.photos
            .iter()
            .map(|p| p.auto_crop.map(|crop| crop.confidence()))
            .collect()
    }

    pub fn photos_missing_auto_crop(&self) -> Vec<&Photo> {
        self.photos.iter().filter(|p| p.auto_crop.is_none()).collect()
    }
}

impl StateInvariant for OrderState {
    fn check_invariants(&self) -> Result<(), String> {
        if self.discount > self.photos_cost {
            return Err(format!(
                "discount {} exceeds photos cost {}",
                self.discount, self.photos_cost
            ));
        }
        if let Some(photo) = self.photos.iter().find(|p| p.position >= self.next_position) {
            return Err(format!(
                "photo {} has position {} but next position is {}",
                photo.id, photo.position, self.next_position
            ));
        }
        let paid_states = [
            OrderStatus::Paid,
            OrderStatus::Confirmed,
            OrderStatus::Printing,
            OrderStatus::Ready,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ];
        if paid_states.contains(&self.status) && self.paid_at.is_none() {
            return Err(format!("status {} without paid_at", self.status));
        }
        if self.promo.is_none() && self.discount > 0 {
            return Err("discount without promo code".to_string());
        }
        Ok(())
    }
}

fn with_costs(state: OrderState, costs: &CostSnapshot) -> OrderState {
    OrderState {
        photos_cost: costs.photos_cost,
        delivery_cost: costs.delivery_cost,
        discount: costs.discount,
        ..state
    }
}

/// Apply event to state (pure function)
///
/// # Invariants
/// - Function is pure (no side effects)
/// - Same event + same state = same result
/// - Never fails (events are facts that happened)
pub fn apply_event(state: OrderState, event: &OrderEvent) -> OrderState {
    let timestamp = event.timestamp();
    let mut state = OrderState {
        updated_at: Some(timestamp),
        version: state.version + 1,
        ..state
    };

    match event {
        OrderEvent::OrderCreated(e) => OrderState {
            id: e.meta.order_id,
            user_id: e.user_id,
            order_number: Some(e.order_number.clone()),
            status: OrderStatus::Draft,
            created_at: Some(timestamp),
            ..state
        },

        OrderEvent::PhotoAdded(e) => {
            state.next_position = state.next_position.max(e.photo.position + 1);
            state.photos.push(e.photo.clone());
            with_costs(state, &e.costs)
        }

        OrderEvent::PhotoRemoved(e) => {
            state.photos.retain(|p| p.id != e.photo_id);
            with_costs(state, &e.costs)
        }

        OrderEvent::AutoCropRecorded(e) => {
            if let Some(photo) = state.photos.iter_mut().find(|p| p.id == e.photo_id) {
                photo.auto_crop = Some(e.auto_crop);
            }
            state
        }

        OrderEvent::CropsConfirmed(e) => {
            for (photo_id, rect) in &e.crops {
                if let Some(photo) = state.photos.iter_mut().find(|p| p.id == *photo_id) {
                    photo.final_crop = *rect;
                    photo.crop_confirmed = true;
                }
            }
            state
        }

        OrderEvent::DeliverySet(e) => {
            state.delivery = Some(e.delivery.clone());
            with_costs(state, &e.costs)
        }

        OrderEvent::PromoApplied(e) => {
            state.promo = Some(e.promo.clone());
            with_costs(state, &e.costs)
        }

        OrderEvent::PaymentReceived(e) => OrderState {
            status: OrderStatus::Paid,
            receipt_ref: e.receipt_ref.clone().or(state.receipt_ref.clone()),
            paid_at: Some(timestamp),
            ..state
        },

        OrderEvent::StatusChanged(e) => OrderState {
            status: e.to,
            ..state
        },

        OrderEvent::ManagerNotesSet(e) => OrderState {
            manager_notes: e.notes.clone(),
            ..state
        },
    }
}
