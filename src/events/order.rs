// Copyright (c) 2025 - Cowboy AI, Inc.
//! Order Domain Events
//!
//! All state changes to the Order aggregate are represented as immutable
//! events. Events that change the photo set, delivery or promo carry the
//! recomputed [`CostSnapshot`], so replaying them never needs the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Amount, AppliedPromo, AutoCrop, CropRect, DeliveryDetails, OrderId, OrderNumber, Photo,
    PhotoId, PromoCode, UserId,
};
use crate::state_machine::{LifecycleCommand, OrderStatus};

/// Envelope fields shared by every order event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Event version for schema evolution
    pub event_version: u32,

    /// Unique event identifier (UUID v7 for time ordering)
    pub event_id: Uuid,

    pub order_id: OrderId,

    /// When this event occurred
    pub timestamp: DateTime<Utc>,

    /// Correlation ID for request tracing
    pub correlation_id: Uuid,

    /// Causation ID (event that caused this event)
    pub causation_id: Option<Uuid>,
}

impl EventMetadata {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(order_id: OrderId, timestamp: DateTime<Utc>, correlation_id: Uuid) -> Self {
        Self {
            event_version: Self::CURRENT_VERSION,
            event_id: Uuid::now_v7(),
            order_id,
            timestamp,
            correlation_id,
            causation_id: None,
        }
    }

    pub fn caused_by(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }
}

/// Cost fields after the change the event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CostSnapshot {
    pub photos_cost: Amount,
    pub delivery_cost: Amount,
    pub discount: Amount,
}

impl CostSnapshot {
    pub fn total(&self) -> Amount {
        (self.photos_cost + self.delivery_cost).saturating_sub(self.discount)
    }
}

/// Order Domain Events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    /// Draft order was opened for a user
    OrderCreated(OrderCreated),

    PhotoAdded(PhotoAdded),

    PhotoRemoved(PhotoRemoved),

    /// Classifier result stored for a photo
    AutoCropRecorded(AutoCropRecorded),

    /// User confirmed (or skipped) cropping
    CropsConfirmed(CropsConfirmed),

    DeliverySet(DeliverySet),

    PromoApplied(PromoApplied),

    /// Payment receipt accepted, order is paid
    PaymentReceived(PaymentReceived),

    /// Any other lifecycle move
    StatusChanged(StatusChanged),

    ManagerNotesSet(ManagerNotesSet),
}

impl OrderEvent {
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            OrderEvent::OrderCreated(e) => &e.meta,
            OrderEvent::PhotoAdded(e) => &e.meta,
            OrderEvent::PhotoRemoved(e) => &e.meta,
            OrderEvent::AutoCropRecorded(e) => &e.meta,
            OrderEvent::CropsConfirmed(e) => &e.meta,
            OrderEvent::DeliverySet(e) => &e.meta,
            OrderEvent::PromoApplied(e) => &e.meta,
            OrderEvent::PaymentReceived(e) => &e.meta,
            OrderEvent::StatusChanged(e) => &e.meta,
            OrderEvent::ManagerNotesSet(e) => &e.meta,
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.metadata().order_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.metadata().timestamp
    }

    /// Stable type name, matches the serde tag
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "order_created",
            OrderEvent::PhotoAdded(_) => "photo_added",
            OrderEvent::PhotoRemoved(_) => "photo_removed",
            OrderEvent::AutoCropRecorded(_) => "auto_crop_recorded",
            OrderEvent::CropsConfirmed(_) => "crops_confirmed",
            OrderEvent::DeliverySet(_) => "delivery_set",
            OrderEvent::PromoApplied(_) => "promo_applied",
            OrderEvent::PaymentReceived(_) => "payment_received",
            OrderEvent::StatusChanged(_) => "status_changed",
            OrderEvent::ManagerNotesSet(_) => "manager_notes_set",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    #[serde(flatten)]
    pub meta: EventMetadata,
    pub user_id: UserId,
    pub order_number: OrderNumber,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoAdded {
    #[serde(flatten)]
    pub meta: EventMetadata,
    pub photo: Photo,
    pub costs: CostSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRemoved {
    #[serde(flatten)]
    pub meta: EventMetadata,
    pub photo_id: PhotoId,
    pub costs: CostSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoCropRecorded {
    #[serde(flatten)]
    pub meta: EventMetadata,
    pub photo_id: PhotoId,
    pub auto_crop: AutoCrop,
}

/// Final crop per photo; `None` keeps the photo uncropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropsConfirmed {
    #[serde(flatten)]
    pub meta: EventMetadata,
    pub crops: Vec<(PhotoId, Option<CropRect>)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySet {
    #[serde(flatten)]
    pub meta: EventMetadata,
    pub delivery: DeliveryDetails,
    pub costs: CostSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoApplied {
    #[serde(flatten)]
    pub meta: EventMetadata,
    pub promo: AppliedPromo,
    /// Code this one replaced; one use of it is released
    pub replaced: Option<PromoCode>,
    pub costs: CostSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceived {
    #[serde(flatten)]
    pub meta: EventMetadata,
    /// `None` when a manager marked the order paid by hand
    pub receipt_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    #[serde(flatten)]
    pub meta: EventMetadata,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub command: LifecycleCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerNotesSet {
    #[serde(flatten)]
    pub meta: EventMetadata,
    pub notes: Option<String>,
}
