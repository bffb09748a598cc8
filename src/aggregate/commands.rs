// Copyright (c) 2025 - Cowboy AI, Inc.
//! Commands for the Order Aggregate
//!
//! Commands express user intent and can fail validation. They contain all data
//! needed for business rule enforcement.
//!
//! # Time Handling
//!
//! All commands include an explicit `timestamp`. Handlers never read the
//! clock; time is passed from the service layer.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AutoCrop, CropRect, DeliveryDetails, OrderNumber, PhotoId, ProductId, Promocode, UserId,
};
use crate::state_machine::LifecycleCommand;

/// Open a new draft order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderCommand {
    pub user_id: UserId,
    pub order_number: OrderNumber,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
}

/// Append a photo to the order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPhotoCommand {
    /// Id for the new photo, generated by the caller
    pub photo_id: PhotoId,
    pub product_id: ProductId,
    pub file_ref: String,
    pub thumbnail_ref: Option<String>,
    pub is_document: bool,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovePhotoCommand {
    pub photo_id: PhotoId,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDeliveryCommand {
    pub delivery: DeliveryDetails,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
}

/// Apply a promo code already looked up by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyPromoCommand {
    pub promo: Promocode,
    /// Result of the caller's own channel subscription check
    pub subscription_confirmed: bool,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
}

/// Receipt upload by the customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceiptCommand {
    pub receipt_ref: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
}

/// Any lifecycle move, including manager actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionStatusCommand {
    pub command: LifecycleCommand,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordAutoCropCommand {
    pub photo_id: PhotoId,
    pub auto_crop: AutoCrop,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
}

/// Crops chosen by the user on the review screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmCropsCommand {
    pub crops: Vec<(PhotoId, CropRect)>,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
}

/// Skip review: take the auto crop of every unconfirmed photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptAutoCropsCommand {
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetManagerNotesCommand {
    /// Empty or `None` clears the notes
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
}
