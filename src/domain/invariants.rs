// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Order Invariants
//!
//! Business rule checks shared by the command handlers and the service layer.
//! All functions are pure and return a structured reason on failure; the
//! reason's `Display` is the message shown to the user.
//!
//! # Invariant Categories
//!
//! 1. **Structural**: non-empty references, non-degenerate crops
//! 2. **Submission**: delivery chosen, photo minimum reached
//! 3. **Catalog**: product active and purchasable
//! 4. **Promo**: validator rejections and the subscription requirement

use crate::promo::PromoRejection;

use super::delivery::DeliveryDetails;
use super::ids::{PhotoId, ProductId};
use super::photo::CropRect;
use super::product::Product;
use super::promocode::PromoCode;

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Structured validation failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("At least {required} photos are required, order has {actual}")]
    TooFewPhotos { required: u32, actual: u32 },

    #[error("Delivery method must be chosen first")]
    DeliveryNotSet,

    #[error("Product {0} is not available")]
    ProductInactive(ProductId),

    #[error("Product {0} is a category; choose one of its variants")]
    ProductNotPurchasable(ProductId),

    #[error("Upload file reference is empty")]
    EmptyFileReference,

    #[error("Payment receipt reference is empty")]
    EmptyReceipt,

    #[error("Crop for photo {0} has zero area")]
    EmptyCrop(PhotoId),

    #[error("Promo code {0} requires a channel subscription")]
    SubscriptionRequired(PromoCode),

    #[error("{0}")]
    Promo(#[from] PromoRejection),
}

/// Photo count reached the configured minimum
pub fn validate_min_photos(photo_count: u32, min_photos: u32) -> ValidationResult {
    if photo_count < min_photos {
        return Err(ValidationError::TooFewPhotos {
            required: min_photos,
            actual: photo_count,
        });
    }
    Ok(())
}

/// Order can leave `draft`
///
/// # Rules
/// - Delivery must be set
/// - Photo count must be at least the configured minimum
pub fn validate_submission(
    delivery: Option<&DeliveryDetails>,
    photo_count: u32,
    min_photos: u32,
) -> ValidationResult {
    if delivery.is_none() {
        return Err(ValidationError::DeliveryNotSet);
    }
    validate_min_photos(photo_count, min_photos)
}

/// Product can receive photos
///
/// # Rules
/// - Product must be active
/// - Product must not be a category with active variants
pub fn validate_purchasable(product: &Product, has_active_children: bool) -> ValidationResult {
    if !product.is_active {
        return Err(ValidationError::ProductInactive(product.id));
    }
    if has_active_children {
        return Err(ValidationError::ProductNotPurchasable(product.id));
    }
    Ok(())
}

pub fn validate_file_reference(file_ref: &str) -> ValidationResult {
    if file_ref.trim().is_empty() {
        return Err(ValidationError::EmptyFileReference);
    }
    Ok(())
}

pub fn validate_receipt_reference(receipt_ref: &str) -> ValidationResult {
    if receipt_ref.trim().is_empty() {
        return Err(ValidationError::EmptyReceipt);
    }
    Ok(())
}

pub fn validate_crop(photo_id: PhotoId, rect: &CropRect) -> ValidationResult {
    if rect.is_empty() {
        return Err(ValidationError::EmptyCrop(photo_id));
    }
    Ok(())
}

/// Subscription requirement, checked against the caller's own lookup
pub fn validate_subscription(
    code: &PromoCode,
    require_subscription: bool,
    subscription_confirmed: bool,
) -> ValidationResult {
    if require_subscription && !subscription_confirmed {
        return Err(ValidationError::SubscriptionRequired(code.clone()));
    }
    Ok(())
}
