// Copyright (c) 2025 - Cowboy AI, Inc.
//! Photo Order Domain Models
//!
//! Core value objects and records for photo print orders, with validation
//! invariants enforced at construction.
//!
//! # Value Objects with Invariants
//!
//! - [`OrderId`], [`PhotoId`] - UUID v7 identifiers
//! - [`OrderNumber`] - human readable `YYMMDD-XXXX` order reference
//! - [`PromoCode`] - normalised, case-insensitive promo code
//! - [`CropRect`], [`AutoCrop`] - crop rectangles and classifier output
//! - [`DeliveryType`] - delivery method tag
//!
//! # Records
//!
//! - [`Product`] - catalog entry with pricing rule and tier ladder
//! - [`Promocode`] - promo code with discount rule and usage limits
//! - [`Photo`] - photo entity owned by the order aggregate

pub mod delivery;
pub mod ids;
pub mod invariants;
pub mod order_number;
pub mod photo;
pub mod product;
pub mod promocode;

/// Money in whole currency units
pub type Amount = u64;

pub use delivery::{DeliveryDetails, DeliveryError, DeliveryPrices, DeliveryType};
pub use ids::{OrderId, PhotoId, ProductId, UserId};
pub use invariants::{ValidationError, ValidationResult};
pub use order_number::{OrderNumber, OrderNumberError};
pub use photo::{AutoCrop, CropMethod, CropRect, Photo, PhotoError};
pub use product::{PriceTier, PricingMode, Product, ProductBuilder, ProductError};
pub use promocode::{AppliedPromo, DiscountRule, PromoCode, PromoCodeError, Promocode};
