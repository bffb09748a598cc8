// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for order operations
//!
//! Every service call fails with one [`OrderError`] class:
//!
//! - `Validation`: a business rule rejected the input, with a structured reason
//! - `Conflict`: the order's current status forbids the operation
//! - `NotFound`: order, photo, product or promo code is unknown
//! - `Transient`: the store could not complete the call, retrying may help
//!
//! `Configuration` is only raised while loading [`crate::config::EngineConfig`].

use std::fmt;
use thiserror::Error;

use crate::aggregate::CommandError;
use crate::domain::{OrderId, PhotoId, ProductId, ValidationError};
use crate::event_store::StoreError;
use crate::promo::PromoRejection;

/// What could not be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    Order(OrderId),
    Photo(PhotoId),
    Product(ProductId),
    Promo(String),
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFound::Order(id) => write!(f, "Order {}", id),
            NotFound::Photo(id) => write!(f, "Photo {}", id),
            NotFound::Product(id) => write!(f, "Product {}", id),
            NotFound::Promo(code) => write!(f, "Promo code {}", code),
        }
    }
}

/// Errors that can occur in order operations
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(NotFound),

    /// Store contention or outage
    #[error("Temporary failure: {0}")]
    Transient(String),

    /// Stored data could not be encoded or decoded
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for order operations
pub type OrderResult<T> = Result<T, OrderError>;

impl OrderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderError::Transient(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, OrderError::Validation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, OrderError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, OrderError::NotFound(_))
    }
}

impl From<CommandError> for OrderError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Validation(reason) => OrderError::Validation(reason),
            CommandError::PhotoNotFound(id) => OrderError::NotFound(NotFound::Photo(id)),
            CommandError::ProductNotFound(id) => OrderError::NotFound(NotFound::Product(id)),
            other => OrderError::Conflict(other.to_string()),
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PromoNotFound(code) => OrderError::NotFound(NotFound::Promo(code.to_string())),
            StoreError::PromoExhausted { max_uses, .. } => OrderError::Validation(
                ValidationError::Promo(PromoRejection::UsageLimitReached { max_uses }),
            ),
            StoreError::DuplicateOrderNumber(number) => {
                OrderError::Conflict(format!("order number {} is already taken", number))
            }
            StoreError::Serialization(e) => OrderError::Storage(e.to_string()),
            retryable @ (StoreError::VersionConflict { .. } | StoreError::Unavailable(_)) => {
                OrderError::Transient(retryable.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderNumber, PromoCode};
    use crate::state_machine::{OrderStatus, TransitionError};

    #[test]
    fn test_command_errors_map_to_classes() {
        let conflict: OrderError = CommandError::InvalidState {
            operation: "add photos",
            status: OrderStatus::Paid,
        }
        .into();
        assert!(conflict.is_conflict());
        assert_eq!(conflict.to_string(), "Conflict: Cannot add photos while order is paid");

        let transition: OrderError =
            CommandError::Transition(TransitionError::Terminal("cancelled".to_string())).into();
        assert!(transition.is_conflict());

        let validation: OrderError =
            CommandError::Validation(ValidationError::DeliveryNotSet).into();
        assert!(validation.is_validation());

        let missing: OrderError = CommandError::ProductNotFound(ProductId(9)).into();
        assert!(missing.is_not_found());
        assert_eq!(missing.to_string(), "Product 9 not found");
    }

    #[test]
    fn test_store_errors_map_to_classes() {
        let code = PromoCode::new("once").unwrap();

        let exhausted: OrderError = StoreError::PromoExhausted {
            code: code.clone(),
            max_uses: 3,
        }
        .into();
        assert!(matches!(
            exhausted,
            OrderError::Validation(ValidationError::Promo(PromoRejection::UsageLimitReached {
                max_uses: 3
            }))
        ));

        let conflict: OrderError = StoreError::VersionConflict {
            order_id: OrderId::new(),
            expected: 1,
            actual: 2,
        }
        .into();
        assert!(conflict.is_retryable());

        let duplicate: OrderError =
            StoreError::DuplicateOrderNumber(OrderNumber::parse("260119-AAAA").unwrap()).into();
        assert!(duplicate.is_conflict());

        let unknown: OrderError = StoreError::PromoNotFound(code).into();
        assert!(unknown.is_not_found());

        let outage: OrderError = StoreError::Unavailable("down".to_string()).into();
        assert!(outage.is_retryable());
    }

    #[test]
    fn test_serialization_failure_is_not_retryable() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: OrderError = StoreError::Serialization(source).into();

        assert!(matches!(err, OrderError::Storage(_)));
        assert!(!err.is_retryable());
    }
}
