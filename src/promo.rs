// Copyright (c) 2025 - Cowboy AI, Inc.
//! Promo Code Validator
//!
//! Pure predicate over a promo record and the order context. Checks run in a
//! fixed order and stop at the first failure:
//!
//! ```text
//! active → valid_from → valid_until → usage cap → min order amount → min photos
//! ```
//!
//! The subscription requirement is exposed on the record but checked by the
//! caller, which owns the chat platform lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Amount, Promocode};

/// Reason a promo code cannot be applied
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PromoRejection {
    #[error("Promo code is not active")]
    Inactive,

    #[error("Promo code is not valid yet (starts {valid_from})")]
    NotYetActive { valid_from: DateTime<Utc> },

    #[error("Promo code expired on {valid_until}")]
    Expired { valid_until: DateTime<Utc> },

    #[error("Promo code usage limit reached ({max_uses})")]
    UsageLimitReached { max_uses: u32 },

    #[error("Minimum order amount for this code is {required}, order is {actual}")]
    OrderAmountTooLow { required: Amount, actual: Amount },

    #[error("This code needs at least {required} photos, order has {actual}")]
    TooFewPhotos { required: u32, actual: u32 },
}

/// Order context a promo code is validated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromoContext {
    /// Photos subtotal, before delivery and discount
    pub order_amount: Amount,
    pub photo_count: u32,
    pub now: DateTime<Utc>,
}

impl PromoContext {
    pub fn new(order_amount: Amount, photo_count: u32, now: DateTime<Utc>) -> Self {
        Self {
            order_amount,
            photo_count,
            now,
        }
    }
}

/// Validate a promo code against an order
pub fn validate_promo(promo: &Promocode, context: &PromoContext) -> Result<(), PromoRejection> {
    if !promo.is_active {
        return Err(PromoRejection::Inactive);
    }

    if let Some(valid_from) = promo.valid_from {
        if context.now < valid_from {
            return Err(PromoRejection::NotYetActive { valid_from });
        }
    }

    if let Some(valid_until) = promo.valid_until {
        if context.now > valid_until {
            return Err(PromoRejection::Expired { valid_until });
        }
    }

    if promo.is_exhausted() {
        return Err(PromoRejection::UsageLimitReached {
            max_uses: promo.max_uses.unwrap_or_default(),
        });
    }

    if context.order_amount < promo.min_order_amount {
        return Err(PromoRejection::OrderAmountTooLow {
            required: promo.min_order_amount,
            actual: context.order_amount,
        });
    }

    if context.photo_count < promo.min_photos {
        return Err(PromoRejection::TooFewPhotos {
            required: promo.min_photos,
            actual: context.photo_count,
        });
    }

    Ok(())
}

/// Validate and compute the discount the code grants on this order
pub fn quote_discount(promo: &Promocode, context: &PromoContext) -> Result<Amount, PromoRejection> {
    validate_promo(promo, context)?;
    Ok(promo.calculate_discount(context.order_amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PromoCode;
    use chrono::Duration;
    use test_case::test_case;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn save10() -> Promocode {
        Promocode::percent(PromoCode::new("SAVE10").unwrap(), 10).unwrap()
    }

    #[test]
    fn test_valid_code_quotes_discount() {
        let context = PromoContext::new(630, 35, now());
        assert_eq!(quote_discount(&save10(), &context), Ok(63));
    }

    #[test]
    fn test_inactive_checked_before_dates() {
        let promo = save10()
            .inactive()
            .valid_between(None, Some(now() - Duration::days(1)));
        let context = PromoContext::new(630, 35, now());
        assert_eq!(validate_promo(&promo, &context), Err(PromoRejection::Inactive));
    }

    #[test]
    fn test_window() {
        let from = now() + Duration::hours(1);
        let promo = save10().valid_between(Some(from), None);
        assert_eq!(
            validate_promo(&promo, &PromoContext::new(630, 35, now())),
            Err(PromoRejection::NotYetActive { valid_from: from })
        );

        let until = now() - Duration::seconds(1);
        let promo = save10().valid_between(None, Some(until));
        assert_eq!(
            validate_promo(&promo, &PromoContext::new(630, 35, now())),
            Err(PromoRejection::Expired { valid_until: until })
        );

        // bounds are inclusive
        let promo = save10().valid_between(Some(now()), Some(now()));
        assert!(validate_promo(&promo, &PromoContext::new(630, 35, now())).is_ok());
    }

    #[test_case(None, 500 => Ok(()); "no cap")]
    #[test_case(Some(0), 500 => Ok(()); "zero means uncapped")]
    #[test_case(Some(3), 2 => Ok(()); "under cap")]
    #[test_case(Some(3), 3 => Err(PromoRejection::UsageLimitReached { max_uses: 3 }); "at cap")]
    fn test_usage_cap(max_uses: Option<u32>, current_uses: u32) -> Result<(), PromoRejection> {
        let mut promo = save10();
        promo.max_uses = max_uses;
        promo.current_uses = current_uses;
        validate_promo(&promo, &PromoContext::new(630, 35, now()))
    }

    #[test]
    fn test_amount_checked_before_photos() {
        let promo = save10().with_min_order_amount(1000).with_min_photos(50);
        assert_eq!(
            validate_promo(&promo, &PromoContext::new(630, 35, now())),
            Err(PromoRejection::OrderAmountTooLow {
                required: 1000,
                actual: 630
            })
        );

        let promo = save10().with_min_photos(50);
        assert_eq!(
            validate_promo(&promo, &PromoContext::new(630, 35, now())),
            Err(PromoRejection::TooFewPhotos {
                required: 50,
                actual: 35
            })
        );
    }

    #[test]
    fn test_subscription_flag_not_checked_here() {
        let promo = save10().requiring_subscription();
        assert!(validate_promo(&promo, &PromoContext::new(630, 35, now())).is_ok());
    }
}
