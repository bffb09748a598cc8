// Copyright (c) 2025 - Cowboy AI, Inc.
//! Promo Code Records and Discount Rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::Amount;

/// Promo code validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PromoCodeError {
    #[error("Promo code is empty")]
    Empty,

    #[error("Promo code exceeds maximum length of 50 characters: {0}")]
    TooLong(usize),

    #[error("Invalid character in promo code: {0}")]
    InvalidCharacter(char),

    #[error("Discount percent must be between 1 and 100: {0}")]
    InvalidPercent(u8),

    #[error("Promo code grants no discount")]
    NoDiscount,
}

/// Case-insensitive promo code
///
/// Stored trimmed and upper-cased so lookups never depend on how the user
/// typed it.
///
/// ```rust
/// use photo_order_engine::domain::PromoCode;
///
/// let code = PromoCode::new("  save10 ").unwrap();
/// assert_eq!(code.as_str(), "SAVE10");
/// assert!(PromoCode::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromoCode(String);

impl PromoCode {
    pub const MAX_LENGTH: usize = 50;

    pub fn new(code: impl AsRef<str>) -> Result<Self, PromoCodeError> {
        let normalized = code.as_ref().trim().to_uppercase();

        if normalized.is_empty() {
            return Err(PromoCodeError::Empty);
        }
        let length = normalized.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(PromoCodeError::TooLong(length));
        }
        if let Some(c) = normalized
            .chars()
            .find(|c| !(c.is_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(PromoCodeError::InvalidCharacter(c));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Effective discount rule of a promo code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DiscountRule {
    /// Fixed amount off the photos subtotal
    Fixed(Amount),
    /// Percentage of the photos subtotal, rounded down
    Percent(u8),
}

impl DiscountRule {
    /// Discount for a given photos subtotal, never above the subtotal
    pub fn discount_for(&self, amount: Amount) -> Amount {
        let raw = match self {
            DiscountRule::Fixed(fixed) => *fixed,
            DiscountRule::Percent(percent) => amount * Amount::from(*percent) / 100,
        };
        raw.min(amount)
    }
}

/// Promo code record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promocode {
    pub code: PromoCode,
    pub description: Option<String>,
    pub discount_percent: Option<u8>,
    pub discount_amount: Option<Amount>,
    pub min_order_amount: Amount,
    pub min_photos: u32,
    /// Checked by the caller against the chat platform, never by the core
    pub require_subscription: bool,
    /// `None` or `Some(0)` means unlimited
    pub max_uses: Option<u32>,
    pub current_uses: u32,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Promocode {
    /// Percentage promo code
    pub fn percent(code: PromoCode, percent: u8) -> Result<Self, PromoCodeError> {
        if percent == 0 || percent > 100 {
            return Err(PromoCodeError::InvalidPercent(percent));
        }
        Ok(Self::blank(code, Some(percent), None))
    }

    /// Fixed-amount promo code
    pub fn fixed(code: PromoCode, amount: Amount) -> Result<Self, PromoCodeError> {
        if amount == 0 {
            return Err(PromoCodeError::NoDiscount);
        }
        Ok(Self::blank(code, None, Some(amount)))
    }

    fn blank(code: PromoCode, percent: Option<u8>, amount: Option<Amount>) -> Self {
        Self {
            code,
            description: None,
            discount_percent: percent,
            discount_amount: amount,
            min_order_amount: 0,
            min_photos: 0,
            require_subscription: false,
            max_uses: None,
            current_uses: 0,
            valid_from: None,
            valid_until: None,
            is_active: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_min_order_amount(mut self, amount: Amount) -> Self {
        self.min_order_amount = amount;
        self
    }

    pub fn with_min_photos(mut self, photos: u32) -> Self {
        self.min_photos = photos;
        self
    }

    pub fn with_max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = Some(max_uses);
        self
    }

    pub fn requiring_subscription(mut self) -> Self {
        self.require_subscription = true;
        self
    }

    pub fn valid_between(
        mut self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Self {
        self.valid_from = from;
        self.valid_until = until;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Rule used at validation time; a non-zero fixed amount wins over a percent
    pub fn discount_rule(&self) -> Option<DiscountRule> {
        match (self.discount_amount, self.discount_percent) {
            (Some(amount), _) if amount > 0 => Some(DiscountRule::Fixed(amount)),
            (_, Some(percent)) if percent > 0 => Some(DiscountRule::Percent(percent.min(100))),
            _ => None,
        }
    }

    /// Discount this code grants on a photos subtotal
    pub fn calculate_discount(&self, amount: Amount) -> Amount {
        self.discount_rule()
            .map(|rule| rule.discount_for(amount))
            .unwrap_or(0)
    }

    /// Usage cap reached
    pub fn is_exhausted(&self) -> bool {
        match self.max_uses {
            Some(max) if max > 0 => self.current_uses >= max,
            _ => false,
        }
    }
}

/// Promo code as recorded on an order
///
/// Keeps the rule so the discount can be recomputed when the photos subtotal
/// changes, without going back to the promo table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPromo {
    pub code: PromoCode,
    pub rule: DiscountRule,
}

impl AppliedPromo {
    pub fn discount_for(&self, photos_cost: Amount) -> Amount {
        self.rule.discount_for(photos_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> PromoCode {
        PromoCode::new(s).unwrap()
    }

    #[test]
    fn test_code_normalization() {
        assert_eq!(code(" Summer-24 ").as_str(), "SUMMER-24");
        assert_eq!(code("save10"), code("SAVE10"));
    }

    #[test]
    fn test_code_rejects_bad_input() {
        assert_eq!(PromoCode::new("   "), Err(PromoCodeError::Empty));
        assert_eq!(
            PromoCode::new("HELLO WORLD"),
            Err(PromoCodeError::InvalidCharacter(' '))
        );
        assert!(matches!(
            PromoCode::new("X".repeat(51)),
            Err(PromoCodeError::TooLong(51))
        ));
    }

    #[test]
    fn test_percent_discount_rounds_down() {
        let promo = Promocode::percent(code("SAVE10"), 10).unwrap();
        assert_eq!(promo.calculate_discount(630), 63);
        assert_eq!(promo.calculate_discount(635), 63);
    }

    #[test]
    fn test_fixed_discount_is_capped() {
        let promo = Promocode::fixed(code("MINUS500"), 500).unwrap();
        assert_eq!(promo.calculate_discount(300), 300);
        assert_eq!(promo.calculate_discount(1000), 500);
    }

    #[test]
    fn test_fixed_takes_precedence_over_percent() {
        let mut promo = Promocode::percent(code("BOTH"), 50).unwrap();
        promo.discount_amount = Some(100);
        assert_eq!(promo.discount_rule(), Some(DiscountRule::Fixed(100)));
        assert_eq!(promo.calculate_discount(1000), 100);
    }

    #[test]
    fn test_invalid_discounts() {
        assert_eq!(
            Promocode::percent(code("ZERO"), 0),
            Err(PromoCodeError::InvalidPercent(0))
        );
        assert_eq!(
            Promocode::percent(code("TOOMUCH"), 101),
            Err(PromoCodeError::InvalidPercent(101))
        );
        assert_eq!(Promocode::fixed(code("NOTHING"), 0), Err(PromoCodeError::NoDiscount));
    }

    #[test]
    fn test_usage_cap() {
        let mut promo = Promocode::percent(code("ONCE"), 5).unwrap().with_max_uses(1);
        assert!(!promo.is_exhausted());
        promo.current_uses = 1;
        assert!(promo.is_exhausted());

        // zero is treated as "no cap"
        let mut unlimited = Promocode::percent(code("FREE"), 5).unwrap().with_max_uses(0);
        unlimited.current_uses = 1_000;
        assert!(!unlimited.is_exhausted());
    }
}
