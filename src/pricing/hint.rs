// Copyright (c) 2025 - Cowboy AI, Inc.
//! Price Optimization Hint
//!
//! Advisory only: tells the user that a few more photos would unlock the next
//! tier at little or no extra cost. Never affects the computed price.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{pricing_buckets, PhotoCounts};
use crate::catalog::CatalogSnapshot;
use crate::domain::Amount;

/// Hint thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintSettings {
    /// Largest number of additional photos worth suggesting
    pub max_gap: u32,
    /// How much more than the current total the next tier may cost
    pub margin: Amount,
}

impl Default for HintSettings {
    fn default() -> Self {
        Self {
            max_gap: 10,
            margin: 200,
        }
    }
}

/// Suggestion to add photos and reach the next tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHint {
    pub current_count: u32,
    pub target_count: u32,
    pub target_unit_price: Amount,
    pub current_cost: Amount,
    pub target_cost: Amount,
}

impl PriceHint {
    pub fn additional_photos(&self) -> u32 {
        self.target_count - self.current_count
    }
}

impl fmt::Display for PriceHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Add {} more photo(s) to reach {} and pay {} per photo ({} in total instead of {})",
            self.additional_photos(),
            self.target_count,
            self.target_unit_price,
            self.target_cost,
            self.current_cost
        )
    }
}

/// First worthwhile next-tier suggestion across the order's pricing buckets
pub fn price_optimization_hint(
    counts: &PhotoCounts,
    catalog: &CatalogSnapshot,
    settings: &HintSettings,
) -> Option<PriceHint> {
    pricing_buckets(counts, catalog).iter().find_map(|bucket| {
        let count = bucket.count();
        let (tiers, _) = bucket.ladder();

        let next = tiers
            .iter()
            .filter(|tier| tier.min_qty > count)
            .min_by_key(|tier| tier.min_qty)?;

        if next.min_qty - count > settings.max_gap {
            return None;
        }

        let current_cost = bucket.cost();
        let target_cost = next.unit_price * Amount::from(next.min_qty);
        if target_cost > current_cost + settings.margin {
            return None;
        }

        Some(PriceHint {
            current_count: count,
            target_count: next.min_qty,
            target_unit_price: next.unit_price,
            current_cost,
            target_cost,
        })
    })
}
