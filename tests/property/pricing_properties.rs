// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Pricing Engine
//!
//! Laws that hold for every count map over the test catalog and for every
//! well-formed tier ladder.

use proptest::prelude::*;

use photo_order_engine::domain::{Amount, DiscountRule, PriceTier, ProductId};
use photo_order_engine::pricing::{calculate_price, effective_unit_price, price_breakdown};

use crate::fixtures::*;

// ============================================================================
// Strategies
// ============================================================================

fn catalog_product() -> impl Strategy<Value = ProductId> {
    prop_oneof![
        Just(CLASSIC),
        Just(WIDE),
        Just(PRINT),
        Just(MINI),
        Just(BOOK_A5),
        Just(RETIRED),
        Just(ProductId(999)),
    ]
}

fn count_map() -> impl Strategy<Value = Vec<(ProductId, u32)>> {
    prop::collection::vec((catalog_product(), 0u32..120), 0..8)
}

/// Ladder whose unit price drops as the threshold rises
fn descending_ladder() -> impl Strategy<Value = (Amount, Vec<PriceTier>)> {
    (50u64..200, prop::collection::btree_set(1u32..200, 0..5)).prop_flat_map(
        |(base, thresholds)| {
            let len = thresholds.len();
            prop::collection::vec(1u64..5, len).prop_map(move |drops| {
                let mut price = base;
                let tiers = thresholds
                    .iter()
                    .zip(drops)
                    .map(|(&min_qty, drop)| {
                        price -= drop;
                        PriceTier::new(min_qty, price)
                    })
                    .collect();
                (base, tiers)
            })
        },
    )
}

fn discount_rule() -> impl Strategy<Value = DiscountRule> {
    prop_oneof![
        (1u8..=100).prop_map(DiscountRule::Percent),
        (1u64..5000).prop_map(DiscountRule::Fixed),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Property: Pricing is a pure function of the counts
    #[test]
    fn prop_pricing_is_deterministic(entries in count_map()) {
        let catalog = catalog_snapshot();
        let counts = counts(&entries);

        let first = calculate_price(&counts, &catalog);
        let second = calculate_price(&counts, &catalog);

        prop_assert_eq!(first, second);
        prop_assert_eq!(price_breakdown(&counts, &catalog).total, first);
    }

    /// Property: More photos never raise the unit price
    #[test]
    fn prop_unit_price_monotonic(
        (base, tiers) in descending_ladder(),
        a in 0u32..300,
        b in 0u32..300,
    ) {
        let (low, high) = (a.min(b), a.max(b));
        prop_assert!(
            effective_unit_price(&tiers, base, high) <= effective_unit_price(&tiers, base, low)
        );
    }

    /// Property: Unit price always comes from the ladder or the base price
    #[test]
    fn prop_unit_price_from_ladder((base, tiers) in descending_ladder(), count in 0u32..300) {
        let price = effective_unit_price(&tiers, base, count);
        prop_assert!(price == base || tiers.iter().any(|t| t.unit_price == price && t.min_qty <= count));
    }

    /// Property: Moving photos between group members keeps the price
    #[test]
    fn prop_group_members_interchangeable(classic in 0u32..100, wide in 0u32..100) {
        let catalog = catalog_snapshot();
        let total = classic + wide;

        let split = calculate_price(&counts(&[(CLASSIC, classic), (WIDE, wide)]), &catalog);
        let all_classic = calculate_price(&counts(&[(CLASSIC, total)]), &catalog);
        let all_wide = calculate_price(&counts(&[(WIDE, total)]), &catalog);

        prop_assert_eq!(split, all_classic);
        prop_assert_eq!(split, all_wide);
    }

    /// Property: Ungrouped products price independently
    #[test]
    fn prop_ungrouped_products_additive(prints in 0u32..100, minis in 0u32..100) {
        let catalog = catalog_snapshot();

        let together = calculate_price(&counts(&[(PRINT, prints), (MINI, minis)]), &catalog);
        let apart = calculate_price(&counts(&[(PRINT, prints)]), &catalog)
            + calculate_price(&counts(&[(MINI, minis)]), &catalog);

        prop_assert_eq!(together, apart);
    }

    /// Property: A discount never exceeds the amount it applies to
    #[test]
    fn prop_discount_capped(rule in discount_rule(), amount in 0u64..100_000) {
        let discount = rule.discount_for(amount);
        prop_assert!(discount <= amount);

        if let DiscountRule::Percent(percent) = rule {
            prop_assert_eq!(discount, amount * Amount::from(percent) / 100);
        }
    }
}
