// Copyright (c) 2025 - Cowboy AI, Inc.
//! Tiered and Grouped Pricing Engine
//!
//! Pure functions computing the photos subtotal from a count-per-product map
//! and a catalog snapshot.
//!
//! # Algorithm
//!
//! ```text
//! counts ──┬─ ungrouped ── per_unit / fixed → unit_price × count
//!          │            └─ tiered          → tiered_cost(own ladder, count)
//!          └─ grouped ──── Σ member counts → tiered_cost(representative ladder, Σ)
//! ```
//!
//! The matched tier prices the *whole* count, not only the photos above its
//! threshold. Unknown product ids contribute nothing.

pub mod hint;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::CatalogSnapshot;
use crate::domain::{Amount, PriceTier, PricingMode, Product, ProductId};

pub use hint::{price_optimization_hint, HintSettings, PriceHint};

const NO_TIERS: &[PriceTier] = &[];

/// Photo count per product
pub type PhotoCounts = BTreeMap<ProductId, u32>;

/// Unit price the tier ladder yields for `count`
///
/// Tiers are scanned by descending `min_qty`; the first one not above the
/// count wins. Falls back to `base_price` when none qualifies.
pub fn effective_unit_price(tiers: &[PriceTier], base_price: Amount, count: u32) -> Amount {
    let mut sorted: Vec<&PriceTier> = tiers.iter().collect();
    sorted.sort_by(|a, b| b.min_qty.cmp(&a.min_qty));

    sorted
        .into_iter()
        .find(|tier| tier.min_qty <= count)
        .map(|tier| tier.unit_price)
        .unwrap_or(base_price)
}

/// Cost of `count` photos on a tier ladder
pub fn tiered_cost(tiers: &[PriceTier], base_price: Amount, count: u32) -> Amount {
    if count == 0 {
        return 0;
    }
    effective_unit_price(tiers, base_price, count) * Amount::from(count)
}

/// Unit of pricing: one ungrouped product or a whole pricing group
#[derive(Debug, Clone)]
pub(crate) enum PricingBucket<'a> {
    Single {
        product: &'a Product,
        count: u32,
    },
    Group {
        name: &'a str,
        representative: &'a Product,
        members: Vec<(ProductId, u32)>,
        count: u32,
    },
}

impl PricingBucket<'_> {
    pub(crate) fn count(&self) -> u32 {
        match self {
            PricingBucket::Single { count, .. } | PricingBucket::Group { count, .. } => *count,
        }
    }

    /// Tier ladder and base price the bucket is priced with
    pub(crate) fn ladder(&self) -> (&[PriceTier], Amount) {
        match self {
            PricingBucket::Single { product, .. } => match product.pricing_mode {
                PricingMode::Tiered => (product.tiers(), product.unit_price),
                PricingMode::PerUnit | PricingMode::Fixed => (NO_TIERS, product.unit_price),
            },
            PricingBucket::Group { representative, .. } => {
                (representative.tiers(), representative.unit_price)
            }
        }
    }

    pub(crate) fn unit_price(&self) -> Amount {
        let (tiers, base) = self.ladder();
        effective_unit_price(tiers, base, self.count())
    }

    pub(crate) fn cost(&self) -> Amount {
        let (tiers, base) = self.ladder();
        tiered_cost(tiers, base, self.count())
    }
}

/// Partition counts into pricing buckets
///
/// Ungrouped products come first in product-id order, then groups in name
/// order. Zero counts and unknown products are dropped.
pub(crate) fn pricing_buckets<'a>(
    counts: &PhotoCounts,
    catalog: &'a CatalogSnapshot,
) -> Vec<PricingBucket<'a>> {
    let mut singles = Vec::new();
    let mut groups: BTreeMap<&'a str, Vec<(ProductId, u32)>> = BTreeMap::new();

    for (&product_id, &count) in counts {
        if count == 0 {
            continue;
        }
        let Some(product) = catalog.get(product_id) else {
            continue;
        };
        match product.pricing_group.as_deref() {
            Some(group) => groups.entry(group).or_default().push((product_id, count)),
            None => singles.push(PricingBucket::Single { product, count }),
        }
    }

    for (name, members) in groups {
        let present: Vec<ProductId> = members.iter().map(|(id, _)| *id).collect();
        let Some(representative) = catalog.group_representative(name, &present) else {
            continue;
        };
        let count = members.iter().map(|(_, c)| c).sum();
        singles.push(PricingBucket::Group {
            name,
            representative,
            members,
            count,
        });
    }

    singles
}

/// Photos subtotal for an order
///
/// ```rust
/// use photo_order_engine::catalog::CatalogSnapshot;
/// use photo_order_engine::domain::{PriceTier, Product, ProductId};
/// use photo_order_engine::pricing::{calculate_price, PhotoCounts};
///
/// let catalog = CatalogSnapshot::from_products(vec![
///     Product::builder(ProductId(1), "a", 20)
///         .tiered([PriceTier::new(30, 18), PriceTier::new(60, 15)])
///         .pricing_group("polaroid")
///         .build()
///         .unwrap(),
///     Product::builder(ProductId(2), "b", 20)
///         .tiered([PriceTier::new(30, 18), PriceTier::new(60, 15)])
///         .pricing_group("polaroid")
///         .build()
///         .unwrap(),
/// ]);
/// let counts = PhotoCounts::from([(ProductId(1), 20), (ProductId(2), 15)]);
///
/// assert_eq!(calculate_price(&counts, &catalog), 630);
/// ```
pub fn calculate_price(counts: &PhotoCounts, catalog: &CatalogSnapshot) -> Amount {
    pricing_buckets(counts, catalog)
        .iter()
        .map(PricingBucket::cost)
        .sum()
}

/// One line of a price breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceLine {
    Product {
        product_id: ProductId,
        count: u32,
        unit_price: Amount,
        cost: Amount,
    },
    Group {
        group: String,
        members: Vec<(ProductId, u32)>,
        count: u32,
        unit_price: Amount,
        cost: Amount,
    },
}

impl PriceLine {
    pub fn cost(&self) -> Amount {
        match self {
            PriceLine::Product { cost, .. } | PriceLine::Group { cost, .. } => *cost,
        }
    }
}

/// Structured price summary for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub lines: Vec<PriceLine>,
    pub total: Amount,
}

/// Per-product and per-group lines; `total` equals [`calculate_price`]
pub fn price_breakdown(counts: &PhotoCounts, catalog: &CatalogSnapshot) -> PriceBreakdown {
    let lines: Vec<PriceLine> = pricing_buckets(counts, catalog)
        .into_iter()
        .map(|bucket| {
            let unit_price = bucket.unit_price();
            let cost = bucket.cost();
            match bucket {
                PricingBucket::Single { product, count } => PriceLine::Product {
                    product_id: product.id,
                    count,
                    unit_price,
                    cost,
                },
                PricingBucket::Group {
                    name,
                    members,
                    count,
                    ..
                } => PriceLine::Group {
                    group: name.to_string(),
                    members,
                    count,
                    unit_price,
                    cost,
                },
            }
        })
        .collect();

    let total = lines.iter().map(PriceLine::cost).sum();
    PriceBreakdown { lines, total }
}
