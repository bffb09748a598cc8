// Copyright (c) 2025 - Cowboy AI, Inc.
//! Product (print format) Catalog Entry
//!
//! Products form a two-level hierarchy:
//! - no parent, has active children → category (e.g. "Polaroid")
//! - no parent, no active children → standalone product
//! - has parent → variant of a category
//!
//! Products sharing a `pricing_group` are counted together before the tier
//! ladder is applied, so a polaroid variant and a half-size print can share
//! one volume discount.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::ProductId;
use super::Amount;

/// Product validation error
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProductError {
    #[error("Product slug is empty")]
    EmptySlug,

    #[error("Tier min_qty must be positive")]
    ZeroTierQuantity,

    #[error("Aspect ratio must be positive and finite: {0}")]
    InvalidAspectRatio(f64),

    #[error("Product {0} cannot be its own parent")]
    SelfParent(ProductId),
}

/// How a product is priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    PerUnit,
    Tiered,
    Fixed,
}

/// One rung of a volume discount ladder
///
/// The highest tier whose `min_qty` does not exceed the count prices the
/// entire count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceTier {
    pub min_qty: u32,
    pub unit_price: Amount,
}

impl PriceTier {
    pub fn new(min_qty: u32, unit_price: Amount) -> Self {
        Self { min_qty, unit_price }
    }
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub parent_id: Option<ProductId>,
    pub slug: String,
    pub name: String,
    pub short_name: String,
    /// Base price per photo
    pub unit_price: Amount,
    pub pricing_mode: PricingMode,
    tiers: Vec<PriceTier>,
    pub pricing_group: Option<String>,
    /// Width / height of the printed area
    pub aspect_ratio: Option<f64>,
    pub is_active: bool,
    pub sort_order: i32,
}

impl Product {
    /// Start building a product
    pub fn builder(id: ProductId, slug: impl Into<String>, unit_price: Amount) -> ProductBuilder {
        ProductBuilder::new(id, slug.into(), unit_price)
    }

    /// Tier ladder in catalog order
    pub fn tiers(&self) -> &[PriceTier] {
        &self.tiers
    }

    pub fn is_variant(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn is_grouped(&self) -> bool {
        self.pricing_group.is_some()
    }

    fn validate(&self) -> Result<(), ProductError> {
        if self.slug.trim().is_empty() {
            return Err(ProductError::EmptySlug);
        }
        if self.tiers.iter().any(|t| t.min_qty == 0) {
            return Err(ProductError::ZeroTierQuantity);
        }
        if let Some(ratio) = self.aspect_ratio {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(ProductError::InvalidAspectRatio(ratio));
            }
        }
        if self.parent_id == Some(self.id) {
            return Err(ProductError::SelfParent(self.id));
        }
        Ok(())
    }
}

/// Builder for Product with fluent API
pub struct ProductBuilder {
    product: Product,
}

impl ProductBuilder {
    fn new(id: ProductId, slug: String, unit_price: Amount) -> Self {
        Self {
            product: Product {
                id,
                parent_id: None,
                name: slug.clone(),
                short_name: slug.clone(),
                slug,
                unit_price,
                pricing_mode: PricingMode::PerUnit,
                tiers: Vec::new(),
                pricing_group: None,
                aspect_ratio: None,
                is_active: true,
                sort_order: 0,
            },
        }
    }

    pub fn parent(mut self, parent_id: ProductId) -> Self {
        self.product.parent_id = Some(parent_id);
        self
    }

    pub fn name(mut self, name: impl Into<String>, short_name: impl Into<String>) -> Self {
        self.product.name = name.into();
        self.product.short_name = short_name.into();
        self
    }

    pub fn fixed(mut self) -> Self {
        self.product.pricing_mode = PricingMode::Fixed;
        self
    }

    /// Switch to tiered pricing with the given ladder
    pub fn tiered(mut self, tiers: impl IntoIterator<Item = PriceTier>) -> Self {
        self.product.pricing_mode = PricingMode::Tiered;
        self.product.tiers = tiers.into_iter().collect();
        self
    }

    pub fn pricing_group(mut self, group: impl Into<String>) -> Self {
        self.product.pricing_group = Some(group.into());
        self
    }

    pub fn aspect_ratio(mut self, ratio: f64) -> Self {
        self.product.aspect_ratio = Some(ratio);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.product.is_active = false;
        self
    }

    pub fn sort_order(mut self, order: i32) -> Self {
        self.product.sort_order = order;
        self
    }

    pub fn build(self) -> Result<Product, ProductError> {
        self.product.validate()?;
        Ok(self.product)
    }
}
