// Copyright (c) 2025 - Cowboy AI, Inc.
//! Product Catalog
//!
//! Read-through cache over a [`ProductSource`]. Lookups go to an immutable
//! [`CatalogSnapshot`]; `reload()` swaps in a fresh snapshot atomically, so
//! a pricing run always sees one consistent catalog.
//!
//! Iteration order is `(sort_order, id)`. The pricing engine relies on it to
//! pick a pricing group's representative tier table.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{Product, ProductError, ProductId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product source error: {0}")]
    Source(String),

    #[error("Invalid product: {0}")]
    InvalidProduct(#[from] ProductError),
}

/// Immutable view of the catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl CatalogSnapshot {
    /// Build a snapshot; on duplicate ids the first occurrence wins
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut unique: Vec<Product> = Vec::new();
        for product in products {
            if unique.iter().any(|p| p.id == product.id) {
                warn!(product_id = %product.id, "Duplicate product id in catalog, ignoring");
                continue;
            }
            unique.push(product);
        }
        unique.sort_by_key(|p| (p.sort_order, p.id));

        let index = unique
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();

        Self {
            products: unique,
            index,
        }
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.index.get(&id).map(|&i| &self.products[i])
    }

    /// All products in catalog order, active or not
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Active variants of a category
    pub fn active_children(&self, parent: ProductId) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.parent_id == Some(parent) && p.is_active)
            .collect()
    }

    pub fn has_active_children(&self, id: ProductId) -> bool {
        self.products
            .iter()
            .any(|p| p.parent_id == Some(id) && p.is_active)
    }

    /// Active top-level entries (categories and standalone products)
    pub fn top_level(&self) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.parent_id.is_none() && p.is_active)
            .collect()
    }

    /// Active product that is not a category with active variants
    pub fn is_purchasable(&self, id: ProductId) -> bool {
        self.get(id)
            .map(|p| p.is_active && !self.has_active_children(id))
            .unwrap_or(false)
    }

    /// Product whose tier table prices the whole group
    ///
    /// First active member among `present`, in catalog order. A group with
    /// only retired members in the order falls back to the first of those.
    pub fn group_representative(&self, group: &str, present: &[ProductId]) -> Option<&Product> {
        let mut members = self
            .products
            .iter()
            .filter(|p| p.pricing_group.as_deref() == Some(group) && present.contains(&p.id));
        let first = members.next()?;
        if first.is_active {
            return Some(first);
        }
        members.find(|p| p.is_active).or(Some(first))
    }
}

/// Loader the catalog reads through to
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn load_products(&self) -> Result<Vec<Product>, CatalogError>;
}

/// Product source backed by memory, for tests and the simulator
#[derive(Debug, Default)]
pub struct InMemoryProductSource {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductSource {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }

    /// Replace the stored products; visible after the next `reload()`
    pub fn replace(&self, products: Vec<Product>) {
        *self.products.write().unwrap_or_else(PoisonError::into_inner) = products;
    }
}

#[async_trait]
impl ProductSource for InMemoryProductSource {
    async fn load_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// Injectable catalog cache with explicit reload
pub struct ProductCatalog {
    source: Arc<dyn ProductSource>,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl ProductCatalog {
    /// Load the catalog from its source
    pub async fn load(source: Arc<dyn ProductSource>) -> Result<Self, CatalogError> {
        let products = source.load_products().await?;
        let snapshot = CatalogSnapshot::from_products(products);
        info!(products = snapshot.len(), "Product catalog loaded");

        Ok(Self {
            source,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Catalog over a fixed product list
    pub fn from_products(products: Vec<Product>) -> Self {
        let snapshot = CatalogSnapshot::from_products(products.clone());
        Self {
            source: Arc::new(InMemoryProductSource::new(products)),
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Re-read the source and swap the snapshot; returns the product count
    pub async fn reload(&self) -> Result<usize, CatalogError> {
        let products = self.source.load_products().await?;
        let snapshot = Arc::new(CatalogSnapshot::from_products(products));
        let count = snapshot.len();

        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
        info!(products = count, "Product catalog reloaded");
        Ok(count)
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn get_product(&self, id: ProductId) -> Option<Product> {
        self.snapshot().get(id).cloned()
    }

    pub fn get_active_children(&self, parent: ProductId) -> Vec<Product> {
        self.snapshot()
            .active_children(parent)
            .into_iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceTier;

    fn products() -> Vec<Product> {
        vec![
            Product::builder(ProductId(1), "polaroid", 20)
                .sort_order(1)
                .build()
                .unwrap(),
            Product::builder(ProductId(2), "polaroid-standard", 20)
                .parent(ProductId(1))
                .tiered([PriceTier::new(30, 18)])
                .pricing_group("polaroid")
                .sort_order(2)
                .build()
                .unwrap(),
            Product::builder(ProductId(3), "polaroid-wide", 25)
                .parent(ProductId(1))
                .pricing_group("polaroid")
                .sort_order(3)
                .build()
                .unwrap(),
            Product::builder(ProductId(4), "classic", 15)
                .sort_order(0)
                .build()
                .unwrap(),
            Product::builder(ProductId(5), "polaroid-mini", 10)
                .parent(ProductId(1))
                .inactive()
                .sort_order(4)
                .build()
                .unwrap(),
        ]
    }

    #[test]
    fn test_snapshot_ordering_and_lookup() {
        let snapshot = CatalogSnapshot::from_products(products());

        let ids: Vec<_> = snapshot.iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![ProductId(4), ProductId(1), ProductId(2), ProductId(3), ProductId(5)]
        );
        assert_eq!(snapshot.get(ProductId(3)).map(|p| p.unit_price), Some(25));
        assert!(snapshot.get(ProductId(99)).is_none());
    }

    #[test]
    fn test_hierarchy() {
        let snapshot = CatalogSnapshot::from_products(products());

        assert_eq!(snapshot.active_children(ProductId(1)).len(), 2);
        assert!(!snapshot.is_purchasable(ProductId(1)));
        assert!(snapshot.is_purchasable(ProductId(2)));
        assert!(snapshot.is_purchasable(ProductId(4)));
        assert!(!snapshot.is_purchasable(ProductId(5)));
        assert_eq!(snapshot.top_level().len(), 2);
    }

    #[test]
    fn test_group_representative_is_first_present_member() {
        let snapshot = CatalogSnapshot::from_products(products());
        let both = [ProductId(2), ProductId(3)];

        assert_eq!(snapshot.group_representative("polaroid", &both).unwrap().id, ProductId(2));
        assert_eq!(
            snapshot.group_representative("polaroid", &[ProductId(3)]).unwrap().id,
            ProductId(3)
        );
        assert!(snapshot.group_representative("polaroid", &[ProductId(4)]).is_none());
        assert!(snapshot.group_representative("missing", &both).is_none());
    }

    #[test]
    fn test_group_representative_skips_retired_members() {
        let mut list = products();
        list.push(
            Product::builder(ProductId(6), "polaroid-legacy", 90)
                .tiered([PriceTier::new(30, 90)])
                .pricing_group("polaroid")
                .sort_order(-1)
                .inactive()
                .build()
                .unwrap(),
        );
        let snapshot = CatalogSnapshot::from_products(list);

        let with_legacy = [ProductId(6), ProductId(3)];
        assert_eq!(
            snapshot.group_representative("polaroid", &with_legacy).unwrap().id,
            ProductId(3)
        );
        assert_eq!(
            snapshot.group_representative("polaroid", &[ProductId(6)]).unwrap().id,
            ProductId(6)
        );
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut list = products();
        list.push(Product::builder(ProductId(4), "classic-dup", 99).build().unwrap());
        let snapshot = CatalogSnapshot::from_products(list);
        assert_eq!(snapshot.len(), 5);
        assert_eq!(snapshot.get(ProductId(4)).map(|p| p.unit_price), Some(15));
    }

    #[tokio::test]
    async fn test_reload_swaps_snapshot() {
        let source = Arc::new(InMemoryProductSource::new(products()));
        let catalog = ProductCatalog::load(source.clone()).await.unwrap();
        let before = catalog.snapshot();

        source.replace(vec![Product::builder(ProductId(4), "classic", 30)
            .build()
            .unwrap()]);
        assert_eq!(catalog.get_product(ProductId(4)).map(|p| p.unit_price), Some(15));

        let count = catalog.reload().await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(catalog.get_product(ProductId(4)).map(|p| p.unit_price), Some(30));
        // earlier snapshots stay consistent
        assert_eq!(before.len(), 5);
    }
}
