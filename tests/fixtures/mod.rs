// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for photo-order-engine
//!
//! Provides deterministic test data for aggregate, pricing and service tests.
//! Ids and timestamps used in pure tests are fixed constants so runs are
//! reproducible.
//!
//! # Catalog
//!
//! | id | product          | pricing                                    |
//! |----|------------------|--------------------------------------------|
//! | 1  | polaroid classic | 20, tiers {30: 18, 60: 15}, group polaroid |
//! | 2  | polaroid wide    | same ladder, group polaroid                |
//! | 3  | photo 10x15      | 25 per unit                                |
//! | 4  | mini             | 30, tiers {10: 25}                         |
//! | 10 | photo book       | category of 11                             |
//! | 11 | photo book A5    | 500 fixed                                  |
//! | 12 | retired format   | inactive                                   |

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use photo_order_engine::catalog::{CatalogSnapshot, ProductCatalog};
use photo_order_engine::config::{EngineConfig, RetrySettings};
use photo_order_engine::crop::{
    CenterCropClassifier, CropAnalyzer, CropClassifier, ImageData, InMemoryPhotoSource,
};
use photo_order_engine::domain::{
    OrderId, OrderNumber, PhotoId, PriceTier, Product, ProductId, PromoCode, Promocode, UserId,
};
use photo_order_engine::event_store::InMemoryOrderStore;
use photo_order_engine::pricing::PhotoCounts;
use photo_order_engine::service::{AddPhotoRequest, EventSourcedOrderService, OrderService};
use photo_order_engine::OrderState;

// Fixed test UUIDs (UUID v7 format, but deterministic for testing)
pub const ORDER_ID_1: &str = "01934f4a-1000-7000-8000-000000001000";

pub const PHOTO_ID_1: &str = "01934f4a-3001-7000-8000-000000003001";
pub const PHOTO_ID_2: &str = "01934f4a-3002-7000-8000-000000003002";
pub const PHOTO_ID_3: &str = "01934f4a-3003-7000-8000-000000003003";

pub const CORRELATION_ID_1: &str = "01934f4a-c001-7000-8000-00000000c001";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

pub const ORDER_NUMBER_1: &str = "260119-TEST";

pub const CLASSIC: ProductId = ProductId(1);
pub const WIDE: ProductId = ProductId(2);
pub const PRINT: ProductId = ProductId(3);
pub const MINI: ProductId = ProductId(4);
pub const BOOK_CATEGORY: ProductId = ProductId(10);
pub const BOOK_A5: ProductId = ProductId(11);
pub const RETIRED: ProductId = ProductId(12);

pub const USER_1: UserId = UserId(1001);
pub const USER_2: UserId = UserId(1002);

/// Parse a fixed UUID from a constant string
pub fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("Invalid UUID in test fixture")
}

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

pub fn order_id() -> OrderId {
    OrderId::from_uuid(parse_uuid(ORDER_ID_1))
}

pub fn photo_id(s: &str) -> PhotoId {
    PhotoId::from_uuid(parse_uuid(s))
}

pub fn correlation_id() -> Uuid {
    parse_uuid(CORRELATION_ID_1)
}

pub fn order_number() -> OrderNumber {
    OrderNumber::parse(ORDER_NUMBER_1).expect("Invalid order number in test fixture")
}

/// The polaroid tier ladder shared by the group
pub fn polaroid_tiers() -> [PriceTier; 2] {
    [PriceTier::new(30, 18), PriceTier::new(60, 15)]
}

pub fn products() -> Vec<Product> {
    vec![
        Product::builder(CLASSIC, "polaroid-classic", 20)
            .tiered(polaroid_tiers())
            .pricing_group("polaroid")
            .aspect_ratio(0.76)
            .sort_order(1)
            .build()
            .expect("Invalid product fixture"),
        Product::builder(WIDE, "polaroid-wide", 20)
            .tiered(polaroid_tiers())
            .pricing_group("polaroid")
            .aspect_ratio(1.25)
            .sort_order(2)
            .build()
            .expect("Invalid product fixture"),
        Product::builder(PRINT, "photo-10x15", 25)
            .aspect_ratio(1.5)
            .sort_order(3)
            .build()
            .expect("Invalid product fixture"),
        Product::builder(MINI, "mini", 30)
            .tiered([PriceTier::new(10, 25)])
            .sort_order(4)
            .build()
            .expect("Invalid product fixture"),
        Product::builder(BOOK_CATEGORY, "photo-book", 0)
            .sort_order(5)
            .build()
            .expect("Invalid product fixture"),
        Product::builder(BOOK_A5, "photo-book-a5", 500)
            .parent(BOOK_CATEGORY)
            .fixed()
            .sort_order(6)
            .build()
            .expect("Invalid product fixture"),
        Product::builder(RETIRED, "retired", 10)
            .inactive()
            .sort_order(7)
            .build()
            .expect("Invalid product fixture"),
    ]
}

pub fn catalog_snapshot() -> CatalogSnapshot {
    CatalogSnapshot::from_products(products())
}

pub fn counts(entries: &[(ProductId, u32)]) -> PhotoCounts {
    entries.iter().copied().collect()
}

pub fn promo_code(code: &str) -> PromoCode {
    PromoCode::new(code).expect("Invalid promo code in test fixture")
}

/// 10% off, no restrictions
pub fn save10() -> Promocode {
    Promocode::percent(promo_code("SAVE10"), 10).expect("Invalid promo fixture")
}

/// Fixed 50 off
pub fn minus50() -> Promocode {
    Promocode::fixed(promo_code("MINUS50"), 50).expect("Invalid promo fixture")
}

/// Engine configuration tuned for tests: small photo minimum, fast retries
pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig {
        min_photos: 2,
        store_retry: RetrySettings {
            max_attempts: 5,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
        ..EngineConfig::default()
    };
    config.classifier.retry_min_delay = Duration::from_millis(1);
    config.classifier.retry_max_delay = Duration::from_millis(5);
    config
}

/// Service wired to in-memory collaborators
pub struct TestEnv {
    pub service: Arc<EventSourcedOrderService>,
    pub store: Arc<InMemoryOrderStore>,
    pub photos: Arc<InMemoryPhotoSource>,
}

pub fn test_env(config: EngineConfig, promos: Vec<Promocode>) -> TestEnv {
    test_env_with_classifier(config, promos, Arc::new(CenterCropClassifier::default()))
}

pub fn test_env_with_classifier(
    config: EngineConfig,
    promos: Vec<Promocode>,
    classifier: Arc<dyn CropClassifier>,
) -> TestEnv {
    let store = Arc::new(InMemoryOrderStore::with_promocodes(promos));
    let photos = Arc::new(InMemoryPhotoSource::new());
    let crops = CropAnalyzer::new(classifier, photos.clone(), config.classifier.clone());
    let catalog = Arc::new(ProductCatalog::from_products(products()));
    let service = Arc::new(EventSourcedOrderService::new(
        store.clone(),
        catalog,
        crops,
        config,
    ));

    TestEnv {
        service,
        store,
        photos,
    }
}

/// Start a draft for `user` and add photos; every upload is stored in the photo source
pub async fn order_with_photos(
    env: &TestEnv,
    user: UserId,
    photos: &[(ProductId, u32)],
) -> OrderState {
    let mut order = env
        .service
        .start_order(user)
        .await
        .expect("Failed to start order");

    for (product, count) in photos {
        for _ in 0..*count {
            let file_ref = format!("{}-{}-{}", user, product, order.photo_count());
            env.photos.insert(
                file_ref.clone(),
                ImageData::new(vec![0; 8]).with_dimensions(1000, 1500),
            );
            order = env
                .service
                .add_photo(order.id, AddPhotoRequest::new(*product, file_ref))
                .await
                .expect("Failed to add photo");
        }
    }
    order
}
