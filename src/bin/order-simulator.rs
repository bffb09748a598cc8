// Copyright (c) 2025 - Cowboy AI, Inc.
//! Order Simulator
//!
//! Runs one scripted order through the in-memory stack:
//! - Album upload of 35 photos across two grouped products (one confirmation)
//! - Finish photos: classifier, crop review gate, price hint
//! - Delivery, promo code, payment, manager advances to `delivered`
//!
//! Run with: cargo run --bin order-simulator
//!
//! Configuration comes from `ORDER_*` environment variables, see
//! `photo_order_engine::config`. Log level via `RUST_LOG`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use photo_order_engine::batching::{BatchConfirmation, ConfirmationSink};
use photo_order_engine::catalog::{InMemoryProductSource, ProductCatalog};
use photo_order_engine::crop::{CenterCropClassifier, CropAnalyzer, ImageData, InMemoryPhotoSource};
use photo_order_engine::domain::{
    DeliveryDetails, DeliveryType, PriceTier, Product, ProductId, PromoCode, Promocode, UserId,
};
use photo_order_engine::pricing::PriceLine;
use photo_order_engine::service::{AddPhotoRequest, ReceiptOutcome};
use photo_order_engine::state_machine::LifecycleCommand;
use photo_order_engine::{
    BurstKey, EngineConfig, EventSourcedOrderService, InMemoryOrderStore, OrderService,
    UploadBatcher,
};

/// Prints confirmations the way the chat layer would send them
struct LoggingSink;

#[async_trait]
impl ConfirmationSink for LoggingSink {
    async fn emit(&self, confirmation: BatchConfirmation) {
        info!(
            "📨 {} photo(s) added, {} in the order",
            confirmation.added_count, confirmation.total_photo_count
        );
    }
}

fn catalog_products() -> Result<Vec<Product>> {
    let tiers = [PriceTier::new(30, 18), PriceTier::new(60, 15)];
    Ok(vec![
        Product::builder(ProductId(1), "polaroid-classic", 20)
            .name("Polaroid classic", "Classic")
            .tiered(tiers)
            .pricing_group("polaroid")
            .aspect_ratio(0.76)
            .sort_order(1)
            .build()?,
        Product::builder(ProductId(2), "polaroid-wide", 20)
            .name("Polaroid wide", "Wide")
            .tiered(tiers)
            .pricing_group("polaroid")
            .aspect_ratio(1.25)
            .sort_order(2)
            .build()?,
        Product::builder(ProductId(3), "photo-10x15", 25)
            .name("Photo 10x15", "10x15")
            .aspect_ratio(1.5)
            .sort_order(3)
            .build()?,
    ])
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🚀 Starting order simulator");

    let config = EngineConfig::from_env().context("Failed to load engine configuration")?;
    info!("📋 Configuration loaded:");
    info!("  - Minimum photos: {}", config.min_photos);
    info!("  - Crop review: {}", config.crop_review_mode);
    info!("  - Album delay: {:?}", config.batching.album_delay);

    let source = Arc::new(InMemoryProductSource::new(catalog_products()?));
    let catalog = Arc::new(
        ProductCatalog::load(source)
            .await
            .context("Failed to load product catalog")?,
    );

    let store = Arc::new(InMemoryOrderStore::with_promocodes([Promocode::percent(
        PromoCode::new("SAVE10")?,
        10,
    )?
    .with_description("10% off photos")]));

    let photos = Arc::new(InMemoryPhotoSource::new());
    let crops = CropAnalyzer::new(
        Arc::new(CenterCropClassifier::default()),
        photos.clone(),
        config.classifier.clone(),
    );
    let batch_settings = config.batching;
    let service = Arc::new(EventSourcedOrderService::new(store, catalog, crops, config));
    let batcher = UploadBatcher::new(service.clone(), Arc::new(LoggingSink), batch_settings);

    let user = UserId(1001);
    let order = service.start_order(user).await?;
    info!("🧾 Draft order {} opened", order.id);

    // One album: 20 classic + 15 wide
    let album = BurstKey::for_upload(Some("album-1"), user);
    for i in 0..35 {
        let product = if i < 20 { ProductId(1) } else { ProductId(2) };
        let file_ref = format!("upload-{:03}", i);
        photos.insert(&file_ref, ImageData::new(vec![0; 64]).with_dimensions(3000, 2000));
        service
            .add_photo(order.id, AddPhotoRequest::new(product, file_ref))
            .await?;
        batcher.on_photo_uploaded(album.clone(), order.id);
    }
    tokio::time::sleep(batch_settings.album_delay + Duration::from_millis(200)).await;

    let breakdown = service.price_breakdown(order.id).await?;
    for line in &breakdown.lines {
        match line {
            PriceLine::Product {
                product_id,
                count,
                unit_price,
                cost,
            } => info!("  - product {}: {} x {} = {}", product_id, count, unit_price, cost),
            PriceLine::Group {
                group,
                count,
                unit_price,
                cost,
                ..
            } => info!("  - group {}: {} x {} = {}", group, count, unit_price, cost),
        }
    }
    info!("💰 Photos cost: {}", breakdown.total);

    let finished = service.finish_photos(order.id).await?;
    info!(
        "✂️  Crop review shown: {} ({} need review)",
        finished.review.show_review, finished.review.needs_review
    );
    if let Some(hint) = &finished.hint {
        info!("💡 {}", hint);
    }
    service.accept_auto_crops(order.id).await?;

    let order = service
        .set_delivery(
            order.id,
            DeliveryDetails::new(DeliveryType::Ozon)
                .with_city("Moscow")
                .with_address("Tverskaya 1")
                .with_phone("+7 900 000-00-00"),
        )
        .await?;
    let order = service.apply_promo(order.id, " save10 ", false).await?;
    info!(
        "🏷️  Photos {} + delivery {} - discount {} = {}",
        order.photos_cost,
        order.delivery_cost,
        order.discount,
        order.total_cost()
    );

    let order = service.submit_for_payment(order.id).await?;
    info!("⏳ Order {} is {}", order.id, order.status);

    match service.submit_receipt(order.id, "receipt-1".to_string()).await? {
        ReceiptOutcome::Paid(order) => info!("✅ Order {} paid", order.id),
        ReceiptOutcome::AlreadyPaid(_) => info!("Order was already paid"),
    }
    if let ReceiptOutcome::AlreadyPaid(_) = service
        .submit_receipt(order.id, "receipt-2".to_string())
        .await?
    {
        info!("🔁 Second receipt ignored, managers not notified again");
    }

    for command in [
        LifecycleCommand::Confirm,
        LifecycleCommand::StartPrinting,
        LifecycleCommand::MarkReady,
        LifecycleCommand::Ship,
        LifecycleCommand::Deliver,
    ] {
        service.transition_status(order.id, command).await?;
    }

    let order = service.get_order(order.id).await?;
    info!(
        "📦 Order {} finished as {} after {} events",
        order
            .order_number
            .as_ref()
            .map(|n| n.to_string())
            .unwrap_or_default(),
        order.status,
        order.version
    );
    Ok(())
}
