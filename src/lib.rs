// Copyright (c) 2025 - Cowboy AI, Inc.
//! Order lifecycle and pricing engine for a photo printing service
//!
//! This crate provides the core of a chat-driven photo ordering system: the
//! order aggregate and its status machine, tiered and grouped pricing, promo
//! code validation, the upload batch coalescer and the crop review gate.
//!
//! The conversation layer, display strings and storage technology live
//! outside; the engine talks to them through [`event_store::OrderStore`],
//! [`catalog::ProductSource`], [`crop::CropClassifier`],
//! [`crop::PhotoSource`] and [`batching::ConfirmationSink`].

pub mod aggregate;
pub mod batching;
pub mod catalog;
pub mod config;
pub mod crop;
pub mod domain;
pub mod errors;
pub mod event_store;
pub mod events;
pub mod pricing;
pub mod promo;
pub mod service;
pub mod state_machine;

// Re-export commonly used types
pub use aggregate::OrderState;
pub use batching::{BatchConfirmation, BurstKey, UploadBatcher};
pub use catalog::{CatalogSnapshot, ProductCatalog};
pub use config::EngineConfig;
pub use errors::{NotFound, OrderError, OrderResult};
pub use event_store::{InMemoryOrderStore, OrderStore};
pub use events::OrderEvent;
pub use pricing::{calculate_price, price_breakdown, price_optimization_hint};
pub use promo::validate_promo;
pub use service::{EventSourcedOrderService, OrderService};
pub use state_machine::OrderStatus;
