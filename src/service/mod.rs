// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for Photo Orders
//!
//! This module provides the application service layer that orchestrates
//! domain logic, the order store and the external collaborators.
//!
//! # Architecture
//!
//! ```text
//! Conversation layer
//!     ↓
//! Service Layer (this module)
//!     ↓
//! Command Handler → Aggregate → Events
//!     ↓
//! OrderStore (events + promo usage, one transaction)
//! ```
//!
//! # Service Pattern
//!
//! Services coordinate between:
//! - **Command Handlers**: Pure domain logic
//! - **Product Catalog**: Pricing input
//! - **Crop Analyzer**: Classifier with timeout and fallback
//! - **OrderStore**: Persistence with optimistic concurrency
//!
//! # Design Principles
//!
//! 1. **Transaction Boundaries**: One command, one atomic append
//! 2. **Serialised Mutations**: One writer per order at a time
//! 3. **Pure Domain Logic**: Services call pure functions
//! 4. **Async by Default**: All I/O is asynchronous
//!
//! # Example
//!
//! ```rust,ignore
//! use photo_order_engine::service::{EventSourcedOrderService, OrderService};
//!
//! let service = EventSourcedOrderService::new(store, catalog, crops, EngineConfig::default());
//!
//! let order = service.start_order(user_id).await?;
//! let order = service.add_photo(order.id, AddPhotoRequest::new(ProductId(1), "file-1")).await?;
//! ```

pub mod order;

pub use order::{
    AddPhotoRequest, EventSourcedOrderService, FinishedPhotos, OrderService, PhotoRemoval,
    ReceiptOutcome,
};
