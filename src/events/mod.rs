// Copyright (c) 2025 - Cowboy AI, Inc.
//! Order Domain Events
//!
//! Events are immutable facts representing state changes that have occurred.
//!
//! # Event Sourcing Principles
//!
//! 1. **Events are immutable**: Once created, events never change
//! 2. **Events are past tense**: Named for what happened (PhotoAdded, not AddPhoto)
//! 3. **Events include metadata**: correlation_id, causation_id, timestamp
//! 4. **Events are versioned**: event_version field for schema evolution
//!
//! # Event Flow
//!
//! ```text
//! Command → Aggregate → Event → OrderStore
//!   (what to do)  (validate)  (what happened)  (persist)
//! ```
//!
//! Every command produces its events in a single atomic append, so a failed
//! command never leaves a partial change behind.

pub mod order;

pub use order::{
    AutoCropRecorded, CostSnapshot, CropsConfirmed, DeliverySet, EventMetadata, ManagerNotesSet,
    OrderCreated, OrderEvent, PaymentReceived, PhotoAdded, PhotoRemoved, PromoApplied,
    StatusChanged,
};
