// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Functional Aggregates
//!
//! This module provides the functional aggregate pattern for event sourcing:
//! - Aggregates are pure functions: State → Command → Result<Event, Error>
//! - State reconstruction via event folding: [Event] → State
//! - No mutations, no side effects
//!
//! # Event Sourcing Pattern
//!
//! ```text
//! Command → Aggregate → Events → OrderStore
//!    ↓          ↓          ↓
//! Intent   Validation  Facts
//! ```
//!
//! # Fold Pattern
//!
//! ```rust,ignore
//! let state = events.iter().fold(OrderState::default_for(id), apply_event);
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use photo_order_engine::aggregate::*;
//!
//! let state = OrderState::from_events(&events);
//! let pricing = PricingContext::new(&catalog, &config.delivery);
//!
//! match handle_add_photo(&state, command, &pricing) {
//!     Ok(event) => {
//!         let event = OrderEvent::PhotoAdded(event);
//!         store.append(state.id, vec![event.clone()], state.version, PromoUsage::none()).await?;
//!         let state = apply_event(state, &event);
//!     }
//!     Err(err) => {
//!         // business rule violation, nothing was written
//!     }
//! }
//! ```
//!
//! # Time as Parameter
//!
//! Handlers never call `Utc::now()`. The timestamp arrives in the command,
//! which keeps replay and tests deterministic.

pub mod commands;
pub mod handlers;
pub mod order;

pub use commands::*;
pub use handlers::*;
pub use order::{apply_event, OrderState};
