// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! - `pricing_properties`: determinism, tier monotonicity, group pooling, discount cap
//! - `order_properties`: invariants and replay under random photo edits

mod order_properties;
mod pricing_properties;
