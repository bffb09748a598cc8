// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Order Aggregate
//!
//! Random sequences of photo edits, delivery and promo changes are run
//! through the command handlers. After every accepted command the order must
//! satisfy its invariants and agree with a replay of its own event stream.

use proptest::prelude::*;
use uuid::Uuid;

use photo_order_engine::aggregate::{
    apply_event, handle_add_photo, handle_apply_promo, handle_create_order,
    handle_remove_photo, handle_set_delivery, AddPhotoCommand, ApplyPromoCommand,
    CreateOrderCommand, OrderState, PricingContext, RemovePhotoCommand, SetDeliveryCommand,
};
use photo_order_engine::domain::{
    DeliveryDetails, DeliveryPrices, DeliveryType, PhotoId, ProductId, Promocode,
};
use photo_order_engine::events::OrderEvent;
use photo_order_engine::pricing::calculate_price;
use photo_order_engine::state_machine::StateInvariant;

use crate::fixtures::*;

#[derive(Debug, Clone)]
enum Edit {
    Add(ProductId),
    /// Index into the current photos, wrapped
    Remove(usize),
    Delivery(DeliveryType),
    Promo(Promocode),
}

// ============================================================================
// Strategies
// ============================================================================

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => prop_oneof![Just(CLASSIC), Just(WIDE), Just(PRINT), Just(MINI)].prop_map(Edit::Add),
        2 => any::<usize>().prop_map(Edit::Remove),
        1 => prop::sample::select(DeliveryType::ALL.to_vec()).prop_map(Edit::Delivery),
        1 => prop_oneof![Just(save10()), Just(minus50())].prop_map(Edit::Promo),
    ]
}

fn edit_sequence() -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(edit(), 0..60)
}

fn free_delivery_threshold() -> impl Strategy<Value = u64> {
    prop_oneof![Just(0u64), 200u64..1500]
}

// ============================================================================
// Driver
// ============================================================================

/// Run edits through the handlers; rejected commands are skipped
fn run(edits: Vec<Edit>, prices: &DeliveryPrices) -> Result<(OrderState, Vec<OrderEvent>), TestCaseError> {
    let catalog = catalog_snapshot();
    let pricing = PricingContext::new(&catalog, prices);
    let ts = fixed_timestamp();

    let mut state = OrderState::default_for(order_id());
    let created = handle_create_order(
        &state,
        CreateOrderCommand {
            user_id: USER_1,
            order_number: order_number(),
            timestamp: ts,
            correlation_id: Uuid::now_v7(),
        },
        order_id(),
    )
    .map_err(|e| TestCaseError::fail(e.to_string()))?;
    let mut events = vec![OrderEvent::OrderCreated(created)];
    state = apply_event(state, &events[0]);

    for edit in edits {
        let event = match edit {
            Edit::Add(product_id) => handle_add_photo(
                &state,
                AddPhotoCommand {
                    photo_id: PhotoId::new(),
                    product_id,
                    file_ref: format!("file-{}", state.next_position),
                    thumbnail_ref: None,
                    is_document: false,
                    timestamp: ts,
                    correlation_id: Uuid::now_v7(),
                },
                &pricing,
            )
            .ok()
            .map(OrderEvent::PhotoAdded),
            Edit::Remove(index) if !state.photos.is_empty() => {
                let photo_id = state.photos[index % state.photos.len()].id;
                handle_remove_photo(
                    &state,
                    RemovePhotoCommand {
                        photo_id,
                        timestamp: ts,
                        correlation_id: Uuid::now_v7(),
                    },
                    &pricing,
                )
                .ok()
                .map(OrderEvent::PhotoRemoved)
            }
            Edit::Remove(_) => None,
            Edit::Delivery(delivery_type) => handle_set_delivery(
                &state,
                SetDeliveryCommand {
                    delivery: DeliveryDetails::new(delivery_type),
                    timestamp: ts,
                    correlation_id: Uuid::now_v7(),
                },
                prices,
            )
            .ok()
            .map(OrderEvent::DeliverySet),
            Edit::Promo(promo) => handle_apply_promo(
                &state,
                ApplyPromoCommand {
                    promo,
                    subscription_confirmed: false,
                    timestamp: ts,
                    correlation_id: Uuid::now_v7(),
                },
            )
            .ok()
            .flatten()
            .map(OrderEvent::PromoApplied),
        };

        if let Some(event) = event {
            state = apply_event(state, &event);
            events.push(event);
            state
                .check_invariants()
                .map_err(|e| TestCaseError::fail(format!("after {} events: {}", events.len(), e)))?;
        }
    }

    Ok((state, events))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Property: Replaying the stream rebuilds the same order
    #[test]
    fn prop_replay_equals_incremental(edits in edit_sequence()) {
        let (state, events) = run(edits, &DeliveryPrices::default())?;

        prop_assert_eq!(OrderState::from_events(&events), state.clone());
        prop_assert_eq!(state.version, events.len() as u64);
    }

    /// Property: Stored costs always match a fresh computation
    #[test]
    fn prop_costs_consistent(edits in edit_sequence(), threshold in free_delivery_threshold()) {
        let prices = DeliveryPrices {
            free_delivery_threshold: threshold,
            ..DeliveryPrices::default()
        };
        let (state, _) = run(edits, &prices)?;

        prop_assert_eq!(
            state.photos_cost,
            calculate_price(&state.photo_counts(), &catalog_snapshot())
        );

        let expected_delivery = state
            .delivery
            .as_ref()
            .map(|d| prices.cost_for(d.delivery_type, state.photos_cost))
            .unwrap_or(0);
        prop_assert_eq!(state.delivery_cost, expected_delivery);

        let expected_discount = state
            .promo
            .as_ref()
            .map(|p| p.discount_for(state.photos_cost))
            .unwrap_or(0);
        prop_assert_eq!(state.discount, expected_discount);
        prop_assert!(state.discount <= state.photos_cost);
    }

    /// Property: Positions are unique, increasing, and below next_position
    #[test]
    fn prop_positions_strictly_increasing(edits in edit_sequence()) {
        let (state, _) = run(edits, &DeliveryPrices::default())?;

        let positions: Vec<u32> = state.photos.iter().map(|p| p.position).collect();
        prop_assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert!(positions.iter().all(|&p| p < state.next_position));
    }
}
