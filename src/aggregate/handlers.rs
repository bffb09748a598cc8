// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Command Handlers for the Order Aggregate
//!
//! Command handlers are pure functions that:
//! 1. Take current state + command (+ the pricing context where costs change)
//! 2. Validate business rules
//! 3. Return Event (success) or Error (validation failure)
//!
//! ```text
//! handle_command(State, Command) → Result<Event, CommandError>
//! ```
//!
//! Handlers returning `Option` report "nothing to do" as `None`; the caller
//! must not append anything or notify anyone in that case.

use crate::aggregate::commands::*;
use crate::aggregate::order::OrderState;
use crate::catalog::CatalogSnapshot;
use crate::domain::invariants::{
    validate_crop, validate_file_reference, validate_purchasable, validate_receipt_reference,
    validate_submission, validate_subscription,
};
use crate::domain::{
    AppliedPromo, DeliveryDetails, DeliveryPrices, DiscountRule, OrderId, Photo, PhotoId,
    ProductId, ValidationError,
};
use crate::events::*;
use crate::pricing::{calculate_price, PhotoCounts};
use crate::promo::{validate_promo, PromoContext};
use crate::state_machine::{
    LifecycleCommand, OrderStatus, StateMachine, TransitionError,
};

/// Command validation error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// Order has no events yet
    #[error("Order not initialized")]
    NotInitialized,

    /// Order already exists
    #[error("Order already initialized")]
    AlreadyInitialized,

    /// Operation not allowed in the current status
    #[error("Cannot {operation} while order is {status}")]
    InvalidState {
        operation: &'static str,
        status: OrderStatus,
    },

    /// Lifecycle transition rejected
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Photo {0} not found in order")]
    PhotoNotFound(PhotoId),

    #[error("Product {0} not found")]
    ProductNotFound(ProductId),
}

impl CommandError {
    /// Rejected because of the order's current status
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CommandError::InvalidState { .. }
                | CommandError::Transition(_)
                | CommandError::AlreadyInitialized
        )
    }
}

/// Everything a handler needs to recompute costs
#[derive(Debug, Clone, Copy)]
pub struct PricingContext<'a> {
    pub catalog: &'a CatalogSnapshot,
    pub delivery_prices: &'a DeliveryPrices,
}

impl<'a> PricingContext<'a> {
    pub fn new(catalog: &'a CatalogSnapshot, delivery_prices: &'a DeliveryPrices) -> Self {
        Self {
            catalog,
            delivery_prices,
        }
    }

    /// Cost fields for a photo set, delivery choice and promo
    ///
    /// The discount is recomputed from the promo rule and capped at the new
    /// photos cost; delivery honours the free-delivery threshold.
    pub fn costs_for(
        &self,
        counts: &PhotoCounts,
        delivery: Option<&DeliveryDetails>,
        promo: Option<&AppliedPromo>,
    ) -> CostSnapshot {
        let photos_cost = calculate_price(counts, self.catalog);
        CostSnapshot {
            photos_cost,
            delivery_cost: delivery
                .map(|d| self.delivery_prices.cost_for(d.delivery_type, photos_cost))
                .unwrap_or(0),
            discount: promo.map(|p| p.discount_for(photos_cost)).unwrap_or(0),
        }
    }
}

fn require_initialized(state: &OrderState) -> Result<(), CommandError> {
    if !state.is_initialized() {
        return Err(CommandError::NotInitialized);
    }
    Ok(())
}

fn require_photo_changes(state: &OrderState, operation: &'static str) -> Result<(), CommandError> {
    require_initialized(state)?;
    if !state.status.allows_photo_changes() {
        return Err(CommandError::InvalidState {
            operation,
            status: state.status,
        });
    }
    Ok(())
}

fn require_checkout_changes(
    state: &OrderState,
    operation: &'static str,
) -> Result<(), CommandError> {
    require_initialized(state)?;
    if !state.status.allows_checkout_changes() {
        return Err(CommandError::InvalidState {
            operation,
            status: state.status,
        });
    }
    Ok(())
}

fn require_photo(state: &OrderState, photo_id: PhotoId) -> Result<&Photo, CommandError> {
    state
        .photo(photo_id)
        .ok_or(CommandError::PhotoNotFound(photo_id))
}

/// Handle CreateOrder command
///
/// # Business Rules
/// - Order must not already exist
pub fn handle_create_order(
    state: &OrderState,
    command: CreateOrderCommand,
    order_id: OrderId,
) -> Result<OrderCreated, CommandError> {
    if state.is_initialized() {
        return Err(CommandError::AlreadyInitialized);
    }

    Ok(OrderCreated {
        meta: EventMetadata::new(order_id, command.timestamp, command.correlation_id),
        user_id: command.user_id,
        order_number: command.order_number,
    })
}

/// Handle AddPhoto command
///
/// # Business Rules
/// - Order must be a draft
/// - File reference must not be empty
/// - Product must exist, be active, and not be a category with variants
/// - Photo goes to the next position; costs are recomputed
pub fn handle_add_photo(
    state: &OrderState,
    command: AddPhotoCommand,
    pricing: &PricingContext<'_>,
) -> Result<PhotoAdded, CommandError> {
    require_photo_changes(state, "add photos")?;
    validate_file_reference(&command.file_ref)?;

    let product = pricing
        .catalog
        .get(command.product_id)
        .ok_or(CommandError::ProductNotFound(command.product_id))?;
    validate_purchasable(product, pricing.catalog.has_active_children(product.id))?;

    let mut counts = state.photo_counts();
    *counts.entry(product.id).or_default() += 1;
    let costs = pricing.costs_for(&counts, state.delivery.as_ref(), state.promo.as_ref());

    Ok(PhotoAdded {
        meta: EventMetadata::new(state.id, command.timestamp, command.correlation_id),
        photo: Photo {
            id: command.photo_id,
            product_id: product.id,
            file_ref: command.file_ref,
            thumbnail_ref: command.thumbnail_ref,
            position: state.next_position,
            is_document: command.is_document,
            auto_crop: None,
            final_crop: None,
            crop_confirmed: false,
            added_at: command.timestamp,
        },
        costs,
    })
}

/// Handle RemovePhoto command
///
/// # Business Rules
/// - Order must be a draft
/// - Photo must belong to the order
/// - Remaining positions are untouched; costs are recomputed
pub fn handle_remove_photo(
    state: &OrderState,
    command: RemovePhotoCommand,
    pricing: &PricingContext<'_>,
) -> Result<PhotoRemoved, CommandError> {
    require_photo_changes(state, "remove photos")?;
    let photo = require_photo(state, command.photo_id)?;

    let mut counts = state.photo_counts();
    if let Some(count) = counts.get_mut(&photo.product_id) {
        *count -= 1;
    }
    let costs = pricing.costs_for(&counts, state.delivery.as_ref(), state.promo.as_ref());

    Ok(PhotoRemoved {
        meta: EventMetadata::new(state.id, command.timestamp, command.correlation_id),
        photo_id: photo.id,
        costs,
    })
}

/// Handle RecordAutoCrop command
pub fn handle_record_auto_crop(
    state: &OrderState,
    command: RecordAutoCropCommand,
) -> Result<AutoCropRecorded, CommandError> {
    require_photo_changes(state, "crop photos")?;
    let photo = require_photo(state, command.photo_id)?;

    Ok(AutoCropRecorded {
        meta: EventMetadata::new(state.id, command.timestamp, command.correlation_id),
        photo_id: photo.id,
        auto_crop: command.auto_crop,
    })
}

/// Handle ConfirmCrops command
///
/// # Business Rules
/// - Order must be a draft
/// - Every photo must belong to the order and every rect must have an area
pub fn handle_confirm_crops(
    state: &OrderState,
    command: ConfirmCropsCommand,
) -> Result<CropsConfirmed, CommandError> {
    require_photo_changes(state, "crop photos")?;

    let mut crops = Vec::with_capacity(command.crops.len());
    for (photo_id, rect) in command.crops {
        require_photo(state, photo_id)?;
        validate_crop(photo_id, &rect)?;
        crops.push((photo_id, Some(rect)));
    }

    Ok(CropsConfirmed {
        meta: EventMetadata::new(state.id, command.timestamp, command.correlation_id),
        crops,
    })
}

/// Handle AcceptAutoCrops command
///
/// Confirms every unconfirmed photo with its auto crop, or with no crop when
/// the classifier never ran. `None` when nothing is left to confirm.
pub fn handle_accept_auto_crops(
    state: &OrderState,
    command: AcceptAutoCropsCommand,
) -> Result<Option<CropsConfirmed>, CommandError> {
    require_photo_changes(state, "crop photos")?;

    let crops: Vec<_> = state
        .photos
        .iter()
        .filter(|p| !p.crop_confirmed)
        .map(|p| (p.id, p.auto_crop.map(|crop| crop.rect)))
        .collect();

    if crops.is_empty() {
        return Ok(None);
    }

    Ok(Some(CropsConfirmed {
        meta: EventMetadata::new(state.id, command.timestamp, command.correlation_id),
        crops,
    }))
}

/// Handle SetDelivery command
///
/// # Business Rules
/// - Order must be a draft or waiting for payment
/// - Delivery cost comes from configuration, free above the threshold
pub fn handle_set_delivery(
    state: &OrderState,
    command: SetDeliveryCommand,
    delivery_prices: &DeliveryPrices,
) -> Result<DeliverySet, CommandError> {
    require_checkout_changes(state, "change delivery")?;

    let costs = CostSnapshot {
        delivery_cost: delivery_prices.cost_for(command.delivery.delivery_type, state.photos_cost),
        ..state.costs()
    };

    Ok(DeliverySet {
        meta: EventMetadata::new(state.id, command.timestamp, command.correlation_id),
        delivery: command.delivery,
        costs,
    })
}

/// Handle ApplyPromo command
///
/// # Business Rules
/// - Order must be a draft or waiting for payment
/// - Re-applying the current code changes nothing (`None`)
/// - Subscription requirement is checked against the caller's answer
/// - Validator runs against the photos cost and count at command time
/// - Discount is capped at the photos cost
pub fn handle_apply_promo(
    state: &OrderState,
    command: ApplyPromoCommand,
) -> Result<Option<PromoApplied>, CommandError> {
    require_checkout_changes(state, "apply a promo code")?;

    let promo = command.promo;
    if state.promo.as_ref().map(|p| &p.code) == Some(&promo.code) {
        return Ok(None);
    }

    validate_subscription(
        &promo.code,
        promo.require_subscription,
        command.subscription_confirmed,
    )?;

    let context = PromoContext::new(state.photos_cost, state.photo_count(), command.timestamp);
    validate_promo(&promo, &context).map_err(ValidationError::from)?;

    let applied = AppliedPromo {
        rule: promo.discount_rule().unwrap_or(DiscountRule::Percent(0)),
        code: promo.code,
    };
    let costs = CostSnapshot {
        discount: applied.discount_for(state.photos_cost),
        ..state.costs()
    };

    Ok(Some(PromoApplied {
        meta: EventMetadata::new(state.id, command.timestamp, command.correlation_id),
        replaced: state.promo.as_ref().map(|p| p.code.clone()),
        promo: applied,
        costs,
    }))
}

/// Handle SubmitReceipt command
///
/// # Business Rules
/// - Already paid: idempotent, `None`
/// - Receipt reference must not be empty
/// - Only accepted while waiting for payment
pub fn handle_submit_receipt(
    state: &OrderState,
    command: SubmitReceiptCommand,
) -> Result<Option<PaymentReceived>, CommandError> {
    require_initialized(state)?;
    if state.status == OrderStatus::Paid {
        return Ok(None);
    }
    validate_receipt_reference(&command.receipt_ref)?;
    state.status.transition(&LifecycleCommand::RecordPayment)?;

    Ok(Some(PaymentReceived {
        meta: EventMetadata::new(state.id, command.timestamp, command.correlation_id),
        receipt_ref: Some(command.receipt_ref),
    }))
}

/// Handle TransitionStatus command
///
/// # Business Rules
/// - Transition must be allowed by the lifecycle state machine
/// - Leaving draft requires delivery and the photo minimum
/// - Never touches cost fields; recording a payment sets `paid_at`
pub fn handle_transition_status(
    state: &OrderState,
    command: TransitionStatusCommand,
    min_photos: u32,
) -> Result<OrderEvent, CommandError> {
    require_initialized(state)?;

    let (to, output) = state.status.transition(&command.command)?;
    if command.command == LifecycleCommand::SubmitForPayment {
        validate_submission(state.delivery.as_ref(), state.photo_count(), min_photos)?;
    }

    let meta = EventMetadata::new(state.id, command.timestamp, command.correlation_id);
    if output.records_payment {
        return Ok(OrderEvent::PaymentReceived(PaymentReceived {
            meta,
            receipt_ref: None,
        }));
    }

    Ok(OrderEvent::StatusChanged(StatusChanged {
        meta,
        from: state.status,
        to,
        command: command.command,
    }))
}

/// Handle SetManagerNotes command
pub fn handle_set_manager_notes(
    state: &OrderState,
    command: SetManagerNotesCommand,
) -> Result<ManagerNotesSet, CommandError> {
    require_initialized(state)?;

    let notes = command
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(ManagerNotesSet {
        meta: EventMetadata::new(state.id, command.timestamp, command.correlation_id),
        notes,
    })
}
