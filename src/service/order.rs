// Copyright (c) 2025 - Cowboy AI, Inc.
//! Order Service Layer
//!
//! Provides the application service for photo orders through event sourcing.
//!
//! # Transaction Semantics
//!
//! Each mutating call is one transaction:
//! 1. Acquire the order's lock (other orders proceed in parallel)
//! 2. Load events and reconstruct current state
//! 3. Handle command (pure function)
//! 4. Append events with the expected version, plus promo usage changes
//! 5. Fold the new events into the returned state
//!
//! Steps 2-5 are retried with jittered exponential backoff when the store
//! reports a version conflict or an outage. Any other failure leaves the
//! order untouched.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::aggregate::commands::*;
use crate::aggregate::handlers::*;
use crate::aggregate::{apply_event, OrderState};
use crate::batching::PhotoCountSource;
use crate::catalog::ProductCatalog;
use crate::config::EngineConfig;
use crate::crop::{should_show_crop_review, CropAnalyzer, CropReviewDecision};
use crate::domain::invariants::validate_min_photos;
use crate::domain::{
    CropRect, DeliveryDetails, OrderId, OrderNumber, PhotoId, ProductId, PromoCode, UserId,
};
use crate::errors::{NotFound, OrderError, OrderResult};
use crate::event_store::{OrderStore, PromoUsage, StoreError};
use crate::events::OrderEvent;
use crate::pricing::{price_breakdown, price_optimization_hint, PriceBreakdown, PriceHint};
use crate::state_machine::{LifecycleCommand, OrderStatus};

/// Photo upload to attach to an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPhotoRequest {
    pub product_id: ProductId,
    pub file_ref: String,
    pub thumbnail_ref: Option<String>,
    pub is_document: bool,
}

impl AddPhotoRequest {
    pub fn new(product_id: ProductId, file_ref: impl Into<String>) -> Self {
        Self {
            product_id,
            file_ref: file_ref.into(),
            thumbnail_ref: None,
            is_document: false,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail_ref: impl Into<String>) -> Self {
        self.thumbnail_ref = Some(thumbnail_ref.into());
        self
    }

    /// Photo was sent uncompressed
    pub fn as_document(mut self) -> Self {
        self.is_document = true;
        self
    }
}

/// Result of removing a photo
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRemoval {
    pub order: OrderState,
    /// Zero sends the user back to format selection
    pub photos_remaining: u32,
}

/// Result of a receipt upload
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiptOutcome {
    /// Order moved to `paid`; notify the managers
    Paid(OrderState),
    /// Order was already paid; nothing changed, do not notify again
    AlreadyPaid(OrderState),
}

impl ReceiptOutcome {
    pub fn order(&self) -> &OrderState {
        match self {
            ReceiptOutcome::Paid(order) | ReceiptOutcome::AlreadyPaid(order) => order,
        }
    }
}

/// Result of "finish photos"
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedPhotos {
    /// Order with an auto crop on every photo
    pub order: OrderState,
    pub review: CropReviewDecision,
    pub hint: Option<PriceHint>,
}

/// Photo order service
///
/// Defines the application service interface used by the conversation layer.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// The user's draft order, created when there is none
    async fn start_order(&self, user_id: UserId) -> OrderResult<OrderState>;

    /// New draft order; conflict if the user already has one
    async fn create_order(&self, user_id: UserId) -> OrderResult<OrderState>;

    async fn add_photo(&self, order_id: OrderId, request: AddPhotoRequest)
        -> OrderResult<OrderState>;

    async fn remove_photo(&self, order_id: OrderId, photo_id: PhotoId)
        -> OrderResult<PhotoRemoval>;

    async fn set_delivery(
        &self,
        order_id: OrderId,
        delivery: DeliveryDetails,
    ) -> OrderResult<OrderState>;

    /// Apply a promo code typed by the user
    ///
    /// # Parameters
    /// - `code`: raw user input, matched case-insensitively
    /// - `subscription_confirmed`: the caller's own channel subscription check
    async fn apply_promo(
        &self,
        order_id: OrderId,
        code: &str,
        subscription_confirmed: bool,
    ) -> OrderResult<OrderState>;

    /// `draft → pending_payment`
    async fn submit_for_payment(&self, order_id: OrderId) -> OrderResult<OrderState>;

    /// `pending_payment → paid`, idempotent once paid
    async fn submit_receipt(
        &self,
        order_id: OrderId,
        receipt_ref: String,
    ) -> OrderResult<ReceiptOutcome>;

    /// Any lifecycle move, including manager actions
    async fn transition_status(
        &self,
        order_id: OrderId,
        command: LifecycleCommand,
    ) -> OrderResult<OrderState>;

    /// Classify photos lacking an auto crop and run the crop review gate
    async fn finish_photos(&self, order_id: OrderId) -> OrderResult<FinishedPhotos>;

    async fn confirm_crops(
        &self,
        order_id: OrderId,
        crops: Vec<(PhotoId, CropRect)>,
    ) -> OrderResult<OrderState>;

    /// Keep the auto crop of every photo not yet confirmed
    async fn accept_auto_crops(&self, order_id: OrderId) -> OrderResult<OrderState>;

    async fn set_manager_notes(
        &self,
        order_id: OrderId,
        notes: Option<String>,
    ) -> OrderResult<OrderState>;

    async fn get_order(&self, order_id: OrderId) -> OrderResult<OrderState>;

    async fn photo_count(&self, order_id: OrderId) -> OrderResult<u32>;

    /// Per-product and per-group price lines for the current photos
    async fn price_breakdown(&self, order_id: OrderId) -> OrderResult<PriceBreakdown>;

    /// All orders of a user, oldest first
    async fn list_user_orders(&self, user_id: UserId) -> OrderResult<Vec<OrderState>>;
}

/// Events and promo usage produced by one command
struct Decision {
    events: Vec<OrderEvent>,
    promo_usage: PromoUsage,
}

impl Decision {
    fn none() -> Self {
        Self::many(Vec::new())
    }

    fn single(event: OrderEvent) -> Self {
        Self::many(vec![event])
    }

    fn many(events: Vec<OrderEvent>) -> Self {
        Self {
            events,
            promo_usage: PromoUsage::none(),
        }
    }
}

/// One async mutex per key, created on demand
struct LockMap<K> {
    locks: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K: Eq + Hash + Copy> LockMap<K> {
    const PRUNE_ABOVE: usize = 1024;

    fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() > Self::PRUNE_ABOVE {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(locks.entry(key).or_default())
        };
        lock.lock_owned().await
    }
}

fn stamp() -> (DateTime<Utc>, Uuid) {
    (Utc::now(), Uuid::now_v7())
}

/// Event-sourced implementation of OrderService
pub struct EventSourcedOrderService {
    store: Arc<dyn OrderStore>,
    catalog: Arc<ProductCatalog>,
    crops: CropAnalyzer,
    config: EngineConfig,
    order_locks: LockMap<OrderId>,
    user_locks: LockMap<UserId>,
}

impl EventSourcedOrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<ProductCatalog>,
        crops: CropAnalyzer,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            crops,
            config,
            order_locks: LockMap::new(),
            user_locks: LockMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    fn backoff(&self) -> ExponentialBuilder {
        self.config.store_retry.backoff()
    }

    /// Load current state from the store
    async fn load_state(&self, order_id: OrderId) -> OrderResult<OrderState> {
        let events: Vec<OrderEvent> = self
            .store
            .read_events(order_id)
            .await?
            .into_iter()
            .map(|stored| stored.data)
            .collect();

        let state = OrderState::from_events(&events);
        if !state.is_initialized() {
            return Err(OrderError::NotFound(NotFound::Order(order_id)));
        }
        Ok(state)
    }

    /// Load, decide and append under the order's lock
    ///
    /// Returns the new state and whether anything was appended.
    async fn execute<F>(&self, order_id: OrderId, decide: F) -> OrderResult<(OrderState, bool)>
    where
        F: Fn(&OrderState) -> OrderResult<Decision> + Send + Sync,
    {
        let _guard = self.order_locks.acquire(order_id).await;

        (|| async {
            let state = self.load_state(order_id).await?;
            let decision = decide(&state)?;
            if decision.events.is_empty() {
                return Ok((state, false));
            }

            let version = self
                .store
                .append(
                    order_id,
                    decision.events.clone(),
                    state.version,
                    decision.promo_usage,
                )
                .await?;
            debug!("Order {} now at version {}", order_id, version);

            let state = decision.events.iter().fold(state, apply_event);
            Ok::<_, OrderError>((state, true))
        })
        .retry(self.backoff())
        .when(OrderError::is_retryable)
        .notify(|e: &OrderError, delay: Duration| {
            warn!("Order {} write failed, retrying in {:?}: {}", order_id, delay, e);
        })
        .await
    }

    async fn mutate<F>(&self, order_id: OrderId, decide: F) -> OrderResult<OrderState>
    where
        F: Fn(&OrderState) -> OrderResult<Decision> + Send + Sync,
    {
        self.execute(order_id, decide).await.map(|(state, _)| state)
    }

    /// Newest draft of a user
    async fn find_draft(&self, user_id: UserId) -> OrderResult<Option<OrderState>> {
        for order_id in self.store.orders_for_user(user_id).await?.into_iter().rev() {
            let state = self.load_state(order_id).await?;
            if state.status == OrderStatus::Draft {
                return Ok(Some(state));
            }
        }
        Ok(None)
    }

    /// Create a draft, regenerating the order number on collision
    async fn open_order(&self, user_id: UserId) -> OrderResult<OrderState> {
        let order_id = OrderId::new();
        let correlation_id = Uuid::now_v7();

        let state = (|| async {
            let timestamp = Utc::now();
            let initial = OrderState::default_for(order_id);
            let command = CreateOrderCommand {
                user_id,
                order_number: OrderNumber::random(timestamp),
                timestamp,
                correlation_id,
            };
            let event = OrderEvent::OrderCreated(handle_create_order(&initial, command, order_id)?);

            match self
                .store
                .append(order_id, vec![event.clone()], 0, PromoUsage::none())
                .await
            {
                Ok(_) => Ok::<_, OrderError>(apply_event(initial, &event)),
                Err(StoreError::DuplicateOrderNumber(number)) => Err(OrderError::Transient(
                    format!("order number {} collided", number),
                )),
                Err(e) => Err(e.into()),
            }
        })
        .retry(self.backoff())
        .when(OrderError::is_retryable)
        .notify(|e: &OrderError, delay: Duration| {
            debug!("Order creation retrying in {:?}: {}", delay, e);
        })
        .await?;

        if let Some(number) = &state.order_number {
            info!("Order {} ({}) created for user {}", number, order_id, user_id);
        }
        Ok(state)
    }
}

#[async_trait]
impl OrderService for EventSourcedOrderService {
    #[instrument(skip(self))]
    async fn start_order(&self, user_id: UserId) -> OrderResult<OrderState> {
        let _guard = self.user_locks.acquire(user_id).await;

        if let Some(draft) = self.find_draft(user_id).await? {
            debug!("Resuming draft order {} for user {}", draft.id, user_id);
            return Ok(draft);
        }
        self.open_order(user_id).await
    }

    #[instrument(skip(self))]
    async fn create_order(&self, user_id: UserId) -> OrderResult<OrderState> {
        let _guard = self.user_locks.acquire(user_id).await;

        if let Some(draft) = self.find_draft(user_id).await? {
            return Err(OrderError::Conflict(format!(
                "user {} already has draft order {}",
                user_id, draft.id
            )));
        }
        self.open_order(user_id).await
    }

    #[instrument(skip(self))]
    async fn add_photo(
        &self,
        order_id: OrderId,
        request: AddPhotoRequest,
    ) -> OrderResult<OrderState> {
        let catalog = self.catalog.snapshot();
        let pricing = PricingContext::new(&catalog, &self.config.delivery);
        let photo_id = PhotoId::new();
        let (timestamp, correlation_id) = stamp();

        let state = self
            .mutate(order_id, |state| {
                let command = AddPhotoCommand {
                    photo_id,
                    product_id: request.product_id,
                    file_ref: request.file_ref.clone(),
                    thumbnail_ref: request.thumbnail_ref.clone(),
                    is_document: request.is_document,
                    timestamp,
                    correlation_id,
                };
                let event = handle_add_photo(state, command, &pricing)?;
                Ok(Decision::single(OrderEvent::PhotoAdded(event)))
            })
            .await?;

        debug!(
            "Photo {} added to order {}: {} photo(s), photos cost {}",
            photo_id,
            order_id,
            state.photo_count(),
            state.photos_cost
        );
        Ok(state)
    }

    #[instrument(skip(self))]
    async fn remove_photo(&self, order_id: OrderId, photo_id: PhotoId) -> OrderResult<PhotoRemoval> {
        let catalog = self.catalog.snapshot();
        let pricing = PricingContext::new(&catalog, &self.config.delivery);
        let (timestamp, correlation_id) = stamp();

        let state = self
            .mutate(order_id, |state| {
                let command = RemovePhotoCommand {
                    photo_id,
                    timestamp,
                    correlation_id,
                };
                let event = handle_remove_photo(state, command, &pricing)?;
                Ok(Decision::single(OrderEvent::PhotoRemoved(event)))
            })
            .await?;

        debug!("Photo {} removed from order {}", photo_id, order_id);
        Ok(PhotoRemoval {
            photos_remaining: state.photo_count(),
            order: state,
        })
    }

    #[instrument(skip(self))]
    async fn set_delivery(
        &self,
        order_id: OrderId,
        delivery: DeliveryDetails,
    ) -> OrderResult<OrderState> {
        let (timestamp, correlation_id) = stamp();

        let state = self
            .mutate(order_id, |state| {
                let command = SetDeliveryCommand {
                    delivery: delivery.clone(),
                    timestamp,
                    correlation_id,
                };
                let event = handle_set_delivery(state, command, &self.config.delivery)?;
                Ok(Decision::single(OrderEvent::DeliverySet(event)))
            })
            .await?;

        info!(
            "Delivery {} set on order {}, cost {}",
            delivery.delivery_type, order_id, state.delivery_cost
        );
        Ok(state)
    }

    #[instrument(skip(self))]
    async fn apply_promo(
        &self,
        order_id: OrderId,
        code: &str,
        subscription_confirmed: bool,
    ) -> OrderResult<OrderState> {
        let code = PromoCode::new(code)
            .map_err(|_| OrderError::NotFound(NotFound::Promo(code.trim().to_string())))?;
        let promo = self
            .store
            .get_promocode(&code)
            .await?
            .ok_or_else(|| OrderError::NotFound(NotFound::Promo(code.to_string())))?;
        let (timestamp, correlation_id) = stamp();

        let (state, changed) = self
            .execute(order_id, |state| {
                let command = ApplyPromoCommand {
                    promo: promo.clone(),
                    subscription_confirmed,
                    timestamp,
                    correlation_id,
                };
                Ok(match handle_apply_promo(state, command)? {
                    Some(event) => Decision {
                        promo_usage: PromoUsage {
                            consume: Some(event.promo.code.clone()),
                            release: event.replaced.clone(),
                        },
                        events: vec![OrderEvent::PromoApplied(event)],
                    },
                    None => Decision::none(),
                })
            })
            .await?;

        if changed {
            info!(
                "Promo code {} applied to order {}, discount {}",
                code, order_id, state.discount
            );
        } else {
            debug!("Promo code {} already on order {}", code, order_id);
        }
        Ok(state)
    }

    async fn submit_for_payment(&self, order_id: OrderId) -> OrderResult<OrderState> {
        self.transition_status(order_id, LifecycleCommand::SubmitForPayment)
            .await
    }

    #[instrument(skip(self))]
    async fn submit_receipt(
        &self,
        order_id: OrderId,
        receipt_ref: String,
    ) -> OrderResult<ReceiptOutcome> {
        let (timestamp, correlation_id) = stamp();

        let (state, changed) = self
            .execute(order_id, |state| {
                let command = SubmitReceiptCommand {
                    receipt_ref: receipt_ref.clone(),
                    timestamp,
                    correlation_id,
                };
                Ok(match handle_submit_receipt(state, command)? {
                    Some(event) => Decision::single(OrderEvent::PaymentReceived(event)),
                    None => Decision::none(),
                })
            })
            .await?;

        if changed {
            info!("Order {} paid", order_id);
            Ok(ReceiptOutcome::Paid(state))
        } else {
            debug!("Order {} was already paid", order_id);
            Ok(ReceiptOutcome::AlreadyPaid(state))
        }
    }

    #[instrument(skip(self))]
    async fn transition_status(
        &self,
        order_id: OrderId,
        command: LifecycleCommand,
    ) -> OrderResult<OrderState> {
        let min_photos = self.config.min_photos;
        let (timestamp, correlation_id) = stamp();

        let state = self
            .mutate(order_id, |state| {
                let command = TransitionStatusCommand {
                    command,
                    timestamp,
                    correlation_id,
                };
                Ok(Decision::single(handle_transition_status(
                    state, command, min_photos,
                )?))
            })
            .await?;

        info!("Order {} is now {}", order_id, state.status);
        Ok(state)
    }

    #[instrument(skip(self))]
    async fn finish_photos(&self, order_id: OrderId) -> OrderResult<FinishedPhotos> {
        let state = self.load_state(order_id).await?;
        if !state.status.allows_photo_changes() {
            return Err(CommandError::InvalidState {
                operation: "finish photos",
                status: state.status,
            }
            .into());
        }
        validate_min_photos(state.photo_count(), self.config.min_photos)?;

        // Classification runs outside the order lock
        let catalog = self.catalog.snapshot();
        let crops = join_all(state.photos_missing_auto_crop().into_iter().map(|photo| {
            let ratio = catalog
                .get(photo.product_id)
                .and_then(|product| product.aspect_ratio);
            async move { (photo.id, self.crops.analyze(&photo.file_ref, ratio).await) }
        }))
        .await;

        let order = if crops.is_empty() {
            state
        } else {
            let (timestamp, correlation_id) = stamp();
            self.mutate(order_id, |state| {
                let mut events = Vec::with_capacity(crops.len());
                for (photo_id, auto_crop) in &crops {
                    // removed or classified meanwhile
                    let pending = state
                        .photo(*photo_id)
                        .map(|photo| photo.auto_crop.is_none())
                        .unwrap_or(false);
                    if !pending {
                        continue;
                    }
                    let command = RecordAutoCropCommand {
                        photo_id: *photo_id,
                        auto_crop: *auto_crop,
                        timestamp,
                        correlation_id,
                    };
                    events.push(OrderEvent::AutoCropRecorded(handle_record_auto_crop(
                        state, command,
                    )?));
                }
                Ok(Decision::many(events))
            })
            .await?
        };

        let review = should_show_crop_review(
            &order.crop_scores(),
            self.config.crop_threshold,
            self.config.crop_review_mode,
        );
        let hint = price_optimization_hint(&order.photo_counts(), &catalog, &self.config.hint);

        info!(
            "Photos finished on order {}: {} auto-approved, {} need review, review shown: {}",
            order_id, review.auto_approved, review.needs_review, review.show_review
        );
        Ok(FinishedPhotos {
            order,
            review,
            hint,
        })
    }

    #[instrument(skip(self))]
    async fn confirm_crops(
        &self,
        order_id: OrderId,
        crops: Vec<(PhotoId, CropRect)>,
    ) -> OrderResult<OrderState> {
        let (timestamp, correlation_id) = stamp();

        self.mutate(order_id, |state| {
            let command = ConfirmCropsCommand {
                crops: crops.clone(),
                timestamp,
                correlation_id,
            };
            Ok(Decision::single(OrderEvent::CropsConfirmed(
                handle_confirm_crops(state, command)?,
            )))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn accept_auto_crops(&self, order_id: OrderId) -> OrderResult<OrderState> {
        let (timestamp, correlation_id) = stamp();

        self.mutate(order_id, |state| {
            let command = AcceptAutoCropsCommand {
                timestamp,
                correlation_id,
            };
            Ok(match handle_accept_auto_crops(state, command)? {
                Some(event) => Decision::single(OrderEvent::CropsConfirmed(event)),
                None => Decision::none(),
            })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn set_manager_notes(
        &self,
        order_id: OrderId,
        notes: Option<String>,
    ) -> OrderResult<OrderState> {
        let (timestamp, correlation_id) = stamp();

        self.mutate(order_id, |state| {
            let command = SetManagerNotesCommand {
                notes: notes.clone(),
                timestamp,
                correlation_id,
            };
            Ok(Decision::single(OrderEvent::ManagerNotesSet(
                handle_set_manager_notes(state, command)?,
            )))
        })
        .await
    }

    async fn get_order(&self, order_id: OrderId) -> OrderResult<OrderState> {
        self.load_state(order_id).await
    }

    async fn photo_count(&self, order_id: OrderId) -> OrderResult<u32> {
        Ok(self.load_state(order_id).await?.photo_count())
    }

    async fn price_breakdown(&self, order_id: OrderId) -> OrderResult<PriceBreakdown> {
        let state = self.load_state(order_id).await?;
        Ok(price_breakdown(&state.photo_counts(), &self.catalog.snapshot()))
    }

    async fn list_user_orders(&self, user_id: UserId) -> OrderResult<Vec<OrderState>> {
        let mut orders = Vec::new();
        for order_id in self.store.orders_for_user(user_id).await? {
            orders.push(self.load_state(order_id).await?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl PhotoCountSource for EventSourcedOrderService {
    async fn photo_count(&self, order_id: OrderId) -> OrderResult<u32> {
        OrderService::photo_count(self, order_id).await
    }
}
