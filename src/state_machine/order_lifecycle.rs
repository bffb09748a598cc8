// Copyright (c) 2025 - Cowboy AI, Inc.
//! Order Lifecycle State Machine
//!
//! Formal FSM for the order status. Uses the generic [`StateMachine`] trait
//! from the parent module.
//!
//! # States
//!
//! ```text
//! draft → pending_payment → paid → confirmed → printing → ready → shipped → delivered
//!   └──────────┴─────────────┴───────┴───────────┴─────────┴────────┴──→ cancelled
//! ```
//!
//! `delivered` and `cancelled` are terminal.
//!
//! # Inputs
//!
//! Each forward command is accepted only from its immediate predecessor.
//! `Cancel` is accepted from any non-terminal state. Preconditions that need
//! more than the status (delivery chosen, photo minimum) are checked by the
//! command handlers.
//!
//! # Output
//!
//! [`TransitionOutput`] tells the aggregate whether the transition records a
//! payment, the only transition that touches a field besides the status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{StateMachine, TransitionError, TransitionResult};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Draft,
    PendingPayment,
    Paid,
    Confirmed,
    Printing,
    Ready,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Draft,
        OrderStatus::PendingPayment,
        OrderStatus::Paid,
        OrderStatus::Confirmed,
        OrderStatus::Printing,
        OrderStatus::Ready,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Printing => "printing",
            OrderStatus::Ready => "ready",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Photos can be added, removed and cropped
    pub fn allows_photo_changes(&self) -> bool {
        matches!(self, OrderStatus::Draft)
    }

    /// Delivery and promo code can still change
    pub fn allows_checkout_changes(&self) -> bool {
        matches!(self, OrderStatus::Draft | OrderStatus::PendingPayment)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Lifecycle command (FSM input)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleCommand {
    /// Checkout finished, waiting for payment
    SubmitForPayment,
    /// Payment receipt received
    RecordPayment,
    /// Manager confirmed the payment
    Confirm,
    StartPrinting,
    MarkReady,
    Ship,
    Deliver,
    Cancel,
}

impl LifecycleCommand {
    pub const ALL: [LifecycleCommand; 8] = [
        LifecycleCommand::SubmitForPayment,
        LifecycleCommand::RecordPayment,
        LifecycleCommand::Confirm,
        LifecycleCommand::StartPrinting,
        LifecycleCommand::MarkReady,
        LifecycleCommand::Ship,
        LifecycleCommand::Deliver,
        LifecycleCommand::Cancel,
    ];

    /// Status this command leads to
    pub fn target(&self) -> OrderStatus {
        match self {
            LifecycleCommand::SubmitForPayment => OrderStatus::PendingPayment,
            LifecycleCommand::RecordPayment => OrderStatus::Paid,
            LifecycleCommand::Confirm => OrderStatus::Confirmed,
            LifecycleCommand::StartPrinting => OrderStatus::Printing,
            LifecycleCommand::MarkReady => OrderStatus::Ready,
            LifecycleCommand::Ship => OrderStatus::Shipped,
            LifecycleCommand::Deliver => OrderStatus::Delivered,
            LifecycleCommand::Cancel => OrderStatus::Cancelled,
        }
    }

    /// Only status the command is accepted from; `None` for cancel
    pub fn source(&self) -> Option<OrderStatus> {
        match self {
            LifecycleCommand::SubmitForPayment => Some(OrderStatus::Draft),
            LifecycleCommand::RecordPayment => Some(OrderStatus::PendingPayment),
            LifecycleCommand::Confirm => Some(OrderStatus::Paid),
            LifecycleCommand::StartPrinting => Some(OrderStatus::Confirmed),
            LifecycleCommand::MarkReady => Some(OrderStatus::Printing),
            LifecycleCommand::Ship => Some(OrderStatus::Ready),
            LifecycleCommand::Deliver => Some(OrderStatus::Shipped),
            LifecycleCommand::Cancel => None,
        }
    }

    /// Command that moves an order into `target`
    pub fn for_target(target: OrderStatus) -> Option<LifecycleCommand> {
        LifecycleCommand::ALL
            .into_iter()
            .find(|command| command.target() == target)
    }
}

/// Transition output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionOutput {
    /// `paid_at` must be set
    pub records_payment: bool,
}

impl StateMachine for OrderStatus {
    type Input = LifecycleCommand;
    type Output = TransitionOutput;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self.to_string()));
        }

        let target = input.target();
        match input.source() {
            Some(source) if source != *self => Err(TransitionError::InvalidTransition {
                from: self.to_string(),
                to: target.to_string(),
            }),
            _ => Ok((
                target,
                TransitionOutput {
                    records_payment: *input == LifecycleCommand::RecordPayment,
                },
            )),
        }
    }

    fn valid_inputs(&self) -> Vec<Self::Input> {
        LifecycleCommand::ALL
            .into_iter()
            .filter(|command| self.can_transition(command))
            .collect()
    }
}
