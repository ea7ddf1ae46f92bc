//! # Order Lifecycle
//!
//! The transition table that decides which courier action is legal in
//! which order status.
//!
//! ## State Diagram
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────┐  accept  ┌──────────┐  start_delivery  ┌────────────┐    │
//! │   │ Pending │ ───────► │ PickedUp │ ───────────────► │ InTransit  │    │
//! │   └────┬────┘          └────┬─────┘                  └─────┬──────┘    │
//! │        │                    │                              │ complete  │
//! │        │ cancel             │ cancel              cancel   ▼           │
//! │        │                    │                    ┌─────────────────┐   │
//! │        │                    │              ┌──── │    Delivered ■  │   │
//! │        ▼                    ▼              ▼     └─────────────────┘   │
//! │   ┌──────────────────────────────────────────┐                         │
//! │   │               Cancelled ■                │   ■ = terminal          │
//! │   └──────────────────────────────────────────┘                         │
//! │                                                                         │
//! │   `cancel` comes from the backend, never from the courier.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module only answers "is this move legal, and where does it land?".
//! Applying it optimistically and reconciling with the backend lives in
//! `courier-client`.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::OrderStatus;

// =============================================================================
// Order Action
// =============================================================================

/// Something that moves an order forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Accept,
    StartDelivery,
    Complete,
    /// Backend-initiated only.
    Cancel,
}

impl OrderAction {
    pub const ALL: [OrderAction; 4] = [
        OrderAction::Accept,
        OrderAction::StartDelivery,
        OrderAction::Complete,
        OrderAction::Cancel,
    ];

    /// The status this action lands on when it is legal.
    pub const fn target(&self) -> OrderStatus {
        match self {
            OrderAction::Accept => OrderStatus::PickedUp,
            OrderAction::StartDelivery => OrderStatus::InTransit,
            OrderAction::Complete => OrderStatus::Delivered,
            OrderAction::Cancel => OrderStatus::Cancelled,
        }
    }

    /// Whether the courier may trigger this action from the app.
    pub const fn is_courier_initiated(&self) -> bool {
        !matches!(self, OrderAction::Cancel)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderAction::Accept => "accept",
            OrderAction::StartDelivery => "start_delivery",
            OrderAction::Complete => "complete",
            OrderAction::Cancel => "cancel",
        }
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Transition Table
// =============================================================================

impl OrderStatus {
    /// Applies `action` to this status.
    ///
    /// ## Table
    /// | From      | Action         | To        |
    /// |-----------|----------------|-----------|
    /// | Pending   | accept         | PickedUp  |
    /// | PickedUp  | start_delivery | InTransit |
    /// | InTransit | complete       | Delivered |
    /// | non-terminal | cancel      | Cancelled |
    ///
    /// Every other pair is an [`CoreError::InvalidTransition`].
    ///
    /// ## Example
    /// ```rust
    /// use courier_core::{OrderAction, OrderStatus};
    ///
    /// assert_eq!(
    ///     OrderStatus::PickedUp.apply(OrderAction::StartDelivery).unwrap(),
    ///     OrderStatus::InTransit
    /// );
    /// assert!(OrderStatus::Pending.apply(OrderAction::Complete).is_err());
    /// ```
    pub fn apply(self, action: OrderAction) -> CoreResult<OrderStatus> {
        let legal = match (self, action) {
            (OrderStatus::Pending, OrderAction::Accept) => true,
            (OrderStatus::PickedUp, OrderAction::StartDelivery) => true,
            (OrderStatus::InTransit, OrderAction::Complete) => true,
            (from, OrderAction::Cancel) => !from.is_terminal(),
            _ => false,
        };

        if legal {
            Ok(action.target())
        } else {
            Err(CoreError::InvalidTransition {
                from: self,
                to: action.target(),
                action,
            })
        }
    }

    /// Whether `action` is legal from this status.
    #[inline]
    pub fn can_apply(self, action: OrderAction) -> bool {
        self.apply(action).is_ok()
    }

    /// The courier actions offered for an order in this status.
    ///
    /// Drives which buttons the order details screen shows.
    pub fn courier_actions(self) -> Vec<OrderAction> {
        OrderAction::ALL
            .into_iter()
            .filter(|action| action.is_courier_initiated() && self.can_apply(*action))
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
