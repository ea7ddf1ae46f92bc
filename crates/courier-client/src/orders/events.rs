//! Events emitted while an order transition runs.
//!
//! For one transition the order is always `Applied` followed by exactly one
//! of `Confirmed` or `RolledBack`. A remote-reported cancellation has no
//! optimistic phase and emits only `Confirmed`.

use courier_core::OrderStatus;
use serde::Serialize;

/// One step of an order transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderEvent {
    /// The new status is shown locally; the backend has not answered yet.
    Applied {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// The backend accepted the transition.
    Confirmed {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// The backend call failed and the prior status is back.
    RolledBack {
        order_id: String,
        from: OrderStatus,
        attempted: OrderStatus,
        reason: String,
    },
}

impl OrderEvent {
    pub fn order_id(&self) -> &str {
        match self {
            OrderEvent::Applied { order_id, .. }
            | OrderEvent::Confirmed { order_id, .. }
            | OrderEvent::RolledBack { order_id, .. } => order_id,
        }
    }
}
