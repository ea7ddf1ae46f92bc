//! # Order State Machine
//!
//! Drives courier-initiated transitions with an optimistic update that is
//! either confirmed or rolled back by the backend.
//!
//! ## Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  accept / start_delivery / complete                                    │
//! │                                                                         │
//! │  1. validate id, session, in-flight marker, lifecycle table            │
//! │     (nothing sent on failure)                                          │
//! │  2. set new status in the store ─────────────► OrderEvent::Applied     │
//! │  3. gateway call                                                        │
//! │        │                                                                │
//! │        ├── Ok ──► terminal? move to history ─► OrderEvent::Confirmed   │
//! │        │          (from the step-2 snapshot if a refresh dropped it)   │
//! │        │                                                                │
//! │        └── Err ─► restore prior status ──────► OrderEvent::RolledBack  │
//! │                   SessionExpired? force logout                         │
//! │                   return the error                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! At most one transition per order runs at a time. A second one is
//! rejected with `TransitionInProgress`, not queued.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use courier_core::validation::validate_order_id;
use courier_core::{GeoLocation, Order, OrderAction, OrderStatus};

use crate::error::{ClientError, ClientResult};
use crate::gateway::RemoteGateway;
use crate::orders::events::OrderEvent;
use crate::orders::store::{OrderStore, Snapshot};
use crate::session::SessionManager;

/// Event channel capacity.
const EVENT_CAPACITY: usize = 64;

// =============================================================================
// In-Flight Marker
// =============================================================================

type InFlightSet = Arc<Mutex<HashSet<String>>>;

/// Holds an order's in-flight marker; releases it on drop.
struct InFlightGuard {
    set: InFlightSet,
    order_id: String,
}

impl InFlightGuard {
    fn acquire(set: &InFlightSet, order_id: &str) -> ClientResult<Self> {
        let mut held = set.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(order_id.to_string()) {
            return Err(ClientError::TransitionInProgress {
                order_id: order_id.to_string(),
            });
        }
        Ok(InFlightGuard {
            set: Arc::clone(set),
            order_id: order_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.order_id);
    }
}

/// The backend call behind one courier action.
enum RemoteStep<'a> {
    Accept,
    StartDelivery {
        location: Option<GeoLocation>,
    },
    Complete {
        location: Option<GeoLocation>,
        signature: Option<&'a str>,
    },
}

impl RemoteStep<'_> {
    fn action(&self) -> OrderAction {
        match self {
            RemoteStep::Accept => OrderAction::Accept,
            RemoteStep::StartDelivery { .. } => OrderAction::StartDelivery,
            RemoteStep::Complete { .. } => OrderAction::Complete,
        }
    }
}

// =============================================================================
// State Machine
// =============================================================================

/// Courier-facing order transitions.
pub struct OrderStateMachine {
    store: Arc<OrderStore>,
    session: Arc<SessionManager>,
    gateway: Arc<dyn RemoteGateway>,
    in_flight: InFlightSet,
    events: broadcast::Sender<OrderEvent>,
}

impl OrderStateMachine {
    pub fn new(
        store: Arc<OrderStore>,
        session: Arc<SessionManager>,
        gateway: Arc<dyn RemoteGateway>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        OrderStateMachine {
            store,
            session,
            gateway,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            events,
        }
    }

    /// Events for every transition, in the order they happen.
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.events.subscribe()
    }

    /// True while a transition on `order_id` is waiting for the backend.
    pub fn is_in_flight(&self, order_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(order_id)
    }

    // =========================================================================
    // Courier Actions
    // =========================================================================

    /// `pending → picked_up`
    pub async fn accept(&self, order_id: &str) -> ClientResult<Order> {
        self.run(order_id, RemoteStep::Accept).await
    }

    /// `picked_up → in_transit`
    pub async fn start_delivery(
        &self,
        order_id: &str,
        location: Option<GeoLocation>,
    ) -> ClientResult<Order> {
        self.run(order_id, RemoteStep::StartDelivery { location })
            .await
    }

    /// `in_transit → delivered`; the order moves to history once confirmed.
    pub async fn complete(
        &self,
        order_id: &str,
        location: Option<GeoLocation>,
        signature: Option<&str>,
    ) -> ClientResult<Order> {
        self.run(
            order_id,
            RemoteStep::Complete {
                location,
                signature,
            },
        )
        .await
    }

    /// Records a cancellation the backend reported.
    ///
    /// ## When This Occurs
    /// A refresh or push shows the order cancelled on the backend. There is
    /// no optimistic phase and no remote call; the order moves straight to
    /// history and only `Confirmed` is emitted.
    pub async fn confirm_cancelled(&self, order_id: &str) -> ClientResult<Order> {
        validate_order_id(order_id)?;
        self.session.require_signed_in()?;
        let _guard = InFlightGuard::acquire(&self.in_flight, order_id)?;

        let from = self.current_status(order_id)?;
        let to = from
            .apply(OrderAction::Cancel)
            .map_err(|e| ClientError::from_core(order_id, e))?;

        let order = self
            .store
            .finalize(order_id, to, None, None)
            .ok_or_else(|| self.missing(order_id))?;

        info!(order_id = %order_id, from = %from, "Order cancelled by backend");
        self.emit(OrderEvent::Confirmed {
            order_id: order_id.to_string(),
            from,
            to,
        });
        Ok(order)
    }

    // =========================================================================
    // Protocol
    // =========================================================================

    async fn run(&self, order_id: &str, step: RemoteStep<'_>) -> ClientResult<Order> {
        validate_order_id(order_id)?;
        self.session.require_signed_in()?;
        let _guard = InFlightGuard::acquire(&self.in_flight, order_id)?;

        let action = step.action();
        let from = self.current_status(order_id)?;
        let to = from
            .apply(action)
            .map_err(|e| ClientError::from_core(order_id, e))?;

        self.store.set_status(order_id, to);
        let snapshot = self.store.snapshot(order_id);
        debug!(order_id = %order_id, from = %from, to = %to, "Transition applied");
        self.emit(OrderEvent::Applied {
            order_id: order_id.to_string(),
            from,
            to,
        });

        match self.send(order_id, to, &step).await {
            Ok(completed_at) => self.confirm(order_id, from, to, completed_at, snapshot),
            Err(err) => {
                self.roll_back(order_id, from, to, &err).await;
                Err(err)
            }
        }
    }

    async fn send(
        &self,
        order_id: &str,
        to: OrderStatus,
        step: &RemoteStep<'_>,
    ) -> ClientResult<Option<DateTime<Utc>>> {
        match step {
            RemoteStep::Accept => self.gateway.accept_order(order_id).await.map(|_| None),
            RemoteStep::StartDelivery { location } => self
                .gateway
                .update_order_status(order_id, to, *location)
                .await
                .map(|_| None),
            RemoteStep::Complete {
                location,
                signature,
            } => self
                .gateway
                .complete_delivery(order_id, *location, *signature)
                .await
                .map(|receipt| receipt.completed_at),
        }
    }

    fn confirm(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
        completed_at: Option<DateTime<Utc>>,
        snapshot: Option<Snapshot>,
    ) -> ClientResult<Order> {
        let order = if to.is_terminal() {
            let at = completed_at.unwrap_or_else(Utc::now);
            self.store.finalize(order_id, to, Some(at), snapshot)
        } else {
            self.store
                .cached(order_id)
                .or_else(|| snapshot.and_then(|s| self.store.still_current(s)))
        };

        info!(order_id = %order_id, from = %from, to = %to, "Transition confirmed");
        self.emit(OrderEvent::Confirmed {
            order_id: order_id.to_string(),
            from,
            to,
        });

        order.ok_or_else(|| self.missing(order_id))
    }

    async fn roll_back(
        &self,
        order_id: &str,
        from: OrderStatus,
        attempted: OrderStatus,
        err: &ClientError,
    ) {
        self.store.revert_status(order_id, attempted, from);
        warn!(
            order_id = %order_id,
            from = %from,
            attempted = %attempted,
            error = %err,
            "Transition rolled back"
        );
        self.emit(OrderEvent::RolledBack {
            order_id: order_id.to_string(),
            from,
            attempted,
            reason: err.to_string(),
        });

        if *err == ClientError::SessionExpired {
            self.session.expire().await;
        }
    }

    fn current_status(&self, order_id: &str) -> ClientResult<OrderStatus> {
        self.store
            .status_of(order_id)
            .ok_or_else(|| ClientError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }

    /// The order disappeared mid-transition, usually because of a logout.
    fn missing(&self, order_id: &str) -> ClientError {
        if self.session.is_signed_in() {
            ClientError::OrderNotFound {
                order_id: order_id.to_string(),
            }
        } else {
            ClientError::NotSignedIn
        }
    }

    fn emit(&self, event: OrderEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for OrderStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStateMachine").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_guard_releases_on_drop() {
        let set: InFlightSet = Arc::new(Mutex::new(HashSet::new()));

        let guard = InFlightGuard::acquire(&set, "T1").unwrap();
        assert_eq!(
            InFlightGuard::acquire(&set, "T1").err(),
            Some(ClientError::TransitionInProgress {
                order_id: "T1".into()
            })
        );
        assert!(InFlightGuard::acquire(&set, "T2").is_ok());

        drop(guard);
        assert!(InFlightGuard::acquire(&set, "T1").is_ok());
    }

    #[test]
    fn test_remote_step_actions() {
        assert_eq!(RemoteStep::Accept.action(), OrderAction::Accept);
        assert_eq!(
            RemoteStep::Complete {
                location: None,
                signature: Some("sig"),
            }
            .action(),
            OrderAction::Complete
        );
    }
}
