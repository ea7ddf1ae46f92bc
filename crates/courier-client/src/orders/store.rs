//! # Order Store
//!
//! The cached `active` and `history` views of the courier's orders.
//!
//! ## Views
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  refresh_active()  ──► getActiveOrders ──┐                             │
//! │  refresh_history() ──► getOrderHistory ──┤   route by status           │
//! │  fetch_details(id) ──► getOrderDetails ──┤                             │
//! │                                          ▼                             │
//! │              ┌──────────────────┐   ┌──────────────────┐               │
//! │              │ active           │   │ history          │               │
//! │              │ non-terminal     │◄─►│ terminal         │               │
//! │              └──────────────────┘   └──────────────────┘               │
//! │                    an id lives in exactly one view                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Last Write Wins
//! Every refresh takes a ticket for its view. When the response arrives it
//! is applied only if no newer refresh of that view has been started since;
//! otherwise it is dropped as [`RefreshOutcome::Superseded`].

use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::{debug, info};

use courier_core::validation::validate_order_id;
use courier_core::{Order, OrderStatus};

use crate::error::{ClientError, ClientResult};
use crate::gateway::RemoteGateway;
use crate::session::SessionManager;

/// What happened to a refresh response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The view was replaced and now holds `count` orders.
    Applied { count: usize },
    /// A newer refresh of the same view was started; this one was dropped.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Active,
    History,
}

impl View {
    fn of(status: OrderStatus) -> Self {
        if status.is_terminal() {
            View::History
        } else {
            View::Active
        }
    }
}

/// An order as it was cached when a transition started.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    epoch: u64,
    order: Order,
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Default)]
struct Views {
    active: Vec<Order>,
    history: Vec<Order>,
    active_ticket: u64,
    history_ticket: u64,
    /// Bumped on every session reset.
    epoch: u64,
}

impl Views {
    fn list_mut(&mut self, view: View) -> &mut Vec<Order> {
        match view {
            View::Active => &mut self.active,
            View::History => &mut self.history,
        }
    }

    fn other(view: View) -> View {
        match view {
            View::Active => View::History,
            View::History => View::Active,
        }
    }

    fn next_ticket(&mut self, view: View) -> u64 {
        let ticket = match view {
            View::Active => &mut self.active_ticket,
            View::History => &mut self.history_ticket,
        };
        *ticket += 1;
        *ticket
    }

    fn latest_ticket(&self, view: View) -> u64 {
        match view {
            View::Active => self.active_ticket,
            View::History => self.history_ticket,
        }
    }

    fn find(&self, order_id: &str) -> Option<&Order> {
        self.active
            .iter()
            .chain(self.history.iter())
            .find(|o| o.id == order_id)
    }

    fn find_mut(&mut self, order_id: &str) -> Option<&mut Order> {
        self.active
            .iter_mut()
            .chain(self.history.iter_mut())
            .find(|o| o.id == order_id)
    }

    fn take(&mut self, order_id: &str) -> Option<Order> {
        for list in [&mut self.active, &mut self.history] {
            if let Some(pos) = list.iter().position(|o| o.id == order_id) {
                return Some(list.remove(pos));
            }
        }
        None
    }

    /// Puts an order into the view its status belongs to, replacing any
    /// copy in either view.
    fn upsert(&mut self, order: Order) {
        let view = View::of(order.status);
        let list = self.list_mut(Views::other(view));
        list.retain(|o| o.id != order.id);

        let list = self.list_mut(view);
        match list.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order,
            None => list.push(order),
        }
    }

    /// Replaces one view wholesale. Orders that belong to the other view
    /// are routed there. Returns the new size of `view`.
    fn replace(&mut self, view: View, orders: Vec<Order>) -> usize {
        self.list_mut(view).clear();
        for order in orders {
            self.upsert(order);
        }
        self.list_mut(view).len()
    }

    fn clear(&mut self) {
        self.active.clear();
        self.history.clear();
    }

    /// Empties both views and invalidates everything still in flight.
    fn reset(&mut self) {
        self.clear();
        self.active_ticket += 1;
        self.history_ticket += 1;
        self.epoch += 1;
    }
}

// =============================================================================
// Order Store
// =============================================================================

/// Session-gated cache of the courier's orders.
///
/// Both views are emptied on every session reset, and responses to
/// requests sent before the reset are dropped.
pub struct OrderStore {
    views: Arc<RwLock<Views>>,
    gateway: Arc<dyn RemoteGateway>,
    session: Arc<SessionManager>,
    history_page_size: u32,
}

impl OrderStore {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        session: Arc<SessionManager>,
        history_page_size: u32,
    ) -> Self {
        let views = Arc::new(RwLock::new(Views::default()));

        let weak: Weak<RwLock<Views>> = Arc::downgrade(&views);
        session.on_reset(move || {
            if let Some(views) = weak.upgrade() {
                views.write().unwrap_or_else(PoisonError::into_inner).reset();
                debug!("Order views reset");
            }
        });

        OrderStore {
            views,
            gateway,
            session,
            history_page_size,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Views> {
        self.views.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Views> {
        self.views.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Replaces the active view from the backend.
    pub async fn refresh_active(&self) -> ClientResult<RefreshOutcome> {
        self.session.require_signed_in()?;
        let ticket = self.write().next_ticket(View::Active);

        let result = self.gateway.get_active_orders().await;
        let orders = self.session.absorb_expiry(result).await?;

        self.apply_refresh(View::Active, ticket, orders)
    }

    /// Replaces the history view with the first page from the backend.
    pub async fn refresh_history(&self) -> ClientResult<RefreshOutcome> {
        self.session.require_signed_in()?;
        let ticket = self.write().next_ticket(View::History);

        let result = self
            .gateway
            .get_order_history(self.history_page_size, 0)
            .await;
        let orders = self.session.absorb_expiry(result).await?;

        self.apply_refresh(View::History, ticket, orders)
    }

    fn apply_refresh(
        &self,
        view: View,
        ticket: u64,
        orders: Vec<Order>,
    ) -> ClientResult<RefreshOutcome> {
        let mut views = self.write();

        // Signed out while the request was out.
        if !self.session.is_signed_in() {
            return Err(ClientError::NotSignedIn);
        }

        let newest = views.latest_ticket(view);
        if ticket < newest {
            debug!(?view, ticket, newest, "Dropping superseded refresh");
            return Ok(RefreshOutcome::Superseded);
        }

        let count = views.replace(view, orders);
        info!(?view, count, "Orders refreshed");
        Ok(RefreshOutcome::Applied { count })
    }

    /// Fetches one order and upserts it into the view its status belongs to.
    pub async fn fetch_details(&self, order_id: &str) -> ClientResult<Order> {
        validate_order_id(order_id)?;
        self.session.require_signed_in()?;
        let epoch = self.read().epoch;

        let result = self.gateway.get_order_details(order_id).await;
        let order = self.session.absorb_expiry(result).await?;

        let mut views = self.write();
        if !self.session.is_signed_in() || views.epoch != epoch {
            debug!(order_id = %order_id, "Session changed during fetch, dropping order");
            return Err(ClientError::NotSignedIn);
        }
        views.upsert(order.clone());
        debug!(order_id = %order.id, status = %order.status, "Order details cached");
        Ok(order)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Orders still being worked on.
    pub async fn active(&self) -> ClientResult<Vec<Order>> {
        self.session.require_signed_in()?;
        Ok(self.read().active.clone())
    }

    /// Delivered and cancelled orders, most recently finished first.
    pub async fn history(&self) -> ClientResult<Vec<Order>> {
        self.session.require_signed_in()?;
        Ok(self.read().history.clone())
    }

    /// One order from either view.
    pub async fn get(&self, order_id: &str) -> ClientResult<Order> {
        self.session.require_signed_in()?;
        self.read()
            .find(order_id)
            .cloned()
            .ok_or_else(|| ClientError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }

    // =========================================================================
    // Transition Support
    // =========================================================================

    pub(crate) fn status_of(&self, order_id: &str) -> Option<OrderStatus> {
        self.read().find(order_id).map(|o| o.status)
    }

    pub(crate) fn cached(&self, order_id: &str) -> Option<Order> {
        self.read().find(order_id).cloned()
    }

    /// The cached order, tagged with the current session epoch.
    pub(crate) fn snapshot(&self, order_id: &str) -> Option<Snapshot> {
        let views = self.read();
        views.find(order_id).map(|order| Snapshot {
            epoch: views.epoch,
            order: order.clone(),
        })
    }

    /// The snapshot's order, if no reset happened since it was taken.
    pub(crate) fn still_current(&self, snapshot: Snapshot) -> Option<Order> {
        (self.read().epoch == snapshot.epoch).then_some(snapshot.order)
    }

    /// Sets the status in place, leaving the order in its current view.
    /// Returns the status it replaced.
    pub(crate) fn set_status(&self, order_id: &str, status: OrderStatus) -> Option<OrderStatus> {
        let mut views = self.write();
        let order = views.find_mut(order_id)?;
        Some(std::mem::replace(&mut order.status, status))
    }

    /// Puts `prior` back, unless something else changed the order since.
    pub(crate) fn revert_status(
        &self,
        order_id: &str,
        applied: OrderStatus,
        prior: OrderStatus,
    ) -> bool {
        let mut views = self.write();
        match views.find_mut(order_id) {
            Some(order) if order.status == applied => {
                order.status = prior;
                true
            }
            _ => false,
        }
    }

    /// Moves an order to the front of history with its terminal status.
    ///
    /// A refresh may have dropped the order while its transition was out.
    /// The `fallback` snapshot is used then, unless the session was reset
    /// since it was taken.
    pub(crate) fn finalize(
        &self,
        order_id: &str,
        status: OrderStatus,
        completed_at: Option<DateTime<Utc>>,
        fallback: Option<Snapshot>,
    ) -> Option<Order> {
        let mut views = self.write();
        let mut order = match views.take(order_id) {
            Some(order) => order,
            None => {
                let snapshot = fallback.filter(|s| s.epoch == views.epoch)?;
                debug!(order_id = %order_id, "Order left the cache mid-transition, restoring it");
                snapshot.order
            }
        };

        order.status = status;
        if completed_at.is_some() {
            order.completed_at = completed_at;
        }
        views.history.insert(0, order.clone());
        Some(order)
    }
}

impl std::fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStore")
            .field("history_page_size", &self.history_page_size)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
