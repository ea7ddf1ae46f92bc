//! Order scenarios: refresh, optimistic transitions, rollback and history.

mod common;

use common::*;
use courier_client::{ClientError, OrderEvent, RefreshOutcome, SessionStatus};
use courier_core::{GeoLocation, OrderAction, OrderStatus};
use tokio::sync::broadcast::error::TryRecvError;

fn drain(rx: &mut tokio::sync::broadcast::Receiver<OrderEvent>) -> Vec<OrderEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty) => return events,
            Err(e) => panic!("event channel: {:?}", e),
        }
    }
}

// =============================================================================
// Full Delivery
// =============================================================================

#[tokio::test]
async fn test_accept_start_complete_moves_order_to_history() {
    let h = with_active(vec![order("T1", OrderStatus::Pending)]).await;
    let mut events = h.client.transitions().subscribe();
    let machine = h.client.transitions();

    let accepted = machine.accept("T1").await.unwrap();
    assert_eq!(accepted.status, OrderStatus::PickedUp);

    let started = machine
        .start_delivery("T1", Some(GeoLocation::new(12.97, 77.59)))
        .await
        .unwrap();
    assert_eq!(started.status, OrderStatus::InTransit);
    assert!(h.client.orders().history().await.unwrap().is_empty());

    h.gateway.set_completed_at(at(13, 45));
    let done = machine.complete("T1", None, Some("sig-1")).await.unwrap();
    assert_eq!(done.status, OrderStatus::Delivered);
    assert_eq!(done.completed_at, Some(at(13, 45)));
    assert_eq!(done.amount.paise(), 23000);

    assert!(h.client.orders().active().await.unwrap().is_empty());
    let history = h.client.orders().history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "T1");

    assert_eq!(
        h.gateway.calls()[1..],
        [
            "get_active_orders",
            "accept_order:T1",
            "update_order_status:T1",
            "complete_delivery:T1"
        ]
    );

    use OrderStatus::*;
    let t1 = || "T1".to_string();
    assert_eq!(
        drain(&mut events),
        vec![
            OrderEvent::Applied { order_id: t1(), from: Pending, to: PickedUp },
            OrderEvent::Confirmed { order_id: t1(), from: Pending, to: PickedUp },
            OrderEvent::Applied { order_id: t1(), from: PickedUp, to: InTransit },
            OrderEvent::Confirmed { order_id: t1(), from: PickedUp, to: InTransit },
            OrderEvent::Applied { order_id: t1(), from: InTransit, to: Delivered },
            OrderEvent::Confirmed { order_id: t1(), from: InTransit, to: Delivered },
        ]
    );
}

#[tokio::test]
async fn test_completion_without_server_time_uses_local_clock() {
    let h = with_active(vec![order("T1", OrderStatus::InTransit)]).await;

    let before = chrono::Utc::now();
    let done = h
        .client
        .transitions()
        .complete("T1", None, None)
        .await
        .unwrap();

    let completed_at = done.completed_at.unwrap();
    assert!(completed_at >= before);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_double_accept_is_rejected_while_first_is_in_flight() {
    let h = with_active(vec![order("T1", OrderStatus::Pending)]).await;
    let gate = h.gateway.hold("accept_order");

    let machine = h.client.transitions().clone();
    let first = tokio::spawn(async move { machine.accept("T1").await });
    gate.entered.notified().await;

    assert!(h.client.transitions().is_in_flight("T1"));
    // Optimistic status is visible while the backend is thinking.
    assert_eq!(
        h.client.orders().get("T1").await.unwrap().status,
        OrderStatus::PickedUp
    );
    assert_eq!(
        h.client.transitions().accept("T1").await.unwrap_err(),
        ClientError::TransitionInProgress {
            order_id: "T1".into()
        }
    );

    gate.release.notify_one();
    let accepted = first.await.unwrap().unwrap();

    assert_eq!(accepted.status, OrderStatus::PickedUp);
    assert!(!h.client.transitions().is_in_flight("T1"));
    assert_eq!(h.gateway.calls_to("accept_order"), 1);
}

#[tokio::test]
async fn test_completion_survives_refresh_that_drops_the_order() {
    let h = with_active(vec![order("T1", OrderStatus::InTransit)]).await;
    let mut events = h.client.transitions().subscribe();
    let gate = h.gateway.hold("complete_delivery");

    let machine = h.client.transitions().clone();
    let completing = tokio::spawn(async move { machine.complete("T1", None, None).await });
    gate.entered.notified().await;

    // The backend already moved T1 out of its active list.
    h.gateway.set_active(vec![]);
    h.client.orders().refresh_active().await.unwrap();
    assert!(h.client.orders().active().await.unwrap().is_empty());

    gate.release.notify_one();
    let done = completing.await.unwrap().unwrap();

    assert_eq!(done.status, OrderStatus::Delivered);
    assert!(done.completed_at.is_some());
    let history = h.client.orders().history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "T1");
    assert!(matches!(
        drain(&mut events).last(),
        Some(OrderEvent::Confirmed { to: OrderStatus::Delivered, .. })
    ));
}

#[tokio::test]
async fn test_transitions_on_different_orders_run_independently() {
    let h = with_active(vec![
        order("T1", OrderStatus::Pending),
        order("T2", OrderStatus::Pending),
    ])
    .await;
    let gate = h.gateway.hold("accept_order");

    let machine = h.client.transitions().clone();
    let first = tokio::spawn(async move { machine.accept("T1").await });
    gate.entered.notified().await;

    h.client.transitions().accept("T2").await.unwrap();

    gate.release.notify_one();
    first.await.unwrap().unwrap();
}

// =============================================================================
// Rollback
// =============================================================================

#[tokio::test]
async fn test_network_failure_rolls_back() {
    let h = with_active(vec![order("T1", OrderStatus::Pending)]).await;
    let mut events = h.client.transitions().subscribe();
    h.gateway
        .fail_next("accept_order", ClientError::Network("connection reset".into()));

    let err = h.client.transitions().accept("T1").await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(
        h.client.orders().get("T1").await.unwrap().status,
        OrderStatus::Pending
    );
    assert!(!h.client.transitions().is_in_flight("T1"));
    assert_eq!(
        drain(&mut events),
        vec![
            OrderEvent::Applied {
                order_id: "T1".into(),
                from: OrderStatus::Pending,
                to: OrderStatus::PickedUp,
            },
            OrderEvent::RolledBack {
                order_id: "T1".into(),
                from: OrderStatus::Pending,
                attempted: OrderStatus::PickedUp,
                reason: "Network error: connection reset".into(),
            },
        ]
    );

    // Retrying succeeds.
    h.client.transitions().accept("T1").await.unwrap();
}

#[tokio::test]
async fn test_failed_completion_keeps_order_active() {
    let h = with_active(vec![order("T1", OrderStatus::InTransit)]).await;
    h.gateway.fail_next(
        "complete_delivery",
        ClientError::remote_rejected("Order was reassigned"),
    );

    let err = h
        .client
        .transitions()
        .complete("T1", None, None)
        .await
        .unwrap_err();

    assert!(err.requires_resync());
    let active = h.client.orders().active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].status, OrderStatus::InTransit);
    assert!(active[0].completed_at.is_none());
    assert!(h.client.orders().history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_session_during_transition_forces_logout() {
    let h = with_active(vec![order("T1", OrderStatus::Pending)]).await;
    let mut events = h.client.transitions().subscribe();
    h.gateway
        .fail_next("accept_order", ClientError::SessionExpired);

    let err = h.client.transitions().accept("T1").await.unwrap_err();

    assert_eq!(err, ClientError::SessionExpired);
    assert_eq!(h.client.session().status(), SessionStatus::SignedOut);
    assert!(matches!(
        drain(&mut events).last(),
        Some(OrderEvent::RolledBack { .. })
    ));
    assert_eq!(
        h.client.orders().get("T1").await,
        Err(ClientError::NotSignedIn)
    );
}

// =============================================================================
// Local Rejection
// =============================================================================

#[tokio::test]
async fn test_illegal_transition_sends_nothing() {
    let h = with_active(vec![order("T1", OrderStatus::Pending)]).await;

    let err = h
        .client
        .transitions()
        .complete("T1", None, None)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ClientError::InvalidTransition {
            order_id: "T1".into(),
            from: OrderStatus::Pending,
            action: OrderAction::Complete,
        }
    );
    assert_eq!(h.gateway.calls_to("complete_delivery"), 0);
    assert_eq!(
        h.client.orders().get("T1").await.unwrap().status,
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn test_unknown_and_blank_order_ids() {
    let h = with_active(vec![]).await;

    assert_eq!(
        h.client.transitions().accept("T9").await.unwrap_err(),
        ClientError::OrderNotFound {
            order_id: "T9".into()
        }
    );
    assert!(matches!(
        h.client.transitions().accept("  ").await,
        Err(ClientError::Validation(_))
    ));
}

#[tokio::test]
async fn test_everything_requires_sign_in() {
    let h = harness().await;

    assert_eq!(
        h.client.orders().refresh_active().await,
        Err(ClientError::NotSignedIn)
    );
    assert_eq!(
        h.client.transitions().accept("T1").await.unwrap_err(),
        ClientError::NotSignedIn
    );
    assert_eq!(
        h.client.orders().history().await,
        Err(ClientError::NotSignedIn)
    );
    assert!(h.gateway.calls().is_empty());
}

// =============================================================================
// Backend Cancellation
// =============================================================================

#[tokio::test]
async fn test_confirm_cancelled_moves_to_history() {
    let h = with_active(vec![order("T1", OrderStatus::PickedUp)]).await;
    let mut events = h.client.transitions().subscribe();

    let cancelled = h.client.transitions().confirm_cancelled("T1").await.unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(h.client.orders().active().await.unwrap().is_empty());
    assert_eq!(h.client.orders().history().await.unwrap()[0].id, "T1");
    assert_eq!(
        drain(&mut events),
        vec![OrderEvent::Confirmed {
            order_id: "T1".into(),
            from: OrderStatus::PickedUp,
            to: OrderStatus::Cancelled,
        }]
    );
    assert_eq!(h.gateway.calls().len(), 2);
}

#[tokio::test]
async fn test_delivered_order_cannot_be_cancelled() {
    let h = signed_in().await;
    h.gateway.set_history(vec![delivered("T1", 30, at(10, 0))]);
    h.client.orders().refresh_history().await.unwrap();

    let err = h
        .client
        .transitions()
        .confirm_cancelled("T1")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::InvalidTransition {
            from: OrderStatus::Delivered,
            action: OrderAction::Cancel,
            ..
        }
    ));
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_routes_orders_by_status() {
    let h = signed_in().await;
    h.gateway.set_active(vec![
        order("T1", OrderStatus::Pending),
        order("T2", OrderStatus::Cancelled),
    ]);

    let outcome = h.client.orders().refresh_active().await.unwrap();

    assert_eq!(outcome, RefreshOutcome::Applied { count: 1 });
    assert_eq!(h.client.orders().active().await.unwrap()[0].id, "T1");
    assert_eq!(h.client.orders().history().await.unwrap()[0].id, "T2");
}

#[tokio::test]
async fn test_history_refresh_uses_page_size() {
    let h = signed_in().await;
    h.gateway.set_history(vec![delivered("T1", 30, at(10, 0))]);

    h.client.orders().refresh_history().await.unwrap();

    assert!(h
        .gateway
        .calls()
        .contains(&"get_order_history:20/0".to_string()));
}

#[tokio::test]
async fn test_older_refresh_is_superseded() {
    let h = signed_in().await;
    h.gateway.set_active(vec![order("T1", OrderStatus::Pending)]);
    let gate = h.gateway.hold("get_active_orders");

    let orders = h.client.orders().clone();
    let stale = tokio::spawn(async move { orders.refresh_active().await });
    gate.entered.notified().await;

    h.gateway.set_active(vec![
        order("T1", OrderStatus::Pending),
        order("T2", OrderStatus::Pending),
    ]);
    let fresh = h.client.orders().refresh_active().await.unwrap();
    assert_eq!(fresh, RefreshOutcome::Applied { count: 2 });

    gate.release.notify_one();
    assert_eq!(stale.await.unwrap().unwrap(), RefreshOutcome::Superseded);
    assert_eq!(h.client.orders().active().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_rejected_refresh_keeps_current_view() {
    let h = with_active(vec![order("T1", OrderStatus::Pending)]).await;
    h.gateway.fail_next(
        "get_active_orders",
        ClientError::remote_rejected("invalid order T2 in response"),
    );

    let err = h.client.orders().refresh_active().await.unwrap_err();

    assert!(err.requires_resync());
    assert_eq!(h.client.orders().active().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_fetch_details_upserts() {
    let h = with_active(vec![order("T1", OrderStatus::Pending)]).await;
    h.gateway.set_active(vec![]);
    h.gateway.set_history(vec![delivered("T1", 30, at(11, 0))]);

    let fetched = h.client.orders().fetch_details("T1").await.unwrap();

    assert_eq!(fetched.status, OrderStatus::Delivered);
    assert!(h.client.orders().active().await.unwrap().is_empty());
    assert_eq!(
        h.client.orders().get("T1").await.unwrap().completed_at,
        Some(at(11, 0))
    );
}
