//! Scripted in-process backend for scenario tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use courier_client::{
    AuthGrant, ClientConfig, ClientError, ClientResult, CompletionReceipt, CourierClient,
    RemoteGateway,
};
use courier_core::{
    Customer, EarningsPeriod, EarningsRecord, GeoLocation, Money, Order, OrderItem, OrderStatus,
    Profile, RemoteEarnings,
};
use courier_db::MemoryCredentialStore;

pub const PHONE: &str = "9876543210";
pub const PIN: &str = "123456";
pub const OTP: &str = "654321";
pub const TOKEN: &str = "T1";

// =============================================================================
// Fixtures
// =============================================================================

pub fn profile() -> Profile {
    Profile {
        id: "c-7".to_string(),
        name: "Ravi".to_string(),
        phone_number: PHONE.to_string(),
        email: None,
        vehicle_number: Some("KA01AB1234".to_string()),
        rating: Some(4.8),
    }
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 15, hour, minute, 0).unwrap()
}

/// A ₹200 + ₹30 = ₹230 order.
pub fn order(id: &str, status: OrderStatus) -> Order {
    Order {
        id: id.to_string(),
        order_id: format!("ORD-{}", id),
        status,
        customer: Customer {
            name: "Asha".to_string(),
            phone: "9000000000".to_string(),
            address: "12 MG Road".to_string(),
        },
        items: vec![OrderItem {
            name: "Thali".to_string(),
            quantity: 2,
            price: Money::from_rupees(100),
        }],
        subtotal: Money::from_rupees(200),
        delivery_fee: Money::from_rupees(30),
        amount: Money::from_rupees(230),
        created_at: at(9, 0),
        completed_at: None,
        distance_km: Some(3.2),
    }
}

pub fn delivered(id: &str, fee_rupees: i64, completed_at: DateTime<Utc>) -> Order {
    let mut order = order(id, OrderStatus::Delivered);
    order.delivery_fee = Money::from_rupees(fee_rupees);
    order.amount = order.subtotal + order.delivery_fee;
    order.completed_at = Some(completed_at);
    order
}

// =============================================================================
// Fake Gateway
// =============================================================================

/// Holds one call inside the fake until released.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
struct Script {
    active: Vec<Order>,
    history: Vec<Order>,
    failures: HashMap<&'static str, VecDeque<ClientError>>,
    gates: HashMap<&'static str, Arc<Gate>>,
    calls: Vec<String>,
    completed_at: Option<DateTime<Utc>>,
    earnings: Option<RemoteEarnings>,
    records: Vec<EarningsRecord>,
    availability: Option<bool>,
    profile: Option<Profile>,
}

/// A backend with one courier (`PHONE` / `PIN` / `OTP`, token `T1`).
#[derive(Default)]
pub struct FakeGateway {
    script: Mutex<Script>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_active(&self, orders: Vec<Order>) {
        self.script.lock().unwrap().active = orders;
    }

    pub fn set_history(&self, orders: Vec<Order>) {
        self.script.lock().unwrap().history = orders;
    }

    pub fn set_completed_at(&self, at: DateTime<Utc>) {
        self.script.lock().unwrap().completed_at = Some(at);
    }

    pub fn set_earnings(&self, earnings: RemoteEarnings) {
        self.script.lock().unwrap().earnings = Some(earnings);
    }

    /// What `get_profile` returns instead of the sign-in profile.
    pub fn set_profile(&self, profile: Profile) {
        self.script.lock().unwrap().profile = Some(profile);
    }

    pub fn set_records(&self, records: Vec<EarningsRecord>) {
        self.script.lock().unwrap().records = records;
    }

    /// The next call to `operation` fails with `err`.
    pub fn fail_next(&self, operation: &'static str, err: ClientError) {
        self.script
            .lock()
            .unwrap()
            .failures
            .entry(operation)
            .or_default()
            .push_back(err);
    }

    /// The next call to `operation` waits until `release` is notified.
    pub fn hold(&self, operation: &'static str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.script
            .lock()
            .unwrap()
            .gates
            .insert(operation, Arc::clone(&gate));
        gate
    }

    /// Every call so far, as `operation` or `operation:argument`.
    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(operation))
            .count()
    }

    /// Last availability the backend was told.
    pub fn remote_availability(&self) -> Option<bool> {
        self.script.lock().unwrap().availability
    }

    async fn enter(&self, operation: &'static str, argument: Option<String>) -> ClientResult<()> {
        let (gate, failure) = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(match argument {
                Some(arg) => format!("{}:{}", operation, arg),
                None => operation.to_string(),
            });
            let gate = script.gates.remove(operation);
            let failure = script
                .failures
                .get_mut(operation)
                .and_then(VecDeque::pop_front);
            (gate, failure)
        };

        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn grant() -> AuthGrant {
        AuthGrant {
            token: TOKEN.to_string(),
            profile: profile(),
        }
    }

    fn set_remote_status(&self, order_id: &str, status: OrderStatus) {
        let mut script = self.script.lock().unwrap();
        if let Some(order) = script.active.iter_mut().find(|o| o.id == order_id) {
            order.status = status;
        }
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    async fn login(&self, phone: &str, pin: &str) -> ClientResult<AuthGrant> {
        self.enter("login", Some(phone.to_string())).await?;
        if phone == PHONE && pin == PIN {
            Ok(Self::grant())
        } else {
            Err(ClientError::auth_rejected("Invalid phone number or PIN"))
        }
    }

    async fn request_otp(&self, phone: &str) -> ClientResult<()> {
        self.enter("request_otp", Some(phone.to_string())).await
    }

    async fn verify_otp(&self, phone: &str, code: &str) -> ClientResult<AuthGrant> {
        self.enter("verify_otp", Some(phone.to_string())).await?;
        if phone == PHONE && code == OTP {
            Ok(Self::grant())
        } else {
            Err(ClientError::auth_rejected("Invalid OTP"))
        }
    }

    async fn get_profile(&self) -> ClientResult<Profile> {
        self.enter("get_profile", None).await?;
        Ok(self.script.lock().unwrap().profile.clone().unwrap_or_else(profile))
    }

    async fn get_active_orders(&self) -> ClientResult<Vec<Order>> {
        self.enter("get_active_orders", None).await?;
        Ok(self.script.lock().unwrap().active.clone())
    }

    async fn get_order_history(&self, limit: u32, offset: u32) -> ClientResult<Vec<Order>> {
        self.enter("get_order_history", Some(format!("{}/{}", limit, offset)))
            .await?;
        let script = self.script.lock().unwrap();
        Ok(script
            .history
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_order_details(&self, order_id: &str) -> ClientResult<Order> {
        self.enter("get_order_details", Some(order_id.to_string()))
            .await?;
        let script = self.script.lock().unwrap();
        script
            .active
            .iter()
            .chain(script.history.iter())
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or_else(|| ClientError::remote_rejected("Order not found"))
    }

    async fn accept_order(&self, order_id: &str) -> ClientResult<()> {
        self.enter("accept_order", Some(order_id.to_string())).await?;
        self.set_remote_status(order_id, OrderStatus::PickedUp);
        Ok(())
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        _location: Option<GeoLocation>,
    ) -> ClientResult<()> {
        self.enter("update_order_status", Some(order_id.to_string()))
            .await?;
        self.set_remote_status(order_id, status);
        Ok(())
    }

    async fn complete_delivery(
        &self,
        order_id: &str,
        _location: Option<GeoLocation>,
        _signature: Option<&str>,
    ) -> ClientResult<CompletionReceipt> {
        self.enter("complete_delivery", Some(order_id.to_string()))
            .await?;

        let mut script = self.script.lock().unwrap();
        let completed_at = script.completed_at;
        if let Some(pos) = script.active.iter().position(|o| o.id == order_id) {
            let mut order = script.active.remove(pos);
            order.status = OrderStatus::Delivered;
            order.completed_at = Some(completed_at.unwrap_or_else(Utc::now));
            script.history.insert(0, order);
        }
        Ok(CompletionReceipt { completed_at })
    }

    async fn get_earnings(&self, period: EarningsPeriod) -> ClientResult<RemoteEarnings> {
        self.enter("get_earnings", Some(period.to_string())).await?;
        Ok(self
            .script
            .lock()
            .unwrap()
            .earnings
            .clone()
            .unwrap_or(RemoteEarnings {
                period,
                total_earnings: Money::zero(),
                deliveries_count: 0,
                weekly_count: 0,
                avg_per_delivery: Money::zero(),
            }))
    }

    async fn get_earnings_history(&self, limit: u32) -> ClientResult<Vec<EarningsRecord>> {
        self.enter("get_earnings_history", Some(limit.to_string()))
            .await?;
        let script = self.script.lock().unwrap();
        Ok(script.records.iter().take(limit as usize).cloned().collect())
    }

    async fn set_availability(&self, available: bool) -> ClientResult<()> {
        self.enter("set_availability", Some(available.to_string()))
            .await?;
        self.script.lock().unwrap().availability = Some(available);
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub gateway: Arc<FakeGateway>,
    pub store: Arc<MemoryCredentialStore>,
    pub client: CourierClient,
}

/// A client over the fake backend and an in-memory credential store.
pub async fn harness_with(store: MemoryCredentialStore) -> Harness {
    let gateway = FakeGateway::new();
    let store = Arc::new(store);

    let client = CourierClient::builder(ClientConfig::default())
        .with_gateway(gateway.clone())
        .with_credential_store(store.clone())
        .build()
        .await
        .unwrap();

    Harness {
        gateway,
        store,
        client,
    }
}

pub async fn harness() -> Harness {
    harness_with(MemoryCredentialStore::new()).await
}

/// A harness already signed in as the fake courier.
pub async fn signed_in() -> Harness {
    let h = harness().await;
    h.client
        .session()
        .login_with_pin(PHONE, PIN)
        .await
        .unwrap();
    h
}

/// Signed in with `orders` loaded into the active view.
pub async fn with_active(orders: Vec<Order>) -> Harness {
    let h = signed_in().await;
    h.gateway.set_active(orders);
    h.client.orders().refresh_active().await.unwrap();
    h
}
