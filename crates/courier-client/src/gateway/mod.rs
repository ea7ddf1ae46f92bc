//! # Remote Gateway
//!
//! The contract between the client and the delivery backend.
//!
//! ## Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SessionManager / OrderStore / OrderStateMachine / ...                 │
//! │       │  Arc<dyn RemoteGateway>                                        │
//! │       ▼                                                                 │
//! │  ┌────────────────────┐        ┌──────────────────────────────────┐    │
//! │  │   RemoteGateway    │◄───────│ HttpGateway (reqwest)            │    │
//! │  │   (trait)          │◄───────│ scripted fakes in tests          │    │
//! │  └────────────────────┘        └──────────────────────────────────┘    │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                          wire DTOs ──► validated courier-core types     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations hand back validated domain types only. A payload that
//! cannot be parsed, or that contains an order breaking
//! `amount = subtotal + delivery_fee`, is a `RemoteRejected` as a whole.
//!
//! ## Error Mapping
//! | Response                          | ClientError        |
//! |-----------------------------------|--------------------|
//! | 401 (data endpoints)              | `SessionExpired`   |
//! | 4xx / `success: false` (login/OTP)| `AuthRejected`     |
//! | other 4xx / `success: false`      | `RemoteRejected`   |
//! | 5xx, timeout, connect failure     | `Network`          |

pub mod http;
mod wire;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use courier_core::{
    EarningsPeriod, EarningsRecord, GeoLocation, Order, OrderStatus, Profile, RemoteEarnings,
};

use crate::error::ClientResult;

pub use http::HttpGateway;

/// A successful login or OTP verification.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthGrant {
    pub token: String,
    pub profile: Profile,
}

/// The backend's answer to a delivery completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionReceipt {
    /// When the backend recorded the hand-over, if it says.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Everything the client asks of the backend.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    // =========================================================================
    // Authentication
    // =========================================================================
    async fn login(&self, phone: &str, pin: &str) -> ClientResult<AuthGrant>;

    async fn request_otp(&self, phone: &str) -> ClientResult<()>;

    async fn verify_otp(&self, phone: &str, code: &str) -> ClientResult<AuthGrant>;

    /// The signed-in courier's profile as the backend has it now.
    async fn get_profile(&self) -> ClientResult<Profile>;

    // =========================================================================
    // Orders
    // =========================================================================
    async fn get_active_orders(&self) -> ClientResult<Vec<Order>>;

    async fn get_order_history(&self, limit: u32, offset: u32) -> ClientResult<Vec<Order>>;

    async fn get_order_details(&self, order_id: &str) -> ClientResult<Order>;

    async fn accept_order(&self, order_id: &str) -> ClientResult<()>;

    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        location: Option<GeoLocation>,
    ) -> ClientResult<()>;

    async fn complete_delivery(
        &self,
        order_id: &str,
        location: Option<GeoLocation>,
        signature: Option<&str>,
    ) -> ClientResult<CompletionReceipt>;

    // =========================================================================
    // Earnings & Availability
    // =========================================================================
    async fn get_earnings(&self, period: EarningsPeriod) -> ClientResult<RemoteEarnings>;

    async fn get_earnings_history(&self, limit: u32) -> ClientResult<Vec<EarningsRecord>>;

    async fn set_availability(&self, available: bool) -> ClientResult<()>;
}
