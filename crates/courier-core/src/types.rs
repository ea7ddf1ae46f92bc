//! # Domain Types
//!
//! Core domain types shared by every courier-client service.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │    Customer     │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (remote)    │   │  name           │   │  name           │       │
//! │  │  order_id       │   │  phone          │   │  quantity       │       │
//! │  │  status         │   │  address        │   │  price (Money)  │       │
//! │  │  amount (Money) │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  OrderStatus    │   │    Profile      │   │ EarningsPeriod  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Pending        │   │  id, name       │   │  Today          │       │
//! │  │  PickedUp       │   │  phone_number   │   │  Week           │       │
//! │  │  InTransit      │   │  vehicle_number │   │  Month          │       │
//! │  │  Delivered  ■   │   └─────────────────┘   └─────────────────┘       │
//! │  │  Cancelled  ■   │   ■ = terminal                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every order has:
//! - `id`: the backend's identifier, used in every gateway call
//! - `order_id`: human-readable display number shown to the courier

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Order Status
// =============================================================================

/// Where an order is in the delivery lifecycle.
///
/// The legal moves between these are defined in [`crate::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Assigned to the courier, not yet accepted.
    Pending,
    /// Accepted and collected from the merchant.
    PickedUp,
    /// On the way to the customer.
    InTransit,
    /// Handed over. Terminal.
    Delivered,
    /// Cancelled by the backend. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::PickedUp,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Terminal statuses never change again.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// The wire form of this status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown order status '{}'", s),
            })
    }
}

// =============================================================================
// Customer & Items
// =============================================================================

/// The person receiving the delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// A line on the order, as shown to the courier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub name: String,
    pub quantity: i64,
    /// Unit price.
    pub price: Money,
}

impl OrderItem {
    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

// =============================================================================
// Order
// =============================================================================

/// A delivery assigned to the courier.
///
/// `amount = subtotal + delivery_fee` is checked once on ingestion
/// (see [`crate::validation::validate_order`]) and never recomputed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    /// Backend identifier.
    pub id: String,

    /// Display number ("#ORD-1042").
    pub order_id: String,

    pub status: OrderStatus,

    pub customer: Customer,

    pub items: Vec<OrderItem>,

    pub subtotal: Money,

    /// The courier's cut. Earnings are summed from this, not `amount`.
    pub delivery_fee: Money,

    /// What the customer pays.
    pub amount: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Set once the order is delivered.
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Route distance in kilometres, when the backend provides one.
    pub distance_km: Option<f64>,
}

impl Order {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

// =============================================================================
// Profile
// =============================================================================

/// The signed-in courier.
///
/// Persisted as JSON under the profile credential key, so the field
/// names follow the backend's camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub vehicle_number: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

// =============================================================================
// Location
// =============================================================================

/// A point captured by the device, attached to status updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        GeoLocation {
            latitude,
            longitude,
        }
    }
}

// =============================================================================
// Earnings
// =============================================================================

/// The window an earnings roll-up covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EarningsPeriod {
    /// Since local midnight.
    Today,
    /// The trailing seven days.
    Week,
    /// Since the first of the current month.
    Month,
}

impl EarningsPeriod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EarningsPeriod::Today => "today",
            EarningsPeriod::Week => "week",
            EarningsPeriod::Month => "month",
        }
    }
}

impl Default for EarningsPeriod {
    fn default() -> Self {
        EarningsPeriod::Today
    }
}

impl fmt::Display for EarningsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EarningsPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(EarningsPeriod::Today),
            "week" => Ok(EarningsPeriod::Week),
            "month" => Ok(EarningsPeriod::Month),
            other => Err(ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: format!("expected today, week or month, got '{}'", other),
            }),
        }
    }
}

/// Locally computed earnings for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EarningsSummary {
    pub period: EarningsPeriod,
    pub total_earnings: Money,
    pub deliveries_count: u32,
    pub avg_per_delivery: Money,
}

impl EarningsSummary {
    /// A summary with no deliveries.
    pub const fn empty(period: EarningsPeriod) -> Self {
        EarningsSummary {
            period,
            total_earnings: Money::zero(),
            deliveries_count: 0,
            avg_per_delivery: Money::zero(),
        }
    }
}

/// Earnings as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RemoteEarnings {
    pub period: EarningsPeriod,
    pub total_earnings: Money,
    pub deliveries_count: u32,
    /// Deliveries in the trailing week, regardless of `period`.
    pub weekly_count: u32,
    pub avg_per_delivery: Money,
}

/// A single paid delivery in the earnings history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EarningsRecord {
    pub order_id: String,
    pub amount: Money,
    #[ts(as = "String")]
    pub completed_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
