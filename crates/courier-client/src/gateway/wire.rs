//! # Wire Format
//!
//! JSON shapes exchanged with the delivery backend, and their conversion
//! into validated courier-core types.
//!
//! ## Order Payload
//! ```text
//! ┌───────────────────────────────────────┐      ┌──────────────────────────┐
//! │ {                                     │      │ Order                    │
//! │   "id": 1042,                 ───────────────► id: "1042"              │
//! │   "orderId": "ORD-1042",      ───────────────► order_id                │
//! │   "status": "picked_up",      ───────────────► status: PickedUp        │
//! │   "customerName": "Asha",     ──┐            │                          │
//! │   "customerPhone": "90000..", ──┼────────────► customer: Customer       │
//! │   "address": "12 MG Road",    ──┘            │                          │
//! │   "subtotal": 199.9,          ───────────────► subtotal: 19990 paise   │
//! │   "deliveryFee": 30.1,        ───────────────► delivery_fee: 3010      │
//! │   "amount": 230,              ───────────────► amount: 23000           │
//! │   "distance": 3.2             ───────────────► distance_km             │
//! │ }                                     │      └──────────────────────────┘
//! └───────────────────────────────────────┘
//! ```
//!
//! Amounts are decimal rupees and are read from their textual JSON form,
//! never through `f64`.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use courier_core::validation::validate_order;
use courier_core::{
    CoreError, Customer, EarningsPeriod, EarningsRecord, GeoLocation, Money, Order, OrderItem,
    OrderStatus, Profile, RemoteEarnings,
};

use crate::error::{ClientError, ClientResult};
use crate::gateway::{AuthGrant, CompletionReceipt};

// =============================================================================
// Field Deserializers
// =============================================================================

/// Ids arrive as strings from some endpoints and as numbers from others.
fn flexible_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or numeric id, got {}",
            other
        ))),
    }
}

/// A rupee amount, as a JSON number or numeric string.
fn rupees<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
    let text = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s,
        other => {
            return Err(D::Error::custom(format!(
                "expected a rupee amount, got {}",
                other
            )))
        }
    };
    Money::parse_rupees(&text).map_err(D::Error::custom)
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub phone_number: &'a str,
    pub pin: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OtpRequest<'a> {
    pub phone_number: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyOtpRequest<'a> {
    pub phone_number: &'a str,
    pub otp: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusUpdateRequest {
    pub status: OrderStatus,
    pub location: Option<GeoLocation>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompleteRequest<'a> {
    pub location: Option<GeoLocation>,
    pub signature: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AvailabilityRequest {
    pub is_available: bool,
}

// =============================================================================
// Responses
// =============================================================================

/// Body of a non-2xx response, when the backend sends one.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.trim().is_empty())
    }
}

/// `{ success, message? }`
#[derive(Debug, Deserialize)]
pub(crate) struct AckResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AckResponse {
    /// The backend's refusal message, if it refused.
    ///
    /// A missing `success` flag on a 2xx response counts as success.
    pub fn rejection(self) -> Option<String> {
        match self.success {
            Some(false) => Some(
                self.message
                    .unwrap_or_else(|| "request was not accepted".to_string()),
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDto {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub vehicle_number: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl From<UserDto> for Profile {
    fn from(dto: UserDto) -> Self {
        Profile {
            id: dto.id,
            name: dto.name,
            phone_number: dto.phone_number,
            email: dto.email,
            vehicle_number: dto.vehicle_number,
            rating: dto.rating,
        }
    }
}

/// `{ success, token, user, message? }`
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserDto>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthResponse {
    pub fn into_grant(self) -> ClientResult<AuthGrant> {
        if self.success == Some(false) {
            return Err(ClientError::auth_rejected(
                self.message
                    .unwrap_or_else(|| "Invalid credentials".to_string()),
            ));
        }

        let token = self
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::remote_rejected("sign-in response has no token"))?;
        let user = self
            .user
            .ok_or_else(|| ClientError::remote_rejected("sign-in response has no user"))?;

        Ok(AuthGrant {
            token,
            profile: user.into(),
        })
    }
}

/// `{ success?, profile, message? }`
#[derive(Debug, Deserialize)]
pub(crate) struct ProfileResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub profile: Option<UserDto>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProfileResponse {
    pub fn into_profile(self) -> ClientResult<Profile> {
        if self.success == Some(false) {
            return Err(ClientError::remote_rejected(
                self.message
                    .unwrap_or_else(|| "profile was not returned".to_string()),
            ));
        }
        self.profile
            .map(Profile::from)
            .ok_or_else(|| ClientError::remote_rejected("profile response has no profile"))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemDto {
    pub name: String,
    pub quantity: i64,
    #[serde(deserialize_with = "rupees")]
    pub price: Money,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderDto {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(deserialize_with = "flexible_id")]
    pub order_id: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub items: Vec<ItemDto>,
    #[serde(deserialize_with = "rupees")]
    pub subtotal: Money,
    #[serde(deserialize_with = "rupees")]
    pub delivery_fee: Money,
    #[serde(deserialize_with = "rupees")]
    pub amount: Money,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub distance: Option<f64>,
}

impl TryFrom<OrderDto> for Order {
    type Error = CoreError;

    fn try_from(dto: OrderDto) -> Result<Self, Self::Error> {
        let order = Order {
            id: dto.id,
            order_id: dto.order_id,
            status: dto.status,
            customer: Customer {
                name: dto.customer_name,
                phone: dto.customer_phone,
                address: dto.address,
            },
            items: dto
                .items
                .into_iter()
                .map(|item| OrderItem {
                    name: item.name,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            subtotal: dto.subtotal,
            delivery_fee: dto.delivery_fee,
            amount: dto.amount,
            created_at: dto.created_at,
            completed_at: dto.completed_at,
            distance_km: dto.distance,
        };
        validate_order(&order)?;
        Ok(order)
    }
}

fn ingest(dto: OrderDto) -> ClientResult<Order> {
    let id = dto.id.clone();
    Order::try_from(dto).map_err(|e| {
        ClientError::remote_rejected(format!("invalid order {} in response: {}", id, e))
    })
}

/// `{ orders: [...] }`
#[derive(Debug, Deserialize)]
pub(crate) struct OrdersResponse {
    #[serde(default)]
    pub orders: Vec<OrderDto>,
}

impl OrdersResponse {
    /// All orders, or `RemoteRejected` if any one of them is invalid.
    pub fn into_orders(self) -> ClientResult<Vec<Order>> {
        self.orders.into_iter().map(ingest).collect()
    }
}

/// `{ order: {...} }`
#[derive(Debug, Deserialize)]
pub(crate) struct OrderResponse {
    pub order: OrderDto,
}

impl OrderResponse {
    pub fn into_order(self) -> ClientResult<Order> {
        ingest(self.order)
    }
}

/// `{ success, completedAt?, message? }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompleteResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CompleteResponse {
    pub fn into_receipt(self) -> ClientResult<CompletionReceipt> {
        if self.success == Some(false) {
            return Err(ClientError::remote_rejected(
                self.message
                    .unwrap_or_else(|| "delivery completion was not accepted".to_string()),
            ));
        }
        Ok(CompletionReceipt {
            completed_at: self.completed_at,
        })
    }
}

/// `{ totalEarnings, deliveriesCount, weeklyCount, avgPerDelivery }`
///
/// Older backends send `total` and `deliveries`. The average is recomputed
/// from the total so it follows the same rounding as local summaries.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EarningsResponse {
    #[serde(alias = "total", deserialize_with = "rupees")]
    pub total_earnings: Money,
    #[serde(alias = "deliveries", default)]
    pub deliveries_count: u32,
    #[serde(default)]
    pub weekly_count: u32,
}

impl EarningsResponse {
    pub fn into_earnings(self, period: EarningsPeriod) -> RemoteEarnings {
        RemoteEarnings {
            period,
            total_earnings: self.total_earnings,
            deliveries_count: self.deliveries_count,
            weekly_count: self.weekly_count,
            avg_per_delivery: self
                .total_earnings
                .average(u64::from(self.deliveries_count)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EarningsRecordDto {
    #[serde(deserialize_with = "flexible_id")]
    pub order_id: String,
    #[serde(deserialize_with = "rupees")]
    pub amount: Money,
    pub completed_at: DateTime<Utc>,
}

/// `{ history: [...] }`
#[derive(Debug, Deserialize)]
pub(crate) struct EarningsHistoryResponse {
    #[serde(default)]
    pub history: Vec<EarningsRecordDto>,
}

impl EarningsHistoryResponse {
    pub fn into_records(self) -> Vec<EarningsRecord> {
        self.history
            .into_iter()
            .map(|dto| EarningsRecord {
                order_id: dto.order_id,
                amount: dto.amount,
                completed_at: dto.completed_at,
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
