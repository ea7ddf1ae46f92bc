//! # HTTP Gateway
//!
//! `RemoteGateway` over the delivery backend's JSON REST API.
//!
//! ## Request Flow
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────────────────────────┐
//! │ Gateway call │──►│ bearer token     │──►│ reqwest (timeout from config)│
//! └──────────────┘   │ (CredentialStore,│   └──────────────┬───────────────┘
//!                    │  read per call)  │                  │
//!                    └──────────────────┘                  ▼
//!                                          ┌──────────────────────────────┐
//!                                          │ handle_response              │
//!                                          │  2xx  → decode wire DTO      │
//!                                          │  401  → SessionExpired       │
//!                                          │  4xx  → RemoteRejected /     │
//!                                          │         AuthRejected         │
//!                                          │  5xx  → Network              │
//!                                          └──────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use courier_core::validation::{validate_otp, validate_pin};
use courier_core::{
    EarningsPeriod, EarningsRecord, GeoLocation, Order, OrderStatus, Profile, RemoteEarnings,
};
use courier_db::CredentialStore;

use crate::config::ApiSettings;
use crate::error::{ClientError, ClientResult};
use crate::gateway::wire::{
    AckResponse, AuthResponse, AvailabilityRequest, CompleteRequest, CompleteResponse,
    EarningsHistoryResponse, EarningsResponse, ErrorBody, LoginRequest, OrderResponse,
    OrdersResponse, OtpRequest, ProfileResponse, StatusUpdateRequest, VerifyOtpRequest,
};
use crate::gateway::{AuthGrant, CompletionReceipt, RemoteGateway};

/// Longest server error text carried into a `ClientError`.
const MAX_ERROR_TEXT: usize = 200;

/// Which status mapping a response gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    /// Login and OTP: every refusal is an `AuthRejected`.
    Auth,
    /// Everything behind the bearer token: 401 ends the session.
    Data,
}

/// Gateway speaking HTTP/JSON to the delivery backend.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    /// Creates a gateway for `settings.base_url`.
    ///
    /// The token is not captured here; it is read from `credentials` on
    /// every request so a logout takes effect immediately.
    pub fn new(settings: &ApiSettings, credentials: Arc<dyn CredentialStore>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("cannot build HTTP client: {}", e)))?;

        Ok(HttpGateway {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // =========================================================================
    // Request Plumbing
    // =========================================================================

    /// Attaches the stored bearer token, if there is one.
    async fn authorize(&self, request: RequestBuilder) -> ClientResult<RequestBuilder> {
        match self.credentials.load_token().await? {
            Some(token) => Ok(request.bearer_auth(token)),
            None => Ok(request),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let request = self.client.get(self.url(path)).query(query);
        let request = self.authorize(request).await?;

        debug!(path, "GET");
        let response = request.send().await?;
        Self::handle_response(response, Endpoint::Data).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        endpoint: Endpoint,
    ) -> ClientResult<T> {
        let mut request = self.client.post(self.url(path)).json(body);
        if endpoint == Endpoint::Data {
            request = self.authorize(request).await?;
        }

        debug!(path, "POST");
        let response = request.send().await?;
        Self::handle_response(response, endpoint).await
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
        endpoint: Endpoint,
    ) -> ClientResult<T> {
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(Into::into);
        }

        let text = response.text().await.unwrap_or_default();
        let error = Self::map_status(status, error_message(status, &text), endpoint);
        warn!(status = status.as_u16(), error = %error, "Backend request failed");
        Err(error)
    }

    fn map_status(status: StatusCode, message: String, endpoint: Endpoint) -> ClientError {
        if status.is_server_error() {
            return ClientError::Network(format!("server error {}: {}", status.as_u16(), message));
        }

        match (status, endpoint) {
            (StatusCode::UNAUTHORIZED, Endpoint::Data) => ClientError::SessionExpired,
            (_, Endpoint::Auth) if status.is_client_error() => ClientError::auth_rejected(message),
            _ => ClientError::remote_rejected(message),
        }
    }
}

/// The backend's own message when it sent one, else the raw body, else
/// the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Some(message) = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
    {
        return message;
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.chars().take(MAX_ERROR_TEXT).collect();
    }

    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

fn parse_code(code: &str) -> ClientResult<u32> {
    code.parse::<u32>().map_err(|_| {
        ClientError::Validation(courier_core::ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must be numeric".to_string(),
        })
    })
}

// =============================================================================
// RemoteGateway Implementation
// =============================================================================

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn login(&self, phone: &str, pin: &str) -> ClientResult<AuthGrant> {
        let pin = parse_code(&validate_pin(pin)?)?;
        let response: AuthResponse = self
            .post(
                "delivery/login",
                &LoginRequest {
                    phone_number: phone,
                    pin,
                },
                Endpoint::Auth,
            )
            .await?;
        response.into_grant()
    }

    async fn request_otp(&self, phone: &str) -> ClientResult<()> {
        let ack: AckResponse = self
            .post(
                "delivery/request-otp",
                &OtpRequest {
                    phone_number: phone,
                },
                Endpoint::Auth,
            )
            .await?;
        match ack.rejection() {
            Some(message) => Err(ClientError::auth_rejected(message)),
            None => Ok(()),
        }
    }

    async fn verify_otp(&self, phone: &str, code: &str) -> ClientResult<AuthGrant> {
        let otp = parse_code(&validate_otp(code)?)?;
        let response: AuthResponse = self
            .post(
                "delivery/verify-otp",
                &VerifyOtpRequest {
                    phone_number: phone,
                    otp,
                },
                Endpoint::Auth,
            )
            .await?;
        response.into_grant()
    }

    async fn get_profile(&self) -> ClientResult<Profile> {
        let response: ProfileResponse = self.get("delivery/profile", &[]).await?;
        response.into_profile()
    }

    async fn get_active_orders(&self) -> ClientResult<Vec<Order>> {
        let response: OrdersResponse = self.get("delivery/orders/active", &[]).await?;
        response.into_orders()
    }

    async fn get_order_history(&self, limit: u32, offset: u32) -> ClientResult<Vec<Order>> {
        let response: OrdersResponse = self
            .get(
                "delivery/orders/history",
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )
            .await?;
        response.into_orders()
    }

    async fn get_order_details(&self, order_id: &str) -> ClientResult<Order> {
        let response: OrderResponse = self
            .get(&format!("delivery/orders/{}", order_id), &[])
            .await?;
        response.into_order()
    }

    async fn accept_order(&self, order_id: &str) -> ClientResult<()> {
        let ack: AckResponse = self
            .post(
                &format!("delivery/orders/{}/accept", order_id),
                &serde_json::json!({}),
                Endpoint::Data,
            )
            .await?;
        match ack.rejection() {
            Some(message) => Err(ClientError::remote_rejected(message)),
            None => Ok(()),
        }
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        location: Option<GeoLocation>,
    ) -> ClientResult<()> {
        let ack: AckResponse = self
            .post(
                &format!("delivery/orders/{}/status", order_id),
                &StatusUpdateRequest { status, location },
                Endpoint::Data,
            )
            .await?;
        match ack.rejection() {
            Some(message) => Err(ClientError::remote_rejected(message)),
            None => Ok(()),
        }
    }

    async fn complete_delivery(
        &self,
        order_id: &str,
        location: Option<GeoLocation>,
        signature: Option<&str>,
    ) -> ClientResult<CompletionReceipt> {
        let response: CompleteResponse = self
            .post(
                &format!("delivery/orders/{}/complete", order_id),
                &CompleteRequest {
                    location,
                    signature,
                },
                Endpoint::Data,
            )
            .await?;
        response.into_receipt()
    }

    async fn get_earnings(&self, period: EarningsPeriod) -> ClientResult<RemoteEarnings> {
        let response: EarningsResponse = self
            .get("delivery/earnings", &[("period", period.as_str().to_string())])
            .await?;
        Ok(response.into_earnings(period))
    }

    async fn get_earnings_history(&self, limit: u32) -> ClientResult<Vec<EarningsRecord>> {
        let response: EarningsHistoryResponse = self
            .get(
                "delivery/earnings/history",
                &[("limit", limit.to_string()), ("offset", "0".to_string())],
            )
            .await?;
        Ok(response.into_records())
    }

    async fn set_availability(&self, available: bool) -> ClientResult<()> {
        let ack: AckResponse = self
            .post(
                "delivery/availability",
                &AvailabilityRequest {
                    is_available: available,
                },
                Endpoint::Data,
            )
            .await?;
        match ack.rejection() {
            Some(message) => Err(ClientError::remote_rejected(message)),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use courier_db::MemoryCredentialStore;

    #[test]
    fn test_status_mapping() {
        let msg = || "nope".to_string();

        assert_eq!(
            HttpGateway::map_status(StatusCode::UNAUTHORIZED, msg(), Endpoint::Data),
            ClientError::SessionExpired
        );
        assert_eq!(
            HttpGateway::map_status(StatusCode::UNAUTHORIZED, msg(), Endpoint::Auth),
            ClientError::auth_rejected("nope")
        );
        assert_eq!(
            HttpGateway::map_status(StatusCode::CONFLICT, msg(), Endpoint::Data),
            ClientError::remote_rejected("nope")
        );
        assert!(
            HttpGateway::map_status(StatusCode::BAD_GATEWAY, msg(), Endpoint::Auth).is_retryable()
        );
    }

    #[test]
    fn test_error_message_sources() {
        assert_eq!(
            error_message(StatusCode::CONFLICT, r#"{"message":"Order already taken"}"#),
            "Order already taken"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"bad pin"}"#),
            "bad pin"
        );
        assert_eq!(error_message(StatusCode::FORBIDDEN, " blocked "), "blocked");
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }

    #[test]
    fn test_url_joining() {
        let settings = ApiSettings {
            base_url: "http://localhost:8081/api/v1/".to_string(),
            timeout_secs: 5,
        };
        let gateway =
            HttpGateway::new(&settings, Arc::new(MemoryCredentialStore::new())).unwrap();

        assert_eq!(gateway.base_url(), "http://localhost:8081/api/v1");
        assert_eq!(
            gateway.url("/delivery/orders/active"),
            "http://localhost:8081/api/v1/delivery/orders/active"
        );
    }

    #[test]
    fn test_codes_keep_numeric_value() {
        assert_eq!(parse_code("123456").unwrap(), 123456);
        assert_eq!(parse_code("012345").unwrap(), 12345);
    }
}
