//! # Client Error Types
//!
//! What every courier-client operation can fail with.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Local       │  │    Session      │  │      Remote             │ │
//! │  │  (no I/O done)  │  │                 │  │                         │ │
//! │  │  Validation     │  │  NotSignedIn    │  │  Network      (retry)   │ │
//! │  │  InvalidTrans.  │  │  AuthRejected   │  │  RemoteRejected(resync) │ │
//! │  │  TransitionIn-  │  │  SessionExpired │  │                         │ │
//! │  │   Progress      │  │  AuthInProgress │  │                         │ │
//! │  │  OrderNotFound  │  │  AlreadySigned- │  │                         │ │
//! │  │                 │  │   In            │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                               │
//! │  │    Storage      │  │ Configuration   │                               │
//! │  │  (courier-db)   │  │  InvalidConfig  │                               │
//! │  │                 │  │  ConfigLoad/Save│                               │
//! │  └─────────────────┘  └─────────────────┘                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Handling Policy
//! - Local errors are raised before any network call and never retried
//! - `Network`: the optimistic change has already been rolled back; retry
//! - `RemoteRejected`: the local view is stale; re-fetch
//! - `SessionExpired`: the session has already been torn down

use courier_core::{CoreError, OrderAction, OrderStatus, ValidationError};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error type covering all possible failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Input rejected before any I/O.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The action is not legal from the order's current status.
    #[error("Cannot {action} order {order_id}: it is {from}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        action: OrderAction,
    },

    /// Another transition on the same order has not finished yet.
    #[error("Order {order_id} is already being updated")]
    TransitionInProgress { order_id: String },

    /// An availability change has not finished yet.
    #[error("Availability is already being updated")]
    AvailabilityUpdateInProgress,

    /// The order is in neither the active nor the history view.
    #[error("Order {order_id} not found")]
    OrderNotFound { order_id: String },

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// The operation needs a signed-in courier.
    #[error("Not signed in")]
    NotSignedIn,

    /// A login or OTP verification is already running.
    #[error("Sign-in already in progress")]
    AuthenticationInProgress,

    /// A courier is already signed in on this device.
    #[error("Already signed in; sign out first")]
    AlreadySignedIn,

    /// The backend refused the credentials.
    #[error("Sign-in rejected: {message}")]
    AuthRejected { message: String },

    /// The backend no longer accepts the token (401).
    #[error("Session expired, please sign in again")]
    SessionExpired,

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The backend could not be reached, timed out, or failed (5xx).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend refused the request or sent something unusable.
    #[error("Request rejected: {message}")]
    RemoteRejected { message: String },

    // =========================================================================
    // Storage & Configuration Errors
    // =========================================================================
    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

// =============================================================================
// Constructors
// =============================================================================

impl ClientError {
    pub fn remote_rejected(message: impl Into<String>) -> Self {
        ClientError::RemoteRejected {
            message: message.into(),
        }
    }

    pub fn auth_rejected(message: impl Into<String>) -> Self {
        ClientError::AuthRejected {
            message: message.into(),
        }
    }

    /// Attaches an order id to a core lifecycle error.
    pub fn from_core(order_id: &str, err: CoreError) -> Self {
        match err {
            CoreError::InvalidTransition { from, action, .. } => ClientError::InvalidTransition {
                order_id: order_id.to_string(),
                from,
                action,
            },
            CoreError::AmountMismatch { .. } => ClientError::remote_rejected(err.to_string()),
            CoreError::Validation(v) => ClientError::Validation(v),
        }
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<courier_db::DbError> for ClientError {
    fn from(err: courier_db::DbError) -> Self {
        ClientError::Storage(err.to_string())
    }
}

/// Transport failures are `Network`; undecodable bodies are `RemoteRejected`.
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::remote_rejected(format!("malformed response: {}", err))
        } else if err.is_timeout() {
            ClientError::Network(format!("request timed out: {}", err))
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Returns true if the same request may succeed if simply retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// Returns true if the local view is probably stale and should be
    /// re-fetched before trying again.
    pub fn requires_resync(&self) -> bool {
        matches!(self, ClientError::RemoteRejected { .. })
    }

    /// Returns true if the courier has to sign in again.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, ClientError::SessionExpired | ClientError::NotSignedIn)
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}
