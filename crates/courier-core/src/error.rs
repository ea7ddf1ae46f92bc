//! # Error Types
//!
//! Domain-specific error types for courier-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  courier-core errors (this file)                                       │
//! │  ├── CoreError        - Lifecycle and ingestion rule violations        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  courier-db errors (separate crate)                                    │
//! │  └── DbError          - Credential persistence failures                │
//! │                                                                         │
//! │  courier-client errors                                                 │
//! │  └── ClientError      - What the UI sees (session, network, remote)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → UI                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (order id, statuses, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::lifecycle::OrderAction;
use crate::money::Money;
use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The requested action is not legal from the order's current status.
    ///
    /// ## When This Occurs
    /// - Accepting an order that is already picked up
    /// - Completing an order that was never started
    /// - Any action on a delivered or cancelled order
    ///
    /// ## User Workflow
    /// ```text
    /// Tap "Start Delivery" (order is still pending)
    ///      │
    ///      ▼
    /// OrderStatus::Pending.apply(StartDelivery)
    ///      │
    ///      ▼
    /// InvalidTransition { from: pending, to: in_transit, action: start_delivery }
    ///      │
    ///      ▼
    /// UI shows: "Cannot start_delivery: order is pending"
    /// ```
    #[error("Cannot {action}: order is {from}, no transition to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        action: OrderAction,
    },

    /// An ingested order violates `amount = subtotal + delivery_fee`.
    #[error(
        "Order {order_id} amount {amount} does not equal subtotal {subtotal} + delivery fee {delivery_fee}"
    )]
    AmountMismatch {
        order_id: String,
        subtotal: Money,
        delivery_fee: Money,
        amount: Money,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// They are raised before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field must have an exact number of characters (phone, PIN, OTP).
    #[error("{field} must be exactly {expected} digits")]
    WrongLength { field: String, expected: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., letters in a phone number, malformed amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
