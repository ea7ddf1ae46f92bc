//! # courier-core: Pure Business Logic for the Courier Client
//!
//! This crate holds the rules that decide what a courier may do with an
//! order and how earnings are rolled up. Everything here is a pure function
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Courier Client Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Mobile UI (out of scope)                     │   │
//! │  │    Login ──► Dashboard ──► Orders ──► Order Details ──► Earnings│   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              courier-client (session, orders, gateway)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ courier-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ lifecycle │  │ earnings  │  │ validation│  │   │
//! │  │   │   Order   │  │ Pending → │  │ summarize │  │ phone/pin │  │   │
//! │  │   │  Profile  │  │ Delivered │  │  periods  │  │  amounts  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, Profile, OrderStatus, etc.)
//! - [`money`] - Money type with integer arithmetic (paise, no floating point)
//! - [`lifecycle`] - The order status transition table
//! - [`earnings`] - Earnings roll-ups for today/week/month
//! - [`error`] - Domain error types
//! - [`validation`] - Input and ingestion validation
//!
//! ## Example Usage
//!
//! ```rust
//! use courier_core::{OrderAction, OrderStatus};
//!
//! let next = OrderStatus::Pending.apply(OrderAction::Accept).unwrap();
//! assert_eq!(next, OrderStatus::PickedUp);
//!
//! // Delivered is terminal: nothing moves it again
//! assert!(OrderStatus::Delivered.apply(OrderAction::Cancel).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod earnings;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use earnings::{period_start, summarize};
pub use error::{CoreError, CoreResult, ValidationError};
pub use lifecycle::OrderAction;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Digits in a courier phone number (carrier requirement).
pub const PHONE_NUMBER_DIGITS: usize = 10;

/// Digits in a login PIN.
pub const PIN_LENGTH: usize = 6;

/// Digits in a one-time password.
pub const OTP_LENGTH: usize = 6;

/// Maximum quantity of a single line item accepted on ingestion.
///
/// Anything larger is almost certainly a malformed payload.
pub const MAX_ITEM_QUANTITY: i64 = 999;
