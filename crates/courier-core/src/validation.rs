//! # Validation Module
//!
//! Input and ingestion validation for the courier client.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Login form (UI)                                              │
//! │  └── Immediate feedback while typing                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: SessionManager                                               │
//! │  └── validate_phone_number / validate_pin / validate_otp               │
//! │      (before any network call)                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Gateway ingestion                                            │
//! │  └── validate_order: every order the backend sends                     │
//! │      (amount = subtotal + delivery_fee, sane quantities)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use courier_core::validation::{validate_phone_number, validate_pin};
//!
//! assert_eq!(validate_phone_number(" 9876543210 ").unwrap(), "9876543210");
//! assert!(validate_pin("12345").is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::Order;
use crate::{MAX_ITEM_QUANTITY, OTP_LENGTH, PHONE_NUMBER_DIGITS, PIN_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Credential Validators
// =============================================================================

/// Checks that `value` is exactly `len` ASCII digits after trimming.
fn validate_digits(field: &str, value: &str, len: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    if value.len() != len {
        return Err(ValidationError::WrongLength {
            field: field.to_string(),
            expected: len,
        });
    }

    Ok(value.to_string())
}

/// Validates a courier phone number and returns it trimmed.
///
/// ## Rules
/// - Must not be empty
/// - Digits only
/// - Exactly 10 digits
pub fn validate_phone_number(phone: &str) -> ValidationResult<String> {
    validate_digits("phone number", phone, PHONE_NUMBER_DIGITS)
}

/// Validates a 6-digit login PIN.
pub fn validate_pin(pin: &str) -> ValidationResult<String> {
    validate_digits("PIN", pin, PIN_LENGTH)
}

/// Validates a 6-digit one-time password.
pub fn validate_otp(code: &str) -> ValidationResult<String> {
    validate_digits("OTP", code, OTP_LENGTH)
}

/// Validates an order identifier passed in by the caller.
pub fn validate_order_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "order id".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Ingestion Validators
// =============================================================================

/// Validates an order received from the backend.
///
/// ## Rules
/// - `id` and `order_id` present
/// - Every item quantity in 1..=999
/// - No negative amounts
/// - `amount == subtotal + delivery_fee`, exactly
///
/// ## Example
/// The 200 + 30 = 230 case is checked in the unit tests below.
pub fn validate_order(order: &Order) -> CoreResult<()> {
    validate_order_id(&order.id)?;

    if order.order_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "order number".to_string(),
        }
        .into());
    }

    for item in &order.items {
        if item.quantity < 1 || item.quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: format!("quantity of '{}'", item.name),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            }
            .into());
        }
        if item.price.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: format!("price of '{}'", item.name),
            }
            .into());
        }
    }

    for (field, value) in [
        ("subtotal", order.subtotal),
        ("delivery fee", order.delivery_fee),
        ("amount", order.amount),
    ] {
        if value.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: field.to_string(),
            }
            .into());
        }
    }

    let expected = order.subtotal.checked_add(order.delivery_fee);
    if expected != Some(order.amount) {
        return Err(CoreError::AmountMismatch {
            order_id: order.id.clone(),
            subtotal: order.subtotal,
            delivery_fee: order.delivery_fee,
            amount: order.amount,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{Customer, OrderItem, OrderStatus};
    use chrono::{TimeZone, Utc};

    fn order(subtotal: i64, fee: i64, amount: i64) -> Order {
        Order {
            id: "T1".to_string(),
            order_id: "#ORD-1".to_string(),
            status: OrderStatus::Pending,
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
            subtotal: Money::from_rupees(subtotal),
            delivery_fee: Money::from_rupees(fee),
            amount: Money::from_rupees(amount),
            created_at: Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap(),
            completed_at: None,
            distance_km: Some(3.2),
        }
    }

    #[test]
    fn test_validate_phone_number() {
        assert_eq!(validate_phone_number("9876543210").unwrap(), "9876543210");
        assert!(matches!(
            validate_phone_number(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_phone_number("987654321"),
            Err(ValidationError::WrongLength { expected: 10, .. })
        ));
        assert!(matches!(
            validate_phone_number("98765432100"),
            Err(ValidationError::WrongLength { .. })
        ));
        assert!(matches!(
            validate_phone_number("98765-4321"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_pin_and_otp() {
        assert!(validate_pin("123456").is_ok());
        assert!(validate_pin("12345").is_err());
        assert!(validate_pin("12a456").is_err());
        assert!(validate_otp("000000").is_ok());
        assert!(validate_otp("1234567").is_err());
    }

    #[test]
    fn test_amount_invariant_holds() {
        assert!(validate_order(&order(200, 30, 230)).is_ok());
    }

    #[test]
    fn test_amount_invariant_violation_is_rejected() {
        let err = validate_order(&order(200, 30, 250)).unwrap_err();
        assert!(matches!(err, CoreError::AmountMismatch { ref order_id, .. } if order_id == "T1"));
    }

    #[test]
    fn test_item_quantity_bounds() {
        let mut bad = order(200, 30, 230);
        bad.items[0].quantity = 0;
        assert!(matches!(
            validate_order(&bad),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_missing_ids_rejected() {
        let mut bad = order(200, 30, 230);
        bad.id = " ".to_string();
        assert!(validate_order(&bad).is_err());

        let mut bad = order(200, 30, 230);
        bad.order_id.clear();
        assert!(validate_order(&bad).is_err());
    }
}
