//! Field and record rules checked before a write is committed.
//!
//! These guards run on caller-supplied input only. Counter adjustments made by
//! the lifecycle orchestrator bypass them, so the capacity rule is advisory:
//! it holds for explicit OPD edits, not for the running patient count.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Address, InventoryItem, OpdUpdate};

/// Length of an Indian postal code.
pub const PINCODE_LENGTH: usize = 6;

/// Validation failures, surfaced to the caller of the rejected write.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("No capacity available: {active} active patients exceeds capacity {capacity}")]
    CapacityExceeded { active: u32, capacity: u32 },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("{0}")]
    ValidationMismatch(String),
}

impl ValidationError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

pub type ValidationResult = Result<(), ValidationError>;

/// Reject an OPD edit that sets both counts with active above capacity.
///
/// Only fires when the update carries both fields.
pub fn validate_opd_update(update: &OpdUpdate) -> ValidationResult {
    if let (Some(active), Some(capacity)) = (update.active_patient, update.max_patient_capacity) {
        if active > capacity {
            return Err(ValidationError::CapacityExceeded { active, capacity });
        }
    }
    Ok(())
}

/// Reject negative or non-finite prices.
pub fn validate_item_price(price: f64) -> ValidationResult {
    if !price.is_finite() {
        return Err(ValidationError::invalid("item_price", "price must be a finite number"));
    }
    if price < 0.0 {
        return Err(ValidationError::invalid("item_price", "Item price cannot be negative"));
    }
    Ok(())
}

pub fn validate_inventory_item(item: &InventoryItem) -> ValidationResult {
    if item.item_name.trim().is_empty() {
        return Err(ValidationError::invalid("item_name", "item name is required"));
    }
    validate_item_price(item.item_price)
}

/// Reject a birth date after `today`.
pub fn validate_date_of_birth(date_of_birth: NaiveDate, today: NaiveDate) -> ValidationResult {
    if date_of_birth > today {
        return Err(ValidationError::invalid(
            "date_of_birth",
            "date of birth cannot be in future",
        ));
    }
    Ok(())
}

/// Reject a password confirmation that differs from the password.
pub fn validate_password_confirmation(password: &str, confirmation: &str) -> ValidationResult {
    if password != confirmation {
        return Err(ValidationError::ValidationMismatch(
            "password and confirm password does not match".into(),
        ));
    }
    Ok(())
}

/// Check the registration fields that need no store lookup.
pub fn validate_registration(username: &str, email: &str, password: &str) -> ValidationResult {
    if username.trim().is_empty() {
        return Err(ValidationError::invalid("username", "username is required"));
    }
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(ValidationError::invalid("email", "enter a valid email address"));
    }
    if password.is_empty() {
        return Err(ValidationError::invalid("password", "password is required"));
    }
    Ok(())
}

/// Check a caller-supplied address.
pub fn validate_address(address: &Address) -> ValidationResult {
    let required = [
        ("street_name", &address.street_name),
        ("city", &address.city),
        ("state", &address.state),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::invalid(field, "this field is required"));
        }
    }

    let pincode = address.pincode.trim();
    if pincode.len() != PINCODE_LENGTH || !pincode.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid(
            "pincode",
            format!("pincode must be {} digits", PINCODE_LENGTH),
        ));
    }
    Ok(())
}

/// Reject negative or non-finite body measurements.
pub fn validate_measurement(field: &'static str, value: f64) -> ValidationResult {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::invalid(field, "must be a non-negative number"));
    }
    Ok(())
}
