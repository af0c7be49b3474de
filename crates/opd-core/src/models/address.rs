//! Postal address models.

use serde::{Deserialize, Serialize};

use super::{new_id, now_timestamp};
use crate::db::NOT_SPECIFIED;

/// A postal address, owned by exactly one doctor or one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub id: String,
    pub house_number: Option<String>,
    pub street_name: String,
    pub city: String,
    pub state: String,
    /// Six-character postal code
    pub pincode: String,
    pub created_at: String,
}

impl Address {
    /// Placeholder address written by the registration cascade.
    pub fn placeholder() -> Self {
        Self {
            id: new_id(),
            house_number: Some(NOT_SPECIFIED.to_string()),
            street_name: NOT_SPECIFIED.to_string(),
            city: NOT_SPECIFIED.to_string(),
            state: NOT_SPECIFIED.to_string(),
            pincode: NOT_SPECIFIED.to_string(),
            created_at: now_timestamp(),
        }
    }

    /// Check whether this is still the untouched placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.street_name == NOT_SPECIFIED
            && self.city == NOT_SPECIFIED
            && self.state == NOT_SPECIFIED
            && self.pincode == NOT_SPECIFIED
    }
}

/// Partial address as supplied by a caller.
///
/// Applied field-by-field over an existing address, or turned into a new
/// address when every required field is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AddressInput {
    pub house_number: Option<String>,
    pub street_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

impl AddressInput {
    /// Overwrite the fields present in this input.
    pub fn apply_to(&self, address: &mut Address) {
        if let Some(house_number) = &self.house_number {
            address.house_number = Some(house_number.clone());
        }
        if let Some(street_name) = &self.street_name {
            address.street_name = street_name.clone();
        }
        if let Some(city) = &self.city {
            address.city = city.clone();
        }
        if let Some(state) = &self.state {
            address.state = state.clone();
        }
        if let Some(pincode) = &self.pincode {
            address.pincode = pincode.clone();
        }
    }

    /// Build a fresh address. Missing required fields become empty strings
    /// and are rejected by validation.
    pub fn to_address(&self) -> Address {
        Address {
            id: new_id(),
            house_number: self.house_number.clone(),
            street_name: self.street_name.clone().unwrap_or_default(),
            city: self.city.clone().unwrap_or_default(),
            state: self.state.clone().unwrap_or_default(),
            pincode: self.pincode.clone().unwrap_or_default(),
            created_at: now_timestamp(),
        }
    }
}
