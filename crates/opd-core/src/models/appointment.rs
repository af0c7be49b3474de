//! Appointment models.

use serde::{Deserialize, Serialize};

use super::{new_id, now_timestamp};

/// A booked appointment with a doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub doctor_id: String,
    /// Name of the person booking
    pub name: String,
    /// Booking time, fixed at creation
    pub date_time: String,
    pub active: bool,
    pub last_updated: String,
}

impl Appointment {
    /// Create an active appointment stamped with the current time.
    pub fn new(doctor_id: String, name: String) -> Self {
        let now = now_timestamp();
        Self {
            id: new_id(),
            doctor_id,
            name,
            date_time: now.clone(),
            active: true,
            last_updated: now,
        }
    }
}

/// Appointment edit. `date_time` is not editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentUpdate {
    pub name: Option<String>,
    pub active: Option<bool>,
}

impl AppointmentUpdate {
    pub fn apply_to(&self, appointment: &mut Appointment) {
        if let Some(name) = &self.name {
            appointment.name = name.clone();
        }
        if let Some(active) = self.active {
            appointment.active = active;
        }
    }
}
