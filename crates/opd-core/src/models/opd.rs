//! OPD models and the denormalized counters it carries.

use serde::{Deserialize, Serialize};

use super::{new_id, now_timestamp};
use crate::db::NOT_SPECIFIED;

/// Outpatient department, one per doctor.
///
/// `active_patient` and `no_of_appointment` mirror the live number of
/// patients and appointments owned by the doctor. They are maintained by
/// lifecycle reactions through atomic store increments only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Opd {
    pub id: String,
    /// Owning doctor
    pub doctor_id: String,
    pub name: String,
    pub days_of_operation: String,
    pub max_patient_capacity: u32,
    pub active_patient: u32,
    pub no_of_appointment: u32,
    pub last_updated: String,
    pub created_at: String,
}

impl Opd {
    /// Placeholder OPD written when a doctor is created.
    pub fn placeholder(doctor_id: String) -> Self {
        let now = now_timestamp();
        Self {
            id: new_id(),
            doctor_id,
            name: NOT_SPECIFIED.to_string(),
            days_of_operation: NOT_SPECIFIED.to_string(),
            max_patient_capacity: 0,
            active_patient: 0,
            no_of_appointment: 0,
            last_updated: now.clone(),
            created_at: now,
        }
    }

    /// Check whether the active patient count exceeds capacity.
    pub fn is_over_capacity(&self) -> bool {
        self.active_patient > self.max_patient_capacity
    }
}

/// OPD edit. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OpdUpdate {
    pub name: Option<String>,
    pub days_of_operation: Option<String>,
    pub max_patient_capacity: Option<u32>,
    pub active_patient: Option<u32>,
    pub no_of_appointment: Option<u32>,
}

impl OpdUpdate {
    pub fn apply_to(&self, opd: &mut Opd) {
        if let Some(name) = &self.name {
            opd.name = name.clone();
        }
        if let Some(days) = &self.days_of_operation {
            opd.days_of_operation = days.clone();
        }
        if let Some(capacity) = self.max_patient_capacity {
            opd.max_patient_capacity = capacity;
        }
        if let Some(active) = self.active_patient {
            opd.active_patient = active;
        }
        if let Some(appointments) = self.no_of_appointment {
            opd.no_of_appointment = appointments;
        }
    }
}

/// A counter column on the OPD row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OpdCounter {
    /// Live patients of the doctor
    ActivePatient,
    /// Live appointments of the doctor
    Appointments,
}

impl OpdCounter {
    /// Column backing this counter.
    pub fn column(&self) -> &'static str {
        match self {
            OpdCounter::ActivePatient => "active_patient",
            OpdCounter::Appointments => "no_of_appointment",
        }
    }
}

/// Counter values before and after a reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CounterReport {
    pub opd_id: String,
    pub active_patient_before: u32,
    pub active_patient_after: u32,
    pub no_of_appointment_before: u32,
    pub no_of_appointment_after: u32,
}

impl CounterReport {
    /// True when the stored counters had drifted from live cardinality.
    pub fn drifted(&self) -> bool {
        self.active_patient_before != self.active_patient_after
            || self.no_of_appointment_before != self.no_of_appointment_after
    }
}
