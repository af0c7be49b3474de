//! Patient and medical data models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{new_id, now_timestamp, Address, AddressInput};

/// Patient gender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    /// Parse the stored form (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// ABO/Rh blood group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }

    /// Parse the stored form ("AB+", "o-", ...).
    pub fn parse(value: &str) -> Option<Self> {
        let upper = value.trim().to_uppercase();
        Self::ALL.into_iter().find(|group| group.as_str() == upper)
    }
}

/// Clinical measurements attached to at most one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalData {
    pub id: String,
    pub blood_group: BloodGroup,
    /// Height in cm
    pub height: f64,
    /// Weight in kg
    pub weight: f64,
    pub medical_history: String,
}

/// Partial medical data as supplied by a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MedicalDataInput {
    pub blood_group: Option<BloodGroup>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub medical_history: Option<String>,
}

impl MedicalDataInput {
    pub fn apply_to(&self, data: &mut MedicalData) {
        if let Some(blood_group) = self.blood_group {
            data.blood_group = blood_group;
        }
        if let Some(height) = self.height {
            data.height = height;
        }
        if let Some(weight) = self.weight {
            data.weight = weight;
        }
        if let Some(history) = &self.medical_history {
            data.medical_history = history.clone();
        }
    }

    /// Build a fresh record. Returns `None` without a blood group.
    pub fn to_medical_data(&self) -> Option<MedicalData> {
        Some(MedicalData {
            id: new_id(),
            blood_group: self.blood_group?,
            height: self.height.unwrap_or_default(),
            weight: self.weight.unwrap_or_default(),
            medical_history: self.medical_history.clone().unwrap_or_default(),
        })
    }
}

/// A patient under a doctor's care.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    /// Treating doctor
    pub doctor_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub contact: String,
    pub email: String,
    pub address_id: Option<String>,
    pub medical_data_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Age in whole years on the given day.
    pub fn age_on(&self, day: NaiveDate) -> u32 {
        day.years_since(self.date_of_birth).unwrap_or(0)
    }
}

/// Input for admitting a new patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub contact: String,
    pub email: String,
    pub address: Option<AddressInput>,
    pub medical_data: Option<MedicalDataInput>,
}

impl NewPatient {
    /// Build the patient row for a doctor. Nested records are linked by the caller.
    pub fn to_patient(&self, doctor_id: String) -> Patient {
        let now = now_timestamp();
        Patient {
            id: new_id(),
            doctor_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            contact: self.contact.clone(),
            email: self.email.clone(),
            address_id: None,
            medical_data_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Patient edit. Absent fields keep their stored value; nested inputs are
/// applied partially, creating the nested record when it does not exist yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<AddressInput>,
    pub medical_data: Option<MedicalDataInput>,
}

impl PatientUpdate {
    pub fn apply_to(&self, patient: &mut Patient) {
        if let Some(first_name) = &self.first_name {
            patient.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            patient.last_name = last_name.clone();
        }
        if let Some(date_of_birth) = self.date_of_birth {
            patient.date_of_birth = date_of_birth;
        }
        if let Some(gender) = self.gender {
            patient.gender = gender;
        }
        if let Some(contact) = &self.contact {
            patient.contact = contact.clone();
        }
        if let Some(email) = &self.email {
            patient.email = email.clone();
        }
    }
}

/// Patient with nested records resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    pub patient: Patient,
    pub address: Option<Address>,
    pub medical_data: Option<MedicalData>,
}
