//! Doctor profile models.

use serde::{Deserialize, Serialize};

use super::{new_id, now_timestamp, Address, AddressInput};
use crate::db::NOT_SPECIFIED;

/// Image reference used until a doctor uploads their own.
pub const DEFAULT_PROFILE_IMAGE: &str = "profile/default-profile.png";

/// A doctor profile, linked one-to-one with a principal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: String,
    /// Owning principal
    pub principal_id: String,
    /// Full name
    pub name: String,
    /// Stored path of the profile image
    pub profile_image: String,
    pub speciality: String,
    pub phone_number: String,
    /// Years of experience
    pub experience: u32,
    pub about: String,
    pub education: String,
    /// Owned address; cleared if the address is deleted
    pub address_id: Option<String>,
    pub created_at: String,
}

impl Doctor {
    /// Placeholder doctor written by the registration cascade.
    pub fn placeholder(principal_id: String, address_id: Option<String>) -> Self {
        Self {
            id: new_id(),
            principal_id,
            name: NOT_SPECIFIED.to_string(),
            profile_image: DEFAULT_PROFILE_IMAGE.to_string(),
            speciality: NOT_SPECIFIED.to_string(),
            phone_number: "000-000-0000".to_string(),
            experience: 0,
            about: NOT_SPECIFIED.to_string(),
            education: NOT_SPECIFIED.to_string(),
            address_id,
            created_at: now_timestamp(),
        }
    }

    /// Display name ("Dr. <name>").
    pub fn display_name(&self) -> String {
        format!("Dr. {}", self.name)
    }
}

/// Doctor with its address resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfile {
    pub doctor: Doctor,
    pub address: Option<Address>,
}

/// Profile edit. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DoctorUpdate {
    pub name: Option<String>,
    pub profile_image: Option<String>,
    pub speciality: Option<String>,
    pub phone_number: Option<String>,
    pub experience: Option<u32>,
    pub about: Option<String>,
    pub education: Option<String>,
    pub address: Option<AddressInput>,
}

impl DoctorUpdate {
    /// Apply the scalar fields. The nested address is handled by the caller.
    pub fn apply_to(&self, doctor: &mut Doctor) {
        if let Some(name) = &self.name {
            doctor.name = name.clone();
        }
        if let Some(profile_image) = &self.profile_image {
            doctor.profile_image = profile_image.clone();
        }
        if let Some(speciality) = &self.speciality {
            doctor.speciality = speciality.clone();
        }
        if let Some(phone_number) = &self.phone_number {
            doctor.phone_number = phone_number.clone();
        }
        if let Some(experience) = self.experience {
            doctor.experience = experience;
        }
        if let Some(about) = &self.about {
            doctor.about = about.clone();
        }
        if let Some(education) = &self.education {
            doctor.education = education.clone();
        }
    }
}
