//! OPD Core Library
//!
//! Clinic back end for doctors running an outpatient department (OPD):
//! profiles, the OPD itself, inventory, appointments and patients.
//!
//! # Architecture
//!
//! ```text
//!   host app (FFI)                     Rust callers
//!        │                                  │
//!        ▼                                  ▼
//!   ┌─────────┐    token    ┌─────────────────────────────┐
//!   │ OpdCore │ ──────────▶ │  Clinic (access layer)      │
//!   └─────────┘             │  validation · ownership     │
//!                           └──────────────┬──────────────┘
//!                                          │ unit of work
//!                     ┌────────────────────┼────────────────────┐
//!                     ▼                    ▼                    ▼
//!                  Store            Orchestrator          auth (pbkdf2,
//!               (SQLite rows)    (cascade + counters)       tokens)
//! ```
//!
//! # Core Principle
//!
//! **Derived state commits with the write that caused it.** Registration
//! creates the doctor, OPD and inventory; deleting an account removes them;
//! the OPD counters move with every appointment and patient. All of it runs
//! inside the triggering transaction.
//!
//! # Modules
//!
//! - [`db`]: SQLite store and unit of work
//! - [`models`]: Domain types (Doctor, Opd, Patient, etc.)
//! - [`lifecycle`]: Reaction registry driving cascades and counters
//! - [`service`]: Authenticated, ownership-scoped operations
//! - [`validation`]: Field and cross-field rules
//! - [`auth`]: Password hashing and tokens
//! - [`config`]: Configuration and logging setup

pub mod auth;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use lifecycle::{EntityKind, Event, LifecycleError, Orchestrator, Phase, Reaction};
pub use models::{
    Address, Appointment, BloodGroup, Doctor, Gender, InventoryItem, MedicalData, Opd, Patient,
};
pub use service::{Clinic, OpdError, OpdResult, Registration, Session};
pub use validation::ValidationError;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use chrono::NaiveDate;
use std::sync::{Arc, Mutex};

use models::DATE_FORMAT;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum OpdFfiError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate resource: {0}")]
    DuplicateResource(String),

    #[error("Invalid credential")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Transaction aborted: {0}")]
    TransactionAborted(String),
}

impl From<OpdError> for OpdFfiError {
    fn from(e: OpdError) -> Self {
        match e {
            OpdError::Validation(v) => OpdFfiError::Validation(v.to_string()),
            OpdError::DuplicateResource(msg) => OpdFfiError::DuplicateResource(msg),
            e @ OpdError::NotFound { .. } => OpdFfiError::NotFound(e.to_string()),
            OpdError::InvalidCredentials => OpdFfiError::InvalidCredentials,
            OpdError::Unauthorized => OpdFfiError::Unauthorized,
            OpdError::PermissionDenied(msg) => OpdFfiError::PermissionDenied(msg),
            OpdError::TransactionAborted(l) => OpdFfiError::TransactionAborted(l.to_string()),
            OpdError::Database(d) => OpdFfiError::DatabaseError(d.to_string()),
        }
    }
}

impl From<db::DbError> for OpdFfiError {
    fn from(e: db::DbError) -> Self {
        OpdFfiError::DatabaseError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for OpdFfiError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        OpdFfiError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a clinic database at the given path.
///
/// Remaining settings come from `OPD_*` environment variables.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<OpdCore>, OpdFfiError> {
    let config = Config {
        database_path: path.into(),
        ..Config::from_env()
    };
    config::init_logging(&config);
    let clinic = Clinic::open(config)?;
    tracing::info!(version = config::APP_VERSION, "{} opened", config::APP_NAME);
    Ok(OpdCore::wrap(clinic))
}

/// Create an in-memory clinic (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<OpdCore>, OpdFfiError> {
    let clinic = Clinic::open_in_memory(Config::from_env())?;
    Ok(OpdCore::wrap(clinic))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe clinic wrapper for FFI.
#[derive(uniffi::Object)]
pub struct OpdCore {
    clinic: Arc<Mutex<Clinic>>,
}

impl OpdCore {
    /// Shared by the factories; tests pass a clinic opened with cheap hashing.
    fn wrap(clinic: Clinic) -> Arc<Self> {
        Arc::new(OpdCore {
            clinic: Arc::new(Mutex::new(clinic)),
        })
    }
}

#[uniffi::export]
impl OpdCore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Register a doctor account. Returns the new principal.
    pub fn register(
        &self,
        username: String,
        email: String,
        password: String,
        password2: String,
    ) -> Result<FfiPrincipal, OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        let principal = clinic.register(Registration {
            username,
            email,
            password,
            password2,
        })?;
        Ok(principal.into())
    }

    /// Exchange credentials for a bearer token.
    pub fn login(&self, username: String, password: String) -> Result<String, OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.login(&username, &password)?)
    }

    pub fn logout(&self, token: String) -> Result<(), OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.logout(&token)?)
    }

    /// Delete the account and every record the doctor owns.
    pub fn delete_account(&self, token: String) -> Result<(), OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.delete_account(&token)?)
    }

    // =========================================================================
    // Doctor Operations
    // =========================================================================

    pub fn get_doctor_profile(&self, token: String) -> Result<FfiDoctorProfile, OpdFfiError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.get_doctor_profile(&token)?.into())
    }

    pub fn update_doctor_profile(
        &self,
        token: String,
        update: FfiDoctorUpdate,
    ) -> Result<FfiDoctorProfile, OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.update_doctor_profile(&token, update.into())?.into())
    }

    // =========================================================================
    // OPD Operations
    // =========================================================================

    pub fn get_opd(&self, token: String) -> Result<FfiOpd, OpdFfiError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.get_opd(&token)?.into())
    }

    pub fn update_opd(&self, token: String, update: FfiOpdUpdate) -> Result<FfiOpd, OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.update_opd(&token, update.into())?.into())
    }

    /// Recompute the OPD counters from live appointment and patient rows.
    pub fn reconcile_counters(&self, token: String) -> Result<FfiCounterReport, OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.reconcile_counters(&token)?.into())
    }

    /// Reaction failures since the clinic was opened.
    pub fn reaction_failure_count(&self) -> Result<u64, OpdFfiError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.orchestrator().failure_count())
    }

    // =========================================================================
    // Inventory Operations
    // =========================================================================

    pub fn list_inventory_items(&self, token: String) -> Result<Vec<FfiInventoryItem>, OpdFfiError> {
        let clinic = self.clinic.lock()?;
        let items = clinic.list_inventory_items(&token)?;
        Ok(items.into_iter().map(|i| i.into()).collect())
    }

    pub fn add_inventory_item(
        &self,
        token: String,
        item_name: String,
        item_quantity: u32,
        item_price: f64,
    ) -> Result<FfiInventoryItem, OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        let item = clinic.add_inventory_item(&token, item_name, item_quantity, item_price)?;
        Ok(item.into())
    }

    pub fn update_inventory_item(
        &self,
        token: String,
        item_id: String,
        item_name: Option<String>,
        item_quantity: Option<u32>,
        item_price: Option<f64>,
    ) -> Result<FfiInventoryItem, OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        let update = models::InventoryItemUpdate {
            item_name,
            item_quantity,
            item_price,
        };
        Ok(clinic.update_inventory_item(&token, &item_id, update)?.into())
    }

    pub fn delete_inventory_item(&self, token: String, item_id: String) -> Result<(), OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.delete_inventory_item(&token, &item_id)?)
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    pub fn list_appointments(&self, token: String) -> Result<Vec<FfiAppointment>, OpdFfiError> {
        let clinic = self.clinic.lock()?;
        let appointments = clinic.list_appointments(&token)?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    pub fn create_appointment(
        &self,
        token: String,
        name: String,
    ) -> Result<FfiAppointment, OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.create_appointment(&token, name)?.into())
    }

    pub fn update_appointment(
        &self,
        token: String,
        appointment_id: String,
        name: Option<String>,
        active: Option<bool>,
    ) -> Result<FfiAppointment, OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        let update = models::AppointmentUpdate { name, active };
        Ok(clinic.update_appointment(&token, &appointment_id, update)?.into())
    }

    pub fn delete_appointment(&self, token: String, appointment_id: String) -> Result<(), OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.delete_appointment(&token, &appointment_id)?)
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    pub fn list_patients(&self, token: String) -> Result<Vec<FfiPatient>, OpdFfiError> {
        let clinic = self.clinic.lock()?;
        let patients = clinic.list_patients(&token)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    pub fn get_patient(
        &self,
        token: String,
        patient_id: String,
    ) -> Result<FfiPatientRecord, OpdFfiError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.get_patient(&token, &patient_id)?.into())
    }

    pub fn create_patient(
        &self,
        token: String,
        patient: FfiNewPatient,
    ) -> Result<FfiPatientRecord, OpdFfiError> {
        let new_patient = patient.try_into()?;
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.create_patient(&token, new_patient)?.into())
    }

    pub fn update_patient(
        &self,
        token: String,
        patient_id: String,
        update: FfiPatientUpdate,
    ) -> Result<FfiPatientRecord, OpdFfiError> {
        let update = update.try_into()?;
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.update_patient(&token, &patient_id, update)?.into())
    }

    pub fn delete_patient(&self, token: String, patient_id: String) -> Result<(), OpdFfiError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.delete_patient(&token, &patient_id)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

fn parse_date(value: &str) -> Result<NaiveDate, OpdFfiError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| OpdFfiError::InvalidInput(format!("date_of_birth '{}': {}", value, e)))
}

fn parse_gender(value: &str) -> Result<Gender, OpdFfiError> {
    Gender::parse(value).ok_or_else(|| OpdFfiError::InvalidInput(format!("gender '{}'", value)))
}

fn parse_blood_group(value: &str) -> Result<BloodGroup, OpdFfiError> {
    BloodGroup::parse(value)
        .ok_or_else(|| OpdFfiError::InvalidInput(format!("blood_group '{}'", value)))
}

/// FFI-safe principal.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrincipal {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<models::Principal> for FfiPrincipal {
    fn from(principal: models::Principal) -> Self {
        Self {
            id: principal.id,
            username: principal.username,
            email: principal.email,
        }
    }
}

/// FFI-safe address.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAddress {
    pub id: String,
    pub house_number: Option<String>,
    pub street_name: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl From<Address> for FfiAddress {
    fn from(address: Address) -> Self {
        Self {
            id: address.id,
            house_number: address.house_number,
            street_name: address.street_name,
            city: address.city,
            state: address.state,
            pincode: address.pincode,
        }
    }
}

/// FFI-safe partial address.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAddressInput {
    pub house_number: Option<String>,
    pub street_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

impl From<FfiAddressInput> for models::AddressInput {
    fn from(input: FfiAddressInput) -> Self {
        models::AddressInput {
            house_number: input.house_number,
            street_name: input.street_name,
            city: input.city,
            state: input.state,
            pincode: input.pincode,
        }
    }
}

/// FFI-safe doctor profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctorProfile {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub profile_image: String,
    pub speciality: String,
    pub phone_number: String,
    pub experience: u32,
    pub about: String,
    pub education: String,
    pub address: Option<FfiAddress>,
}

impl From<models::DoctorProfile> for FfiDoctorProfile {
    fn from(profile: models::DoctorProfile) -> Self {
        let display_name = profile.doctor.display_name();
        let doctor = profile.doctor;
        Self {
            id: doctor.id,
            name: doctor.name,
            display_name,
            profile_image: doctor.profile_image,
            speciality: doctor.speciality,
            phone_number: doctor.phone_number,
            experience: doctor.experience,
            about: doctor.about,
            education: doctor.education,
            address: profile.address.map(|a| a.into()),
        }
    }
}

/// FFI-safe doctor profile edit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctorUpdate {
    pub name: Option<String>,
    pub profile_image: Option<String>,
    pub speciality: Option<String>,
    pub phone_number: Option<String>,
    pub experience: Option<u32>,
    pub about: Option<String>,
    pub education: Option<String>,
    pub address: Option<FfiAddressInput>,
}

impl From<FfiDoctorUpdate> for models::DoctorUpdate {
    fn from(update: FfiDoctorUpdate) -> Self {
        models::DoctorUpdate {
            name: update.name,
            profile_image: update.profile_image,
            speciality: update.speciality,
            phone_number: update.phone_number,
            experience: update.experience,
            about: update.about,
            education: update.education,
            address: update.address.map(|a| a.into()),
        }
    }
}

/// FFI-safe OPD.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOpd {
    pub id: String,
    pub name: String,
    pub days_of_operation: String,
    pub max_patient_capacity: u32,
    pub active_patient: u32,
    pub no_of_appointment: u32,
    pub last_updated: String,
}

impl From<Opd> for FfiOpd {
    fn from(opd: Opd) -> Self {
        Self {
            id: opd.id,
            name: opd.name,
            days_of_operation: opd.days_of_operation,
            max_patient_capacity: opd.max_patient_capacity,
            active_patient: opd.active_patient,
            no_of_appointment: opd.no_of_appointment,
            last_updated: opd.last_updated,
        }
    }
}

/// FFI-safe OPD edit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOpdUpdate {
    pub name: Option<String>,
    pub days_of_operation: Option<String>,
    pub max_patient_capacity: Option<u32>,
    pub active_patient: Option<u32>,
    pub no_of_appointment: Option<u32>,
}

impl From<FfiOpdUpdate> for models::OpdUpdate {
    fn from(update: FfiOpdUpdate) -> Self {
        models::OpdUpdate {
            name: update.name,
            days_of_operation: update.days_of_operation,
            max_patient_capacity: update.max_patient_capacity,
            active_patient: update.active_patient,
            no_of_appointment: update.no_of_appointment,
        }
    }
}

/// FFI-safe reconciliation result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCounterReport {
    pub opd_id: String,
    pub active_patient_before: u32,
    pub active_patient_after: u32,
    pub no_of_appointment_before: u32,
    pub no_of_appointment_after: u32,
    pub drifted: bool,
}

impl From<models::CounterReport> for FfiCounterReport {
    fn from(report: models::CounterReport) -> Self {
        let drifted = report.drifted();
        Self {
            opd_id: report.opd_id,
            active_patient_before: report.active_patient_before,
            active_patient_after: report.active_patient_after,
            no_of_appointment_before: report.no_of_appointment_before,
            no_of_appointment_after: report.no_of_appointment_after,
            drifted,
        }
    }
}

/// FFI-safe inventory item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInventoryItem {
    pub id: String,
    pub item_name: String,
    pub item_quantity: u32,
    pub item_price: f64,
    /// Quantity times unit price
    pub stock_value: f64,
    pub last_updated: String,
}

impl From<InventoryItem> for FfiInventoryItem {
    fn from(item: InventoryItem) -> Self {
        let stock_value = item.stock_value();
        Self {
            stock_value,
            id: item.id,
            item_name: item.item_name,
            item_quantity: item.item_quantity,
            item_price: item.item_price,
            last_updated: item.last_updated,
        }
    }
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub name: String,
    pub date_time: String,
    pub active: bool,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            name: appointment.name,
            date_time: appointment.date_time,
            active: appointment.active,
        }
    }
}

/// FFI-safe medical data.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalData {
    pub blood_group: String,
    pub height: f64,
    pub weight: f64,
    pub medical_history: String,
}

impl From<MedicalData> for FfiMedicalData {
    fn from(data: MedicalData) -> Self {
        Self {
            blood_group: data.blood_group.as_str().to_string(),
            height: data.height,
            weight: data.weight,
            medical_history: data.medical_history,
        }
    }
}

/// FFI-safe partial medical data.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalDataInput {
    pub blood_group: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub medical_history: Option<String>,
}

impl TryFrom<FfiMedicalDataInput> for models::MedicalDataInput {
    type Error = OpdFfiError;

    fn try_from(input: FfiMedicalDataInput) -> Result<Self, Self::Error> {
        Ok(models::MedicalDataInput {
            blood_group: input.blood_group.as_deref().map(parse_blood_group).transpose()?,
            height: input.height,
            weight: input.weight,
            medical_history: input.medical_history,
        })
    }
}

/// FFI-safe patient summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    /// YYYY-MM-DD
    pub date_of_birth: String,
    /// Whole years as of today (UTC)
    pub age: u32,
    pub gender: String,
    pub contact: String,
    pub email: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        let full_name = patient.full_name();
        let age = patient.age_on(chrono::Utc::now().date_naive());
        Self {
            full_name,
            age,
            id: patient.id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            date_of_birth: patient.date_of_birth.format(DATE_FORMAT).to_string(),
            gender: patient.gender.as_str().to_string(),
            contact: patient.contact,
            email: patient.email,
        }
    }
}

/// FFI-safe patient with nested records.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientRecord {
    pub patient: FfiPatient,
    pub address: Option<FfiAddress>,
    pub medical_data: Option<FfiMedicalData>,
}

impl From<models::PatientRecord> for FfiPatientRecord {
    fn from(record: models::PatientRecord) -> Self {
        Self {
            patient: record.patient.into(),
            address: record.address.map(|a| a.into()),
            medical_data: record.medical_data.map(|m| m.into()),
        }
    }
}

/// FFI-safe patient admission.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub first_name: String,
    pub last_name: String,
    /// YYYY-MM-DD
    pub date_of_birth: String,
    pub gender: String,
    pub contact: String,
    pub email: String,
    pub address: Option<FfiAddressInput>,
    pub medical_data: Option<FfiMedicalDataInput>,
}

impl TryFrom<FfiNewPatient> for models::NewPatient {
    type Error = OpdFfiError;

    fn try_from(patient: FfiNewPatient) -> Result<Self, Self::Error> {
        Ok(models::NewPatient {
            date_of_birth: parse_date(&patient.date_of_birth)?,
            gender: parse_gender(&patient.gender)?,
            medical_data: patient.medical_data.map(TryInto::try_into).transpose()?,
            first_name: patient.first_name,
            last_name: patient.last_name,
            contact: patient.contact,
            email: patient.email,
            address: patient.address.map(|a| a.into()),
        })
    }
}

/// FFI-safe patient edit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<FfiAddressInput>,
    pub medical_data: Option<FfiMedicalDataInput>,
}

impl TryFrom<FfiPatientUpdate> for models::PatientUpdate {
    type Error = OpdFfiError;

    fn try_from(update: FfiPatientUpdate) -> Result<Self, Self::Error> {
        Ok(models::PatientUpdate {
            date_of_birth: update.date_of_birth.as_deref().map(parse_date).transpose()?,
            gender: update.gender.as_deref().map(parse_gender).transpose()?,
            medical_data: update.medical_data.map(TryInto::try_into).transpose()?,
            first_name: update.first_name,
            last_name: update.last_name,
            contact: update.contact,
            email: update.email,
            address: update.address.map(|a| a.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core_with_doctor() -> (Arc<OpdCore>, String) {
        let clinic = Clinic::open_in_memory(Config {
            password_iterations: 1_000,
            ..Config::default()
        })
        .unwrap();
        let core = OpdCore::wrap(clinic);
        core.register(
            "asha".into(),
            "asha@example.com".into(),
            "pa55word".into(),
            "pa55word".into(),
        )
        .unwrap();
        let token = core.login("asha".into(), "pa55word".into()).unwrap();
        (core, token)
    }

    fn ffi_patient(dob: &str, gender: &str) -> FfiNewPatient {
        FfiNewPatient {
            first_name: "Meera".into(),
            last_name: "Iyer".into(),
            date_of_birth: dob.into(),
            gender: gender.into(),
            contact: "9876543210".into(),
            email: "meera@example.com".into(),
            address: None,
            medical_data: Some(FfiMedicalDataInput {
                blood_group: Some("O-".into()),
                height: Some(160.0),
                weight: Some(55.0),
                medical_history: None,
            }),
        }
    }

    #[test]
    fn test_ffi_patient_round_trip() {
        let (core, token) = core_with_doctor();
        let record = core
            .create_patient(token.clone(), ffi_patient("1988-04-12", "female"))
            .unwrap();
        assert_eq!(record.patient.date_of_birth, "1988-04-12");
        assert_eq!(record.patient.gender, "female");
        assert_eq!(record.medical_data.unwrap().blood_group, "O-");
        assert_eq!(record.patient.full_name, "Meera Iyer");
        assert!(record.patient.age >= 38);
        assert_eq!(core.get_opd(token).unwrap().active_patient, 1);
    }

    #[test]
    fn test_ffi_inventory_stock_value() {
        let (core, token) = core_with_doctor();
        let item = core
            .add_inventory_item(token.clone(), "Syringe".into(), 40, 2.5)
            .unwrap();
        assert_eq!(item.stock_value, 100.0);

        let listed = core.list_inventory_items(token).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].stock_value, 100.0);
    }

    #[test]
    fn test_ffi_core_hashes_with_clinic_config() {
        let (core, token) = core_with_doctor();
        let clinic = core.clinic.lock().unwrap();
        let session = clinic.authenticate(&token).unwrap();
        let rounds = session.principal.password_hash.split('$').nth(1).unwrap();
        assert_eq!(rounds, "1000");
    }

    #[test]
    fn test_ffi_rejects_unparsable_fields() {
        let (core, token) = core_with_doctor();
        assert!(matches!(
            core.create_patient(token.clone(), ffi_patient("12/04/1988", "female")),
            Err(OpdFfiError::InvalidInput(_))
        ));
        assert!(matches!(
            core.create_patient(token.clone(), ffi_patient("1988-04-12", "unknown")),
            Err(OpdFfiError::InvalidInput(_))
        ));
        assert_eq!(core.get_opd(token).unwrap().active_patient, 0);
    }

    #[test]
    fn test_ffi_error_mapping() {
        let (core, _) = core_with_doctor();
        assert!(matches!(
            core.get_opd("bogus".into()),
            Err(OpdFfiError::Unauthorized)
        ));
        assert!(matches!(
            core.login("asha".into(), "wrong".into()),
            Err(OpdFfiError::InvalidCredentials)
        ));
        assert!(matches!(
            core.register(
                "other".into(),
                "asha@example.com".into(),
                "pa55word".into(),
                "pa55word".into()
            ),
            Err(OpdFfiError::DuplicateResource(_))
        ));
    }

    #[test]
    fn test_ffi_profile_placeholder() {
        let (core, token) = core_with_doctor();
        let profile = core.get_doctor_profile(token).unwrap();
        assert_eq!(profile.name, db::NOT_SPECIFIED);
        assert_eq!(profile.address.unwrap().pincode, db::NOT_SPECIFIED);
    }
}
