//! Access layer: authenticated, ownership-scoped operations.
//!
//! Every mutating operation runs as one unit of work. The record write, its
//! validation and all lifecycle reactions it triggers commit together, or
//! nothing does.

use chrono::Utc;
use thiserror::Error;

use crate::auth;
use crate::config::Config;
use crate::db::{Database, DbError, DbResult, Store, DOCTOR_GROUP};
use crate::lifecycle::{EntityKind, Event, LifecycleError, Orchestrator, ReactionError};
use crate::models::{
    Address, AddressInput, Appointment, AppointmentUpdate, AuthToken, CounterReport, Doctor,
    DoctorProfile, DoctorUpdate, InventoryItem, InventoryItemUpdate, MedicalData,
    MedicalDataInput, NewPatient, Opd, OpdUpdate, Patient, PatientRecord, PatientUpdate,
    Principal,
};
use crate::validation::{self, ValidationError};

/// Errors reported to the caller of an access-layer operation.
#[derive(Error, Debug)]
pub enum OpdError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Duplicate resource: {0}")]
    DuplicateResource(String),

    #[error("Not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid credential")]
    InvalidCredentials,

    #[error("Authentication credentials were not provided or are invalid")]
    Unauthorized,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Transaction aborted: {0}")]
    TransactionAborted(#[from] LifecycleError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl OpdError {
    fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        OpdError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// True when a counter reaction could not find the OPD it maintains.
    pub fn is_orphan_reference(&self) -> bool {
        matches!(
            self,
            OpdError::TransactionAborted(LifecycleError {
                source: ReactionError::OrphanReference { .. },
                ..
            })
        )
    }
}

pub type OpdResult<T> = Result<T, OpdError>;

/// Registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Confirmation, must equal `password`
    pub password2: String,
}

/// Authenticated caller.
#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
    pub doctor: Doctor,
}

/// The clinic service: store, orchestrator and configuration.
pub struct Clinic {
    db: Database,
    orchestrator: Orchestrator,
    config: Config,
}

impl Clinic {
    pub fn new(db: Database, orchestrator: Orchestrator, config: Config) -> Self {
        Self {
            db,
            orchestrator,
            config,
        }
    }

    /// Open the configured database with the standard reactions.
    pub fn open(config: Config) -> OpdResult<Self> {
        let db = Database::open_with_config(&config)?;
        Ok(Self::new(db, Orchestrator::with_default_reactions(), config))
    }

    /// In-memory clinic with the standard reactions (for testing).
    pub fn open_in_memory(config: Config) -> OpdResult<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::new(db, Orchestrator::with_default_reactions(), config))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Register a principal and run the doctor cascade.
    pub fn register(&mut self, form: Registration) -> OpdResult<Principal> {
        validation::validate_password_confirmation(&form.password, &form.password2)?;
        validation::validate_registration(&form.username, &form.email, &form.password)?;

        let password_hash = auth::hash_password(&form.password, self.config.password_iterations);
        let principal = Principal::new(form.username, form.email, password_hash);

        let orchestrator = &self.orchestrator;
        self.db.unit_of_work::<_, OpdError, _>(|store| {
            if store.email_exists(&principal.email)? {
                return Err(OpdError::DuplicateResource("email already exist".into()));
            }
            if store.username_exists(&principal.username)? {
                return Err(OpdError::DuplicateResource("username already exist".into()));
            }
            store.insert_principal(&principal).map_err(|e| match e {
                DbError::Constraint(msg) => OpdError::DuplicateResource(msg),
                other => other.into(),
            })?;
            orchestrator.dispatch(store, Event::created(EntityKind::Principal, principal.id.clone()))?;
            Ok(())
        })?;

        tracing::info!(principal = %principal.id, username = %principal.username, "principal registered");
        Ok(principal)
    }

    /// Exchange credentials for the principal's token, issuing one if needed.
    pub fn login(&mut self, username: &str, password: &str) -> OpdResult<String> {
        let principal = self
            .db
            .store()
            .get_principal_by_username(username)?
            .filter(|p| auth::verify_password(password, &p.password_hash))
            .ok_or(OpdError::InvalidCredentials)?;

        self.db.unit_of_work(|store| {
            if let Some(token) = store.get_token_for_principal(&principal.id)? {
                return Ok(token.key);
            }
            let token = AuthToken::new(auth::generate_token_key(), principal.id.clone());
            store.insert_token(&token)?;
            Ok(token.key)
        })
    }

    /// Revoke a token.
    pub fn logout(&mut self, token: &str) -> OpdResult<()> {
        if !self.db.store().delete_token(token)? {
            return Err(OpdError::Unauthorized);
        }
        Ok(())
    }

    /// Resolve a token to a doctor session.
    pub fn authenticate(&self, token: &str) -> OpdResult<Session> {
        let store = self.db.store();
        let principal = store
            .get_principal_by_token(token)?
            .ok_or(OpdError::Unauthorized)?;
        if !store.principal_in_group(&principal.id, DOCTOR_GROUP)? {
            return Err(OpdError::PermissionDenied(format!(
                "{} is not in the {} group",
                principal.username, DOCTOR_GROUP
            )));
        }
        let doctor = store
            .get_doctor_by_principal(&principal.id)?
            .ok_or_else(|| OpdError::not_found("doctor", &principal.id))?;
        Ok(Session { principal, doctor })
    }

    /// Delete the caller's account along with its doctor and everything it owns.
    pub fn delete_account(&mut self, token: &str) -> OpdResult<()> {
        let session = self.authenticate(token)?;
        let principal_id = session.principal.id;

        let orchestrator = &self.orchestrator;
        self.db.unit_of_work::<_, OpdError, _>(|store| {
            orchestrator.dispatch(store, Event::pre_delete(EntityKind::Principal, principal_id.clone()))?;
            if !store.delete_principal(&principal_id)? {
                return Err(OpdError::not_found("principal", principal_id.clone()));
            }
            orchestrator.dispatch(store, Event::deleted(EntityKind::Principal, principal_id.clone()))?;
            Ok(())
        })?;

        tracing::info!(principal = %principal_id, "account deleted");
        Ok(())
    }

    // =========================================================================
    // Doctor profile
    // =========================================================================

    pub fn get_doctor_profile(&self, token: &str) -> OpdResult<DoctorProfile> {
        let session = self.authenticate(token)?;
        Ok(doctor_profile(&self.db.store(), session.doctor)?)
    }

    /// Edit the caller's profile and, when supplied, its address.
    pub fn update_doctor_profile(
        &mut self,
        token: &str,
        update: DoctorUpdate,
    ) -> OpdResult<DoctorProfile> {
        let doctor_id = self.authenticate(token)?.doctor.id;

        self.db.unit_of_work::<_, OpdError, _>(|store| {
            let mut doctor = store
                .get_doctor(&doctor_id)?
                .ok_or_else(|| OpdError::not_found("doctor", &doctor_id))?;
            update.apply_to(&mut doctor);
            if let Some(input) = &update.address {
                doctor.address_id = Some(upsert_address(store, doctor.address_id.as_deref(), input)?);
            }
            store.update_doctor(&doctor)?;
            Ok(doctor_profile(store, doctor)?)
        })
    }

    // =========================================================================
    // OPD
    // =========================================================================

    pub fn get_opd(&self, token: &str) -> OpdResult<Opd> {
        let session = self.authenticate(token)?;
        self.db
            .store()
            .get_opd_for_doctor(&session.doctor.id)?
            .ok_or_else(|| OpdError::not_found("opd", &session.doctor.id))
    }

    /// Edit the caller's OPD.
    ///
    /// The capacity rule applies only when the update carries both
    /// `active_patient` and `max_patient_capacity`.
    pub fn update_opd(&mut self, token: &str, update: OpdUpdate) -> OpdResult<Opd> {
        validation::validate_opd_update(&update)?;
        let doctor_id = self.authenticate(token)?.doctor.id;

        self.db.unit_of_work(|store| {
            let mut opd = store
                .get_opd_for_doctor(&doctor_id)?
                .ok_or_else(|| OpdError::not_found("opd", &doctor_id))?;
            update.apply_to(&mut opd);
            store.update_opd(&opd)?;
            store
                .get_opd(&opd.id)?
                .ok_or_else(|| OpdError::not_found("opd", &opd.id))
        })
    }

    /// Recompute the caller's OPD counters from live records.
    pub fn reconcile_counters(&mut self, token: &str) -> OpdResult<CounterReport> {
        let doctor_id = self.authenticate(token)?.doctor.id;

        let report = self.db.unit_of_work::<_, OpdError, _>(|store| {
            let opd = store
                .get_opd_for_doctor(&doctor_id)?
                .ok_or_else(|| OpdError::not_found("opd", &doctor_id))?;
            store
                .reconcile_opd_counters(&opd.id)?
                .ok_or_else(|| OpdError::not_found("opd", &opd.id))
        })?;

        if report.drifted() {
            tracing::warn!(
                opd = %report.opd_id,
                active_patient_before = report.active_patient_before,
                active_patient_after = report.active_patient_after,
                no_of_appointment_before = report.no_of_appointment_before,
                no_of_appointment_after = report.no_of_appointment_after,
                "OPD counters had drifted and were reconciled"
            );
        }
        Ok(report)
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    pub fn list_inventory_items(&self, token: &str) -> OpdResult<Vec<InventoryItem>> {
        let doctor_id = self.authenticate(token)?.doctor.id;
        let store = self.db.store();
        let inventory = store
            .get_inventory_for_doctor(&doctor_id)?
            .ok_or_else(|| OpdError::not_found("inventory", &doctor_id))?;
        Ok(store.list_inventory_items(&inventory.id)?)
    }

    pub fn add_inventory_item(
        &mut self,
        token: &str,
        item_name: String,
        item_quantity: u32,
        item_price: f64,
    ) -> OpdResult<InventoryItem> {
        let doctor_id = self.authenticate(token)?.doctor.id;

        self.db.unit_of_work(|store| {
            let inventory = store
                .get_inventory_for_doctor(&doctor_id)?
                .ok_or_else(|| OpdError::not_found("inventory", &doctor_id))?;
            let item = InventoryItem::new(inventory.id, item_name, item_quantity, item_price);
            validation::validate_inventory_item(&item)?;
            store.insert_inventory_item(&item)?;
            Ok(item)
        })
    }

    pub fn update_inventory_item(
        &mut self,
        token: &str,
        item_id: &str,
        update: InventoryItemUpdate,
    ) -> OpdResult<InventoryItem> {
        let doctor_id = self.authenticate(token)?.doctor.id;

        self.db.unit_of_work(|store| {
            let mut item = owned_inventory_item(store, &doctor_id, item_id)?;
            update.apply_to(&mut item);
            validation::validate_inventory_item(&item)?;
            store.update_inventory_item(&item)?;
            store
                .get_inventory_item(item_id)?
                .ok_or_else(|| OpdError::not_found("inventory item", item_id))
        })
    }

    pub fn delete_inventory_item(&mut self, token: &str, item_id: &str) -> OpdResult<()> {
        let doctor_id = self.authenticate(token)?.doctor.id;

        self.db.unit_of_work(|store| {
            owned_inventory_item(store, &doctor_id, item_id)?;
            store.delete_inventory_item(item_id)?;
            Ok(())
        })
    }

    // =========================================================================
    // Appointments
    // =========================================================================

    pub fn list_appointments(&self, token: &str) -> OpdResult<Vec<Appointment>> {
        let doctor_id = self.authenticate(token)?.doctor.id;
        Ok(self.db.store().list_appointments_for_doctor(&doctor_id)?)
    }

    /// Book an appointment and count it on the OPD.
    pub fn create_appointment(&mut self, token: &str, name: String) -> OpdResult<Appointment> {
        let doctor_id = self.authenticate(token)?.doctor.id;
        let appointment = Appointment::new(doctor_id.clone(), name);

        let orchestrator = &self.orchestrator;
        self.db.unit_of_work::<_, OpdError, _>(|store| {
            store.insert_appointment(&appointment)?;
            orchestrator.dispatch(
                store,
                Event::created(EntityKind::Appointment, appointment.id.clone()).owned_by(doctor_id),
            )?;
            Ok(())
        })?;
        Ok(appointment)
    }

    pub fn update_appointment(
        &mut self,
        token: &str,
        appointment_id: &str,
        update: AppointmentUpdate,
    ) -> OpdResult<Appointment> {
        let doctor_id = self.authenticate(token)?.doctor.id;

        self.db.unit_of_work(|store| {
            let mut appointment = owned_appointment(store, &doctor_id, appointment_id)?;
            update.apply_to(&mut appointment);
            store.update_appointment(&appointment)?;
            store
                .get_appointment(appointment_id)?
                .ok_or_else(|| OpdError::not_found("appointment", appointment_id))
        })
    }

    /// Cancel an appointment and uncount it.
    pub fn delete_appointment(&mut self, token: &str, appointment_id: &str) -> OpdResult<()> {
        let doctor_id = self.authenticate(token)?.doctor.id;

        let orchestrator = &self.orchestrator;
        self.db.unit_of_work(|store| {
            owned_appointment(store, &doctor_id, appointment_id)?;
            store.delete_appointment(appointment_id)?;
            orchestrator.dispatch(
                store,
                Event::deleted(EntityKind::Appointment, appointment_id).owned_by(doctor_id.clone()),
            )?;
            Ok(())
        })
    }

    // =========================================================================
    // Patients
    // =========================================================================

    pub fn list_patients(&self, token: &str) -> OpdResult<Vec<Patient>> {
        let doctor_id = self.authenticate(token)?.doctor.id;
        Ok(self.db.store().list_patients_for_doctor(&doctor_id)?)
    }

    pub fn get_patient(&self, token: &str, patient_id: &str) -> OpdResult<PatientRecord> {
        let doctor_id = self.authenticate(token)?.doctor.id;
        let store = self.db.store();
        let patient = owned_patient(&store, &doctor_id, patient_id)?;
        Ok(patient_record(&store, patient)?)
    }

    /// Admit a patient with optional address and medical data, and count it.
    pub fn create_patient(&mut self, token: &str, new_patient: NewPatient) -> OpdResult<PatientRecord> {
        let doctor_id = self.authenticate(token)?.doctor.id;
        validation::validate_date_of_birth(new_patient.date_of_birth, Utc::now().date_naive())?;

        let orchestrator = &self.orchestrator;
        self.db.unit_of_work(|store| {
            let mut patient = new_patient.to_patient(doctor_id.clone());
            if let Some(input) = &new_patient.address {
                patient.address_id = Some(upsert_address(store, None, input)?);
            }
            if let Some(input) = &new_patient.medical_data {
                patient.medical_data_id = Some(upsert_medical_data(store, None, input)?);
            }
            store.insert_patient(&patient)?;
            orchestrator.dispatch(
                store,
                Event::created(EntityKind::Patient, patient.id.clone()).owned_by(doctor_id.clone()),
            )?;
            Ok(patient_record(store, patient)?)
        })
    }

    /// Edit a patient. Nested address and medical data are merged partially.
    pub fn update_patient(
        &mut self,
        token: &str,
        patient_id: &str,
        update: PatientUpdate,
    ) -> OpdResult<PatientRecord> {
        let doctor_id = self.authenticate(token)?.doctor.id;
        if let Some(date_of_birth) = update.date_of_birth {
            validation::validate_date_of_birth(date_of_birth, Utc::now().date_naive())?;
        }

        self.db.unit_of_work(|store| {
            let mut patient = owned_patient(store, &doctor_id, patient_id)?;
            update.apply_to(&mut patient);
            if let Some(input) = &update.address {
                patient.address_id = Some(upsert_address(store, patient.address_id.as_deref(), input)?);
            }
            if let Some(input) = &update.medical_data {
                patient.medical_data_id = Some(upsert_medical_data(
                    store,
                    patient.medical_data_id.as_deref(),
                    input,
                )?);
            }
            store.update_patient(&patient)?;
            let patient = store
                .get_patient(patient_id)?
                .ok_or_else(|| OpdError::not_found("patient", patient_id))?;
            Ok(patient_record(store, patient)?)
        })
    }

    /// Discharge a patient and uncount it.
    pub fn delete_patient(&mut self, token: &str, patient_id: &str) -> OpdResult<()> {
        let doctor_id = self.authenticate(token)?.doctor.id;

        let orchestrator = &self.orchestrator;
        self.db.unit_of_work(|store| {
            owned_patient(store, &doctor_id, patient_id)?;
            store.delete_patient(patient_id)?;
            orchestrator.dispatch(
                store,
                Event::deleted(EntityKind::Patient, patient_id).owned_by(doctor_id.clone()),
            )?;
            Ok(())
        })
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn doctor_profile(store: &Store<'_>, doctor: Doctor) -> DbResult<DoctorProfile> {
    let address = match &doctor.address_id {
        Some(id) => store.get_address(id)?,
        None => None,
    };
    Ok(DoctorProfile { doctor, address })
}

fn patient_record(store: &Store<'_>, patient: Patient) -> DbResult<PatientRecord> {
    let address = match &patient.address_id {
        Some(id) => store.get_address(id)?,
        None => None,
    };
    let medical_data = match &patient.medical_data_id {
        Some(id) => store.get_medical_data(id)?,
        None => None,
    };
    Ok(PatientRecord {
        patient,
        address,
        medical_data,
    })
}

/// Merge `input` into the existing address, or create one. Returns its ID.
fn upsert_address(store: &Store<'_>, existing: Option<&str>, input: &AddressInput) -> OpdResult<String> {
    let current = match existing {
        Some(id) => store.get_address(id)?,
        None => None,
    };

    match current {
        Some(mut address) => {
            input.apply_to(&mut address);
            validation::validate_address(&address)?;
            store.update_address(&address)?;
            Ok(address.id)
        }
        None => {
            let address: Address = input.to_address();
            validation::validate_address(&address)?;
            store.insert_address(&address)?;
            Ok(address.id)
        }
    }
}

/// Merge `input` into existing medical data, or create it. Returns its ID.
fn upsert_medical_data(
    store: &Store<'_>,
    existing: Option<&str>,
    input: &MedicalDataInput,
) -> OpdResult<String> {
    let current = match existing {
        Some(id) => store.get_medical_data(id)?,
        None => None,
    };

    let (data, is_new): (MedicalData, bool) = match current {
        Some(mut data) => {
            input.apply_to(&mut data);
            (data, false)
        }
        None => {
            let data = input.to_medical_data().ok_or(ValidationError::InvalidValue {
                field: "blood_group",
                reason: "blood group is required".into(),
            })?;
            (data, true)
        }
    };

    validation::validate_measurement("height", data.height)?;
    validation::validate_measurement("weight", data.weight)?;
    if is_new {
        store.insert_medical_data(&data)?;
    } else {
        store.update_medical_data(&data)?;
    }
    Ok(data.id)
}

fn owned_inventory_item(store: &Store<'_>, doctor_id: &str, item_id: &str) -> OpdResult<InventoryItem> {
    let inventory = store
        .get_inventory_for_doctor(doctor_id)?
        .ok_or_else(|| OpdError::not_found("inventory", doctor_id))?;
    store
        .get_inventory_item(item_id)?
        .filter(|item| item.inventory_id == inventory.id)
        .ok_or_else(|| OpdError::not_found("inventory item", item_id))
}

fn owned_appointment(store: &Store<'_>, doctor_id: &str, appointment_id: &str) -> OpdResult<Appointment> {
    store
        .get_appointment(appointment_id)?
        .filter(|a| a.doctor_id == doctor_id)
        .ok_or_else(|| OpdError::not_found("appointment", appointment_id))
}

fn owned_patient(store: &Store<'_>, doctor_id: &str, patient_id: &str) -> OpdResult<Patient> {
    store
        .get_patient(patient_id)?
        .filter(|p| p.doctor_id == doctor_id)
        .ok_or_else(|| OpdError::not_found("patient", patient_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BloodGroup, Gender};
    use chrono::{Days, NaiveDate};

    fn test_config() -> Config {
        Config {
            password_iterations: 1_000,
            ..Config::default()
        }
    }

    fn registration(name: &str) -> Registration {
        Registration {
            username: name.into(),
            email: format!("{}@example.com", name),
            password: "pa55word".into(),
            password2: "pa55word".into(),
        }
    }

    fn clinic_with_doctor(name: &str) -> (Clinic, String) {
        let mut clinic = Clinic::open_in_memory(test_config()).unwrap();
        clinic.register(registration(name)).unwrap();
        let token = clinic.login(name, "pa55word").unwrap();
        (clinic, token)
    }

    fn new_patient(dob: NaiveDate) -> NewPatient {
        NewPatient {
            first_name: "Meera".into(),
            last_name: "Iyer".into(),
            date_of_birth: dob,
            gender: Gender::Female,
            contact: "9876543210".into(),
            email: "meera@example.com".into(),
            address: None,
            medical_data: None,
        }
    }

    #[test]
    fn test_login_returns_registration_token() {
        let (clinic, token) = clinic_with_doctor("asha");
        let session = clinic.authenticate(&token).unwrap();
        let issued = clinic
            .database()
            .store()
            .get_token_for_principal(&session.principal.id)
            .unwrap()
            .unwrap();
        assert_eq!(issued.key, token);
    }

    #[test]
    fn test_login_bad_password() {
        let (mut clinic, _) = clinic_with_doctor("asha");
        assert!(matches!(
            clinic.login("asha", "nope"),
            Err(OpdError::InvalidCredentials)
        ));
        assert!(matches!(
            clinic.login("nobody", "pa55word"),
            Err(OpdError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_logout_then_login_issues_new_token() {
        let (mut clinic, token) = clinic_with_doctor("asha");
        clinic.logout(&token).unwrap();
        assert!(matches!(clinic.authenticate(&token), Err(OpdError::Unauthorized)));
        assert!(matches!(clinic.logout(&token), Err(OpdError::Unauthorized)));

        let fresh = clinic.login("asha", "pa55word").unwrap();
        assert_ne!(fresh, token);
        assert!(clinic.authenticate(&fresh).is_ok());
    }

    #[test]
    fn test_principal_outside_doctor_group_denied() {
        let (clinic, token) = clinic_with_doctor("asha");
        let session = clinic.authenticate(&token).unwrap();
        clinic
            .database()
            .conn()
            .execute(
                "DELETE FROM principal_groups WHERE principal_id = ?",
                [&session.principal.id],
            )
            .unwrap();

        assert!(matches!(
            clinic.authenticate(&token),
            Err(OpdError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_password_mismatch_rejected() {
        let mut clinic = Clinic::open_in_memory(test_config()).unwrap();
        let mut form = registration("asha");
        form.password2 = "different".into();
        assert!(matches!(
            clinic.register(form),
            Err(OpdError::Validation(ValidationError::ValidationMismatch(_)))
        ));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (mut clinic, _) = clinic_with_doctor("asha");
        let mut form = registration("asha");
        form.email = "other@example.com".into();
        assert!(matches!(
            clinic.register(form),
            Err(OpdError::DuplicateResource(_))
        ));
    }

    #[test]
    fn test_update_doctor_profile_with_address() {
        let (mut clinic, token) = clinic_with_doctor("asha");

        let update = DoctorUpdate {
            name: Some("Asha Rao".into()),
            speciality: Some("Paediatrics".into()),
            experience: Some(9),
            address: Some(AddressInput {
                house_number: Some("12B".into()),
                street_name: Some("MG Road".into()),
                city: Some("Bengaluru".into()),
                state: Some("Karnataka".into()),
                pincode: Some("560001".into()),
            }),
            ..Default::default()
        };
        let profile = clinic.update_doctor_profile(&token, update).unwrap();
        assert_eq!(profile.doctor.name, "Asha Rao");
        assert_eq!(profile.doctor.experience, 9);
        let address = profile.address.unwrap();
        assert_eq!(address.city, "Bengaluru");

        // The placeholder address is edited in place, not replaced
        let before = clinic.get_doctor_profile(&token).unwrap();
        assert_eq!(before.address.unwrap().id, address.id);
    }

    #[test]
    fn test_bad_address_rolls_back_profile_edit() {
        let (mut clinic, token) = clinic_with_doctor("asha");

        let update = DoctorUpdate {
            name: Some("Asha Rao".into()),
            address: Some(AddressInput {
                pincode: Some("12".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            clinic.update_doctor_profile(&token, update),
            Err(OpdError::Validation(_))
        ));

        let profile = clinic.get_doctor_profile(&token).unwrap();
        assert_eq!(profile.doctor.name, crate::db::NOT_SPECIFIED);
    }

    #[test]
    fn test_update_opd_capacity_rule() {
        let (mut clinic, token) = clinic_with_doctor("asha");

        let over = OpdUpdate {
            active_patient: Some(5),
            max_patient_capacity: Some(3),
            ..Default::default()
        };
        assert!(matches!(
            clinic.update_opd(&token, over),
            Err(OpdError::Validation(ValidationError::CapacityExceeded { .. }))
        ));

        let ok = OpdUpdate {
            name: Some("Morning OPD".into()),
            active_patient: Some(3),
            max_patient_capacity: Some(5),
            ..Default::default()
        };
        let opd = clinic.update_opd(&token, ok).unwrap();
        assert_eq!(opd.name, "Morning OPD");
        assert_eq!(opd.max_patient_capacity, 5);
        assert_eq!(opd.active_patient, 3);
    }

    #[test]
    fn test_reconcile_after_manual_counter_edit() {
        let (mut clinic, token) = clinic_with_doctor("asha");
        clinic
            .update_opd(
                &token,
                OpdUpdate {
                    no_of_appointment: Some(7),
                    ..Default::default()
                },
            )
            .unwrap();
        clinic.create_appointment(&token, "Ravi".into()).unwrap();

        let report = clinic.reconcile_counters(&token).unwrap();
        assert!(report.drifted());
        assert_eq!(report.no_of_appointment_before, 8);
        assert_eq!(report.no_of_appointment_after, 1);
    }

    #[test]
    fn test_inventory_item_lifecycle() {
        let (mut clinic, token) = clinic_with_doctor("asha");

        assert!(matches!(
            clinic.add_inventory_item(&token, "Gauze".into(), 10, -1.0),
            Err(OpdError::Validation(ValidationError::InvalidValue { field: "item_price", .. }))
        ));

        let item = clinic
            .add_inventory_item(&token, "Gauze".into(), 10, 0.0)
            .unwrap();
        let updated = clinic
            .update_inventory_item(
                &token,
                &item.id,
                InventoryItemUpdate {
                    item_quantity: Some(25),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.item_quantity, 25);

        assert!(clinic
            .update_inventory_item(
                &token,
                &item.id,
                InventoryItemUpdate {
                    item_price: Some(-5.0),
                    ..Default::default()
                },
            )
            .is_err());

        clinic.delete_inventory_item(&token, &item.id).unwrap();
        assert!(clinic.list_inventory_items(&token).unwrap().is_empty());
    }

    #[test]
    fn test_records_scoped_to_owner() {
        let mut clinic = Clinic::open_in_memory(test_config()).unwrap();
        clinic.register(registration("asha")).unwrap();
        clinic.register(registration("ravi")).unwrap();
        let asha = clinic.login("asha", "pa55word").unwrap();
        let ravi = clinic.login("ravi", "pa55word").unwrap();

        let appointment = clinic.create_appointment(&asha, "Meera".into()).unwrap();
        let item = clinic
            .add_inventory_item(&asha, "Gloves".into(), 100, 4.0)
            .unwrap();
        let today = Utc::now().date_naive();
        let record = clinic.create_patient(&asha, new_patient(today)).unwrap();

        assert!(matches!(
            clinic.delete_appointment(&ravi, &appointment.id),
            Err(OpdError::NotFound { .. })
        ));
        assert!(matches!(
            clinic.delete_inventory_item(&ravi, &item.id),
            Err(OpdError::NotFound { .. })
        ));
        assert!(matches!(
            clinic.get_patient(&ravi, &record.patient.id),
            Err(OpdError::NotFound { .. })
        ));
        assert!(clinic.list_appointments(&ravi).unwrap().is_empty());
        assert_eq!(clinic.get_opd(&asha).unwrap().no_of_appointment, 1);
    }

    #[test]
    fn test_appointment_update_keeps_booking_time() {
        let (mut clinic, token) = clinic_with_doctor("asha");
        let appointment = clinic.create_appointment(&token, "Meera".into()).unwrap();

        let updated = clinic
            .update_appointment(
                &token,
                &appointment.id,
                AppointmentUpdate {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!updated.active);
        assert_eq!(updated.date_time, appointment.date_time);
        assert_eq!(clinic.get_opd(&token).unwrap().no_of_appointment, 1);
    }

    #[test]
    fn test_create_appointment_counts_on_opd() {
        let (mut clinic, token) = clinic_with_doctor("asha");
        let first = clinic.create_appointment(&token, "Meera".into()).unwrap();
        clinic.create_appointment(&token, "Ravi".into()).unwrap();

        assert!(first.active);
        assert_eq!(first.doctor_id, clinic.authenticate(&token).unwrap().doctor.id);
        assert_eq!(clinic.get_opd(&token).unwrap().no_of_appointment, 2);

        let err = clinic.create_appointment("stale-token", "Ravi".into());
        assert!(matches!(err, Err(OpdError::Unauthorized)));
        assert_eq!(clinic.get_opd(&token).unwrap().no_of_appointment, 2);
    }

    #[test]
    fn test_patient_nested_records() {
        let (mut clinic, token) = clinic_with_doctor("asha");
        let mut input = new_patient(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        input.medical_data = Some(MedicalDataInput {
            blood_group: Some(BloodGroup::BPositive),
            height: Some(165.0),
            ..Default::default()
        });

        let record = clinic.create_patient(&token, input).unwrap();
        assert!(record.address.is_none());
        assert_eq!(record.medical_data.as_ref().unwrap().height, 165.0);

        let update = PatientUpdate {
            contact: Some("9000000000".into()),
            address: Some(AddressInput {
                street_name: Some("Park Street".into()),
                city: Some("Kolkata".into()),
                state: Some("West Bengal".into()),
                pincode: Some("700016".into()),
                ..Default::default()
            }),
            medical_data: Some(MedicalDataInput {
                weight: Some(61.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let record = clinic
            .update_patient(&token, &record.patient.id, update)
            .unwrap();
        assert_eq!(record.patient.contact, "9000000000");
        assert_eq!(record.address.unwrap().city, "Kolkata");
        let medical = record.medical_data.unwrap();
        assert_eq!(medical.blood_group, BloodGroup::BPositive);
        assert_eq!(medical.height, 165.0);
        assert_eq!(medical.weight, 61.0);
    }

    #[test]
    fn test_medical_data_requires_blood_group_on_create() {
        let (mut clinic, token) = clinic_with_doctor("asha");
        let mut input = new_patient(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        input.medical_data = Some(MedicalDataInput {
            height: Some(150.0),
            ..Default::default()
        });

        assert!(matches!(
            clinic.create_patient(&token, input),
            Err(OpdError::Validation(ValidationError::InvalidValue { field: "blood_group", .. }))
        ));
        assert_eq!(clinic.get_opd(&token).unwrap().active_patient, 0);
        assert!(clinic.list_patients(&token).unwrap().is_empty());
    }

    #[test]
    fn test_update_patient_future_birth_date() {
        let (mut clinic, token) = clinic_with_doctor("asha");
        let today = Utc::now().date_naive();
        let record = clinic.create_patient(&token, new_patient(today)).unwrap();

        let update = PatientUpdate {
            date_of_birth: today.checked_add_days(Days::new(1)),
            ..Default::default()
        };
        assert!(clinic
            .update_patient(&token, &record.patient.id, update)
            .is_err());
    }
}
