//! Clinic lifecycle integration tests.

use chrono::{Days, NaiveDate, Utc};
use opd_core::db::NOT_SPECIFIED;
use opd_core::lifecycle::{EntityKind, Orchestrator, Phase, Reaction, ReactionError, ReactionResult};
use opd_core::models::{Gender, NewPatient, OpdUpdate};
use opd_core::service::{Clinic, OpdError, Registration};
use opd_core::{Config, Database, Event, ValidationError};

const PASSWORD: &str = "s3cret-pass";

fn test_config() -> Config {
    Config {
        password_iterations: 1_000,
        ..Config::default()
    }
}

fn registration(username: &str, email: &str) -> Registration {
    Registration {
        username: username.to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
        password2: PASSWORD.to_string(),
    }
}

fn clinic() -> Clinic {
    Clinic::open_in_memory(test_config()).unwrap()
}

fn signed_in(clinic: &mut Clinic, username: &str) -> String {
    clinic
        .register(registration(username, &format!("{}@clinic.test", username)))
        .unwrap();
    clinic.login(username, PASSWORD).unwrap()
}

fn patient_born(date_of_birth: NaiveDate) -> NewPatient {
    NewPatient {
        first_name: "Kavya".to_string(),
        last_name: "Nair".to_string(),
        date_of_birth,
        gender: Gender::Female,
        contact: "9123456780".to_string(),
        email: "kavya@example.com".to_string(),
        address: None,
        medical_data: None,
    }
}

fn count(clinic: &Clinic, table: &str) -> i64 {
    clinic
        .database()
        .conn()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_registration_cascade_creates_linked_records() {
    let mut clinic = clinic();
    let principal = clinic
        .register(registration("asha", "asha@clinic.test"))
        .unwrap();

    assert_eq!(count(&clinic, "doctors"), 1);
    assert_eq!(count(&clinic, "opds"), 1);
    assert_eq!(count(&clinic, "inventories"), 1);
    assert_eq!(count(&clinic, "addresses"), 1);
    assert_eq!(count(&clinic, "auth_tokens"), 1);

    let store = clinic.database().store();
    let doctor = store.get_doctor_by_principal(&principal.id).unwrap().unwrap();
    let address = store
        .get_address(doctor.address_id.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(address.city, NOT_SPECIFIED);
    assert_eq!(doctor.name, NOT_SPECIFIED);

    let opd = store.get_opd_for_doctor(&doctor.id).unwrap().unwrap();
    assert_eq!(opd.active_patient, 0);
    assert_eq!(opd.no_of_appointment, 0);

    let inventory = store.get_inventory_for_doctor(&doctor.id).unwrap().unwrap();
    assert_eq!(inventory.doctor_id, doctor.id);
}

#[test]
fn test_duplicate_email_rejected() {
    let mut clinic = clinic();
    clinic
        .register(registration("asha", "shared@clinic.test"))
        .unwrap();

    let err = clinic
        .register(registration("ravi", "SHARED@clinic.test"))
        .unwrap_err();
    assert!(matches!(err, OpdError::DuplicateResource(_)));

    // The rejected registration left nothing behind
    assert_eq!(count(&clinic, "principals"), 1);
    assert_eq!(count(&clinic, "doctors"), 1);
}

#[test]
fn test_birth_date_today_allowed_tomorrow_rejected() {
    let mut clinic = clinic();
    let token = signed_in(&mut clinic, "asha");
    let today = Utc::now().date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap();

    let err = clinic
        .create_patient(&token, patient_born(tomorrow))
        .unwrap_err();
    assert!(matches!(
        err,
        OpdError::Validation(ValidationError::InvalidValue { field: "date_of_birth", .. })
    ));
    assert_eq!(clinic.get_opd(&token).unwrap().active_patient, 0);

    clinic.create_patient(&token, patient_born(today)).unwrap();
    assert_eq!(clinic.get_opd(&token).unwrap().active_patient, 1);
}

#[test]
fn test_item_price_negative_rejected_zero_allowed() {
    let mut clinic = clinic();
    let token = signed_in(&mut clinic, "asha");

    let err = clinic
        .add_inventory_item(&token, "Paracetamol".to_string(), 20, -1.0)
        .unwrap_err();
    assert!(matches!(err, OpdError::Validation(_)));

    let item = clinic
        .add_inventory_item(&token, "Paracetamol".to_string(), 20, 0.0)
        .unwrap();
    assert_eq!(item.item_price, 0.0);
    assert_eq!(clinic.list_inventory_items(&token).unwrap().len(), 1);
}

#[test]
fn test_opd_capacity_checked_when_both_supplied() {
    let mut clinic = clinic();
    let token = signed_in(&mut clinic, "asha");

    let err = clinic
        .update_opd(
            &token,
            OpdUpdate {
                active_patient: Some(5),
                max_patient_capacity: Some(3),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        OpdError::Validation(ValidationError::CapacityExceeded {
            active: 5,
            capacity: 3
        })
    ));

    let opd = clinic
        .update_opd(
            &token,
            OpdUpdate {
                active_patient: Some(3),
                max_patient_capacity: Some(5),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(opd.active_patient, 3);
    assert_eq!(opd.max_patient_capacity, 5);
}

#[test]
fn test_counter_may_exceed_capacity() {
    let mut clinic = clinic();
    let token = signed_in(&mut clinic, "asha");
    clinic
        .update_opd(
            &token,
            OpdUpdate {
                max_patient_capacity: Some(1),
                ..Default::default()
            },
        )
        .unwrap();

    let today = Utc::now().date_naive();
    clinic.create_patient(&token, patient_born(today)).unwrap();
    clinic.create_patient(&token, patient_born(today)).unwrap();

    let opd = clinic.get_opd(&token).unwrap();
    assert_eq!(opd.active_patient, 2);
    assert!(opd.is_over_capacity());
}

#[test]
fn test_account_deletion_cascades() {
    let mut clinic = clinic();
    let token = signed_in(&mut clinic, "asha");
    let keep = signed_in(&mut clinic, "ravi");

    let today = Utc::now().date_naive();
    clinic.create_appointment(&token, "Follow-up".to_string()).unwrap();
    clinic.create_patient(&token, patient_born(today)).unwrap();
    clinic
        .add_inventory_item(&token, "Bandage".to_string(), 5, 12.5)
        .unwrap();
    clinic.create_appointment(&keep, "Checkup".to_string()).unwrap();

    clinic.delete_account(&token).unwrap();

    assert!(matches!(
        clinic.authenticate(&token),
        Err(OpdError::Unauthorized)
    ));
    assert_eq!(count(&clinic, "principals"), 1);
    assert_eq!(count(&clinic, "doctors"), 1);
    assert_eq!(count(&clinic, "addresses"), 1);
    assert_eq!(count(&clinic, "opds"), 1);
    assert_eq!(count(&clinic, "inventories"), 1);
    assert_eq!(count(&clinic, "inventory_items"), 0);
    assert_eq!(count(&clinic, "patients"), 0);
    assert_eq!(count(&clinic, "appointments"), 1);

    assert_eq!(clinic.get_opd(&keep).unwrap().no_of_appointment, 1);
}

#[test]
fn test_deletes_decrement_counters() {
    let mut clinic = clinic();
    let token = signed_in(&mut clinic, "asha");
    let today = Utc::now().date_naive();

    let first = clinic.create_appointment(&token, "A".to_string()).unwrap();
    clinic.create_appointment(&token, "B".to_string()).unwrap();
    let patient = clinic.create_patient(&token, patient_born(today)).unwrap();

    clinic.delete_appointment(&token, &first.id).unwrap();
    clinic.delete_patient(&token, &patient.patient.id).unwrap();

    let opd = clinic.get_opd(&token).unwrap();
    assert_eq!(opd.no_of_appointment, 1);
    assert_eq!(opd.active_patient, 0);

    // Second delete of the same record is a NotFound, not a second decrement
    assert!(matches!(
        clinic.delete_appointment(&token, &first.id),
        Err(OpdError::NotFound { .. })
    ));
    assert_eq!(clinic.get_opd(&token).unwrap().no_of_appointment, 1);
}

#[test]
fn test_missing_opd_aborts_appointment() {
    let mut clinic = clinic();
    let token = signed_in(&mut clinic, "asha");
    let doctor = clinic.authenticate(&token).unwrap().doctor;
    clinic
        .database()
        .conn()
        .execute("DELETE FROM opds WHERE doctor_id = ?", [&doctor.id])
        .unwrap();

    let err = clinic
        .create_appointment(&token, "Orphan".to_string())
        .unwrap_err();
    assert!(err.is_orphan_reference());
    match err {
        OpdError::TransactionAborted(e) => {
            assert_eq!(e.reaction, "count_appointment_created");
            assert_eq!(e.kind, EntityKind::Appointment);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(clinic.list_appointments(&token).unwrap().is_empty());
    assert_eq!(clinic.orchestrator().failure_count(), 1);
}

fn refuse_doctor(_: &opd_core::db::Store<'_>, event: &Event) -> ReactionResult<Vec<Event>> {
    Err(ReactionError::OrphanReference {
        kind: event.kind,
        id: event.id.clone(),
        missing: "approval",
    })
}

#[test]
fn test_failing_cascade_aborts_registration() {
    let mut orchestrator = Orchestrator::with_default_reactions();
    orchestrator.register(Reaction::new(
        "refuse_doctor",
        EntityKind::Doctor,
        Phase::Created,
        refuse_doctor,
    ));
    let mut clinic = Clinic::new(
        Database::open_in_memory().unwrap(),
        orchestrator,
        test_config(),
    );

    let err = clinic
        .register(registration("asha", "asha@clinic.test"))
        .unwrap_err();
    assert!(matches!(err, OpdError::TransactionAborted(_)));

    for table in ["principals", "auth_tokens", "doctors", "addresses", "opds", "inventories"] {
        assert_eq!(count(&clinic, table), 0, "{} should be empty", table);
    }
    assert!(matches!(
        clinic.login("asha", PASSWORD),
        Err(OpdError::InvalidCredentials)
    ));
}
