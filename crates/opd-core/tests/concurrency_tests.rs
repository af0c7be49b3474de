//! Concurrent writers on one database file.
//!
//! Each thread owns its own connection, as separate request handlers would.

use std::thread;

use chrono::NaiveDate;
use opd_core::models::{DoctorUpdate, Gender, NewPatient};
use opd_core::service::{Clinic, Registration};
use opd_core::Config;
use tempfile::TempDir;

const WRITERS: usize = 8;
const PER_WRITER: usize = 5;

fn file_config(dir: &TempDir) -> Config {
    Config {
        database_path: dir.path().join("clinic.sqlite3"),
        busy_timeout_ms: 30_000,
        password_iterations: 1_000,
        ..Config::default()
    }
}

fn register(config: &Config) -> String {
    let mut clinic = Clinic::open(config.clone()).unwrap();
    clinic
        .register(Registration {
            username: "asha".to_string(),
            email: "asha@clinic.test".to_string(),
            password: "pw".to_string(),
            password2: "pw".to_string(),
        })
        .unwrap();
    clinic.login("asha", "pw").unwrap()
}

fn writers(config: &Config) -> Vec<Clinic> {
    (0..WRITERS)
        .map(|_| Clinic::open(config.clone()).unwrap())
        .collect()
}

#[test]
fn test_concurrent_appointments_not_lost() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);
    let token = register(&config);

    thread::scope(|scope| {
        for mut clinic in writers(&config) {
            let token = &token;
            scope.spawn(move || {
                for i in 0..PER_WRITER {
                    clinic
                        .create_appointment(token, format!("Visitor {}", i))
                        .unwrap();
                }
            });
        }
    });

    let clinic = Clinic::open(config).unwrap();
    let opd = clinic.get_opd(&token).unwrap();
    assert_eq!(opd.no_of_appointment as usize, WRITERS * PER_WRITER);
    assert_eq!(
        clinic.list_appointments(&token).unwrap().len(),
        WRITERS * PER_WRITER
    );
}

#[test]
fn test_concurrent_admit_and_discharge() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);
    let token = register(&config);

    thread::scope(|scope| {
        for mut clinic in writers(&config) {
            let token = &token;
            scope.spawn(move || {
                for _ in 0..PER_WRITER {
                    let record = clinic
                        .create_patient(
                            token,
                            NewPatient {
                                first_name: "Neha".to_string(),
                                last_name: "Joshi".to_string(),
                                date_of_birth: NaiveDate::from_ymd_opt(2001, 11, 2).unwrap(),
                                gender: Gender::Female,
                                contact: "9812345670".to_string(),
                                email: "neha@example.com".to_string(),
                                address: None,
                                medical_data: None,
                            },
                        )
                        .unwrap();
                    clinic.delete_patient(token, &record.patient.id).unwrap();
                }
                // Leave one admitted per writer
                clinic
                    .create_patient(
                        token,
                        NewPatient {
                            first_name: "Neha".to_string(),
                            last_name: "Joshi".to_string(),
                            date_of_birth: NaiveDate::from_ymd_opt(2001, 11, 2).unwrap(),
                            gender: Gender::Female,
                            contact: "9812345670".to_string(),
                            email: "neha@example.com".to_string(),
                            address: None,
                            medical_data: None,
                        },
                    )
                    .unwrap();
            });
        }
    });

    let clinic = Clinic::open(config).unwrap();
    assert_eq!(clinic.get_opd(&token).unwrap().active_patient as usize, WRITERS);
    assert_eq!(clinic.list_patients(&token).unwrap().len(), WRITERS);
}

fn single_field_edit(field: usize) -> DoctorUpdate {
    let mut update = DoctorUpdate::default();
    match field {
        0 => update.name = Some("Asha Rao".to_string()),
        1 => update.speciality = Some("Cardiology".to_string()),
        2 => update.phone_number = Some("9876543210".to_string()),
        3 => update.experience = Some(12),
        4 => update.about = Some("Heart care".to_string()),
        5 => update.education = Some("MBBS, MD".to_string()),
        _ => update.profile_image = Some("profile/asha.png".to_string()),
    }
    update
}

#[test]
fn test_concurrent_profile_edits_keep_every_field() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);
    let token = register(&config);

    thread::scope(|scope| {
        for (field, mut clinic) in writers(&config).into_iter().enumerate() {
            let token = &token;
            scope.spawn(move || {
                for _ in 0..PER_WRITER {
                    clinic
                        .update_doctor_profile(token, single_field_edit(field))
                        .unwrap();
                }
            });
        }
    });

    let clinic = Clinic::open(config).unwrap();
    let doctor = clinic.get_doctor_profile(&token).unwrap().doctor;
    assert_eq!(doctor.name, "Asha Rao");
    assert_eq!(doctor.speciality, "Cardiology");
    assert_eq!(doctor.phone_number, "9876543210");
    assert_eq!(doctor.experience, 12);
    assert_eq!(doctor.about, "Heart care");
    assert_eq!(doctor.education, "MBBS, MD");
    assert_eq!(doctor.profile_image, "profile/asha.png");
}
