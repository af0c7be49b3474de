//! Patient and medical data operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{DbError, DbResult, Store};
use crate::models::{now_timestamp, BloodGroup, Gender, MedicalData, Patient, DATE_FORMAT};

const PATIENT_COLUMNS: &str = "id, doctor_id, first_name, last_name, date_of_birth, gender, \
     contact, email, address_id, medical_data_id, created_at, updated_at";

impl Store<'_> {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, doctor_id, first_name, last_name, date_of_birth, gender,
                contact, email, address_id, medical_data_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                patient.id,
                patient.doctor_id,
                patient.first_name,
                patient.last_name,
                patient.date_of_birth.format(DATE_FORMAT).to_string(),
                patient.gender.as_str(),
                patient.contact,
                patient.email,
                patient.address_id,
                patient.medical_data_id,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                first_name = ?2,
                last_name = ?3,
                date_of_birth = ?4,
                gender = ?5,
                contact = ?6,
                email = ?7,
                address_id = ?8,
                medical_data_id = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.first_name,
                patient.last_name,
                patient.date_of_birth.format(DATE_FORMAT).to_string(),
                patient.gender.as_str(),
                patient.contact,
                patient.email,
                patient.address_id,
                patient.medical_data_id,
                now_timestamp(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
                [id],
                PatientRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List a doctor's patients by last then first name.
    pub fn list_patients_for_doctor(&self, doctor_id: &str) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM patients WHERE doctor_id = ? ORDER BY last_name, first_name",
            PATIENT_COLUMNS
        ))?;
        let rows = stmt.query_map([doctor_id], PatientRow::from_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Delete a patient. Address and medical data are left in place.
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Insert medical data.
    pub fn insert_medical_data(&self, data: &MedicalData) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO medical_data (id, blood_group, height, weight, medical_history)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.id,
                data.blood_group.as_str(),
                data.height,
                data.weight,
                data.medical_history,
            ],
        )?;
        Ok(())
    }

    /// Update medical data.
    pub fn update_medical_data(&self, data: &MedicalData) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE medical_data SET
                blood_group = ?2,
                height = ?3,
                weight = ?4,
                medical_history = ?5
            WHERE id = ?1
            "#,
            params![
                data.id,
                data.blood_group.as_str(),
                data.height,
                data.weight,
                data.medical_history,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get medical data by ID.
    pub fn get_medical_data(&self, id: &str) -> DbResult<Option<MedicalData>> {
        let row: Option<(String, String, f64, f64, String)> = self
            .conn
            .query_row(
                "SELECT id, blood_group, height, weight, medical_history FROM medical_data WHERE id = ?",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()?;

        row.map(|(id, blood_group, height, weight, medical_history)| {
            let blood_group = BloodGroup::parse(&blood_group)
                .ok_or_else(|| DbError::Constraint(format!("Unknown blood group: {}", blood_group)))?;
            Ok(MedicalData {
                id,
                blood_group,
                height,
                weight,
                medical_history,
            })
        })
        .transpose()
    }
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: String,
    doctor_id: String,
    first_name: String,
    last_name: String,
    date_of_birth: String,
    gender: String,
    contact: String,
    email: String,
    address_id: Option<String>,
    medical_data_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl PatientRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            doctor_id: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            date_of_birth: row.get(4)?,
            gender: row.get(5)?,
            contact: row.get(6)?,
            email: row.get(7)?,
            address_id: row.get(8)?,
            medical_data_id: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let date_of_birth = NaiveDate::parse_from_str(&row.date_of_birth, DATE_FORMAT)
            .map_err(|e| DbError::Constraint(format!("Bad date of birth {}: {}", row.date_of_birth, e)))?;
        let gender = Gender::parse(&row.gender)
            .ok_or_else(|| DbError::Constraint(format!("Unknown gender: {}", row.gender)))?;

        Ok(Patient {
            id: row.id,
            doctor_id: row.doctor_id,
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth,
            gender,
            contact: row.contact,
            email: row.email,
            address_id: row.address_id,
            medical_data_id: row.medical_data_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
