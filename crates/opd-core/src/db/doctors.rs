//! Doctor operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{constraint_or_sqlite, DbResult, Store};
use crate::models::Doctor;

const DOCTOR_COLUMNS: &str = "id, principal_id, name, profile_image, speciality, phone_number, \
     experience, about, education, address_id, created_at";

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        principal_id: row.get(1)?,
        name: row.get(2)?,
        profile_image: row.get(3)?,
        speciality: row.get(4)?,
        phone_number: row.get(5)?,
        experience: row.get(6)?,
        about: row.get(7)?,
        education: row.get(8)?,
        address_id: row.get(9)?,
        created_at: row.get(10)?,
    })
}

impl Store<'_> {
    /// Insert a new doctor.
    pub fn insert_doctor(&self, doctor: &Doctor) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO doctors (
                    id, principal_id, name, profile_image, speciality, phone_number,
                    experience, about, education, address_id, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    doctor.id,
                    doctor.principal_id,
                    doctor.name,
                    doctor.profile_image,
                    doctor.speciality,
                    doctor.phone_number,
                    doctor.experience,
                    doctor.about,
                    doctor.education,
                    doctor.address_id,
                    doctor.created_at,
                ],
            )
            .map_err(|e| constraint_or_sqlite(e, "doctor"))?;
        Ok(())
    }

    /// Update an existing doctor's profile fields.
    pub fn update_doctor(&self, doctor: &Doctor) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE doctors SET
                name = ?2,
                profile_image = ?3,
                speciality = ?4,
                phone_number = ?5,
                experience = ?6,
                about = ?7,
                education = ?8,
                address_id = ?9
            WHERE id = ?1
            "#,
            params![
                doctor.id,
                doctor.name,
                doctor.profile_image,
                doctor.speciality,
                doctor.phone_number,
                doctor.experience,
                doctor.about,
                doctor.education,
                doctor.address_id,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a doctor by ID.
    pub fn get_doctor(&self, id: &str) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM doctors WHERE id = ?", DOCTOR_COLUMNS),
                [id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get the doctor owned by a principal.
    pub fn get_doctor_by_principal(&self, principal_id: &str) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM doctors WHERE principal_id = ?", DOCTOR_COLUMNS),
                [principal_id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Delete a doctor. OPD, inventory, appointments and patients cascade.
    pub fn delete_doctor(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM doctors WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
