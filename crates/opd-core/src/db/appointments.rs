//! Appointment operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{DbResult, Store};
use crate::models::{now_timestamp, Appointment};

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        name: row.get(2)?,
        date_time: row.get(3)?,
        active: row.get(4)?,
        last_updated: row.get(5)?,
    })
}

impl Store<'_> {
    /// Insert a new appointment.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (id, doctor_id, name, date_time, active, last_updated)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                appointment.id,
                appointment.doctor_id,
                appointment.name,
                appointment.date_time,
                appointment.active,
                appointment.last_updated,
            ],
        )?;
        Ok(())
    }

    /// Update name and active flag. `date_time` is never rewritten.
    pub fn update_appointment(&self, appointment: &Appointment) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE appointments SET name = ?2, active = ?3, last_updated = ?4 WHERE id = ?1",
            params![
                appointment.id,
                appointment.name,
                appointment.active,
                now_timestamp(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                r#"
                SELECT id, doctor_id, name, date_time, active, last_updated
                FROM appointments
                WHERE id = ?
                "#,
                [id],
                appointment_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a doctor's appointments, newest first.
    pub fn list_appointments_for_doctor(&self, doctor_id: &str) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, doctor_id, name, date_time, active, last_updated
            FROM appointments
            WHERE doctor_id = ?
            ORDER BY date_time DESC
            "#,
        )?;
        let rows = stmt.query_map([doctor_id], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete an appointment.
    pub fn delete_appointment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
