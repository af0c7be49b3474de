//! OPD operations and atomic counter maintenance.

use rusqlite::{params, OptionalExtension, Row};

use super::{constraint_or_sqlite, DbResult, Store};
use crate::models::{now_timestamp, CounterReport, Opd, OpdCounter};

const OPD_COLUMNS: &str = "id, doctor_id, name, days_of_operation, max_patient_capacity, \
     active_patient, no_of_appointment, last_updated, created_at";

fn opd_from_row(row: &Row<'_>) -> rusqlite::Result<Opd> {
    Ok(Opd {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        name: row.get(2)?,
        days_of_operation: row.get(3)?,
        max_patient_capacity: row.get(4)?,
        active_patient: row.get(5)?,
        no_of_appointment: row.get(6)?,
        last_updated: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Counter state returned by an atomic increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterState {
    /// Value of the adjusted counter after the statement
    pub value: u32,
    pub max_patient_capacity: u32,
}

impl Store<'_> {
    /// Insert a new OPD.
    pub fn insert_opd(&self, opd: &Opd) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO opds (
                    id, doctor_id, name, days_of_operation, max_patient_capacity,
                    active_patient, no_of_appointment, last_updated, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    opd.id,
                    opd.doctor_id,
                    opd.name,
                    opd.days_of_operation,
                    opd.max_patient_capacity,
                    opd.active_patient,
                    opd.no_of_appointment,
                    opd.last_updated,
                    opd.created_at,
                ],
            )
            .map_err(|e| constraint_or_sqlite(e, "opd"))?;
        Ok(())
    }

    /// Write every editable OPD field, including counters.
    ///
    /// Only the profile edit path calls this; lifecycle reactions use
    /// [`Store::increment_opd_counter`].
    pub fn update_opd(&self, opd: &Opd) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE opds SET
                    name = ?2,
                    days_of_operation = ?3,
                    max_patient_capacity = ?4,
                    active_patient = ?5,
                    no_of_appointment = ?6,
                    last_updated = ?7
                WHERE id = ?1
                "#,
                params![
                    opd.id,
                    opd.name,
                    opd.days_of_operation,
                    opd.max_patient_capacity,
                    opd.active_patient,
                    opd.no_of_appointment,
                    now_timestamp(),
                ],
            )
            .map_err(|e| constraint_or_sqlite(e, "opd"))?;
        Ok(rows_affected > 0)
    }

    /// Get an OPD by ID.
    pub fn get_opd(&self, id: &str) -> DbResult<Option<Opd>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM opds WHERE id = ?", OPD_COLUMNS),
                [id],
                opd_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get the OPD owned by a doctor.
    pub fn get_opd_for_doctor(&self, doctor_id: &str) -> DbResult<Option<Opd>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM opds WHERE doctor_id = ?", OPD_COLUMNS),
                [doctor_id],
                opd_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Add `delta` to a counter in a single statement.
    ///
    /// Returns `None` when the OPD does not exist. A result below zero
    /// violates the column CHECK and fails as [`super::DbError::Constraint`].
    pub fn increment_opd_counter(
        &self,
        opd_id: &str,
        counter: OpdCounter,
        delta: i64,
    ) -> DbResult<Option<CounterState>> {
        let column = counter.column();
        let sql = format!(
            "UPDATE opds SET {col} = {col} + ?2, last_updated = ?3 WHERE id = ?1 \
             RETURNING {col}, max_patient_capacity",
            col = column
        );
        self.conn
            .query_row(&sql, params![opd_id, delta, now_timestamp()], |row| {
                Ok(CounterState {
                    value: row.get(0)?,
                    max_patient_capacity: row.get(1)?,
                })
            })
            .optional()
            .map_err(|e| constraint_or_sqlite(e, column))
    }

    /// Recompute both counters from live cardinality in one statement.
    pub fn reconcile_opd_counters(&self, opd_id: &str) -> DbResult<Option<CounterReport>> {
        let Some(before) = self.get_opd(opd_id)? else {
            return Ok(None);
        };

        let after: Option<(u32, u32)> = self
            .conn
            .query_row(
                r#"
                UPDATE opds SET
                    active_patient = (SELECT COUNT(*) FROM patients WHERE patients.doctor_id = opds.doctor_id),
                    no_of_appointment = (SELECT COUNT(*) FROM appointments WHERE appointments.doctor_id = opds.doctor_id),
                    last_updated = ?2
                WHERE id = ?1
                RETURNING active_patient, no_of_appointment
                "#,
                params![opd_id, now_timestamp()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(after.map(|(active_patient, no_of_appointment)| CounterReport {
            opd_id: before.id,
            active_patient_before: before.active_patient,
            active_patient_after: active_patient,
            no_of_appointment_before: before.no_of_appointment,
            no_of_appointment_after: no_of_appointment,
        }))
    }
}
