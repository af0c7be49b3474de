//! Address operations.

use rusqlite::{params, OptionalExtension};

use super::{DbResult, Store};
use crate::models::Address;

impl Store<'_> {
    /// Insert a new address.
    pub fn insert_address(&self, address: &Address) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO addresses (id, house_number, street_name, city, state, pincode, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                address.id,
                address.house_number,
                address.street_name,
                address.city,
                address.state,
                address.pincode,
                address.created_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing address.
    pub fn update_address(&self, address: &Address) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE addresses SET
                house_number = ?2,
                street_name = ?3,
                city = ?4,
                state = ?5,
                pincode = ?6
            WHERE id = ?1
            "#,
            params![
                address.id,
                address.house_number,
                address.street_name,
                address.city,
                address.state,
                address.pincode,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an address by ID.
    pub fn get_address(&self, id: &str) -> DbResult<Option<Address>> {
        self.conn
            .query_row(
                r#"
                SELECT id, house_number, street_name, city, state, pincode, created_at
                FROM addresses
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(Address {
                        id: row.get(0)?,
                        house_number: row.get(1)?,
                        street_name: row.get(2)?,
                        city: row.get(3)?,
                        state: row.get(4)?,
                        pincode: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Delete an address. Owners keep a NULL reference.
    pub fn delete_address(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM addresses WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
