//! Inventory and inventory item operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{constraint_or_sqlite, DbResult, Store};
use crate::models::{now_timestamp, Inventory, InventoryItem};

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<InventoryItem> {
    Ok(InventoryItem {
        id: row.get(0)?,
        inventory_id: row.get(1)?,
        item_name: row.get(2)?,
        item_quantity: row.get(3)?,
        item_price: row.get(4)?,
        last_updated: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl Store<'_> {
    /// Insert a new inventory.
    pub fn insert_inventory(&self, inventory: &Inventory) -> DbResult<()> {
        self.conn
            .execute(
                "INSERT INTO inventories (id, doctor_id) VALUES (?1, ?2)",
                params![inventory.id, inventory.doctor_id],
            )
            .map_err(|e| constraint_or_sqlite(e, "inventory"))?;
        Ok(())
    }

    /// Get the inventory owned by a doctor.
    pub fn get_inventory_for_doctor(&self, doctor_id: &str) -> DbResult<Option<Inventory>> {
        self.conn
            .query_row(
                "SELECT id, doctor_id FROM inventories WHERE doctor_id = ?",
                [doctor_id],
                |row| {
                    Ok(Inventory {
                        id: row.get(0)?,
                        doctor_id: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Insert a new inventory item.
    pub fn insert_inventory_item(&self, item: &InventoryItem) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO inventory_items (
                    id, inventory_id, item_name, item_quantity, item_price,
                    last_updated, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    item.id,
                    item.inventory_id,
                    item.item_name,
                    item.item_quantity,
                    item.item_price,
                    item.last_updated,
                    item.created_at,
                ],
            )
            .map_err(|e| constraint_or_sqlite(e, "inventory item"))?;
        Ok(())
    }

    /// Update an existing inventory item.
    pub fn update_inventory_item(&self, item: &InventoryItem) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE inventory_items SET
                item_name = ?2,
                item_quantity = ?3,
                item_price = ?4,
                last_updated = ?5
            WHERE id = ?1
            "#,
            params![
                item.id,
                item.item_name,
                item.item_quantity,
                item.item_price,
                now_timestamp(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an inventory item by ID.
    pub fn get_inventory_item(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        self.conn
            .query_row(
                r#"
                SELECT id, inventory_id, item_name, item_quantity, item_price,
                       last_updated, created_at
                FROM inventory_items
                WHERE id = ?
                "#,
                [id],
                item_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List items in an inventory, by name.
    pub fn list_inventory_items(&self, inventory_id: &str) -> DbResult<Vec<InventoryItem>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, inventory_id, item_name, item_quantity, item_price,
                   last_updated, created_at
            FROM inventory_items
            WHERE inventory_id = ?
            ORDER BY item_name
            "#,
        )?;
        let rows = stmt.query_map([inventory_id], item_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete an inventory item.
    pub fn delete_inventory_item(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM inventory_items WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
