//! Principal, token and role-group operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{constraint_or_sqlite, DbResult, Store};
use crate::models::{AuthToken, Principal};

fn principal_from_row(row: &Row<'_>) -> rusqlite::Result<Principal> {
    Ok(Principal {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Store<'_> {
    /// Insert a new principal.
    pub fn insert_principal(&self, principal: &Principal) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO principals (id, username, email, password_hash, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    principal.id,
                    principal.username,
                    principal.email,
                    principal.password_hash,
                    principal.created_at,
                ],
            )
            .map_err(|e| constraint_or_sqlite(e, "principal"))?;
        Ok(())
    }

    /// Get a principal by ID.
    pub fn get_principal(&self, id: &str) -> DbResult<Option<Principal>> {
        self.conn
            .query_row(
                "SELECT id, username, email, password_hash, created_at FROM principals WHERE id = ?",
                [id],
                principal_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a principal by login name.
    pub fn get_principal_by_username(&self, username: &str) -> DbResult<Option<Principal>> {
        self.conn
            .query_row(
                "SELECT id, username, email, password_hash, created_at FROM principals WHERE username = ?",
                [username],
                principal_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Check whether any principal already uses this email.
    pub fn email_exists(&self, email: &str) -> DbResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM principals WHERE email = ? COLLATE NOCASE)",
            [email],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Check whether any principal already uses this username.
    pub fn username_exists(&self, username: &str) -> DbResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM principals WHERE username = ?)",
            [username],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Delete a principal. Tokens, group memberships and the doctor cascade.
    pub fn delete_principal(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM principals WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Insert a token for a principal.
    pub fn insert_token(&self, token: &AuthToken) -> DbResult<()> {
        self.conn
            .execute(
                "INSERT INTO auth_tokens (key, principal_id, created_at) VALUES (?1, ?2, ?3)",
                params![token.key, token.principal_id, token.created_at],
            )
            .map_err(|e| constraint_or_sqlite(e, "auth token"))?;
        Ok(())
    }

    /// Get the token issued to a principal.
    pub fn get_token_for_principal(&self, principal_id: &str) -> DbResult<Option<AuthToken>> {
        self.conn
            .query_row(
                "SELECT key, principal_id, created_at FROM auth_tokens WHERE principal_id = ?",
                [principal_id],
                |row| {
                    Ok(AuthToken {
                        key: row.get(0)?,
                        principal_id: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Resolve a token key to its principal.
    pub fn get_principal_by_token(&self, key: &str) -> DbResult<Option<Principal>> {
        self.conn
            .query_row(
                r#"
                SELECT p.id, p.username, p.email, p.password_hash, p.created_at
                FROM auth_tokens t
                JOIN principals p ON p.id = t.principal_id
                WHERE t.key = ?
                "#,
                [key],
                principal_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Delete a token.
    pub fn delete_token(&self, key: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM auth_tokens WHERE key = ?", [key])?;
        Ok(rows_affected > 0)
    }

    /// Add a principal to a role group. Adding twice is a no-op.
    pub fn add_principal_to_group(&self, principal_id: &str, group: &str) -> DbResult<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO principal_groups (principal_id, group_name) VALUES (?1, ?2)",
                [principal_id, group],
            )
            .map_err(|e| constraint_or_sqlite(e, "group membership"))?;
        Ok(())
    }

    /// Check role-group membership.
    pub fn principal_in_group(&self, principal_id: &str, group: &str) -> DbResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM principal_groups WHERE principal_id = ?1 AND group_name = ?2)",
            [principal_id, group],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}
