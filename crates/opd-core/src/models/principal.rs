//! Authentication principal models.

use serde::{Deserialize, Serialize};

use super::{new_id, now_timestamp};

/// An authenticated account. Registering one triggers the doctor cascade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Principal {
    pub id: String,
    /// Login name, unique across principals
    pub username: String,
    /// Contact email, unique across principals
    pub email: String,
    /// Encoded PBKDF2 hash, never the raw password
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

impl Principal {
    /// Create a new principal with an already-hashed password.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: new_id(),
            username,
            email,
            password_hash,
            created_at: now_timestamp(),
        }
    }
}

/// Bearer credential issued to a principal. At most one per principal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthToken {
    pub key: String,
    pub principal_id: String,
    pub created_at: String,
}

impl AuthToken {
    pub fn new(key: String, principal_id: String) -> Self {
        Self {
            key,
            principal_id,
            created_at: now_timestamp(),
        }
    }
}
