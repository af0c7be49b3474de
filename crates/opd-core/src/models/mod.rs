//! Domain models for the OPD system.

mod address;
mod appointment;
mod doctor;
mod inventory;
mod opd;
mod patient;
mod principal;

pub use address::*;
pub use appointment::*;
pub use doctor::*;
pub use inventory::*;
pub use opd::*;
pub use patient::*;
pub use principal::*;

/// Calendar date form used for birth dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current UTC timestamp in RFC 3339 form, as stored in every timestamp column.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Fresh opaque record identifier.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
