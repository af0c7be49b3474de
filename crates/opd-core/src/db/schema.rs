//! SQLite schema definition.

/// Sentinel value written into placeholder records created by the
/// registration cascade.
pub const NOT_SPECIFIED: &str = "Not Specified";

/// Name of the role group every registered principal joins.
pub const DOCTOR_GROUP: &str = "Doctor";

/// Complete database schema for the OPD store.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Principals (authentication accounts)
-- ============================================================================

CREATE TABLE IF NOT EXISTS principals (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS auth_tokens (
    key TEXT PRIMARY KEY,
    principal_id TEXT NOT NULL UNIQUE REFERENCES principals(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS role_groups (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS principal_groups (
    principal_id TEXT NOT NULL REFERENCES principals(id) ON DELETE CASCADE,
    group_name TEXT NOT NULL REFERENCES role_groups(name) ON DELETE CASCADE,
    PRIMARY KEY (principal_id, group_name)
);

INSERT OR IGNORE INTO role_groups (name) VALUES ('Doctor');

-- ============================================================================
-- Addresses (exclusively owned by one doctor or one patient)
-- ============================================================================

CREATE TABLE IF NOT EXISTS addresses (
    id TEXT PRIMARY KEY,
    house_number TEXT,
    street_name TEXT NOT NULL,
    city TEXT NOT NULL,
    state TEXT NOT NULL,
    pincode TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Doctors
-- ============================================================================

CREATE TABLE IF NOT EXISTS doctors (
    id TEXT PRIMARY KEY,
    principal_id TEXT NOT NULL UNIQUE REFERENCES principals(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    profile_image TEXT NOT NULL DEFAULT 'profile/default-profile.png',
    speciality TEXT NOT NULL,
    phone_number TEXT NOT NULL,
    experience INTEGER NOT NULL DEFAULT 0 CHECK (experience >= 0),
    about TEXT NOT NULL DEFAULT '',
    education TEXT NOT NULL,
    address_id TEXT UNIQUE REFERENCES addresses(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- OPD (one per doctor, holds the denormalized counters)
-- ============================================================================

CREATE TABLE IF NOT EXISTS opds (
    id TEXT PRIMARY KEY,
    doctor_id TEXT NOT NULL UNIQUE REFERENCES doctors(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    days_of_operation TEXT NOT NULL,
    max_patient_capacity INTEGER NOT NULL DEFAULT 0 CHECK (max_patient_capacity >= 0),
    active_patient INTEGER NOT NULL DEFAULT 0 CHECK (active_patient >= 0),
    no_of_appointment INTEGER NOT NULL DEFAULT 0 CHECK (no_of_appointment >= 0),
    last_updated TEXT NOT NULL DEFAULT (datetime('now')),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Inventory
-- ============================================================================

CREATE TABLE IF NOT EXISTS inventories (
    id TEXT PRIMARY KEY,
    doctor_id TEXT NOT NULL UNIQUE REFERENCES doctors(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS inventory_items (
    id TEXT PRIMARY KEY,
    inventory_id TEXT NOT NULL REFERENCES inventories(id) ON DELETE CASCADE,
    item_name TEXT NOT NULL,
    item_quantity INTEGER NOT NULL DEFAULT 0 CHECK (item_quantity >= 0),
    item_price REAL NOT NULL DEFAULT 0,
    last_updated TEXT NOT NULL DEFAULT (datetime('now')),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_inventory_items_inventory ON inventory_items(inventory_id);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    doctor_id TEXT NOT NULL REFERENCES doctors(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    date_time TEXT NOT NULL,                     -- set at creation, never updated
    active INTEGER NOT NULL DEFAULT 1,
    last_updated TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_doctor ON appointments(doctor_id);

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS medical_data (
    id TEXT PRIMARY KEY,
    blood_group TEXT NOT NULL CHECK (blood_group IN ('A+', 'A-', 'B+', 'B-', 'AB+', 'AB-', 'O+', 'O-')),
    height REAL NOT NULL DEFAULT 0,
    weight REAL NOT NULL DEFAULT 0,
    medical_history TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    doctor_id TEXT NOT NULL REFERENCES doctors(id) ON DELETE CASCADE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,                 -- YYYY-MM-DD
    gender TEXT NOT NULL CHECK (gender IN ('male', 'female', 'other')),
    contact TEXT NOT NULL,
    email TEXT NOT NULL,
    address_id TEXT UNIQUE REFERENCES addresses(id) ON DELETE SET NULL,
    medical_data_id TEXT UNIQUE REFERENCES medical_data(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_doctor ON patients(doctor_id);
"#;
