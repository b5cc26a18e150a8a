//! SQLite persistence for the fleet.
//!
//! One database file under the storage root:
//!
//! ```text
//! <root>/fleet.sqlite3
//! ```
//!
//! Tables: `user`, `vehicle`, `shipment`, `trip`, `trip_shipment`,
//! `alert`, `location_fix`. Enums and timestamps are stored as text in
//! their display forms; unknown stored values surface as
//! [`StorageError::Corrupt`] on load.
//!
//! The trip→vehicle reference is deliberately not FOREIGN KEY constrained:
//! a trip pointing at a vanished vehicle must stay representable so that
//! dispatch can fail closed on it instead of the database rejecting reads.

mod alert;
mod shipment;
mod trip;
mod user;
mod vehicle;

use std::{fs, io, path::PathBuf};

use rusqlite::Connection;
use uuid::Uuid;

use crate::model::CargoKind;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("user not found: {0}")]
    UserNotFound(Uuid),

    #[error("no user with email {0}")]
    EmailNotFound(String),

    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("vehicle not found: {0}")]
    VehicleNotFound(String),

    #[error("vehicle already exists: {0}")]
    VehicleAlreadyExists(String),

    #[error("vehicle {0} already has an active trip")]
    VehicleBusy(String),

    #[error("vehicle {0} is retired")]
    VehicleRetired(String),

    #[error("shipment not found: {0}")]
    ShipmentNotFound(Uuid),

    #[error("trip not found: {0}")]
    TripNotFound(Uuid),

    /// The join transaction rejected the shipment. Nothing was written.
    #[error("shipment {shipment} cannot join trip {trip}: {reason}")]
    JoinRejected {
        trip: Uuid,
        shipment: Uuid,
        reason: String,
    },

    /// A lifecycle operation hit a trip in the wrong state.
    #[error("trip {trip}: {reason}")]
    TripStateConflict { trip: Uuid, reason: String },

    #[error("stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// SQLite-backed storage for the whole fleet.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens the fleet database under `root`, creating the directory, the
    /// file, and the schema as needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let conn = Connection::open(root.join("fleet.sqlite3"))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Returns the default storage root: `~/.flotilla/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".flotilla"))
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS user (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    surname         TEXT NOT NULL,
    second_surname  TEXT,
    email           TEXT NOT NULL UNIQUE,
    password_digest TEXT NOT NULL,
    role            TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vehicle (
    plate               TEXT PRIMARY KEY,
    make                TEXT NOT NULL,
    model               TEXT NOT NULL,
    max_weight_kg       REAL NOT NULL,
    max_volume_m3       REAL NOT NULL,
    available_weight_kg REAL NOT NULL,
    available_volume_m3 REAL NOT NULL,
    kind                TEXT NOT NULL,
    state               TEXT NOT NULL,
    driver_id           TEXT,
    tracker             TEXT,
    active              INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS shipment (
    id          TEXT PRIMARY KEY,
    client      TEXT NOT NULL,
    weight_kg   REAL NOT NULL,
    volume_m3   REAL NOT NULL,
    description TEXT NOT NULL,
    kind        TEXT NOT NULL,
    deliver_by  TEXT NOT NULL,
    status      TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS trip (
    id            TEXT PRIMARY KEY,
    vehicle_plate TEXT NOT NULL,
    status        TEXT NOT NULL,
    origin_lat    REAL NOT NULL,
    origin_lon    REAL NOT NULL,
    dest_lat      REAL NOT NULL,
    dest_lon      REAL NOT NULL,
    deliver_by    TEXT NOT NULL,
    departed_at   TEXT,
    active        INTEGER NOT NULL,
    notes         TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS trip_shipment (
    trip_id     TEXT NOT NULL,
    shipment_id TEXT NOT NULL,
    PRIMARY KEY (trip_id, shipment_id)
);

CREATE TABLE IF NOT EXISTS alert (
    id        TEXT PRIMARY KEY,
    tracker   TEXT NOT NULL,
    lat       REAL NOT NULL,
    lon       REAL NOT NULL,
    raised_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS location_fix (
    tracker     TEXT NOT NULL,
    lat         REAL NOT NULL,
    lon         REAL NOT NULL,
    recorded_at TEXT NOT NULL
);
";

/// Parses a stored RFC 3339 timestamp, mapping failures to `Corrupt`.
fn parse_timestamp(field: &str, value: &str) -> Result<jiff::Timestamp> {
    value
        .parse()
        .map_err(|e| StorageError::Corrupt(format!("invalid {field}: {e}")))
}

/// Parses a stored UUID, mapping failures to `Corrupt`.
fn parse_uuid(field: &str, value: &str) -> Result<Uuid> {
    value
        .parse()
        .map_err(|e| StorageError::Corrupt(format!("invalid {field}: {e}")))
}

/// Parses a stored cargo kind. Shared by the vehicle and shipment tables.
fn parse_cargo_kind(value: &str) -> Result<CargoKind> {
    match value {
        "dry" => Ok(CargoKind::Dry),
        "refrigerated" => Ok(CargoKind::Refrigerated),
        "flatbed" => Ok(CargoKind::Flatbed),
        "lowboy" => Ok(CargoKind::Lowboy),
        other => Err(StorageError::Corrupt(format!("unknown cargo kind: {other}"))),
    }
}
