//! Alert and location types reported by vehicle IoT trackers.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Coordinates;

/// An emergency alert raised from a vehicle's tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,

    /// Folio of the tracker that raised the alert.
    pub tracker: String,

    pub position: Coordinates,

    /// Stamped in the configured reference timezone when the alert arrives.
    pub raised_at: Timestamp,
}

/// A GPS fix reported by a tracker.
///
/// Fixes are ingested as reported and read back for display; the system
/// never computes or interpolates positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationFix {
    pub tracker: String,
    pub position: Coordinates,
    pub recorded_at: Timestamp,
}
