//! Trip types: a scheduled movement of one vehicle carrying shipments.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A scheduled movement of one vehicle from origin to destination,
/// carrying one or more shipments (via the trip–shipment relation).
///
/// Only `Assigned` trips accept new shipments: once the vehicle departs
/// there is nothing left to load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,

    /// Plate of the vehicle assigned at creation time.
    pub vehicle_plate: String,

    pub status: TripStatus,

    pub origin: Coordinates,
    pub destination: Coordinates,

    /// The delivery deadline shared by every shipment on this trip.
    pub deliver_by: Timestamp,

    /// Set when departure is recorded; `None` while still loading.
    pub departed_at: Option<Timestamp>,

    /// Cleared on completion.
    pub active: bool,

    /// Freeform operator notes.
    pub notes: String,

    pub created_at: Timestamp,
}

/// Where a trip stands in its lifecycle.
///
/// `Assigned -> InProgress` on recorded departure, `-> Completed` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripStatus {
    /// Vehicle assigned, still loading. Open to compatible shipments.
    Assigned,

    /// Departed. Closed to new shipments.
    InProgress,

    /// Arrived and unloaded. Terminal.
    Completed,
}

impl TripStatus {
    /// Storage/display form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}
