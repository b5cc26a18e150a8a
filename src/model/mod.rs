//! Core data model for Flotilla.
//!
//! These types represent the fleet domain:
//! users, vehicles, shipments, trips, alerts, and location fixes.

mod alert;
mod shipment;
mod trip;
mod user;
mod vehicle;

pub use alert::{Alert, LocationFix};
pub use shipment::{CargoKind, Shipment, ShipmentStatus};
pub use trip::{Coordinates, Trip, TripStatus};
pub use user::{Role, User};
pub use vehicle::{Vehicle, VehicleState};

/// A field-level validation failure.
///
/// Raised when a create/update request carries missing or malformed fields,
/// before any storage write or compatibility evaluation runs.
#[derive(Debug, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// The offending field, named as the CLI exposes it.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
