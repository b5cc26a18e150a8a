//! Vehicle types: the trucks that carry shipments.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CargoKind, ValidationError};

/// A truck in the fleet, keyed by its license plate.
///
/// Remaining capacity is mutated whenever a shipment is bundled into a trip
/// using this vehicle. Invariant: `0 <= available_weight_kg <= max_weight_kg`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// License plate. Unique across the fleet.
    pub plate: String,

    pub make: String,
    pub model: String,

    /// Maximum payload weight in kilograms.
    pub max_weight_kg: f64,

    /// Maximum payload volume in cubic metres.
    pub max_volume_m3: f64,

    /// Weight capacity not yet committed to bundled shipments.
    pub available_weight_kg: f64,

    /// Volume capacity not yet committed to bundled shipments.
    pub available_volume_m3: f64,

    /// The cargo kind this vehicle's body supports.
    pub kind: CargoKind,

    pub state: VehicleState,

    /// The driver assigned to this vehicle, if any.
    pub driver: Option<Uuid>,

    /// Folio of the IoT tracker installed in the cab, if any.
    pub tracker: Option<String>,

    /// Cleared when the vehicle is retired. Retired vehicles are kept for
    /// history but excluded from dispatch.
    pub active: bool,
}

impl Vehicle {
    /// Checks the fields a create/update request must carry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.plate.trim().is_empty() {
            return Err(ValidationError::new("plate", "license plate is required"));
        }
        if self.make.trim().is_empty() {
            return Err(ValidationError::new("make", "make is required"));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::new("model", "model is required"));
        }
        if !self.max_weight_kg.is_finite() || self.max_weight_kg <= 0.0 {
            return Err(ValidationError::new(
                "max-weight",
                format!("weight capacity must be positive, got {}", self.max_weight_kg),
            ));
        }
        if !self.max_volume_m3.is_finite() || self.max_volume_m3 <= 0.0 {
            return Err(ValidationError::new(
                "max-volume",
                format!("volume capacity must be positive, got {}", self.max_volume_m3),
            ));
        }
        Ok(())
    }
}

/// Operational state of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VehicleState {
    /// In the shop; not dispatchable.
    Maintenance,

    /// Ready to take a trip.
    Available,

    /// Out on an in-progress trip.
    EnRoute,

    /// Permanently out of service. Terminal.
    Decommissioned,
}

impl VehicleState {
    /// Storage/display form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::Available => "available",
            Self::EnRoute => "en-route",
            Self::Decommissioned => "decommissioned",
        }
    }
}
