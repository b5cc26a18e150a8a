//! Shipment types: the unit of freight moved by the fleet.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

/// A shippable unit of goods bound for a client.
///
/// Immutable once bundled into a trip, except for its status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Uuid,
    pub client: String,

    /// Weight in kilograms. Always positive.
    pub weight_kg: f64,

    /// Volume in cubic metres. Always positive.
    pub volume_m3: f64,

    pub description: String,
    pub kind: CargoKind,

    /// When the client requires delivery.
    pub deliver_by: Timestamp,

    pub status: ShipmentStatus,
    pub created_at: Timestamp,
}

impl Shipment {
    /// Checks the fields a create request must carry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.client.trim().is_empty() {
            return Err(ValidationError::new("client", "client name is required"));
        }
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            return Err(ValidationError::new(
                "weight",
                format!("weight must be a positive number of kilograms, got {}", self.weight_kg),
            ));
        }
        if !self.volume_m3.is_finite() || self.volume_m3 <= 0.0 {
            return Err(ValidationError::new(
                "volume",
                format!("volume must be a positive number of cubic metres, got {}", self.volume_m3),
            ));
        }
        Ok(())
    }
}

/// The kind of cargo a shipment consists of — and the kind a vehicle's
/// body supports. Matching is exact; there is no substitution between kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CargoKind {
    /// General dry freight in a closed box.
    Dry,

    /// Temperature-controlled freight.
    Refrigerated,

    /// Freight carried on an open flatbed.
    Flatbed,

    /// Oversized freight on a lowboy platform.
    Lowboy,
}

impl CargoKind {
    /// Storage/display form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dry => "dry",
            Self::Refrigerated => "refrigerated",
            Self::Flatbed => "flatbed",
            Self::Lowboy => "lowboy",
        }
    }
}

/// Where a shipment stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShipmentStatus {
    /// Created, awaiting assignment to a trip.
    Pending,

    /// Bundled into a trip.
    Bundled,

    /// Delivered to the client. Terminal.
    Delivered,
}

impl ShipmentStatus {
    /// Storage/display form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Bundled => "bundled",
            Self::Delivered => "delivered",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_shipment() -> Shipment {
        Shipment {
            id: Uuid::new_v4(),
            client: "Acme Foods".into(),
            weight_kg: 500.0,
            volume_m3: 2.0,
            description: "Palletized canned goods".into(),
            kind: CargoKind::Dry,
            deliver_by: Timestamp::now(),
            status: ShipmentStatus::Pending,
            created_at: Timestamp::now(),
        }
    }

    #[test]
    fn valid_shipment_passes() {
        assert!(sample_shipment().validate().is_ok());
    }

    #[test]
    fn empty_client_rejected() {
        let mut s = sample_shipment();
        s.client = "   ".into();
        let err = s.validate().unwrap_err();
        assert_eq!(err.field, "client");
    }

    #[test]
    fn nonpositive_weight_rejected() {
        let mut s = sample_shipment();
        s.weight_kg = 0.0;
        let err = s.validate().unwrap_err();
        assert_eq!(err.field, "weight");
    }

    #[test]
    fn nonfinite_volume_rejected() {
        let mut s = sample_shipment();
        s.volume_m3 = f64::NAN;
        let err = s.validate().unwrap_err();
        assert_eq!(err.field, "volume");
    }
}
