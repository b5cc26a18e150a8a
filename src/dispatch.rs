//! Dispatch: finding a trip for a pending shipment.
//!
//! The evaluator (`compat`) is a pure admission check; the selector here
//! walks every open trip, applies it, and either surfaces all compatible
//! trips or opens a new one. There is deliberately no ranking step: any
//! compatible trip is equally valid, candidates are ordered by trip id for
//! determinism, and the operator's choice is the only tie-break.

pub mod compat;

use jiff::Timestamp;
use log::{info, warn};
use uuid::Uuid;

use crate::model::{Coordinates, ShipmentStatus, Trip, TripStatus};
use crate::storage::{Storage, StorageError};

pub use compat::{DispatchPolicy, is_compatible};

/// The outcome of an assignment request.
#[derive(Debug)]
pub enum Assignment {
    /// Open trips the shipment can join, ordered by trip id ascending.
    /// The operator picks one and completes the join with `trip join`.
    Candidates(Vec<Trip>),

    /// No compatible trip existed; a new one was opened and the shipment
    /// bundled into it.
    Created(Trip),
}

/// Why an assignment request failed.
#[derive(Debug, thiserror::Error)]
pub enum AssignError {
    #[error("shipment not found: {0}")]
    ShipmentNotFound(Uuid),

    #[error("shipment {id} is {}; only pending shipments can be assigned", .status.as_str())]
    NotPending { id: Uuid, status: ShipmentStatus },

    /// A read failed before anything was written. Safe to retry.
    #[error("lookup failed: {0}")]
    Lookup(StorageError),

    /// No compatible trip and no vehicle fit to open a new one.
    /// Not retried here; re-attempt once vehicle availability changes.
    #[error("no available vehicle can take this shipment")]
    NoVehicle,

    /// The transactional bundle step failed. The transaction bounds the
    /// blast radius, but storage state should be reviewed before retrying.
    #[error("trip creation failed: {0}")]
    Join(StorageError),
}

/// Evaluate a pending shipment against every open trip.
///
/// `origin` and `destination` describe the route the shipment needs.
/// Compatible trips are returned for the operator to choose from; when none
/// exist, a vehicle is selected and a new trip created with the shipment
/// already bundled, in one storage transaction.
pub fn assign(
    storage: &Storage,
    policy: &DispatchPolicy,
    shipment_id: Uuid,
    origin: Coordinates,
    destination: Coordinates,
) -> Result<Assignment, AssignError> {
    let shipment = match storage.load_shipment(shipment_id) {
        Ok(s) => s,
        Err(StorageError::ShipmentNotFound(id)) => return Err(AssignError::ShipmentNotFound(id)),
        Err(e) => return Err(AssignError::Lookup(e)),
    };
    if shipment.status != ShipmentStatus::Pending {
        return Err(AssignError::NotPending {
            id: shipment.id,
            status: shipment.status,
        });
    }

    let open = storage.list_open_trips().map_err(AssignError::Lookup)?;
    let mut candidates = Vec::new();
    for trip in open {
        // A trip whose vehicle cannot be resolved is a data-integrity
        // anomaly: log it and fail closed rather than abort the pass.
        let vehicle = match storage.load_vehicle(&trip.vehicle_plate) {
            Ok(v) => v,
            Err(StorageError::VehicleNotFound(plate)) => {
                warn!("trip {} references missing vehicle {plate}; skipping", trip.id);
                continue;
            }
            Err(e) => return Err(AssignError::Lookup(e)),
        };
        let bundled = storage
            .bundled_shipments(trip.id)
            .map_err(AssignError::Lookup)?;
        if compat::is_compatible(
            policy, &shipment, origin, destination, &trip, &vehicle, &bundled,
        ) {
            candidates.push(trip);
        }
    }

    if !candidates.is_empty() {
        // `list_open_trips` returns id-ascending order; the filter kept it.
        return Ok(Assignment::Candidates(candidates));
    }

    let Some(vehicle) = storage
        .find_vehicle_for(shipment.kind, shipment.weight_kg, shipment.volume_m3)
        .map_err(AssignError::Lookup)?
    else {
        return Err(AssignError::NoVehicle);
    };

    let trip = Trip {
        id: Uuid::new_v4(),
        vehicle_plate: vehicle.plate.clone(),
        status: TripStatus::Assigned,
        origin,
        destination,
        deliver_by: shipment.deliver_by,
        departed_at: None,
        active: true,
        notes: String::new(),
        created_at: Timestamp::now(),
    };
    storage
        .create_trip_with_shipment(&trip, shipment.id)
        .map_err(AssignError::Join)?;
    info!(
        "opened trip {} on vehicle {} for shipment {}",
        trip.id, trip.vehicle_plate, shipment.id
    );
    Ok(Assignment::Created(trip))
}
