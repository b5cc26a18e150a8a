//! Trip storage: creation, lifecycle transitions, and the transactional
//! join that bundles a shipment while committing vehicle capacity.
//!
//! Every multi-write operation here runs in one SQLite transaction. The
//! capacity guard is part of the UPDATE itself, so two concurrent joins can
//! never both observe stale available weight and overcommit a vehicle.

use jiff::Timestamp;
use rusqlite::{OptionalExtension, Transaction, params};
use uuid::Uuid;

use crate::model::{Coordinates, Shipment, Trip, TripStatus};

use super::shipment::{SHIPMENT_COLUMNS, read_shipment, shipment_from_row};
use super::{Result, Storage, StorageError, parse_timestamp, parse_uuid};

const TRIP_COLUMNS: &str = "id, vehicle_plate, status, origin_lat, origin_lon, \
     dest_lat, dest_lon, deliver_by, departed_at, active, notes, created_at";

/// Raw column values in `TRIP_COLUMNS` order.
type TripRow = (
    String,
    String,
    String,
    f64,
    f64,
    f64,
    f64,
    String,
    Option<String>,
    bool,
    String,
    String,
);

fn read_trip(row: &rusqlite::Row<'_>) -> rusqlite::Result<TripRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
    ))
}

fn trip_from_row(raw: TripRow) -> Result<Trip> {
    let (
        id,
        vehicle_plate,
        status,
        origin_lat,
        origin_lon,
        dest_lat,
        dest_lon,
        deliver_by,
        departed_at,
        active,
        notes,
        created_at,
    ) = raw;
    let departed_at = match departed_at {
        Some(ts) => Some(parse_timestamp("departed_at", &ts)?),
        None => None,
    };
    Ok(Trip {
        id: parse_uuid("trip id", &id)?,
        vehicle_plate,
        status: parse_status(&status)?,
        origin: Coordinates { lat: origin_lat, lon: origin_lon },
        destination: Coordinates { lat: dest_lat, lon: dest_lon },
        deliver_by: parse_timestamp("deliver_by", &deliver_by)?,
        departed_at,
        active,
        notes,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

fn parse_status(value: &str) -> Result<TripStatus> {
    match value {
        "assigned" => Ok(TripStatus::Assigned),
        "in-progress" => Ok(TripStatus::InProgress),
        "completed" => Ok(TripStatus::Completed),
        other => Err(StorageError::Corrupt(format!("unknown trip status: {other}"))),
    }
}

impl Storage {
    /// Creates a trip and bundles its first shipment, atomically.
    ///
    /// The vehicle must exist, be active, and have no active trip; the
    /// shipment must be pending. All inserts and the capacity decrement
    /// commit together or not at all.
    pub fn create_trip_with_shipment(&self, trip: &Trip, shipment_id: Uuid) -> Result<()> {
        // Storage is used behind a shared reference; SQLite still
        // serializes writers, so the unchecked variant is sound here.
        let tx = self.conn.unchecked_transaction()?;

        let vehicle: Option<bool> = tx
            .query_row(
                "SELECT active FROM vehicle WHERE plate = ?1",
                [&trip.vehicle_plate],
                |row| row.get(0),
            )
            .optional()?;
        match vehicle {
            None => return Err(StorageError::VehicleNotFound(trip.vehicle_plate.clone())),
            Some(false) => return Err(StorageError::VehicleRetired(trip.vehicle_plate.clone())),
            Some(true) => {}
        }

        let busy: Option<String> = tx
            .query_row(
                "SELECT id FROM trip WHERE vehicle_plate = ?1 AND active = 1",
                [&trip.vehicle_plate],
                |row| row.get(0),
            )
            .optional()?;
        if busy.is_some() {
            return Err(StorageError::VehicleBusy(trip.vehicle_plate.clone()));
        }

        tx.execute(
            "INSERT INTO trip (id, vehicle_plate, status, origin_lat, origin_lon, \
             dest_lat, dest_lon, deliver_by, departed_at, active, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                trip.id.to_string(),
                &trip.vehicle_plate,
                trip.status.as_str(),
                trip.origin.lat,
                trip.origin.lon,
                trip.destination.lat,
                trip.destination.lon,
                trip.deliver_by.to_string(),
                trip.departed_at.map(|ts| ts.to_string()),
                trip.active,
                &trip.notes,
                trip.created_at.to_string(),
            ],
        )?;

        bundle_into(&tx, trip.id, shipment_id)?;

        tx.commit()?;
        Ok(())
    }

    /// Bundles a pending shipment into an open trip, atomically: the
    /// trip–shipment relation, the vehicle's capacity decrement, and the
    /// shipment's status change commit together or roll back together.
    pub fn join_shipment(&self, trip_id: Uuid, shipment_id: Uuid) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let (status, active): (String, bool) = tx
            .query_row(
                "SELECT status, active FROM trip WHERE id = ?1",
                [trip_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or(StorageError::TripNotFound(trip_id))?;
        if status != "assigned" || !active {
            return Err(StorageError::JoinRejected {
                trip: trip_id,
                shipment: shipment_id,
                reason: "trip is not open for loading".into(),
            });
        }

        bundle_into(&tx, trip_id, shipment_id)?;

        tx.commit()?;
        Ok(())
    }

    /// Loads a single trip.
    pub fn load_trip(&self, id: Uuid) -> Result<Trip> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {TRIP_COLUMNS} FROM trip WHERE id = ?1"),
                [id.to_string()],
                read_trip,
            )
            .optional()?
            .ok_or(StorageError::TripNotFound(id))?;
        trip_from_row(raw)
    }

    /// Lists trips still open for loading (assigned and active), ordered
    /// by trip id ascending for deterministic candidate ordering.
    pub fn list_open_trips(&self) -> Result<Vec<Trip>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRIP_COLUMNS} FROM trip WHERE status = 'assigned' AND active = 1 ORDER BY id"
        ))?;
        let rows = stmt.query_map([], read_trip)?;
        let mut trips = Vec::new();
        for raw in rows {
            trips.push(trip_from_row(raw?)?);
        }
        Ok(trips)
    }

    /// Lists all trips, oldest first.
    pub fn list_trips(&self) -> Result<Vec<Trip>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TRIP_COLUMNS} FROM trip"))?;
        let rows = stmt.query_map([], read_trip)?;
        let mut trips = Vec::new();
        for raw in rows {
            trips.push(trip_from_row(raw?)?);
        }
        trips.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(trips)
    }

    /// Loads the shipments bundled into a trip, oldest first.
    pub fn bundled_shipments(&self, trip_id: Uuid) -> Result<Vec<Shipment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipment
             JOIN trip_shipment ON trip_shipment.shipment_id = shipment.id
             WHERE trip_shipment.trip_id = ?1"
        ))?;
        let rows = stmt.query_map([trip_id.to_string()], read_shipment)?;
        let mut shipments = Vec::new();
        for raw in rows {
            shipments.push(shipment_from_row(raw?)?);
        }
        shipments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(shipments)
    }

    /// Records departure: the trip moves to in-progress and its vehicle
    /// to en-route. Only an assigned trip can depart.
    pub fn depart_trip(&self, trip_id: Uuid, departed_at: Timestamp) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let (status, plate): (String, String) = tx
            .query_row(
                "SELECT status, vehicle_plate FROM trip WHERE id = ?1",
                [trip_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or(StorageError::TripNotFound(trip_id))?;
        if status != "assigned" {
            return Err(StorageError::TripStateConflict {
                trip: trip_id,
                reason: format!("cannot depart from state {status}"),
            });
        }

        tx.execute(
            "UPDATE trip SET status = 'in-progress', departed_at = ?1 WHERE id = ?2",
            params![departed_at.to_string(), trip_id.to_string()],
        )?;
        // A missing vehicle row is tolerated here; dispatch already fails
        // closed on it and departure must not strand the trip record.
        tx.execute(
            "UPDATE vehicle SET state = 'en-route' WHERE plate = ?1",
            [&plate],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Records completion: shipments become delivered, the vehicle gets its
    /// committed weight back and returns to available, and the trip's
    /// active flag clears. Only an in-progress trip can complete.
    pub fn complete_trip(&self, trip_id: Uuid) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let (status, plate): (String, String) = tx
            .query_row(
                "SELECT status, vehicle_plate FROM trip WHERE id = ?1",
                [trip_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or(StorageError::TripNotFound(trip_id))?;
        if status != "in-progress" {
            return Err(StorageError::TripStateConflict {
                trip: trip_id,
                reason: format!("cannot complete from state {status}"),
            });
        }

        let freed: f64 = tx.query_row(
            "SELECT COALESCE(SUM(shipment.weight_kg), 0)
             FROM trip_shipment JOIN shipment ON shipment.id = trip_shipment.shipment_id
             WHERE trip_shipment.trip_id = ?1",
            [trip_id.to_string()],
            |row| row.get(0),
        )?;

        tx.execute(
            "UPDATE trip SET status = 'completed', active = 0 WHERE id = ?1",
            [trip_id.to_string()],
        )?;
        tx.execute(
            "UPDATE shipment SET status = 'delivered'
             WHERE id IN (SELECT shipment_id FROM trip_shipment WHERE trip_id = ?1)",
            [trip_id.to_string()],
        )?;
        tx.execute(
            "UPDATE vehicle
             SET available_weight_kg = MIN(max_weight_kg, available_weight_kg + ?1),
                 state = 'available'
             WHERE plate = ?2 AND state != 'decommissioned'",
            params![freed, plate],
        )?;

        tx.commit()?;
        Ok(())
    }
}

/// The shared bundle step: relation insert, capacity decrement with its
/// guard, and the shipment status change. Runs inside the caller's
/// transaction; any error rolls the whole transaction back.
fn bundle_into(tx: &Transaction<'_>, trip_id: Uuid, shipment_id: Uuid) -> Result<()> {
    let (weight_kg, volume_m3, status): (f64, f64, String) = tx
        .query_row(
            "SELECT weight_kg, volume_m3, status FROM shipment WHERE id = ?1",
            [shipment_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?
        .ok_or(StorageError::ShipmentNotFound(shipment_id))?;
    if status != "pending" {
        return Err(StorageError::JoinRejected {
            trip: trip_id,
            shipment: shipment_id,
            reason: format!("shipment is {status}, not pending"),
        });
    }

    let plate: String = tx.query_row(
        "SELECT vehicle_plate FROM trip WHERE id = ?1",
        [trip_id.to_string()],
        |row| row.get(0),
    )?;
    let max_volume_m3: f64 = tx
        .query_row(
            "SELECT max_volume_m3 FROM vehicle WHERE plate = ?1",
            [&plate],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(StorageError::VehicleNotFound(plate.clone()))?;

    // Aggregate volume invariant: bundled volumes plus the candidate may
    // never exceed the vehicle's max.
    let loaded_volume: f64 = tx.query_row(
        "SELECT COALESCE(SUM(shipment.volume_m3), 0)
         FROM trip_shipment JOIN shipment ON shipment.id = trip_shipment.shipment_id
         WHERE trip_shipment.trip_id = ?1",
        [trip_id.to_string()],
        |row| row.get(0),
    )?;
    if max_volume_m3 < loaded_volume + volume_m3 {
        return Err(StorageError::JoinRejected {
            trip: trip_id,
            shipment: shipment_id,
            reason: "vehicle volume capacity exceeded".into(),
        });
    }

    tx.execute(
        "INSERT INTO trip_shipment (trip_id, shipment_id) VALUES (?1, ?2)",
        params![trip_id.to_string(), shipment_id.to_string()],
    )?;

    // The guard is part of the UPDATE: a concurrent join that already took
    // the capacity makes this affect zero rows and the whole bundle rolls
    // back, instead of driving available weight negative.
    let rows = tx.execute(
        "UPDATE vehicle SET available_weight_kg = available_weight_kg - ?1
         WHERE plate = ?2 AND available_weight_kg >= ?1",
        params![weight_kg, &plate],
    )?;
    if rows == 0 {
        return Err(StorageError::JoinRejected {
            trip: trip_id,
            shipment: shipment_id,
            reason: "vehicle has insufficient available weight".into(),
        });
    }

    tx.execute(
        "UPDATE shipment SET status = 'bundled' WHERE id = ?1",
        [shipment_id.to_string()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::model::{CargoKind, ShipmentStatus, Vehicle, VehicleState};

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("fleet")).unwrap();
        (dir, storage)
    }

    fn sample_vehicle(plate: &str) -> Vehicle {
        Vehicle {
            plate: plate.into(),
            make: "Kenworth".into(),
            model: "T680".into(),
            max_weight_kg: 2000.0,
            max_volume_m3: 10.0,
            available_weight_kg: 2000.0,
            available_volume_m3: 10.0,
            kind: CargoKind::Dry,
            state: VehicleState::Available,
            driver: None,
            tracker: None,
            active: true,
        }
    }

    fn sample_shipment(weight_kg: f64, volume_m3: f64) -> Shipment {
        Shipment {
            id: Uuid::new_v4(),
            client: "Acme Foods".into(),
            weight_kg,
            volume_m3,
            description: "Palletized canned goods".into(),
            kind: CargoKind::Dry,
            deliver_by: Timestamp::now(),
            status: ShipmentStatus::Pending,
            created_at: Timestamp::now(),
        }
    }

    fn sample_trip(plate: &str) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            vehicle_plate: plate.into(),
            status: TripStatus::Assigned,
            origin: Coordinates { lat: 19.4326, lon: -99.1332 },
            destination: Coordinates { lat: 20.6597, lon: -103.3496 },
            deliver_by: Timestamp::now(),
            departed_at: None,
            active: true,
            notes: String::new(),
            created_at: Timestamp::now(),
        }
    }

    /// Storage with one vehicle, one trip holding one 500 kg shipment.
    fn loaded_fixture() -> (TempDir, Storage, Trip) {
        let (dir, storage) = test_storage();
        storage.create_vehicle(&sample_vehicle("AAA-111")).unwrap();
        let seed = sample_shipment(500.0, 2.0);
        storage.create_shipment(&seed).unwrap();
        let trip = sample_trip("AAA-111");
        storage.create_trip_with_shipment(&trip, seed.id).unwrap();
        (dir, storage, trip)
    }

    #[test]
    fn create_trip_bundles_and_decrements() {
        let (_dir, storage, trip) = loaded_fixture();

        let loaded = storage.load_trip(trip.id).unwrap();
        assert_eq!(loaded.status, TripStatus::Assigned);
        assert_eq!(loaded.vehicle_plate, "AAA-111");

        let bundled = storage.bundled_shipments(trip.id).unwrap();
        assert_eq!(bundled.len(), 1);
        assert_eq!(bundled[0].status, ShipmentStatus::Bundled);

        let vehicle = storage.load_vehicle("AAA-111").unwrap();
        assert!((vehicle.available_weight_kg - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn create_trip_rejects_busy_vehicle() {
        let (_dir, storage, _trip) = loaded_fixture();
        let extra = sample_shipment(100.0, 1.0);
        storage.create_shipment(&extra).unwrap();

        let err = storage
            .create_trip_with_shipment(&sample_trip("AAA-111"), extra.id)
            .unwrap_err();
        assert!(matches!(err, StorageError::VehicleBusy(_)));
    }

    #[test]
    fn create_trip_rejects_missing_vehicle() {
        let (_dir, storage) = test_storage();
        let shipment = sample_shipment(100.0, 1.0);
        storage.create_shipment(&shipment).unwrap();

        let err = storage
            .create_trip_with_shipment(&sample_trip("NOPE-000"), shipment.id)
            .unwrap_err();
        assert!(matches!(err, StorageError::VehicleNotFound(_)));
    }

    #[test]
    fn join_bundles_second_shipment() {
        let (_dir, storage, trip) = loaded_fixture();
        let extra = sample_shipment(300.0, 1.0);
        storage.create_shipment(&extra).unwrap();

        storage.join_shipment(trip.id, extra.id).unwrap();

        assert_eq!(storage.bundled_shipments(trip.id).unwrap().len(), 2);
        let vehicle = storage.load_vehicle("AAA-111").unwrap();
        assert!((vehicle.available_weight_kg - 1200.0).abs() < 1e-9);
        let loaded = storage.load_shipment(extra.id).unwrap();
        assert_eq!(loaded.status, ShipmentStatus::Bundled);
    }

    #[test]
    fn join_over_weight_rolls_everything_back() {
        let (_dir, storage, trip) = loaded_fixture();
        // 1500 kg available after the seed shipment; this one needs 1600.
        let heavy = sample_shipment(1600.0, 1.0);
        storage.create_shipment(&heavy).unwrap();

        let err = storage.join_shipment(trip.id, heavy.id).unwrap_err();
        assert!(matches!(err, StorageError::JoinRejected { .. }));

        // Nothing changed: no relation, no decrement, shipment still pending.
        assert_eq!(storage.bundled_shipments(trip.id).unwrap().len(), 1);
        let vehicle = storage.load_vehicle("AAA-111").unwrap();
        assert!((vehicle.available_weight_kg - 1500.0).abs() < 1e-9);
        let loaded = storage.load_shipment(heavy.id).unwrap();
        assert_eq!(loaded.status, ShipmentStatus::Pending);
    }

    #[test]
    fn join_over_volume_rejected() {
        let (_dir, storage, trip) = loaded_fixture();
        // 2 m³ already bundled against a 10 m³ max.
        let bulky = sample_shipment(100.0, 9.0);
        storage.create_shipment(&bulky).unwrap();

        let err = storage.join_shipment(trip.id, bulky.id).unwrap_err();
        assert!(matches!(err, StorageError::JoinRejected { .. }));
    }

    #[test]
    fn join_exact_capacity_accepted() {
        let (_dir, storage, trip) = loaded_fixture();
        // Exactly the remaining 1500 kg: the guard is inclusive.
        let exact = sample_shipment(1500.0, 1.0);
        storage.create_shipment(&exact).unwrap();

        storage.join_shipment(trip.id, exact.id).unwrap();
        let vehicle = storage.load_vehicle("AAA-111").unwrap();
        assert!(vehicle.available_weight_kg.abs() < 1e-9);
    }

    #[test]
    fn join_rejects_non_pending_shipment() {
        let (_dir, storage, trip) = loaded_fixture();
        let bundled = &storage.bundled_shipments(trip.id).unwrap()[0];

        let err = storage.join_shipment(trip.id, bundled.id).unwrap_err();
        assert!(matches!(err, StorageError::JoinRejected { .. }));
    }

    #[test]
    fn join_rejects_departed_trip() {
        let (_dir, storage, trip) = loaded_fixture();
        storage.depart_trip(trip.id, Timestamp::now()).unwrap();

        let extra = sample_shipment(100.0, 1.0);
        storage.create_shipment(&extra).unwrap();
        let err = storage.join_shipment(trip.id, extra.id).unwrap_err();
        assert!(matches!(err, StorageError::JoinRejected { .. }));
    }

    #[test]
    fn join_missing_trip_fails() {
        let (_dir, storage) = test_storage();
        let shipment = sample_shipment(100.0, 1.0);
        storage.create_shipment(&shipment).unwrap();

        let err = storage.join_shipment(Uuid::new_v4(), shipment.id).unwrap_err();
        assert!(matches!(err, StorageError::TripNotFound(_)));
    }

    #[test]
    fn depart_moves_trip_and_vehicle() {
        let (_dir, storage, trip) = loaded_fixture();
        let departed_at = Timestamp::now();

        storage.depart_trip(trip.id, departed_at).unwrap();

        let loaded = storage.load_trip(trip.id).unwrap();
        assert_eq!(loaded.status, TripStatus::InProgress);
        assert_eq!(loaded.departed_at, Some(departed_at));
        let vehicle = storage.load_vehicle("AAA-111").unwrap();
        assert_eq!(vehicle.state, VehicleState::EnRoute);
    }

    #[test]
    fn depart_twice_conflicts() {
        let (_dir, storage, trip) = loaded_fixture();
        storage.depart_trip(trip.id, Timestamp::now()).unwrap();

        let err = storage.depart_trip(trip.id, Timestamp::now()).unwrap_err();
        assert!(matches!(err, StorageError::TripStateConflict { .. }));
    }

    #[test]
    fn complete_delivers_and_frees_the_vehicle() {
        let (_dir, storage, trip) = loaded_fixture();
        storage.depart_trip(trip.id, Timestamp::now()).unwrap();

        storage.complete_trip(trip.id).unwrap();

        let loaded = storage.load_trip(trip.id).unwrap();
        assert_eq!(loaded.status, TripStatus::Completed);
        assert!(!loaded.active);

        let bundled = storage.bundled_shipments(trip.id).unwrap();
        assert_eq!(bundled[0].status, ShipmentStatus::Delivered);

        let vehicle = storage.load_vehicle("AAA-111").unwrap();
        assert_eq!(vehicle.state, VehicleState::Available);
        assert!((vehicle.available_weight_kg - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn complete_requires_departure_first() {
        let (_dir, storage, trip) = loaded_fixture();
        let err = storage.complete_trip(trip.id).unwrap_err();
        assert!(matches!(err, StorageError::TripStateConflict { .. }));
    }

    #[test]
    fn open_trips_are_id_ordered_and_exclude_departed() {
        let (_dir, storage) = test_storage();
        for plate in ["AAA-111", "BBB-222", "CCC-333"] {
            storage.create_vehicle(&sample_vehicle(plate)).unwrap();
            let seed = sample_shipment(100.0, 1.0);
            storage.create_shipment(&seed).unwrap();
            storage
                .create_trip_with_shipment(&sample_trip(plate), seed.id)
                .unwrap();
        }
        let all = storage.list_trips().unwrap();
        assert_eq!(all.len(), 3);
        storage.depart_trip(all[0].id, Timestamp::now()).unwrap();

        let open = storage.list_open_trips().unwrap();
        assert_eq!(open.len(), 2);
        assert!(open[0].id < open[1].id);
    }
}
