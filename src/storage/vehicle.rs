//! Vehicle storage: registration, lookup, update, retirement, and the
//! dispatch query that picks a vehicle for a new trip.

use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use crate::model::{CargoKind, Vehicle, VehicleState};

use super::{Result, Storage, StorageError, parse_cargo_kind, parse_uuid};

const VEHICLE_COLUMNS: &str = "plate, make, model, max_weight_kg, max_volume_m3, \
     available_weight_kg, available_volume_m3, kind, state, driver_id, tracker, active";

/// Raw column values in `VEHICLE_COLUMNS` order.
type VehicleRow = (
    String,
    String,
    String,
    f64,
    f64,
    f64,
    f64,
    String,
    String,
    Option<String>,
    Option<String>,
    bool,
);

fn read_vehicle(row: &rusqlite::Row<'_>) -> rusqlite::Result<VehicleRow> {
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

fn vehicle_from_row(raw: VehicleRow) -> Result<Vehicle> {
    let (
        plate,
        make,
        model,
        max_weight_kg,
        max_volume_m3,
        available_weight_kg,
        available_volume_m3,
        kind,
        state,
        driver_id,
        tracker,
        active,
    ) = raw;
    let driver = match driver_id {
        Some(id) => Some(parse_uuid("driver id", &id)?),
        None => None,
    };
    Ok(Vehicle {
        plate,
        make,
        model,
        max_weight_kg,
        max_volume_m3,
        available_weight_kg,
        available_volume_m3,
        kind: parse_cargo_kind(&kind)?,
        state: parse_state(&state)?,
        driver,
        tracker,
        active,
    })
}

fn parse_state(value: &str) -> Result<VehicleState> {
    match value {
        "maintenance" => Ok(VehicleState::Maintenance),
        "available" => Ok(VehicleState::Available),
        "en-route" => Ok(VehicleState::EnRoute),
        "decommissioned" => Ok(VehicleState::Decommissioned),
        other => Err(StorageError::Corrupt(format!(
            "unknown vehicle state: {other}"
        ))),
    }
}

impl Storage {
    /// Registers a new vehicle. Plates are unique.
    pub fn create_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT plate FROM vehicle WHERE plate = ?1",
                [&vehicle.plate],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(StorageError::VehicleAlreadyExists(vehicle.plate.clone()));
        }
        self.conn.execute(
            "INSERT INTO vehicle (plate, make, model, max_weight_kg, max_volume_m3, \
             available_weight_kg, available_volume_m3, kind, state, driver_id, tracker, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                &vehicle.plate,
                &vehicle.make,
                &vehicle.model,
                vehicle.max_weight_kg,
                vehicle.max_volume_m3,
                vehicle.available_weight_kg,
                vehicle.available_volume_m3,
                vehicle.kind.as_str(),
                vehicle.state.as_str(),
                vehicle.driver.map(|id| id.to_string()),
                &vehicle.tracker,
                vehicle.active,
            ],
        )?;
        Ok(())
    }

    /// Loads a single vehicle by plate.
    pub fn load_vehicle(&self, plate: &str) -> Result<Vehicle> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {VEHICLE_COLUMNS} FROM vehicle WHERE plate = ?1"),
                [plate],
                read_vehicle,
            )
            .optional()?
            .ok_or_else(|| StorageError::VehicleNotFound(plate.to_string()))?;
        vehicle_from_row(raw)
    }

    /// Lists vehicles ordered by plate. Retired vehicles are excluded
    /// unless `include_retired` is set.
    pub fn list_vehicles(&self, include_retired: bool) -> Result<Vec<Vehicle>> {
        let sql = if include_retired {
            format!("SELECT {VEHICLE_COLUMNS} FROM vehicle ORDER BY plate")
        } else {
            format!("SELECT {VEHICLE_COLUMNS} FROM vehicle WHERE active = 1 ORDER BY plate")
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_vehicle)?;
        let mut vehicles = Vec::new();
        for raw in rows {
            vehicles.push(vehicle_from_row(raw?)?);
        }
        Ok(vehicles)
    }

    /// Updates a vehicle's descriptive fields.
    ///
    /// Available capacity is owned by the trip transactions and is left
    /// untouched here.
    pub fn update_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE vehicle
             SET make = ?1, model = ?2, max_weight_kg = ?3, max_volume_m3 = ?4,
                 kind = ?5, state = ?6, driver_id = ?7, tracker = ?8
             WHERE plate = ?9",
            params![
                &vehicle.make,
                &vehicle.model,
                vehicle.max_weight_kg,
                vehicle.max_volume_m3,
                vehicle.kind.as_str(),
                vehicle.state.as_str(),
                vehicle.driver.map(|id| id.to_string()),
                &vehicle.tracker,
                &vehicle.plate,
            ],
        )?;
        if rows == 0 {
            return Err(StorageError::VehicleNotFound(vehicle.plate.clone()));
        }
        Ok(())
    }

    /// Assigns or clears the vehicle's driver.
    pub fn set_driver(&self, plate: &str, driver: Option<Uuid>) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE vehicle SET driver_id = ?1 WHERE plate = ?2",
            params![driver.map(|id| id.to_string()), plate],
        )?;
        if rows == 0 {
            return Err(StorageError::VehicleNotFound(plate.to_string()));
        }
        Ok(())
    }

    /// Retires a vehicle: logical delete, kept for history.
    pub fn retire_vehicle(&self, plate: &str) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE vehicle SET active = 0, state = 'decommissioned' WHERE plate = ?1",
            [plate],
        )?;
        if rows == 0 {
            return Err(StorageError::VehicleNotFound(plate.to_string()));
        }
        Ok(())
    }

    /// Picks a vehicle able to take a new trip for the given load:
    /// active, available, matching cargo kind, enough uncommitted weight
    /// and volume capacity, and no active trip already on it. Ordered by
    /// plate so the choice is deterministic.
    pub fn find_vehicle_for(
        &self,
        kind: CargoKind,
        weight_kg: f64,
        volume_m3: f64,
    ) -> Result<Option<Vehicle>> {
        let raw = self
            .conn
            .query_row(
                &format!(
                    "SELECT {VEHICLE_COLUMNS} FROM vehicle
                     WHERE active = 1
                       AND state = 'available'
                       AND kind = ?1
                       AND available_weight_kg >= ?2
                       AND max_volume_m3 >= ?3
                       AND NOT EXISTS (
                           SELECT 1 FROM trip
                           WHERE trip.vehicle_plate = vehicle.plate AND trip.active = 1
                       )
                     ORDER BY plate
                     LIMIT 1"
                ),
                params![kind.as_str(), weight_kg, volume_m3],
                read_vehicle,
            )
            .optional()?;
        raw.map(vehicle_from_row).transpose()
    }
}
