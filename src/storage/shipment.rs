//! Shipment storage: create, load, and list.
//!
//! Status transitions are owned by the trip transactions in
//! `storage::trip`; nothing here mutates a shipment after creation.

use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use crate::model::{Shipment, ShipmentStatus};

use super::{Result, Storage, StorageError, parse_cargo_kind, parse_timestamp, parse_uuid};

pub(super) const SHIPMENT_COLUMNS: &str =
    "id, client, weight_kg, volume_m3, description, kind, deliver_by, status, created_at";

/// Raw column values in `SHIPMENT_COLUMNS` order.
pub(super) type ShipmentRow = (
    String,
    String,
    f64,
    f64,
    String,
    String,
    String,
    String,
    String,
);

pub(super) fn read_shipment(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShipmentRow> {
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
    ))
}

pub(super) fn shipment_from_row(raw: ShipmentRow) -> Result<Shipment> {
    let (id, client, weight_kg, volume_m3, description, kind, deliver_by, status, created_at) = raw;
    Ok(Shipment {
        id: parse_uuid("shipment id", &id)?,
        client,
        weight_kg,
        volume_m3,
        description,
        kind: parse_cargo_kind(&kind)?,
        deliver_by: parse_timestamp("deliver_by", &deliver_by)?,
        status: parse_status(&status)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

fn parse_status(value: &str) -> Result<ShipmentStatus> {
    match value {
        "pending" => Ok(ShipmentStatus::Pending),
        "bundled" => Ok(ShipmentStatus::Bundled),
        "delivered" => Ok(ShipmentStatus::Delivered),
        other => Err(StorageError::Corrupt(format!(
            "unknown shipment status: {other}"
        ))),
    }
}

impl Storage {
    /// Persists a new pending shipment.
    pub fn create_shipment(&self, shipment: &Shipment) -> Result<()> {
        self.conn.execute(
            "INSERT INTO shipment (id, client, weight_kg, volume_m3, description, kind, deliver_by, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                shipment.id.to_string(),
                &shipment.client,
                shipment.weight_kg,
                shipment.volume_m3,
                &shipment.description,
                shipment.kind.as_str(),
                shipment.deliver_by.to_string(),
                shipment.status.as_str(),
                shipment.created_at.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Loads a single shipment.
    pub fn load_shipment(&self, id: Uuid) -> Result<Shipment> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {SHIPMENT_COLUMNS} FROM shipment WHERE id = ?1"),
                [id.to_string()],
                read_shipment,
            )
            .optional()?
            .ok_or(StorageError::ShipmentNotFound(id))?;
        shipment_from_row(raw)
    }

    /// Lists shipments, oldest first, optionally filtered by status.
    pub fn list_shipments(&self, status: Option<ShipmentStatus>) -> Result<Vec<Shipment>> {
        let mut stmt;
        let rows = match status {
            Some(status) => {
                stmt = self.conn.prepare(&format!(
                    "SELECT {SHIPMENT_COLUMNS} FROM shipment WHERE status = ?1"
                ))?;
                stmt.query_map([status.as_str()], read_shipment)?
            }
            None => {
                stmt = self
                    .conn
                    .prepare(&format!("SELECT {SHIPMENT_COLUMNS} FROM shipment"))?;
                stmt.query_map([], read_shipment)?
            }
        };
        let mut shipments = Vec::new();
        for raw in rows {
            shipments.push(shipment_from_row(raw?)?);
        }
        shipments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(shipments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use tempfile::TempDir;

    use crate::model::CargoKind;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("fleet")).unwrap();
        (dir, storage)
    }

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
    fn create_and_load_shipment() {
        let (_dir, storage) = test_storage();
        let shipment = sample_shipment();

        storage.create_shipment(&shipment).unwrap();
        let loaded = storage.load_shipment(shipment.id).unwrap();

        assert_eq!(loaded.id, shipment.id);
        assert_eq!(loaded.client, shipment.client);
        assert_eq!(loaded.kind, CargoKind::Dry);
        assert_eq!(loaded.status, ShipmentStatus::Pending);
        assert!((loaded.weight_kg - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_nonexistent_shipment_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.load_shipment(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StorageError::ShipmentNotFound(_)));
    }

    #[test]
    fn list_filters_by_status() {
        let (_dir, storage) = test_storage();
        let pending = sample_shipment();
        storage.create_shipment(&pending).unwrap();
        let mut delivered = sample_shipment();
        delivered.status = ShipmentStatus::Delivered;
        storage.create_shipment(&delivered).unwrap();

        let all = storage.list_shipments(None).unwrap();
        assert_eq!(all.len(), 2);

        let only_pending = storage
            .list_shipments(Some(ShipmentStatus::Pending))
            .unwrap();
        assert_eq!(only_pending.len(), 1);
        assert_eq!(only_pending[0].id, pending.id);
    }

    #[test]
    fn list_is_oldest_first() {
        let (_dir, storage) = test_storage();
        let mut first = sample_shipment();
        first.created_at = Timestamp::new(1_000_000_000, 0).unwrap();
        let mut second = sample_shipment();
        second.created_at = Timestamp::new(2_000_000_000, 0).unwrap();

        // Create in reverse order to verify sorting.
        storage.create_shipment(&second).unwrap();
        storage.create_shipment(&first).unwrap();

        let shipments = storage.list_shipments(None).unwrap();
        assert_eq!(shipments[0].id, first.id);
        assert_eq!(shipments[1].id, second.id);
    }
}
