//! Alert and location-fix storage.
//!
//! Both tables are append-only from the application's point of view:
//! trackers report, operators read.

use rusqlite::params;
use uuid::Uuid;

use crate::model::{Alert, Coordinates, LocationFix};

use super::{Result, Storage, parse_timestamp, parse_uuid};

impl Storage {
    /// Records an emergency alert.
    pub fn record_alert(&self, alert: &Alert) -> Result<()> {
        self.conn.execute(
            "INSERT INTO alert (id, tracker, lat, lon, raised_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                alert.id.to_string(),
                &alert.tracker,
                alert.position.lat,
                alert.position.lon,
                alert.raised_at.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Lists alerts, newest first.
    pub fn list_alerts(&self) -> Result<Vec<Alert>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, tracker, lat, lon, raised_at FROM alert")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut alerts = Vec::new();
        for raw in rows {
            let (id, tracker, lat, lon, raised_at) = raw?;
            alerts.push(Alert {
                id: parse_uuid("alert id", &id)?,
                tracker,
                position: Coordinates { lat, lon },
                raised_at: parse_timestamp("raised_at", &raised_at)?,
            });
        }
        alerts.sort_by(|a, b| b.raised_at.cmp(&a.raised_at));
        Ok(alerts)
    }

    /// Records a GPS fix reported by a tracker.
    pub fn record_fix(&self, fix: &LocationFix) -> Result<()> {
        self.conn.execute(
            "INSERT INTO location_fix (tracker, lat, lon, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                &fix.tracker,
                fix.position.lat,
                fix.position.lon,
                fix.recorded_at.to_string(),
            ],
        )?;
        Ok(())
    }

    /// The most recent fix for a tracker, if it has ever reported.
    pub fn last_fix(&self, tracker: &str) -> Result<Option<LocationFix>> {
        let mut stmt = self.conn.prepare(
            "SELECT tracker, lat, lon, recorded_at FROM location_fix WHERE tracker = ?1",
        )?;
        let rows = stmt.query_map([tracker], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut latest: Option<LocationFix> = None;
        for raw in rows {
            let (tracker, lat, lon, recorded_at) = raw?;
            let fix = LocationFix {
                tracker,
                position: Coordinates { lat, lon },
                recorded_at: parse_timestamp("recorded_at", &recorded_at)?,
            };
            if latest
                .as_ref()
                .is_none_or(|l| fix.recorded_at > l.recorded_at)
            {
                latest = Some(fix);
            }
        }
        Ok(latest)
    }
}
