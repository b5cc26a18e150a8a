//! Alert and location commands: tracker-reported data.

use clap::Subcommand;
use jiff::Timestamp;
use jiff::tz::TimeZone;
use uuid::Uuid;

use crate::config::Config;
use crate::model::{Alert, Coordinates, LocationFix};
use crate::storage::Storage;

use super::format::{coords, local_datetime};

#[derive(Debug, Subcommand)]
pub enum AlertCommand {
    /// Raise an emergency alert from a tracker.
    Raise {
        /// Tracker folio, as installed in the vehicle.
        tracker: String,

        /// Position as `lat,lon` in decimal degrees.
        #[arg(long, value_parser = super::parse_coordinates)]
        position: Coordinates,
    },

    /// List alerts, newest first.
    List,
}

#[derive(Debug, Subcommand)]
pub enum LocationCommand {
    /// Record a GPS fix reported by a tracker.
    Record {
        /// Tracker folio, as installed in the vehicle.
        tracker: String,

        /// Position as `lat,lon` in decimal degrees.
        #[arg(long, value_parser = super::parse_coordinates)]
        position: Coordinates,
    },
}

pub(super) fn run(config: &Config, storage: &Storage, command: AlertCommand) -> Result<(), String> {
    match command {
        AlertCommand::Raise { tracker, position } => cmd_raise(storage, tracker, position),
        AlertCommand::List => cmd_list(config, storage),
    }
}

pub(super) fn run_location(storage: &Storage, command: LocationCommand) -> Result<(), String> {
    match command {
        LocationCommand::Record { tracker, position } => {
            let fix = LocationFix {
                tracker,
                position,
                recorded_at: Timestamp::now(),
            };
            storage
                .record_fix(&fix)
                .map_err(|e| format!("failed to record fix: {e}"))?;
            eprintln!("Fix recorded for tracker {}", fix.tracker);
            Ok(())
        }
    }
}

fn cmd_raise(storage: &Storage, tracker: String, position: Coordinates) -> Result<(), String> {
    let alert = Alert {
        id: Uuid::new_v4(),
        tracker,
        position,
        raised_at: Timestamp::now(),
    };
    storage
        .record_alert(&alert)
        .map_err(|e| format!("failed to record alert: {e}"))?;

    println!("{}", alert.id);
    eprintln!(
        "Emergency alert from tracker {} at {}",
        alert.tracker,
        coords(alert.position)
    );
    Ok(())
}

fn cmd_list(config: &Config, storage: &Storage) -> Result<(), String> {
    let alerts = storage
        .list_alerts()
        .map_err(|e| format!("failed to list alerts: {e}"))?;

    if alerts.is_empty() {
        println!("No alerts");
        return Ok(());
    }

    let tz = TimeZone::get(&config.timezone)
        .map_err(|e| format!("unknown timezone '{}': {e}", config.timezone))?;
    for a in &alerts {
        println!(
            "{}  tracker {}  {}  {}",
            local_datetime(&tz, a.raised_at),
            a.tracker,
            coords(a.position),
            super::format::short_id(a.id),
        );
    }

    Ok(())
}
