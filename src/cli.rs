//! CLI interface for Flotilla.
//!
//! Designed for dispatch operators and scripts alike. Each subcommand is
//! non-interactive: arguments in, structured output out. IDs print to
//! stdout; human-readable summaries go to stderr.
//!
//! Commands split by area:
//!
//! - `flotilla user|vehicle|shipment` — registry management.
//! - `flotilla assign` — find a trip for a pending shipment.
//! - `flotilla trip` — inspect and advance trips.
//! - `flotilla alert|location` — tracker-reported data.
//!
//! References to users, shipments, and trips take a full UUID or an
//! unambiguous prefix; vehicles go by plate.

mod alert;
mod format;
mod shipment;
mod trip;
mod user;
mod vehicle;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::dispatch::{self, Assignment, DispatchPolicy};
use crate::model::{CargoKind, Coordinates, Shipment, Trip, User};
use crate::storage::Storage;

use format::short_id;

/// Flotilla — run the fleet.
#[derive(Debug, Parser)]
#[command(name = "flotilla", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: moving a shipment
  1. flotilla shipment add --client "Acme Foods" --weight 500 --volume 2 \
       --kind dry --deliver-by 2025-03-24T10:00 "Palletized canned goods"
     → prints a shipment ID (e.g. 7c0d2a31)
  2. flotilla assign 7c0 --origin 19.4326,-99.1332 --dest 20.6597,-103.3496
     → lists compatible open trips, or opens a new trip
  3. flotilla trip join <trip> 7c0     (when candidates were listed)
  4. flotilla trip depart <trip>
  5. flotilla trip complete <trip>"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage users: admins and drivers.
    User {
        #[command(subcommand)]
        command: user::UserCommand,
    },

    /// Manage the vehicle fleet.
    Vehicle {
        #[command(subcommand)]
        command: vehicle::VehicleCommand,
    },

    /// Manage shipments.
    Shipment {
        #[command(subcommand)]
        command: shipment::ShipmentCommand,
    },

    /// Find a trip for a pending shipment, or open a new one.
    ///
    /// Every compatible open trip is listed for the operator to choose
    /// from — the system does not pick one. When none exists, a vehicle is
    /// selected and a new trip opened with the shipment already bundled.
    Assign {
        /// Shipment ID: full UUID or unambiguous prefix.
        shipment: String,

        /// Pickup point as `lat,lon` in decimal degrees.
        #[arg(long, value_parser = parse_coordinates)]
        origin: Coordinates,

        /// Drop-off point as `lat,lon` in decimal degrees.
        #[arg(long = "dest", value_parser = parse_coordinates)]
        destination: Coordinates,
    },

    /// Inspect and advance trips.
    Trip {
        #[command(subcommand)]
        command: trip::TripCommand,
    },

    /// Emergency alerts raised from vehicle trackers.
    Alert {
        #[command(subcommand)]
        command: alert::AlertCommand,
    },

    /// GPS fixes reported by vehicle trackers.
    Location {
        #[command(subcommand)]
        command: alert::LocationCommand,
    },
}

/// CLI-facing cargo kind, mapped to the domain `CargoKind`.
#[derive(Debug, Clone, ValueEnum)]
pub enum KindArg {
    /// General dry freight in a closed box.
    Dry,
    /// Temperature-controlled freight.
    Refrigerated,
    /// Freight carried on an open flatbed.
    Flatbed,
    /// Oversized freight on a lowboy platform.
    Lowboy,
}

impl KindArg {
    fn to_domain(&self) -> CargoKind {
        match self {
            Self::Dry => CargoKind::Dry,
            Self::Refrigerated => CargoKind::Refrigerated,
            Self::Flatbed => CargoKind::Flatbed,
            Self::Lowboy => CargoKind::Lowboy,
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, storage: &Storage) -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::User { command } => user::run(storage, command),
        Command::Vehicle { command } => vehicle::run(config, storage, command),
        Command::Shipment { command } => shipment::run(config, storage, command),
        Command::Assign {
            shipment,
            origin,
            destination,
        } => cmd_assign(config, storage, &shipment, origin, destination),
        Command::Trip { command } => trip::run(config, storage, command),
        Command::Alert { command } => alert::run(config, storage, command),
        Command::Location { command } => alert::run_location(storage, command),
    }
}

fn cmd_assign(
    config: &Config,
    storage: &Storage,
    shipment_ref: &str,
    origin: Coordinates,
    destination: Coordinates,
) -> Result<(), String> {
    let policy = DispatchPolicy::from_config(config)?;
    let shipment = resolve_shipment(storage, shipment_ref)?;

    match dispatch::assign(storage, &policy, shipment.id, origin, destination) {
        Ok(Assignment::Candidates(trips)) => {
            eprintln!(
                "{} compatible open trip(s) for shipment {}:",
                trips.len(),
                short_id(shipment.id)
            );
            for t in &trips {
                println!(
                    "{}  [{}]  deliver by {}  {} -> {}",
                    short_id(t.id),
                    t.vehicle_plate,
                    format::local_date(&policy.timezone, t.deliver_by),
                    format::coords(t.origin),
                    format::coords(t.destination),
                );
            }
            eprintln!();
            eprintln!(
                "Join one with: flotilla trip join <trip> {}",
                short_id(shipment.id)
            );
            Ok(())
        }
        Ok(Assignment::Created(trip)) => {
            println!("{}", trip.id);
            eprintln!(
                "No compatible open trip. Opened trip {} on vehicle {} with the shipment bundled.",
                short_id(trip.id),
                trip.vehicle_plate
            );
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Parse a `lat,lon` pair in decimal degrees.
fn parse_coordinates(value: &str) -> Result<Coordinates, String> {
    let Some((lat, lon)) = value.split_once(',') else {
        return Err("expected `lat,lon` in decimal degrees".to_string());
    };
    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid latitude: {e}"))?;
    let lon = lon
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid longitude: {e}"))?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} is out of range"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude {lon} is out of range"));
    }
    Ok(Coordinates { lat, lon })
}

/// Resolve a shipment reference (full UUID or unambiguous prefix).
fn resolve_shipment(storage: &Storage, reference: &str) -> Result<Shipment, String> {
    if let Ok(id) = reference.parse::<uuid::Uuid>() {
        return storage
            .load_shipment(id)
            .map_err(|e| format!("shipment not found: {e}"));
    }

    let shipments = storage
        .list_shipments(None)
        .map_err(|e| format!("failed to list shipments: {e}"))?;
    match_prefix(shipments, reference, "shipment", |s| s.id)
}

/// Resolve a trip reference (full UUID or unambiguous prefix).
fn resolve_trip(storage: &Storage, reference: &str) -> Result<Trip, String> {
    if let Ok(id) = reference.parse::<uuid::Uuid>() {
        return storage
            .load_trip(id)
            .map_err(|e| format!("trip not found: {e}"));
    }

    let trips = storage
        .list_trips()
        .map_err(|e| format!("failed to list trips: {e}"))?;
    match_prefix(trips, reference, "trip", |t| t.id)
}

/// Resolve a user reference (full UUID or unambiguous prefix).
fn resolve_user(storage: &Storage, reference: &str) -> Result<User, String> {
    if let Ok(id) = reference.parse::<uuid::Uuid>() {
        return storage
            .load_user(id)
            .map_err(|e| format!("user not found: {e}"));
    }

    let users = storage
        .list_users()
        .map_err(|e| format!("failed to list users: {e}"))?;
    match_prefix(users, reference, "user", |u| u.id)
}

/// Prefix-match a reference against a listing, requiring uniqueness.
fn match_prefix<T>(
    items: Vec<T>,
    reference: &str,
    noun: &str,
    id_of: impl Fn(&T) -> uuid::Uuid,
) -> Result<T, String> {
    let mut matches: Vec<T> = items
        .into_iter()
        .filter(|item| id_of(item).to_string().starts_with(reference))
        .collect();

    match matches.len() {
        0 => Err(format!("no {noun} matching '{reference}'")),
        1 => Ok(matches.remove(0)),
        n => {
            let ids: Vec<String> = matches.iter().map(|item| short_id(id_of(item))).collect();
            Err(format!(
                "'{reference}' is ambiguous — matches {n} {noun}s: {}",
                ids.join(", ")
            ))
        }
    }
}
