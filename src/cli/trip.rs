//! Trip commands: list, show, join, depart, complete.

use clap::Subcommand;
use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::config::Config;
use crate::model::Trip;
use crate::storage::{Storage, StorageError};

use super::format::{coords, local_date, local_datetime, short_id};

#[derive(Debug, Subcommand)]
pub enum TripCommand {
    /// List trips. Only trips open for loading unless --all.
    List {
        #[arg(long)]
        all: bool,
    },

    /// Show a trip with its bundled shipments.
    Show {
        /// Trip ID: full UUID or unambiguous prefix.
        trip: String,

        /// Print the full record as JSON instead of the summary.
        #[arg(long)]
        json: bool,
    },

    /// Bundle a pending shipment into an open trip.
    ///
    /// This is the operator's pick among the candidates `assign` listed.
    /// The capacity commitment and the bundling are one transaction.
    Join {
        /// Trip ID: full UUID or unambiguous prefix.
        trip: String,

        /// Shipment ID: full UUID or unambiguous prefix.
        shipment: String,
    },

    /// Record departure. The trip closes to new shipments.
    Depart {
        /// Trip ID: full UUID or unambiguous prefix.
        trip: String,
    },

    /// Record completion. Shipments are delivered and the vehicle freed.
    Complete {
        /// Trip ID: full UUID or unambiguous prefix.
        trip: String,
    },
}

pub(super) fn run(config: &Config, storage: &Storage, command: TripCommand) -> Result<(), String> {
    match command {
        TripCommand::List { all } => cmd_list(config, storage, all),
        TripCommand::Show { trip, json } => cmd_show(config, storage, &trip, json),
        TripCommand::Join { trip, shipment } => cmd_join(storage, &trip, &shipment),
        TripCommand::Depart { trip } => cmd_depart(storage, &trip),
        TripCommand::Complete { trip } => cmd_complete(storage, &trip),
    }
}

fn reference_timezone(config: &Config) -> Result<TimeZone, String> {
    TimeZone::get(&config.timezone)
        .map_err(|e| format!("unknown timezone '{}': {e}", config.timezone))
}

fn print_trip_line(tz: &TimeZone, trip: &Trip) {
    println!(
        "{}  [{}]  {}  deliver by {}  {} -> {}",
        short_id(trip.id),
        trip.status.as_str(),
        trip.vehicle_plate,
        local_date(tz, trip.deliver_by),
        coords(trip.origin),
        coords(trip.destination),
    );
}

fn cmd_list(config: &Config, storage: &Storage, all: bool) -> Result<(), String> {
    let trips = if all {
        storage.list_trips()
    } else {
        storage.list_open_trips()
    }
    .map_err(|e| format!("failed to list trips: {e}"))?;

    if trips.is_empty() {
        println!("No trips");
        return Ok(());
    }

    let tz = reference_timezone(config)?;
    for trip in &trips {
        print_trip_line(&tz, trip);
    }

    Ok(())
}

fn cmd_show(config: &Config, storage: &Storage, reference: &str, json: bool) -> Result<(), String> {
    let trip = super::resolve_trip(storage, reference)?;
    let shipments = storage
        .bundled_shipments(trip.id)
        .map_err(|e| format!("failed to load shipments: {e}"))?;

    if json {
        let out = serde_json::json!({ "trip": trip, "shipments": shipments });
        let out = serde_json::to_string_pretty(&out)
            .map_err(|e| format!("failed to serialize trip: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    let tz = reference_timezone(config)?;
    print_trip_line(&tz, &trip);
    if let Some(departed_at) = trip.departed_at {
        println!("departed {}", local_datetime(&tz, departed_at));
    }
    if !trip.notes.is_empty() {
        println!("notes: {}", trip.notes);
    }

    let total_weight: f64 = shipments.iter().map(|s| s.weight_kg).sum();
    let total_volume: f64 = shipments.iter().map(|s| s.volume_m3).sum();
    println!(
        "{} shipment(s), {total_weight:.0} kg, {total_volume:.1} m³:",
        shipments.len()
    );
    for s in &shipments {
        println!(
            "  {}  [{}]  {:.0} kg  {:.1} m³  {}",
            short_id(s.id),
            s.status.as_str(),
            s.weight_kg,
            s.volume_m3,
            s.client,
        );
    }

    Ok(())
}

fn cmd_join(storage: &Storage, trip_ref: &str, shipment_ref: &str) -> Result<(), String> {
    let trip = super::resolve_trip(storage, trip_ref)?;
    let shipment = super::resolve_shipment(storage, shipment_ref)?;

    match storage.join_shipment(trip.id, shipment.id) {
        Ok(()) => {
            eprintln!(
                "Shipment {} bundled into trip {}",
                short_id(shipment.id),
                short_id(trip.id)
            );
            Ok(())
        }
        // The transaction rejected the join cleanly: nothing was written.
        Err(e @ StorageError::JoinRejected { .. }) => Err(e.to_string()),
        // The store itself failed mid-transaction. SQLite rolls back, but
        // tell the operator to look before retrying.
        Err(e @ (StorageError::Sqlite(_) | StorageError::Io(_))) => Err(format!(
            "join transaction failed; review trip, shipment, and vehicle state before retrying: {e}"
        )),
        Err(e) => Err(e.to_string()),
    }
}

fn cmd_depart(storage: &Storage, reference: &str) -> Result<(), String> {
    let trip = super::resolve_trip(storage, reference)?;
    storage
        .depart_trip(trip.id, Timestamp::now())
        .map_err(|e| e.to_string())?;
    eprintln!("Trip {} departed", short_id(trip.id));
    Ok(())
}

fn cmd_complete(storage: &Storage, reference: &str) -> Result<(), String> {
    let trip = super::resolve_trip(storage, reference)?;
    storage.complete_trip(trip.id).map_err(|e| e.to_string())?;
    eprintln!("Trip {} completed", short_id(trip.id));
    Ok(())
}
