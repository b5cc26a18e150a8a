//! Shipment commands: add, list.

use clap::{Subcommand, ValueEnum};
use jiff::Timestamp;
use jiff::civil;
use jiff::tz::TimeZone;
use uuid::Uuid;

use crate::config::Config;
use crate::model::{Shipment, ShipmentStatus};
use crate::storage::Storage;

use super::KindArg;
use super::format::{local_date, short_id};

#[derive(Debug, Subcommand)]
pub enum ShipmentCommand {
    /// Register a shipment. Prints the shipment ID.
    Add {
        /// Client the goods belong to.
        #[arg(long)]
        client: String,

        /// Weight in kilograms.
        #[arg(long)]
        weight: f64,

        /// Volume in cubic metres.
        #[arg(long)]
        volume: f64,

        /// Cargo kind: decides which vehicles can carry it.
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Delivery deadline: RFC 3339, or a civil `YYYY-MM-DDTHH:MM`
        /// taken in the configured reference timezone.
        #[arg(long)]
        deliver_by: String,

        /// What the goods are.
        description: String,
    },

    /// List shipments, optionally filtered by status.
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        /// Print the full records as JSON instead of the summary lines.
        #[arg(long)]
        json: bool,
    },
}

/// CLI-facing shipment status, mapped to the domain `ShipmentStatus`.
#[derive(Debug, Clone, ValueEnum)]
pub enum StatusArg {
    /// Awaiting assignment to a trip.
    Pending,
    /// Bundled into a trip.
    Bundled,
    /// Delivered to the client.
    Delivered,
}

impl StatusArg {
    fn to_domain(&self) -> ShipmentStatus {
        match self {
            Self::Pending => ShipmentStatus::Pending,
            Self::Bundled => ShipmentStatus::Bundled,
            Self::Delivered => ShipmentStatus::Delivered,
        }
    }
}

pub(super) fn run(
    config: &Config,
    storage: &Storage,
    command: ShipmentCommand,
) -> Result<(), String> {
    match command {
        ShipmentCommand::Add {
            client,
            weight,
            volume,
            kind,
            deliver_by,
            description,
        } => cmd_add(config, storage, client, weight, volume, &kind, &deliver_by, description),
        ShipmentCommand::List { status, json } => cmd_list(config, storage, status.as_ref(), json),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_add(
    config: &Config,
    storage: &Storage,
    client: String,
    weight: f64,
    volume: f64,
    kind: &KindArg,
    deliver_by: &str,
    description: String,
) -> Result<(), String> {
    let deliver_by = parse_deliver_by(config, deliver_by)?;

    let shipment = Shipment {
        id: Uuid::new_v4(),
        client,
        weight_kg: weight,
        volume_m3: volume,
        description,
        kind: kind.to_domain(),
        deliver_by,
        status: ShipmentStatus::Pending,
        created_at: Timestamp::now(),
    };
    shipment.validate().map_err(|e| e.to_string())?;

    storage
        .create_shipment(&shipment)
        .map_err(|e| format!("failed to create shipment: {e}"))?;

    println!("{}", shipment.id);
    Ok(())
}

fn cmd_list(
    config: &Config,
    storage: &Storage,
    status: Option<&StatusArg>,
    json: bool,
) -> Result<(), String> {
    let shipments = storage
        .list_shipments(status.map(StatusArg::to_domain))
        .map_err(|e| format!("failed to list shipments: {e}"))?;

    if json {
        let out = serde_json::to_string_pretty(&shipments)
            .map_err(|e| format!("failed to serialize shipments: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    if shipments.is_empty() {
        println!("No shipments");
        return Ok(());
    }

    let tz = reference_timezone(config)?;
    for s in &shipments {
        println!(
            "{}  [{}] [{}]  {:.0} kg  {:.1} m³  deliver by {}  {}",
            short_id(s.id),
            s.status.as_str(),
            s.kind.as_str(),
            s.weight_kg,
            s.volume_m3,
            local_date(&tz, s.deliver_by),
            s.client,
        );
    }

    Ok(())
}

/// Parse a delivery deadline: a full RFC 3339 instant, or a civil datetime
/// interpreted in the reference timezone.
fn parse_deliver_by(config: &Config, value: &str) -> Result<Timestamp, String> {
    if let Ok(ts) = value.parse::<Timestamp>() {
        return Ok(ts);
    }

    let dt = value.parse::<civil::DateTime>().map_err(|_| {
        format!("invalid deliver-by '{value}': expected RFC 3339 or YYYY-MM-DDTHH:MM")
    })?;
    let tz = reference_timezone(config)?;
    let zoned = dt
        .to_zoned(tz)
        .map_err(|e| format!("invalid deliver-by '{value}': {e}"))?;
    Ok(zoned.timestamp())
}

fn reference_timezone(config: &Config) -> Result<TimeZone, String> {
    TimeZone::get(&config.timezone)
        .map_err(|e| format!("unknown timezone '{}': {e}", config.timezone))
}
