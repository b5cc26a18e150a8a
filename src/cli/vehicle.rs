//! Vehicle commands: add, list, update, assign-driver, retire, locate.

use clap::{Subcommand, ValueEnum};
use jiff::tz::TimeZone;

use crate::config::Config;
use crate::model::{Role, Vehicle, VehicleState};
use crate::storage::Storage;

use super::KindArg;
use super::format::{coords, local_datetime, short_id};

#[derive(Debug, Subcommand)]
pub enum VehicleCommand {
    /// Register a vehicle.
    Add {
        /// License plate, e.g. `ABC-123-D`.
        plate: String,

        #[arg(long)]
        make: String,

        #[arg(long)]
        model: String,

        /// Maximum payload weight in kilograms.
        #[arg(long)]
        max_weight: f64,

        /// Maximum payload volume in cubic metres.
        #[arg(long)]
        max_volume: f64,

        /// Cargo kind the body supports.
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Initial state. Defaults to available.
        #[arg(long, value_enum)]
        state: Option<StateArg>,

        /// Driver user ID: full UUID or unambiguous prefix.
        #[arg(long)]
        driver: Option<String>,

        /// Folio of the IoT tracker installed in the cab.
        #[arg(long)]
        tracker: Option<String>,
    },

    /// List vehicles. Retired vehicles are hidden unless --all.
    List {
        #[arg(long)]
        all: bool,

        /// Print the full records as JSON instead of the summary lines.
        #[arg(long)]
        json: bool,
    },

    /// Update a vehicle's descriptive fields. Only the given flags change.
    Update {
        plate: String,

        #[arg(long)]
        make: Option<String>,

        #[arg(long)]
        model: Option<String>,

        /// Maximum payload weight in kilograms.
        #[arg(long)]
        max_weight: Option<f64>,

        /// Maximum payload volume in cubic metres.
        #[arg(long)]
        max_volume: Option<f64>,

        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        #[arg(long, value_enum)]
        state: Option<StateArg>,

        #[arg(long)]
        tracker: Option<String>,
    },

    /// Assign a driver to a vehicle, or clear it when --driver is omitted.
    AssignDriver {
        plate: String,

        /// Driver user ID: full UUID or unambiguous prefix.
        #[arg(long)]
        driver: Option<String>,
    },

    /// Retire a vehicle: hidden from dispatch, kept for history.
    Retire { plate: String },

    /// Show a vehicle's last reported position.
    Locate { plate: String },
}

/// CLI-facing vehicle state, mapped to the domain `VehicleState`.
#[derive(Debug, Clone, ValueEnum)]
pub enum StateArg {
    /// In the shop; not dispatchable.
    Maintenance,
    /// Ready to take a trip.
    Available,
    /// Out on an in-progress trip.
    EnRoute,
}

impl StateArg {
    fn to_domain(&self) -> VehicleState {
        match self {
            Self::Maintenance => VehicleState::Maintenance,
            Self::Available => VehicleState::Available,
            Self::EnRoute => VehicleState::EnRoute,
        }
    }
}

pub(super) fn run(config: &Config, storage: &Storage, command: VehicleCommand) -> Result<(), String> {
    match command {
        VehicleCommand::Add {
            plate,
            make,
            model,
            max_weight,
            max_volume,
            kind,
            state,
            driver,
            tracker,
        } => cmd_add(
            storage, plate, make, model, max_weight, max_volume, &kind, state.as_ref(),
            driver.as_deref(), tracker,
        ),
        VehicleCommand::List { all, json } => cmd_list(storage, all, json),
        VehicleCommand::Update {
            plate,
            make,
            model,
            max_weight,
            max_volume,
            kind,
            state,
            tracker,
        } => cmd_update(
            storage, &plate, make, model, max_weight, max_volume, kind.as_ref(),
            state.as_ref(), tracker,
        ),
        VehicleCommand::AssignDriver { plate, driver } => {
            cmd_assign_driver(storage, &plate, driver.as_deref())
        }
        VehicleCommand::Retire { plate } => cmd_retire(storage, &plate),
        VehicleCommand::Locate { plate } => cmd_locate(config, storage, &plate),
    }
}

/// Resolve a driver reference, insisting on the driver role.
fn resolve_driver(storage: &Storage, reference: &str) -> Result<uuid::Uuid, String> {
    let user = super::resolve_user(storage, reference)?;
    if user.role != Role::Driver {
        return Err(format!("user {} is not a driver", short_id(user.id)));
    }
    Ok(user.id)
}

#[allow(clippy::too_many_arguments)]
fn cmd_add(
    storage: &Storage,
    plate: String,
    make: String,
    model: String,
    max_weight: f64,
    max_volume: f64,
    kind: &KindArg,
    state: Option<&StateArg>,
    driver: Option<&str>,
    tracker: Option<String>,
) -> Result<(), String> {
    let driver = driver.map(|r| resolve_driver(storage, r)).transpose()?;

    // A new vehicle starts with its full capacity uncommitted.
    let vehicle = Vehicle {
        plate,
        make,
        model,
        max_weight_kg: max_weight,
        max_volume_m3: max_volume,
        available_weight_kg: max_weight,
        available_volume_m3: max_volume,
        kind: kind.to_domain(),
        state: state.map_or(VehicleState::Available, StateArg::to_domain),
        driver,
        tracker,
        active: true,
    };
    vehicle.validate().map_err(|e| e.to_string())?;

    storage
        .create_vehicle(&vehicle)
        .map_err(|e| format!("failed to create vehicle: {e}"))?;

    eprintln!("Vehicle {} registered", vehicle.plate);
    Ok(())
}

fn cmd_list(storage: &Storage, all: bool, json: bool) -> Result<(), String> {
    let vehicles = storage
        .list_vehicles(all)
        .map_err(|e| format!("failed to list vehicles: {e}"))?;

    if json {
        let out = serde_json::to_string_pretty(&vehicles)
            .map_err(|e| format!("failed to serialize vehicles: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    if vehicles.is_empty() {
        println!("No vehicles");
        return Ok(());
    }

    for v in &vehicles {
        println!(
            "{}  [{}] [{}]  {} {}  {:.0}/{:.0} kg free",
            v.plate,
            v.state.as_str(),
            v.kind.as_str(),
            v.make,
            v.model,
            v.available_weight_kg,
            v.max_weight_kg,
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_update(
    storage: &Storage,
    plate: &str,
    make: Option<String>,
    model: Option<String>,
    max_weight: Option<f64>,
    max_volume: Option<f64>,
    kind: Option<&KindArg>,
    state: Option<&StateArg>,
    tracker: Option<String>,
) -> Result<(), String> {
    let mut vehicle = storage
        .load_vehicle(plate)
        .map_err(|e| format!("vehicle not found: {e}"))?;

    if let Some(make) = make {
        vehicle.make = make;
    }
    if let Some(model) = model {
        vehicle.model = model;
    }
    if let Some(max_weight) = max_weight {
        vehicle.max_weight_kg = max_weight;
    }
    if let Some(max_volume) = max_volume {
        vehicle.max_volume_m3 = max_volume;
    }
    if let Some(kind) = kind {
        vehicle.kind = kind.to_domain();
    }
    if let Some(state) = state {
        vehicle.state = state.to_domain();
    }
    if let Some(tracker) = tracker {
        vehicle.tracker = Some(tracker);
    }
    vehicle.validate().map_err(|e| e.to_string())?;

    storage
        .update_vehicle(&vehicle)
        .map_err(|e| format!("failed to update vehicle: {e}"))?;

    eprintln!("Vehicle {} updated", vehicle.plate);
    Ok(())
}

fn cmd_assign_driver(storage: &Storage, plate: &str, driver: Option<&str>) -> Result<(), String> {
    let driver = driver.map(|r| resolve_driver(storage, r)).transpose()?;

    storage
        .set_driver(plate, driver)
        .map_err(|e| format!("failed to assign driver: {e}"))?;

    match driver {
        Some(id) => eprintln!("Vehicle {plate} assigned to driver {}", short_id(id)),
        None => eprintln!("Vehicle {plate} driver cleared"),
    }
    Ok(())
}

fn cmd_retire(storage: &Storage, plate: &str) -> Result<(), String> {
    storage
        .retire_vehicle(plate)
        .map_err(|e| format!("failed to retire vehicle: {e}"))?;
    eprintln!("Vehicle {plate} retired");
    Ok(())
}

fn cmd_locate(config: &Config, storage: &Storage, plate: &str) -> Result<(), String> {
    let vehicle = storage
        .load_vehicle(plate)
        .map_err(|e| format!("vehicle not found: {e}"))?;

    let Some(tracker) = &vehicle.tracker else {
        return Err(format!("vehicle {plate} has no tracker installed"));
    };

    let fix = storage
        .last_fix(tracker)
        .map_err(|e| format!("failed to read fixes: {e}"))?;
    let Some(fix) = fix else {
        return Err(format!("tracker {tracker} has never reported a position"));
    };

    let tz = TimeZone::get(&config.timezone)
        .map_err(|e| format!("unknown timezone '{}': {e}", config.timezone))?;
    println!("{}", coords(fix.position));
    eprintln!(
        "Vehicle {plate} (tracker {tracker}) last seen {}",
        local_datetime(&tz, fix.recorded_at)
    );
    Ok(())
}
