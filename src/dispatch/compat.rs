//! Shipment–trip compatibility: the admission rules for bundling.
//!
//! `is_compatible` is a pure conjunction over in-memory values — no I/O,
//! no hidden state — so it can be unit-tested without a store. Every rule
//! must hold; there is no partial credit and no ranking.

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;

use crate::config::Config;
use crate::model::{Coordinates, Shipment, Trip, TripStatus, Vehicle};

/// Tunable dispatch constants.
///
/// Both values are policy, not geometry: the proximity threshold is a coarse
/// admission filter and the timezone pins calendar-date extraction to one
/// zone regardless of where a request originates.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    /// Reference timezone for the same-delivery-day rule.
    pub timezone: TimeZone,

    /// Proximity threshold in decimal degrees, applied independently to
    /// latitude and longitude of both endpoints.
    pub proximity_epsilon_deg: f64,
}

impl DispatchPolicy {
    /// Resolve the policy from configuration.
    ///
    /// Fails when the configured timezone is not in the tz database.
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let timezone = TimeZone::get(&config.timezone)
            .map_err(|e| format!("unknown timezone '{}': {e}", config.timezone))?;
        Ok(Self {
            timezone,
            proximity_epsilon_deg: config.proximity_epsilon_deg,
        })
    }
}

/// Decides whether `shipment`, travelling `origin` → `destination`, can join
/// `trip` on `vehicle` alongside the shipments already bundled on it.
///
/// The five rules, all required:
///
/// 1. weight fit — the vehicle's max capacity covers the bundled weights plus
///    the candidate, and its uncommitted weight covers the candidate;
/// 2. volume fit — max volume covers the bundled volumes plus the candidate;
/// 3. cargo-kind match — exact equality;
/// 4. same delivery day — calendar dates equal in the reference timezone;
/// 5. proximity — origins and destinations within ε on both axes.
///
/// Trips that are not in the `Assigned` state are never compatible: once the
/// vehicle departs there is nothing left to load.
pub fn is_compatible(
    policy: &DispatchPolicy,
    shipment: &Shipment,
    origin: Coordinates,
    destination: Coordinates,
    trip: &Trip,
    vehicle: &Vehicle,
    bundled: &[Shipment],
) -> bool {
    trip.status == TripStatus::Assigned
        && fits_weight(shipment, vehicle, bundled)
        && fits_volume(shipment, vehicle, bundled)
        && vehicle.kind == shipment.kind
        && same_civil_date(&policy.timezone, trip.deliver_by, shipment.deliver_by)
        && within_epsilon(policy.proximity_epsilon_deg, origin, trip.origin)
        && within_epsilon(policy.proximity_epsilon_deg, destination, trip.destination)
}

/// Weight fit. Comparisons are inclusive (`>=`): a shipment that lands the
/// load exactly on the vehicle's limit is accepted.
fn fits_weight(shipment: &Shipment, vehicle: &Vehicle, bundled: &[Shipment]) -> bool {
    let loaded: f64 = bundled.iter().map(|s| s.weight_kg).sum();
    vehicle.max_weight_kg >= loaded + shipment.weight_kg
        && vehicle.available_weight_kg >= shipment.weight_kg
}

/// Volume fit against max capacity, inclusive.
fn fits_volume(shipment: &Shipment, vehicle: &Vehicle, bundled: &[Shipment]) -> bool {
    let loaded: f64 = bundled.iter().map(|s| s.volume_m3).sum();
    vehicle.max_volume_m3 >= loaded + shipment.volume_m3
}

/// Same calendar date in the reference timezone. Time of day is ignored.
fn same_civil_date(tz: &TimeZone, a: Timestamp, b: Timestamp) -> bool {
    civil_date(tz, a) == civil_date(tz, b)
}

fn civil_date(tz: &TimeZone, ts: Timestamp) -> Date {
    tz.to_datetime(ts).date()
}

/// Proximity is strict-less-than on each axis. A delta equal to ε is out.
fn within_epsilon(epsilon_deg: f64, a: Coordinates, b: Coordinates) -> bool {
    (a.lat - b.lat).abs() < epsilon_deg && (a.lon - b.lon).abs() < epsilon_deg
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil;
    use uuid::Uuid;

    use crate::model::{CargoKind, ShipmentStatus, VehicleState};

    fn tz() -> TimeZone {
        TimeZone::get("America/Mexico_City").unwrap()
    }

    fn policy() -> DispatchPolicy {
        DispatchPolicy {
            timezone: tz(),
            proximity_epsilon_deg: 0.1,
        }
    }

    /// A timestamp for the given civil time in the reference zone.
    fn at(year: i16, month: i8, day: i8, hour: i8, minute: i8) -> Timestamp {
        civil::date(year, month, day)
            .at(hour, minute, 0, 0)
            .to_zoned(tz())
            .unwrap()
            .timestamp()
    }

    fn sample_shipment(weight_kg: f64, volume_m3: f64) -> Shipment {
        Shipment {
            id: Uuid::new_v4(),
            client: "Acme Foods".into(),
            weight_kg,
            volume_m3,
            description: "Palletized canned goods".into(),
            kind: CargoKind::Dry,
            deliver_by: at(2025, 3, 24, 10, 0),
            status: ShipmentStatus::Pending,
            created_at: Timestamp::now(),
        }
    }

    fn sample_vehicle() -> Vehicle {
        Vehicle {
            plate: "ABC-123-D".into(),
            make: "Kenworth".into(),
            model: "T680".into(),
            max_weight_kg: 2000.0,
            max_volume_m3: 10.0,
            available_weight_kg: 1800.0,
            available_volume_m3: 10.0,
            kind: CargoKind::Dry,
            state: VehicleState::Available,
            driver: None,
            tracker: None,
            active: true,
        }
    }

    fn sample_trip() -> Trip {
        Trip {
            id: Uuid::new_v4(),
            vehicle_plate: "ABC-123-D".into(),
            status: TripStatus::Assigned,
            origin: Coordinates { lat: 19.4326, lon: -99.1332 },
            destination: Coordinates { lat: 20.6597, lon: -103.3496 },
            deliver_by: at(2025, 3, 24, 18, 0),
            departed_at: None,
            active: true,
            notes: String::new(),
            created_at: Timestamp::now(),
        }
    }

    /// Bundled load matching the reference scenario: 1000 kg, 4 m³.
    fn sample_bundled() -> Vec<Shipment> {
        vec![sample_shipment(600.0, 2.5), sample_shipment(400.0, 1.5)]
    }

    fn check(shipment: &Shipment, trip: &Trip, vehicle: &Vehicle, bundled: &[Shipment]) -> bool {
        is_compatible(
            &policy(),
            shipment,
            trip.origin,
            trip.destination,
            trip,
            vehicle,
            bundled,
        )
    }

    #[test]
    fn scenario_all_conditions_met() {
        let shipment = sample_shipment(500.0, 2.0);
        assert!(check(&shipment, &sample_trip(), &sample_vehicle(), &sample_bundled()));
    }

    #[test]
    fn referentially_transparent() {
        let shipment = sample_shipment(500.0, 2.0);
        let trip = sample_trip();
        let vehicle = sample_vehicle();
        let bundled = sample_bundled();
        let first = check(&shipment, &trip, &vehicle, &bundled);
        for _ in 0..10 {
            assert_eq!(check(&shipment, &trip, &vehicle, &bundled), first);
        }
    }

    #[test]
    fn kind_mismatch_rejects_regardless_of_everything_else() {
        let shipment = sample_shipment(1.0, 0.01);
        let mut vehicle = sample_vehicle();
        vehicle.kind = CargoKind::Refrigerated;
        assert!(!check(&shipment, &sample_trip(), &vehicle, &[]));
    }

    #[test]
    fn smaller_weight_stays_compatible() {
        // Monotonicity: shrinking a compatible shipment's weight never
        // flips the result.
        let trip = sample_trip();
        let vehicle = sample_vehicle();
        let bundled = sample_bundled();
        assert!(check(&sample_shipment(500.0, 2.0), &trip, &vehicle, &bundled));
        for w in [499.9, 250.0, 10.0, 0.001] {
            assert!(check(&sample_shipment(w, 2.0), &trip, &vehicle, &bundled));
        }
    }

    #[test]
    fn exact_capacity_boundary_accepted() {
        // Bundled 1000 kg + candidate 1000 kg == max 2000 kg: inclusive.
        let shipment = sample_shipment(1000.0, 2.0);
        assert!(check(&shipment, &sample_trip(), &sample_vehicle(), &sample_bundled()));
    }

    #[test]
    fn over_capacity_rejected() {
        let shipment = sample_shipment(1000.1, 2.0);
        assert!(!check(&shipment, &sample_trip(), &sample_vehicle(), &sample_bundled()));
    }

    #[test]
    fn available_weight_limits_even_under_max_capacity() {
        // Max capacity would allow 600 kg on top of the bundled 1000 kg,
        // but the vehicle has only 500 kg uncommitted.
        let shipment = sample_shipment(600.0, 2.0);
        let mut vehicle = sample_vehicle();
        vehicle.available_weight_kg = 500.0;
        assert!(!check(&shipment, &sample_trip(), &vehicle, &sample_bundled()));
    }

    #[test]
    fn volume_overflow_rejected() {
        // Bundled 4 m³ + candidate 7 m³ > max 10 m³.
        let shipment = sample_shipment(100.0, 7.0);
        assert!(!check(&shipment, &sample_trip(), &sample_vehicle(), &sample_bundled()));
    }

    #[test]
    fn same_day_different_hours_accepted() {
        let mut shipment = sample_shipment(500.0, 2.0);
        shipment.deliver_by = at(2025, 3, 24, 1, 0);
        let mut trip = sample_trip();
        trip.deliver_by = at(2025, 3, 24, 23, 0);
        assert!(check(&shipment, &trip, &sample_vehicle(), &sample_bundled()));
    }

    #[test]
    fn adjacent_days_across_midnight_rejected() {
        let mut shipment = sample_shipment(500.0, 2.0);
        shipment.deliver_by = at(2025, 3, 24, 23, 59);
        let mut trip = sample_trip();
        trip.deliver_by = at(2025, 3, 25, 0, 1);
        assert!(!check(&shipment, &trip, &sample_vehicle(), &sample_bundled()));
    }

    #[test]
    fn origin_latitude_past_epsilon_rejected() {
        let shipment = sample_shipment(500.0, 2.0);
        let trip = sample_trip();
        let mut origin = trip.origin;
        origin.lat += 0.15;
        assert!(!is_compatible(
            &policy(),
            &shipment,
            origin,
            trip.destination,
            &trip,
            &sample_vehicle(),
            &sample_bundled(),
        ));
    }

    #[test]
    fn delta_equal_to_epsilon_rejected() {
        // The proximity comparison is strict.
        let shipment = sample_shipment(500.0, 2.0);
        let trip = sample_trip();
        let mut destination = trip.destination;
        destination.lon += 0.1;
        assert!(!is_compatible(
            &policy(),
            &shipment,
            trip.origin,
            destination,
            &trip,
            &sample_vehicle(),
            &sample_bundled(),
        ));
    }

    #[test]
    fn departed_trip_never_compatible() {
        let shipment = sample_shipment(500.0, 2.0);
        let mut trip = sample_trip();
        trip.status = TripStatus::InProgress;
        trip.departed_at = Some(Timestamp::now());
        assert!(!check(&shipment, &trip, &sample_vehicle(), &sample_bundled()));
    }
}
