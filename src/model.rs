//! Domain records consumed and produced by the planner.
//!
//! Timestamps are unix seconds. A service date is the unix timestamp of
//! midnight at the start of the day being planned.

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::haversine::haversine_km;

/// Seconds in one service day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// WGS84 coordinate, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

impl Location {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Great-circle distance to `other` in kilometers.
    pub fn distance_km(&self, other: &Location) -> f64 {
        haversine_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// True if the coordinate lies inside the WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }

    /// `[longitude, latitude]` pair as used on the wire.
    pub const fn as_lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupStatus {
    Pending,
    Assigned,
    Completed,
    Cancelled,
}

/// A request to collect waste at a location on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupRequest {
    pub id: String,
    pub location: Location,
    /// Estimated weight in kilograms.
    pub weight_kg: f64,
    /// Scheduled start of the pickup window.
    pub scheduled_at: i64,
    /// Explicit end of the pickup window, if the requester gave one.
    pub window_end: Option<i64>,
    /// Higher values are served first by the scored policy.
    pub priority: u8,
    pub status: PickupStatus,
    pub driver_id: Option<String>,
}

impl PickupRequest {
    pub fn new(id: impl Into<String>, location: Location, weight_kg: f64, scheduled_at: i64) -> Self {
        Self {
            id: id.into(),
            location,
            weight_kg,
            scheduled_at,
            window_end: None,
            priority: 0,
            status: PickupStatus::Pending,
            driver_id: None,
        }
    }

    /// Pickup window `(start, end)`, defaulting the end to `default_len` seconds after the start.
    pub fn window(&self, default_len: i64) -> (i64, i64) {
        let end = self
            .window_end
            .filter(|end| *end > self.scheduled_at)
            .unwrap_or(self.scheduled_at + default_len);
        (self.scheduled_at, end)
    }

    /// Pending and scheduled within the day starting at `service_date`.
    pub fn is_pending_on(&self, service_date: i64) -> bool {
        self.status == PickupStatus::Pending
            && self.scheduled_at >= service_date
            && self.scheduled_at < service_date + SECONDS_PER_DAY
    }
}

/// A physical truck. Capacity and fuel rate come from the vehicle-type catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    /// Catalog name, e.g. "Toyota Dyna".
    pub vehicle_type: Option<String>,
    /// Load already on board, reset to zero by the caller before a run.
    pub current_load_kg: f64,
    pub location: Option<Location>,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, vehicle_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vehicle_type: Some(vehicle_type.into()),
            current_load_kg: 0.0,
            location: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub status: DriverStatus,
    pub vehicle: Option<Vehicle>,
    pub location: Option<Location>,
    /// Start of the driver's availability on the service date.
    pub available_from: Option<i64>,
}

impl Driver {
    pub fn new(id: impl Into<String>, vehicle: Option<Vehicle>) -> Self {
        Self {
            id: id.into(),
            status: DriverStatus::Available,
            vehicle,
            location: None,
            available_from: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == DriverStatus::Available
    }
}

/// Fuel price in LKR per liter, effective from `effective_at`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelPrice {
    pub price_per_liter: f64,
    pub effective_at: i64,
}

impl FuelPrice {
    /// The most recently effective price at instant `at`.
    pub fn effective(prices: &[FuelPrice], at: i64) -> Option<FuelPrice> {
        prices
            .iter()
            .filter(|price| price.effective_at <= at && price.price_per_liter.is_finite())
            .max_by_key(|price| price.effective_at)
            .copied()
    }
}

/// Working copy of one driver's vehicle for the duration of a run.
///
/// Built fresh from caller input; the load is mutated only as pickups are
/// committed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub driver_id: String,
    pub vehicle_id: String,
    pub vehicle_type: String,
    pub capacity_kg: f64,
    pub fuel_l_per_km: f64,
    pub current_load_kg: f64,
    pub location: Location,
    pub available_from: i64,
}

impl VehicleState {
    /// Resolves an available driver's vehicle against the catalog.
    ///
    /// Returns `Ok(None)` for drivers that are unavailable or have no vehicle.
    pub fn resolve(
        driver: &Driver,
        service_date: i64,
        config: &PlannerConfig,
    ) -> Result<Option<Self>, PlannerError> {
        if !driver.is_available() {
            return Ok(None);
        }
        let Some(vehicle) = driver.vehicle.as_ref() else {
            return Ok(None);
        };
        let type_name = vehicle.vehicle_type.as_deref().ok_or_else(|| {
            PlannerError::Configuration(format!("driver {} has no vehicle type", driver.id))
        })?;
        let spec = config.vehicle_spec(type_name).ok_or_else(|| {
            PlannerError::Configuration(format!(
                "driver {} uses unknown vehicle type '{}'",
                driver.id, type_name
            ))
        })?;

        let location = driver
            .location
            .or(vehicle.location)
            .unwrap_or(config.depot);
        let shift_start = service_date + config.shift_start_secs;

        Ok(Some(Self {
            driver_id: driver.id.clone(),
            vehicle_id: vehicle.id.clone(),
            vehicle_type: spec.name.clone(),
            capacity_kg: spec.capacity_kg,
            fuel_l_per_km: spec.fuel_l_per_km,
            current_load_kg: vehicle.current_load_kg.max(0.0),
            location,
            available_from: driver.available_from.map_or(shift_start, |from| from.max(shift_start)),
        }))
    }

    pub fn remaining_kg(&self) -> f64 {
        self.capacity_kg - self.current_load_kg
    }

    pub fn can_carry(&self, weight_kg: f64) -> bool {
        self.remaining_kg() >= weight_kg
    }
}

/// One pickup committed to one driver, with the leg that reaches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub pickup_id: String,
    pub driver_id: String,
    /// 1-based stop position within the route.
    pub sequence: usize,
    pub arrival_at: i64,
    pub weight_kg: f64,
    pub leg_distance_km: f64,
    pub leg_duration_min: f64,
    pub leg_fuel_cost: f64,
}

/// A driver's ordered stops and the route totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub driver_id: String,
    pub vehicle_id: String,
    pub capacity_kg: f64,
    pub assignments: Vec<Assignment>,
    pub total_weight_kg: f64,
    /// Includes the return leg.
    pub total_distance_km: f64,
    pub return_distance_km: f64,
    /// Travel plus service time, in minutes.
    pub total_duration_min: f64,
    pub total_fuel_cost: f64,
    pub started_at: i64,
    pub finished_at: i64,
}

impl RouteSummary {
    pub fn utilization_pct(&self) -> f64 {
        if self.capacity_kg > 0.0 {
            self.total_weight_kg / self.capacity_kg * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    /// Heavier than every vehicle in the fleet.
    ExceedsCapacity,
    /// Would fit an empty vehicle, but every vehicle was already too full.
    NoRemainingCapacity,
    /// The external optimizer left it out of every route.
    NotRouted,
    /// Its external route was rejected while parsing.
    UnmatchedRoute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnassignedPickup {
    pub pickup_id: String,
    pub weight_kg: f64,
    pub reason: UnassignedReason,
}

impl UnassignedPickup {
    pub fn new(pickup: &PickupRequest, reason: UnassignedReason) -> Self {
        Self {
            pickup_id: pickup.id.clone(),
            weight_kg: pickup.weight_kg,
            reason,
        }
    }
}

/// Non-fatal issue found while reading an optimizer response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteWarning {
    pub driver_id: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults_to_length() {
        let pickup = PickupRequest::new("p1", Location::new(79.86, 6.92), 100.0, 1_000);
        assert_eq!(pickup.window(3600), (1_000, 4_600));
    }

    #[test]
    fn test_window_uses_explicit_end() {
        let mut pickup = PickupRequest::new("p1", Location::new(79.86, 6.92), 100.0, 1_000);
        pickup.window_end = Some(2_000);
        assert_eq!(pickup.window(3600), (1_000, 2_000));
    }

    #[test]
    fn test_pending_on_date() {
        let day = 1_700_000_000 - 1_700_000_000 % SECONDS_PER_DAY;
        let mut pickup = PickupRequest::new("p1", Location::new(79.86, 6.92), 100.0, day + 3600);
        assert!(pickup.is_pending_on(day));
        assert!(!pickup.is_pending_on(day + SECONDS_PER_DAY));

        pickup.status = PickupStatus::Completed;
        assert!(!pickup.is_pending_on(day));
    }

    #[test]
    fn test_effective_fuel_price_is_latest() {
        let prices = [
            FuelPrice { price_per_liter: 300.0, effective_at: 10 },
            FuelPrice { price_per_liter: 350.0, effective_at: 30 },
            FuelPrice { price_per_liter: 320.0, effective_at: 20 },
        ];
        assert_eq!(FuelPrice::effective(&prices, 25).map(|p| p.price_per_liter), Some(320.0));
        assert_eq!(FuelPrice::effective(&prices, 40).map(|p| p.price_per_liter), Some(350.0));
        assert!(FuelPrice::effective(&prices, 5).is_none());
    }

    #[test]
    fn test_resolve_missing_type_names_driver() {
        let config = PlannerConfig::default();
        let mut vehicle = Vehicle::new("v1", "Toyota Dyna");
        vehicle.vehicle_type = None;
        let driver = Driver::new("driver-7", Some(vehicle));

        let err = VehicleState::resolve(&driver, 0, &config).unwrap_err();
        assert!(matches!(err, PlannerError::Configuration(ref msg) if msg.contains("driver-7")));
    }

    #[test]
    fn test_resolve_falls_back_to_depot() {
        let config = PlannerConfig::default();
        let driver = Driver::new("d1", Some(Vehicle::new("v1", "Isuzu Elf")));

        let state = VehicleState::resolve(&driver, 0, &config).unwrap().unwrap();
        assert_eq!(state.location, config.depot);
        assert_eq!(state.capacity_kg, 4000.0);
        assert_eq!(state.fuel_l_per_km, 0.15);
        assert_eq!(state.available_from, config.shift_start_secs);
    }

    #[test]
    fn test_resolve_skips_unavailable_and_vehicleless() {
        let config = PlannerConfig::default();
        let mut off_duty = Driver::new("d1", Some(Vehicle::new("v1", "Isuzu Elf")));
        off_duty.status = DriverStatus::Unavailable;
        let no_vehicle = Driver::new("d2", None);

        assert!(VehicleState::resolve(&off_duty, 0, &config).unwrap().is_none());
        assert!(VehicleState::resolve(&no_vehicle, 0, &config).unwrap().is_none());
    }
}
