//! Planner configuration: depot, speeds, vehicle catalog and score weights.

use serde::{Deserialize, Serialize};

use crate::model::{Location, SECONDS_PER_DAY};

/// Default company depot (Colombo).
pub const DEFAULT_DEPOT: Location = Location::new(79.8612, 6.9271);

/// Average driving speed assumption for time estimation.
pub const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Capacity and fuel consumption for one vehicle type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSpec {
    pub name: String,
    /// Other names the type is registered under.
    pub aliases: Vec<String>,
    pub capacity_kg: f64,
    pub fuel_l_per_km: f64,
}

impl VehicleSpec {
    pub fn new(name: &str, capacity_kg: f64, fuel_l_per_km: f64) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            capacity_kg,
            fuel_l_per_km,
        }
    }

    pub fn alias(mut self, name: &str) -> Self {
        self.aliases.push(name.to_string());
        self
    }

    fn matches(&self, name: &str) -> bool {
        let wanted = normalize(name);
        normalize(&self.name) == wanted || self.aliases.iter().any(|alias| normalize(alias) == wanted)
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// The fleet's vehicle-type table.
pub fn default_catalog() -> Vec<VehicleSpec> {
    vec![
        VehicleSpec::new("Toyota Dyna", 3000.0, 0.12),
        VehicleSpec::new("Isuzu Elf", 4000.0, 0.15),
        VehicleSpec::new("Mitsubishi Canter", 3500.0, 0.13),
        VehicleSpec::new("Tata LPT 709/1109", 5000.0, 0.18)
            .alias("Tata LPT 709")
            .alias("Tata LPT 1109"),
    ]
}

/// Weights of the best-score composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub distance: f64,
    pub utilization: f64,
    pub capacity: f64,
    pub fuel: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            distance: 0.3,
            utilization: 0.4,
            capacity: 0.2,
            fuel: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Route origin and return point.
    pub depot: Location,
    pub speed_kmh: f64,
    pub vehicles: Vec<VehicleSpec>,
    pub score_weights: ScoreWeights,
    /// Preferred ceiling for a single pickup's share of vehicle capacity (0..1).
    pub utilization_cap: f64,
    /// Time spent at each stop, in seconds.
    pub service_duration_secs: i64,
    /// Pickup window length when a request has no explicit end.
    pub pickup_window_secs: i64,
    /// Working window offered for every vehicle, in seconds from midnight.
    pub vehicle_window_secs: (i64, i64),
    /// Earliest route start, in seconds from midnight.
    pub shift_start_secs: i64,
    /// Routing profile sent with every external vehicle.
    pub vrp_profile: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            depot: DEFAULT_DEPOT,
            speed_kmh: DEFAULT_SPEED_KMH,
            vehicles: default_catalog(),
            score_weights: ScoreWeights::default(),
            utilization_cap: 0.9,
            service_duration_secs: 300,
            pickup_window_secs: 3600,
            vehicle_window_secs: (0, SECONDS_PER_DAY),
            shift_start_secs: 8 * 3600,
            vrp_profile: "driving-hgv".to_string(),
        }
    }
}

impl PlannerConfig {
    /// Looks up a vehicle type by name, ignoring case and extra whitespace.
    pub fn vehicle_spec(&self, vehicle_type: &str) -> Option<&VehicleSpec> {
        self.vehicles.iter().find(|spec| spec.matches(vehicle_type))
    }

    pub fn with_depot(mut self, depot: Location) -> Self {
        self.depot = depot;
        self
    }
}
