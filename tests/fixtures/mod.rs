//! Test fixtures for pickup-planner.
//!
//! Provides:
//! - Colombo-area locations
//! - Builders for pickups, drivers and planning inputs

#![allow(dead_code)]

pub mod colombo_locations;

pub use colombo_locations::*;

use pickup_planner::model::{Driver, DriverStatus, FuelPrice, Location, PickupRequest, Vehicle};
use pickup_planner::solver::PlanningInput;

/// 2024-03-12T00:00:00Z
pub const SERVICE_DATE: i64 = 1_710_201_600;

pub const FUEL_PRICE: f64 = 355.0;

pub fn hours(h: i64) -> i64 {
    h * 3600
}

/// Pending pickup scheduled `hour` hours after midnight of the service date.
pub fn pickup(id: &str, weight_kg: f64, location: Location, hour: i64) -> PickupRequest {
    PickupRequest::new(id, location, weight_kg, SERVICE_DATE + hours(hour))
}

pub fn driver(id: &str, vehicle_type: &str) -> Driver {
    Driver::new(id, Some(Vehicle::new(format!("{id}-truck"), vehicle_type)))
}

pub fn driver_at(id: &str, vehicle_type: &str, location: Location) -> Driver {
    let mut driver = driver(id, vehicle_type);
    driver.location = Some(location);
    driver
}

pub fn unavailable(mut driver: Driver) -> Driver {
    driver.status = DriverStatus::Unavailable;
    driver
}

pub fn input(pickups: Vec<PickupRequest>, drivers: Vec<Driver>) -> PlanningInput {
    PlanningInput {
        service_date: SERVICE_DATE,
        pickups,
        drivers,
        fuel_prices: vec![FuelPrice {
            price_per_liter: FUEL_PRICE,
            effective_at: SERVICE_DATE - hours(24 * 30),
        }],
    }
}
