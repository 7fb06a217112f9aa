//! Great-circle distance and the travel-time and fuel-cost formulas built on it.
//!
//! Straight-line distance ignores roads, so every figure derived from it is
//! an estimate.

use rayon::prelude::*;

use crate::config::DEFAULT_SPEED_KMH;
use crate::model::Location;
use crate::traits::DistanceMatrixProvider;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in kilometers.
pub fn haversine_km(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let lat1_rad = lat_a.to_radians();
    let lat2_rad = lat_b.to_radians();
    let delta_lat = (lat_b - lat_a).to_radians();
    let delta_lng = (lon_b - lon_a).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1 for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Travel time in minutes at an average speed.
pub fn estimated_travel_minutes(distance_km: f64, avg_speed_kmh: f64) -> f64 {
    distance_km / avg_speed_kmh * 60.0
}

/// Travel time in minutes at the default 40 km/h.
pub fn default_travel_minutes(distance_km: f64) -> f64 {
    estimated_travel_minutes(distance_km, DEFAULT_SPEED_KMH)
}

/// Fuel cost in LKR for driving `distance_km`.
pub fn fuel_cost(distance_km: f64, liters_per_km: f64, price_per_liter: f64) -> f64 {
    distance_km * liters_per_km * price_per_liter
}

/// Haversine-based distance matrix provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineMatrix;

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[Location]) -> Vec<Vec<f64>> {
        locations
            .par_iter()
            .map(|from| locations.iter().map(|to| from.distance_km(to)).collect())
            .collect()
    }
}
