//! Stop ordering and route metrics.
//!
//! Both orderings here are greedy. Nearest-neighbor picks the closest
//! remaining stop from the current position and is not a TSP solve; its
//! routes can cross themselves.

use crate::config::PlannerConfig;
use crate::haversine::{estimated_travel_minutes, fuel_cost};
use crate::model::{Assignment, Location, PickupRequest, RouteSummary, VehicleState};
use crate::traits::DistanceMatrixProvider;

/// Visiting order (indices into `stops`) by repeated nearest neighbor from `start`.
///
/// Ties go to the stop that appears first in `stops`.
pub fn nearest_neighbor_order<M>(matrix_provider: &M, start: Location, stops: &[&PickupRequest]) -> Vec<usize>
where
    M: DistanceMatrixProvider,
{
    if stops.is_empty() {
        return Vec::new();
    }

    // Index 0 is the start, stop i lives at i + 1.
    let mut locations = Vec::with_capacity(stops.len() + 1);
    locations.push(start);
    locations.extend(stops.iter().map(|stop| stop.location));
    let matrix = matrix_provider.matrix_for(&locations);

    let mut visited = vec![false; stops.len()];
    let mut order = Vec::with_capacity(stops.len());
    let mut current = 0;

    while order.len() < stops.len() {
        let mut best: Option<(usize, f64)> = None;
        for (i, done) in visited.iter().enumerate() {
            if *done {
                continue;
            }
            let distance = matrix[current][i + 1];
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((i, distance));
            }
        }

        let Some((next, _)) = best else { break };
        visited[next] = true;
        order.push(next);
        current = next + 1;
    }

    order
}

/// Visiting order (indices into `stops`) by ascending straight-line distance from the depot.
pub fn depot_proximity_order(depot: Location, stops: &[&PickupRequest]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..stops.len()).collect();
    order.sort_by(|a, b| {
        let da = depot.distance_km(&stops[*a].location);
        let db = depot.distance_km(&stops[*b].location);
        da.total_cmp(&db)
    });
    order
}

/// Distance and travel time of one leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    pub distance_km: f64,
    pub duration_min: f64,
}

impl Leg {
    /// Straight-line estimate at the configured speed.
    pub fn estimate(from: Location, to: Location, config: &PlannerConfig) -> Self {
        let distance_km = from.distance_km(&to);
        Self {
            distance_km,
            duration_min: estimated_travel_minutes(distance_km, config.speed_kmh),
        }
    }
}

/// Accumulates legs into a [`RouteSummary`].
///
/// Route totals are running sums of the legs added.
pub(crate) struct RouteBuilder<'a> {
    vehicle: &'a VehicleState,
    fuel_price: f64,
    service_min: f64,
    assignments: Vec<Assignment>,
    position: Location,
    clock: i64,
    started_at: i64,
    total_weight_kg: f64,
    total_distance_km: f64,
    total_duration_min: f64,
    total_fuel_cost: f64,
}

impl<'a> RouteBuilder<'a> {
    pub(crate) fn new(
        vehicle: &'a VehicleState,
        start: Location,
        started_at: i64,
        fuel_price: f64,
        config: &PlannerConfig,
    ) -> Self {
        Self {
            vehicle,
            fuel_price,
            service_min: config.service_duration_secs as f64 / 60.0,
            assignments: Vec::new(),
            position: start,
            clock: started_at,
            started_at,
            total_weight_kg: 0.0,
            total_distance_km: 0.0,
            total_duration_min: 0.0,
            total_fuel_cost: 0.0,
        }
    }

    pub(crate) fn position(&self) -> Location {
        self.position
    }

    /// Appends a stop. Without an explicit arrival it is derived from the leg time.
    pub(crate) fn visit(&mut self, pickup: &PickupRequest, leg: Leg, arrival_at: Option<i64>) {
        let leg_fuel_cost = self.add_leg(leg);
        let arrival_at = arrival_at.unwrap_or_else(|| self.clock + minutes_to_secs(leg.duration_min));

        self.assignments.push(Assignment {
            pickup_id: pickup.id.clone(),
            driver_id: self.vehicle.driver_id.clone(),
            sequence: self.assignments.len() + 1,
            arrival_at,
            weight_kg: pickup.weight_kg,
            leg_distance_km: leg.distance_km,
            leg_duration_min: leg.duration_min,
            leg_fuel_cost,
        });

        self.total_weight_kg += pickup.weight_kg;
        self.total_duration_min += self.service_min;
        self.clock = arrival_at + minutes_to_secs(self.service_min);
        self.position = pickup.location;
    }

    /// Closes the route with the leg back to the depot (or the route end).
    pub(crate) fn finish(mut self, leg: Leg, finished_at: Option<i64>) -> RouteSummary {
        self.add_leg(leg);
        let finished_at = finished_at.unwrap_or_else(|| self.clock + minutes_to_secs(leg.duration_min));

        RouteSummary {
            driver_id: self.vehicle.driver_id.clone(),
            vehicle_id: self.vehicle.vehicle_id.clone(),
            capacity_kg: self.vehicle.capacity_kg,
            assignments: self.assignments,
            total_weight_kg: self.total_weight_kg,
            total_distance_km: self.total_distance_km,
            return_distance_km: leg.distance_km,
            total_duration_min: self.total_duration_min,
            total_fuel_cost: self.total_fuel_cost,
            started_at: self.started_at,
            finished_at,
        }
    }

    fn add_leg(&mut self, leg: Leg) -> f64 {
        let cost = fuel_cost(leg.distance_km, self.vehicle.fuel_l_per_km, self.fuel_price);
        self.total_distance_km += leg.distance_km;
        self.total_duration_min += leg.duration_min;
        self.total_fuel_cost += cost;
        cost
    }
}

fn minutes_to_secs(minutes: f64) -> i64 {
    (minutes * 60.0).round() as i64
}

/// Prices a route that visits `ordered` from `start` and returns to the depot.
pub fn build_route(
    vehicle: &VehicleState,
    start: Location,
    ordered: &[&PickupRequest],
    fuel_price: f64,
    config: &PlannerConfig,
) -> RouteSummary {
    let mut builder = RouteBuilder::new(vehicle, start, vehicle.available_from, fuel_price, config);
    for pickup in ordered {
        let leg = Leg::estimate(builder.position(), pickup.location, config);
        builder.visit(pickup, leg, None);
    }
    let back = Leg::estimate(builder.position(), config.depot, config);
    builder.finish(back, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine::HaversineMatrix;

    fn pickup(id: &str, longitude: f64, latitude: f64) -> PickupRequest {
        PickupRequest::new(id, Location::new(longitude, latitude), 100.0, 0)
    }

    fn vehicle(config: &PlannerConfig) -> VehicleState {
        VehicleState {
            driver_id: "d1".to_string(),
            vehicle_id: "v1".to_string(),
            vehicle_type: "Toyota Dyna".to_string(),
            capacity_kg: 3000.0,
            fuel_l_per_km: 0.12,
            current_load_kg: 0.0,
            location: config.depot,
            available_from: 8 * 3600,
        }
    }

    #[test]
    fn test_nearest_neighbor_walks_a_line() {
        // Stops along the equator, given out of order.
        let far = pickup("far", 0.3, 0.0);
        let near = pickup("near", 0.1, 0.0);
        let mid = pickup("mid", 0.2, 0.0);
        let stops = vec![&far, &near, &mid];

        let order = nearest_neighbor_order(&HaversineMatrix, Location::new(0.0, 0.0), &stops);
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_nearest_neighbor_is_greedy_not_optimal() {
        // Greedy goes 0 -> +1 -> +3 -> -1.5 (7.5 units), while
        // 0 -> -1.5 -> +1 -> +3 would be 6 units.
        let a = pickup("a", 0.01, 0.0);
        let b = pickup("b", -0.015, 0.0);
        let c = pickup("c", 0.03, 0.0);
        let stops = vec![&a, &b, &c];

        let order = nearest_neighbor_order(&HaversineMatrix, Location::new(0.0, 0.0), &stops);
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[test]
    fn test_nearest_neighbor_tie_keeps_input_order() {
        let east = pickup("east", 0.1, 0.0);
        let west = pickup("west", -0.1, 0.0);
        let stops = vec![&east, &west];

        let order = nearest_neighbor_order(&HaversineMatrix, Location::new(0.0, 0.0), &stops);
        assert_eq!(order[0], 0);
    }

    #[test]
    fn test_empty_stops() {
        let order = nearest_neighbor_order(&HaversineMatrix, Location::new(0.0, 0.0), &[]);
        assert!(order.is_empty());
    }

    #[test]
    fn test_depot_proximity_order() {
        let depot = Location::new(0.0, 0.0);
        let far = pickup("far", 0.0, 0.3);
        let near = pickup("near", 0.0, -0.1);
        let mid = pickup("mid", 0.2, 0.0);

        let order = depot_proximity_order(depot, &[&far, &near, &mid]);
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_build_route_totals_match_legs() {
        let config = PlannerConfig::default().with_depot(Location::new(0.0, 0.0));
        let vehicle = vehicle(&config);
        let a = pickup("a", 0.1, 0.0);
        let b = pickup("b", 0.2, 0.0);

        let route = build_route(&vehicle, config.depot, &[&a, &b], 350.0, &config);

        assert_eq!(route.assignments.len(), 2);
        assert_eq!(route.assignments[0].sequence, 1);
        assert_eq!(route.assignments[1].sequence, 2);
        assert_eq!(route.total_weight_kg, 200.0);

        let legs: f64 = route.assignments.iter().map(|a| a.leg_distance_km).sum();
        assert!((route.total_distance_km - (legs + route.return_distance_km)).abs() < 1e-9);
        assert!((route.return_distance_km - route.assignments.iter().map(|a| a.leg_distance_km).sum::<f64>()).abs() < 1e-6);

        let fuel: f64 = route.assignments.iter().map(|a| a.leg_fuel_cost).sum::<f64>()
            + fuel_cost(route.return_distance_km, 0.12, 350.0);
        assert!((route.total_fuel_cost - fuel).abs() < 1e-9);
    }

    #[test]
    fn test_build_route_arrivals_advance() {
        let config = PlannerConfig::default().with_depot(Location::new(0.0, 0.0));
        let vehicle = vehicle(&config);
        let a = pickup("a", 0.1, 0.0);
        let b = pickup("b", 0.2, 0.0);

        let route = build_route(&vehicle, config.depot, &[&a, &b], 350.0, &config);

        assert_eq!(route.started_at, 8 * 3600);
        assert!(route.assignments[0].arrival_at > route.started_at);
        // Second arrival is after the first plus the 5 minute service time.
        assert!(route.assignments[1].arrival_at >= route.assignments[0].arrival_at + 300);
        assert!(route.finished_at > route.assignments[1].arrival_at);
    }
}
