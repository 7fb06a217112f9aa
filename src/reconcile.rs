//! Turns sequenced routes into persistence instructions and a fleet summary.
//!
//! Nothing here performs I/O. Fleet totals are sums of route totals, which are
//! themselves sums of their legs.

use serde::{Deserialize, Serialize};

use crate::model::{PickupStatus, RouteSummary, RouteWarning, UnassignedPickup, VehicleState};

/// Fields to write on one pickup record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupUpdate {
    pub pickup_id: String,
    pub status: PickupStatus,
    pub driver_id: String,
    pub sequence: usize,
    pub arrival_at: i64,
    pub leg_distance_km: f64,
    pub leg_duration_min: f64,
    pub leg_fuel_cost: f64,
}

/// Fields to write on one driver (and their vehicle) record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverUpdate {
    pub driver_id: String,
    pub vehicle_id: String,
    pub pickup_ids: Vec<String>,
    /// Vehicle load after the run; the caller persists it.
    pub vehicle_load_kg: f64,
    pub total_distance_km: f64,
    pub total_duration_min: f64,
    pub total_fuel_cost: f64,
    pub started_at: i64,
    pub finished_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverPerformance {
    pub driver_id: String,
    pub stops: usize,
    pub load_kg: f64,
    pub utilization_pct: f64,
    pub distance_km: f64,
    pub duration_min: f64,
    pub fuel_cost: f64,
    pub fuel_cost_per_stop: f64,
}

impl From<&RouteSummary> for DriverPerformance {
    fn from(route: &RouteSummary) -> Self {
        let stops = route.assignments.len();
        Self {
            driver_id: route.driver_id.clone(),
            stops,
            load_kg: route.total_weight_kg,
            utilization_pct: route.utilization_pct(),
            distance_km: route.total_distance_km,
            duration_min: route.total_duration_min,
            fuel_cost: route.total_fuel_cost,
            fuel_cost_per_stop: if stops > 0 {
                route.total_fuel_cost / stops as f64
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub service_date: i64,
    pub total_pickups: usize,
    pub assigned_pickups: usize,
    pub unassigned_pickups: usize,
    pub total_drivers: usize,
    pub drivers_used: usize,
    pub total_distance_km: f64,
    pub total_duration_min: f64,
    pub total_fuel_cost: f64,
    pub total_load_kg: f64,
    pub average_utilization_pct: f64,
    pub average_stops_per_driver: f64,
    pub drivers: Vec<DriverPerformance>,
    pub unassigned: Vec<UnassignedPickup>,
}

/// Everything a run hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub summary: FleetSummary,
    pub routes: Vec<RouteSummary>,
    pub pickup_updates: Vec<PickupUpdate>,
    pub driver_updates: Vec<DriverUpdate>,
    pub warnings: Vec<RouteWarning>,
}

pub fn pickup_updates(routes: &[RouteSummary]) -> Vec<PickupUpdate> {
    routes
        .iter()
        .flat_map(|route| &route.assignments)
        .map(|assignment| PickupUpdate {
            pickup_id: assignment.pickup_id.clone(),
            status: PickupStatus::Assigned,
            driver_id: assignment.driver_id.clone(),
            sequence: assignment.sequence,
            arrival_at: assignment.arrival_at,
            leg_distance_km: assignment.leg_distance_km,
            leg_duration_min: assignment.leg_duration_min,
            leg_fuel_cost: assignment.leg_fuel_cost,
        })
        .collect()
}

/// One update per route. The load is read from `fleet`, which already holds
/// the committed weights.
pub fn driver_updates(routes: &[RouteSummary], fleet: &[VehicleState]) -> Vec<DriverUpdate> {
    routes
        .iter()
        .map(|route| {
            let vehicle_load_kg = fleet
                .iter()
                .find(|vehicle| vehicle.driver_id == route.driver_id)
                .map_or(route.total_weight_kg, |vehicle| vehicle.current_load_kg);
            DriverUpdate {
                driver_id: route.driver_id.clone(),
                vehicle_id: route.vehicle_id.clone(),
                pickup_ids: route.assignments.iter().map(|a| a.pickup_id.clone()).collect(),
                vehicle_load_kg,
                total_distance_km: route.total_distance_km,
                total_duration_min: route.total_duration_min,
                total_fuel_cost: route.total_fuel_cost,
                started_at: route.started_at,
                finished_at: route.finished_at,
            }
        })
        .collect()
}

/// Adds each route's weight to its vehicle's load.
pub fn commit_loads(routes: &[RouteSummary], fleet: &mut [VehicleState]) {
    for route in routes {
        if let Some(vehicle) = fleet.iter_mut().find(|v| v.driver_id == route.driver_id) {
            vehicle.current_load_kg += route.total_weight_kg;
        }
    }
}

pub fn fleet_summary(
    service_date: i64,
    total_drivers: usize,
    routes: &[RouteSummary],
    unassigned: &[UnassignedPickup],
) -> FleetSummary {
    let drivers: Vec<DriverPerformance> = routes.iter().map(DriverPerformance::from).collect();
    let assigned_pickups: usize = routes.iter().map(|r| r.assignments.len()).sum();
    let drivers_used = routes.len();

    let (average_utilization_pct, average_stops_per_driver) = if drivers_used > 0 {
        let utilization: f64 = drivers.iter().map(|d| d.utilization_pct).sum();
        (
            utilization / drivers_used as f64,
            assigned_pickups as f64 / drivers_used as f64,
        )
    } else {
        (0.0, 0.0)
    };

    FleetSummary {
        service_date,
        total_pickups: assigned_pickups + unassigned.len(),
        assigned_pickups,
        unassigned_pickups: unassigned.len(),
        total_drivers,
        drivers_used,
        total_distance_km: routes.iter().map(|r| r.total_distance_km).sum(),
        total_duration_min: routes.iter().map(|r| r.total_duration_min).sum(),
        total_fuel_cost: routes.iter().map(|r| r.total_fuel_cost).sum(),
        total_load_kg: routes.iter().map(|r| r.total_weight_kg).sum(),
        average_utilization_pct,
        average_stops_per_driver,
        drivers,
        unassigned: unassigned.to_vec(),
    }
}

/// Builds the full report for a run whose loads are already committed to `fleet`.
pub fn reconcile(
    service_date: i64,
    total_drivers: usize,
    routes: Vec<RouteSummary>,
    unassigned: Vec<UnassignedPickup>,
    warnings: Vec<RouteWarning>,
    fleet: &[VehicleState],
) -> PlanReport {
    PlanReport {
        summary: fleet_summary(service_date, total_drivers, &routes, &unassigned),
        pickup_updates: pickup_updates(&routes),
        driver_updates: driver_updates(&routes, fleet),
        routes,
        warnings,
    }
}
