//! First-Fit-Decreasing packing.
//!
//! Pickups are taken heaviest first and placed in the first vehicle (in fleet
//! order) with enough room left. There is no utilization ceiling: a vehicle
//! may be packed to its full nominal capacity. Each vehicle's stops are then
//! ordered by distance from the depot.

use tracing::{debug, warn};

use crate::config::PlannerConfig;
use crate::model::{PickupRequest, UnassignedPickup, UnassignedReason, VehicleState};
use crate::sequence::{build_route, depot_proximity_order};
use crate::traits::{AssignmentPolicy, PolicyOutcome};

#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFitDecreasing;

impl AssignmentPolicy for FirstFitDecreasing {
    fn name(&self) -> &'static str {
        "first-fit-decreasing"
    }

    fn assign(
        &self,
        pickups: &[PickupRequest],
        fleet: &mut [VehicleState],
        fuel_price: f64,
        config: &PlannerConfig,
    ) -> PolicyOutcome {
        let mut sorted: Vec<&PickupRequest> = pickups.iter().collect();
        sorted.sort_by(|a, b| b.weight_kg.total_cmp(&a.weight_kg));

        let largest_capacity = fleet.iter().map(|v| v.capacity_kg).fold(0.0, f64::max);
        let mut bins: Vec<Vec<&PickupRequest>> = vec![Vec::new(); fleet.len()];
        let mut unassigned = Vec::new();

        for pickup in sorted {
            match fleet.iter().position(|vehicle| vehicle.can_carry(pickup.weight_kg)) {
                Some(index) => {
                    fleet[index].current_load_kg += pickup.weight_kg;
                    bins[index].push(pickup);
                }
                None => {
                    let reason = if pickup.weight_kg > largest_capacity {
                        UnassignedReason::ExceedsCapacity
                    } else {
                        UnassignedReason::NoRemainingCapacity
                    };
                    warn!(
                        pickup = %pickup.id,
                        weight_kg = pickup.weight_kg,
                        ?reason,
                        "pickup could not be packed"
                    );
                    unassigned.push(UnassignedPickup::new(pickup, reason));
                }
            }
        }

        let routes = fleet
            .iter()
            .zip(bins)
            .filter(|(_, bin)| !bin.is_empty())
            .map(|(vehicle, bin)| {
                let ordered: Vec<&PickupRequest> = depot_proximity_order(config.depot, &bin)
                    .into_iter()
                    .map(|i| bin[i])
                    .collect();
                debug!(
                    driver = %vehicle.driver_id,
                    stops = ordered.len(),
                    load_kg = vehicle.current_load_kg,
                    "packed vehicle"
                );
                build_route(vehicle, config.depot, &ordered, fuel_price, config)
            })
            .collect();

        PolicyOutcome { routes, unassigned }
    }
}
