//! Greedy best-score matching.
//!
//! Pickups are served by descending priority, then earliest scheduled time.
//! Each one goes to the feasible driver with the highest composite score:
//!
//! ```text
//! score = w_d * 1/(1+km) + w_u * utilization + w_c * capacity + w_f * 1/(1+fuel)
//! ```
//!
//! `utilization` is the pickup's share of capacity scaled against the
//! utilization cap, and zero above it. The cap is a soft preference only; a
//! heavy pickup can still be assigned when no better-scoring driver exists.

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::config::PlannerConfig;
use crate::haversine::{HaversineMatrix, fuel_cost};
use crate::model::{PickupRequest, UnassignedPickup, UnassignedReason, VehicleState};
use crate::sequence::{build_route, nearest_neighbor_order};
use crate::traits::{AssignmentPolicy, PolicyOutcome};

#[derive(Debug, Clone, Copy, Default)]
pub struct BestScore;

/// Composite score of giving `pickup` to `vehicle`, or `None` if it does not fit.
pub fn score(
    vehicle: &VehicleState,
    pickup: &PickupRequest,
    fuel_price: f64,
    config: &PlannerConfig,
) -> Option<f64> {
    if !vehicle.can_carry(pickup.weight_kg) {
        return None;
    }
    let weights = &config.score_weights;

    let distance_km = vehicle.location.distance_km(&pickup.location);
    let distance_score = 1.0 / (1.0 + distance_km);

    let share = pickup.weight_kg / vehicle.capacity_kg;
    let utilization_score = if share <= config.utilization_cap {
        share / config.utilization_cap
    } else {
        0.0
    };

    let capacity_score = if vehicle.remaining_kg() - pickup.weight_kg > 0.0 {
        1.0
    } else {
        0.0
    };

    let leg_cost = fuel_cost(distance_km, vehicle.fuel_l_per_km, fuel_price);
    let fuel_score = 1.0 / (1.0 + leg_cost);

    Some(
        weights.distance * distance_score
            + weights.utilization * utilization_score
            + weights.capacity * capacity_score
            + weights.fuel * fuel_score,
    )
}

impl AssignmentPolicy for BestScore {
    fn name(&self) -> &'static str {
        "best-score"
    }

    fn assign(
        &self,
        pickups: &[PickupRequest],
        fleet: &mut [VehicleState],
        fuel_price: f64,
        config: &PlannerConfig,
    ) -> PolicyOutcome {
        let mut queue: Vec<&PickupRequest> = pickups.iter().collect();
        queue.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.scheduled_at.cmp(&b.scheduled_at))
        });

        // Candidate order is fixed up front; it only matters for breaking ties.
        let mut candidates: Vec<usize> = (0..fleet.len()).collect();
        candidates.sort_by(|a, b| {
            let (va, vb) = (&fleet[*a], &fleet[*b]);
            va.current_load_kg
                .total_cmp(&vb.current_load_kg)
                .then_with(|| va.available_from.cmp(&vb.available_from))
        });

        let largest_capacity = fleet.iter().map(|v| v.capacity_kg).fold(0.0, f64::max);
        let mut stops: Vec<Vec<&PickupRequest>> = vec![Vec::new(); fleet.len()];
        let mut unassigned = Vec::new();

        for pickup in queue {
            let mut best: Option<(usize, f64)> = None;
            for &index in &candidates {
                let Some(candidate) = score(&fleet[index], pickup, fuel_price, config) else {
                    continue;
                };
                let better = match best {
                    None => true,
                    Some((_, best_score)) => candidate.total_cmp(&best_score) == Ordering::Greater,
                };
                if better {
                    best = Some((index, candidate));
                }
            }

            match best {
                Some((index, best_score)) => {
                    fleet[index].current_load_kg += pickup.weight_kg;
                    stops[index].push(pickup);
                    debug!(
                        pickup = %pickup.id,
                        driver = %fleet[index].driver_id,
                        score = best_score,
                        "matched pickup"
                    );
                }
                None => {
                    let reason = if pickup.weight_kg > largest_capacity {
                        UnassignedReason::ExceedsCapacity
                    } else {
                        UnassignedReason::NoRemainingCapacity
                    };
                    warn!(pickup = %pickup.id, weight_kg = pickup.weight_kg, ?reason, "no feasible driver");
                    unassigned.push(UnassignedPickup::new(pickup, reason));
                }
            }
        }

        let routes = fleet
            .iter()
            .zip(stops)
            .filter(|(_, assigned)| !assigned.is_empty())
            .map(|(vehicle, assigned)| {
                let ordered: Vec<&PickupRequest> =
                    nearest_neighbor_order(&HaversineMatrix, vehicle.location, &assigned)
                        .into_iter()
                        .map(|i| assigned[i])
                        .collect();
                build_route(vehicle, vehicle.location, &ordered, fuel_price, config)
            })
            .collect();

        PolicyOutcome { routes, unassigned }
    }
}
