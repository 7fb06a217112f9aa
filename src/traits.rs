//! Seams of the planner: distance source, assignment policy and the
//! transport to an external optimizer.

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::model::{Location, PickupRequest, RouteSummary, UnassignedPickup, VehicleState};
use crate::vrp_protocol::{OptimizationRequest, OptimizationResponse};

/// Provides a pairwise distance matrix (km) for a set of locations.
///
/// The matrix is indexed by the provided location order.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[Location]) -> Vec<Vec<f64>>;
}

/// Sequenced routes and leftovers produced by one policy run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyOutcome {
    pub routes: Vec<RouteSummary>,
    pub unassigned: Vec<UnassignedPickup>,
}

/// Rule for packing pickups onto vehicles and ordering each vehicle's stops.
///
/// Implementations mutate `fleet` loads only for pickups they commit.
pub trait AssignmentPolicy {
    fn name(&self) -> &'static str;

    fn assign(
        &self,
        pickups: &[PickupRequest],
        fleet: &mut [VehicleState],
        fuel_price: f64,
        config: &PlannerConfig,
    ) -> PolicyOutcome;
}

/// Sends a prepared request to an external VRP optimizer.
///
/// Implementations should bound the call with a deadline.
pub trait OptimizationTransport {
    fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationResponse, PlannerError>;
}
