//! Planning runs: one service date, one batch of pickups.
//!
//! A run rebuilds all working state from the caller's input and hands back a
//! [`PlanReport`]. Runs for different dates share nothing and may execute in
//! parallel; the caller must not start two runs for the same date at once.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::best_score::BestScore;
use crate::config::PlannerConfig;
use crate::error::{PlannerError, ValidationError};
use crate::first_fit::FirstFitDecreasing;
use crate::model::{Driver, FuelPrice, PickupRequest, SECONDS_PER_DAY, VehicleState};
use crate::reconcile::{PlanReport, commit_loads, reconcile};
use crate::traits::{AssignmentPolicy, OptimizationTransport, PolicyOutcome};
use crate::vrp_protocol::{parse_response, prepare};

/// Records supplied by the calling layer for one service date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningInput {
    /// Midnight at the start of the day being planned (unix seconds).
    pub service_date: i64,
    pub pickups: Vec<PickupRequest>,
    pub drivers: Vec<Driver>,
    pub fuel_prices: Vec<FuelPrice>,
}

/// Built-in policies, selectable by name in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    FirstFitDecreasing,
    BestScore,
}

impl AssignmentPolicy for Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::FirstFitDecreasing => FirstFitDecreasing.name(),
            Strategy::BestScore => BestScore.name(),
        }
    }

    fn assign(
        &self,
        pickups: &[PickupRequest],
        fleet: &mut [VehicleState],
        fuel_price: f64,
        config: &PlannerConfig,
    ) -> PolicyOutcome {
        match self {
            Strategy::FirstFitDecreasing => FirstFitDecreasing.assign(pickups, fleet, fuel_price, config),
            Strategy::BestScore => BestScore.assign(pickups, fleet, fuel_price, config),
        }
    }
}

/// Validated working set of a run.
struct RunContext {
    pickups: Vec<PickupRequest>,
    fleet: Vec<VehicleState>,
    /// Available drivers without a vehicle.
    vehicleless: Vec<String>,
    fuel_price: f64,
}

fn prepare_run(input: &PlanningInput, config: &PlannerConfig) -> Result<RunContext, PlannerError> {
    let pickups: Vec<PickupRequest> = input
        .pickups
        .iter()
        .filter(|pickup| pickup.is_pending_on(input.service_date))
        .cloned()
        .collect();
    if pickups.is_empty() {
        return Err(ValidationError::NoPendingPickups.into());
    }

    let mut fleet = Vec::new();
    let mut vehicleless = Vec::new();
    for driver in input.drivers.iter().filter(|driver| driver.is_available()) {
        match VehicleState::resolve(driver, input.service_date, config)? {
            Some(vehicle) => fleet.push(vehicle),
            None => vehicleless.push(driver.id.clone()),
        }
    }
    if fleet.is_empty() && vehicleless.is_empty() {
        return Err(ValidationError::NoAvailableDrivers.into());
    }

    let day_end = input.service_date + SECONDS_PER_DAY - 1;
    let fuel_price = FuelPrice::effective(&input.fuel_prices, day_end)
        .ok_or(ValidationError::MissingFuelPrice)?
        .price_per_liter;
    if fuel_price <= 0.0 {
        return Err(ValidationError::InvalidFuelPrice(fuel_price).into());
    }

    for pickup in &pickups {
        if !(pickup.weight_kg.is_finite() && pickup.weight_kg > 0.0) {
            return Err(ValidationError::InvalidWeight {
                id: pickup.id.clone(),
                weight_kg: pickup.weight_kg,
            }
            .into());
        }
        if !pickup.location.is_valid() {
            return Err(ValidationError::CoordinateOutOfBounds {
                kind: "pickup",
                id: pickup.id.clone(),
                longitude: pickup.location.longitude,
                latitude: pickup.location.latitude,
            }
            .into());
        }
    }

    Ok(RunContext {
        pickups,
        fleet,
        vehicleless,
        fuel_price,
    })
}

/// Plans one date with an in-process assignment policy.
///
/// Available drivers without a vehicle are left out of the fleet.
pub fn plan<P>(input: &PlanningInput, policy: &P, config: &PlannerConfig) -> Result<PlanReport, PlannerError>
where
    P: AssignmentPolicy + ?Sized,
{
    let mut run = prepare_run(input, config)?;
    if run.fleet.is_empty() {
        return Err(ValidationError::NoAvailableDrivers.into());
    }
    for driver_id in &run.vehicleless {
        warn!(driver = %driver_id, "available driver has no vehicle, skipping");
    }

    info!(
        policy = policy.name(),
        service_date = input.service_date,
        pickups = run.pickups.len(),
        vehicles = run.fleet.len(),
        "planning run started"
    );
    let outcome = policy.assign(&run.pickups, &mut run.fleet, run.fuel_price, config);

    let report = reconcile(
        input.service_date,
        run.fleet.len(),
        outcome.routes,
        outcome.unassigned,
        Vec::new(),
        &run.fleet,
    );
    log_finished(&report);
    Ok(report)
}

/// Plans one date through an external optimizer.
///
/// All validation happens before the transport is called, and vehicle loads
/// are only updated once the response has been parsed.
pub fn plan_external<T>(
    input: &PlanningInput,
    transport: &T,
    config: &PlannerConfig,
) -> Result<PlanReport, PlannerError>
where
    T: OptimizationTransport + ?Sized,
{
    let mut run = prepare_run(input, config)?;
    if let Some(driver_id) = run.vehicleless.first() {
        return Err(ValidationError::DriverWithoutVehicle(driver_id.clone()).into());
    }

    let prepared = prepare(&run.pickups, &run.fleet, input.service_date, config)?;
    info!(
        service_date = input.service_date,
        jobs = prepared.request.jobs.len(),
        vehicles = prepared.request.vehicles.len(),
        "requesting external optimization"
    );
    let response = transport.optimize(&prepared.request)?;
    let parsed = parse_response(&response, &prepared, run.fuel_price, config)?;

    commit_loads(&parsed.routes, &mut run.fleet);
    let report = reconcile(
        input.service_date,
        run.fleet.len(),
        parsed.routes,
        parsed.unassigned,
        parsed.warnings,
        &run.fleet,
    );
    log_finished(&report);
    Ok(report)
}

/// Plans several dates in parallel, one result per input in input order.
///
/// A date that appears more than once is planned only at its first occurrence.
pub fn plan_dates<P>(
    inputs: &[PlanningInput],
    policy: &P,
    config: &PlannerConfig,
) -> Vec<Result<PlanReport, PlannerError>>
where
    P: AssignmentPolicy + Sync + ?Sized,
{
    let mut seen = HashSet::new();
    let first_occurrence: Vec<bool> = inputs.iter().map(|input| seen.insert(input.service_date)).collect();

    inputs
        .par_iter()
        .zip(first_occurrence)
        .map(|(input, first)| {
            if first {
                plan(input, policy, config)
            } else {
                Err(ValidationError::DuplicateServiceDate(input.service_date).into())
            }
        })
        .collect()
}

fn log_finished(report: &PlanReport) {
    let summary = &report.summary;
    info!(
        service_date = summary.service_date,
        assigned = summary.assigned_pickups,
        unassigned = summary.unassigned_pickups,
        drivers_used = summary.drivers_used,
        distance_km = summary.total_distance_km,
        fuel_cost = summary.total_fuel_cost,
        "planning run finished"
    );
}
