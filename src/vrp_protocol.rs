//! Wire format of the external VRP optimizer and its mapping to domain records.
//!
//! Jobs and vehicles are identified positionally: job `i + 1` is the i-th
//! pickup of the [`PreparedRequest`], vehicle `i + 1` the i-th fleet entry.
//! Times on the wire are seconds from midnight of the service date.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::PlannerConfig;
use crate::error::{PlannerError, ValidationError};
use crate::model::{
    Location, PickupRequest, RouteSummary, RouteWarning, UnassignedPickup, UnassignedReason,
    VehicleState,
};
use crate::sequence::{Leg, RouteBuilder};

/// Latitude limit accepted by the optimizer (Web Mercator bounds).
pub const MAX_LATITUDE: f64 = 85.06;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: usize,
    /// `[longitude, latitude]`
    pub location: [f64; 2],
    /// Service duration in seconds.
    pub service: i64,
    pub amount: Vec<i64>,
    pub time_windows: Vec<[i64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VrpVehicle {
    pub id: usize,
    pub profile: String,
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub capacity: Vec<i64>,
    pub time_window: [i64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub jobs: Vec<Job>,
    pub vehicles: Vec<VrpVehicle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Start,
    Job,
    Pickup,
    Delivery,
    Break,
    End,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseStep {
    #[serde(rename = "type")]
    pub kind: StepKind,
    #[serde(default)]
    pub id: Option<usize>,
    /// Older responses carry the job id here instead of `id`.
    #[serde(default)]
    pub job: Option<usize>,
    #[serde(default)]
    pub location: Option<[f64; 2]>,
    /// Seconds from midnight.
    #[serde(default)]
    pub arrival: Option<i64>,
    /// Cumulative travel time in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Cumulative distance in meters.
    #[serde(default)]
    pub distance: Option<f64>,
}

impl ResponseStep {
    pub fn job_id(&self) -> Option<usize> {
        self.id.or(self.job)
    }

    fn is_job(&self) -> bool {
        matches!(self.kind, StepKind::Job | StepKind::Pickup | StepKind::Delivery)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRoute {
    pub vehicle: usize,
    #[serde(default)]
    pub steps: Vec<ResponseStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseUnassigned {
    pub id: usize,
    #[serde(default)]
    pub location: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResponse {
    #[serde(default)]
    pub routes: Vec<ResponseRoute>,
    #[serde(default)]
    pub unassigned: Vec<ResponseUnassigned>,
}

/// A request plus the records its positional ids refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub request: OptimizationRequest,
    pub pickups: Vec<PickupRequest>,
    pub fleet: Vec<VehicleState>,
    pub service_date: i64,
}

impl PreparedRequest {
    fn pickup(&self, job_id: usize) -> Option<&PickupRequest> {
        job_id.checked_sub(1).and_then(|i| self.pickups.get(i))
    }

    fn vehicle(&self, vehicle_id: usize) -> Option<&VehicleState> {
        vehicle_id.checked_sub(1).and_then(|i| self.fleet.get(i))
    }
}

/// Builds the optimizer request for pending pickups and resolved vehicles.
pub fn build_request(
    pickups: &[PickupRequest],
    fleet: &[VehicleState],
    service_date: i64,
    config: &PlannerConfig,
) -> PreparedRequest {
    let jobs = pickups
        .iter()
        .enumerate()
        .map(|(i, pickup)| {
            let (start, end) = pickup.window(config.pickup_window_secs);
            Job {
                id: i + 1,
                location: pickup.location.as_lon_lat(),
                service: config.service_duration_secs,
                amount: vec![pickup.weight_kg.ceil() as i64],
                time_windows: vec![[start - service_date, end - service_date]],
            }
        })
        .collect();

    let (day_start, day_end) = config.vehicle_window_secs;
    let vehicles = fleet
        .iter()
        .enumerate()
        .map(|(i, vehicle)| VrpVehicle {
            id: i + 1,
            profile: config.vrp_profile.clone(),
            start: vehicle.location.as_lon_lat(),
            end: vehicle.location.as_lon_lat(),
            capacity: vec![vehicle.remaining_kg().max(0.0).floor() as i64],
            time_window: [day_start, day_end],
        })
        .collect();

    PreparedRequest {
        request: OptimizationRequest { jobs, vehicles },
        pickups: pickups.to_vec(),
        fleet: fleet.to_vec(),
        service_date,
    }
}

fn check_bounds(kind: &'static str, id: String, location: [f64; 2]) -> Result<(), ValidationError> {
    let [longitude, latitude] = location;
    let valid = (-180.0..=180.0).contains(&longitude) && (-MAX_LATITUDE..=MAX_LATITUDE).contains(&latitude);
    if valid {
        Ok(())
    } else {
        Err(ValidationError::CoordinateOutOfBounds {
            kind,
            id,
            longitude,
            latitude,
        })
    }
}

/// Rejects a request whose coordinates the optimizer cannot project.
pub fn validate_request(prepared: &PreparedRequest) -> Result<(), ValidationError> {
    for (job, pickup) in prepared.request.jobs.iter().zip(&prepared.pickups) {
        check_bounds("pickup", pickup.id.clone(), job.location)?;
    }
    for (vehicle, state) in prepared.request.vehicles.iter().zip(&prepared.fleet) {
        check_bounds("vehicle", state.vehicle_id.clone(), vehicle.start)?;
        check_bounds("vehicle", state.vehicle_id.clone(), vehicle.end)?;
    }
    Ok(())
}

/// [`build_request`] followed by [`validate_request`].
pub fn prepare(
    pickups: &[PickupRequest],
    fleet: &[VehicleState],
    service_date: i64,
    config: &PlannerConfig,
) -> Result<PreparedRequest, PlannerError> {
    let prepared = build_request(pickups, fleet, service_date, config);
    validate_request(&prepared)?;
    Ok(prepared)
}

/// Routes and leftovers recovered from an optimizer response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    pub routes: Vec<RouteSummary>,
    pub unassigned: Vec<UnassignedPickup>,
    pub warnings: Vec<RouteWarning>,
}

/// Maps an optimizer response back onto the prepared pickups and drivers.
///
/// Malformed routes are skipped with a warning and their pickups reported as
/// unassigned. Every prepared pickup ends up in exactly one route or in the
/// unassigned list.
pub fn parse_response(
    response: &OptimizationResponse,
    prepared: &PreparedRequest,
    fuel_price: f64,
    config: &PlannerConfig,
) -> Result<ParsedResponse, PlannerError> {
    if response.routes.is_empty() && !response.unassigned.is_empty() {
        let mut pickups: Vec<String> = response
            .unassigned
            .iter()
            .filter_map(|job| prepared.pickup(job.id))
            .map(|pickup| pickup.id.clone())
            .collect();
        if pickups.is_empty() {
            // None of the ids match a job, so nothing in the request was routed.
            pickups = prepared.pickups.iter().map(|pickup| pickup.id.clone()).collect();
        }
        return Err(PlannerError::Unroutable { pickups });
    }

    let mut claimed = vec![false; prepared.pickups.len()];
    let mut skipped: HashSet<usize> = HashSet::new();
    let mut used_vehicles: HashSet<usize> = HashSet::new();
    let mut parsed = ParsedResponse::default();

    for route in &response.routes {
        let Some(vehicle) = prepared.vehicle(route.vehicle) else {
            skip_route(&mut parsed, &mut skipped, route, None, format!("unknown vehicle {}", route.vehicle));
            continue;
        };
        if !used_vehicles.insert(route.vehicle) {
            let message = format!("vehicle {} has more than one route", route.vehicle);
            skip_route(&mut parsed, &mut skipped, route, Some(vehicle), message);
            continue;
        }

        match parse_route(route, vehicle, prepared, &claimed, fuel_price, config) {
            Ok(Some((summary, jobs))) => {
                for index in jobs {
                    claimed[index] = true;
                }
                parsed.routes.push(summary);
            }
            Ok(None) => {}
            Err(message) => skip_route(&mut parsed, &mut skipped, route, Some(vehicle), message),
        }
    }

    let not_routed: HashSet<usize> = response.unassigned.iter().map(|job| job.id).collect();
    for (index, pickup) in prepared.pickups.iter().enumerate() {
        if claimed[index] {
            continue;
        }
        let job_id = index + 1;
        let reason = if skipped.contains(&job_id) && !not_routed.contains(&job_id) {
            UnassignedReason::UnmatchedRoute
        } else {
            UnassignedReason::NotRouted
        };
        parsed.unassigned.push(UnassignedPickup::new(pickup, reason));
    }

    Ok(parsed)
}

fn skip_route(
    parsed: &mut ParsedResponse,
    skipped: &mut HashSet<usize>,
    route: &ResponseRoute,
    vehicle: Option<&VehicleState>,
    message: String,
) {
    let driver_id = vehicle.map(|v| v.driver_id.clone());
    warn!(vehicle = route.vehicle, driver = ?driver_id, %message, "skipping optimizer route");
    skipped.extend(route.steps.iter().filter(|s| s.is_job()).filter_map(ResponseStep::job_id));
    parsed.warnings.push(RouteWarning { driver_id, message });
}

/// Progress along a route's cumulative distance and duration counters.
struct Cursor {
    location: Location,
    distance_m: Option<f64>,
    duration_s: Option<f64>,
}

impl Cursor {
    fn leg_to(&mut self, to: Location, step: &ResponseStep, config: &PlannerConfig) -> Leg {
        let estimate = Leg::estimate(self.location, to, config);
        let distance_km = match (self.distance_m, step.distance) {
            (Some(from), Some(at)) if at >= from => (at - from) / 1000.0,
            _ => estimate.distance_km,
        };
        let duration_min = match (self.duration_s, step.duration) {
            (Some(from), Some(at)) if at >= from => (at - from) / 60.0,
            _ => estimate.duration_min,
        };

        self.location = to;
        self.distance_m = step.distance;
        self.duration_s = step.duration;
        Leg {
            distance_km,
            duration_min,
        }
    }
}

fn step_location(step: &ResponseStep) -> Option<Location> {
    step.location.map(|[longitude, latitude]| Location::new(longitude, latitude))
}

type ParsedRoute = (RouteSummary, Vec<usize>);

fn parse_route(
    route: &ResponseRoute,
    vehicle: &VehicleState,
    prepared: &PreparedRequest,
    claimed: &[bool],
    fuel_price: f64,
    config: &PlannerConfig,
) -> Result<Option<ParsedRoute>, String> {
    if !route.steps.iter().any(ResponseStep::is_job) {
        return Ok(None);
    }

    let start_step = route.steps.iter().find(|s| s.kind == StepKind::Start);
    let mut cursor = Cursor {
        location: start_step.and_then(step_location).unwrap_or(vehicle.location),
        distance_m: start_step.map_or(Some(0.0), |s| s.distance.or(Some(0.0))),
        duration_s: start_step.map_or(Some(0.0), |s| s.duration.or(Some(0.0))),
    };
    let started_at = start_step
        .and_then(|s| s.arrival)
        .map_or(vehicle.available_from, |secs| prepared.service_date + secs);

    let mut builder = RouteBuilder::new(vehicle, cursor.location, started_at, fuel_price, config);
    let mut jobs: Vec<usize> = Vec::new();
    let mut load_kg = 0.0;
    let mut finish: Option<(Leg, Option<i64>)> = None;

    for step in &route.steps {
        if step.is_job() {
            let job_id = step.job_id().ok_or_else(|| "job step without id".to_string())?;
            let index = job_id
                .checked_sub(1)
                .filter(|i| *i < prepared.pickups.len())
                .ok_or_else(|| format!("step references unknown job {job_id}"))?;
            if claimed[index] || jobs.contains(&index) {
                return Err(format!("job {job_id} is routed more than once"));
            }
            let pickup = &prepared.pickups[index];
            let leg = cursor.leg_to(pickup.location, step, config);
            let arrival_at = step.arrival.map(|secs| prepared.service_date + secs);
            builder.visit(pickup, leg, arrival_at);
            load_kg += pickup.weight_kg;
            jobs.push(index);
        } else if step.kind == StepKind::End {
            let end = step_location(step).unwrap_or(vehicle.location);
            let leg = cursor.leg_to(end, step, config);
            finish = Some((leg, step.arrival.map(|secs| prepared.service_date + secs)));
        }
    }

    if load_kg > vehicle.remaining_kg() {
        return Err(format!(
            "route carries {load_kg} kg, over the {} kg available",
            vehicle.remaining_kg()
        ));
    }

    let (leg, finished_at) = finish.unwrap_or_else(|| (Leg::estimate(cursor.location, vehicle.location, config), None));
    Ok(Some((builder.finish(leg, finished_at), jobs)))
}
