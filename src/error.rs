use thiserror::Error;

/// Input problems that abort a run before any assignment or network call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("No pending pickups for the service date")]
    NoPendingPickups,

    #[error("No available drivers")]
    NoAvailableDrivers,

    #[error("Driver {0} is available but has no vehicle")]
    DriverWithoutVehicle(String),

    #[error("No fuel price configured")]
    MissingFuelPrice,

    #[error("Fuel price {0} per liter is not positive")]
    InvalidFuelPrice(f64),

    #[error("Pickup {id} has invalid weight {weight_kg} kg")]
    InvalidWeight { id: String, weight_kg: f64 },

    #[error("Service date {0} is already being planned in this batch")]
    DuplicateServiceDate(i64),

    #[error("{kind} {id} has coordinate ({longitude}, {latitude}) out of bounds")]
    CoordinateOutOfBounds {
        kind: &'static str,
        id: String,
        longitude: f64,
        latitude: f64,
    },
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Optimization service rejected the credentials")]
    InvalidCredentials,

    #[error("Optimization service endpoint not found: {0}")]
    AdapterEndpoint(String),

    #[error("Optimization service rate limit exceeded")]
    RateLimited,

    #[error("Optimization request failed: {status} - {body}")]
    OptimizationRequestFailed { status: u16, body: String },

    #[error("Optimizer returned no routes; unroutable pickups: {}", .pickups.join(", "))]
    Unroutable { pickups: Vec<String> },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Deserialization error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PlannerError {
    /// External-service failures a caller may retry in a later run.
    ///
    /// Rejections of the request itself (4xx) are not retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlannerError::RateLimited | PlannerError::Transport(_) => true,
            PlannerError::OptimizationRequestFailed { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
