//! Blocking HTTP adapter for the external VRP optimizer.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::error::PlannerError;
use crate::traits::OptimizationTransport;
use crate::vrp_protocol::{OptimizationRequest, OptimizationResponse};

pub const BASE_URL_ENV: &str = "VRP_BASE_URL";
pub const API_KEY_ENV: &str = "VRP_API_KEY";
pub const TIMEOUT_ENV: &str = "VRP_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct VrpClientConfig {
    /// Full URL of the optimization endpoint.
    pub base_url: String,
    /// Bearer token, sent as `Authorization: Bearer <token>`.
    pub api_key: Option<String>,
    /// Deadline for one request, connect through body.
    pub timeout_secs: u64,
}

impl Default for VrpClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org/optimization".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl VrpClientConfig {
    /// Defaults overridden by `VRP_BASE_URL`, `VRP_API_KEY` and `VRP_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var(BASE_URL_ENV).unwrap_or(defaults.base_url),
            api_key: std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty()),
            timeout_secs: std::env::var(TIMEOUT_ENV)
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VrpClient {
    config: VrpClientConfig,
    client: reqwest::blocking::Client,
}

impl VrpClient {
    pub fn new(config: VrpClientConfig) -> Result<Self, PlannerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

/// Maps a non-success status to the planner's failure taxonomy.
pub fn classify_status(status: StatusCode, body: String) -> PlannerError {
    match status {
        StatusCode::UNAUTHORIZED => PlannerError::InvalidCredentials,
        StatusCode::NOT_FOUND => PlannerError::AdapterEndpoint(body),
        StatusCode::TOO_MANY_REQUESTS => PlannerError::RateLimited,
        other => PlannerError::OptimizationRequestFailed {
            status: other.as_u16(),
            body,
        },
    }
}

impl OptimizationTransport for VrpClient {
    fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationResponse, PlannerError> {
        let mut builder = self.client.post(&self.config.base_url).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        debug!(
            url = %self.config.base_url,
            jobs = request.jobs.len(),
            vehicles = request.vehicles.len(),
            "sending optimization request"
        );
        let response = builder.send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(classify_status(status, body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}
