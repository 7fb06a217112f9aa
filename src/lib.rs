//! pickup-planner core
//!
//! Assigns pending waste pickups to a driver fleet under vehicle capacity
//! limits, orders each driver's stops and prices the resulting routes.
//! Route geometry can optionally be delegated to an external VRP service.

pub mod model;
pub mod config;
pub mod error;
pub mod traits;
pub mod haversine;
pub mod sequence;
pub mod first_fit;
pub mod best_score;
pub mod vrp_protocol;
pub mod vrp_client;
pub mod reconcile;
pub mod solver;
