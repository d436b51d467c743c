//! Autopilot backend: connection lifecycle, action surface, and telemetry.
//!
//! [`AutopilotBackend`] is the trait command handlers and the executor
//! program against; [`MavlinkBackend`] is the production implementation
//! speaking MAVLink to a real or SITL autopilot, and [`mock::MockBackend`]
//! is the fixture used by handler/executor unit tests and the end-to-end
//! scenario tests.

mod connect;
mod mavlink_backend;
pub mod mock;
mod telemetry;

pub use connect::resolve_candidate_endpoints;
pub use mavlink_backend::MavlinkBackend;
pub use telemetry::TelemetryAggregator;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Origin, TelemetrySnapshot};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend not connected")]
    Disconnected,
    #[error("connection attempt exhausted all candidate endpoints")]
    ConnectionExhausted,
    #[error("autopilot rejected action: {0}")]
    ActionRejected(String),
    #[error("mavlink transport error: {0}")]
    Transport(String),
}

/// The action + telemetry surface the command handlers and executor depend on.
///
/// Implementors must guarantee: `connect()` is idempotent on success and
/// safe to retry on failure; `get_telemetry()` always returns a snapshot
/// with `connected` and `timestamp` freshly set and `px4_origin` filled
/// (real if latched, else the configured default).
#[async_trait]
pub trait AutopilotBackend: Send + Sync {
    async fn connect(&self) -> bool;
    async fn disconnect(&self);
    async fn get_telemetry(&self) -> TelemetrySnapshot;
    async fn get_px4_origin(&self) -> Option<Origin>;
    fn is_connected(&self) -> bool;

    async fn action_arm(&self) -> Result<(), BackendError>;
    async fn action_set_takeoff_altitude(&self, altitude_m: f64) -> Result<(), BackendError>;
    async fn action_takeoff(&self) -> Result<(), BackendError>;
    async fn action_land(&self) -> Result<(), BackendError>;
    async fn action_return_to_launch(&self) -> Result<(), BackendError>;
    async fn action_goto_location(
        &self,
        lat: f64,
        lon: f64,
        alt_msl_m: f64,
        yaw_deg: f64,
    ) -> Result<(), BackendError>;
    async fn action_set_current_heading(&self, heading_deg: f64) -> Result<(), BackendError>;
}
