//! Command handlers: one per verb, each a `construct` + `execute` pair.
//!
//! Replaces the reference agent's filesystem-scanned, naming-convention
//! handler discovery with a compile-time set of types implementing
//! [`CommandHandler`]; [`crate::registry`] maps verb names to constructors.

mod goto;
mod land;
mod params;
mod rtl;
mod takeoff;
mod wait;
mod yaw;

pub use goto::Goto;
pub use land::Land;
pub use rtl::Rtl;
pub use takeoff::Takeoff;
pub use wait::Wait;
pub use yaw::Yaw;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::backend::AutopilotBackend;
use crate::types::CommandResult;

#[derive(Debug, Error, Clone)]
pub enum CommandError {
    #[error("invalid_parameters: {0}")]
    InvalidParameters(String),
}

/// A constructed, ready-to-run command instance.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, backend: &dyn AutopilotBackend) -> CommandResult;
}

/// A handler's `construct` entry point, as stored in the registry's table.
pub type ConstructFn = fn(&HashMap<String, Value>) -> Result<Box<dyn CommandHandler>, CommandError>;

pub(crate) fn relative_altitude_m(snapshot: &crate::types::TelemetrySnapshot) -> f64 {
    snapshot.position.map(|p| p.relative_altitude_m).unwrap_or(0.0)
}
