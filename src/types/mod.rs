//! Shared data structures for the drone command/telemetry domain.
//!
//! - `Command` / `CommandMode` / `CommandRequest` — the request side.
//! - `CommandResult` — the per-command outcome.
//! - `TelemetrySnapshot` and its sub-records — the backend's coherent view
//!   of the vehicle.

mod command;
mod telemetry;

pub use command::*;
pub use telemetry::*;
