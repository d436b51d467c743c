//! drone-agent: per-vehicle drone control agent library.
//!
//! Accepts mission command sequences, executes them against an autopilot
//! over MAVLink, streams telemetry back, and enforces safety semantics
//! (emergency return-to-launch on critical failure, flight-state
//! preconditions, reconnection on link loss).
//!
//! ## Layout
//!
//! - [`backend`] — autopilot connection lifecycle, telemetry aggregation, action surface.
//! - [`commands`] — one handler per verb (takeoff, land, rtl, goto, yaw, wait).
//! - [`registry`] — compile-time verb → constructor + JSON-Schema table.
//! - [`executor`] — sequence orchestration and failure-policy branching.
//! - [`context`] — explicit process-wide live state (agent id, backend, executor).
//! - [`api`] — thin HTTP edge over the executor and backend.
//! - [`config`] — operator-tunable settings, loaded once at startup.
//! - [`geodesy`] — WGS-84 NED↔geodetic conversion used by `goto`.

pub mod api;
pub mod backend;
pub mod commands;
pub mod config;
pub mod context;
pub mod executor;
pub mod geodesy;
pub mod registry;
pub mod types;
