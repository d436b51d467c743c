//! Agent Configuration Module
//!
//! Provides agent configuration loaded from a TOML file with CLI/env overrides,
//! replacing hardcoded connection strings and tunables with operator-settable
//! values.
//!
//! ## Loading Order
//!
//! 1. CLI flags (`--agent-id`, `--port`, `--mavsdk-connection`)
//! 2. `DRONE_AGENT_CONFIG` environment variable (path to TOML file)
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(AgentConfig::load(cli_args));
//!
//! // Anywhere in the codebase:
//! let radius = config::get().defaults.goto_acceptance_radius_m;
//! ```

mod agent_config;
pub mod defaults;

pub use agent_config::*;

use std::sync::OnceLock;

/// Holds the one `AgentConfig` this process will ever load. Every handler,
/// the executor, and the HTTP edge read through [`get`] rather than passing
/// a `&AgentConfig` down every call chain — this vehicle's tunables don't
/// change after `main` finishes parsing CLI flags and the config file, so
/// threading a reference everywhere would buy nothing over a process-wide
/// slot filled exactly once.
static AGENT_CONFIG: OnceLock<AgentConfig> = OnceLock::new();

/// Fill the slot [`get`] reads from. Call this once, from `main`, before
/// spinning up the router or the backend — every other caller assumes it
/// already happened.
pub fn init(config: AgentConfig) {
    if AGENT_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called a second time — keeping the first configuration");
    }
}

/// Read the loaded `AgentConfig`.
///
/// A call before `init()` means startup ordering is broken somewhere, so
/// this panics instead of returning a half-built default — a drone agent
/// should refuse to run on guessed tunables rather than arm on them.
pub fn get() -> &'static AgentConfig {
    AGENT_CONFIG
        .get()
        .expect("config::get() reached before config::init() ran — fix the startup order")
}

/// Whether `init()` has already run, for tests that build state without
/// going through `main`'s startup sequence.
pub fn is_initialized() -> bool {
    AGENT_CONFIG.get().is_some()
}
