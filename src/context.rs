//! Process-wide live state, held explicitly rather than behind free globals.
//!
//! Agent id, version, and startup time never change after boot; the
//! backend and executor are the two singletons the HTTP layer dispatches
//! against. Bundled into one struct and threaded through `axum::Router`
//! state instead of `OnceLock` statics — those only fit immutable
//! configuration, see [`crate::config`].

use std::sync::Arc;
use std::time::Instant;

use crate::backend::AutopilotBackend;
use crate::executor::CommandExecutor;

#[derive(Clone)]
pub struct AgentContext {
    pub agent_id: String,
    pub version: &'static str,
    startup_time: Instant,
    pub backend: Arc<dyn AutopilotBackend>,
    pub executor: Arc<CommandExecutor>,
}

impl AgentContext {
    pub fn new(agent_id: String, backend: Arc<dyn AutopilotBackend>, executor: Arc<CommandExecutor>) -> Self {
        Self {
            agent_id,
            version: env!("CARGO_PKG_VERSION"),
            startup_time: Instant::now(),
            backend,
            executor,
        }
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.startup_time.elapsed().as_secs_f64()
    }
}
