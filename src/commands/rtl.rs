use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::AutopilotBackend;
use crate::config::defaults::RTL_WAIT_SECS;
use crate::types::CommandResult;

use super::{CommandError, CommandHandler};

/// Return-to-launch. Named `Rtl` rather than `Return`/`ReturnToLaunch`; the
/// registry maps it under the verb `rtl` as a special case, mirroring the
/// reference agent's special-cased handler-class lookup for this verb.
pub struct Rtl;

impl Rtl {
    pub fn construct(_params: &HashMap<String, Value>) -> Result<Box<dyn CommandHandler>, CommandError> {
        Ok(Box::new(Self))
    }
}

#[async_trait]
impl CommandHandler for Rtl {
    async fn execute(&self, backend: &dyn AutopilotBackend) -> CommandResult {
        let start = Instant::now();
        let snapshot = backend.get_telemetry().await;
        if !snapshot.connected {
            return CommandResult::fail("rtl refused", "backend_disconnected", start.elapsed().as_secs_f64());
        }

        if let Err(err) = backend.action_return_to_launch().await {
            return CommandResult::fail("rtl failed", err.to_string(), start.elapsed().as_secs_f64());
        }

        tokio::time::sleep(std::time::Duration::from_secs(RTL_WAIT_SECS)).await;
        CommandResult::ok("returning to launch", start.elapsed().as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockBackend, RecordedAction};
    use crate::backend::AutopilotBackend;

    #[tokio::test(start_paused = true)]
    async fn test_connected_rtl_dispatches_return_to_launch() {
        let backend = MockBackend::new();
        backend.connect().await;
        let handler = Rtl::construct(&HashMap::new()).unwrap();
        let result = handler.execute(&backend).await;
        assert!(result.success);
        assert_eq!(backend.actions(), vec![RecordedAction::ReturnToLaunch]);
    }

    #[tokio::test]
    async fn test_disconnected_rtl_refuses() {
        let backend = MockBackend::new();
        let handler = Rtl::construct(&HashMap::new()).unwrap();
        let result = handler.execute(&backend).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("backend_disconnected"));
    }
}
