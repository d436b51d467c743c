use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::AutopilotBackend;
use crate::config::defaults::{GROUND_RELATIVE_ALTITUDE_M, LAND_WAIT_SECS};
use crate::types::CommandResult;

use super::{relative_altitude_m, CommandError, CommandHandler};

pub struct Land;

impl Land {
    pub fn construct(_params: &HashMap<String, Value>) -> Result<Box<dyn CommandHandler>, CommandError> {
        Ok(Box::new(Self))
    }
}

#[async_trait]
impl CommandHandler for Land {
    async fn execute(&self, backend: &dyn AutopilotBackend) -> CommandResult {
        let start = Instant::now();
        let snapshot = backend.get_telemetry().await;
        if !snapshot.connected {
            return CommandResult::fail("land refused", "backend_disconnected", start.elapsed().as_secs_f64());
        }

        if relative_altitude_m(&snapshot) <= GROUND_RELATIVE_ALTITUDE_M {
            return CommandResult::ok("already on ground", start.elapsed().as_secs_f64());
        }

        if let Err(err) = backend.action_land().await {
            return CommandResult::fail("land failed", err.to_string(), start.elapsed().as_secs_f64());
        }

        tokio::time::sleep(std::time::Duration::from_secs(LAND_WAIT_SECS)).await;
        CommandResult::ok("landed", start.elapsed().as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::types::{Position, TelemetrySnapshot};

    #[tokio::test]
    async fn test_grounded_land_is_noop() {
        let backend = MockBackend::connected_with(TelemetrySnapshot {
            position: Some(Position { latitude: 47.0, longitude: 8.0, absolute_altitude_m: 488.0, relative_altitude_m: 0.0 }),
            ..Default::default()
        });
        let handler = Land::construct(&HashMap::new()).unwrap();
        let result = handler.execute(&backend).await;
        assert!(result.success);
        assert!(result.message.contains("already on ground"));
        assert!(backend.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_airborne_land_dispatches_land_action() {
        let backend = MockBackend::connected_with(TelemetrySnapshot {
            position: Some(Position { latitude: 47.0, longitude: 8.0, absolute_altitude_m: 498.0, relative_altitude_m: 10.0 }),
            ..Default::default()
        });
        let handler = Land::construct(&HashMap::new()).unwrap();
        let result = handler.execute(&backend).await;
        assert!(result.success);
        assert_eq!(backend.actions().len(), 1);
    }
}
