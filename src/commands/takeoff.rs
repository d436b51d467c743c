use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::AutopilotBackend;
use crate::config::defaults::{TAKEOFF_DEFAULT_ALTITUDE_M, TAKEOFF_MAX_ALTITUDE_M, TAKEOFF_MIN_ALTITUDE_M, TAKEOFF_WAIT_SECS, GROUND_RELATIVE_ALTITUDE_M};
use crate::types::CommandResult;

use super::{params, relative_altitude_m, CommandError, CommandHandler};

pub struct Takeoff {
    altitude_m: f64,
}

impl Takeoff {
    pub fn construct(params: &HashMap<String, Value>) -> Result<Box<dyn CommandHandler>, CommandError> {
        let altitude_m = params::f64_or(params, "altitude", TAKEOFF_DEFAULT_ALTITUDE_M)?;
        params::in_range("altitude", altitude_m, TAKEOFF_MIN_ALTITUDE_M..=TAKEOFF_MAX_ALTITUDE_M)?;
        Ok(Box::new(Self { altitude_m }))
    }
}

#[async_trait]
impl CommandHandler for Takeoff {
    async fn execute(&self, backend: &dyn AutopilotBackend) -> CommandResult {
        let start = Instant::now();
        let snapshot = backend.get_telemetry().await;
        if !snapshot.connected {
            return CommandResult::fail("takeoff refused", "backend_disconnected", start.elapsed().as_secs_f64());
        }

        if relative_altitude_m(&snapshot) >= GROUND_RELATIVE_ALTITUDE_M {
            return CommandResult::ok("already airborne — takeoff not needed", start.elapsed().as_secs_f64());
        }

        if let Err(err) = backend.action_arm().await {
            return CommandResult::fail("takeoff failed", err.to_string(), start.elapsed().as_secs_f64());
        }
        if let Err(err) = backend.action_set_takeoff_altitude(self.altitude_m).await {
            return CommandResult::fail("takeoff failed", err.to_string(), start.elapsed().as_secs_f64());
        }
        if let Err(err) = backend.action_takeoff().await {
            return CommandResult::fail("takeoff failed", err.to_string(), start.elapsed().as_secs_f64());
        }

        tokio::time::sleep(std::time::Duration::from_secs(TAKEOFF_WAIT_SECS)).await;
        CommandResult::ok(format!("takeoff to {}m complete", self.altitude_m), start.elapsed().as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::types::{Position, TelemetrySnapshot};
    use serde_json::json;

    fn snapshot_on_ground() -> TelemetrySnapshot {
        TelemetrySnapshot {
            position: Some(Position {
                latitude: 47.0,
                longitude: 8.0,
                absolute_altitude_m: 488.0,
                relative_altitude_m: 0.0,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_construct_rejects_out_of_range_altitude() {
        let params = HashMap::from([("altitude".to_string(), json!(0.5))]);
        assert!(Takeoff::construct(&params).is_err());
    }

    #[test]
    fn test_construct_uses_default_altitude() {
        let handler = Takeoff::construct(&HashMap::new()).unwrap();
        let _ = handler;
    }

    #[tokio::test]
    async fn test_airborne_takeoff_is_noop_and_dispatches_nothing() {
        let backend = MockBackend::connected_with(TelemetrySnapshot {
            position: Some(Position {
                latitude: 47.0,
                longitude: 8.0,
                absolute_altitude_m: 493.0,
                relative_altitude_m: 5.0,
            }),
            ..Default::default()
        });
        let handler = Takeoff::construct(&HashMap::new()).unwrap();
        let result = handler.execute(&backend).await;
        assert!(result.success);
        assert!(result.message.contains("already airborne"));
        assert!(backend.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_grounded_takeoff_arms_and_dispatches() {
        let backend = MockBackend::connected_with(snapshot_on_ground());
        let handler = Takeoff::construct(&HashMap::new()).unwrap();
        let result = handler.execute(&backend).await;
        assert!(result.success);
        assert_eq!(backend.actions().len(), 3);
    }

    #[tokio::test]
    async fn test_disconnected_backend_refuses_without_side_effects() {
        let backend = MockBackend::new();
        let handler = Takeoff::construct(&HashMap::new()).unwrap();
        let result = handler.execute(&backend).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("backend_disconnected"));
        assert!(backend.actions().is_empty());
    }
}
