use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::AutopilotBackend;
use crate::config::defaults::{
    YAW_HEADING_MAX_DEG, YAW_HEADING_MIN_DEG, YAW_MONITOR_POLL_INTERVAL_SECS,
    YAW_MONITOR_TIMEOUT_SECS, YAW_SPEED_DEFAULT_DEG_PER_SEC, YAW_SPEED_MAX_DEG_PER_SEC,
    YAW_SPEED_MIN_DEG_PER_SEC, YAW_TOLERANCE_DEG, GROUND_RELATIVE_ALTITUDE_M,
};
use crate::geodesy::signed_heading_delta_deg;
use crate::types::CommandResult;

use super::{params, relative_altitude_m, CommandError, CommandHandler};

/// `speed` is validated but not forwarded to the autopilot — the reference
/// agent has no setpoint API for yaw rate, only a target heading.
pub struct Yaw {
    heading_deg: f64,
    #[allow(dead_code)]
    speed_deg_per_sec: f64,
}

impl Yaw {
    pub fn construct(params: &HashMap<String, Value>) -> Result<Box<dyn CommandHandler>, CommandError> {
        let heading_deg = params::f64_required(params, "heading")?;
        if !(YAW_HEADING_MIN_DEG..YAW_HEADING_MAX_DEG).contains(&heading_deg) {
            return Err(CommandError::InvalidParameters(format!(
                "heading: {heading_deg} is outside [{YAW_HEADING_MIN_DEG}, {YAW_HEADING_MAX_DEG})"
            )));
        }

        let speed_deg_per_sec = params::f64_or(params, "speed", YAW_SPEED_DEFAULT_DEG_PER_SEC)?;
        params::in_range("speed", speed_deg_per_sec, YAW_SPEED_MIN_DEG_PER_SEC..=YAW_SPEED_MAX_DEG_PER_SEC)?;

        Ok(Box::new(Self { heading_deg, speed_deg_per_sec }))
    }
}

#[async_trait]
impl CommandHandler for Yaw {
    async fn execute(&self, backend: &dyn AutopilotBackend) -> CommandResult {
        let start = Instant::now();
        let snapshot = backend.get_telemetry().await;
        if !snapshot.connected {
            return CommandResult::fail("yaw refused", "backend_disconnected", start.elapsed().as_secs_f64());
        }
        if !snapshot.armed.unwrap_or(false) || relative_altitude_m(&snapshot) < GROUND_RELATIVE_ALTITUDE_M {
            return CommandResult::fail("yaw refused", "requires armed and airborne", start.elapsed().as_secs_f64());
        }

        if let Err(err) = backend.action_set_current_heading(self.heading_deg).await {
            return CommandResult::fail("yaw failed", err.to_string(), start.elapsed().as_secs_f64());
        }

        loop {
            if start.elapsed().as_secs_f64() > YAW_MONITOR_TIMEOUT_SECS {
                return CommandResult::fail("yaw timed out", "timeout", start.elapsed().as_secs_f64());
            }
            let current = backend.get_telemetry().await;
            let yaw_now = current.attitude.map(|a| a.yaw_deg.rem_euclid(360.0));
            if let Some(yaw_now) = yaw_now {
                let delta = signed_heading_delta_deg(yaw_now, self.heading_deg);
                if delta.abs() <= YAW_TOLERANCE_DEG {
                    return CommandResult::ok(
                        format!("heading reached: {yaw_now:.1}° (target {:.1}°)", self.heading_deg),
                        start.elapsed().as_secs_f64(),
                    );
                }
            }
            tokio::time::sleep(std::time::Duration::from_secs_f64(YAW_MONITOR_POLL_INTERVAL_SECS)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::types::{Attitude, Position, TelemetrySnapshot};
    use serde_json::json;

    fn armed_airborne(yaw_deg: f64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            position: Some(Position { latitude: 47.0, longitude: 8.0, absolute_altitude_m: 498.0, relative_altitude_m: 10.0 }),
            attitude: Some(Attitude { roll_deg: 0.0, pitch_deg: 0.0, yaw_deg }),
            armed: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_construct_rejects_heading_at_360() {
        let params = HashMap::from([("heading".to_string(), json!(360.0))]);
        assert!(Yaw::construct(&params).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_on_heading_succeeds_immediately() {
        let backend = MockBackend::connected_with(armed_airborne(90.0));
        let params = HashMap::from([("heading".to_string(), json!(91.0))]);
        let handler = Yaw::construct(&params).unwrap();
        let result = handler.execute(&backend).await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_grounded_yaw_refused() {
        let backend = MockBackend::connected_with(TelemetrySnapshot {
            armed: Some(true),
            ..Default::default()
        });
        let params = HashMap::from([("heading".to_string(), json!(90.0))]);
        let handler = Yaw::construct(&params).unwrap();
        let result = handler.execute(&backend).await;
        assert!(!result.success);
    }
}
