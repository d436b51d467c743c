use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::AutopilotBackend;
use crate::config::defaults::{
    DEFAULT_ORIGIN_ALT_MSL_M, DEFAULT_ORIGIN_LAT, DEFAULT_ORIGIN_LON, GOTO_ACCEPTANCE_RADIUS_DEFAULT_M,
    GOTO_ACCEPTANCE_RADIUS_MAX_M, GOTO_ACCEPTANCE_RADIUS_MIN_M, GOTO_ALT_MSL_MAX_M, GOTO_ALT_MSL_MIN_M,
    GOTO_ARRIVAL_POLL_INTERVAL_SECS, GOTO_ARRIVAL_TIMEOUT_SECS, GOTO_LAT_MAX, GOTO_LAT_MIN, GOTO_LON_MAX,
    GOTO_LON_MIN, GOTO_NED_DOWN_MAX_M, GOTO_NED_DOWN_MIN_M, GOTO_NED_HORIZONTAL_LIMIT_M, GOTO_SPEED_DEFAULT_MPS,
    GOTO_SPEED_MAX_MPS, GOTO_SPEED_MIN_MPS, GROUND_RELATIVE_ALTITUDE_M,
};
use crate::geodesy::{distance_3d_m, ned_to_geodetic};
use crate::types::{CommandResult, Origin};

use super::{params, relative_altitude_m, CommandError, CommandHandler};

/// The two mutually exclusive coordinate modes `goto` accepts. Construction
/// proves exactly one is present — this is the tagged union the design
/// notes call for in place of "which fields happen to be set".
#[derive(Clone, Copy)]
enum Target {
    Gps { latitude: f64, longitude: f64, altitude_msl_m: f64 },
    Ned { north: f64, east: f64, down: f64 },
}

pub struct Goto {
    target: Target,
    #[allow(dead_code)]
    speed_mps: f64,
    acceptance_radius_m: f64,
}

fn has_any(params: &HashMap<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|k| params.contains_key(*k))
}

impl Goto {
    pub fn construct(params: &HashMap<String, Value>) -> Result<Box<dyn CommandHandler>, CommandError> {
        let has_gps = has_any(params, &["latitude", "longitude", "altitude"]);
        let has_ned = has_any(params, &["north", "east", "down"]);

        let target = match (has_gps, has_ned) {
            (true, true) => {
                return Err(CommandError::InvalidParameters(
                    "goto accepts exactly one of GPS or NED coordinates, not both".into(),
                ))
            }
            (false, false) => {
                return Err(CommandError::InvalidParameters(
                    "goto requires either GPS (latitude/longitude/altitude) or NED (north/east/down) coordinates".into(),
                ))
            }
            (true, false) => {
                let latitude = params::f64_required(params, "latitude")?;
                params::in_range("latitude", latitude, GOTO_LAT_MIN..=GOTO_LAT_MAX)?;
                let longitude = params::f64_required(params, "longitude")?;
                params::in_range("longitude", longitude, GOTO_LON_MIN..=GOTO_LON_MAX)?;
                let altitude_msl_m = params::f64_required(params, "altitude")?;
                params::in_range("altitude", altitude_msl_m, GOTO_ALT_MSL_MIN_M..=GOTO_ALT_MSL_MAX_M)?;
                Target::Gps { latitude, longitude, altitude_msl_m }
            }
            (false, true) => {
                let north = params::f64_required(params, "north")?;
                params::in_range("north", north, -GOTO_NED_HORIZONTAL_LIMIT_M..=GOTO_NED_HORIZONTAL_LIMIT_M)?;
                let east = params::f64_required(params, "east")?;
                params::in_range("east", east, -GOTO_NED_HORIZONTAL_LIMIT_M..=GOTO_NED_HORIZONTAL_LIMIT_M)?;
                let down = params::f64_required(params, "down")?;
                params::in_range("down", down, GOTO_NED_DOWN_MIN_M..=GOTO_NED_DOWN_MAX_M)?;
                Target::Ned { north, east, down }
            }
        };

        let speed_mps = params::f64_or(params, "speed", GOTO_SPEED_DEFAULT_MPS)?;
        params::in_range("speed", speed_mps, GOTO_SPEED_MIN_MPS..=GOTO_SPEED_MAX_MPS)?;

        let acceptance_radius_m = params::f64_or(params, "acceptance_radius", GOTO_ACCEPTANCE_RADIUS_DEFAULT_M)?;
        params::in_range(
            "acceptance_radius",
            acceptance_radius_m,
            GOTO_ACCEPTANCE_RADIUS_MIN_M..=GOTO_ACCEPTANCE_RADIUS_MAX_M,
        )?;

        Ok(Box::new(Self { target, speed_mps, acceptance_radius_m }))
    }

    fn resolve_geodetic(&self, origin: Origin) -> (f64, f64, f64) {
        match self.target {
            Target::Gps { latitude, longitude, altitude_msl_m } => (latitude, longitude, altitude_msl_m),
            Target::Ned { north, east, down } => ned_to_geodetic(north, east, down, origin),
        }
    }
}

#[async_trait]
impl CommandHandler for Goto {
    async fn execute(&self, backend: &dyn AutopilotBackend) -> CommandResult {
        let start = Instant::now();
        let snapshot = backend.get_telemetry().await;
        if !snapshot.connected {
            return CommandResult::fail("goto refused", "backend_disconnected", start.elapsed().as_secs_f64());
        }
        if !snapshot.armed.unwrap_or(false) || relative_altitude_m(&snapshot) < GROUND_RELATIVE_ALTITUDE_M {
            return CommandResult::fail("goto refused", "requires armed and airborne", start.elapsed().as_secs_f64());
        }

        let origin = backend.get_px4_origin().await.unwrap_or(Origin {
            latitude: DEFAULT_ORIGIN_LAT,
            longitude: DEFAULT_ORIGIN_LON,
            altitude_msl_m: DEFAULT_ORIGIN_ALT_MSL_M,
        });
        let (target_lat, target_lon, target_alt_msl) = self.resolve_geodetic(origin);

        if let Err(err) = backend
            .action_goto_location(target_lat, target_lon, target_alt_msl, f64::NAN)
            .await
        {
            return CommandResult::fail("goto failed", err.to_string(), start.elapsed().as_secs_f64());
        }

        loop {
            if start.elapsed().as_secs_f64() > GOTO_ARRIVAL_TIMEOUT_SECS {
                return CommandResult::fail("goto timed out", "timeout", start.elapsed().as_secs_f64());
            }
            let current = backend.get_telemetry().await;
            if let Some(position) = current.position {
                let distance = distance_3d_m(
                    position.latitude,
                    position.longitude,
                    position.absolute_altitude_m,
                    target_lat,
                    target_lon,
                    target_alt_msl,
                );
                if distance <= self.acceptance_radius_m {
                    return CommandResult::ok(
                        format!("arrived, distance {distance:.2}m"),
                        start.elapsed().as_secs_f64(),
                    );
                }
            }
            tokio::time::sleep(std::time::Duration::from_secs_f64(GOTO_ARRIVAL_POLL_INTERVAL_SECS)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::types::{Position, TelemetrySnapshot};
    use serde_json::json;

    fn armed_airborne_at(lat: f64, lon: f64, alt_msl: f64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            position: Some(Position { latitude: lat, longitude: lon, absolute_altitude_m: alt_msl, relative_altitude_m: 10.0 }),
            armed: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_construct_rejects_mixed_gps_and_ned() {
        let params = HashMap::from([
            ("latitude".to_string(), json!(47.4)),
            ("longitude".to_string(), json!(8.5)),
            ("altitude".to_string(), json!(500.0)),
            ("north".to_string(), json!(0.0)),
        ]);
        assert!(Goto::construct(&params).is_err());
    }

    #[test]
    fn test_construct_rejects_neither_mode() {
        assert!(Goto::construct(&HashMap::new()).is_err());
    }

    #[test]
    fn test_construct_rejects_out_of_range_latitude() {
        let params = HashMap::from([
            ("latitude".to_string(), json!(91.0)),
            ("longitude".to_string(), json!(0.0)),
            ("altitude".to_string(), json!(500.0)),
        ]);
        assert!(Goto::construct(&params).is_err());
    }

    #[tokio::test]
    async fn test_grounded_goto_refused() {
        let backend = MockBackend::connected_with(TelemetrySnapshot::default());
        let params = HashMap::from([
            ("latitude".to_string(), json!(47.4)),
            ("longitude".to_string(), json!(8.5)),
            ("altitude".to_string(), json!(500.0)),
        ]);
        let handler = Goto::construct(&params).unwrap();
        let result = handler.execute(&backend).await;
        assert!(!result.success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_goto_succeeds_when_already_at_target() {
        let backend = MockBackend::connected_with(armed_airborne_at(47.4, 8.5, 500.0));
        backend.set_origin(Origin { latitude: 47.4, longitude: 8.5, altitude_msl_m: 500.0 });
        let params = HashMap::from([
            ("latitude".to_string(), json!(47.4)),
            ("longitude".to_string(), json!(8.5)),
            ("altitude".to_string(), json!(500.0)),
        ]);
        let handler = Goto::construct(&params).unwrap();
        let result = handler.execute(&backend).await;
        assert!(result.success);
    }
}
