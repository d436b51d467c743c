//! Production [`AutopilotBackend`] speaking MAVLink to a real or SITL autopilot.
//!
//! Command dispatch is grounded on the `COMMAND_LONG`/`MISSION_ITEM_INT`
//! construction used for arm/takeoff/land/RTL/goto in the MAVLink command
//! translation reference this module borrows its message-building shape
//! from. Connection resolution comes from [`super::connect::resolve_candidate_endpoints`]
//! and telemetry decoding feeds [`super::telemetry::TelemetryAggregator`].
//!
//! `connect()` is two-phase: [`MavlinkBackend::dial`] only opens a socket
//! against a candidate endpoint, so `connected` does not flip to `true`
//! until the reader loop it spawns observes a first `HEARTBEAT`, bounded by
//! `CONNECT_STATE_POLL_CAP_SECS`. A socket that opens against a host with
//! nothing MAVLink-speaking on the other end never reports connected.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mavlink::ardupilotmega::{MavCmd, MavFrame, MavMessage, COMMAND_LONG_DATA, MISSION_ITEM_INT_DATA};
use mavlink::{AsyncMavConnection, MavHeader};
use tokio::sync::{oneshot, Mutex};

use crate::config::defaults::{CONNECT_DIAL_TIMEOUT_SECS, CONNECT_STATE_POLL_CAP_SECS};
use crate::types::{Attitude, Battery, GpsFixType, GpsInfo, Origin, Position, TelemetrySnapshot};

use super::connect::resolve_candidate_endpoints;
use super::telemetry::{TelemetryAggregator, TelemetryUpdate};
use super::{AutopilotBackend, BackendError};

/// ArduPilot Copter custom-mode numbers used by `MAV_CMD_DO_SET_MODE`.
mod ardupilot_mode {
    pub const GUIDED: f32 = 4.0;
    pub const RTL: f32 = 6.0;
}

type Connection = dyn AsyncMavConnection<MavMessage> + Send + Sync;

pub struct MavlinkBackend {
    target_system: u8,
    target_component: u8,
    env_override: Option<String>,
    connection: Mutex<Option<Arc<Connection>>>,
    connected: AtomicBool,
    aggregator: Mutex<TelemetryAggregator>,
    /// Bit pattern of the `f32` altitude most recently passed to
    /// `action_set_takeoff_altitude`. ArduPilot has no standalone
    /// takeoff-altitude setpoint message — the value travels as
    /// `COMMAND_LONG.param7` on the *next* `action_takeoff`, so it has to
    /// be held here to bridge the two separate trait calls `takeoff.rs`
    /// makes in sequence.
    pending_takeoff_altitude_m: AtomicU32,
}

impl MavlinkBackend {
    pub fn new(env_override: Option<String>) -> Self {
        Self {
            target_system: 1,
            target_component: 1,
            env_override,
            connection: Mutex::new(None),
            connected: AtomicBool::new(false),
            aggregator: Mutex::new(TelemetryAggregator::new()),
            pending_takeoff_altitude_m: AtomicU32::new(0.0f32.to_bits()),
        }
    }

    async fn dial(&self) -> Result<Arc<Connection>, BackendError> {
        let candidates = resolve_candidate_endpoints(self.env_override.as_deref()).await;
        for candidate in &candidates {
            let attempt = tokio::time::timeout(
                Duration::from_secs(CONNECT_DIAL_TIMEOUT_SECS),
                async { mavlink::connect_async::<MavMessage>(candidate).await },
            )
            .await;
            match attempt {
                Ok(Ok(conn)) => {
                    tracing::info!(endpoint = %candidate, "autopilot connection established");
                    return Ok(Arc::from(conn));
                }
                Ok(Err(err)) => {
                    tracing::debug!(endpoint = %candidate, error = %err, "candidate endpoint rejected");
                }
                Err(_) => {
                    tracing::debug!(endpoint = %candidate, "candidate endpoint dial timed out");
                }
            }
        }
        Err(BackendError::ConnectionExhausted)
    }

    async fn send(&self, message: MavMessage) -> Result<(), BackendError> {
        let guard = self.connection.lock().await;
        let connection = guard.as_ref().ok_or(BackendError::Disconnected)?;
        connection
            .send(&MavHeader::default(), &message)
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        Ok(())
    }

    fn command_long(&self, command: MavCmd, params: [f32; 7]) -> MavMessage {
        MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
            target_system: self.target_system,
            target_component: self.target_component,
            command,
            confirmation: 0,
            param1: params[0],
            param2: params[1],
            param3: params[2],
            param4: params[3],
            param5: params[4],
            param6: params[5],
            param7: params[6],
        })
    }

    /// Spawn the message-reader loop that demultiplexes incoming MAVLink
    /// traffic into the six logical telemetry streams the aggregator tracks:
    /// position, attitude, battery, flight mode, GPS info, and armed state.
    ///
    /// `confirm`, when given, is fired exactly once on the first `HEARTBEAT`
    /// the loop observes — `connect()`'s signal that the dial produced a
    /// live link, not just an open socket.
    async fn spawn_reader(&self, connection: Arc<Connection>, confirm: Option<oneshot::Sender<()>>) {
        let mut aggregator = self.aggregator.lock().await;
        let handle = aggregator.handle();
        let mut confirm = confirm;
        let join = tokio::spawn(async move {
            loop {
                match connection.recv().await {
                    Ok((_, message)) => {
                        if matches!(message, MavMessage::HEARTBEAT(_)) {
                            if let Some(tx) = confirm.take() {
                                let _ = tx.send(());
                            }
                        }
                        if let Some(update) = decode(&message) {
                            handle.apply(update).await;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "mavlink receive loop ending");
                        break;
                    }
                }
            }
        });
        aggregator.track(join);
    }

    /// The `COMMAND_LONG` sent by `action_takeoff`, with `param7` carrying
    /// whatever altitude `action_set_takeoff_altitude` last recorded.
    fn takeoff_command(&self) -> MavMessage {
        let altitude_m = f32::from_bits(self.pending_takeoff_altitude_m.load(Ordering::SeqCst));
        self.command_long(
            MavCmd::MAV_CMD_NAV_TAKEOFF,
            [0.0, 0.0, 0.0, f32::NAN, f32::NAN, f32::NAN, altitude_m],
        )
    }
}

fn decode(message: &MavMessage) -> Option<TelemetryUpdate> {
    match message {
        MavMessage::GLOBAL_POSITION_INT(data) => Some(TelemetryUpdate::Position(Position {
            latitude: f64::from(data.lat) / 1e7,
            longitude: f64::from(data.lon) / 1e7,
            absolute_altitude_m: f64::from(data.alt) / 1000.0,
            relative_altitude_m: f64::from(data.relative_alt) / 1000.0,
        })),
        MavMessage::ATTITUDE(data) => Some(TelemetryUpdate::Attitude(Attitude {
            roll_deg: f64::from(data.roll).to_degrees(),
            pitch_deg: f64::from(data.pitch).to_degrees(),
            yaw_deg: f64::from(data.yaw).to_degrees(),
        })),
        MavMessage::SYS_STATUS(data) => Some(TelemetryUpdate::Battery(Battery {
            voltage_v: f64::from(data.voltage_battery) / 1000.0,
            remaining_percent: f64::from(data.battery_remaining.max(0)),
        })),
        MavMessage::GPS_RAW_INT(data) => Some(TelemetryUpdate::GpsInfo(GpsInfo {
            num_satellites: data.satellites_visible,
            fix_type: GpsFixType::from_raw(data.fix_type as u8),
            hdop: Some(f64::from(data.eph) / 100.0),
            vdop: Some(f64::from(data.epv) / 100.0),
            horizontal_accuracy_m: None,
            vertical_accuracy_m: None,
        })),
        MavMessage::HEARTBEAT(data) => Some(TelemetryUpdate::Armed(
            data.base_mode.contains(mavlink::ardupilotmega::MavModeFlag::MAV_MODE_FLAG_SAFETY_ARMED),
        )),
        _ => None,
    }
}

#[async_trait]
impl AutopilotBackend for MavlinkBackend {
    async fn connect(&self) -> bool {
        match self.dial().await {
            Ok(connection) => {
                *self.connection.lock().await = Some(Arc::clone(&connection));
                let (confirm_tx, confirm_rx) = oneshot::channel();
                self.spawn_reader(connection, Some(confirm_tx)).await;
                // The dial only proved the socket opened; `connected` does
                // not flip until the reader loop above has actually seen a
                // heartbeat, bounded by the poll cap so a dead link doesn't
                // hang this call forever.
                let confirmed = tokio::time::timeout(
                    Duration::from_secs(CONNECT_STATE_POLL_CAP_SECS),
                    confirm_rx,
                )
                .await
                .map(|recv| recv.is_ok())
                .unwrap_or(false);
                if !confirmed {
                    tracing::warn!("dialed autopilot but no heartbeat observed within the poll cap");
                }
                self.connected.store(confirmed, Ordering::SeqCst);
                confirmed
            }
            Err(err) => {
                tracing::error!(error = %err, "autopilot connection failed");
                self.connected.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    async fn disconnect(&self) {
        *self.connection.lock().await = None;
        self.connected.store(false, Ordering::SeqCst);
        self.aggregator.lock().await.shutdown().await;
    }

    async fn get_telemetry(&self) -> TelemetrySnapshot {
        self.aggregator
            .lock()
            .await
            .snapshot(self.connected.load(Ordering::SeqCst))
            .await
    }

    async fn get_px4_origin(&self) -> Option<Origin> {
        self.aggregator.lock().await.origin().await
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn action_arm(&self) -> Result<(), BackendError> {
        self.send(self.command_long(
            MavCmd::MAV_CMD_COMPONENT_ARM_DISARM,
            [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ))
        .await
    }

    async fn action_set_takeoff_altitude(&self, altitude_m: f64) -> Result<(), BackendError> {
        // ArduPilot takes the takeoff altitude as a COMMAND_LONG param, not a
        // separate set-point message; stashed here for the next action_takeoff.
        self.pending_takeoff_altitude_m.store((altitude_m as f32).to_bits(), Ordering::SeqCst);
        Ok(())
    }

    async fn action_takeoff(&self) -> Result<(), BackendError> {
        self.send(self.takeoff_command()).await
    }

    async fn action_land(&self) -> Result<(), BackendError> {
        self.send(self.command_long(
            MavCmd::MAV_CMD_NAV_LAND,
            [0.0, 0.0, 0.0, f32::NAN, f32::NAN, f32::NAN, 0.0],
        ))
        .await
    }

    async fn action_return_to_launch(&self) -> Result<(), BackendError> {
        self.send(self.command_long(
            MavCmd::MAV_CMD_DO_SET_MODE,
            [1.0, ardupilot_mode::RTL, 0.0, 0.0, 0.0, 0.0, 0.0],
        ))
        .await
    }

    async fn action_goto_location(
        &self,
        lat: f64,
        lon: f64,
        alt_msl_m: f64,
        yaw_deg: f64,
    ) -> Result<(), BackendError> {
        self.send(self.command_long(
            MavCmd::MAV_CMD_DO_SET_MODE,
            [1.0, ardupilot_mode::GUIDED, 0.0, 0.0, 0.0, 0.0, 0.0],
        ))
        .await?;

        let message = MavMessage::MISSION_ITEM_INT(MISSION_ITEM_INT_DATA {
            target_system: self.target_system,
            target_component: self.target_component,
            seq: 0,
            frame: MavFrame::MAV_FRAME_GLOBAL_RELATIVE_ALT_INT,
            command: MavCmd::MAV_CMD_NAV_WAYPOINT,
            current: 2,
            autocontinue: 0,
            param1: 0.0,
            param2: 0.0,
            param3: 0.0,
            param4: yaw_deg as f32,
            x: (lat * 1e7) as i32,
            y: (lon * 1e7) as i32,
            z: alt_msl_m as f32,
        });
        self.send(message).await
    }

    async fn action_set_current_heading(&self, heading_deg: f64) -> Result<(), BackendError> {
        self.send(self.command_long(
            MavCmd::MAV_CMD_CONDITION_YAW,
            [heading_deg as f32, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ignores_unrelated_messages() {
        let heartbeat = MavMessage::HEARTBEAT(mavlink::ardupilotmega::HEARTBEAT_DATA {
            custom_mode: 0,
            mavtype: mavlink::ardupilotmega::MavType::MAV_TYPE_QUADROTOR,
            autopilot: mavlink::ardupilotmega::MavAutopilot::MAV_AUTOPILOT_ARDUPILOTMEGA,
            base_mode: mavlink::ardupilotmega::MavModeFlag::empty(),
            system_status: mavlink::ardupilotmega::MavState::MAV_STATE_ACTIVE,
            mavlink_version: 3,
        });
        match decode(&heartbeat) {
            Some(TelemetryUpdate::Armed(armed)) => assert!(!armed),
            _ => panic!("expected an Armed update"),
        }
    }

    #[tokio::test]
    async fn test_set_takeoff_altitude_is_forwarded_to_takeoff_command() {
        let backend = MavlinkBackend::new(None);
        backend.action_set_takeoff_altitude(22.5).await.unwrap();
        match backend.takeoff_command() {
            MavMessage::COMMAND_LONG(data) => {
                assert_eq!(data.command, MavCmd::MAV_CMD_NAV_TAKEOFF);
                assert!((data.param7 - 22.5).abs() < 1e-4);
            }
            other => panic!("expected a COMMAND_LONG message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unset_takeoff_altitude_defaults_to_zero() {
        let backend = MavlinkBackend::new(None);
        match backend.takeoff_command() {
            MavMessage::COMMAND_LONG(data) => assert!((data.param7 - 0.0).abs() < 1e-6),
            other => panic!("expected a COMMAND_LONG message, got {other:?}"),
        }
    }
}
