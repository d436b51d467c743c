//! Telemetry snapshot — the backend's coherent-per-field view of the vehicle.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Mean-sea-level absolute altitude, meters.
    pub absolute_altitude_m: f64,
    /// Altitude above the origin ground level, meters.
    pub relative_altitude_m: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Attitude {
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub yaw_deg: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Battery {
    pub voltage_v: f64,
    pub remaining_percent: f64,
}

/// GPS fix quality, mirroring the autopilot's own fix-type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GpsFixType {
    NoGps,
    NoFix,
    Fix2d,
    Fix3d,
    FixDgps,
    RtkFloat,
    RtkFixed,
}

impl GpsFixType {
    /// Matches the reference agent's raw MAVLink fix-type code mapping.
    pub fn from_raw(code: u8) -> Self {
        match code {
            0 => GpsFixType::NoGps,
            1 => GpsFixType::NoFix,
            2 => GpsFixType::Fix2d,
            3 => GpsFixType::Fix3d,
            4 => GpsFixType::FixDgps,
            5 => GpsFixType::RtkFloat,
            _ => GpsFixType::RtkFixed,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GpsInfo {
    pub num_satellites: u8,
    pub fix_type: GpsFixType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdop: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vdop: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_accuracy_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_accuracy_m: Option<f64>,
}

/// The latched first-valid GPS fix, used as the NED anchor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Origin {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_msl_m: f64,
}

/// A single coherent-per-field telemetry record.
///
/// All fields besides `connected` and `timestamp` are optional until their
/// producing stream has reported at least once. Coherence is per-field, not
/// cross-field: a snapshot may mix a position from time `t` with a battery
/// reading from `t + ε`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attitude: Option<Attitude>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<Battery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_info: Option<GpsInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub armed: Option<bool>,
    pub connected: bool,
    pub timestamp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub px4_origin: Option<Origin>,
}
