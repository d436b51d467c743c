//! System-wide default constants.
//!
//! Centralises magic numbers that were previously scattered across handler
//! implementations. Grouped by subsystem for easy discovery.

// ============================================================================
// Backend connection
// ============================================================================

/// Per-candidate dial timeout when trying connection endpoints (seconds).
pub const CONNECT_DIAL_TIMEOUT_SECS: u64 = 8;

/// Cap on polling `connection_state` for `is_connected` after a dial (seconds).
pub const CONNECT_STATE_POLL_CAP_SECS: u64 = 15;

/// Typical SITL offboard MAVLink port.
pub const SITL_OFFBOARD_PORT: u16 = 14540;

/// Typical ground-station MAVLink port.
pub const GROUND_STATION_PORT: u16 = 14550;

/// Named SITL container hostname tried before falling back to localhost.
pub const SITL_CONTAINER_HOST: &str = "dronesphere-sitl";

/// Default origin used when no real PX4 origin has ever been latched.
///
/// Zurich SITL landmark, carried over unchanged from the reference agent.
pub const DEFAULT_ORIGIN_LAT: f64 = 47.397_750_5;
pub const DEFAULT_ORIGIN_LON: f64 = 8.545_607_2;
pub const DEFAULT_ORIGIN_ALT_MSL_M: f64 = 488.0;

// ============================================================================
// Handler: takeoff
// ============================================================================

pub const TAKEOFF_MIN_ALTITUDE_M: f64 = 1.0;
pub const TAKEOFF_MAX_ALTITUDE_M: f64 = 50.0;
pub const TAKEOFF_DEFAULT_ALTITUDE_M: f64 = 10.0;

/// Open-loop wait after dispatching takeoff; see design notes on why this
/// stays open-loop rather than monitoring altitude.
pub const TAKEOFF_WAIT_SECS: u64 = 8;

/// Below this relative altitude the drone is considered "on the ground".
pub const GROUND_RELATIVE_ALTITUDE_M: f64 = 0.5;

// ============================================================================
// Handler: land / rtl
// ============================================================================

pub const LAND_WAIT_SECS: u64 = 10;
pub const RTL_WAIT_SECS: u64 = 15;

// ============================================================================
// Handler: goto
// ============================================================================

pub const GOTO_LAT_MIN: f64 = -90.0;
pub const GOTO_LAT_MAX: f64 = 90.0;
pub const GOTO_LON_MIN: f64 = -180.0;
pub const GOTO_LON_MAX: f64 = 180.0;
pub const GOTO_ALT_MSL_MIN_M: f64 = -500.0;
pub const GOTO_ALT_MSL_MAX_M: f64 = 10000.0;

pub const GOTO_NED_HORIZONTAL_LIMIT_M: f64 = 10000.0;
pub const GOTO_NED_DOWN_MIN_M: f64 = -1000.0;
pub const GOTO_NED_DOWN_MAX_M: f64 = 100.0;

pub const GOTO_SPEED_MIN_MPS: f64 = 0.0;
pub const GOTO_SPEED_MAX_MPS: f64 = 20.0;
pub const GOTO_SPEED_DEFAULT_MPS: f64 = 5.0;

pub const GOTO_ACCEPTANCE_RADIUS_MIN_M: f64 = 0.0;
pub const GOTO_ACCEPTANCE_RADIUS_MAX_M: f64 = 50.0;
pub const GOTO_ACCEPTANCE_RADIUS_DEFAULT_M: f64 = 2.0;

pub const GOTO_ARRIVAL_POLL_INTERVAL_SECS: f64 = 0.5;
pub const GOTO_ARRIVAL_TIMEOUT_SECS: f64 = 60.0;

/// Mean earth radius used for the Haversine horizontal distance (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ============================================================================
// Handler: yaw
// ============================================================================

pub const YAW_HEADING_MIN_DEG: f64 = 0.0;
pub const YAW_HEADING_MAX_DEG: f64 = 360.0;
pub const YAW_SPEED_MIN_DEG_PER_SEC: f64 = 0.0;
pub const YAW_SPEED_MAX_DEG_PER_SEC: f64 = 180.0;
pub const YAW_SPEED_DEFAULT_DEG_PER_SEC: f64 = 30.0;

pub const YAW_TOLERANCE_DEG: f64 = 2.0;
pub const YAW_MONITOR_POLL_INTERVAL_SECS: f64 = 0.5;
pub const YAW_MONITOR_TIMEOUT_SECS: f64 = 30.0;

// ============================================================================
// Handler: wait
// ============================================================================

pub const WAIT_DURATION_MIN_SECS: f64 = 0.1;
pub const WAIT_DURATION_MAX_SECS: f64 = 300.0;
pub const WAIT_MESSAGE_MAX_LEN: usize = 100;

// ============================================================================
// HTTP edge
// ============================================================================

pub const DEFAULT_HTTP_PORT: u16 = 8001;
