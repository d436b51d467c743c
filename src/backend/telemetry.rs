//! Telemetry aggregator: six independent producers feeding one coherent
//! [`TelemetrySnapshot`], plus sticky PX4-origin capture.
//!
//! Each producer owns a disjoint field of the snapshot and is the only
//! writer for that field; readers always see a fully-formed struct, but
//! coherence is per-field, not cross-field — see the telemetry-aggregator
//! contract.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::defaults::{DEFAULT_ORIGIN_ALT_MSL_M, DEFAULT_ORIGIN_LAT, DEFAULT_ORIGIN_LON};
use crate::types::{Attitude, Battery, GpsInfo, Origin, Position, TelemetrySnapshot};

/// Shared, mutex-guarded telemetry state. A short critical section per
/// field write/read is cheap relative to the network I/O driving it, so a
/// single `Mutex` is used in place of six independent atomics.
#[derive(Default)]
struct SharedState {
    snapshot: TelemetrySnapshot,
    origin: Option<Origin>,
}

/// Cheaply-cloneable handle into the shared telemetry state. Producer
/// tasks (e.g. the MAVLink message-reader loop) hold one of these instead
/// of the owning [`TelemetryAggregator`] so they can outlive the `&self`
/// call that spawned them.
#[derive(Clone)]
pub struct TelemetryHandle(Arc<Mutex<SharedState>>);

impl TelemetryHandle {
    pub async fn apply(&self, update: TelemetryUpdate) {
        apply_update(&self.0, update).await;
    }
}

/// Owns the collector task handles and the shared snapshot they write
/// into. Spawned on a successful [`crate::backend::AutopilotBackend::connect`]
/// and torn down on `disconnect`.
pub struct TelemetryAggregator {
    state: Arc<Mutex<SharedState>>,
    handles: Vec<JoinHandle<()>>,
}

impl TelemetryAggregator {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SharedState::default())),
            handles: Vec::new(),
        }
    }

    /// A cloneable handle to feed updates from tasks spawned outside `&self`.
    pub fn handle(&self) -> TelemetryHandle {
        TelemetryHandle(Arc::clone(&self.state))
    }

    /// Track a task handle so `shutdown` can cancel it.
    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    /// Spawn the six producer tasks. Each one calls `poll` in a loop,
    /// yielding control every iteration so `shutdown` can cancel it
    /// promptly. `poll` is caller-supplied so the aggregator stays
    /// transport-agnostic; [`MavlinkBackend`](super::MavlinkBackend) wires
    /// in MAVLink message decoding here.
    pub fn spawn<F, Fut>(&mut self, label: &'static str, mut poll: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Option<TelemetryUpdate>> + Send,
    {
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            loop {
                match poll().await {
                    Some(update) => apply_update(&state, update).await,
                    None => break,
                }
                tokio::task::yield_now().await;
            }
            tracing::debug!(collector = label, "telemetry collector stopped");
        });
        self.handles.push(handle);
    }

    /// Cancel all collector tasks and await their completion.
    pub async fn shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
            let _ = handle.await;
        }
        let mut state = self.state.lock().await;
        state.snapshot = TelemetrySnapshot::default();
        state.origin = None;
    }

    /// Return the latest merged snapshot with `connected`/`timestamp`
    /// refreshed and `px4_origin` filled (real or default).
    pub async fn snapshot(&self, connected: bool) -> TelemetrySnapshot {
        let state = self.state.lock().await;
        let mut snapshot = state.snapshot.clone();
        snapshot.connected = connected;
        snapshot.timestamp = now_secs();
        snapshot.px4_origin = Some(state.origin.unwrap_or(Origin {
            latitude: DEFAULT_ORIGIN_LAT,
            longitude: DEFAULT_ORIGIN_LON,
            altitude_msl_m: DEFAULT_ORIGIN_ALT_MSL_M,
        }));
        snapshot
    }

    /// The real latched origin, with no default fallback.
    pub async fn origin(&self) -> Option<Origin> {
        self.state.lock().await.origin
    }
}

impl Default for TelemetryAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// One field's worth of telemetry produced by a collector.
pub enum TelemetryUpdate {
    Position(Position),
    Attitude(Attitude),
    Battery(Battery),
    FlightMode(String),
    GpsInfo(GpsInfo),
    Armed(bool),
}

async fn apply_update(state: &Arc<Mutex<SharedState>>, update: TelemetryUpdate) {
    let mut guard = state.lock().await;
    match update {
        TelemetryUpdate::Position(position) => {
            if guard.origin.is_none() && position.latitude != 0.0 && position.longitude != 0.0 {
                guard.origin = Some(Origin {
                    latitude: position.latitude,
                    longitude: position.longitude,
                    altitude_msl_m: position.absolute_altitude_m,
                });
                tracing::info!(
                    latitude = position.latitude,
                    longitude = position.longitude,
                    "PX4 origin latched"
                );
            }
            guard.snapshot.position = Some(position);
        }
        TelemetryUpdate::Attitude(attitude) => guard.snapshot.attitude = Some(attitude),
        TelemetryUpdate::Battery(battery) => guard.snapshot.battery = Some(battery),
        TelemetryUpdate::FlightMode(mode) => guard.snapshot.flight_mode = Some(mode),
        TelemetryUpdate::GpsInfo(gps) => guard.snapshot.gps_info = Some(gps),
        TelemetryUpdate::Armed(armed) => guard.snapshot.armed = Some(armed),
    }
}

/// Also usable directly by the production backend to feed `apply_update`
/// outside the `spawn` closure shape (e.g. from one multiplexed read loop
/// that demultiplexes several message types per iteration).
impl TelemetryAggregator {
    pub async fn apply(&self, update: TelemetryUpdate) {
        apply_update(&self.state, update).await;
    }
}
