//! Scriptable [`AutopilotBackend`] fixture for handler, executor, and
//! end-to-end tests. Records every dispatched action so a test can assert
//! "no arm/takeoff was ever sent to the autopilot" without a real SITL.

// Single-threaded test fixture; the inner mutex is never contended or
// poisoned, so unwrapping the lock is the straightforward option here.
#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use async_trait::async_trait;

use crate::types::{Origin, TelemetrySnapshot};

use super::{AutopilotBackend, BackendError};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedAction {
    Arm,
    SetTakeoffAltitude(f64),
    Takeoff,
    Land,
    ReturnToLaunch,
    GotoLocation { lat: f64, lon: f64, alt_msl_m: f64, yaw_deg: f64 },
    SetCurrentHeading(f64),
}

pub struct MockBackend {
    inner: Mutex<Inner>,
}

struct Inner {
    connected: bool,
    connect_should_fail: bool,
    snapshot: TelemetrySnapshot,
    origin: Option<Origin>,
    actions: Vec<RecordedAction>,
    reject_actions: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                connected: false,
                connect_should_fail: false,
                snapshot: TelemetrySnapshot::default(),
                origin: None,
                actions: Vec::new(),
                reject_actions: false,
            }),
        }
    }

    /// Build a backend that is already connected with the given snapshot,
    /// the common starting point for handler tests.
    pub fn connected_with(snapshot: TelemetrySnapshot) -> Self {
        let backend = Self::new();
        {
            let mut inner = backend.inner.lock().unwrap();
            inner.connected = true;
            inner.snapshot = snapshot;
        }
        backend
    }

    pub fn set_connect_should_fail(&self, fail: bool) {
        self.inner.lock().unwrap().connect_should_fail = fail;
    }

    pub fn set_snapshot(&self, snapshot: TelemetrySnapshot) {
        self.inner.lock().unwrap().snapshot = snapshot;
    }

    pub fn set_origin(&self, origin: Origin) {
        self.inner.lock().unwrap().origin = Some(origin);
    }

    /// Force every subsequent action to return [`BackendError::ActionRejected`],
    /// used to exercise the executor's failure-policy branching.
    pub fn reject_actions(&self, reject: bool) {
        self.inner.lock().unwrap().reject_actions = reject;
    }

    pub fn actions(&self) -> Vec<RecordedAction> {
        self.inner.lock().unwrap().actions.clone()
    }

    fn record(&self, action: RecordedAction) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.reject_actions {
            return Err(BackendError::ActionRejected(format!("{action:?}")));
        }
        inner.actions.push(action);
        Ok(())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AutopilotBackend for MockBackend {
    async fn connect(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.connect_should_fail {
            inner.connected = false;
            return false;
        }
        inner.connected = true;
        true
    }

    async fn disconnect(&self) {
        self.inner.lock().unwrap().connected = false;
    }

    async fn get_telemetry(&self) -> TelemetrySnapshot {
        let inner = self.inner.lock().unwrap();
        let mut snapshot = inner.snapshot.clone();
        snapshot.connected = inner.connected;
        snapshot
    }

    async fn get_px4_origin(&self) -> Option<Origin> {
        self.inner.lock().unwrap().origin
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }

    async fn action_arm(&self) -> Result<(), BackendError> {
        self.record(RecordedAction::Arm)
    }

    async fn action_set_takeoff_altitude(&self, altitude_m: f64) -> Result<(), BackendError> {
        self.record(RecordedAction::SetTakeoffAltitude(altitude_m))
    }

    async fn action_takeoff(&self) -> Result<(), BackendError> {
        self.record(RecordedAction::Takeoff)
    }

    async fn action_land(&self) -> Result<(), BackendError> {
        self.record(RecordedAction::Land)
    }

    async fn action_return_to_launch(&self) -> Result<(), BackendError> {
        self.record(RecordedAction::ReturnToLaunch)
    }

    async fn action_goto_location(
        &self,
        lat: f64,
        lon: f64,
        alt_msl_m: f64,
        yaw_deg: f64,
    ) -> Result<(), BackendError> {
        self.record(RecordedAction::GotoLocation { lat, lon, alt_msl_m, yaw_deg })
    }

    async fn action_set_current_heading(&self, heading_deg: f64) -> Result<(), BackendError> {
        self.record(RecordedAction::SetCurrentHeading(heading_deg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_respects_scripted_failure() {
        let backend = MockBackend::new();
        backend.set_connect_should_fail(true);
        assert!(!backend.connect().await);
        assert!(!backend.is_connected());
    }

    #[tokio::test]
    async fn test_records_dispatched_actions_in_order() {
        let backend = MockBackend::new();
        backend.action_arm().await.unwrap();
        backend.action_takeoff().await.unwrap();
        assert_eq!(backend.actions(), vec![RecordedAction::Arm, RecordedAction::Takeoff]);
    }

    #[tokio::test]
    async fn test_reject_actions_surfaces_backend_error() {
        let backend = MockBackend::new();
        backend.reject_actions(true);
        let result = backend.action_arm().await;
        assert!(matches!(result, Err(BackendError::ActionRejected(_))));
        assert!(backend.actions().is_empty());
    }

    #[tokio::test]
    async fn test_no_actions_dispatched_when_untouched() {
        let backend = MockBackend::new();
        assert!(backend.actions().is_empty());
    }
}
