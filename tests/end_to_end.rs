//! End-to-end scenario tests driving the executor and HTTP handlers together
//! against a scripted [`MockBackend`], one test per documented scenario.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use drone_agent::backend::mock::{MockBackend, RecordedAction};
use drone_agent::backend::AutopilotBackend;
use drone_agent::context::AgentContext;
use drone_agent::executor::CommandExecutor;
use drone_agent::registry::CommandRegistry;
use drone_agent::types::{Command, CommandMode, Origin, Position, QueueMode, TelemetrySnapshot};

fn command(name: &str, mode: CommandMode, params: serde_json::Value) -> Command {
    Command {
        name: name.to_string(),
        params: serde_json::from_value(params).unwrap(),
        mode,
    }
}

fn context(backend: MockBackend) -> Arc<AgentContext> {
    Arc::new(AgentContext::new(
        "drone-1".into(),
        Arc::new(backend),
        Arc::new(CommandExecutor::new(CommandRegistry::new())),
    ))
}

fn zurich_snapshot(relative_altitude_m: f64) -> TelemetrySnapshot {
    TelemetrySnapshot {
        position: Some(Position {
            latitude: 47.397_750_5,
            longitude: 8.545_607_2,
            absolute_altitude_m: 488.0 + relative_altitude_m,
            relative_altitude_m,
        }),
        armed: Some(relative_altitude_m > 0.0),
        ..Default::default()
    }
}

/// Scenario 1: happy takeoff-goto-land.
///
/// `MockBackend` holds one static snapshot for the whole sequence rather
/// than simulating flight, so the fixture is pre-armed and already
/// positioned at the `goto` target — this exercises the three-successes
/// invariant and the goto arrival check, not a physical state transition.
#[tokio::test(start_paused = true)]
async fn happy_takeoff_goto_land() {
    let origin = Origin { latitude: 47.397_750_5, longitude: 8.545_607_2, altitude_msl_m: 488.0 };
    let (target_lat, target_lon, target_alt_msl) = drone_agent::geodesy::ned_to_geodetic(50.0, 0.0, -10.0, origin);

    let backend = MockBackend::connected_with(TelemetrySnapshot {
        position: Some(Position {
            latitude: target_lat,
            longitude: target_lon,
            absolute_altitude_m: target_alt_msl,
            relative_altitude_m: 10.0,
        }),
        armed: Some(true),
        ..Default::default()
    });
    backend.set_origin(origin);

    let executor = CommandExecutor::new(CommandRegistry::new());
    let commands = vec![
        command("takeoff", CommandMode::Critical, json!({"altitude": 10.0})),
        command("goto", CommandMode::Continue, json!({"north": 50.0, "east": 0.0, "down": -10.0})),
        command("land", CommandMode::Continue, json!({})),
    ];

    let results = executor.execute_sequence(&commands, QueueMode::Override, &backend).await.unwrap();

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.success), "expected all three commands to succeed: {results:?}");
}

/// Scenario 2: a CRITICAL goto fails validation, triggering emergency RTL
/// and aborting before the trailing wait ever runs.
#[tokio::test(start_paused = true)]
async fn critical_failure_triggers_rtl() {
    let backend = MockBackend::connected_with(zurich_snapshot(0.0));
    backend.set_origin(Origin { latitude: 47.397_750_5, longitude: 8.545_607_2, altitude_msl_m: 488.0 });

    let executor = CommandExecutor::new(CommandRegistry::new());
    let commands = vec![
        command("takeoff", CommandMode::Critical, json!({"altitude": 10.0})),
        command(
            "goto",
            CommandMode::Critical,
            json!({"latitude": 91.0, "longitude": 0.0, "altitude": 500.0}),
        ),
        command("wait", CommandMode::Continue, json!({"duration": 5.0})),
    ];

    let results = executor.execute_sequence(&commands, QueueMode::Override, &backend).await.unwrap();

    assert_eq!(results.len(), 2, "the trailing wait must never be attempted");
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[1].error.as_deref().unwrap_or_default().contains("invalid_parameters"));
    assert!(backend.actions().contains(&RecordedAction::ReturnToLaunch));
}

/// Scenario 3: an unknown verb in the middle of a CONTINUE sequence fails
/// on its own but does not stop the commands around it.
#[tokio::test]
async fn unknown_command_continues_sequence() {
    let backend = MockBackend::new();
    let executor = CommandExecutor::new(CommandRegistry::new());
    let commands = vec![
        command("wait", CommandMode::Continue, json!({"duration": 0.01})),
        command("frobnicate", CommandMode::Continue, json!({})),
        command("wait", CommandMode::Continue, json!({"duration": 0.01})),
    ];

    let results = executor.execute_sequence(&commands, QueueMode::Override, &backend).await.unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert_eq!(results[1].error.as_deref(), Some("unknown_command"));
    assert!(results[2].success);
}

/// Scenario 4: supplying both GPS and NED fields for `goto` is rejected at
/// construction, surfacing as `invalid_parameters` through the executor.
#[tokio::test]
async fn gps_and_ned_mutual_exclusion_rejected() {
    let backend = MockBackend::connected_with(zurich_snapshot(10.0));
    let executor = CommandExecutor::new(CommandRegistry::new());
    let commands = vec![command(
        "goto",
        CommandMode::Continue,
        json!({"latitude": 47.4, "longitude": 8.5, "altitude": 500.0, "north": 0.0}),
    )];

    let results = executor.execute_sequence(&commands, QueueMode::Override, &backend).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert!(results[0].error.as_deref().unwrap_or_default().contains("invalid_parameters"));
}

/// Scenario 5: takeoff on an already-airborne drone succeeds as a no-op
/// without dispatching arm/takeoff to the autopilot.
#[tokio::test]
async fn airborne_takeoff_is_noop() {
    let backend = MockBackend::connected_with(zurich_snapshot(5.0));
    let executor = CommandExecutor::new(CommandRegistry::new());
    let commands = vec![command("takeoff", CommandMode::Continue, json!({"altitude": 10.0}))];

    let results = executor.execute_sequence(&commands, QueueMode::Override, &backend).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert!(results[0].message.contains("already airborne"));
    assert!(backend.actions().is_empty());
}

/// Scenario 6: a disconnected backend is reconnected exactly once by the
/// HTTP edge before a command sequence is dispatched.
#[tokio::test]
async fn disconnected_backend_reconnects_before_dispatch() {
    let backend = MockBackend::new();
    assert!(!backend.is_connected());

    let ctx = context(backend);
    let app = drone_agent::api::build_router(ctx.clone());

    let body = json!({
        "commands": [{"name": "wait", "params": {"duration": 0.01}, "mode": "continue"}],
        "queue_mode": "override",
    });
    let request = Request::builder()
        .method("POST")
        .uri("/commands")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(ctx.backend.is_connected(), "the HTTP edge should have reconnected the backend before dispatch");
}
