//! One function per §6 endpoint contract: health, ping, detailed health,
//! command dispatch, telemetry.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::backend::AutopilotBackend;
use crate::context::AgentContext;
use crate::types::{Command, CommandRequest, CommandResult};

use super::ApiError;

fn epoch_seconds() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs_f64()).unwrap_or(0.0)
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: f64,
    agent_id: String,
    version: &'static str,
    uptime_seconds: f64,
    backend_connected: bool,
    executor_ready: bool,
}

pub async fn health(State(ctx): State<Arc<AgentContext>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: epoch_seconds(),
        agent_id: ctx.agent_id.clone(),
        version: ctx.version,
        uptime_seconds: ctx.uptime_seconds(),
        backend_connected: ctx.backend.is_connected(),
        executor_ready: !ctx.executor.is_executing(),
    })
}

#[derive(Serialize)]
pub struct PingResponse {
    pong: f64,
}

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { pong: epoch_seconds() })
}

pub async fn health_detailed(State(ctx): State<Arc<AgentContext>>) -> impl IntoResponse {
    let snapshot = ctx.backend.get_telemetry().await;
    Json(json!({
        "agent": {
            "agent_id": ctx.agent_id,
            "version": ctx.version,
            "uptime_seconds": ctx.uptime_seconds(),
        },
        "backend": {
            "connected": snapshot.connected,
            "health": {
                "connected": snapshot.connected,
                "armed": snapshot.armed,
                "flight_mode": snapshot.flight_mode,
            },
        },
        "executor": {
            "executing": ctx.executor.is_executing(),
        },
        "host": {
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        },
        "timestamp": epoch_seconds(),
    }))
}

/// Ensure the backend is usable before dispatching, reconnecting once if
/// it reports disconnected. This is the only place reconnection is
/// attempted — the telemetry aggregator never auto-reconnects.
async fn ensure_connected(backend: &dyn AutopilotBackend) -> Result<(), ApiError> {
    if backend.is_connected() {
        return Ok(());
    }
    if backend.connect().await {
        Ok(())
    } else {
        Err(ApiError::service_unavailable("autopilot backend is disconnected and reconnection failed"))
    }
}

#[derive(Serialize)]
pub struct CommandsResponse {
    success: bool,
    results: Vec<CommandResult>,
    drone_id: String,
    timestamp: f64,
    total_commands: usize,
    successful_commands: usize,
}

pub async fn post_commands(
    State(ctx): State<Arc<AgentContext>>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandsResponse>, ApiError> {
    if let Some(target) = &request.target_drone {
        if *target != ctx.agent_id {
            return Err(ApiError::bad_request(format!(
                "target_drone '{target}' does not match this agent's id '{}'",
                ctx.agent_id
            )));
        }
    }

    ensure_connected(ctx.backend.as_ref()).await?;

    let results = dispatch(&ctx, &request.commands, request.queue_mode).await?;

    let successful_commands = results.iter().filter(|r| r.success).count();
    Ok(Json(CommandsResponse {
        success: successful_commands == results.len(),
        total_commands: results.len(),
        successful_commands,
        results,
        drone_id: ctx.agent_id.clone(),
        timestamp: epoch_seconds(),
    }))
}

async fn dispatch(
    ctx: &AgentContext,
    commands: &[Command],
    queue_mode: crate::types::QueueMode,
) -> Result<Vec<CommandResult>, ApiError> {
    ctx.executor
        .execute_sequence(commands, queue_mode, ctx.backend.as_ref())
        .await
        .map_err(|err| ApiError::internal(err.to_string()))
}

pub async fn telemetry(State(ctx): State<Arc<AgentContext>>) -> Result<impl IntoResponse, ApiError> {
    ensure_connected(ctx.backend.as_ref()).await?;
    let snapshot = ctx.backend.get_telemetry().await;
    let mut body = serde_json::to_value(&snapshot).unwrap_or_else(|_| json!({}));
    if let Some(map) = body.as_object_mut() {
        map.insert("drone_id".to_string(), json!(ctx.agent_id));
    }
    Ok(Json(body))
}
