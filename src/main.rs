//! drone-agent — per-vehicle drone control agent binary.
//!
//! Connects to the autopilot over MAVLink, exposes a thin HTTP edge for
//! command dispatch and telemetry, and enforces the executor's
//! failure-policy safety net.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use drone_agent::api;
use drone_agent::backend::{AutopilotBackend, MavlinkBackend};
use drone_agent::config::{self, AgentConfig, CliOverrides};
use drone_agent::context::AgentContext;
use drone_agent::executor::CommandExecutor;
use drone_agent::registry::CommandRegistry;

#[derive(Parser, Debug)]
#[command(name = "drone-agent", about = "Per-vehicle drone control agent")]
struct CliArgs {
    /// This agent's drone id, checked against incoming `target_drone`.
    #[arg(long, env = "DRONE_AGENT_ID")]
    agent_id: Option<String>,

    /// HTTP port for the command/telemetry edge.
    #[arg(long, short)]
    port: Option<u16>,

    /// Explicit MAVLink connection string (overrides auto-detection).
    #[arg(long, env = "MAVSDK_CONNECTION_STRING")]
    mavsdk_connection: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,drone_agent=debug")),
        )
        .init();

    let args = CliArgs::parse();

    let agent_config = AgentConfig::load(CliOverrides {
        agent_id: args.agent_id,
        http_port: args.port,
        mavsdk_connection_string: args.mavsdk_connection,
    });
    config::init(agent_config);
    let agent_config = config::get();

    info!(agent_id = %agent_config.agent_id, port = agent_config.http_port, "starting drone agent");

    let backend = Arc::new(MavlinkBackend::new(agent_config.mavsdk_connection_string.clone()));
    if !backend.connect().await {
        warn!("initial autopilot connection failed — will retry on first command/telemetry request");
    }

    let executor = Arc::new(CommandExecutor::new(CommandRegistry::new()));
    let context = Arc::new(AgentContext::new(agent_config.agent_id.clone(), backend, executor));

    let app = api::build_router(context);
    let addr = SocketAddr::from(([0, 0, 0, 0], agent_config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "drone agent HTTP edge listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("drone agent shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    info!("shutdown signal received");
}
