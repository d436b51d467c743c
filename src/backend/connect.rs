//! Ordered candidate-endpoint resolution for the autopilot connection.
//!
//! Mirrors the scan-then-probe shape used elsewhere in this codebase for
//! discovering a live service on an unknown address, but the candidate
//! list here is a short, priority-ordered sequence rather than a subnet
//! sweep: env override, Docker bridge gateway, named SITL container,
//! localhost listen, localhost dial, broadcast listen.

use std::process::Stdio;
use tokio::process::Command;

use crate::config::defaults::{GROUND_STATION_PORT, SITL_CONTAINER_HOST, SITL_OFFBOARD_PORT};

/// Ask the local Docker daemon for the bridge network's gateway IP.
///
/// Returns `None` if Docker isn't running or isn't reachable — this is a
/// best-effort probe, not a hard dependency.
async fn docker_bridge_gateway() -> Option<String> {
    let output = Command::new("docker")
        .args(["network", "inspect", "bridge"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).ok()?;
    parsed
        .get(0)?
        .get("IPAM")?
        .get("Config")?
        .get(0)?
        .get("Gateway")?
        .as_str()
        .map(str::to_string)
}

/// Resolve the IP of a named container via `docker inspect`, if running.
async fn named_container_ip(name: &str) -> Option<String> {
    let output = Command::new("docker")
        .args([
            "inspect",
            "-f",
            "{{range .NetworkSettings.Networks}}{{.IPAddress}}{{end}}",
            name,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let ip = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if ip.is_empty() {
        None
    } else {
        Some(ip)
    }
}

/// Build the ordered list of connection strings to try, highest priority
/// first: env-var override, Docker bridge gateway, named SITL container,
/// localhost UDP-in, localhost UDP-out, broadcast UDP-in.
pub async fn resolve_candidate_endpoints(env_override: Option<&str>) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(conn) = env_override {
        candidates.push(conn.to_string());
    }

    if let Some(gateway) = docker_bridge_gateway().await {
        candidates.push(format!("udpin://{gateway}:{SITL_OFFBOARD_PORT}"));
    }

    if let Some(ip) = named_container_ip(SITL_CONTAINER_HOST).await {
        candidates.push(format!("udpin://{ip}:{SITL_OFFBOARD_PORT}"));
    }

    candidates.push(format!("udpin://127.0.0.1:{SITL_OFFBOARD_PORT}"));
    candidates.push(format!("udpout://127.0.0.1:{GROUND_STATION_PORT}"));
    candidates.push(format!("udpin://0.0.0.0:{GROUND_STATION_PORT}"));

    candidates
}
