//! Agent Configuration — operator-tunable settings for a single drone agent.
//!
//! Every value that was previously hardcoded at backend construction (the
//! MAVSDK server address, the HTTP port, this agent's drone id) is now a
//! field here. `AgentConfig::default()` matches the reference agent's
//! historical hardcoded values, so a deployment with no config file or
//! flags behaves the same as before.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Root configuration for one drone agent process.
///
/// Load with [`AgentConfig::load`], which resolves (in precedence order):
/// 1. CLI-provided overrides (see [`CliOverrides`])
/// 2. `$DRONE_AGENT_CONFIG` TOML file
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// This agent's drone id, checked against `target_drone` on incoming requests.
    #[serde(default = "default_agent_id")]
    pub agent_id: String,

    /// HTTP bind port for the command/telemetry edge.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Explicit MAVSDK/autopilot connection string. When unset, the backend
    /// tries the ordered candidate list described in the connection contract.
    #[serde(default)]
    pub mavsdk_connection_string: Option<String>,
}

fn default_agent_id() -> String {
    "drone-1".to_string()
}

fn default_http_port() -> u16 {
    defaults::DEFAULT_HTTP_PORT
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: default_agent_id(),
            http_port: default_http_port(),
            mavsdk_connection_string: None,
        }
    }
}

/// Overrides collected from CLI flags, applied last (highest precedence).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub agent_id: Option<String>,
    pub http_port: Option<u16>,
    pub mavsdk_connection_string: Option<String>,
}

impl AgentConfig {
    /// Load configuration using the standard search order:
    /// 1. `$DRONE_AGENT_CONFIG` environment variable (TOML file)
    /// 2. Built-in defaults
    ///
    /// Then apply `overrides` on top of whichever base was found.
    pub fn load(overrides: CliOverrides) -> Self {
        let mut config = if let Ok(path) = std::env::var("DRONE_AGENT_CONFIG") {
            let p = PathBuf::from(&path);
            match Self::load_from_file(&p) {
                Ok(config) => {
                    info!(path = %p.display(), agent_id = %config.agent_id, "Loaded agent config from DRONE_AGENT_CONFIG");
                    config
                }
                Err(e) => {
                    warn!(path = %p.display(), error = %e, "Failed to load config from DRONE_AGENT_CONFIG, using defaults");
                    Self::default()
                }
            }
        } else {
            info!("DRONE_AGENT_CONFIG not set — using built-in defaults");
            Self::default()
        };

        if let Some(id) = overrides.agent_id {
            config.agent_id = id;
        }
        if let Some(port) = overrides.http_port {
            config.http_port = port;
        }
        if let Some(conn) = overrides.mavsdk_connection_string {
            config.mavsdk_connection_string = Some(conn);
        }
        if let Ok(conn) = std::env::var("MAVSDK_CONNECTION_STRING") {
            config.mavsdk_connection_string = Some(conn);
        }

        config
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_agent() {
        let config = AgentConfig::default();
        assert_eq!(config.agent_id, "drone-1");
        assert_eq!(config.http_port, 8001);
        assert!(config.mavsdk_connection_string.is_none());
    }

    #[test]
    fn test_cli_overrides_take_precedence() {
        let overrides = CliOverrides {
            agent_id: Some("drone-7".to_string()),
            http_port: Some(9000),
            mavsdk_connection_string: Some("udpin://127.0.0.1:14540".to_string()),
        };
        let config = AgentConfig::load(overrides);
        assert_eq!(config.agent_id, "drone-7");
        assert_eq!(config.http_port, 9000);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("drone_agent_config_test.toml");
        std::fs::write(&path, "agent_id = \"drone-42\"\nhttp_port = 9500\n").unwrap();

        let config = AgentConfig::load_from_file(&path).expect("valid toml");
        assert_eq!(config.agent_id, "drone-42");
        assert_eq!(config.http_port, 9500);

        let _ = std::fs::remove_file(&path);
    }
}
