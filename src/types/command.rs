//! Command request/response data model.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Per-command failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandMode {
    /// Failure triggers emergency RTL and aborts the sequence.
    Critical,
    /// Failure is recorded and the sequence continues (default).
    Continue,
    /// Behaviorally identical to `Continue` in the current executor; kept as
    /// a distinct variant because callers are expected to be able to tell
    /// "skip this one" from "just keep going" apart in their own records,
    /// even though the failure-policy branch treats them the same.
    Skip,
}

impl Default for CommandMode {
    fn default() -> Self {
        CommandMode::Continue
    }
}

/// Queue handling mode for an incoming command sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    /// New commands replace any in-flight sequence (default).
    Override,
    /// Tail onto the existing queue. Not implemented — see
    /// [`crate::executor::CommandExecutor::execute_sequence`]; rejected
    /// explicitly rather than silently treated as `Override`.
    Append,
}

impl Default for QueueMode {
    fn default() -> Self {
        QueueMode::Override
    }
}

/// A single command: a verb, its parameters, and a failure policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    #[serde(default)]
    pub params: HashMap<String, Value>,
    #[serde(default)]
    pub mode: CommandMode,
}

/// A full request to run a sequence of commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub commands: Vec<Command>,
    #[serde(default)]
    pub queue_mode: QueueMode,
    #[serde(default)]
    pub target_drone: Option<String>,
}

/// Outcome of attempting one command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration: f64,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>, duration: f64) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            duration,
        }
    }

    pub fn fail(message: impl Into<String>, error: impl Into<String>, duration: f64) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_mode_default_is_continue() {
        assert_eq!(CommandMode::default(), CommandMode::Continue);
    }

    #[test]
    fn test_command_deserializes_default_mode() {
        let json = serde_json::json!({"name": "wait", "params": {"duration": 1.0}});
        let command: Command = serde_json::from_value(json).unwrap();
        assert_eq!(command.mode, CommandMode::Continue);
    }

    #[test]
    fn test_command_result_fail_sets_error() {
        let result = CommandResult::fail("boom", "unknown_command", 0.01);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("unknown_command"));
    }
}
