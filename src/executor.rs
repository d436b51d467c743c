//! Sequence orchestration: per-command failure policy, emergency RTL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use thiserror::Error;

use crate::backend::AutopilotBackend;
use crate::commands::Rtl;
use crate::registry::CommandRegistry;
use crate::types::{Command, CommandMode, CommandResult, QueueMode};

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("a command sequence is already executing")]
    AlreadyExecuting,
    #[error("queue_mode=append is not implemented; only override is supported")]
    AppendNotSupported,
}

/// Runs one command sequence at a time against a shared backend, enforcing
/// per-command failure policy. The `executing` flag is the whole
/// concurrency primitive — by design there is no lock, just fail-fast.
pub struct CommandExecutor {
    registry: CommandRegistry,
    executing: AtomicBool,
}

impl CommandExecutor {
    pub fn new(registry: CommandRegistry) -> Self {
        Self { registry, executing: AtomicBool::new(false) }
    }

    pub fn is_executing(&self) -> bool {
        self.executing.load(Ordering::SeqCst)
    }

    pub async fn execute_sequence(
        &self,
        commands: &[Command],
        queue_mode: QueueMode,
        backend: &dyn AutopilotBackend,
    ) -> Result<Vec<CommandResult>, ExecutorError> {
        if queue_mode == QueueMode::Append {
            return Err(ExecutorError::AppendNotSupported);
        }
        if self.executing.swap(true, Ordering::SeqCst) {
            return Err(ExecutorError::AlreadyExecuting);
        }

        let results = self.run(commands, backend).await;

        self.executing.store(false, Ordering::SeqCst);
        Ok(results)
    }

    async fn run(&self, commands: &[Command], backend: &dyn AutopilotBackend) -> Vec<CommandResult> {
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            let result = self.run_one(command, backend).await;
            let failed_critically = !result.success && command.mode == CommandMode::Critical;
            results.push(result);

            if failed_critically {
                tracing::error!(command = %command.name, "critical command failed, dispatching emergency RTL");
                emergency_rtl(backend).await;
                break;
            }
        }

        results
    }

    async fn run_one(&self, command: &Command, backend: &dyn AutopilotBackend) -> CommandResult {
        let start = Instant::now();

        let Some(construct) = self.registry.get_handler(&command.name) else {
            return CommandResult::fail(
                format!("no handler registered for '{}'", command.name),
                "unknown_command",
                start.elapsed().as_secs_f64(),
            );
        };

        let params_json = serde_json::to_value(&command.params).unwrap_or(serde_json::Value::Null);
        let validation_errors = self.registry.validate_params(&command.name, &params_json);
        if !validation_errors.is_empty() {
            return CommandResult::fail(
                "parameter validation failed",
                format!("invalid_parameters: {}", validation_errors.join("; ")),
                start.elapsed().as_secs_f64(),
            );
        }

        let handler = match construct(&command.params) {
            Ok(handler) => handler,
            Err(err) => {
                return CommandResult::fail(
                    format!("failed to construct '{}'", command.name),
                    err.to_string(),
                    start.elapsed().as_secs_f64(),
                )
            }
        };

        handler.execute(backend).await
    }
}

/// Construct and run an RTL handler with empty params, swallowing its
/// result entirely — a safety net, not a contract.
async fn emergency_rtl(backend: &dyn AutopilotBackend) {
    if let Ok(handler) = Rtl::construct(&HashMap::new()) {
        let _ = handler.execute(backend).await;
    }
}
