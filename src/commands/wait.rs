use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::AutopilotBackend;
use crate::config::defaults::{WAIT_DURATION_MAX_SECS, WAIT_DURATION_MIN_SECS, WAIT_MESSAGE_MAX_LEN};
use crate::types::CommandResult;

use super::{params, CommandError, CommandHandler};

/// No backend interaction: suspends for `duration` and always succeeds.
pub struct Wait {
    duration_secs: f64,
    message: Option<String>,
}

impl Wait {
    pub fn construct(params: &HashMap<String, Value>) -> Result<Box<dyn CommandHandler>, CommandError> {
        let duration_secs = params::f64_required(params, "duration")?;
        params::in_range("duration", duration_secs, WAIT_DURATION_MIN_SECS..=WAIT_DURATION_MAX_SECS)?;

        let message = params::string_opt(params, "message")?;
        if let Some(ref text) = message {
            if text.len() > WAIT_MESSAGE_MAX_LEN {
                return Err(CommandError::InvalidParameters(format!(
                    "message: exceeds {WAIT_MESSAGE_MAX_LEN} characters"
                )));
            }
        }

        Ok(Box::new(Self { duration_secs, message }))
    }
}

#[async_trait]
impl CommandHandler for Wait {
    async fn execute(&self, _backend: &dyn AutopilotBackend) -> CommandResult {
        let start = Instant::now();
        tokio::time::sleep(std::time::Duration::from_secs_f64(self.duration_secs)).await;
        let elapsed = start.elapsed().as_secs_f64();
        let message = match &self.message {
            Some(text) => format!("waited {elapsed:.2}s: {text}"),
            None => format!("waited {elapsed:.2}s"),
        };
        CommandResult::ok(message, elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use serde_json::json;

    #[test]
    fn test_construct_rejects_duration_below_minimum() {
        let params = HashMap::from([("duration".to_string(), json!(0.05))]);
        assert!(Wait::construct(&params).is_err());
    }

    #[test]
    fn test_construct_rejects_oversized_message() {
        let params = HashMap::from([
            ("duration".to_string(), json!(1.0)),
            ("message".to_string(), json!("x".repeat(101))),
        ]);
        assert!(Wait::construct(&params).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_reports_elapsed_close_to_requested() {
        let backend = MockBackend::new();
        let params = HashMap::from([("duration".to_string(), json!(0.2))]);
        let handler = Wait::construct(&params).unwrap();
        let result = handler.execute(&backend).await;
        assert!(result.success);
        assert!((result.duration - 0.2).abs() <= 0.01_f64.max(0.01 * 0.2));
    }
}
