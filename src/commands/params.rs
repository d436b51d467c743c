//! Shared parameter-extraction helpers for command handler `construct` functions.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use serde_json::Value;

use super::CommandError;

pub fn f64_or(params: &HashMap<String, Value>, key: &str, default: f64) -> Result<f64, CommandError> {
    match params.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| CommandError::InvalidParameters(format!("{key}: must be a number"))),
    }
}

pub fn f64_required(params: &HashMap<String, Value>, key: &str) -> Result<f64, CommandError> {
    params
        .get(key)
        .ok_or_else(|| CommandError::InvalidParameters(format!("{key}: required")))?
        .as_f64()
        .ok_or_else(|| CommandError::InvalidParameters(format!("{key}: must be a number")))
}

pub fn string_opt(params: &HashMap<String, Value>, key: &str) -> Result<Option<String>, CommandError> {
    match params.get(key) {
        None => Ok(None),
        Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .map(str::to_string)
            .map(Some)
            .ok_or_else(|| CommandError::InvalidParameters(format!("{key}: must be a string"))),
    }
}

pub fn in_range(key: &str, value: f64, range: RangeInclusive<f64>) -> Result<f64, CommandError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(CommandError::InvalidParameters(format!(
            "{key}: {value} is outside [{}, {}]",
            range.start(),
            range.end()
        )))
    }
}
