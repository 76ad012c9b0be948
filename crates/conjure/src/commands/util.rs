//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use conjure_core::{CoreError, EffectParameters, EntityId, ParameterValue, TriggerCondition};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Turn a 404 into a `NotFound` that points at the right list command.
pub fn not_found(err: CoreError, resource: &str, id: &EntityId) -> CliError {
    if err.is_not_found() {
        CliError::NotFound {
            resource_type: resource.into(),
            identifier: id.to_string(),
            list_command: format!("{resource}s list"),
        }
    } else {
        err.into()
    }
}

// ── Argument parsing ────────────────────────────────────────────────

/// Parse `KEY=VALUE`. Values that are valid JSON keep their type
/// (`intensity=0.5` is a number); anything else is text.
pub fn parse_param(raw: &str) -> Result<(String, ParameterValue), CliError> {
    let (key, value) = raw.split_once('=').ok_or_else(|| CliError::Validation {
        field: "param".into(),
        reason: format!("expected KEY=VALUE, got '{raw}'"),
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "param".into(),
            reason: format!("empty key in '{raw}'"),
        });
    }
    let value = serde_json::from_str::<Value>(value)
        .map_or_else(|_| ParameterValue::Text(value.to_owned()), ParameterValue::from);
    Ok((key.to_owned(), value))
}

pub fn parse_params(raw: &[String]) -> Result<EffectParameters, CliError> {
    raw.iter().map(|p| parse_param(p)).collect()
}

/// Build a condition from `--when` and `--value`. Object and array values
/// are read as JSON; everything else stays a string.
pub fn parse_condition(kind: &str, value: Option<&str>) -> Result<TriggerCondition, CliError> {
    let value = match value.map(str::trim) {
        None => Value::Null,
        Some(v) if v.starts_with('{') || v.starts_with('[') => serde_json::from_str(v)?,
        Some(v) => Value::String(v.to_owned()),
    };
    Ok(TriggerCondition::from_parts(kind, value))
}

// ── Progress ────────────────────────────────────────────────────────

/// A spinner on stderr while a request is in flight, only for interactive
/// table output.
pub fn spinner(global: &GlobalOpts, message: &'static str) -> Option<ProgressBar> {
    if global.quiet
        || !matches!(global.output, OutputFormat::Table)
        || !std::io::stderr().is_terminal()
    {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    Some(pb)
}
