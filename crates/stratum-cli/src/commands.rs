//! Implementations behind the `stratum` subcommands.
//!
//! Each command returns its output as a string so the binary only deals with
//! printing and exit codes.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde_json::Value;
use stratum_core::{DeserializeOptions, ErrorObject, ErrorRegistry, JsonObject};
use stratum_error::Error;

/// Parse a command-line value as a JSON literal, else keep it as a string.
///
/// `3` becomes a number and `true` a boolean; `users` stays `"users"`.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Split a `key=value` argument.
pub fn parse_key_value(raw: &str) -> stratum_error::Result<(String, Value)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), parse_value(value))),
        _ => Err(Error::invalid_argument(format!("expected key=value, got {raw:?}"))
            .with_operation("parse_key_value")),
    }
}

/// Summarize the definitions a registry was built from.
pub fn check(registry: &ErrorRegistry) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "high level:")?;
    for name in registry.high_level_names() {
        let ty = registry.generated_type(name)?;
        let def = ty.definition();
        write!(out, "  {name} -> {} (code {}", ty.name(), def.code)?;
        if let Some(status_code) = &def.status_code {
            write!(out, ", status {status_code}")?;
        }
        writeln!(out, ")")?;
    }

    writeln!(out, "low level:")?;
    for name in registry.low_level_names() {
        let Some(def) = registry.low_level_definition(name) else {
            continue;
        };
        write!(out, "  {name}")?;
        let mut details = Vec::new();
        if let Some(sub_code) = &def.sub_code {
            details.push(format!("subCode {sub_code}"));
        }
        if let Some(status_code) = &def.status_code {
            details.push(format!("status {status_code}"));
        }
        if !details.is_empty() {
            write!(out, " ({})", details.join(", "))?;
        }
        writeln!(out, ": {}", def.message)?;
    }

    Ok(out)
}

/// Inputs for creating a single error.
#[derive(Debug, Clone, Default)]
pub struct NewRequest {
    pub high_level: String,
    pub low_level: Option<String>,
    pub message: Option<String>,
    pub args: Vec<Value>,
    pub metadata: Vec<(String, Value)>,
    pub safe_metadata: Vec<(String, Value)>,
    pub safe: bool,
    pub error_id: bool,
}

/// Create an error and return the requested view of it.
pub fn new_error(registry: &ErrorRegistry, request: &NewRequest) -> Result<JsonObject> {
    let mut err = match &request.low_level {
        Some(low_level) => registry.new_error(&request.high_level, low_level)?,
        None => registry.new_bare_error(&request.high_level, request.message.as_deref())?,
    };

    if request.low_level.is_some() && request.message.is_some() {
        tracing::warn!("--message is ignored when --low is given");
    }

    if !request.args.is_empty() {
        err = err.format_message(&request.args);
    }
    if request.error_id {
        err = err.with_generated_error_id();
    }
    err = err
        .with_metadata(request.metadata.iter().cloned())
        .with_safe_metadata(request.safe_metadata.iter().cloned());

    Ok(if request.safe {
        err.to_json_safe(&[])
    } else {
        err.to_json(&[])
    })
}

/// Outcome of decoding a serialized error.
#[derive(Debug)]
pub struct DecodeReport {
    /// High level name of the resolved generated type, if any.
    pub high_level: Option<String>,
    pub error: ErrorObject,
}

impl DecodeReport {
    pub fn render(&self) -> Result<String> {
        let mut out = String::new();
        match &self.high_level {
            Some(high_level) => writeln!(out, "type: {} ({high_level})", self.error.name())?,
            None => writeln!(out, "type: {} (unregistered)", self.error.name())?,
        }
        let json = serde_json::to_string_pretty(&self.error.to_json(&[]))
            .map_err(Error::from)
            .context("failed to render decoded error")?;
        out.push_str(&json);
        out.push('\n');
        Ok(out)
    }
}

/// Reconstruct an error from a JSON payload.
pub fn decode(registry: &ErrorRegistry, payload: &str, safe_fields: &[String]) -> Result<DecodeReport> {
    let data: Value = serde_json::from_str(payload)
        .map_err(Error::from)
        .context("payload is not valid JSON")?;

    let opts = if safe_fields.is_empty() {
        DeserializeOptions::default()
    } else {
        DeserializeOptions::new().with_safe_metadata_fields(safe_fields.iter().cloned())
    };
    let error = registry.from_json(&data, Some(&opts))?;
    let high_level = error
        .generated_type()
        .map(|ty| ty.high_level_name().to_string());

    Ok(DecodeReport { high_level, error })
}
