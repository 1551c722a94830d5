//! Logging backend contract.
//!
//! # Responsibilities
//! - Define severity levels and their string parsing
//! - Define the key/value field model shared by every backend
//! - Define the `LogBackend` trait the request logger emits through
//!
//! # Design Decisions
//! - Field values are `serde_json::Value` so numbers stay numbers in JSON output
//! - Fields are an ordered sequence; duplicate keys are kept and each backend
//!   decides how to display them (JSON collapses last-wins, text prints all)
//! - Level filtering is the backend's job, driven by `BackendSettings`

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::config::schema::DEFAULT_TIME_FORMAT;

/// Log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// Threshold only: suppresses every record.
    Off,
}

impl Level {
    /// Parse a level, falling back to `Info` for anything unrecognised.
    pub fn parse_lenient(s: &str) -> Level {
        match s.parse() {
            Ok(level) => level,
            Err(err) => {
                tracing::warn!(error = %err, "falling back to info level");
                Level::Info
            }
        }
    }

    /// Whether a record at `level` passes this threshold.
    pub fn allows(self, level: Level) -> bool {
        self != Level::Off && level != Level::Off && level >= self
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level `{0}` (expected trace, debug, info, warn, error or off)")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// A single key/value pair attached to a log record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: Value,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One record handed to a backend.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub level: Level,
    pub message: &'a str,
    pub fields: &'a [Field],
}

/// Settings pushed into the backend whenever the options are replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    /// Subsystem name prefixed to every line.
    pub name: String,
    /// Minimum severity emitted.
    pub level: Level,
    /// chrono strftime format for timestamps.
    pub time_format: String,
    /// Emit JSON instead of text.
    pub json_format: bool,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: Level::Info,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            json_format: false,
        }
    }
}

/// Destination for request log records.
pub trait LogBackend: Send + Sync {
    /// Emit a record. Must not block for long and must never panic.
    fn emit(&self, record: &Record<'_>);

    /// Replace the backend's settings.
    fn configure(&self, settings: BackendSettings);
}

/// Collapse fields into a JSON object; later keys overwrite earlier ones.
pub fn fields_to_map(fields: &[Field]) -> Map<String, Value> {
    let mut map = Map::new();
    for field in fields {
        map.insert(field.key.clone(), field.value.clone());
    }
    map
}

/// Render fields as space separated `key=value` pairs, keeping duplicates.
pub fn fields_to_text(fields: &[Field]) -> String {
    let mut out = String::new();
    for field in fields {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&field.key);
        out.push('=');
        match &field.value {
            Value::String(s) if needs_quotes(s) => {
                out.push_str(&Value::String(s.clone()).to_string());
            }
            Value::String(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
    }
    out
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '=' || c == '"')
}
