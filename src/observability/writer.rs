//! Line-oriented backend writing to any `io::Write`.
//!
//! # Responsibilities
//! - Format records as text or JSON lines
//! - Honour name, level, time format and JSON settings at runtime
//!
//! # Output
//! ```text
//! text: 2024-05-01T12:00:00.000000001+00:00 [INFO]  api: 200 OK: status=200 bytes=13
//! json: {"@timestamp":"...","@level":"info","@message":"200 OK","@module":"api","status":200}
//! ```
//!
//! # Design Decisions
//! - Write errors are swallowed: logging never fails a request
//! - Settings live in an `ArcSwap` so `configure` never blocks emitters

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use arc_swap::ArcSwap;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::backend::{fields_to_map, fields_to_text, BackendSettings, LogBackend, Record};

/// Backend writing one line per record.
pub struct WriterBackend<W> {
    settings: ArcSwap<BackendSettings>,
    out: Mutex<W>,
}

impl WriterBackend<io::Stderr> {
    /// Backend writing to standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> WriterBackend<W> {
    pub fn new(out: W) -> Self {
        Self {
            settings: ArcSwap::from_pointee(BackendSettings::default()),
            out: Mutex::new(out),
        }
    }

    /// Consume the backend and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn format_line(&self, settings: &BackendSettings, record: &Record<'_>) -> String {
        let timestamp = timestamp(&settings.time_format);

        if settings.json_format {
            let mut obj = Map::new();
            obj.insert("@timestamp".into(), Value::String(timestamp));
            obj.insert("@level".into(), Value::String(record.level.to_string()));
            obj.insert("@message".into(), Value::String(record.message.to_string()));
            if !settings.name.is_empty() {
                obj.insert("@module".into(), Value::String(settings.name.clone()));
            }
            obj.extend(fields_to_map(record.fields));
            return Value::Object(obj).to_string();
        }

        let level = format!("[{}]", record.level.as_str().to_ascii_uppercase());
        let mut line = format!("{timestamp} {level:<7} ");
        if !settings.name.is_empty() {
            line.push_str(&settings.name);
            line.push_str(": ");
        }
        line.push_str(record.message);
        if !record.fields.is_empty() {
            line.push_str(": ");
            line.push_str(&fields_to_text(record.fields));
        }
        line
    }
}

impl<W: Write + Send> LogBackend for WriterBackend<W> {
    fn emit(&self, record: &Record<'_>) {
        let settings = self.settings.load();
        if !settings.level.allows(record.level) {
            return;
        }
        let line = self.format_line(&settings, record);

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }

    fn configure(&self, settings: BackendSettings) {
        self.settings.store(settings.into());
    }
}

/// Format the current time, falling back to RFC3339 when the format string is invalid.
pub(crate) fn timestamp(format: &str) -> String {
    let now = Utc::now();
    let mut out = String::new();
    if write!(out, "{}", now.format(format)).is_err() {
        return now.to_rfc3339_opts(SecondsFormat::Nanos, true);
    }
    out
}
