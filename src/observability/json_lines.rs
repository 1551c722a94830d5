//! JSON event format for the `tracing` subscriber.
//!
//! Writes the same line shape as `WriterBackend` in JSON mode:
//!
//! ```text
//! {"@timestamp":"...","@level":"info","@message":"200 OK","@module":"api","status":200,...}
//! ```
//!
//! Events from `TracingBackend` carry their request fields as one JSON object
//! in `fields`; that object is merged into the line instead of being nested as
//! a string. `logger` becomes `@module`. Other events keep their own fields and
//! use the target as module.

use std::fmt;

use serde_json::{Map, Number, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use super::writer::timestamp;

/// hclog-style JSON lines with a configurable timestamp format.
#[derive(Debug, Clone)]
pub struct JsonLines {
    time_format: String,
}

impl JsonLines {
    pub fn new(time_format: impl Into<String>) -> Self {
        Self {
            time_format: time_format.into(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonLines
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        let mut line = Map::new();
        line.insert("@timestamp".into(), Value::String(timestamp(&self.time_format)));
        line.insert(
            "@level".into(),
            Value::String(metadata.level().as_str().to_ascii_lowercase()),
        );
        line.insert(
            "@message".into(),
            Value::String(visitor.message.unwrap_or_default()),
        );
        match visitor.logger {
            Some(name) if name.is_empty() => {}
            Some(name) => {
                line.insert("@module".into(), Value::String(name));
            }
            None => {
                line.insert("@module".into(), Value::String(metadata.target().to_string()));
            }
        }
        line.extend(visitor.fields);

        writeln!(writer, "{}", Value::Object(line))
    }
}

/// Collects event fields as JSON values.
#[derive(Debug, Default)]
struct JsonFieldVisitor {
    message: Option<String>,
    logger: Option<String>,
    fields: Map<String, Value>,
}

impl JsonFieldVisitor {
    fn record_value(&mut self, field: &Field, value: Value) {
        match field.name() {
            "message" => self.message = Some(into_text(value)),
            "logger" => self.logger = Some(into_text(value)),
            "fields" => self.merge_fields(value),
            name => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }

    fn merge_fields(&mut self, value: Value) {
        let parsed = match &value {
            Value::String(text) => serde_json::from_str::<Value>(text).ok(),
            _ => None,
        };
        match parsed {
            Some(Value::Object(map)) => self.fields.extend(map),
            _ => {
                self.fields.insert("fields".into(), value);
            }
        }
    }
}

impl Visit for JsonFieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::Number(value.into()));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.record_value(field, value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, Value::String(format!("{value:?}")));
    }
}

fn into_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
