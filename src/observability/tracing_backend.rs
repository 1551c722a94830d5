//! Backend forwarding records to `tracing`.
//!
//! `tracing` needs field names at compile time, so the dynamic request fields
//! travel in a single `fields` value: a JSON object when JSON output is enabled,
//! `key=value` pairs otherwise. The configured name goes into `logger`.
//!
//! Built with a `SubscriberHandle`, `configure` also swaps the subscriber's
//! output layer so JSON mode and the time format follow the options. The
//! `JsonLines` format merges the `fields` object back into the line.

use arc_swap::ArcSwap;

use super::backend::{fields_to_map, fields_to_text, BackendSettings, Level, LogBackend, Record};
use super::logging::SubscriberHandle;

/// Target used for every forwarded event.
pub const TARGET: &str = "httplog";

/// Backend emitting `tracing` events on the `httplog` target.
#[derive(Debug, Default)]
pub struct TracingBackend {
    settings: ArcSwap<BackendSettings>,
    subscriber: Option<SubscriberHandle>,
}

impl TracingBackend {
    /// Backend that leaves the installed subscriber's output as it is.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that also reconfigures the subscriber behind `handle`.
    pub fn with_subscriber(handle: SubscriberHandle) -> Self {
        Self {
            settings: ArcSwap::default(),
            subscriber: Some(handle),
        }
    }
}

impl LogBackend for TracingBackend {
    fn emit(&self, record: &Record<'_>) {
        let settings = self.settings.load();
        if !settings.level.allows(record.level) {
            return;
        }

        let fields = if settings.json_format {
            serde_json::Value::Object(fields_to_map(record.fields)).to_string()
        } else {
            fields_to_text(record.fields)
        };
        let logger = settings.name.as_str();
        let message = record.message;

        match record.level {
            Level::Trace => tracing::trace!(target: TARGET, logger, fields = %fields, "{message}"),
            Level::Debug => tracing::debug!(target: TARGET, logger, fields = %fields, "{message}"),
            Level::Info => tracing::info!(target: TARGET, logger, fields = %fields, "{message}"),
            Level::Warn => tracing::warn!(target: TARGET, logger, fields = %fields, "{message}"),
            Level::Error => tracing::error!(target: TARGET, logger, fields = %fields, "{message}"),
            Level::Off => {}
        }
    }

    fn configure(&self, settings: BackendSettings) {
        if let Some(subscriber) = &self.subscriber {
            if let Err(e) = subscriber.apply(settings.json_format, &settings.time_format) {
                tracing::warn!(error = %e, "failed to reload log output format");
            }
        }
        self.settings.store(settings.into());
    }
}
