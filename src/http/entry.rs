//! Request-scoped log entry.
//!
//! # Lifecycle
//! ```text
//! Created ──set_field/set_fields──▶ Created (fields accumulate)
//!    │                                 │
//!    │            panic()              │
//!    ├───────────────▶ Panicked ◀──────┘
//!    ▼                    │
//! write() ◀───────────────┘   exactly one log record, then discarded
//! ```
//!
//! The entry is created by `RequestLoggerLayer` before the handler runs and is
//! stored in the request extensions. Handlers reach it through the accessors
//! below or by taking `LogEntry` as an axum extractor.

use std::convert::Infallible;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::FromRequestParts;
use http::request::Parts;
use http::{Extensions, HeaderMap, Request};
use serde_json::Value;

use crate::config::Options;
use crate::http::request::request_fields;
use crate::http::response::response_fields;
use crate::http::status::{label_for, severity_for};
use crate::observability::{Field, Logger};
use crate::security::redact_headers;

/// Placeholder logged instead of the stack when output is not JSON; the
/// recoverer prints the stack itself in that case.
pub const STACK_PLACEHOLDER: &str = "#";

struct EntryState {
    logger: Logger,
    message: Option<String>,
}

/// Per-request log entry. Clones share the same state.
#[derive(Clone)]
pub struct LogEntry {
    state: Arc<Mutex<EntryState>>,
    options: Arc<Options>,
}

impl LogEntry {
    /// Create the entry for `req`, seeding the logger with the request fields.
    pub fn new<B>(logger: &Logger, req: &Request<B>, options: Arc<Options>) -> Self {
        let fields = request_fields(req, options.concise, &options.skip_headers);
        Self {
            state: Arc::new(Mutex::new(EntryState {
                logger: logger.with(fields),
                message: None,
            })),
            options,
        }
    }

    /// An entry that is not attached to any request; everything is discarded.
    pub fn detached() -> Self {
        Self {
            state: Arc::new(Mutex::new(EntryState {
                logger: Logger::null(),
                message: None,
            })),
            options: Arc::new(Options::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Options snapshot taken when the request started.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The current logger handle, carrying every field added so far.
    pub fn logger(&self) -> Logger {
        self.lock().logger.clone()
    }

    /// Add one field to the final log line.
    pub fn set_field(&self, key: impl Into<String>, value: impl Into<Value>) {
        let mut state = self.lock();
        state.logger = state.logger.with_field(key, value);
    }

    /// Add several fields to the final log line.
    pub fn set_fields<I>(&self, fields: I)
    where
        I: IntoIterator<Item = Field>,
    {
        let mut state = self.lock();
        state.logger = state.logger.with(fields);
    }

    /// Record a panic raised while handling the request.
    ///
    /// Does not recover or re-raise; that is the caller's job.
    pub fn panic(&self, value: &dyn fmt::Display, stack: &str) {
        let stacktrace = if self.options.json_format {
            stack
        } else {
            STACK_PLACEHOLDER
        };
        let message = value.to_string();

        let mut state = self.lock();
        state.logger = state.logger.with([
            Field::new("stacktrace", stacktrace),
            Field::new("panic", message.clone()),
        ]);
        state.message = Some(message);
    }

    /// Emit the log line for the finished request. Call once.
    pub fn write(
        &self,
        status: i32,
        bytes: usize,
        headers: &HeaderMap,
        elapsed: Duration,
        body: &[u8],
    ) {
        let state = self.lock();

        let mut message = format!("{} {}", status, label_for(status));
        if let Some(panic) = &state.message {
            message.push_str(" - ");
            message.push_str(panic);
        }

        let mut fields = response_fields(status, bytes, elapsed);
        if !self.options.concise {
            if status >= 400 {
                fields.push(Field::new(
                    "responseBody",
                    String::from_utf8_lossy(body).into_owned(),
                ));
            }
            if !headers.is_empty() {
                fields.extend(redact_headers(headers, &self.options.skip_headers));
            }
        }

        state.logger.log(severity_for(status), &message, fields);
    }
}

impl fmt::Debug for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("LogEntry")
            .field("logger", &state.logger)
            .field("message", &state.message)
            .finish()
    }
}

impl<S> FromRequestParts<S> for LogEntry
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<LogEntry>()
            .cloned()
            .unwrap_or_else(LogEntry::detached))
    }
}

/// Logger of the active entry, or a null logger when there is none.
pub fn current_logger(extensions: &Extensions) -> Logger {
    extensions
        .get::<LogEntry>()
        .map(LogEntry::logger)
        .unwrap_or_else(Logger::null)
}

/// Add a field to the active entry, if any.
pub fn set_field(extensions: &Extensions, key: impl Into<String>, value: impl Into<Value>) {
    if let Some(entry) = extensions.get::<LogEntry>() {
        entry.set_field(key, value);
    }
}

/// Add fields to the active entry, if any.
pub fn set_fields<I>(extensions: &Extensions, fields: I)
where
    I: IntoIterator<Item = Field>,
{
    if let Some(entry) = extensions.get::<LogEntry>() {
        entry.set_fields(fields);
    }
}
