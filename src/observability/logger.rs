//! Logger handle.
//!
//! A `Logger` is a backend plus the fields accumulated so far. Adding fields
//! returns a new handle and leaves the original untouched, so a handle can be
//! shared freely between tasks.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::backend::{Field, Level, LogBackend, Record};

/// Handle used to emit records with pre-populated fields.
#[derive(Clone, Default)]
pub struct Logger {
    backend: Option<Arc<dyn LogBackend>>,
    fields: Vec<Field>,
}

impl Logger {
    /// Create a root logger on top of a backend.
    pub fn new(backend: Arc<dyn LogBackend>) -> Self {
        Self {
            backend: Some(backend),
            fields: Vec::new(),
        }
    }

    /// A logger that discards everything.
    pub fn null() -> Self {
        Self::default()
    }

    pub fn is_null(&self) -> bool {
        self.backend.is_none()
    }

    /// Fields carried by this handle, in insertion order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Derive a handle with additional fields appended.
    pub fn with<I>(&self, fields: I) -> Logger
    where
        I: IntoIterator<Item = Field>,
    {
        if self.is_null() {
            return Logger::null();
        }
        let mut derived = self.clone();
        derived.fields.extend(fields);
        derived
    }

    /// Derive a handle with one more field.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Logger {
        self.with([Field::new(key, value)])
    }

    /// Emit a record carrying this handle's fields followed by `extra`.
    pub fn log(&self, level: Level, message: &str, extra: Vec<Field>) {
        let Some(backend) = &self.backend else {
            return;
        };
        let fields = if extra.is_empty() {
            self.fields.clone()
        } else {
            let mut all = Vec::with_capacity(self.fields.len() + extra.len());
            all.extend(self.fields.iter().cloned());
            all.extend(extra);
            all
        };
        backend.emit(&Record {
            level,
            message,
            fields: &fields,
        });
    }

    pub fn trace(&self, message: &str) {
        self.log(Level::Trace, message, Vec::new());
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message, Vec::new());
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message, Vec::new());
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message, Vec::new());
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message, Vec::new());
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("null", &self.is_null())
            .field("fields", &self.fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::capture::CaptureBackend;
    use serde_json::json;

    #[test]
    fn test_with_does_not_mutate_parent() {
        let backend = Arc::new(CaptureBackend::new());
        let root = Logger::new(backend.clone());
        let child = root.with_field("user", "alice");

        root.info("root");
        child.info("child");

        let records = backend.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].fields.is_empty());
        assert_eq!(records[1].field("user"), Some(&json!("alice")));
    }

    #[test]
    fn test_extra_fields_follow_handle_fields() {
        let backend = Arc::new(CaptureBackend::new());
        let logger = Logger::new(backend.clone()).with_field("a", 1);
        logger.log(Level::Warn, "hi", vec![Field::new("b", 2)]);

        let record = &backend.records()[0];
        assert_eq!(record.level, Level::Warn);
        let keys: Vec<_> = record.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn test_null_logger_stays_null() {
        let logger = Logger::null().with_field("a", 1);
        assert!(logger.is_null());
        assert!(logger.fields().is_empty());
        logger.error("dropped");
    }
}
