//! Request logger facade.
//!
//! `HttpLog` owns the options and the backend. It is cheap to clone; clones
//! share both, so reconfiguring through any clone affects every layer built
//! from it.
//!
//! # Design Decisions
//! - Options are swapped atomically (`ArcSwap`); readers never block
//! - Requests take one options snapshot when they start and keep it, so a
//!   reconfiguration only affects requests that begin afterwards

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};

use crate::config::Options;
use crate::http::middleware::{RecovererLayer, RequestLoggerLayer};
use crate::observability::{LogBackend, Logger, TracingBackend};

/// Full request logging stack: request ID, logging, panic recovery.
pub type RequestLoggerStack = ServiceBuilder<
    Stack<RecovererLayer, Stack<RequestLoggerLayer, Stack<SetRequestIdLayer<MakeRequestUuid>, Identity>>>,
>;

/// Owner of the request logger options and backend.
#[derive(Clone)]
pub struct HttpLog {
    options: Arc<ArcSwap<Options>>,
    backend: Arc<dyn LogBackend>,
}

impl HttpLog {
    /// Create with default options on top of `backend`.
    pub fn new(backend: Arc<dyn LogBackend>) -> Self {
        Self::with_options(backend, Options::default())
    }

    /// Create and apply `options` right away.
    pub fn with_options(backend: Arc<dyn LogBackend>, options: Options) -> Self {
        let httplog = Self {
            options: Arc::new(ArcSwap::from_pointee(Options::default())),
            backend,
        };
        httplog.configure(options);
        httplog
    }

    /// Replace the options and reconfigure the backend.
    ///
    /// Empty level and time format are filled in and skipped headers are
    /// lower-cased. Nothing is merged with the previous options.
    pub fn configure(&self, options: Options) {
        let options = options.normalize();
        self.backend.configure(options.backend_settings());
        self.options.store(Arc::new(options));
        tracing::debug!("request logger options replaced");
    }

    /// Current options snapshot.
    pub fn options(&self) -> Arc<Options> {
        self.options.load_full()
    }

    pub fn backend(&self) -> &Arc<dyn LogBackend> {
        &self.backend
    }

    /// Configure (with `options`, or by re-applying the current ones) and
    /// return a root logger. Unless concise, the logger carries the tags.
    pub fn new_logger(&self, options: Option<Options>) -> Logger {
        let options = options.unwrap_or_else(|| Options::clone(&self.options()));
        self.configure(options);

        let options = self.options();
        let logger = Logger::new(self.backend.clone());
        if !options.concise && !options.tags.is_empty() {
            let tags: serde_json::Map<_, _> = options
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            return logger.with_field("tags", tags);
        }
        logger
    }

    /// The request logging layer on its own.
    pub fn handler(&self, logger: Logger) -> RequestLoggerLayer {
        RequestLoggerLayer::new(self.clone(), logger)
    }

    /// Request ID generation, request logging and panic recovery, outermost first.
    pub fn request_logger(&self, logger: Logger) -> RequestLoggerStack {
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(self.handler(logger))
            .layer(RecovererLayer::new())
    }
}

impl Default for HttpLog {
    fn default() -> Self {
        Self::new(Arc::new(TracingBackend::new()))
    }
}

impl fmt::Debug for HttpLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpLog")
            .field("options", &self.options.load_full())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::{CaptureBackend, Level};
    use serde_json::json;

    fn capture() -> (Arc<CaptureBackend>, HttpLog) {
        let backend = Arc::new(CaptureBackend::new());
        (backend.clone(), HttpLog::new(backend))
    }

    #[test]
    fn test_configure_pushes_backend_settings() {
        let (backend, httplog) = capture();
        httplog.configure(Options {
            name: "api".into(),
            level: "error".into(),
            json_format: true,
            time_format: String::new(),
            ..Default::default()
        });

        let settings = backend.settings();
        assert_eq!(settings.name, "api");
        assert_eq!(settings.level, Level::Error);
        assert!(settings.json_format);
        assert_eq!(httplog.options().time_format, crate::config::DEFAULT_TIME_FORMAT);
    }

    #[test]
    fn test_configure_replaces_without_merging() {
        let (_, httplog) = capture();
        httplog.configure(Options {
            concise: true,
            skip_headers: vec!["X-Secret".into()],
            ..Default::default()
        });
        assert_eq!(httplog.options().skip_headers, ["x-secret"]);

        httplog.configure(Options::default());
        assert!(!httplog.options().concise);
        assert!(httplog.options().skip_headers.is_empty());
    }

    #[test]
    fn test_new_logger_attaches_tags() {
        let (backend, httplog) = capture();
        let mut options = Options::default();
        options.tags.insert("env".into(), "prod".into());

        let logger = httplog.new_logger(Some(options));
        logger.info("hello");

        let record = &backend.records()[0];
        assert_eq!(record.field("tags"), Some(&json!({"env": "prod"})));
    }

    #[test]
    fn test_new_logger_concise_skips_tags() {
        let (_, httplog) = capture();
        let mut options = Options {
            concise: true,
            ..Default::default()
        };
        options.tags.insert("env".into(), "prod".into());

        let logger = httplog.new_logger(Some(options));
        assert!(logger.fields().is_empty());
    }

    #[test]
    fn test_new_logger_without_options_keeps_current() {
        let (_, httplog) = capture();
        httplog.configure(Options {
            name: "svc".into(),
            ..Default::default()
        });
        httplog.new_logger(None);
        assert_eq!(httplog.options().name, "svc");
    }

    #[test]
    fn test_level_threshold_applies() {
        let (backend, httplog) = capture();
        let logger = httplog.new_logger(Some(Options {
            level: "warn".into(),
            ..Default::default()
        }));
        logger.info("dropped");
        logger.warn("kept");

        let records = backend.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "kept");
    }
}
