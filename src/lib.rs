//! HTTP request/response logging for tower and axum services.
//!
//! Wraps a handler chain, captures request metadata and the response outcome,
//! and emits exactly one structured, redaction-aware log line per request.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::{routing::get, Router};
//! use httplog::{HttpLog, Options, TracingBackend};
//!
//! let httplog = HttpLog::new(Arc::new(TracingBackend::new()));
//! let logger = httplog.new_logger(Some(Options {
//!     name: "api".into(),
//!     skip_headers: vec!["X-Api-Key".into()],
//!     ..Default::default()
//! }));
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "Hello, World!" }))
//!     .layer(httplog.request_logger(logger));
//! ```

pub mod config;
pub mod http;
pub mod httplog;
pub mod observability;
pub mod security;

pub use crate::config::Options;
pub use crate::http::{current_logger, set_field, set_fields, LogEntry};
pub use crate::httplog::HttpLog;
pub use crate::observability::{
    CaptureBackend, Field, Level, LogBackend, Logger, TracingBackend, WriterBackend,
};
