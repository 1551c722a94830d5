//! Observability subsystem: the logging backend the request logger writes to.
//!
//! # Data Flow
//! ```text
//! LogEntry::write
//!     → logger.rs (handle with accumulated fields)
//!     → backend.rs (LogBackend trait, level threshold)
//!     → tracing_backend.rs | writer.rs | capture.rs
//!
//! HttpLog::configure
//!     → BackendSettings {name, level, time_format, json_format}
//!     → LogBackend::configure
//!     → (TracingBackend) SubscriberHandle::apply → json_lines.rs | text
//! ```
//!
//! # Design Decisions
//! - One emit call per record; backends never fail the caller
//! - `logging.rs` owns the process `tracing` subscriber for the binary; its
//!   output layer is reloaded when `TracingBackend` is reconfigured

pub mod backend;
pub mod capture;
pub mod json_lines;
pub mod logger;
pub mod logging;
pub mod tracing_backend;
pub mod writer;

pub use backend::{BackendSettings, Field, Level, LogBackend, ParseLevelError, Record};
pub use capture::{CaptureBackend, CapturedRecord};
pub use json_lines::JsonLines;
pub use logger::Logger;
pub use logging::SubscriberHandle;
pub use tracing_backend::TracingBackend;
pub use writer::WriterBackend;
