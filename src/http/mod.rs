//! HTTP request logging subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → middleware/request_logger.rs (create entry, start clock)
//!         → request.rs (request fields) → entry.rs (LogEntry in extensions)
//!     → handler (optionally enriches the entry)
//!     → response.rs (status/headers from the head, body teed into 512 bytes)
//!     → entry.rs write: status.rs severity/label + security redaction
//!     → one record to the backend
//! ```

pub mod entry;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod status;

pub use entry::{current_logger, set_field, set_fields, LogEntry};
pub use middleware::{RecovererLayer, RequestLoggerLayer};
pub use request::request_fields;
pub use response::{response_fields, RESPONSE_BUFFER_LIMIT};
pub use server::HttpServer;
pub use status::{label_for, severity_for};
