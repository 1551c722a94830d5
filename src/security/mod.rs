//! Security subsystem.
//!
//! # Responsibilities
//! - Keep credentials out of access logs (header redaction)

pub mod redaction;

pub use redaction::{is_sensitive, redact_headers, MASK, SENSITIVE_HEADERS};
