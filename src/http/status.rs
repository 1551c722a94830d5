//! Status code classification.
//!
//! Statuses are `i32` so that "no status yet" (0, e.g. a cancelled or failed
//! response) has a representation. Severity and label use different bands:
//! 1xx-3xx log at info, but only 1xx-2xx are labelled "OK".

use crate::observability::Level;

/// Log severity for a final status.
pub fn severity_for(status: i32) -> Level {
    match status {
        s if s <= 0 => Level::Warn,
        s if s < 400 => Level::Info,
        s if s < 500 => Level::Warn,
        _ => Level::Error,
    }
}

/// Human label for a final status.
pub fn label_for(status: i32) -> &'static str {
    match status {
        100..=299 => "OK",
        300..=399 => "Redirect",
        400..=499 => "Client Error",
        s if s >= 500 => "Server Error",
        _ => "Unknown",
    }
}
