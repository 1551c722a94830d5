//! Header redaction.
//!
//! # Responsibilities
//! - Turn a header map into log fields with lower-cased names
//! - Mask credentials: authorization, cookie, set-cookie, plus any configured name
//!
//! # Design Decisions
//! - The mask replaces the value; the original is never emitted
//! - Header map iteration order is not part of the contract

use http::HeaderMap;

use crate::observability::Field;

/// Replacement for redacted values.
pub const MASK: &str = "***";

/// Headers that are always redacted.
pub const SENSITIVE_HEADERS: [&str; 3] = ["authorization", "cookie", "set-cookie"];

/// Whether a lower-cased header name must be masked.
///
/// `skip_headers` is expected to be lower-cased already (see `Options::normalize`).
pub fn is_sensitive(name: &str, skip_headers: &[String]) -> bool {
    SENSITIVE_HEADERS.contains(&name) || skip_headers.iter().any(|skip| skip == name)
}

/// Build one field per header name.
///
/// A single value is logged as is, several values as `[v1], [v2]`. Names with
/// no value are skipped.
pub fn redact_headers(headers: &HeaderMap, skip_headers: &[String]) -> Vec<Field> {
    let mut fields = Vec::with_capacity(headers.keys_len());

    for name in headers.keys() {
        let key = name.as_str().to_ascii_lowercase();
        let values: Vec<_> = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();

        let value = match values.len() {
            0 => continue,
            1 => values.into_iter().next().unwrap_or_default(),
            _ => format!("[{}]", values.join("], [")),
        };

        if is_sensitive(&key, skip_headers) {
            fields.push(Field::new(key, MASK));
        } else {
            fields.push(Field::new(key, value));
        }
    }

    fields
}
