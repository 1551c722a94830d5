//! Request field extraction.
//!
//! # Responsibilities
//! - Reconstruct the request URL from scheme, host and request target
//! - Read the request ID set by `SetRequestIdLayer` and the peer address
//!   recorded by axum's `ConnectInfo`
//! - Produce the request half of the log line in a fixed order
//!
//! # Field Order
//! ```text
//! requestURL, requestMethod, requestPath, remoteIP, proto, [requestID]
//! then, unless concise: scheme, [lower-cased request headers]
//! ```

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use http::{header, Request};
use tower_http::request_id::RequestId;

use crate::observability::Field;
use crate::security::redact_headers;

/// Scheme of the request: taken from an absolute URI, `http` otherwise.
pub fn request_scheme<B>(req: &Request<B>) -> &str {
    req.uri().scheme_str().unwrap_or("http")
}

/// Host the request was addressed to: the URI authority, else the Host header.
pub fn request_host<B>(req: &Request<B>) -> String {
    if let Some(authority) = req.uri().authority() {
        return authority.as_str().to_string();
    }
    req.headers()
        .get(header::HOST)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

/// The request ID attached by the request-ID layer, if any and not empty.
pub fn request_id<B>(req: &Request<B>) -> Option<String> {
    req.extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Peer address as `ip:port`, empty when the server did not record it.
pub fn remote_addr<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default()
}

/// Build the request fields.
///
/// `skip_headers` must be lower-cased; it only matters when `concise` is false.
pub fn request_fields<B>(req: &Request<B>, concise: bool, skip_headers: &[String]) -> Vec<Field> {
    let scheme = request_scheme(req);
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let request_url = format!("{}://{}{}", scheme, request_host(req), target);

    let mut fields = vec![
        Field::new("requestURL", request_url),
        Field::new("requestMethod", req.method().as_str()),
        Field::new("requestPath", req.uri().path()),
        Field::new("remoteIP", remote_addr(req)),
        Field::new("proto", format!("{:?}", req.version())),
    ];
    if let Some(id) = request_id(req) {
        fields.push(Field::new("requestID", id));
    }

    if concise {
        return fields;
    }

    fields.push(Field::new("scheme", scheme));
    if !req.headers().is_empty() {
        fields.extend(redact_headers(req.headers(), skip_headers));
    }

    fields
}
