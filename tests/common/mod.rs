//! Shared utilities for request logging integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use httplog::observability::CapturedRecord;
use httplog::{CaptureBackend, HttpLog, Options};

/// A logger wired to an in-memory backend.
pub struct Harness {
    pub backend: Arc<CaptureBackend>,
    pub httplog: HttpLog,
}

impl Harness {
    pub fn new(options: Options) -> Self {
        let backend = Arc::new(CaptureBackend::new());
        let httplog = HttpLog::with_options(backend.clone(), options);
        Self { backend, httplog }
    }

    /// Wrap `router` in the full request logger stack.
    #[allow(dead_code)]
    pub fn wrap(&self, router: Router) -> Router {
        let logger = self.httplog.new_logger(None);
        router.layer(self.httplog.request_logger(logger))
    }

    pub fn records(&self) -> Vec<CapturedRecord> {
        self.backend.records()
    }

    /// The only record emitted so far.
    pub fn single_record(&self) -> CapturedRecord {
        let records = self.records();
        assert_eq!(records.len(), 1, "expected exactly one record: {records:#?}");
        records.into_iter().next().unwrap()
    }
}

/// GET request with a peer address, as `axum::serve` would record it.
#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    let mut req = Request::builder()
        .method("GET")
        .uri(uri)
        .header("host", "localhost")
        .body(Body::empty())
        .unwrap();
    req.extensions_mut()
        .insert(ConnectInfo("127.0.0.1:40000".parse::<SocketAddr>().unwrap()));
    req
}

/// Send one request and drain the response body.
#[allow(dead_code)]
pub async fn send(app: Router, req: Request<Body>) -> (Response<()>, String) {
    let response = app.oneshot(req).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    (
        Response::from_parts(parts, ()),
        String::from_utf8_lossy(&bytes).into_owned(),
    )
}
