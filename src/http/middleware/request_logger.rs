//! Request logging middleware.
//!
//! For every request: create the `LogEntry`, put it in the request
//! extensions, start the clock, run the inner service, then wrap the response
//! body so the entry is written once the body has been sent.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::{Request, Response};
use tower::{Layer, Service};

use crate::http::entry::LogEntry;
use crate::http::response::{LoggedBody, ResponseRecorder};
use crate::observability::Logger;
use crate::HttpLog;

/// Layer producing `RequestLogger` services.
#[derive(Clone, Debug)]
pub struct RequestLoggerLayer {
    httplog: HttpLog,
    logger: Logger,
}

impl RequestLoggerLayer {
    /// Log every request through `logger`, reading options from `httplog`.
    pub fn new(httplog: HttpLog, logger: Logger) -> Self {
        Self { httplog, logger }
    }
}

impl<S> Layer<S> for RequestLoggerLayer {
    type Service = RequestLogger<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogger {
            inner,
            httplog: self.httplog.clone(),
            logger: self.logger.clone(),
        }
    }
}

/// Service emitting one log line per request.
#[derive(Clone, Debug)]
pub struct RequestLogger<S> {
    inner: S,
    httplog: HttpLog,
    logger: Logger,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestLogger<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<LoggedBody<ResBody>>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let entry = LogEntry::new(&self.logger, &req, self.httplog.options());
        req.extensions_mut().insert(entry.clone());
        let mut recorder = ResponseRecorder::start(entry);

        // Take the service that was driven to readiness, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            // On error or cancellation the recorder is dropped and flushes with status 0.
            let response = inner.call(req).await?;

            let (parts, body) = response.into_parts();
            recorder.observe_head(parts.status, &parts.headers);
            Ok(Response::from_parts(parts, LoggedBody::new(body, recorder)))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::io;
    use std::sync::Arc;
    use std::time::Duration;

    use tower::{service_fn, ServiceExt};

    use super::*;
    use crate::observability::{CaptureBackend, Level};

    fn logged<S>(inner: S) -> (Arc<CaptureBackend>, RequestLogger<S>) {
        let backend = Arc::new(CaptureBackend::new());
        let httplog = HttpLog::new(backend.clone());
        let logger = httplog.new_logger(None);
        (backend, RequestLoggerLayer::new(httplog, logger).layer(inner))
    }

    fn request() -> Request<()> {
        Request::builder().uri("/orders").body(()).unwrap()
    }

    #[tokio::test]
    async fn test_inner_error_is_logged_and_returned() {
        let (backend, svc) = logged(service_fn(|_req: Request<()>| async {
            Err::<Response<()>, _>(io::Error::other("upstream reset"))
        }));

        let Err(err) = svc.oneshot(request()).await else {
            panic!("inner error was swallowed");
        };
        assert_eq!(err.to_string(), "upstream reset");

        let records = backend.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "0 Unknown");
        assert_eq!(records[0].level, Level::Warn);
        assert_eq!(records[0].field("status"), Some(&serde_json::json!(0)));
    }

    #[tokio::test]
    async fn test_cancelled_request_is_logged_once() {
        let (backend, svc) = logged(service_fn(|_req: Request<()>| async {
            std::future::pending::<Result<Response<()>, Infallible>>().await
        }));

        let outcome = tokio::time::timeout(Duration::from_millis(20), svc.oneshot(request())).await;
        assert!(outcome.is_err());

        let records = backend.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "0 Unknown");
        assert_eq!(records[0].level, Level::Warn);
        assert_eq!(records[0].field("requestPath"), Some(&serde_json::json!("/orders")));
    }
}
