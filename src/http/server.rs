//! Demo HTTP server.
//!
//! # Responsibilities
//! - Create the Axum router with a handful of sample handlers
//! - Wire up middleware (request timeout, request logging stack)
//! - Serve with peer addresses recorded and graceful shutdown
//!
//! The handlers exist to exercise every branch of the request logger:
//! success, enrichment, client error, server error and panic.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use crate::http::entry::LogEntry;
use crate::observability::Logger;
use crate::HttpLog;

/// Request timeout applied inside the logging stack, so timeouts are logged as 408.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP server with request logging.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the server. `logger` is the root logger every entry derives from.
    pub fn new(httplog: &HttpLog, logger: Logger) -> Self {
        Self {
            router: Self::build_router(httplog, logger),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(httplog: &HttpLog, logger: Logger) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/users/{id}", get(user))
            .route("/missing", get(missing))
            .route("/fail", get(fail))
            .route("/panic", get(explode))
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(httplog.request_logger(logger))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Serve until `shutdown` completes.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn index() -> &'static str {
    "Hello, World!"
}

async fn user(entry: LogEntry, Path(id): Path<u64>) -> impl IntoResponse {
    entry.set_field("userID", id);
    entry.logger().debug("loading user");
    Json(json!({ "id": id }))
}

async fn missing() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}

async fn fail() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable")
}

async fn explode() -> &'static str {
    panic!("handler exploded")
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
