//! httplog demo server.
//!
//! Serves a few sample routes behind the request logger so its output can be
//! inspected:
//!
//! ```text
//! httplog --bind 127.0.0.1:8080 --config httplog.toml --watch
//! curl localhost:8080/            → 200 OK
//! curl localhost:8080/users/7     → 200 OK, enriched with userID
//! curl localhost:8080/missing     → 404 Client Error, responseBody logged
//! curl localhost:8080/fail        → 503 Server Error
//! curl localhost:8080/panic       → 500 Server Error - handler exploded
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use httplog::config::{load_options, Options, OptionsWatcher};
use httplog::http::HttpServer;
use httplog::observability::logging::init_subscriber;
use httplog::{HttpLog, TracingBackend};

#[derive(Parser)]
#[command(name = "httplog")]
#[command(about = "Demo server for the HTTP request logger", long_about = None)]
struct Cli {
    /// Options file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Reload the options file when it changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let options = match &cli.config {
        Some(path) => load_options(path)?,
        None => Options::default(),
    };
    let options = options.normalize();

    let subscriber = init_subscriber(&options)?;
    tracing::info!("httplog v{} starting", env!("CARGO_PKG_VERSION"));

    let httplog = HttpLog::new(Arc::new(TracingBackend::with_subscriber(subscriber)));
    let logger = httplog.new_logger(Some(options.clone()));

    // The watcher stops when dropped, keep it for the lifetime of main.
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, mut updates) = OptionsWatcher::new(path, options);
            let watcher = watcher.run()?;
            let httplog = httplog.clone();
            tokio::spawn(async move {
                while let Some(options) = updates.recv().await {
                    httplog.configure(options);
                    tracing::info!("Options reloaded");
                }
            });
            Some(watcher)
        }
        _ => None,
    };

    let listener = TcpListener::bind(&cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(&httplog, logger);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
