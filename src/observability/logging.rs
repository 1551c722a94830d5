//! Process-wide `tracing` subscriber.
//!
//! # Responsibilities
//! - Install the subscriber the demo binary and `TracingBackend` write through
//! - Pick JSON or human output and the timestamp format from `Options`
//! - Hand back a `SubscriberHandle` so both can be changed at runtime
//!
//! # Design Decisions
//! - `RUST_LOG` wins when set; otherwise everything on the `httplog` target
//!   passes and the backend's own level threshold does the filtering
//! - The output layer sits behind `reload::Layer`; the filter never changes

use std::fmt;
use std::sync::Arc;

use tracing::Subscriber;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Layer};

use super::json_lines::JsonLines;
use crate::config::Options;

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "httplog=trace,tower_http=info,info";

type OutputLayer = Box<dyn Layer<Registry> + Send + Sync>;
type MakeLayer = dyn Fn(bool, &str) -> OutputLayer + Send + Sync;

/// Handle to the installed output layer.
#[derive(Clone)]
pub struct SubscriberHandle {
    reload: reload::Handle<OutputLayer, Registry>,
    make_layer: Arc<MakeLayer>,
}

impl SubscriberHandle {
    /// Replace the output layer with one using `json_format` and `time_format`.
    pub fn apply(&self, json_format: bool, time_format: &str) -> Result<(), reload::Error> {
        self.reload.reload((self.make_layer)(json_format, time_format))
    }
}

impl fmt::Debug for SubscriberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberHandle").finish_non_exhaustive()
    }
}

/// Install the global subscriber writing to stdout. Fails if one is already installed.
pub fn init_subscriber(options: &Options) -> Result<SubscriberHandle, TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let (subscriber, handle) = build_subscriber(filter, options, std::io::stdout);
    subscriber.try_init()?;
    Ok(handle)
}

/// Build the subscriber without installing it.
pub fn build_subscriber<W>(
    filter: EnvFilter,
    options: &Options,
    writer: W,
) -> (impl Subscriber + Send + Sync + 'static, SubscriberHandle)
where
    W: for<'w> MakeWriter<'w> + Clone + Send + Sync + 'static,
{
    let make_layer: Arc<MakeLayer> = Arc::new(move |json_format: bool, time_format: &str| {
        output_layer(json_format, time_format, writer.clone())
    });
    let (output, reload) = reload::Layer::new(make_layer(options.json_format, &options.time_format));

    let subscriber = tracing_subscriber::registry().with(output).with(filter);
    (subscriber, SubscriberHandle { reload, make_layer })
}

fn output_layer<W>(json_format: bool, time_format: &str, writer: W) -> OutputLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(writer);
    if json_format {
        layer.event_format(JsonLines::new(time_format)).boxed()
    } else {
        layer
            .with_timer(ChronoUtc::new(time_format.to_string()))
            .boxed()
    }
}
