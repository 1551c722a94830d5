//! Options file watcher for hot reload.
//!
//! A single save usually produces several notify events (truncate, write,
//! metadata). Events are collapsed over `DEBOUNCE`, the file is parsed once,
//! and the result is only forwarded when it differs from the options in use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_options;
use crate::config::schema::Options;

/// Quiet period after the first event before the file is read.
pub const DEBOUNCE: Duration = Duration::from_millis(250);

/// Reloads the options file and sends every version that actually changed.
pub struct OptionsWatcher {
    path: PathBuf,
    current: Options,
    update_tx: mpsc::UnboundedSender<Options>,
}

impl OptionsWatcher {
    /// `current` is the normalized options already applied; reloads equal to it are dropped.
    pub fn new(path: &Path, current: Options) -> (Self, mpsc::UnboundedReceiver<Options>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Must be called inside a tokio runtime; the returned
    /// watcher must be kept alive, dropping it stops the reload task.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default(),
        )?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Options watcher started");
        tokio::spawn(self.reload_loop(event_rx));
        Ok(watcher)
    }

    async fn reload_loop(mut self, mut events: mpsc::UnboundedReceiver<()>) {
        while events.recv().await.is_some() {
            tokio::time::sleep(DEBOUNCE).await;
            while events.try_recv().is_ok() {}
            self.reload();
        }
        tracing::debug!(path = ?self.path, "Options watcher stopped");
    }

    /// Read the file once. Returns whether new options were sent.
    fn reload(&mut self) -> bool {
        match load_options(&self.path).map(Options::normalize) {
            Ok(options) if options == self.current => {
                tracing::debug!(path = ?self.path, "Options file touched without changes");
                false
            }
            Ok(options) => {
                tracing::info!(path = ?self.path, "Options file changed, reloading");
                self.current = options.clone();
                let _ = self.update_tx.send(options);
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload options, keeping current ones");
                false
            }
        }
    }
}
