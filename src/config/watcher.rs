//! Configuration file watcher for hot reload.
//!
//! Every write to the file triggers a full load and validation. Only a
//! config that passes both is published; anything else is logged and the
//! running configuration stays in place.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventHandler, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::SimConfig;

/// Reacts to file events by reloading and forwarding the config.
struct ReloadHandler {
    path: PathBuf,
    updates: mpsc::UnboundedSender<SimConfig>,
}

impl ReloadHandler {
    fn reload(&self) {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = ?self.path, error = %e, "Config reload rejected");
                return;
            }
        };

        tracing::info!(
            path = ?self.path,
            requests_per_window = config.rate_limit.requests_per_window,
            "Config reloaded"
        );
        if self.updates.send(config).is_err() {
            tracing::debug!("Config receiver dropped, ignoring change");
        }
    }
}

impl EventHandler for ReloadHandler {
    fn handle_event(&mut self, event: notify::Result<Event>) {
        match event {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => self.reload(),
            Ok(_) => {}
            Err(e) => tracing::error!(error = ?e, "Config watch error"),
        }
    }
}

/// Watches the configuration file and publishes validated replacements.
pub struct ConfigWatcher {
    handler: ReloadHandler,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<SimConfig>) {
        let (updates, update_rx) = mpsc::unbounded_channel();
        let handler = ReloadHandler {
            path: path.to_path_buf(),
            updates,
        };
        (Self { handler }, update_rx)
    }

    /// Start watching. Updates flow only while the returned watcher is alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.handler.path.clone();
        let mut watcher = RecommendedWatcher::new(
            self.handler,
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, EventKind, ModifyKind};
    use std::fs::OpenOptions;
    use std::io::Write;

    fn temp_config(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("auv-watch-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Overwrite in place without truncating first, so a reader never sees
    /// an empty file. `contents` must be at least as long as the old text.
    fn overwrite(path: &Path, contents: &str) {
        let mut file = OpenOptions::new().write(true).open(path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.sync_all().unwrap();
    }

    fn handler(path: &Path) -> (ReloadHandler, mpsc::UnboundedReceiver<SimConfig>) {
        let (watcher, rx) = ConfigWatcher::new(path);
        (watcher.handler, rx)
    }

    #[test]
    fn test_modify_event_publishes_valid_config() {
        let path = temp_config("[rate_limit]\nrequests_per_window = 7\n");
        let (mut handler, mut rx) = handler(&path);

        handler.handle_event(Ok(Event::new(EventKind::Modify(ModifyKind::Any))));
        let config = rx.try_recv().unwrap();
        assert_eq!(config.rate_limit.requests_per_window, 7);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_invalid_file_publishes_nothing() {
        let path = temp_config("[rate_limit]\nrequests_per_window = 0\n");
        let (mut handler, mut rx) = handler(&path);

        handler.handle_event(Ok(Event::new(EventKind::Modify(ModifyKind::Any))));
        assert!(rx.try_recv().is_err());

        std::fs::write(&path, "[rate_limit\n").unwrap();
        handler.handle_event(Ok(Event::new(EventKind::Modify(ModifyKind::Any))));
        assert!(rx.try_recv().is_err());

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_access_events_ignored() {
        let path = temp_config("");
        let (mut handler, mut rx) = handler(&path);

        handler.handle_event(Ok(Event::new(EventKind::Access(AccessKind::Any))));
        assert!(rx.try_recv().is_err());

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_file_rewrite_reaches_receiver() {
        let path = temp_config("[rate_limit]\nrequests_per_window = 300\n");
        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let _guard = watcher.run().unwrap();

        overwrite(&path, "[rate_limit]\nrequests_per_window = 5\n# lowered\n");

        let reloaded = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match rx.recv().await {
                    Some(config) if config.rate_limit.requests_per_window == 5 => break config,
                    Some(_) => continue,
                    None => panic!("watcher channel closed"),
                }
            }
        })
        .await
        .expect("no reload within 5s");
        assert_eq!(reloaded.rate_limit.window_secs, 60);

        // Let any trailing events from that write drain.
        tokio::time::sleep(Duration::from_millis(300)).await;
        while rx.try_recv().is_ok() {}

        overwrite(&path, "[rate_limit]\nrequests_per_window = 0\n# rejected by checks\n");
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());

        std::fs::remove_file(path).ok();
    }
}
