//! Configuration file watcher for hot reload.
//!
//! # States
//! ```text
//! Idle ──run()──▶ Watching ──file event──▶ Reparsing ──▶ Watching
//! ```
//!
//! A reparse re-reads the file, re-merges defaults and environment, re-applies
//! derived values, and publishes the result to [`LiveConfig`]. A failed
//! reparse is logged and the current configuration is kept. An empty document
//! (a truncate-then-write save caught halfway) counts as a failure.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

use crate::config::live::LiveConfig;
use crate::config::loader::resolve;
use crate::config::source::{ConfigSource, ReadError};
use crate::config::ScraperConfig;

/// Reload failure. Never fatal.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("reload failed: {0}")]
    Read(#[from] ReadError),

    #[error("reload of {} failed: document is empty", .path.display())]
    Empty { path: PathBuf },

    #[error("reload of {} failed: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WatchState {
    Idle = 0,
    Watching = 1,
    Reparsing = 2,
}

impl WatchState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => WatchState::Watching,
            2 => WatchState::Reparsing,
            _ => WatchState::Idle,
        }
    }
}

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    source: ConfigSource,
    host_id: String,
    live: LiveConfig,
}

/// Keeps the watch alive. Dropping it stops watching.
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
    path: PathBuf,
    state: Arc<AtomicU8>,
    failed_reloads: Arc<AtomicU64>,
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("path", &self.path)
            .field("state", &self.state())
            .field("failed_reloads", &self.failed_reloads())
            .finish()
    }
}

impl WatchHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> WatchState {
        WatchState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Reloads rejected since watching started.
    pub fn failed_reloads(&self) -> u64 {
        self.failed_reloads.load(Ordering::Acquire)
    }
}

impl ConfigWatcher {
    /// Create a watcher for the file `source` was read from.
    pub fn new(source: ConfigSource, host_id: String, live: LiveConfig) -> Self {
        Self {
            source,
            host_id,
            live,
        }
    }

    /// Start watching on the notify background thread.
    ///
    /// The parent directory is watched so that editors replacing the file by
    /// rename are noticed; events for other files are ignored.
    pub fn run(self) -> Result<WatchHandle, notify::Error> {
        let path = self
            .source
            .config_file()
            .map(Path::to_path_buf)
            .ok_or_else(|| notify::Error::generic("configuration source has no file to watch"))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let state = Arc::new(AtomicU8::new(WatchState::Idle as u8));
        let failed_reloads = Arc::new(AtomicU64::new(0));
        let mut reloader = Reloader {
            source: self.source,
            host_id: self.host_id,
            live: self.live,
            path: path.clone(),
            state: state.clone(),
            failed_reloads: failed_reloads.clone(),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if reloader.is_relevant(&event) {
                        tracing::info!(path = %reloader.path.display(), "Config file change detected, reloading...");
                        reloader.reload();
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        state.store(WatchState::Watching as u8, Ordering::Release);

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(WatchHandle {
            _watcher: watcher,
            path,
            state,
            failed_reloads,
        })
    }
}

struct Reloader {
    source: ConfigSource,
    host_id: String,
    live: LiveConfig,
    path: PathBuf,
    state: Arc<AtomicU8>,
    failed_reloads: Arc<AtomicU64>,
}

impl Reloader {
    fn is_relevant(&self, event: &Event) -> bool {
        (event.kind.is_modify() || event.kind.is_create())
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == self.path.file_name())
    }

    fn reload(&mut self) {
        self.state.store(WatchState::Reparsing as u8, Ordering::Release);
        let result = self.reparse();
        self.state.store(WatchState::Watching as u8, Ordering::Release);

        match result {
            Ok(config) if *self.live.snapshot() == config => {
                tracing::debug!("Configuration unchanged after reload");
            }
            Ok(config) => {
                let version = self.live.publish(config);
                tracing::info!(version, "Configuration reloaded");
            }
            Err(e) => {
                self.failed_reloads.fetch_add(1, Ordering::AcqRel);
                tracing::error!("{}. Keeping current configuration.", e);
            }
        }
    }

    fn reparse(&mut self) -> Result<ScraperConfig, ReloadError> {
        self.source.read_in_config()?;
        if self.source.file_is_empty() {
            return Err(ReloadError::Empty {
                path: self.path.clone(),
            });
        }
        resolve(&self.source, &self.host_id).map_err(|source| ReloadError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}
