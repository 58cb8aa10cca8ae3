//! Live configuration shared with the rest of the process.
//!
//! The current configuration is an immutable snapshot behind an `ArcSwap`.
//! Readers call [`LiveConfig::snapshot`] and keep the `Arc` for as long as
//! they need a consistent view; the reload watcher replaces it atomically.
//! A `watch` channel carries the version number so consumers can await
//! changes. It holds a single slot, so a slow consumer only sees the latest.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;

use crate::config::schema::ScraperConfig;

#[derive(Debug)]
struct Shared {
    current: ArcSwap<ScraperConfig>,
    versions: watch::Sender<u64>,
}

/// Cloneable handle to the process-wide configuration.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    shared: Arc<Shared>,
}

impl LiveConfig {
    /// Start at version 0 with `config`.
    pub fn new(config: ScraperConfig) -> Self {
        let (versions, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                current: ArcSwap::from_pointee(config),
                versions,
            }),
        }
    }

    /// The current configuration.
    pub fn snapshot(&self) -> Arc<ScraperConfig> {
        self.shared.current.load_full()
    }

    /// Number of configurations published since the initial load.
    pub fn version(&self) -> u64 {
        *self.shared.versions.borrow()
    }

    /// Receiver that is notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.versions.subscribe()
    }

    /// Replace the configuration and bump the version.
    ///
    /// The snapshot is stored before the version is announced, so a woken
    /// subscriber always reads a configuration at least that new.
    pub(crate) fn publish(&self, config: ScraperConfig) -> u64 {
        self.shared.current.store(Arc::new(config));
        let mut version = 0;
        self.shared.versions.send_modify(|v| {
            *v += 1;
            version = *v;
        });
        version
    }
}
