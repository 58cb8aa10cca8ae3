//! Structured logging.
//!
//! `RUST_LOG` takes precedence. Otherwise this crate logs at `info`, or at
//! `debug` once the loaded configuration sets `verbose` or `debug`. The
//! filter sits behind a reload layer so the level can follow the
//! configuration after the subscriber is installed.

use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

const INFO_DIRECTIVE: &str = "prom_scraper_config=info";
const DEBUG_DIRECTIVE: &str = "prom_scraper_config=debug";

/// Filter directive for the crate when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        DEBUG_DIRECTIVE
    } else {
        INFO_DIRECTIVE
    }
}

/// Adjusts the installed filter.
#[derive(Debug, Clone)]
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogHandle {
    /// Switch between the `info` and `debug` defaults. A filter taken from
    /// `RUST_LOG` is left alone. Returns whether the filter was changed.
    pub fn set_verbose(&self, verbose: bool) -> bool {
        if self.from_env {
            return false;
        }
        match self.filter.reload(EnvFilter::new(default_directive(verbose))) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Log filter not reloaded: {}", e);
                false
            }
        }
    }
}

fn reloadable_filter() -> (reload::Layer<EnvFilter, Registry>, LogHandle) {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(default_directive(false)), false),
    };
    let (layer, filter) = reload::Layer::new(filter);
    (layer, LogHandle { filter, from_env })
}

/// Install the global subscriber. If one is already installed it is kept and
/// the returned handle has no effect.
pub fn init() -> LogHandle {
    let (filter, handle) = reloadable_filter();
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
    handle
}
