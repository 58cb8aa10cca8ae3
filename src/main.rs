//! Prometheus scraper configuration resolver.
//!
//! Resolves the scraper configuration from arguments, the config file,
//! defaults and environment variables, then logs the result.
//!
//! ```text
//!  --config_path / --configfile      /etc/nri-prometheus/config.yaml, ./config.yaml
//!              │                                   │
//!              └──────────────┬────────────────────┘
//!                             ▼
//!   defaults ──▶  merge  ◀── environment (one variable per option)
//!                   │
//!                   ▼
//!        derive emitters, metric API URL, host id
//!                   │
//!                   ▼
//!              LiveConfig ◀── watcher (hot_load_config)
//! ```
//!
//! With `hot_load_config: true` the process keeps running, logging every
//! reloaded version until interrupted.

use prom_scraper_config::config::{load_config, ConfigError};
use prom_scraper_config::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log = observability::logging::init();

    tracing::info!("prom-scraper-config v{} starting", env!("CARGO_PKG_VERSION"));

    let loaded = match load_config() {
        Ok(loaded) => loaded,
        Err(ConfigError::Argument(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };

    let config = loaded.snapshot();
    log.set_verbose(config.verbose || config.debug);
    tracing::info!(
        config_file = %loaded.config_file().display(),
        emitters = ?config.emitters,
        metric_api_url = %config.metric_api_url,
        license_key = %config.license_key,
        standalone = config.standalone,
        worker_threads = config.worker_threads,
        hot_reload = config.hot_reload,
        "Configuration loaded"
    );

    if loaded.watcher().is_none() {
        return Ok(());
    }

    let mut updates = loaded.live().subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let version = *updates.borrow_and_update();
                let config = loaded.snapshot();
                log.set_verbose(config.verbose || config.debug);
                tracing::info!(
                    version,
                    emitters = ?config.emitters,
                    metric_api_url = %config.metric_api_url,
                    worker_threads = config.worker_threads,
                    "Configuration updated"
                );
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
