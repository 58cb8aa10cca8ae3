//! Configuration resolution for the Prometheus scraper.

pub mod config;
pub mod observability;

pub use config::schema::ScraperConfig;
pub use config::{load_config, ConfigError, LiveConfig, LoadedConfig};
