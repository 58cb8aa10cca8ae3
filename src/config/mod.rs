//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI arguments (args.rs)
//!     → locator.rs (search directories + file name)
//!     → defaults.rs (default table into the source)
//!     → source.rs (read & parse YAML/TOML file)
//!     → env.rs (bind one environment variable per schema leaf)
//!     → loader.rs (unmarshal, derive emitters/endpoint/host id, warn on odd values)
//!     → LiveConfig (immutable snapshot behind ArcSwap)
//!
//! With hot_load_config enabled:
//!     watcher.rs detects change
//!     → source.rs re-reads the file
//!     → loader.rs resolves again
//!     → atomic swap of Arc<ScraperConfig>, version bump
//!     → subscribers observe new config
//! ```
//!
//! # Design Decisions
//! - Precedence: defaults < file < environment < arguments (host id)
//! - Snapshots are immutable; a reload swaps in a whole new one
//! - Startup errors are fatal, reload errors keep the previous snapshot

pub mod args;
pub mod defaults;
pub mod duration;
pub mod env;
pub mod fields;
pub mod live;
pub mod loader;
pub mod locator;
pub mod region;
pub mod schema;
pub mod source;
pub mod validation;
pub mod watcher;

pub use args::ArgumentList;
pub use live::LiveConfig;
pub use loader::{load_config, load_config_from, load_with, ConfigError, LoadedConfig};
pub use schema::ScraperConfig;
pub use schema::TelemetryEmitterConfig;
pub use schema::TargetConfig;
