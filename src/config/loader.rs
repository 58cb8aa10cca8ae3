//! Configuration loading.
//!
//! Resolves arguments, defaults, the config file and environment overrides
//! into a [`ScraperConfig`], applies derived values, and starts the reload
//! watcher when `hot_load_config` is set. Any failure aborts the load; no
//! partially resolved configuration is returned. Suspicious but loadable
//! values are only logged.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;

use crate::config::args::ArgumentList;
use crate::config::defaults::set_defaults;
use crate::config::env::{process_env, EnvLookup, SchemaError};
use crate::config::live::LiveConfig;
use crate::config::locator::SourceLocation;
use crate::config::region;
use crate::config::schema::{ScraperConfig, EMITTER_INFRA_SDK, EMITTER_TELEMETRY};
use crate::config::source::{ConfigSource, ReadError};
use crate::config::validation::warn_suspicious;
use crate::config::watcher::{ConfigWatcher, WatchHandle};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid arguments: {0}")]
    Argument(#[from] clap::Error),

    #[error("could not read configuration: {0}")]
    Read(#[from] ReadError),

    /// The merged file and environment values do not fit the schema. The
    /// offending value may come from either.
    #[error("could not parse configuration ({} with environment overrides): {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("could not watch configuration file: {0}")]
    Watch(#[from] notify::Error),
}

/// Result of a successful load.
#[derive(Debug)]
pub struct LoadedConfig {
    live: LiveConfig,
    config_file: PathBuf,
    watcher: Option<WatchHandle>,
}

impl LoadedConfig {
    /// The current configuration.
    pub fn snapshot(&self) -> Arc<ScraperConfig> {
        self.live.snapshot()
    }

    pub fn live(&self) -> &LiveConfig {
        &self.live
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// The reload watcher, present when hot reload is enabled. Dropping it
    /// stops watching.
    pub fn watcher(&self) -> Option<&WatchHandle> {
        self.watcher.as_ref()
    }
}

/// Load using the process arguments and environment.
pub fn load_config() -> Result<LoadedConfig, ConfigError> {
    let args = ArgumentList::try_parse()?;
    load_with(&args, process_env())
}

/// Load from an explicit argument vector (first item is the program name).
pub fn load_config_from<I, T>(argv: I, env: EnvLookup) -> Result<LoadedConfig, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = ArgumentList::try_parse_from(argv)?;
    load_with(&args, env)
}

/// Load from parsed arguments. Flags missing from `args` fall back to their
/// variables in `env`.
pub fn load_with(args: &ArgumentList, env: EnvLookup) -> Result<LoadedConfig, ConfigError> {
    let args = args.clone().with_env_fallback(&env);
    let mut source = ConfigSource::new(SourceLocation::from_args(&args)).with_env(env);
    set_defaults(&mut source);

    let config_file = source.read_in_config()?.to_path_buf();
    tracing::info!(path = %config_file.display(), "Configuration file read");

    if source.file_contains("entity_definitions") {
        tracing::debug!("entity_definitions are deprecated and won't be processed");
    }

    source.bind_env::<ScraperConfig>()?;

    let host_id = args.host_id().to_string();
    let config = resolve(&source, &host_id).map_err(|source| ConfigError::Parse {
        path: config_file.clone(),
        source,
    })?;
    let hot_reload = config.hot_reload;
    let live = LiveConfig::new(config);

    let watcher = if hot_reload {
        Some(ConfigWatcher::new(source, host_id, live.clone()).run()?)
    } else {
        None
    };

    Ok(LoadedConfig {
        live,
        config_file,
        watcher,
    })
}

/// Unmarshal the merged layers, derive computed values and log anything
/// suspicious.
pub(crate) fn resolve(source: &ConfigSource, host_id: &str) -> Result<ScraperConfig, serde_json::Error> {
    let mut config: ScraperConfig = source.unmarshal()?;
    apply_derived(&mut config, host_id);
    warn_suspicious(&config);
    Ok(config)
}

/// Fill values that depend on other options. Explicit settings win, except
/// the host ID, which only ever comes from the arguments.
pub fn apply_derived(config: &mut ScraperConfig, host_id: &str) {
    if config.emitters.is_empty() {
        let emitter = if config.standalone {
            EMITTER_TELEMETRY
        } else {
            EMITTER_INFRA_SDK
        };
        config.emitters.push(emitter.to_string());
    }

    if config.metric_api_url.is_empty() {
        config.metric_api_url = region::metric_api_url(config.license_key.expose());
    }

    config.host_id = host_id.to_string();
}
