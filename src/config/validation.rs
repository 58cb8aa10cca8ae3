//! Configuration sanity checks.
//!
//! Serde handles shape and type errors. These checks look for values that
//! load fine but are probably mistakes. They never reject a configuration;
//! the loader logs every finding at `warn` and carries on.

use thiserror::Error;
use url::Url;

use crate::config::duration::format_duration;
use crate::config::schema::{ScraperConfig, EMITTER_INFRA_SDK, EMITTER_STDOUT, EMITTER_TELEMETRY};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigWarning {
    #[error("percentile {0} is outside (0, 100]")]
    Percentile(f64),

    #[error("worker_threads is 0")]
    NoWorkers,

    #[error("unknown emitter `{0}`")]
    UnknownEmitter(String),

    #[error("metric_api_url `{url}` is not a valid URL: {reason}")]
    MetricApiUrl { url: String, reason: String },

    #[error("min_emitter_harvest_period ({min}) exceeds emitter_harvest_period ({period})")]
    HarvestPeriod { min: String, period: String },
}

/// Inspect a resolved configuration and return every finding.
pub fn check_config(config: &ScraperConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    for &p in &config.percentiles {
        if !(p > 0.0 && p <= 100.0) {
            warnings.push(ConfigWarning::Percentile(p));
        }
    }

    if config.worker_threads == 0 {
        warnings.push(ConfigWarning::NoWorkers);
    }

    for emitter in &config.emitters {
        if ![EMITTER_TELEMETRY, EMITTER_INFRA_SDK, EMITTER_STDOUT].contains(&emitter.as_str()) {
            warnings.push(ConfigWarning::UnknownEmitter(emitter.clone()));
        }
    }

    if !config.metric_api_url.is_empty() {
        if let Err(e) = Url::parse(&config.metric_api_url) {
            warnings.push(ConfigWarning::MetricApiUrl {
                url: config.metric_api_url.clone(),
                reason: e.to_string(),
            });
        }
    }

    if config.min_emitter_harvest_period > config.emitter_harvest_period {
        warnings.push(ConfigWarning::HarvestPeriod {
            min: format_duration(config.min_emitter_harvest_period),
            period: format_duration(config.emitter_harvest_period),
        });
    }

    warnings
}

/// Log every finding of [`check_config`] at `warn`.
pub fn warn_suspicious(config: &ScraperConfig) {
    for warning in check_config(config) {
        tracing::warn!("Suspicious configuration: {}", warning);
    }
}
