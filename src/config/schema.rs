//! Configuration schema definitions.
//!
//! `ScraperConfig` is the fully resolved configuration handed to the scraper
//! and emitters. Serde field names are the canonical option names; the
//! [`Schema`] impls below list the same names for environment binding.
//!
//! `Default` yields zero values. Option defaults live in the default table
//! (`config::defaults`) and are merged in before the file.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::duration;
use crate::config::fields::{Field, Record, Schema, ValueKind};

/// Emitter sending through the telemetry SDK; the standalone default.
pub const EMITTER_TELEMETRY: &str = "telemetry";
/// Emitter handing metrics to the infrastructure agent.
pub const EMITTER_INFRA_SDK: &str = "infra-sdk";
pub const EMITTER_STDOUT: &str = "stdout";

/// Root configuration for the scraper.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ScraperConfig {
    /// Metric API endpoint. Derived from the license key when empty.
    pub metric_api_url: String,

    pub license_key: LicenseKey,

    pub cluster_name: String,

    pub debug: bool,
    pub verbose: bool,
    pub audit: bool,

    /// Emitters to send metrics through. Defaults by `standalone` when empty.
    pub emitters: Vec<String>,

    /// Label that marks a target as scrapable.
    pub scrape_enabled_label: String,
    pub require_scrape_enabled_label_for_nodes: bool,

    #[serde(with = "duration")]
    pub scrape_timeout: Duration,

    /// How often targets are scraped.
    #[serde(with = "duration")]
    pub scrape_duration: Duration,

    pub scrape_accept_header: String,

    #[serde(with = "duration")]
    pub emitter_harvest_period: Duration,

    #[serde(with = "duration")]
    pub min_emitter_harvest_period: Duration,

    /// Cap on metrics buffered between harvests.
    pub max_stored_metrics: u64,

    /// Static scrape targets.
    pub targets: Vec<TargetConfig>,

    pub auto_decorate: bool,

    pub ca_file: String,
    pub bearer_token_file: String,
    pub insecure_skip_verify: bool,

    pub standalone: bool,
    pub disable_autodiscovery: bool,
    pub scrape_services: bool,
    pub scrape_endpoints: bool,

    pub emitter_proxy: String,
    pub emitter_ca_file: String,
    pub emitter_insecure_skip_verify: bool,

    pub telemetry_emitter: TelemetryEmitterConfig,

    /// Summary percentiles to compute, each in (0, 100].
    pub percentiles: Vec<f64>,

    pub worker_threads: u32,

    pub self_metrics_listening_address: String,

    /// Watch the config file and reload on change.
    #[serde(rename = "hot_load_config")]
    pub hot_reload: bool,

    /// Set from `--nri_host_id` only.
    #[serde(skip)]
    pub host_id: String,
}

impl Schema for ScraperConfig {
    fn record() -> Record {
        use crate::config::fields::ValueKind as K;
        Record {
            type_name: "ScraperConfig",
            fields: vec![
                Field::leaf("metric_api_url", K::Text),
                Field::leaf("license_key", K::Text),
                Field::leaf("cluster_name", K::Text),
                Field::leaf("debug", K::Bool),
                Field::leaf("verbose", K::Bool),
                Field::leaf("audit", K::Bool),
                Field::leaf("emitters", K::TextList),
                Field::leaf("scrape_enabled_label", K::Text),
                Field::leaf("require_scrape_enabled_label_for_nodes", K::Bool),
                Field::leaf("scrape_timeout", K::Duration),
                Field::leaf("scrape_duration", K::Duration),
                Field::leaf("scrape_accept_header", K::Text),
                Field::leaf("emitter_harvest_period", K::Duration),
                Field::leaf("min_emitter_harvest_period", K::Duration),
                Field::leaf("max_stored_metrics", K::Integer),
                Field::leaf("targets", K::Structured),
                Field::leaf("auto_decorate", K::Bool),
                Field::leaf("ca_file", K::Text),
                Field::leaf("bearer_token_file", K::Text),
                Field::leaf("insecure_skip_verify", K::Bool),
                Field::leaf("standalone", K::Bool),
                Field::leaf("disable_autodiscovery", K::Bool),
                Field::leaf("scrape_services", K::Bool),
                Field::leaf("scrape_endpoints", K::Bool),
                Field::leaf("emitter_proxy", K::Text),
                Field::leaf("emitter_ca_file", K::Text),
                Field::leaf("emitter_insecure_skip_verify", K::Bool),
                Field::record::<TelemetryEmitterConfig>("telemetry_emitter"),
                Field::leaf("percentiles", K::FloatList),
                Field::leaf("worker_threads", K::Integer),
                Field::leaf("self_metrics_listening_address", K::Text),
                Field::leaf("hot_load_config", K::Bool),
                Field::unnamed(K::Text),
            ],
        }
    }
}

/// Tuning for the telemetry emitter's delta calculator.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TelemetryEmitterConfig {
    /// Age after which cached delta state is dropped.
    #[serde(with = "duration")]
    pub delta_expiration_age: Duration,

    #[serde(with = "duration")]
    pub delta_expiration_check_interval: Duration,
}

impl Schema for TelemetryEmitterConfig {
    fn record() -> Record {
        Record {
            type_name: "TelemetryEmitterConfig",
            fields: vec![
                Field::leaf("delta_expiration_age", ValueKind::Duration),
                Field::leaf("delta_expiration_check_interval", ValueKind::Duration),
            ],
        }
    }
}

/// A statically configured scrape target.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TargetConfig {
    pub description: String,
    pub urls: Vec<String>,
}

/// License key. Never printed in full.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct LicenseKey(String);

impl LicenseKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LicenseKey({self})")
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        let visible: String = self.0.chars().take(4).collect();
        write!(f, "{visible}***")
    }
}
