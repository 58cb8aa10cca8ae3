//! Built-in option defaults, registered before the file is read.

use serde_json::json;

use crate::config::source::ConfigSource;

/// Default `Accept` header for scrapes, as sent by Prometheus before
/// OpenMetrics negotiation.
pub const DEFAULT_SCRAPE_ACCEPT_HEADER: &str = "text/plain;version=0.0.4;q=1,*/*;q=0.1";

/// Harvester tuning defaults.
pub const DEFAULT_HARVEST_PERIOD: &str = "1s";
pub const DEFAULT_MIN_REPORT_INTERVAL: &str = "200ms";
pub const DEFAULT_METRICS_CAP: u64 = 10_000;

pub const DEFAULT_DELTA_EXPIRATION: &str = "5m";

/// Register every option default on `source`. Safe to call more than once.
pub fn set_defaults(source: &mut ConfigSource) {
    source.set_default("debug", false);
    source.set_default("verbose", false);
    source.set_default("audit", false);
    source.set_default("scrape_enabled_label", "prometheus.io/scrape");
    source.set_default("require_scrape_enabled_label_for_nodes", true);
    source.set_default("scrape_timeout", "5s");
    source.set_default("scrape_duration", "30s");
    source.set_default("scrape_accept_header", DEFAULT_SCRAPE_ACCEPT_HEADER);
    source.set_default("emitter_harvest_period", DEFAULT_HARVEST_PERIOD);
    source.set_default("min_emitter_harvest_period", DEFAULT_MIN_REPORT_INTERVAL);
    source.set_default("max_stored_metrics", DEFAULT_METRICS_CAP);
    source.set_default("auto_decorate", false);
    source.set_default("insecure_skip_verify", false);
    source.set_default("standalone", true);
    source.set_default("disable_autodiscovery", false);
    source.set_default("scrape_services", true);
    source.set_default("scrape_endpoints", false);
    source.set_default("percentiles", json!([50.0, 95.0, 99.0]));
    source.set_default("worker_threads", 4);
    source.set_default("self_metrics_listening_address", ":8080");
    source.set_default("hot_load_config", false);
    source.set_default("telemetry_emitter.delta_expiration_age", DEFAULT_DELTA_EXPIRATION);
    source.set_default(
        "telemetry_emitter.delta_expiration_check_interval",
        DEFAULT_DELTA_EXPIRATION,
    );
}
