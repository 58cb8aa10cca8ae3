//! Metric API endpoint selection from the license key.
//!
//! Region-scoped license keys start with the region code (2-3 lowercase
//! letters), two digits and one or two letters, e.g. `eu01xx...`. Anything
//! else belongs to the default (US) region.

use std::sync::LazyLock;

use regex::Regex;

static REGION_LICENSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]{2,3})[0-9]{2}[a-z]{1,2}").expect("valid region pattern"));

/// Region-scoped endpoint; `{region}` is replaced by the region code.
pub const METRIC_API_REGION_URL: &str = "https://metric-api.{region}.newrelic.com/metric/v1/infra";

/// Endpoint for keys without a region prefix.
pub const DEFAULT_METRIC_API_URL: &str = "https://metric-api.newrelic.com/metric/v1/infra";

/// Region code encoded in `license`, if any.
pub fn license_region(license: &str) -> Option<&str> {
    REGION_LICENSE_RE
        .captures(license)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Metric API URL for `license`. Never fails: unknown formats get the default.
pub fn metric_api_url(license: &str) -> String {
    match license_region(license) {
        Some(region) => METRIC_API_REGION_URL.replace("{region}", region),
        None => DEFAULT_METRIC_API_URL.to_string(),
    }
}
