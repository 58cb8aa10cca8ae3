//! Command-line arguments consumed by configuration loading.
//!
//! Each flag can also be given through its upper-case environment variable.
//! The fallback is resolved through an [`EnvLookup`] rather than by clap, so
//! callers that inject an environment get the same behaviour as the process.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::env::EnvLookup;

pub const CONFIG_PATH_VAR: &str = "CONFIG_PATH";
pub const CONFIGFILE_VAR: &str = "CONFIGFILE";
pub const HOST_ID_VAR: &str = "NRI_HOST_ID";

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "prom-scraper-config")]
#[command(about = "Resolve and watch the Prometheus scraper configuration", long_about = None)]
#[command(version)]
pub struct ArgumentList {
    /// Path to the config file
    #[arg(long = "config_path", value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// Deprecated. --config_path takes precedence if both are set
    #[arg(long = "configfile", value_name = "PATH")]
    pub configfile: Option<PathBuf>,

    /// Host ID to replace the target name and scraped target name if localhost
    #[arg(long = "nri_host_id", value_name = "ID")]
    pub nri_host_id: Option<String>,
}

impl ArgumentList {
    /// Fill every flag that was not given from its environment variable.
    /// Empty variables count as unset.
    pub fn with_env_fallback(mut self, env: &EnvLookup) -> Self {
        let var = |name: &str| env(name).filter(|v| !v.is_empty());
        if self.config_path.is_none() {
            self.config_path = var(CONFIG_PATH_VAR).map(PathBuf::from);
        }
        if self.configfile.is_none() {
            self.configfile = var(CONFIGFILE_VAR).map(PathBuf::from);
        }
        if self.nri_host_id.is_none() {
            self.nri_host_id = var(HOST_ID_VAR);
        }
        self
    }

    /// `--config_path`, falling back to the deprecated `--configfile`.
    /// Empty values count as unset.
    pub fn effective_config_path(&self) -> Option<&Path> {
        let primary = non_empty(&self.config_path);
        if primary.is_none() {
            if let Some(deprecated) = non_empty(&self.configfile) {
                tracing::warn!("--configfile is deprecated, use --config_path instead");
                return Some(deprecated);
            }
        }
        primary
    }

    pub fn host_id(&self) -> &str {
        self.nri_host_id.as_deref().unwrap_or_default()
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn env(vars: &'static [(&'static str, &'static str)]) -> EnvLookup {
        Arc::new(move |name: &str| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        })
    }

    #[test]
    fn test_env_fills_missing_flags_only() {
        let args = ArgumentList::try_parse_from(["prom-scraper-config", "--nri_host_id", "flag-host"])
            .unwrap()
            .with_env_fallback(&env(&[
                ("CONFIG_PATH", "/from/env.yaml"),
                ("NRI_HOST_ID", "env-host"),
                ("CONFIGFILE", ""),
            ]));
        assert_eq!(args.effective_config_path(), Some(Path::new("/from/env.yaml")));
        assert_eq!(args.host_id(), "flag-host");
        assert_eq!(args.configfile, None);
    }

    #[test]
    fn test_parse_ignores_process_environment() {
        let args = ArgumentList::try_parse_from(["prom-scraper-config"]).unwrap();
        assert_eq!(args, ArgumentList::default());
    }

    #[test]
    fn test_parse_flags() {
        let args = ArgumentList::try_parse_from([
            "prom-scraper-config",
            "--config_path",
            "/etc/agent/config.yaml",
            "--nri_host_id",
            "host-1",
        ])
        .unwrap();
        assert_eq!(args.effective_config_path(), Some(Path::new("/etc/agent/config.yaml")));
        assert_eq!(args.host_id(), "host-1");
    }

    #[test]
    fn test_unknown_flag_is_an_error() {
        assert!(ArgumentList::try_parse_from(["prom-scraper-config", "--bogus"]).is_err());
    }

    #[test]
    fn test_empty_primary_falls_back() {
        let args = ArgumentList {
            config_path: Some(PathBuf::new()),
            configfile: Some(PathBuf::from("old.yaml")),
            nri_host_id: None,
        };
        assert_eq!(args.effective_config_path(), Some(Path::new("old.yaml")));
        assert_eq!(args.host_id(), "");
    }
}
