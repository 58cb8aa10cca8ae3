//! Config file location.
//!
//! An explicit path is split into its directory and file name. Without one,
//! `config` is searched in `/etc/nri-prometheus/` and then the working
//! directory. Within each directory the supported extensions are tried before
//! the bare name.

use std::path::{Path, PathBuf};

use crate::config::args::ArgumentList;
use crate::config::source::ReadError;

pub const DEFAULT_CONFIG_NAME: &str = "config";
pub const DEFAULT_CONFIG_DIR: &str = "/etc/nri-prometheus/";
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["yaml", "yml", "toml"];

/// Where to look for the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub search_paths: Vec<PathBuf>,
    pub name: String,
}

impl SourceLocation {
    pub fn from_args(args: &ArgumentList) -> Self {
        match args.effective_config_path() {
            Some(path) => Self::explicit(path),
            None => Self::fallback(),
        }
    }

    pub fn explicit(path: &Path) -> Self {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            search_paths: vec![dir.to_path_buf()],
            name,
        }
    }

    pub fn fallback() -> Self {
        Self {
            search_paths: vec![PathBuf::from(DEFAULT_CONFIG_DIR), PathBuf::from(".")],
            name: DEFAULT_CONFIG_NAME.to_string(),
        }
    }

    /// Candidate files in search order.
    pub fn candidates(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.search_paths.iter().flat_map(move |dir| {
            SUPPORTED_EXTENSIONS
                .into_iter()
                .map(move |ext| dir.join(format!("{}.{ext}", self.name)))
                .chain(std::iter::once(dir.join(&self.name)))
        })
    }

    /// The first candidate that exists as a regular file.
    pub fn find(&self) -> Result<PathBuf, ReadError> {
        if !self.name.is_empty() {
            if let Some(found) = self.candidates().find(|p| p.is_file()) {
                return Ok(found);
            }
        }
        Err(ReadError::NotFound {
            name: self.name.clone(),
            searched: self.search_paths.clone(),
        })
    }
}
