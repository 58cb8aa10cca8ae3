//! Layered configuration source.
//!
//! Holds the three value layers (defaults, file, environment) as JSON trees
//! and merges them on demand, lowest precedence first:
//!
//! ```text
//! defaults  <  file  <  bound environment variables
//! ```
//!
//! Keys are case-insensitive; file keys are lower-cased on read.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::env::{self, process_env, EnvBindings, EnvLookup, SchemaError};
use crate::config::fields::Schema;
use crate::config::locator::SourceLocation;

/// Failure to locate, read or parse the configuration document.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("config file `{name}` not found in {searched:?}")]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Syntax { path: PathBuf, message: String },
}

/// Document format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Also used for JSON and extension-less files.
    Yaml,
    Toml,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => FileFormat::Toml,
            _ => FileFormat::Yaml,
        }
    }
}

/// Configuration values from defaults, the config file and the environment.
#[derive(Clone)]
pub struct ConfigSource {
    location: SourceLocation,
    defaults: Map<String, Value>,
    file: Map<String, Value>,
    file_path: Option<PathBuf>,
    bindings: EnvBindings,
    env: EnvLookup,
}

impl std::fmt::Debug for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSource")
            .field("location", &self.location)
            .field("file_path", &self.file_path)
            .field("bindings", &self.bindings.len())
            .finish_non_exhaustive()
    }
}

impl ConfigSource {
    /// A source searching `location`, reading the process environment.
    pub fn new(location: SourceLocation) -> Self {
        Self {
            location,
            defaults: Map::new(),
            file: Map::new(),
            file_path: None,
            bindings: EnvBindings::new(),
            env: process_env(),
        }
    }

    /// Replace the environment lookup.
    pub fn with_env(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Register a default. Dotted keys address nested tables.
    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) {
        let lowered = key.to_ascii_lowercase();
        let path: Vec<&str> = lowered.split('.').collect();
        env::set_path(&mut self.defaults, &path, value.into());
    }

    pub fn defaults(&self) -> &Map<String, Value> {
        &self.defaults
    }

    /// Locate the config file and load it into the file layer.
    ///
    /// The file layer is replaced only when reading and parsing succeed.
    pub fn read_in_config(&mut self) -> Result<&Path, ReadError> {
        let path = self.location.find()?;
        let contents = fs::read_to_string(&path).map_err(|source| ReadError::Io {
            path: path.clone(),
            source,
        })?;
        self.file = parse_document(&contents, FileFormat::from_path(&path), &path)?;
        Ok(self.file_path.insert(path).as_path())
    }

    /// Path of the file last read, if any.
    pub fn config_file(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Whether the file layer holds no values, as for an empty document.
    pub fn file_is_empty(&self) -> bool {
        self.file.is_empty()
    }

    /// Whether the config file sets `key` at the top level.
    pub fn file_contains(&self, key: &str) -> bool {
        self.file.contains_key(&key.to_ascii_lowercase())
    }

    /// Bind every named leaf of `S` to its environment variable.
    pub fn bind_env<S: Schema>(&mut self) -> Result<(), SchemaError> {
        self.bindings.bind::<S>()
    }

    pub fn bindings(&self) -> &EnvBindings {
        &self.bindings
    }

    /// Merge all layers into one tree.
    pub fn merged(&self) -> Map<String, Value> {
        let mut tree = self.defaults.clone();
        merge_into(&mut tree, self.file.clone());
        self.bindings.apply(&mut tree, &self.env);
        tree
    }

    /// Deserialize the merged tree into `T`.
    pub fn unmarshal<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.merged()))
    }
}

fn parse_document(
    contents: &str,
    format: FileFormat,
    path: &Path,
) -> Result<Map<String, Value>, ReadError> {
    let syntax = |message: String| ReadError::Syntax {
        path: path.to_path_buf(),
        message,
    };
    let document = match format {
        FileFormat::Yaml => serde_yaml::from_str::<Value>(contents).map_err(|e| syntax(e.to_string()))?,
        FileFormat::Toml => toml::from_str::<Value>(contents).map_err(|e| syntax(e.to_string()))?,
    };
    match lowercase_keys(document) {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        _ => Err(syntax("top level of the document must be a mapping".to_string())),
    }
}

fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), lowercase_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

/// Deep-merge `overlay` into `base`. Tables merge key by key, everything else
/// replaces. Nulls in the overlay leave the base value in place.
fn merge_into(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match value {
            Value::Null => {}
            Value::Object(incoming) => {
                if let Some(Value::Object(existing)) = base.get_mut(&key) {
                    merge_into(existing, incoming);
                } else {
                    base.insert(key, Value::Object(incoming));
                }
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}
