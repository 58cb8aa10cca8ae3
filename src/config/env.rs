//! Environment variable binding.
//!
//! Every named leaf of the schema gets exactly one environment variable: the
//! canonical names along its path, upper-cased and joined with `_`. A field
//! `delta_expiration_age` nested under `telemetry_emitter` is therefore read
//! from `TELEMETRY_EMITTER_DELTA_EXPIRATION_AGE`. Bindings are registered
//! before the file is unmarshalled, so a variable applies even when its key is
//! absent from the file.

use std::sync::Arc;

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::config::fields::{FieldKind, Record, Schema, ValueKind};

/// Resolves an environment variable by name.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Lookup backed by the process environment.
pub fn process_env() -> EnvLookup {
    Arc::new(|name: &str| std::env::var(name).ok())
}

/// Errors in the schema description itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema type `{type_name}` contains itself at `{path}`")]
    Cycle {
        type_name: &'static str,
        path: String,
    },
}

/// A single leaf bound to an environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvBinding {
    pub path: Vec<&'static str>,
    pub var: String,
    pub kind: ValueKind,
}

impl EnvBinding {
    /// Dotted key of the bound field, e.g. `telemetry_emitter.delta_expiration_age`.
    pub fn key(&self) -> String {
        self.path.join(".")
    }
}

/// Registry of environment bindings, written once at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvBindings {
    bindings: Vec<EnvBinding>,
}

impl EnvBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the schema of `S` and register a binding for every named leaf.
    ///
    /// Fields without a canonical name are skipped together with anything
    /// below them. A record that (transitively) contains itself is an error.
    pub fn bind<S: Schema>(&mut self) -> Result<(), SchemaError> {
        let mut stack = Vec::new();
        let mut parts = Vec::new();
        self.visit(S::record(), &mut stack, &mut parts)
    }

    fn visit(
        &mut self,
        record: Record,
        stack: &mut Vec<&'static str>,
        parts: &mut Vec<&'static str>,
    ) -> Result<(), SchemaError> {
        if stack.contains(&record.type_name) {
            return Err(SchemaError::Cycle {
                type_name: record.type_name,
                path: parts.join("."),
            });
        }
        stack.push(record.type_name);

        for field in &record.fields {
            let Some(name) = field.name else {
                continue;
            };
            parts.push(name);
            match field.kind {
                FieldKind::Record(nested) => self.visit(nested(), stack, parts)?,
                FieldKind::Leaf(kind) => self.insert(parts, kind),
            }
            parts.pop();
        }

        stack.pop();
        Ok(())
    }

    fn insert(&mut self, parts: &[&'static str], kind: ValueKind) {
        let binding = EnvBinding {
            path: parts.to_vec(),
            var: env_var_name(parts),
            kind,
        };
        match self.bindings.iter_mut().find(|b| b.path == binding.path) {
            Some(existing) => *existing = binding,
            None => self.bindings.push(binding),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Overlay every bound variable present in the environment onto `tree`.
    ///
    /// Empty values count as unset. Returns how many overrides were applied.
    pub fn apply(&self, tree: &mut Map<String, Value>, lookup: &EnvLookup) -> usize {
        let mut applied = 0;
        for binding in &self.bindings {
            let Some(raw) = lookup(&binding.var).filter(|v| !v.is_empty()) else {
                continue;
            };
            set_path(tree, &binding.path, coerce(&raw, binding.kind));
            tracing::debug!(var = %binding.var, key = %binding.key(), "environment override applied");
            applied += 1;
        }
        applied
    }
}

/// `["telemetry_emitter", "delta_expiration_age"]` → `TELEMETRY_EMITTER_DELTA_EXPIRATION_AGE`.
pub fn env_var_name(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Insert `value` at `path`, creating intermediate tables as needed.
pub(crate) fn set_path(tree: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = tree;
    for part in parents {
        let slot = current
            .entry((*part).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert((*last).to_string(), value);
}

/// Convert a raw environment string according to the leaf's kind.
///
/// Anything that does not coerce is passed through as a string and left for
/// deserialization to reject.
fn coerce(raw: &str, kind: ValueKind) -> Value {
    let coerced = match kind {
        ValueKind::Bool => parse_bool(raw.trim()).map(Value::Bool),
        ValueKind::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
        ValueKind::Float => parse_float(raw),
        ValueKind::Duration => raw.trim().parse::<u64>().ok().map(Value::from),
        ValueKind::Text => None,
        ValueKind::TextList => Some(Value::Array(
            split_list(raw).map(|s| Value::String(s.to_string())).collect(),
        )),
        ValueKind::FloatList => split_list(raw)
            .map(parse_float)
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        ValueKind::Structured => serde_yaml::from_str::<Value>(raw).ok(),
    };
    coerced.unwrap_or_else(|| Value::String(raw.to_string()))
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_float(raw: &str) -> Option<Value> {
    let n = raw.trim().parse::<f64>().ok()?;
    Number::from_f64(n).map(Value::Number)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fields::Field;
    use std::collections::HashMap;

    struct Inner;

    impl Schema for Inner {
        fn record() -> Record {
            Record {
                type_name: "Inner",
                fields: vec![
                    Field::leaf("timeout", ValueKind::Duration),
                    Field::leaf("retries", ValueKind::Integer),
                ],
            }
        }
    }

    struct Outer;

    impl Schema for Outer {
        fn record() -> Record {
            Record {
                type_name: "Outer",
                fields: vec![
                    Field::leaf("debug", ValueKind::Bool),
                    Field::record::<Inner>("scrape"),
                    Field::unnamed(ValueKind::Text),
                    Field::leaf("percentiles", ValueKind::FloatList),
                ],
            }
        }
    }

    struct Looping;

    impl Schema for Looping {
        fn record() -> Record {
            Record {
                type_name: "Looping",
                fields: vec![
                    Field::leaf("name", ValueKind::Text),
                    Field::record::<Looping>("next"),
                ],
            }
        }
    }

    fn lookup(vars: &[(&str, &str)]) -> EnvLookup {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Arc::new(move |name: &str| map.get(name).cloned())
    }

    #[test]
    fn test_one_binding_per_named_leaf() {
        let mut bindings = EnvBindings::new();
        bindings.bind::<Outer>().unwrap();

        let vars: Vec<_> = bindings.iter().map(|b| b.var.as_str()).collect();
        assert_eq!(vars, ["DEBUG", "SCRAPE_TIMEOUT", "SCRAPE_RETRIES", "PERCENTILES"]);

        let nested = bindings.iter().find(|b| b.var == "SCRAPE_TIMEOUT").unwrap();
        assert_eq!(nested.path, ["scrape", "timeout"]);
        assert_eq!(nested.key(), "scrape.timeout");
    }

    #[test]
    fn test_binding_twice_is_idempotent() {
        let mut bindings = EnvBindings::new();
        bindings.bind::<Outer>().unwrap();
        bindings.bind::<Outer>().unwrap();
        assert_eq!(bindings.len(), 4);
    }

    #[test]
    fn test_self_referential_schema_is_rejected() {
        let mut bindings = EnvBindings::new();
        let err = bindings.bind::<Looping>().unwrap_err();
        assert_eq!(
            err,
            SchemaError::Cycle {
                type_name: "Looping",
                path: "next".into()
            }
        );
    }

    #[test]
    fn test_apply_coerces_and_nests() {
        let mut bindings = EnvBindings::new();
        bindings.bind::<Outer>().unwrap();

        let mut tree = Map::new();
        tree.insert("debug".into(), Value::Bool(false));
        let env = lookup(&[
            ("DEBUG", "true"),
            ("SCRAPE_RETRIES", "7"),
            ("SCRAPE_TIMEOUT", "10s"),
            ("PERCENTILES", "50, 99.9"),
        ]);

        assert_eq!(bindings.apply(&mut tree, &env), 4);
        assert_eq!(tree["debug"], Value::Bool(true));
        assert_eq!(tree["scrape"]["retries"], Value::from(7));
        assert_eq!(tree["scrape"]["timeout"], Value::from("10s"));
        assert_eq!(tree["percentiles"], serde_json::json!([50.0, 99.9]));
    }

    #[test]
    fn test_bare_integer_duration_matches_file_form() {
        let mut bindings = EnvBindings::new();
        bindings.bind::<Outer>().unwrap();

        let mut tree = Map::new();
        bindings.apply(&mut tree, &lookup(&[("SCRAPE_TIMEOUT", " 30 ")]));
        assert_eq!(tree["scrape"]["timeout"], Value::from(30u64));
    }

    #[test]
    fn test_empty_and_unparseable_values() {
        let mut bindings = EnvBindings::new();
        bindings.bind::<Outer>().unwrap();

        let mut tree = Map::new();
        let env = lookup(&[("DEBUG", ""), ("SCRAPE_RETRIES", "many")]);

        assert_eq!(bindings.apply(&mut tree, &env), 1);
        assert!(!tree.contains_key("debug"));
        assert_eq!(tree["scrape"]["retries"], Value::from("many"));
    }

    #[test]
    fn test_var_name_convention() {
        assert_eq!(env_var_name(&["license_key"]), "LICENSE_KEY");
        assert_eq!(
            env_var_name(&["telemetry_emitter", "delta_expiration_age"]),
            "TELEMETRY_EMITTER_DELTA_EXPIRATION_AGE"
        );
    }
}
