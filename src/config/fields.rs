//! Declarative description of the configuration schema.
//!
//! Every schema record implements [`Schema`] and lists its fields with their
//! canonical names. The environment binder walks this description instead of
//! inspecting types at runtime, so the names used for file keys and for
//! environment variables come from one place.

/// The shape of a leaf value, used to coerce raw environment strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Integer,
    Float,
    Text,
    /// Go-style duration string (`"5s"`, `"1m30s"`) or integer seconds.
    Duration,
    /// Comma-separated list of strings.
    TextList,
    /// Comma-separated list of numbers.
    FloatList,
    /// Arbitrary YAML (lists of records and the like).
    Structured,
}

/// What a field contains.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Leaf(ValueKind),
    /// Nested record. Resolved lazily so that schema definitions may refer to
    /// each other; the binder rejects cycles.
    Record(fn() -> Record),
}

/// One field of a record.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Canonical external name. `None` hides the field from the file and
    /// environment sources.
    pub name: Option<&'static str>,
    pub kind: FieldKind,
}

impl Field {
    pub const fn leaf(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name: Some(name),
            kind: FieldKind::Leaf(kind),
        }
    }

    pub fn record<S: Schema>(name: &'static str) -> Self {
        Self {
            name: Some(name),
            kind: FieldKind::Record(S::record),
        }
    }

    /// A field without a canonical name, set only programmatically.
    pub const fn unnamed(kind: ValueKind) -> Self {
        Self {
            name: None,
            kind: FieldKind::Leaf(kind),
        }
    }
}

/// A schema node: a type name plus its fields in declaration order.
#[derive(Debug, Clone)]
pub struct Record {
    pub type_name: &'static str,
    pub fields: Vec<Field>,
}

/// Implemented by every configuration record.
pub trait Schema {
    fn record() -> Record;
}
