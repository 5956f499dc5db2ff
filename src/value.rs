//! Semantic value model
//!
//! The decoded form of a configuration document. A decoder turns source text
//! into a [`Value`] tree; everything downstream pattern-matches on it:
//! - **Scalar**: strings, numbers, booleans and null
//! - **Sequence**: ordered list of values
//! - **Mapping**: ordered key → value pairs, keys unique
//! - **Entity**: a head scalar plus attributes, the compact `Head(args)` form

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// Ordered mapping used by [`Value::Mapping`] and entity attributes
pub type Mapping = IndexMap<Key, Value>;

// =============================================================================
// KEYS AND SCALARS
// =============================================================================

/// Mapping key: a name or a positional index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

/// Terminal value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Human-readable type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "boolean",
            Scalar::Int(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// ENTITY
// =============================================================================

/// Inline call-like node: `Head(attr, attr, key: attr)`
///
/// Positional attributes are stored under [`Key::Index`] keys in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub head: Scalar,
    pub attributes: Mapping,
}

impl Entity {
    pub fn new(head: impl Into<String>, attributes: Mapping) -> Self {
        Self {
            head: Scalar::String(head.into()),
            attributes,
        }
    }

    /// Entity whose attributes are all positional
    pub fn positional(head: impl Into<String>, attributes: Vec<Value>) -> Self {
        Self::new(head, list_to_mapping(attributes))
    }

    pub fn head_str(&self) -> Option<&str> {
        self.head.as_str()
    }

    /// Attributes as a value: a sequence when purely positional, else a mapping
    pub fn attributes_value(&self) -> Value {
        Value::from_mapping(self.attributes.clone())
    }
}

// =============================================================================
// VALUE
// =============================================================================

/// A decoded configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(Mapping),
    Entity(Entity),
}

impl Value {
    pub fn null() -> Self {
        Value::Scalar(Scalar::Null)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(s.into()))
    }

    pub fn bool(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }

    pub fn int(i: i64) -> Self {
        Value::Scalar(Scalar::Int(i))
    }

    /// Build a mapping from `(key, value)` pairs, keeping their order
    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Mapping(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn entity(head: impl Into<String>, attributes: Vec<Value>) -> Self {
        Value::Entity(Entity::positional(head, attributes))
    }

    /// Collapse a purely positional mapping (keys `0..n` in order) into a sequence
    pub fn from_mapping(mapping: Mapping) -> Self {
        if is_list(&mapping) {
            Value::Sequence(mapping.into_values().collect())
        } else {
            Value::Mapping(mapping)
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::Null))
    }

    /// Look up a named key in a mapping value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping()
            .and_then(|m| m.get(&Key::Name(key.to_string())))
    }

    /// Human-readable type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(s) => s.type_name(),
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Entity(_) => "entity",
        }
    }

    /// Elements of a list-like value in order
    ///
    /// Sequences and purely positional mappings qualify; anything else yields `None`.
    pub fn into_list(self) -> Option<Vec<Value>> {
        match self {
            Value::Sequence(items) => Some(items),
            Value::Mapping(m) if is_list(&m) => Some(m.into_values().collect()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

/// True when the keys are exactly `0, 1, .., n-1` in insertion order
pub fn is_list(mapping: &Mapping) -> bool {
    mapping
        .keys()
        .enumerate()
        .all(|(i, k)| matches!(k, Key::Index(j) if *j == i))
}

pub fn list_to_mapping(items: Vec<Value>) -> Mapping {
    items
        .into_iter()
        .enumerate()
        .map(|(i, v)| (Key::Index(i), v))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
