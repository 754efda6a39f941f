//! Dict form of a configuration
//!
//! Nested form: `{"_class": "<path>", "field": value, "sub": {...}}`.
//! Flat form: the same entries with nested keys joined by `.`.

use crate::error::{Error, Result};
use crate::path::SEPARATOR;
use crate::typecheck::TypeExpr;
use crate::value::Value;
use std::collections::BTreeMap;

/// Reserved key holding a node's class path
pub const TYPE_TAG: &str = "_class";

pub type ConfigDict = BTreeMap<String, Entry>;

/// One entry of a [`ConfigDict`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entry {
    Value(Value),
    /// Declared type and value (`None` when missing)
    Annotated(TypeExpr, Option<Value>),
    /// Class tag
    Class(String),
    Dict(ConfigDict),
}

impl Entry {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Entry::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&ConfigDict> {
        match self {
            Entry::Dict(dict) => Some(dict),
            _ => None,
        }
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Entry::Value(value)
    }
}

impl From<ConfigDict> for Entry {
    fn from(dict: ConfigDict) -> Self {
        Entry::Dict(dict)
    }
}

/// How [`Lazy::to_dict`](super::Lazy::to_dict) renders a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictOptions {
    /// Convert sub-nodes to dicts; otherwise they stay lazy values
    pub recursive: bool,
    pub with_annotations: bool,
    pub with_class_tag: bool,
    pub flatten: bool,
}

impl Default for DictOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            with_annotations: false,
            with_class_tag: false,
            flatten: false,
        }
    }
}

impl DictOptions {
    /// Nested, class-tagged form used for serialization
    pub fn tagged() -> Self {
        Self::default().with_class_tag(true)
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_annotations(mut self, with_annotations: bool) -> Self {
        self.with_annotations = with_annotations;
        self
    }

    pub fn with_class_tag(mut self, with_class_tag: bool) -> Self {
        self.with_class_tag = with_class_tag;
        self
    }

    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }
}

/// Join nested keys with the path separator
pub fn flatten_dict(dict: &ConfigDict) -> ConfigDict {
    fn walk(dict: &ConfigDict, prefix: &str, out: &mut ConfigDict) {
        for (key, entry) in dict {
            let key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}{SEPARATOR}{key}")
            };
            match entry {
                Entry::Dict(inner) => walk(inner, &key, out),
                other => {
                    out.insert(key, other.clone());
                }
            }
        }
    }

    let mut out = ConfigDict::new();
    walk(dict, "", &mut out);
    out
}

/// Split separator-joined keys back into nested dicts
///
/// A non-dict entry sitting where a nested dict is needed is replaced by
/// that dict.
pub fn unflatten_dict(flat: &ConfigDict) -> ConfigDict {
    let mut base = ConfigDict::new();
    for (key, entry) in flat {
        let mut parts: Vec<&str> = key.split(SEPARATOR).collect();
        let leaf = parts.pop().unwrap_or_default();

        let mut root = &mut base;
        for part in parts {
            let slot = root
                .entry(part.to_string())
                .or_insert_with(|| Entry::Dict(ConfigDict::new()));
            if !matches!(slot, Entry::Dict(_)) {
                *slot = Entry::Dict(ConfigDict::new());
            }
            root = match slot {
                Entry::Dict(inner) => inner,
                _ => unreachable!("slot was just made a dict"),
            };
        }

        if matches!(root.get(leaf), Some(Entry::Dict(_))) && !matches!(entry, Entry::Dict(_)) {
            continue;
        }
        root.insert(leaf.to_string(), entry.clone());
    }
    base
}

/// Whether any key of `dict` is separator-joined
pub(crate) fn is_flat(dict: &ConfigDict) -> bool {
    dict.keys().any(|k| k.contains(SEPARATOR))
}

fn value_to_json(value: &Value) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .ok_or_else(|| Error::Serialization(format!("{x} cannot be represented")))?,
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Tuple(items) => serde_json::Value::Array(
            items.iter().map(value_to_json).collect::<Result<_>>()?,
        ),
        Value::Lazy(lazy) => to_json(&lazy.to_dict(DictOptions::tagged())?)?,
    })
}

/// Convert to a JSON object
pub fn to_json(dict: &ConfigDict) -> Result<serde_json::Value> {
    let mut object = serde_json::Map::new();
    for (key, entry) in dict {
        let json = match entry {
            Entry::Value(value) => value_to_json(value)?,
            Entry::Class(path) => serde_json::Value::String(path.clone()),
            Entry::Dict(inner) => to_json(inner)?,
            Entry::Annotated(..) => {
                return Err(Error::Serialization(format!(
                    "annotated entry '{key}' cannot be serialized"
                )))
            }
        };
        object.insert(key.clone(), json);
    }
    Ok(serde_json::Value::Object(object))
}

fn value_from_json(key: &str, json: serde_json::Value) -> Result<Value> {
    match json {
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| Error::Serialization(format!("'{key}': unsupported number {n}"))),
        },
        serde_json::Value::String(s) => Ok(Value::Str(s)),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| value_from_json(key, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Tuple),
        other => Err(Error::Serialization(format!(
            "'{key}': unsupported value {other}"
        ))),
    }
}

/// Convert from a JSON object; `null` entries are dropped
pub fn from_json(json: serde_json::Value) -> Result<ConfigDict> {
    let serde_json::Value::Object(object) = json else {
        return Err(Error::Serialization(
            "configuration must be a mapping".to_string(),
        ));
    };
    let mut dict = ConfigDict::new();
    for (key, json) in object {
        let entry = match json {
            serde_json::Value::Null => continue,
            serde_json::Value::String(path) if key == TYPE_TAG => Entry::Class(path),
            nested @ serde_json::Value::Object(_) => Entry::Dict(from_json(nested)?),
            other => Entry::Value(value_from_json(&key, other)?),
        };
        dict.insert(key, entry);
    }
    Ok(dict)
}
