//! Configuration values
//!
//! A [`Value`] is what a configurable field holds: a primitive, a tuple of
//! primitives (possibly nested one level), or another lazy node. An absent
//! value is `None` at the field level, never a variant here.

use crate::lazy::Lazy;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single configuration value
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
    Lazy(Lazy),
}

impl Value {
    /// Build a tuple value from anything convertible into values
    pub fn tuple<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Short name of the runtime type, used in error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Tuple(items) => {
                let inner: Vec<String> = items.iter().map(Value::type_name).collect();
                format!("tuple[{}]", inner.join(", "))
            }
            Value::Lazy(lazy) => format!("Lazy[{}]", lazy.class().name()),
        }
    }

    pub fn as_lazy(&self) -> Option<&Lazy> {
        match self {
            Value::Lazy(lazy) => Some(lazy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Render a value the way it is typed on a command line
    pub(crate) fn to_cli_tokens(&self) -> Vec<String> {
        match self {
            Value::Tuple(items) => items.iter().map(|v| v.to_string()).collect(),
            other => vec![other.to_string()],
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Lazy(a), Value::Lazy(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Tuple(items) => items.hash(state),
            Value::Lazy(lazy) => lazy.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            // Debug keeps the trailing `.0` so floats stay floats when re-read
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Lazy(lazy) => write!(f, "{lazy}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Lazy> for Value {
    fn from(v: Lazy) -> Self {
        Value::Lazy(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Tuple(v)
    }
}

/// Extraction of a typed Rust value out of a [`Value`]
///
/// On mismatch the original value is handed back so the caller can report it.
pub trait FromValue: Sized {
    /// Name of the expected configuration type
    fn expected() -> String;

    fn from_value(value: Value) -> Result<Self, Value>;
}

impl FromValue for Value {
    fn expected() -> String {
        "any".to_string()
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn expected() -> String {
        "bool".to_string()
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl FromValue for i64 {
    fn expected() -> String {
        "int".to_string()
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(other),
        }
    }
}

impl FromValue for usize {
    fn expected() -> String {
        "int (non-negative)".to_string()
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int(i) => usize::try_from(i).map_err(|_| Value::Int(i)),
            other => Err(other),
        }
    }
}

impl FromValue for f64 {
    fn expected() -> String {
        "float".to_string()
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float(x) => Ok(x),
            other => Err(other),
        }
    }
}

impl FromValue for f32 {
    fn expected() -> String {
        "float".to_string()
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float(x) => Ok(x as f32),
            other => Err(other),
        }
    }
}

impl FromValue for String {
    fn expected() -> String {
        "str".to_string()
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl FromValue for Lazy {
    fn expected() -> String {
        "Lazy".to_string()
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Lazy(lazy) => Ok(lazy),
            other => Err(other),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn expected() -> String {
        format!("tuple[{}, ...]", T::expected())
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        let Value::Tuple(items) = value else {
            return Err(value);
        };
        // Validate before consuming so the whole tuple can be handed back
        let snapshot = items.clone();
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match T::from_value(item) {
                Ok(v) => out.push(v),
                Err(_) => return Err(Value::Tuple(snapshot)),
            }
        }
        Ok(out)
    }
}

impl<A: FromValue, B: FromValue> FromValue for (A, B) {
    fn expected() -> String {
        format!("tuple[{}, {}]", A::expected(), B::expected())
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Tuple(items) if items.len() == 2 => {
                let snapshot = Value::Tuple(items.clone());
                let mut it = items.into_iter();
                match (it.next(), it.next()) {
                    (Some(a), Some(b)) => match (A::from_value(a), B::from_value(b)) {
                        (Ok(a), Ok(b)) => Ok((a, b)),
                        _ => Err(snapshot),
                    },
                    _ => Err(snapshot),
                }
            }
            other => Err(other),
        }
    }
}
