//! Configurable types, type-erased class handles and the class registry

use super::node::{BuildOptions, Lazy};
use super::signature::{Bindings, Param};
use super::mode::Resolution;
use crate::error::{Error, Result};
use crate::value::{FromValue, Value};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{OnceLock, PoisonError, RwLock};
use tracing::debug;

/// A type that can be described by a lazy configuration
///
/// Implementors declare their constructor parameters statically and build
/// themselves from the bound keyword arguments.
pub trait Configurable: Any + Sized {
    /// Registry path written into the `_class` tag of serialized configs
    const PATH: &'static str;

    /// Constructor parameters in declaration order
    fn params() -> Vec<Param>;

    /// Build an instance from bound arguments
    fn construct(kwargs: Kwargs) -> Result<Self>;
}

fn construct_boxed<T: Configurable>(kwargs: Kwargs) -> Result<Box<dyn Any>> {
    T::construct(kwargs).map(|obj| Box::new(obj) as Box<dyn Any>)
}

/// Type-erased handle to a [`Configurable`] type
///
/// Two handles are equal when they carry the same registry path.
#[derive(Clone, Copy)]
pub struct ClassRef {
    path: &'static str,
    type_id: fn() -> TypeId,
    type_name: fn() -> &'static str,
    params: fn() -> Vec<Param>,
    construct: fn(Kwargs) -> Result<Box<dyn Any>>,
}

impl ClassRef {
    pub fn of<T: Configurable>() -> Self {
        Self {
            path: T::PATH,
            type_id: TypeId::of::<T>,
            type_name: std::any::type_name::<T>,
            params: T::params,
            construct: construct_boxed::<T>,
        }
    }

    /// Registry path, e.g. `lazyconf::demo::Linear`
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Last path segment, e.g. `Linear`
    pub fn name(&self) -> &'static str {
        self.path.rsplit("::").next().unwrap_or(self.path)
    }

    /// Rust type name of the constructed object
    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    pub fn params(&self) -> Vec<Param> {
        (self.params)()
    }

    pub fn is<T: Configurable>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    pub(crate) fn construct(&self, kwargs: Kwargs) -> Result<Box<dyn Any>> {
        (self.construct)(kwargs)
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassRef({})", self.path)
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

fn registry() -> &'static RwLock<HashMap<&'static str, ClassRef>> {
    static REGISTRY: OnceLock<RwLock<HashMap<&'static str, ClassRef>>> = OnceLock::new();
    REGISTRY.get_or_init(Default::default)
}

/// Register `T` under its path so serialized configs can name it
pub fn register<T: Configurable>() -> ClassRef {
    register_class(ClassRef::of::<T>())
}

/// Register an already type-erased class handle
pub fn register_class(class: ClassRef) -> ClassRef {
    let mut classes = registry().write().unwrap_or_else(PoisonError::into_inner);
    if classes.insert(class.path, class).is_none() {
        debug!(path = class.path, "registered configurable class");
    }
    class
}

/// Resolve a registry path back to its class
pub fn import_class(path: &str) -> Result<ClassRef> {
    let classes = registry().read().unwrap_or_else(PoisonError::into_inner);
    classes
        .get(path)
        .copied()
        .ok_or_else(|| Error::Import(path.to_string()))
}

/// A constructor argument
pub enum Arg {
    /// A configuration value
    Value(Value),
    /// A runtime object supplied at construction time
    Object(Box<dyn Any>),
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Arg::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Keyword arguments handed to [`Configurable::construct`]
///
/// Also used to pass last-mile overrides to [`Lazy::to_eager_with`].
#[derive(Debug, Default)]
pub struct Kwargs {
    class: Option<ClassRef>,
    args: BTreeMap<String, Arg>,
}

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn for_class(class: ClassRef) -> Self {
        Self {
            class: Some(class),
            args: BTreeMap::new(),
        }
    }

    /// Add a configuration value
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), Arg::Value(value.into()));
        self
    }

    /// Add a runtime object
    pub fn object<T: Any>(mut self, name: impl Into<String>, object: T) -> Self {
        self.args.insert(name.into(), Arg::Object(Box::new(object)));
        self
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, arg: Arg) {
        self.args.insert(name.into(), arg);
    }

    pub(crate) fn merge(&mut self, overrides: Kwargs) {
        self.args.extend(overrides.args);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.args.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.args.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    fn class_name(&self) -> String {
        self.class
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| "<unbound>".to_string())
    }

    /// Remove and convert a value argument, if present
    pub fn take<T: FromValue>(&mut self, name: &str) -> Result<Option<T>> {
        match self.args.remove(name) {
            None => Ok(None),
            Some(Arg::Value(value)) => T::from_value(value).map(Some).map_err(|value| {
                Error::SchemaViolation {
                    field: format!("{}.{name}", self.class_name()),
                    expected: T::expected(),
                    actual: value.type_name(),
                }
            }),
            Some(Arg::Object(_)) => Err(Error::SchemaViolation {
                field: format!("{}.{name}", self.class_name()),
                expected: T::expected(),
                actual: "object".to_string(),
            }),
        }
    }

    /// Remove and convert a value argument that must be present
    pub fn require<T: FromValue>(&mut self, name: &str) -> Result<T> {
        self.take(name)?.ok_or_else(|| Error::MissingArgument {
            class: self.class_name(),
            name: name.to_string(),
        })
    }

    pub fn take_or<T: FromValue>(&mut self, name: &str, default: T) -> Result<T> {
        Ok(self.take(name)?.unwrap_or(default))
    }

    /// Remove a runtime object argument that must be present
    pub fn take_object<T: Any>(&mut self, name: &str) -> Result<T> {
        match self.args.remove(name) {
            Some(Arg::Object(object)) => {
                object
                    .downcast::<T>()
                    .map(|b| *b)
                    .map_err(|_| Error::TypeMismatch {
                        class: self.class_name(),
                        expected: std::any::type_name::<T>().to_string(),
                        actual: format!("another object for '{name}'"),
                    })
            }
            Some(Arg::Value(value)) => Err(Error::TypeMismatch {
                class: self.class_name(),
                expected: std::any::type_name::<T>().to_string(),
                actual: value.type_name(),
            }),
            None => Err(Error::MissingArgument {
                class: self.class_name(),
                name: name.to_string(),
            }),
        }
    }

    /// Configuration these arguments describe
    ///
    /// Runtime objects and values of non-configurable types are left out,
    /// so the snapshot only holds what can be written back to a dict.
    pub fn snapshot(&self) -> Result<Lazy> {
        let class = self.class.ok_or_else(|| {
            Error::Construction("cannot snapshot arguments without a target class".to_string())
        })?;
        let bindings = self
            .args
            .iter()
            .fold(Bindings::new(), |bindings, (name, arg)| match arg {
                Arg::Value(value) => bindings.kwarg(name.clone(), value.clone()),
                Arg::Object(_) => bindings,
            });
        Lazy::from_class_ref(
            class,
            bindings,
            BuildOptions::default().with_skip_non_parsable(true),
            Resolution::Eager,
        )
    }
}
