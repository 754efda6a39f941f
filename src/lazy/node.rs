//! The lazy configuration node

use super::choice::Choice;
use super::class::{import_class, register, register_class, Arg, ClassRef, Configurable, Kwargs};
use super::dict::{flatten_dict, is_flat, unflatten_dict, ConfigDict, DictOptions, Entry, TYPE_TAG};
use super::mode::{resolution, Resolution};
use super::signature::{get_signature, Bindings, BoundParam};
use crate::error::{Error, Result};
use crate::path::FieldPath;
use crate::typecheck::{is_parsable_type, is_subnode_type, value_matches, TypeExpr};
use crate::value::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// A resolved field: declared type and value (`None` when missing)
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub annotation: TypeExpr,
    pub value: Option<Value>,
}

pub type Fields = BTreeMap<String, Field>;

/// How fields that cannot live on the configuration surface are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Drop unannotated or non-configurable fields even when they hold a value
    pub skip_non_parsable: bool,
    /// Reject non-configurable fields instead of silently excluding them
    pub strict: bool,
}

impl BuildOptions {
    pub fn with_skip_non_parsable(mut self, skip: bool) -> Self {
        self.skip_non_parsable = skip;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

struct Inner {
    bindings: Bindings,
    options: BuildOptions,
    fields: OnceLock<Result<Fields>>,
}

/// A deferred object: target class plus typed constructor values
///
/// Cloning is cheap and shares the resolved fields. Nodes are never
/// modified; [`copy_with`](Lazy::copy_with) and [`update`](Lazy::update)
/// return new nodes.
#[derive(Clone)]
pub struct Lazy {
    class: ClassRef,
    inner: Arc<Inner>,
}

impl Lazy {
    /// Node for `T` with all declared defaults
    ///
    /// In deferred mode any error surfaces on first access.
    pub fn of<T: Configurable>() -> Self {
        Self::build(
            register::<T>(),
            Bindings::new(),
            BuildOptions::default(),
            resolution(),
        )
    }

    /// Node for `T` with `bindings` applied over the declared defaults
    pub fn from_class<T: Configurable>(bindings: Bindings) -> Result<Self> {
        Self::from_class_with::<T>(bindings, resolution())
    }

    /// Like [`from_class`](Lazy::from_class) with an explicit resolution mode
    pub fn from_class_with<T: Configurable>(bindings: Bindings, mode: Resolution) -> Result<Self> {
        Self::from_class_ref(register::<T>(), bindings, BuildOptions::default(), mode)
    }

    pub fn from_class_ref(
        class: ClassRef,
        bindings: Bindings,
        options: BuildOptions,
        mode: Resolution,
    ) -> Result<Self> {
        let lazy = Self::build(register_class(class), bindings, options, mode);
        if mode == Resolution::Eager {
            lazy.fields()?;
        }
        Ok(lazy)
    }

    fn build(class: ClassRef, bindings: Bindings, options: BuildOptions, mode: Resolution) -> Self {
        let lazy = Self {
            class,
            inner: Arc::new(Inner {
                bindings,
                options,
                fields: OnceLock::new(),
            }),
        };
        if mode == Resolution::Eager {
            // the outcome is cached; errors are reported by the caller or on access
            let _ = lazy.fields();
        }
        lazy
    }

    pub fn class(&self) -> ClassRef {
        self.class
    }

    pub fn bindings(&self) -> &Bindings {
        &self.inner.bindings
    }

    /// Whether the signature has been resolved
    pub fn is_resolved(&self) -> bool {
        self.inner.fields.get().is_some()
    }

    /// Resolved fields, resolving on first access
    pub fn fields(&self) -> Result<&Fields> {
        self.inner
            .fields
            .get_or_init(|| {
                debug!(class = self.class.path(), "resolving signature");
                resolve_fields(self.class, &self.inner.bindings, self.inner.options)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Value of field `name`, `None` when missing
    pub fn get(&self, name: &str) -> Result<Option<&Value>> {
        self.fields()?
            .get(name)
            .map(|field| field.value.as_ref())
            .ok_or_else(|| {
                Error::StructuralMismatch(format!("{} has no field '{name}'", self.class.name()))
            })
    }

    /// Selected alternative of choice field `name`
    pub fn choice(&self, name: &str) -> Result<Choice> {
        let field = self.fields()?.get(name).ok_or_else(|| {
            Error::StructuralMismatch(format!("{} has no field '{name}'", self.class.name()))
        })?;
        match (&field.annotation, &field.value) {
            (TypeExpr::Choice(choice), Some(Value::Lazy(variant))) => {
                choice.resolve()?.choose(variant)
            }
            _ => Err(Error::StructuralMismatch(format!(
                "{}.{name} is not a choice",
                self.class.name()
            ))),
        }
    }

    /// Dict form of this node
    pub fn to_dict(&self, options: DictOptions) -> Result<ConfigDict> {
        let nested_options = options.with_flatten(false);
        let mut dict = ConfigDict::new();
        if options.with_class_tag {
            dict.insert(
                TYPE_TAG.to_string(),
                Entry::Class(self.class.path().to_string()),
            );
        }
        for (name, field) in self.fields()? {
            let entry = match &field.value {
                Some(Value::Lazy(sub)) if is_subnode_type(&field.annotation) => {
                    if options.recursive {
                        Entry::Dict(sub.to_dict(nested_options)?)
                    } else {
                        Entry::Value(Value::Lazy(sub.clone()))
                    }
                }
                value if options.with_annotations => {
                    Entry::Annotated(field.annotation.clone(), value.clone())
                }
                Some(value) => Entry::Value(value.clone()),
                None => continue,
            };
            dict.insert(name.clone(), entry);
        }
        if options.flatten {
            dict = flatten_dict(&dict);
        }
        Ok(dict)
    }

    /// Rebuild a node from its class-tagged dict form, flat or nested
    ///
    /// Sub-dicts without a tag fall back to the class the parent declares
    /// for that field.
    pub fn from_dict(dict: &ConfigDict) -> Result<Self> {
        if is_flat(dict) {
            Self::from_nested(&unflatten_dict(dict), None)
        } else {
            Self::from_nested(dict, None)
        }
    }

    fn from_nested(dict: &ConfigDict, fallback: Option<ClassRef>) -> Result<Self> {
        let class = match dict.get(TYPE_TAG) {
            Some(Entry::Class(path)) | Some(Entry::Value(Value::Str(path))) => match fallback {
                Some(declared) if declared.path() == path => declared,
                _ => import_class(path)?,
            },
            Some(other) => {
                return Err(Error::StructuralMismatch(format!(
                    "invalid class tag {other:?}"
                )))
            }
            None => fallback.ok_or_else(|| {
                Error::StructuralMismatch(format!("missing '{TYPE_TAG}' tag"))
            })?,
        };

        let params = class.params();
        let mut bindings = Bindings::new();
        for (name, entry) in dict {
            if name == TYPE_TAG {
                continue;
            }
            let value = match entry {
                Entry::Value(value) => value.clone(),
                Entry::Annotated(_, Some(value)) => value.clone(),
                Entry::Annotated(_, None) => continue,
                Entry::Dict(sub) => {
                    let declared = params
                        .iter()
                        .find(|p| p.name == name.as_str())
                        .and_then(|p| declared_class(&p.annotation, p.default.as_ref()))
                        .map(register_class);
                    Value::Lazy(Self::from_nested(sub, declared)?)
                }
                Entry::Class(path) => {
                    return Err(Error::StructuralMismatch(format!(
                        "class tag '{path}' given for field '{name}'"
                    )))
                }
            };
            bindings = bindings.kwarg(name.clone(), value);
        }

        Self::from_class_ref(class, bindings, BuildOptions::default(), Resolution::Eager)
    }

    /// Structurally identical new node
    pub fn copy(&self) -> Result<Self> {
        Self::from_dict(&self.to_dict(DictOptions::tagged().with_flatten(true))?)
    }

    /// New node with the values at the given dotted paths replaced
    ///
    /// Every path must name a configurable field of this node (including
    /// fields whose value is missing); class tags cannot be changed.
    pub fn copy_with<I, K, V>(&self, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let tagged = DictOptions::tagged().with_flatten(true);
        let mut flat = self.to_dict(tagged)?;
        let known = self.to_dict(tagged.with_annotations(true))?;

        for (path, value) in fields {
            let path = FieldPath::parse(path.as_ref())?;
            if path.contains(TYPE_TAG) {
                return Err(Error::StructuralMismatch(format!(
                    "cannot change class via '{path}'"
                )));
            }
            let key = path.join();
            if !known.contains_key(&key) {
                return Err(Error::StructuralMismatch(format!(
                    "attempted to copy with '{key}' that is not present in {}",
                    self.class.name()
                )));
            }
            flat.insert(key, Entry::Value(value.into()));
        }

        Self::from_dict(&flat)
    }

    /// New node with a partial, possibly nested, dict merged in
    pub fn update(&self, dict: &ConfigDict) -> Result<Self> {
        let mut changes = Vec::new();
        for (key, entry) in flatten_dict(dict) {
            let value = match entry {
                Entry::Value(value) | Entry::Annotated(_, Some(value)) => value,
                Entry::Annotated(_, None) => continue,
                Entry::Class(path) => Value::Str(path),
                Entry::Dict(_) => unreachable!("flattened dicts hold no nested dicts"),
            };
            changes.push((key, value));
        }
        self.copy_with(changes)
    }

    /// Construct the target object
    pub fn to_eager<T: Any>(&self) -> Result<T> {
        self.to_eager_with(Kwargs::new())
    }

    /// Construct the target object, `overrides` taking precedence
    ///
    /// Sub-nodes are handed to the constructor as lazy values; missing
    /// fields are left out so the constructor decides how to handle them.
    pub fn to_eager_with<T: Any>(&self, overrides: Kwargs) -> Result<T> {
        self.to_eager_any(overrides)?
            .downcast::<T>()
            .map(|obj| *obj)
            .map_err(|_| Error::TypeMismatch {
                class: self.class.path().to_string(),
                expected: std::any::type_name::<T>().to_string(),
                actual: self.class.type_name().to_string(),
            })
    }

    /// Construct the target object without knowing its type
    pub fn to_eager_any(&self, overrides: Kwargs) -> Result<Box<dyn Any>> {
        let params = self.class.params();
        if let Some(unknown) = overrides
            .names()
            .find(|name| !params.iter().any(|p| p.name == *name))
        {
            return Err(Error::Binding {
                class: self.class.name().to_string(),
                reason: format!("unexpected keyword argument '{unknown}'"),
            });
        }

        let mut kwargs = Kwargs::for_class(self.class);
        for (name, field) in self.fields()? {
            if let Some(value) = &field.value {
                kwargs.insert(name.clone(), Arg::Value(value.clone()));
            }
        }
        kwargs.merge(overrides);

        debug!(class = self.class.path(), "constructing");
        self.class.construct(kwargs)
    }

    /// Fully flattened, annotated and tagged form used for equality
    fn fingerprint(&self) -> Result<ConfigDict> {
        self.to_dict(
            DictOptions::tagged()
                .with_annotations(true)
                .with_flatten(true),
        )
    }
}

/// Class a sub-dict without a tag stands for
fn declared_class(annotation: &TypeExpr, default: Option<&Value>) -> Option<ClassRef> {
    match (annotation, default) {
        (TypeExpr::Lazy(Some(class)), _) => Some(*class),
        // resolving the set registers every alternative
        (TypeExpr::Choice(choice), default) => {
            let set = choice.resolve().ok()?;
            match default {
                Some(Value::Lazy(lazy)) => Some(lazy.class()),
                _ => Some(set.default_variant().class()),
            }
        }
        (_, Some(Value::Lazy(lazy))) => Some(lazy.class()),
        _ => None,
    }
}

fn resolve_fields(class: ClassRef, bindings: &Bindings, options: BuildOptions) -> Result<Fields> {
    let mut fields = Fields::new();
    for BoundParam {
        name,
        annotation,
        value,
    } in get_signature(class, bindings)?
    {
        let field_name = || format!("{}.{name}", class.name());
        match annotation {
            TypeExpr::Lazy(declared) => {
                let value = match (value, declared) {
                    (None, Some(sub)) => Lazy::from_class_ref(
                        sub,
                        Bindings::new(),
                        BuildOptions::default(),
                        resolution(),
                    )?,
                    (Some(Value::Lazy(lazy)), declared)
                        if declared.map_or(true, |sub| sub == lazy.class()) =>
                    {
                        lazy
                    }
                    (value, declared) => {
                        return Err(Error::SchemaViolation {
                            field: field_name(),
                            expected: TypeExpr::Lazy(declared).to_string(),
                            actual: value.map_or("missing".to_string(), |v| v.type_name()),
                        })
                    }
                };
                fields.insert(
                    name,
                    Field {
                        annotation: TypeExpr::Lazy(declared),
                        value: Some(Value::Lazy(value)),
                    },
                );
            }
            TypeExpr::Choice(choice) => {
                let set = choice.resolve()?;
                let variant = match value {
                    None => set.default_variant().clone(),
                    Some(Value::Lazy(lazy)) if set.tag_of(&lazy).is_some() => lazy,
                    Some(Value::Str(tag)) if set.get(&tag).is_some() => set.select(&tag)?,
                    Some(other) => {
                        let given = match &other {
                            Value::Lazy(lazy) => lazy.class().name().to_string(),
                            other => other.to_string(),
                        };
                        return Err(Error::InvalidChoice {
                            field: field_name(),
                            given,
                            choices: set.names(),
                        });
                    }
                };
                fields.insert(
                    name,
                    Field {
                        annotation: TypeExpr::Choice(choice),
                        value: Some(Value::Lazy(variant)),
                    },
                );
            }
            ty if is_parsable_type(&ty) => {
                if let Some(v) = &value {
                    if !value_matches(v, &ty) {
                        return Err(Error::SchemaViolation {
                            field: field_name(),
                            expected: ty.to_string(),
                            actual: v.type_name(),
                        });
                    }
                }
                fields.insert(
                    name,
                    Field {
                        annotation: ty,
                        value,
                    },
                );
            }
            ty => match value {
                Some(_) if options.skip_non_parsable => {
                    debug!(field = %field_name(), "skipping non-configurable value");
                }
                None if !options.strict => {
                    debug!(field = %field_name(), ty = %ty, "excluding non-configurable field");
                }
                _ => {
                    return Err(Error::UnsupportedType {
                        field: field_name(),
                        ty: ty.to_string(),
                    })
                }
            },
        }
    }
    Ok(fields)
}

impl PartialEq for Lazy {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        match (self.fingerprint(), other.fingerprint()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Lazy {}

impl Hash for Lazy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.fingerprint() {
            Ok(fingerprint) => fingerprint.hash(state),
            Err(_) => self.class.path().hash(state),
        }
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("class", &self.class.path())
            .field("fields", &self.inner.fields.get())
            .finish()
    }
}

fn write_node(lazy: &Lazy, level: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    const INDENT: &str = "    ";
    let fields = match lazy.fields() {
        Ok(fields) => fields,
        Err(err) => return write!(f, "{}(<{err}>)", lazy.class.name()),
    };

    write!(f, "{}(", lazy.class.name())?;
    let mut any = false;
    for (name, field) in fields {
        let Some(value) = &field.value else { continue };
        any = true;
        write!(f, "\n{}{name}=", INDENT.repeat(level))?;
        match value {
            Value::Lazy(sub) => write_node(sub, level + 1, f)?,
            Value::Str(s) => write!(f, "'{s}'")?,
            other => write!(f, "{other}")?,
        }
        write!(f, ",")?;
    }
    if any {
        write!(f, "\n{}", INDENT.repeat(level - 1))?;
    }
    write!(f, ")")
}

impl fmt::Display for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(self, 1, f)
    }
}
