//! Parameter declarations and argument binding

use super::choice::Choices;
use super::class::{ClassRef, Configurable};
use super::dict::TYPE_TAG;
use crate::error::{Error, Result};
use crate::path::SEPARATOR;
use crate::typecheck::{is_parsable_type, value_matches, TypeExpr};
use crate::value::Value;
use std::collections::HashSet;

/// A declared constructor parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: &'static str,
    pub annotation: TypeExpr,
    pub default: Option<Value>,
}

impl Param {
    pub fn new(name: &'static str, annotation: TypeExpr) -> Self {
        Self {
            name,
            annotation,
            default: None,
        }
    }

    /// Parameter without a type annotation
    pub fn unannotated(name: &'static str) -> Self {
        Self::new(name, TypeExpr::Unannotated)
    }

    /// Sub-configuration of `T`, defaulting to `T`'s own defaults
    pub fn sub<T: Configurable>(name: &'static str) -> Self {
        Self::new(name, TypeExpr::lazy::<T>())
    }

    /// Choice over `C`, defaulting to its default alternative
    pub fn choice<C: Choices>(name: &'static str) -> Self {
        Self::new(name, TypeExpr::choice::<C>())
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Positional and keyword values bound to a constructor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &[(String, Value)] {
        &self.keyword
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

/// A parameter after binding: declared type plus value, `None` when missing
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub name: String,
    pub annotation: TypeExpr,
    pub value: Option<Value>,
}

fn binding_error(class: ClassRef, reason: String) -> Error {
    Error::Binding {
        class: class.name().to_string(),
        reason,
    }
}

fn check_param_names(class: ClassRef, params: &[Param]) -> Result<()> {
    let mut seen = HashSet::new();
    for param in params {
        if param.name.is_empty() || param.name.contains(SEPARATOR) || param.name == TYPE_TAG {
            return Err(binding_error(
                class,
                format!("invalid parameter name '{}'", param.name),
            ));
        }
        if !seen.insert(param.name) {
            return Err(binding_error(
                class,
                format!("duplicate parameter '{}'", param.name),
            ));
        }
    }
    Ok(())
}

/// Bind `bindings` against the parameters of `class`
///
/// Unbound parameters take their declared default, or stay missing. An
/// unannotated parameter holding a lazy node is typed as a sub-configuration.
/// Values bound to configurable primitive or tuple parameters must match
/// their annotation exactly.
pub fn get_signature(class: ClassRef, bindings: &Bindings) -> Result<Vec<BoundParam>> {
    let params = class.params();
    check_param_names(class, &params)?;

    if bindings.positional.len() > params.len() {
        return Err(binding_error(
            class,
            format!(
                "takes {} arguments but {} positional were given",
                params.len(),
                bindings.positional.len()
            ),
        ));
    }

    let mut bound: Vec<Option<Value>> = vec![None; params.len()];
    for (slot, value) in bound.iter_mut().zip(&bindings.positional) {
        *slot = Some(value.clone());
    }
    for (name, value) in &bindings.keyword {
        let index = params
            .iter()
            .position(|p| p.name == name.as_str())
            .ok_or_else(|| binding_error(class, format!("unexpected keyword argument '{name}'")))?;
        if bound[index].is_some() {
            return Err(binding_error(
                class,
                format!("multiple values for argument '{name}'"),
            ));
        }
        bound[index] = Some(value.clone());
    }

    params
        .into_iter()
        .zip(bound)
        .map(|(param, value)| {
            let value = value.or(param.default);
            let annotation = if param.annotation == TypeExpr::Unannotated
                && matches!(value, Some(Value::Lazy(_)))
            {
                TypeExpr::Lazy(None)
            } else {
                param.annotation
            };
            if let Some(value) = &value {
                if is_parsable_type(&annotation) && !value_matches(value, &annotation) {
                    return Err(Error::SchemaViolation {
                        field: format!("{}.{}", class.name(), param.name),
                        expected: annotation.to_string(),
                        actual: value.type_name(),
                    });
                }
            }
            Ok(BoundParam {
                name: param.name.to_string(),
                annotation,
                value,
            })
        })
        .collect()
}
