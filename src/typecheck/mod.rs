//! Type classification
//!
//! Decides which declared types can live on the configuration surface and
//! whether a runtime [`Value`] conforms to a declared [`TypeExpr`].
//!
//! Configurable shapes are deliberately few: `bool`, `int`, `float`, `str`,
//! homogeneous tuples of those (fixed arity or variadic), and tuples of such
//! tuples. Unions, untyped containers and anything deeper are rejected
//! rather than guessed at.

use crate::error::{Error, Result};
use crate::lazy::{ChoiceRef, ClassRef, Choices, Configurable};
use crate::value::Value;
use std::fmt;


/// A declared parameter type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Bool,
    Int,
    Float,
    Str,
    /// `tuple[T, T, ...]` with a fixed number of positions
    Tuple(Vec<TypeExpr>),
    /// `tuple[T, ...]`
    VarTuple(Box<TypeExpr>),
    /// `list[T]` - recognised only so it can be rejected
    List(Box<TypeExpr>),
    /// Un-parameterised `tuple`
    BareTuple,
    /// Un-parameterised `list`
    BareList,
    Union(Vec<TypeExpr>),
    /// A sub-configuration, optionally naming its target class
    Lazy(Option<ClassRef>),
    /// A closed set of named sub-configuration alternatives
    Choice(ChoiceRef),
    /// Any other runtime type (a dependency supplied at construction time)
    Opaque(&'static str),
    /// Parameter declared without an annotation
    Unannotated,
}

/// Number of positions a tuple type accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl TypeExpr {
    /// `tuple[inner, inner, ...]` repeated `n` times
    pub fn tuple_of(inner: TypeExpr, n: usize) -> Self {
        TypeExpr::Tuple(vec![inner; n])
    }

    /// `tuple[inner, ...]`
    pub fn var_tuple(inner: TypeExpr) -> Self {
        TypeExpr::VarTuple(Box::new(inner))
    }

    pub fn list(inner: TypeExpr) -> Self {
        TypeExpr::List(Box::new(inner))
    }

    /// Sub-configuration of class `T`
    pub fn lazy<T: Configurable>() -> Self {
        TypeExpr::Lazy(Some(ClassRef::of::<T>()))
    }

    /// Choice over the alternatives of `C`
    pub fn choice<C: Choices>() -> Self {
        TypeExpr::Choice(ChoiceRef::of::<C>())
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Bool => write!(f, "bool"),
            TypeExpr::Int => write!(f, "int"),
            TypeExpr::Float => write!(f, "float"),
            TypeExpr::Str => write!(f, "str"),
            TypeExpr::Tuple(items) => {
                let inner: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "tuple[{}]", inner.join(", "))
            }
            TypeExpr::VarTuple(inner) => write!(f, "tuple[{inner}, ...]"),
            TypeExpr::List(inner) => write!(f, "list[{inner}]"),
            TypeExpr::BareTuple => write!(f, "tuple"),
            TypeExpr::BareList => write!(f, "list"),
            TypeExpr::Union(items) => {
                let inner: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", inner.join(" | "))
            }
            TypeExpr::Lazy(Some(class)) => write!(f, "Lazy[{}]", class.name()),
            TypeExpr::Lazy(None) => write!(f, "Lazy"),
            TypeExpr::Choice(choice) => write!(f, "{}", choice.name()),
            TypeExpr::Opaque(name) => write!(f, "{name}"),
            TypeExpr::Unannotated => write!(f, "<unannotated>"),
        }
    }
}

/// Exactly `bool`, `int`, `float` or `str`
pub fn is_primitive_type(ty: &TypeExpr) -> bool {
    matches!(
        ty,
        TypeExpr::Bool | TypeExpr::Int | TypeExpr::Float | TypeExpr::Str
    )
}

pub fn is_bool_type(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Bool)
}

pub fn is_int_type(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Int)
}

pub fn is_float_type(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Float)
}

pub fn is_str_type(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Str)
}

/// Homogeneous tuple whose elements satisfy `element`
fn is_homogeneous_tuple(ty: &TypeExpr, element: fn(&TypeExpr) -> bool) -> bool {
    match ty {
        TypeExpr::Tuple(items) => match items.first() {
            Some(first) => element(first) && items.iter().all(|t| t == first),
            None => false,
        },
        TypeExpr::VarTuple(inner) => element(inner),
        _ => false,
    }
}

/// Tuple of primitives: `tuple[int]`, `tuple[int, int]`, `tuple[int, ...]`
///
/// Mixed element types, empty and bare tuples are rejected.
pub fn is_flat_tuple_type(ty: &TypeExpr) -> bool {
    is_homogeneous_tuple(ty, is_primitive_type)
}

/// Tuple of flat tuples: `tuple[tuple[int, int], ...]`
///
/// Containers nest at most two levels deep.
pub fn is_nested_tuple_type(ty: &TypeExpr) -> bool {
    is_homogeneous_tuple(ty, is_flat_tuple_type)
}

/// Flat or nested tuple type
pub fn is_tuple_of(ty: &TypeExpr) -> bool {
    is_flat_tuple_type(ty) || is_nested_tuple_type(ty)
}

/// A type that can appear as a leaf on the configuration surface
pub fn is_parsable_type(ty: &TypeExpr) -> bool {
    is_primitive_type(ty) || is_tuple_of(ty)
}

/// Sub-configuration marker: a lazy node or a choice of lazy nodes
pub fn is_subnode_type(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Lazy(_) | TypeExpr::Choice(_))
}

/// Element type and arity of a tuple type
pub fn tuple_inner_type(ty: &TypeExpr) -> Result<(TypeExpr, Arity)> {
    if !is_tuple_of(ty) {
        return Err(Error::UnsupportedType {
            field: String::new(),
            ty: ty.to_string(),
        });
    }
    match ty {
        TypeExpr::Tuple(items) => Ok((items[0].clone(), Arity::Fixed(items.len()))),
        TypeExpr::VarTuple(inner) => Ok(((**inner).clone(), Arity::Variadic)),
        _ => unreachable!("is_tuple_of only accepts tuple shapes"),
    }
}

/// Whether `value` conforms to `ty`
///
/// Primitive checks compare the exact variant: a `bool` never satisfies
/// `int` and an `int` never satisfies `float`. Tuples are checked
/// positionally (fixed arity) or element-wise (variadic).
pub fn value_matches(value: &Value, ty: &TypeExpr) -> bool {
    match (ty, value) {
        (TypeExpr::Bool, Value::Bool(_)) => true,
        (TypeExpr::Int, Value::Int(_)) => true,
        (TypeExpr::Float, Value::Float(_)) => true,
        (TypeExpr::Str, Value::Str(_)) => true,
        (TypeExpr::Tuple(types), Value::Tuple(items)) => {
            is_tuple_of(ty)
                && types.len() == items.len()
                && items.iter().zip(types).all(|(v, t)| value_matches(v, t))
        }
        (TypeExpr::VarTuple(inner), Value::Tuple(items)) => {
            is_tuple_of(ty) && items.iter().all(|v| value_matches(v, inner))
        }
        (TypeExpr::Lazy(None), Value::Lazy(_)) => true,
        (TypeExpr::Lazy(Some(class)), Value::Lazy(lazy)) => lazy.class() == *class,
        (TypeExpr::Choice(choice), Value::Lazy(lazy)) => choice
            .resolve()
            .map(|set| set.tag_of(lazy).is_some())
            .unwrap_or(false),
        _ => false,
    }
}

/// Parsable type and a conforming value
pub fn is_parsable_value(value: &Value, ty: &TypeExpr) -> bool {
    is_parsable_type(ty) && value_matches(value, ty)
}
