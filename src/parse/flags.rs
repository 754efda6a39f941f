//! Flag specifications derived from a lazy node tree

use crate::error::Result;
use crate::lazy::Lazy;
use crate::path::FieldPath;
use crate::typecheck::{is_bool_type, is_flat_tuple_type, is_nested_tuple_type, is_primitive_type, tuple_inner_type, Arity, TypeExpr};
use crate::value::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// How a flag reads its tokens
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FlagKind {
    /// One truthy/falsy literal
    Bool,
    /// One `int`, `float` or `str` token
    Scalar(TypeExpr),
    /// Exactly `n` or one-or-more tokens of `inner`
    Tuple { inner: TypeExpr, arity: Arity },
    /// Alternative name of a choice field
    Discriminator { choices: Vec<String> },
    /// Not bound on the command line; keeps its current value
    Skipped,
}

/// Choice selections a flag depends on: choice field path -> alternative
pub(crate) type Branches = Vec<(FieldPath, String)>;

/// Active alternative of every choice field, by field path
pub(crate) type Selections = BTreeMap<FieldPath, String>;

/// One leaf field of a configuration root
#[derive(Debug, Clone)]
pub(crate) struct FlagSpec {
    /// Path below the root with alternative names stripped
    pub path: FieldPath,
    pub kind: FlagKind,
    pub value: Option<Value>,
    pub branches: Branches,
}

/// Class of a sub-node, emitted as a `_class` entry when regrouping
#[derive(Debug, Clone)]
pub(crate) struct ClassTag {
    pub path: FieldPath,
    pub class: &'static str,
    pub branches: Branches,
}

/// Flags and class tags of one configuration root
#[derive(Debug, Clone, Default)]
pub(crate) struct RootFlags {
    pub flags: Vec<FlagSpec>,
    pub tags: Vec<ClassTag>,
}

impl RootFlags {
    /// Walk `lazy`, emitting every alternative's block of every choice
    pub fn collect(lazy: &Lazy) -> Result<Self> {
        let mut out = Self::default();
        out.walk(lazy, &FieldPath::root(), &Vec::new())?;
        Ok(out)
    }

    fn walk(&mut self, lazy: &Lazy, prefix: &FieldPath, branches: &Branches) -> Result<()> {
        for (name, field) in lazy.fields()? {
            let path = prefix.child(name.clone());
            match (&field.annotation, &field.value) {
                (TypeExpr::Choice(choice), Some(Value::Lazy(current))) => {
                    let set = choice.resolve()?;
                    let selected = set.choose(current)?.tag;
                    self.flags.push(FlagSpec {
                        path: path.clone(),
                        kind: FlagKind::Discriminator {
                            choices: set.names(),
                        },
                        value: Some(Value::Str(selected.clone())),
                        branches: branches.clone(),
                    });
                    for (tag, variant) in set.alternatives() {
                        let node = if *tag == selected { current } else { variant };
                        let mut nested = branches.clone();
                        nested.push((path.clone(), tag.clone()));
                        self.tags.push(ClassTag {
                            path: path.clone(),
                            class: node.class().path(),
                            branches: nested.clone(),
                        });
                        self.walk(node, &path, &nested)?;
                    }
                }
                (TypeExpr::Lazy(_), Some(Value::Lazy(sub))) => {
                    self.tags.push(ClassTag {
                        path: path.clone(),
                        class: sub.class().path(),
                        branches: branches.clone(),
                    });
                    self.walk(sub, &path, branches)?;
                }
                (ty, value) => {
                    let kind = if is_bool_type(ty) {
                        FlagKind::Bool
                    } else if is_primitive_type(ty) {
                        FlagKind::Scalar(ty.clone())
                    } else if is_flat_tuple_type(ty) {
                        let (inner, arity) = tuple_inner_type(ty)?;
                        FlagKind::Tuple { inner, arity }
                    } else {
                        if is_nested_tuple_type(ty) {
                            warn!(field = %path, ty = %ty, "nested tuples cannot be set from the command line");
                        }
                        FlagKind::Skipped
                    };
                    self.flags.push(FlagSpec {
                        path,
                        kind,
                        value: value.clone(),
                        branches: branches.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Whether every choice a flag depends on is set to the required alternative
pub(crate) fn is_active(branches: &Branches, selections: &Selections) -> bool {
    branches
        .iter()
        .all(|(choice, tag)| selections.get(choice) == Some(tag))
}

/// Selections taken from the current values of a root
pub(crate) fn current_selections(root: &RootFlags) -> Selections {
    root.flags
        .iter()
        .filter_map(|flag| match (&flag.kind, &flag.value) {
            (FlagKind::Discriminator { .. }, Some(Value::Str(tag))) => {
                Some((flag.path.clone(), tag.clone()))
            }
            _ => None,
        })
        .collect()
}

/// Parse a boolean literal
///
/// Accepts `yes/true/t/y/1` and `no/false/f/n/0`, case-insensitively.
pub fn str2bool(token: &str) -> std::result::Result<bool, String> {
    match token.to_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" => Ok(true),
        "no" | "false" | "f" | "n" | "0" => Ok(false),
        _ => Err(format!("boolean value expected, got '{token}'")),
    }
}
