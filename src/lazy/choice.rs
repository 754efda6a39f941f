//! Closed sets of named sub-configuration alternatives

use super::node::Lazy;
use crate::error::{Error, Result};
use crate::value::Value;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A statically declared tagged union of lazy nodes
///
/// ```
/// use lazyconf::optim::{Adam, Sgd};
/// use lazyconf::{Choices, Lazy, Value};
///
/// struct Optimizer;
///
/// impl Choices for Optimizer {
///     const NAME: &'static str = "Optimizer";
///
///     fn alternatives() -> Vec<(&'static str, Value)> {
///         vec![
///             ("SGD", Lazy::of::<Sgd>().into()),
///             ("ADAM", Lazy::of::<Adam>().into()),
///         ]
///     }
/// }
///
/// assert_eq!(Optimizer::default_choice(), "SGD");
/// assert!(Optimizer::select("ADAM").is_ok());
/// assert!(Optimizer::select("RMSPROP").is_err());
/// ```
pub trait Choices: 'static {
    const NAME: &'static str;

    /// Named alternatives; each must be a lazy node
    fn alternatives() -> Vec<(&'static str, Value)>;

    /// Alternative used when nothing is selected; the first by default
    fn default_choice() -> &'static str {
        Self::alternatives()
            .first()
            .map(|(name, _)| *name)
            .unwrap_or_default()
    }

    fn choice_set() -> Result<ChoiceSet> {
        ChoiceSet::new(Self::NAME, Self::alternatives(), Self::default_choice())
    }

    fn select(name: &str) -> Result<Lazy> {
        Self::choice_set()?.select(name)
    }
}

/// Type-erased handle to a [`Choices`] implementation
#[derive(Clone, Copy)]
pub struct ChoiceRef {
    name: &'static str,
    set: fn() -> Result<ChoiceSet>,
}

impl ChoiceRef {
    pub fn of<C: Choices>() -> Self {
        Self {
            name: C::NAME,
            set: C::choice_set,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build and validate the alternatives
    pub fn resolve(&self) -> Result<ChoiceSet> {
        (self.set)()
    }
}

impl PartialEq for ChoiceRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ChoiceRef {}

impl Hash for ChoiceRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for ChoiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChoiceRef({})", self.name)
    }
}

/// Validated alternatives of a choice
#[derive(Debug, Clone)]
pub struct ChoiceSet {
    name: String,
    alternatives: Vec<(String, Lazy)>,
    default: String,
}

impl ChoiceSet {
    /// Validate alternatives
    ///
    /// The set must be non-empty with unique names, every alternative must
    /// be a lazy node, and no two alternatives may target the same class so
    /// that the selected name can be recovered from a node.
    pub fn new(name: &str, alternatives: Vec<(&str, Value)>, default: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidChoiceSet {
            name: name.to_string(),
            reason,
        };

        if alternatives.is_empty() {
            return Err(invalid("no alternatives".to_string()));
        }

        let mut names = HashSet::new();
        let mut classes = HashSet::new();
        let mut checked = Vec::with_capacity(alternatives.len());
        for (alt, value) in alternatives {
            if !names.insert(alt) {
                return Err(invalid(format!("duplicate alternative '{alt}'")));
            }
            let Value::Lazy(lazy) = value else {
                return Err(invalid(format!(
                    "alternative '{alt}' must be a lazy node, got {}",
                    value.type_name()
                )));
            };
            if !classes.insert(lazy.class()) {
                return Err(invalid(format!(
                    "alternative '{alt}' repeats class {}",
                    lazy.class().name()
                )));
            }
            checked.push((alt.to_string(), lazy));
        }

        if !names.contains(default) {
            return Err(invalid(format!("unknown default '{default}'")));
        }

        Ok(Self {
            name: name.to_string(),
            alternatives: checked,
            default: default.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn names(&self) -> Vec<String> {
        self.alternatives.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn default_variant(&self) -> &Lazy {
        self.alternatives
            .iter()
            .find(|(n, _)| *n == self.default)
            .map(|(_, lazy)| lazy)
            .unwrap_or(&self.alternatives[0].1)
    }

    pub fn alternatives(&self) -> &[(String, Lazy)] {
        &self.alternatives
    }

    pub fn get(&self, name: &str) -> Option<&Lazy> {
        self.alternatives
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, lazy)| lazy)
    }

    pub fn select(&self, name: &str) -> Result<Lazy> {
        self.get(name).cloned().ok_or_else(|| Error::InvalidChoice {
            field: self.name.clone(),
            given: name.to_string(),
            choices: self.names(),
        })
    }

    /// Name of the alternative whose class `lazy` targets
    pub fn tag_of(&self, lazy: &Lazy) -> Option<&str> {
        self.alternatives
            .iter()
            .find(|(_, alt)| alt.class() == lazy.class())
            .map(|(n, _)| n.as_str())
    }

    /// Selected view of `lazy`
    pub fn choose(&self, lazy: &Lazy) -> Result<Choice> {
        let tag = self.tag_of(lazy).ok_or_else(|| Error::InvalidChoice {
            field: self.name.clone(),
            given: lazy.class().name().to_string(),
            choices: self.names(),
        })?;
        Ok(Choice {
            tag: tag.to_string(),
            variant: lazy.clone(),
        })
    }
}

/// A selected alternative
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Choice {
    pub tag: String,
    pub variant: Lazy,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tag, self.variant)
    }
}
