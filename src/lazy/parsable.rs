//! Class-level entry points for configurable types

use super::class::{register, Configurable};
use super::dict::{ConfigDict, DictOptions, Entry, TYPE_TAG};
use super::node::Lazy;
use super::signature::Bindings;
use crate::error::{Error, Result};
use crate::parse::{exit_with, ArgumentParser};
use crate::value::Value;
use std::ffi::OsString;

/// A configurable type that remembers the configuration it was built from
///
/// Implementors store [`Kwargs::snapshot`](super::Kwargs::snapshot) while
/// constructing and hand it back from [`config`](Parsable::config).
pub trait Parsable: Configurable {
    /// Configuration this instance was constructed with
    fn config(&self) -> &Lazy;

    /// Default configuration of this type
    fn as_lazy() -> Lazy {
        Lazy::of::<Self>()
    }

    fn as_lazy_with(bindings: Bindings) -> Result<Lazy> {
        Lazy::from_class::<Self>(bindings)
    }

    /// Rebuild a configuration of this type from its dict form
    ///
    /// A missing root class tag defaults to this type; a tag naming
    /// another class is rejected.
    fn from_dict(dict: &ConfigDict) -> Result<Lazy> {
        register::<Self>();
        let mut dict = dict.clone();
        match dict.get(TYPE_TAG) {
            None => {
                dict.insert(TYPE_TAG.to_string(), Entry::Class(Self::PATH.to_string()));
            }
            Some(Entry::Class(path)) | Some(Entry::Value(Value::Str(path)))
                if path != Self::PATH =>
            {
                return Err(Error::StructuralMismatch(format!(
                    "expected a {} configuration, got {path}",
                    Self::PATH
                )));
            }
            Some(_) => {}
        }
        Lazy::from_dict(&dict)
    }

    /// Parse the process arguments into a configuration, exiting on error
    fn parse_args() -> Lazy {
        Self::try_parse_args_from(std::env::args_os()).unwrap_or_else(|e| exit_with(e))
    }

    fn try_parse_args_from<I, T>(argv: I) -> Result<Lazy>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let parsed = ArgumentParser::new(Self::PATH)
            .add_options(Self::as_lazy())
            .try_parse_from(argv)?;
        parsed.into_root().ok_or_else(|| {
            Error::StructuralMismatch(format!("no {} configuration was parsed", Self::PATH))
        })
    }

    /// Dict form of the configuration this instance was built from
    fn to_dict(&self, options: DictOptions) -> Result<ConfigDict> {
        self.config().to_dict(options)
    }
}
