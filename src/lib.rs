//! # Lazyconf: Lazy Constructor Configuration
//!
//! Lazyconf describes a tree of objects by their constructor parameters
//! before any of them is built. A configuration can be updated field by
//! field, written to and read from dicts and files, exposed as command-line
//! flags, and finally constructed.
//!
//! ## Architecture
//!
//! - **typecheck**: which parameter types are configurable, and value checks
//! - **lazy**: signatures, lazy nodes, choices and the registry of classes
//! - **parse**: command-line flags with shortest unique names
//! - **io**: JSON/YAML files and checkpoints
//! - **optim**: configurable optimizers (SGD, Adam)
//! - **demo**: a linear model and its training parameters

pub mod demo;
pub mod io;
pub mod lazy;
pub mod optim;
pub mod parse;
pub mod path;
pub mod typecheck;
pub mod value;

pub mod error;

#[doc(hidden)]
pub mod testing;

// Re-export commonly used types
pub use error::{Error, Result};
pub use lazy::{
    Bindings, BuildOptions, Choice, ChoiceSet, Choices, ClassRef, ConfigDict, Configurable,
    DictOptions, Entry, Kwargs, Lazy, Param, Parsable, Resolution, TypecheckEager, TYPE_TAG,
};
pub use path::FieldPath;
pub use typecheck::TypeExpr;
pub use value::{FromValue, Value};
