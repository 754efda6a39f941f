//! Lazy configuration nodes
//!
//! A [`Lazy`] is a not-yet-built object: a target [`Configurable`] type plus
//! the typed values its constructor will receive. Nodes nest, convert to and
//! from flat or nested dicts, and are updated by copy, never in place.
//!
//! # Example
//!
//! ```
//! use lazyconf::demo::Linear;
//! use lazyconf::{DictOptions, Lazy, Value};
//!
//! let lazy = Lazy::of::<Linear>();
//! let wider = lazy.copy_with([("out_channels", 8)]).unwrap();
//!
//! let dict = wider.to_dict(DictOptions::default()).unwrap();
//! assert_eq!(dict["out_channels"], Value::Int(8).into());
//! ```

mod choice;
mod class;
mod dict;
mod mode;
mod node;
mod parsable;
mod signature;


pub use choice::{Choice, ChoiceRef, ChoiceSet, Choices};
pub use class::{import_class, register, register_class, Arg, ClassRef, Configurable, Kwargs};
pub use dict::{
    flatten_dict, from_json, to_json, unflatten_dict, ConfigDict, DictOptions, Entry, TYPE_TAG,
};
pub use mode::{
    resolution, set_resolution, set_typecheck_eager, should_typecheck_eagerly, with_resolution,
    Resolution, TypecheckEager,
};
pub use node::{BuildOptions, Field, Fields, Lazy};
pub use parsable::Parsable;
pub use signature::{get_signature, BoundParam, Bindings, Param};
