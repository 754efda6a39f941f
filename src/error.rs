//! Error types for lazyconf

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Schema violation for {field}: expected {expected}, got {actual}")]
    SchemaViolation {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Unsupported type for {field}: {ty}")]
    UnsupportedType { field: String, ty: String },

    #[error("Cannot bind arguments for {class}: {reason}")]
    Binding { class: String, reason: String },

    #[error("{class} is missing required argument '{name}'")]
    MissingArgument { class: String, name: String },

    #[error("Invalid choice '{given}' for {field} (choose from {})", .choices.join(", "))]
    InvalidChoice {
        field: String,
        given: String,
        choices: Vec<String>,
    },

    #[error("Invalid choice set {name}: {reason}")]
    InvalidChoiceSet { name: String, reason: String },

    #[error("Cannot import class '{0}'")]
    Import(String),

    #[error("Structural mismatch: {0}")]
    StructuralMismatch(String),

    #[error("{class} constructs {actual}, not {expected}")]
    TypeMismatch {
        class: String,
        expected: String,
        actual: String,
    },

    #[error("{message}")]
    Cli {
        kind: clap::error::ErrorKind,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Construction failed: {0}")]
    Construction(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<clap::Error> for Error {
    fn from(err: clap::Error) -> Self {
        Error::Cli {
            kind: err.kind(),
            message: err.render().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
