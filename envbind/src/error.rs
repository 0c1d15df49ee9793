use thiserror::Error;

use crate::BoxError;

/// Errors surfaced while building a binding plan or binding an instance.
///
/// Plan-build failures (`NoSuitableConstructor`, `MissingSetter`) are raised
/// the first time a type is bound and are never cached, so registering a
/// missing parser and binding again retries the build.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("No suitable constructor found for `{type_name}`")]
    NoSuitableConstructor { type_name: &'static str },

    #[error("`{type_name}.{member}`: Member has no setter")]
    MissingSetter {
        type_name: &'static str,
        member: &'static str,
    },

    #[error("Missing required environment variable '{key}'")]
    MissingRequiredVariable { key: String },

    #[error(
        "No parser available for `{type_name}`, register one on the binder or \
         attach one to the member with `#[bind(with = ...)]`"
    )]
    NoParserAvailable { type_name: &'static str },

    #[error("Failed to parse '{key}'=\"{value}\" into `{type_name}`: {source}")]
    ParseFailure {
        key: String,
        value: String,
        type_name: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Value bound to '{key}' is not a `{expected}`")]
    TypeMismatch { key: String, expected: &'static str },
}

impl BindError {
    /// The external key the error refers to, if it was raised at bind time.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredVariable { key }
            | Self::ParseFailure { key, .. }
            | Self::TypeMismatch { key, .. } => Some(key),
            Self::NoSuitableConstructor { .. }
            | Self::MissingSetter { .. }
            | Self::NoParserAvailable { .. } => None,
        }
    }

    pub(crate) fn missing(key: impl Into<String>) -> Self {
        Self::MissingRequiredVariable { key: key.into() }
    }
}
