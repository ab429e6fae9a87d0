use thiserror::Error;

use crate::pattern::{Method, GRAMMAR};

/// Errors produced while parsing a pattern or request string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Nothing left after trimming, or no path segment after the method.
    #[error("pattern illegal, should be in format of {grammar}", grammar = GRAMMAR)]
    Malformed,

    /// The only path segment is empty, `*` or `**` (e.g. `GET/*`).
    #[error("illegal wildcard")]
    IllegalWildcard,

    /// The first segment is not one of the recognized methods.
    #[error("unsupported method '{0}', only supports {allowed}", allowed = Method::allowed())]
    UnsupportedMethod(String),

    /// An empty segment somewhere other than the last position (`GET/api//user`).
    #[error("pattern contains illegal empty path")]
    IllegalEmptyPath,

    /// A `**` segment somewhere other than the last position.
    #[error("pattern contains illegal omitted path")]
    IllegalOmittedPath,
}

/// Errors produced while registering a pattern in a [`Table`](crate::Table).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The pattern failed validation.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// A wildcard segment collides with an existing sibling.
    #[error("conflict at {prefix}")]
    Conflict {
        /// Canonical form of the prefix walked before the collision.
        prefix: String,
    },
}

impl TableError {
    /// Whether this error is a registration conflict rather than a grammar error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
