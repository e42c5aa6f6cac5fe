//! Error types for docjournal core.

use thiserror::Error;

use crate::path::Path;

/// Errors raised while resolving, mutating, encoding or decoding a tree.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing key: {0:?}")]
    MissingKey(String),

    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("selector {selector} cannot address a {container}")]
    SelectorMismatch {
        selector: String,
        container: &'static str,
    },

    #[error("value at {0} is not a mapping or sequence")]
    NotAContainer(Path),

    #[error("path {0} does not resolve")]
    UnresolvedPath(Path),

    #[error("malformed change record: {0}")]
    MalformedRecord(String),

    #[error("unknown change op: {0:?}")]
    UnknownOp(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),
}

impl CoreError {
    /// Whether this is a local key/index error that leaves the tree untouched.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            CoreError::MissingKey(_)
                | CoreError::IndexOutOfRange { .. }
                | CoreError::SelectorMismatch { .. }
        )
    }
}
