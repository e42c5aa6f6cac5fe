//! Error types for the document store.

use docjournal_core::{CoreError, Path};
use docjournal_store::StoreError;
use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Journal error: I/O failure, corrupt journal, unencodable record.
    #[error("journal error: {0}")]
    Store(#[from] StoreError),

    /// Key not present in the mapping.
    #[error("missing key: {0:?}")]
    MissingKey(String),

    /// Index outside the sequence.
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The child is not the kind of container that was asked for.
    #[error("expected a {expected} at {path}, found {found}")]
    TypeMismatch {
        path: Path,
        expected: &'static str,
        found: &'static str,
    },

    /// Any other tree error.
    #[error("tree error: {0}")]
    Tree(CoreError),

    /// A typed field could not be converted to or from a tree value.
    #[error("conversion error: {0}")]
    Conversion(String),
}

impl Error {
    /// Whether this is a local key/index error. The store is unchanged and
    /// can keep being used.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Error::MissingKey(_) | Error::IndexOutOfRange { .. } | Error::TypeMismatch { .. }
        )
    }
}

impl From<CoreError> for Error {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MissingKey(key) => Error::MissingKey(key),
            CoreError::IndexOutOfRange { index, len } => Error::IndexOutOfRange { index, len },
            CoreError::Encoding(_) => Error::Store(StoreError::Encoding(e)),
            other => Error::Tree(other),
        }
    }
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, Error>;
