//! Error types for the journal.

use docjournal_core::CoreError;
use thiserror::Error;

/// Errors that can occur during journal operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The journal file cannot be opened, read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document in the journal cannot be decoded or replayed.
    ///
    /// `document` is the zero-based position of the offending document.
    #[error("corrupt journal at document {document}: {source}")]
    Corrupt {
        document: usize,
        #[source]
        source: CoreError,
    },

    /// A change record could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(#[source] CoreError),

    /// The journal has already been closed.
    #[error("journal is closed")]
    Closed,
}

impl StoreError {
    /// Whether this error came from reading a damaged journal.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }
}

/// Result type for journal operations.
pub type Result<T> = std::result::Result<T, StoreError>;
