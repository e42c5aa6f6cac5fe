//! # docjournal Core
//!
//! Pure primitives for docjournal: the tree value model, paths, change
//! records, replay, and the text codec.
//!
//! This crate contains no file I/O. It is pure computation over in-memory
//! trees and their textual encoding.
//!
//! ## Key Types
//!
//! - [`Value`] - A node of the document tree (scalar, mapping or sequence)
//! - [`Map`] - Ordered mapping with unique string keys
//! - [`Path`] / [`Selector`] - Location of a container relative to the root
//! - [`Change`] - A path-addressed change record
//!
//! ## Encoding
//!
//! Snapshots are block-style YAML documents, change records are compact JSON
//! arrays (a subset of YAML flow style). See [`codec`].

pub mod change;
pub mod codec;
pub mod error;
pub mod map;
pub mod path;
pub mod tree;
pub mod value;

pub use change::Change;
pub use codec::{decode_documents, encode_change, encode_snapshot, DOCUMENT_SEPARATOR};
pub use error::CoreError;
pub use map::Map;
pub use path::{Path, Selector};
pub use tree::{apply, check, resolve, resolve_mut, Node, NodeMut};
pub use value::Value;
