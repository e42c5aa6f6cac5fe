//! # docjournal
//!
//! An embedded document store. The state lives in memory as a tree of
//! mappings, sequences and scalars, and every mutation is appended to a
//! human-editable journal file as it happens.
//!
//! ## Overview
//!
//! The journal file starts with a YAML snapshot of the tree, followed by one
//! compact JSON record per change:
//!
//! ```text
//! a: a
//! b: b
//! ---
//! ["set",[],"a","AA"]
//! ---
//! ["delete",[],"b"]
//! ```
//!
//! Opening the store replays the file. Closing it, and every 2000 changes by
//! default, rewrites the file as a single snapshot.
//!
//! ## Key Types
//!
//! - [`DocumentStore`] - The root mapping, bound to one journal file
//! - [`MapMut`] / [`SeqMut`] - Proxies for nested containers
//! - [`StoreOptions`] - Vacuum threshold, durability, defaults
//! - [`Fields`] - Typed access through `serde`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docjournal::{DocumentStore, Value};
//!
//! let mut store = DocumentStore::open("app.state").unwrap();
//! store.set("title", "notes").unwrap();
//! store.set("tags", vec!["a", "b"]).unwrap();
//!
//! store.seq("tags").unwrap().push("c").unwrap();
//! assert_eq!(store.get("title").unwrap(), &Value::from("notes"));
//!
//! store.close().unwrap();
//! ```
//!
//! ## Re-exports
//!
//! - `docjournal::core` - Tree values, paths, change records, codec
//! - `docjournal::store` - The journal file

pub mod document;
pub mod error;
pub mod fields;
pub mod proxy;

// Re-export component crates
pub use docjournal_core as core;
pub use docjournal_store as store;

// Re-export main types for convenience
pub use document::{DocumentStore, StoreOptions};
pub use error::{Error, Result};
pub use fields::Fields;
pub use proxy::{MapMut, SeqMut};

// Re-export commonly used core types
pub use docjournal_core::{Map, Path, Selector, Value};
pub use docjournal_store::{JournalConfig, DEFAULT_VACUUM_THRESHOLD};
