//! # docjournal Store
//!
//! The change journal behind a docjournal document: one human-editable text
//! file holding a baseline snapshot followed by appended change records.
//!
//! ## Overview
//!
//! The [`Journal`] owns the file handle. It replays the file into a tree on
//! load, appends one record per mutation, and periodically compacts the file
//! into a single snapshot.
//!
//! ## Key Types
//!
//! - [`Journal`] - File owner: load, record, vacuum, close
//! - [`JournalConfig`] - Vacuum threshold and write durability
//! - [`JournalState`] - Lifecycle of a journal
//! - [`StoreError`] - I/O and corrupt-journal errors
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docjournal_core::{tree, Change, Path, Selector, Value};
//! use docjournal_store::{Journal, JournalConfig};
//!
//! let mut journal = Journal::open("app.state", JournalConfig::default()).unwrap();
//! let mut root = journal.load().unwrap();
//!
//! let change = Change::Set {
//!     path: Path::root(),
//!     key: Selector::Key("count".into()),
//!     value: Value::Int(1),
//! };
//! journal.record(&change).unwrap();
//! tree::apply(&mut root, change).unwrap();
//! journal.compact_if_due(&root).unwrap();
//!
//! journal.close(&root).unwrap();
//! ```
//!
//! ## Design Notes
//!
//! - **Durable appends**: every record is written and flushed before the
//!   caller updates its in-memory tree
//! - **Crash-safe vacuum**: temp file, fsync, atomic rename
//! - **Fatal corruption**: replay stops at the first bad document

pub mod config;
pub mod error;
pub mod journal;

pub use config::{JournalConfig, DEFAULT_VACUUM_THRESHOLD};
pub use error::{Result, StoreError};
pub use journal::{Journal, JournalState};
