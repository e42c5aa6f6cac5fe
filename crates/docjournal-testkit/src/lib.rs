//! # docjournal Testkit
//!
//! Testing utilities for docjournal.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden journals**: On-disk journal files with the trees they replay to
//! - **Generators**: Proptest strategies for values, trees and edit scripts
//! - **Scripts**: Edits that apply to whatever tree they meet
//! - **Fixtures**: Journal files in throwaway directories
//!
//! ## Golden Journals
//!
//! ```rust
//! use docjournal_testkit::vectors::verify_all_journals;
//!
//! for (name, matches) in verify_all_journals() {
//!     assert!(matches, "{}", name);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use docjournal_testkit::generators::{script, tree};
//! use docjournal_testkit::{run_script, TestJournal};
//!
//! proptest! {
//!     #[test]
//!     fn replay_matches_live_tree(initial in tree(), edits in script(20)) {
//!         let journal = TestJournal::with_tree(&initial);
//!         let mut store = journal.open();
//!         run_script(&mut store, &edits).unwrap();
//!         prop_assert_eq!(&journal.replay(), store.tree());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod script;
pub mod vectors;

pub use fixtures::TestJournal;
pub use script::{apply_edit, containers, run_script, target_at, Edit, Target};
