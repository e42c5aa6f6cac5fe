//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use docjournal::{DocumentStore, StoreOptions};
use docjournal_core::{encode_snapshot, Map};
use tempfile::TempDir;

/// A journal file inside its own temporary directory.
///
/// The directory, and everything opened from it, is removed on drop.
pub struct TestJournal {
    dir: TempDir,
    path: PathBuf,
}

impl TestJournal {
    /// A journal path with no file yet.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("test.state");
        Self { dir, path }
    }

    /// A journal file holding `contents`.
    pub fn with_contents(contents: &str) -> Self {
        let journal = Self::new();
        fs::write(&journal.path, contents).expect("write journal");
        journal
    }

    /// A journal file holding a snapshot of `tree`.
    pub fn with_tree(tree: &Map) -> Self {
        Self::with_contents(&encode_snapshot(tree).expect("encode snapshot"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file contents.
    pub fn contents(&self) -> String {
        fs::read_to_string(&self.path).expect("read journal")
    }

    /// Open the store with default options.
    pub fn open(&self) -> DocumentStore {
        DocumentStore::open(&self.path).expect("open store")
    }

    /// Open the store with `options`.
    pub fn open_with(&self, options: StoreOptions) -> DocumentStore {
        options.open(&self.path).expect("open store")
    }

    /// Copy the journal as it is now to a sibling file named `name`.
    pub fn copy_to(&self, name: &str) -> PathBuf {
        let copy = self.dir.path().join(name);
        fs::copy(&self.path, &copy).expect("copy journal");
        copy
    }

    /// Replay a copy of the journal as it is now, leaving the original
    /// untouched, and return the resulting tree.
    pub fn replay(&self) -> Map {
        let copy = self.copy_to("replay.state");
        let store = DocumentStore::open(&copy).expect("replay journal");
        let tree = store.tree().clone();
        store.abandon();
        tree
    }
}

impl Default for TestJournal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docjournal::Value;

    #[test]
    fn test_replay_leaves_original_untouched() {
        let journal = TestJournal::with_contents("a: 1\n");
        let mut store = journal.open();
        store.set("b", 2).unwrap();

        let before = journal.contents();
        let replayed = journal.replay();
        assert_eq!(journal.contents(), before);
        assert_eq!(&replayed, store.tree());
        assert_eq!(replayed.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_with_tree() {
        let tree: Map = [("x", Value::Int(1))].into_iter().collect();
        let journal = TestJournal::with_tree(&tree);
        assert_eq!(journal.contents(), "x: 1\n");
        assert_eq!(journal.open().tree(), &tree);
    }
}
