//! The document store: the root mapping of a journaled tree.
//!
//! A [`DocumentStore`] owns one [`Journal`] and the in-memory tree it
//! reconstructs. Every mutation, whether made at the root or through a
//! nested [`MapMut`]/[`SeqMut`], funnels through one commit step: validate
//! against the tree, append the record, apply it, and compact when due.

use std::path::Path as FsPath;

use docjournal_core::{tree, Change, Map, Path, Value};
use docjournal_store::{Journal, JournalConfig, JournalState};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::proxy::{MapMut, SeqMut};

/// Journal plus the tree it describes. Proxies borrow this exclusively.
#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) journal: Journal,
    pub(crate) root: Map,
}

impl Inner {
    /// Validate, record, apply, then compact if the threshold was reached.
    ///
    /// A change that fails validation appends nothing and leaves the tree
    /// untouched. Once recorded, the change stands: a failed automatic
    /// vacuum is logged and retried on the next commit. Returns the value
    /// the change replaced or removed.
    pub(crate) fn commit(&mut self, change: Change) -> Result<Option<Value>> {
        tree::check(&self.root, &change)?;
        self.journal.record(&change)?;
        let previous = tree::apply(&mut self.root, change)?;
        if let Err(e) = self.journal.compact_if_due(&self.root) {
            warn!(
                path = %self.journal.path().display(),
                pending = self.journal.pending_changes(),
                error = %e,
                "automatic vacuum failed"
            );
        }
        Ok(previous)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Options for opening a [`DocumentStore`].
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    config: JournalConfig,
    defaults: Map,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded changes between automatic vacuums. Zero disables them.
    pub fn vacuum_threshold(mut self, threshold: usize) -> Self {
        self.config = self.config.vacuum_threshold(threshold);
        self
    }

    /// Fsync every appended record.
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config = self.config.sync_writes(sync);
        self
    }

    /// Replace the journal configuration wholesale.
    pub fn journal_config(mut self, config: JournalConfig) -> Self {
        self.config = config;
        self
    }

    /// Values seeded into the root on open when their key is absent.
    pub fn defaults(mut self, defaults: Map) -> Self {
        self.defaults = defaults;
        self
    }

    /// Add a single default.
    pub fn default_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key, value);
        self
    }

    /// Open the store at `path`, replaying its journal and seeding defaults.
    pub fn open(self, path: impl AsRef<FsPath>) -> Result<DocumentStore> {
        let mut journal = Journal::open(path, self.config)?;
        let root = journal.load()?;

        let mut store = DocumentStore {
            inner: Inner { journal, root },
        };
        store.seed(self.defaults)?;
        Ok(store)
    }

    /// Open the store, run `f`, and close it on every exit path.
    ///
    /// On `Ok` the store is closed with a final vacuum and a close failure is
    /// returned as the error. On `Err` the file is released without
    /// compaction; every change made so far is already in the journal.
    pub fn scoped<T, E, F>(self, path: impl AsRef<FsPath>, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut DocumentStore) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let mut store = self.open(path)?;
        match f(&mut store) {
            Ok(value) => {
                store.close()?;
                Ok(value)
            }
            Err(e) => {
                store.abandon();
                Err(e)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

/// A persistent document: a mapping whose every mutation is journaled.
///
/// Dropping the store closes it quietly, compacting the journal unless the
/// thread is panicking. Prefer [`close`](Self::close) to observe errors.
#[derive(Debug)]
pub struct DocumentStore {
    inner: Inner,
}

impl DocumentStore {
    /// Open the store at `path` with default options.
    pub fn open(path: impl AsRef<FsPath>) -> Result<Self> {
        StoreOptions::new().open(path)
    }

    /// Open the store at `path`, seeding absent keys from `defaults`.
    pub fn open_with_defaults(path: impl AsRef<FsPath>, defaults: Map) -> Result<Self> {
        StoreOptions::new().defaults(defaults).open(path)
    }

    pub fn options() -> StoreOptions {
        StoreOptions::new()
    }

    /// [`StoreOptions::scoped`] with default options.
    pub fn scoped<T, E, F>(path: impl AsRef<FsPath>, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut DocumentStore) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        StoreOptions::new().scoped(path, f)
    }

    fn seed(&mut self, defaults: Map) -> Result<()> {
        for (key, value) in defaults {
            if self.inner.root.contains_key(&key) {
                continue;
            }
            trace!(key = %key, "seeding default");
            self.root().set(key, value)?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Path of the backing journal file.
    pub fn path(&self) -> &FsPath {
        self.inner.journal.path()
    }

    /// Read-only view of the whole tree.
    pub fn tree(&self) -> &Map {
        &self.inner.root
    }

    /// Changes recorded since the last vacuum.
    pub fn pending_changes(&self) -> usize {
        self.inner.journal.pending_changes()
    }

    /// Mutable proxy for the root mapping.
    pub fn root(&mut self) -> MapMut<'_> {
        MapMut::new(&mut self.inner, Path::root())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Root mapping
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get(&self, key: &str) -> Result<&Value> {
        self.inner
            .root
            .get(key)
            .ok_or_else(|| Error::MissingKey(key.to_string()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.root.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.root.is_empty()
    }

    /// Keys in cache order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.root.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.inner.root.iter()
    }

    /// Set `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>> {
        self.root().set(key, value)
    }

    /// Remove `key`, returning its value.
    pub fn delete(&mut self, key: &str) -> Result<Value> {
        self.root().delete(key)
    }

    /// Set `key` only if it is absent, then return its value.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<&Value> {
        let key = key.into();
        if !self.contains_key(&key) {
            self.set(key.clone(), value)?;
        }
        self.get(&key)
    }

    /// Proxy for the mapping stored under `key`.
    pub fn map(&mut self, key: &str) -> Result<MapMut<'_>> {
        MapMut::new(&mut self.inner, Path::root()).into_map(key)
    }

    /// Proxy for the sequence stored under `key`.
    pub fn seq(&mut self, key: &str) -> Result<SeqMut<'_>> {
        MapMut::new(&mut self.inner, Path::root()).into_seq(key)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Compact the journal into a single snapshot now.
    pub fn vacuum(&mut self) -> Result<()> {
        let Inner { journal, root } = &mut self.inner;
        journal.vacuum(root)?;
        Ok(())
    }

    /// Compact the journal and release the file.
    pub fn close(mut self) -> Result<()> {
        let Inner { journal, root } = &mut self.inner;
        journal.close(root)?;
        Ok(())
    }

    /// Release the file without compacting.
    pub fn abandon(mut self) {
        debug!(path = %self.path().display(), "releasing journal without compaction");
        self.inner.journal.release();
    }
}

impl Drop for DocumentStore {
    fn drop(&mut self) {
        if self.inner.journal.state() == JournalState::Closed {
            return;
        }
        if std::thread::panicking() {
            self.inner.journal.release();
        } else {
            let Inner { journal, root } = &mut self.inner;
            journal.close_quiet(root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn temp_store(contents: &str) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.state");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_open_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.state");
        let store = DocumentStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.path(), path.as_path());
        assert!(path.exists());
    }

    #[test]
    fn test_failed_validation_records_nothing() {
        let (_dir, path) = temp_store("a: 1\n");
        let mut store = DocumentStore::open(&path).unwrap();

        let err = store.delete("missing").unwrap_err();
        assert!(matches!(err, Error::MissingKey(ref k) if k == "missing"));
        assert!(err.is_lookup());
        assert_eq!(store.pending_changes(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a: 1\n");
    }

    #[test]
    fn test_non_finite_rejected_before_apply() {
        let (_dir, path) = temp_store("");
        let mut store = DocumentStore::open(&path).unwrap();
        let err = store.set("x", f64::INFINITY).unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert!(!store.contains_key("x"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_threshold_vacuum_includes_triggering_change() {
        let (_dir, path) = temp_store("");
        let mut store = StoreOptions::new().vacuum_threshold(2).open(&path).unwrap();
        store.set("a", 1).unwrap();
        store.set("b", 2).unwrap();
        assert_eq!(store.pending_changes(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a: 1\nb: 2\n");
    }

    #[test]
    fn test_failed_auto_vacuum_keeps_committed_change() {
        let (dir, path) = temp_store("");
        let blocker = dir.path().join("test.state.tmp");
        fs::create_dir(&blocker).unwrap();

        let mut store = StoreOptions::new().vacuum_threshold(1).open(&path).unwrap();
        assert_eq!(store.set("a", 1).unwrap(), None);
        assert_eq!(store.get("a").unwrap(), &Value::Int(1));
        assert_eq!(store.pending_changes(), 1);
        assert!(fs::read_to_string(&path).unwrap().contains(r#"["set",[],"a",1]"#));

        fs::remove_dir(&blocker).unwrap();
        store.set("b", 2).unwrap();
        assert_eq!(store.pending_changes(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a: 1\nb: 2\n");
    }

    #[test]
    fn test_set_default() {
        let (_dir, path) = temp_store("a: 1\n");
        let mut store = DocumentStore::open(&path).unwrap();
        assert_eq!(store.set_default("a", 5).unwrap(), &Value::Int(1));
        assert_eq!(store.set_default("b", 5).unwrap(), &Value::Int(5));
        assert_eq!(store.pending_changes(), 1);
    }

    #[test]
    fn test_drop_compacts() {
        let (_dir, path) = temp_store("a: 1\n");
        {
            let mut store = DocumentStore::open(&path).unwrap();
            store.set("a", 2).unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "a: 2\n");
    }

    #[test]
    fn test_abandon_keeps_records() {
        let (_dir, path) = temp_store("a: 1\n");
        let mut store = DocumentStore::open(&path).unwrap();
        store.set("a", 2).unwrap();
        store.abandon();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "a: 1\n\n---\n[\"set\",[],\"a\",2]"
        );
    }

    #[test]
    fn test_corrupt_journal_left_untouched() {
        let contents = "a: 1\n---\n[\"delete\",[],\"zzz\"]\n";
        let (_dir, path) = temp_store(contents);
        let err = DocumentStore::open(&path).unwrap_err();
        assert!(matches!(err, Error::Store(ref e) if e.is_corrupt()));
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn test_map_type_mismatch() {
        let (_dir, path) = temp_store("list: [1, 2]\n");
        let mut store = DocumentStore::open(&path).unwrap();
        match store.map("list") {
            Err(Error::TypeMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, "mapping");
                assert_eq!(found, "sequence");
            }
            other => panic!("expected type mismatch, got {:?}", other.map(|_| ())),
        }
    }
}
