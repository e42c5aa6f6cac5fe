//! The change journal: a single text file holding a snapshot followed by
//! appended change records.
//!
//! ## Compaction
//!
//! [`Journal::vacuum`] rewrites the file as one snapshot of the current
//! tree. The snapshot goes to `<file>.tmp`, is fsynced, and then atomically
//! renamed over the journal, so a reader always finds either the old
//! snapshot plus its records or the new snapshot.
//!
//! ## Teardown
//!
//! [`Journal::close`] logs and reports errors. [`Journal::close_quiet`] is
//! for implicit teardown and does neither. [`Journal::release`] drops the
//! file without compacting.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use docjournal_core::{
    decode_documents, encode_change, encode_snapshot, tree, Change, CoreError, Map,
    DOCUMENT_SEPARATOR,
};
use tracing::{debug, trace};

use crate::config::JournalConfig;
use crate::error::{Result, StoreError};

/// Lifecycle of a journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalState {
    /// File is open, nothing replayed yet.
    Created,
    /// Replay in progress; recording is suppressed.
    Loading,
    /// Replay finished; changes are appended.
    Loaded,
    /// File handle released. Terminal.
    Closed,
}

/// Append-only change journal backed by one file.
#[derive(Debug)]
pub struct Journal {
    /// Path of the journal file.
    path: PathBuf,
    /// Append handle; `None` once closed.
    file: Option<File>,
    config: JournalConfig,
    /// Changes recorded since the last vacuum.
    pending: usize,
    state: JournalState,
}

impl Journal {
    /// Open the journal at `path`, creating the file and its parent
    /// directories if they do not exist. Nothing is replayed yet.
    pub fn open(path: impl AsRef<Path>, config: JournalConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = open_append(&path)?;
        let journal = Self {
            path,
            file: Some(file),
            config,
            pending: 0,
            state: JournalState::Created,
        };
        debug!(
            path = %journal.path.display(),
            size_kb = journal.file_size()? / 1024,
            "opened journal"
        );

        Ok(journal)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn state(&self) -> JournalState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == JournalState::Closed
    }

    /// Changes recorded since the last vacuum.
    pub fn pending_changes(&self) -> usize {
        self.pending
    }

    /// Current size of the journal file in bytes.
    pub fn file_size(&self) -> Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Replay
    // ─────────────────────────────────────────────────────────────────────────

    /// Replay the file into a fresh tree.
    ///
    /// Mapping documents reset the tree; record documents are applied to the
    /// tree built so far. The first document that fails to decode or apply
    /// aborts the load with [`StoreError::Corrupt`].
    pub fn load(&mut self) -> Result<Map> {
        match self.state {
            JournalState::Closed => return Err(StoreError::Closed),
            JournalState::Loading | JournalState::Loaded | JournalState::Created => {}
        }

        self.state = JournalState::Loading;
        match self.replay() {
            Ok(root) => {
                self.state = JournalState::Loaded;
                Ok(root)
            }
            Err(e) => {
                self.state = JournalState::Created;
                Err(e)
            }
        }
    }

    fn replay(&mut self) -> Result<Map> {
        let file = self.file.as_mut().ok_or(StoreError::Closed)?;
        let mut bytes = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut bytes)?;
        debug!(size_kb = bytes.len() / 1024, "loading journal");

        let text = String::from_utf8(bytes).map_err(|e| StoreError::Corrupt {
            document: 0,
            source: CoreError::Decoding(e.to_string()),
        })?;

        let mut root = Map::new();
        let mut replayed = 0usize;
        for (document, decoded) in decode_documents(&text).enumerate() {
            let corrupt = |source| StoreError::Corrupt { document, source };

            let value = decoded.map_err(corrupt)?;
            if value.is_null() {
                continue;
            }
            let change = Change::from_value(value).map_err(corrupt)?;
            trace!(document, op = change.op(), "replaying document");
            tree::apply(&mut root, change).map_err(corrupt)?;
            replayed += 1;
        }

        debug!(documents = replayed, keys = root.len(), "journal loaded");
        Ok(root)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Recording
    // ─────────────────────────────────────────────────────────────────────────

    /// Append one change record and flush it.
    ///
    /// Does nothing while the journal is being replayed.
    pub fn record(&mut self, change: &Change) -> Result<()> {
        match self.state {
            JournalState::Loading => return Ok(()),
            JournalState::Closed => return Err(StoreError::Closed),
            JournalState::Created | JournalState::Loaded => {}
        }

        let line = encode_change(change).map_err(StoreError::Encoding)?;
        let file = self.file.as_mut().ok_or(StoreError::Closed)?;

        let mut buf = String::with_capacity(DOCUMENT_SEPARATOR.len() + line.len());
        buf.push_str(DOCUMENT_SEPARATOR);
        buf.push_str(&line);
        file.write_all(buf.as_bytes())?;
        file.flush()?;
        if self.config.sync_writes {
            file.sync_data()?;
        }

        self.pending += 1;
        trace!(change = %line, pending = self.pending, "recorded change");
        Ok(())
    }

    /// Vacuum if the number of pending changes reached the threshold.
    ///
    /// `root` must already include the change that was just recorded.
    pub fn compact_if_due(&mut self, root: &Map) -> Result<bool> {
        let threshold = self.config.vacuum_threshold;
        if threshold == 0 || self.pending < threshold {
            return Ok(false);
        }
        self.vacuum(root)?;
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Compaction and teardown
    // ─────────────────────────────────────────────────────────────────────────

    /// Rewrite the journal as a single snapshot of `root`.
    pub fn vacuum(&mut self, root: &Map) -> Result<()> {
        if self.state == JournalState::Closed {
            return Err(StoreError::Closed);
        }
        debug!(path = %self.path.display(), pending = self.pending, "vacuuming journal");
        let written = self.rewrite(root)?;
        debug!(bytes = written, "journal vacuumed");
        Ok(())
    }

    /// Final vacuum, then release the file. Closing twice is a no-op.
    ///
    /// A journal that was never loaded is released without vacuuming, so a
    /// failed replay cannot overwrite the file with an empty tree.
    pub fn close(&mut self, root: &Map) -> Result<()> {
        if self.state == JournalState::Closed {
            return Ok(());
        }
        let result = if self.state == JournalState::Loaded {
            self.vacuum(root)
        } else {
            Ok(())
        };
        self.release();
        debug!(path = %self.path.display(), "closed journal");
        result
    }

    /// Like [`close`](Self::close), without logging and ignoring errors.
    ///
    /// Used during implicit teardown, when process-wide facilities may
    /// already be gone.
    pub fn close_quiet(&mut self, root: &Map) {
        if self.state == JournalState::Loaded {
            let _ = self.rewrite(root);
        }
        self.release();
    }

    /// Release the file handle without compacting.
    pub fn release(&mut self) {
        self.file = None;
        self.state = JournalState::Closed;
    }

    /// Replace the file with a snapshot of `root`. Returns the bytes written.
    fn rewrite(&mut self, root: &Map) -> Result<usize> {
        let snapshot = encode_snapshot(root).map_err(StoreError::Encoding)?;
        let tmp_path = temp_path(&self.path);

        if let Err(e) = write_synced(&tmp_path, snapshot.as_bytes()) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        // The append handle must not outlive the file it points to.
        self.file = None;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            self.file = Some(open_append(&self.path)?);
            return Err(e.into());
        }
        self.file = Some(open_append(&self.path)?);
        sync_parent_dir(&self.path)?;

        self.pending = 0;
        Ok(snapshot.len())
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("journal"));
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => File::open(parent)?.sync_all(),
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docjournal_core::{Path as TreePath, Selector, Value};
    use tempfile::TempDir;

    fn journal_with(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.state");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    fn set(key: &str, value: impl Into<Value>) -> Change {
        Change::Set {
            path: TreePath::root(),
            key: Selector::Key(key.into()),
            value: value.into(),
        }
    }

    #[test]
    fn test_open_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/test.state");
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        assert!(path.exists());
        assert_eq!(journal.state(), JournalState::Created);
        assert!(journal.load().unwrap().is_empty());
        assert_eq!(journal.state(), JournalState::Loaded);
    }

    #[test]
    fn test_record_appends_documents() {
        let (_dir, path) = journal_with("a: a\nb: b\nc: c");
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        let mut root = journal.load().unwrap();

        let change = set("a", "AA");
        journal.record(&change).unwrap();
        tree::apply(&mut root, change).unwrap();

        let change = Change::Delete {
            path: TreePath::root(),
            key: Selector::Key("b".into()),
        };
        journal.record(&change).unwrap();
        tree::apply(&mut root, change).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "a: a\nb: b\nc: c\n---\n[\"set\",[],\"a\",\"AA\"]\n---\n[\"delete\",[],\"b\"]"
        );
        assert_eq!(journal.pending_changes(), 2);

        let mut reopened = Journal::open(&path, JournalConfig::default()).unwrap();
        assert_eq!(reopened.load().unwrap(), root);
    }

    #[test]
    fn test_file_size_tracks_appends() {
        let (_dir, path) = journal_with("a: 1\n");
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        assert_eq!(journal.file_size().unwrap(), 5);

        journal.load().unwrap();
        journal.record(&set("b", 2)).unwrap();
        let expected = fs::read_to_string(&path).unwrap().len() as u64;
        assert_eq!(journal.file_size().unwrap(), expected);
        assert!(expected > 5);

        journal.vacuum(&[("a", 1), ("b", 2)].into_iter().collect()).unwrap();
        assert_eq!(journal.file_size().unwrap(), 10);
    }

    #[test]
    fn test_record_suppressed_while_loading() {
        let (_dir, path) = journal_with("a: 1\n");
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        journal.state = JournalState::Loading;
        journal.record(&set("b", 2)).unwrap();
        assert_eq!(journal.pending_changes(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a: 1\n");
    }

    #[test]
    fn test_vacuum_writes_single_snapshot() {
        let (_dir, path) = journal_with("b: 1\n---\n[\"set\",[],\"a\",2]\n");
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        let root = journal.load().unwrap();
        journal.vacuum(&root).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a: 2\nb: 1\n");
        assert!(!temp_path(&path).exists());
        assert_eq!(journal.pending_changes(), 0);

        journal.record(&set("c", 3)).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "a: 2\nb: 1\n\n---\n[\"set\",[],\"c\",3]"
        );
    }

    #[test]
    fn test_compact_if_due() {
        let (_dir, path) = journal_with("");
        let config = JournalConfig::default().vacuum_threshold(3);
        let mut journal = Journal::open(&path, config).unwrap();
        let mut root = journal.load().unwrap();

        for i in 0..3 {
            let change = set(&format!("k{}", i), i);
            journal.record(&change).unwrap();
            tree::apply(&mut root, change).unwrap();
            let vacuumed = journal.compact_if_due(&root).unwrap();
            assert_eq!(vacuumed, i == 2);
        }

        assert_eq!(journal.pending_changes(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "k0: 0\nk1: 1\nk2: 2\n");
    }

    #[test]
    fn test_zero_threshold_never_compacts() {
        let (_dir, path) = journal_with("");
        let config = JournalConfig::default().vacuum_threshold(0);
        let mut journal = Journal::open(&path, config).unwrap();
        let root = journal.load().unwrap();
        journal.record(&set("a", 1)).unwrap();
        assert!(!journal.compact_if_due(&root).unwrap());
    }

    #[test]
    fn test_corrupt_document_reports_position() {
        let (_dir, path) = journal_with("a: 1\n---\n[\"set\",[],\"b\",2]\n---\n[\"delete\",[\"nope\"],\"x\"]\n");
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        match journal.load() {
            Err(StoreError::Corrupt { document, source }) => {
                assert_eq!(document, 2);
                assert!(matches!(source, CoreError::UnresolvedPath(_)));
            }
            other => panic!("expected corrupt journal, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_op_is_corrupt() {
        let (_dir, path) = journal_with("a: 1\n---\n[\"frobnicate\",[],\"a\"]\n");
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        match journal.load() {
            Err(StoreError::Corrupt { source, .. }) => {
                assert!(matches!(source, CoreError::UnknownOp(_)));
            }
            other => panic!("expected corrupt journal, got {:?}", other),
        }
    }

    #[test]
    fn test_scalar_document_is_corrupt() {
        let (_dir, path) = journal_with("a: 1\n---\n42\n");
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        assert!(journal.load().unwrap_err().is_corrupt());
    }

    #[test]
    fn test_close_without_load_keeps_file() {
        let contents = "a: 1\n---\n[\"delete\",[],\"missing\"]\n";
        let (_dir, path) = journal_with(contents);
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        assert!(journal.load().is_err());
        journal.close(&Map::new()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn test_close_is_idempotent() {
        let (_dir, path) = journal_with("a: 1\n---\n[\"set\",[],\"a\",2]\n");
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        let root = journal.load().unwrap();
        journal.close(&root).unwrap();
        journal.close(&root).unwrap();
        assert!(journal.is_closed());
        assert_eq!(fs::read_to_string(&path).unwrap(), "a: 2\n");
        assert!(matches!(journal.record(&set("b", 1)), Err(StoreError::Closed)));
        assert!(matches!(journal.vacuum(&root), Err(StoreError::Closed)));
    }

    #[test]
    fn test_close_quiet_compacts() {
        let (_dir, path) = journal_with("a: 1\n---\n[\"set\",[],\"a\",2]\n");
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        let root = journal.load().unwrap();
        journal.close_quiet(&root);
        assert!(journal.is_closed());
        assert_eq!(fs::read_to_string(&path).unwrap(), "a: 2\n");
    }

    #[test]
    fn test_release_skips_compaction() {
        let contents = "a: 1\n---\n[\"set\",[],\"a\",2]\n";
        let (_dir, path) = journal_with(contents);
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        journal.load().unwrap();
        journal.release();
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn test_non_finite_value_not_recorded() {
        let (_dir, path) = journal_with("");
        let mut journal = Journal::open(&path, JournalConfig::default()).unwrap();
        journal.load().unwrap();
        let result = journal.record(&set("x", f64::NAN));
        assert!(matches!(result, Err(StoreError::Encoding(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(journal.pending_changes(), 0);
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("/tmp/x/test.state")),
            PathBuf::from("/tmp/x/test.state.tmp")
        );
    }
}
