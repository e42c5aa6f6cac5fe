//! Journal configuration.

/// Number of recorded changes between automatic vacuums.
pub const DEFAULT_VACUUM_THRESHOLD: usize = 2000;

/// Configuration for a [`Journal`](crate::Journal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalConfig {
    /// Recorded changes between automatic vacuums.
    ///
    /// Larger values mean cheaper individual writes and a longer replay on
    /// the next open. Zero disables automatic vacuuming.
    pub vacuum_threshold: usize,
    /// Whether each appended record is fsynced, not only flushed to the OS.
    pub sync_writes: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            vacuum_threshold: DEFAULT_VACUUM_THRESHOLD,
            sync_writes: false,
        }
    }
}

impl JournalConfig {
    /// Set the automatic vacuum threshold.
    pub fn vacuum_threshold(mut self, threshold: usize) -> Self {
        self.vacuum_threshold = threshold;
        self
    }

    /// Enable or disable fsync after every append.
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }
}
