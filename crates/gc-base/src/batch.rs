//! Per-tick change records and the batch they are folded into.
//!
//! A `ChangeRecord` is built from one short-status line; a `ChangeBatch`
//! groups every record of one polling tick under a single capture time.

use std::fmt;

use chrono::{DateTime, Utc};

/// How the version-control tool reported a touched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Untracked, newly introduced file
    Added,
    /// Tracked file whose content changed
    Modified,
    /// Any other status code (renamed, deleted, conflicted, staged-new...)
    Other,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Added => "added",
            Classification::Modified => "modified",
            Classification::Other => "other",
        }
    }
}

/// Added/removed line counts for one path.
///
/// `Unknown` means the counts could not be measured (binary file, path
/// reverted between status and diff, diff failed). It is never the same
/// thing as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDelta {
    Measured { additions: u64, deletions: u64 },
    Unknown,
}

impl LineDelta {
    pub const ZERO: LineDelta = LineDelta::Measured { additions: 0, deletions: 0 };

    pub fn is_unknown(&self) -> bool {
        matches!(self, LineDelta::Unknown)
    }
}

impl fmt::Display for LineDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineDelta::Measured { additions, deletions } => write!(f, "+{} / -{}", additions, deletions),
            LineDelta::Unknown => write!(f, "unknown"),
        }
    }
}

/// One touched path observed in a single tick.
///
/// Only `Modified` records carry a measured (or unknown) delta; `Added` and
/// `Other` records are always zero by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    path: String,
    classification: Classification,
    delta: LineDelta,
}

impl ChangeRecord {
    pub fn added(path: impl Into<String>) -> Self {
        Self { path: path.into(), classification: Classification::Added, delta: LineDelta::ZERO }
    }

    pub fn modified(path: impl Into<String>, delta: LineDelta) -> Self {
        Self { path: path.into(), classification: Classification::Modified, delta }
    }

    pub fn other(path: impl Into<String>) -> Self {
        Self { path: path.into(), classification: Classification::Other, delta: LineDelta::ZERO }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn delta(&self) -> LineDelta {
        self.delta
    }
}

/// One tick's worth of change records sharing one capture timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    captured_at: DateTime<Utc>,
    records: Vec<ChangeRecord>,
}

impl ChangeBatch {
    /// Stamp the current time on `records`. Returns `None` when there is
    /// nothing to report.
    pub fn build(records: impl IntoIterator<Item = ChangeRecord>) -> Option<Self> {
        Self::build_at(records, Utc::now())
    }

    /// Same as [`ChangeBatch::build`] with an explicit capture time.
    pub fn build_at(records: impl IntoIterator<Item = ChangeRecord>, captured_at: DateTime<Utc>) -> Option<Self> {
        let records: Vec<ChangeRecord> = records.into_iter().collect();
        if records.is_empty() {
            return None;
        }
        Some(Self { captured_at, records })
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; an empty batch cannot be built.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
