use std::path::PathBuf;
use std::process::Command;

use gc_base::process::run_with_timeout;
use gc_base::{ChangeRecord, Classification, LineDelta};
use tracing::{debug, warn};

use crate::parse::{classify, parse_numstat, parse_short_status};
use crate::types::{ScanError, StatusEntry};

/// The two queries the scanner needs from a version-control tool.
pub trait VersionControl {
    /// Ordered `(code, path)` pairs for every touched path.
    fn short_status(&self) -> Result<Vec<StatusEntry>, ScanError>;
    /// Added/removed line counts for one path, or `Unknown`.
    fn numstat(&self, path: &str) -> LineDelta;
}

/// `git` CLI bound to one working tree.
pub struct GitCli {
    root: PathBuf,
    timeout_secs: u64,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self { root: root.into(), timeout_secs }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(&self.root)
            .args(["-c", "core.quotepath=off"])
            .env("GIT_OPTIONAL_LOCKS", "0");
        cmd
    }
}

impl VersionControl for GitCli {
    fn short_status(&self) -> Result<Vec<StatusEntry>, ScanError> {
        let mut cmd = self.command();
        cmd.args(["status", "--porcelain=v1", "--untracked-files=all"]);
        let output = run_with_timeout(cmd, self.timeout_secs)?;

        if !output.status.success() {
            return Err(ScanError::Failed {
                code: output.status.code().map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(parse_short_status(&String::from_utf8_lossy(&output.stdout)))
    }

    fn numstat(&self, path: &str) -> LineDelta {
        // Status paths are repository-relative; anchor the pathspec at the top.
        let mut cmd = self.command();
        cmd.args(["diff", "--numstat", "HEAD", "--"]).arg(format!(":(top,literal){}", path));
        match run_with_timeout(cmd, self.timeout_secs) {
            Ok(output) if output.status.success() => parse_numstat(&String::from_utf8_lossy(&output.stdout)),
            Ok(output) => {
                debug!(path, stderr = %String::from_utf8_lossy(&output.stderr).trim(), "numstat failed");
                LineDelta::Unknown
            }
            Err(e) => {
                debug!(path, error = %e, "numstat failed");
                LineDelta::Unknown
            }
        }
    }
}

/// Produces the change records for the current working-tree state.
pub struct WorkingTreeScanner<V> {
    vcs: V,
}

impl<V: VersionControl> WorkingTreeScanner<V> {
    pub fn new(vcs: V) -> Self {
        Self { vcs }
    }

    /// Scan the tree. A failed status query is logged and reported as a
    /// clean tree so the caller's next tick is unaffected.
    pub fn scan(&self) -> Scan<'_, V> {
        match self.try_scan() {
            Ok(scan) => scan,
            Err(e) => {
                warn!(error = %e, "working tree unavailable, treating as clean");
                Scan { vcs: &self.vcs, entries: Vec::new().into_iter() }
            }
        }
    }

    pub fn try_scan(&self) -> Result<Scan<'_, V>, ScanError> {
        let entries = self.vcs.short_status()?;
        Ok(Scan { vcs: &self.vcs, entries: entries.into_iter() })
    }
}

/// Lazy record sequence; diff queries run as records are pulled.
pub struct Scan<'a, V> {
    vcs: &'a V,
    entries: std::vec::IntoIter<StatusEntry>,
}

impl<V: VersionControl> Iterator for Scan<'_, V> {
    type Item = ChangeRecord;

    fn next(&mut self) -> Option<ChangeRecord> {
        let entry = self.entries.next()?;
        Some(match classify(&entry.code) {
            Classification::Added => ChangeRecord::added(entry.path),
            Classification::Modified => {
                let delta = self.vcs.numstat(&entry.path);
                ChangeRecord::modified(entry.path, delta)
            }
            Classification::Other => ChangeRecord::other(entry.path),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}
