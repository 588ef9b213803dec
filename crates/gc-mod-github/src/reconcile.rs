//! RemoteLogReconciler: make the remote log read "prior content plus this batch".
//!
//! One read, then at most one write. A stale revision token is reported as
//! `Conflict` and is never retried here; the next tick re-reads and catches up.

use gc_base::ChangeBatch;
use thiserror::Error;
use tracing::debug;

use crate::content::{ContentApi, RemoteError};
use crate::table::{self, TableLocation};

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("remote log changed between read and write")]
    Conflict,

    #[error("remote log unreachable: {0}")]
    Transport(String),

    #[error("remote log is not valid UTF-8")]
    Undecodable,
}

impl From<RemoteError> for ReconcileError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Conflict => ReconcileError::Conflict,
            other => ReconcileError::Transport(other.to_string()),
        }
    }
}

/// What a successful reconciliation did to the remote document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Document was absent and has been created
    Created { rows: usize },
    /// Rows appended to the existing table, which held `previous_rows`
    Appended { rows: usize, previous_rows: usize },
    /// Document had no recognizable table; a new one was added at the end
    TableAdded { rows: usize },
}

impl ReconcileOutcome {
    pub fn rows(&self) -> usize {
        match *self {
            ReconcileOutcome::Created { rows }
            | ReconcileOutcome::Appended { rows, .. }
            | ReconcileOutcome::TableAdded { rows } => rows,
        }
    }
}

pub struct RemoteLogReconciler<A> {
    api: A,
    path: String,
}

impl<A: ContentApi> RemoteLogReconciler<A> {
    pub fn new(api: A, path: impl Into<String>) -> Self {
        Self { api, path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn reconcile(&self, batch: &ChangeBatch) -> Result<ReconcileOutcome, ReconcileError> {
        let rows = table::render_rows(batch);
        let count = batch.len();
        let message = format!(
            "gitclock: record {} change{} at {}",
            count,
            if count == 1 { "" } else { "s" },
            batch.captured_at().format("%Y-%m-%d %H:%M:%S UTC")
        );

        let Some(existing) = self.api.read_file(&self.path)? else {
            debug!(path = %self.path, "remote log absent, creating");
            let doc = table::new_document(&rows);
            self.api.create_file(&self.path, doc.as_bytes(), &message)?;
            return Ok(ReconcileOutcome::Created { rows: count });
        };

        let body = String::from_utf8(existing.content).map_err(|_| ReconcileError::Undecodable)?;
        let (doc, location) = table::append_rows(&body, &rows);
        self.api.update_file(&self.path, doc.as_bytes(), &existing.sha, &message)?;

        Ok(match location {
            TableLocation::Found { rows: previous_rows, .. } => {
                ReconcileOutcome::Appended { rows: count, previous_rows }
            }
            TableLocation::Missing => {
                debug!(path = %self.path, "no activity table found, appended a new one");
                ReconcileOutcome::TableAdded { rows: count }
            }
        })
    }
}
