use thiserror::Error;

/// One `(status-code, path)` pair from a short-status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Two-character porcelain code, e.g. `??`, ` M`, `R `
    pub code: String,
    pub path: String,
}

impl StatusEntry {
    pub fn new(code: impl Into<String>, path: impl Into<String>) -> Self {
        Self { code: code.into(), path: path.into() }
    }
}

/// The short-status query could not be answered; the tree is treated as clean
/// for the current tick.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("git could not be started: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("git status failed ({code}): {stderr}")]
    Failed { code: String, stderr: String },
}
