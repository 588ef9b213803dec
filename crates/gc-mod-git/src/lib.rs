//! WorkingTreeScanner: turns `git status` output into per-path change records.

mod parse;
mod scanner;
pub mod types;

pub use parse::{classify, parse_numstat, parse_short_status};
pub use scanner::{GitCli, Scan, VersionControl, WorkingTreeScanner};
pub use types::{ScanError, StatusEntry};
