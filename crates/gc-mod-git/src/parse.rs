use gc_base::{Classification, LineDelta};

use crate::types::StatusEntry;

/// Parse `git status --porcelain` output into ordered `(code, path)` pairs.
/// Blank lines are skipped. Rename/copy entries keep only the new path.
pub fn parse_short_status(stdout: &str) -> Vec<StatusEntry> {
    stdout.lines().filter(|l| !l.trim().is_empty()).filter_map(parse_status_line).collect()
}

fn parse_status_line(line: &str) -> Option<StatusEntry> {
    // Porcelain v1: two code columns, one space, then the path
    let (code, rest) = if line.len() > 3 && line.is_char_boundary(2) && line.as_bytes()[2] == b' ' {
        (&line[..2], &line[3..])
    } else {
        let mut tokens = line.split_whitespace();
        let code = tokens.next()?;
        let rest = line.trim_start()[code.len()..].trim_start();
        (code, rest)
    };

    let path = match rest.split_once(" -> ") {
        Some((_, new)) if code.contains('R') || code.contains('C') => new,
        _ => rest,
    };
    let path = unquote(path.trim_end());
    if path.is_empty() {
        return None;
    }
    Some(StatusEntry::new(code, path))
}

fn unquote(path: &str) -> String {
    path.strip_prefix('"').and_then(|p| p.strip_suffix('"')).unwrap_or(path).replace("\\\"", "\"")
}

/// Map a porcelain status code to a classification.
pub fn classify(code: &str) -> Classification {
    let code = code.trim();
    if code == "??" {
        Classification::Added
    } else if !code.is_empty() && code.chars().all(|c| c == 'M') {
        Classification::Modified
    } else {
        Classification::Other
    }
}

/// Parse `git diff --numstat` output for a single path.
/// Binary files (`-\t-\tpath`) and empty output have no measurable delta.
pub fn parse_numstat(stdout: &str) -> LineDelta {
    let Some(line) = stdout.lines().find(|l| !l.trim().is_empty()) else {
        return LineDelta::Unknown;
    };
    let mut parts = line.split('\t');
    match (parts.next().map(str::parse::<u64>), parts.next().map(str::parse::<u64>)) {
        (Some(Ok(additions)), Some(Ok(deletions))) => LineDelta::Measured { additions, deletions },
        _ => LineDelta::Unknown,
    }
}
