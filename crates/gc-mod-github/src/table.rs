//! Layout of the remote activity log.
//!
//! The document is a preamble followed by a markdown table. Locating the
//! table is a two-stage parse: find the header row by its exact cells, check
//! the next line is a separator, then take the contiguous `|` lines after it
//! as the data-row region. Rows are only ever appended after that region.

use gc_base::ChangeBatch;

pub const LOG_PREAMBLE: &str = "# GitClock Activity Log\n\n\
This file is maintained by gitclock. Each row is an uncommitted change observed \
in the tracked working tree, with added and removed line counts where git could \
measure them.\n\n";

pub const HEADER_CELLS: [&str; 3] = ["Time (UTC)", "Files Modified", "Changes (Addition/Deletion)"];

pub const TABLE_HEADER: &str = "| Time (UTC) | Files Modified | Changes (Addition/Deletion) |";

pub const TABLE_SEPARATOR: &str = "| --- | --- | --- |";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where the table sits inside an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLocation {
    /// Header and separator found. `insert_at` is the byte offset just past
    /// the last data row (or the separator when there are no rows).
    Found { insert_at: usize, rows: usize },
    /// No recognizable header+separator pair
    Missing,
}

/// Render one row per record, all sharing the batch capture time.
pub fn render_rows(batch: &ChangeBatch) -> String {
    let time = batch.captured_at().format(TIME_FORMAT).to_string();
    batch
        .records()
        .iter()
        .map(|r| format!("| {} | {} | {} |\n", time, escape_cell(r.path()), r.delta()))
        .collect()
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn table_block(rows: &str) -> String {
    format!("{}\n{}\n{}", TABLE_HEADER, TABLE_SEPARATOR, rows)
}

/// A fresh document holding only `rows`.
pub fn new_document(rows: &str) -> String {
    format!("{}{}", LOG_PREAMBLE, table_block(rows))
}

/// Split a markdown table line into trimmed cells.
fn cells(line: &str) -> Option<Vec<&str>> {
    let inner = line.trim().strip_prefix('|')?.strip_suffix('|')?;
    Some(inner.split('|').map(str::trim).collect())
}

fn is_header(line: &str) -> bool {
    cells(line).is_some_and(|c| c == HEADER_CELLS)
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('|')
        && line.contains('-')
        && line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

fn is_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// Find the table in `body`.
pub fn locate(body: &str) -> TableLocation {
    let lines: Vec<(usize, &str)> = body
        .split_inclusive('\n')
        .scan(0usize, |offset, line| {
            let start = *offset;
            *offset += line.len();
            Some((start, line))
        })
        .collect();

    for (i, (_, line)) in lines.iter().enumerate() {
        if !is_header(line) {
            continue;
        }
        let Some((sep_start, sep)) = lines.get(i + 1) else {
            continue;
        };
        if !is_separator(sep) {
            continue;
        }

        let mut insert_at = sep_start + sep.len();
        let mut rows = 0;
        for (start, row) in &lines[i + 2..] {
            if !is_row(row) {
                break;
            }
            insert_at = start + row.len();
            rows += 1;
        }
        return TableLocation::Found { insert_at, rows };
    }
    TableLocation::Missing
}

/// Append `rows` to `body`, inside the existing table when there is one,
/// else as a new table after everything already present. A blank body is
/// replaced by a fresh document.
pub fn append_rows(body: &str, rows: &str) -> (String, TableLocation) {
    if body.trim().is_empty() {
        return (new_document(rows), TableLocation::Missing);
    }
    let location = locate(body);
    let mut out = String::with_capacity(body.len() + rows.len() + TABLE_HEADER.len() * 2);

    match location {
        TableLocation::Found { insert_at, .. } => {
            let (before, after) = body.split_at(insert_at);
            out.push_str(before);
            if !before.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(rows);
            out.push_str(after);
        }
        TableLocation::Missing => {
            out.push_str(body);
            if !body.ends_with('\n') {
                out.push('\n');
            }
            if !body.ends_with("\n\n") {
                out.push('\n');
            }
            out.push_str(&table_block(rows));
        }
    }
    (out, location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gc_base::{ChangeRecord, LineDelta};

    fn batch(paths: &[&str]) -> ChangeBatch {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap();
        ChangeBatch::build_at(paths.iter().map(|p| ChangeRecord::added(*p)), at).unwrap()
    }

    #[test]
    fn rows_share_capture_time() {
        let rows = render_rows(&batch(&["a.txt", "b.txt"]));
        assert_eq!(rows, "| 2026-10-16 08:30:00 | a.txt | +0 / -0 |\n| 2026-10-16 08:30:00 | b.txt | +0 / -0 |\n");
    }

    #[test]
    fn unknown_delta_rendered_explicitly() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let b = ChangeBatch::build_at(vec![ChangeRecord::modified("img.png", LineDelta::Unknown)], at).unwrap();
        assert_eq!(render_rows(&b), "| 2026-01-02 03:04:05 | img.png | unknown |\n");
    }

    #[test]
    fn pipes_in_paths_escaped() {
        let rows = render_rows(&batch(&["a|b.txt"]));
        assert!(rows.contains("| a\\|b.txt |"));
    }

    #[test]
    fn new_document_is_recognized() {
        let doc = new_document(&render_rows(&batch(&["a.txt"])));
        assert!(doc.starts_with(LOG_PREAMBLE));
        assert_eq!(locate(&doc), TableLocation::Found { insert_at: doc.len(), rows: 1 });
    }

    #[test]
    fn empty_table_found() {
        let doc = format!("intro\n{}\n{}\n", TABLE_HEADER, TABLE_SEPARATOR);
        assert_eq!(locate(&doc), TableLocation::Found { insert_at: doc.len(), rows: 0 });
    }

    #[test]
    fn header_spacing_is_tolerated() {
        let doc = "|Time (UTC)|Files Modified|Changes (Addition/Deletion)|\n|:--|:--:|--:|\n| t | p | c |\n";
        assert_eq!(locate(doc), TableLocation::Found { insert_at: doc.len(), rows: 1 });
    }

    #[test]
    fn header_without_separator_is_missing() {
        let doc = format!("{}\nnot a separator\n", TABLE_HEADER);
        assert_eq!(locate(&doc), TableLocation::Missing);
    }

    #[test]
    fn other_tables_are_not_matched() {
        let doc = "| Name | Value |\n| --- | --- |\n| x | 1 |\n";
        assert_eq!(locate(doc), TableLocation::Missing);
    }

    #[test]
    fn rows_inserted_before_trailing_text() {
        let doc = format!("{}\n{}\n| t | a | +1 / -0 |\n\nFooter text.\n", TABLE_HEADER, TABLE_SEPARATOR);
        let (out, loc) = append_rows(&doc, "| t2 | b | +0 / -0 |\n");
        assert!(matches!(loc, TableLocation::Found { rows: 1, .. }));
        let expected = format!(
            "{}\n{}\n| t | a | +1 / -0 |\n| t2 | b | +0 / -0 |\n\nFooter text.\n",
            TABLE_HEADER, TABLE_SEPARATOR
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn last_row_without_newline() {
        let doc = format!("{}\n{}\n| t | a | +1 / -0 |", TABLE_HEADER, TABLE_SEPARATOR);
        let (out, _) = append_rows(&doc, "| t2 | b | +0 / -0 |\n");
        assert!(out.ends_with("| t | a | +1 / -0 |\n| t2 | b | +0 / -0 |\n"));
    }

    #[test]
    fn legacy_content_gets_table_appended() {
        let (out, loc) = append_rows("Hand written notes.", "| t | a | +0 / -0 |\n");
        assert_eq!(loc, TableLocation::Missing);
        assert_eq!(out, format!("Hand written notes.\n\n{}\n{}\n| t | a | +0 / -0 |\n", TABLE_HEADER, TABLE_SEPARATOR));
        assert!(matches!(locate(&out), TableLocation::Found { rows: 1, .. }));
    }

    #[test]
    fn blank_body_becomes_a_fresh_document() {
        for body in ["", "\n", "  \n\n"] {
            let (out, loc) = append_rows(body, "| t | a | +0 / -0 |\n");
            assert_eq!(loc, TableLocation::Missing);
            assert_eq!(out, new_document("| t | a | +0 / -0 |\n"));
            assert_eq!(out.matches(LOG_PREAMBLE).count(), 1);
        }
    }
}
