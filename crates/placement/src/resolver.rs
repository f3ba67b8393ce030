//! Placement resolver: pure destination logic.
//!
//! Every function here works on a snapshot of a sheet's used region
//! (`&[Vec<CellValue>]`, row 0 first) and computes *where* a write would
//! land. Nothing in this module touches a host.
//!
//! Two different note-to-value rules live here and must stay different:
//! single-cell placement extracts the first numeric token from the note
//! (`extract_cell_value`), while the results-sheet append always writes the
//! cleaned full text (`clean_note_text`).

use std::sync::OnceLock;

use regex::Regex;
use sheetpilot_core::{CellAddress, CellValue};

/// Prefix for auto-named results sheets.
pub const RESULTS_SHEET_PREFIX: &str = "AI_Results_";

/// A column match from `find_column_cell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnHit {
    /// Destination cell: two rows past the last filled row of the column
    pub addr: CellAddress,
    /// Whether that destination cell already holds a value
    pub occupied: bool,
}

fn cell_text_contains(cell: &CellValue, needle: &str) -> bool {
    !cell.is_empty() && cell.to_display().to_lowercase().contains(needle)
}

/// Find the destination cell under the column whose header contains `hint`
/// (case-insensitive substring match against row 0).
///
/// The column scan is last-non-empty-wins over every row below the header:
/// a gap does not stop the scan. The destination row is two past the last
/// filled row, leaving one blank separator row.
pub fn find_column_cell(hint: &str, contents: &[Vec<CellValue>]) -> Option<ColumnHit> {
    let header = contents.first()?;
    let needle = hint.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let col = header.iter().position(|cell| cell_text_contains(cell, &needle))?;

    let mut last_filled = 0; // the header row itself
    for (row, cells) in contents.iter().enumerate().skip(1) {
        if cells.get(col).map(|v| !v.is_empty()).unwrap_or(false) {
            last_filled = row;
        }
    }

    let addr = CellAddress::new(last_filled + 2, col);
    // Structural occupancy, unlike `CellValue::is_empty`: any stored value
    // blocks the destination, even whitespace-only text the fill scan
    // above does not count as filled.
    let occupied = contents
        .get(addr.row)
        .and_then(|row| row.get(col))
        .map(|v| !matches!(v, CellValue::Empty))
        .unwrap_or(false);
    Some(ColumnHit { addr, occupied })
}

/// Next unused results-sheet name: `AI_Results_<n>` where `<n>` is one past
/// the highest numeric suffix among live sheet names with the prefix.
/// Callers must pass freshly listed names; the sequence is never cached.
pub fn next_results_sheet_name(names: &[String]) -> String {
    let mut max = 0u32;
    for name in names {
        if let Some(suffix) = name.strip_prefix(RESULTS_SHEET_PREFIX) {
            if let Ok(n) = suffix.parse::<u32>() {
                max = max.max(n);
            }
        }
    }
    format!("{}{}", RESULTS_SHEET_PREFIX, max + 1)
}

/// The lexicographically-last existing results sheet, if any.
pub fn last_results_sheet(names: &[String]) -> Option<String> {
    names
        .iter()
        .filter(|n| n.starts_with(RESULTS_SHEET_PREFIX))
        .max()
        .cloned()
}

/// Start cell for appending a table to the right of existing content.
///
/// Scans row 0 right to left and stops at the first non-empty cell, so
/// trailing empties are skipped but an interior gap is not treated
/// specially. An entirely empty row 0 yields column 0.
pub fn horizontal_append_destination(contents: &[Vec<CellValue>]) -> CellAddress {
    if let Some(header) = contents.first() {
        for (idx, cell) in header.iter().enumerate().rev() {
            if !cell.is_empty() {
                return CellAddress::new(0, idx + 1);
            }
        }
    }
    CellAddress::new(0, 0)
}

/// Rows for appending a table below existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerticalAppend {
    /// Row where the headers are (re)written
    pub header_row: usize,
    /// First data row
    pub data_row: usize,
}

/// Row 0 occupied: headers rewritten strictly below all existing rows.
/// Row 0 empty: headers at row 0, data from row 1.
pub fn vertical_append_destination(contents: &[Vec<CellValue>]) -> VerticalAppend {
    let header_present = contents
        .first()
        .map(|row| row.iter().any(|c| !c.is_empty()))
        .unwrap_or(false);
    if header_present {
        VerticalAppend { header_row: contents.len(), data_row: contents.len() + 1 }
    } else {
        VerticalAppend { header_row: 0, data_row: 1 }
    }
}

/// True when the used region has zero rows. Gates the "write only if truly
/// empty" strategy, which is distinct from vertical append.
pub fn empty_sheet_guard(contents: &[Vec<CellValue>]) -> bool {
    contents.is_empty()
}

fn number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-+]?\d+(?:\.\d+)?").unwrap())
}

/// Reduce a note to a single cell value for non-results-sheet placement:
/// the first signed decimal substring anywhere in the note becomes a
/// number; a note with no numeric token is written verbatim as text.
pub fn extract_cell_value(note: &str) -> CellValue {
    if let Some(m) = number_pattern().find(note) {
        if let Ok(n) = m.as_str().parse::<f64>() {
            return CellValue::Number(n);
        }
    }
    CellValue::Text(note.to_string())
}

/// Clean a note for the results-sheet append path: leading symbols
/// stripped, all whitespace runs (newlines included) collapsed to single
/// spaces. The full text is kept; no numeric extraction happens here.
pub fn clean_note_text(note: &str) -> String {
    let stripped = note.trim_start_matches(|c: char| !c.is_alphanumeric());
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
