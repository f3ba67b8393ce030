//! Accessor-facing write operations.
//!
//! Each operation is one read-decide-stage-flush step: the occupancy check
//! and its write happen inside the same call, with no yield in between,
//! and the staged round is flushed before the call returns.

use sheetpilot_core::{CellAddress, CellFormat, CellValue, Region};
use sheetpilot_grid::GridHost;

use crate::error::PlacementError;

/// Resolved location for a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub sheet: usize,
    pub origin: CellAddress,
    /// Only ever true after the user typed the confirmation phrase bound
    /// to this address (or for paths specified as unconditional, like A1).
    pub overwrite: bool,
}

/// Outcome of an occupancy-checked write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Target already holds a value and `overwrite` was not set. This is a
    /// protocol branch, not a failure: the caller prompts for confirmation.
    Collision,
}

/// Write a single value, pre-checking occupancy unless the destination
/// carries explicit overwrite intent.
pub fn write_single_value(
    host: &mut dyn GridHost,
    dest: Destination,
    value: CellValue,
) -> Result<WriteOutcome, PlacementError> {
    if !dest.overwrite {
        let current = host.read_region(dest.sheet, Region::cell(dest.origin))?;
        let occupied = current
            .values
            .first()
            .and_then(|row| row.first())
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        if occupied {
            return Ok(WriteOutcome::Collision);
        }
    }
    host.stage_write(dest.sheet, dest.origin, vec![vec![value]])?;
    host.flush()?;
    Ok(WriteOutcome::Written)
}

/// Write a header row (bold) and data rows below it, as one round.
pub fn write_table(
    host: &mut dyn GridHost,
    sheet: usize,
    origin: CellAddress,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<(), PlacementError> {
    let mut grid: Vec<Vec<CellValue>> = Vec::with_capacity(rows.len() + 1);
    grid.push(headers.iter().map(|h| CellValue::text(h.as_str())).collect());
    for row in rows {
        grid.push(row.iter().map(|v| CellValue::from_input(v)).collect());
    }
    host.stage_write(sheet, origin, grid)?;
    host.stage_format(sheet, Region::new(origin, 1, headers.len()), CellFormat::header())?;
    host.flush()?;
    Ok(())
}

/// Append a note to a results sheet: column A, directly below the used
/// region. Results sheets are append-only, so there is no occupancy check.
pub fn append_result_note(
    host: &mut dyn GridHost,
    sheet: usize,
    text: &str,
) -> Result<CellAddress, PlacementError> {
    let row = host.used_row_count(sheet)?;
    let addr = CellAddress::new(row, 0);
    host.stage_write(sheet, addr, vec![vec![CellValue::text(text)]])?;
    host.flush()?;
    Ok(addr)
}
