//! The spreadsheet accessor seam.
//!
//! `GridHost` is the contract the placement engine holds against whatever
//! document host it runs inside. Operations are batched the way remote
//! spreadsheet APIs batch them:
//!
//! - writes are *staged* with `stage_write`/`stage_format` and become
//!   durable only when `flush` succeeds — reads never observe staged,
//!   unflushed writes;
//! - reads are materialized on return;
//! - a zero-row used region is a valid "sheet is empty" outcome, not an
//!   error.
//!
//! Staged writes overwrite silently. Callers own occupancy checks.

use serde::{Deserialize, Serialize};
use sheetpilot_core::{CellAddress, CellFormat, CellValue, Region};

/// Handle for a floating image inserted into a sheet.
pub type ImageId = u64;

/// Error type for host operations.
#[derive(Debug)]
pub enum GridError {
    /// Named or indexed sheet does not exist
    NoSuchSheet(String),
    /// Sheet creation collided with an existing name
    DuplicateSheet(String),
    /// Image handle is stale or unknown
    NoSuchImage(ImageId),
    /// Active-cell geometry is unavailable on this host
    GeometryUnavailable,
    /// Transport or host-side failure
    Host(String),
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::NoSuchSheet(name) => write!(f, "No such sheet: {}", name),
            GridError::DuplicateSheet(name) => write!(f, "Sheet already exists: {}", name),
            GridError::NoSuchImage(id) => write!(f, "No such image: {}", id),
            GridError::GeometryUnavailable => write!(f, "Active cell geometry unavailable"),
            GridError::Host(msg) => write!(f, "Host error: {}", msg),
        }
    }
}

impl std::error::Error for GridError {}

/// Materialized contents of a read round.
///
/// `values` is a dense `row_count` x `col_count` grid; empty sheets come
/// back as `row_count == 0` with no rows.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegionData {
    pub values: Vec<Vec<CellValue>>,
    pub row_count: usize,
    pub col_count: usize,
}

impl RegionData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

/// Pixel geometry of a cell, relative to the sheet origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// How a floating image is anchored to the grid underneath it.
///
/// Hosts differ in what they support; callers probe with
/// `GridHost::supports_placement` in preference order rather than trying
/// and catching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePlacement {
    /// Image moves and resizes with the cells under it
    MoveAndSizeWithCells,
    /// Image keeps an absolute pixel position
    Absolute,
}

/// The spreadsheet accessor contract.
///
/// Sheets are addressed by zero-based index; `sheet_index` resolves names.
pub trait GridHost {
    fn list_sheet_names(&self) -> Result<Vec<String>, GridError>;
    fn sheet_index(&self, name: &str) -> Option<usize>;
    fn active_sheet(&self) -> usize;
    fn create_sheet(&mut self, name: &str) -> Result<usize, GridError>;

    /// Read the used region as a dense grid anchored at A1: row and column
    /// counts are the maximum used index plus one, so content starting
    /// below row 0 arrives with its leading all-empty rows included and
    /// row 0 of the result is always absolute row 0 of the sheet.
    fn read_used_region(&self, sheet: usize) -> Result<RegionData, GridError>;
    fn read_region(&self, sheet: usize, region: Region) -> Result<RegionData, GridError>;
    fn used_row_count(&self, sheet: usize) -> Result<usize, GridError>;

    /// Stage a rectangular write anchored at `origin`. Not durable until
    /// `flush` succeeds.
    fn stage_write(
        &mut self,
        sheet: usize,
        origin: CellAddress,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<(), GridError>;
    fn stage_format(
        &mut self,
        sheet: usize,
        region: Region,
        format: CellFormat,
    ) -> Result<(), GridError>;

    /// Commit every staged operation. The staged round is consumed whether
    /// or not the flush succeeds; a failed round is lost, not retried.
    fn flush(&mut self) -> Result<(), GridError>;

    fn insert_image(&mut self, sheet: usize, bytes: &[u8]) -> Result<ImageId, GridError>;
    fn set_image_size(&mut self, image: ImageId, width: f32, height: f32)
        -> Result<(), GridError>;
    fn set_image_position(&mut self, image: ImageId, left: f32, top: f32)
        -> Result<(), GridError>;
    fn set_image_name(&mut self, image: ImageId, name: &str) -> Result<(), GridError>;
    fn set_image_placement(
        &mut self,
        image: ImageId,
        placement: ImagePlacement,
    ) -> Result<(), GridError>;

    /// The image's footprint as the host materialized it, which may differ
    /// from the size last requested.
    fn image_footprint(&self, image: ImageId) -> Result<(f32, f32), GridError>;

    fn active_cell_geometry(&self) -> Result<CellGeometry, GridError>;
    fn supports_placement(&self, placement: ImagePlacement) -> bool;
}
