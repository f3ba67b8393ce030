//! In-memory `GridHost` used by the CLI and by tests.
//!
//! Cells are stored sparsely per sheet; the used region is recomputed from
//! live cells on every read, never cached. Geometry is synthesized from
//! uniform default column widths and row heights. Test seams (`set_cell`,
//! `disable_geometry`, `fail_next_flush`, `limit_placements`) let tests
//! steer host behavior without a mock framework.

use std::collections::HashMap;

use sheetpilot_core::{CellAddress, CellFormat, CellValue, Region};

use crate::host::{
    CellGeometry, GridError, GridHost, ImageId, ImagePlacement, RegionData,
};

const DEFAULT_COL_WIDTH: f32 = 100.0;
const DEFAULT_ROW_HEIGHT: f32 = 20.0;

#[derive(Debug, Default)]
struct MemorySheet {
    name: String,
    cells: HashMap<(usize, usize), (CellValue, CellFormat)>,
}

impl MemorySheet {
    fn named(name: &str) -> Self {
        Self { name: name.to_string(), cells: HashMap::new() }
    }

    /// (rows, cols) of the used region.
    fn used_bounds(&self) -> (usize, usize) {
        let mut rows = 0;
        let mut cols = 0;
        for (&(r, c), (value, _)) in &self.cells {
            if value.is_empty() {
                continue;
            }
            rows = rows.max(r + 1);
            cols = cols.max(c + 1);
        }
        (rows, cols)
    }
}

/// A floating image record.
#[derive(Debug, Clone)]
pub struct FloatImage {
    pub id: ImageId,
    pub sheet: usize,
    pub name: String,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub placement: ImagePlacement,
}

#[derive(Debug)]
enum StagedOp {
    Write {
        sheet: usize,
        origin: CellAddress,
        rows: Vec<Vec<CellValue>>,
    },
    Format {
        sheet: usize,
        region: Region,
        format: CellFormat,
    },
}

pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
    active_sheet: usize,
    active_cell: CellAddress,
    images: Vec<FloatImage>,
    next_image_id: ImageId,
    staged: Vec<StagedOp>,
    geometry_available: bool,
    fail_next_flush: bool,
    placements: Vec<ImagePlacement>,
}

impl Default for MemoryWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self {
            sheets: vec![MemorySheet::named("Sheet1")],
            active_sheet: 0,
            active_cell: CellAddress::new(0, 0),
            images: Vec::new(),
            next_image_id: 1,
            staged: Vec::new(),
            geometry_available: true,
            fail_next_flush: false,
            placements: vec![
                ImagePlacement::MoveAndSizeWithCells,
                ImagePlacement::Absolute,
            ],
        }
    }

    fn sheet(&self, index: usize) -> Result<&MemorySheet, GridError> {
        self.sheets
            .get(index)
            .ok_or_else(|| GridError::NoSuchSheet(format!("#{}", index)))
    }

    fn sheet_mut(&mut self, index: usize) -> Result<&mut MemorySheet, GridError> {
        self.sheets
            .get_mut(index)
            .ok_or_else(|| GridError::NoSuchSheet(format!("#{}", index)))
    }

    fn image(&self, id: ImageId) -> Result<&FloatImage, GridError> {
        self.images
            .iter()
            .find(|img| img.id == id)
            .ok_or(GridError::NoSuchImage(id))
    }

    fn image_mut(&mut self, id: ImageId) -> Result<&mut FloatImage, GridError> {
        self.images
            .iter_mut()
            .find(|img| img.id == id)
            .ok_or(GridError::NoSuchImage(id))
    }

    // ---- seeding and inspection (CLI + tests) ----

    /// Write a cell directly, bypassing the staging round. Seeding only.
    pub fn set_cell(&mut self, sheet: usize, row: usize, col: usize, value: CellValue) {
        if let Ok(s) = self.sheet_mut(sheet) {
            if value.is_empty() {
                s.cells.remove(&(row, col));
            } else {
                s.cells.insert((row, col), (value, CellFormat::default()));
            }
        }
    }

    pub fn cell(&self, sheet: usize, row: usize, col: usize) -> CellValue {
        self.sheets
            .get(sheet)
            .and_then(|s| s.cells.get(&(row, col)))
            .map(|(v, _)| v.clone())
            .unwrap_or(CellValue::Empty)
    }

    pub fn cell_format(&self, sheet: usize, row: usize, col: usize) -> CellFormat {
        self.sheets
            .get(sheet)
            .and_then(|s| s.cells.get(&(row, col)))
            .map(|(_, f)| *f)
            .unwrap_or_default()
    }

    pub fn set_active_sheet(&mut self, sheet: usize) {
        if sheet < self.sheets.len() {
            self.active_sheet = sheet;
        }
    }

    pub fn set_active_cell(&mut self, addr: CellAddress) {
        self.active_cell = addr;
    }

    pub fn images(&self) -> &[FloatImage] {
        &self.images
    }

    // ---- host behavior seams ----

    /// Make `active_cell_geometry` fail, as on hosts without a selection API.
    pub fn disable_geometry(&mut self) {
        self.geometry_available = false;
    }

    /// Make the next `flush` fail after consuming the staged round.
    pub fn fail_next_flush(&mut self) {
        self.fail_next_flush = true;
    }

    /// Restrict which image placement modes the host reports as supported.
    pub fn limit_placements(&mut self, placements: Vec<ImagePlacement>) {
        self.placements = placements;
    }
}

impl GridHost for MemoryWorkbook {
    fn list_sheet_names(&self) -> Result<Vec<String>, GridError> {
        Ok(self.sheets.iter().map(|s| s.name.clone()).collect())
    }

    fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    fn create_sheet(&mut self, name: &str) -> Result<usize, GridError> {
        if self.sheet_index(name).is_some() {
            return Err(GridError::DuplicateSheet(name.to_string()));
        }
        self.sheets.push(MemorySheet::named(name));
        Ok(self.sheets.len() - 1)
    }

    fn read_used_region(&self, sheet: usize) -> Result<RegionData, GridError> {
        let s = self.sheet(sheet)?;
        let (rows, cols) = s.used_bounds();
        if rows == 0 {
            return Ok(RegionData::empty());
        }
        let mut values = vec![vec![CellValue::Empty; cols]; rows];
        for (&(r, c), (value, _)) in &s.cells {
            if r < rows && c < cols {
                values[r][c] = value.clone();
            }
        }
        Ok(RegionData { values, row_count: rows, col_count: cols })
    }

    fn read_region(&self, sheet: usize, region: Region) -> Result<RegionData, GridError> {
        let s = self.sheet(sheet)?;
        let mut values = Vec::with_capacity(region.rows);
        for r in 0..region.rows {
            let mut row = Vec::with_capacity(region.cols);
            for c in 0..region.cols {
                let key = (region.origin.row + r, region.origin.col + c);
                row.push(s.cells.get(&key).map(|(v, _)| v.clone()).unwrap_or(CellValue::Empty));
            }
            values.push(row);
        }
        Ok(RegionData { values, row_count: region.rows, col_count: region.cols })
    }

    fn used_row_count(&self, sheet: usize) -> Result<usize, GridError> {
        Ok(self.sheet(sheet)?.used_bounds().0)
    }

    fn stage_write(
        &mut self,
        sheet: usize,
        origin: CellAddress,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<(), GridError> {
        self.sheet(sheet)?;
        self.staged.push(StagedOp::Write { sheet, origin, rows });
        Ok(())
    }

    fn stage_format(
        &mut self,
        sheet: usize,
        region: Region,
        format: CellFormat,
    ) -> Result<(), GridError> {
        self.sheet(sheet)?;
        self.staged.push(StagedOp::Format { sheet, region, format });
        Ok(())
    }

    fn flush(&mut self) -> Result<(), GridError> {
        let staged = std::mem::take(&mut self.staged);
        if self.fail_next_flush {
            self.fail_next_flush = false;
            return Err(GridError::Host("write round failed".to_string()));
        }
        for op in staged {
            match op {
                StagedOp::Write { sheet, origin, rows } => {
                    let s = self.sheet_mut(sheet)?;
                    for (dr, row) in rows.into_iter().enumerate() {
                        for (dc, value) in row.into_iter().enumerate() {
                            let key = (origin.row + dr, origin.col + dc);
                            if value.is_empty() {
                                s.cells.remove(&key);
                            } else {
                                let format = s
                                    .cells
                                    .get(&key)
                                    .map(|(_, f)| *f)
                                    .unwrap_or_default();
                                s.cells.insert(key, (value, format));
                            }
                        }
                    }
                }
                StagedOp::Format { sheet, region, format } => {
                    let s = self.sheet_mut(sheet)?;
                    for r in 0..region.rows {
                        for c in 0..region.cols {
                            let key = (region.origin.row + r, region.origin.col + c);
                            if let Some(entry) = s.cells.get_mut(&key) {
                                entry.1 = format;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn insert_image(&mut self, sheet: usize, bytes: &[u8]) -> Result<ImageId, GridError> {
        self.sheet(sheet)?;
        if bytes.is_empty() {
            return Err(GridError::Host("empty image payload".to_string()));
        }
        let id = self.next_image_id;
        self.next_image_id += 1;
        self.images.push(FloatImage {
            id,
            sheet,
            name: String::new(),
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            placement: ImagePlacement::Absolute,
        });
        Ok(id)
    }

    fn set_image_size(&mut self, image: ImageId, width: f32, height: f32)
        -> Result<(), GridError>
    {
        let img = self.image_mut(image)?;
        img.width = width;
        img.height = height;
        Ok(())
    }

    fn set_image_position(&mut self, image: ImageId, left: f32, top: f32)
        -> Result<(), GridError>
    {
        let img = self.image_mut(image)?;
        img.left = left;
        img.top = top;
        Ok(())
    }

    fn set_image_name(&mut self, image: ImageId, name: &str) -> Result<(), GridError> {
        self.image_mut(image)?.name = name.to_string();
        Ok(())
    }

    fn set_image_placement(
        &mut self,
        image: ImageId,
        placement: ImagePlacement,
    ) -> Result<(), GridError> {
        if !self.supports_placement(placement) {
            return Err(GridError::Host(format!("unsupported placement {:?}", placement)));
        }
        self.image_mut(image)?.placement = placement;
        Ok(())
    }

    fn image_footprint(&self, image: ImageId) -> Result<(f32, f32), GridError> {
        let img = self.image(image)?;
        Ok((img.width, img.height))
    }

    fn active_cell_geometry(&self) -> Result<CellGeometry, GridError> {
        if !self.geometry_available {
            return Err(GridError::GeometryUnavailable);
        }
        Ok(CellGeometry {
            left: self.active_cell.col as f32 * DEFAULT_COL_WIDTH,
            top: self.active_cell.row as f32 * DEFAULT_ROW_HEIGHT,
            width: DEFAULT_COL_WIDTH,
            height: DEFAULT_ROW_HEIGHT,
        })
    }

    fn supports_placement(&self, placement: ImagePlacement) -> bool {
        self.placements.contains(&placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryWorkbook {
        let mut wb = MemoryWorkbook::new();
        wb.set_cell(0, 0, 0, CellValue::text("Name"));
        wb.set_cell(0, 0, 1, CellValue::text("Amount"));
        wb.set_cell(0, 1, 0, CellValue::text("Widgets"));
        wb.set_cell(0, 1, 1, CellValue::Number(12.0));
        wb
    }

    #[test]
    fn test_used_region_materializes_dense_grid() {
        let wb = seeded();
        let data = wb.read_used_region(0).unwrap();
        assert_eq!(data.row_count, 2);
        assert_eq!(data.col_count, 2);
        assert_eq!(data.values[1][1], CellValue::Number(12.0));
    }

    #[test]
    fn test_empty_sheet_is_valid_outcome() {
        let wb = MemoryWorkbook::new();
        let data = wb.read_used_region(0).unwrap();
        assert!(data.is_empty());
        assert_eq!(wb.used_row_count(0).unwrap(), 0);
    }

    #[test]
    fn test_staged_write_not_visible_before_flush() {
        let mut wb = MemoryWorkbook::new();
        wb.stage_write(0, CellAddress::new(0, 0), vec![vec![CellValue::text("x")]])
            .unwrap();
        assert_eq!(wb.cell(0, 0, 0), CellValue::Empty);
        wb.flush().unwrap();
        assert_eq!(wb.cell(0, 0, 0), CellValue::text("x"));
    }

    #[test]
    fn test_failed_flush_consumes_round() {
        let mut wb = MemoryWorkbook::new();
        wb.stage_write(0, CellAddress::new(0, 0), vec![vec![CellValue::text("x")]])
            .unwrap();
        wb.fail_next_flush();
        assert!(wb.flush().is_err());
        // The round is lost; a later flush does not replay it.
        wb.flush().unwrap();
        assert_eq!(wb.cell(0, 0, 0), CellValue::Empty);
    }

    #[test]
    fn test_format_round() {
        let mut wb = seeded();
        wb.stage_format(
            0,
            Region::new(CellAddress::new(0, 0), 1, 2),
            CellFormat::header(),
        )
        .unwrap();
        wb.flush().unwrap();
        assert!(wb.cell_format(0, 0, 0).bold);
        assert!(wb.cell_format(0, 0, 1).bold);
        assert!(!wb.cell_format(0, 1, 0).bold);
    }

    #[test]
    fn test_create_sheet_rejects_duplicates() {
        let mut wb = MemoryWorkbook::new();
        assert_eq!(wb.create_sheet("Data").unwrap(), 1);
        assert!(matches!(
            wb.create_sheet("Data"),
            Err(GridError::DuplicateSheet(_))
        ));
    }

    #[test]
    fn test_image_lifecycle() {
        let mut wb = MemoryWorkbook::new();
        let id = wb.insert_image(0, &[1, 2, 3]).unwrap();
        wb.set_image_size(id, 400.0, 300.0).unwrap();
        wb.set_image_position(id, 50.0, 60.0).unwrap();
        wb.set_image_name(id, "Chart_1").unwrap();
        assert_eq!(wb.image_footprint(id).unwrap(), (400.0, 300.0));
        let img = &wb.images()[0];
        assert_eq!(img.name, "Chart_1");
        assert_eq!((img.left, img.top), (50.0, 60.0));
    }

    #[test]
    fn test_geometry_seam() {
        let mut wb = MemoryWorkbook::new();
        wb.set_active_cell(CellAddress::new(2, 3));
        let geo = wb.active_cell_geometry().unwrap();
        assert_eq!(geo.left, 300.0);
        assert_eq!(geo.top, 40.0);
        wb.disable_geometry();
        assert!(matches!(
            wb.active_cell_geometry(),
            Err(GridError::GeometryUnavailable)
        ));
    }

    #[test]
    fn test_placement_probe_seam() {
        let mut wb = MemoryWorkbook::new();
        assert!(wb.supports_placement(ImagePlacement::MoveAndSizeWithCells));
        wb.limit_placements(vec![ImagePlacement::Absolute]);
        assert!(!wb.supports_placement(ImagePlacement::MoveAndSizeWithCells));
        assert!(wb.supports_placement(ImagePlacement::Absolute));
    }
}
