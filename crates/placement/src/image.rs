//! Chart insertion.
//!
//! Primary path: center the chart over the active cell, using the host's
//! cell geometry. Hosts are not required to honor a requested size
//! immediately, so the materialized footprint is re-read before the
//! centered position is computed. Fallback path (geometry unavailable):
//! park the chart below the used region at a fixed left margin. Failure of
//! both paths is a hard error; a failed set-name is the only thing ignored.

use chrono::Utc;
use sheetpilot_config::PlacementSettings;
use sheetpilot_grid::{GridError, GridHost, ImageId, ImagePlacement};
use sheetpilot_protocol::ChartPayload;

use crate::error::PlacementError;

/// Minimum distance from the sheet origin when centering on a cell.
const MIN_EDGE_MARGIN: f32 = 8.0;
/// Left margin and minimum top for the below-data fallback.
const FALLBACK_MARGIN: f32 = 20.0;

/// Probe order for image anchoring, most capable first.
pub const PLACEMENT_PROBE_ORDER: [ImagePlacement; 2] =
    [ImagePlacement::MoveAndSizeWithCells, ImagePlacement::Absolute];

/// Resolve the anchoring mode this host supports. Called once per host;
/// the session caches the answer.
pub fn resolve_placement_mode(host: &dyn GridHost) -> ImagePlacement {
    PLACEMENT_PROBE_ORDER
        .iter()
        .copied()
        .find(|mode| host.supports_placement(*mode))
        .unwrap_or(ImagePlacement::Absolute)
}

/// Decode and insert a chart into `sheet`, position it, and tag it with a
/// timestamp-derived name.
pub fn insert_chart(
    host: &mut dyn GridHost,
    sheet: usize,
    chart: &ChartPayload,
    mode: ImagePlacement,
    settings: &PlacementSettings,
) -> Result<ImageId, PlacementError> {
    let bytes = chart
        .decode()
        .map_err(|e| PlacementError::ChartDecode(e.to_string()))?;
    let image = host.insert_image(sheet, &bytes)?;

    if let Err(primary) = position_on_active_cell(host, image, settings) {
        position_below_data(host, sheet, image, settings).map_err(|fallback| {
            PlacementError::ChartPosition(format!("{}; fallback: {}", primary, fallback))
        })?;
    }

    // Cosmetic only
    let name = format!("Chart_{}", Utc::now().timestamp_millis());
    let _ = host.set_image_name(image, &name);

    host.set_image_placement(image, mode)?;
    Ok(image)
}

fn position_on_active_cell(
    host: &mut dyn GridHost,
    image: ImageId,
    settings: &PlacementSettings,
) -> Result<(), GridError> {
    let cell = host.active_cell_geometry()?;
    host.set_image_size(image, settings.chart_width, settings.chart_height)?;
    let (width, height) = host.image_footprint(image)?;
    let left = (cell.left + cell.width / 2.0 - width / 2.0).max(MIN_EDGE_MARGIN);
    let top = (cell.top + cell.height / 2.0 - height / 2.0).max(MIN_EDGE_MARGIN);
    host.set_image_position(image, left, top)
}

fn position_below_data(
    host: &mut dyn GridHost,
    sheet: usize,
    image: ImageId,
    settings: &PlacementSettings,
) -> Result<(), GridError> {
    let used_rows = host.used_row_count(sheet)?;
    host.set_image_size(image, settings.chart_width, settings.chart_height)?;
    let top = ((used_rows as f32 + 2.0) * settings.row_height_estimate).max(FALLBACK_MARGIN);
    host.set_image_position(image, FALLBACK_MARGIN, top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use sheetpilot_core::{CellAddress, CellValue};
    use sheetpilot_grid::MemoryWorkbook;

    fn png_payload() -> ChartPayload {
        let body = base64::engine::general_purpose::STANDARD.encode([0x89, 0x50, 0x4e, 0x47]);
        ChartPayload::new(format!("data:image/png;base64,{}", body))
    }

    #[test]
    fn test_resolve_placement_mode_prefers_move_and_size() {
        let wb = MemoryWorkbook::new();
        assert_eq!(resolve_placement_mode(&wb), ImagePlacement::MoveAndSizeWithCells);

        let mut wb = MemoryWorkbook::new();
        wb.limit_placements(vec![ImagePlacement::Absolute]);
        assert_eq!(resolve_placement_mode(&wb), ImagePlacement::Absolute);
    }

    #[test]
    fn test_chart_centered_on_active_cell() {
        let mut wb = MemoryWorkbook::new();
        // Active cell B3: left 100, top 40, width 100, height 20
        wb.set_active_cell(CellAddress::new(2, 1));
        let settings = PlacementSettings::default();
        let id = insert_chart(
            &mut wb,
            0,
            &png_payload(),
            ImagePlacement::MoveAndSizeWithCells,
            &settings,
        )
        .unwrap();
        let img = wb.images().iter().find(|i| i.id == id).unwrap();
        // Centered: 100 + 50 - 200 = -50, clamped to the 8px margin
        assert_eq!(img.left, 8.0);
        assert_eq!(img.top, 8.0);
        assert_eq!((img.width, img.height), (400.0, 300.0));
        assert!(img.name.starts_with("Chart_"));
        assert_eq!(img.placement, ImagePlacement::MoveAndSizeWithCells);
    }

    #[test]
    fn test_chart_fallback_below_data() {
        let mut wb = MemoryWorkbook::new();
        wb.disable_geometry();
        for row in 0..5 {
            wb.set_cell(0, row, 0, CellValue::Number(row as f64));
        }
        let settings = PlacementSettings::default();
        let id = insert_chart(
            &mut wb,
            0,
            &png_payload(),
            ImagePlacement::Absolute,
            &settings,
        )
        .unwrap();
        let img = wb.images().iter().find(|i| i.id == id).unwrap();
        assert_eq!(img.left, 20.0);
        // (5 used rows + 2) * 20px estimate
        assert_eq!(img.top, 140.0);
    }

    #[test]
    fn test_fallback_minimum_top() {
        let mut wb = MemoryWorkbook::new();
        wb.disable_geometry();
        let settings = PlacementSettings {
            row_height_estimate: 1.0,
            ..Default::default()
        };
        let id = insert_chart(
            &mut wb,
            0,
            &png_payload(),
            ImagePlacement::Absolute,
            &settings,
        )
        .unwrap();
        let img = wb.images().iter().find(|i| i.id == id).unwrap();
        assert_eq!(img.top, 20.0);
    }

    #[test]
    fn test_undecodable_chart_is_hard_error() {
        let mut wb = MemoryWorkbook::new();
        let settings = PlacementSettings::default();
        let result = insert_chart(
            &mut wb,
            0,
            &ChartPayload::new("!!not base64!!"),
            ImagePlacement::Absolute,
            &settings,
        );
        assert!(matches!(result, Err(PlacementError::ChartDecode(_))));
        assert!(wb.images().is_empty());
    }
}
