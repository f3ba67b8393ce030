// Application settings
// Loaded from ~/.config/sheetpilot/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Placement-engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlacementSettings {
    /// Estimated row height in pixels, used by the chart position fallback
    /// when active-cell geometry is unavailable
    #[serde(rename = "placement.rowHeightEstimate")]
    pub row_height_estimate: f32,

    /// Default chart footprint requested on insertion
    #[serde(rename = "placement.chartWidth")]
    pub chart_width: f32,

    #[serde(rename = "placement.chartHeight")]
    pub chart_height: f32,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            row_height_estimate: 20.0, // matches common host default row height
            chart_width: 400.0,
            chart_height: 300.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub placement: PlacementSettings,
}

impl Settings {
    /// Settings file path: `~/.config/sheetpilot/settings.json`
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sheetpilot").join("settings.json"))
    }

    /// Load settings, falling back to defaults when the file is missing
    /// or unreadable. Unknown fields are ignored; missing fields default.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config dir: {}", e))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.placement.row_height_estimate, 20.0);
        assert_eq!(settings.placement.chart_width, 400.0);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        settings.placement.chart_height = 250.0;
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_unknown_fields_ignored_missing_defaulted() {
        let parsed: Settings = serde_json::from_str(
            r#"{"placement.chartWidth": 640.0, "grid.someFutureKnob": true}"#,
        )
        .unwrap();
        assert_eq!(parsed.placement.chart_width, 640.0);
        assert_eq!(parsed.placement.row_height_estimate, 20.0);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.json"));
        assert_eq!(settings, Settings::default());
    }
}
