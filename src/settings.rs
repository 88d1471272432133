use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Vertical space of one construct row; rows are two slots apart.
    pub slot_height: f64,
    /// Horizontal size of one cursor cell.
    pub cell_width: f64,
    /// Spread gene colours by level.
    pub variant_colors: bool,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub font_family: String,
    pub font_size: f64,
    pub title_font_size: f64,
    /// Distance of part labels below the backbone.
    pub label_offset: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            slot_height: 100.0,
            cell_width: 50.0,
            variant_colors: false,
            stroke_color: "#000000".to_string(),
            stroke_width: 3.0,
            font_family: "Verdana".to_string(),
            font_size: 16.0,
            title_font_size: 24.0,
            label_offset: 40.0,
        }
    }
}

impl RenderSettings {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: RenderSettings =
            serde_json::from_str(r#"{"cell_width": 60, "variant_colors": true}"#).unwrap();
        assert_eq!(settings.cell_width, 60.0);
        assert!(settings.variant_colors);
        assert_eq!(settings.slot_height, 100.0);
        assert_eq!(settings.font_family, "Verdana");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = RenderSettings {
            slot_height: 80.0,
            ..RenderSettings::default()
        };
        settings.save_to_path(&path).unwrap();
        assert_eq!(RenderSettings::load_from_path(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = RenderSettings::load_from_path(dir.path().join("missing.json"));
        assert!(matches!(result, Err(crate::error::VisError::Io(_))));
    }
}
