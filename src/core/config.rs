//! Renderer configuration.
//!
//! Loaded from JSON with serde; every field has a default so partial files
//! are accepted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{IVec3, Result};

/// Named view-distance presets, in chunks per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewDistance {
    LegallyBlind,
    Near,
    #[default]
    Moderate,
    Far,
    Ultra,
    Mega,
    Extreme,
    /// Explicit chunk counts.
    Custom { x: i32, y: i32, z: i32 },
}

impl ViewDistance {
    /// Chunk counts spanned by the view region along each axis.
    pub fn chunk_distance(&self) -> IVec3 {
        match *self {
            ViewDistance::LegallyBlind => IVec3::new(5, 5, 5),
            ViewDistance::Near => IVec3::new(9, 7, 9),
            ViewDistance::Moderate => IVec3::new(13, 7, 13),
            ViewDistance::Far => IVec3::new(17, 7, 17),
            ViewDistance::Ultra => IVec3::new(25, 7, 25),
            ViewDistance::Mega => IVec3::new(33, 7, 33),
            ViewDistance::Extreme => IVec3::new(63, 7, 63),
            ViewDistance::Custom { x, y, z } => IVec3::new(x, y, z),
        }
    }
}

/// How a world position is turned into a chunk coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkRounding {
    /// Floor division; the view region stays symmetric across zero.
    #[default]
    Floor,
    /// Truncation toward zero. Positions in (-CHUNK_SIZE, 0) map to chunk 0.
    Truncate,
}

/// Configuration consumed by the world renderer and the visibility set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Size of the region kept in proximity around the viewpoint.
    pub view_distance: ViewDistance,
    /// Rounding used to locate the viewpoint chunk.
    pub chunk_rounding: ChunkRounding,
    /// Rate (per second) at which the smoothed main light follows the
    /// instantaneous value at the camera.
    pub light_smoothing_rate: f32,
    /// Cull chunks outside the camera frustum when filling render queues.
    pub frustum_culling: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            view_distance: ViewDistance::default(),
            chunk_rounding: ChunkRounding::default(),
            light_smoothing_rate: 2.0,
            frustum_culling: true,
        }
    }
}

impl RenderConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: RenderConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Reject view distances that cannot describe a region.
    pub fn validate(&self) -> Result<()> {
        let d = self.view_distance.chunk_distance();
        if d.min_element() < 1 {
            return Err(Error::Config(format!(
                "view distance must be at least one chunk per axis, got {d}"
            )));
        }
        if !self.light_smoothing_rate.is_finite() || self.light_smoothing_rate < 0.0 {
            return Err(Error::Config(format!(
                "light_smoothing_rate must be a non-negative number, got {}",
                self.light_smoothing_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_odd() {
        for preset in [
            ViewDistance::LegallyBlind,
            ViewDistance::Near,
            ViewDistance::Moderate,
            ViewDistance::Far,
            ViewDistance::Ultra,
            ViewDistance::Mega,
            ViewDistance::Extreme,
        ] {
            let d = preset.chunk_distance();
            assert_eq!(d.x % 2, 1, "{preset:?}");
            assert_eq!(d.z % 2, 1, "{preset:?}");
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RenderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_view_distance_rejected() {
        let config = RenderConfig {
            view_distance: ViewDistance::Custom { x: 0, y: 1, z: 1 },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RenderConfig =
            serde_json::from_str(r#"{ "view_distance": "far" }"#).unwrap();
        assert_eq!(config.view_distance, ViewDistance::Far);
        assert_eq!(config.chunk_rounding, ChunkRounding::Floor);
        assert!(config.frustum_culling);
    }

    #[test]
    fn test_custom_view_distance_json() {
        let config: RenderConfig = serde_json::from_str(
            r#"{ "view_distance": { "custom": { "x": 2, "y": 1, "z": 2 } }, "chunk_rounding": "truncate" }"#,
        )
        .unwrap();
        assert_eq!(config.view_distance.chunk_distance(), IVec3::new(2, 1, 2));
        assert_eq!(config.chunk_rounding, ChunkRounding::Truncate);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.json");

        let config = RenderConfig {
            view_distance: ViewDistance::Near,
            frustum_culling: false,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = RenderConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = RenderConfig::load(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
