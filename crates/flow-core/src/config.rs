//! Editor configuration.
//!
//! Every field has a default, so a partial JSON object (or `{}`) is a
//! valid configuration.

use crate::layout::LayoutMetrics;
use crate::minimap::MinimapConfig;
use crate::model::Point;
use crate::transform::{Viewport, ZoomLimits};
use serde::{Deserialize, Serialize};

// ─── Config ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub zoom: ZoomLimits,
    /// Pan offset of a fresh canvas.
    pub initial_pan: Point,
    pub layout: LayoutMetrics,
    pub minimap: MinimapConfig,
    /// Subtracted from the drop point when a palette item lands on the
    /// canvas, so the new card appears roughly centred under the cursor.
    pub drop_offset: Point,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomLimits::default(),
            initial_pan: Point::new(-2000.0, -2000.0),
            layout: LayoutMetrics::default(),
            minimap: MinimapConfig::default(),
            drop_offset: Point::new(100.0, 20.0),
        }
    }
}

impl EditorConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns the decoder error if the JSON is malformed or the zoom
    /// limits are unusable (non-positive, non-finite or `min > max`).
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(text)?;
        config
            .zoom
            .validate()
            .map_err(<serde_json::Error as serde::de::Error>::custom)?;
        Ok(config)
    }

    /// The viewport a fresh canvas opens with.
    pub fn initial_viewport(&self) -> Viewport {
        Viewport::new(self.initial_pan.x, self.initial_pan.y, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(EditorConfig::from_json("{}").unwrap(), EditorConfig::default());
    }

    #[test]
    fn partial_override() {
        let cfg = EditorConfig::from_json(r#"{ "zoom": { "max": 3.0 }, "minimap": { "width": 320 } }"#)
            .unwrap();
        assert_eq!(cfg.zoom.max, 3.0);
        assert_eq!(cfg.zoom.min, 0.5);
        assert_eq!(cfg.minimap.width, 320.0);
        assert_eq!(cfg.minimap.padding, 500.0);
    }

    #[test]
    fn unusable_zoom_limits_are_rejected() {
        let err = EditorConfig::from_json(r#"{ "zoom": { "min": 3.0 } }"#).unwrap_err();
        assert!(err.to_string().contains("zoom min 3 is above max 2"), "{err}");
        assert!(EditorConfig::from_json(r#"{ "zoom": { "step": 0 } }"#).is_err());
        assert!(EditorConfig::from_json(r#"{ "zoom": { "min": -1.0 } }"#).is_err());
        assert!(EditorConfig::from_json(r#"{ "zoom": { "min": 2.0, "max": 2.0 } }"#).is_ok());
    }

    #[test]
    fn initial_viewport_uses_pan() {
        let vp = EditorConfig::default().initial_viewport();
        assert_eq!((vp.pan_x, vp.pan_y, vp.scale), (-2000.0, -2000.0, 1.0));
    }
}
