//! Map settings.
//!
//! Native builds read overrides from `basemap.json` in the working directory.
//! Browser builds start from defaults and take overrides from the page URL.

use super::view::DEFAULT_SCALE_EXTENT;
use serde::{Deserialize, Serialize};

/// Settings file looked up in the working directory on native builds.
#[cfg(not(target_arch = "wasm32"))]
const SETTINGS_FILE: &str = "basemap.json";

/// Surface size, data source and zoom limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Path (native) or URL (web) of the topology document.
    pub data_source: String,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Keep boundary strokes one screen pixel wide at every zoom level.
    pub scale_invariant_strokes: bool,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            data_source: "us-10m.v1.json".to_string(),
            width: 960,
            height: 600,
            min_scale: DEFAULT_SCALE_EXTENT.0,
            max_scale: DEFAULT_SCALE_EXTENT.1,
            scale_invariant_strokes: false,
        }
    }
}

impl MapSettings {
    /// Parses settings, filling missing fields with defaults.
    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Load settings for this platform, falling back to defaults.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let json = match std::fs::read_to_string(SETTINGS_FILE) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("Failed to read {}: {}", SETTINGS_FILE, e);
                return Self::default();
            }
        };

        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded map settings from {}", SETTINGS_FILE);
                settings
            }
            Err(e) => {
                log::warn!("Failed to parse {}: {}", SETTINGS_FILE, e);
                Self::default()
            }
        }
    }

    /// Load settings for this platform, falling back to defaults.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        Self::default()
    }

    pub fn scale_extent(&self) -> (f64, f64) {
        (self.min_scale, self.max_scale)
    }

    /// Replaces an unusable scale range with the default one.
    fn sanitized(mut self) -> Self {
        let valid = self.min_scale.is_finite()
            && self.max_scale.is_finite()
            && self.min_scale > 0.0
            && self.min_scale <= self.max_scale;
        if !valid {
            log::warn!(
                "Invalid scale range [{}, {}], using [{}, {}]",
                self.min_scale,
                self.max_scale,
                DEFAULT_SCALE_EXTENT.0,
                DEFAULT_SCALE_EXTENT.1
            );
            (self.min_scale, self.max_scale) = DEFAULT_SCALE_EXTENT;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = MapSettings::default();
        assert_eq!(settings.data_source, "us-10m.v1.json");
        assert_eq!((settings.width, settings.height), (960, 600));
        assert_eq!(settings.scale_extent(), (1.0, 8.0));
        assert!(!settings.scale_invariant_strokes);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings =
            MapSettings::from_json(r#"{"data_source": "maps/us.json", "max_scale": 4}"#).unwrap();
        assert_eq!(settings.data_source, "maps/us.json");
        assert_eq!(settings.scale_extent(), (1.0, 4.0));
        assert_eq!(settings.width, 960);
    }

    #[test]
    fn test_invalid_scale_range_is_replaced() {
        let settings = MapSettings::from_json(r#"{"min_scale": 8, "max_scale": 2}"#).unwrap();
        assert_eq!(settings.scale_extent(), DEFAULT_SCALE_EXTENT);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(MapSettings::from_json("{width: 3").is_err());
    }
}
