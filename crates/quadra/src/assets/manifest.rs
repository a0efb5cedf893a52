use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Named regions of one atlas image, loaded from JSON alongside the image.
///
/// ```json
/// { "image": "heroes.png", "regions": { "hero": { "x": 0, "y": 0, "w": 32, "h": 48 } } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasManifest {
    /// Relative path to the image the regions refer to.
    #[serde(default)]
    pub image: String,
    /// Region name -> pixel rectangle.
    #[serde(default)]
    pub regions: HashMap<String, RegionRect>,
}

/// Pixel rectangle of a region, origin at the image's top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl AtlasManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Regions ordered by name, so definition order is deterministic.
    pub fn sorted_regions(&self) -> Vec<(&str, RegionRect)> {
        let mut regions: Vec<(&str, RegionRect)> = self
            .regions
            .iter()
            .map(|(name, rect)| (name.as_str(), *rect))
            .collect();
        regions.sort_by(|a, b| a.0.cmp(b.0));
        regions
    }
}
