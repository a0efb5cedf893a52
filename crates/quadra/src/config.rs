use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::texture::manager::TextureFilter;

/// Largest batch the shared `u16` index buffer can address (4 vertices per sprite).
pub const MAX_INDEXABLE_SPRITES: usize = (u16::MAX as usize + 1) / 4;

/// Render core configuration, provided by the game at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Sprites per batch; also sizes the shared index buffer (default: 256).
    pub max_sprites_per_batch: usize,
    /// Filter for newly allocated textures (default: linear).
    pub texture_filter: TextureFilter,
    /// Texture units tracked for redundant-bind elision (default: 4).
    pub texture_units: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_sprites_per_batch: 256,
            texture_filter: TextureFilter::Linear,
            texture_units: 4,
        }
    }
}

impl RenderConfig {
    /// Parse a config from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> RenderResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RenderResult<()> {
        if self.max_sprites_per_batch == 0 || self.max_sprites_per_batch > MAX_INDEXABLE_SPRITES {
            return Err(RenderError::InvalidConfig(format!(
                "max_sprites_per_batch must be in 1..={MAX_INDEXABLE_SPRITES}, got {}",
                self.max_sprites_per_batch
            )));
        }
        // Unit 1 carries normal maps.
        if self.texture_units < 2 {
            return Err(RenderError::InvalidConfig(format!(
                "texture_units must be at least 2, got {}",
                self.texture_units
            )));
        }
        Ok(())
    }
}
