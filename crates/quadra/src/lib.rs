//! quadra: the rendering core of a 2D engine.
//!
//! Sprites are textured quads owned by a `SpriteBatch`; pose changes mark them
//! stale and the per-frame update pass rewrites only what changed before one
//! indexed draw per batch. GPU memory goes through a recycling texture slot
//! allocator, and all GPU work goes through the `GraphicsBackend` trait.

pub mod assets;
pub mod config;
pub mod error;
pub mod gpu;
pub mod scene;
pub mod sprite;
pub mod texture;

// Re-export key types at crate root for convenience
pub use assets::manifest::{AtlasManifest, RegionRect};
pub use assets::registry::RegionRegistry;
pub use config::{RenderConfig, MAX_INDEXABLE_SPRITES};
pub use error::{RenderError, RenderResult};
pub use gpu::{
    BackendError, GpuCommand, GraphicsBackend, ProgramId, ProgramInfo, RecordingBackend,
    RenderContext, TextureId,
};
pub use scene::{Drawable, NodeId, NodeKind, SceneGraph};
pub use sprite::{
    BatchId, Color, Easing, Sprite, SpriteAnimation, SpriteBatch, SpriteMut, SpriteRef,
    SpriteVertex, Staleness, Transitions,
};
pub use texture::{DecodedImage, MemoryUsage, PixelFormat, TextureAtlas, TextureFilter, TextureManager, TextureRegion};
