//! Error types for the render core.
//!
//! Every contract violation (bad pivot, non-positive scale, out-of-bounds
//! region, malformed image) and every backend failure surfaces as a
//! `RenderError`. Nothing in this crate aborts the process.

use crate::gpu::backend::BackendError;

/// Result alias used throughout the crate.
pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("pivot ({x}, {y}) is outside [0, 1]")]
    InvalidPivot { x: f32, y: f32 },

    #[error("scale ({x}, {y}) must be strictly positive")]
    InvalidScale { x: f32, y: f32 },

    #[error("region ({x}, {y}, {w}x{h}) exceeds atlas bounds {width}x{height}")]
    RegionOutOfBounds {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        width: u32,
        height: u32,
    },

    #[error("region {index} is not defined (atlas has {count})")]
    UnknownRegion { index: u32, count: usize },

    #[error("image has no pixels")]
    EmptyImage,

    #[error("image data is {actual} bytes, expected {expected}")]
    ImageSizeMismatch { expected: usize, actual: usize },

    #[error("palette index {index} out of range ({len} entries)")]
    PaletteIndex { index: u8, len: usize },

    #[error("texture unit {unit} out of range ({units} units)")]
    InvalidTextureUnit { unit: u32, units: u32 },

    #[error("corner {0} out of range (quads have 4)")]
    InvalidCorner(usize),

    #[error("batch is full ({capacity} sprites)")]
    BatchFull { capacity: usize },

    #[error("batch capacity {requested} outside 1..={max}")]
    InvalidCapacity { requested: usize, max: usize },

    #[error("sprite belongs to a different batch")]
    ForeignSprite,

    #[error("sprite slot {0} is not allocated")]
    UnknownSprite(u32),

    #[error("shader program {0} is not registered")]
    UnknownProgram(u32),

    #[error("scene node {0} does not exist")]
    UnknownNode(u32),

    #[error("scene node {0} does not hold a sprite batch")]
    NotABatch(u32),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("graphics backend: {0}")]
    Backend(#[from] BackendError),
}

/// Log a rejected contract violation and hand the error back for `?`.
pub(crate) fn rejected(err: RenderError) -> RenderError {
    log::warn!("rejected: {err}");
    err
}
