//! Graphics backend contract.
//!
//! All GPU work in the crate goes through `GraphicsBackend`. The render core
//! never talks to a driver directly, so a GL, Metal or wgpu binding can be
//! dropped in by implementing this trait. `RecordingBackend` is the headless
//! implementation used by tests and tooling.

use crate::texture::image::PixelFormat;
use crate::texture::manager::TextureFilter;

/// GPU texture name. `TextureId(0)` is the "nothing bound" handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const NONE: TextureId = TextureId(0);
}

/// GPU buffer object name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferId(pub u32);

/// Linked shader program name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProgramId(pub u32);

/// What a buffer object is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Texture wrap mode. Sprites only ever sample inside their region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    ClampToEdge,
}

/// Sampling state applied to every texture the manager hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingParams {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

impl SamplingParams {
    pub fn clamped(filter: TextureFilter) -> Self {
        Self {
            min_filter: filter,
            mag_filter: filter,
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::ClampToEdge,
        }
    }
}

/// Image storage request for a texture. `pixels: None` allocates storage
/// without initializing it.
#[derive(Debug, Clone, Copy)]
pub struct TextureUpload<'a> {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub pixels: Option<&'a [u8]>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("out of video memory ({requested} bytes requested)")]
    OutOfMemory { requested: usize },

    #[error("texture {0} does not exist")]
    UnknownTexture(u32),

    #[error("buffer {0} does not exist")]
    UnknownBuffer(u32),

    #[error("{0}")]
    Driver(String),
}

/// Thin driver abstraction consumed by the texture manager, sprite batches and
/// the draw dispatcher. Calls are fire-and-forget from the core's perspective;
/// completion is synchronized by the platform at frame swap.
pub trait GraphicsBackend {
    /// Backend identifier (e.g., "gl", "metal", "recording").
    fn name(&self) -> &'static str;

    fn create_texture(&mut self) -> Result<TextureId, BackendError>;

    /// Replace the image storage of `id`. The texture must currently be bound
    /// to unit 0.
    fn upload_texture(&mut self, id: TextureId, upload: &TextureUpload<'_>) -> Result<(), BackendError>;

    /// Apply sampling state to `id`. The texture must currently be bound to unit 0.
    fn set_sampling(&mut self, id: TextureId, params: SamplingParams);

    fn bind_texture(&mut self, unit: u32, id: TextureId);

    /// Delete many textures in one call. Order is irrelevant.
    fn delete_textures(&mut self, ids: &[TextureId]);

    fn create_buffer(&mut self, kind: BufferKind) -> Result<BufferId, BackendError>;

    fn upload_buffer(&mut self, id: BufferId, bytes: &[u8]) -> Result<(), BackendError>;

    fn bind_buffer(&mut self, id: BufferId);

    fn delete_buffer(&mut self, id: BufferId);

    fn use_program(&mut self, id: ProgramId);

    /// Draw `count` indices from the bound index buffer as triangles.
    fn draw_elements(&mut self, count: u32);
}
