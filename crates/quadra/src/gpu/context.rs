//! Rendering context.
//!
//! Owns the backend and every piece of GPU state the render core shares: the
//! texture slot allocator, the program registry and the static quad index
//! buffer. Components that touch the GPU borrow the context explicitly.

use super::backend::{BufferId, BufferKind, GraphicsBackend, ProgramId};
use super::shader::{ProgramInfo, ProgramRegistry};
use crate::config::RenderConfig;
use crate::error::RenderResult;
use crate::sprite::batch::BatchId;
use crate::sprite::vertex::quad_indices;
use crate::texture::manager::{MemoryUsage, TextureManager};

pub struct RenderContext<B: GraphicsBackend> {
    pub backend: B,
    pub textures: TextureManager,
    pub programs: ProgramRegistry,
    config: RenderConfig,
    index_buffer: BufferId,
    next_batch: u32,
    shut_down: bool,
}

impl<B: GraphicsBackend> RenderContext<B> {
    /// Validate `config` and build the shared index buffer.
    pub fn new(mut backend: B, config: RenderConfig) -> RenderResult<Self> {
        config.validate()?;

        let indices = quad_indices(config.max_sprites_per_batch);
        let index_buffer = backend.create_buffer(BufferKind::Index)?;
        backend.upload_buffer(index_buffer, bytemuck::cast_slice(&indices))?;
        log::info!(
            "render context on '{}': {} sprites per batch, {:?} filtering",
            backend.name(),
            config.max_sprites_per_batch,
            config.texture_filter
        );

        Ok(Self {
            backend,
            textures: TextureManager::new(config.texture_filter, config.texture_units),
            programs: ProgramRegistry::new(),
            config,
            index_buffer,
            next_batch: 0,
            shut_down: false,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Shared index buffer: 6 indices per quad, `max_sprites_per_batch` quads.
    pub fn index_buffer(&self) -> BufferId {
        self.index_buffer
    }

    pub fn usage(&self) -> MemoryUsage {
        self.textures.usage()
    }

    pub fn register_program(&mut self, info: ProgramInfo) {
        self.programs.register(info);
    }

    pub fn use_program(&mut self, id: ProgramId) -> RenderResult<()> {
        self.programs.use_program(&mut self.backend, id)
    }

    pub(crate) fn next_batch_id(&mut self) -> BatchId {
        self.next_batch += 1;
        BatchId(self.next_batch)
    }

    /// Delete every texture slot and the index buffer. Runs once; `Drop`
    /// calls it if the owner did not.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.textures.purge(&mut self.backend);
        self.backend.delete_buffer(self.index_buffer);
        self.shut_down = true;
    }
}

impl<B: GraphicsBackend> Drop for RenderContext<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
