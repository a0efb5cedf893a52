//! Sprite batches: many sprites sharing one atlas, one vertex buffer and one
//! draw call.
//!
//! The batch owns a fixed-capacity arena of quads. A sprite is addressed by a
//! `SpriteRef` (batch id + slot), never by pointer, so a reference to a
//! sprite in another batch is caught instead of scribbling over foreign
//! vertices.

use std::rc::Rc;

use super::sprite::{Sprite, SpriteMut};
use super::vertex::{Quad, SpriteVertex};
use crate::error::{rejected, RenderError, RenderResult};
use crate::gpu::backend::{BufferId, BufferKind, GraphicsBackend, TextureId};
use crate::gpu::context::RenderContext;
use crate::texture::atlas::TextureAtlas;

/// Identifies a batch within its render context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(pub u32);

/// Stable handle to a sprite: its batch and its slot in the vertex arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteRef {
    pub batch: BatchId,
    pub slot: u32,
}

pub struct SpriteBatch {
    id: BatchId,
    atlas: Rc<TextureAtlas>,
    normal: Option<Rc<TextureAtlas>>,
    sprites: Vec<Sprite>,
    quads: Vec<Quad>,
    capacity: usize,
    buffer: BufferId,
    /// Vertices were written outside the pose path (texture, color, new sprite).
    buffer_stale: bool,
    uploads: u64,
}

impl SpriteBatch {
    /// Create an empty batch drawing from `atlas`, with room for `capacity`
    /// sprites (at most `max_sprites_per_batch`).
    pub fn new<B: GraphicsBackend>(
        ctx: &mut RenderContext<B>,
        atlas: Rc<TextureAtlas>,
        capacity: usize,
    ) -> RenderResult<Self> {
        let max = ctx.config().max_sprites_per_batch;
        if capacity == 0 || capacity > max {
            return Err(rejected(RenderError::InvalidCapacity { requested: capacity, max }));
        }
        let buffer = ctx.backend.create_buffer(BufferKind::Vertex)?;
        Ok(Self {
            id: ctx.next_batch_id(),
            atlas,
            normal: None,
            sprites: Vec::with_capacity(capacity),
            quads: Vec::with_capacity(capacity),
            capacity,
            buffer,
            buffer_stale: false,
            uploads: 0,
        })
    }

    /// Add an untextured `width` x `height` sprite at the origin.
    pub fn create_sprite(&mut self, width: u32, height: u32) -> RenderResult<SpriteRef> {
        if self.sprites.len() >= self.capacity {
            return Err(rejected(RenderError::BatchFull { capacity: self.capacity }));
        }
        let slot = self.sprites.len() as u32;
        self.sprites.push(Sprite::new(width, height));
        self.quads.push([SpriteVertex::default(); 4]);
        self.buffer_stale = true;
        Ok(SpriteRef { batch: self.id, slot })
    }

    /// Add a sprite skinned with atlas region `region`.
    pub fn create_sprite_from_region(&mut self, region: u32, width: u32, height: u32) -> RenderResult<SpriteRef> {
        self.atlas.region_or_err(region)?;
        let sprite = self.create_sprite(width, height)?;
        self.sprite_mut(sprite)?.set_texture(region)?;
        Ok(sprite)
    }

    fn slot(&self, sprite: SpriteRef) -> RenderResult<usize> {
        if sprite.batch != self.id {
            return Err(rejected(RenderError::ForeignSprite));
        }
        let slot = sprite.slot as usize;
        if slot >= self.sprites.len() {
            return Err(rejected(RenderError::UnknownSprite(sprite.slot)));
        }
        Ok(slot)
    }

    pub fn sprite(&self, sprite: SpriteRef) -> RenderResult<&Sprite> {
        let slot = self.slot(sprite)?;
        Ok(&self.sprites[slot])
    }

    pub fn sprite_mut(&mut self, sprite: SpriteRef) -> RenderResult<SpriteMut<'_>> {
        let slot = self.slot(sprite)?;
        Ok(SpriteMut {
            sprite: &mut self.sprites[slot],
            quad: &mut self.quads[slot],
            atlas: &self.atlas,
            buffer_stale: &mut self.buffer_stale,
        })
    }

    /// Handles of every sprite in slot order.
    pub fn sprite_refs(&self) -> impl Iterator<Item = SpriteRef> + '_ {
        (0..self.sprites.len() as u32).map(|slot| SpriteRef { batch: self.id, slot })
    }

    /// Update pass: recompute stale sprites and upload the vertex buffer if
    /// anything changed. Returns whether an upload happened.
    ///
    /// A failed upload leaves the buffer marked stale so the next frame retries.
    pub fn update<B: GraphicsBackend>(&mut self, ctx: &mut RenderContext<B>) -> RenderResult<bool> {
        let mut wrote = false;
        for (sprite, quad) in self.sprites.iter_mut().zip(self.quads.iter_mut()) {
            wrote |= sprite.update(quad);
        }
        if !wrote && !self.buffer_stale {
            return Ok(false);
        }

        self.buffer_stale = true;
        if let Err(e) = ctx.backend.upload_buffer(self.buffer, bytemuck::cast_slice(&self.quads)) {
            log::error!("batch {} vertex upload failed: {e}", self.id.0);
            return Err(e.into());
        }
        self.buffer_stale = false;
        self.uploads += 1;
        Ok(true)
    }

    /// Re-skin the batch with another atlas. Existing texture coordinates are
    /// kept; region indices passed to `set_texture` refer to the new atlas.
    pub fn set_atlas(&mut self, atlas: Rc<TextureAtlas>) {
        self.atlas = atlas;
    }

    /// Normal map sampled by programs that declare one.
    pub fn set_normal(&mut self, normal: Rc<TextureAtlas>) {
        self.normal = Some(normal);
    }

    pub fn atlas(&self) -> &Rc<TextureAtlas> {
        &self.atlas
    }

    pub fn normal(&self) -> Option<&Rc<TextureAtlas>> {
        self.normal.as_ref()
    }

    pub fn texture(&self) -> TextureId {
        self.atlas.texture()
    }

    pub fn vertex_buffer(&self) -> BufferId {
        self.buffer
    }

    /// Indices to draw this frame: 6 per sprite.
    pub fn index_count(&self) -> u32 {
        (self.sprites.len() * 6) as u32
    }

    /// The vertex arena as the GPU sees it.
    pub fn vertices(&self) -> &[SpriteVertex] {
        bytemuck::cast_slice(&self.quads)
    }

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of vertex buffer uploads so far.
    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    /// Delete the vertex buffer. Sprites die with the batch.
    ///
    /// Dropping a batch does not free its buffer, since the batch holds no
    /// backend. Call this (or `SceneGraph::release_all` for batches owned by
    /// a scene) before the context shuts down.
    pub fn release<B: GraphicsBackend>(self, ctx: &mut RenderContext<B>) {
        ctx.backend.delete_buffer(self.buffer);
    }
}
