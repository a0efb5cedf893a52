//! Texture slot allocator.
//!
//! Owns every GPU texture handle the render core uses. Released textures are
//! not deleted: their storage is shrunk to a 64x64 luminance placeholder and
//! the handle is parked in a recycle queue, so the next allocation reuses it
//! instead of asking the driver for a new one.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{rejected, RenderError, RenderResult};
use crate::gpu::backend::{GraphicsBackend, SamplingParams, TextureId, TextureUpload};
use crate::texture::image::PixelFormat;

/// Edge length of the placeholder image a recycled slot keeps.
pub const PLACEHOLDER_SIZE: u32 = 64;

/// Bytes held by one recycled slot (64x64 luminance).
pub const PLACEHOLDER_BYTES: usize = (PLACEHOLDER_SIZE * PLACEHOLDER_SIZE) as usize;

/// Minification/magnification filter for newly allocated textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

/// A texture handle and the bytes of pixel data it was allocated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSlot {
    pub id: TextureId,
    pub bytes: usize,
}

/// Video memory usage in megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MemoryUsage {
    /// Active texture bytes plus the `unused` estimate.
    pub used_mb: f64,
    /// Placeholder footprint of recycled slots.
    pub unused_mb: f64,
    /// Highest active texture bytes seen.
    pub peak_mb: f64,
}

#[derive(Debug)]
pub struct TextureManager {
    active: Vec<TextureSlot>,
    recycled: VecDeque<TextureSlot>,
    /// Last handle bound per texture unit.
    bound: Vec<TextureId>,
    filter: TextureFilter,
    used_bytes: usize,
    peak_bytes: usize,
    high_water: usize,
}

impl TextureManager {
    pub fn new(filter: TextureFilter, texture_units: u32) -> Self {
        Self {
            active: Vec::new(),
            recycled: VecDeque::new(),
            bound: vec![TextureId::NONE; texture_units.max(1) as usize],
            filter,
            used_bytes: 0,
            peak_bytes: 0,
            high_water: 0,
        }
    }

    /// Reserve a texture handle for `bytes` of pixel data.
    ///
    /// Reuses the oldest recycled handle when one is available, otherwise asks
    /// the backend for a fresh one. The handle is left bound to unit 0 with the
    /// current sampling parameters applied; the caller uploads the image.
    pub fn allocate(&mut self, gpu: &mut dyn GraphicsBackend, bytes: usize) -> RenderResult<TextureId> {
        let id = self.acquire(gpu)?;
        self.activate(id, bytes);
        Ok(id)
    }

    /// Allocate a handle and upload `upload` into it.
    ///
    /// Accounting only changes once the upload succeeds. On failure the handle
    /// is parked in the recycle queue holding the placeholder (or deleted if
    /// even that upload fails) and the backend error is returned.
    pub fn create(&mut self, gpu: &mut dyn GraphicsBackend, upload: &TextureUpload<'_>) -> RenderResult<TextureId> {
        let bytes = upload.width as usize * upload.height as usize * upload.format.bytes_per_pixel();
        let id = self.acquire(gpu)?;
        if let Err(e) = gpu.upload_texture(id, upload) {
            log::error!("failed to load texture {}: {e}", id.0);
            self.park(gpu, id);
            return Err(e.into());
        }
        self.activate(id, bytes);
        self.log_usage();
        Ok(id)
    }

    fn acquire(&mut self, gpu: &mut dyn GraphicsBackend) -> RenderResult<TextureId> {
        let id = match self.recycled.pop_front() {
            Some(slot) => slot.id,
            None => gpu.create_texture().map_err(|e| {
                log::error!("texture creation failed: {e}");
                RenderError::from(e)
            })?,
        };
        self.bind(gpu, id);
        gpu.set_sampling(id, SamplingParams::clamped(self.filter));
        Ok(id)
    }

    fn activate(&mut self, id: TextureId, bytes: usize) {
        self.used_bytes += bytes;
        self.peak_bytes = self.peak_bytes.max(self.used_bytes);
        self.active.push(TextureSlot { id, bytes });
        self.high_water = self.high_water.max(self.active.len());
    }

    /// Queue a handle that never became active. It only counts as a recycled
    /// slot once it actually holds the placeholder.
    fn park(&mut self, gpu: &mut dyn GraphicsBackend, id: TextureId) {
        match gpu.upload_texture(id, &Self::placeholder()) {
            Ok(()) => self.recycled.push_back(TextureSlot { id, bytes: 0 }),
            Err(e) => {
                log::error!("dropping texture {} after failed placeholder upload: {e}", id.0);
                gpu.delete_textures(&[id]);
            }
        }
        self.bind(gpu, TextureId::NONE);
    }

    fn placeholder() -> TextureUpload<'static> {
        TextureUpload {
            format: PixelFormat::Gray,
            width: PLACEHOLDER_SIZE,
            height: PLACEHOLDER_SIZE,
            pixels: None,
        }
    }

    /// Give a texture back. Unknown or already released handles are ignored.
    ///
    /// The image is replaced with a small placeholder so most of the memory is
    /// freed while the handle stays valid for reuse.
    pub fn release(&mut self, gpu: &mut dyn GraphicsBackend, id: TextureId) -> RenderResult<()> {
        let Some(index) = self.active.iter().position(|slot| slot.id == id) else {
            log::trace!("release of unknown texture {} ignored", id.0);
            return Ok(());
        };

        self.bind(gpu, id);
        let shrunk = gpu.upload_texture(id, &Self::placeholder());
        self.bind(gpu, TextureId::NONE);
        self.reclaim_at(index);
        self.log_usage();

        shrunk.map_err(|e| {
            log::error!("failed to shrink released texture {}: {e}", id.0);
            RenderError::from(e)
        })
    }

    /// Bind `id` to unit 0 unless it is already bound there.
    pub fn bind(&mut self, gpu: &mut dyn GraphicsBackend, id: TextureId) {
        if self.bound[0] == id {
            log::trace!("texture {} already bound", id.0);
            return;
        }
        gpu.bind_texture(0, id);
        self.bound[0] = id;
    }

    /// Bind `id` to `unit` unless it is already bound there.
    pub fn bind_unit(&mut self, gpu: &mut dyn GraphicsBackend, id: TextureId, unit: u32) -> RenderResult<()> {
        let units = self.bound.len() as u32;
        let Some(current) = self.bound.get_mut(unit as usize) else {
            return Err(rejected(RenderError::InvalidTextureUnit { unit, units }));
        };
        if *current == id {
            return Ok(());
        }
        gpu.bind_texture(unit, id);
        *current = id;
        Ok(())
    }

    /// Unbind unit 0.
    pub fn bind_default(&mut self, gpu: &mut dyn GraphicsBackend) {
        self.bind(gpu, TextureId::NONE);
    }

    /// Filter applied to textures allocated after this call.
    pub fn set_filter(&mut self, filter: TextureFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> TextureFilter {
        self.filter
    }

    pub fn usage(&self) -> MemoryUsage {
        let unused_mb = (self.recycled.len() * PLACEHOLDER_BYTES) as f64 * 1e-6;
        MemoryUsage {
            used_mb: self.used_bytes as f64 * 1e-6 + unused_mb,
            unused_mb,
            peak_mb: self.peak_bytes as f64 * 1e-6,
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn recycled_count(&self) -> usize {
        self.recycled.len()
    }

    /// Largest number of simultaneously active slots seen.
    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }

    pub fn is_active(&self, id: TextureId) -> bool {
        self.active.iter().any(|slot| slot.id == id)
    }

    pub fn is_recycled(&self, id: TextureId) -> bool {
        self.recycled.iter().any(|slot| slot.id == id)
    }

    /// Delete every slot, active and recycled, in one backend call.
    pub fn purge(&mut self, gpu: &mut dyn GraphicsBackend) {
        if self.active.is_empty() && self.recycled.is_empty() {
            return;
        }
        let ids: Vec<TextureId> = self
            .recycled
            .drain(..)
            .chain(self.active.drain(..))
            .map(|slot| slot.id)
            .collect();
        gpu.delete_textures(&ids);
        self.bound.fill(TextureId::NONE);
        self.used_bytes = 0;
        self.log_usage();
    }

    fn reclaim_at(&mut self, index: usize) {
        let slot = self.active.swap_remove(index);
        self.used_bytes -= slot.bytes;
        self.recycled.push_back(slot);
    }

    fn log_usage(&self) {
        let usage = self.usage();
        log::debug!(
            "Video: {:.2} MB of textures ({:.2} MB unused)",
            usage.used_mb,
            usage.unused_mb
        );
    }
}
