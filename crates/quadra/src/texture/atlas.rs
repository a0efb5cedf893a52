//! Texture atlases: one GPU texture partitioned into regions.

use glam::Vec2;

use crate::assets::manifest::AtlasManifest;
use crate::assets::registry::RegionRegistry;
use crate::error::{rejected, RenderError, RenderResult};
use crate::gpu::backend::{GraphicsBackend, TextureId, TextureUpload};
use crate::gpu::context::RenderContext;
use crate::texture::image::{DecodedImage, PixelFormat};

/// Normalized texture-coordinate rectangle inside an atlas. `v` grows
/// downwards, so `v0` is the top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureRegion {
    pub atlas: TextureId,
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl TextureRegion {
    /// Texture coordinates for the quad corners in vertex order
    /// (bottom-left, bottom-right, top-right, top-left).
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.u0, self.v1),
            Vec2::new(self.u1, self.v1),
            Vec2::new(self.u1, self.v0),
            Vec2::new(self.u0, self.v0),
        ]
    }
}

#[derive(Debug)]
pub struct TextureAtlas {
    texture: TextureId,
    width: u32,
    height: u32,
    format: PixelFormat,
    regions: Vec<TextureRegion>,
}

impl TextureAtlas {
    /// Upload `image` as a single texture sized to the full image.
    pub fn from_image<B: GraphicsBackend>(ctx: &mut RenderContext<B>, image: &DecodedImage) -> RenderResult<Self> {
        let (format, pixels) = image.upload_pixels()?;
        let upload = TextureUpload {
            format,
            width: image.width,
            height: image.height,
            pixels: Some(pixels.as_ref()),
        };
        let texture = ctx.textures.create(&mut ctx.backend, &upload)?;
        log::debug!(
            "atlas {}: {}x{} {:?}",
            texture.0,
            image.width,
            image.height,
            format
        );
        Ok(Self {
            texture,
            width: image.width,
            height: image.height,
            format,
            regions: Vec::new(),
        })
    }

    /// Define a region in pixels. Returns its index, which is the definition
    /// order and never reused.
    pub fn define_region(&mut self, x: i32, y: i32, w: i32, h: i32) -> RenderResult<u32> {
        let (width, height) = (self.width as i64, self.height as i64);
        let (x64, y64, w64, h64) = (x as i64, y as i64, w as i64, h as i64);
        if x64 < 0 || y64 < 0 || w64 < 0 || h64 < 0 || x64 + w64 > width || y64 + h64 > height {
            return Err(rejected(RenderError::RegionOutOfBounds {
                x,
                y,
                w,
                h,
                width: self.width,
                height: self.height,
            }));
        }

        let (fw, fh) = (self.width as f32, self.height as f32);
        let index = self.regions.len() as u32;
        self.regions.push(TextureRegion {
            atlas: self.texture,
            u0: x as f32 / fw,
            v0: y as f32 / fh,
            u1: (x64 + w64) as f32 / fw,
            v1: (y64 + h64) as f32 / fh,
        });
        Ok(index)
    }

    /// Define every region named in `manifest`, in name order, and return the
    /// name lookup. Stops at the first out-of-bounds region.
    pub fn define_regions(&mut self, manifest: &AtlasManifest) -> RenderResult<RegionRegistry> {
        let mut registry = RegionRegistry::new();
        for (name, rect) in manifest.sorted_regions() {
            let index = self.define_region(rect.x, rect.y, rect.w, rect.h)?;
            registry.insert(name, index);
        }
        Ok(registry)
    }

    pub fn region(&self, index: u32) -> Option<&TextureRegion> {
        self.regions.get(index as usize)
    }

    pub(crate) fn region_or_err(&self, index: u32) -> RenderResult<&TextureRegion> {
        self.region(index).ok_or_else(|| {
            rejected(RenderError::UnknownRegion { index, count: self.regions.len() })
        })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bind the atlas texture to unit 0.
    pub fn bind<B: GraphicsBackend>(&self, ctx: &mut RenderContext<B>) {
        ctx.textures.bind(&mut ctx.backend, self.texture);
    }

    /// Bind the atlas texture to `unit`.
    pub fn bind_unit<B: GraphicsBackend>(&self, ctx: &mut RenderContext<B>, unit: u32) -> RenderResult<()> {
        ctx.textures.bind_unit(&mut ctx.backend, self.texture, unit)
    }

    /// Hand the texture back to the slot allocator. Releasing twice is harmless.
    pub fn release<B: GraphicsBackend>(&self, ctx: &mut RenderContext<B>) -> RenderResult<()> {
        ctx.textures.release(&mut ctx.backend, self.texture)
    }
}
