use std::borrow::Cow;

use crate::error::{rejected, RenderError, RenderResult};

/// Pixel layout of texture storage on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba,
    Rgb,
    /// Single luminance channel.
    Gray,
    /// Luminance + alpha.
    GrayAlpha,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba => 4,
            PixelFormat::Rgb => 3,
            PixelFormat::Gray => 1,
            PixelFormat::GrayAlpha => 2,
        }
    }
}

/// Channel layout as produced by the image decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelLayout {
    Rgba,
    Rgb,
    Gray,
    GrayAlpha,
    /// One byte per pixel indexing into an RGB palette.
    Palette(Vec<[u8; 3]>),
}

/// A decoded image handed over by the asset loader. This crate never parses
/// encoded formats itself.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub layout: ChannelLayout,
    pub data: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, layout: ChannelLayout, data: Vec<u8>) -> Self {
        Self { width, height, layout, data }
    }

    /// Solid RGBA image, handy for placeholders and tests.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba.repeat(width as usize * height as usize);
        Self::new(width, height, ChannelLayout::Rgba, data)
    }

    /// Storage format this image uploads as. Palette images become RGB.
    pub fn pixel_format(&self) -> PixelFormat {
        match self.layout {
            ChannelLayout::Rgba => PixelFormat::Rgba,
            ChannelLayout::Rgb | ChannelLayout::Palette(_) => PixelFormat::Rgb,
            ChannelLayout::Gray => PixelFormat::Gray,
            ChannelLayout::GrayAlpha => PixelFormat::GrayAlpha,
        }
    }

    /// Validate the image and return the bytes to upload, expanding palettes.
    pub fn upload_pixels(&self) -> RenderResult<(PixelFormat, Cow<'_, [u8]>)> {
        if self.width == 0 || self.height == 0 || self.data.is_empty() {
            return Err(rejected(RenderError::EmptyImage));
        }

        let pixels = self.width as usize * self.height as usize;
        let stored_bpp = match self.layout {
            ChannelLayout::Palette(_) => 1,
            _ => self.pixel_format().bytes_per_pixel(),
        };
        let expected = pixels * stored_bpp;
        if self.data.len() != expected {
            return Err(rejected(RenderError::ImageSizeMismatch {
                expected,
                actual: self.data.len(),
            }));
        }

        let format = self.pixel_format();
        match &self.layout {
            ChannelLayout::Palette(palette) => {
                let mut rgb = Vec::with_capacity(pixels * 3);
                for &index in &self.data {
                    let entry = palette.get(index as usize).ok_or_else(|| {
                        rejected(RenderError::PaletteIndex { index, len: palette.len() })
                    })?;
                    rgb.extend_from_slice(entry);
                }
                Ok((format, Cow::Owned(rgb)))
            }
            _ => Ok((format, Cow::Borrowed(&self.data))),
        }
    }
}
