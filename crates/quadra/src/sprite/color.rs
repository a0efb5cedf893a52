use bytemuck::{Pod, Zeroable};

/// RGBA color, one byte per channel. Defaults to opaque white.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(0xff, 0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 0xff);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack `0xRRGGBBAA`.
    pub const fn from_u32(c: u32) -> Self {
        Self {
            r: (c >> 24) as u8,
            g: (c >> 16) as u8,
            b: (c >> 8) as u8,
            a: c as u8,
        }
    }

    pub const fn to_u32(self) -> u32 {
        (self.r as u32) << 24 | (self.g as u32) << 16 | (self.b as u32) << 8 | self.a as u32
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<u32> for Color {
    fn from(c: u32) -> Self {
        Self::from_u32(c)
    }
}
