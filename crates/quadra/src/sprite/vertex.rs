use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::color::Color;

/// One quad corner as the GPU reads it: 20 bytes, tightly packed.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SpriteVertex {
    pub color: Color,
    pub texcoord: Vec2,
    pub position: Vec2,
}

impl SpriteVertex {
    pub const STRIDE_BYTES: usize = std::mem::size_of::<SpriteVertex>();
}

/// The four corners of a sprite in fixed winding order:
///
/// ```text
/// 3 +-----+ 2
///   |     |
/// 0 +-----+ 1
/// ```
///
/// Triangles (0, 1, 2) and (2, 3, 0) cover the quad for any pose.
pub type Quad = [SpriteVertex; 4];

/// Index pattern of a single quad.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Indices for `sprites` consecutive quads.
pub fn quad_indices(sprites: usize) -> Vec<u16> {
    (0..sprites)
        .flat_map(|i| QUAD_INDICES.map(|k| (i * 4) as u16 + k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(SpriteVertex::STRIDE_BYTES, 20);
        assert_eq!(std::mem::size_of::<Quad>(), 80);
    }

    #[test]
    fn indices_follow_fixed_winding() {
        let indices = quad_indices(2);
        assert_eq!(indices, vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
    }
}
