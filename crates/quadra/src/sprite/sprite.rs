//! A sprite is a textured quad.
//!
//! The sprite holds its pose and a staleness marker; the four vertices it
//! renders with live in its batch's vertex arena. Setters only record what
//! changed. `update` brings the vertices up to date, taking the cheap
//! translate-only path when nothing but the position moved.

use std::ops::{Deref, DerefMut};

use glam::Vec2;

use super::color::Color;
use super::vertex::Quad;
use crate::error::{rejected, RenderError, RenderResult};
use crate::texture::atlas::TextureAtlas;

/// How much of a sprite's geometry is out of date.
///
/// Ordered so that marking only ever escalates: `Clean < PositionOnly < Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Staleness {
    #[default]
    Clean,
    /// Only the position moved; shift the existing vertices.
    PositionOnly,
    /// Rotation or scale changed; rebuild all four corners.
    Full,
}

impl Staleness {
    fn escalate(&mut self, to: Staleness) {
        *self = (*self).max(to);
    }
}

#[derive(Debug, Clone)]
pub struct Sprite {
    width: u32,
    height: u32,
    angle: f32,
    pivot: Vec2,
    position: Vec2,
    /// Position the vertices were last written at.
    center: Vec2,
    scale: Vec2,
    stale: Staleness,
}

impl Sprite {
    /// New sprite at the origin, pivot in the middle, unscaled. Starts
    /// `Full`-stale so the first update writes its geometry.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            angle: 0.0,
            pivot: Vec2::splat(0.5),
            position: Vec2::ZERO,
            center: Vec2::ZERO,
            scale: Vec2::ONE,
            stale: Staleness::Full,
        }
    }

    /// Unscaled width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Unscaled height.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn pivot(&self) -> Vec2 {
        self.pivot
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn staleness(&self) -> Staleness {
        self.stale
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.stale.escalate(Staleness::PositionOnly);
    }

    /// Move by `delta`. A zero delta changes nothing.
    pub fn move_by(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        self.position += delta;
        self.stale.escalate(Staleness::PositionOnly);
    }

    /// Set the rotation angle in radians.
    pub fn set_rotation(&mut self, angle: f32) {
        self.angle = angle;
        self.stale.escalate(Staleness::Full);
    }

    /// Rotate by `r` radians. A zero angle changes nothing.
    pub fn rotate_by(&mut self, r: f32) {
        if r == 0.0 {
            return;
        }
        self.angle += r;
        self.stale.escalate(Staleness::Full);
    }

    /// Uniform scale. Does not affect `width`/`height`.
    pub fn set_uniform_scale(&mut self, factor: f32) -> RenderResult<()> {
        self.set_scale(Vec2::splat(factor))
    }

    /// Non-uniform scale; both factors must be strictly positive.
    pub fn set_scale(&mut self, factor: Vec2) -> RenderResult<()> {
        if !(factor.x > 0.0 && factor.y > 0.0) {
            return Err(rejected(RenderError::InvalidScale { x: factor.x, y: factor.y }));
        }
        self.scale = factor;
        self.stale.escalate(Staleness::Full);
        Ok(())
    }

    /// Move the normalized pivot point, `(0, 0)` being the top-left corner.
    ///
    /// The position shifts by the matching amount so the quad stays where it
    /// is on screen; the vertices need no rewrite.
    pub fn set_pivot(&mut self, pivot: Vec2) -> RenderResult<()> {
        let unit = 0.0..=1.0;
        if !(unit.contains(&pivot.x) && unit.contains(&pivot.y)) {
            return Err(rejected(RenderError::InvalidPivot { x: pivot.x, y: pivot.y }));
        }

        let diff = pivot - self.pivot;
        if diff == Vec2::ZERO {
            return Ok(());
        }

        // Local y runs up while pivot y runs down the quad.
        let local = Vec2::new(diff.x * self.width as f32, -diff.y * self.height as f32);
        let shift = if self.angle == 0.0 {
            local * self.scale
        } else {
            let (sin_r, cos_r) = (-self.angle).sin_cos();
            Vec2::new(
                self.scale.x * (cos_r * local.x - sin_r * local.y),
                self.scale.y * (sin_r * local.x + cos_r * local.y),
            )
        };
        self.center += shift;
        self.position += shift;
        self.pivot = pivot;
        Ok(())
    }

    /// Corner offsets around the pivot, before rotation and scale.
    fn local_corners(&self) -> [Vec2; 4] {
        let (w, h) = (self.width as f32, self.height as f32);
        let bottom_left = Vec2::new(w * -self.pivot.x, h * -(1.0 - self.pivot.y));
        let top_right = bottom_left + Vec2::new(w, h);
        [
            bottom_left,
            Vec2::new(top_right.x, bottom_left.y),
            top_right,
            Vec2::new(bottom_left.x, top_right.y),
        ]
    }

    /// Bring `quad`'s positions up to date. Returns whether anything was
    /// written.
    pub(crate) fn update(&mut self, quad: &mut Quad) -> bool {
        match self.stale {
            Staleness::Clean => return false,
            Staleness::PositionOnly => {
                let delta = self.position - self.center;
                for vertex in quad.iter_mut() {
                    vertex.position += delta;
                }
            }
            Staleness::Full => {
                let corners = self.local_corners();
                let center = self.position;
                if self.angle == 0.0 {
                    for (vertex, corner) in quad.iter_mut().zip(corners) {
                        vertex.position = corner * self.scale + center;
                    }
                } else {
                    let (sin_r, cos_r) = (-self.angle).sin_cos();
                    let s_sin = self.scale * sin_r;
                    let s_cos = self.scale * cos_r;
                    for (vertex, p) in quad.iter_mut().zip(corners) {
                        vertex.position = Vec2::new(
                            s_cos.x * p.x - s_sin.x * p.y + center.x,
                            s_sin.y * p.x + s_cos.y * p.y + center.y,
                        );
                    }
                }
            }
        }
        self.center = self.position;
        self.stale = Staleness::Clean;
        true
    }
}

/// Mutable view of a sprite together with its slice of the batch's vertex
/// arena. Pose setters come through `DerefMut<Target = Sprite>`; texture and
/// color writes go straight into the vertices and flag the batch buffer.
pub struct SpriteMut<'a> {
    pub(crate) sprite: &'a mut Sprite,
    pub(crate) quad: &'a mut Quad,
    pub(crate) atlas: &'a TextureAtlas,
    pub(crate) buffer_stale: &'a mut bool,
}

impl SpriteMut<'_> {
    /// Color all four corners.
    pub fn set_color(&mut self, color: Color) {
        for vertex in self.quad.iter_mut() {
            vertex.color = color;
        }
        *self.buffer_stale = true;
    }

    /// Color a single corner (0..4, in vertex order).
    pub fn set_corner_color(&mut self, corner: usize, color: Color) -> RenderResult<()> {
        let vertex = self
            .quad
            .get_mut(corner)
            .ok_or_else(|| rejected(RenderError::InvalidCorner(corner)))?;
        vertex.color = color;
        *self.buffer_stale = true;
        Ok(())
    }

    /// Copy the texture coordinates of atlas region `region`.
    pub fn set_texture(&mut self, region: u32) -> RenderResult<()> {
        let corners = self.atlas.region_or_err(region)?.corners();
        for (vertex, uv) in self.quad.iter_mut().zip(corners) {
            vertex.texcoord = uv;
        }
        *self.buffer_stale = true;
        Ok(())
    }

    /// Flip the texture horizontally. Applying it twice restores the original.
    pub fn mirror(&mut self) {
        let [v0, v1, v2, v3] = &mut *self.quad;
        std::mem::swap(&mut v0.texcoord, &mut v1.texcoord);
        std::mem::swap(&mut v2.texcoord, &mut v3.texcoord);
        *self.buffer_stale = true;
    }

    pub fn texcoords(&self) -> [Vec2; 4] {
        self.quad.map(|v| v.texcoord)
    }

    pub fn colors(&self) -> [Color; 4] {
        self.quad.map(|v| v.color)
    }
}

impl Deref for SpriteMut<'_> {
    type Target = Sprite;

    fn deref(&self) -> &Sprite {
        &*self.sprite
    }
}

impl DerefMut for SpriteMut<'_> {
    fn deref_mut(&mut self) -> &mut Sprite {
        &mut *self.sprite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::vertex::SpriteVertex;
    use std::f32::consts::PI;

    const EPS: f32 = 1e-4;

    fn positions(quad: &Quad) -> [Vec2; 4] {
        quad.map(|v| v.position)
    }

    fn assert_close(a: [Vec2; 4], b: [Vec2; 4]) {
        for (p, q) in a.iter().zip(b.iter()) {
            assert!(p.abs_diff_eq(*q, EPS), "{a:?} != {b:?}");
        }
    }

    fn placed(sprite: &mut Sprite) -> Quad {
        let mut quad = [SpriteVertex::default(); 4];
        assert!(sprite.update(&mut quad));
        quad
    }

    #[test]
    fn first_update_writes_centered_quad() {
        let mut sprite = Sprite::new(10, 20);
        sprite.set_position(Vec2::new(100.0, 50.0));
        let quad = placed(&mut sprite);
        assert_eq!(
            positions(&quad),
            [
                Vec2::new(95.0, 40.0),
                Vec2::new(105.0, 40.0),
                Vec2::new(105.0, 60.0),
                Vec2::new(95.0, 60.0),
            ]
        );
        assert_eq!(sprite.staleness(), Staleness::Clean);
    }

    #[test]
    fn clean_sprite_writes_nothing() {
        let mut sprite = Sprite::new(4, 4);
        let mut quad = placed(&mut sprite);
        assert!(!sprite.update(&mut quad));
    }

    #[test]
    fn staleness_only_escalates() {
        let mut sprite = Sprite::new(4, 4);
        let mut quad = placed(&mut sprite);

        sprite.set_position(Vec2::ONE);
        assert_eq!(sprite.staleness(), Staleness::PositionOnly);
        sprite.set_rotation(1.0);
        assert_eq!(sprite.staleness(), Staleness::Full);
        sprite.set_position(Vec2::ZERO);
        assert_eq!(sprite.staleness(), Staleness::Full);

        sprite.update(&mut quad);
        assert_eq!(sprite.staleness(), Staleness::Clean);
    }

    #[test]
    fn translation_matches_full_recompute() {
        let mut moved = Sprite::new(12, 7);
        moved.set_rotation(0.7);
        moved.set_scale(Vec2::new(2.0, 0.5)).unwrap();
        moved.set_pivot(Vec2::new(0.25, 0.8)).unwrap();
        let mut quad = placed(&mut moved);

        for step in [Vec2::new(3.5, -1.0), Vec2::new(-40.25, 12.0), Vec2::new(7.0, 7.0)] {
            moved.set_position(moved.position() + step);
            moved.update(&mut quad);
        }
        moved.set_position(Vec2::new(15.0, -3.0));
        moved.set_position(Vec2::new(16.0, -2.0));
        moved.update(&mut quad);

        let mut direct = Sprite::new(12, 7);
        direct.set_rotation(0.7);
        direct.set_scale(Vec2::new(2.0, 0.5)).unwrap();
        direct.set_pivot(Vec2::new(0.25, 0.8)).unwrap();
        direct.set_position(moved.position());
        let expected = placed(&mut direct);

        assert_close(positions(&quad), positions(&expected));
    }

    #[test]
    fn rotate_there_and_back() {
        let mut sprite = Sprite::new(10, 20);
        sprite.set_position(Vec2::new(3.0, 4.0));
        let mut quad = placed(&mut sprite);
        let before = positions(&quad);

        sprite.rotate_by(PI);
        sprite.update(&mut quad);
        assert_close(
            positions(&quad),
            [before[2], before[3], before[0], before[1]],
        );

        sprite.rotate_by(-PI);
        sprite.update(&mut quad);
        assert_close(positions(&quad), before);
    }

    #[test]
    fn scale_is_applied_around_pivot() {
        let mut sprite = Sprite::new(10, 10);
        sprite.set_pivot(Vec2::ZERO).unwrap();
        sprite.set_position(Vec2::ZERO);
        sprite.set_uniform_scale(2.0).unwrap();
        let quad = placed(&mut sprite);
        // Pivot at top-left: quad hangs below and to the right of the position.
        assert_eq!(quad[0].position, Vec2::new(0.0, -20.0));
        assert_eq!(quad[2].position, Vec2::new(20.0, 0.0));
    }

    #[test]
    fn pivot_change_keeps_quad_in_place() {
        let mut sprite = Sprite::new(10, 20);
        sprite.set_position(Vec2::new(8.0, 16.0));
        sprite.set_scale(Vec2::new(2.0, 0.5)).unwrap();
        let mut quad = placed(&mut sprite);
        let before = positions(&quad);

        sprite.set_pivot(Vec2::new(0.0, 1.0)).unwrap();
        assert_eq!(sprite.position(), Vec2::new(-2.0, 11.0));
        sprite.set_rotation(0.0);
        sprite.update(&mut quad);
        assert_close(positions(&quad), before);
    }

    #[test]
    fn pivot_change_keeps_rotated_quad_in_place() {
        let mut sprite = Sprite::new(10, 20);
        sprite.set_rotation(0.9);
        let mut quad = placed(&mut sprite);
        let before = positions(&quad);

        sprite.set_pivot(Vec2::new(0.1, 0.7)).unwrap();
        sprite.set_rotation(0.9);
        sprite.update(&mut quad);
        assert_close(positions(&quad), before);
    }

    #[test]
    fn pivot_round_trip_restores_position() {
        let mut sprite = Sprite::new(10, 20);
        sprite.set_position(Vec2::new(32.0, 64.0));
        sprite.set_uniform_scale(2.0).unwrap();

        sprite.set_pivot(Vec2::new(0.25, 0.75)).unwrap();
        assert_ne!(sprite.position(), Vec2::new(32.0, 64.0));
        sprite.set_pivot(Vec2::splat(0.5)).unwrap();
        assert_eq!(sprite.position(), Vec2::new(32.0, 64.0));
    }

    #[test]
    fn invalid_pivot_and_scale_are_rejected() {
        let mut sprite = Sprite::new(4, 4);
        assert!(matches!(
            sprite.set_pivot(Vec2::new(1.5, 0.0)),
            Err(RenderError::InvalidPivot { .. })
        ));
        assert!(sprite.set_pivot(Vec2::new(0.5, -0.1)).is_err());
        assert!(matches!(
            sprite.set_uniform_scale(0.0),
            Err(RenderError::InvalidScale { .. })
        ));
        assert!(sprite.set_scale(Vec2::new(1.0, -2.0)).is_err());
        assert!(sprite.set_scale(Vec2::new(f32::NAN, 1.0)).is_err());
        assert_eq!(sprite.pivot(), Vec2::splat(0.5));
        assert_eq!(sprite.scale(), Vec2::ONE);
    }

    #[test]
    fn zero_move_and_rotate_are_noops() {
        let mut sprite = Sprite::new(4, 4);
        let mut quad = placed(&mut sprite);
        sprite.move_by(Vec2::ZERO);
        sprite.rotate_by(0.0);
        assert_eq!(sprite.staleness(), Staleness::Clean);
        assert!(!sprite.update(&mut quad));
    }
}
