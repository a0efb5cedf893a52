//! Timed pose transitions: move, rotate and scale a sprite toward a target
//! over a duration with an easing curve.
//!
//! Transitions go through the ordinary pose setters, so they mark sprites
//! stale exactly as a manual call would. Keep one `Transitions` per batch.

use glam::Vec2;

use super::batch::{SpriteBatch, SpriteRef};
use crate::error::{rejected, RenderError, RenderResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
}

impl Easing {
    /// Map linear progress `t` (clamped to [0, 1]) onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    Position { from: Vec2, to: Vec2 },
    Rotation { from: f32, to: f32 },
    Scale { from: Vec2, to: Vec2 },
}

impl Target {
    fn same_kind(&self, other: &Target) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone)]
struct Transition {
    sprite: SpriteRef,
    target: Target,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

impl Transition {
    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }
}

#[derive(Debug, Default)]
pub struct Transitions {
    active: Vec<Transition>,
}

impl Transitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `sprite` from its current position to `to`.
    pub fn move_to(
        &mut self,
        batch: &SpriteBatch,
        sprite: SpriteRef,
        to: Vec2,
        duration: f32,
        easing: Easing,
    ) -> RenderResult<()> {
        let from = batch.sprite(sprite)?.position();
        self.push(sprite, Target::Position { from, to }, duration, easing);
        Ok(())
    }

    /// Rotate `sprite` from its current angle to `to` radians.
    pub fn rotate_to(
        &mut self,
        batch: &SpriteBatch,
        sprite: SpriteRef,
        to: f32,
        duration: f32,
        easing: Easing,
    ) -> RenderResult<()> {
        let from = batch.sprite(sprite)?.angle();
        self.push(sprite, Target::Rotation { from, to }, duration, easing);
        Ok(())
    }

    /// Scale `sprite` from its current factor to `to`, which must be
    /// strictly positive on both axes.
    pub fn scale_to(
        &mut self,
        batch: &SpriteBatch,
        sprite: SpriteRef,
        to: Vec2,
        duration: f32,
        easing: Easing,
    ) -> RenderResult<()> {
        if !(to.x > 0.0 && to.y > 0.0) {
            return Err(rejected(RenderError::InvalidScale { x: to.x, y: to.y }));
        }
        let from = batch.sprite(sprite)?.scale();
        self.push(sprite, Target::Scale { from, to }, duration, easing);
        Ok(())
    }

    fn push(&mut self, sprite: SpriteRef, target: Target, duration: f32, easing: Easing) {
        // A newer transition of the same kind on the same sprite wins.
        self.active
            .retain(|t| !(t.sprite == sprite && t.target.same_kind(&target)));
        self.active.push(Transition {
            sprite,
            target,
            duration,
            elapsed: 0.0,
            easing,
        });
    }

    /// Drop every transition on `sprite`.
    pub fn cancel(&mut self, sprite: SpriteRef) {
        self.active.retain(|t| t.sprite != sprite);
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Advance every transition by `dt` seconds and apply the eased pose.
    /// Finished transitions land exactly on their target and are removed.
    /// Returns how many finished this tick.
    pub fn tick(&mut self, dt: f32, batch: &mut SpriteBatch) -> RenderResult<usize> {
        let before = self.active.len();
        let mut result = Ok(());

        self.active.retain_mut(|t| {
            if result.is_err() {
                return true;
            }
            t.elapsed += dt;
            let p = t.progress();
            let k = t.easing.apply(p);

            let applied = batch.sprite_mut(t.sprite).and_then(|mut s| match t.target {
                Target::Position { from, to } => {
                    s.set_position(from.lerp(to, k));
                    Ok(())
                }
                Target::Rotation { from, to } => {
                    s.set_rotation(from + (to - from) * k);
                    Ok(())
                }
                Target::Scale { from, to } => s.set_scale(from.lerp(to, k)),
            });
            match applied {
                Ok(()) => p < 1.0,
                Err(e) => {
                    result = Err(e);
                    true
                }
            }
        });

        result.map(|()| before - self.active.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::gpu::context::RenderContext;
    use crate::gpu::recording::RecordingBackend;
    use crate::sprite::sprite::Staleness;
    use crate::texture::atlas::TextureAtlas;
    use crate::texture::image::DecodedImage;
    use std::rc::Rc;

    fn setup() -> (RenderContext<RecordingBackend>, SpriteBatch, SpriteRef) {
        let mut ctx = RenderContext::new(RecordingBackend::new(), RenderConfig::default()).unwrap();
        let atlas = TextureAtlas::from_image(&mut ctx, &DecodedImage::solid(8, 8, [0; 4])).unwrap();
        let mut batch = SpriteBatch::new(&mut ctx, Rc::new(atlas), 2).unwrap();
        let sprite = batch.create_sprite(8, 8).unwrap();
        (ctx, batch, sprite)
    }

    #[test]
    fn easing_endpoints() {
        for e in [
            Easing::Linear,
            Easing::QuadIn,
            Easing::QuadOut,
            Easing::QuadInOut,
            Easing::CubicIn,
            Easing::CubicOut,
            Easing::CubicInOut,
        ] {
            assert!(e.apply(0.0).abs() < 1e-6, "{e:?}");
            assert!((e.apply(1.0) - 1.0).abs() < 1e-6, "{e:?}");
        }
        assert_eq!(Easing::QuadIn.apply(0.5), 0.25);
        assert_eq!(Easing::QuadInOut.apply(0.5), 0.5);
        assert_eq!(Easing::Linear.apply(2.0), 1.0);
    }

    #[test]
    fn move_reaches_target_and_finishes() {
        let (mut ctx, mut batch, sprite) = setup();
        batch.update(&mut ctx).unwrap();

        let mut transitions = Transitions::new();
        transitions
            .move_to(&batch, sprite, Vec2::new(10.0, 0.0), 1.0, Easing::Linear)
            .unwrap();

        assert_eq!(transitions.tick(0.5, &mut batch).unwrap(), 0);
        let s = batch.sprite(sprite).unwrap();
        assert_eq!(s.position(), Vec2::new(5.0, 0.0));
        assert_eq!(s.staleness(), Staleness::PositionOnly);

        assert_eq!(transitions.tick(0.75, &mut batch).unwrap(), 1);
        assert_eq!(batch.sprite(sprite).unwrap().position(), Vec2::new(10.0, 0.0));
        assert!(transitions.is_empty());
    }

    #[test]
    fn rotate_and_scale_run_side_by_side() {
        let (_ctx, mut batch, sprite) = setup();
        let mut transitions = Transitions::new();
        transitions.rotate_to(&batch, sprite, 1.0, 1.0, Easing::Linear).unwrap();
        transitions
            .scale_to(&batch, sprite, Vec2::splat(3.0), 2.0, Easing::Linear)
            .unwrap();
        assert_eq!(transitions.len(), 2);

        assert_eq!(transitions.tick(1.0, &mut batch).unwrap(), 1);
        let s = batch.sprite(sprite).unwrap();
        assert_eq!(s.angle(), 1.0);
        assert_eq!(s.scale(), Vec2::splat(2.0));
        assert_eq!(transitions.len(), 1);
    }

    #[test]
    fn same_kind_replaces_previous() {
        let (_ctx, mut batch, sprite) = setup();
        let mut transitions = Transitions::new();
        transitions.move_to(&batch, sprite, Vec2::new(100.0, 0.0), 1.0, Easing::Linear).unwrap();
        transitions.move_to(&batch, sprite, Vec2::new(0.0, 4.0), 1.0, Easing::Linear).unwrap();
        assert_eq!(transitions.len(), 1);

        transitions.tick(1.0, &mut batch).unwrap();
        assert_eq!(batch.sprite(sprite).unwrap().position(), Vec2::new(0.0, 4.0));
    }

    #[test]
    fn zero_duration_snaps() {
        let (_ctx, mut batch, sprite) = setup();
        let mut transitions = Transitions::new();
        transitions.rotate_to(&batch, sprite, 0.5, 0.0, Easing::CubicOut).unwrap();
        assert_eq!(transitions.tick(0.0, &mut batch).unwrap(), 1);
        assert_eq!(batch.sprite(sprite).unwrap().angle(), 0.5);
    }

    #[test]
    fn rejects_non_positive_scale_target() {
        let (_ctx, batch, sprite) = setup();
        let mut transitions = Transitions::new();
        assert!(matches!(
            transitions.scale_to(&batch, sprite, Vec2::new(1.0, 0.0), 1.0, Easing::Linear),
            Err(RenderError::InvalidScale { .. })
        ));
        assert!(transitions.is_empty());
    }

    #[test]
    fn cancel_removes_sprite_transitions() {
        let (_ctx, mut batch, sprite) = setup();
        let other = batch.create_sprite(4, 4).unwrap();
        let mut transitions = Transitions::new();
        transitions.rotate_to(&batch, sprite, 1.0, 1.0, Easing::Linear).unwrap();
        transitions.rotate_to(&batch, other, 1.0, 1.0, Easing::Linear).unwrap();
        transitions.cancel(sprite);
        transitions.tick(1.0, &mut batch).unwrap();
        assert_eq!(batch.sprite(sprite).unwrap().angle(), 0.0);
        assert_eq!(batch.sprite(other).unwrap().angle(), 1.0);
    }
}
