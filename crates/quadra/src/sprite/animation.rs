//! Frame-sequence animation.
//!
//! Cycles a sprite through atlas regions at a fixed rate by calling
//! `set_texture` on each frame boundary.

use super::batch::{SpriteBatch, SpriteRef};
use crate::error::RenderResult;

#[derive(Debug, Clone)]
pub struct SpriteAnimation {
    sprite: SpriteRef,
    /// Atlas region per frame.
    frames: Vec<u32>,
    /// Seconds per frame.
    frame_duration: f32,
    /// Frame intervals to hold the last frame before looping; negative means
    /// play once and stop.
    delay: i32,
    frame: usize,
    idled: i32,
    timer: f32,
    stopped: bool,
}

impl SpriteAnimation {
    pub fn new(sprite: SpriteRef, frames: Vec<u32>, fps: u32, delay: i32) -> Self {
        Self {
            sprite,
            frames,
            frame_duration: 1.0 / fps.max(1) as f32,
            delay,
            frame: 0,
            idled: 0,
            timer: 0.0,
            stopped: true,
        }
    }

    /// Loop forever with no pause on the last frame.
    pub fn looping(sprite: SpriteRef, frames: Vec<u32>, fps: u32) -> Self {
        Self::new(sprite, frames, fps, 0)
    }

    pub fn sprite(&self) -> SpriteRef {
        self.sprite
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Index into `frames` of the next frame to show.
    pub fn current_frame(&self) -> usize {
        self.frame
    }

    pub fn start(&mut self) {
        self.stopped = false;
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Rewind to the first frame without changing play state.
    pub fn reset(&mut self) {
        self.frame = 0;
        self.idled = 0;
        self.timer = 0.0;
    }

    /// Swap the frame list and rewind.
    pub fn set_frames(&mut self, frames: Vec<u32>) {
        self.frames = frames;
        self.reset();
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.frame_duration = 1.0 / fps.max(1) as f32;
    }

    /// Advance by `dt` seconds, applying every frame boundary crossed.
    /// Returns whether a frame was applied.
    pub fn tick(&mut self, dt: f32, batch: &mut SpriteBatch) -> RenderResult<bool> {
        if self.stopped || self.frames.is_empty() {
            return Ok(false);
        }

        self.timer += dt;
        let mut applied = false;
        while self.timer >= self.frame_duration {
            self.timer -= self.frame_duration;
            self.step(batch)?;
            applied = true;
            if self.stopped {
                break;
            }
        }
        Ok(applied)
    }

    fn step(&mut self, batch: &mut SpriteBatch) -> RenderResult<()> {
        batch.sprite_mut(self.sprite)?.set_texture(self.frames[self.frame])?;

        if self.frame + 1 < self.frames.len() {
            self.frame += 1;
        } else if self.delay < 0 {
            self.stop();
        } else if self.idled < self.delay {
            self.idled += 1;
        } else {
            self.frame = 0;
            self.idled = 0;
        }
        Ok(())
    }
}
