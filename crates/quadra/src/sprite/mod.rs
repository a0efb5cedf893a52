pub mod animation;
pub mod batch;
pub mod color;
#[allow(clippy::module_inception)]
pub mod sprite;
pub mod transition;
pub mod vertex;

pub use animation::SpriteAnimation;
pub use batch::{BatchId, SpriteBatch, SpriteRef};
pub use color::Color;
pub use sprite::{Sprite, SpriteMut, Staleness};
pub use transition::{Easing, Transitions};
pub use vertex::{Quad, SpriteVertex};
