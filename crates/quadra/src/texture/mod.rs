pub mod atlas;
pub mod image;
pub mod manager;

pub use atlas::{TextureAtlas, TextureRegion};
pub use image::{ChannelLayout, DecodedImage, PixelFormat};
pub use manager::{MemoryUsage, TextureFilter, TextureManager, TextureSlot};
