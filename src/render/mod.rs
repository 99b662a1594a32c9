//! Render module
//!
//! Uploads decoded frames to GPU textures for display.

mod frame_texture;

pub use frame_texture::FrameTexture;
