//! GPU resources.
//!
//! This module contains the GPU resource types that are created by [`GraphicsDevice`]:
//! - [`Buffer`] - GPU memory buffer
//! - [`Texture`] - GPU texture/image
//! - [`Sampler`] - Texture sampler
//!
//! Resources are reference-counted with [`Arc`] and can be shared across threads.
//! Materials keep them alive for as long as a property refers to them.
//!
//! [`GraphicsDevice`]: crate::GraphicsDevice
//! [`Arc`]: std::sync::Arc

mod buffer;
mod sampler;
mod texture;

pub use buffer::Buffer;
pub use sampler::Sampler;
pub use texture::Texture;
