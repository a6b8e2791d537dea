//! GPU backend abstraction layer.
//!
//! Each backend implements the [`GpuBackend`] trait, which provides:
//! - Resource creation (buffers, textures, samplers, pipelines)
//! - Host access to buffer memory (write, flush, read back)
//!
//! Only the in-process [`DummyBackend`](dummy::DummyBackend) ships with this
//! crate. It keeps buffer memory on the CPU and models the split between
//! host-written and device-visible memory, so code that forgets to flush is
//! observable in tests.

pub mod dummy;

use crate::error::GraphicsError;
use crate::pipeline::{ComputePipelineDescriptor, RenderPipelineDescriptor};
use crate::types::{BufferDescriptor, SamplerDescriptor, TextureDescriptor};

/// Handle to a GPU buffer resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GpuBuffer {
    /// Dummy backend allocation, keyed by id.
    Dummy {
        /// Allocation id within the backend.
        id: u64,
    },
}

/// Handle to a GPU texture resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GpuTexture {
    /// Dummy backend (no GPU allocation).
    Dummy,
}

/// Handle to a GPU sampler resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GpuSampler {
    /// Dummy backend (no GPU allocation).
    Dummy,
}

/// Handle to a compiled pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GpuPipeline {
    /// Dummy backend (no GPU object).
    Dummy,
}

/// GPU backend trait for abstracting different GPU APIs.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Create a buffer resource.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError>;

    /// Release a buffer's memory.
    fn destroy_buffer(&self, buffer: &GpuBuffer);

    /// Create a texture resource.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError>;

    /// Create a sampler resource.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<GpuSampler, GraphicsError>;

    /// Create a render pipeline.
    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<GpuPipeline, GraphicsError>;

    /// Create a compute pipeline.
    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<GpuPipeline, GraphicsError>;

    /// Write host data into a buffer's mapped memory.
    ///
    /// The data is not guaranteed to be visible to the device until the range
    /// is flushed with [`GpuBackend::flush_buffer`].
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8])
        -> Result<(), GraphicsError>;

    /// Make a previously written range visible to the device.
    fn flush_buffer(&self, buffer: &GpuBuffer, offset: u64, size: u64)
        -> Result<(), GraphicsError>;

    /// Read device-visible buffer contents.
    fn read_buffer(&self, buffer: &GpuBuffer, offset: u64, size: u64)
        -> Result<Vec<u8>, GraphicsError>;
}
