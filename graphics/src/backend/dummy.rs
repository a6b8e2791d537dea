//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations. Buffers are backed by
//! two CPU byte vectors: the host-mapped copy that writes land in, and the
//! device-visible copy that flushes publish to and reads come from.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::pipeline::{ComputePipelineDescriptor, RenderPipelineDescriptor};
use crate::types::{BufferDescriptor, SamplerDescriptor, TextureDescriptor};

use super::{GpuBackend, GpuBuffer, GpuPipeline, GpuSampler, GpuTexture};

#[derive(Debug)]
struct DummyMemory {
    mapped: Vec<u8>,
    visible: Vec<u8>,
}

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    memory: Mutex<HashMap<u64, DummyMemory>>,
    next_id: AtomicU64,
    flush_count: AtomicU64,
    pipeline_count: AtomicU64,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of flushes performed so far.
    pub fn flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::Relaxed)
    }

    /// Number of pipelines created so far.
    pub fn pipeline_count(&self) -> u64 {
        self.pipeline_count.load(Ordering::Relaxed)
    }

    /// Total bytes of live buffer allocations.
    pub fn allocated_bytes(&self) -> u64 {
        self.memory
            .lock()
            .values()
            .map(|m| m.mapped.len() as u64)
            .sum()
    }

    fn with_memory<R>(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        size: u64,
        f: impl FnOnce(&mut DummyMemory, std::ops::Range<usize>) -> R,
    ) -> Result<R, GraphicsError> {
        let GpuBuffer::Dummy { id } = buffer;
        let mut memory = self.memory.lock();
        let entry = memory.get_mut(id).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("buffer {id} is not allocated"))
        })?;

        let end = offset.checked_add(size).filter(|&end| end <= entry.mapped.len() as u64);
        let Some(end) = end else {
            return Err(GraphicsError::InvalidParameter(format!(
                "range {offset}+{size} exceeds buffer {id} of {} bytes",
                entry.mapped.len()
            )));
        };
        Ok(f(entry, offset as usize..end as usize))
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError> {
        let size = usize::try_from(descriptor.size).map_err(|_| {
            GraphicsError::ResourceCreationFailed(format!(
                "buffer size {} does not fit in host memory",
                descriptor.size
            ))
        })?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.memory.lock().insert(
            id,
            DummyMemory {
                mapped: vec![0; size],
                visible: vec![0; size],
            },
        );
        log::trace!(
            "DummyBackend: creating buffer {:?} (id: {}, size: {})",
            descriptor.label,
            id,
            descriptor.size
        );
        Ok(GpuBuffer::Dummy { id })
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        let GpuBuffer::Dummy { id } = buffer;
        if self.memory.lock().remove(id).is_some() {
            log::trace!("DummyBackend: destroyed buffer {}", id);
        }
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError> {
        log::trace!(
            "DummyBackend: creating texture {:?} ({}x{}x{})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth
        );
        Ok(GpuTexture::Dummy)
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<GpuSampler, GraphicsError> {
        log::trace!("DummyBackend: creating sampler {:?}", descriptor.label);
        Ok(GpuSampler::Dummy)
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<GpuPipeline, GraphicsError> {
        self.pipeline_count.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "DummyBackend: creating render pipeline {:?} ({} vertex attributes)",
            descriptor.label,
            descriptor.vertex_input.attributes.len()
        );
        Ok(GpuPipeline::Dummy)
    }

    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<GpuPipeline, GraphicsError> {
        self.pipeline_count.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "DummyBackend: creating compute pipeline {:?}",
            descriptor.label
        );
        Ok(GpuPipeline::Dummy)
    }

    fn write_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        log::trace!(
            "DummyBackend: write_buffer offset={} len={}",
            offset,
            data.len()
        );
        self.with_memory(buffer, offset, data.len() as u64, |memory, range| {
            memory.mapped[range].copy_from_slice(data);
        })
    }

    fn flush_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        size: u64,
    ) -> Result<(), GraphicsError> {
        log::trace!("DummyBackend: flush_buffer offset={} size={}", offset, size);
        self.with_memory(buffer, offset, size, |memory, range| {
            let DummyMemory { mapped, visible } = memory;
            visible[range.clone()].copy_from_slice(&mapped[range]);
        })?;
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn read_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        size: u64,
    ) -> Result<Vec<u8>, GraphicsError> {
        log::trace!("DummyBackend: read_buffer offset={} size={}", offset, size);
        self.with_memory(buffer, offset, size, |memory, range| {
            memory.visible[range].to_vec()
        })
    }
}

static_assertions::assert_impl_all!(DummyBackend: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BufferUsage;

    fn host_buffer(backend: &DummyBackend, size: u64) -> GpuBuffer {
        backend
            .create_buffer(&BufferDescriptor::new(size, BufferUsage::MAP_WRITE))
            .unwrap()
    }

    #[test]
    fn test_writes_are_invisible_until_flushed() {
        let backend = DummyBackend::new();
        let buffer = host_buffer(&backend, 8);

        backend.write_buffer(&buffer, 2, &[1, 2, 3]).unwrap();
        assert_eq!(backend.read_buffer(&buffer, 0, 8).unwrap(), [0; 8]);

        backend.flush_buffer(&buffer, 0, 8).unwrap();
        assert_eq!(
            backend.read_buffer(&buffer, 0, 8).unwrap(),
            [0, 0, 1, 2, 3, 0, 0, 0]
        );
        assert_eq!(backend.flush_count(), 1);
    }

    #[test]
    fn test_partial_flush() {
        let backend = DummyBackend::new();
        let buffer = host_buffer(&backend, 4);

        backend.write_buffer(&buffer, 0, &[9, 9, 9, 9]).unwrap();
        backend.flush_buffer(&buffer, 1, 2).unwrap();
        assert_eq!(backend.read_buffer(&buffer, 0, 4).unwrap(), [0, 9, 9, 0]);
    }

    #[test]
    fn test_out_of_range_access() {
        let backend = DummyBackend::new();
        let buffer = host_buffer(&backend, 4);

        assert!(backend.write_buffer(&buffer, 3, &[1, 2]).is_err());
        assert!(backend.flush_buffer(&buffer, u64::MAX, 2).is_err());
        assert!(backend.read_buffer(&buffer, 0, 5).is_err());
        assert_eq!(backend.flush_count(), 0);
    }

    #[test]
    fn test_destroy_releases_memory() {
        let backend = DummyBackend::new();
        let buffer = host_buffer(&backend, 64);
        assert_eq!(backend.allocated_bytes(), 64);

        backend.destroy_buffer(&buffer);
        assert_eq!(backend.allocated_bytes(), 0);
        assert!(backend.read_buffer(&buffer, 0, 1).is_err());
    }
}
