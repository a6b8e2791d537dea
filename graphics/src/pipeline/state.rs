//! Compiled pipeline objects.

use std::sync::{Arc, Weak};

use crate::backend::GpuPipeline;
use crate::device::GraphicsDevice;
use crate::shader::PipelineReflection;

use super::descriptor::{ComputePipelineDescriptor, RenderPipelineDescriptor};

/// A compiled render pipeline together with its merged reflection.
///
/// Created by [`GraphicsDevice::create_render_pipeline`].
pub struct RenderPipelineState {
    device: Weak<GraphicsDevice>,
    descriptor: RenderPipelineDescriptor,
    reflection: PipelineReflection,
    gpu_handle: GpuPipeline,
}

impl RenderPipelineState {
    pub(crate) fn new(
        device: Weak<GraphicsDevice>,
        descriptor: RenderPipelineDescriptor,
        reflection: PipelineReflection,
        gpu_handle: GpuPipeline,
    ) -> Self {
        Self {
            device,
            descriptor,
            reflection,
            gpu_handle,
        }
    }

    /// Get the parent device, if it still exists.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    /// Descriptor the pipeline was created from.
    pub fn descriptor(&self) -> &RenderPipelineDescriptor {
        &self.descriptor
    }

    /// Resources, inputs and push constants of all stages.
    pub fn reflection(&self) -> &PipelineReflection {
        &self.reflection
    }

    /// Get the backend handle.
    pub fn gpu_handle(&self) -> &GpuPipeline {
        &self.gpu_handle
    }

    /// Get the pipeline label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

impl std::fmt::Debug for RenderPipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipelineState")
            .field("label", &self.descriptor.label)
            .field("resources", &self.reflection.resources.len())
            .field("topology", &self.descriptor.primitive_topology)
            .finish()
    }
}

/// A compiled compute pipeline together with its reflection.
///
/// Created by [`GraphicsDevice::create_compute_pipeline`].
pub struct ComputePipelineState {
    device: Weak<GraphicsDevice>,
    descriptor: ComputePipelineDescriptor,
    reflection: PipelineReflection,
    gpu_handle: GpuPipeline,
}

impl ComputePipelineState {
    pub(crate) fn new(
        device: Weak<GraphicsDevice>,
        descriptor: ComputePipelineDescriptor,
        reflection: PipelineReflection,
        gpu_handle: GpuPipeline,
    ) -> Self {
        Self {
            device,
            descriptor,
            reflection,
            gpu_handle,
        }
    }

    /// Get the parent device, if it still exists.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    /// Resources and push constants of the compute stage.
    pub fn reflection(&self) -> &PipelineReflection {
        &self.reflection
    }

    /// Get the backend handle.
    pub fn gpu_handle(&self) -> &GpuPipeline {
        &self.gpu_handle
    }

    /// Get the pipeline label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

impl std::fmt::Debug for ComputePipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputePipelineState")
            .field("label", &self.descriptor.label)
            .field("resources", &self.reflection.resources.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(RenderPipelineState: Send, Sync);
static_assertions::assert_impl_all!(ComputePipelineState: Send, Sync);
