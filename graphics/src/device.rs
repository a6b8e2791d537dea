//! Graphics device.
//!
//! The [`GraphicsDevice`] is the main interface for creating GPU resources and
//! pipelines and for moving data into host-visible buffers. It wraps a
//! [`GpuBackend`] and is always passed around explicitly as an
//! `Arc<GraphicsDevice>`; there is no global device.

use std::sync::{Arc, RwLock, Weak};

use crate::backend::dummy::DummyBackend;
use crate::backend::GpuBackend;
use crate::error::GraphicsError;
use crate::materials::{BindingSet, BindingSetLayout};
use crate::pipeline::{
    ComputePipelineDescriptor, ComputePipelineState, RenderPipelineDescriptor, RenderPipelineState,
};
use crate::resources::{Buffer, Sampler, Texture};
use crate::shader::{Shader, ShaderModule};
use crate::types::{BufferDescriptor, SamplerDescriptor, TextureDescriptor};

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum texture dimension.
    pub max_texture_dimension: u32,
    /// Maximum buffer size.
    pub max_buffer_size: u64,
    /// Maximum number of descriptor sets a pipeline may use.
    pub max_binding_sets: u32,
    /// Whether compute shaders are supported.
    pub compute_shaders: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_dimension: 16384,
            max_buffer_size: 1 << 30, // 1 GB
            max_binding_sets: 4,
            compute_shaders: true,
        }
    }
}

impl DeviceCapabilities {
    /// Set the maximum texture dimension.
    pub fn with_max_texture_dimension(mut self, max: u32) -> Self {
        self.max_texture_dimension = max;
        self
    }

    /// Set the maximum buffer size.
    pub fn with_max_buffer_size(mut self, max: u64) -> Self {
        self.max_buffer_size = max;
        self
    }

    /// Set the maximum number of descriptor sets per pipeline.
    pub fn with_max_binding_sets(mut self, max: u32) -> Self {
        self.max_binding_sets = max;
        self
    }

    /// Enable or disable compute shader support.
    pub fn with_compute_shaders(mut self, enabled: bool) -> Self {
        self.compute_shaders = enabled;
        self
    }
}

/// A graphics device for creating GPU resources.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and can be safely shared across threads.
/// All resource creation methods use interior mutability where needed.
///
/// # Example
///
/// ```ignore
/// let device = GraphicsDevice::dummy();
///
/// let buffer = device.create_buffer(
///     &BufferDescriptor::new(192, BufferUsage::UNIFORM | BufferUsage::MAP_WRITE),
/// )?;
/// device.write_buffer(&buffer, 0, bytemuck::bytes_of(&ubo))?;
/// device.flush_buffer(&buffer)?;
/// ```
pub struct GraphicsDevice {
    backend: Arc<dyn GpuBackend>,
    name: String,
    capabilities: DeviceCapabilities,
    // Track allocated resources (weak references for cleanup/debugging)
    buffers: RwLock<Vec<Weak<Buffer>>>,
    textures: RwLock<Vec<Weak<Texture>>>,
    samplers: RwLock<Vec<Weak<Sampler>>>,
    pipelines: RwLock<Vec<Weak<RenderPipelineState>>>,
}

impl GraphicsDevice {
    /// Create a device on `backend` with default capabilities.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Arc<Self> {
        Self::with_capabilities(backend, DeviceCapabilities::default())
    }

    /// Create a device on `backend` with the given capabilities.
    pub fn with_capabilities(
        backend: Arc<dyn GpuBackend>,
        capabilities: DeviceCapabilities,
    ) -> Arc<Self> {
        let name = backend.name().to_string();
        log::debug!("GraphicsDevice: created on {}", name);
        Arc::new(Self {
            backend,
            name,
            capabilities,
            buffers: RwLock::new(Vec::new()),
            textures: RwLock::new(Vec::new()),
            samplers: RwLock::new(Vec::new()),
            pipelines: RwLock::new(Vec::new()),
        })
    }

    /// Create a device on a fresh [`DummyBackend`].
    pub fn dummy() -> Arc<Self> {
        Self::new(Arc::new(DummyBackend::new()))
    }

    /// Get the backend.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Create a GPU buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer size exceeds device limits or allocation fails.
    pub fn create_buffer(
        self: &Arc<Self>,
        descriptor: &BufferDescriptor,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        if descriptor.size > self.capabilities.max_buffer_size {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer size {} exceeds maximum {}",
                descriptor.size, self.capabilities.max_buffer_size
            )));
        }

        if descriptor.size == 0 {
            return Err(GraphicsError::InvalidParameter(
                "buffer size cannot be zero".to_string(),
            ));
        }

        let gpu_handle = self.backend.create_buffer(descriptor)?;
        let buffer = Arc::new(Buffer::new(
            Arc::downgrade(self),
            descriptor.clone(),
            gpu_handle,
        ));

        if let Ok(mut buffers) = self.buffers.write() {
            buffers.push(Arc::downgrade(&buffer));
        }

        log::trace!(
            "GraphicsDevice: created buffer {:?}, size={}",
            descriptor.label,
            descriptor.size
        );

        Ok(buffer)
    }

    /// Create a GPU texture.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture dimensions exceed device limits or allocation fails.
    pub fn create_texture(
        self: &Arc<Self>,
        descriptor: &TextureDescriptor,
    ) -> Result<Arc<Texture>, GraphicsError> {
        let max_dim = self.capabilities.max_texture_dimension;
        if descriptor.size.max_dimension() > max_dim {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture dimension exceeds maximum {max_dim}"
            )));
        }

        if descriptor.size.is_empty() {
            return Err(GraphicsError::InvalidParameter(
                "texture dimensions cannot be zero".to_string(),
            ));
        }

        let max_mips = descriptor.full_mip_chain();
        if descriptor.mip_level_count == 0 || descriptor.mip_level_count > max_mips {
            return Err(GraphicsError::InvalidParameter(format!(
                "mip level count {} outside 1..={}",
                descriptor.mip_level_count, max_mips
            )));
        }

        let gpu_handle = self.backend.create_texture(descriptor)?;
        let texture = Arc::new(Texture::new(
            Arc::clone(self),
            descriptor.clone(),
            gpu_handle,
        ));

        if let Ok(mut textures) = self.textures.write() {
            textures.push(Arc::downgrade(&texture));
        }

        log::trace!(
            "GraphicsDevice: created texture {:?}, size={}x{}",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height
        );

        Ok(texture)
    }

    /// Create a texture sampler.
    ///
    /// # Errors
    ///
    /// Returns an error if sampler creation fails.
    pub fn create_sampler(
        self: &Arc<Self>,
        descriptor: &SamplerDescriptor,
    ) -> Result<Arc<Sampler>, GraphicsError> {
        let gpu_handle = self.backend.create_sampler(descriptor)?;
        let sampler = Arc::new(Sampler::new(
            Arc::downgrade(self),
            descriptor.clone(),
            gpu_handle,
        ));

        if let Ok(mut samplers) = self.samplers.write() {
            samplers.push(Arc::downgrade(&sampler));
        }

        log::trace!("GraphicsDevice: created sampler {:?}", descriptor.label);

        Ok(sampler)
    }

    /// Load a shader onto the device.
    pub fn create_shader_module(&self, shader: &Arc<Shader>) -> ShaderModule {
        log::trace!(
            "GraphicsDevice: created shader module {:?} ({:?})",
            shader.label(),
            shader.stage()
        );
        ShaderModule::new(Arc::clone(shader))
    }

    /// Create a render pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the stages are missing or of the wrong kind, a
    /// vertex shader input is not fed with a matching format, an attachment
    /// format is unusable, or the pipeline uses more descriptor sets than the
    /// device supports.
    pub fn create_render_pipeline(
        self: &Arc<Self>,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<Arc<RenderPipelineState>, GraphicsError> {
        let reflection = descriptor.reflect()?;
        self.check_binding_sets(&reflection.set_indices())?;

        let gpu_handle = self.backend.create_render_pipeline(descriptor)?;
        let pipeline = Arc::new(RenderPipelineState::new(
            Arc::downgrade(self),
            descriptor.clone(),
            reflection,
            gpu_handle,
        ));

        if let Ok(mut pipelines) = self.pipelines.write() {
            pipelines.push(Arc::downgrade(&pipeline));
        }

        log::trace!(
            "GraphicsDevice: created render pipeline {:?}, resources={}",
            descriptor.label,
            pipeline.reflection().resources.len()
        );

        Ok(pipeline)
    }

    /// Create a compute pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::FeatureNotSupported`] if the device has no
    /// compute support, or an error if the function is missing or not a
    /// compute function.
    pub fn create_compute_pipeline(
        self: &Arc<Self>,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<Arc<ComputePipelineState>, GraphicsError> {
        if !self.capabilities.compute_shaders {
            return Err(GraphicsError::FeatureNotSupported(
                "compute shaders".to_string(),
            ));
        }
        let reflection = descriptor.reflect()?;
        self.check_binding_sets(&reflection.set_indices())?;

        let gpu_handle = self.backend.create_compute_pipeline(descriptor)?;

        log::trace!(
            "GraphicsDevice: created compute pipeline {:?}",
            descriptor.label
        );

        Ok(Arc::new(ComputePipelineState::new(
            Arc::downgrade(self),
            descriptor.clone(),
            reflection,
            gpu_handle,
        )))
    }

    /// Create an empty binding set for `layout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the set index exceeds the device's descriptor set limit.
    pub fn create_binding_set(
        &self,
        layout: Arc<BindingSetLayout>,
    ) -> Result<BindingSet, GraphicsError> {
        self.check_binding_sets(&[layout.set])?;
        log::trace!(
            "GraphicsDevice: created binding set {} with {} entries",
            layout.set,
            layout.entries.len()
        );
        Ok(BindingSet::new(layout))
    }

    /// Write `data` into a host-writable buffer at `offset`.
    ///
    /// The device does not see the data until [`GraphicsDevice::flush_buffer`]
    /// or [`GraphicsDevice::flush_buffer_range`] is called.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer was not created with `MAP_WRITE` or the
    /// range exceeds the buffer.
    pub fn write_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        if !buffer.descriptor().is_host_writable() {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer {:?} is not host writable",
                buffer.label()
            )));
        }
        self.check_range(buffer, offset, data.len() as u64)?;
        self.backend.write_buffer(buffer.gpu_handle(), offset, data)
    }

    /// Make the whole buffer visible to the device.
    pub fn flush_buffer(&self, buffer: &Buffer) -> Result<(), GraphicsError> {
        self.flush_buffer_range(buffer, 0, buffer.size())
    }

    /// Make a range of the buffer visible to the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the range exceeds the buffer.
    pub fn flush_buffer_range(
        &self,
        buffer: &Buffer,
        offset: u64,
        size: u64,
    ) -> Result<(), GraphicsError> {
        self.check_range(buffer, offset, size)?;
        self.backend.flush_buffer(buffer.gpu_handle(), offset, size)
    }

    /// Read back device-visible buffer contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the range exceeds the buffer.
    pub fn read_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        size: u64,
    ) -> Result<Vec<u8>, GraphicsError> {
        self.check_range(buffer, offset, size)?;
        self.backend.read_buffer(buffer.gpu_handle(), offset, size)
    }

    fn check_range(&self, buffer: &Buffer, offset: u64, size: u64) -> Result<(), GraphicsError> {
        match offset.checked_add(size) {
            Some(end) if end <= buffer.size() => Ok(()),
            _ => Err(GraphicsError::InvalidParameter(format!(
                "range {offset}+{size} exceeds buffer {:?} of {} bytes",
                buffer.label(),
                buffer.size()
            ))),
        }
    }

    fn check_binding_sets(&self, sets: &[u32]) -> Result<(), GraphicsError> {
        let max = self.capabilities.max_binding_sets;
        match sets.iter().find(|&&set| set >= max) {
            Some(set) => Err(GraphicsError::InvalidParameter(format!(
                "descriptor set {set} exceeds device limit of {max} sets"
            ))),
            None => Ok(()),
        }
    }

    /// Get the number of live buffers created by this device.
    pub fn buffer_count(&self) -> usize {
        self.buffers
            .read()
            .map(|b| b.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Get the number of live textures created by this device.
    pub fn texture_count(&self) -> usize {
        self.textures
            .read()
            .map(|t| t.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Get the number of live samplers created by this device.
    pub fn sampler_count(&self) -> usize {
        self.samplers
            .read()
            .map(|s| s.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Get the number of live render pipelines created by this device.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines
            .read()
            .map(|p| p.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Clean up dead weak references to released resources.
    pub fn cleanup_dead_resources(&self) {
        if let Ok(mut buffers) = self.buffers.write() {
            buffers.retain(|w| w.strong_count() > 0);
        }
        if let Ok(mut textures) = self.textures.write() {
            textures.retain(|w| w.strong_count() > 0);
        }
        if let Ok(mut samplers) = self.samplers.write() {
            samplers.retain(|w| w.strong_count() > 0);
        }
        if let Ok(mut pipelines) = self.pipelines.write() {
            pipelines.retain(|w| w.strong_count() > 0);
        }
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::mesh::{VertexAttributeFormat, VertexBufferLayout};
    use crate::pipeline::{ColorAttachmentDescriptor, VertexInputAttribute, VertexInputDescriptor};
    use crate::shader::{
        ShaderAttribute, ShaderDataType, ShaderReflection, ShaderResource, ShaderStage,
    };
    use crate::types::{BufferUsage, TextureFormat, TextureUsage};

    fn function(
        device: &GraphicsDevice,
        reflection: ShaderReflection,
    ) -> Arc<crate::ShaderFunction> {
        let shader = Arc::new(Shader::new(reflection));
        device
            .create_shader_module(&shader)
            .create_function("main")
            .unwrap()
    }

    fn sampled_2d(width: u32, height: u32) -> TextureDescriptor {
        TextureDescriptor::new_2d(
            width,
            height,
            TextureFormat::Rgba8Unorm,
            TextureUsage::TEXTURE_BINDING,
        )
    }

    fn vertex_reflection() -> ShaderReflection {
        ShaderReflection::new(ShaderStage::Vertex)
            .with_input(ShaderAttribute::new("inPos", 0, ShaderDataType::Float32x3))
            .with_resource(ShaderResource::buffer("ubo", 0, 0, 64))
    }

    fn position_input(format: VertexAttributeFormat) -> VertexInputDescriptor {
        VertexInputDescriptor::new()
            .with_layout(VertexBufferLayout::new(12))
            .with_attribute(VertexInputAttribute {
                location: 0,
                format,
                offset: 0,
                buffer_index: 0,
            })
    }

    #[test]
    fn test_device_name() {
        let device = GraphicsDevice::dummy();
        assert_eq!(device.name(), "Dummy Backend");
    }

    #[test]
    fn test_create_buffer() {
        let device = GraphicsDevice::dummy();
        let buffer = device
            .create_buffer(&BufferDescriptor::new(1024, BufferUsage::VERTEX))
            .unwrap();
        assert_eq!(buffer.size(), 1024);
        assert_eq!(device.buffer_count(), 1);
    }

    #[rstest]
    #[case::zero(0)]
    #[case::too_large(1 << 31)]
    fn test_create_buffer_invalid_size(#[case] size: u64) {
        let device = GraphicsDevice::dummy();
        let result = device.create_buffer(&BufferDescriptor::new(size, BufferUsage::VERTEX));
        assert!(matches!(result, Err(GraphicsError::InvalidParameter(_))));
    }

    #[test]
    fn test_create_texture() {
        let device = GraphicsDevice::dummy();
        let texture = device
            .create_texture(&TextureDescriptor::new_2d(
                512,
                512,
                TextureFormat::Rgba8Unorm,
                TextureUsage::TEXTURE_BINDING,
            ))
            .unwrap();
        assert_eq!(texture.width(), 512);
        assert_eq!(device.texture_count(), 1);
    }

    #[rstest]
    #[case::zero_width(sampled_2d(0, 512))]
    #[case::too_many_mips(sampled_2d(4, 4).with_mip_levels(4))]
    #[case::too_wide(sampled_2d(20000, 4))]
    fn test_create_texture_invalid(#[case] descriptor: TextureDescriptor) {
        let device = GraphicsDevice::dummy();
        assert!(device.create_texture(&descriptor).is_err());
    }

    #[test]
    fn test_create_sampler() {
        let device = GraphicsDevice::dummy();
        let sampler = device.create_sampler(&SamplerDescriptor::linear()).unwrap();
        assert!(sampler.label().is_none());
        assert_eq!(device.sampler_count(), 1);
    }

    #[test]
    fn test_resource_cleanup() {
        let device = GraphicsDevice::dummy();
        {
            let _buffer = device
                .create_buffer(&BufferDescriptor::new(1024, BufferUsage::VERTEX))
                .unwrap();
            assert_eq!(device.buffer_count(), 1);
        }
        device.cleanup_dead_resources();
        assert_eq!(device.buffer_count(), 0);
    }

    #[test]
    fn test_write_requires_flush() {
        let device = GraphicsDevice::dummy();
        let buffer = device
            .create_buffer(&BufferDescriptor::new(4, BufferUsage::UNIFORM | BufferUsage::MAP_WRITE))
            .unwrap();

        device.write_buffer(&buffer, 0, &[1, 2, 3, 4]).unwrap();
        assert_eq!(device.read_buffer(&buffer, 0, 4).unwrap(), [0, 0, 0, 0]);
        device.flush_buffer(&buffer).unwrap();
        assert_eq!(device.read_buffer(&buffer, 0, 4).unwrap(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_write_rejects_device_only_buffer() {
        let device = GraphicsDevice::dummy();
        let buffer = device
            .create_buffer(&BufferDescriptor::new(4, BufferUsage::UNIFORM))
            .unwrap();
        assert!(device.write_buffer(&buffer, 0, &[1]).is_err());
    }

    #[test]
    fn test_render_pipeline_merges_reflection() {
        let device = GraphicsDevice::dummy();
        let fragment = ShaderReflection::new(ShaderStage::Fragment)
            .with_resource(ShaderResource::buffer("ubo", 0, 0, 64))
            .with_resource(ShaderResource::texture_sampler("samplerColor", 0, 1));
        let descriptor = RenderPipelineDescriptor::new()
            .with_vertex_function(function(&device, vertex_reflection()))
            .with_fragment_function(function(&device, fragment))
            .with_vertex_input(position_input(VertexAttributeFormat::Float3))
            .with_color_attachment(ColorAttachmentDescriptor::new(TextureFormat::Bgra8Unorm));

        let pipeline = device.create_render_pipeline(&descriptor).unwrap();
        let ubo = pipeline.reflection().resource("ubo").unwrap();
        assert_eq!(
            ubo.stages,
            crate::ShaderStageFlags::VERTEX | crate::ShaderStageFlags::FRAGMENT
        );
        assert_eq!(pipeline.reflection().resources.len(), 2);
        assert_eq!(device.pipeline_count(), 1);
    }

    #[rstest]
    #[case::format_mismatch(position_input(VertexAttributeFormat::Float2))]
    #[case::missing_location(VertexInputDescriptor::new().with_layout(VertexBufferLayout::new(12)))]
    fn test_render_pipeline_rejects_bad_vertex_input(#[case] input: VertexInputDescriptor) {
        let device = GraphicsDevice::dummy();
        let descriptor = RenderPipelineDescriptor::new()
            .with_vertex_function(function(&device, vertex_reflection()))
            .with_vertex_input(input);
        assert!(matches!(
            device.create_render_pipeline(&descriptor),
            Err(GraphicsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_render_pipeline_rejects_wrong_stage() {
        let device = GraphicsDevice::dummy();
        let descriptor = RenderPipelineDescriptor::new()
            .with_vertex_function(function(&device, ShaderReflection::new(ShaderStage::Fragment)));
        assert!(device.create_render_pipeline(&descriptor).is_err());
    }

    #[test]
    fn test_render_pipeline_rejects_cyclic_struct() {
        let device = GraphicsDevice::dummy();
        let node = ShaderResource::buffer("nodes", 0, 1, 16).with_struct(
            "Node",
            vec![crate::shader::StructMember::nested("next", "Node", 0, 16)],
        );
        let descriptor = RenderPipelineDescriptor::new()
            .with_vertex_function(function(&device, vertex_reflection().with_resource(node)))
            .with_vertex_input(position_input(VertexAttributeFormat::Float3));
        assert!(matches!(
            device.create_render_pipeline(&descriptor),
            Err(GraphicsError::InvalidParameter(message)) if message.contains("nodes")
        ));
        assert_eq!(device.pipeline_count(), 0);
    }

    #[test]
    fn test_binding_set_limit() {
        let device = GraphicsDevice::with_capabilities(
            Arc::new(DummyBackend::new()),
            DeviceCapabilities::default().with_max_binding_sets(1),
        );
        assert!(device.create_binding_set(Arc::new(BindingSetLayout::new(0))).is_ok());
        assert!(device.create_binding_set(Arc::new(BindingSetLayout::new(1))).is_err());
    }

    #[test]
    fn test_compute_pipeline_requires_support() {
        let compute = ShaderReflection::new(ShaderStage::Compute);
        let device = GraphicsDevice::with_capabilities(
            Arc::new(DummyBackend::new()),
            DeviceCapabilities::default().with_compute_shaders(false),
        );
        let descriptor = ComputePipelineDescriptor::new(function(&device, compute.clone()));
        assert!(matches!(
            device.create_compute_pipeline(&descriptor),
            Err(GraphicsError::FeatureNotSupported(_))
        ));

        let device = GraphicsDevice::dummy();
        let descriptor = ComputePipelineDescriptor::new(function(&device, compute));
        assert!(device.create_compute_pipeline(&descriptor).is_ok());
    }
}
