//! Material definition.
//!
//! A [`Material`] binds values to shader resources by name. Callers register
//! one [`ShaderTemplate`] per stage and assign textures, samplers and struct
//! values using the names the shaders declare (`"samplerColor"`, `"ubo"`,
//! `"ubo.model"`). [`Material::init_resources`] resolves every name against
//! the linked pipeline's reflection, creates the buffers that back struct
//! resources and the binding sets, after which values flow to the GPU through
//! [`Material::update_material_properties`].
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --register_shader_stage--> Configured
//! Configured    --init_resources---------> Resourced
//! Resourced     --update_material_properties--> Bound
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut material = Material::new()
//!     .with_label("textured")
//!     .with_color_attachment(ColorAttachmentDescriptor::new(TextureFormat::Bgra8Unorm));
//! material.register_shader_stage(
//!     ShaderTemplate::new(vertex_fn)
//!         .with_input_attribute("inPos", VertexAttributeSemantic::Position),
//! )?;
//! material.register_shader_stage(ShaderTemplate::new(fragment_fn))?;
//! material.set_texture_property("samplerColor", texture)?;
//! material.init_resources(&device, &layout, PrimitiveTopology::TriangleList)?;
//!
//! material.set_struct_element("ubo.model", &model.to_cols_array_2d())?;
//! material.update_material_properties()?;
//! material.encode_render_command(&mut encoder, &geometry, 1, 0)?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bytemuck::Pod;

use crate::command::RenderCommandEncoder;
use crate::device::GraphicsDevice;
use crate::error::{GraphicsError, MaterialError};
use crate::mesh::{MeshGeometry, VertexAttributeSemantic, VertexLayout};
use crate::pipeline::{
    ColorAttachmentDescriptor, CullMode, DepthStencilState, RenderPipelineDescriptor,
    RenderPipelineState, VertexInputAttribute, VertexInputDescriptor,
};
use crate::resources::{Buffer, Sampler, Texture};
use crate::shader::{
    PipelineReflection, ShaderAccess, ShaderFunction, ShaderResource, ShaderResourceType,
    ShaderStage,
};
use crate::types::{BufferDescriptor, BufferUsage, PrimitiveTopology, TextureFormat};

use super::bindings::{BindingSet, BindingSetLayout, BoundResource};
use super::property::{
    SamplerProperty, ShaderValue, StructElementProperty, StructWrite, TextureProperty,
};

/// A shader function registered with a material, plus naming hints.
#[derive(Debug, Clone)]
pub struct ShaderTemplate {
    function: Arc<ShaderFunction>,
    resource_types: BTreeMap<String, ShaderResourceType>,
    input_attribute_semantics: BTreeMap<String, VertexAttributeSemantic>,
}

impl ShaderTemplate {
    /// Create a template for `function`.
    pub fn new(function: Arc<ShaderFunction>) -> Self {
        Self {
            function,
            resource_types: BTreeMap::new(),
            input_attribute_semantics: BTreeMap::new(),
        }
    }

    /// Require resource `name` to exist with the given type.
    pub fn with_resource_type(mut self, name: impl Into<String>, ty: ShaderResourceType) -> Self {
        self.resource_types.insert(name.into(), ty);
        self
    }

    /// Feed shader input `name` from the vertex stream with `semantic`.
    pub fn with_input_attribute(
        mut self,
        name: impl Into<String>,
        semantic: VertexAttributeSemantic,
    ) -> Self {
        self.input_attribute_semantics.insert(name.into(), semantic);
        self
    }

    /// The shader function.
    pub fn function(&self) -> &Arc<ShaderFunction> {
        &self.function
    }

    /// Stage of the shader function.
    pub fn stage(&self) -> ShaderStage {
        self.function.stage()
    }

    /// Resource type hints.
    pub fn resource_types(&self) -> &BTreeMap<String, ShaderResourceType> {
        &self.resource_types
    }

    /// Shader input to vertex semantic mapping.
    pub fn input_attribute_semantics(&self) -> &BTreeMap<String, VertexAttributeSemantic> {
        &self.input_attribute_semantics
    }
}

/// Lifecycle state of a [`Material`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialState {
    /// No shader stage registered.
    #[default]
    Uninitialized,
    /// Shader stages registered, names not resolved yet.
    Configured,
    /// Names resolved, GPU objects created.
    Resourced,
    /// Properties flushed and attached to binding sets.
    Bound,
}

impl MaterialState {
    /// State name as used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Configured => "Configured",
            Self::Resourced => "Resourced",
            Self::Bound => "Bound",
        }
    }
}

impl std::fmt::Display for MaterialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// CPU staging copy of a buffer resource's struct.
#[derive(Debug)]
struct StructBuffer {
    resource: ShaderResource,
    staging: Vec<u8>,
    buffer: Option<Arc<Buffer>>,
    dirty: bool,
}

impl StructBuffer {
    fn write_whole(&mut self, name: &str, bytes: &[u8]) -> Result<(), MaterialError> {
        if bytes.len() != self.staging.len() {
            return Err(MaterialError::SizeMismatch {
                name: name.to_string(),
                expected: self.staging.len(),
                actual: bytes.len(),
            });
        }
        self.staging.copy_from_slice(bytes);
        self.dirty = true;
        Ok(())
    }

    fn write_element(
        &mut self,
        path: &str,
        member_path: &str,
        property: &StructElementProperty,
    ) -> Result<(), MaterialError> {
        let member = self
            .resource
            .resolve_member(member_path)
            .ok_or_else(|| MaterialError::UnknownProperty(path.to_string()))?;
        if property.data_type != member.data_type {
            return Err(MaterialError::DataTypeMismatch {
                name: path.to_string(),
                expected: member.data_type,
                actual: property.data_type,
            });
        }
        if property.bytes.len() != member.span as usize {
            return Err(MaterialError::SizeMismatch {
                name: path.to_string(),
                expected: member.span as usize,
                actual: property.bytes.len(),
            });
        }
        let start = member.offset as usize;
        let staging_len = self.staging.len();
        let target = self
            .staging
            .get_mut(start..start + property.bytes.len())
            .ok_or_else(|| MaterialError::SizeMismatch {
                name: path.to_string(),
                expected: staging_len.saturating_sub(start),
                actual: property.bytes.len(),
            })?;
        target.copy_from_slice(&property.bytes);
        self.dirty = true;
        Ok(())
    }
}

/// GPU objects owned by a resolved material.
#[derive(Debug)]
struct MaterialResources {
    device: Arc<GraphicsDevice>,
    pipeline: Arc<RenderPipelineState>,
    binding_sets: Vec<BindingSet>,
}

/// Binds textures, samplers and struct values to shader resources by name.
///
/// A material takes `&mut self` for every mutation; share it across threads
/// only behind a lock of your own.
#[derive(Debug, Default)]
pub struct Material {
    label: Option<String>,
    state: MaterialState,
    shader_templates: BTreeMap<ShaderStage, ShaderTemplate>,
    texture_properties: HashMap<String, TextureProperty>,
    sampler_properties: HashMap<String, SamplerProperty>,
    struct_defaults: Vec<(String, StructWrite)>,
    struct_buffers: Vec<StructBuffer>,
    color_attachments: Vec<ColorAttachmentDescriptor>,
    depth_stencil_format: Option<TextureFormat>,
    depth_stencil: DepthStencilState,
    cull_mode: CullMode,
    resources: Option<MaterialResources>,
    bindings_dirty: bool,
}

impl Material {
    /// Create an empty material.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a color attachment to the pipeline the material builds.
    pub fn with_color_attachment(mut self, attachment: ColorAttachmentDescriptor) -> Self {
        self.color_attachments.push(attachment);
        self
    }

    /// Set the depth attachment format and depth test.
    pub fn with_depth_stencil(mut self, format: TextureFormat, state: DepthStencilState) -> Self {
        self.depth_stencil_format = Some(format);
        self.depth_stencil = state;
        self
    }

    /// Set face culling.
    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    /// Get the material label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MaterialState {
        self.state
    }

    /// Template registered for `stage`.
    pub fn shader_template(&self, stage: ShaderStage) -> Option<&ShaderTemplate> {
        self.shader_templates.get(&stage)
    }

    /// The pipeline built by [`Material::init_resources`].
    pub fn pipeline(&self) -> Option<&Arc<RenderPipelineState>> {
        self.resources.as_ref().map(|r| &r.pipeline)
    }

    /// Reflection of the resolved pipeline.
    pub fn pipeline_reflection(&self) -> Option<&PipelineReflection> {
        self.pipeline().map(|p| p.reflection())
    }

    /// Binding sets, one per descriptor set used by the pipeline.
    pub fn binding_sets(&self) -> &[BindingSet] {
        self.resources
            .as_ref()
            .map(|r| r.binding_sets.as_slice())
            .unwrap_or_default()
    }

    /// GPU buffer backing the buffer resource `name`.
    pub fn struct_buffer(&self, name: &str) -> Option<&Arc<Buffer>> {
        self.find_struct_buffer(name)
            .and_then(|b| b.buffer.as_ref())
    }

    /// Staged bytes of the buffer resource `name`, including unflushed writes.
    pub fn staged_bytes(&self, name: &str) -> Option<&[u8]> {
        self.find_struct_buffer(name).map(|b| b.staging.as_slice())
    }

    /// Register the shader function for a stage, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`MaterialError::InvalidState`] once resources exist, or an
    /// error if the function is neither a vertex nor a fragment function.
    pub fn register_shader_stage(&mut self, template: ShaderTemplate) -> Result<(), MaterialError> {
        self.expect_state(
            "register a shader stage",
            &[MaterialState::Uninitialized, MaterialState::Configured],
        )?;
        let stage = template.stage();
        if !matches!(stage, ShaderStage::Vertex | ShaderStage::Fragment) {
            return Err(GraphicsError::InvalidParameter(format!(
                "materials take vertex and fragment functions, got {stage:?}"
            ))
            .into());
        }
        log::debug!(
            "Material {:?}: registered {:?} function '{}'",
            self.label,
            stage,
            template.function().name()
        );
        self.shader_templates.insert(stage, template);
        self.state = MaterialState::Configured;
        Ok(())
    }

    /// Assign a texture to the texture resource `name`.
    pub fn set_texture_property(
        &mut self,
        name: impl Into<String>,
        texture: Arc<Texture>,
    ) -> Result<(), MaterialError> {
        self.set_texture_array_property(name, vec![texture])
    }

    /// Assign textures to the elements of the texture array resource `name`.
    ///
    /// # Errors
    ///
    /// Once resolved, returns [`MaterialError::UnknownProperty`] if no resource
    /// has this name, or [`MaterialError::ResourceTypeMismatch`] if it cannot
    /// hold textures. Before resolution names are checked by
    /// [`Material::init_resources`].
    pub fn set_texture_array_property(
        &mut self,
        name: impl Into<String>,
        textures: Vec<Arc<Texture>>,
    ) -> Result<(), MaterialError> {
        let name = name.into();
        self.check_resolved_resource(&name, ShaderResourceType::TEXTURE)?;
        self.texture_properties
            .insert(name, TextureProperty { textures });
        self.bindings_dirty = true;
        Ok(())
    }

    /// Assign a sampler to the sampler resource `name`.
    pub fn set_sampler_property(
        &mut self,
        name: impl Into<String>,
        sampler: Arc<Sampler>,
    ) -> Result<(), MaterialError> {
        self.set_sampler_array_property(name, vec![sampler])
    }

    /// Assign samplers to the elements of the sampler array resource `name`.
    ///
    /// # Errors
    ///
    /// Same as [`Material::set_texture_array_property`].
    pub fn set_sampler_array_property(
        &mut self,
        name: impl Into<String>,
        samplers: Vec<Arc<Sampler>>,
    ) -> Result<(), MaterialError> {
        let name = name.into();
        self.check_resolved_resource(&name, ShaderResourceType::SAMPLER)?;
        self.sampler_properties
            .insert(name, SamplerProperty { samplers });
        self.bindings_dirty = true;
        Ok(())
    }

    /// Write the whole struct held by buffer resource `name`.
    ///
    /// Before resolution the bytes are kept and applied by
    /// [`Material::init_resources`]; afterwards they go to the staging copy
    /// and reach the GPU on the next [`Material::update_material_properties`].
    ///
    /// # Errors
    ///
    /// Once resolved, returns [`MaterialError::UnknownProperty`] for an
    /// unknown buffer and [`MaterialError::SizeMismatch`] unless `bytes` is
    /// exactly the buffer size.
    pub fn set_struct_property(
        &mut self,
        name: impl Into<String>,
        bytes: &[u8],
    ) -> Result<(), MaterialError> {
        let name = name.into();
        if !self.is_resolved() {
            self.store_default(name, StructWrite::Whole(bytes.to_vec()));
            return Ok(());
        }
        self.find_struct_buffer_mut(&name)
            .ok_or_else(|| MaterialError::UnknownProperty(name.clone()))?
            .write_whole(&name, bytes)
    }

    /// Write one member of a struct, addressed as `"buffer.member"` or
    /// `"buffer.nested.member"`.
    ///
    /// # Errors
    ///
    /// Once resolved, returns [`MaterialError::UnknownProperty`] if the path
    /// does not resolve, [`MaterialError::DataTypeMismatch`] if the declared
    /// type differs from the reflected one, and [`MaterialError::SizeMismatch`]
    /// unless the bytes cover the member exactly.
    pub fn set_struct_element_property(
        &mut self,
        path: impl Into<String>,
        property: StructElementProperty,
    ) -> Result<(), MaterialError> {
        let path = path.into();
        if !self.is_resolved() {
            self.store_default(path, StructWrite::Element(property));
            return Ok(());
        }
        Self::write_element(&mut self.struct_buffers, &path, &property)
    }

    /// Write the whole struct of buffer resource `name` from a plain value.
    pub fn set_struct<T: Pod>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<(), MaterialError> {
        self.set_struct_property(name, bytemuck::bytes_of(value))
    }

    /// Write one struct member from a typed value.
    pub fn set_struct_element<T: ShaderValue>(
        &mut self,
        path: impl Into<String>,
        value: &T,
    ) -> Result<(), MaterialError> {
        self.set_struct_element_property(path, StructElementProperty::from_value(value))
    }

    /// Resolve every name against the pipeline and create GPU objects.
    ///
    /// Builds the render pipeline, wiring each vertex shader input to the
    /// attribute of `vertex_layout` whose semantic the template maps it to.
    /// Creates one host-writable buffer per enabled buffer resource, applies
    /// struct values assigned so far, and creates one binding set per
    /// descriptor set.
    ///
    /// On error nothing is kept and the material stays `Configured`.
    ///
    /// # Errors
    ///
    /// - [`MaterialError::InvalidState`] unless the material is `Configured`
    /// - [`MaterialError::UnresolvedProperties`] listing every name that
    ///   matches nothing: property names, resource type hints, shader inputs
    ///   without a semantic or without a matching vertex attribute
    /// - [`MaterialError::ResourceTypeMismatch`] or
    ///   [`MaterialError::AttributeTypeMismatch`] when a name resolves to the
    ///   wrong kind of resource or attribute
    /// - struct value errors as for [`Material::set_struct_property`]
    /// - [`MaterialError::Graphics`] when the device rejects an object
    pub fn init_resources(
        &mut self,
        device: &Arc<GraphicsDevice>,
        vertex_layout: &VertexLayout,
        topology: PrimitiveTopology,
    ) -> Result<(), MaterialError> {
        self.expect_state("initialize resources", &[MaterialState::Configured])?;
        let vertex = self.shader_templates.get(&ShaderStage::Vertex).ok_or_else(|| {
            GraphicsError::InvalidParameter("material has no vertex function".to_string())
        })?;
        vertex_layout.validate()?;

        let reflection = PipelineReflection::merge(
            self.shader_templates
                .values()
                .map(|t| t.function.reflection()),
        );

        let mut resolution = Resolution::default();
        let vertex_input = resolution.wire_vertex_input(vertex, vertex_layout);
        for template in self.shader_templates.values() {
            for (name, &expected) in &template.resource_types {
                resolution.expect_resource(&reflection, name, expected, |actual| {
                    actual == expected
                });
            }
        }
        for name in self.texture_properties.keys() {
            resolution.expect_resource(&reflection, name, ShaderResourceType::TEXTURE, |t| {
                t.accepts_texture()
            });
        }
        for name in self.sampler_properties.keys() {
            resolution.expect_resource(&reflection, name, ShaderResourceType::SAMPLER, |t| {
                t.accepts_sampler()
            });
        }
        for (path, write) in &self.struct_defaults {
            resolution.expect_struct_path(&reflection, path, write);
        }
        resolution.into_result()?;

        let mut struct_buffers: Vec<StructBuffer> = reflection
            .resources
            .iter()
            .filter(|r| r.is_buffer() && r.enabled && r.buffer_size > 0)
            .map(|r| StructBuffer {
                resource: r.clone(),
                staging: vec![0; r.buffer_size as usize],
                buffer: None,
                dirty: true,
            })
            .collect();
        for (path, write) in &self.struct_defaults {
            match write {
                StructWrite::Whole(bytes) => {
                    struct_buffers
                        .iter_mut()
                        .find(|b| b.resource.name == *path)
                        .ok_or_else(|| MaterialError::UnknownProperty(path.clone()))?
                        .write_whole(path, bytes)?;
                }
                StructWrite::Element(property) => {
                    Self::write_element(&mut struct_buffers, path, property)?;
                }
            }
        }

        let mut descriptor = RenderPipelineDescriptor::new()
            .with_vertex_function(Arc::clone(&vertex.function))
            .with_vertex_input(vertex_input)
            .with_topology(topology)
            .with_cull_mode(self.cull_mode);
        if let Some(label) = &self.label {
            descriptor = descriptor.with_label(label.clone());
        }
        if let Some(fragment) = self.shader_templates.get(&ShaderStage::Fragment) {
            descriptor = descriptor.with_fragment_function(Arc::clone(&fragment.function));
        }
        for attachment in &self.color_attachments {
            descriptor = descriptor.with_color_attachment(*attachment);
        }
        if let Some(format) = self.depth_stencil_format {
            descriptor = descriptor.with_depth_stencil(format, self.depth_stencil);
        }
        let pipeline = device.create_render_pipeline(&descriptor)?;

        for struct_buffer in &mut struct_buffers {
            let resource = &struct_buffer.resource;
            let usage = if resource.access == ShaderAccess::READ_ONLY {
                BufferUsage::UNIFORM
            } else {
                BufferUsage::STORAGE
            };
            let buffer = device.create_buffer(
                &BufferDescriptor::new(
                    u64::from(resource.buffer_size),
                    usage | BufferUsage::MAP_WRITE,
                )
                .with_label(resource.name.clone()),
            )?;
            struct_buffer.buffer = Some(buffer);
        }

        let binding_sets = reflection
            .set_indices()
            .into_iter()
            .map(|set| {
                device.create_binding_set(Arc::new(BindingSetLayout::from_reflection(
                    pipeline.reflection(),
                    set,
                )))
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "Material {:?}: resolved {} resources in {} binding sets, {} struct buffers",
            self.label,
            reflection.resources.len(),
            binding_sets.len(),
            struct_buffers.len()
        );

        self.struct_buffers = struct_buffers;
        self.struct_defaults.clear();
        self.resources = Some(MaterialResources {
            device: Arc::clone(device),
            pipeline,
            binding_sets,
        });
        self.bindings_dirty = true;
        self.state = MaterialState::Resourced;
        Ok(())
    }

    /// Flush modified struct values to the GPU and attach current resources.
    ///
    /// Calling it again without intervening writes does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MaterialError::InvalidState`] before [`Material::init_resources`]
    /// succeeded, or a device error if a write, flush or bind fails.
    pub fn update_material_properties(&mut self) -> Result<(), MaterialError> {
        self.expect_state(
            "update material properties",
            &[MaterialState::Resourced, MaterialState::Bound],
        )?;
        let Some(resources) = self.resources.as_mut() else {
            return Err(self.invalid_state("update material properties"));
        };

        for struct_buffer in self.struct_buffers.iter_mut().filter(|b| b.dirty) {
            if let Some(buffer) = &struct_buffer.buffer {
                resources.device.write_buffer(buffer, 0, &struct_buffer.staging)?;
                resources.device.flush_buffer(buffer)?;
                log::trace!(
                    "Material {:?}: flushed '{}' ({} bytes)",
                    self.label,
                    struct_buffer.resource.name,
                    struct_buffer.staging.len()
                );
            }
            struct_buffer.dirty = false;
        }

        if self.bindings_dirty {
            for set in &mut resources.binding_sets {
                let entries = set.layout().entries.clone();
                for entry in entries {
                    let bound = match entry.resource_type {
                        ShaderResourceType::BUFFER => self
                            .struct_buffers
                            .iter()
                            .find(|b| {
                                b.resource.set == set.set_index()
                                    && b.resource.binding == entry.binding
                            })
                            .and_then(|b| b.buffer.clone())
                            .map(BoundResource::buffer),
                        ShaderResourceType::TEXTURE => self
                            .texture_properties
                            .get(&entry.name)
                            .map(|p| BoundResource::Textures(p.textures.clone())),
                        ShaderResourceType::SAMPLER => self
                            .sampler_properties
                            .get(&entry.name)
                            .map(|p| BoundResource::Samplers(p.samplers.clone())),
                        ShaderResourceType::TEXTURE_SAMPLER => self
                            .texture_properties
                            .get(&entry.name)
                            .zip(self.sampler_properties.get(&entry.name))
                            .map(|(t, s)| BoundResource::TextureSamplers {
                                textures: t.textures.clone(),
                                samplers: s.samplers.clone(),
                            }),
                        _ => None,
                    };
                    match bound {
                        Some(resource) => set.bind(entry.binding, resource)?,
                        None => log::warn!(
                            "Material {:?}: nothing bound to '{}' (set={}, binding={})",
                            self.label,
                            entry.name,
                            set.set_index(),
                            entry.binding
                        ),
                    }
                }
            }
            self.bindings_dirty = false;
        }

        if self.state != MaterialState::Bound {
            log::debug!("Material {:?}: bound", self.label);
        }
        self.state = MaterialState::Bound;
        Ok(())
    }

    /// Record the commands that draw `geometry` with this material.
    ///
    /// Binds the pipeline, the geometry's vertex buffers and every binding
    /// set, then issues an indexed draw, or a plain draw when the geometry
    /// has no index buffer.
    ///
    /// # Errors
    ///
    /// Returns [`MaterialError::InvalidState`] unless the material is `Bound`,
    /// or the encoder's error if it rejects a command.
    pub fn encode_render_command(
        &self,
        encoder: &mut RenderCommandEncoder,
        geometry: &MeshGeometry,
        instance_count: u32,
        base_instance: u32,
    ) -> Result<(), MaterialError> {
        self.expect_state("encode render command", &[MaterialState::Bound])?;
        let Some(resources) = self.resources.as_ref() else {
            return Err(self.invalid_state("encode render command"));
        };

        encoder.set_render_pipeline(Arc::clone(&resources.pipeline))?;
        for (slot, buffer) in geometry.vertex_buffers().iter().enumerate() {
            encoder.set_vertex_buffer(slot as u32, Arc::clone(buffer), 0)?;
        }
        for set in &resources.binding_sets {
            encoder.set_binding_set(set.set_index(), set.clone())?;
        }
        match geometry.index_buffer() {
            Some(index) => {
                encoder.set_index_buffer(Arc::clone(&index.buffer), 0, index.format)?;
                encoder.draw_indexed(geometry.index_count(), instance_count, 0, 0, base_instance)?;
            }
            None => encoder.draw(
                geometry.vertex_start(),
                geometry.vertex_count(),
                instance_count,
                base_instance,
            )?,
        }
        Ok(())
    }

    fn is_resolved(&self) -> bool {
        matches!(self.state, MaterialState::Resourced | MaterialState::Bound)
    }

    fn invalid_state(&self, operation: &'static str) -> MaterialError {
        MaterialError::InvalidState {
            operation,
            state: self.state.name(),
        }
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[MaterialState],
    ) -> Result<(), MaterialError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn check_resolved_resource(
        &self,
        name: &str,
        expected: ShaderResourceType,
    ) -> Result<(), MaterialError> {
        let Some(reflection) = self.pipeline_reflection() else {
            return Ok(());
        };
        let resource = reflection
            .resource(name)
            .ok_or_else(|| MaterialError::UnknownProperty(name.to_string()))?;
        let accepted = if expected == ShaderResourceType::TEXTURE {
            resource.resource_type.accepts_texture()
        } else {
            resource.resource_type.accepts_sampler()
        };
        if accepted {
            Ok(())
        } else {
            Err(MaterialError::ResourceTypeMismatch {
                name: name.to_string(),
                expected,
                actual: resource.resource_type,
            })
        }
    }

    fn store_default(&mut self, key: String, write: StructWrite) {
        self.struct_defaults.retain(|(k, _)| *k != key);
        self.struct_defaults.push((key, write));
    }

    fn find_struct_buffer(&self, name: &str) -> Option<&StructBuffer> {
        self.struct_buffers.iter().find(|b| b.resource.name == name)
    }

    fn find_struct_buffer_mut(&mut self, name: &str) -> Option<&mut StructBuffer> {
        self.struct_buffers
            .iter_mut()
            .find(|b| b.resource.name == name)
    }

    fn write_element(
        buffers: &mut [StructBuffer],
        path: &str,
        property: &StructElementProperty,
    ) -> Result<(), MaterialError> {
        let (name, member_path) = path
            .split_once('.')
            .ok_or_else(|| MaterialError::UnknownProperty(path.to_string()))?;
        buffers
            .iter_mut()
            .find(|b| b.resource.name == name)
            .ok_or_else(|| MaterialError::UnknownProperty(path.to_string()))?
            .write_element(path, member_path, property)
    }
}

/// Outcome of matching names against a pipeline reflection.
#[derive(Default)]
struct Resolution {
    unresolved: Vec<String>,
    mismatch: Option<MaterialError>,
}

impl Resolution {
    fn unresolved(&mut self, name: &str) {
        if !self.unresolved.iter().any(|n| n == name) {
            self.unresolved.push(name.to_string());
        }
    }

    fn mismatch(&mut self, error: MaterialError) {
        self.mismatch.get_or_insert(error);
    }

    fn wire_vertex_input(
        &mut self,
        template: &ShaderTemplate,
        layout: &VertexLayout,
    ) -> VertexInputDescriptor {
        let inputs = template.function.stage_input_attributes();
        let mut descriptor = VertexInputDescriptor {
            attributes: Vec::new(),
            layouts: layout.buffers.clone(),
        };

        for name in template.input_attribute_semantics.keys() {
            if !inputs.iter().any(|input| input.name == *name) {
                self.unresolved(name);
            }
        }

        for input in inputs {
            let attribute = template
                .input_attribute_semantics
                .get(&input.name)
                .and_then(|&semantic| layout.get_attribute(semantic));
            let Some(attribute) = attribute else {
                self.unresolved(&input.name);
                continue;
            };
            let provided = attribute.format.shader_data_type();
            if provided != input.data_type {
                self.mismatch(MaterialError::AttributeTypeMismatch {
                    name: input.name.clone(),
                    expected: input.data_type,
                    actual: provided,
                });
                continue;
            }
            descriptor.attributes.push(VertexInputAttribute {
                location: input.location,
                format: attribute.format,
                offset: attribute.offset,
                buffer_index: attribute.buffer_index,
            });
        }
        descriptor
    }

    fn expect_resource(
        &mut self,
        reflection: &PipelineReflection,
        name: &str,
        expected: ShaderResourceType,
        accepts: impl Fn(ShaderResourceType) -> bool,
    ) {
        match reflection.resource(name) {
            None => self.unresolved(name),
            Some(resource) if !accepts(resource.resource_type) => {
                self.mismatch(MaterialError::ResourceTypeMismatch {
                    name: name.to_string(),
                    expected,
                    actual: resource.resource_type,
                })
            }
            Some(_) => {}
        }
    }

    fn expect_struct_path(
        &mut self,
        reflection: &PipelineReflection,
        path: &str,
        write: &StructWrite,
    ) {
        let (name, member_path) = match write {
            StructWrite::Whole(_) => (path, None),
            StructWrite::Element(_) => match path.split_once('.') {
                Some((name, member_path)) => (name, Some(member_path)),
                None => {
                    self.unresolved(path);
                    return;
                }
            },
        };
        let Some(resource) = reflection.resource(name) else {
            self.unresolved(path);
            return;
        };
        if !resource.is_buffer() {
            self.mismatch(MaterialError::ResourceTypeMismatch {
                name: name.to_string(),
                expected: ShaderResourceType::BUFFER,
                actual: resource.resource_type,
            });
            return;
        }
        // Disabled or empty blocks get no backing buffer.
        if !resource.enabled || resource.buffer_size == 0 {
            self.unresolved(path);
            return;
        }
        if member_path.is_some_and(|m| resource.resolve_member(m).is_none()) {
            self.unresolved(path);
        }
    }

    fn into_result(self) -> Result<(), MaterialError> {
        if !self.unresolved.is_empty() {
            return Err(MaterialError::UnresolvedProperties {
                names: self.unresolved,
            });
        }
        self.mismatch.map_or(Ok(()), Err)
    }
}

static_assertions::assert_impl_all!(Material: Send, Sync);
