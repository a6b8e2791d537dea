//! Pipeline descriptors.

use std::sync::Arc;

use crate::error::GraphicsError;
use crate::mesh::{VertexAttributeFormat, VertexBufferLayout};
use crate::shader::{PipelineReflection, ShaderFunction, ShaderStage};
use crate::types::{CompareFunction, PrimitiveTopology, TextureFormat};

use super::blend::BlendState;

/// A vertex attribute fed to a shader input location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexInputAttribute {
    /// Shader input location.
    pub location: u32,
    /// Data format in the vertex buffer.
    pub format: VertexAttributeFormat,
    /// Byte offset within a vertex.
    pub offset: u32,
    /// Vertex buffer slot.
    pub buffer_index: u32,
}

/// Vertex input state of a render pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexInputDescriptor {
    /// Attributes, one per consumed shader input.
    pub attributes: Vec<VertexInputAttribute>,
    /// Vertex buffer layouts, indexed by slot.
    pub layouts: Vec<VertexBufferLayout>,
}

impl VertexInputDescriptor {
    /// Create an empty vertex input description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: VertexInputAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a buffer layout.
    pub fn with_layout(mut self, layout: VertexBufferLayout) -> Self {
        self.layouts.push(layout);
        self
    }

    /// Find the attribute bound to a shader location.
    pub fn attribute(&self, location: u32) -> Option<&VertexInputAttribute> {
        self.attributes.iter().find(|a| a.location == location)
    }
}

/// A color render target of a render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorAttachmentDescriptor {
    /// Pixel format of the attachment.
    pub format: TextureFormat,
    /// Blend state; `None` disables blending.
    pub blend: Option<BlendState>,
}

impl ColorAttachmentDescriptor {
    /// Create an attachment without blending.
    pub fn new(format: TextureFormat) -> Self {
        Self {
            format,
            blend: None,
        }
    }

    /// Set the blend state.
    pub fn with_blend(mut self, blend: BlendState) -> Self {
        self.blend = Some(blend);
        self
    }
}

/// Depth test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    /// Whether passing fragments write depth.
    pub depth_write_enabled: bool,
    /// Depth comparison function.
    pub depth_compare: CompareFunction,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_write_enabled: false,
            depth_compare: CompareFunction::Always,
        }
    }
}

/// Face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// Draw all faces.
    #[default]
    None,
    /// Cull front faces.
    Front,
    /// Cull back faces.
    Back,
}

/// Descriptor for creating a render pipeline.
#[derive(Debug, Clone, Default)]
pub struct RenderPipelineDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Vertex stage.
    pub vertex_function: Option<Arc<ShaderFunction>>,
    /// Fragment stage.
    pub fragment_function: Option<Arc<ShaderFunction>>,
    /// Vertex input wiring.
    pub vertex_input: VertexInputDescriptor,
    /// Primitive assembly.
    pub primitive_topology: PrimitiveTopology,
    /// Color render targets.
    pub color_attachments: Vec<ColorAttachmentDescriptor>,
    /// Depth/stencil attachment format.
    pub depth_stencil_format: Option<TextureFormat>,
    /// Depth test configuration.
    pub depth_stencil: DepthStencilState,
    /// Face culling.
    pub cull_mode: CullMode,
}

impl RenderPipelineDescriptor {
    /// Create a new render pipeline descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the vertex function.
    pub fn with_vertex_function(mut self, function: Arc<ShaderFunction>) -> Self {
        self.vertex_function = Some(function);
        self
    }

    /// Set the fragment function.
    pub fn with_fragment_function(mut self, function: Arc<ShaderFunction>) -> Self {
        self.fragment_function = Some(function);
        self
    }

    /// Set the vertex input wiring.
    pub fn with_vertex_input(mut self, vertex_input: VertexInputDescriptor) -> Self {
        self.vertex_input = vertex_input;
        self
    }

    /// Set the primitive topology.
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.primitive_topology = topology;
        self
    }

    /// Add a color attachment.
    pub fn with_color_attachment(mut self, attachment: ColorAttachmentDescriptor) -> Self {
        self.color_attachments.push(attachment);
        self
    }

    /// Set the depth attachment format and test state.
    pub fn with_depth_stencil(mut self, format: TextureFormat, state: DepthStencilState) -> Self {
        self.depth_stencil_format = Some(format);
        self.depth_stencil = state;
        self
    }

    /// Set the culling mode.
    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    /// Check the descriptor and merge the reflections of its stages.
    pub(crate) fn reflect(&self) -> Result<PipelineReflection, GraphicsError> {
        let vertex = self.vertex_function.as_ref().ok_or_else(|| {
            GraphicsError::InvalidParameter("render pipeline has no vertex function".into())
        })?;
        expect_stage(vertex, ShaderStage::Vertex)?;
        if let Some(fragment) = &self.fragment_function {
            expect_stage(fragment, ShaderStage::Fragment)?;
        }

        for input in vertex.stage_input_attributes() {
            let attribute = self.vertex_input.attribute(input.location).ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "vertex input '{}' (location {}) is not fed by any attribute",
                    input.name, input.location
                ))
            })?;
            let provided = attribute.format.shader_data_type();
            if provided != input.data_type {
                return Err(GraphicsError::InvalidParameter(format!(
                    "vertex input '{}' expects {} but attribute provides {}",
                    input.name, input.data_type, provided
                )));
            }
        }
        for attribute in &self.vertex_input.attributes {
            if attribute.buffer_index as usize >= self.vertex_input.layouts.len() {
                return Err(GraphicsError::InvalidParameter(format!(
                    "vertex attribute at location {} reads undefined buffer {}",
                    attribute.location, attribute.buffer_index
                )));
            }
        }

        if let Some(attachment) = self
            .color_attachments
            .iter()
            .find(|a| a.format.is_depth_stencil())
        {
            return Err(GraphicsError::InvalidParameter(format!(
                "{:?} cannot be used as a color attachment",
                attachment.format
            )));
        }
        if let Some(format) = self.depth_stencil_format {
            if !format.is_depth_stencil() {
                return Err(GraphicsError::InvalidParameter(format!(
                    "{format:?} is not a depth format"
                )));
            }
        }

        let stages = std::iter::once(vertex)
            .chain(self.fragment_function.as_ref())
            .map(|f| f.reflection());
        check_struct_tables(PipelineReflection::merge(stages))
    }
}

/// Descriptor for creating a compute pipeline.
#[derive(Debug, Clone, Default)]
pub struct ComputePipelineDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Compute stage.
    pub function: Option<Arc<ShaderFunction>>,
}

impl ComputePipelineDescriptor {
    /// Create a descriptor for `function`.
    pub fn new(function: Arc<ShaderFunction>) -> Self {
        Self {
            label: None,
            function: Some(function),
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn reflect(&self) -> Result<PipelineReflection, GraphicsError> {
        let function = self.function.as_ref().ok_or_else(|| {
            GraphicsError::InvalidParameter("compute pipeline has no function".into())
        })?;
        expect_stage(function, ShaderStage::Compute)?;
        check_struct_tables(PipelineReflection::merge([function.reflection()]))
    }
}

/// Reject buffers whose struct table nests a struct inside itself.
fn check_struct_tables(
    reflection: PipelineReflection,
) -> Result<PipelineReflection, GraphicsError> {
    match reflection.resources.iter().find(|r| r.has_cyclic_struct()) {
        Some(resource) => Err(GraphicsError::InvalidParameter(format!(
            "buffer '{}' has a cyclic struct layout",
            resource.name
        ))),
        None => Ok(reflection),
    }
}

fn expect_stage(function: &ShaderFunction, stage: ShaderStage) -> Result<(), GraphicsError> {
    if function.stage() == stage {
        Ok(())
    } else {
        Err(GraphicsError::InvalidParameter(format!(
            "function '{}' is a {:?} function, expected {:?}",
            function.name(),
            function.stage(),
            stage
        )))
    }
}
