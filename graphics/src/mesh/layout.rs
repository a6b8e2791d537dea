//! Vertex layout definitions for meshes.
//!
//! A vertex layout describes how vertex data is laid out across one or more
//! buffers. Each attribute carries a [`VertexAttributeSemantic`], which is how
//! a material matches shader inputs (by name, through its template's semantic
//! map) to mesh streams without the caller assigning locations by hand.
//!
//! # Example
//!
//! ```ignore
//! // Interleaved position/color/uv, as used by the textured quad demo.
//! let layout = Arc::new(VertexLayout::new()
//!     .with_buffer(VertexBufferLayout::new(32))
//!     .with_attribute(VertexAttribute::position(0))
//!     .with_attribute(VertexAttribute::color(12))
//!     .with_attribute(VertexAttribute::tex_coord(24)));
//! ```

use std::sync::Arc;

use crate::error::GraphicsError;
use crate::shader::ShaderDataType;

/// Semantic meaning of a vertex attribute.
///
/// Semantics are used to match mesh attributes with shader inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexAttributeSemantic {
    /// Vertex position.
    Position,
    /// Vertex normal.
    Normal,
    /// Vertex color.
    Color,
    /// Texture coordinate.
    TexCoord,
    /// Tangent vector.
    Tangent,
    /// Bitangent vector.
    Bitangent,
    /// Skinning bone indices.
    BlendIndices,
    /// Skinning bone weights.
    BlendWeights,
}

/// Format of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeFormat {
    /// Single 32-bit float.
    Float,
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats.
    Float3,
    /// Four 32-bit floats.
    Float4,
    /// Single 32-bit signed integer.
    Int,
    /// Two 32-bit signed integers.
    Int2,
    /// Three 32-bit signed integers.
    Int3,
    /// Four 32-bit signed integers.
    Int4,
    /// Single 32-bit unsigned integer.
    Uint,
    /// Two 32-bit unsigned integers.
    Uint2,
    /// Three 32-bit unsigned integers.
    Uint3,
    /// Four 32-bit unsigned integers.
    Uint4,
    /// Four 8-bit unsigned normalized values.
    Unorm8x4,
    /// Four 8-bit signed normalized values.
    Snorm8x4,
}

impl VertexAttributeFormat {
    /// Get the size in bytes of this format.
    pub fn size(&self) -> usize {
        match self {
            Self::Float | Self::Int | Self::Uint => 4,
            Self::Float2 | Self::Int2 | Self::Uint2 => 8,
            Self::Float3 | Self::Int3 | Self::Uint3 => 12,
            Self::Float4 | Self::Int4 | Self::Uint4 => 16,
            Self::Unorm8x4 | Self::Snorm8x4 => 4,
        }
    }

    /// The type a vertex shader sees when it reads this format.
    ///
    /// Normalized formats are expanded to floats by the input assembler.
    pub fn shader_data_type(&self) -> ShaderDataType {
        match self {
            Self::Float => ShaderDataType::Float32,
            Self::Float2 => ShaderDataType::Float32x2,
            Self::Float3 => ShaderDataType::Float32x3,
            Self::Float4 | Self::Unorm8x4 | Self::Snorm8x4 => ShaderDataType::Float32x4,
            Self::Int => ShaderDataType::Int32,
            Self::Int2 => ShaderDataType::Int32x2,
            Self::Int3 => ShaderDataType::Int32x3,
            Self::Int4 => ShaderDataType::Int32x4,
            Self::Uint => ShaderDataType::UInt32,
            Self::Uint2 => ShaderDataType::UInt32x2,
            Self::Uint3 => ShaderDataType::UInt32x3,
            Self::Uint4 => ShaderDataType::UInt32x4,
        }
    }
}

/// How the vertex buffer advances: per-vertex or per-instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexStepMode {
    /// Buffer advances once per vertex (default).
    #[default]
    Vertex,
    /// Buffer advances once per instance.
    Instance,
}

/// Describes a single vertex buffer binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexBufferLayout {
    /// Stride in bytes between consecutive elements.
    pub stride: u32,
    /// How the buffer advances (per-vertex or per-instance).
    pub step_mode: VertexStepMode,
}

impl VertexBufferLayout {
    /// Create a new vertex buffer layout with the given stride.
    pub fn new(stride: u32) -> Self {
        Self {
            stride,
            step_mode: VertexStepMode::Vertex,
        }
    }

    /// Create a per-instance buffer layout.
    pub fn per_instance(stride: u32) -> Self {
        Self {
            stride,
            step_mode: VertexStepMode::Instance,
        }
    }
}

/// A single vertex attribute description.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Semantic meaning of this attribute.
    pub semantic: VertexAttributeSemantic,
    /// Data format of this attribute.
    pub format: VertexAttributeFormat,
    /// Byte offset within the vertex buffer.
    pub offset: u32,
    /// Index of the vertex buffer this attribute reads from.
    pub buffer_index: u32,
}

impl VertexAttribute {
    /// Create a new vertex attribute at buffer 0.
    pub fn new(
        semantic: VertexAttributeSemantic,
        format: VertexAttributeFormat,
        offset: u32,
    ) -> Self {
        Self {
            semantic,
            format,
            offset,
            buffer_index: 0,
        }
    }

    /// Position attribute (float3).
    pub fn position(offset: u32) -> Self {
        Self::new(
            VertexAttributeSemantic::Position,
            VertexAttributeFormat::Float3,
            offset,
        )
    }

    /// Normal attribute (float3).
    pub fn normal(offset: u32) -> Self {
        Self::new(
            VertexAttributeSemantic::Normal,
            VertexAttributeFormat::Float3,
            offset,
        )
    }

    /// Color attribute (float3).
    pub fn color(offset: u32) -> Self {
        Self::new(
            VertexAttributeSemantic::Color,
            VertexAttributeFormat::Float3,
            offset,
        )
    }

    /// Texture coordinate attribute (float2).
    pub fn tex_coord(offset: u32) -> Self {
        Self::new(
            VertexAttributeSemantic::TexCoord,
            VertexAttributeFormat::Float2,
            offset,
        )
    }

    /// Set the buffer index for this attribute.
    pub fn at_buffer(mut self, buffer_index: u32) -> Self {
        self.buffer_index = buffer_index;
        self
    }
}

/// Describes the layout of vertex data across one or more buffers.
///
/// Layouts are typically wrapped in `Arc` and shared between meshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexLayout {
    /// Descriptions of each vertex buffer binding.
    pub buffers: Vec<VertexBufferLayout>,
    /// The vertex attributes, each referencing a buffer by index.
    pub attributes: Vec<VertexAttribute>,
    /// Optional label for debugging.
    pub label: Option<String>,
}

impl VertexLayout {
    /// Create a new empty vertex layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex buffer binding.
    pub fn with_buffer(mut self, buffer: VertexBufferLayout) -> Self {
        self.buffers.push(buffer);
        self
    }

    /// Add a vertex attribute.
    pub fn with_attribute(mut self, attribute: VertexAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the number of vertex buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Get the stride for a specific buffer.
    pub fn buffer_stride(&self, buffer_index: usize) -> u32 {
        self.buffers
            .get(buffer_index)
            .map(|b| b.stride)
            .unwrap_or(0)
    }

    /// Check if this layout has a specific semantic.
    pub fn has_semantic(&self, semantic: VertexAttributeSemantic) -> bool {
        self.attributes.iter().any(|attr| attr.semantic == semantic)
    }

    /// Get an attribute by semantic.
    pub fn get_attribute(&self, semantic: VertexAttributeSemantic) -> Option<&VertexAttribute> {
        self.attributes
            .iter()
            .find(|attr| attr.semantic == semantic)
    }

    /// Check that every attribute references a defined buffer and fits in its stride.
    pub fn validate(&self) -> Result<(), GraphicsError> {
        for attr in &self.attributes {
            let Some(buffer) = self.buffers.get(attr.buffer_index as usize) else {
                return Err(GraphicsError::InvalidParameter(format!(
                    "attribute {:?} references buffer {} but only {} buffers defined",
                    attr.semantic,
                    attr.buffer_index,
                    self.buffers.len()
                )));
            };
            if attr.offset as usize + attr.format.size() > buffer.stride as usize {
                return Err(GraphicsError::InvalidParameter(format!(
                    "attribute {:?} at offset {} overruns stride {}",
                    attr.semantic, attr.offset, buffer.stride
                )));
            }
        }
        Ok(())
    }

    /// Interleaved position + color + texcoord layout (32 bytes, single buffer).
    pub fn position_color_uv() -> Arc<Self> {
        Arc::new(
            Self::new()
                .with_buffer(VertexBufferLayout::new(32))
                .with_attribute(VertexAttribute::position(0))
                .with_attribute(VertexAttribute::color(12))
                .with_attribute(VertexAttribute::tex_coord(24))
                .with_label("position_color_uv"),
        )
    }
}
