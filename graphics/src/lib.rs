//! # Material Graphics
//!
//! Shader reflection model, reflection reports and name-keyed material binding.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`shader`] - Reflection data for shaders and linked pipelines, plus
//!   human-readable reports written through `log`
//! - [`Material`] - Binds textures, samplers and struct values to shader
//!   resources by the names the shaders declare
//! - [`GraphicsDevice`] - Creates buffers, textures, pipelines and binding sets
//!   on a [`GpuBackend`]
//! - [`RenderCommandEncoder`] - Records draws issued by materials
//!
//! ## Example
//!
//! ```ignore
//! use material_graphics::{GraphicsDevice, Material, ShaderTemplate};
//!
//! let device = GraphicsDevice::dummy();
//! let mut material = Material::new();
//! material.register_shader_stage(ShaderTemplate::new(vertex_fn))?;
//! material.register_shader_stage(ShaderTemplate::new(fragment_fn))?;
//! material.init_resources(&device, &layout, PrimitiveTopology::TriangleList)?;
//!
//! material.set_struct_element("ubo.model", &model.to_cols_array_2d())?;
//! material.update_material_properties()?;
//! material.encode_render_command(&mut encoder, &geometry, 1, 0)?;
//! ```

pub mod backend;
pub mod command;
pub mod device;
pub mod error;
pub mod materials;
pub mod mesh;
pub mod pipeline;
pub mod resources;
pub mod shader;
pub mod types;

// Re-export main types for convenience
pub use backend::dummy::DummyBackend;
pub use backend::GpuBackend;
pub use command::{RenderCommand, RenderCommandEncoder};
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use error::{GraphicsError, MaterialError};
pub use materials::{
    BindingSet, BindingSetLayout, Material, MaterialState, ShaderTemplate, ShaderValue,
    StructElementProperty,
};
pub use mesh::{
    Mesh, MeshGeometry, Vertex, VertexAttribute, VertexAttributeFormat, VertexAttributeSemantic,
    VertexLayout,
};
pub use pipeline::{
    BlendState, ColorAttachmentDescriptor, CullMode, DepthStencilState, RenderPipelineDescriptor,
    RenderPipelineState,
};
pub use resources::{Buffer, Sampler, Texture};
pub use shader::{
    PipelineReflection, Shader, ShaderAttribute, ShaderDataType, ShaderFunction, ShaderModule,
    ShaderReflection, ShaderResource, ShaderResourceType, ShaderStage, ShaderStageFlags,
    StructMember,
};
pub use types::{
    BufferDescriptor, BufferUsage, CompareFunction, Extent3d, IndexFormat, PrimitiveTopology,
    SamplerDescriptor, TextureDescriptor, TextureFormat, TextureUsage,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
