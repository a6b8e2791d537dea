//! Render and compute pipelines.
//!
//! A pipeline links shader functions with fixed-function state. Creating one
//! through [`GraphicsDevice`](crate::GraphicsDevice) validates the stages
//! against each other and against the vertex input, and merges the stage
//! reflections into a single [`PipelineReflection`](crate::shader::PipelineReflection)
//! that materials resolve their property names against.

mod blend;
mod descriptor;
mod state;

pub use blend::{BlendComponent, BlendFactor, BlendOperation, BlendState};
pub use descriptor::{
    ColorAttachmentDescriptor, ComputePipelineDescriptor, CullMode, DepthStencilState,
    RenderPipelineDescriptor, VertexInputAttribute, VertexInputDescriptor,
};
pub use state::{ComputePipelineState, RenderPipelineState};
