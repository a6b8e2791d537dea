//! Render command recording.
//!
//! A [`RenderCommandEncoder`] records draw state and draw calls into a flat
//! list of [`RenderCommand`]s. Encoding is closed with
//! [`RenderCommandEncoder::end_encoding`]; any command issued afterwards is
//! rejected with [`GraphicsError::EncoderEnded`].

use std::sync::Arc;

use crate::error::GraphicsError;
use crate::materials::BindingSet;
use crate::pipeline::RenderPipelineState;
use crate::resources::Buffer;
use crate::types::{BufferUsage, IndexFormat};

/// A recorded render command.
#[derive(Debug, Clone)]
pub enum RenderCommand {
    /// Bind a render pipeline.
    SetPipeline(Arc<RenderPipelineState>),
    /// Bind a vertex buffer to a slot.
    SetVertexBuffer {
        /// Vertex buffer slot.
        slot: u32,
        /// The buffer.
        buffer: Arc<Buffer>,
        /// Byte offset of the first vertex.
        offset: u64,
    },
    /// Bind an index buffer.
    SetIndexBuffer {
        /// The buffer.
        buffer: Arc<Buffer>,
        /// Byte offset of the first index.
        offset: u64,
        /// Index element format.
        format: IndexFormat,
    },
    /// Bind a descriptor set.
    SetBindingSet {
        /// Descriptor set index.
        index: u32,
        /// Resources attached to the set.
        set: BindingSet,
    },
    /// Non-indexed draw.
    Draw {
        /// First vertex.
        vertex_start: u32,
        /// Number of vertices.
        vertex_count: u32,
        /// Number of instances.
        instance_count: u32,
        /// First instance.
        base_instance: u32,
    },
    /// Indexed draw.
    DrawIndexed {
        /// Number of indices.
        index_count: u32,
        /// Number of instances.
        instance_count: u32,
        /// First index.
        index_offset: u32,
        /// Value added to each index.
        vertex_offset: i32,
        /// First instance.
        base_instance: u32,
    },
}

/// Records render commands for one pass.
#[derive(Debug, Default)]
pub struct RenderCommandEncoder {
    label: Option<String>,
    commands: Vec<RenderCommand>,
    pipeline_bound: bool,
    index_format: Option<IndexFormat>,
    ended: bool,
}

impl RenderCommandEncoder {
    /// Create an open encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the encoder label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Bind a render pipeline for subsequent draws.
    pub fn set_render_pipeline(
        &mut self,
        pipeline: Arc<RenderPipelineState>,
    ) -> Result<(), GraphicsError> {
        self.push(RenderCommand::SetPipeline(pipeline))?;
        self.pipeline_bound = true;
        Ok(())
    }

    /// Bind a vertex buffer to `slot`.
    pub fn set_vertex_buffer(
        &mut self,
        slot: u32,
        buffer: Arc<Buffer>,
        offset: u64,
    ) -> Result<(), GraphicsError> {
        if !buffer.descriptor().usage.contains(BufferUsage::VERTEX) {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer {:?} is not a vertex buffer",
                buffer.label()
            )));
        }
        self.push(RenderCommand::SetVertexBuffer {
            slot,
            buffer,
            offset,
        })
    }

    /// Bind an index buffer.
    pub fn set_index_buffer(
        &mut self,
        buffer: Arc<Buffer>,
        offset: u64,
        format: IndexFormat,
    ) -> Result<(), GraphicsError> {
        if !buffer.descriptor().usage.contains(BufferUsage::INDEX) {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer {:?} is not an index buffer",
                buffer.label()
            )));
        }
        self.push(RenderCommand::SetIndexBuffer {
            buffer,
            offset,
            format,
        })?;
        self.index_format = Some(format);
        Ok(())
    }

    /// Bind a descriptor set at `index`.
    pub fn set_binding_set(&mut self, index: u32, set: BindingSet) -> Result<(), GraphicsError> {
        self.push(RenderCommand::SetBindingSet { index, set })
    }

    /// Record a non-indexed draw.
    pub fn draw(
        &mut self,
        vertex_start: u32,
        vertex_count: u32,
        instance_count: u32,
        base_instance: u32,
    ) -> Result<(), GraphicsError> {
        self.check_pipeline()?;
        self.push(RenderCommand::Draw {
            vertex_start,
            vertex_count,
            instance_count,
            base_instance,
        })
    }

    /// Record an indexed draw.
    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        index_offset: u32,
        vertex_offset: i32,
        base_instance: u32,
    ) -> Result<(), GraphicsError> {
        self.check_pipeline()?;
        if self.index_format.is_none() {
            return Err(GraphicsError::InvalidParameter(
                "indexed draw without an index buffer".to_string(),
            ));
        }
        self.push(RenderCommand::DrawIndexed {
            index_count,
            instance_count,
            index_offset,
            vertex_offset,
            base_instance,
        })
    }

    /// Close the encoder. Further commands are rejected.
    pub fn end_encoding(&mut self) {
        if !self.ended {
            log::trace!(
                "RenderCommandEncoder: {:?} ended with {} commands",
                self.label,
                self.commands.len()
            );
        }
        self.ended = true;
    }

    /// Whether [`RenderCommandEncoder::end_encoding`] has been called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Commands recorded so far.
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the encoder empty.
    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    fn check_pipeline(&self) -> Result<(), GraphicsError> {
        if self.pipeline_bound {
            Ok(())
        } else {
            Err(GraphicsError::InvalidParameter(
                "draw without a render pipeline".to_string(),
            ))
        }
    }

    fn push(&mut self, command: RenderCommand) -> Result<(), GraphicsError> {
        if self.ended {
            return Err(GraphicsError::EncoderEnded);
        }
        self.commands.push(command);
        Ok(())
    }
}

static_assertions::assert_impl_all!(RenderCommandEncoder: Send, Sync);
