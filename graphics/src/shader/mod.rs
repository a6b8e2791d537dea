//! Shaders and their reflection.
//!
//! This module provides:
//! - [`ShaderDataType`] - Registry of value types a shader interface can carry
//! - [`ShaderReflection`] / [`PipelineReflection`] - What a shader or linked
//!   pipeline exposes: attributes, resources, struct layouts, push constants
//! - [`report`] - Human-readable reflection reports written through `log`
//! - [`Shader`], [`ShaderModule`], [`ShaderFunction`] - Compiled shader handles
//!
//! # Example
//!
//! ```ignore
//! let shader = Arc::new(Shader::new(
//!     ShaderReflection::new(ShaderStage::Vertex)
//!         .with_input(ShaderAttribute::new("inPos", 0, ShaderDataType::Float32x3)),
//! ));
//! report::log_shader_reflection(&shader, log::Level::Debug);
//!
//! let module = device.create_shader_module(&shader)?;
//! let function = module.create_function("main")?;
//! ```

mod data_type;
mod reflection;
pub mod report;

use std::sync::Arc;

use crate::error::GraphicsError;

pub use data_type::{data_type_name, ShaderDataType};
pub use reflection::{
    PipelineReflection, PushConstantLayout, ResolvedMember, ShaderAccess, ShaderAttribute,
    ShaderReflection, ShaderResource, ShaderResourceType, StructMember, StructTypeTable,
};

/// Shader stage in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Tessellation control (hull) shader.
    TessellationControl,
    /// Tessellation evaluation (domain) shader.
    TessellationEvaluation,
    /// Geometry shader.
    Geometry,
    /// Fragment shader.
    Fragment,
    /// Compute shader.
    Compute,
}

impl ShaderStage {
    /// Every stage, in pipeline order.
    pub const ALL: [ShaderStage; 6] = [
        Self::Vertex,
        Self::TessellationControl,
        Self::TessellationEvaluation,
        Self::Geometry,
        Self::Fragment,
        Self::Compute,
    ];

    /// The stage as a single-bit mask.
    pub fn flag(self) -> ShaderStageFlags {
        match self {
            Self::Vertex => ShaderStageFlags::VERTEX,
            Self::TessellationControl => ShaderStageFlags::TESSELLATION_CONTROL,
            Self::TessellationEvaluation => ShaderStageFlags::TESSELLATION_EVALUATION,
            Self::Geometry => ShaderStageFlags::GEOMETRY,
            Self::Fragment => ShaderStageFlags::FRAGMENT,
            Self::Compute => ShaderStageFlags::COMPUTE,
        }
    }

    /// Short stage name used in reports.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Vertex => "Vertex",
            Self::TessellationControl => "TessCtrl",
            Self::TessellationEvaluation => "TessEval",
            Self::Geometry => "Geometry",
            Self::Fragment => "Fragment",
            Self::Compute => "Compute",
        }
    }
}

bitflags::bitflags! {
    /// Set of shader stages.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        /// Vertex shader stage.
        const VERTEX = 1 << 0;
        /// Tessellation control shader stage.
        const TESSELLATION_CONTROL = 1 << 1;
        /// Tessellation evaluation shader stage.
        const TESSELLATION_EVALUATION = 1 << 2;
        /// Geometry shader stage.
        const GEOMETRY = 1 << 3;
        /// Fragment shader stage.
        const FRAGMENT = 1 << 4;
        /// Compute shader stage.
        const COMPUTE = 1 << 5;
    }
}

impl From<ShaderStage> for ShaderStageFlags {
    fn from(stage: ShaderStage) -> Self {
        stage.flag()
    }
}

/// A compiled shader binary together with its reflection.
///
/// The binary is opaque to this crate; the reflection is expected to come
/// from a reflector that already parsed it.
#[derive(Debug, Clone)]
pub struct Shader {
    code: Vec<u8>,
    entry_points: Vec<String>,
    reflection: ShaderReflection,
    label: Option<String>,
}

impl Shader {
    /// Create a shader from its reflection, with a single `main` entry point.
    pub fn new(reflection: ShaderReflection) -> Self {
        Self {
            code: Vec::new(),
            entry_points: vec!["main".to_string()],
            reflection,
            label: None,
        }
    }

    /// Attach the compiled binary.
    pub fn with_code(mut self, code: impl Into<Vec<u8>>) -> Self {
        self.code = code.into();
        self
    }

    /// Replace the entry point list.
    pub fn with_entry_points<I, S>(mut self, entry_points: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry_points = entry_points.into_iter().map(Into::into).collect();
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The stage this shader runs in.
    pub fn stage(&self) -> ShaderStage {
        self.reflection.stage
    }

    /// The compiled binary.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Entry point names.
    pub fn entry_points(&self) -> &[String] {
        &self.entry_points
    }

    /// Full reflection.
    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    /// Stage inputs.
    pub fn input_attributes(&self) -> &[ShaderAttribute] {
        &self.reflection.input_attributes
    }

    /// Stage outputs.
    pub fn output_attributes(&self) -> &[ShaderAttribute] {
        &self.reflection.output_attributes
    }

    /// Bindable resources.
    pub fn resources(&self) -> &[ShaderResource] {
        &self.reflection.resources
    }

    /// Push-constant ranges.
    pub fn push_constant_layouts(&self) -> &[PushConstantLayout] {
        &self.reflection.push_constant_layouts
    }

    /// Debug label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// A shader loaded on a device.
///
/// Created by
/// [`GraphicsDevice::create_shader_module`](crate::GraphicsDevice::create_shader_module).
#[derive(Debug)]
pub struct ShaderModule {
    shader: Arc<Shader>,
}

impl ShaderModule {
    pub(crate) fn new(shader: Arc<Shader>) -> Self {
        Self { shader }
    }

    /// The shader this module was created from.
    pub fn shader(&self) -> &Arc<Shader> {
        &self.shader
    }

    /// Names of the entry points that can be turned into functions.
    pub fn function_names(&self) -> &[String] {
        self.shader.entry_points()
    }

    /// Create a function for the entry point `name`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] if the shader has no such entry point.
    pub fn create_function(&self, name: &str) -> Result<Arc<ShaderFunction>, GraphicsError> {
        if !self.function_names().iter().any(|n| n == name) {
            return Err(GraphicsError::InvalidParameter(format!(
                "shader has no entry point named '{name}'"
            )));
        }
        Ok(Arc::new(ShaderFunction {
            name: name.to_string(),
            shader: Arc::clone(&self.shader),
        }))
    }
}

/// An entry point of a [`ShaderModule`], usable as a pipeline stage.
#[derive(Debug)]
pub struct ShaderFunction {
    name: String,
    shader: Arc<Shader>,
}

impl ShaderFunction {
    /// Entry point name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shader the entry point belongs to.
    pub fn shader(&self) -> &Arc<Shader> {
        &self.shader
    }

    /// Stage of the entry point.
    pub fn stage(&self) -> ShaderStage {
        self.shader.stage()
    }

    /// Stage inputs of the entry point.
    pub fn stage_input_attributes(&self) -> &[ShaderAttribute] {
        self.shader.input_attributes()
    }

    /// Reflection of the shader the entry point belongs to.
    pub fn reflection(&self) -> &ShaderReflection {
        self.shader.reflection()
    }
}

static_assertions::assert_impl_all!(Shader: Send, Sync);
static_assertions::assert_impl_all!(ShaderFunction: Send, Sync);
