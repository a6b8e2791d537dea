//! Material property values.

use std::sync::Arc;

use bytemuck::Pod;

use crate::resources::{Sampler, Texture};
use crate::shader::ShaderDataType;

/// Textures assigned to a named texture resource, one per array element.
#[derive(Debug, Clone, Default)]
pub struct TextureProperty {
    /// The textures.
    pub textures: Vec<Arc<Texture>>,
}

/// Samplers assigned to a named sampler resource, one per array element.
#[derive(Debug, Clone, Default)]
pub struct SamplerProperty {
    /// The samplers.
    pub samplers: Vec<Arc<Sampler>>,
}

/// Raw bytes for one member of a struct held by a buffer resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructElementProperty {
    /// Declared type of the value.
    pub data_type: ShaderDataType,
    /// Value bytes, exactly the member's span.
    pub bytes: Vec<u8>,
}

impl StructElementProperty {
    /// Create a property from raw bytes.
    pub fn new(data_type: ShaderDataType, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            data_type,
            bytes: bytes.into(),
        }
    }

    /// Create a property from a typed value.
    pub fn from_value<T: ShaderValue>(value: &T) -> Self {
        Self::new(T::DATA_TYPE, bytemuck::bytes_of(value))
    }
}

/// A plain value whose memory layout matches a shader data type.
///
/// Matrices are column-major arrays of columns, so `[[f32; 4]; 4]` is a
/// `Float32M4x4` (what `glam::Mat4::to_cols_array_2d` returns).
pub trait ShaderValue: Pod {
    /// The shader type this value is written as.
    const DATA_TYPE: ShaderDataType;
}

macro_rules! impl_shader_value {
    ($($ty:ty => $data_type:ident),* $(,)?) => {
        $(
            impl ShaderValue for $ty {
                const DATA_TYPE: ShaderDataType = ShaderDataType::$data_type;
            }
        )*
    };
}

impl_shader_value! {
    f32 => Float32,
    [f32; 2] => Float32x2,
    [f32; 3] => Float32x3,
    [f32; 4] => Float32x4,
    [[f32; 2]; 2] => Float32M2x2,
    [[f32; 3]; 3] => Float32M3x3,
    [[f32; 4]; 4] => Float32M4x4,
    f64 => Float64,
    i32 => Int32,
    [i32; 2] => Int32x2,
    [i32; 3] => Int32x3,
    [i32; 4] => Int32x4,
    u32 => UInt32,
    [u32; 2] => UInt32x2,
    [u32; 3] => UInt32x3,
    [u32; 4] => UInt32x4,
}

/// A struct write recorded before the material is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StructWrite {
    /// Whole struct, keyed by resource name.
    Whole(Vec<u8>),
    /// Single member, keyed by dotted path.
    Element(StructElementProperty),
}
