//! Shader data type registry.
//!
//! [`ShaderDataType`] enumerates every value type a reflected shader interface
//! can carry: scalars, vectors and matrices of the numeric base types, plus
//! the opaque `Struct`, `Texture` and `Sampler` kinds.
//!
//! # Naming
//!
//! - Scalars use the base name: `Int32`, `Float16`, `Bool`.
//! - Vectors append the component count: `Float32x3`, `UInt8x4`.
//! - Matrices (floating types only) use `M<columns>x<rows>`: `Float32M4x4`.
//!
//! Each variant has a stable raw code (its declaration index) so reflection
//! produced by an external reflector can be decoded with
//! [`ShaderDataType::from_raw`]. Codes that do not map to a variant are
//! reported as `"Error"` by [`data_type_name`].

macro_rules! shader_data_types {
    ($($variant:ident),* $(,)?) => {
        /// Data type of a shader attribute, struct member or resource.
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ShaderDataType {
            $(
                #[allow(missing_docs)]
                $variant,
            )*
        }

        impl ShaderDataType {
            /// Every data type in raw-code order.
            pub const ALL: &'static [ShaderDataType] = &[$(ShaderDataType::$variant,)*];

            /// Canonical name of the data type, used in diagnostics.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                }
            }
        }
    };
}

shader_data_types! {
    Unknown,
    None,

    Struct,
    Texture,
    Sampler,

    Bool, Boolx2, Boolx3, Boolx4,
    Int8, Int8x2, Int8x3, Int8x4,
    UInt8, UInt8x2, UInt8x3, UInt8x4,
    Int16, Int16x2, Int16x3, Int16x4,
    UInt16, UInt16x2, UInt16x3, UInt16x4,
    Int32, Int32x2, Int32x3, Int32x4,
    UInt32, UInt32x2, UInt32x3, UInt32x4,
    Int64, Int64x2, Int64x3, Int64x4,
    UInt64, UInt64x2, UInt64x3, UInt64x4,

    Float16, Float16x2, Float16x3, Float16x4,
    Float16M2x2, Float16M2x3, Float16M2x4,
    Float16M3x2, Float16M3x3, Float16M3x4,
    Float16M4x2, Float16M4x3, Float16M4x4,

    Float32, Float32x2, Float32x3, Float32x4,
    Float32M2x2, Float32M2x3, Float32M2x4,
    Float32M3x2, Float32M3x3, Float32M3x4,
    Float32M4x2, Float32M4x3, Float32M4x4,

    Float64, Float64x2, Float64x3, Float64x4,
    Float64M2x2, Float64M2x3, Float64M2x4,
    Float64M3x2, Float64M3x3, Float64M3x4,
    Float64M4x2, Float64M4x3, Float64M4x4,
}

// Raw-code layout: 5 opaque/sentinel codes, then 9 non-float base types with
// 4 vector widths each, then 3 float base types with 4 vector widths and 9
// matrix shapes each.
const FIRST_NUMERIC: u32 = ShaderDataType::Bool as u32;
const NON_FLOAT_WIDTHS: [u32; 9] = [4, 1, 1, 2, 2, 4, 4, 8, 8];
const FLOAT_WIDTHS: [u32; 3] = [2, 4, 8];
const FLOAT_BLOCK: u32 = 4 + 9;

/// Scalar width and column/row counts of a numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shape {
    scalar_size: u32,
    columns: u32,
    rows: u32,
    float: bool,
}

impl ShaderDataType {
    /// Decode a raw type code. Returns `None` for codes outside the enumeration.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Raw code of this data type.
    pub fn raw(self) -> u32 {
        self as u32
    }

    fn shape(self) -> Option<Shape> {
        let raw = self as u32;
        if raw < FIRST_NUMERIC {
            return None;
        }
        let index = raw - FIRST_NUMERIC;
        let non_float = NON_FLOAT_WIDTHS.len() as u32 * 4;
        if index < non_float {
            return Some(Shape {
                scalar_size: NON_FLOAT_WIDTHS[(index / 4) as usize],
                columns: 1,
                rows: index % 4 + 1,
                float: false,
            });
        }

        let index = index - non_float;
        let scalar_size = FLOAT_WIDTHS[(index / FLOAT_BLOCK) as usize];
        let within = index % FLOAT_BLOCK;
        let (columns, rows) = if within < 4 {
            (1, within + 1)
        } else {
            let matrix = within - 4;
            (matrix / 3 + 2, matrix % 3 + 2)
        };
        Some(Shape {
            scalar_size,
            columns,
            rows,
            float: true,
        })
    }

    /// Whether this is one of the opaque kinds (`Struct`, `Texture`, `Sampler`).
    pub fn is_opaque(self) -> bool {
        matches!(self, Self::Struct | Self::Texture | Self::Sampler)
    }

    /// Whether this is a sentinel (`Unknown` or `None`) rather than a real type.
    pub fn is_sentinel(self) -> bool {
        matches!(self, Self::Unknown | Self::None)
    }

    /// Whether this is a single numeric or boolean value.
    pub fn is_scalar(self) -> bool {
        self.shape().is_some_and(|s| s.columns == 1 && s.rows == 1)
    }

    /// Whether this is a 2, 3 or 4 component vector.
    pub fn is_vector(self) -> bool {
        self.shape().is_some_and(|s| s.columns == 1 && s.rows > 1)
    }

    /// Whether this is a matrix type.
    pub fn is_matrix(self) -> bool {
        self.shape().is_some_and(|s| s.columns > 1)
    }

    /// Whether the base type is a floating point type.
    pub fn is_float(self) -> bool {
        self.shape().is_some_and(|s| s.float)
    }

    /// Number of scalar components (columns × rows), 0 for opaque and sentinel types.
    pub fn component_count(self) -> u32 {
        self.shape().map_or(0, |s| s.columns * s.rows)
    }

    /// Byte width of one scalar component, 0 for opaque and sentinel types.
    ///
    /// `Bool` is reported as 4 bytes, matching its size in shader buffers.
    pub fn scalar_size(self) -> u32 {
        self.shape().map_or(0, |s| s.scalar_size)
    }

    /// Tightly packed byte size, 0 for opaque and sentinel types.
    ///
    /// Layout rules such as std140 matrix column padding are not applied; the
    /// reflected [`StructMember::size`](super::StructMember::size) is
    /// authoritative for buffer layouts.
    pub fn size(self) -> u32 {
        self.component_count() * self.scalar_size()
    }
}

impl std::fmt::Display for ShaderDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of a raw data type code, or `"Error"` if the code is not a known type.
///
/// Reflection emitted by a newer shader compiler may contain codes this
/// registry does not know yet; they are reported instead of rejected.
pub fn data_type_name(raw: u32) -> &'static str {
    ShaderDataType::from_raw(raw).map_or("Error", ShaderDataType::name)
}
