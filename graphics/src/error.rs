//! Error types.

use thiserror::Error;

use crate::shader::{ShaderDataType, ShaderResourceType};

/// Errors that can occur in the device layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Failed to create a resource.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// A requested feature is not supported.
    #[error("feature not supported: {0}")]
    FeatureNotSupported(String),
    /// The device that owned a resource has been dropped.
    #[error("GPU device lost")]
    DeviceLost,
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// A command was recorded into an encoder that already ended.
    #[error("command encoder has already ended encoding")]
    EncoderEnded,
}

/// Errors reported by [`Material`](crate::Material).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterialError {
    /// Property names that do not match anything in the pipeline reflection.
    #[error("unresolved material properties: {}", .names.join(", "))]
    UnresolvedProperties {
        /// Every name that failed to resolve.
        names: Vec<String>,
    },
    /// A name resolved to a resource of a different kind.
    #[error("resource '{name}' is {actual:?}, expected {expected:?}")]
    ResourceTypeMismatch {
        /// Resource name.
        name: String,
        /// Kind the caller asked for.
        expected: ShaderResourceType,
        /// Kind found in the reflection.
        actual: ShaderResourceType,
    },
    /// A shader input cannot be fed from the vertex layout attribute it maps to.
    #[error("input attribute '{name}' is {expected}, vertex layout provides {actual}")]
    AttributeTypeMismatch {
        /// Shader input name.
        name: String,
        /// Type the shader expects.
        expected: ShaderDataType,
        /// Type the vertex layout provides.
        actual: ShaderDataType,
    },
    /// The operation is not valid in the material's current state.
    #[error("cannot {operation} while material is {state}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the material was in.
        state: &'static str,
    },
    /// A resolved material has no property with this name.
    #[error("unknown material property '{0}'")]
    UnknownProperty(String),
    /// Written bytes do not match the size of the target.
    #[error("property '{name}' expects {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Property name.
        name: String,
        /// Size of the target in bytes.
        expected: usize,
        /// Size of the written data.
        actual: usize,
    },
    /// A struct element was written with a different data type than reflected.
    #[error("property '{name}' is {expected}, got {actual}")]
    DataTypeMismatch {
        /// Property name.
        name: String,
        /// Reflected data type.
        expected: ShaderDataType,
        /// Data type given by the caller.
        actual: ShaderDataType,
    },
    /// Device layer failure.
    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::DeviceLost;
        assert_eq!(err.to_string(), "GPU device lost");

        let err = GraphicsError::InvalidParameter("buffer size cannot be zero".to_string());
        assert_eq!(err.to_string(), "invalid parameter: buffer size cannot be zero");
    }

    #[test]
    fn test_material_error_display() {
        let err = MaterialError::UnresolvedProperties {
            names: vec!["samplerColour".to_string(), "ubo.modle".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unresolved material properties: samplerColour, ubo.modle"
        );

        let err = MaterialError::InvalidState {
            operation: "encode render command",
            state: "Resourced",
        };
        assert_eq!(
            err.to_string(),
            "cannot encode render command while material is Resourced"
        );

        let err: MaterialError = GraphicsError::EncoderEnded.into();
        assert_eq!(err.to_string(), "command encoder has already ended encoding");
    }
}
