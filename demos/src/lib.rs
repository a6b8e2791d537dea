//! # Material Demos
//!
//! Sample wiring the material system together.
//!
//! ## Available Demos
//!
//! - `material_demo` - Textured cube whose uniform block is written by name
//!   every frame on a dedicated render thread

pub mod render_worker;
pub mod scene;

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
