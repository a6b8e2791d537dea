//! Material system.
//!
//! This module binds values to shader resources by name:
//!
//! - [`Material`] - Resolves property names against a pipeline's reflection,
//!   owns the buffers backing struct resources, and encodes draws
//! - [`ShaderTemplate`] - A shader function plus naming hints for a stage
//! - [`BindingSetLayout`] / [`BindingSet`] - Descriptor set layout derived from
//!   reflection and the resources attached to it
//! - [`StructElementProperty`], [`TextureProperty`], [`SamplerProperty`] -
//!   Property values
//!
//! # Sharing via Arc
//!
//! Binding set layouts are wrapped in `Arc` so sets created from the same
//! layout can be compared by pointer.

mod bindings;
mod material;
mod property;

pub use bindings::{BindingLayoutEntry, BindingSet, BindingSetLayout, BoundResource};
pub use material::{Material, MaterialState, ShaderTemplate};
pub use property::{SamplerProperty, ShaderValue, StructElementProperty, TextureProperty};
