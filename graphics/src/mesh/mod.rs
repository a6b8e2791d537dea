//! Mesh types.
//!
//! This module provides the vertex side of a draw:
//!
//! - [`VertexLayout`] - Describes vertex attributes by semantic (shared via `Arc`)
//! - [`MeshGeometry`] - Vertex/index buffers plus topology
//! - [`Mesh`] - Geometry paired with the [`Material`](crate::Material) drawing it
//! - [`Vertex`] / [`VertexDeduplicator`] - Sample vertex format and indexing
//!
//! # Efficient Sharing via Arc
//!
//! Vertex layouts are wrapped in `Arc` since there are typically only a few
//! layout combinations across many meshes.

mod geometry;
mod layout;
mod vertex;

pub use geometry::{IndexBufferBinding, Mesh, MeshGeometry};
pub use layout::{
    VertexAttribute, VertexAttributeFormat, VertexAttributeSemantic, VertexBufferLayout,
    VertexLayout, VertexStepMode,
};
pub use vertex::{Vertex, VertexDeduplicator, VERTEX_EPSILON};
