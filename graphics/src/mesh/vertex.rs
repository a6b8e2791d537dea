//! Sample vertex format and vertex de-duplication.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};

/// Components closer than this compare equal.
pub const VERTEX_EPSILON: f32 = 1e-4;

/// Position, color and texture coordinate, matching
/// [`VertexLayout::position_color_uv`](super::VertexLayout::position_color_uv).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Object space position.
    pub position: [f32; 3],
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Texture coordinate.
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a vertex.
    pub fn new(position: [f32; 3], color: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            color,
            tex_coord,
        }
    }

    fn components(&self) -> impl Iterator<Item = f32> + '_ {
        self.position
            .iter()
            .chain(&self.color)
            .chain(&self.tex_coord)
            .copied()
    }

    /// Lexicographic comparison over position, color, then texture
    /// coordinate. Components differing by less than [`VERTEX_EPSILON`] are
    /// treated as equal. NaN components fall back to [`f32::total_cmp`], so
    /// the ordering stays total.
    pub fn compare(&self, other: &Self) -> Ordering {
        for (a, b) in self.components().zip(other.components()) {
            if (a - b).abs() < VERTEX_EPSILON {
                continue;
            }
            let ordering = a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

struct VertexKey(Vertex);

impl PartialEq for VertexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VertexKey {}

impl PartialOrd for VertexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VertexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.compare(&other.0)
    }
}

/// Builds an indexed vertex list, storing each distinct vertex once.
#[derive(Default)]
pub struct VertexDeduplicator {
    lookup: BTreeMap<VertexKey, u32>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl VertexDeduplicator {
    /// Create an empty deduplicator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `vertex` to the index list, reusing the index of an equal vertex.
    pub fn push(&mut self, vertex: Vertex) -> u32 {
        let next = self.vertices.len() as u32;
        let index = *self.lookup.entry(VertexKey(vertex)).or_insert(next);
        if index == next {
            self.vertices.push(vertex);
        }
        self.indices.push(index);
        index
    }

    /// Unique vertices in first-seen order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// One index per pushed vertex.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Consume into unique vertices and indices.
    pub fn finish(self) -> (Vec<Vertex>, Vec<u32>) {
        (self.vertices, self.indices)
    }
}

impl Extend<Vertex> for VertexDeduplicator {
    fn extend<I: IntoIterator<Item = Vertex>>(&mut self, iter: I) {
        for vertex in iter {
            self.push(vertex);
        }
    }
}

static_assertions::assert_eq_size!(Vertex, [f32; 8]);
