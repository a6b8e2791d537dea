//! Mesh geometry and the material-drawn mesh.
//!
//! [`MeshGeometry`] holds the vertex and index buffers of a draw, described by
//! a shared [`VertexLayout`]. A [`Mesh`] pairs geometry with the [`Material`]
//! that draws it.
//!
//! # Multiple Vertex Buffers
//!
//! Each vertex buffer corresponds to a slot of the layout; buffer `i` is bound
//! to slot `i` when the mesh is encoded.

use std::sync::Arc;

use bytemuck::Pod;

use crate::command::RenderCommandEncoder;
use crate::device::GraphicsDevice;
use crate::error::{GraphicsError, MaterialError};
use crate::materials::Material;
use crate::resources::Buffer;
use crate::types::{BufferDescriptor, BufferUsage, IndexFormat, PrimitiveTopology};

use super::layout::VertexLayout;

/// An index buffer and its element format.
#[derive(Debug, Clone)]
pub struct IndexBufferBinding {
    /// The buffer.
    pub buffer: Arc<Buffer>,
    /// Index element format.
    pub format: IndexFormat,
}

/// Vertex and index buffers for one draw.
#[derive(Clone)]
pub struct MeshGeometry {
    layout: Arc<VertexLayout>,
    topology: PrimitiveTopology,
    vertex_buffers: Vec<Arc<Buffer>>,
    vertex_start: u32,
    vertex_count: u32,
    index_buffer: Option<IndexBufferBinding>,
    index_count: u32,
    label: Option<String>,
}

impl MeshGeometry {
    /// Create geometry drawing `vertex_count` vertices from `vertex_buffers`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] if the layout is invalid or
    /// the number of buffers differs from the layout's buffer count.
    pub fn new(
        layout: Arc<VertexLayout>,
        vertex_buffers: Vec<Arc<Buffer>>,
        vertex_count: u32,
    ) -> Result<Self, GraphicsError> {
        layout.validate()?;
        if vertex_buffers.len() != layout.buffer_count() {
            return Err(GraphicsError::InvalidParameter(format!(
                "layout {:?} has {} vertex buffers, got {}",
                layout.label,
                layout.buffer_count(),
                vertex_buffers.len()
            )));
        }
        Ok(Self {
            layout,
            topology: PrimitiveTopology::default(),
            vertex_buffers,
            vertex_start: 0,
            vertex_count,
            index_buffer: None,
            index_count: 0,
            label: None,
        })
    }

    /// Upload vertices and indices into new host-writable buffers.
    ///
    /// An empty `indices` slice produces non-indexed geometry.
    pub fn from_vertices<T: Pod>(
        device: &Arc<GraphicsDevice>,
        layout: Arc<VertexLayout>,
        vertices: &[T],
        indices: &[u32],
    ) -> Result<Self, GraphicsError> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let vertex_buffer = device.create_buffer(
            &BufferDescriptor::new(
                vertex_bytes.len() as u64,
                BufferUsage::VERTEX | BufferUsage::MAP_WRITE,
            )
            .with_label("vertices"),
        )?;
        device.write_buffer(&vertex_buffer, 0, vertex_bytes)?;
        device.flush_buffer(&vertex_buffer)?;

        let mut geometry = Self::new(layout, vec![vertex_buffer], vertices.len() as u32)?;
        if !indices.is_empty() {
            let index_bytes: &[u8] = bytemuck::cast_slice(indices);
            let index_buffer = device.create_buffer(
                &BufferDescriptor::new(
                    index_bytes.len() as u64,
                    BufferUsage::INDEX | BufferUsage::MAP_WRITE,
                )
                .with_label("indices"),
            )?;
            device.write_buffer(&index_buffer, 0, index_bytes)?;
            device.flush_buffer(&index_buffer)?;
            geometry =
                geometry.with_index_buffer(index_buffer, IndexFormat::Uint32, indices.len() as u32);
        }
        Ok(geometry)
    }

    /// Set the primitive topology.
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Start drawing at `vertex_start`.
    pub fn with_vertex_start(mut self, vertex_start: u32) -> Self {
        self.vertex_start = vertex_start;
        self
    }

    /// Draw `index_count` indices from `buffer`.
    pub fn with_index_buffer(
        mut self,
        buffer: Arc<Buffer>,
        format: IndexFormat,
        index_count: u32,
    ) -> Self {
        self.index_buffer = Some(IndexBufferBinding { buffer, format });
        self.index_count = index_count;
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the vertex layout.
    pub fn layout(&self) -> &Arc<VertexLayout> {
        &self.layout
    }

    /// Get the primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Get all vertex buffers.
    pub fn vertex_buffers(&self) -> &[Arc<Buffer>] {
        &self.vertex_buffers
    }

    /// First vertex drawn.
    pub fn vertex_start(&self) -> u32 {
        self.vertex_start
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Get the index buffer, if any.
    pub fn index_buffer(&self) -> Option<&IndexBufferBinding> {
        self.index_buffer.as_ref()
    }

    /// Get the number of indices.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Check if this geometry uses indexed drawing.
    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    /// Get the label, if set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get the number of primitives based on topology and vertex/index count.
    pub fn primitive_count(&self) -> u32 {
        let count = if self.is_indexed() {
            self.index_count
        } else {
            self.vertex_count
        };

        match self.topology {
            PrimitiveTopology::PointList => count,
            PrimitiveTopology::LineList => count / 2,
            PrimitiveTopology::LineStrip => count.saturating_sub(1),
            PrimitiveTopology::TriangleList => count / 3,
            PrimitiveTopology::TriangleStrip => count.saturating_sub(2),
        }
    }
}

impl std::fmt::Debug for MeshGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshGeometry")
            .field("label", &self.label)
            .field("topology", &self.topology)
            .field("vertex_count", &self.vertex_count)
            .field("vertex_buffer_count", &self.vertex_buffers.len())
            .field("index_count", &self.index_count)
            .field("layout", &self.layout.label)
            .finish()
    }
}

/// Geometry drawn with a material.
#[derive(Debug)]
pub struct Mesh {
    geometry: MeshGeometry,
    material: Material,
}

impl Mesh {
    /// Pair `geometry` with `material`.
    pub fn new(geometry: MeshGeometry, material: Material) -> Self {
        Self { geometry, material }
    }

    /// The geometry.
    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    /// The material.
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// The material, for property updates.
    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    /// Resolve the material against the geometry's layout and topology.
    pub fn init_resources(&mut self, device: &Arc<GraphicsDevice>) -> Result<(), MaterialError> {
        self.material
            .init_resources(device, &self.geometry.layout, self.geometry.topology)
    }

    /// Flush the material's properties.
    pub fn update_material_properties(&mut self) -> Result<(), MaterialError> {
        self.material.update_material_properties()
    }

    /// Record the commands that draw this mesh.
    pub fn encode_render_command(
        &self,
        encoder: &mut RenderCommandEncoder,
        instance_count: u32,
        base_instance: u32,
    ) -> Result<(), MaterialError> {
        self.material
            .encode_render_command(encoder, &self.geometry, instance_count, base_instance)
    }
}

// Ensure mesh types are Send + Sync
static_assertions::assert_impl_all!(MeshGeometry: Send, Sync);
static_assertions::assert_impl_all!(Mesh: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Vertex;

    fn triangle() -> Vec<Vertex> {
        vec![
            Vertex::new([0.0, 0.5, 0.0], [1.0, 0.0, 0.0], [0.5, 0.0]),
            Vertex::new([-0.5, -0.5, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0]),
            Vertex::new([0.5, -0.5, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
        ]
    }

    #[test]
    fn test_from_vertices_uploads_indexed_geometry() {
        let device = GraphicsDevice::dummy();
        let geometry = MeshGeometry::from_vertices(
            &device,
            VertexLayout::position_color_uv(),
            &triangle(),
            &[0, 1, 2],
        )
        .unwrap();

        assert!(geometry.is_indexed());
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.index_count(), 3);
        assert_eq!(geometry.primitive_count(), 1);
        assert_eq!(geometry.vertex_buffers()[0].size(), 96);

        let index = geometry.index_buffer().unwrap();
        assert_eq!(index.format, IndexFormat::Uint32);
        let bytes = device.read_buffer(&index.buffer, 0, 12).unwrap();
        assert_eq!(bytes.as_slice(), bytemuck::cast_slice::<u32, u8>(&[0, 1, 2]));
    }

    #[test]
    fn test_empty_indices_are_non_indexed() {
        let device = GraphicsDevice::dummy();
        let geometry = MeshGeometry::from_vertices(
            &device,
            VertexLayout::position_color_uv(),
            &triangle(),
            &[],
        )
        .unwrap()
        .with_topology(PrimitiveTopology::TriangleStrip);
        assert!(!geometry.is_indexed());
        assert_eq!(geometry.primitive_count(), 1);
    }

    #[test]
    fn test_buffer_count_must_match_layout() {
        let result = MeshGeometry::new(VertexLayout::position_color_uv(), Vec::new(), 3);
        assert!(matches!(result, Err(GraphicsError::InvalidParameter(_))));
    }
}
