//! Common utilities for material integration tests.
//!
//! Builds the textured-quad setup used across tests: a vertex shader reading
//! position, color and texture coordinate and a `ubo` with projection, model
//! and view matrices, plus a fragment shader sampling `samplerColor`.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use material_graphics::{
    BlendState, ColorAttachmentDescriptor, CompareFunction, DepthStencilState, DummyBackend,
    GraphicsDevice, Material, MeshGeometry, SamplerDescriptor, Shader, ShaderAttribute,
    ShaderDataType, ShaderReflection, ShaderResource, ShaderStage, ShaderTemplate, StructMember,
    Texture, TextureDescriptor, TextureFormat, TextureUsage, Vertex, VertexAttributeSemantic,
    VertexLayout,
};

/// Size of the `ubo` struct in bytes.
pub const UBO_SIZE: u32 = 192;

/// CPU mirror of the `ubo` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Ubo {
    pub projection: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl Ubo {
    /// A camera looking at the origin with a rotated model.
    pub fn sample() -> Self {
        let projection = glam::Mat4::perspective_rh(60f32.to_radians(), 4.0 / 3.0, 0.1, 100.0);
        let model = glam::Mat4::from_rotation_y(0.5);
        let view = glam::Mat4::look_at_rh(
            glam::Vec3::new(0.0, 0.0, 5.0),
            glam::Vec3::ZERO,
            glam::Vec3::Y,
        );
        Self {
            projection: projection.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
        }
    }
}

/// Device plus the backend behind it, for flush counters.
pub struct TestContext {
    pub backend: Arc<DummyBackend>,
    pub device: Arc<GraphicsDevice>,
}

impl TestContext {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let backend = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::new(backend.clone());
        Self { backend, device }
    }

    /// Create a 2D sampled texture.
    pub fn create_texture(&self, width: u32, height: u32) -> Arc<Texture> {
        self.device
            .create_texture(
                &TextureDescriptor::new_2d(
                    width,
                    height,
                    TextureFormat::Rgba8Unorm,
                    TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
                )
                .with_label("checker"),
            )
            .expect("Failed to create texture")
    }

    /// Upload a single textured quad.
    pub fn create_quad(&self) -> MeshGeometry {
        MeshGeometry::from_vertices(
            &self.device,
            VertexLayout::position_color_uv(),
            &quad_vertices(),
            &[0, 1, 2, 2, 3, 0],
        )
        .expect("Failed to upload quad")
    }

    /// The textured material, registered but not resolved.
    pub fn create_textured_material(&self) -> Material {
        self.create_material_with_ubo(ubo_resource())
    }

    /// The textured material with `ubo` in place of the default block.
    pub fn create_material_with_ubo(&self, ubo: ShaderResource) -> Material {
        let mut material = Material::new()
            .with_label("textured")
            .with_color_attachment(
                ColorAttachmentDescriptor::new(TextureFormat::Bgra8Unorm)
                    .with_blend(BlendState::alpha_blending()),
            )
            .with_depth_stencil(
                TextureFormat::Depth32Float,
                DepthStencilState {
                    depth_write_enabled: true,
                    depth_compare: CompareFunction::LessEqual,
                },
            );
        material
            .register_shader_stage(
                ShaderTemplate::new(self.create_function(vertex_reflection(ubo)))
                    .with_input_attribute("inPos", VertexAttributeSemantic::Position)
                    .with_input_attribute("inColor", VertexAttributeSemantic::Color)
                    .with_input_attribute("inTexCoord", VertexAttributeSemantic::TexCoord),
            )
            .expect("Failed to register vertex stage");
        material
            .register_shader_stage(ShaderTemplate::new(
                self.create_function(fragment_reflection()),
            ))
            .expect("Failed to register fragment stage");
        material
    }

    /// Assign texture and sampler to `samplerColor`.
    pub fn assign_texture(&self, material: &mut Material) {
        let sampler = self
            .device
            .create_sampler(&SamplerDescriptor::linear().with_anisotropy(16))
            .expect("Failed to create sampler");
        material
            .set_texture_property("samplerColor", self.create_texture(64, 64))
            .expect("Failed to set texture");
        material
            .set_sampler_property("samplerColor", sampler)
            .expect("Failed to set sampler");
    }

    fn create_function(
        &self,
        reflection: ShaderReflection,
    ) -> Arc<material_graphics::ShaderFunction> {
        self.device
            .create_shader_module(&Arc::new(Shader::new(reflection)))
            .create_function("main")
            .expect("Failed to create function")
    }
}

/// The `ubo` resource as a reflector reports it.
pub fn ubo_resource() -> ShaderResource {
    ShaderResource::buffer("ubo", 0, 0, UBO_SIZE).with_struct(
        "UBO",
        vec![
            StructMember::new("projection", ShaderDataType::Float32M4x4, 0, 64),
            StructMember::new("model", ShaderDataType::Float32M4x4, 64, 64),
            StructMember::new("view", ShaderDataType::Float32M4x4, 128, 64),
        ],
    )
}

pub fn vertex_reflection(ubo: ShaderResource) -> ShaderReflection {
    ShaderReflection::new(ShaderStage::Vertex)
        .with_input(ShaderAttribute::new("inPos", 0, ShaderDataType::Float32x3))
        .with_input(ShaderAttribute::new("inColor", 1, ShaderDataType::Float32x3))
        .with_input(ShaderAttribute::new("inTexCoord", 2, ShaderDataType::Float32x2))
        .with_output(ShaderAttribute::new("outColor", 0, ShaderDataType::Float32x3))
        .with_output(ShaderAttribute::new("outTexCoord", 1, ShaderDataType::Float32x2))
        .with_resource(ubo)
}

pub fn fragment_reflection() -> ShaderReflection {
    ShaderReflection::new(ShaderStage::Fragment)
        .with_input(ShaderAttribute::new("inColor", 0, ShaderDataType::Float32x3))
        .with_input(ShaderAttribute::new("inTexCoord", 1, ShaderDataType::Float32x2))
        .with_output(ShaderAttribute::new("outFragColor", 0, ShaderDataType::Float32x4))
        .with_resource(ShaderResource::texture_sampler("samplerColor", 0, 1))
}

pub fn quad_vertices() -> Vec<Vertex> {
    vec![
        Vertex::new([-1.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0]),
        Vertex::new([1.0, -1.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0]),
        Vertex::new([1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
        Vertex::new([-1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [0.0, 1.0]),
    ]
}
