//! Demo scene: a textured cube drawn with a name-bound material.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use material_graphics::mesh::VertexDeduplicator;
use material_graphics::shader::report;
use material_graphics::{
    BlendState, ColorAttachmentDescriptor, CompareFunction, DepthStencilState, DummyBackend,
    GraphicsDevice, Material, MaterialError, Mesh, MeshGeometry, SamplerDescriptor, Shader,
    ShaderAttribute, ShaderDataType, ShaderFunction, ShaderReflection, ShaderResource,
    ShaderStage, ShaderTemplate, StructMember, TextureDescriptor, TextureFormat, TextureUsage,
    Vertex, VertexAttributeSemantic, VertexLayout,
};

/// Layout of the `ubo` uniform block.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    pub projection: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl Uniforms {
    /// Camera at `(0, 5, 10)` looking at the origin, cube spun by `time` radians.
    pub fn at_time(time: f32, aspect: f32) -> Self {
        let base = Mat4::from_scale(Vec3::splat(5.0))
            * Mat4::from_axis_angle(Vec3::NEG_X, std::f32::consts::FRAC_PI_2);
        let model = base * Mat4::from_quat(Quat::from_axis_angle(Vec3::Y, time));
        let view = Mat4::look_at_rh(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(90f32.to_radians(), aspect, 1.0, 1000.0);
        Self {
            projection: projection.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
        }
    }
}

/// How the demo writes the uniform block each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UniformUpdate {
    /// One write of the whole `ubo` struct.
    #[default]
    WholeStruct,
    /// Separate writes to `ubo.projection`, `ubo.model` and `ubo.view`.
    PerMember,
}

/// Scene configuration.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub width: u32,
    pub height: u32,
    pub uniform_update: UniformUpdate,
    pub report_level: log::Level,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            uniform_update: UniformUpdate::default(),
            report_level: log::Level::Debug,
        }
    }
}

/// Everything the render worker owns.
pub struct Scene {
    pub config: SceneConfig,
    pub backend: Arc<DummyBackend>,
    pub device: Arc<GraphicsDevice>,
    pub mesh: Mesh,
}

impl Scene {
    /// Build the cube, its material and resolve the material.
    pub fn new(config: SceneConfig) -> Result<Self, MaterialError> {
        let backend = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::new(backend.clone());

        let (vertices, indices) = cube_vertices();
        log::info!(
            "Cube: {} unique vertices, {} indices",
            vertices.len(),
            indices.len()
        );
        let geometry = MeshGeometry::from_vertices(
            &device,
            VertexLayout::position_color_uv(),
            &vertices,
            &indices,
        )?
        .with_label("cube");

        let vertex = create_function(&device, vertex_reflection())?;
        let fragment = create_function(&device, fragment_reflection())?;
        log::debug!(
            "VertexFunction.VertexAttributes: {}",
            vertex.stage_input_attributes().len()
        );
        for attribute in vertex.stage_input_attributes() {
            log::debug!(
                "  --> VertexAttribute: \"{}\" (location:{})",
                attribute.name,
                attribute.location
            );
        }
        report::log_shader_reflection(vertex.shader(), config.report_level);
        report::log_shader_reflection(fragment.shader(), config.report_level);

        let mut material = Material::new()
            .with_label("cube")
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
        material.register_shader_stage(
            ShaderTemplate::new(vertex)
                .with_input_attribute("inPos", VertexAttributeSemantic::Position)
                .with_input_attribute("inColor", VertexAttributeSemantic::Color)
                .with_input_attribute("inTexCoord", VertexAttributeSemantic::TexCoord),
        )?;
        material.register_shader_stage(ShaderTemplate::new(fragment))?;

        let texture = device.create_texture(
            &TextureDescriptor::new_2d(
                256,
                256,
                TextureFormat::Rgba8Unorm,
                TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
            )
            .with_label("checker"),
        )?;
        let sampler = device.create_sampler(
            &SamplerDescriptor::linear()
                .with_anisotropy(16)
                .with_label("linear clamp"),
        )?;
        material.set_texture_property("samplerColor", texture)?;
        material.set_sampler_property("samplerColor", sampler)?;

        let mut mesh = Mesh::new(geometry, material);
        mesh.init_resources(&device)?;
        if let Some(reflection) = mesh.material().pipeline_reflection() {
            report::log_pipeline_reflection(reflection, config.report_level);
        }

        Ok(Self {
            config,
            backend,
            device,
            mesh,
        })
    }

    /// Aspect ratio of the render target.
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }
}

fn create_function(
    device: &Arc<GraphicsDevice>,
    reflection: ShaderReflection,
) -> Result<Arc<ShaderFunction>, MaterialError> {
    let module = device.create_shader_module(&Arc::new(Shader::new(reflection)));
    Ok(module.create_function("main")?)
}

fn vertex_reflection() -> ShaderReflection {
    ShaderReflection::new(ShaderStage::Vertex)
        .with_input(ShaderAttribute::new("inPos", 0, ShaderDataType::Float32x3))
        .with_input(ShaderAttribute::new("inColor", 1, ShaderDataType::Float32x3))
        .with_input(ShaderAttribute::new("inTexCoord", 2, ShaderDataType::Float32x2))
        .with_output(ShaderAttribute::new("outColor", 0, ShaderDataType::Float32x3))
        .with_output(ShaderAttribute::new("outTexCoord", 1, ShaderDataType::Float32x2))
        .with_resource(
            ShaderResource::buffer("ubo", 0, 0, 192).with_struct(
                "UBO",
                vec![
                    StructMember::new("projection", ShaderDataType::Float32M4x4, 0, 64),
                    StructMember::new("model", ShaderDataType::Float32M4x4, 64, 64),
                    StructMember::new("view", ShaderDataType::Float32M4x4, 128, 64),
                ],
            ),
        )
}

fn fragment_reflection() -> ShaderReflection {
    ShaderReflection::new(ShaderStage::Fragment)
        .with_input(ShaderAttribute::new("inColor", 0, ShaderDataType::Float32x3))
        .with_input(ShaderAttribute::new("inTexCoord", 1, ShaderDataType::Float32x2))
        .with_output(ShaderAttribute::new("outFragColor", 0, ShaderDataType::Float32x4))
        .with_resource(ShaderResource::texture_sampler("samplerColor", 0, 1))
}

/// Unit cube with a color and texture coordinates per face, de-duplicated.
pub fn cube_vertices() -> (Vec<Vertex>, Vec<u32>) {
    // (normal axis, sign, color)
    let faces: [(usize, f32, [f32; 3]); 6] = [
        (0, 1.0, [1.0, 0.0, 0.0]),
        (0, -1.0, [0.0, 1.0, 1.0]),
        (1, 1.0, [0.0, 1.0, 0.0]),
        (1, -1.0, [1.0, 0.0, 1.0]),
        (2, 1.0, [0.0, 0.0, 1.0]),
        (2, -1.0, [1.0, 1.0, 0.0]),
    ];
    let corners = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    let mut dedup = VertexDeduplicator::new();
    for (axis, sign, color) in faces {
        let u_axis = (axis + 1) % 3;
        let v_axis = (axis + 2) % 3;
        let quad = corners.map(|uv: [f32; 2]| {
            let mut position = [0.0; 3];
            position[axis] = 0.5 * sign;
            position[u_axis] = uv[0] - 0.5;
            position[v_axis] = uv[1] - 0.5;
            Vertex::new(position, color, uv)
        });
        dedup.extend([quad[0], quad[1], quad[2], quad[2], quad[3], quad[0]]);
    }
    dedup.finish()
}
