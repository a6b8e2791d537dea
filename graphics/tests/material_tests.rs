//! Material integration tests.
//!
//! These tests drive a [`Material`] through its whole lifecycle on the dummy
//! backend: name resolution, struct writes, flushing, binding and encoding.
//!
//! # Test Categories
//!
//! - **Lifecycle Tests**: State transitions and premature use
//! - **Property Tests**: Whole-struct and per-member writes reach the GPU
//! - **Encoding Tests**: Commands recorded for a draw
//! - **Report Tests**: Reflection reports of the resolved pipeline

mod common;

use rstest::rstest;

use common::{TestContext, Ubo, UBO_SIZE};
use material_graphics::shader::report;
use material_graphics::{
    Material, MaterialError, MaterialState, Mesh, PrimitiveTopology, RenderCommand,
    RenderCommandEncoder, ShaderDataType, ShaderResource, ShaderStage, StructElementProperty,
    StructMember, VertexLayout,
};

fn resolved(ctx: &TestContext) -> Material {
    resolved_with(ctx, common::ubo_resource())
}

fn resolved_with(ctx: &TestContext, ubo: ShaderResource) -> Material {
    let mut material = ctx.create_material_with_ubo(ubo);
    ctx.assign_texture(&mut material);
    material
        .init_resources(
            &ctx.device,
            &VertexLayout::position_color_uv(),
            PrimitiveTopology::TriangleList,
        )
        .expect("Failed to resolve material");
    material
}

fn gpu_ubo(ctx: &TestContext, material: &Material) -> Vec<u8> {
    let buffer = material.struct_buffer("ubo").expect("ubo buffer");
    ctx.device
        .read_buffer(buffer, 0, buffer.size())
        .expect("Failed to read ubo")
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[test]
fn test_full_lifecycle() {
    let ctx = TestContext::new();
    let mut material = ctx.create_textured_material();
    assert_eq!(material.state(), MaterialState::Configured);

    ctx.assign_texture(&mut material);
    material
        .init_resources(
            &ctx.device,
            &VertexLayout::position_color_uv(),
            PrimitiveTopology::TriangleList,
        )
        .unwrap();
    assert_eq!(material.state(), MaterialState::Resourced);

    let pipeline = material.pipeline().unwrap();
    assert_eq!(pipeline.descriptor().vertex_input.attributes.len(), 3);
    assert_eq!(material.binding_sets().len(), 1);
    assert_eq!(
        material.struct_buffer("ubo").unwrap().size(),
        u64::from(UBO_SIZE)
    );

    material.update_material_properties().unwrap();
    assert_eq!(material.state(), MaterialState::Bound);
    assert!(material.binding_sets()[0].is_complete());
}

#[rstest]
#[case::unknown_texture("samplerColour")]
#[case::unknown_struct("camera")]
fn test_unresolved_name_keeps_material_configured(#[case] name: &str) {
    let ctx = TestContext::new();
    let mut material = ctx.create_textured_material();
    ctx.assign_texture(&mut material);
    if name == "camera" {
        material.set_struct(name, &Ubo::sample()).unwrap();
    } else {
        material
            .set_texture_property(name, ctx.create_texture(4, 4))
            .unwrap();
    }

    let err = material
        .init_resources(
            &ctx.device,
            &VertexLayout::position_color_uv(),
            PrimitiveTopology::TriangleList,
        )
        .unwrap_err();

    assert_eq!(
        err,
        MaterialError::UnresolvedProperties {
            names: vec![name.to_string()],
        }
    );
    assert_eq!(material.state(), MaterialState::Configured);
    assert!(material.pipeline().is_none());
    assert_eq!(ctx.device.pipeline_count(), 0);
}

#[rstest]
#[case::disabled_whole(common::ubo_resource().with_enabled(false), "ubo")]
#[case::disabled_member(common::ubo_resource().with_enabled(false), "ubo.model")]
#[case::empty_whole(empty_ubo(), "ubo")]
#[case::empty_member(empty_ubo(), "ubo.model")]
fn test_write_to_unbacked_buffer_is_unresolved(#[case] ubo: ShaderResource, #[case] path: &str) {
    let ctx = TestContext::new();
    let mut material = ctx.create_material_with_ubo(ubo);
    ctx.assign_texture(&mut material);
    let sample = Ubo::sample();
    if path == "ubo" {
        material.set_struct(path, &sample).unwrap();
    } else {
        material.set_struct_element(path, &sample.model).unwrap();
    }

    let err = material
        .init_resources(
            &ctx.device,
            &VertexLayout::position_color_uv(),
            PrimitiveTopology::TriangleList,
        )
        .unwrap_err();

    assert_eq!(
        err,
        MaterialError::UnresolvedProperties {
            names: vec![path.to_string()],
        }
    );
    assert_eq!(material.state(), MaterialState::Configured);
    assert!(material.staged_bytes("ubo").is_none());
}

fn empty_ubo() -> ShaderResource {
    ShaderResource::buffer("ubo", 0, 0, 0).with_struct(
        "UBO",
        vec![StructMember::new("model", ShaderDataType::Float32M4x4, 0, 64)],
    )
}

#[test]
fn test_premature_use_is_invalid_state() {
    let ctx = TestContext::new();
    let geometry = ctx.create_quad();
    let mut material = Material::new();

    let err = material
        .init_resources(
            &ctx.device,
            &VertexLayout::position_color_uv(),
            PrimitiveTopology::TriangleList,
        )
        .unwrap_err();
    assert_eq!(
        err,
        MaterialError::InvalidState {
            operation: "initialize resources",
            state: "Uninitialized",
        }
    );

    let mut material = ctx.create_textured_material();
    assert!(matches!(
        material.update_material_properties(),
        Err(MaterialError::InvalidState { state: "Configured", .. })
    ));

    let mut encoder = RenderCommandEncoder::new();
    assert!(matches!(
        material.encode_render_command(&mut encoder, &geometry, 1, 0),
        Err(MaterialError::InvalidState { state: "Configured", .. })
    ));
    assert!(encoder.commands().is_empty());
}

#[test]
fn test_resolved_material_rejects_reinitialization() {
    let ctx = TestContext::new();
    let mut material = resolved(&ctx);
    let err = material
        .init_resources(
            &ctx.device,
            &VertexLayout::position_color_uv(),
            PrimitiveTopology::TriangleList,
        )
        .unwrap_err();
    assert_eq!(
        err,
        MaterialError::InvalidState {
            operation: "initialize resources",
            state: "Resourced",
        }
    );
    let vertex = material
        .shader_template(ShaderStage::Vertex)
        .unwrap()
        .clone();
    assert!(material.register_shader_stage(vertex).is_err());
}

// ============================================================================
// Property Tests
// ============================================================================

#[test]
fn test_whole_struct_and_members_produce_identical_bytes() {
    let ctx = TestContext::new();
    let ubo = Ubo::sample();

    let mut whole = resolved(&ctx);
    whole.set_struct("ubo", &ubo).unwrap();
    whole.update_material_properties().unwrap();

    let mut members = resolved(&ctx);
    members.set_struct_element("ubo.projection", &ubo.projection).unwrap();
    members.set_struct_element("ubo.model", &ubo.model).unwrap();
    members.set_struct_element("ubo.view", &ubo.view).unwrap();
    members.update_material_properties().unwrap();

    let whole_bytes = gpu_ubo(&ctx, &whole);
    assert_eq!(whole_bytes, bytemuck::bytes_of(&ubo));
    assert_eq!(whole_bytes, gpu_ubo(&ctx, &members));
}

/// Member writes covering a layout, with each member's absolute offset.
type MemberWrites = Vec<(&'static str, usize, StructElementProperty)>;

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

fn nested_layout() -> (ShaderResource, MemberWrites) {
    let resource = ShaderResource::buffer("ubo", 0, 0, 64)
        .with_struct(
            "Params",
            vec![
                StructMember::new("tint", ShaderDataType::Float32x4, 0, 16),
                StructMember::nested("light", "Light", 16, 32),
                StructMember::new("weights", ShaderDataType::Float32, 48, 4).with_array(4, 4),
            ],
        )
        .with_struct_type(
            "Light",
            vec![
                StructMember::new("direction", ShaderDataType::Float32x3, 0, 12),
                StructMember::new("intensity", ShaderDataType::Float32, 12, 4),
                StructMember::new("color", ShaderDataType::Float32x3, 16, 12),
            ],
        );
    let writes = vec![
        ("ubo.tint", 0, StructElementProperty::from_value(&[0.5f32, 0.25, 1.0, 1.0])),
        ("ubo.light.direction", 16, StructElementProperty::from_value(&[0.0f32, -1.0, 0.0])),
        ("ubo.light.intensity", 28, StructElementProperty::from_value(&3.5f32)),
        ("ubo.light.color", 32, StructElementProperty::from_value(&[1.0f32, 0.9, 0.8])),
        (
            "ubo.weights",
            48,
            StructElementProperty::new(ShaderDataType::Float32, f32_bytes(&[0.1, 0.2, 0.3, 0.4])),
        ),
    ];
    (resource, writes)
}

fn mixed_width_layout() -> (ShaderResource, MemberWrites) {
    let resource = ShaderResource::buffer("ubo", 0, 0, 48).with_struct(
        "Mixed",
        vec![
            StructMember::new("scale", ShaderDataType::Float32, 0, 4),
            StructMember::new("offset", ShaderDataType::Float32x2, 8, 8),
            StructMember::new("count", ShaderDataType::Int32, 16, 4),
            StructMember::new("color", ShaderDataType::Float32x3, 32, 12),
        ],
    );
    let writes = vec![
        ("ubo.scale", 0, StructElementProperty::from_value(&2.0f32)),
        ("ubo.offset", 8, StructElementProperty::from_value(&[-1.5f32, 4.0])),
        ("ubo.count", 16, StructElementProperty::from_value(&7i32)),
        ("ubo.color", 32, StructElementProperty::from_value(&[0.2f32, 0.4, 0.6])),
    ];
    (resource, writes)
}

fn strided_array_layout() -> (ShaderResource, MemberWrites) {
    let resource = ShaderResource::buffer("ubo", 0, 0, 64).with_struct(
        "Kernel",
        vec![
            StructMember::new("weights", ShaderDataType::Float32, 0, 4).with_array(4, 16),
            StructMember::new("bias", ShaderDataType::Float32, 60, 4),
        ],
    );
    let mut weights = vec![0.0f32; 13];
    for (i, weight) in [0.5f32, 0.25, 0.125, 0.0625].into_iter().enumerate() {
        weights[i * 4] = weight;
    }
    let writes = vec![
        (
            "ubo.weights",
            0,
            StructElementProperty::new(ShaderDataType::Float32, f32_bytes(&weights)),
        ),
        ("ubo.bias", 60, StructElementProperty::from_value(&-0.5f32)),
    ];
    (resource, writes)
}

#[rstest]
#[case::nested(nested_layout())]
#[case::mixed_widths(mixed_width_layout())]
#[case::strided_array(strided_array_layout())]
fn test_whole_and_member_writes_match_for_layout(#[case] layout: (ShaderResource, MemberWrites)) {
    let ctx = TestContext::new();
    let (resource, writes) = layout;
    let mut expected = vec![0u8; resource.buffer_size as usize];
    for (_, offset, property) in &writes {
        expected[*offset..*offset + property.bytes.len()].copy_from_slice(&property.bytes);
    }

    let mut whole = resolved_with(&ctx, resource.clone());
    whole.set_struct_property("ubo", &expected).unwrap();
    whole.update_material_properties().unwrap();

    let mut members = resolved_with(&ctx, resource);
    for (path, _, property) in writes {
        members.set_struct_element_property(path, property).unwrap();
    }
    members.update_material_properties().unwrap();

    let whole_bytes = gpu_ubo(&ctx, &whole);
    assert_eq!(whole_bytes, expected);
    assert_eq!(whole_bytes, gpu_ubo(&ctx, &members));
}

#[test]
fn test_defaults_before_resolution_are_applied() {
    let ctx = TestContext::new();
    let ubo = Ubo::sample();

    let mut material = ctx.create_textured_material();
    ctx.assign_texture(&mut material);
    material.set_struct("ubo", &ubo).unwrap();
    material
        .set_struct_element_property(
            "ubo.model",
            StructElementProperty::new(
                ShaderDataType::Float32M4x4,
                bytemuck::bytes_of(&glam::Mat4::IDENTITY.to_cols_array_2d()).to_vec(),
            ),
        )
        .unwrap();
    material
        .init_resources(
            &ctx.device,
            &VertexLayout::position_color_uv(),
            PrimitiveTopology::TriangleList,
        )
        .unwrap();
    material.update_material_properties().unwrap();

    let bytes = gpu_ubo(&ctx, &material);
    assert_eq!(&bytes[..64], bytemuck::bytes_of(&ubo.projection));
    assert_eq!(
        &bytes[64..128],
        bytemuck::bytes_of(&glam::Mat4::IDENTITY.to_cols_array_2d())
    );
    assert_eq!(&bytes[128..], bytemuck::bytes_of(&ubo.view));
}

#[test]
fn test_update_is_idempotent() {
    let ctx = TestContext::new();
    let mut material = resolved(&ctx);
    material.set_struct("ubo", &Ubo::sample()).unwrap();

    material.update_material_properties().unwrap();
    let flushes = ctx.backend.flush_count();
    let bytes = gpu_ubo(&ctx, &material);

    material.update_material_properties().unwrap();
    assert_eq!(ctx.backend.flush_count(), flushes);
    assert_eq!(gpu_ubo(&ctx, &material), bytes);
    assert_eq!(material.state(), MaterialState::Bound);

    material
        .set_struct_element("ubo.model", &glam::Mat4::IDENTITY.to_cols_array_2d())
        .unwrap();
    material.update_material_properties().unwrap();
    assert_eq!(ctx.backend.flush_count(), flushes + 1);
}

#[test]
fn test_writes_are_not_visible_before_update() {
    let ctx = TestContext::new();
    let mut material = resolved(&ctx);
    material.update_material_properties().unwrap();

    let ubo = Ubo::sample();
    material.set_struct("ubo", &ubo).unwrap();
    assert_eq!(material.staged_bytes("ubo").unwrap(), bytemuck::bytes_of(&ubo));
    assert_eq!(gpu_ubo(&ctx, &material), vec![0u8; UBO_SIZE as usize]);
}

#[rstest]
#[case::wrong_type(
    "ubo.model",
    StructElementProperty::from_value(&[1.0f32, 2.0, 3.0, 4.0]),
    MaterialError::DataTypeMismatch {
        name: "ubo.model".to_string(),
        expected: ShaderDataType::Float32M4x4,
        actual: ShaderDataType::Float32x4,
    }
)]
#[case::short_bytes(
    "ubo.view",
    StructElementProperty::new(ShaderDataType::Float32M4x4, vec![0u8; 16]),
    MaterialError::SizeMismatch {
        name: "ubo.view".to_string(),
        expected: 64,
        actual: 16,
    }
)]
#[case::unknown_member(
    "ubo.normal",
    StructElementProperty::from_value(&1.0f32),
    MaterialError::UnknownProperty("ubo.normal".to_string())
)]
fn test_element_write_errors(
    #[case] path: &str,
    #[case] property: StructElementProperty,
    #[case] expected: MaterialError,
) {
    let ctx = TestContext::new();
    let mut material = resolved(&ctx);
    assert_eq!(
        material.set_struct_element_property(path, property),
        Err(expected)
    );
}

// ============================================================================
// Encoding Tests
// ============================================================================

#[test]
fn test_encode_indexed_draw() {
    let ctx = TestContext::new();
    let geometry = ctx.create_quad();
    let mut material = resolved(&ctx);
    material.set_struct("ubo", &Ubo::sample()).unwrap();
    material.update_material_properties().unwrap();

    let mut encoder = RenderCommandEncoder::new().with_label("main pass");
    material
        .encode_render_command(&mut encoder, &geometry, 1, 0)
        .unwrap();
    encoder.end_encoding();

    let commands = encoder.commands();
    assert_eq!(commands.len(), 5);
    assert!(matches!(commands[0], RenderCommand::SetPipeline(_)));
    assert!(matches!(
        commands[1],
        RenderCommand::SetVertexBuffer { slot: 0, offset: 0, .. }
    ));
    assert!(matches!(
        commands[2],
        RenderCommand::SetBindingSet { index: 0, .. }
    ));
    assert!(matches!(commands[3], RenderCommand::SetIndexBuffer { .. }));
    assert!(matches!(
        commands[4],
        RenderCommand::DrawIndexed {
            index_count: 6,
            instance_count: 1,
            index_offset: 0,
            vertex_offset: 0,
            base_instance: 0,
        }
    ));
}

#[test]
fn test_mesh_forwards_to_material() {
    let ctx = TestContext::new();
    let mut material = ctx.create_textured_material();
    ctx.assign_texture(&mut material);
    let mut mesh = Mesh::new(ctx.create_quad(), material);

    mesh.init_resources(&ctx.device).unwrap();
    mesh.material_mut()
        .set_struct("ubo", &Ubo::sample())
        .unwrap();
    mesh.update_material_properties().unwrap();

    let mut encoder = RenderCommandEncoder::new();
    mesh.encode_render_command(&mut encoder, 2, 0).unwrap();
    assert!(matches!(
        encoder.commands().last(),
        Some(RenderCommand::DrawIndexed { instance_count: 2, .. })
    ));
}

#[test]
fn test_encoding_after_end_fails() {
    let ctx = TestContext::new();
    let geometry = ctx.create_quad();
    let mut material = resolved(&ctx);
    material.update_material_properties().unwrap();

    let mut encoder = RenderCommandEncoder::new();
    encoder.end_encoding();
    assert!(matches!(
        material.encode_render_command(&mut encoder, &geometry, 1, 0),
        Err(MaterialError::Graphics(_))
    ));
}

// ============================================================================
// Report Tests
// ============================================================================

#[test]
fn test_pipeline_report_merges_stages() {
    let ctx = TestContext::new();
    let material = resolved(&ctx);
    let lines = report::describe_pipeline(material.pipeline_reflection().unwrap());

    assert!(lines.contains(&"PipelineReflection.InputAttributes: 3".to_string()));
    assert!(lines.contains(&"PipelineReflection.Resources: 2".to_string()));
    assert!(lines.contains(&"ShaderResource: ubo (set=0, binding=0, stages=Vertex)".to_string()));
    assert!(lines.contains(
        &"ShaderResource: samplerColor (set=0, binding=1, stages=Fragment)".to_string()
    ));
    assert!(lines
        .iter()
        .any(|l| l.trim_start() == "+ model (Float32M4x4, Offset: 64)"));

    report::log_pipeline_reflection(material.pipeline_reflection().unwrap(), log::Level::Debug);
}
