//! Human-readable reflection reports.
//!
//! The `describe_*` functions render reflection data into report lines and
//! never fail: unknown resource types and access modes are printed as
//! `Unknown (ERROR)`, unknown data type codes as `Error`. The `log_*`
//! functions emit the same lines through the `log` facade at a
//! caller-chosen level.
//!
//! # Example output
//!
//! ```text
//! ShaderResource: ubo (set=0, binding=0, stages=Vertex)
//!  Type:Buffer, Access:ReadOnly, Enabled:1, Size:192
//!  Struct "UBO"
//!      + projection (Float32M4x4, Offset: 0)
//!      + model (Float32M4x4, Offset: 64)
//!      + view (Float32M4x4, Offset: 128)
//! ```

use super::{
    PipelineReflection, PushConstantLayout, Shader, ShaderAccess, ShaderAttribute,
    ShaderResource, ShaderResourceType, ShaderStageFlags, StructMember, StructTypeTable,
};

const FRAME: &str = "=========================================================";
const SEPARATOR: &str = "---------------------------------------------------------";
const INDENT: &str = "    ";

const STAGE_NAMES: [(ShaderStageFlags, &str); 6] = [
    (ShaderStageFlags::VERTEX, "Vertex"),
    (ShaderStageFlags::TESSELLATION_CONTROL, "TessCtrl"),
    (ShaderStageFlags::TESSELLATION_EVALUATION, "TessEval"),
    (ShaderStageFlags::GEOMETRY, "Geometry"),
    (ShaderStageFlags::FRAGMENT, "Fragment"),
    (ShaderStageFlags::COMPUTE, "Compute"),
];

/// Names of the stages in `stages`, in pipeline order, joined by `", "`.
///
/// Returns an empty string for an empty mask.
pub fn describe_stages(stages: ShaderStageFlags) -> String {
    STAGE_NAMES
        .iter()
        .filter(|(flag, _)| stages.contains(*flag))
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn resource_type_label(resource_type: ShaderResourceType) -> &'static str {
    match resource_type {
        ShaderResourceType::BUFFER => "Buffer",
        ShaderResourceType::TEXTURE => "Texture",
        ShaderResourceType::SAMPLER => "Sampler",
        ShaderResourceType::TEXTURE_SAMPLER => "SampledTexture",
        _ => "Unknown (ERROR)",
    }
}

fn access_label(access: ShaderAccess) -> &'static str {
    match access {
        ShaderAccess::READ_ONLY => "ReadOnly",
        ShaderAccess::WRITE_ONLY => "WriteOnly",
        ShaderAccess::READ_WRITE => "ReadWrite",
        _ => "Unknown (ERROR)",
    }
}

/// Describe a resource: header, type line, struct key and struct members.
pub fn describe_resource(resource: &ShaderResource) -> Vec<String> {
    let mut lines = Vec::new();
    let stages = describe_stages(resource.stages);

    if resource.count > 1 {
        lines.push(format!(
            "ShaderResource: {}[{}] (set={}, binding={}, stages={})",
            resource.name, resource.count, resource.set, resource.binding, stages
        ));
    } else {
        lines.push(format!(
            "ShaderResource: {} (set={}, binding={}, stages={})",
            resource.name, resource.set, resource.binding, stages
        ));
    }

    let mut type_line = format!(
        " Type:{}, Access:{}, Enabled:{}",
        resource_type_label(resource.resource_type),
        access_label(resource.access),
        u8::from(resource.enabled)
    );
    if resource.is_buffer() {
        type_line.push_str(&format!(", Size:{}", resource.buffer_size));
    }
    lines.push(type_line);

    if let Some(key) = resource.struct_key.as_deref().filter(|k| !k.is_empty()) {
        lines.push(format!(" Struct \"{key}\""));
    }

    if let (Some(key), Some(members)) = (resource.struct_key.as_deref(), resource.struct_members())
    {
        let mut chain = vec![key];
        describe_members(members, &resource.struct_types, 1, &mut chain, &mut lines);
    }
    lines
}

/// Describe one struct member at `indent` levels, recursing into its nested
/// struct (looked up in `table`) at `indent + 1`.
///
/// A struct key already being described on the current path is not entered
/// again, so a malformed cyclic table still terminates.
pub fn describe_struct_member(
    member: &StructMember,
    table: &StructTypeTable,
    indent: usize,
    out: &mut Vec<String>,
) {
    describe_member(member, table, indent, &mut Vec::new(), out);
}

fn describe_members<'a>(
    members: &'a [StructMember],
    table: &'a StructTypeTable,
    indent: usize,
    chain: &mut Vec<&'a str>,
    out: &mut Vec<String>,
) {
    for member in members {
        describe_member(member, table, indent, chain, out);
    }
}

fn describe_member<'a>(
    member: &'a StructMember,
    table: &'a StructTypeTable,
    indent: usize,
    chain: &mut Vec<&'a str>,
    out: &mut Vec<String>,
) {
    let pad = INDENT.repeat(indent);
    let type_name = member.data_type.name();

    if member.count > 1 {
        out.push(format!(
            " {pad}+ {}[{}] ({type_name}, Offset: {}, Stride: {})",
            member.name, member.count, member.offset, member.stride
        ));
    } else {
        out.push(format!(
            " {pad}+ {} ({type_name}, Offset: {})",
            member.name, member.offset
        ));
    }

    let Some(key) = member.struct_key.as_deref() else {
        return;
    };
    let Some(nested) = table.get(key) else {
        return;
    };
    out.push(format!(" {pad}  Struct \"{key}\""));
    if chain.contains(&key) {
        return;
    }
    chain.push(key);
    describe_members(nested, table, indent + 1, chain, out);
    chain.pop();
}

fn describe_attributes(direction: &str, attributes: &[ShaderAttribute], out: &mut Vec<String>) {
    for (index, attribute) in attributes.iter().enumerate() {
        out.push(format!(
            "  [{direction}] ShaderAttribute[{index}]: \"{}\" (location:{})",
            attribute.name, attribute.location
        ));
    }
}

fn describe_push_constants(layouts: &[PushConstantLayout], out: &mut Vec<String>) {
    let empty = StructTypeTable::new();
    for (index, layout) in layouts.iter().enumerate() {
        out.push(format!(
            " PushConstant:{index} \"{}\" (offset:{}, size:{}, stages:{})",
            layout.name,
            layout.offset,
            layout.size,
            describe_stages(layout.stages)
        ));
        describe_members(&layout.members, &empty, 1, &mut Vec::new(), out);
    }
}

/// Describe a shader: inputs, outputs, resources and push constants.
pub fn describe_shader(shader: &Shader) -> Vec<String> {
    let mut stage = describe_stages(shader.stage().flag());
    if stage.is_empty() {
        stage = "Unknown".to_string();
    }
    let heading = format!("Shader<{stage}.SPIR-V>");

    let mut lines = vec![FRAME.to_string()];
    lines.push(format!(
        "{heading}.InputAttributes: {}",
        shader.input_attributes().len()
    ));
    describe_attributes("in", shader.input_attributes(), &mut lines);
    lines.push(SEPARATOR.to_string());
    lines.push(format!(
        "{heading}.OutputAttributes: {}",
        shader.output_attributes().len()
    ));
    describe_attributes("out", shader.output_attributes(), &mut lines);
    lines.push(SEPARATOR.to_string());
    lines.push(format!("{heading}.Resources: {}", shader.resources().len()));
    for resource in shader.resources() {
        lines.extend(describe_resource(resource));
    }
    describe_push_constants(shader.push_constant_layouts(), &mut lines);
    lines.push(FRAME.to_string());
    lines
}

/// Describe a linked pipeline: inputs, resources and push constants.
pub fn describe_pipeline(reflection: &PipelineReflection) -> Vec<String> {
    let mut lines = vec![FRAME.to_string()];
    lines.push(format!(
        "PipelineReflection.InputAttributes: {}",
        reflection.input_attributes.len()
    ));
    describe_attributes("in", &reflection.input_attributes, &mut lines);
    lines.push(SEPARATOR.to_string());
    lines.push(format!(
        "PipelineReflection.Resources: {}",
        reflection.resources.len()
    ));
    for resource in &reflection.resources {
        lines.extend(describe_resource(resource));
    }
    describe_push_constants(&reflection.push_constant_layouts, &mut lines);
    lines.push(FRAME.to_string());
    lines
}

fn emit(level: log::Level, lines: Vec<String>) {
    if !log::log_enabled!(level) {
        return;
    }
    for line in lines {
        log::log!(level, "{line}");
    }
}

/// Log [`describe_resource`] at `level`.
pub fn log_resource(resource: &ShaderResource, level: log::Level) {
    emit(level, describe_resource(resource));
}

/// Log [`describe_shader`] at `level`.
pub fn log_shader_reflection(shader: &Shader, level: log::Level) {
    emit(level, describe_shader(shader));
}

/// Log [`describe_pipeline`] at `level`.
pub fn log_pipeline_reflection(reflection: &PipelineReflection, level: log::Level) {
    emit(level, describe_pipeline(reflection));
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::shader::{ShaderDataType, ShaderReflection, ShaderStage};

    fn camera_ubo() -> ShaderResource {
        ShaderResource::buffer("ubo", 0, 0, 128)
            .with_stages(ShaderStageFlags::VERTEX)
            .with_struct(
                "UBO",
                vec![
                    StructMember::new("model", ShaderDataType::Float32M4x4, 0, 64),
                    StructMember::new("view", ShaderDataType::Float32M4x4, 64, 64),
                ],
            )
    }

    #[rstest]
    #[case::empty(ShaderStageFlags::empty(), "")]
    #[case::single(ShaderStageFlags::FRAGMENT, "Fragment")]
    #[case::vertex_fragment(
        ShaderStageFlags::FRAGMENT | ShaderStageFlags::VERTEX,
        "Vertex, Fragment"
    )]
    #[case::all(
        ShaderStageFlags::all(),
        "Vertex, TessCtrl, TessEval, Geometry, Fragment, Compute"
    )]
    #[case::tessellation(
        ShaderStageFlags::TESSELLATION_EVALUATION | ShaderStageFlags::TESSELLATION_CONTROL,
        "TessCtrl, TessEval"
    )]
    fn test_describe_stages(#[case] stages: ShaderStageFlags, #[case] expected: &str) {
        assert_eq!(describe_stages(stages), expected);
    }

    #[test]
    fn test_describe_ubo() {
        let lines = describe_resource(&camera_ubo());
        assert_eq!(
            lines,
            [
                "ShaderResource: ubo (set=0, binding=0, stages=Vertex)",
                " Type:Buffer, Access:ReadOnly, Enabled:1, Size:128",
                " Struct \"UBO\"",
                "     + model (Float32M4x4, Offset: 0)",
                "     + view (Float32M4x4, Offset: 64)",
            ]
        );
    }

    #[rstest]
    #[case::single(1, "ShaderResource: textures (set=1, binding=2, stages=Fragment)")]
    #[case::array(4, "ShaderResource: textures[4] (set=1, binding=2, stages=Fragment)")]
    fn test_count_suffix(#[case] count: u32, #[case] header: &str) {
        let resource = ShaderResource::texture("textures", 1, 2)
            .with_stages(ShaderStageFlags::FRAGMENT)
            .with_count(count);
        let lines = describe_resource(&resource);
        assert_eq!(lines[0], header);
        assert_eq!(lines[1], " Type:Texture, Access:ReadOnly, Enabled:1");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_unknown_codes_are_placeholders() {
        let mut resource = ShaderResource::sampler("weird", 0, 0)
            .with_access(ShaderAccess(9))
            .with_enabled(false);
        resource.resource_type = ShaderResourceType(42);

        let lines = describe_resource(&resource);
        assert_eq!(
            lines[1],
            " Type:Unknown (ERROR), Access:Unknown (ERROR), Enabled:0"
        );
    }

    #[test]
    fn test_combined_sampler_label() {
        let lines = describe_resource(&ShaderResource::texture_sampler("samplerColor", 0, 1));
        assert!(lines[1].starts_with(" Type:SampledTexture,"));
    }

    #[test]
    fn test_array_member_shows_stride() {
        let mut out = Vec::new();
        let member =
            StructMember::new("lights", ShaderDataType::Float32x4, 16, 16).with_array(8, 16);
        describe_struct_member(&member, &StructTypeTable::new(), 2, &mut out);
        assert_eq!(
            out,
            ["         + lights[8] (Float32x4, Offset: 16, Stride: 16)"]
        );
    }

    fn nested_resource(depth: usize) -> ShaderResource {
        let mut resource = ShaderResource::buffer("deep", 0, 0, 16);
        for level in 0..depth {
            let key = format!("Level{level}");
            let members = if level + 1 < depth {
                vec![StructMember::nested(
                    format!("child{level}"),
                    format!("Level{}", level + 1),
                    0,
                    16,
                )]
            } else {
                vec![StructMember::new("leaf", ShaderDataType::Float32x4, 0, 16)]
            };
            resource = if level == 0 {
                resource.with_struct(key, members)
            } else {
                resource.with_struct_type(key, members)
            };
        }
        resource
    }

    #[test]
    fn test_nesting_depth_matches_indentation() {
        let lines = describe_resource(&nested_resource(5));
        let mut depths: Vec<usize> = lines
            .iter()
            .filter_map(|line| {
                let trimmed = line.trim_start();
                trimmed
                    .starts_with('+')
                    .then(|| (line.len() - trimmed.len() - 1) / INDENT.len())
            })
            .collect();
        assert_eq!(depths, [1, 2, 3, 4, 5]);
        depths.dedup();
        assert_eq!(depths.len(), 5);
        assert!(lines.contains(&"               Struct \"Level3\"".to_string()));
    }

    #[test]
    fn test_cyclic_table_terminates() {
        let resource = ShaderResource::buffer("node", 0, 0, 16)
            .with_struct("Node", vec![StructMember::nested("next", "Node", 0, 16)]);
        let lines = describe_resource(&resource);
        assert_eq!(
            lines[3..],
            ["     + next (Struct, Offset: 0)", "       Struct \"Node\""]
        );
    }

    #[test]
    fn test_describe_shader_sections() {
        let shader = Shader::new(
            ShaderReflection::new(ShaderStage::Vertex)
                .with_input(ShaderAttribute::new("inPos", 0, ShaderDataType::Float32x3))
                .with_input(ShaderAttribute::new("inColor", 1, ShaderDataType::Float32x3))
                .with_output(ShaderAttribute::new("outColor", 0, ShaderDataType::Float32x3))
                .with_resource(camera_ubo())
                .with_push_constant(
                    PushConstantLayout::new("pc", 0, 4, ShaderStageFlags::empty()).with_members(
                        vec![StructMember::new("time", ShaderDataType::Float32, 0, 4)],
                    ),
                ),
        );
        let lines = describe_shader(&shader);

        assert_eq!(lines.first().map(String::as_str), Some(FRAME));
        assert_eq!(lines.last().map(String::as_str), Some(FRAME));
        assert_eq!(lines[1], "Shader<Vertex.SPIR-V>.InputAttributes: 2");
        assert_eq!(lines[2], "  [in] ShaderAttribute[0]: \"inPos\" (location:0)");
        assert_eq!(lines[3], "  [in] ShaderAttribute[1]: \"inColor\" (location:1)");
        assert_eq!(lines[4], SEPARATOR);
        assert_eq!(lines[5], "Shader<Vertex.SPIR-V>.OutputAttributes: 1");
        assert_eq!(lines[6], "  [out] ShaderAttribute[0]: \"outColor\" (location:0)");
        assert_eq!(lines[7], SEPARATOR);
        assert_eq!(lines[8], "Shader<Vertex.SPIR-V>.Resources: 1");
        assert!(lines.contains(
            &" PushConstant:0 \"pc\" (offset:0, size:4, stages:Vertex)".to_string()
        ));
        assert!(lines.contains(&"     + time (Float32, Offset: 0)".to_string()));
    }

    #[test]
    fn test_describe_pipeline_has_no_outputs() {
        let vertex = ShaderReflection::new(ShaderStage::Vertex)
            .with_input(ShaderAttribute::new("inPos", 0, ShaderDataType::Float32x3))
            .with_output(ShaderAttribute::new("outUV", 0, ShaderDataType::Float32x2))
            .with_resource(camera_ubo());
        let pipeline = PipelineReflection::merge([&vertex]);
        let lines = describe_pipeline(&pipeline);

        assert_eq!(lines[1], "PipelineReflection.InputAttributes: 1");
        assert_eq!(lines[3], SEPARATOR);
        assert_eq!(lines[4], "PipelineReflection.Resources: 1");
        assert!(!lines.iter().any(|l| l.contains("OutputAttributes")));
        assert_eq!(lines.iter().filter(|l| *l == FRAME).count(), 2);
    }
}
