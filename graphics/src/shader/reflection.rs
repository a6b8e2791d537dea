//! Reflection model for shaders and pipelines.
//!
//! The types here describe what a compiled shader exposes: its stage
//! input/output attributes, its bindable resources and the byte layout of the
//! structs those resources hold. They are produced once by a shader reflector
//! (outside this crate) and are read-only afterwards.
//!
//! Struct nesting is expressed through an explicit lookup table
//! ([`StructTypeTable`]) mapping a struct type key to its member list. A member
//! whose data type is [`ShaderDataType::Struct`] names the nested struct
//! through [`StructMember::struct_key`].

use std::collections::HashMap;

use super::data_type::ShaderDataType;
use super::{ShaderStage, ShaderStageFlags};

/// Member lists of named struct types, keyed by struct type key.
pub type StructTypeTable = HashMap<String, Vec<StructMember>>;

/// A stage input or output interface slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderAttribute {
    /// Variable name in the shader.
    pub name: String,
    /// Interface location.
    pub location: u32,
    /// Value type of the slot.
    pub data_type: ShaderDataType,
}

impl ShaderAttribute {
    /// Create a new attribute.
    pub fn new(name: impl Into<String>, location: u32, data_type: ShaderDataType) -> Self {
        Self {
            name: name.into(),
            location,
            data_type,
        }
    }
}

/// Kind of a bindable shader resource.
///
/// Stored as a raw code with named constants so that codes introduced by a
/// newer reflector are preserved and can be reported instead of rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ShaderResourceType(pub u32);

impl ShaderResourceType {
    /// Uniform or storage buffer.
    pub const BUFFER: Self = Self(0);
    /// Sampled or storage texture.
    pub const TEXTURE: Self = Self(1);
    /// Standalone sampler.
    pub const SAMPLER: Self = Self(2);
    /// Combined texture and sampler.
    pub const TEXTURE_SAMPLER: Self = Self(3);

    /// Whether the code is one of the known constants.
    pub fn is_known(self) -> bool {
        self.0 <= Self::TEXTURE_SAMPLER.0
    }

    /// Whether a texture can be bound to this resource.
    pub fn accepts_texture(self) -> bool {
        self == Self::TEXTURE || self == Self::TEXTURE_SAMPLER
    }

    /// Whether a sampler can be bound to this resource.
    pub fn accepts_sampler(self) -> bool {
        self == Self::SAMPLER || self == Self::TEXTURE_SAMPLER
    }
}

/// Access mode of a shader resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ShaderAccess(pub u32);

impl ShaderAccess {
    /// The shader only reads the resource.
    pub const READ_ONLY: Self = Self(0);
    /// The shader only writes the resource.
    pub const WRITE_ONLY: Self = Self(1);
    /// The shader reads and writes the resource.
    pub const READ_WRITE: Self = Self(2);

    /// Whether the code is one of the known constants.
    pub fn is_known(self) -> bool {
        self.0 <= Self::READ_WRITE.0
    }
}

/// One member of a reflected struct type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructMember {
    /// Member name.
    pub name: String,
    /// Member value type; [`ShaderDataType::Struct`] for nested structs.
    pub data_type: ShaderDataType,
    /// Byte offset within the enclosing struct.
    pub offset: u32,
    /// Byte size of the member, or of one element when it is an array.
    pub size: u32,
    /// Byte stride between array elements.
    pub stride: u32,
    /// Array element count (1 for non-arrays).
    pub count: u32,
    /// Key of the nested struct type in the [`StructTypeTable`].
    pub struct_key: Option<String>,
}

impl StructMember {
    /// Create a non-array member.
    pub fn new(name: impl Into<String>, data_type: ShaderDataType, offset: u32, size: u32) -> Self {
        Self {
            name: name.into(),
            data_type,
            offset,
            size,
            stride: size,
            count: 1,
            struct_key: None,
        }
    }

    /// Create a member holding a nested struct.
    pub fn nested(
        name: impl Into<String>,
        struct_key: impl Into<String>,
        offset: u32,
        size: u32,
    ) -> Self {
        Self {
            struct_key: Some(struct_key.into()),
            ..Self::new(name, ShaderDataType::Struct, offset, size)
        }
    }

    /// Turn this member into an array of `count` elements `stride` bytes apart.
    pub fn with_array(mut self, count: u32, stride: u32) -> Self {
        self.count = count;
        self.stride = stride;
        self
    }

    /// Whether the member is an array.
    pub fn is_array(&self) -> bool {
        self.count > 1
    }

    /// Bytes covered by the member, from its offset to the end of its last element.
    pub fn span(&self) -> u32 {
        if self.count > 1 {
            self.stride * (self.count - 1) + self.size
        } else {
            self.size
        }
    }
}

/// Location of a struct member resolved from a dotted path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMember {
    /// Absolute byte offset from the start of the buffer.
    pub offset: u32,
    /// Bytes covered by the member.
    pub span: u32,
    /// Member value type.
    pub data_type: ShaderDataType,
}

/// A bindable shader resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderResource {
    /// Resource name in the shader.
    pub name: String,
    /// Descriptor set index.
    pub set: u32,
    /// Binding index within the set.
    pub binding: u32,
    /// Array size (1 for non-arrays).
    pub count: u32,
    /// Stages that access the resource.
    pub stages: ShaderStageFlags,
    /// Resource kind.
    pub resource_type: ShaderResourceType,
    /// Access mode.
    pub access: ShaderAccess,
    /// Whether the resource is statically used.
    pub enabled: bool,
    /// Key of the struct held by a buffer resource.
    pub struct_key: Option<String>,
    /// Byte size of a buffer resource.
    pub buffer_size: u32,
    /// Struct types reachable from this resource.
    pub struct_types: StructTypeTable,
}

impl ShaderResource {
    fn new(
        name: impl Into<String>,
        set: u32,
        binding: u32,
        resource_type: ShaderResourceType,
    ) -> Self {
        Self {
            name: name.into(),
            set,
            binding,
            count: 1,
            stages: ShaderStageFlags::empty(),
            resource_type,
            access: ShaderAccess::READ_ONLY,
            enabled: true,
            struct_key: None,
            buffer_size: 0,
            struct_types: StructTypeTable::new(),
        }
    }

    /// Create a buffer resource of `size` bytes.
    pub fn buffer(name: impl Into<String>, set: u32, binding: u32, size: u32) -> Self {
        Self {
            buffer_size: size,
            ..Self::new(name, set, binding, ShaderResourceType::BUFFER)
        }
    }

    /// Create a texture resource.
    pub fn texture(name: impl Into<String>, set: u32, binding: u32) -> Self {
        Self::new(name, set, binding, ShaderResourceType::TEXTURE)
    }

    /// Create a sampler resource.
    pub fn sampler(name: impl Into<String>, set: u32, binding: u32) -> Self {
        Self::new(name, set, binding, ShaderResourceType::SAMPLER)
    }

    /// Create a combined texture and sampler resource.
    pub fn texture_sampler(name: impl Into<String>, set: u32, binding: u32) -> Self {
        Self::new(name, set, binding, ShaderResourceType::TEXTURE_SAMPLER)
    }

    /// Set the stages accessing the resource.
    pub fn with_stages(mut self, stages: ShaderStageFlags) -> Self {
        self.stages = stages;
        self
    }

    /// Set the array size.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Set the access mode.
    pub fn with_access(mut self, access: ShaderAccess) -> Self {
        self.access = access;
        self
    }

    /// Set whether the resource is statically used.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the struct held by the buffer and register its member list.
    pub fn with_struct(mut self, key: impl Into<String>, members: Vec<StructMember>) -> Self {
        let key = key.into();
        self.struct_types.insert(key.clone(), members);
        self.struct_key = Some(key);
        self
    }

    /// Register a struct type reachable from the buffer's struct.
    pub fn with_struct_type(mut self, key: impl Into<String>, members: Vec<StructMember>) -> Self {
        self.struct_types.insert(key.into(), members);
        self
    }

    /// Whether the resource is an array.
    pub fn is_array(&self) -> bool {
        self.count > 1
    }

    /// Whether this is a buffer resource.
    pub fn is_buffer(&self) -> bool {
        self.resource_type == ShaderResourceType::BUFFER
    }

    /// Member list of the buffer's top-level struct, if any.
    pub fn struct_members(&self) -> Option<&[StructMember]> {
        if !self.is_buffer() {
            return None;
        }
        self.struct_key
            .as_ref()
            .and_then(|key| self.struct_types.get(key))
            .map(Vec::as_slice)
    }

    /// Resolve a dotted member path (`"light.color"`) relative to the buffer's struct.
    ///
    /// Returns `None` if any path component does not name a member, or if an
    /// intermediate component is not a nested struct.
    pub fn resolve_member(&self, path: &str) -> Option<ResolvedMember> {
        let mut members = self.struct_members()?;
        let mut base = 0;
        let mut components = path.split('.').peekable();

        while let Some(component) = components.next() {
            let member = members.iter().find(|m| m.name == component)?;
            let offset = base + member.offset;
            if components.peek().is_none() {
                return Some(ResolvedMember {
                    offset,
                    span: member.span(),
                    data_type: member.data_type,
                });
            }
            members = member
                .struct_key
                .as_ref()
                .and_then(|key| self.struct_types.get(key))
                .map(Vec::as_slice)?;
            base = offset;
        }
        None
    }

    /// Whether the struct table contains a cycle reachable from the buffer's struct.
    pub fn has_cyclic_struct(&self) -> bool {
        fn visit<'a>(table: &'a StructTypeTable, key: &'a str, chain: &mut Vec<&'a str>) -> bool {
            if chain.contains(&key) {
                return true;
            }
            let Some(members) = table.get(key) else {
                return false;
            };
            chain.push(key);
            let cyclic = members
                .iter()
                .filter_map(|m| m.struct_key.as_deref())
                .any(|nested| visit(table, nested, chain));
            chain.pop();
            cyclic
        }

        self.struct_key
            .as_deref()
            .is_some_and(|key| visit(&self.struct_types, key, &mut Vec::new()))
    }
}

/// Layout of a push-constant range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConstantLayout {
    /// Block name.
    pub name: String,
    /// Byte offset of the range.
    pub offset: u32,
    /// Byte size of the range.
    pub size: u32,
    /// Stages reading the range.
    pub stages: ShaderStageFlags,
    /// Members of the block.
    pub members: Vec<StructMember>,
}

impl PushConstantLayout {
    /// Create a new push-constant layout.
    pub fn new(name: impl Into<String>, offset: u32, size: u32, stages: ShaderStageFlags) -> Self {
        Self {
            name: name.into(),
            offset,
            size,
            stages,
            members: Vec::new(),
        }
    }

    /// Set the block members.
    pub fn with_members(mut self, members: Vec<StructMember>) -> Self {
        self.members = members;
        self
    }
}

/// Reflection of a single shader stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderReflection {
    /// Stage the shader runs in.
    pub stage: ShaderStage,
    /// Stage inputs.
    pub input_attributes: Vec<ShaderAttribute>,
    /// Stage outputs.
    pub output_attributes: Vec<ShaderAttribute>,
    /// Bindable resources.
    pub resources: Vec<ShaderResource>,
    /// Push-constant ranges.
    pub push_constant_layouts: Vec<PushConstantLayout>,
}

impl ShaderReflection {
    /// Create an empty reflection for `stage`.
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            input_attributes: Vec::new(),
            output_attributes: Vec::new(),
            resources: Vec::new(),
            push_constant_layouts: Vec::new(),
        }
    }

    /// Add a stage input.
    pub fn with_input(mut self, attribute: ShaderAttribute) -> Self {
        self.input_attributes.push(attribute);
        self
    }

    /// Add a stage output.
    pub fn with_output(mut self, attribute: ShaderAttribute) -> Self {
        self.output_attributes.push(attribute);
        self
    }

    /// Add a resource. Its stage mask defaults to this shader's stage when empty.
    pub fn with_resource(mut self, mut resource: ShaderResource) -> Self {
        if resource.stages.is_empty() {
            resource.stages = self.stage.flag();
        }
        self.resources.push(resource);
        self
    }

    /// Add a push-constant range. Its stage mask defaults to this shader's stage when empty.
    pub fn with_push_constant(mut self, mut layout: PushConstantLayout) -> Self {
        if layout.stages.is_empty() {
            layout.stages = self.stage.flag();
        }
        self.push_constant_layouts.push(layout);
        self
    }
}

/// Reflection of a linked pipeline: the union of its stages' reflections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReflection {
    /// Inputs of the first stage (vertex or compute).
    pub input_attributes: Vec<ShaderAttribute>,
    /// Resources of all stages, merged by set and binding.
    pub resources: Vec<ShaderResource>,
    /// Push-constant ranges of all stages, merged by name, offset and size.
    pub push_constant_layouts: Vec<PushConstantLayout>,
}

impl PipelineReflection {
    /// Merge stage reflections into a pipeline reflection.
    ///
    /// Input attributes come from the vertex stage, or the compute stage for a
    /// compute pipeline. Resources sharing a set and binding are merged and
    /// their stage masks combined; the same applies to push-constant ranges
    /// with equal name, offset and size. Resources are ordered by set, then
    /// binding.
    pub fn merge<'a>(stages: impl IntoIterator<Item = &'a ShaderReflection>) -> Self {
        let mut reflection = Self::default();

        for stage in stages {
            if matches!(stage.stage, ShaderStage::Vertex | ShaderStage::Compute) {
                reflection.input_attributes = stage.input_attributes.clone();
            }

            for resource in &stage.resources {
                match reflection
                    .resources
                    .iter_mut()
                    .find(|r| r.set == resource.set && r.binding == resource.binding)
                {
                    Some(existing) => {
                        existing.stages |= resource.stages;
                        existing.enabled |= resource.enabled;
                    }
                    None => reflection.resources.push(resource.clone()),
                }
            }

            for layout in &stage.push_constant_layouts {
                match reflection.push_constant_layouts.iter_mut().find(|l| {
                    l.name == layout.name && l.offset == layout.offset && l.size == layout.size
                }) {
                    Some(existing) => existing.stages |= layout.stages,
                    None => reflection.push_constant_layouts.push(layout.clone()),
                }
            }
        }

        reflection.resources.sort_by_key(|r| (r.set, r.binding));
        reflection
    }

    /// Find a resource by name.
    pub fn resource(&self, name: &str) -> Option<&ShaderResource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Find an input attribute by name.
    pub fn input_attribute(&self, name: &str) -> Option<&ShaderAttribute> {
        self.input_attributes.iter().find(|a| a.name == name)
    }

    /// Descriptor set indices used by the pipeline, ascending.
    pub fn set_indices(&self) -> Vec<u32> {
        let mut sets: Vec<u32> = self.resources.iter().map(|r| r.set).collect();
        sets.sort_unstable();
        sets.dedup();
        sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_ubo() -> ShaderResource {
        ShaderResource::buffer("ubo", 0, 0, 96)
            .with_struct(
                "UBO",
                vec![
                    StructMember::new("model", ShaderDataType::Float32M4x4, 0, 64),
                    StructMember::nested("light", "Light", 64, 32),
                ],
            )
            .with_struct_type(
                "Light",
                vec![
                    StructMember::new("color", ShaderDataType::Float32x4, 0, 16),
                    StructMember::new("direction", ShaderDataType::Float32x3, 16, 12),
                    StructMember::new("intensity", ShaderDataType::Float32, 28, 4),
                ],
            )
    }

    #[test]
    fn test_resolve_top_level_member() {
        let ubo = light_ubo();
        let member = ubo.resolve_member("model").unwrap();
        assert_eq!(member.offset, 0);
        assert_eq!(member.span, 64);
        assert_eq!(member.data_type, ShaderDataType::Float32M4x4);
    }

    #[test]
    fn test_resolve_nested_member() {
        let ubo = light_ubo();
        let member = ubo.resolve_member("light.intensity").unwrap();
        assert_eq!(member.offset, 64 + 28);
        assert_eq!(member.span, 4);

        assert!(ubo.resolve_member("light.missing").is_none());
        assert!(ubo.resolve_member("model.x").is_none());
        assert!(ubo.resolve_member("").is_none());
    }

    #[test]
    fn test_array_member_span() {
        let member = StructMember::new("weights", ShaderDataType::Float32, 0, 4).with_array(4, 16);
        assert!(member.is_array());
        assert_eq!(member.span(), 52);
    }

    #[test]
    fn test_cyclic_struct_detection() {
        let acyclic = light_ubo();
        assert!(!acyclic.has_cyclic_struct());

        let cyclic = ShaderResource::buffer("node", 0, 0, 16)
            .with_struct("Node", vec![StructMember::nested("next", "Node", 0, 16)]);
        assert!(cyclic.has_cyclic_struct());
    }

    #[test]
    fn test_struct_members_only_for_buffers() {
        let texture = ShaderResource::texture("tex", 0, 1).with_struct("Bogus", Vec::new());
        assert!(texture.struct_members().is_none());
    }

    #[test]
    fn test_merge_combines_stages() {
        let vertex = ShaderReflection::new(ShaderStage::Vertex)
            .with_input(ShaderAttribute::new("inPos", 0, ShaderDataType::Float32x3))
            .with_resource(light_ubo())
            .with_push_constant(PushConstantLayout::new("pc", 0, 16, ShaderStageFlags::empty()));
        let fragment = ShaderReflection::new(ShaderStage::Fragment)
            .with_input(ShaderAttribute::new("fragColor", 0, ShaderDataType::Float32x3))
            .with_resource(light_ubo())
            .with_resource(ShaderResource::texture_sampler("samplerColor", 0, 1))
            .with_push_constant(PushConstantLayout::new("pc", 0, 16, ShaderStageFlags::empty()));

        let pipeline = PipelineReflection::merge([&fragment, &vertex]);

        assert_eq!(pipeline.input_attributes.len(), 1);
        assert_eq!(pipeline.input_attributes[0].name, "inPos");
        assert_eq!(pipeline.resources.len(), 2);
        assert_eq!(
            pipeline.resource("ubo").unwrap().stages,
            ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT
        );
        assert_eq!(
            pipeline.resource("samplerColor").unwrap().stages,
            ShaderStageFlags::FRAGMENT
        );
        assert_eq!(pipeline.push_constant_layouts.len(), 1);
        assert_eq!(
            pipeline.push_constant_layouts[0].stages,
            ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT
        );
        assert_eq!(pipeline.set_indices(), [0]);
    }

    #[test]
    fn test_unknown_codes() {
        assert!(ShaderResourceType::TEXTURE_SAMPLER.is_known());
        assert!(!ShaderResourceType(7).is_known());
        assert!(ShaderAccess::READ_WRITE.is_known());
        assert!(!ShaderAccess(3).is_known());
    }
}
