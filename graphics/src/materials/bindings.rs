//! Binding set layouts and bound resources.
//!
//! A [`BindingSetLayout`] describes what one descriptor set of a pipeline
//! expects and is derived from the pipeline's reflection. A [`BindingSet`]
//! holds the resources currently attached to each slot. Binding sets are
//! cheap to clone (everything inside is `Arc`-shared), which is how encoded
//! commands capture them.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::GraphicsError;
use crate::resources::{Buffer, Sampler, Texture};
use crate::shader::{PipelineReflection, ShaderResourceType, ShaderStageFlags};

/// Describes a single binding slot in a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingLayoutEntry {
    /// Binding index within the set.
    pub binding: u32,
    /// Resource name in the shader.
    pub name: String,
    /// Type of resource expected at this binding.
    pub resource_type: ShaderResourceType,
    /// Array size.
    pub count: u32,
    /// Shader stages that can access this binding.
    pub visibility: ShaderStageFlags,
}

impl BindingLayoutEntry {
    /// Create a new binding layout entry visible to no stage.
    pub fn new(binding: u32, name: impl Into<String>, resource_type: ShaderResourceType) -> Self {
        Self {
            binding,
            name: name.into(),
            resource_type,
            count: 1,
            visibility: ShaderStageFlags::empty(),
        }
    }

    /// Set the array size.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Set the shader stage visibility.
    pub fn with_visibility(mut self, visibility: ShaderStageFlags) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Describes the layout of one descriptor set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSetLayout {
    /// Descriptor set index.
    pub set: u32,
    /// The binding entries, ascending by binding.
    pub entries: Vec<BindingLayoutEntry>,
}

impl BindingSetLayout {
    /// Create an empty layout for descriptor set `set`.
    pub fn new(set: u32) -> Self {
        Self {
            set,
            entries: Vec::new(),
        }
    }

    /// Add a binding entry to the layout.
    pub fn with_entry(mut self, entry: BindingLayoutEntry) -> Self {
        self.entries.push(entry);
        self.entries.sort_by_key(|e| e.binding);
        self
    }

    /// Build the layout of descriptor set `set` from a pipeline's reflection.
    pub fn from_reflection(reflection: &PipelineReflection, set: u32) -> Self {
        reflection
            .resources
            .iter()
            .filter(|r| r.set == set)
            .fold(Self::new(set), |layout, r| {
                layout.with_entry(
                    BindingLayoutEntry::new(r.binding, r.name.clone(), r.resource_type)
                        .with_count(r.count)
                        .with_visibility(r.stages),
                )
            })
    }

    /// Find the entry for a binding index.
    pub fn entry(&self, binding: u32) -> Option<&BindingLayoutEntry> {
        self.entries.iter().find(|e| e.binding == binding)
    }
}

/// A resource attached to a binding slot.
#[derive(Debug, Clone)]
pub enum BoundResource {
    /// A range of a uniform or storage buffer.
    Buffer {
        /// The buffer.
        buffer: Arc<Buffer>,
        /// Start of the bound range.
        offset: u64,
        /// Length of the bound range.
        size: u64,
    },
    /// Sampled textures, one per array element.
    Textures(Vec<Arc<Texture>>),
    /// Samplers, one per array element.
    Samplers(Vec<Arc<Sampler>>),
    /// Combined texture and sampler pairs.
    TextureSamplers {
        /// The textures.
        textures: Vec<Arc<Texture>>,
        /// The samplers.
        samplers: Vec<Arc<Sampler>>,
    },
}

impl BoundResource {
    /// Bind a whole buffer.
    pub fn buffer(buffer: Arc<Buffer>) -> Self {
        let size = buffer.size();
        Self::Buffer {
            buffer,
            offset: 0,
            size,
        }
    }

    /// Resource type this binding satisfies.
    pub fn resource_type(&self) -> ShaderResourceType {
        match self {
            Self::Buffer { .. } => ShaderResourceType::BUFFER,
            Self::Textures(_) => ShaderResourceType::TEXTURE,
            Self::Samplers(_) => ShaderResourceType::SAMPLER,
            Self::TextureSamplers { .. } => ShaderResourceType::TEXTURE_SAMPLER,
        }
    }

    /// Number of array elements provided.
    pub fn element_count(&self) -> usize {
        match self {
            Self::Buffer { .. } => 1,
            Self::Textures(textures) => textures.len(),
            Self::Samplers(samplers) => samplers.len(),
            Self::TextureSamplers { textures, samplers } => textures.len().min(samplers.len()),
        }
    }
}

/// Resources attached to the slots of one descriptor set.
///
/// Created by [`GraphicsDevice::create_binding_set`](crate::GraphicsDevice::create_binding_set).
#[derive(Debug, Clone)]
pub struct BindingSet {
    layout: Arc<BindingSetLayout>,
    resources: BTreeMap<u32, BoundResource>,
}

impl BindingSet {
    pub(crate) fn new(layout: Arc<BindingSetLayout>) -> Self {
        Self {
            layout,
            resources: BTreeMap::new(),
        }
    }

    /// The layout this set was created for.
    pub fn layout(&self) -> &Arc<BindingSetLayout> {
        &self.layout
    }

    /// Descriptor set index.
    pub fn set_index(&self) -> u32 {
        self.layout.set
    }

    /// Attach a resource to a binding slot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] if the layout has no such
    /// binding, the resource is of the wrong kind, or more array elements are
    /// provided than the slot holds.
    pub fn bind(&mut self, binding: u32, resource: BoundResource) -> Result<(), GraphicsError> {
        let entry = self.layout.entry(binding).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!(
                "set {} has no binding {binding}",
                self.layout.set
            ))
        })?;
        if entry.resource_type != resource.resource_type() {
            return Err(GraphicsError::InvalidParameter(format!(
                "binding {binding} ('{}') expects {:?}, got {:?}",
                entry.name,
                entry.resource_type,
                resource.resource_type()
            )));
        }
        if resource.element_count() > entry.count as usize {
            return Err(GraphicsError::InvalidParameter(format!(
                "binding {binding} ('{}') holds {} elements, got {}",
                entry.name,
                entry.count,
                resource.element_count()
            )));
        }
        if let BoundResource::Buffer {
            buffer,
            offset,
            size,
        } = &resource
        {
            if offset.saturating_add(*size) > buffer.size() {
                return Err(GraphicsError::InvalidParameter(format!(
                    "binding {binding} range {offset}+{size} exceeds buffer of {} bytes",
                    buffer.size()
                )));
            }
        }
        self.resources.insert(binding, resource);
        Ok(())
    }

    /// Resource attached to a binding, if any.
    pub fn resource(&self, binding: u32) -> Option<&BoundResource> {
        self.resources.get(&binding)
    }

    /// Bindings of the layout with nothing attached.
    pub fn unbound(&self) -> impl Iterator<Item = &BindingLayoutEntry> {
        self.layout
            .entries
            .iter()
            .filter(|e| !self.resources.contains_key(&e.binding))
    }

    /// Whether every binding of the layout has a resource attached.
    pub fn is_complete(&self) -> bool {
        self.unbound().next().is_none()
    }
}

static_assertions::assert_impl_all!(BindingSet: Send, Sync);
