/// Resource registry - identity-keyed cache of GPU resources.
///
/// Shared descriptors map to one resource each, keyed by the descriptor's
/// allocation address (the registry keeps the `Arc` alive so the address
/// stays unique). Per-command resources (instance attributes, element
/// buffers) bypass the cache and are owned by their command.
///
/// Context loss destroys every resource in place; records, keys and binding
/// points survive so a later `create` rebuilds the same registry state.

use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use crate::error::{Error, Result};
use crate::resource::{
    SharedResource, ResourceDesc, Value, TypedArray, BufferResource, UniformBlockResource,
    TextureResource, TextureUpdate, descriptor_identity,
};
use crate::command::CommandKey;
use crate::renderer::{GpuContext, WorkRequests};
use crate::engine_debug;

new_key_type! {
    /// Stable key of a registered resource
    pub struct ResourceKey;
}

// ===== RESOURCE =====

/// Kind-specific part of a resource
#[derive(Debug)]
pub enum ResourceBody {
    Buffer(BufferResource),
    UniformBlock(UniformBlockResource),
    Texture(TextureResource),
}

/// One registered resource
#[derive(Debug)]
pub struct Resource {
    name: Option<String>,
    desc: Option<SharedResource>,
    bound_commands: Vec<CommandKey>,
    body: ResourceBody,
}

impl Resource {
    fn from_desc(name: Option<&str>, desc: &SharedResource) -> Result<Self> {
        let body = match desc.as_ref() {
            ResourceDesc::Buffer(buffer) => ResourceBody::Buffer(BufferResource::from_desc(buffer)?),
            ResourceDesc::UniformBlock(block) => ResourceBody::UniformBlock(UniformBlockResource::from_desc(block)?),
            ResourceDesc::Texture(texture) => ResourceBody::Texture(TextureResource::from_desc(texture)?),
        };
        Ok(Self {
            name: name.map(str::to_string),
            desc: Some(desc.clone()),
            bound_commands: Vec::new(),
            body,
        })
    }

    /// Name of the first context entry that registered this resource
    pub fn name(&self) -> Option<&str> { self.name.as_deref() }

    /// Shared descriptor, `None` for per-command resources
    pub fn desc(&self) -> Option<&SharedResource> { self.desc.as_ref() }

    pub fn body(&self) -> &ResourceBody { &self.body }

    /// Commands notified on refill
    pub fn bound_commands(&self) -> &[CommandKey] { &self.bound_commands }

    pub fn is_created(&self) -> bool {
        match &self.body {
            ResourceBody::Buffer(b) => b.is_created(),
            ResourceBody::UniformBlock(u) => u.is_created(),
            ResourceBody::Texture(t) => t.is_created(),
        }
    }

    /// GLSL type used in the generated declaration
    pub fn shader_type(&self) -> &str {
        match &self.body {
            ResourceBody::Buffer(b) => b.shader_type(),
            ResourceBody::UniformBlock(_) => "uniform",
            ResourceBody::Texture(t) => t.shader_type(),
        }
    }

    pub fn as_buffer(&self) -> Option<&BufferResource> {
        match &self.body { ResourceBody::Buffer(b) => Some(b), _ => None }
    }

    pub fn as_uniform_block(&self) -> Option<&UniformBlockResource> {
        match &self.body { ResourceBody::UniformBlock(u) => Some(u), _ => None }
    }

    pub fn as_texture(&self) -> Option<&TextureResource> {
        match &self.body { ResourceBody::Texture(t) => Some(t), _ => None }
    }

    fn kind_name(&self) -> &'static str {
        match &self.body {
            ResourceBody::Buffer(_) => "buffer",
            ResourceBody::UniformBlock(_) => "uniform block",
            ResourceBody::Texture(_) => "texture",
        }
    }
}

// ===== REGISTRY =====

pub struct ResourceRegistry {
    resources: SlotMap<ResourceKey, Resource>,
    by_identity: FxHashMap<usize, ResourceKey>,
    next_bind_index: u32,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            resources: SlotMap::with_key(),
            by_identity: FxHashMap::default(),
            next_bind_index: 0,
        }
    }

    // ========== LOOKUP ==========

    pub fn get(&self, key: ResourceKey) -> Option<&Resource> {
        self.resources.get(key)
    }

    /// Key of an already registered shared descriptor
    pub fn key_of(&self, desc: &SharedResource) -> Option<ResourceKey> {
        self.by_identity.get(&descriptor_identity(desc)).copied()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKey, &Resource)> {
        self.resources.iter()
    }

    fn resource_mut(&mut self, key: ResourceKey) -> Result<&mut Resource> {
        self.resources
            .get_mut(key)
            .ok_or_else(|| Error::InvalidResource(format!("unknown resource {:?}", key)))
    }

    // ========== REGISTRATION ==========

    /// Resource for `desc`, registering it on first sight
    ///
    /// Creation is immediate when a device is available, deferred otherwise.
    /// The first non-empty `name` sticks.
    pub fn get_or_create(
        &mut self,
        name: Option<&str>,
        desc: &SharedResource,
        gpu: Option<&mut GpuContext<'_>>,
        work: &mut WorkRequests,
    ) -> Result<ResourceKey> {
        let identity = descriptor_identity(desc);
        let key = match self.by_identity.get(&identity) {
            Some(&key) => {
                let resource = self.resource_mut(key)?;
                if resource.name.is_none() {
                    resource.name = name.map(str::to_string);
                }
                key
            }
            None => {
                let resource = Resource::from_desc(name, desc)?;
                let key = self.resources.insert(resource);
                self.by_identity.insert(identity, key);
                key
            }
        };

        if let Some(gpu) = gpu {
            if !self.resources[key].is_created() {
                self.create(key, gpu, work)?;
            }
        }
        Ok(key)
    }

    /// Register a per-command buffer that bypasses the identity cache
    pub fn insert_owned(&mut self, name: &str, buffer: BufferResource) -> ResourceKey {
        self.resources.insert(Resource {
            name: Some(name.to_string()),
            desc: None,
            bound_commands: Vec::new(),
            body: ResourceBody::Buffer(buffer),
        })
    }

    /// Register a per-command instance attribute buffer seeded with `default_value`
    pub fn insert_instanced(&mut self, name: &str, default_value: &Value) -> Result<ResourceKey> {
        Ok(self.insert_owned(name, BufferResource::instanced(default_value)?))
    }

    /// Drop a resource record (per-command resources, or unbound shared ones)
    pub fn remove(&mut self, key: ResourceKey) -> Option<Resource> {
        let resource = self.resources.remove(key)?;
        if let Some(desc) = &resource.desc {
            self.by_identity.remove(&descriptor_identity(desc));
        }
        Some(resource)
    }

    // ========== BINDING ==========

    /// Record that `command` reads `key`
    pub fn bind(&mut self, key: ResourceKey, command: CommandKey) {
        if let Some(resource) = self.resources.get_mut(key) {
            if !resource.bound_commands.contains(&command) {
                resource.bound_commands.push(command);
            }
        }
    }

    /// Forget that `command` reads `key`
    pub fn unbind(&mut self, key: ResourceKey, command: CommandKey) {
        if let Some(resource) = self.resources.get_mut(key) {
            resource.bound_commands.retain(|c| *c != command);
        }
    }

    // ========== LIFECYCLE ==========

    /// Create the GPU side of `key` and replay its queued operations
    pub fn create(&mut self, key: ResourceKey, gpu: &mut GpuContext<'_>, work: &mut WorkRequests) -> Result<()> {
        let next_bind_index = &mut self.next_bind_index;
        let resource = self
            .resources
            .get_mut(key)
            .ok_or_else(|| Error::InvalidResource(format!("unknown resource {:?}", key)))?;

        match &mut resource.body {
            ResourceBody::Buffer(buffer) => buffer.create(key, gpu, work, &resource.bound_commands)?,
            ResourceBody::UniformBlock(block) => block.create(key, gpu, work, next_bind_index)?,
            ResourceBody::Texture(texture) => texture.create(gpu, work)?,
        }

        if gpu.debug {
            engine_debug!("glint::ResourceRegistry", "Created {} '{}'",
                resource.kind_name(), resource.name.as_deref().unwrap_or("<unnamed>"));
        }
        Ok(())
    }

    /// Mark every resource uninitialized (context lost or device detached)
    pub fn destroy_all(&mut self) {
        for resource in self.resources.values_mut() {
            match &mut resource.body {
                ResourceBody::Buffer(b) => b.destroy(),
                ResourceBody::UniformBlock(u) => u.destroy(),
                ResourceBody::Texture(t) => t.destroy(),
            }
        }
    }

    // ========== WRITES ==========

    /// Replace the contents of a buffer
    pub fn refill(
        &mut self,
        key: ResourceKey,
        data: TypedArray,
        gpu: Option<&mut GpuContext<'_>>,
        work: &mut WorkRequests,
    ) -> Result<()> {
        let resource = self.resource_mut(key)?;
        let kind = resource.kind_name();
        match &mut resource.body {
            ResourceBody::Buffer(buffer) => buffer.refill(gpu, work, &resource.bound_commands, data),
            _ => Err(Error::InvalidResource(format!("cannot refill a {}", kind))),
        }
    }

    /// Partially update a buffer at element `offset`
    pub fn update_buffer(&mut self, key: ResourceKey, value: Value, offset: usize, work: &mut WorkRequests) -> Result<()> {
        let resource = self.resource_mut(key)?;
        let kind = resource.kind_name();
        match &mut resource.body {
            ResourceBody::Buffer(buffer) => buffer.update(key, work, value, offset),
            _ => Err(Error::InvalidResource(format!("cannot update a {} as a buffer", kind))),
        }
    }

    /// Update one field of a uniform block
    pub fn update_uniform(&mut self, key: ResourceKey, field: &str, value: Value, work: &mut WorkRequests) -> Result<()> {
        let resource = self.resource_mut(key)?;
        let kind = resource.kind_name();
        match &mut resource.body {
            ResourceBody::UniformBlock(block) => block.update(key, work, field, value),
            _ => Err(Error::InvalidResource(format!("cannot update a {} as a uniform block", kind))),
        }
    }

    /// Upload a texture sub-region
    pub fn update_texture(
        &mut self,
        key: ResourceKey,
        update: TextureUpdate,
        gpu: Option<&mut GpuContext<'_>>,
        work: &mut WorkRequests,
    ) -> Result<()> {
        let resource = self.resource_mut(key)?;
        let kind = resource.kind_name();
        match &mut resource.body {
            ResourceBody::Texture(texture) => texture.update(gpu, work, update),
            _ => Err(Error::InvalidResource(format!("cannot update a {} as a texture", kind))),
        }
    }

    /// Run the commit job of a buffer or uniform block
    pub fn commit(&mut self, key: ResourceKey, gpu: &mut GpuContext<'_>, work: &mut WorkRequests) {
        let Some(resource) = self.resources.get_mut(key) else { return };
        match &mut resource.body {
            ResourceBody::Buffer(buffer) => buffer.commit(gpu, work),
            ResourceBody::UniformBlock(block) => block.commit(gpu, work),
            ResourceBody::Texture(_) => {}
        }
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
