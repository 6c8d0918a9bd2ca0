/// Command - one instanced draw unit
///
/// A command owns:
/// - its shader bodies and draw state (mode, depth, cull)
/// - keys of the shared resources it reads, by shader name
/// - one instance buffer per instanced attribute, exclusive to it
/// - an instance pool (membership in insertion order + slot per instance)
///
/// Slots are assigned from one snapshot of the membership during a pool
/// rebuild and stay valid until the next add or delete. Any membership
/// change marks the pool dirty; the next draw rebuilds every instance buffer
/// before submitting.
///
/// `create` can run several times (context restore) and always leaves the
/// command in the same observable state for the same inputs.

use slotmap::{SlotMap, new_key_type};
use crate::device::{
    DrawMode, DepthFunc, CullFace, ElementType, BufferTarget, ProgramHandle, VertexArrayHandle,
    VertexAttribLayout,
};
use crate::error::{Error, Result};
use crate::resource::{ResourceKey, ResourceRegistry, ResourceBody, BufferResource, TypedArray, Value};
use crate::renderer::{GpuContext, WorkRequests};
use crate::command::{CommandDesc, RenderPredicate, ProgramCache, ShaderInputs};
use crate::{engine_debug, engine_trace, engine_warn};

new_key_type! {
    /// Stable key of a registered command
    pub struct CommandKey;
    /// Stable key of one instance inside its command
    pub struct InstanceKey;
}

// ===== INTERNAL RECORDS =====

#[derive(Debug, Clone)]
struct BoundResource {
    name: String,
    key: ResourceKey,
}

#[derive(Debug, Clone)]
struct InstancedAttribute {
    name: String,
    key: ResourceKey,
    default_value: Value,
    dimensions: usize,
    element_type: ElementType,
}

#[derive(Debug, Clone)]
struct Instance {
    /// One value per instanced attribute, same order as `Command::instanced`
    values: Vec<Value>,
    /// Position in the instance buffers, valid while the pool is clean
    slot: Option<usize>,
}

#[derive(Debug)]
struct PendingInstanceUpdate {
    instance: InstanceKey,
    name: String,
    value: Value,
}

// ===== COMMAND =====

#[derive(Debug)]
pub struct Command {
    order: f64,
    vertex: String,
    fragment: String,
    vertex_precision: String,
    fragment_precision: String,
    mode: DrawMode,
    depth: Option<DepthFunc>,
    cull: Option<CullFace>,
    override_count: Option<u32>,
    base_instances: u32,
    should_render: Option<RenderPredicate>,

    attributes: Vec<BoundResource>,
    uniform_blocks: Vec<BoundResource>,
    textures: Vec<BoundResource>,
    instanced: Vec<InstancedAttribute>,
    elements: Option<Vec<u16>>,
    elements_key: Option<ResourceKey>,

    instances: SlotMap<InstanceKey, Instance>,
    members: Vec<InstanceKey>,
    pool_dirty: bool,
    pending: Vec<PendingInstanceUpdate>,

    count: u32,
    program: Option<ProgramHandle>,
    vertex_array: Option<VertexArrayHandle>,
    created: bool,
}

impl Command {
    /// Resolve the descriptor's resources through `registry`
    ///
    /// Shared resources are created right away when `gpu` is available. The
    /// command itself is created by the caller once it has a key.
    pub(crate) fn new(
        desc: &CommandDesc,
        default_order: f64,
        registry: &mut ResourceRegistry,
        mut gpu: Option<&mut GpuContext<'_>>,
        work: &mut WorkRequests,
    ) -> Result<Self> {
        let (vertex, fragment) = desc.shader_bodies()?;

        // ========== VALIDATION ==========
        let mut prop_layouts = Vec::with_capacity(desc.props.len());
        for (_, default_value) in &desc.props {
            prop_layouts.push(default_value.layout()?);
        }

        // ========== SHARED CONTEXT ==========
        let mut attributes = Vec::new();
        let mut uniform_blocks = Vec::new();
        let mut textures = Vec::new();
        for (name, resource) in &desc.context {
            let key = registry.get_or_create(Some(name), resource, gpu.as_deref_mut(), work)?;
            let bound = BoundResource { name: name.clone(), key };
            match registry.get(key).map(|r| r.body()) {
                Some(ResourceBody::Buffer(_)) => attributes.push(bound),
                Some(ResourceBody::UniformBlock(_)) => uniform_blocks.push(bound),
                Some(ResourceBody::Texture(_)) => textures.push(bound),
                None => return Err(Error::InvalidResource(format!("context '{}' vanished", name))),
            }
        }

        // ========== INSTANCED ATTRIBUTES ==========
        let mut instanced = Vec::with_capacity(desc.props.len());
        for ((name, default_value), layout) in desc.props.iter().zip(prop_layouts) {
            let key = registry.insert_instanced(name, default_value)?;
            instanced.push(InstancedAttribute {
                name: name.clone(),
                key,
                default_value: default_value.clone(),
                dimensions: layout.dimensions,
                element_type: layout.element_type,
            });
        }

        Ok(Self {
            order: desc.order.unwrap_or(default_order),
            vertex: vertex.to_string(),
            fragment: fragment.to_string(),
            vertex_precision: desc.vertex_precision.clone(),
            fragment_precision: desc.fragment_precision.clone(),
            mode: desc.mode,
            depth: desc.depth,
            cull: desc.cull,
            override_count: desc.count,
            base_instances: desc.instance_count.unwrap_or(0),
            should_render: desc.should_render.clone(),
            attributes,
            uniform_blocks,
            textures,
            instanced,
            elements: desc.elements.clone(),
            elements_key: None,
            instances: SlotMap::with_key(),
            members: Vec::new(),
            pool_dirty: true,
            pending: Vec::new(),
            count: desc.count.unwrap_or(0),
            program: None,
            vertex_array: None,
            created: false,
        })
    }

    // ===== ACCESSORS =====

    pub fn order(&self) -> f64 { self.order }

    pub fn mode(&self) -> DrawMode { self.mode }

    /// Vertices drawn per instance
    pub fn count(&self) -> u32 { self.count }

    /// Instances drawn (base count plus added instances)
    pub fn instance_count(&self) -> u32 {
        self.base_instances + self.members.len() as u32
    }

    pub fn is_created(&self) -> bool { self.created }

    pub fn program(&self) -> Option<ProgramHandle> { self.program }

    pub fn vertex_array(&self) -> Option<VertexArrayHandle> { self.vertex_array }

    /// Whether the next draw rebuilds the instance buffers
    pub fn is_pool_dirty(&self) -> bool { self.pool_dirty }

    /// Instance updates queued before creation
    pub fn pending_len(&self) -> usize { self.pending.len() }

    /// Instances in insertion order
    pub fn instances(&self) -> &[InstanceKey] { &self.members }

    /// Current slot of `instance`, `None` until the pool is rebuilt
    pub fn instance_slot(&self, instance: InstanceKey) -> Option<usize> {
        self.instances.get(instance)?.slot
    }

    /// Current value of an instanced attribute
    pub fn instance_value(&self, instance: InstanceKey, name: &str) -> Option<&Value> {
        let index = self.instanced.iter().position(|a| a.name == name)?;
        self.instances.get(instance)?.values.get(index)
    }

    /// Registry key of the resource bound under `name` (shared or instanced)
    pub fn resource_key(&self, name: &str) -> Option<ResourceKey> {
        self.shared_resources()
            .find(|b| b.name == name)
            .map(|b| b.key)
            .or_else(|| self.instanced.iter().find(|a| a.name == name).map(|a| a.key))
    }

    /// Registry key of the element buffer, once created
    pub fn elements_key(&self) -> Option<ResourceKey> { self.elements_key }

    fn shared_resources(&self) -> impl Iterator<Item = &BoundResource> {
        self.attributes.iter().chain(&self.uniform_blocks).chain(&self.textures)
    }

    // ===== LIFECYCLE =====

    /// Create the GPU side: resources, program, vertex array, bindings
    pub(crate) fn create(
        &mut self,
        key: CommandKey,
        registry: &mut ResourceRegistry,
        programs: &mut ProgramCache,
        gpu: &mut GpuContext<'_>,
        work: &mut WorkRequests,
    ) -> Result<()> {
        // ========== RESOURCES ==========
        let shared: Vec<ResourceKey> = self.shared_resources().map(|b| b.key).collect();
        for resource in shared {
            Self::ensure_created(registry, resource, gpu, work)?;
            registry.bind(resource, key);
        }
        for attribute in &self.instanced {
            Self::ensure_created(registry, attribute.key, gpu, work)?;
        }

        // ========== PROGRAM ==========
        let inputs = self.shader_inputs(registry)?;
        let vertex_source = inputs.vertex_source(&self.vertex_precision, &self.vertex);
        let fragment_source = inputs.fragment_source(&self.fragment_precision, &self.fragment);

        if gpu.debug {
            engine_debug!("glint::Command", "Creating command {:?}\n{}\n{}", key, vertex_source, fragment_source);
        }

        let program = programs.program(&mut *gpu.device, &vertex_source, &fragment_source)?;
        gpu.set_program(Some(program));

        // ========== VERTEX ARRAY ==========
        let vertex_array = gpu.device.create_vertex_array()?;
        gpu.set_vertex_array(Some(vertex_array));

        if let Some(indices) = &self.elements {
            let elements_key = match self.elements_key {
                Some(existing) if registry.get(existing).is_some() => existing,
                _ => {
                    let inserted = registry.insert_owned("ELEMENTS", BufferResource::elements(indices));
                    self.elements_key = Some(inserted);
                    inserted
                }
            };
            Self::ensure_created(registry, elements_key, gpu, work)?;
        }

        self.bind_attributes(registry, gpu, program);
        gpu.set_vertex_array(None);

        self.count_vertices(registry);

        // ========== UNIFORM BLOCKS ==========
        for name in gpu.device.active_uniform_blocks(program) {
            let index = gpu.device.uniform_block_index(program, &name);
            let bind_index = self
                .uniform_blocks
                .iter()
                .find(|b| b.name == name)
                .and_then(|b| registry.get(b.key))
                .and_then(|r| r.as_uniform_block())
                .and_then(|u| u.bind_index());

            match (index, bind_index) {
                (Some(index), Some(bind_index)) => gpu.device.uniform_block_binding(program, index, bind_index),
                _ => engine_warn!("glint::Command", "Failed to resolve uniform block '{}'", name),
            }
        }

        // ========== SAMPLERS ==========
        for name in gpu.device.active_uniforms(program) {
            let location = gpu.device.uniform_location(program, &name);
            let unit = self
                .textures
                .iter()
                .find(|t| t.name == name)
                .and_then(|t| registry.get(t.key))
                .and_then(|r| r.as_texture())
                .and_then(|t| t.unit());

            match (location, unit) {
                (Some(location), Some(unit)) => gpu.device.set_uniform_i32(location, unit as i32),
                _ => engine_warn!("glint::Command", "Failed to resolve sampler '{}'", name),
            }
        }

        self.program = Some(program);
        self.vertex_array = Some(vertex_array);
        self.created = true;
        // Instance buffers were recreated from their defaults
        self.pool_dirty = true;

        for update in std::mem::take(&mut self.pending) {
            if self.instances.contains_key(update.instance) {
                self.update_instance(registry, work, update.instance, &update.name, update.value)?;
            }
        }

        work.request_render();
        Ok(())
    }

    fn ensure_created(
        registry: &mut ResourceRegistry,
        resource: ResourceKey,
        gpu: &mut GpuContext<'_>,
        work: &mut WorkRequests,
    ) -> Result<()> {
        match registry.get(resource) {
            Some(r) if r.is_created() => Ok(()),
            Some(_) => registry.create(resource, gpu, work),
            None => Err(Error::InvalidResource(format!("unknown resource {:?}", resource))),
        }
    }

    fn shader_inputs(&self, registry: &ResourceRegistry) -> Result<ShaderInputs> {
        let lookup = |key: ResourceKey| {
            registry
                .get(key)
                .ok_or_else(|| Error::InvalidResource(format!("unknown resource {:?}", key)))
        };

        let mut inputs = ShaderInputs::default();
        for bound in &self.attributes {
            inputs.attributes.push((bound.name.clone(), lookup(bound.key)?.shader_type().to_string()));
        }
        for attribute in &self.instanced {
            inputs.instanced.push((attribute.name.clone(), lookup(attribute.key)?.shader_type().to_string()));
        }
        for bound in &self.uniform_blocks {
            if let Some(block) = lookup(bound.key)?.as_uniform_block() {
                inputs.blocks.push((bound.name.clone(), block.layout().clone()));
            }
        }
        for bound in &self.textures {
            inputs.samplers.push((bound.name.clone(), lookup(bound.key)?.shader_type().to_string()));
        }
        Ok(inputs)
    }

    /// Point every active attribute at its buffer; instanced ones advance per instance
    fn bind_attributes(&self, registry: &ResourceRegistry, gpu: &mut GpuContext<'_>, program: ProgramHandle) {
        for name in gpu.device.active_attributes(program) {
            let location = gpu.device.attribute_location(program, &name);
            let source = self
                .attributes
                .iter()
                .find(|b| b.name == name)
                .map(|b| b.key)
                .or_else(|| self.instanced.iter().find(|a| a.name == name).map(|a| a.key));
            let buffer = source.and_then(|k| registry.get(k)).and_then(|r| r.as_buffer());

            let (Some(location), Some(buffer)) = (location, buffer) else {
                engine_warn!("glint::Command", "Failed to resolve attribute '{}'", name);
                continue;
            };
            let Some(handle) = buffer.handle() else {
                engine_warn!("glint::Command", "Failed to resolve attribute '{}'", name);
                continue;
            };

            gpu.set_buffer(BufferTarget::Array, Some(handle));
            gpu.device.vertex_attrib_pointer(location, VertexAttribLayout {
                dimensions: buffer.dimensions() as u32,
                element_type: buffer.element_type(),
                divisor: if buffer.is_instanced() { 1 } else { 0 },
            });
        }
    }

    /// Forget GPU objects (context lost, device detached)
    pub(crate) fn destroy(&mut self) {
        self.created = false;
        self.program = None;
        self.vertex_array = None;
    }

    /// Unbind shared resources and drop the exclusive ones
    pub(crate) fn release(&mut self, key: CommandKey, registry: &mut ResourceRegistry) {
        for bound in self.shared_resources() {
            registry.unbind(bound.key, key);
        }
        for attribute in &self.instanced {
            registry.remove(attribute.key);
        }
        if let Some(elements) = self.elements_key.take() {
            registry.remove(elements);
        }
        self.destroy();
    }

    /// Vertex count: the override, else the smallest per-vertex buffer
    pub(crate) fn count_vertices(&mut self, registry: &ResourceRegistry) {
        self.count = match self.override_count {
            Some(count) => count,
            None => self
                .attributes
                .iter()
                .filter_map(|b| registry.get(b.key)?.as_buffer())
                .map(|buffer| buffer.count() as u32)
                .min()
                .unwrap_or(0),
        };
    }

    // ===== INSTANCES =====

    /// Add an instance, defaulting every attribute not given in `values`
    pub(crate) fn add_instance(
        &mut self,
        work: &mut WorkRequests,
        values: Vec<(String, Value)>,
    ) -> Result<InstanceKey> {
        let mut record = Instance {
            values: self.instanced.iter().map(|a| a.default_value.clone()).collect(),
            slot: None,
        };
        for (name, value) in values {
            let index = self.instanced_index(&name, &value)?;
            record.values[index] = value;
        }

        let instance = self.instances.insert(record);
        self.members.push(instance);
        self.pool_dirty = true;
        work.request_render();
        Ok(instance)
    }

    pub(crate) fn delete_instance(&mut self, work: &mut WorkRequests, instance: InstanceKey) -> Result<()> {
        if self.instances.remove(instance).is_none() {
            return Err(Error::InvalidResource(format!("unknown instance {:?}", instance)));
        }
        self.members.retain(|m| *m != instance);
        self.pool_dirty = true;
        work.request_render();
        Ok(())
    }

    /// Set one attribute of one instance
    ///
    /// Before creation the update is queued. Afterwards the value is stored
    /// and, while slots are valid, written straight into the instance buffer.
    pub(crate) fn update_instance(
        &mut self,
        registry: &mut ResourceRegistry,
        work: &mut WorkRequests,
        instance: InstanceKey,
        name: &str,
        value: Value,
    ) -> Result<()> {
        let index = self.instanced_index(name, &value)?;
        if !self.instances.contains_key(instance) {
            return Err(Error::InvalidResource(format!("unknown instance {:?}", instance)));
        }

        if !self.created {
            self.pending.push(PendingInstanceUpdate { instance, name: name.to_string(), value });
            return Ok(());
        }

        let attribute = &self.instanced[index];
        let Some(record) = self.instances.get_mut(instance) else { return Ok(()) };
        record.values[index] = value.clone();

        if !self.pool_dirty {
            if let Some(slot) = record.slot {
                registry.update_buffer(attribute.key, value, slot * attribute.dimensions, work)?;
            }
        }
        work.request_render();
        Ok(())
    }

    fn instanced_index(&self, name: &str, value: &Value) -> Result<usize> {
        let Some(index) = self.instanced.iter().position(|a| a.name == name) else {
            return Err(Error::InvalidResource(format!("unknown instanced attribute '{}'", name)));
        };
        let dimensions = self.instanced[index].dimensions;
        if value.len() != dimensions {
            return Err(Error::InvalidResource(format!(
                "instanced attribute '{}' takes {} components, got {}",
                name, dimensions, value.len()
            )));
        }
        Ok(index)
    }

    /// Write every instance into fresh instance buffers, assigning slots
    pub(crate) fn rebuild_instances(
        &mut self,
        registry: &mut ResourceRegistry,
        gpu: &mut GpuContext<'_>,
        work: &mut WorkRequests,
    ) -> Result<()> {
        if gpu.debug {
            engine_trace!("glint::Command", "Rebuilding {} instances", self.members.len());
        }

        for (slot, member) in self.members.iter().enumerate() {
            if let Some(record) = self.instances.get_mut(*member) {
                record.slot = Some(slot);
            }
        }

        for (index, attribute) in self.instanced.iter().enumerate() {
            let mut batch = TypedArray::zeros(attribute.element_type, attribute.dimensions * self.members.len());
            for (slot, member) in self.members.iter().enumerate() {
                if let Some(record) = self.instances.get(*member) {
                    batch.write(slot * attribute.dimensions, &record.values[index])?;
                }
            }
            registry.refill(attribute.key, batch, Some(&mut *gpu), work)?;
        }

        self.pool_dirty = false;
        Ok(())
    }

    // ===== DRAW =====

    /// Submit the draw, creating the command and rebuilding the pool first if needed
    ///
    /// Returns the number of instances drawn, 0 when the draw was skipped.
    pub(crate) fn render(
        &mut self,
        key: CommandKey,
        registry: &mut ResourceRegistry,
        programs: &mut ProgramCache,
        gpu: &mut GpuContext<'_>,
        work: &mut WorkRequests,
    ) -> Result<u32> {
        if let Some(predicate) = &self.should_render {
            if !predicate.check() {
                return Ok(0);
            }
        }

        if !self.created {
            self.create(key, registry, programs, gpu, work)?;
        }

        if self.pool_dirty {
            self.rebuild_instances(registry, gpu, work)?;
        }

        let instances = self.instance_count();
        if instances == 0 {
            return Ok(0);
        }

        if gpu.debug {
            engine_trace!("glint::Command", "Rendering {:?}: {} instances", key, instances);
        }

        gpu.set_program(self.program);
        gpu.set_vertex_array(self.vertex_array);
        gpu.set_depth(self.depth);
        gpu.set_cull(self.cull);

        match &self.elements {
            Some(indices) => gpu.device.draw_elements_instanced(
                self.mode,
                indices.len() as u32,
                ElementType::UnsignedShort,
                0,
                instances,
            ),
            None => gpu.device.draw_arrays_instanced(self.mode, 0, self.count, instances),
        }

        gpu.set_vertex_array(None);
        Ok(instances)
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
