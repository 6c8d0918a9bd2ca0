/// Uniform blocks packed with std140 rules and committed by dirty range.
///
/// Packing works in 4-byte elements. Scalars align to 1 element, 2-component
/// values to 2, everything wider to 4. The block is padded to a multiple of 4
/// elements at the end:
///
/// ```text
/// | a |...|...|...|b.x|b.y|b.z|b.w| c |...|...|...|
///   float          vec4            float
/// ```

use crate::error::{Error, Result};
use crate::device::{BufferHandle, BufferTarget, BufferUsage};
use crate::resource::{Value, DirtyRange, UniformBlockDesc, ResourceKey};
use crate::renderer::{GpuContext, Job, WorkRequests};
use crate::{engine_debug, engine_trace};

// ===== STD140 LAYOUT =====

/// Placement of one field inside the block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub shader_type: String,
    /// Elements of padding inserted before the field
    pub padding: usize,
    /// Elements reserved for the field
    pub size: usize,
    pub element_offset: usize,
    pub byte_offset: usize,
}

/// Packed block layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Std140Layout {
    pub fields: Vec<UniformField>,
    /// Block size in elements, a multiple of 4
    pub total_elements: usize,
}

impl Std140Layout {
    /// Field placement by name
    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Block size in bytes
    pub fn total_bytes(&self) -> usize {
        self.total_elements * 4
    }
}

/// Pack `fields` in declaration order
pub fn pack_std140(fields: &[(String, Value)]) -> Result<Std140Layout> {
    let mut counter = 0;
    let mut packed = Vec::with_capacity(fields.len());

    for (name, value) in fields {
        let shader_type = value.shader_type()?;
        let (alignment, size) = match value.len() {
            1 => (1, 1),
            2 => (2, 2),
            n => (4, n),
        };

        let padding = (alignment - counter % alignment) % alignment;
        counter += padding;

        packed.push(UniformField {
            name: name.clone(),
            shader_type,
            padding,
            size,
            element_offset: counter,
            byte_offset: counter * 4,
        });
        counter += size;
    }

    counter += (4 - counter % 4) % 4;

    Ok(Std140Layout { fields: packed, total_elements: counter })
}

// ===== UNIFORM BLOCK RESOURCE =====

/// Uniform buffer bound to a fixed binding point
#[derive(Debug)]
pub struct UniformBlockResource {
    layout: Std140Layout,
    initial: Vec<f32>,
    data: Vec<f32>,
    handle: Option<BufferHandle>,
    bind_index: Option<u32>,
    dirty: DirtyRange,
    pending: Vec<(String, Value)>,
}

impl UniformBlockResource {
    pub fn from_desc(desc: &UniformBlockDesc) -> Result<Self> {
        if desc.fields.is_empty() {
            return Err(Error::UnknownResourceKind("uniform block has no fields".to_string()));
        }

        let layout = pack_std140(&desc.fields)?;
        let mut initial = vec![0.0; layout.total_elements];
        for (field, (_, value)) in layout.fields.iter().zip(&desc.fields) {
            let components = value.components();
            initial[field.element_offset..field.element_offset + components.len()]
                .copy_from_slice(&components);
        }

        Ok(Self {
            layout,
            data: initial.clone(),
            initial,
            handle: None,
            bind_index: None,
            dirty: DirtyRange::new(),
            pending: Vec::new(),
        })
    }

    // ===== ACCESSORS =====

    pub fn layout(&self) -> &Std140Layout { &self.layout }

    /// Binding point, assigned on first creation and kept afterwards
    pub fn bind_index(&self) -> Option<u32> { self.bind_index }

    /// Shadow copy in elements
    pub fn data(&self) -> &[f32] { &self.data }

    pub fn handle(&self) -> Option<BufferHandle> { self.handle }

    pub fn is_created(&self) -> bool { self.handle.is_some() }

    pub fn dirty_range(&self) -> Option<(usize, usize)> { self.dirty.bounds() }

    pub fn pending_len(&self) -> usize { self.pending.len() }

    // ===== LIFECYCLE =====

    /// Claim a binding point (first time only), allocate and upload, replay the queue
    pub(crate) fn create(
        &mut self,
        key: ResourceKey,
        gpu: &mut GpuContext<'_>,
        work: &mut WorkRequests,
        next_bind_index: &mut u32,
    ) -> Result<()> {
        let bind_index = *self.bind_index.get_or_insert_with(|| {
            let index = *next_bind_index;
            *next_bind_index += 1;
            index
        });

        let handle = gpu.device.create_buffer()?;
        self.handle = Some(handle);
        self.dirty = DirtyRange::new();
        self.data = self.initial.clone();

        gpu.set_buffer(BufferTarget::Uniform, Some(handle));
        gpu.device.bind_buffer_base(bind_index, handle);
        gpu.device.buffer_data(BufferTarget::Uniform, bytemuck::cast_slice(&self.data), BufferUsage::DynamicDraw);
        work.request_render();

        for (field, value) in std::mem::take(&mut self.pending) {
            self.update(key, work, &field, value)?;
        }

        if gpu.debug {
            engine_debug!("glint::UniformBlock", "Created uniform block {:?} at binding {} ({} bytes)",
                handle, bind_index, self.layout.total_bytes());
        }
        Ok(())
    }

    pub(crate) fn destroy(&mut self) {
        self.handle = None;
        self.dirty = DirtyRange::new();
    }

    // ===== WRITES =====

    /// Write `value` into field `name` and schedule one coalesced commit
    pub(crate) fn update(
        &mut self,
        key: ResourceKey,
        work: &mut WorkRequests,
        name: &str,
        value: Value,
    ) -> Result<()> {
        let Some(field) = self.layout.field(name) else {
            return Err(Error::InvalidResource(format!("unknown uniform field '{}'", name)));
        };
        if value.len() > field.size {
            return Err(Error::InvalidResource(format!(
                "{} components do not fit uniform field '{}' ({})",
                value.len(), name, field.shader_type
            )));
        }

        if !self.is_created() {
            self.pending.push((name.to_string(), value));
            return Ok(());
        }

        let offset = field.element_offset;
        let components = value.components();
        self.data[offset..offset + components.len()].copy_from_slice(&components);
        self.dirty.expand(offset, offset + components.len());
        work.request_job(Job::Commit(key));
        Ok(())
    }

    /// Upload only the dirty elements, then reset the range
    pub(crate) fn commit(&mut self, gpu: &mut GpuContext<'_>, work: &mut WorkRequests) {
        let Some(handle) = self.handle else { return };
        let Some((first, last)) = self.dirty.take() else { return };

        if gpu.debug {
            engine_trace!("glint::UniformBlock", "Committing {:?} elements [{}, {})", handle, first, last);
        }

        gpu.set_buffer(BufferTarget::Uniform, Some(handle));
        gpu.device.buffer_sub_data(BufferTarget::Uniform, first * 4, bytemuck::cast_slice(&self.data[first..last]));
        work.request_render();
    }
}

#[cfg(test)]
#[path = "uniform_block_tests.rs"]
mod tests;
