/// Vertex, instance and element buffers with dirty-range commits.
///
/// Architecture:
/// - Shadow copy: every buffer keeps its contents in a `TypedArray`
/// - Refill: replaces the contents, recounts, and re-uploads the whole store
/// - Update: writes into the shadow copy and widens the dirty range; one
///   `Job::Commit` per tick uploads exactly the dirty elements
/// - Before creation, refills and updates queue in call order and replay
///   right after the GPU buffer exists

use crate::error::{Error, Result};
use crate::device::{BufferHandle, BufferTarget, BufferUsage, ElementType};
use crate::resource::{Value, ValueLayout, TypedArray, DirtyRange, BufferDesc, ResourceKey};
use crate::resource::typed_array::check_write;
use crate::command::CommandKey;
use crate::renderer::{GpuContext, Job, WorkRequests};
use crate::{engine_debug, engine_trace, engine_warn};

// ===== PENDING OPERATIONS =====

#[derive(Debug, Clone)]
enum PendingBufferOp {
    Refill(TypedArray),
    Update(Value, usize),
}

// ===== BUFFER RESOURCE =====

/// GPU buffer bound as vertex attributes or indices
#[derive(Debug)]
pub struct BufferResource {
    target: BufferTarget,
    instanced: bool,
    layout: ValueLayout,
    initial: TypedArray,
    data: TypedArray,
    count: usize,
    handle: Option<BufferHandle>,
    dirty: DirtyRange,
    pending: Vec<PendingBufferOp>,
}

impl BufferResource {
    /// Shared per-vertex buffer; the first vertex decides the layout
    pub fn from_desc(desc: &BufferDesc) -> Result<Self> {
        let sample = desc.vertices.first().ok_or_else(|| {
            Error::UnknownResourceKind("buffer descriptor has no vertices".to_string())
        })?;
        let layout = sample.layout()?;

        // ========== VALIDATION ==========
        for (index, vertex) in desc.vertices.iter().enumerate() {
            if vertex.element_type() != layout.element_type || vertex.len() != layout.dimensions {
                return Err(Error::UnknownResourceKind(format!(
                    "vertex {} does not match the {} layout of vertex 0",
                    index, layout.shader_type
                )));
            }
        }

        let initial = TypedArray::flatten(layout.element_type, &desc.vertices);
        Ok(Self::with_layout(BufferTarget::Array, false, layout, initial))
    }

    /// Per-command instance attribute buffer, seeded with one default value
    pub fn instanced(default_value: &Value) -> Result<Self> {
        let layout = default_value.layout()?;
        let initial = TypedArray::flatten(layout.element_type, std::slice::from_ref(default_value));
        Ok(Self::with_layout(BufferTarget::Array, true, layout, initial))
    }

    /// Per-command index buffer
    pub fn elements(indices: &[u16]) -> Self {
        let layout = ValueLayout {
            element_type: ElementType::UnsignedShort,
            shader_type: "int".to_string(),
            dimensions: 1,
        };
        Self::with_layout(BufferTarget::ElementArray, false, layout, TypedArray::U16(indices.to_vec()))
    }

    fn with_layout(target: BufferTarget, instanced: bool, layout: ValueLayout, initial: TypedArray) -> Self {
        let count = initial.len() / layout.dimensions;
        Self {
            target,
            instanced,
            layout,
            data: initial.clone(),
            initial,
            count,
            handle: None,
            dirty: DirtyRange::new(),
            pending: Vec::new(),
        }
    }

    // ===== ACCESSORS =====

    pub fn target(&self) -> BufferTarget { self.target }

    pub fn is_instanced(&self) -> bool { self.instanced }

    pub fn element_type(&self) -> ElementType { self.layout.element_type }

    pub fn shader_type(&self) -> &str { &self.layout.shader_type }

    pub fn dimensions(&self) -> usize { self.layout.dimensions }

    /// Number of whole vertices (or instances) in the shadow copy
    pub fn count(&self) -> usize { self.count }

    /// Shadow copy of the contents
    pub fn data(&self) -> &TypedArray { &self.data }

    pub fn handle(&self) -> Option<BufferHandle> { self.handle }

    pub fn is_created(&self) -> bool { self.handle.is_some() }

    /// Dirty element range waiting for a commit
    pub fn dirty_range(&self) -> Option<(usize, usize)> { self.dirty.bounds() }

    /// Number of operations queued before creation
    pub fn pending_len(&self) -> usize { self.pending.len() }

    /// Length the shadow copy will have once the queue has replayed
    fn queued_len(&self) -> usize {
        self.pending
            .iter()
            .rev()
            .find_map(|op| match op {
                PendingBufferOp::Refill(data) => Some(data.len()),
                PendingBufferOp::Update(..) => None,
            })
            .unwrap_or(self.initial.len())
    }

    fn usage(&self) -> BufferUsage {
        if self.instanced { BufferUsage::DynamicDraw } else { BufferUsage::StaticDraw }
    }

    // ===== LIFECYCLE =====

    /// Allocate the GPU buffer, upload the descriptor contents, replay the queue
    pub(crate) fn create(
        &mut self,
        key: ResourceKey,
        gpu: &mut GpuContext<'_>,
        work: &mut WorkRequests,
        bound: &[CommandKey],
    ) -> Result<()> {
        let handle = gpu.device.create_buffer()?;
        self.handle = Some(handle);
        self.dirty = DirtyRange::new();
        gpu.set_buffer(self.target, Some(handle));

        self.refill(Some(&mut *gpu), work, bound, self.initial.clone())?;
        work.request_render();

        // a rejected op is skipped so the ones queued after it still land
        for op in std::mem::take(&mut self.pending) {
            let replayed = match op {
                PendingBufferOp::Refill(data) => self.refill(Some(&mut *gpu), work, bound, data),
                PendingBufferOp::Update(value, offset) => self.update(key, work, value, offset),
            };
            if let Err(error) = replayed {
                engine_warn!("glint::Buffer", "Dropped queued write to {:?}: {}", handle, error);
            }
        }

        if gpu.debug {
            engine_debug!("glint::Buffer", "Created {} buffer {:?} ({} x {})",
                if self.instanced { "instance" } else { "context" },
                handle, self.count, self.layout.shader_type);
        }
        Ok(())
    }

    /// Forget the GPU buffer (context lost); the shadow copy is kept
    pub(crate) fn destroy(&mut self) {
        self.handle = None;
        self.dirty = DirtyRange::new();
    }

    // ===== WRITES =====

    /// Replace the whole contents
    ///
    /// Recounts vertices, asks every bound command to recount, and uploads
    /// the full store. Queued when the buffer is not created yet.
    pub(crate) fn refill(
        &mut self,
        gpu: Option<&mut GpuContext<'_>>,
        work: &mut WorkRequests,
        bound: &[CommandKey],
        data: TypedArray,
    ) -> Result<()> {
        if data.element_type() != self.layout.element_type {
            return Err(Error::InvalidResource(format!(
                "refill with {:?} data into a {:?} buffer",
                data.element_type(),
                self.layout.element_type
            )));
        }

        let (Some(handle), Some(gpu)) = (self.handle, gpu) else {
            self.pending.push(PendingBufferOp::Refill(data));
            return Ok(());
        };

        self.count = data.len() / self.layout.dimensions;
        self.data = data;
        self.dirty = DirtyRange::new();

        for command in bound {
            work.request_job(Job::CountVertices(*command));
        }

        gpu.set_buffer(self.target, Some(handle));
        gpu.device.buffer_data(self.target, self.data.as_bytes(), self.usage());
        work.request_render();
        Ok(())
    }

    /// Write `value` at element `offset` and schedule one coalesced commit
    pub(crate) fn update(
        &mut self,
        key: ResourceKey,
        work: &mut WorkRequests,
        value: Value,
        offset: usize,
    ) -> Result<()> {
        if !self.is_created() {
            check_write(offset, value.len(), self.queued_len())?;
            self.pending.push(PendingBufferOp::Update(value, offset));
            return Ok(());
        }

        self.data.write(offset, &value)?;
        self.dirty.expand(offset, offset + value.len());
        work.request_job(Job::Commit(key));
        Ok(())
    }

    /// Upload exactly the dirty elements, then reset the range
    pub(crate) fn commit(&mut self, gpu: &mut GpuContext<'_>, work: &mut WorkRequests) {
        let Some(handle) = self.handle else { return };
        let Some((first, last)) = self.dirty.take() else { return };

        if gpu.debug {
            engine_trace!("glint::Buffer", "Committing {:?} elements [{}, {})", handle, first, last);
        }

        let element_size = self.layout.element_type.size_bytes();
        gpu.set_buffer(self.target, Some(handle));
        gpu.device.buffer_sub_data(self.target, first * element_size, self.data.byte_range(first, last));
        work.request_render();
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
