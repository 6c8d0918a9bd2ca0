/// Bound-state cache - skips device calls that would not change anything
///
/// Tracks the program, vertex array, per-target buffer bindings, the last
/// bound texture, depth and cull state, and the texture unit assigned to each
/// texture. The element-array binding belongs to the vertex array, so
/// switching vertex arrays forgets it.

use rustc_hash::FxHashMap;
use crate::device::{
    Device, ProgramHandle, VertexArrayHandle, BufferHandle, TextureHandle, BufferTarget,
    DepthFunc, CullFace,
};

/// Last state submitted to the device
///
/// `None` in `depth`/`cull` means "unknown", forcing the next set through.
#[derive(Default)]
pub struct StateCache {
    program: Option<ProgramHandle>,
    vertex_array: Option<VertexArrayHandle>,
    buffers: FxHashMap<BufferTarget, BufferHandle>,
    texture: Option<TextureHandle>,
    depth: Option<Option<DepthFunc>>,
    cull: Option<Option<CullFace>>,
    texture_units: FxHashMap<TextureHandle, u32>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, texture units included
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Unit assigned to `texture`, if it was ever bound
    pub fn texture_unit(&self, texture: TextureHandle) -> Option<u32> {
        self.texture_units.get(&texture).copied()
    }

    /// Number of texture units handed out
    pub fn texture_unit_count(&self) -> u32 {
        self.texture_units.len() as u32
    }
}

/// Device plus its state cache, available while a live device is attached
pub struct GpuContext<'a> {
    pub device: &'a mut dyn Device,
    pub state: &'a mut StateCache,
    /// Verbose creation and upload tracing
    pub debug: bool,
}

impl GpuContext<'_> {
    /// Make `program` current
    pub fn set_program(&mut self, program: Option<ProgramHandle>) {
        if self.state.program != program {
            self.device.use_program(program);
            self.state.program = program;
        }
    }

    /// Bind `vertex_array` (`None` unbinds)
    pub fn set_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>) {
        if self.state.vertex_array != vertex_array {
            self.device.bind_vertex_array(vertex_array);
            self.state.vertex_array = vertex_array;
            self.state.buffers.remove(&BufferTarget::ElementArray);
        }
    }

    /// Bind `buffer` to `target`
    pub fn set_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        if self.state.buffers.get(&target).copied() != buffer {
            self.device.bind_buffer(target, buffer);
            match buffer {
                Some(handle) => { self.state.buffers.insert(target, handle); }
                None => { self.state.buffers.remove(&target); }
            }
        }
    }

    /// Bind `texture` on its unit, assigning the next unit on first use
    pub fn set_texture(&mut self, texture: TextureHandle) -> u32 {
        let next_unit = self.state.texture_units.len() as u32;
        let unit = *self.state.texture_units.entry(texture).or_insert(next_unit);
        if self.state.texture != Some(texture) {
            self.device.bind_texture(unit, texture);
            self.state.texture = Some(texture);
        }
        unit
    }

    /// Enable depth testing with `depth`, or disable it
    pub fn set_depth(&mut self, depth: Option<DepthFunc>) {
        if self.state.depth != Some(depth) {
            self.device.set_depth_test(depth);
            self.state.depth = Some(depth);
        }
    }

    /// Enable culling of `cull`, or disable it
    pub fn set_cull(&mut self, cull: Option<CullFace>) {
        if self.state.cull != Some(cull) {
            self.device.set_cull_face(cull);
            self.state.cull = Some(cull);
        }
    }
}

#[cfg(test)]
#[path = "state_cache_tests.rs"]
mod tests;
