/// Headless Device - a complete in-memory implementation (no GPU required)
///
/// Stores buffer and texture contents, reflects shader declarations by
/// parsing the source text, and records every call so tests and tools can
/// assert on exactly what the engine submitted. The handle is shared: clone
/// it before handing it to a `Renderer` to keep an inspection view.

use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::{Error, Result};
use crate::device::{
    Device, BufferHandle, TextureHandle, ShaderHandle, ProgramHandle, VertexArrayHandle,
    UniformLocation, ShaderStage, BufferTarget, BufferUsage, ElementType,
    VertexAttribLayout, DrawMode, DepthFunc, CullFace, ClearFlags,
    SamplerParameter, SamplerValue, TextureImage, TextureRegion, PixelFormat,
};

// ============================================================================
// Recorded calls
// ============================================================================

/// One call received by the headless device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    SetViewport { x: i32, y: i32, width: u32, height: u32 },
    SetClearColor([f32; 4]),
    SetClearDepth(f32),
    Clear(ClearFlags),
    SetDepthTest(Option<DepthFunc>),
    SetCullFace(Option<CullFace>),
    CreateBuffer(BufferHandle),
    BindBuffer { target: BufferTarget, buffer: Option<BufferHandle> },
    BufferData { target: BufferTarget, buffer: Option<BufferHandle>, len: usize, usage: BufferUsage },
    BufferSubData { target: BufferTarget, buffer: Option<BufferHandle>, byte_offset: usize, len: usize },
    BindBufferBase { bind_index: u32, buffer: BufferHandle },
    CreateTexture(TextureHandle),
    BindTexture { unit: u32, texture: TextureHandle },
    TexParameter { parameter: SamplerParameter, value: SamplerValue },
    TexImage2D { texture: Option<TextureHandle>, width: u32, height: u32, len: usize },
    TexSubImage2D { texture: Option<TextureHandle>, region: TextureRegion, len: usize },
    CompileShader { stage: ShaderStage, shader: Option<ShaderHandle> },
    LinkProgram(Option<ProgramHandle>),
    UseProgram(Option<ProgramHandle>),
    UniformBlockBinding { program: ProgramHandle, block_index: u32, bind_index: u32 },
    SetUniformI32 { location: UniformLocation, value: i32 },
    CreateVertexArray(VertexArrayHandle),
    BindVertexArray(Option<VertexArrayHandle>),
    VertexAttribPointer { location: u32, buffer: Option<BufferHandle>, layout: VertexAttribLayout },
    DrawArraysInstanced { mode: DrawMode, first: u32, count: u32, instances: u32 },
    DrawElementsInstanced { mode: DrawMode, count: u32, index_type: ElementType, byte_offset: usize, instances: u32 },
}

impl DeviceCall {
    /// Whether this call is one of the two draw entry points
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            DeviceCall::DrawArraysInstanced { .. } | DeviceCall::DrawElementsInstanced { .. }
        )
    }
}

// ============================================================================
// Internal state
// ============================================================================

/// Declarations found in one shader source
#[derive(Debug, Clone, Default)]
struct Reflection {
    attributes: Vec<String>,
    blocks: Vec<String>,
    uniforms: Vec<String>,
}

impl Reflection {
    fn parse(stage: ShaderStage, source: &str) -> Self {
        let mut reflection = Reflection::default();
        for line in source.lines().map(str::trim) {
            if let Some(rest) = line.strip_prefix("layout(std140) uniform ") {
                if let Some(name) = rest.split(|c: char| c == '{' || c.is_whitespace()).next() {
                    if !name.is_empty() {
                        reflection.blocks.push(name.to_string());
                    }
                }
            } else if let Some(rest) = line.strip_prefix("uniform ") {
                if let Some(name) = last_identifier(rest) {
                    reflection.uniforms.push(name);
                }
            } else if let Some(rest) = line.strip_prefix("in ") {
                // Fragment inputs are varyings, not vertex attributes
                if stage == ShaderStage::Vertex {
                    if let Some(name) = last_identifier(rest) {
                        reflection.attributes.push(name);
                    }
                }
            }
        }
        reflection
    }
}

/// `"vec3 position;"` -> `"position"`
fn last_identifier(declaration: &str) -> Option<String> {
    let name = declaration.trim_end_matches(';').split_whitespace().last()?;
    Some(name.to_string())
}

#[derive(Debug, Clone)]
struct HeadlessShader {
    reflection: Reflection,
}

#[derive(Debug, Clone, Default)]
struct HeadlessProgram {
    attributes: Vec<String>,
    blocks: Vec<String>,
    uniforms: Vec<String>,
    block_bindings: FxHashMap<u32, u32>,
}

/// Stored texture image
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessTexture {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixel_type: ElementType,
    pub data: Vec<u8>,
    pub parameters: Vec<(SamplerParameter, SamplerValue)>,
}

impl HeadlessTexture {
    fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            format: PixelFormat::Rgba,
            pixel_type: ElementType::UnsignedByte,
            data: Vec::new(),
            parameters: Vec::new(),
        }
    }

    fn bytes_per_pixel(&self) -> usize {
        self.format.channels() * self.pixel_type.size_bytes()
    }
}

#[derive(Default)]
struct HeadlessState {
    next_name: u32,
    buffers: FxHashMap<BufferHandle, Vec<u8>>,
    textures: FxHashMap<TextureHandle, HeadlessTexture>,
    shaders: FxHashMap<ShaderHandle, HeadlessShader>,
    programs: FxHashMap<ProgramHandle, HeadlessProgram>,
    vertex_arrays: FxHashMap<VertexArrayHandle, FxHashMap<u32, (BufferHandle, VertexAttribLayout)>>,
    bound_buffers: FxHashMap<BufferTarget, BufferHandle>,
    unit_textures: FxHashMap<u32, TextureHandle>,
    active_unit: u32,
    uniform_bindings: FxHashMap<u32, BufferHandle>,
    uniform_values: FxHashMap<(ProgramHandle, UniformLocation), i32>,
    current_program: Option<ProgramHandle>,
    current_vertex_array: Option<VertexArrayHandle>,
    viewport: (i32, i32, u32, u32),
    depth_test: Option<DepthFunc>,
    cull_face: Option<CullFace>,
    optimized_out: FxHashSet<String>,
    fail_compile_marker: Option<String>,
    fail_link_log: Option<String>,
    allocation_limit: Option<usize>,
    calls: Vec<DeviceCall>,
}

impl HeadlessState {
    fn next_name(&mut self) -> u32 {
        // GL reserves name 0
        self.next_name += 1;
        self.next_name
    }

    /// Buffers and textures count against the allocation limit
    fn reserve(&self) -> Result<()> {
        match self.allocation_limit {
            Some(limit) if self.buffers.len() + self.textures.len() >= limit => Err(Error::OutOfMemory),
            _ => Ok(()),
        }
    }

    fn bound_texture(&self) -> Option<TextureHandle> {
        self.unit_textures.get(&self.active_unit).copied()
    }

    fn program(&self, program: ProgramHandle) -> Option<&HeadlessProgram> {
        self.programs.get(&program)
    }
}

// ============================================================================
// HeadlessDevice
// ============================================================================

/// In-memory `Device`
#[derive(Clone, Default)]
pub struct HeadlessDevice {
    inner: Arc<Mutex<HeadlessState>>,
}

impl HeadlessDevice {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ===== BEHAVIOR CONTROL =====

    /// Report `name` as inactive in every program linked from now on
    pub fn optimize_out(&self, name: &str) {
        self.state().optimized_out.insert(name.to_string());
    }

    /// Fail every compilation whose source contains `marker`
    pub fn fail_compile_on(&self, marker: &str) {
        self.state().fail_compile_marker = Some(marker.to_string());
    }

    /// Fail every link with `log` (`None` restores normal linking)
    pub fn fail_link_with(&self, log: Option<&str>) {
        self.state().fail_link_log = log.map(str::to_string);
    }

    /// Fail buffer and texture creation once `limit` of them are alive
    pub fn limit_allocations(&self, limit: Option<usize>) {
        self.state().allocation_limit = limit;
    }

    /// Drop every object, as a lost context does
    ///
    /// The call log and the behavior controls are kept.
    pub fn lose_context(&self) {
        let mut state = self.state();
        state.buffers.clear();
        state.textures.clear();
        state.shaders.clear();
        state.programs.clear();
        state.vertex_arrays.clear();
        state.bound_buffers.clear();
        state.unit_textures.clear();
        state.active_unit = 0;
        state.uniform_bindings.clear();
        state.uniform_values.clear();
        state.current_program = None;
        state.current_vertex_array = None;
        state.depth_test = None;
        state.cull_face = None;
    }

    // ===== INSPECTION =====

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state().calls.clone()
    }

    /// Forget the recorded calls
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Recorded draw calls
    pub fn draw_calls(&self) -> Vec<DeviceCall> {
        self.state().calls.iter().filter(|c| c.is_draw()).cloned().collect()
    }

    /// Recorded partial buffer uploads as `(buffer, byte_offset, len)`
    pub fn sub_data_uploads(&self) -> Vec<(Option<BufferHandle>, usize, usize)> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::BufferSubData { buffer, byte_offset, len, .. } => Some((*buffer, *byte_offset, *len)),
                _ => None,
            })
            .collect()
    }

    /// Number of `compile_shader` calls received
    pub fn compile_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::CompileShader { .. }))
            .count()
    }

    /// Number of live buffers
    pub fn buffer_count(&self) -> usize {
        self.state().buffers.len()
    }

    /// Number of live textures
    pub fn texture_count(&self) -> usize {
        self.state().textures.len()
    }

    /// Number of live compiled shaders
    pub fn shader_count(&self) -> usize {
        self.state().shaders.len()
    }

    /// Number of live linked programs
    pub fn program_count(&self) -> usize {
        self.state().programs.len()
    }

    /// Contents of a buffer
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state().buffers.get(&buffer).cloned()
    }

    /// Contents of a buffer read back as `f32`
    pub fn buffer_floats(&self, buffer: BufferHandle) -> Option<Vec<f32>> {
        let bytes = self.buffer_contents(buffer)?;
        Some(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }

    /// Stored image of a texture
    pub fn texture(&self, texture: TextureHandle) -> Option<HeadlessTexture> {
        self.state().textures.get(&texture).cloned()
    }

    /// Buffer currently bound to `target`
    pub fn bound_buffer(&self, target: BufferTarget) -> Option<BufferHandle> {
        self.state().bound_buffers.get(&target).copied()
    }

    /// Buffer attached to a uniform binding point
    pub fn uniform_binding(&self, bind_index: u32) -> Option<BufferHandle> {
        self.state().uniform_bindings.get(&bind_index).copied()
    }

    /// Binding point a program routes its block `block_index` to
    pub fn block_binding(&self, program: ProgramHandle, block_index: u32) -> Option<u32> {
        self.state()
            .program(program)
            .and_then(|p| p.block_bindings.get(&block_index).copied())
    }

    /// Integer uniform value set on a program
    pub fn uniform_value(&self, program: ProgramHandle, location: UniformLocation) -> Option<i32> {
        self.state().uniform_values.get(&(program, location)).copied()
    }

    /// Program currently in use
    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.state().current_program
    }

    /// Buffer and layout captured for `location` by a vertex array
    pub fn vertex_attrib(
        &self,
        vertex_array: VertexArrayHandle,
        location: u32,
    ) -> Option<(BufferHandle, VertexAttribLayout)> {
        self.state()
            .vertex_arrays
            .get(&vertex_array)
            .and_then(|attribs| attribs.get(&location).copied())
    }

    /// Current viewport as `(x, y, width, height)`
    pub fn viewport(&self) -> (i32, i32, u32, u32) {
        self.state().viewport
    }

    /// Current depth test state
    pub fn depth_test(&self) -> Option<DepthFunc> {
        self.state().depth_test
    }

    /// Current cull state
    pub fn cull_face(&self) -> Option<CullFace> {
        self.state().cull_face
    }
}

impl Device for HeadlessDevice {
    // ===== FRAME STATE =====

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        let mut state = self.state();
        state.viewport = (x, y, width, height);
        state.calls.push(DeviceCall::SetViewport { x, y, width, height });
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.state().calls.push(DeviceCall::SetClearColor(color));
    }

    fn set_clear_depth(&mut self, depth: f32) {
        self.state().calls.push(DeviceCall::SetClearDepth(depth));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.state().calls.push(DeviceCall::Clear(flags));
    }

    fn set_depth_test(&mut self, func: Option<DepthFunc>) {
        let mut state = self.state();
        state.depth_test = func;
        state.calls.push(DeviceCall::SetDepthTest(func));
    }

    fn set_cull_face(&mut self, face: Option<CullFace>) {
        let mut state = self.state();
        state.cull_face = face;
        state.calls.push(DeviceCall::SetCullFace(face));
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self) -> Result<BufferHandle> {
        let mut state = self.state();
        state.reserve()?;
        let handle = BufferHandle(state.next_name());
        state.buffers.insert(handle, Vec::new());
        state.calls.push(DeviceCall::CreateBuffer(handle));
        Ok(handle)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let mut state = self.state();
        match buffer {
            Some(handle) => { state.bound_buffers.insert(target, handle); }
            None => { state.bound_buffers.remove(&target); }
        }
        state.calls.push(DeviceCall::BindBuffer { target, buffer });
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let mut state = self.state();
        let buffer = state.bound_buffers.get(&target).copied();
        if let Some(store) = buffer.and_then(|b| state.buffers.get_mut(&b)) {
            *store = data.to_vec();
        }
        state.calls.push(DeviceCall::BufferData { target, buffer, len: data.len(), usage });
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, byte_offset: usize, data: &[u8]) {
        let mut state = self.state();
        let buffer = state.bound_buffers.get(&target).copied();
        if let Some(store) = buffer.and_then(|b| state.buffers.get_mut(&b)) {
            // Writes past the end are dropped, GL rejects them outright
            let end = (byte_offset + data.len()).min(store.len());
            if byte_offset < end {
                store[byte_offset..end].copy_from_slice(&data[..end - byte_offset]);
            }
        }
        state.calls.push(DeviceCall::BufferSubData { target, buffer, byte_offset, len: data.len() });
    }

    fn bind_buffer_base(&mut self, bind_index: u32, buffer: BufferHandle) {
        let mut state = self.state();
        state.uniform_bindings.insert(bind_index, buffer);
        state.bound_buffers.insert(BufferTarget::Uniform, buffer);
        state.calls.push(DeviceCall::BindBufferBase { bind_index, buffer });
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self) -> Result<TextureHandle> {
        let mut state = self.state();
        state.reserve()?;
        let handle = TextureHandle(state.next_name());
        state.textures.insert(handle, HeadlessTexture::empty());
        state.calls.push(DeviceCall::CreateTexture(handle));
        Ok(handle)
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        let mut state = self.state();
        state.active_unit = unit;
        state.unit_textures.insert(unit, texture);
        state.calls.push(DeviceCall::BindTexture { unit, texture });
    }

    fn tex_parameter(&mut self, parameter: SamplerParameter, value: SamplerValue) {
        let mut state = self.state();
        if let Some(texture) = state.bound_texture() {
            if let Some(stored) = state.textures.get_mut(&texture) {
                stored.parameters.retain(|(p, _)| *p != parameter);
                stored.parameters.push((parameter, value));
            }
        }
        state.calls.push(DeviceCall::TexParameter { parameter, value });
    }

    fn tex_image_2d(&mut self, image: &TextureImage<'_>) {
        let mut state = self.state();
        let texture = state.bound_texture();
        if let Some(stored) = texture.and_then(|t| state.textures.get_mut(&t)) {
            stored.width = image.width;
            stored.height = image.height;
            stored.format = image.format;
            stored.pixel_type = image.pixel_type;
            stored.data = image.data.to_vec();
        }
        state.calls.push(DeviceCall::TexImage2D {
            texture,
            width: image.width,
            height: image.height,
            len: image.data.len(),
        });
    }

    fn tex_sub_image_2d(
        &mut self,
        _level: u32,
        region: TextureRegion,
        format: PixelFormat,
        pixel_type: ElementType,
        data: &[u8],
    ) {
        let mut state = self.state();
        let texture = state.bound_texture();
        if let Some(stored) = texture.and_then(|t| state.textures.get_mut(&t)) {
            stored.format = format;
            stored.pixel_type = pixel_type;
            let bpp = stored.bytes_per_pixel();
            let row_len = region.width as usize * bpp;
            for row in 0..region.height as usize {
                let y = region.y as usize + row;
                if y >= stored.height as usize || region.x + region.width > stored.width {
                    break;
                }
                let dst = (y * stored.width as usize + region.x as usize) * bpp;
                let src = row * row_len;
                if src + row_len > data.len() || dst + row_len > stored.data.len() {
                    break;
                }
                stored.data[dst..dst + row_len].copy_from_slice(&data[src..src + row_len]);
            }
        }
        state.calls.push(DeviceCall::TexSubImage2D { texture, region, len: data.len() });
    }

    // ===== SHADERS AND PROGRAMS =====

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle> {
        let mut state = self.state();
        if let Some(marker) = state.fail_compile_marker.clone() {
            if let Some(index) = source.lines().position(|line| line.contains(marker.as_str())) {
                state.calls.push(DeviceCall::CompileShader { stage, shader: None });
                return Err(Error::ShaderCompilationFailed {
                    stage,
                    log: format!("ERROR: 0:{}: '{}' : syntax error", index + 1, marker),
                });
            }
        }
        let handle = ShaderHandle(state.next_name());
        state.shaders.insert(handle, HeadlessShader { reflection: Reflection::parse(stage, source) });
        state.calls.push(DeviceCall::CompileShader { stage, shader: Some(handle) });
        Ok(handle)
    }

    fn link_program(&mut self, vertex: ShaderHandle, fragment: ShaderHandle) -> Result<ProgramHandle> {
        let mut state = self.state();
        if let Some(log) = state.fail_link_log.clone() {
            state.calls.push(DeviceCall::LinkProgram(None));
            return Err(Error::ProgramLinkFailed(log));
        }
        let vs = state.shaders.get(&vertex).cloned();
        let fs = state.shaders.get(&fragment).cloned();
        let (Some(vs), Some(fs)) = (vs, fs) else {
            state.calls.push(DeviceCall::LinkProgram(None));
            return Err(Error::ProgramLinkFailed("unknown shader object".to_string()));
        };

        let active = |names: &[String], out: &mut Vec<String>, skip: &FxHashSet<String>| {
            for name in names {
                if !skip.contains(name) && !out.contains(name) {
                    out.push(name.clone());
                }
            }
        };
        let mut program = HeadlessProgram::default();
        active(&vs.reflection.attributes, &mut program.attributes, &state.optimized_out);
        active(&vs.reflection.blocks, &mut program.blocks, &state.optimized_out);
        active(&fs.reflection.blocks, &mut program.blocks, &state.optimized_out);
        active(&vs.reflection.uniforms, &mut program.uniforms, &state.optimized_out);
        active(&fs.reflection.uniforms, &mut program.uniforms, &state.optimized_out);

        let handle = ProgramHandle(state.next_name());
        state.programs.insert(handle, program);
        state.calls.push(DeviceCall::LinkProgram(Some(handle)));
        Ok(handle)
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        let mut state = self.state();
        state.current_program = program;
        state.calls.push(DeviceCall::UseProgram(program));
    }

    fn active_attributes(&self, program: ProgramHandle) -> Vec<String> {
        self.state().program(program).map(|p| p.attributes.clone()).unwrap_or_default()
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let state = self.state();
        let index = state.program(program)?.attributes.iter().position(|a| a == name)?;
        Some(index as u32)
    }

    fn active_uniform_blocks(&self, program: ProgramHandle) -> Vec<String> {
        self.state().program(program).map(|p| p.blocks.clone()).unwrap_or_default()
    }

    fn uniform_block_index(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let state = self.state();
        let index = state.program(program)?.blocks.iter().position(|b| b == name)?;
        Some(index as u32)
    }

    fn uniform_block_binding(&mut self, program: ProgramHandle, block_index: u32, bind_index: u32) {
        let mut state = self.state();
        if let Some(stored) = state.programs.get_mut(&program) {
            stored.block_bindings.insert(block_index, bind_index);
        }
        state.calls.push(DeviceCall::UniformBlockBinding { program, block_index, bind_index });
    }

    fn active_uniforms(&self, program: ProgramHandle) -> Vec<String> {
        self.state().program(program).map(|p| p.uniforms.clone()).unwrap_or_default()
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let state = self.state();
        let index = state.program(program)?.uniforms.iter().position(|u| u == name)?;
        Some(UniformLocation(index as u32))
    }

    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32) {
        let mut state = self.state();
        if let Some(program) = state.current_program {
            state.uniform_values.insert((program, location), value);
        }
        state.calls.push(DeviceCall::SetUniformI32 { location, value });
    }

    // ===== VERTEX ARRAYS =====

    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle> {
        let mut state = self.state();
        let handle = VertexArrayHandle(state.next_name());
        state.vertex_arrays.insert(handle, FxHashMap::default());
        state.calls.push(DeviceCall::CreateVertexArray(handle));
        Ok(handle)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>) {
        let mut state = self.state();
        state.current_vertex_array = vertex_array;
        // The element binding is vertex array state
        state.bound_buffers.remove(&BufferTarget::ElementArray);
        state.calls.push(DeviceCall::BindVertexArray(vertex_array));
    }

    fn vertex_attrib_pointer(&mut self, location: u32, layout: VertexAttribLayout) {
        let mut state = self.state();
        let buffer = state.bound_buffers.get(&BufferTarget::Array).copied();
        if let (Some(vao), Some(buffer)) = (state.current_vertex_array, buffer) {
            if let Some(attribs) = state.vertex_arrays.get_mut(&vao) {
                attribs.insert(location, (buffer, layout));
            }
        }
        state.calls.push(DeviceCall::VertexAttribPointer { location, buffer, layout });
    }

    // ===== DRAWS =====

    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: u32, count: u32, instances: u32) {
        self.state().calls.push(DeviceCall::DrawArraysInstanced { mode, first, count, instances });
    }

    fn draw_elements_instanced(
        &mut self,
        mode: DrawMode,
        count: u32,
        index_type: ElementType,
        byte_offset: usize,
        instances: u32,
    ) {
        self.state().calls.push(DeviceCall::DrawElementsInstanced {
            mode,
            count,
            index_type,
            byte_offset,
            instances,
        });
    }
}

#[cfg(test)]
#[path = "headless_tests.rs"]
mod tests;
