/// Device trait - the graphics context the engine drives
///
/// The host owns the real graphics context (a WebGL2/GLES3 style API, a
/// wrapper over a native driver, or the in-memory `HeadlessDevice`) and hands
/// it to a `Renderer` session. The engine only calls into this surface; it
/// never manages the context lifetime beyond loss/restore notifications.

use crate::error::Result;
use crate::device::{
    BufferHandle, TextureHandle, ShaderHandle, ProgramHandle, VertexArrayHandle,
    UniformLocation, ShaderStage, BufferTarget, BufferUsage, ElementType,
    VertexAttribLayout, DrawMode, DepthFunc, CullFace, ClearFlags,
    SamplerParameter, SamplerValue, TextureImage, TextureRegion, PixelFormat,
};

/// Graphics device interface
///
/// Binding-point semantics follow GL: `buffer_data` and `buffer_sub_data`
/// act on the buffer currently bound to `target`, texture calls act on the
/// texture bound to the active unit, and `vertex_attrib_pointer` captures the
/// buffer bound to `BufferTarget::Array` into the bound vertex array.
pub trait Device: Send {
    // ===== FRAME STATE =====

    /// Set the drawable viewport
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Set the color used by `clear`
    fn set_clear_color(&mut self, color: [f32; 4]);

    /// Set the depth used by `clear`
    fn set_clear_depth(&mut self, depth: f32);

    /// Clear the selected buffers of the drawable
    fn clear(&mut self, flags: ClearFlags);

    /// Enable depth testing with `func`, or disable it with `None`
    fn set_depth_test(&mut self, func: Option<DepthFunc>);

    /// Enable face culling of `face`, or disable it with `None`
    fn set_cull_face(&mut self, face: Option<CullFace>);

    // ===== BUFFERS =====

    /// Allocate a new buffer object
    fn create_buffer(&mut self) -> Result<BufferHandle>;

    /// Bind a buffer to a target (`None` unbinds)
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>);

    /// Replace the whole store of the buffer bound to `target`
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    /// Overwrite part of the store of the buffer bound to `target`
    fn buffer_sub_data(&mut self, target: BufferTarget, byte_offset: usize, data: &[u8]);

    /// Attach a uniform buffer to an indexed uniform binding point
    fn bind_buffer_base(&mut self, bind_index: u32, buffer: BufferHandle);

    // ===== TEXTURES =====

    /// Allocate a new texture object
    fn create_texture(&mut self) -> Result<TextureHandle>;

    /// Make `unit` active and bind `texture` to it
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Set a sampler parameter on the bound texture
    fn tex_parameter(&mut self, parameter: SamplerParameter, value: SamplerValue);

    /// Specify a full 2D image for the bound texture
    fn tex_image_2d(&mut self, image: &TextureImage<'_>);

    /// Overwrite a sub-rectangle of the bound texture
    fn tex_sub_image_2d(
        &mut self,
        level: u32,
        region: TextureRegion,
        format: PixelFormat,
        pixel_type: ElementType,
        data: &[u8],
    );

    // ===== SHADERS AND PROGRAMS =====

    /// Compile one shader stage
    ///
    /// Fails with `Error::ShaderCompilationFailed` carrying the compiler log.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle>;

    /// Link a program from a vertex and a fragment shader
    ///
    /// Fails with `Error::ProgramLinkFailed` carrying the linker log.
    fn link_program(&mut self, vertex: ShaderHandle, fragment: ShaderHandle) -> Result<ProgramHandle>;

    /// Make a program current (`None` unbinds)
    fn use_program(&mut self, program: Option<ProgramHandle>);

    /// Names of the attributes the linker kept active
    fn active_attributes(&self, program: ProgramHandle) -> Vec<String>;

    /// Location of an active attribute
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Names of the active uniform blocks
    fn active_uniform_blocks(&self, program: ProgramHandle) -> Vec<String>;

    /// Index of an active uniform block
    fn uniform_block_index(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Route a uniform block to an indexed binding point
    fn uniform_block_binding(&mut self, program: ProgramHandle, block_index: u32, bind_index: u32);

    /// Names of the active uniforms that live outside any block (samplers)
    fn active_uniforms(&self, program: ProgramHandle) -> Vec<String>;

    /// Location of an active non-block uniform
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Set an integer uniform on the current program
    fn set_uniform_i32(&mut self, location: UniformLocation, value: i32);

    // ===== VERTEX ARRAYS =====

    /// Allocate a new vertex array object
    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle>;

    /// Bind a vertex array (`None` unbinds)
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>);

    /// Enable `location` and source it from the buffer bound to `BufferTarget::Array`
    fn vertex_attrib_pointer(&mut self, location: u32, layout: VertexAttribLayout);

    // ===== DRAWS =====

    /// Non-indexed instanced draw
    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: u32, count: u32, instances: u32);

    /// Indexed instanced draw from the bound element buffer
    fn draw_elements_instanced(
        &mut self,
        mode: DrawMode,
        count: u32,
        index_type: ElementType,
        byte_offset: usize,
        instances: u32,
    );
}
