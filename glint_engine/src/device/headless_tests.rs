/// Unit tests for HeadlessDevice
///
/// Covers storage, binding-point semantics, source reflection and the
/// failure controls the engine tests rely on.

use super::*;

const VERTEX: &str = "#version 300 es
precision highp float;
in vec3 position;
in vec4 color;
layout(std140) uniform Camera {
  mat4 projection;
};
uniform sampler2D atlas;
void main() { gl_Position = vec4(position, 1.0); }";

const FRAGMENT: &str = "#version 300 es
precision highp float;
layout(std140) uniform Camera {
  mat4 projection;
};
uniform sampler2D atlas;
in vec4 v_color;
out vec4 fragColor;
void main() { fragColor = v_color; }";

fn linked(device: &mut HeadlessDevice) -> ProgramHandle {
    let vs = device.compile_shader(ShaderStage::Vertex, VERTEX).unwrap();
    let fs = device.compile_shader(ShaderStage::Fragment, FRAGMENT).unwrap();
    device.link_program(vs, fs).unwrap()
}

// ============================================================================
// Buffers
// ============================================================================

#[test]
fn test_buffer_data_targets_bound_buffer() {
    let mut device = HeadlessDevice::new();
    let a = device.create_buffer().unwrap();
    let b = device.create_buffer().unwrap();
    assert_ne!(a, b);

    device.bind_buffer(BufferTarget::Array, Some(a));
    device.buffer_data(BufferTarget::Array, &[1, 2, 3, 4], BufferUsage::StaticDraw);

    assert_eq!(device.buffer_contents(a), Some(vec![1, 2, 3, 4]));
    assert_eq!(device.buffer_contents(b), Some(vec![]));
    assert_eq!(device.buffer_count(), 2);
}

#[test]
fn test_buffer_sub_data_overwrites_range() {
    let mut device = HeadlessDevice::new();
    let a = device.create_buffer().unwrap();
    device.bind_buffer(BufferTarget::Array, Some(a));
    device.buffer_data(BufferTarget::Array, &[0; 8], BufferUsage::DynamicDraw);
    device.buffer_sub_data(BufferTarget::Array, 2, &[9, 9, 9]);

    assert_eq!(device.buffer_contents(a), Some(vec![0, 0, 9, 9, 9, 0, 0, 0]));
    assert_eq!(device.sub_data_uploads(), vec![(Some(a), 2, 3)]);
}

#[test]
fn test_buffer_sub_data_past_end_is_clipped() {
    let mut device = HeadlessDevice::new();
    let a = device.create_buffer().unwrap();
    device.bind_buffer(BufferTarget::Array, Some(a));
    device.buffer_data(BufferTarget::Array, &[0; 4], BufferUsage::DynamicDraw);
    device.buffer_sub_data(BufferTarget::Array, 2, &[7, 7, 7, 7]);

    assert_eq!(device.buffer_contents(a), Some(vec![0, 0, 7, 7]));
}

#[test]
fn test_buffer_floats_reads_back() {
    let mut device = HeadlessDevice::new();
    let a = device.create_buffer().unwrap();
    device.bind_buffer(BufferTarget::Array, Some(a));
    let data: Vec<u8> = [1.5f32, -2.0].iter().flat_map(|f| f.to_ne_bytes()).collect();
    device.buffer_data(BufferTarget::Array, &data, BufferUsage::StaticDraw);

    assert_eq!(device.buffer_floats(a), Some(vec![1.5, -2.0]));
}

#[test]
fn test_bind_vertex_array_resets_element_binding() {
    let mut device = HeadlessDevice::new();
    let vao = device.create_vertex_array().unwrap();
    let elements = device.create_buffer().unwrap();
    device.bind_buffer(BufferTarget::ElementArray, Some(elements));
    assert_eq!(device.bound_buffer(BufferTarget::ElementArray), Some(elements));

    device.bind_vertex_array(Some(vao));
    assert_eq!(device.bound_buffer(BufferTarget::ElementArray), None);
}

#[test]
fn test_vertex_attrib_pointer_captures_array_buffer() {
    let mut device = HeadlessDevice::new();
    let vao = device.create_vertex_array().unwrap();
    let buffer = device.create_buffer().unwrap();
    device.bind_vertex_array(Some(vao));
    device.bind_buffer(BufferTarget::Array, Some(buffer));

    let layout = VertexAttribLayout { dimensions: 3, element_type: ElementType::Float, divisor: 1 };
    device.vertex_attrib_pointer(2, layout);

    assert_eq!(device.vertex_attrib(vao, 2), Some((buffer, layout)));
    assert_eq!(device.vertex_attrib(vao, 0), None);
}

#[test]
fn test_bind_buffer_base_records_binding_point() {
    let mut device = HeadlessDevice::new();
    let ubo = device.create_buffer().unwrap();
    device.bind_buffer_base(3, ubo);
    assert_eq!(device.uniform_binding(3), Some(ubo));
    assert_eq!(device.bound_buffer(BufferTarget::Uniform), Some(ubo));
}

// ============================================================================
// Textures
// ============================================================================

#[test]
fn test_texture_image_and_sub_image() {
    let mut device = HeadlessDevice::new();
    let texture = device.create_texture().unwrap();
    device.bind_texture(0, texture);
    device.tex_image_2d(&TextureImage {
        level: 0,
        internal_format: crate::device::InternalFormat::R8,
        width: 2,
        height: 2,
        format: PixelFormat::Red,
        pixel_type: ElementType::UnsignedByte,
        data: &[0, 0, 0, 0],
    });
    device.tex_sub_image_2d(
        0,
        TextureRegion { x: 1, y: 1, width: 1, height: 1 },
        PixelFormat::Red,
        ElementType::UnsignedByte,
        &[5],
    );

    let stored = device.texture(texture).unwrap();
    assert_eq!(stored.width, 2);
    assert_eq!(stored.data, vec![0, 0, 0, 5]);
}

#[test]
fn test_tex_parameter_replaces_previous_value() {
    let mut device = HeadlessDevice::new();
    let texture = device.create_texture().unwrap();
    device.bind_texture(1, texture);
    device.tex_parameter(SamplerParameter::MinFilter, SamplerValue::Nearest);
    device.tex_parameter(SamplerParameter::MinFilter, SamplerValue::Linear);

    let stored = device.texture(texture).unwrap();
    assert_eq!(stored.parameters, vec![(SamplerParameter::MinFilter, SamplerValue::Linear)]);
}

// ============================================================================
// Shaders and reflection
// ============================================================================

#[test]
fn test_reflection_of_generated_sources() {
    let mut device = HeadlessDevice::new();
    let program = linked(&mut device);

    assert_eq!(device.active_attributes(program), vec!["position", "color"]);
    assert_eq!(device.active_uniform_blocks(program), vec!["Camera"]);
    assert_eq!(device.active_uniforms(program), vec!["atlas"]);
    assert_eq!(device.attribute_location(program, "color"), Some(1));
    assert_eq!(device.uniform_block_index(program, "Camera"), Some(0));
    assert_eq!(device.uniform_location(program, "atlas"), Some(UniformLocation(0)));
    assert_eq!(device.attribute_location(program, "v_color"), None);
}

#[test]
fn test_optimize_out_hides_name() {
    let mut device = HeadlessDevice::new();
    device.optimize_out("color");
    let program = linked(&mut device);

    assert_eq!(device.active_attributes(program), vec!["position"]);
    assert_eq!(device.attribute_location(program, "color"), None);
}

#[test]
fn test_fail_compile_reports_line() {
    let mut device = HeadlessDevice::new();
    device.fail_compile_on("gl_Position");

    let err = device.compile_shader(ShaderStage::Vertex, VERTEX).unwrap_err();
    match err {
        Error::ShaderCompilationFailed { stage, log } => {
            assert_eq!(stage, ShaderStage::Vertex);
            assert!(log.starts_with("ERROR: 0:9:"), "log was {}", log);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(device.shader_count(), 0);
    assert_eq!(device.compile_count(), 1);
}

#[test]
fn test_fail_link_with_log() {
    let mut device = HeadlessDevice::new();
    let vs = device.compile_shader(ShaderStage::Vertex, VERTEX).unwrap();
    let fs = device.compile_shader(ShaderStage::Fragment, FRAGMENT).unwrap();
    device.fail_link_with(Some("varying mismatch"));

    let err = device.link_program(vs, fs).unwrap_err();
    assert!(matches!(err, Error::ProgramLinkFailed(ref log) if log == "varying mismatch"));

    device.fail_link_with(None);
    assert!(device.link_program(vs, fs).is_ok());
}

#[test]
fn test_uniform_values_are_per_program() {
    let mut device = HeadlessDevice::new();
    let program = linked(&mut device);
    device.use_program(Some(program));
    device.set_uniform_i32(UniformLocation(0), 4);
    device.uniform_block_binding(program, 0, 2);

    assert_eq!(device.uniform_value(program, UniformLocation(0)), Some(4));
    assert_eq!(device.block_binding(program, 0), Some(2));
    assert_eq!(device.current_program(), Some(program));
}

// ============================================================================
// Context loss and call log
// ============================================================================

#[test]
fn test_allocation_limit_reports_out_of_memory() {
    let mut device = HeadlessDevice::new();
    device.limit_allocations(Some(2));
    device.create_buffer().unwrap();
    device.create_texture().unwrap();

    assert!(matches!(device.create_buffer(), Err(Error::OutOfMemory)));
    assert!(matches!(device.create_texture(), Err(Error::OutOfMemory)));
    assert_eq!(device.buffer_count() + device.texture_count(), 2);

    // a lost context frees the budget
    device.lose_context();
    assert!(device.create_buffer().is_ok());

    device.limit_allocations(None);
    device.create_buffer().unwrap();
    device.create_buffer().unwrap();
    assert_eq!(device.buffer_count(), 3);
}

#[test]
fn test_lose_context_drops_objects() {
    let mut device = HeadlessDevice::new();
    linked(&mut device);
    device.create_buffer().unwrap();
    device.create_texture().unwrap();

    device.lose_context();

    assert_eq!(device.program_count(), 0);
    assert_eq!(device.shader_count(), 0);
    assert_eq!(device.buffer_count(), 0);
    assert_eq!(device.texture_count(), 0);
    assert!(!device.calls().is_empty());
}

#[test]
fn test_clone_shares_state() {
    let device = HeadlessDevice::new();
    let mut owned = device.clone();
    owned.set_viewport(0, 0, 640, 480);
    owned.draw_arrays_instanced(DrawMode::Triangles, 0, 3, 2);

    assert_eq!(device.viewport(), (0, 0, 640, 480));
    assert_eq!(
        device.draw_calls(),
        vec![DeviceCall::DrawArraysInstanced { mode: DrawMode::Triangles, first: 0, count: 3, instances: 2 }]
    );

    device.clear_calls();
    assert!(owned.calls().is_empty());
}
