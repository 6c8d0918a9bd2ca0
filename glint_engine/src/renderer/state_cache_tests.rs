use super::*;
use crate::device::{HeadlessDevice, DeviceCall};

fn with_gpu(f: impl FnOnce(&mut GpuContext<'_>)) -> (HeadlessDevice, StateCache) {
    let device = HeadlessDevice::new();
    let mut owned = device.clone();
    let mut state = StateCache::new();
    {
        let mut gpu = GpuContext { device: &mut owned, state: &mut state, debug: false };
        f(&mut gpu);
    }
    (device, state)
}

#[test]
fn test_program_bound_once() {
    let (device, _) = with_gpu(|gpu| {
        gpu.set_program(Some(ProgramHandle(1)));
        gpu.set_program(Some(ProgramHandle(1)));
        gpu.set_program(Some(ProgramHandle(2)));
    });
    assert_eq!(device.calls(), vec![
        DeviceCall::UseProgram(Some(ProgramHandle(1))),
        DeviceCall::UseProgram(Some(ProgramHandle(2))),
    ]);
}

#[test]
fn test_buffers_cached_per_target() {
    let (device, _) = with_gpu(|gpu| {
        gpu.set_buffer(BufferTarget::Array, Some(BufferHandle(1)));
        gpu.set_buffer(BufferTarget::Uniform, Some(BufferHandle(1)));
        gpu.set_buffer(BufferTarget::Array, Some(BufferHandle(1)));
    });
    assert_eq!(device.calls().len(), 2);
}

#[test]
fn test_vertex_array_change_forgets_element_binding() {
    let (device, _) = with_gpu(|gpu| {
        gpu.set_buffer(BufferTarget::ElementArray, Some(BufferHandle(4)));
        gpu.set_vertex_array(Some(VertexArrayHandle(1)));
        gpu.set_buffer(BufferTarget::ElementArray, Some(BufferHandle(4)));
        gpu.set_vertex_array(Some(VertexArrayHandle(1)));
        gpu.set_buffer(BufferTarget::ElementArray, Some(BufferHandle(4)));
    });
    let binds = device
        .calls()
        .into_iter()
        .filter(|c| matches!(c, DeviceCall::BindBuffer { target: BufferTarget::ElementArray, .. }))
        .count();
    assert_eq!(binds, 2);
}

#[test]
fn test_texture_units_assigned_on_first_use() {
    let (device, state) = with_gpu(|gpu| {
        assert_eq!(gpu.set_texture(TextureHandle(10)), 0);
        assert_eq!(gpu.set_texture(TextureHandle(11)), 1);
        assert_eq!(gpu.set_texture(TextureHandle(10)), 0);
        assert_eq!(gpu.set_texture(TextureHandle(10)), 0);
    });
    assert_eq!(state.texture_unit(TextureHandle(11)), Some(1));
    assert_eq!(state.texture_unit_count(), 2);
    assert_eq!(device.calls(), vec![
        DeviceCall::BindTexture { unit: 0, texture: TextureHandle(10) },
        DeviceCall::BindTexture { unit: 1, texture: TextureHandle(11) },
        DeviceCall::BindTexture { unit: 0, texture: TextureHandle(10) },
    ]);
}

#[test]
fn test_depth_and_cull_first_set_always_goes_through() {
    let (device, _) = with_gpu(|gpu| {
        gpu.set_depth(None);
        gpu.set_depth(None);
        gpu.set_cull(Some(CullFace::Back));
        gpu.set_cull(Some(CullFace::Back));
        gpu.set_depth(Some(DepthFunc::Less));
    });
    assert_eq!(device.calls(), vec![
        DeviceCall::SetDepthTest(None),
        DeviceCall::SetCullFace(Some(CullFace::Back)),
        DeviceCall::SetDepthTest(Some(DepthFunc::Less)),
    ]);
}

#[test]
fn test_reset_clears_units() {
    let (_, mut state) = with_gpu(|gpu| {
        gpu.set_texture(TextureHandle(3));
    });
    state.reset();
    assert_eq!(state.texture_unit(TextureHandle(3)), None);
    assert_eq!(state.texture_unit_count(), 0);
}
