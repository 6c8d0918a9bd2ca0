use super::*;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use chrono::{TimeZone, Utc};
use serial_test::serial;
use crate::device::{DeviceCall, DrawMode, HeadlessDevice, ShaderStage};
use crate::glint::Engine;
use crate::log::LogSeverity;
use crate::renderer::ContextAttributes;
use crate::resource::{ResourceDesc, UniformBlockDesc};
use crate::test_support::CaptureLogger;

const VERTEX: &str = "void main() { gl_Position = vec4(position + offset, 0.0, 1.0); }";
const FRAGMENT: &str = "out vec4 fragColor;\nvoid main() { fragColor = vec4(1.0); }";

// ============================================================================
// Helpers
// ============================================================================

fn origin_ms() -> f64 {
    Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap().timestamp_millis() as f64
}

fn renderer_with(config: RendererConfig) -> Renderer {
    let origin = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
    Renderer::with_clock(config, FrameClock::with_origin(origin))
}

fn attached_with(config: RendererConfig) -> (Renderer, HeadlessDevice) {
    let device = HeadlessDevice::new();
    let mut renderer = renderer_with(config);
    renderer.attach_device(device.clone()).unwrap();
    (renderer, device)
}

fn attached() -> (Renderer, HeadlessDevice) {
    attached_with(RendererConfig::default())
}

fn triangle() -> SharedResource {
    ResourceDesc::buffer([[0.0f32, 0.5], [-0.5, -0.5], [0.5, -0.5]])
}

fn desc(positions: &SharedResource) -> CommandDesc {
    CommandDesc::new(VERTEX, FRAGMENT)
        .context("position", positions)
        .prop("offset", [0.0f32, 0.0])
}

fn origin_instance() -> [(&'static str, [f32; 2]); 1] {
    [("offset", [0.0, 0.0])]
}

/// Tick until the scheduler goes idle, returning the number of ticks
fn settle(renderer: &mut Renderer) -> usize {
    let mut ticks = 0;
    while renderer.is_frame_requested() && ticks < 16 {
        renderer.tick(ticks as f64 * 16.0);
        ticks += 1;
    }
    ticks
}

fn draw_counts(device: &HeadlessDevice) -> Vec<(u32, u32)> {
    device
        .draw_calls()
        .into_iter()
        .filter_map(|call| match call {
            DeviceCall::DrawArraysInstanced { count, instances, .. } => Some((count, instances)),
            DeviceCall::DrawElementsInstanced { count, instances, .. } => Some((count, instances)),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_new_renderer_is_idle() {
    let renderer = renderer_with(RendererConfig::default());

    assert!(!renderer.has_device());
    assert!(!renderer.is_context_lost());
    assert!(!renderer.is_frame_requested());
    assert!(!renderer.needs_rendering());
    assert_eq!(renderer.frame_number(), 0);
    assert_eq!(renderer.stats(), RendererStats::default());
}

#[test]
fn test_attach_applies_clear_and_draw_state() {
    let config = RendererConfig { clear_color: [0.1, 0.2, 0.3, 1.0], clear_depth: 0.75, ..Default::default() };
    let (_renderer, device) = attached_with(config);

    let calls = device.calls();
    assert!(calls.contains(&DeviceCall::SetClearColor([0.1, 0.2, 0.3, 1.0])));
    assert!(calls.contains(&DeviceCall::SetClearDepth(0.75)));
    assert_eq!(device.depth_test(), Some(DepthFunc::Less));
    assert_eq!(device.cull_face(), Some(CullFace::Back));
}

#[test]
fn test_context_attributes_are_left_to_the_host() {
    let attributes = ContextAttributes { alpha: true, antialias: true };
    let (renderer, device) = attached_with(RendererConfig {
        context_attributes: attributes,
        ..Default::default()
    });
    let (_, plain_device) = attached();

    assert_eq!(renderer.config().context_attributes, attributes);
    assert_eq!(RendererConfig::default().context_attributes, ContextAttributes::default());
    // attaching issues the same calls whatever the attributes
    assert_eq!(device.calls(), plain_device.calls());
}

#[test]
fn test_attach_twice_fails() {
    let (mut renderer, _device) = attached();

    let result = renderer.attach_device(HeadlessDevice::new());
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_commands_registered_before_attach_are_created_on_attach() {
    let mut renderer = renderer_with(RendererConfig::default());
    let key = renderer.create_command(&desc(&triangle())).unwrap();
    renderer.add_instance(key, origin_instance()).unwrap();

    assert!(!renderer.command(key).unwrap().is_created());
    assert!(renderer.needs_rendering());

    let device = HeadlessDevice::new();
    renderer.attach_device(device.clone()).unwrap();
    assert!(renderer.command(key).unwrap().is_created());
    assert!(renderer.is_frame_requested());

    settle(&mut renderer);
    assert_eq!(draw_counts(&device), vec![(3, 1)]);
    assert!(!renderer.needs_rendering());
}

#[test]
fn test_detach_marks_everything_uninitialized() {
    let (mut renderer, _device) = attached();
    let positions = triangle();
    let key = renderer.create_command(&desc(&positions)).unwrap();
    let buffer = renderer.context(None, &positions).unwrap();

    assert!(renderer.detach_device().is_some());
    assert!(!renderer.has_device());
    assert!(!renderer.command(key).unwrap().is_created());
    assert!(!renderer.resource(buffer).unwrap().is_created());
    assert!(renderer.detach_device().is_none());
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_render_clears_then_draws_in_order() {
    let (mut renderer, device) = attached();
    let positions = triangle();
    let late = renderer.create_command(&desc(&positions).order(1.0)).unwrap();
    let early = renderer.create_command(&desc(&positions).order(0.5).count(2)).unwrap();
    renderer.add_instance(late, origin_instance()).unwrap();
    renderer.add_instance(early, origin_instance()).unwrap();
    renderer.add_instance(early, [("offset", [1.0f32, 0.0])]).unwrap();

    device.clear_calls();
    settle(&mut renderer);

    let calls = device.calls();
    let clear = calls.iter().position(|c| *c == DeviceCall::Clear(ClearFlags::COLOR | ClearFlags::DEPTH));
    let first_draw = calls.iter().position(|c| c.is_draw());
    assert!(clear.unwrap() < first_draw.unwrap());

    assert_eq!(draw_counts(&device), vec![(2, 2), (3, 1)]);
    assert_eq!(renderer.stats(), RendererStats { draw_calls: 2, instances: 3 });
}

#[test]
fn test_commands_without_instances_are_skipped() {
    let (mut renderer, device) = attached();
    let positions = triangle();
    renderer.create_command(&desc(&positions)).unwrap();
    renderer.create_command(&desc(&positions).instance_count(4)).unwrap();

    settle(&mut renderer);

    assert_eq!(draw_counts(&device), vec![(3, 4)]);
    assert_eq!(renderer.stats().draw_calls, 1);
}

#[test]
fn test_draw_mode_reaches_device() {
    let (mut renderer, device) = attached();
    let key = renderer.create_command(&desc(&triangle()).mode(DrawMode::Points)).unwrap();
    renderer.add_instance(key, origin_instance()).unwrap();

    settle(&mut renderer);

    assert!(device
        .draw_calls()
        .iter()
        .all(|c| matches!(c, DeviceCall::DrawArraysInstanced { mode: DrawMode::Points, .. })));
}

#[test]
fn test_set_clear_applies_immediately() {
    let (mut renderer, device) = attached();

    renderer.set_clear([1.0, 0.0, 0.0, 1.0], 0.5);

    let calls = device.calls();
    assert!(calls.contains(&DeviceCall::SetClearColor([1.0, 0.0, 0.0, 1.0])));
    assert!(calls.contains(&DeviceCall::SetClearDepth(0.5)));
    assert_eq!(renderer.config().clear_depth, 0.5);
    assert!(renderer.needs_rendering());
}

// ============================================================================
// Resources
// ============================================================================

#[test]
fn test_updates_within_one_tick_commit_once() {
    let (mut renderer, device) = attached();
    let positions = triangle();
    let key = renderer.create_command(&desc(&positions)).unwrap();
    renderer.add_instance(key, origin_instance()).unwrap();
    settle(&mut renderer);

    let buffer = renderer.context(None, &positions).unwrap();
    let handle = renderer.resource(buffer).unwrap().as_buffer().unwrap().handle();
    device.clear_calls();

    renderer.update_buffer(buffer, [1.0f32, 1.0], 0).unwrap();
    renderer.update_buffer(buffer, [2.0f32, 2.0], 4).unwrap();
    renderer.tick(100.0);

    assert_eq!(device.sub_data_uploads(), vec![(handle, 0, 24)]);
    assert_eq!(draw_counts(&device).len(), 1);
}

#[test]
fn test_out_of_range_update_before_attach_keeps_session_usable() {
    let mut renderer = renderer_with(RendererConfig::default());
    let positions = triangle();
    let key = renderer.create_command(&desc(&positions)).unwrap();
    let buffer = renderer.context(None, &positions).unwrap();

    let rejected = renderer.update_buffer(buffer, [9.0f32, 9.0], 100);
    assert!(matches!(rejected, Err(Error::InvalidResource(_))));
    renderer.update_buffer(buffer, [7.0f32, 7.0], 0).unwrap();

    let device = HeadlessDevice::new();
    renderer.attach_device(device.clone()).unwrap();
    assert!(renderer.command(key).unwrap().is_created());

    let handle = renderer.resource(buffer).unwrap().as_buffer().unwrap().handle().unwrap();
    settle(&mut renderer);
    assert_eq!(device.buffer_floats(handle).unwrap(), vec![7.0, 7.0, -0.5, -0.5, 0.5, -0.5]);
}

#[test]
fn test_update_with_overflowing_offset_fails() {
    let (mut renderer, _device) = attached();
    let buffer = renderer.context(None, &triangle()).unwrap();
    let result = renderer.update_buffer(buffer, [1.0f32, 2.0], usize::MAX);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_refill_recounts_bound_commands() {
    let (mut renderer, _device) = attached();
    let positions = triangle();
    let counted = renderer.create_command(&desc(&positions)).unwrap();
    let fixed = renderer.create_command(&desc(&positions).count(3)).unwrap();
    let buffer = renderer.context(None, &positions).unwrap();

    renderer.refill_buffer(buffer, vec![0.0f32; 10]).unwrap();
    settle(&mut renderer);

    assert_eq!(renderer.command(counted).unwrap().count(), 5);
    assert_eq!(renderer.command(fixed).unwrap().count(), 3);
}

#[test]
fn test_uniform_update_uploads_field_range() {
    let (mut renderer, device) = attached();
    let block = ResourceDesc::uniform_block(
        UniformBlockDesc::new()
            .field("tint", [1.0f32, 0.0, 0.0, 1.0])
            .field("scale", 1.0f32),
    );
    let key = renderer.context(Some("Material"), &block).unwrap();
    assert!(renderer.resource(key).unwrap().is_created());
    device.clear_calls();

    renderer.update_uniform(key, "tint", [0.0f32, 1.0, 0.0, 1.0]).unwrap();
    renderer.tick(0.0);

    let handle = renderer.resource(key).unwrap().as_uniform_block().unwrap().handle();
    assert_eq!(device.sub_data_uploads(), vec![(handle, 0, 16)]);

    let result = renderer.update_uniform(key, "missing", 1.0f32);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_context_returns_same_key_for_same_descriptor() {
    let mut renderer = renderer_with(RendererConfig::default());
    let positions = triangle();

    let first = renderer.context(Some("position"), &positions).unwrap();
    let second = renderer.context(Some("other"), &positions).unwrap();

    assert_eq!(first, second);
    assert_eq!(renderer.resource(first).unwrap().name(), Some("position"));
    assert!(!renderer.resource(first).unwrap().is_created());
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn test_create_command_failure_is_not_registered() {
    let (mut renderer, device) = attached();
    device.fail_compile_on("BROKEN");
    let positions = triangle();

    let broken = CommandDesc::new("void main() { BROKEN; }", FRAGMENT).context("position", &positions);
    let result = renderer.create_command(&broken);

    assert!(matches!(result, Err(Error::ShaderCompilationFailed { stage: ShaderStage::Vertex, .. })));
    assert!(renderer.command_keys().is_empty());
    let buffer = renderer.context(None, &positions).unwrap();
    assert!(renderer.resource(buffer).unwrap().bound_commands().is_empty());
}

#[test]
fn test_out_of_memory_fails_command_creation() {
    let (mut renderer, device) = attached();
    device.limit_allocations(Some(0));

    let result = renderer.create_command(&desc(&triangle()));

    assert!(matches!(result, Err(Error::OutOfMemory)));
    assert!(renderer.command_keys().is_empty());

    device.limit_allocations(None);
    assert!(renderer.create_command(&desc(&triangle())).is_ok());
}

#[test]
fn test_missing_shader_source_fails_construction() {
    let mut renderer = renderer_with(RendererConfig::default());
    let desc = CommandDesc { fragment: Some(FRAGMENT.to_string()), ..CommandDesc::default() };

    let result = renderer.create_command(&desc);

    assert!(matches!(result, Err(Error::MissingShaderSource(ShaderStage::Vertex))));
    assert!(renderer.command_keys().is_empty());
}

#[test]
fn test_remove_command_unbinds_shared_resources() {
    let (mut renderer, device) = attached();
    let positions = triangle();
    let key = renderer.create_command(&desc(&positions)).unwrap();
    renderer.add_instance(key, origin_instance()).unwrap();
    let buffer = renderer.context(None, &positions).unwrap();
    assert_eq!(renderer.resource(buffer).unwrap().bound_commands(), &[key]);

    renderer.remove_command(key).unwrap();
    device.clear_calls();
    settle(&mut renderer);

    assert!(renderer.resource(buffer).unwrap().bound_commands().is_empty());
    assert!(device.draw_calls().is_empty());
    assert!(matches!(renderer.remove_command(key), Err(Error::InvalidResource(_))));
}

#[test]
fn test_instance_lifecycle_through_renderer() {
    let (mut renderer, device) = attached();
    let key = renderer.create_command(&desc(&triangle())).unwrap();
    let a = renderer.add_instance(key, origin_instance()).unwrap();
    let b = renderer.add_instance(key, [("offset", [1.0f32, 1.0])]).unwrap();
    settle(&mut renderer);

    renderer.update_instance(key, b, "offset", [2.0f32, 3.0]).unwrap();
    assert_eq!(renderer.instance_value(key, b, "offset"), Some(&Value::from([2.0f32, 3.0])));

    renderer.delete_instance(key, a).unwrap();
    device.clear_calls();
    settle(&mut renderer);

    assert_eq!(draw_counts(&device), vec![(3, 1)]);
    assert_eq!(renderer.command(key).unwrap().instances(), &[b]);
}

#[test]
fn test_instance_calls_on_unknown_command_fail() {
    let mut renderer = renderer_with(RendererConfig::default());
    let key = renderer.create_command(&desc(&triangle())).unwrap();
    let instance = renderer.add_instance(key, origin_instance()).unwrap();
    renderer.remove_command(key).unwrap();

    assert!(matches!(renderer.add_instance(key, origin_instance()), Err(Error::InvalidResource(_))));
    assert!(matches!(renderer.delete_instance(key, instance), Err(Error::InvalidResource(_))));
    assert!(matches!(
        renderer.update_instance(key, instance, "offset", [1.0f32, 1.0]),
        Err(Error::InvalidResource(_))
    ));
    assert!(renderer.instance_value(key, instance, "offset").is_none());
}

// ============================================================================
// Surface
// ============================================================================

#[test]
fn test_resize_sets_viewport_and_notifies() {
    let config = RendererConfig { pixel_ratio: 2.0, ..Default::default() };
    let (mut renderer, device) = attached_with(config);
    let received = Arc::new(Mutex::new(None));
    let sink = received.clone();
    let id = renderer.subscribe_to_resize(ResizeCallback::new(move |event| {
        *sink.lock().unwrap() = Some(*event);
    }));

    let event = renderer.resize(100.0, 50.0, 1.5);

    assert_eq!(event.pixel_ratio, 3.0);
    assert_eq!((event.drawable_width, event.drawable_height), (300, 150));
    assert_eq!((event.offset_x, event.offset_y), (0.0, 0.0));
    assert_eq!(device.viewport(), (0, 0, 300, 150));
    assert_eq!(*received.lock().unwrap(), Some(event));
    assert!(renderer.needs_rendering());

    assert!(renderer.unsubscribe_from_resize(id));
    assert!(!renderer.unsubscribe_from_resize(id));
}

#[test]
fn test_resize_physical_uses_logical_size() {
    let (mut renderer, device) = attached();

    let event = renderer.resize_physical(winit::dpi::PhysicalSize::new(200, 100), 2.0);

    assert_eq!((event.width, event.height), (100.0, 50.0));
    assert_eq!((event.drawable_width, event.drawable_height), (200, 100));
    assert_eq!(device.viewport(), (0, 0, 200, 100));
}

// ============================================================================
// Context loss
// ============================================================================

#[test]
fn test_context_loss_suppresses_rendering_until_restore() {
    let (mut renderer, device) = attached();
    renderer.resize(64.0, 32.0, 1.0);
    let key = renderer.create_command(&desc(&triangle())).unwrap();
    renderer.add_instance(key, origin_instance()).unwrap();
    settle(&mut renderer);

    device.lose_context();
    renderer.context_lost();
    assert!(renderer.is_context_lost());
    assert!(!renderer.command(key).unwrap().is_created());

    device.clear_calls();
    renderer.request_rendering();
    settle(&mut renderer);
    assert!(device.draw_calls().is_empty());

    renderer.context_restored().unwrap();
    assert!(renderer.command(key).unwrap().is_created());
    settle(&mut renderer);

    assert_eq!(draw_counts(&device), vec![(3, 1)]);
    assert_eq!(device.program_count(), 1);
    assert_eq!(device.viewport(), (0, 0, 64, 32));
}

#[test]
fn test_restore_without_loss_is_a_no_op() {
    let (mut renderer, device) = attached();
    device.clear_calls();

    renderer.context_restored().unwrap();

    assert!(device.calls().is_empty());
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn test_request_job_runs_once_per_tick() {
    let mut renderer = renderer_with(RendererConfig::default());
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let job = JobCallback::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    renderer.request_job(job.clone());
    renderer.request_job(job.clone());
    renderer.request_job(job);
    assert!(renderer.is_frame_requested());

    assert_eq!(renderer.tick(0.0), TickOutcome::Idle);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!renderer.is_frame_requested());
}

#[test]
fn test_job_mutations_render_in_the_same_tick() {
    let (mut renderer, device) = attached();
    let key = renderer.create_command(&desc(&triangle())).unwrap();
    settle(&mut renderer);
    device.clear_calls();

    renderer.request_job(JobCallback::new(move |r| {
        r.add_instance(key, [("offset", [0.5f32, 0.5])]).unwrap();
    }));
    renderer.tick(0.0);

    assert_eq!(draw_counts(&device), vec![(3, 1)]);
}

#[test]
fn test_animation_frame_runs_every_nth_tick() {
    let mut renderer = renderer_with(RendererConfig::default());
    let frames = Arc::new(Mutex::new(Vec::new()));
    let sink = frames.clone();
    let id = renderer.subscribe_to_animation_frame(
        FrameCallback::new(move |_, info| sink.lock().unwrap().push(*info)),
        2,
    );

    for frame in 0..5 {
        assert_eq!(renderer.tick(frame as f64 * 10.0), TickOutcome::Reschedule);
    }

    let frames = frames.lock().unwrap().clone();
    let numbers: Vec<u64> = frames.iter().map(|f| f.frame_number).collect();
    assert_eq!(numbers, vec![0, 2, 4]);
    assert_eq!(frames[1].timestamp, 20.0);
    assert_eq!(frames[1].epoch_time, origin_ms() + 20.0);
    // origin is one day into the month
    assert_eq!(frames[1].month_time, 86_400_000.0 + 20.0);

    assert!(renderer.unsubscribe_from_animation_frame(id));
    assert_eq!(renderer.tick(50.0), TickOutcome::Idle);
}

// ============================================================================
// Logging
// ============================================================================

#[test]
#[serial]
fn test_lifecycle_is_logged() {
    let capture = CaptureLogger::new();
    Engine::set_logger(capture.clone());

    let (mut renderer, _device) = attached();
    renderer.context_lost();
    renderer.context_restored().unwrap();

    Engine::reset_logger();

    let info = capture.messages(LogSeverity::Info);
    assert!(info.iter().any(|m| m.starts_with("Device attached")));
    assert!(info.iter().any(|m| m == "Context lost"));
    assert!(info.iter().any(|m| m == "Context restored"));
}

#[test]
#[serial]
fn test_uploads_and_draws_are_traced_below_debug() {
    let capture = CaptureLogger::new();
    Engine::set_logger(capture.clone());

    let (mut renderer, _device) = attached_with(RendererConfig { debug: true, ..Default::default() });
    let positions = triangle();
    let key = renderer.create_command(&desc(&positions)).unwrap();
    renderer.add_instance(key, origin_instance()).unwrap();
    settle(&mut renderer);
    let buffer = renderer.context(None, &positions).unwrap();
    renderer.update_buffer(buffer, [1.0f32, 1.0], 0).unwrap();
    settle(&mut renderer);

    Engine::reset_logger();

    let severity_of = |source: &str, prefix: &str| -> Vec<LogSeverity> {
        capture
            .from_source(source)
            .into_iter()
            .filter(|e| e.message.starts_with(prefix))
            .map(|e| e.severity)
            .collect()
    };
    let commits = severity_of("glint::Buffer", "Committing");
    let draws = severity_of("glint::Command", "Rendering");
    assert!(!commits.is_empty());
    assert!(!draws.is_empty());
    assert!(commits.iter().chain(&draws).all(|s| *s == LogSeverity::Trace));
    assert!(severity_of("glint::Command", "Creating").iter().all(|s| *s == LogSeverity::Debug));
}
