//! Integration tests for per-tick job coalescing
//!
//! Run with: cargo test --test scheduler_integration_tests


use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use glint_engine::glint::render::{FrameCallback, JobCallback};
use glint_engine::glint::scheduler::TickOutcome;
use headless_test_utils::{detached_renderer, draws, headless_renderer, settle, sprite_desc, square};

// ============================================================================
// COMMITS
// ============================================================================

#[test]
fn test_integration_updates_in_one_tick_upload_exact_range() {
    let (mut renderer, device) = headless_renderer();
    let positions = square();
    let command = renderer.create_command(&sprite_desc(&positions)).unwrap();
    renderer.add_instance(command, [("offset", [0.0f32, 0.0])]).unwrap();
    settle(&mut renderer);

    let buffer = renderer.context(None, &positions).unwrap();
    let handle = renderer.resource(buffer).unwrap().as_buffer().unwrap().handle();
    device.clear_calls();

    // elements [6, 8) then [2, 4) then [4, 5): one upload of [2, 8)
    renderer.update_buffer(buffer, [0.9f32, 0.9], 6).unwrap();
    renderer.update_buffer(buffer, [0.1f32, 0.2], 2).unwrap();
    renderer.update_buffer(buffer, 0.3f32, 4).unwrap();
    renderer.tick(0.0);

    assert_eq!(device.sub_data_uploads(), vec![(handle, 8, 24)]);
    let contents = device.buffer_floats(handle.unwrap()).unwrap();
    assert_eq!(contents, vec![-0.5, -0.5, 0.1, 0.2, 0.3, 0.5, 0.9, 0.9]);
    assert_eq!(draws(&device).len(), 1);
}

#[test]
fn test_integration_updates_in_separate_ticks_upload_separately() {
    let (mut renderer, device) = headless_renderer();
    let positions = square();
    let buffer = renderer.context(Some("position"), &positions).unwrap();
    device.clear_calls();

    renderer.update_buffer(buffer, [1.0f32, 1.0], 0).unwrap();
    renderer.tick(0.0);
    renderer.update_buffer(buffer, [2.0f32, 2.0], 6).unwrap();
    renderer.tick(16.0);

    let uploads: Vec<(usize, usize)> = device.sub_data_uploads().into_iter().map(|(_, o, l)| (o, l)).collect();
    assert_eq!(uploads, vec![(0, 8), (24, 8)]);
}

// ============================================================================
// JOBS
// ============================================================================

#[test]
fn test_integration_same_job_runs_once_per_tick() {
    let mut renderer = detached_renderer();
    let runs = Arc::new(AtomicUsize::new(0));
    let other_runs = Arc::new(AtomicUsize::new(0));

    let counter = runs.clone();
    let job = JobCallback::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let counter = other_runs.clone();
    let other = JobCallback::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    for _ in 0..5 {
        renderer.request_job(job.clone());
    }
    renderer.request_job(other.clone());
    renderer.request_job(other);

    assert_eq!(renderer.tick(0.0), TickOutcome::Idle);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(other_runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_integration_job_requested_while_running_moves_to_next_tick() {
    let mut renderer = detached_renderer();
    let runs = Arc::new(AtomicUsize::new(0));
    let slot: Arc<Mutex<Option<JobCallback>>> = Arc::new(Mutex::new(None));

    let counter = runs.clone();
    let me = slot.clone();
    let job = JobCallback::new(move |r| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            if let Some(job) = me.lock().unwrap().clone() {
                r.request_job(job);
            }
        }
    });
    *slot.lock().unwrap() = Some(job.clone());

    renderer.request_job(job);
    assert_eq!(renderer.tick(0.0), TickOutcome::Reschedule);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    assert_eq!(renderer.tick(16.0), TickOutcome::Idle);
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    // break the self-reference
    slot.lock().unwrap().take();
}

#[test]
fn test_integration_plain_jobs_run_before_render_jobs() {
    let mut renderer = detached_renderer();
    let order = Arc::new(Mutex::new(Vec::new()));

    let log = order.clone();
    renderer.request_render_job(JobCallback::new(move |_| log.lock().unwrap().push("render")));
    let log = order.clone();
    renderer.request_job(JobCallback::new(move |_| log.lock().unwrap().push("plain")));

    renderer.tick(0.0);

    assert_eq!(*order.lock().unwrap(), vec!["plain", "render"]);
}

#[test]
fn test_integration_subscribers_run_before_jobs() {
    let mut renderer = detached_renderer();
    let order = Arc::new(Mutex::new(Vec::new()));

    let log = order.clone();
    renderer.request_job(JobCallback::new(move |_| log.lock().unwrap().push("job")));
    let log = order.clone();
    let id = renderer.subscribe_to_animation_frame(
        FrameCallback::new(move |_, _| log.lock().unwrap().push("frame")),
        1,
    );

    renderer.tick(0.0);
    assert_eq!(*order.lock().unwrap(), vec!["frame", "job"]);

    // subscribers keep the session ticking until they leave
    assert!(renderer.is_frame_requested());
    renderer.unsubscribe_from_animation_frame(id);
    assert_eq!(renderer.tick(16.0), TickOutcome::Idle);
    assert_eq!(renderer.frame_number(), 2);
}
