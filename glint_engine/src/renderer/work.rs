/// Jobs run by the frame scheduler, and the request buffer that feeds it
///
/// Resources and commands never reach the scheduler directly. They push
/// requests into `WorkRequests`, which the renderer flushes into its
/// scheduler after every public call.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use crate::resource::ResourceKey;
use crate::command::CommandKey;
use crate::renderer::Renderer;
use crate::scheduler::FrameInfo;

// ===== JOB =====

/// Caller-supplied job, deduplicated by `Arc` identity
#[derive(Clone)]
pub struct JobCallback(pub Arc<dyn Fn(&mut Renderer) + Send + Sync>);

impl JobCallback {
    pub fn new(f: impl Fn(&mut Renderer) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    fn address(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for JobCallback {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for JobCallback {}

impl Hash for JobCallback {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for JobCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobCallback({:p})", self.address())
    }
}

/// Animation frame subscriber
#[derive(Clone)]
pub struct FrameCallback(pub Arc<dyn Fn(&mut Renderer, &FrameInfo) + Send + Sync>);

impl FrameCallback {
    pub fn new(f: impl Fn(&mut Renderer, &FrameInfo) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for FrameCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameCallback({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// Unit of deferred work
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Job {
    /// Upload the dirty range of a buffer or uniform block
    Commit(ResourceKey),
    /// Recompute a command's vertex count
    CountVertices(CommandKey),
    /// Clear and draw every command
    Render,
    /// Caller job
    Callback(JobCallback),
}

// ===== REQUESTS =====

/// Requests accumulated during one engine call
#[derive(Debug, Default)]
pub struct WorkRequests {
    jobs: Vec<Job>,
    render_jobs: Vec<Job>,
    render: bool,
}

impl WorkRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a plain job
    pub fn request_job(&mut self, job: Job) {
        self.jobs.push(job);
    }

    /// Queue a render-phase job
    pub fn request_render_job(&mut self, job: Job) {
        self.render_jobs.push(job);
    }

    /// Ask for a redraw
    pub fn request_render(&mut self) {
        self.render = true;
    }

    /// Drop a pending redraw request (the frame being drawn satisfies it)
    pub fn cancel_render(&mut self) {
        self.render = false;
    }

    /// Whether a redraw was asked for
    pub fn render_requested(&self) -> bool {
        self.render
    }

    /// Take everything requested so far
    pub fn take(&mut self) -> (Vec<Job>, Vec<Job>, bool) {
        let render = std::mem::take(&mut self.render);
        (std::mem::take(&mut self.jobs), std::mem::take(&mut self.render_jobs), render)
    }
}
