/// Renderer module - the device session and everything it drives per frame

// Module declarations
pub mod state_cache;
pub mod work;
pub mod config;
pub mod resize;
pub mod renderer;

// Re-export the session
pub use renderer::Renderer;

// Re-export from other modules
pub use state_cache::{GpuContext, StateCache};
pub use work::{Job, JobCallback, FrameCallback, WorkRequests};
pub use config::{RendererConfig, ContextAttributes, RendererStats};
pub use resize::{ResizeEvent, ResizeCallback, ResizeSubscriptionId};
