/*!
# Glint Engine

Instanced draw-state engine over a WebGL2/GLES3 style graphics device.

This crate turns declarative draw descriptions into GPU state: it shares
resources by descriptor identity, generates and caches shader programs,
keeps per-instance attribute buffers in sync, coalesces partial uploads and
redraws into one scheduler tick, and survives device context loss.

## Architecture

- **Device**: Trait over the host's graphics context (`HeadlessDevice` in memory)
- **Resource**: Buffers, std140 uniform blocks and textures, shared by identity
- **Command**: One instanced draw unit with its program and instance pool
- **Scheduler**: Per-tick deduplicated job queues and periodic frame subscribers
- **Renderer**: The device session that owns all of the above

The host creates a `Renderer`, registers resources and commands, attaches a
device, and calls `tick` on every display refresh while
`is_frame_requested` is true.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod device;
pub mod resource;
pub mod command;
pub mod scheduler;
pub mod renderer;

#[cfg(test)]
mod test_support;

// Main glint namespace module
pub mod glint {
    // Error types
    pub use crate::error::{Error, Result};

    // Logger holder
    pub use crate::engine::Engine;

    // Device session
    pub use crate::renderer::Renderer;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are exported at the crate root
    }

    // Device sub-module
    pub mod device {
        pub use crate::device::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Command sub-module
    pub mod command {
        pub use crate::command::*;
    }

    // Scheduler sub-module
    pub mod scheduler {
        pub use crate::scheduler::*;
    }

    // Render sub-module with the session types
    pub mod render {
        pub use crate::renderer::*;
    }
}

// Re-export math library at crate root
pub use glam;
