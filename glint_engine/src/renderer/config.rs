/// Renderer configuration and per-frame statistics

/// Attributes the host uses when it creates the device context
///
/// The renderer never reads these. A host reads them from
/// `Renderer::config()` before building the device it attaches, since
/// alpha and antialiasing are fixed at context creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextAttributes {
    /// Request an alpha channel in the drawing buffer
    pub alpha: bool,
    /// Request multisampled antialiasing
    pub antialias: bool,
}

/// Renderer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Color the drawing buffer is cleared to before each frame
    pub clear_color: [f32; 4],
    /// Depth the drawing buffer is cleared to before each frame
    pub clear_depth: f32,
    /// Multiplier on top of the host's device pixel ratio
    pub pixel_ratio: f32,
    /// Trace resource and command creation, uploads and draws
    pub debug: bool,
    /// Host-only: read back by the host when it creates the device
    pub context_attributes: ContextAttributes,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
            pixel_ratio: 1.0,
            debug: false,
            context_attributes: ContextAttributes::default(),
        }
    }
}

/// Renderer statistics for the last rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Number of draw calls issued
    pub draw_calls: u32,
    /// Number of instances drawn across all commands
    pub instances: u32,
}
