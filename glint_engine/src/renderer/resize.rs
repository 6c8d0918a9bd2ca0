/// Drawing-surface resize notifications

use std::fmt;
use std::sync::Arc;
use slotmap::new_key_type;

new_key_type! {
    /// Handle returned by `Renderer::subscribe_to_resize`
    pub struct ResizeSubscriptionId;
}

/// New surface geometry, delivered to resize subscribers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEvent {
    pub offset_x: f32,
    pub offset_y: f32,
    /// Logical width
    pub width: f32,
    /// Logical height
    pub height: f32,
    /// Drawing buffer width in pixels
    pub drawable_width: u32,
    /// Drawing buffer height in pixels
    pub drawable_height: u32,
    /// Device pixel ratio times the configured ratio
    pub pixel_ratio: f32,
}

impl ResizeEvent {
    /// Event for a surface of logical `width` x `height` at `pixel_ratio`
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            width,
            height,
            drawable_width: (width * pixel_ratio).max(0.0) as u32,
            drawable_height: (height * pixel_ratio).max(0.0) as u32,
            pixel_ratio,
        }
    }

    /// Width over height of the drawing buffer (1.0 when empty)
    pub fn aspect_ratio(&self) -> f32 {
        if self.drawable_height == 0 {
            1.0
        } else {
            self.drawable_width as f32 / self.drawable_height as f32
        }
    }
}

/// Resize subscriber
#[derive(Clone)]
pub struct ResizeCallback(pub Arc<dyn Fn(&ResizeEvent) + Send + Sync>);

impl ResizeCallback {
    pub fn new(f: impl Fn(&ResizeEvent) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for ResizeCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResizeCallback")
    }
}
