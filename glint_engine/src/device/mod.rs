/// Device module - the graphics context surface driven by the engine

// Module declarations
pub mod types;
pub mod device;
pub mod headless;

// Re-export everything from device.rs
pub use device::*;

// Re-export from other modules
pub use types::*;
pub use headless::*;
