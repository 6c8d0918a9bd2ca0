//! Error types for the Glint engine
//!
//! This module defines the error types used throughout the engine:
//! configuration errors raised while building resources and commands,
//! shader compilation failures, and device errors.

use std::fmt;
use crate::device::ShaderStage;

/// Result type for Glint engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Glint engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error reported by the device
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (unknown key, out-of-range write, unknown field, etc.)
    InvalidResource(String),

    /// Initialization failed (device attach, session setup)
    InitializationFailed(String),

    /// A command was described without one of its shader bodies
    MissingShaderSource(ShaderStage),

    /// A descriptor whose element type or shape cannot be classified
    UnknownResourceKind(String),

    /// Shader compilation failed, carrying the full compiler log
    ShaderCompilationFailed {
        stage: ShaderStage,
        log: String,
    },

    /// Program linking failed, carrying the full linker log
    ProgramLinkFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::MissingShaderSource(stage) => write!(f, "Missing {} shader source", stage),
            Error::UnknownResourceKind(msg) => write!(f, "Unknown resource kind: {}", msg),
            Error::ShaderCompilationFailed { stage, log } => {
                write!(f, "{} shader compilation failed:\n{}", stage, log)
            }
            Error::ProgramLinkFailed(log) => write!(f, "Program link failed:\n{}", log),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build a `BackendError` carrying the same text
///
/// # Example
///
/// ```ignore
/// let handle = device.create_buffer()
///     .map_err(|e| engine_err!("glint::Buffer", "Failed to create buffer: {}", e))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::glint::Engine::log_detailed(
            $crate::glint::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::glint::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return early with a `BackendError`
///
/// # Example
///
/// ```ignore
/// if bind_index > max { engine_bail!("glint::UniformBlock", "Too many blocks: {}", bind_index); }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
