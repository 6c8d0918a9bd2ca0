/// Glint Engine - process-wide services shared by every renderer session
///
/// Renderer sessions carry their own state (device, caches, scheduler). The only
/// process-wide service is the logger, stored here behind a `RwLock` so any
/// session or thread can emit through the `engine_*` macros.

use std::sync::{OnceLock, RwLock};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

/// Installed logger, `DefaultLogger` until a host replaces it
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())))
}

fn install(sink: Box<dyn Logger>) {
    if let Ok(mut installed) = logger().write() {
        *installed = sink;
    }
}

/// Entry point for process-wide engine services
pub struct Engine;

impl Engine {
    /// Route every engine message to `sink`
    ///
    /// ```no_run
    /// use glint_engine::glint::{Engine, log::{Logger, LogEntry, LogSeverity}};
    ///
    /// struct WarningsOnly;
    /// impl Logger for WarningsOnly {
    ///     fn log(&self, entry: &LogEntry) {
    ///         if entry.severity >= LogSeverity::Warn {
    ///             eprintln!("{}: {}", entry.source, entry.message);
    ///         }
    ///     }
    /// }
    ///
    /// Engine::set_logger(WarningsOnly);
    /// ```
    pub fn set_logger<L: Logger + 'static>(sink: L) {
        install(Box::new(sink));
    }

    /// Go back to the colored console logger
    pub fn reset_logger() {
        install(Box::new(DefaultLogger::new()));
    }

    /// Emit a message without location, used by `engine_trace!` .. `engine_warn!`
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        emit(LogEntry::new(severity, source, message));
    }

    /// Emit a message tagged with its `file:line`, used by `engine_error!`
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let mut entry = LogEntry::new(severity, source, message);
        entry.file = Some(file);
        entry.line = Some(line);
        emit(entry);
    }
}

/// Hand `entry` to the installed logger; a poisoned lock drops the entry
fn emit(entry: LogEntry) {
    if let Ok(installed) = logger().read() {
        installed.log(&entry);
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
