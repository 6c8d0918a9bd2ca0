//! Shared helpers for unit tests

use std::sync::{Arc, Mutex};
use crate::log::{Logger, LogEntry, LogSeverity};

/// Logger that keeps every entry for later assertions
#[derive(Clone, Default)]
pub struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Entries emitted by one component (other tests may log concurrently)
    pub fn from_source(&self, source: &str) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.source == source)
            .cloned()
            .collect()
    }

    pub fn messages(&self, severity: LogSeverity) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message.clone())
            .collect()
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// Device fixture
// ============================================================================

use crate::device::HeadlessDevice;
use crate::renderer::{GpuContext, StateCache};

/// Headless device plus state cache, lending out `GpuContext`s
pub struct TestGpu {
    /// Inspection handle sharing state with the lent device
    pub device: HeadlessDevice,
    owned: HeadlessDevice,
    pub state: StateCache,
}

impl TestGpu {
    pub fn new() -> Self {
        let device = HeadlessDevice::new();
        Self { owned: device.clone(), device, state: StateCache::new() }
    }

    pub fn gpu(&mut self) -> GpuContext<'_> {
        GpuContext { device: &mut self.owned, state: &mut self.state, debug: true }
    }
}
