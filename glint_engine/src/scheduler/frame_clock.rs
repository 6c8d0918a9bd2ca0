/// Frame clock - converts tick timestamps into wall-clock frames of reference
///
/// Hosts pass the raw tick timestamp (milliseconds since the session's time
/// origin, as a display-refresh callback reports it). Subscribers receive the
/// same instant three ways: raw, as Unix epoch milliseconds, and as
/// milliseconds since the start of the origin's calendar month. The month
/// frame keeps `f32` shader time precise for long-running sessions.

use chrono::{DateTime, Local, TimeZone, Datelike};

/// Timing data handed to animation frame subscribers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Raw tick timestamp in milliseconds
    pub timestamp: f64,
    /// Milliseconds since the Unix epoch
    pub epoch_time: f64,
    /// Milliseconds since the start of the origin's month
    pub month_time: f64,
    /// Tick counter, starting at 0
    pub frame_number: u64,
}

/// Time origin of a renderer session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    origin_epoch_ms: f64,
    month_offset_ms: f64,
}

impl FrameClock {
    /// Clock whose origin is now, in local time
    pub fn new() -> Self {
        Self::with_origin(Local::now())
    }

    /// Clock whose origin is `origin`; the month start is taken in its zone
    pub fn with_origin<Tz: TimeZone>(origin: DateTime<Tz>) -> Self {
        let origin_epoch_ms = origin.timestamp_millis() as f64;
        let month_start = origin
            .timezone()
            .with_ymd_and_hms(origin.year(), origin.month(), 1, 0, 0, 0)
            .earliest()
            .map(|start| start.timestamp_millis() as f64)
            .unwrap_or(origin_epoch_ms);

        Self {
            origin_epoch_ms,
            month_offset_ms: origin_epoch_ms - month_start,
        }
    }

    /// Origin as Unix epoch milliseconds
    pub fn origin_epoch_ms(&self) -> f64 {
        self.origin_epoch_ms
    }

    /// Distance in milliseconds from the month start to the origin
    pub fn month_offset_ms(&self) -> f64 {
        self.month_offset_ms
    }

    /// Build the frame info for one tick
    pub fn frame_info(&self, timestamp: f64, frame_number: u64) -> FrameInfo {
        FrameInfo {
            timestamp,
            epoch_time: timestamp + self.origin_epoch_ms,
            month_time: timestamp + self.month_offset_ms,
            frame_number,
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "frame_clock_tests.rs"]
mod tests;
