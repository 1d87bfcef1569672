//! Monotonic time source.
//!
//! The domain works entirely in milliseconds-since-boot (`u64`); this
//! adapter is the only place a real clock is read. Wraps
//! `std::time::Instant` on the host; a target port would wrap the
//! platform's high-resolution timer behind the same two methods.

/// Monotonic millisecond clock.
pub struct MonotonicClock {
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since the clock was created (monotonic).
    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Seconds since the clock was created (monotonic).
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}
