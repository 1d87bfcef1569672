//! System configuration parameters
//!
//! All tunable timing and threshold parameters for the boarding-gate
//! controller. Values can be overridden via persisted storage at boot.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Passenger counting ---
    /// Two-sensor crossing completion window (milliseconds)
    pub crossing_window_ms: u32,
    /// Quiet interval after a completed crossing before re-arming (milliseconds)
    pub crossing_debounce_ms: u32,

    // --- Occupancy ---
    /// Occupancy above this value latches the overload alarm
    pub occupancy_threshold: u16,
    /// Overload alarm auto-silence duration (milliseconds)
    pub overload_alarm_ms: u32,

    // --- Emergency ---
    /// Emergency alert window after a panic press (milliseconds)
    pub emergency_window_ms: u32,

    // --- Gate ---
    /// Settle delay between an open trigger and the actuator moving (milliseconds)
    pub gate_settle_ms: u32,
    /// Minimum time the gate stays open before a close is attempted (milliseconds)
    pub gate_open_hold_ms: u32,

    // --- Station link ---
    /// Expected station heartbeat period (milliseconds) — informational,
    /// the vehicle never times out on a missing heartbeat
    pub heartbeat_period_ms: u32,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Counting
            crossing_window_ms: 1000,
            crossing_debounce_ms: 50,

            // Occupancy
            occupancy_threshold: 5,
            overload_alarm_ms: 3000,

            // Emergency
            emergency_window_ms: 5000,

            // Gate
            gate_settle_ms: 1000,
            gate_open_hold_ms: 5000,

            // Link
            heartbeat_period_ms: 5000,

            // Timing
            control_loop_interval_ms: 10, // 100 Hz poll
        }
    }
}
