//! Overload and emergency monitors.
//!
//! Both monitors run every cycle before the gate logic and are strictly
//! edge-triggered: the overload alarm fires once per upward threshold
//! crossing, and the panic button is debounced by comparing against the
//! previous sampled level.
//!
//! Neither monitor commands the gate. Overload only sounds the alarm
//! (closure stays with the gate's own timeout path), and emergency
//! suspends the rest of the control cycle from the service level.

use log::{info, warn};

use crate::config::SystemConfig;

// ---------------------------------------------------------------------------
// Overload
// ---------------------------------------------------------------------------

/// Transition reported by [`OverloadMonitor::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverloadTransition {
    /// Occupancy crossed above the threshold; alarm raised, count bumped.
    Raised,
    /// Occupancy returned to the threshold or below; latch released.
    Cleared,
}

/// Edge latch over the occupancy threshold.
///
/// The latch and the audible alarm are distinct: the alarm auto-silences
/// after a fixed duration, but the latch releases only when occupancy drops
/// back, so a continuously-overloaded vehicle alarms exactly once.
pub struct OverloadMonitor {
    threshold: u16,
    alarm_ms: u64,
    latched: bool,
    sounding: bool,
    silence_at_ms: u64,
    overload_count: u16,
}

impl OverloadMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            threshold: config.occupancy_threshold,
            alarm_ms: u64::from(config.overload_alarm_ms),
            latched: false,
            sounding: false,
            silence_at_ms: 0,
            overload_count: 0,
        }
    }

    /// Evaluate the latch against the live occupancy.
    pub fn update(&mut self, now_ms: u64, occupancy: u16) -> Option<OverloadTransition> {
        if self.sounding && now_ms >= self.silence_at_ms {
            // Auto-silence; the latch stays until occupancy drops.
            self.sounding = false;
        }

        if occupancy > self.threshold && !self.latched {
            self.latched = true;
            self.sounding = true;
            self.silence_at_ms = now_ms + self.alarm_ms;
            self.overload_count = self.overload_count.saturating_add(1);
            warn!(
                "overload: occupancy {} > {} (event #{})",
                occupancy, self.threshold, self.overload_count
            );
            return Some(OverloadTransition::Raised);
        }

        if occupancy <= self.threshold && self.latched {
            self.latched = false;
            self.sounding = false;
            info!("overload: cleared at occupancy {}", occupancy);
            return Some(OverloadTransition::Cleared);
        }

        None
    }

    /// Whether the alarm output should currently sound.
    pub fn alarm_sounding(&self) -> bool {
        self.sounding
    }

    /// Whether the latch is set (occupancy has not dropped back yet).
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Monotonic count of upward threshold crossings.
    pub fn overload_count(&self) -> u16 {
        self.overload_count
    }
}

// ---------------------------------------------------------------------------
// Emergency
// ---------------------------------------------------------------------------

/// Emergency alert state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencyState {
    Inactive,
    Active,
}

/// Event reported by [`EmergencyMonitor::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencyEvent {
    /// A debounced panic press was registered (tone should chirp).
    Pressed,
    /// The alert window elapsed; normal evaluation resumes.
    Expired,
}

/// Panic-button monitor.
///
/// The button is active-low at the pin; the input adapter normalises it so
/// `pressed == true` means the button is held. Debounce is edge detection
/// against the previous sampled level. A press while already active still
/// counts and refreshes the window.
pub struct EmergencyMonitor {
    state: EmergencyState,
    window_ms: u64,
    activated_at_ms: u64,
    press_count: u16,
    prev_pressed: bool,
}

impl EmergencyMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            state: EmergencyState::Inactive,
            window_ms: u64::from(config.emergency_window_ms),
            activated_at_ms: 0,
            press_count: 0,
            prev_pressed: false,
        }
    }

    /// Sample the panic input and advance the alert window.
    pub fn update(&mut self, now_ms: u64, pressed: bool) -> Option<EmergencyEvent> {
        // Window expiry first, so a press in the same poll re-activates.
        if self.state == EmergencyState::Active
            && now_ms.saturating_sub(self.activated_at_ms) >= self.window_ms
        {
            self.state = EmergencyState::Inactive;
            info!("emergency: window elapsed, resuming normal operation");
            let edge = pressed && !self.prev_pressed;
            self.prev_pressed = pressed;
            if !edge {
                return Some(EmergencyEvent::Expired);
            }
            self.activate(now_ms);
            return Some(EmergencyEvent::Pressed);
        }

        let edge = pressed && !self.prev_pressed;
        self.prev_pressed = pressed;
        if edge {
            self.activate(now_ms);
            return Some(EmergencyEvent::Pressed);
        }
        None
    }

    fn activate(&mut self, now_ms: u64) {
        self.press_count = self.press_count.saturating_add(1);
        self.activated_at_ms = now_ms;
        self.state = EmergencyState::Active;
        warn!("emergency: panic press #{}, alert active", self.press_count);
    }

    pub fn state(&self) -> EmergencyState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == EmergencyState::Active
    }

    /// Monotonic count of debounced panic presses.
    pub fn press_count(&self) -> u16 {
        self.press_count
    }
}
