//! Dual-sensor directional passenger counter.
//!
//! Two proximity sensors A (outer) and B (inner) bracket the doorway. A
//! passenger entering breaks A then B; one exiting breaks B then A. The
//! half-completed sequence is held in [`CrossingState`] and must complete
//! within a bounded window or it is abandoned without counting.
//!
//! | State       | Trigger                     | Next          | Effect          |
//! |-------------|-----------------------------|---------------|-----------------|
//! | Idle        | A fires, B clear            | EntryArmed(t) | none            |
//! | Idle        | B fires, A clear            | ExitArmed(t)  | none            |
//! | EntryArmed  | B fires within window       | Idle          | occupancy += 1  |
//! | ExitArmed   | A fires within window       | Idle          | occupancy -= 1  |
//! | *Armed*     | window elapses              | Idle          | none (abandon)  |
//!
//! "Fires" is a rising edge against the previous sampled level. A debounce
//! interval after each completed crossing rejects sensor chatter before a
//! new sequence may arm. Both sensors firing in the same poll with no prior
//! arm is ambiguous and discarded — deliberate policy, not a bug.

use log::debug;

use crate::config::SystemConfig;

/// A half-completed two-sensor crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingState {
    Idle,
    EntryArmed { armed_at_ms: u64 },
    ExitArmed { armed_at_ms: u64 },
}

/// A validated, completed crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingEvent {
    Entry,
    Exit,
}

pub struct PassengerCounter {
    state: CrossingState,
    occupancy: u16,
    window_ms: u64,
    debounce_ms: u64,
    /// No new sequence may arm before this deadline.
    debounce_until_ms: u64,
    prev_a: bool,
    prev_b: bool,
}

impl PassengerCounter {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            state: CrossingState::Idle,
            occupancy: 0,
            window_ms: u64::from(config.crossing_window_ms),
            debounce_ms: u64::from(config.crossing_debounce_ms),
            debounce_until_ms: 0,
            prev_a: false,
            prev_b: false,
        }
    }

    /// Live occupancy. Non-negative by construction; reset only by restart.
    pub fn occupancy(&self) -> u16 {
        self.occupancy
    }

    /// Current sequence state (exposed for diagnostics and tests).
    pub fn state(&self) -> CrossingState {
        self.state
    }

    /// Advance the counter by one poll of the raw sensor levels.
    /// Returns a validated crossing, if one completed this poll.
    pub fn poll(&mut self, now_ms: u64, a: bool, b: bool) -> Option<CrossingEvent> {
        let fired_a = a && !self.prev_a;
        let fired_b = b && !self.prev_b;
        self.prev_a = a;
        self.prev_b = b;

        match self.state {
            CrossingState::Idle => {
                if now_ms < self.debounce_until_ms {
                    return None;
                }
                if fired_a && fired_b {
                    // Simultaneous fire with no prior arm: direction is
                    // unknowable, count neither way.
                    debug!("counter: ambiguous simultaneous fire discarded");
                    return None;
                }
                if fired_a && !b {
                    self.state = CrossingState::EntryArmed { armed_at_ms: now_ms };
                } else if fired_b && !a {
                    self.state = CrossingState::ExitArmed { armed_at_ms: now_ms };
                }
                None
            }

            CrossingState::EntryArmed { armed_at_ms } => {
                if fired_b && now_ms.saturating_sub(armed_at_ms) <= self.window_ms {
                    self.occupancy = self.occupancy.saturating_add(1);
                    self.complete(now_ms);
                    return Some(CrossingEvent::Entry);
                }
                if now_ms.saturating_sub(armed_at_ms) > self.window_ms {
                    debug!("counter: entry sequence abandoned");
                    self.state = CrossingState::Idle;
                }
                None
            }

            CrossingState::ExitArmed { armed_at_ms } => {
                if fired_a && now_ms.saturating_sub(armed_at_ms) <= self.window_ms {
                    self.occupancy = self.occupancy.saturating_sub(1);
                    self.complete(now_ms);
                    return Some(CrossingEvent::Exit);
                }
                if now_ms.saturating_sub(armed_at_ms) > self.window_ms {
                    debug!("counter: exit sequence abandoned");
                    self.state = CrossingState::Idle;
                }
                None
            }
        }
    }

    fn complete(&mut self, now_ms: u64) {
        self.state = CrossingState::Idle;
        self.debounce_until_ms = now_ms + self.debounce_ms;
    }
}
