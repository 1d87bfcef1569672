//! Outbound application events.
//!
//! The [`GateService`](super::service::GateService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them — log to serial, update the driver display,
//! record in a test harness.

use crate::gate::GateState;
use crate::registry::TokenName;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller has started (carries the initial gate state).
    Started(GateState),

    /// The externally visible gate state changed.
    GateChanged { from: GateState, to: GateState },

    /// A registered token was granted.
    AccessGranted { name: TokenName, scan_count: u16 },

    /// An unknown token was presented. No state change.
    AccessDenied,

    /// A validated entry crossing completed.
    PassengerEntered { occupancy: u16 },

    /// A validated exit crossing completed.
    PassengerExited { occupancy: u16 },

    /// Occupancy crossed above the threshold; alarm raised.
    OverloadRaised { overload_count: u16 },

    /// Occupancy returned to the threshold or below.
    OverloadCleared,

    /// A debounced panic press was registered; alert window active.
    EmergencyActivated { press_count: u16 },

    /// The emergency window elapsed; normal evaluation resumed.
    EmergencyCleared,

    /// A due close was blocked by a sensed obstruction; gate held open.
    ObstructionHold,

    /// One snapshot line was transmitted to the station.
    SnapshotSent,
}
