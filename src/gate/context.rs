//! Shared mutable context threaded through every gate state handler.
//!
//! `GateContext` is the blackboard the state handlers read from and write
//! to: the per-cycle clock, the input snapshot distilled to what the gate
//! cares about, the pending open request, and the actuator command output.

use crate::config::SystemConfig;

// ---------------------------------------------------------------------------
// Input snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// A point-in-time sample of every binary input in the system.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    /// Outer crossing sensor (doorway side A).
    pub sensor_a: bool,
    /// Inner crossing sensor (doorway side B).
    pub sensor_b: bool,
    /// Panic button, normalised so `true` = held (pin is active-low).
    pub panic_pressed: bool,
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

/// Commands the gate FSM writes to request actuator positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateCommands {
    /// Desired door position: `true` = open.
    pub door_open: bool,
}

// ---------------------------------------------------------------------------
// Open request
// ---------------------------------------------------------------------------

/// Why the gate was asked to open. Requests arrive only while Closed;
/// anything later in an open cycle is dropped, never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenReason {
    /// A registered token was granted by access control.
    CardGranted,
    /// The station's arrival heartbeat was recognised.
    StationArrival,
}

// ---------------------------------------------------------------------------
// GateContext
// ---------------------------------------------------------------------------

/// The shared context passed to every gate state handler.
pub struct GateContext {
    // -- Timing --
    /// The cycle's single monotonic clock read (milliseconds).
    pub now_ms: u64,
    /// Milliseconds since the current phase was entered. Engine-maintained.
    pub ms_in_state: u64,

    // -- Inputs --
    /// Both crossing sensors read clear this cycle (no obstruction).
    pub sensors_clear: bool,
    /// Pending open request, set by the service, consumed by `Closed`.
    pub open_request: Option<OpenReason>,

    // -- Phase-local timing --
    /// Absolute deadline for the open-hold timeout. Set on Open entry and
    /// re-armed on every obstruction hold.
    pub hold_deadline_ms: u64,

    // -- Outputs --
    /// Actuator command for this cycle.
    pub commands: GateCommands,
    /// Reason behind the open cycle in progress.
    pub open_reason: Option<OpenReason>,
    /// Set when a due close was blocked by an obstruction this cycle.
    /// One-shot: the service consumes and clears it.
    pub obstruction_hold: bool,

    // -- Configuration --
    pub config: SystemConfig,
}

impl GateContext {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            now_ms: 0,
            ms_in_state: 0,
            sensors_clear: true,
            open_request: None,
            hold_deadline_ms: 0,
            commands: GateCommands::default(),
            open_reason: None,
            obstruction_hold: false,
            config,
        }
    }
}
