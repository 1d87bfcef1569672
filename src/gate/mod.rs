//! Function-pointer finite state machine for the door actuator.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌──────────┬───────────┬──────────┬───────────────────┐ │
//! │  │ GatePhase │ on_enter │ on_exit  │ on_update         │ │
//! │  ├──────────┼───────────┼──────────┼───────────────────┤ │
//! │  │ Closed    │ fn(ctx)  │ fn(ctx)  │ fn(ctx)->Option<> │ │
//! │  │ Settling  │ fn(ctx)  │ fn(ctx)  │ fn(ctx)->Option<> │ │
//! │  │ Open      │ fn(ctx)  │ fn(ctx)  │ fn(ctx)->Option<> │ │
//! │  └──────────┴───────────┴──────────┴───────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each cycle the engine calls `on_update` for the **current** phase. If it
//! returns `Some(next)`, the engine runs `on_exit`, then `on_enter` for the
//! next phase. All handlers receive `&mut GateContext`, which holds the
//! cycle clock, inputs, pending requests, and actuator commands. The engine
//! owns the actuator position exclusively — every door write funnels
//! through `GateContext::commands`.

pub mod context;
pub mod states;

use context::GateContext;
use log::info;

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// Internal gate phases. `Settling` is the armed settle delay between an
/// open trigger and the actuator moving; externally it still reads as
/// [`GateState::Closed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GatePhase {
    Closed = 0,
    Settling = 1,
    Open = 2,
}

/// Externally visible gate state: the actuator position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Closed,
    Open,
}

impl GatePhase {
    /// Total number of phases — sizes the table array.
    pub const COUNT: usize = 3;

    /// Convert a `u8` index back to `GatePhase`. Panics on out-of-range in
    /// debug builds; returns `Closed` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Closed,
            1 => Self::Settling,
            2 => Self::Open,
            _ => {
                debug_assert!(false, "invalid phase index: {idx}");
                Self::Closed
            }
        }
    }

    /// The actuator position this phase corresponds to.
    pub fn gate_state(self) -> GateState {
        match self {
            Self::Closed | Self::Settling => GateState::Closed,
            Self::Open => GateState::Open,
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut GateContext);

/// Signature for the per-cycle update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut GateContext) -> Option<GatePhase>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single gate phase.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: GatePhase,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The gate state machine engine.
pub struct GateFsm {
    /// Fixed-size table indexed by `GatePhase as usize`.
    table: [StateDescriptor; GatePhase::COUNT],
    /// Index of the currently active phase.
    current: usize,
    /// `now_ms` at which the current phase was entered.
    entered_at_ms: u64,
}

impl GateFsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; GatePhase::COUNT], initial: GatePhase) -> Self {
        Self {
            table,
            current: initial as usize,
            entered_at_ms: 0,
        }
    }

    /// Run the initial `on_enter` for the starting phase.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut GateContext) {
        info!("gate FSM starting in phase: {}", self.table[self.current].name);
        self.entered_at_ms = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one control cycle. The caller must have set
    /// `ctx.now_ms` from the cycle's single clock read.
    pub fn tick(&mut self, ctx: &mut GateContext) {
        ctx.ms_in_state = ctx.now_ms.saturating_sub(self.entered_at_ms);

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// The current internal phase.
    pub fn current_phase(&self) -> GatePhase {
        GatePhase::from_index(self.current)
    }

    /// The externally visible gate state.
    pub fn state(&self) -> GateState {
        self.current_phase().gate_state()
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: GatePhase, ctx: &mut GateContext) {
        let next_idx = next_id as usize;

        info!(
            "gate transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.entered_at_ms = ctx.now_ms;
        ctx.ms_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
