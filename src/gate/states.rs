//! Concrete gate state handler functions and table builder.
//!
//! Each phase is defined by plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  CLOSED ──[open request]──▶ SETTLING ──[settle delay]──▶ OPEN
//!    ▲                                                       │
//!    └────────[hold timeout elapsed AND sensors clear]───────┘
//!
//!  OPEN with timeout elapsed but a sensor blocked: stay OPEN, re-arm the
//!  hold timeout, raise the obstruction condition. Safety over schedule.
//! ```
//!
//! During an emergency alert the service does not tick the FSM at all, so
//! no transition can occur for the duration of the alert window.

use log::{info, warn};

use super::context::GateContext;
use super::{GatePhase, StateDescriptor};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table. Called once at startup.
pub fn build_state_table() -> [StateDescriptor; GatePhase::COUNT] {
    [
        // Index 0 — Closed
        StateDescriptor {
            id: GatePhase::Closed,
            name: "Closed",
            on_enter: Some(closed_enter),
            on_exit: None,
            on_update: closed_update,
        },
        // Index 1 — Settling
        StateDescriptor {
            id: GatePhase::Settling,
            name: "Settling",
            on_enter: Some(settling_enter),
            on_exit: None,
            on_update: settling_update,
        },
        // Index 2 — Open
        StateDescriptor {
            id: GatePhase::Open,
            name: "Open",
            on_enter: Some(open_enter),
            on_exit: Some(open_exit),
            on_update: open_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLOSED phase
// ═══════════════════════════════════════════════════════════════════════════

fn closed_enter(ctx: &mut GateContext) {
    ctx.commands.door_open = false;
    info!("gate: CLOSED");
}

fn closed_update(ctx: &mut GateContext) -> Option<GatePhase> {
    if let Some(reason) = ctx.open_request.take() {
        ctx.open_reason = Some(reason);
        return Some(GatePhase::Settling);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SETTLING phase — armed, waiting for the vehicle to come to rest
// ═══════════════════════════════════════════════════════════════════════════

fn settling_enter(ctx: &mut GateContext) {
    // Actuator does not move yet.
    info!(
        "gate: SETTLING for {} ms ({:?})",
        ctx.config.gate_settle_ms, ctx.open_reason
    );
}

fn settling_update(ctx: &mut GateContext) -> Option<GatePhase> {
    // Requests arriving mid-cycle are dropped, never queued.
    ctx.open_request = None;

    if ctx.ms_in_state >= u64::from(ctx.config.gate_settle_ms) {
        return Some(GatePhase::Open);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  OPEN phase
// ═══════════════════════════════════════════════════════════════════════════

fn open_enter(ctx: &mut GateContext) {
    ctx.commands.door_open = true;
    ctx.hold_deadline_ms = ctx.now_ms + u64::from(ctx.config.gate_open_hold_ms);
    info!("gate: OPEN, hold until t={} ms", ctx.hold_deadline_ms);
}

fn open_exit(ctx: &mut GateContext) {
    ctx.open_reason = None;
}

fn open_update(ctx: &mut GateContext) -> Option<GatePhase> {
    ctx.open_request = None;

    if ctx.now_ms < ctx.hold_deadline_ms {
        return None;
    }

    if ctx.sensors_clear {
        return Some(GatePhase::Closed);
    }

    // Timeout elapsed but someone is in the doorway: hold open, re-arm,
    // and surface the condition. Retried every cycle indefinitely.
    if !ctx.obstruction_hold {
        warn!("gate: close blocked by obstruction, re-arming hold timeout");
    }
    ctx.obstruction_hold = true;
    ctx.hold_deadline_ms = ctx.now_ms + u64::from(ctx.config.gate_open_hold_ms);
    None
}
