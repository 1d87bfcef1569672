//! Application service — the hexagonal core.
//!
//! [`GateService`] owns the registry, counter, monitors, link latch, and
//! gate FSM, and runs one control cycle per [`tick`](GateService::tick) in
//! the fixed priority order the design requires:
//!
//! 1. sample every input once (a single consistent "now");
//! 2. emergency input — can suspend everything below;
//! 3. link input (arrival heartbeat);
//! 4. access input (token scan);
//! 5. crossing sensors;
//! 6. alarm timers;
//! 7. gate FSM last, so a same-cycle open request is not immediately undone;
//! 8. apply actuator commands.
//!
//! Every transition completes within the cycle that starts it; no partial
//! update is ever left pending across cycles.

use log::warn;

use crate::access::{AccessDecision, authenticate};
use crate::alarms::{EmergencyEvent, EmergencyMonitor, OverloadMonitor, OverloadTransition};
use crate::config::SystemConfig;
use crate::counter::{CrossingEvent, PassengerCounter};
use crate::error::AlarmCondition;
use crate::gate::context::{GateContext, OpenReason};
use crate::gate::states::build_state_table;
use crate::gate::{GateFsm, GatePhase, GateState};
use crate::link::{AdminSnapshot, StationLink};
use crate::registry::Registry;

use super::events::AppEvent;
use super::ports::{ActuatorPort, EventSink, LinkPort, SensorPort, TokenReaderPort};

// ───────────────────────────────────────────────────────────────
// GateService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct GateService {
    registry: Registry,
    counter: PassengerCounter,
    overload: OverloadMonitor,
    emergency: EmergencyMonitor,
    link: StationLink,
    fsm: GateFsm,
    ctx: GateContext,
    /// A close is currently blocked by an obstruction. Clears on gate close.
    obstructed: bool,
    cycle_count: u64,
}

impl GateService {
    /// Construct the service around an already-loaded registry.
    ///
    /// Does **not** start the FSM — call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, registry: Registry) -> Self {
        let counter = PassengerCounter::new(&config);
        let overload = OverloadMonitor::new(&config);
        let emergency = EmergencyMonitor::new(&config);
        let ctx = GateContext::new(config);
        let fsm = GateFsm::new(build_state_table(), GatePhase::Closed);

        Self {
            registry,
            counter,
            overload,
            emergency,
            link: StationLink::new(),
            fsm,
            ctx,
            obstructed: false,
            cycle_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the gate FSM's initial entry and announce the start.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.state()));
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full control cycle.
    ///
    /// The `hw` parameter satisfies the sensor, token-reader, and actuator
    /// ports together — one mutable borrow for the whole hardware side,
    /// with the port boundary kept explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + TokenReaderPort + ActuatorPort),
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        self.cycle_count += 1;
        self.ctx.now_ms = now_ms;

        // 1. One input sample for the whole cycle. The token reader and
        // link are drained here unconditionally: a scan or line that
        // arrives when it cannot be acted on is dropped, never queued.
        let inputs = hw.read_inputs();
        let token = hw.poll_token();
        let line = link.poll_line();

        // 2. Emergency evaluation strictly precedes everything else.
        match self.emergency.update(now_ms, inputs.panic_pressed) {
            Some(EmergencyEvent::Pressed) => {
                hw.chirp();
                sink.emit(&AppEvent::EmergencyActivated {
                    press_count: self.emergency.press_count(),
                });
            }
            Some(EmergencyEvent::Expired) => sink.emit(&AppEvent::EmergencyCleared),
            None => {}
        }

        if self.emergency.is_active() {
            // Alert window: gate, access, link, and counting are all
            // suspended. The token and line sampled above are discarded.
            // Only the alarm silence timer keeps running (occupancy is
            // frozen, so no overload edge can occur).
            self.update_overload(now_ms, sink);
            self.apply_actuators(hw);
            return;
        }

        // 3. Link input: arrival heartbeat starts an open cycle.
        if let Some(line) = line {
            if self.fsm.current_phase() == GatePhase::Closed
                && self.link.on_line(&line)
            {
                self.ctx.open_request = Some(OpenReason::StationArrival);
            }
        }

        // 4. Access input: scans count only while the gate is fully closed.
        if self.fsm.current_phase() == GatePhase::Closed {
            if let Some(id) = token {
                match authenticate(&mut self.registry, &id) {
                    AccessDecision::Granted { name, scan_count } => {
                        sink.emit(&AppEvent::AccessGranted { name, scan_count });
                        if self.ctx.open_request.is_none() {
                            self.ctx.open_request = Some(OpenReason::CardGranted);
                        }
                    }
                    AccessDecision::Denied => sink.emit(&AppEvent::AccessDenied),
                }
            }
        }

        // 5. Crossing sensors.
        match self.counter.poll(now_ms, inputs.sensor_a, inputs.sensor_b) {
            Some(CrossingEvent::Entry) => sink.emit(&AppEvent::PassengerEntered {
                occupancy: self.counter.occupancy(),
            }),
            Some(CrossingEvent::Exit) => sink.emit(&AppEvent::PassengerExited {
                occupancy: self.counter.occupancy(),
            }),
            None => {}
        }

        // 6. Alarm timers.
        self.update_overload(now_ms, sink);

        // 7. Gate FSM last.
        let prev_phase = self.fsm.current_phase();
        self.ctx.sensors_clear = !inputs.sensor_a && !inputs.sensor_b;
        self.fsm.tick(&mut self.ctx);
        let new_phase = self.fsm.current_phase();

        if self.ctx.obstruction_hold {
            self.ctx.obstruction_hold = false;
            self.obstructed = true;
            sink.emit(&AppEvent::ObstructionHold);
        }

        if new_phase != prev_phase {
            self.on_phase_change(prev_phase, new_phase, link, sink);
        }

        // 8. Apply actuator commands.
        self.apply_actuators(hw);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Externally visible gate state.
    pub fn gate_state(&self) -> GateState {
        self.fsm.state()
    }

    /// Internal gate phase (diagnostics and tests).
    pub fn gate_phase(&self) -> GatePhase {
        self.fsm.current_phase()
    }

    /// Live occupancy.
    pub fn occupancy(&self) -> u16 {
        self.counter.occupancy()
    }

    /// Whether the emergency alert window is active.
    pub fn emergency_active(&self) -> bool {
        self.emergency.is_active()
    }

    /// Monotonic panic press count.
    pub fn press_count(&self) -> u16 {
        self.emergency.press_count()
    }

    /// Monotonic overload event count.
    pub fn overload_count(&self) -> u16 {
        self.overload.overload_count()
    }

    /// Active alarm conditions as a bitmask of [`AlarmCondition`] flags.
    pub fn alarm_conditions(&self) -> u8 {
        let mut mask = 0;
        if self.overload.is_latched() {
            mask |= AlarmCondition::Overload.mask();
        }
        if self.emergency.is_active() {
            mask |= AlarmCondition::Emergency.mask();
        }
        if self.obstructed {
            mask |= AlarmCondition::Obstruction.mask();
        }
        mask
    }

    /// The loaded registry (read-only).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Total control cycles executed since startup.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Build the aggregate statistics payload from the live counters.
    pub fn build_snapshot(&self) -> AdminSnapshot {
        AdminSnapshot::gather(
            &self.registry,
            self.counter.occupancy(),
            self.emergency.press_count(),
            self.overload.overload_count(),
        )
    }

    // ── Internal ──────────────────────────────────────────────

    fn update_overload(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        match self.overload.update(now_ms, self.counter.occupancy()) {
            Some(OverloadTransition::Raised) => sink.emit(&AppEvent::OverloadRaised {
                overload_count: self.overload.overload_count(),
            }),
            Some(OverloadTransition::Cleared) => sink.emit(&AppEvent::OverloadCleared),
            None => {}
        }
    }

    fn on_phase_change(
        &mut self,
        prev: GatePhase,
        next: GatePhase,
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        let (from, to) = (prev.gate_state(), next.gate_state());
        if from != to {
            sink.emit(&AppEvent::GateChanged { from, to });
        }

        // Arrival cycle: one snapshot line, exactly when the gate opens.
        if next == GatePhase::Open && self.ctx.open_reason == Some(OpenReason::StationArrival) {
            match self.build_snapshot().encode() {
                Ok(line) => match link.send_line(&line) {
                    Ok(()) => sink.emit(&AppEvent::SnapshotSent),
                    // Best-effort: the next exchange supersedes this one.
                    Err(e) => warn!("link: snapshot transmit failed ({e})"),
                },
                Err(e) => warn!("link: snapshot encode failed ({e})"),
            }
        }

        if next == GatePhase::Closed {
            self.obstructed = false;
            self.link.on_gate_closed();
        }
    }

    /// Translate FSM commands and alarm state into port calls.
    fn apply_actuators(&self, hw: &mut impl ActuatorPort) {
        hw.set_gate(self.ctx.commands.door_open);
        hw.set_alarm(self.overload.alarm_sounding());
    }
}
