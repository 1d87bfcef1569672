//! Integration tests for the full control cycle: access, link, gate.
//!
//! Each test drives [`GateService::tick`] on a virtual clock at the
//! production poll rate and asserts on actuator state and the emitted
//! event stream.

use crate::mock_hw::{MockHardware, MockLink, RecordingSink};

use faregate::adapters::storage::MemStorage;
use faregate::app::events::AppEvent;
use faregate::app::service::GateService;
use faregate::config::SystemConfig;
use faregate::error::AlarmCondition;
use faregate::gate::{GatePhase, GateState};
use faregate::registry::Registry;

/// Everything a scenario needs, plus a virtual clock.
pub struct Rig {
    pub service: GateService,
    pub hw: MockHardware,
    pub link: MockLink,
    pub sink: RecordingSink,
    pub now: u64,
    step: u64,
}

impl Rig {
    pub fn new() -> Self {
        let config = SystemConfig::default();
        let step = u64::from(config.control_loop_interval_ms);
        let mut storage = MemStorage::new();
        let registry = Registry::load(&mut storage);

        let mut service = GateService::new(config, registry);
        let mut sink = RecordingSink::new();
        service.start(&mut sink);

        Self {
            service,
            hw: MockHardware::new(),
            link: MockLink::new(),
            sink,
            now: 0,
            step,
        }
    }

    pub fn tick(&mut self) {
        self.service
            .tick(self.now, &mut self.hw, &mut self.link, &mut self.sink);
        self.now += self.step;
    }

    /// Tick up to and including the cycle at `t`.
    pub fn run_until(&mut self, t: u64) {
        while self.now <= t {
            self.tick();
        }
    }

    pub fn driver_id(&self) -> Vec<u8> {
        self.service.registry().tokens()[0].id.to_vec()
    }
}

// ── Access-triggered gate cycle ───────────────────────────────

#[test]
fn card_grant_runs_full_gate_cycle() {
    let mut rig = Rig::new();
    let driver = rig.driver_id();
    rig.hw.present_token(&driver);

    // The grant is processed and the settle delay armed on the same cycle.
    rig.tick();
    assert_eq!(
        rig.sink.count_of(|e| matches!(e, AppEvent::AccessGranted { .. })),
        1
    );
    assert_eq!(rig.service.gate_phase(), GatePhase::Settling);
    assert_eq!(rig.service.gate_state(), GateState::Closed);
    assert!(!rig.hw.gate_open, "actuator must not move during settle");

    // Settle delay (1000 ms) elapses, the door opens.
    rig.run_until(1000);
    assert_eq!(rig.service.gate_phase(), GatePhase::Open);
    assert!(rig.hw.gate_open);
    assert_eq!(
        rig.sink.count_of(|e| matches!(
            e,
            AppEvent::GateChanged {
                from: GateState::Closed,
                to: GateState::Open
            }
        )),
        1
    );

    // Hold timeout (5000 ms) elapses with the doorway clear.
    rig.run_until(6000);
    assert_eq!(rig.service.gate_phase(), GatePhase::Closed);
    assert!(!rig.hw.gate_open);

    // A card-triggered cycle never transmits a snapshot.
    assert!(rig.link.tx.is_empty());
}

#[test]
fn unknown_token_denied_and_gate_stays_closed() {
    let mut rig = Rig::new();
    rig.hw.present_token(&[0x01, 0x02, 0x03]);

    rig.run_until(2000);
    assert_eq!(rig.sink.count_of(|e| matches!(e, AppEvent::AccessDenied)), 1);
    assert_eq!(rig.service.gate_phase(), GatePhase::Closed);
    assert!(!rig.hw.gate_open);
    // No scan count was touched.
    for token in rig.service.registry().tokens() {
        assert_eq!(token.scan_count, 0);
    }
}

#[test]
fn scans_ignored_while_gate_cycle_in_progress() {
    let mut rig = Rig::new();
    let driver = rig.driver_id();
    rig.hw.present_token(&driver);
    rig.run_until(1500); // mid-Open

    rig.hw.present_token(&driver);
    rig.run_until(2000);
    // No second grant, no count bump: the reader is only honoured Closed.
    assert_eq!(
        rig.sink.count_of(|e| matches!(e, AppEvent::AccessGranted { .. })),
        1
    );
    assert_eq!(rig.service.registry().tokens()[0].scan_count, 1);

    // Dropped means dropped: long after the gate has closed again the
    // mid-cycle scan must not surface as a deferred grant or re-open.
    rig.run_until(10_000);
    assert_eq!(rig.service.gate_phase(), GatePhase::Closed);
    assert_eq!(
        rig.sink.count_of(|e| matches!(e, AppEvent::AccessGranted { .. })),
        1
    );
    assert_eq!(rig.service.registry().tokens()[0].scan_count, 1);
}

// ── Station arrival cycle ─────────────────────────────────────

#[test]
fn heartbeat_opens_gate_and_sends_exactly_one_snapshot() {
    let mut rig = Rig::new();
    rig.link.receive("STN:ARRIVE");
    rig.tick();
    assert_eq!(rig.service.gate_phase(), GatePhase::Settling);

    // Repeated heartbeats during the cycle change nothing.
    rig.link.receive("STN:ARRIVE");
    rig.run_until(1000);
    assert_eq!(rig.service.gate_phase(), GatePhase::Open);
    assert_eq!(rig.link.tx.len(), 1, "one snapshot per arrival cycle");
    assert_eq!(rig.link.tx[0], "D:0,0,0\n");
    assert_eq!(rig.sink.count_of(|e| matches!(e, AppEvent::SnapshotSent)), 1);

    rig.link.receive("STN:ARRIVE");
    rig.run_until(6000);
    assert_eq!(rig.service.gate_phase(), GatePhase::Closed);
    assert_eq!(rig.link.tx.len(), 1);

    // After the close, the next heartbeat arms a fresh cycle.
    rig.link.receive("STN:ARRIVE");
    rig.run_until(6500);
    assert_eq!(rig.service.gate_phase(), GatePhase::Settling);
    rig.run_until(12_000);
    assert_eq!(rig.link.tx.len(), 2);
}

#[test]
fn snapshot_reports_token_usage() {
    let mut rig = Rig::new();
    let driver = rig.driver_id();

    // Driver scans in and the gate cycle completes.
    rig.hw.present_token(&driver);
    rig.run_until(6500);
    assert_eq!(rig.service.gate_phase(), GatePhase::Closed);

    // Station pulls up.
    rig.link.receive("STN:ARRIVE");
    rig.run_until(9000);
    assert_eq!(rig.link.tx.len(), 1);
    assert_eq!(rig.link.tx[0], "D:0,0,0,BUS DRIVER,1\n");
}

#[test]
fn failed_snapshot_transmit_does_not_stall_the_gate() {
    let mut rig = Rig::new();
    rig.link.fail_tx = true;
    rig.link.receive("STN:ARRIVE");
    rig.run_until(6000);

    // No SnapshotSent, but the cycle still ran to completion.
    assert_eq!(rig.sink.count_of(|e| matches!(e, AppEvent::SnapshotSent)), 0);
    assert_eq!(rig.service.gate_phase(), GatePhase::Closed);
}

// ── Obstruction hold ──────────────────────────────────────────

#[test]
fn gate_holds_open_over_an_obstruction() {
    let mut rig = Rig::new();
    let driver = rig.driver_id();
    rig.hw.present_token(&driver);
    rig.run_until(1000);
    assert_eq!(rig.service.gate_phase(), GatePhase::Open);

    // Someone stands in the doorway as the hold timeout (t=6000) elapses.
    rig.hw.inputs.sensor_a = true;
    rig.run_until(6100);
    assert_eq!(rig.service.gate_phase(), GatePhase::Open);
    assert!(rig.hw.gate_open);
    assert_eq!(
        rig.sink.count_of(|e| matches!(e, AppEvent::ObstructionHold)),
        1
    );
    assert_ne!(
        rig.service.alarm_conditions() & AlarmCondition::Obstruction.mask(),
        0
    );

    // Doorway clears; the gate closes once the re-armed hold elapses.
    rig.hw.inputs.sensor_a = false;
    rig.run_until(11_200);
    assert_eq!(rig.service.gate_phase(), GatePhase::Closed);
    assert!(!rig.hw.gate_open);
    assert_eq!(rig.service.alarm_conditions(), 0);
}

// ── Emergency ─────────────────────────────────────────────────

#[test]
fn panic_press_suspends_gate_until_window_elapses() {
    let mut rig = Rig::new();
    let driver = rig.driver_id();
    rig.hw.present_token(&driver);
    rig.tick(); // Settling, entered t=0

    rig.hw.inputs.panic_pressed = true;
    rig.tick();
    rig.hw.inputs.panic_pressed = false;

    assert_eq!(rig.hw.chirps, 1, "press acknowledged with a chirp");
    assert_eq!(
        rig.sink
            .count_of(|e| matches!(e, AppEvent::EmergencyActivated { .. })),
        1
    );
    assert!(rig.service.emergency_active());
    assert_eq!(
        rig.service.alarm_conditions(),
        AlarmCondition::Emergency.mask()
    );

    // Well past the settle delay, the gate has not moved: frozen.
    rig.run_until(4000);
    assert_eq!(rig.service.gate_phase(), GatePhase::Settling);
    assert!(!rig.hw.gate_open);

    // Window (5000 ms from the press at t=10) elapses, cycle resumes and
    // the long-due settle completes immediately.
    rig.run_until(5100);
    assert_eq!(rig.sink.count_of(|e| matches!(e, AppEvent::EmergencyCleared)), 1);
    assert!(!rig.service.emergency_active());
    assert_eq!(rig.service.gate_phase(), GatePhase::Open);
}

#[test]
fn held_panic_button_counts_one_press() {
    let mut rig = Rig::new();
    rig.hw.inputs.panic_pressed = true;
    rig.run_until(2000);
    assert_eq!(rig.service.press_count(), 1);
    assert_eq!(rig.hw.chirps, 1);
}

#[test]
fn scans_and_heartbeats_ignored_during_emergency() {
    let mut rig = Rig::new();
    let driver = rig.driver_id();

    rig.hw.inputs.panic_pressed = true;
    rig.tick();
    rig.hw.inputs.panic_pressed = false;

    rig.hw.present_token(&driver);
    rig.link.receive("STN:ARRIVE");
    rig.run_until(3000);
    assert_eq!(rig.service.gate_phase(), GatePhase::Closed);
    assert_eq!(
        rig.sink.count_of(|e| matches!(e, AppEvent::AccessGranted { .. })),
        0
    );
    assert!(rig.link.tx.is_empty());

    // After the window elapses the suspended-period inputs stay dropped:
    // no deferred grant, no deferred arrival cycle.
    rig.run_until(10_000);
    assert!(!rig.service.emergency_active());
    assert_eq!(rig.service.gate_phase(), GatePhase::Closed);
    assert_eq!(
        rig.sink.count_of(|e| matches!(e, AppEvent::AccessGranted { .. })),
        0
    );
    assert!(rig.link.tx.is_empty());
    assert_eq!(rig.service.registry().tokens()[0].scan_count, 0);
}
