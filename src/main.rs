//! Boarding-gate controller — host simulation.
//!
//! Runs the full control loop against scripted inputs on a virtual
//! millisecond clock, so the whole arrival/boarding sequence can be
//! watched on a desk with no hardware attached:
//!
//! 1. the driver scans in and boards through the gate;
//! 2. passengers board until the occupancy alarm trips;
//! 3. a panic press suspends the gate mid-cycle;
//! 4. the station heartbeat arrives and the controller answers with
//!    its statistics snapshot.
//!
//! The registry persists to `./faregate-data/` the way flash does on
//! the vehicle, so a provisioned token set survives across runs (scan
//! counts are session-volatile).

use std::collections::VecDeque;

use anyhow::{Context, Result};
use log::info;

use faregate::adapters::console::LogEventSink;
use faregate::adapters::storage::FileStorage;
use faregate::adapters::time::MonotonicClock;
use faregate::app::ports::{
    ActuatorPort, ConfigPort, LinkPort, PresentedToken, SensorPort, TokenReaderPort,
};
use faregate::app::service::GateService;
use faregate::error::LinkError;
use faregate::gate::context::InputSnapshot;
use faregate::link::{HEARTBEAT, LineBuf};
use faregate::registry::Registry;

// ── Simulated hardware ────────────────────────────────────────

/// Pin-level state the script manipulates and the service polls.
#[derive(Default)]
struct SimHardware {
    inputs: InputSnapshot,
    tokens: VecDeque<PresentedToken>,
    gate_open: bool,
    alarm_on: bool,
}

impl SensorPort for SimHardware {
    fn read_inputs(&mut self) -> InputSnapshot {
        self.inputs
    }
}

impl TokenReaderPort for SimHardware {
    fn poll_token(&mut self) -> Option<PresentedToken> {
        self.tokens.pop_front()
    }
}

impl ActuatorPort for SimHardware {
    fn set_gate(&mut self, open: bool) {
        self.gate_open = open;
    }

    fn set_alarm(&mut self, on: bool) {
        self.alarm_on = on;
    }

    fn chirp(&mut self) {
        info!("sim: buzzer chirp");
    }
}

/// Loopback line channel standing in for the station serial link.
#[derive(Default)]
struct SimLink {
    rx: VecDeque<LineBuf>,
    tx: Vec<String>,
}

impl LinkPort for SimLink {
    fn poll_line(&mut self) -> Option<LineBuf> {
        self.rx.pop_front()
    }

    fn send_line(&mut self, line: &str) -> Result<(), LinkError> {
        info!("sim: tx {:?}", line.trim_end());
        self.tx.push(line.to_owned());
        Ok(())
    }
}

// ── Script ────────────────────────────────────────────────────

enum Action {
    Scan(&'static [u8]),
    SensorA(bool),
    SensorB(bool),
    Panic(bool),
    Heartbeat,
}

/// One boarding crossing: outer beam, both beams, inner beam, clear.
fn push_entry(script: &mut Vec<(u64, Action)>, t: u64) {
    script.push((t, Action::SensorA(true)));
    script.push((t + 100, Action::SensorB(true)));
    script.push((t + 200, Action::SensorA(false)));
    script.push((t + 300, Action::SensorB(false)));
}

fn build_script() -> Vec<(u64, Action)> {
    let driver: &[u8] = &[0xA4, 0x3B, 0x6C, 0x19];
    let mut script = Vec::new();

    // Driver scans in and boards.
    script.push((500, Action::Scan(driver)));
    push_entry(&mut script, 2000);

    // Gate closes on its own; six passengers board on the next card
    // grant, tripping the occupancy alarm at the sixth.
    script.push((9000, Action::Scan(driver)));
    for i in 0..6 {
        push_entry(&mut script, 10_500 + i * 500);
    }

    // Panic press mid-journey, then the window runs out.
    script.push((16_000, Action::Panic(true)));
    script.push((16_100, Action::Panic(false)));

    // Two passengers leave, clearing the overload.
    script.push((23_000, Action::SensorB(true)));
    script.push((23_100, Action::SensorA(true)));
    script.push((23_200, Action::SensorB(false)));
    script.push((23_300, Action::SensorA(false)));
    script.push((24_000, Action::SensorB(true)));
    script.push((24_100, Action::SensorA(true)));
    script.push((24_200, Action::SensorB(false)));
    script.push((24_300, Action::SensorA(false)));

    // Station pulls up: heartbeat, gate cycle, snapshot reply.
    script.push((26_000, Action::Heartbeat));

    script.sort_by_key(|(t, _)| *t);
    script
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("faregate-sim v{}", env!("CARGO_PKG_VERSION"));
    let wall = MonotonicClock::new();

    let mut storage = FileStorage::new("faregate-data").context("open storage directory")?;
    let config = storage.load().context("load configuration")?;
    let registry = Registry::load(&mut storage);
    info!("registry: {} token(s) loaded", registry.tokens().len());

    let mut service = GateService::new(config.clone(), registry);
    let mut hw = SimHardware::default();
    let mut link = SimLink::default();
    let mut sink = LogEventSink::new();

    service.start(&mut sink);

    let script = build_script();
    let mut next = 0;
    let step = u64::from(config.control_loop_interval_ms);

    // 35 simulated seconds on a virtual clock.
    let mut now_ms = 0u64;
    while now_ms <= 35_000 {
        while next < script.len() && script[next].0 <= now_ms {
            match script[next].1 {
                Action::Scan(id) => {
                    let mut token = PresentedToken::new();
                    // Scripted IDs fit the token capacity.
                    let _ = token.extend_from_slice(id);
                    hw.tokens.push_back(token);
                }
                Action::SensorA(level) => hw.inputs.sensor_a = level,
                Action::SensorB(level) => hw.inputs.sensor_b = level,
                Action::Panic(held) => hw.inputs.panic_pressed = held,
                Action::Heartbeat => {
                    let mut line = LineBuf::new();
                    let _ = line.push_str(HEARTBEAT);
                    link.rx.push_back(line);
                }
            }
            next += 1;
        }

        service.tick(now_ms, &mut hw, &mut link, &mut sink);
        now_ms += step;
    }

    info!(
        "simulation done in {} ms wall time: occupancy={} presses={} \
         overloads={} alarms=0b{:03b} cycles={}",
        wall.now_ms(),
        service.occupancy(),
        service.press_count(),
        service.overload_count(),
        service.alarm_conditions(),
        service.cycle_count(),
    );
    for line in &link.tx {
        info!("station received: {:?}", line.trim_end());
    }

    Ok(())
}
