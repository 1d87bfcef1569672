//! Mock adapters for integration tests.
//!
//! Records every actuator call and emitted event so tests can assert on
//! the full command history without touching real GPIO.

use std::collections::VecDeque;

use faregate::app::events::AppEvent;
use faregate::app::ports::{
    ActuatorPort, EventSink, LinkPort, PresentedToken, SensorPort, TokenReaderPort,
};
use faregate::error::LinkError;
use faregate::gate::context::InputSnapshot;
use faregate::link::LineBuf;

// ── MockHardware ──────────────────────────────────────────────

/// Combined sensor / token-reader / actuator mock. Tests set the pin
/// levels directly and queue token presentations.
pub struct MockHardware {
    pub inputs: InputSnapshot,
    pub tokens: VecDeque<PresentedToken>,
    pub gate_open: bool,
    pub alarm_on: bool,
    pub chirps: u32,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            inputs: InputSnapshot::default(),
            tokens: VecDeque::new(),
            gate_open: false,
            alarm_on: false,
            chirps: 0,
        }
    }

    /// Queue a token presentation for the next poll.
    pub fn present_token(&mut self, id: &[u8]) {
        let mut token = PresentedToken::new();
        token.extend_from_slice(id).expect("token id fits");
        self.tokens.push_back(token);
    }
}

impl SensorPort for MockHardware {
    fn read_inputs(&mut self) -> InputSnapshot {
        self.inputs
    }
}

impl TokenReaderPort for MockHardware {
    fn poll_token(&mut self) -> Option<PresentedToken> {
        self.tokens.pop_front()
    }
}

impl ActuatorPort for MockHardware {
    fn set_gate(&mut self, open: bool) {
        self.gate_open = open;
    }

    fn set_alarm(&mut self, on: bool) {
        self.alarm_on = on;
    }

    fn chirp(&mut self) {
        self.chirps += 1;
    }
}

// ── MockLink ──────────────────────────────────────────────────

/// In-memory line channel. Tests push received lines and inspect the
/// transmit log.
pub struct MockLink {
    pub rx: VecDeque<LineBuf>,
    pub tx: Vec<String>,
    pub fail_tx: bool,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            tx: Vec::new(),
            fail_tx: false,
        }
    }

    pub fn receive(&mut self, line: &str) {
        let mut buf = LineBuf::new();
        buf.push_str(line).expect("line fits");
        self.rx.push_back(buf);
    }
}

impl LinkPort for MockLink {
    fn poll_line(&mut self) -> Option<LineBuf> {
        self.rx.pop_front()
    }

    fn send_line(&mut self, line: &str) -> Result<(), LinkError> {
        if self.fail_tx {
            return Err(LinkError::WriteFailed);
        }
        self.tx.push(line.to_owned());
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Event sink that records everything emitted.
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count_of(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
