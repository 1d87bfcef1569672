//! GPIO hardware adapter over `embedded-hal` 1.0 traits.
//!
//! This is the only module that touches pin-level I/O. Everything is
//! generic over the HAL traits, so the same adapter drives real pins on
//! the vehicle and mock pins in tests.
//!
//! Wiring conventions:
//! - Crossing sensors A and B are active-high (beam interrupted = high).
//! - The panic button is wired active-low with a pull-up; a low level
//!   means pressed. Normalised here so the domain only sees `pressed`.
//! - Gate, alarm, and buzzer outputs are active-high.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::app::ports::{ActuatorPort, LinkPort, PresentedToken, SensorPort, TokenReaderPort};
use crate::error::LinkError;
use crate::gate::context::InputSnapshot;
use crate::link::LineBuf;

/// Chirp pulse width for the panic-press acknowledgment tone.
const CHIRP_PULSE_US: u32 = 5_000;

// ── Input side ────────────────────────────────────────────────

/// [`SensorPort`] over three digital input pins.
///
/// A pin read error keeps the previous good level. A flaky sensor must
/// degrade counting accuracy, never crash the control loop.
pub struct GpioInputs<A, B, P> {
    sensor_a: A,
    sensor_b: B,
    panic_btn: P,
    last: InputSnapshot,
}

impl<A: InputPin, B: InputPin, P: InputPin> GpioInputs<A, B, P> {
    pub fn new(sensor_a: A, sensor_b: B, panic_btn: P) -> Self {
        Self {
            sensor_a,
            sensor_b,
            panic_btn,
            last: InputSnapshot::default(),
        }
    }
}

impl<A: InputPin, B: InputPin, P: InputPin> SensorPort for GpioInputs<A, B, P> {
    fn read_inputs(&mut self) -> InputSnapshot {
        match self.sensor_a.is_high() {
            Ok(level) => self.last.sensor_a = level,
            Err(_) => warn!("hal: sensor A read failed, holding last level"),
        }
        match self.sensor_b.is_high() {
            Ok(level) => self.last.sensor_b = level,
            Err(_) => warn!("hal: sensor B read failed, holding last level"),
        }
        // Active-low button: low means pressed.
        match self.panic_btn.is_low() {
            Ok(pressed) => self.last.panic_pressed = pressed,
            Err(_) => warn!("hal: panic button read failed, holding last level"),
        }
        self.last
    }
}

// ── Output side ───────────────────────────────────────────────

/// [`ActuatorPort`] over three digital output pins plus a delay source
/// for the chirp pulse.
pub struct GpioOutputs<G, L, Z, D> {
    gate: G,
    alarm: L,
    buzzer: Z,
    delay: D,
}

impl<G: OutputPin, L: OutputPin, Z: OutputPin, D: DelayNs> GpioOutputs<G, L, Z, D> {
    pub fn new(gate: G, alarm: L, buzzer: Z, delay: D) -> Self {
        Self {
            gate,
            alarm,
            buzzer,
            delay,
        }
    }
}

impl<G: OutputPin, L: OutputPin, Z: OutputPin, D: DelayNs> ActuatorPort
    for GpioOutputs<G, L, Z, D>
{
    fn set_gate(&mut self, open: bool) {
        let result = if open {
            self.gate.set_high()
        } else {
            self.gate.set_low()
        };
        if result.is_err() {
            warn!("hal: gate pin write failed");
        }
    }

    fn set_alarm(&mut self, on: bool) {
        let result = if on {
            self.alarm.set_high()
        } else {
            self.alarm.set_low()
        };
        if result.is_err() {
            warn!("hal: alarm pin write failed");
        }
    }

    fn chirp(&mut self) {
        // Short blocking pulse, well under one control cycle.
        if self.buzzer.set_high().is_err() {
            warn!("hal: buzzer pin write failed");
            return;
        }
        self.delay.delay_us(CHIRP_PULSE_US);
        let _ = self.buzzer.set_low();
    }
}

// ── Composite ─────────────────────────────────────────────────

/// Bundles input, reader, and output adapters into the single hardware
/// object the service borrows each cycle.
pub struct GateHardware<I, T, O> {
    pub inputs: I,
    pub reader: T,
    pub outputs: O,
}

impl<I, T, O> GateHardware<I, T, O> {
    pub fn new(inputs: I, reader: T, outputs: O) -> Self {
        Self {
            inputs,
            reader,
            outputs,
        }
    }
}

impl<I: SensorPort, T, O> SensorPort for GateHardware<I, T, O> {
    fn read_inputs(&mut self) -> InputSnapshot {
        self.inputs.read_inputs()
    }
}

impl<I, T: TokenReaderPort, O> TokenReaderPort for GateHardware<I, T, O> {
    fn poll_token(&mut self) -> Option<PresentedToken> {
        self.reader.poll_token()
    }
}

impl<I, T, O: ActuatorPort> ActuatorPort for GateHardware<I, T, O> {
    fn set_gate(&mut self, open: bool) {
        self.outputs.set_gate(open);
    }

    fn set_alarm(&mut self, on: bool) {
        self.outputs.set_alarm(on);
    }

    fn chirp(&mut self) {
        self.outputs.chirp();
    }
}

// ── Serial link framing ───────────────────────────────────────

/// [`LinkPort`] over a byte-oriented serial channel, with line framing.
///
/// Receive bytes are accumulated until a newline; carriage returns are
/// dropped. An overlong line is discarded whole rather than truncated,
/// so a garbled stream cannot fake a heartbeat.
pub struct SerialLink<R, W>
where
    R: FnMut() -> Option<u8>,
    W: FnMut(&[u8]) -> bool,
{
    read_byte: R,
    write_all: W,
    rx: LineBuf,
    rx_overflow: bool,
}

impl<R, W> SerialLink<R, W>
where
    R: FnMut() -> Option<u8>,
    W: FnMut(&[u8]) -> bool,
{
    pub fn new(read_byte: R, write_all: W) -> Self {
        Self {
            read_byte,
            write_all,
            rx: LineBuf::new(),
            rx_overflow: false,
        }
    }
}

impl<R, W> LinkPort for SerialLink<R, W>
where
    R: FnMut() -> Option<u8>,
    W: FnMut(&[u8]) -> bool,
{
    fn poll_line(&mut self) -> Option<LineBuf> {
        while let Some(byte) = (self.read_byte)() {
            match byte {
                b'\n' => {
                    let overflowed = core::mem::take(&mut self.rx_overflow);
                    let line = core::mem::take(&mut self.rx);
                    if overflowed {
                        warn!("hal: oversized serial line discarded");
                        continue;
                    }
                    return Some(line);
                }
                b'\r' => {}
                byte => {
                    if self.rx.push(byte as char).is_err() {
                        self.rx_overflow = true;
                    }
                }
            }
        }
        None
    }

    fn send_line(&mut self, line: &str) -> Result<(), LinkError> {
        if (self.write_all)(line.as_bytes()) {
            Ok(())
        } else {
            Err(LinkError::WriteFailed)
        }
    }
}
