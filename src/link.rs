//! Station link protocol — heartbeat recognition and snapshot encoding.
//!
//! The station and the vehicle share a half-duplex ASCII line channel. The
//! station periodically transmits a fixed heartbeat literal; the vehicle,
//! on recognising it while no open cycle is in progress, runs the arrival
//! sequence and answers with one aggregate-statistics line once the gate
//! opens:
//!
//! ```text
//! D:<occupancy>,<pressCount>,<overloadCount>[,<name>,<scanCount>]*\n
//! ```
//!
//! One name/count pair per registered token used this session, in registry
//! order. No ack, retry, or sequence numbers: a lost heartbeat delays the
//! next open cycle by one station period, and a lost snapshot is superseded
//! by the next successful exchange (the station overwrites its last-known
//! snapshot with the newest line received).

use core::fmt::Write as _;

use heapless::{String, Vec};
use log::info;

use crate::error::LinkError;
use crate::registry::{MAX_TOKENS, Registry, TokenName};

/// The station's arrival heartbeat. Substring match, case-sensitive.
pub const HEARTBEAT: &str = "STN:ARRIVE";

/// Transmit line buffer, sized for a full-registry snapshot.
pub const LINE_MAX: usize = 160;
pub type LineBuf = String<LINE_MAX>;

// ---------------------------------------------------------------------------
// AdminSnapshot
// ---------------------------------------------------------------------------

/// The aggregate statistics payload sent to the station. Constructed fresh
/// at each transmission; never persisted on the vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSnapshot {
    pub occupancy: u16,
    pub press_count: u16,
    pub overload_count: u16,
    /// (name, session scan count) for each used token, in registry order.
    pub usage: Vec<(TokenName, u16), MAX_TOKENS>,
}

impl AdminSnapshot {
    /// Gather the snapshot from the live counters and registry.
    pub fn gather(
        registry: &Registry,
        occupancy: u16,
        press_count: u16,
        overload_count: u16,
    ) -> Self {
        let mut usage = Vec::new();
        for token in registry.tokens() {
            if token.scan_count > 0 {
                // Capacity equals the registry capacity; cannot overflow.
                let _ = usage.push((token.name.clone(), token.scan_count));
            }
        }
        Self {
            occupancy,
            press_count,
            overload_count,
            usage,
        }
    }

    /// Encode as one wire line, trailing newline included.
    pub fn encode(&self) -> Result<LineBuf, LinkError> {
        let mut line = LineBuf::new();
        write!(
            line,
            "D:{},{},{}",
            self.occupancy, self.press_count, self.overload_count
        )
        .map_err(|_| LinkError::LineTooLong)?;
        for (name, count) in &self.usage {
            write!(line, ",{name},{count}").map_err(|_| LinkError::LineTooLong)?;
        }
        line.push('\n').map_err(|_| LinkError::LineTooLong)?;
        Ok(line)
    }
}

// ---------------------------------------------------------------------------
// StationLink
// ---------------------------------------------------------------------------

/// Arrival-sequence latch over the heartbeat stream.
///
/// A recognised heartbeat arms exactly one open cycle; further heartbeats
/// are ignored until the gate has closed again.
pub struct StationLink {
    armed: bool,
}

impl StationLink {
    pub fn new() -> Self {
        Self { armed: false }
    }

    /// Inspect one received line. Returns `true` when the heartbeat is
    /// recognised for the first time since the last gate close — the caller
    /// then requests the arrival open. The caller only forwards lines while
    /// the gate is closed; scans of non-heartbeat content are ignored.
    pub fn on_line(&mut self, line: &str) -> bool {
        if self.armed || !line.contains(HEARTBEAT) {
            return false;
        }
        self.armed = true;
        info!("link: arrival heartbeat recognised");
        true
    }

    /// Whether an arrival cycle is currently in progress.
    pub fn cycle_in_progress(&self) -> bool {
        self.armed
    }

    /// The gate finished its cycle; the next heartbeat may arm again.
    pub fn on_gate_closed(&mut self) {
        self.armed = false;
    }
}

impl Default for StationLink {
    fn default() -> Self {
        Self::new()
    }
}
