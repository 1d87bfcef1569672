//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (serial console in production, stderr in the simulation).
//! A future station-side display adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START  | initial_state={:?}", state);
            }
            AppEvent::GateChanged { from, to } => {
                info!("GATE   | {:?} -> {:?}", from, to);
            }
            AppEvent::AccessGranted { name, scan_count } => {
                info!("ACCESS | granted to {} (scan #{})", name, scan_count);
            }
            AppEvent::AccessDenied => {
                info!("ACCESS | denied (unknown token)");
            }
            AppEvent::PassengerEntered { occupancy } => {
                info!("COUNT  | entry, occupancy={}", occupancy);
            }
            AppEvent::PassengerExited { occupancy } => {
                info!("COUNT  | exit, occupancy={}", occupancy);
            }
            AppEvent::OverloadRaised { overload_count } => {
                warn!("ALARM  | overload raised (event #{})", overload_count);
            }
            AppEvent::OverloadCleared => {
                info!("ALARM  | overload cleared");
            }
            AppEvent::EmergencyActivated { press_count } => {
                warn!("PANIC  | alert active (press #{})", press_count);
            }
            AppEvent::EmergencyCleared => {
                info!("PANIC  | alert window elapsed, resuming");
            }
            AppEvent::ObstructionHold => {
                warn!("GATE   | close blocked by obstruction, holding open");
            }
            AppEvent::SnapshotSent => {
                info!("LINK   | snapshot transmitted");
            }
        }
    }
}
