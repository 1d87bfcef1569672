//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GateService (domain)
//! ```
//!
//! Driven adapters (sensors, token reader, actuators, serial link, storage)
//! implement these traits. The [`GateService`](super::service::GateService)
//! consumes them via generics, so the domain core never touches hardware
//! directly and the whole control cycle runs against mocks on the host.

use heapless::Vec;

use crate::config::SystemConfig;
use crate::error::LinkError;
use crate::gate::context::InputSnapshot;
use crate::link::LineBuf;
use crate::registry::TOKEN_ID_MAX;

/// A token identifier as delivered by the reader hardware.
pub type PresentedToken = Vec<u8, TOKEN_ID_MAX>;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per cycle to sample every
/// binary input. A failed pin read must return the previous good level —
/// a flaky sensor must not crash the control loop.
pub trait SensorPort {
    fn read_inputs(&mut self) -> InputSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Token reader port (driven adapter: RFID front end → domain)
// ───────────────────────────────────────────────────────────────

/// Non-blocking poll of the token reader. Returns the identifier bytes of
/// a freshly presented token, at most once per presentation.
pub trait TokenReaderPort {
    fn poll_token(&mut self) -> Option<PresentedToken>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Drive the door actuator to the commanded position.
    fn set_gate(&mut self, open: bool);

    /// Drive the alarm output.
    fn set_alarm(&mut self, on: bool);

    /// Sound the short confirmation tone (panic-press acknowledgment).
    fn chirp(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: domain ↔ station serial channel)
// ───────────────────────────────────────────────────────────────

/// Half-duplex line channel to the station.
pub trait LinkPort {
    /// Non-blocking poll for one complete received line (newline stripped).
    fn poll_line(&mut self) -> Option<LineBuf>;

    /// Transmit one line. Best-effort: the protocol tolerates losses.
    fn send_line(&mut self, line: &str) -> Result<(), LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / display)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, the
/// driver display, a test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting. Invalid
/// ranges are rejected with [`ConfigError::ValidationFailed`], not silently
/// clamped — a corrupted store must not be able to disable the crossing
/// window or the emergency timer.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ persistent KV store)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for the token registry and configuration.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic — no partial records on power loss.
///   The registry depends on this to survive restarts uncorrupted.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl std::error::Error for StorageError {}
