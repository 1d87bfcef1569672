//! Error types for the gate controller firmware.
//!
//! Each subsystem carries its own small enum. All variants are `Copy` so
//! they can pass through the control cycle without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Registry store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The store blob is shorter than its declared content.
    Truncated,
    /// The magic marker is absent or does not match (unprovisioned store).
    BadMagic,
    /// The stored token count is outside the valid range.
    CountOutOfRange,
    /// A stored record declares an identifier longer than the field.
    BadRecord,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "store truncated"),
            Self::BadMagic => write!(f, "magic marker mismatch"),
            Self::CountOutOfRange => write!(f, "token count out of range"),
            Self::BadRecord => write!(f, "malformed token record"),
        }
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The outgoing line did not fit the transmit buffer.
    LineTooLong,
    /// The transport rejected the write.
    WriteFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineTooLong => write!(f, "line exceeds transmit buffer"),
            Self::WriteFailed => write!(f, "transport write failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Alarm conditions
// ---------------------------------------------------------------------------

/// Alarm conditions are accumulated in a bitfield so that multiple
/// simultaneous conditions can be tracked and individually cleared.
/// They never abort the control loop — each has its own recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlarmCondition {
    /// Occupancy crossed above the configured threshold.
    Overload = 0b0000_0001,
    /// Panic button pressed; emergency window active.
    Emergency = 0b0000_0010,
    /// Gate held open past its timeout by a sensed obstruction.
    Obstruction = 0b0000_0100,
}

impl AlarmCondition {
    /// Return the bitmask for this condition.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AlarmCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overload => write!(f, "overload"),
            Self::Emergency => write!(f, "emergency"),
            Self::Obstruction => write!(f, "obstruction"),
        }
    }
}
