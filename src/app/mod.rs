//! Application layer: port traits, outbound events, and the control-cycle
//! service that orchestrates the domain components.

pub mod events;
pub mod ports;
pub mod service;
