//! Boarding-gate controller library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. Host-only adapters (file storage, monotonic clock) live
//! under `adapters`; the domain core is platform-independent.

#![deny(unused_must_use)]

pub mod access;
pub mod alarms;
pub mod app;
pub mod config;
pub mod counter;
pub mod gate;
pub mod link;
pub mod registry;

pub mod error;

pub mod adapters;
