//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter   | Implements       | Connects to                     |
//! |-----------|------------------|---------------------------------|
//! | `hal`     | SensorPort       | GPIO inputs (embedded-hal 1.0)  |
//! |           | ActuatorPort     | GPIO outputs, buzzer            |
//! | `console` | EventSink        | Serial log output               |
//! | `storage` | StoragePort      | In-memory / file-backed KV store|
//! |           | ConfigPort       |                                 |
//! | `time`    | (clock source)   | Host monotonic timer            |

pub mod console;
pub mod hal;
pub mod storage;
pub mod time;
