//! Hardware abstraction traits for the plant-monitor sensor node
//!
//! This crate defines traits that abstract over hardware differences
//! between boards. BSPs implement these traits; the duty-cycle controller
//! in `plant-node-core` depends only on them.
//!
//! - **`retention`**: byte-addressed memory that survives deep sleep
//! - **`network`**: radio power and network join primitives
//! - **`sensor`**: one-shot environmental sensor acquisition
//! - **`telemetry`**: broker session and fire-and-forget publishing
//! - **`power`**: timed deep sleep

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod network;
pub mod power;
pub mod retention;
pub mod sensor;
pub mod telemetry;

// Re-export commonly used types
pub use network::{AccessPoint, LinkStatus, NetworkJoin};
pub use power::DeepSleep;
pub use retention::RetentionMemory;
pub use sensor::{map_moisture, SensorReading, SensorSource, MOISTURE_UNAVAILABLE};
pub use telemetry::TelemetryPublisher;
