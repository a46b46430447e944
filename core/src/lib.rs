//! Platform-agnostic core logic for the plant-monitor sensor node
//!
//! This crate contains the duty-cycle controller shared by every board. It
//! has NO hardware dependencies: boards plug in through the traits of
//! `plant-node-hal`.
//!
//! One wake cycle, leaf modules first:
//!
//! - **`crc`**: CRC-32 that seals the retained record
//! - **`record`** / **`store`**: fixed-layout record kept in retention memory
//! - **`strategy`**: fast join on cached channel/BSSID, or full discovery
//! - **`policy`**: poll-tick retry loop with fallback and abandon thresholds
//! - **`telemetry`**: topic and payload formatting for the publish step
//! - **`scheduler`**: connect, persist, read, publish, sleep

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

#[macro_use]
mod fmt;

pub mod config;
pub mod crc;
pub mod error;
pub mod policy;
pub mod record;
pub mod scheduler;
pub mod store;
pub mod strategy;
pub mod telemetry;

// Re-export commonly used types
pub use config::{NodeConfig, TelemetryConfig};
pub use crc::crc32;
pub use error::NodeError;
pub use policy::{AttemptState, ConnectionAttempt, Step, Thresholds};
pub use record::{PersistentRecord, RecordError};
pub use scheduler::{CycleOutcome, CycleReport, DutyCycle};
pub use store::PersistentStore;
pub use strategy::JoinPlan;
