//! Controller configuration structures

use crate::error::NodeError;
use crate::policy::Thresholds;
use crate::telemetry::{Field, MAX_TOPIC_LEN};

/// Topic layout for the publish step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Prefix of the per-field topics (`<prefix>/humidity`, ...)
    pub topic_prefix: &'static str,
    /// Topic of the status message published first in every session
    ///
    /// The default lives outside `topic_prefix`, where existing dashboards
    /// subscribe to it.
    pub status_topic: &'static str,
    /// Payload of the status message
    pub status_payload: &'static str,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            topic_prefix: "plants/moneyplant/telems",
            status_topic: "home/karan/ESP01/connection",
            status_payload: "OK",
        }
    }
}

/// Duty-cycle controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeConfig {
    /// Interval between two link status samples (one tick)
    pub poll_interval_ms: u32,
    /// Fallback and abandon tick counts
    pub thresholds: Thresholds,
    /// Deep sleep duration between wake cycles
    pub sleep_secs: u64,
    /// Pause between the steps of the fallback radio reset
    pub reset_settle_ms: u32,
    /// Pause between teardown and power-off when abandoning
    pub abandon_settle_ms: u32,
    /// Broker session attempts per wake cycle
    pub publish_connect_attempts: u8,
    /// Pause between two broker session attempts
    pub publish_retry_delay_ms: u32,
    /// Topic layout
    pub telemetry: TelemetryConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            thresholds: Thresholds::default(),
            sleep_secs: 30 * 60,
            reset_settle_ms: 10,
            abandon_settle_ms: 1,
            publish_connect_attempts: 3,
            publish_retry_delay_ms: 500,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Check the configuration for values the controller cannot run with
    ///
    /// # Errors
    ///
    /// Returns `NodeError::InvalidConfig` if:
    /// - the poll interval is zero
    /// - the thresholds are not `0 < fast_path_abandon < cycle_abandon`
    /// - no broker session attempt is allowed
    /// - a topic would not fit the topic buffer
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.poll_interval_ms == 0 || self.publish_connect_attempts == 0 {
            return Err(NodeError::InvalidConfig);
        }

        Thresholds::new(
            self.thresholds.fast_path_abandon(),
            self.thresholds.cycle_abandon(),
        )?;

        let longest_field = Field::ALL
            .iter()
            .map(|field| field.suffix().len())
            .max()
            .unwrap_or(0);
        if self.telemetry.topic_prefix.len() + 1 + longest_field > MAX_TOPIC_LEN
            || self.telemetry.status_topic.len() > MAX_TOPIC_LEN
        {
            return Err(NodeError::InvalidConfig);
        }

        Ok(())
    }
}
