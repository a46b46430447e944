//! Duty-cycle controller error types
//!
//! None of these leave a wake cycle: the scheduler turns every failure into
//! a log line and a [`CycleOutcome`](crate::scheduler::CycleOutcome), and the
//! node tries again on the next wake.

/// Controller operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeError {
    /// Retained record could not be read or failed its checksum
    PersistentDataInvalid,
    /// No connection before the cycle abandon threshold
    ConnectionTimeout,
    /// Retention memory rejected the record write
    RetentionWriteFailed,
    /// Broker session or publish failed
    PublishFailed,
    /// Configuration values are inconsistent
    InvalidConfig,
}

impl core::fmt::Display for NodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PersistentDataInvalid => write!(f, "Persistent data invalid"),
            Self::ConnectionTimeout => write!(f, "Connection timeout"),
            Self::RetentionWriteFailed => write!(f, "Retention write failed"),
            Self::PublishFailed => write!(f, "Publish failed"),
            Self::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}

// Implement core::error::Error for no_std compatibility
impl core::error::Error for NodeError {}
