//! Telemetry publishing
//!
//! Minimal publish trait to decouple the controller from a specific MQTT
//! client crate. The scheduler opens and closes the broker session itself;
//! publishing is fire-and-forget (QoS 0, not retained).

/// Broker session used for one wake cycle
#[allow(async_fn_in_trait)]
pub trait TelemetryPublisher {
    /// Client-specific error type
    type Error: core::fmt::Debug;

    /// Open a session with the broker
    async fn open(&mut self) -> Result<(), Self::Error>;

    /// Publish `payload` to `topic` without waiting for acknowledgment
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;

    /// Close the session cleanly
    async fn close(&mut self) -> Result<(), Self::Error>;
}
