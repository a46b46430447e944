#![deny(unsafe_code)]
#![deny(warnings)]
//! Board error types

use defmt::Format;

/// TCP/IP layer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum NetworkError {
    /// Broker hostname could not be resolved
    DnsError,
    /// Socket connect, read or write failed
    SocketError,
    /// No IPv4 configuration yet
    LinkDown,
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DnsError => write!(f, "DNS resolution failed"),
            Self::SocketError => write!(f, "Socket error"),
            Self::LinkDown => write!(f, "Link down"),
        }
    }
}

impl core::error::Error for NetworkError {}

impl embedded_io_async::Error for NetworkError {
    fn kind(&self) -> embedded_io_async::ErrorKind {
        match self {
            Self::SocketError => embedded_io_async::ErrorKind::BrokenPipe,
            Self::LinkDown => embedded_io_async::ErrorKind::NotConnected,
            Self::DnsError => embedded_io_async::ErrorKind::Other,
        }
    }
}

/// Broker session errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum MqttError {
    /// Transport below the MQTT session failed
    Network(NetworkError),
    /// CONNECT was rejected or never acknowledged
    ConnectionFailed,
    /// PUBLISH could not be sent
    PublishFailed,
    /// Topic, payload or client id rejected by the client
    ProtocolError,
    /// Publish or close without an open session
    NotConnected,
}

impl core::fmt::Display for MqttError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "MQTT transport error: {}", e),
            Self::ConnectionFailed => write!(f, "MQTT connection failed"),
            Self::PublishFailed => write!(f, "MQTT publish failed"),
            Self::ProtocolError => write!(f, "MQTT protocol error"),
            Self::NotConnected => write!(f, "MQTT session not open"),
        }
    }
}

impl core::error::Error for MqttError {}

impl From<NetworkError> for MqttError {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

/// Retained RAM errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum RetentionError {
    /// Access past the end of the retained region
    OutOfRange,
}

impl core::fmt::Display for RetentionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "Retention access out of range"),
        }
    }
}

impl core::error::Error for RetentionError {}

/// Sensor bus errors
///
/// Never leave the sensor module: a failed read degrades to a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum SensorError {
    /// I2C transaction failed
    Bus,
    /// ADC conversion did not complete
    Adc,
}

impl core::fmt::Display for SensorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus => write!(f, "I2C bus error"),
            Self::Adc => write!(f, "ADC conversion failed"),
        }
    }
}

impl core::error::Error for SensorError {}
