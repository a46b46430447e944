//! Telemetry message formatting
//!
//! One session publishes the status message followed by one message per
//! sensor field, always in the order of [`Field::ALL`].

use core::fmt::Write;

use heapless::{String, Vec};
use plant_node_hal::SensorReading;

use crate::config::TelemetryConfig;

/// Maximum MQTT topic length
pub const MAX_TOPIC_LEN: usize = 64;

/// Maximum payload length of a single scalar message
pub const MAX_PAYLOAD_LEN: usize = 16;

/// Status message plus one message per field
pub const MESSAGES_PER_CYCLE: usize = Field::ALL.len() + 1;

/// Topic buffer
pub type Topic = String<MAX_TOPIC_LEN>;

/// Payload buffer
pub type Payload = String<MAX_PAYLOAD_LEN>;

/// Formatting errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Topic does not fit [`MAX_TOPIC_LEN`]
    TopicTooLong,
    /// Payload does not fit [`MAX_PAYLOAD_LEN`]
    PayloadTooLong,
}

impl core::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TopicTooLong => write!(f, "Topic too long"),
            Self::PayloadTooLong => write!(f, "Payload too long"),
        }
    }
}

impl core::error::Error for TelemetryError {}

/// Published sensor field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    /// Relative humidity, percent
    Humidity,
    /// Temperature, degrees Celsius
    Temperature,
    /// Illuminance, lux
    Light,
    /// Moisture index
    SoilMoisture,
}

impl Field {
    /// Publish order
    pub const ALL: [Field; 4] = [
        Field::Humidity,
        Field::Temperature,
        Field::Light,
        Field::SoilMoisture,
    ];

    /// Last topic level for this field
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Humidity => "humidity",
            Self::Temperature => "temperature",
            Self::Light => "light",
            Self::SoilMoisture => "soilmoisture",
        }
    }
}

/// Build `<prefix>/<field>`
pub fn topic(prefix: &str, field: Field) -> Result<Topic, TelemetryError> {
    let mut topic = Topic::new();
    write!(topic, "{}/{}", prefix, field.suffix()).map_err(|_| TelemetryError::TopicTooLong)?;
    Ok(topic)
}

/// Format one field of `reading`
///
/// Floats use two decimal places (`21.50`); the moisture index is an
/// integer. Sentinel values from failed reads are formatted unchanged.
pub fn payload(reading: &SensorReading, field: Field) -> Result<Payload, TelemetryError> {
    let mut payload = Payload::new();
    let result = match field {
        Field::Humidity => write!(payload, "{:.2}", reading.humidity),
        Field::Temperature => write!(payload, "{:.2}", reading.temperature),
        Field::Light => write!(payload, "{:.2}", reading.lux),
        Field::SoilMoisture => write!(payload, "{}", reading.soil_moisture),
    };
    result.map_err(|_| TelemetryError::PayloadTooLong)?;
    Ok(payload)
}

/// Every message of one publish session, in publish order
pub fn messages(
    config: &TelemetryConfig,
    reading: &SensorReading,
) -> Result<Vec<(Topic, Payload), MESSAGES_PER_CYCLE>, TelemetryError> {
    let mut messages = Vec::new();

    let status_topic =
        Topic::try_from(config.status_topic).map_err(|_| TelemetryError::TopicTooLong)?;
    let status_payload =
        Payload::try_from(config.status_payload).map_err(|_| TelemetryError::PayloadTooLong)?;
    // Capacity is MESSAGES_PER_CYCLE, pushes below cannot overflow
    let _ = messages.push((status_topic, status_payload));

    for field in Field::ALL {
        let _ = messages.push((topic(config.topic_prefix, field)?, payload(reading, field)?));
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> SensorReading {
        SensorReading {
            lux: 312.5,
            humidity: 48.25,
            temperature: 21.5,
            soil_moisture: 127,
        }
    }

    #[test]
    fn test_topic_layout() {
        let topic = topic("plants/moneyplant/telems", Field::SoilMoisture).unwrap();
        assert_eq!(topic.as_str(), "plants/moneyplant/telems/soilmoisture");
    }

    #[test]
    fn test_topic_too_long() {
        let prefix = "0123456789012345678901234567890123456789012345678901234567890123";
        assert_eq!(
            topic(prefix, Field::Light),
            Err(TelemetryError::TopicTooLong)
        );
    }

    #[test]
    fn test_float_payload_two_decimals() {
        assert_eq!(payload(&reading(), Field::Temperature).unwrap().as_str(), "21.50");
        assert_eq!(payload(&reading(), Field::Humidity).unwrap().as_str(), "48.25");
        assert_eq!(payload(&reading(), Field::Light).unwrap().as_str(), "312.50");
    }

    #[test]
    fn test_moisture_payload_integer() {
        assert_eq!(payload(&reading(), Field::SoilMoisture).unwrap().as_str(), "127");
    }

    #[test]
    fn test_sentinel_passes_through() {
        let degraded = SensorReading {
            lux: -1.0,
            ..reading()
        };
        assert_eq!(payload(&degraded, Field::Light).unwrap().as_str(), "-1.00");
    }

    #[test]
    fn test_unavailable_moisture_fits_payload() {
        let degraded = SensorReading {
            soil_moisture: plant_node_hal::MOISTURE_UNAVAILABLE,
            ..reading()
        };
        assert_eq!(
            payload(&degraded, Field::SoilMoisture).unwrap().as_str(),
            "-2147483648"
        );
    }

    #[test]
    fn test_huge_value_overflows_payload() {
        let degraded = SensorReading {
            lux: f32::MAX,
            ..reading()
        };
        assert_eq!(
            payload(&degraded, Field::Light),
            Err(TelemetryError::PayloadTooLong)
        );
    }

    #[test]
    fn test_messages_order() {
        let messages = messages(&TelemetryConfig::default(), &reading()).unwrap();
        let topics: [&str; MESSAGES_PER_CYCLE] = [
            "home/karan/ESP01/connection",
            "plants/moneyplant/telems/humidity",
            "plants/moneyplant/telems/temperature",
            "plants/moneyplant/telems/light",
            "plants/moneyplant/telems/soilmoisture",
        ];
        assert_eq!(messages.len(), MESSAGES_PER_CYCLE);
        for ((topic, _), expected) in messages.iter().zip(topics) {
            assert_eq!(topic.as_str(), expected);
        }
        assert_eq!(messages[0].1.as_str(), "OK");
        assert_eq!(messages[4].1.as_str(), "127");
    }
}
