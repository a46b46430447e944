//! Sensor acquisition
//!
//! Sensor drivers have no error channel towards the controller: a failed
//! read degrades to a sentinel value that is published unchanged.

/// ADC reading of the soil moisture probe fully submerged in water
pub const MOISTURE_WATER_RAW: i32 = 435;

/// ADC reading of the soil moisture probe in air
pub const MOISTURE_AIR_RAW: i32 = 864;

/// Upper end of the normalized moisture index
pub const MOISTURE_INDEX_MAX: i32 = 255;

/// Moisture index published when the probe could not be read
///
/// Outside the range of [`map_moisture`] for any 12-bit ADC value.
pub const MOISTURE_UNAVAILABLE: i32 = i32::MIN;

/// One set of environmental measurements
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    /// Illuminance in lux
    pub lux: f32,
    /// Relative humidity in percent
    pub humidity: f32,
    /// Temperature in degrees Celsius
    pub temperature: f32,
    /// Normalized moisture index (0 = water, 255 = air)
    pub soil_moisture: i32,
}

/// One-shot acquisition of all sensors
#[allow(async_fn_in_trait)]
pub trait SensorSource {
    /// Read every sensor once, including any settling delays
    async fn read(&mut self) -> SensorReading;
}

/// Map a raw moisture ADC value onto the 0..=255 index
///
/// Linear integer interpolation between the water and air calibration
/// points. Values outside the calibration range extrapolate and are not
/// clamped.
///
/// # Example
///
/// ```
/// use plant_node_hal::map_moisture;
/// assert_eq!(map_moisture(435), 0);
/// assert_eq!(map_moisture(864), 255);
/// ```
pub const fn map_moisture(raw: i32) -> i32 {
    (raw - MOISTURE_WATER_RAW) * MOISTURE_INDEX_MAX / (MOISTURE_AIR_RAW - MOISTURE_WATER_RAW)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_moisture_calibration_points() {
        assert_eq!(map_moisture(MOISTURE_WATER_RAW), 0);
        assert_eq!(map_moisture(MOISTURE_AIR_RAW), MOISTURE_INDEX_MAX);
    }

    #[test]
    fn test_map_moisture_midpoint() {
        // (649 - 435) * 255 / 429 = 127.2 -> 127
        assert_eq!(map_moisture(649), 127);
    }

    #[test]
    fn test_map_moisture_extrapolates() {
        assert!(map_moisture(1023) > MOISTURE_INDEX_MAX);
        assert!(map_moisture(0) < 0);
    }

    #[test]
    fn test_moisture_unavailable_is_never_a_reading() {
        // 433 maps to -1, so -1 cannot mark a failed read
        assert_eq!(map_moisture(433), -1);
        for raw in 0..4096 {
            assert_ne!(map_moisture(raw), MOISTURE_UNAVAILABLE);
        }
    }
}
