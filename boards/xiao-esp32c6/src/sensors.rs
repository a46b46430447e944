#![deny(unsafe_code)]
#![deny(warnings)]
//! Plant sensors
//!
//! - BH1750 ambient light, one-shot high resolution mode
//! - Si7021 relative humidity and temperature
//! - Resistive soil moisture probe on ADC1 (A0 = GPIO0)
//!
//! A failed transaction is logged and replaced by [`SENTINEL`] (or
//! [`MOISTURE_UNAVAILABLE`] for the moisture index); the reading is still
//! published.

use defmt::{debug, warn};
use embassy_time::Timer;
use embedded_hal::i2c::I2c;
use esp_hal::analog::adc::{Adc, AdcPin};
use plant_node_hal::{map_moisture, SensorReading, SensorSource, MOISTURE_UNAVAILABLE};

use crate::config::SensorConfig;
use crate::error::SensorError;

/// Placeholder for a float measurement that could not be taken
pub const SENTINEL: f32 = -1.0;

/// ADC1 driver used for the moisture probe
pub type MoistureAdc = Adc<'static, esp_hal::peripherals::ADC1<'static>, esp_hal::Blocking>;

/// Moisture probe input
pub type MoistureAdcPin =
    AdcPin<esp_hal::peripherals::GPIO0<'static>, esp_hal::peripherals::ADC1<'static>>;

const BH1750_POWER_ON: u8 = 0x01;
const BH1750_ONE_TIME_HIGH_RES: u8 = 0x20;

const SI7021_MEASURE_RH_NO_HOLD: u8 = 0xF5;
const SI7021_READ_TEMP_FROM_RH: u8 = 0xE0;
/// RH conversion plus the temperature conversion it triggers
const SI7021_CONVERSION_MS: u64 = 25;

const ADC_POLLS: u32 = 50;

/// Every sensor of the node
pub struct PlantSensors<I> {
    i2c: I,
    adc: MoistureAdc,
    moisture_pin: MoistureAdcPin,
    config: SensorConfig,
}

impl<I: I2c> PlantSensors<I> {
    /// Bind the sensors to their buses
    pub fn new(i2c: I, adc: MoistureAdc, moisture_pin: MoistureAdcPin, config: SensorConfig) -> Self {
        Self {
            i2c,
            adc,
            moisture_pin,
            config,
        }
    }

    async fn read_lux(&mut self) -> Result<f32, SensorError> {
        let addr = self.config.bh1750_addr;
        self.i2c
            .write(addr, &[BH1750_POWER_ON])
            .map_err(|_| SensorError::Bus)?;
        self.i2c
            .write(addr, &[BH1750_ONE_TIME_HIGH_RES])
            .map_err(|_| SensorError::Bus)?;

        Timer::after_millis(self.config.light_settle_ms).await;

        let mut raw = [0u8; 2];
        self.i2c
            .read(addr, &mut raw)
            .map_err(|_| SensorError::Bus)?;
        Ok(lux_from_raw(u16::from_be_bytes(raw)))
    }

    async fn read_climate(&mut self) -> Result<(f32, f32), SensorError> {
        let addr = self.config.si7021_addr;
        self.i2c
            .write(addr, &[SI7021_MEASURE_RH_NO_HOLD])
            .map_err(|_| SensorError::Bus)?;

        Timer::after_millis(SI7021_CONVERSION_MS).await;

        let mut raw = [0u8; 2];
        self.i2c
            .read(addr, &mut raw)
            .map_err(|_| SensorError::Bus)?;
        let humidity = humidity_from_raw(u16::from_be_bytes(raw));

        self.i2c
            .write_read(addr, &[SI7021_READ_TEMP_FROM_RH], &mut raw)
            .map_err(|_| SensorError::Bus)?;
        let temperature = temperature_from_raw(u16::from_be_bytes(raw));

        Ok((humidity, temperature))
    }

    async fn read_moisture(&mut self) -> Result<i32, SensorError> {
        for _ in 0..ADC_POLLS {
            if let Ok(raw) = self.adc.read_oneshot(&mut self.moisture_pin) {
                // Calibration points are 10-bit values, ADC1 converts 12 bits
                return Ok(map_moisture(i32::from(raw >> 2)));
            }
            Timer::after_micros(100).await;
        }
        Err(SensorError::Adc)
    }
}

impl<I: I2c> SensorSource for PlantSensors<I> {
    async fn read(&mut self) -> SensorReading {
        let lux = self.read_lux().await.unwrap_or_else(|e| {
            warn!("sensor: light read failed: {}", e);
            SENTINEL
        });

        let (humidity, temperature) = self.read_climate().await.unwrap_or_else(|e| {
            warn!("sensor: climate read failed: {}", e);
            (SENTINEL, SENTINEL)
        });

        let soil_moisture = self.read_moisture().await.unwrap_or_else(|e| {
            warn!("sensor: moisture read failed: {}", e);
            MOISTURE_UNAVAILABLE
        });

        debug!(
            "sensor: lux={} rh={} t={} moisture={}",
            lux, humidity, temperature, soil_moisture
        );

        SensorReading {
            lux,
            humidity,
            temperature,
            soil_moisture,
        }
    }
}

/// BH1750 counts to lux (1.2 counts per lux in high resolution mode)
fn lux_from_raw(raw: u16) -> f32 {
    f32::from(raw) / 1.2
}

/// Si7021 relative humidity code to percent
fn humidity_from_raw(raw: u16) -> f32 {
    125.0 * f32::from(raw) / 65536.0 - 6.0
}

/// Si7021 temperature code to degrees Celsius
fn temperature_from_raw(raw: u16) -> f32 {
    175.72 * f32::from(raw) / 65536.0 - 46.85
}
