#![deny(unsafe_code)]
#![deny(warnings)]
//! Board configuration
//!
//! Credentials and addresses are baked in at build time:
//!
//! ```text
//! WIFI_SSID=... WIFI_PASS=... cargo run --release
//! ```

/// Wi-Fi station credentials
#[derive(Debug, Clone, Copy)]
pub struct WifiConfig {
    /// Network name
    pub ssid: &'static str,
    /// WPA passphrase, empty for an open network
    pub password: &'static str,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: option_env!("WIFI_SSID").unwrap_or(""),
            password: option_env!("WIFI_PASS").unwrap_or(""),
        }
    }
}

/// MQTT broker configuration
#[derive(Debug, Clone, Copy)]
pub struct MqttConfig {
    /// Broker address or hostname
    pub broker_host: &'static str,
    /// Broker port (plain MQTT)
    pub broker_port: u16,
    /// Keep-alive interval in seconds, 0 disables it
    pub keep_alive_secs: u16,
    /// Clean start flag (true = new session)
    pub clean_start: bool,
    /// Client id prefix, followed by random hex digits
    pub client_id_prefix: &'static str,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: option_env!("MQTT_BROKER").unwrap_or("192.168.1.99"),
            broker_port: 1883,
            keep_alive_secs: 15,
            clean_start: true,
            client_id_prefix: "ESP01",
        }
    }
}

/// Static IPv4 addressing
///
/// Skips DHCP, which is a noticeable part of the awake time on short cycles.
#[derive(Debug, Clone, Copy)]
pub struct StaticIpConfig {
    /// Node address
    pub address: [u8; 4],
    /// Prefix length
    pub prefix_len: u8,
    /// Default gateway
    pub gateway: [u8; 4],
}

impl Default for StaticIpConfig {
    fn default() -> Self {
        Self {
            address: [192, 168, 1, 2],
            prefix_len: 24,
            gateway: [192, 168, 1, 1],
        }
    }
}

/// IPv4 addressing mode
#[derive(Debug, Clone, Copy)]
pub enum IpMode {
    /// Lease an address from the access point
    Dhcp,
    /// Fixed address
    Static(StaticIpConfig),
}

impl Default for IpMode {
    fn default() -> Self {
        match option_env!("NODE_STATIC_IP") {
            Some(_) => Self::Static(StaticIpConfig::default()),
            None => Self::Dhcp,
        }
    }
}

/// Sensor wiring
pub struct SensorConfig {
    /// BH1750 address with ADDR tied low
    pub bh1750_addr: u8,
    /// Si7021 fixed address
    pub si7021_addr: u8,
    /// I2C bus frequency in kHz
    pub i2c_khz: u32,
    /// BH1750 one-shot high-resolution conversion time in milliseconds
    pub light_settle_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            bh1750_addr: 0x23,
            si7021_addr: 0x40,
            i2c_khz: 100,
            light_settle_ms: 120,
        }
    }
}
