#![deny(warnings)]
#![no_main]
#![no_std]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

//! Plant-monitor sensor node for the Seeed XIAO ESP32-C6
//!
//! Every boot is one wake cycle: join Wi-Fi (directly on the retained
//! access point when possible), publish one reading, deep sleep. Init
//! failures skip the cycle and sleep the full interval.

use core::time::Duration;

use defmt::{error, info};
use defmt_rtt as _; // global logger
use panic_probe as _;

use embassy_executor::Spawner;
use embassy_net::{Ipv4Address, Ipv4Cidr, StackResources, StaticConfigV4};
use embassy_time::{Delay, Timer};
use esp_hal::analog::adc::{Adc, AdcConfig, Attenuation};
use esp_hal::clock::CpuClock;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::rng::Rng;
use esp_hal::rtc_cntl::Rtc;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;

use plant_node_core::{DutyCycle, NodeConfig, PersistentStore};

mod config;
mod error;
mod mqtt;
mod power;
mod retention;
mod sensors;
mod socket;
mod wifi;

use config::{IpMode, MqttConfig, SensorConfig, WifiConfig};
use mqtt::{MqttChannels, MqttPublisher};
use power::TimerDeepSleep;
use retention::LpRetention;
use sensors::PlantSensors;
use wifi::WifiJoin;

esp_bootloader_esp_idf::esp_app_desc!();

static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
// DHCP, DNS and the MQTT socket
static STACK_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
static MQTT_CHANNELS: MqttChannels = MqttChannels::new();

#[embassy_executor::task]
async fn net_task(
    mut runner: embassy_net::Runner<'static, esp_radio::wifi::WifiDevice<'static>>,
) -> ! {
    runner.run().await
}

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    info!("boot: plant node");

    let node_config = NodeConfig::default();
    let retry_interval = Duration::from_secs(node_config.sleep_secs);
    let mut sleeper = TimerDeepSleep::new(Rtc::new(peripherals.LPWR));

    let Some(retention) = LpRetention::take() else {
        error!("boot: retained memory already claimed");
        sleeper.sleep_for(retry_interval);
    };

    // --- Wi-Fi station and network stack ----------------------------------
    let wifi_config = WifiConfig::default();
    if wifi_config.ssid.is_empty() {
        error!("boot: set WIFI_SSID/WIFI_PASS at build time");
        sleeper.sleep_for(retry_interval);
    }

    let radio = match esp_radio::init() {
        Ok(radio) => RADIO.init(radio),
        Err(e) => {
            error!("boot: radio init failed: {:?}", e);
            sleeper.sleep_for(retry_interval);
        }
    };
    let (controller, interfaces) =
        match esp_radio::wifi::new(radio, peripherals.WIFI, esp_radio::wifi::Config::default()) {
            Ok(wifi) => wifi,
            Err(e) => {
                error!("boot: wifi init failed: {:?}", e);
                sleeper.sleep_for(retry_interval);
            }
        };

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    let net_config = match IpMode::default() {
        IpMode::Dhcp => embassy_net::Config::dhcpv4(Default::default()),
        IpMode::Static(ip) => {
            let [a, b, c, d] = ip.address;
            let [ga, gb, gc, gd] = ip.gateway;
            embassy_net::Config::ipv4_static(StaticConfigV4 {
                address: Ipv4Cidr::new(Ipv4Address::new(a, b, c, d), ip.prefix_len),
                gateway: Some(Ipv4Address::new(ga, gb, gc, gd)),
                dns_servers: Default::default(),
            })
        }
    };

    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        net_config,
        STACK_RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.must_spawn(net_task(runner));

    // --- MQTT session task --------------------------------------------------
    let mqtt_config = MqttConfig::default();
    let client_id = match mqtt::client_id(mqtt_config.client_id_prefix, rng.random()) {
        Ok(id) => id,
        Err(e) => {
            error!("boot: client id: {}", e);
            sleeper.sleep_for(retry_interval);
        }
    };
    spawner.must_spawn(mqtt::mqtt_task(stack, mqtt_config, client_id, &MQTT_CHANNELS));

    // --- Sensors ----------------------------------------------------------------
    let sensor_config = SensorConfig::default();
    let i2c_config = I2cConfig::default().with_frequency(Rate::from_khz(sensor_config.i2c_khz));
    let i2c = match I2c::new(peripherals.I2C0, i2c_config) {
        // XIAO D4/D5
        Ok(i2c) => i2c.with_sda(peripherals.GPIO22).with_scl(peripherals.GPIO23),
        Err(e) => {
            error!("boot: i2c init failed: {:?}", e);
            sleeper.sleep_for(retry_interval);
        }
    };

    // XIAO A0 = GPIO0
    let mut adc_config = AdcConfig::new();
    let moisture_pin = adc_config.enable_pin(peripherals.GPIO0, Attenuation::_11dB);
    let adc = Adc::new(peripherals.ADC1, adc_config);

    // --- Wake cycle ----------------------------------------------------------
    let mut node = match DutyCycle::new(
        PersistentStore::new(retention),
        WifiJoin::new(controller, stack, wifi_config),
        PlantSensors::new(i2c, adc, moisture_pin, sensor_config),
        MqttPublisher::new(&MQTT_CHANNELS),
        Delay,
        &mut sleeper,
        node_config,
    ) {
        Ok(node) => node,
        Err(e) => {
            error!("boot: node config rejected: {}", e);
            sleeper.sleep_for(retry_interval);
        }
    };

    let report = node.run_cycle().await;
    info!("cycle: {}", report);
    node.sleep().await;

    // Deep sleep resets the chip
    loop {
        Timer::after_secs(3600).await;
    }
}
