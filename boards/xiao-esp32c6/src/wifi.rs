#![deny(unsafe_code)]
#![deny(warnings)]
//! Wi-Fi station join primitives
//!
//! The station is configured and started here but never waited on: the
//! retry policy in `plant-node-core` samples [`NetworkJoin::status`] on its
//! own schedule. The channel and BSSID of the access point actually joined
//! come from the station-connected event, so a full join through a
//! different access point of the same network is retained correctly.

use core::cell::Cell;

use defmt::{debug, error, info, warn};
use embassy_net::Stack;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use esp_radio::wifi::event::{self, EventExt};
use esp_radio::wifi::{ClientConfig, ModeConfig, ScanMethod, WifiController};
use plant_node_hal::{AccessPoint, LinkStatus, NetworkJoin};

use crate::config::WifiConfig;

/// Access point reported by the last station-connected event
static JOINED: Mutex<CriticalSectionRawMutex, Cell<Option<AccessPoint>>> =
    Mutex::new(Cell::new(None));

/// Wi-Fi station bound to an embassy-net stack
pub struct WifiJoin {
    controller: WifiController<'static>,
    stack: Stack<'static>,
    config: WifiConfig,
}

impl WifiJoin {
    /// Wrap a station controller and its network stack
    pub fn new(controller: WifiController<'static>, stack: Stack<'static>, config: WifiConfig) -> Self {
        install_event_handlers();
        Self {
            controller,
            stack,
            config,
        }
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_ssid(self.config.ssid.into())
            .with_password(self.config.password.into())
    }

    fn apply_and_connect(&mut self, client: ClientConfig) {
        if let Err(e) = self.controller.set_config(&ModeConfig::Client(client)) {
            error!("wifi: set_config failed: {:?}", e);
            return;
        }
        if let Err(e) = self.controller.connect() {
            error!("wifi: connect failed: {:?}", e);
        }
    }
}

impl NetworkJoin for WifiJoin {
    async fn power_on(&mut self) {
        if matches!(self.controller.is_started(), Ok(true)) {
            return;
        }
        // A client config must be in place before the station starts
        if let Err(e) = self
            .controller
            .set_config(&ModeConfig::Client(self.client_config()))
        {
            error!("wifi: set_config failed: {:?}", e);
        }
        match self.controller.start_async().await {
            Ok(()) => debug!("wifi: station started"),
            Err(e) => error!("wifi: start failed: {:?}", e),
        }
    }

    async fn power_off(&mut self) {
        // An abandoned cycle stops the station before the sleep step does
        if matches!(self.controller.is_started(), Ok(false)) {
            return;
        }
        if let Err(e) = self.controller.stop_async().await {
            warn!("wifi: stop failed: {:?}", e);
        }
        JOINED.lock(|joined| joined.set(None));
        debug!("wifi: station stopped");
    }

    async fn join_fast(&mut self, access_point: AccessPoint) {
        info!("wifi: joining {} directly", access_point);
        let client = self
            .client_config()
            .with_channel(access_point.channel)
            .with_bssid(access_point.bssid)
            .with_scan_method(ScanMethod::Fast);
        self.apply_and_connect(client);
    }

    async fn join_full(&mut self) {
        info!("wifi: scanning for {}", self.config.ssid);
        let client = self
            .client_config()
            .with_scan_method(ScanMethod::AllChannels);
        self.apply_and_connect(client);
    }

    async fn status(&mut self) -> LinkStatus {
        // Associated is not enough: publishing also needs an IPv4 config
        let associated = self.controller.is_connected().unwrap_or(false);
        if associated && self.stack.is_config_up() {
            LinkStatus::Connected
        } else {
            LinkStatus::Disconnected
        }
    }

    async fn teardown(&mut self) {
        if let Err(e) = self.controller.disconnect_async().await {
            warn!("wifi: disconnect failed: {:?}", e);
        }
    }

    fn current_access_point(&mut self) -> Option<AccessPoint> {
        JOINED.lock(|joined| joined.get())
    }
}

fn install_event_handlers() {
    event::StaConnected::update_handler(|event| {
        let mut bssid = [0u8; 6];
        bssid.copy_from_slice(&event.bssid()[..]);
        let access_point = AccessPoint::new(event.channel(), bssid);
        JOINED.lock(|joined| joined.set(Some(access_point)));
    });

    event::StaDisconnected::update_handler(|event| {
        JOINED.lock(|joined| joined.set(None));
        debug!("wifi: disconnected, reason {=u8}", event.reason());
    });
}
