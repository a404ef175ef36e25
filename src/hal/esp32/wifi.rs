//! WiFi station bring-up for ESP32-C3.
//!
//! Provides synchronous WiFi station mode connection using esp-idf-svc.
//!
//! # Example
//!
//! ```ignore
//! use joystick_compass::hal::esp32::Esp32Wifi;
//! use joystick_compass::WifiConfig;
//!
//! let config = WifiConfig::default()
//!     .with_ssid("MyNetwork")
//!     .with_password("secret123");
//!
//! let wifi = Esp32Wifi::new(modem, sysloop, nvs, &config)?;
//! log::info!("IP: {:?}", wifi.ip_addr());
//! ```

use core::time::Duration;
use std::net::Ipv4Addr;

use anyhow::Context;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};

use crate::config::WifiConfig;

/// WiFi connection manager for ESP32.
///
/// The connection is established during construction and maintained for
/// the lifetime of this struct.
pub struct Esp32Wifi<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
}

impl<'a> Esp32Wifi<'a> {
    /// Join the configured network with WPA2-PSK.
    ///
    /// Starts the driver, associates, then waits up to
    /// `config.connect_timeout_ms` for DHCP.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to start, association fails, or
    /// no address is assigned before the timeout.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let ssid = config.ssid.as_str();

        // esp-idf limits SSIDs to 32 bytes
        let mut ssid_buf: heapless::String<32> = heapless::String::new();
        if ssid_buf.push_str(ssid).is_err() {
            anyhow::bail!("SSID '{}' is longer than 32 bytes", ssid);
        }

        let mut pass_buf: heapless::String<64> = heapless::String::new();
        let _ = pass_buf.push_str(config.password.as_str());

        let auth_method = if config.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid_buf,
            password: pass_buf,
            auth_method,
            ..Default::default()
        }))?;

        info!("WiFi starting");
        wifi.start()?;

        info!("WiFi connecting to '{}'", ssid);
        wifi.connect()
            .with_context(|| format!("association with '{}' failed", ssid))?;

        let timeout = Duration::from_millis(u64::from(config.connect_timeout_ms));
        wifi.ip_wait_while(|w| w.is_up().map(|up| !up), Some(timeout))
            .context("timed out waiting for DHCP")?;

        let this = Self { wifi };
        match this.ip_addr() {
            Some(ip) => info!("WiFi connected, IP {}", ip),
            None => warn!("WiFi connected but no IPv4 address reported"),
        }
        Ok(this)
    }

    /// Get the current IP address, if connected.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// Check if WiFi is connected.
    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}
