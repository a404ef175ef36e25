//! ESP32-C3 joystick compass firmware.
//!
//! This is the main entry point for the physical board. It:
//! - Joins the configured WiFi network and logs the assigned IP
//! - Samples the joystick on ADC1 (GPIO0 = Y, GPIO1 = X)
//! - Serves `GET /data` as JSON and everything else as the dashboard on port 80
//!
//! # Build
//!
//! ```bash
//! WIFI_SSID=MyNetwork WIFI_PASSWORD=secret \
//!     cargo build --release --bin esp32_main --features wifi --target riscv32imc-esp-espidf
//! ```

use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use esp_idf_hal::adc::oneshot::AdcDriver;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use joystick_compass::hal::esp32::{Esp32Joystick, Esp32Wifi};
use joystick_compass::services::serve_blocking;
use joystick_compass::{Config, RequestDispatcher, WebConfig, WifiConfig};
use log::{error, info};

/// Delay before bring-up so a serial monitor can attach.
const STARTUP_DELAY_MS: u64 = 2000;

/// Stack for the server thread; the dispatcher holds its buffers inline.
const SERVER_STACK_SIZE: usize = 16 * 1024;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    thread::sleep(Duration::from_millis(STARTUP_DELAY_MS));
    info!("joystick-compass starting");

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = Config::default()
        .with_wifi(
            WifiConfig::default()
                .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
                .with_password(option_env!("WIFI_PASSWORD").unwrap_or("")),
        )
        .with_web(WebConfig::default().with_port(80));
    config.validate()?;

    if !config.wifi.is_configured() {
        anyhow::bail!("WiFi not configured (set WIFI_SSID/WIFI_PASSWORD at build time)");
    }

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Initialize WiFi
    // =========================================================================
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs), &config.wifi)
        .context("WiFi bring-up failed")?;
    match wifi.ip_addr() {
        Some(ip) => info!("Device IP: {}", ip),
        None => info!("Device IP: unknown"),
    }

    // =========================================================================
    // Initialize Joystick (ADC1 on GPIO0/1)
    // =========================================================================
    let adc1 = peripherals.adc1;
    let gpio0 = peripherals.pins.gpio0;
    let gpio1 = peripherals.pins.gpio1;
    let joystick_config = config.joystick.clone();

    // =========================================================================
    // HTTP Server
    // =========================================================================
    let listener = TcpListener::bind(config.web.bind_addr())
        .with_context(|| format!("binding port {}", config.web.port))?;
    info!("Listening on port {}", config.web.port);

    let server = thread::Builder::new()
        .name("http".into())
        .stack_size(SERVER_STACK_SIZE)
        .spawn(move || -> anyhow::Result<()> {
            let adc = AdcDriver::new(adc1)?;
            let joystick = Esp32Joystick::new(&adc, gpio0, gpio1)?;
            info!("Joystick initialized (GPIO0/1 ADC)");

            let mut dispatcher = RequestDispatcher::from_config(joystick, &joystick_config);
            serve_blocking(&listener, &mut dispatcher)?;
            Ok(())
        })?;

    let result = server
        .join()
        .map_err(|_| anyhow::anyhow!("HTTP server thread panicked"))?;
    if let Err(e) = &result {
        error!("HTTP server stopped: {:?}", e);
    }

    // Keep WiFi up until the server goes away.
    drop(wifi);
    result
}
