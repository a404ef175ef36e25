//! Desktop server for trying the dashboard without hardware.
//!
//! Runs the HTTP transport with a simulated joystick that sweeps slowly
//! around the compass rose, so the dashboard at http://localhost:8080 cycles
//! through every direction.
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=debug cargo run --example desktop_server --features web
//! ```
//!
//! # Configuration
//!
//! Set `JOYSTICK_CONFIG` to the path of a JSON document to override the
//! defaults, e.g. `{"web":{"port":3000},"joystick":{"dead_zone":20}}`.
//! Without a document the server listens on port 8080.

use std::f32::consts::TAU;
use std::time::Instant;

use anyhow::Context;
use joystick_compass::services::run_server;
use joystick_compass::traits::AnalogSampler;
use joystick_compass::{Config, JoystickConfig, RequestDispatcher, WebConfig};
use log::info;

/// Seconds for one full sweep around the rose.
const SWEEP_PERIOD_S: f32 = 20.0;

/// Deflection from center as a fraction of full scale.
const SWEEP_RADIUS: f32 = 0.45;

/// Joystick that traces a circle on the configured X and Y channels.
struct SimulatedJoystick {
    started: Instant,
    max_code: u16,
    x_channel: u8,
    y_channel: u8,
    selected: u8,
}

impl SimulatedJoystick {
    fn new(config: &JoystickConfig) -> Self {
        Self {
            started: Instant::now(),
            max_code: config.max_code,
            x_channel: config.x_channel,
            y_channel: config.y_channel,
            selected: config.x_channel,
        }
    }

    /// Raw code on `channel` at `angle` radians into the sweep.
    fn code_at(&self, channel: u8, angle: f32) -> u16 {
        let offset = if channel == self.x_channel {
            angle.cos()
        } else if channel == self.y_channel {
            angle.sin()
        } else {
            0.0
        };
        let level = (0.5 + SWEEP_RADIUS * offset).clamp(0.0, 1.0);
        (level * f32::from(self.max_code)) as u16
    }
}

impl AnalogSampler for SimulatedJoystick {
    fn select_channel(&mut self, channel: u8) {
        self.selected = channel;
    }

    fn read_raw(&mut self) -> u16 {
        let angle = self.started.elapsed().as_secs_f32() / SWEEP_PERIOD_S * TAU;
        self.code_at(self.selected, angle)
    }
}

fn load_config() -> anyhow::Result<Config> {
    match std::env::var("JOYSTICK_CONFIG") {
        Ok(path) => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("reading config file {}", path))?;
            let config =
                Config::from_json(&bytes).with_context(|| format!("parsing config file {}", path))?;
            info!("Loaded configuration from {}", path);
            Ok(config)
        }
        Err(_) => Ok(Config::default().with_web(WebConfig::default().with_port(8080))),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    info!(
        "{} starting (dead zone {}, max code {})",
        config.device.name,
        config.joystick.dead_zone.points(),
        config.joystick.max_code
    );

    let joystick = SimulatedJoystick::new(&config.joystick);
    let mut dispatcher = RequestDispatcher::from_config(joystick, &config.joystick);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    rt.block_on(run_server(&mut dispatcher, &config.web))?;
    Ok(())
}
