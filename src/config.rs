//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use joystick_compass::config::{Config, JoystickConfig, WebConfig};
//! use joystick_compass::DeadZone;
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.web.port, 80);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_joystick(JoystickConfig::default().with_dead_zone(DeadZone::new(15).unwrap()))
//!     .with_web(WebConfig::default().with_port(8080));
//!
//! // Or load a (partial) JSON document
//! let config = Config::from_json(br#"{"joystick":{"dead_zone":5}}"#).unwrap();
//! assert_eq!(config.joystick.dead_zone.points(), 5);
//! ```

use core::fmt;

use heapless::String as HString;
use serde::{Deserialize, Serialize};

use crate::direction::{DeadZone, DeadZoneError};
use crate::sensor::{DEFAULT_MAX_CODE, DEFAULT_X_CHANNEL, DEFAULT_Y_CHANNEL};

/// Maximum length for short config strings (SSIDs, device names)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating on a char boundary if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= MAX_SHORT_STRING)
        .last()
        .unwrap_or(0);
    let _ = hs.push_str(&s[..end]);
    hs
}

// ============================================================================
// Errors
// ============================================================================

/// A configuration document or value was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Dead zone of 50 points or more.
    DeadZone(DeadZoneError),
    /// A full-scale ADC code of zero.
    ZeroMaxCode,
    /// The JSON document could not be parsed.
    Json,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DeadZone(e) => write!(f, "{}", e),
            ConfigError::ZeroMaxCode => f.write_str("max_code must be greater than zero"),
            ConfigError::Json => f.write_str("malformed configuration document"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

impl From<DeadZoneError> for ConfigError {
    fn from(e: DeadZoneError) -> Self {
        ConfigError::DeadZone(e)
    }
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// WiFi connection configuration
    pub wifi: WifiConfig,
    /// HTTP listener configuration
    pub web: WebConfig,
    /// Joystick sampling and classification
    pub joystick: JoystickConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl Config {
    /// Parse a JSON document. Missing sections and fields keep their defaults.
    ///
    /// Out-of-range dead zones fail parsing (reported as [`ConfigError::Json`]);
    /// a zero `max_code` is reported as [`ConfigError::ZeroMaxCode`].
    pub fn from_json(json: &[u8]) -> Result<Self, ConfigError> {
        let (config, _): (Config, usize) =
            serde_json_core::from_slice(json).map_err(|_| ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants not enforced by the field types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.joystick.validate()
    }

    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set joystick configuration
    pub fn with_joystick(mut self, joystick: JoystickConfig) -> Self {
        self.joystick = joystick;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }
}

// ============================================================================
// Joystick Config
// ============================================================================

/// Joystick sampling and direction classification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickConfig {
    /// Tolerance around center before an axis counts as deflected
    pub dead_zone: DeadZone,
    /// Full-scale raw ADC code (4095 for 12-bit)
    pub max_code: u16,
    /// ADC channel for the X axis
    pub x_channel: u8,
    /// ADC channel for the Y axis
    pub y_channel: u8,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            dead_zone: DeadZone::DEFAULT,
            max_code: DEFAULT_MAX_CODE,
            x_channel: DEFAULT_X_CHANNEL,
            y_channel: DEFAULT_Y_CHANNEL,
        }
    }
}

impl JoystickConfig {
    /// Set the dead zone
    pub fn with_dead_zone(mut self, dead_zone: DeadZone) -> Self {
        self.dead_zone = dead_zone;
        self
    }

    /// Set the full-scale ADC code
    pub fn with_max_code(mut self, max_code: u16) -> Self {
        self.max_code = max_code;
        self
    }

    /// Set the ADC channels for X and Y
    pub fn with_channels(mut self, x_channel: u8, y_channel: u8) -> Self {
        self.x_channel = x_channel;
        self.y_channel = y_channel;
        self
    }

    /// Reject a zero full-scale code
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_code == 0 {
            return Err(ConfigError::ZeroMaxCode);
        }
        Ok(())
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// HTTP listener configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { port: 80 }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Wildcard IPv4 address and port to bind.
    #[cfg(feature = "std")]
    pub fn bind_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi connection configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: ShortString,
    /// WiFi password
    pub password: ShortString,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u32,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: ShortString::new(),
            password: ShortString::new(),
            connect_timeout_ms: 20_000,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("joystick-compass"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
