//! Two-axis joystick sampling via the ESP32 ADC.
//!
//! Both axes sit on ADC1 so they can be read while WiFi is active (ADC2 is
//! shared with the radio on the C3).
//!
//! # Wiring
//!
//! - VRy → GPIO0 (ADC1 channel 0)
//! - VRx → GPIO1 (ADC1 channel 1)
//! - VCC → 3.3V, GND → GND
//!
//! With 11 dB attenuation a 12-bit oneshot read spans 0..=4095 across the
//! full potentiometer travel.

use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::adc::ADC1;
use esp_idf_hal::gpio::{Gpio0, Gpio1};
use esp_idf_hal::peripheral::Peripheral;
use log::warn;

use crate::traits::AnalogSampler;

/// Joystick sampler over two ADC1 oneshot channels.
///
/// Implements the select-then-read [`AnalogSampler`] contract: channel 0 is
/// GPIO0 and channel 1 is GPIO1. Any other channel reads as 0.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::adc::oneshot::AdcDriver;
/// use joystick_compass::hal::esp32::Esp32Joystick;
/// use joystick_compass::RequestDispatcher;
///
/// let peripherals = Peripherals::take()?;
/// let adc1 = AdcDriver::new(peripherals.adc1)?;
/// let joystick = Esp32Joystick::new(&adc1, peripherals.pins.gpio0, peripherals.pins.gpio1)?;
///
/// let mut dispatcher = RequestDispatcher::new(joystick);
/// ```
pub struct Esp32Joystick<'d> {
    /// Channel 0 (GPIO0)
    ch0: AdcChannelDriver<'d, Gpio0, &'d AdcDriver<'d, ADC1>>,
    /// Channel 1 (GPIO1)
    ch1: AdcChannelDriver<'d, Gpio1, &'d AdcDriver<'d, ADC1>>,
    /// Channel chosen by the last `select_channel`
    selected: u8,
}

impl<'d> Esp32Joystick<'d> {
    /// Creates a joystick sampler.
    ///
    /// # Arguments
    ///
    /// * `adc` - Reference to ADC1 driver (must outlive this struct)
    /// * `gpio0` - Y axis pin
    /// * `gpio1` - X axis pin
    ///
    /// # Errors
    ///
    /// Returns an error if ADC channel initialization fails.
    pub fn new(
        adc: &'d AdcDriver<'d, ADC1>,
        gpio0: impl Peripheral<P = Gpio0> + 'd,
        gpio1: impl Peripheral<P = Gpio1> + 'd,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        let ch0 = AdcChannelDriver::new(adc, gpio0, &config)?;
        let ch1 = AdcChannelDriver::new(adc, gpio1, &config)?;

        Ok(Self {
            ch0,
            ch1,
            selected: 0,
        })
    }
}

impl AnalogSampler for Esp32Joystick<'_> {
    fn select_channel(&mut self, channel: u8) {
        if channel > 1 {
            warn!("ADC channel {} is not wired, reads will return 0", channel);
        }
        self.selected = channel;
    }

    fn read_raw(&mut self) -> u16 {
        // A failed conversion reads as fully deflected low.
        match self.selected {
            0 => self.ch0.read().unwrap_or(0),
            1 => self.ch1.read().unwrap_or(0),
            _ => 0,
        }
    }
}
