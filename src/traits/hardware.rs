//! Hardware abstraction traits for analog joystick sampling.
//!
//! The core never talks to an ADC peripheral directly. It selects a channel
//! and takes one raw sample through [`AnalogSampler`], which lets the same
//! request path run against the ESP32 ADC or the desktop mocks.
//!
//! # Implementation
//!
//! For testing and desktop development, use [`crate::hal::MockAdc`]. For
//! ESP32 hardware, use `hal::esp32::Esp32Joystick` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use joystick_compass::traits::AnalogSampler;
//! use joystick_compass::hal::MockAdc;
//!
//! let mut adc = MockAdc::new().with_raw(1, 3000);
//! adc.select_channel(1);
//! assert_eq!(adc.read_raw(), 3000);
//! ```

/// Analog sampling service.
///
/// Models a multiplexed ADC: one channel is selected at a time and
/// [`read_raw`](Self::read_raw) returns a single conversion from it.
///
/// # Implementation Notes
///
/// - Raw values are expected in `0..=max_code` for the configured converter
///   (4095 for a 12-bit ADC). Readers clamp anything above that.
/// - There is no per-sample error path. A converter that cannot be brought up
///   is an initialization failure, reported by the constructor of the
///   implementing type instead.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use joystick_compass::traits::AnalogSampler;
///
/// struct MyAdc { channel: u8 /* peripheral handles */ }
///
/// impl AnalogSampler for MyAdc {
///     fn select_channel(&mut self, channel: u8) {
///         self.channel = channel;
///     }
///
///     fn read_raw(&mut self) -> u16 {
///         // Start a conversion on self.channel and wait for it...
///         2048
///     }
/// }
/// ```
pub trait AnalogSampler {
    /// Route the converter input to `channel`.
    fn select_channel(&mut self, channel: u8);

    /// Take one raw sample from the selected channel.
    fn read_raw(&mut self) -> u16;

    /// Select `channel` and sample it in one call.
    fn sample(&mut self, channel: u8) -> u16 {
        self.select_channel(channel);
        self.read_raw()
    }
}

impl<T: AnalogSampler + ?Sized> AnalogSampler for &mut T {
    fn select_channel(&mut self, channel: u8) {
        (**self).select_channel(channel);
    }

    fn read_raw(&mut self) -> u16 {
        (**self).read_raw()
    }
}
