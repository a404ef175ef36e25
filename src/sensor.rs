//! Joystick axis sampling and percentage scaling.
//!
//! [`SensorReader`] owns an [`AnalogSampler`] and turns one raw conversion per
//! axis into an [`AxisReading`] on the 0–100 scale:
//!
//! ```text
//! percent = min(raw, max_code) * 100 / max_code    (integer, truncating)
//! ```

use serde::Serialize;

use crate::config::JoystickConfig;
use crate::direction::{classify, DeadZone, Direction};
use crate::traits::AnalogSampler;

/// Full-scale code of a 12-bit converter.
pub const DEFAULT_MAX_CODE: u16 = 4095;

/// ADC channel wired to the joystick X axis on the stock board.
pub const DEFAULT_X_CHANNEL: u8 = 1;

/// ADC channel wired to the joystick Y axis on the stock board.
pub const DEFAULT_Y_CHANNEL: u8 = 0;

// ============================================================================
// Axis Reading
// ============================================================================

/// Displacement of one axis as an integer percentage in `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AxisReading(u8);

impl AxisReading {
    /// Top of the scale.
    pub const MAX: u8 = 100;

    /// Fully deflected towards the negative end.
    pub const MIN_READING: AxisReading = AxisReading(0);

    /// Resting position.
    pub const CENTER: AxisReading = AxisReading(50);

    /// Fully deflected towards the positive end.
    pub const MAX_READING: AxisReading = AxisReading(Self::MAX);

    /// Wrap a percentage, or `None` if it is above 100.
    pub const fn new(percent: u8) -> Option<Self> {
        if percent <= Self::MAX {
            Some(Self(percent))
        } else {
            None
        }
    }

    /// Scale a raw converter value onto the percentage range.
    ///
    /// Values above `max_code` are clamped. A `max_code` of zero reads as 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_compass::AxisReading;
    ///
    /// assert_eq!(AxisReading::from_raw(0, 4095).value(), 0);
    /// assert_eq!(AxisReading::from_raw(2048, 4095).value(), 50);
    /// assert_eq!(AxisReading::from_raw(4095, 4095).value(), 100);
    /// ```
    pub const fn from_raw(raw: u16, max_code: u16) -> Self {
        if max_code == 0 {
            return Self(0);
        }
        let raw = if raw > max_code { max_code } else { raw };
        Self((raw as u32 * Self::MAX as u32 / max_code as u32) as u8)
    }

    /// The percentage value.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl From<AxisReading> for u8 {
    fn from(reading: AxisReading) -> u8 {
        reading.0
    }
}

// ============================================================================
// Joystick Sample
// ============================================================================

/// One request's worth of sensor state: both axes and their direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoystickSample {
    /// X axis percentage.
    pub x: AxisReading,
    /// Y axis percentage.
    pub y: AxisReading,
    /// Compass direction for `(x, y)`.
    pub direction: Direction,
}

impl JoystickSample {
    /// Classify a pair of readings.
    pub const fn new(x: AxisReading, y: AxisReading, dead_zone: DeadZone) -> Self {
        Self {
            x,
            y,
            direction: classify(x, y, dead_zone),
        }
    }
}

// ============================================================================
// Sensor Reader
// ============================================================================

/// Two-axis joystick reader over an [`AnalogSampler`].
///
/// # Example
///
/// ```rust
/// use joystick_compass::{hal::MockAdc, SensorReader};
///
/// let adc = MockAdc::new().with_raw(1, 4095).with_raw(0, 0);
/// let mut reader = SensorReader::new(adc);
///
/// assert_eq!(reader.read_x().value(), 100);
/// assert_eq!(reader.read_y().value(), 0);
/// ```
#[derive(Debug)]
pub struct SensorReader<A> {
    sampler: A,
    x_channel: u8,
    y_channel: u8,
    max_code: u16,
}

impl<A: AnalogSampler> SensorReader<A> {
    /// Reader with the stock channel layout and a 12-bit scale.
    pub fn new(sampler: A) -> Self {
        Self {
            sampler,
            x_channel: DEFAULT_X_CHANNEL,
            y_channel: DEFAULT_Y_CHANNEL,
            max_code: DEFAULT_MAX_CODE,
        }
    }

    /// Reader using the channels and scale from `config`.
    pub fn from_config(sampler: A, config: &JoystickConfig) -> Self {
        Self {
            sampler,
            x_channel: config.x_channel,
            y_channel: config.y_channel,
            max_code: config.max_code,
        }
    }

    /// Set the ADC channels for the X and Y axes.
    pub fn with_channels(mut self, x_channel: u8, y_channel: u8) -> Self {
        self.x_channel = x_channel;
        self.y_channel = y_channel;
        self
    }

    /// Set the full-scale raw code.
    pub fn with_max_code(mut self, max_code: u16) -> Self {
        self.max_code = max_code;
        self
    }

    /// Sample `channel` once and scale it.
    pub fn read_axis(&mut self, channel: u8) -> AxisReading {
        AxisReading::from_raw(self.sampler.sample(channel), self.max_code)
    }

    /// Sample the X axis.
    pub fn read_x(&mut self) -> AxisReading {
        self.read_axis(self.x_channel)
    }

    /// Sample the Y axis.
    pub fn read_y(&mut self) -> AxisReading {
        self.read_axis(self.y_channel)
    }

    /// Sample both axes (X first) and classify them.
    pub fn sample(&mut self, dead_zone: DeadZone) -> JoystickSample {
        let x = self.read_x();
        let y = self.read_y();
        JoystickSample::new(x, y, dead_zone)
    }

    /// Full-scale raw code in use.
    pub fn max_code(&self) -> u16 {
        self.max_code
    }

    /// Borrow the underlying sampler.
    pub fn sampler(&self) -> &A {
        &self.sampler
    }

    /// Mutably borrow the underlying sampler.
    pub fn sampler_mut(&mut self) -> &mut A {
        &mut self.sampler
    }

    /// Give back the underlying sampler.
    pub fn into_inner(self) -> A {
        self.sampler
    }
}
