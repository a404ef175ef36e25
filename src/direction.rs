//! Compass-rose classification of a joystick position.
//!
//! Each axis is reduced to a [`Tendency`] relative to the 50% center and a
//! [`DeadZone`]. The ordered pair of tendencies then selects one cell of a
//! fixed 3×3 table of [`Direction`]s:
//!
//! ```text
//!             y: Negative   Neutral   Positive
//! x: Negative    Southwest  West      Northwest
//! x: Neutral     South      Center    North
//! x: Positive    Southeast  East      Northeast
//! ```
//!
//! Threshold comparisons are strict, so a reading exactly on the edge of the
//! dead zone is still neutral.
//!
//! # Example
//!
//! ```rust
//! use joystick_compass::{classify, AxisReading, DeadZone, Direction};
//!
//! let dz = DeadZone::new(10).unwrap();
//! let x = AxisReading::new(90).unwrap();
//! let y = AxisReading::new(50).unwrap();
//!
//! assert_eq!(classify(x, y, dz), Direction::East);
//! assert_eq!(classify(x, y, dz).name(), "Leste");
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::sensor::AxisReading;

/// Center of the percentage scale.
pub const AXIS_CENTER: u8 = 50;

// ============================================================================
// Dead Zone
// ============================================================================

/// Tolerance, in percentage points, around the 50% center.
///
/// Always in `0..50`. A value of 50 or more would leave one side of an axis
/// unreachable, so construction rejects it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DeadZone(u8);

impl DeadZone {
    /// Exclusive upper bound for a dead zone.
    pub const LIMIT: u8 = AXIS_CENTER;

    /// Dead zone used by the stock firmware.
    pub const DEFAULT: DeadZone = DeadZone(10);

    /// No tolerance: any deviation from exactly 50 counts.
    pub const NONE: DeadZone = DeadZone(0);

    /// Create a dead zone, rejecting values of 50 or more.
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_compass::DeadZone;
    ///
    /// assert!(DeadZone::new(0).is_ok());
    /// assert!(DeadZone::new(49).is_ok());
    /// assert!(DeadZone::new(50).is_err());
    /// ```
    pub const fn new(points: u8) -> Result<Self, DeadZoneError> {
        if points < Self::LIMIT {
            Ok(Self(points))
        } else {
            Err(DeadZoneError(points))
        }
    }

    /// The tolerance in percentage points.
    #[inline]
    pub const fn points(self) -> u8 {
        self.0
    }

    /// Readings strictly above this lean positive.
    #[inline]
    pub const fn upper(self) -> u8 {
        AXIS_CENTER + self.0
    }

    /// Readings strictly below this lean negative.
    #[inline]
    pub const fn lower(self) -> u8 {
        AXIS_CENTER - self.0
    }
}

impl Default for DeadZone {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for DeadZone {
    type Error = DeadZoneError;

    fn try_from(points: u8) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<DeadZone> for u8 {
    fn from(dz: DeadZone) -> u8 {
        dz.0
    }
}

/// A dead zone of 50 points or more was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeadZoneError(pub u8);

impl fmt::Display for DeadZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dead zone {} out of range (must be below {})",
            self.0,
            DeadZone::LIMIT
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DeadZoneError {}

// ============================================================================
// Tendency
// ============================================================================

/// Signed lean of one axis: -1, 0 or +1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tendency {
    /// Below the dead zone.
    Negative,
    /// Inside the dead zone (boundaries included).
    Neutral,
    /// Above the dead zone.
    Positive,
}

impl Tendency {
    /// Classify one axis reading.
    pub const fn of(reading: AxisReading, dead_zone: DeadZone) -> Self {
        let v = reading.value();
        if v > dead_zone.upper() {
            Tendency::Positive
        } else if v < dead_zone.lower() {
            Tendency::Negative
        } else {
            Tendency::Neutral
        }
    }

    /// As a signed offset.
    #[inline]
    pub const fn offset(self) -> i8 {
        match self {
            Tendency::Negative => -1,
            Tendency::Neutral => 0,
            Tendency::Positive => 1,
        }
    }

    /// Row/column index into the rose table (offset + 1).
    #[inline]
    const fn index(self) -> usize {
        match self {
            Tendency::Negative => 0,
            Tendency::Neutral => 1,
            Tendency::Positive => 2,
        }
    }
}

// ============================================================================
// Direction
// ============================================================================

/// One of the nine compass-rose directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Y above the dead zone, X neutral.
    North,
    /// Y below the dead zone, X neutral.
    South,
    /// X above the dead zone, Y neutral.
    East,
    /// X below the dead zone, Y neutral.
    West,
    /// Both axes positive.
    Northeast,
    /// X negative, Y positive.
    Northwest,
    /// X positive, Y negative.
    Southeast,
    /// Both axes negative.
    Southwest,
    /// Both axes inside the dead zone.
    #[default]
    Center,
}

/// Rose table, indexed `[x.index()][y.index()]`.
const ROSE: [[Direction; 3]; 3] = [
    [Direction::Southwest, Direction::West, Direction::Northwest],
    [Direction::South, Direction::Center, Direction::North],
    [Direction::Southeast, Direction::East, Direction::Northeast],
];

impl Direction {
    /// All nine directions.
    pub const ALL: [Direction; 9] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Northeast,
        Direction::Northwest,
        Direction::Southeast,
        Direction::Southwest,
        Direction::Center,
    ];

    /// Look up the direction for a pair of tendencies.
    #[inline]
    pub const fn from_tendencies(x: Tendency, y: Tendency) -> Self {
        ROSE[x.index()][y.index()]
    }

    /// Human-readable name, as shown on the dashboard and sent in telemetry.
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_compass::Direction;
    ///
    /// assert_eq!(Direction::North.name(), "Norte");
    /// assert_eq!(Direction::Southwest.name(), "Sudoeste");
    /// assert_eq!(Direction::Center.name(), "Centro");
    /// ```
    pub const fn name(self) -> &'static str {
        match self {
            Direction::North => "Norte",
            Direction::South => "Sul",
            Direction::East => "Leste",
            Direction::West => "Oeste",
            Direction::Northeast => "Nordeste",
            Direction::Northwest => "Noroeste",
            Direction::Southeast => "Sudeste",
            Direction::Southwest => "Sudoeste",
            Direction::Center => "Centro",
        }
    }

    /// Horizontal component of this direction.
    pub const fn x_tendency(self) -> Tendency {
        match self {
            Direction::East | Direction::Northeast | Direction::Southeast => Tendency::Positive,
            Direction::West | Direction::Northwest | Direction::Southwest => Tendency::Negative,
            Direction::North | Direction::South | Direction::Center => Tendency::Neutral,
        }
    }

    /// Vertical component of this direction.
    pub const fn y_tendency(self) -> Tendency {
        match self {
            Direction::North | Direction::Northeast | Direction::Northwest => Tendency::Positive,
            Direction::South | Direction::Southeast | Direction::Southwest => Tendency::Negative,
            Direction::East | Direction::West | Direction::Center => Tendency::Neutral,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a joystick position into a compass direction.
///
/// Total over all readings: every input pair yields exactly one direction.
pub const fn classify(x: AxisReading, y: AxisReading, dead_zone: DeadZone) -> Direction {
    Direction::from_tendencies(Tendency::of(x, dead_zone), Tendency::of(y, dead_zone))
}
