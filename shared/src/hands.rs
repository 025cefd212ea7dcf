//! Hand angle computation
//!
//! Converts a [`TimeSample`] into Euler rotations for each hand of the 3D clock. The hands
//! of the Putnik model are mounted on different axes: the second hand turns about Z while
//! the minute and hour hands turn about Y. That asymmetry is part of the model and must
//! not be normalized away.

use std::f64::consts::PI;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time_engine::TimeSample;

/// Slots on the date dial. Fixed at 31 regardless of the month length.
pub const DIAL_SLOTS: f64 = 31.0;

/// Logical hand of the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Second,
    Minute,
    Hour,
}

impl Hand {
    pub const ALL: [Hand; 3] = [Hand::Second, Hand::Minute, Hand::Hour];

    pub fn name(&self) -> &'static str {
        match self {
            Hand::Second => "second",
            Hand::Minute => "minute",
            Hand::Hour => "hour",
        }
    }
}

impl std::fmt::Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Rotation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
            Axis::Z => f.write_str("z"),
        }
    }
}

/// Error for calibration events naming an unknown hand or axis
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalibrationParseError {
    #[error("unknown hand: {0}")]
    UnknownHand(String),
    #[error("unknown axis: {0}")]
    UnknownAxis(String),
}

impl FromStr for Hand {
    type Err = CalibrationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "second" => Ok(Hand::Second),
            "minute" => Ok(Hand::Minute),
            "hour" => Ok(Hand::Hour),
            _ => Err(CalibrationParseError::UnknownHand(s.to_string())),
        }
    }
}

impl FromStr for Axis {
    type Err = CalibrationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(CalibrationParseError::UnknownAxis(s.to_string())),
        }
    }
}

/// Euler rotation in radians
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set_axis(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }
}

/// Per-hand additive calibration, in radians
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandOffsets {
    pub second: Rotation,
    pub minute: Rotation,
    pub hour: Rotation,
}

impl HandOffsets {
    /// Calibration that lines the Putnik model's second hand up with twelve o'clock
    pub fn putnik() -> Self {
        Self {
            second: Rotation::new(0.0, 0.0, 195f64.to_radians()),
            ..Self::default()
        }
    }

    pub fn get(&self, hand: Hand) -> Rotation {
        match hand {
            Hand::Second => self.second,
            Hand::Minute => self.minute,
            Hand::Hour => self.hour,
        }
    }

    fn get_mut(&mut self, hand: Hand) -> &mut Rotation {
        match hand {
            Hand::Second => &mut self.second,
            Hand::Minute => &mut self.minute,
            Hand::Hour => &mut self.hour,
        }
    }

    /// Apply one calibration event
    pub fn apply(&mut self, change: OffsetChange) {
        self.get_mut(change.hand).set_axis(change.axis, change.value);
    }
}

/// A discrete `(hand, axis, value)` calibration event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetChange {
    pub hand: Hand,
    pub axis: Axis,
    /// New absolute offset in radians
    pub value: f64,
}

impl OffsetChange {
    /// Build an event from the string names used by input surfaces
    pub fn parse(hand: &str, axis: &str, value: f64) -> Result<Self, CalibrationParseError> {
        Ok(Self {
            hand: hand.parse()?,
            axis: axis.parse()?,
            value,
        })
    }
}

/// Time-derived angles before calibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseAngles {
    pub second: f64,
    pub minute: f64,
    pub hour: f64,
}

/// Final rotations for every driven part of the clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandAngles {
    pub second: Rotation,
    pub minute: Rotation,
    pub hour: Rotation,
    pub dial: Rotation,
}

impl HandAngles {
    pub fn hand(&self, hand: Hand) -> Rotation {
        match hand {
            Hand::Second => self.second,
            Hand::Minute => self.minute,
            Hand::Hour => self.hour,
        }
    }
}

/// Clockwise hand angles for a sample. Midnight is zero for all three.
pub fn base_angles(sample: &TimeSample) -> BaseAngles {
    let hours = sample.hours12() as f64;
    let minutes = sample.minutes as f64;
    let seconds = sample.seconds as f64;

    BaseAngles {
        second: -(seconds / 60.0) * PI * 2.0,
        minute: -(minutes / 60.0) * PI * 2.0,
        hour: -((hours + minutes / 60.0) / 12.0) * PI * 2.0,
    }
}

/// Date dial rotation about Z, in radians
pub fn dial_angle(day_of_month: u32) -> f64 {
    let day = day_of_month as f64;
    (0.5 + (360.0 / DIAL_SLOTS) * (day - 6.0 - 1.0)) * (PI / 180.0)
}

/// Compute every rotation for a sample and a calibration snapshot
pub fn compute_angles(sample: &TimeSample, offsets: &HandOffsets) -> HandAngles {
    let base = base_angles(sample);
    let HandOffsets {
        second,
        minute,
        hour,
    } = *offsets;

    HandAngles {
        second: Rotation::new(second.x, second.y, second.z + base.second),
        minute: Rotation::new(minute.x, minute.y + base.minute, minute.z),
        hour: Rotation::new(hour.x, hour.y + base.hour, hour.z),
        dial: Rotation::new(0.0, 0.0, dial_angle(sample.day_of_month)),
    }
}
