//! Temperature units, specific gravity and setpoints


/// Temperature value used on the controller link to mean "no setpoint"
pub const INVALID_SETPOINT: f32 = -100.0;

/// Any raw temperature at or below this value is treated as "no setpoint"
pub const INVALID_SETPOINT_LIMIT: f32 = -99.0;

/// Temperature unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Unit {
    Celsius,
    Fahrenheit,
    /// Not yet known
    #[default]
    Unset,
}

impl Unit {
    /// Parse the single-character wire tag
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'C' => Some(Unit::Celsius),
            'F' => Some(Unit::Fahrenheit),
            'U' => Some(Unit::Unset),
            _ => None,
        }
    }

    /// Single-character wire tag
    pub fn as_char(self) -> char {
        match self {
            Unit::Celsius => 'C',
            Unit::Fahrenheit => 'F',
            Unit::Unset => 'U',
        }
    }

    /// Convert a temperature expressed in `self` into `target`
    ///
    /// Conversions from or to [`Unit::Unset`] leave the value unchanged.
    pub fn convert(self, value: f32, target: Unit) -> f32 {
        match (self, target) {
            (Unit::Fahrenheit, Unit::Celsius) => fahrenheit_to_celsius(value),
            (Unit::Celsius, Unit::Fahrenheit) => celsius_to_fahrenheit(value),
            _ => value,
        }
    }
}

pub fn fahrenheit_to_celsius(f: f32) -> f32 {
    (f - 32.0) / 1.8
}

pub fn celsius_to_fahrenheit(c: f32) -> f32 {
    c * 1.8 + 32.0
}

/// Round half away from zero
pub fn round_half_away(value: f32) -> i32 {
    if value >= 0.0 {
        (value + 0.5) as i32
    } else {
        (value - 0.5) as i32
    }
}

/// Round to one decimal place, half away from zero
pub fn round_tenths(value: f32) -> f32 {
    round_half_away(value * 10.0) as f32 / 10.0
}

/// Specific gravity in fixed point (SG × 10000)
///
/// 1.0375 is stored as 10375.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gravity(pub u16);

impl Gravity {
    pub const SCALE: f32 = 10000.0;

    /// Convert from a floating-point specific gravity
    ///
    /// Values outside the representable range saturate.
    pub fn from_sg(sg: f32) -> Self {
        let raw = round_half_away(sg * Self::SCALE).clamp(0, u16::MAX as i32);
        Gravity(raw as u16)
    }

    /// Gravity `points` thousandths above nothing, e.g. 2 points = 0.002
    pub fn from_points(points: u16) -> Self {
        Gravity(points.saturating_mul(10))
    }

    pub fn as_sg(self) -> f32 {
        self.0 as f32 / Self::SCALE
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    /// Absolute difference between two readings
    pub fn abs_diff(self, other: Gravity) -> Gravity {
        Gravity(self.0.abs_diff(other.0))
    }
}

/// Target gravity after `attenuation_percent` of the fermentable points are gone
///
/// `og_points` is the original gravity above 1.000 (0.050 for OG 1.050).
pub fn attenuated_gravity(og_points: f32, attenuation_percent: f32) -> Gravity {
    Gravity::from_sg(1.0 + og_points * (100.0 - attenuation_percent) / 100.0)
}

/// Output of the schedule for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Setpoint {
    /// Hold this beer temperature, in the active unit
    Temperature(f32),
    /// No valid setpoint; keep the last commanded temperature
    Invalid,
}

impl Setpoint {
    /// Interpret a raw temperature that may carry the invalid sentinel
    pub fn from_raw(value: f32) -> Self {
        if value <= INVALID_SETPOINT_LIMIT {
            Setpoint::Invalid
        } else {
            Setpoint::Temperature(value)
        }
    }

    /// Raw temperature, [`INVALID_SETPOINT`] when there is none
    pub fn raw(self) -> f32 {
        match self {
            Setpoint::Temperature(t) => t,
            Setpoint::Invalid => INVALID_SETPOINT,
        }
    }

    pub fn temperature(self) -> Option<f32> {
        match self {
            Setpoint::Temperature(t) => Some(t),
            Setpoint::Invalid => None,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, Setpoint::Temperature(_))
    }
}
