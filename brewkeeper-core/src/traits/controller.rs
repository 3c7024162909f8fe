//! Temperature controller proxy trait
//!
//! The controller proper runs the thermostat loop on a separate board and
//! is reached through a line-oriented command link.

use crate::measure::Unit;

/// Controller operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMode {
    Off,
    /// Hold a constant beer temperature
    BeerConstant,
    /// Hold a constant fridge temperature
    FridgeConstant,
    /// Follow the beer profile (setpoints come from the keeper)
    BeerProfile,
}

impl ControlMode {
    /// Parse the single-character mode tag
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'o' => Some(ControlMode::Off),
            'b' => Some(ControlMode::BeerConstant),
            'f' => Some(ControlMode::FridgeConstant),
            'p' => Some(ControlMode::BeerProfile),
            _ => None,
        }
    }
}

/// Snapshot of the controller settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlParameters {
    pub unit: Unit,
    pub mode: ControlMode,
    /// Beer setpoint currently in force
    pub beer_set: f32,
    /// Fridge setpoint currently in force
    pub fridge_set: f32,
}

/// Link to the temperature controller
pub trait ControllerProxy {
    /// Current controller settings
    fn control_parameters(&self) -> ControlParameters;

    /// Send a raw command line, e.g. `j{beerSet:18.50}`
    fn write(&mut self, command: &str);
}
