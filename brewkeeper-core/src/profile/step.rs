//! Profile step definitions

use crate::calendar::{Timestamp, SECS_PER_DAY};
use crate::measure::{Gravity, Unit};

/// Completion condition of a profile step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepCondition {
    /// Linear ramp between the neighbouring steps, ends on time
    Ramp,
    Time,
    Gravity,
    TimeAndGravity,
    TimeOrGravity,
    Stable,
    TimeOrStable,
    TimeAndStable,
    GravityOrStable,
    GravityAndStable,
    TimeAndGravityAndStable,
    TimeOrGravityOrStable,
}

impl StepCondition {
    /// Parse the single-character tag used in profile descriptions
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'r' => Some(StepCondition::Ramp),
            't' => Some(StepCondition::Time),
            'g' => Some(StepCondition::Gravity),
            'a' => Some(StepCondition::TimeAndGravity),
            'o' => Some(StepCondition::TimeOrGravity),
            's' => Some(StepCondition::Stable),
            'u' => Some(StepCondition::TimeOrStable),
            'v' => Some(StepCondition::TimeAndStable),
            'b' => Some(StepCondition::GravityOrStable),
            'x' => Some(StepCondition::GravityAndStable),
            'w' => Some(StepCondition::TimeAndGravityAndStable),
            'e' => Some(StepCondition::TimeOrGravityOrStable),
            _ => None,
        }
    }

    pub fn tag(self) -> char {
        match self {
            StepCondition::Ramp => 'r',
            StepCondition::Time => 't',
            StepCondition::Gravity => 'g',
            StepCondition::TimeAndGravity => 'a',
            StepCondition::TimeOrGravity => 'o',
            StepCondition::Stable => 's',
            StepCondition::TimeOrStable => 'u',
            StepCondition::TimeAndStable => 'v',
            StepCondition::GravityOrStable => 'b',
            StepCondition::GravityAndStable => 'x',
            StepCondition::TimeAndGravityAndStable => 'w',
            StepCondition::TimeOrGravityOrStable => 'e',
        }
    }

    /// Whether evaluating this condition consults the gravity tracker
    pub fn uses_stability(self) -> bool {
        matches!(
            self,
            StepCondition::Stable
                | StepCondition::TimeOrStable
                | StepCondition::TimeAndStable
                | StepCondition::GravityOrStable
                | StepCondition::GravityAndStable
                | StepCondition::TimeAndGravityAndStable
                | StepCondition::TimeOrGravityOrStable
        )
    }

    /// Decide whether the step is complete
    ///
    /// `stable` is only called for conditions that reference stability.
    pub fn is_met(self, time: bool, gravity: bool, stable: impl FnOnce() -> bool) -> bool {
        match self {
            StepCondition::Ramp | StepCondition::Time => time,
            StepCondition::Gravity => gravity,
            StepCondition::TimeAndGravity => time && gravity,
            StepCondition::TimeOrGravity => time || gravity,
            StepCondition::Stable => stable(),
            StepCondition::TimeOrStable => time || stable(),
            StepCondition::TimeAndStable => time && stable(),
            StepCondition::GravityOrStable => gravity || stable(),
            StepCondition::GravityAndStable => gravity && stable(),
            StepCondition::TimeAndGravityAndStable => time && gravity && stable(),
            StepCondition::TimeOrGravityOrStable => time || gravity || stable(),
        }
    }
}

/// Stability predicate parameters of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stability {
    /// Observation window in hours
    pub window_hours: u16,
    /// Largest gravity change within the window still counted as stable
    pub threshold: Gravity,
}

/// One step of a brewing profile
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProfileStep {
    pub condition: StepCondition,
    /// Step length in days; 0 means the step is skipped
    pub days: f32,
    /// Target beer temperature in the schedule unit (unused by ramps)
    pub temperature: f32,
    /// Gravity at or below which the gravity condition holds
    pub gravity: Option<Gravity>,
    pub stability: Option<Stability>,
}

impl ProfileStep {
    /// A plain time-based step
    pub fn timed(days: f32, temperature: f32) -> Self {
        Self {
            condition: StepCondition::Time,
            days,
            temperature,
            gravity: None,
            stability: None,
        }
    }

    /// A ramp over `days` between the neighbouring steps
    pub fn ramp(days: f32) -> Self {
        Self {
            condition: StepCondition::Ramp,
            days,
            temperature: 0.0,
            gravity: None,
            stability: None,
        }
    }

    /// Step length in whole seconds
    pub fn duration_s(&self) -> Timestamp {
        (self.days * SECS_PER_DAY as f32) as Timestamp
    }
}

/// A parsed brewing profile
///
/// Replaced as a whole on every reload, never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDefinition {
    pub steps: alloc::vec::Vec<ProfileStep>,
    /// Brew start time
    pub start_time: Timestamp,
    /// Unit of every step temperature
    pub unit: Unit,
    pub version: u8,
}

impl ScheduleDefinition {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Re-express every step temperature in `unit`
    pub fn convert_to(&mut self, unit: Unit) {
        if unit == self.unit || unit == Unit::Unset {
            return;
        }
        for step in &mut self.steps {
            step.temperature = self.unit.convert(step.temperature, unit);
        }
        self.unit = unit;
    }
}
