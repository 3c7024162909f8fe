//! Profile store
//!
//! Parses the persisted brewing profile description into an ordered
//! sequence of steps.

pub mod parser;
pub mod step;

pub use parser::{parse_profile, CURRENT_PROFILE_VERSION};
pub use step::{ProfileStep, ScheduleDefinition, Stability, StepCondition};
