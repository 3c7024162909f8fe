//! Brewing schedule
//!
//! Resumable progress through a loaded profile and the step state machine
//! that turns it into a setpoint.

pub mod machine;
pub mod state;

pub use machine::{BrewProfile, LoadOutcome, DEFAULT_STABLE_THRESHOLD, MAX_PROFILE_LEN};
pub use state::ScheduleState;
