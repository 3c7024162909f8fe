//! Board-agnostic fermentation control logic
//!
//! This crate contains the application logic of the controller that does
//! not depend on specific hardware:
//!
//! - Calendar arithmetic for profile start times
//! - Profile store (parsing of the brewing schedule description)
//! - Resumable schedule state and its persisted status record
//! - Step state machine computing the beer setpoint
//! - The periodic keeper that forwards setpoints to the temperature controller
//! - Collaborator traits (gravity tracker, controller proxy)
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod calendar;
pub mod config;
pub mod error;
pub mod keeper;
pub mod measure;
pub mod persistence;
pub mod profile;
pub mod schedule;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ScheduleError;
pub use keeper::{BrewKeeper, KeepAction};
pub use measure::{Gravity, Setpoint, Unit};
pub use schedule::{BrewProfile, LoadOutcome};
