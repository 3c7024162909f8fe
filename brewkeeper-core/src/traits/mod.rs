//! Collaborator traits
//!
//! These traits define the interface between the schedule logic and the
//! components it consults or drives.

pub mod controller;
pub mod gravity;

pub use controller::{ControlMode, ControlParameters, ControllerProxy};
pub use gravity::GravityTracker;
