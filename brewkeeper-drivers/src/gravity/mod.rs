//! Gravity tracking

mod tracker;

pub use tracker::{GravitySample, RollingGravityTracker, HISTORY_HOURS};
