//! Gravity tracking trait

use crate::measure::Gravity;

/// Source of the gravity stability predicate
///
/// The schedule only reads from the tracker; feeding it readings is the
/// owner's job.
pub trait GravityTracker {
    /// Check whether gravity changed by no more than `threshold` over the
    /// last `window_hours`
    fn is_stable(&self, window_hours: u16, threshold: Gravity) -> bool;
}

impl<T: GravityTracker + ?Sized> GravityTracker for &T {
    fn is_stable(&self, window_hours: u16, threshold: Gravity) -> bool {
        (**self).is_stable(window_hours, threshold)
    }
}
