//! Resumable schedule progress

use crate::calendar::Timestamp;
use crate::persistence::BrewStatus;

/// Progress through the active schedule
///
/// `current_step` equal to the number of steps means the schedule is
/// exhausted. Within one brew it never decreases.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScheduleState {
    /// Index of the active step
    pub current_step: usize,
    /// Time the active step was entered; 0 = position not yet estimated
    pub entered_at: Timestamp,
    /// Duration of the active step in seconds, derived from the step
    pub step_duration: Timestamp,
    /// Start time of the brew this progress belongs to; 0 = unknown
    pub start_time: Timestamp,
    /// Original gravity above 1.000 (0.050 for OG 1.050)
    pub og_points: f32,
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleState {
    pub const fn new() -> Self {
        Self {
            current_step: 0,
            entered_at: 0,
            step_duration: 0,
            start_time: 0,
            og_points: 0.0,
        }
    }

    /// Restore progress from a persisted record
    pub fn from_status(status: &BrewStatus) -> Self {
        Self {
            current_step: status.step as usize,
            entered_at: status.entered,
            step_duration: 0,
            start_time: status.start,
            og_points: status.og_points(),
        }
    }

    /// Check whether the position in the schedule still has to be estimated
    pub fn is_unestimated(&self) -> bool {
        self.current_step == 0 && self.entered_at == 0
    }

    /// Forget progress; a new brew starts from the first step
    ///
    /// The original-gravity baseline is kept.
    pub fn reset_progress(&mut self) {
        self.current_step = 0;
        self.entered_at = 0;
        self.step_duration = 0;
    }

    /// Seconds spent in the active step; a clock behind the entry stamp counts as zero
    pub fn elapsed(&self, now: Timestamp) -> Timestamp {
        now.saturating_sub(self.entered_at)
    }
}
