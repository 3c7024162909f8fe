//! Brewing schedule state machine
//!
//! Tracks progress through a multi-step fermentation profile, advances
//! steps on time, gravity and stability conditions, and computes the beer
//! setpoint for each tick.

use brewkeeper_hal::{Storage, StorageKey};

use super::state::ScheduleState;
use crate::calendar::Timestamp;
use crate::error::ScheduleError;
use crate::measure::{round_tenths, Gravity, Setpoint, Unit};
use crate::persistence::{self, BrewStatus};
use crate::profile::{parse_profile, ScheduleDefinition, StepCondition};
use crate::traits::GravityTracker;

/// Maximum profile description size
pub const MAX_PROFILE_LEN: usize = 2048;

/// Default stability threshold in gravity points
pub const DEFAULT_STABLE_THRESHOLD: u16 = 1;

/// How a freshly loaded profile was matched against saved progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadOutcome {
    /// No earlier progress; the position is estimated on the first tick
    Fresh,
    /// Same brew as the saved progress; position kept
    Resumed,
    /// Start time changed; progress reset to the first step
    NewBrew,
    /// Saved step index lies beyond the new step list; no setpoint until reloaded
    IndexOutOfRange,
}

/// Fermentation profile scheduler
///
/// Owns the storage used for the profile and status records, and the
/// gravity tracker consulted for stability conditions.
pub struct BrewProfile<S, G> {
    storage: S,
    tracker: G,
    schedule: Option<ScheduleDefinition>,
    state: ScheduleState,
    /// Unit all step temperatures are expressed in
    unit: Unit,
    status_loaded: bool,
    stable_threshold: u16,
}

impl<S: Storage, G: GravityTracker> BrewProfile<S, G> {
    /// Create a scheduler with no profile loaded
    pub fn new(storage: S, tracker: G) -> Self {
        Self {
            storage,
            tracker,
            schedule: None,
            state: ScheduleState::new(),
            unit: Unit::Unset,
            status_loaded: false,
            stable_threshold: DEFAULT_STABLE_THRESHOLD,
        }
    }

    /// Set the stability threshold used by steps without their own
    pub fn with_stable_threshold(mut self, points: u16) -> Self {
        self.stable_threshold = points;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn schedule(&self) -> Option<&ScheduleDefinition> {
        self.schedule.as_ref()
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    pub fn step_count(&self) -> usize {
        self.schedule.as_ref().map_or(0, ScheduleDefinition::len)
    }

    pub fn tracker(&self) -> &G {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut G {
        &mut self.tracker
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Load the profile description from storage
    ///
    /// On the first call the saved status is read beforehand, so the
    /// original-gravity baseline is known when attenuation targets are
    /// resolved. On failure the previously loaded profile stays in force.
    pub fn load(&mut self) -> Result<LoadOutcome, ScheduleError> {
        self.restore_status_once();

        let mut buffer = [0u8; MAX_PROFILE_LEN];
        let len = self
            .storage
            .read(StorageKey::BrewProfile, &mut buffer)
            .map_err(|e| {
                warn!("profile read failed: {}", e);
                ScheduleError::from(e)
            })?;

        self.apply_description(&buffer[..len])
    }

    /// Parse a profile description and make it the active schedule
    pub fn apply_description(&mut self, raw: &[u8]) -> Result<LoadOutcome, ScheduleError> {
        self.restore_status_once();
        let schedule = parse_profile(raw, self.state.og_points, self.stable_threshold)?;
        Ok(self.install(schedule))
    }

    fn restore_status_once(&mut self) {
        if self.status_loaded {
            return;
        }
        self.status_loaded = true;

        match persistence::load_status(&mut self.storage) {
            Ok(status) => self.state = ScheduleState::from_status(&status),
            Err(e) => {
                debug!("no brewing status: {}", e);
                self.state.reset_progress();
            }
        }
    }

    /// Install a parsed schedule, reconciling it with the known progress
    pub fn install(&mut self, mut schedule: ScheduleDefinition) -> LoadOutcome {
        let known_start = self.state.start_time;

        let outcome = if self.state.is_unestimated() {
            LoadOutcome::Fresh
        } else if known_start != 0
            && (known_start != schedule.start_time || self.state.entered_at < schedule.start_time)
        {
            info!(
                "new brew: start {} (was {})",
                schedule.start_time,
                known_start
            );
            self.state.reset_progress();
            LoadOutcome::NewBrew
        } else if self.state.current_step == schedule.len() {
            debug!("resumed a finished brew");
            self.state.step_duration = 0;
            LoadOutcome::Resumed
        } else {
            match step_duration(&schedule, self.state.current_step) {
                Ok(duration) => {
                    self.state.step_duration = duration;
                    LoadOutcome::Resumed
                }
                Err(e) => {
                    error!(
                        "saved step {} beyond {} steps: {}",
                        self.state.current_step,
                        schedule.len(),
                        e
                    );
                    LoadOutcome::IndexOutOfRange
                }
            }
        };

        self.state.start_time = schedule.start_time;

        if self.unit != Unit::Unset && self.unit != schedule.unit {
            debug!(
                "converting profile from {} to {}",
                schedule.unit.as_char(),
                self.unit.as_char()
            );
            schedule.convert_to(self.unit);
        } else {
            self.unit = schedule.unit;
        }

        info!(
            "profile loaded: {} steps, start {}, step {}",
            schedule.len(),
            schedule.start_time,
            self.state.current_step
        );
        self.schedule = Some(schedule);
        outcome
    }

    /// Switch the temperature unit, converting a loaded profile
    pub fn set_unit(&mut self, unit: Unit) {
        if unit == self.unit {
            return;
        }
        self.unit = unit;

        if let Some(schedule) = self.schedule.as_mut() {
            debug!("unit changed to {}", unit.as_char());
            schedule.convert_to(unit);
        }
    }

    /// Record the measured original gravity and persist it
    pub fn set_original_gravity(&mut self, sg: f32) {
        self.state.og_points = sg - 1.0;
        info!("original gravity {}", sg);
        self.persist();
    }

    /// Compute the setpoint for `now`, advancing steps as their conditions are met
    ///
    /// `gravity` is the latest gravity reading, None if there is no valid one.
    pub fn compute_setpoint(&mut self, now: Timestamp, gravity: Option<Gravity>) -> Setpoint {
        let Some(schedule) = self.schedule.as_ref() else {
            return Setpoint::Invalid;
        };

        if now < schedule.start_time {
            return Setpoint::Invalid;
        }

        if self.state.is_unestimated() {
            self.estimate_step();
        }

        if self.step_is_complete(now, gravity) {
            self.advance(now);
        }

        self.setpoint_for_active_step(now)
    }

    /// Position the schedule at its first step, entered at the start time
    fn estimate_step(&mut self) {
        let Some(schedule) = self.schedule.as_ref() else {
            return;
        };
        self.state.current_step = 0;
        self.state.entered_at = schedule.start_time;
        self.state.step_duration = schedule.steps.first().map_or(0, |s| s.duration_s());
        debug!("estimated step 0 entered at {}", schedule.start_time);
    }

    fn step_is_complete(&self, now: Timestamp, gravity: Option<Gravity>) -> bool {
        let Some(step) = self
            .schedule
            .as_ref()
            .and_then(|s| s.steps.get(self.state.current_step))
        else {
            return false;
        };

        let time = self.state.elapsed(now) >= self.state.step_duration;
        let gravity_met = match (gravity, step.gravity) {
            (Some(reading), Some(target)) => reading <= target,
            _ => false,
        };
        let tracker = &self.tracker;
        let stable = || {
            step.stability
                .map_or(false, |s| tracker.is_stable(s.window_hours, s.threshold))
        };

        step.condition.is_met(time, gravity_met, stable)
    }

    /// Move past the active step and any zero-length steps after it
    fn advance(&mut self, now: Timestamp) {
        let Some(schedule) = self.schedule.as_ref() else {
            return;
        };
        let count = schedule.len();

        loop {
            self.state.current_step += 1;
            self.state.entered_at = now;
            if let Some(step) = schedule.steps.get(self.state.current_step) {
                self.state.step_duration = step.duration_s();
            }
            if self.state.step_duration != 0 || self.state.current_step >= count {
                break;
            }
        }

        info!(
            "advanced to step {} at {}, duration {}",
            self.state.current_step,
            now,
            self.state.step_duration
        );
        self.persist();
    }

    fn setpoint_for_active_step(&self, now: Timestamp) -> Setpoint {
        let Some(schedule) = self.schedule.as_ref() else {
            return Setpoint::Invalid;
        };
        let Some(step) = schedule.steps.get(self.state.current_step) else {
            return Setpoint::Invalid;
        };

        if step.condition != StepCondition::Ramp {
            return Setpoint::Temperature(step.temperature);
        }

        match self.ramp_temperature(schedule, now) {
            Ok(temperature) => Setpoint::Temperature(temperature),
            Err(e) => {
                warn!("step {}: {}", self.state.current_step, e);
                Setpoint::Invalid
            }
        }
    }

    /// Interpolate between the neighbouring steps' temperatures
    fn ramp_temperature(
        &self,
        schedule: &ScheduleDefinition,
        now: Timestamp,
    ) -> Result<f32, ScheduleError> {
        let index = self.state.current_step;
        if index == 0 || index + 1 >= schedule.len() {
            return Err(ScheduleError::InvalidRamp);
        }

        let previous = schedule.steps[index - 1].temperature;
        let next = schedule.steps[index + 1].temperature;
        if self.state.step_duration == 0 {
            return Ok(next);
        }

        let fraction = self.state.elapsed(now) as f32 / self.state.step_duration as f32;
        Ok(round_tenths(fraction * (next - previous) + previous))
    }

    /// Write the status record; a failed write is logged and otherwise ignored
    fn persist(&mut self) {
        let status = BrewStatus::from_state(&self.state);
        if let Err(e) = persistence::save_status(&mut self.storage, &status) {
            warn!("brewing status write failed: {}", e);
        }
    }
}

/// Duration of step `index`, guarding against stale indices
fn step_duration(schedule: &ScheduleDefinition, index: usize) -> Result<Timestamp, ScheduleError> {
    schedule
        .steps
        .get(index)
        .map(|step| step.duration_s())
        .ok_or(ScheduleError::OutOfRangeState)
}
