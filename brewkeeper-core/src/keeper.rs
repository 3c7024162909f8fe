//! Periodic keeper
//!
//! Called from the main loop. Rate-limits itself, makes sure a profile is
//! loaded while the controller follows the beer profile, and forwards the
//! computed setpoint to the temperature controller when it moved enough.

use core::fmt::Write;

use brewkeeper_hal::Storage;
use heapless::String;

use crate::calendar::Timestamp;
use crate::config::KeeperConfig;
use crate::measure::Gravity;
use crate::schedule::BrewProfile;
use crate::traits::{ControlMode, ControllerProxy, GravityTracker};

/// Capacity of a setpoint command
const COMMAND_LEN: usize = 36;

/// What a call to [`BrewKeeper::keep`] did
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeepAction {
    /// Called again before the minimum period elapsed
    Throttled,
    /// Controller is not following the beer profile
    NotProfileMode,
    /// No profile could be loaded
    NoProfile,
    /// The schedule has no setpoint right now
    NoSetpoint,
    /// Setpoint within the minimum step of the controller's
    Unchanged,
    /// New beer setpoint sent to the controller
    Commanded(f32),
}

/// Drives a [`BrewProfile`] and forwards its setpoint to the controller
pub struct BrewKeeper<S, G, C> {
    profile: BrewProfile<S, G>,
    controller: C,
    config: KeeperConfig,
    last_run: Option<Timestamp>,
    last_gravity: Option<Gravity>,
    reload_pending: bool,
}

impl<S: Storage, G: GravityTracker, C: ControllerProxy> BrewKeeper<S, G, C> {
    pub fn new(storage: S, tracker: G, controller: C, config: KeeperConfig) -> Self {
        Self {
            profile: BrewProfile::new(storage, tracker)
                .with_stable_threshold(config.stable_threshold),
            controller,
            config,
            last_run: None,
            last_gravity: None,
            reload_pending: false,
        }
    }

    /// Run one keeper tick
    pub fn keep(&mut self, now: Timestamp) -> KeepAction {
        if let Some(last) = self.last_run {
            if now.saturating_sub(last) < self.config.min_period_s {
                return KeepAction::Throttled;
            }
        }
        self.last_run = Some(now);

        let parameters = self.controller.control_parameters();
        if parameters.mode != ControlMode::BeerProfile {
            return KeepAction::NotProfileMode;
        }

        if !self.profile.is_loaded() || self.reload_pending {
            match self.profile.load() {
                Ok(outcome) => {
                    debug!("profile load: {}", outcome);
                    self.reload_pending = false;
                }
                Err(e) => warn!("profile load failed: {}", e),
            }
        }
        if !self.profile.is_loaded() {
            return KeepAction::NoProfile;
        }

        self.profile.set_unit(parameters.unit);

        let Some(temperature) = self
            .profile
            .compute_setpoint(now, self.last_gravity)
            .temperature()
        else {
            return KeepAction::NoSetpoint;
        };

        let step = self.config.min_temperature_step;
        let moved = temperature - parameters.beer_set > step
            || parameters.beer_set - temperature > step;
        if !moved {
            return KeepAction::Unchanged;
        }

        let mut command: String<COMMAND_LEN> = String::new();
        if write!(command, "j{{beerSet:{:.2}}}", temperature).is_err() {
            error!("setpoint command overflow");
            return KeepAction::NoSetpoint;
        }
        info!("beer setpoint {}", temperature);
        self.controller.write(&command);
        KeepAction::Commanded(temperature)
    }

    /// Latest gravity reading; None when there is no valid one
    pub fn update_gravity(&mut self, gravity: Option<Gravity>) {
        self.last_gravity = gravity;
    }

    pub fn set_original_gravity(&mut self, sg: f32) {
        self.profile.set_original_gravity(sg);
    }

    /// Reload the profile at the next effective tick
    pub fn profile_updated(&mut self) {
        self.reload_pending = true;
    }

    pub fn profile(&self) -> &BrewProfile<S, G> {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut BrewProfile<S, G> {
        &mut self.profile
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::SECS_PER_DAY;
    use crate::measure::Unit;
    use crate::testing::{MemoryStorage, RecordingController, ScriptedTracker};
    use brewkeeper_hal::StorageKey;

    /// 2020-01-01T00:00:00
    const T0: Timestamp = 1_577_836_800;

    const PROFILE: &str = r#"{"s":"2020-01-01T00:00:00","u":"C","v":2,
        "t":[{"c":"t","d":1,"t":18},{"c":"g","d":4,"t":20,"g":1.012},{"c":"t","d":2,"t":4}]}"#;

    type Keeper = BrewKeeper<MemoryStorage, ScriptedTracker, RecordingController>;

    fn keeper(mode: ControlMode, beer_set: f32) -> Keeper {
        let mut storage = MemoryStorage::new();
        storage.insert(StorageKey::BrewProfile, PROFILE.as_bytes());
        BrewKeeper::new(
            storage,
            ScriptedTracker::new(false),
            RecordingController::new(mode, Unit::Celsius, beer_set),
            KeeperConfig::default(),
        )
    }

    #[test]
    fn test_commands_setpoint() {
        let mut keeper = keeper(ControlMode::BeerProfile, 20.0);
        assert_eq!(keeper.keep(T0), KeepAction::Commanded(18.0));
        assert_eq!(keeper.controller().commands, ["j{beerSet:18.00}"]);
    }

    #[test]
    fn test_throttled() {
        let mut keeper = keeper(ControlMode::BeerProfile, 20.0);
        keeper.keep(T0);
        assert_eq!(keeper.keep(T0 + 59), KeepAction::Throttled);
        assert_ne!(keeper.keep(T0 + 60), KeepAction::Throttled);
    }

    #[test]
    fn test_not_profile_mode() {
        let mut keeper = keeper(ControlMode::BeerConstant, 20.0);
        assert_eq!(keeper.keep(T0), KeepAction::NotProfileMode);
        assert!(!keeper.profile().is_loaded());
        assert!(keeper.controller().commands.is_empty());
    }

    #[test]
    fn test_small_change_not_sent() {
        let mut keeper = keeper(ControlMode::BeerProfile, 18.1);
        assert_eq!(keeper.keep(T0), KeepAction::Unchanged);

        keeper.controller_mut().parameters.beer_set = 18.3;
        assert_eq!(keeper.keep(T0 + 60), KeepAction::Commanded(18.0));
    }

    #[test]
    fn test_no_profile() {
        let mut keeper = BrewKeeper::new(
            MemoryStorage::new(),
            ScriptedTracker::new(false),
            RecordingController::new(ControlMode::BeerProfile, Unit::Celsius, 20.0),
            KeeperConfig::default(),
        );
        assert_eq!(keeper.keep(T0), KeepAction::NoProfile);
    }

    #[test]
    fn test_before_start_no_setpoint() {
        let mut keeper = keeper(ControlMode::BeerProfile, 20.0);
        assert_eq!(keeper.keep(T0 - SECS_PER_DAY), KeepAction::NoSetpoint);
        assert!(keeper.controller().commands.is_empty());
    }

    #[test]
    fn test_gravity_forwarded() {
        let mut keeper = keeper(ControlMode::BeerProfile, 18.0);
        keeper.keep(T0);
        let mut now = T0 + SECS_PER_DAY;
        assert_eq!(keeper.keep(now), KeepAction::Commanded(20.0));

        keeper.controller_mut().parameters.beer_set = 20.0;
        keeper.update_gravity(Some(Gravity::from_sg(1.011)));
        now += 60;
        assert_eq!(keeper.keep(now), KeepAction::Commanded(4.0));
        assert_eq!(keeper.profile().current_step(), 2);
    }

    #[test]
    fn test_follows_controller_unit() {
        let mut keeper = keeper(ControlMode::BeerProfile, 20.0);
        keeper.controller_mut().parameters.unit = Unit::Fahrenheit;
        keeper.controller_mut().parameters.beer_set = 60.0;

        let KeepAction::Commanded(t) = keeper.keep(T0) else {
            panic!("expected a command");
        };
        assert!((t - 64.4).abs() < 0.001);
        assert_eq!(keeper.controller().commands, ["j{beerSet:64.40}"]);
    }

    #[test]
    fn test_profile_updated_reloads() {
        let mut keeper = keeper(ControlMode::BeerProfile, 20.0);
        keeper.keep(T0);

        keeper.profile_mut().storage_mut().insert(
            StorageKey::BrewProfile,
            br#"{"s":"2020-01-01T00:00:00","u":"C","v":2,"t":[{"c":"t","d":1,"t":12}]}"#,
        );
        keeper.profile_updated();
        assert_eq!(keeper.keep(T0 + 60), KeepAction::Commanded(12.0));
    }

    #[test]
    fn test_failed_reload_keeps_running_and_retries() {
        let mut keeper = keeper(ControlMode::BeerProfile, 20.0);
        keeper.keep(T0);
        keeper.controller_mut().parameters.beer_set = 18.0;

        keeper
            .profile_mut()
            .storage_mut()
            .insert(StorageKey::BrewProfile, b"{\"s\":");
        keeper.profile_updated();
        assert_eq!(keeper.keep(T0 + 60), KeepAction::Unchanged);
        assert_eq!(keeper.profile().step_count(), 3);

        keeper.profile_mut().storage_mut().insert(
            StorageKey::BrewProfile,
            br#"{"s":"2020-01-01T00:00:00","u":"C","v":2,"t":[{"c":"t","d":1,"t":12}]}"#,
        );
        assert_eq!(keeper.keep(T0 + 120), KeepAction::Commanded(12.0));
        assert_eq!(keeper.profile().step_count(), 1);
    }

    #[test]
    fn test_original_gravity_saved() {
        let mut keeper = keeper(ControlMode::BeerProfile, 20.0);
        keeper.keep(T0);
        keeper.set_original_gravity(1.048);
        let text = keeper
            .profile_mut()
            .storage_mut()
            .text(StorageKey::BrewStatus)
            .unwrap();
        assert!(text.ends_with(r#""og":48}"#));
    }
}
