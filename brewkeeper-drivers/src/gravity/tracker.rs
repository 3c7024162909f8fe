//! Rolling gravity tracker
//!
//! Keeps one gravity sample per hour and answers "has gravity stayed
//! within a band for the last N hours".

use brewkeeper_core::calendar::{Timestamp, SECS_PER_HOUR};
use brewkeeper_core::traits::GravityTracker;
use brewkeeper_core::Gravity;
use heapless::HistoryBuffer;

/// Hours of history kept
pub const HISTORY_HOURS: usize = 72;

/// One hourly history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GravitySample {
    /// Hours since the epoch
    pub hour: u32,
    pub gravity: Gravity,
}

/// Hourly gravity history
pub struct RollingGravityTracker {
    samples: HistoryBuffer<GravitySample, HISTORY_HOURS>,
    current: Option<Gravity>,
}

impl Default for RollingGravityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingGravityTracker {
    pub const fn new() -> Self {
        Self {
            samples: HistoryBuffer::new(),
            current: None,
        }
    }

    /// Record a reading taken at `now`
    ///
    /// Only the first reading of each hour enters the history; every reading
    /// updates [`current`](Self::current).
    pub fn record(&mut self, now: Timestamp, gravity: Gravity) {
        self.current = Some(gravity);

        let hour = now / SECS_PER_HOUR;
        if let Some(last) = self.samples.recent() {
            if hour <= last.hour {
                return;
            }
        }
        self.samples.write(GravitySample { hour, gravity });
    }

    /// Latest reading
    pub fn current(&self) -> Option<Gravity> {
        self.current
    }

    /// Hourly history, oldest first
    pub fn samples(&self) -> impl Iterator<Item = &GravitySample> + '_ {
        self.samples.oldest_ordered()
    }

    /// Number of hourly samples held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.len() == 0
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.current = None;
    }
}

impl GravityTracker for RollingGravityTracker {
    fn is_stable(&self, window_hours: u16, threshold: Gravity) -> bool {
        let window = u32::from(window_hours);
        if window == 0 || window as usize > HISTORY_HOURS {
            return false;
        }

        let (Some(oldest), Some(latest)) = (self.samples.oldest_ordered().next(), self.samples.recent())
        else {
            return false;
        };
        // History must reach back over the whole window
        if latest.hour - oldest.hour < window {
            return false;
        }

        let since = latest.hour - window;
        let mut in_window = self
            .samples
            .oldest_ordered()
            .filter(|s| s.hour >= since)
            .map(|s| s.gravity);

        let Some(first) = in_window.next() else {
            return false;
        };
        let (min, max) = in_window.fold((first, first), |(min, max), g| (min.min(g), max.max(g)));
        max.abs_diff(min) <= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HOUR: Timestamp = SECS_PER_HOUR;
    const START: Timestamp = 1_577_836_800;

    fn tracker_with(readings: &[u16]) -> RollingGravityTracker {
        let mut tracker = RollingGravityTracker::new();
        for (i, raw) in readings.iter().enumerate() {
            tracker.record(START + i as Timestamp * HOUR, Gravity(*raw));
        }
        tracker
    }

    #[test]
    fn test_one_sample_per_hour() {
        let mut tracker = RollingGravityTracker::new();
        tracker.record(START, Gravity(10200));
        tracker.record(START + 600, Gravity(10190));
        tracker.record(START + 1200, Gravity(10180));
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.current(), Some(Gravity(10180)));

        tracker.record(START + HOUR, Gravity(10170));
        assert_eq!(tracker.len(), 2);

        let hour = START / HOUR;
        let history: [GravitySample; 2] = [
            GravitySample { hour, gravity: Gravity(10200) },
            GravitySample { hour: hour + 1, gravity: Gravity(10170) },
        ];
        assert!(tracker.samples().copied().eq(history));
    }

    #[test]
    fn test_stable_within_threshold() {
        // 25 hourly samples spanning 24 hours, within 0.001
        let readings = [10120u16; 25];
        let tracker = tracker_with(&readings);
        assert!(tracker.is_stable(24, Gravity::from_points(1)));
    }

    #[test]
    fn test_short_history_not_stable() {
        let tracker = tracker_with(&[10120; 10]);
        assert!(!tracker.is_stable(24, Gravity::from_points(1)));
        assert!(!RollingGravityTracker::new().is_stable(1, Gravity::from_points(1)));
    }

    #[test]
    fn test_drop_beyond_threshold() {
        let mut readings = [10120u16; 25];
        readings[20] = 10150;
        let tracker = tracker_with(&readings);
        assert!(!tracker.is_stable(24, Gravity::from_points(1)));
        assert!(tracker.is_stable(24, Gravity::from_points(3)));
        // The spike falls outside a 3-hour window
        assert!(tracker.is_stable(3, Gravity::from_points(1)));
    }

    #[test]
    fn test_window_limits() {
        let tracker = tracker_with(&[10120; HISTORY_HOURS]);
        assert!(!tracker.is_stable(0, Gravity::from_points(1)));
        assert!(!tracker.is_stable(HISTORY_HOURS as u16 + 1, Gravity::from_points(1)));
        assert!(tracker.is_stable(HISTORY_HOURS as u16 - 1, Gravity::from_points(1)));
    }

    #[test]
    fn test_old_samples_roll_off() {
        let mut readings = [10100u16; HISTORY_HOURS + 10];
        readings[0] = 10500;
        let tracker = tracker_with(&readings);
        assert_eq!(tracker.len(), HISTORY_HOURS);
        assert!(tracker.is_stable(48, Gravity::from_points(0)));
    }

    proptest! {
        #[test]
        fn prop_stable_iff_spread_within_threshold(
            readings in proptest::collection::vec(10000u16..10100, 13..40),
            threshold in 0u16..60,
        ) {
            let tracker = tracker_with(&readings);
            let window = 12usize;
            let tail = &readings[readings.len() - window - 1..];
            let spread = tail.iter().max().unwrap() - tail.iter().min().unwrap();
            prop_assert_eq!(
                tracker.is_stable(window as u16, Gravity(threshold)),
                spread <= threshold
            );
        }
    }
}
