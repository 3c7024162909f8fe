//! Profile description parser
//!
//! Profiles are small JSON documents written by the web front end:
//!
//! ```json
//! {"s":"2016-07-01T05:22:33.351Z","u":"C","v":2,
//!  "t":[{"c":"g","d":6,"t":12,"g":1.026},{"c":"r","d":1},{"c":"t","d":3,"t":18}]}
//! ```
//!
//! The outer `t` is the step list; inside a step `t` is the temperature.

use alloc::string::String;
use alloc::vec::Vec;

use serde::Deserialize;

use super::step::{ProfileStep, ScheduleDefinition, Stability, StepCondition};
use crate::calendar::{parse_iso_prefix, to_epoch_seconds};
use crate::error::ScheduleError;
use crate::measure::{attenuated_gravity, Gravity, Unit};

/// The only description schema version this parser accepts
pub const CURRENT_PROFILE_VERSION: u8 = 2;

#[derive(Deserialize)]
struct RawProfile {
    s: Option<String>,
    u: Option<String>,
    v: Option<i64>,
    t: Option<Vec<RawStep>>,
}

#[derive(Deserialize)]
struct RawStep {
    c: String,
    #[serde(default)]
    d: f32,
    t: Option<f32>,
    g: Option<RawGravity>,
    s: Option<u16>,
    x: Option<u16>,
}

/// Gravity target: a literal SG, or a string such as `"75%"`
#[derive(Deserialize)]
#[serde(untagged)]
enum RawGravity {
    Number(f32),
    Text(String),
}

/// Parse a profile description
///
/// # Arguments
/// - `raw`: the stored description text
/// - `og_points`: current original-gravity baseline above 1.000, used to
///   resolve attenuation percentages (0 if not yet measured)
/// - `stable_threshold`: default stability threshold in gravity points for
///   steps that do not carry their own
pub fn parse_profile(
    raw: &[u8],
    og_points: f32,
    stable_threshold: u16,
) -> Result<ScheduleDefinition, ScheduleError> {
    let root: RawProfile = serde_json::from_slice(raw).map_err(|_| {
        warn!("profile: JSON parsing failed");
        ScheduleError::MalformedDescription
    })?;

    let (Some(start), Some(unit), Some(version), Some(raw_steps)) =
        (root.s, root.u, root.v, root.t)
    else {
        warn!("profile: missing required fields");
        return Err(ScheduleError::MalformedDescription);
    };

    if version != CURRENT_PROFILE_VERSION as i64 {
        warn!("profile: unsupported version {}", version);
        return Err(ScheduleError::UnsupportedVersion);
    }

    let start_time = parse_iso_prefix(&start)
        .and_then(|dt| to_epoch_seconds(&dt))
        .ok_or_else(|| {
            warn!("profile: bad start time");
            ScheduleError::MalformedDescription
        })?;

    let unit = unit
        .chars()
        .next()
        .and_then(Unit::from_char)
        .filter(|u| *u != Unit::Unset)
        .ok_or(ScheduleError::MalformedDescription)?;

    let steps = raw_steps
        .iter()
        .map(|step| parse_step(step, og_points, stable_threshold))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "profile: start {}, unit {}, {} steps",
        start_time,
        unit.as_char(),
        steps.len()
    );

    Ok(ScheduleDefinition {
        steps,
        start_time,
        unit,
        version: CURRENT_PROFILE_VERSION,
    })
}

fn parse_step(
    raw: &RawStep,
    og_points: f32,
    stable_threshold: u16,
) -> Result<ProfileStep, ScheduleError> {
    let condition = raw
        .c
        .chars()
        .next()
        .and_then(StepCondition::from_tag)
        .ok_or(ScheduleError::MalformedDescription)?;

    if raw.d.is_nan() || raw.d < 0.0 {
        return Err(ScheduleError::MalformedDescription);
    }

    if condition == StepCondition::Ramp {
        return Ok(ProfileStep::ramp(raw.d));
    }

    let temperature = raw.t.ok_or(ScheduleError::MalformedDescription)?;

    let gravity = raw
        .g
        .as_ref()
        .map(|g| resolve_gravity(g, og_points))
        .transpose()?;

    let stability = raw.s.map(|window_hours| Stability {
        window_hours,
        threshold: Gravity::from_points(raw.x.unwrap_or(stable_threshold)),
    });

    Ok(ProfileStep {
        condition,
        days: raw.d,
        temperature,
        gravity,
        stability,
    })
}

fn resolve_gravity(raw: &RawGravity, og_points: f32) -> Result<Gravity, ScheduleError> {
    match raw {
        RawGravity::Number(sg) => Ok(Gravity::from_sg(*sg)),
        RawGravity::Text(text) => {
            let text = text.trim();
            if let Some(percent) = text.strip_suffix('%') {
                let attenuation: f32 = percent
                    .trim()
                    .parse()
                    .map_err(|_| ScheduleError::MalformedDescription)?;
                Ok(attenuated_gravity(og_points, attenuation))
            } else {
                let sg: f32 = text
                    .parse()
                    .map_err(|_| ScheduleError::MalformedDescription)?;
                Ok(Gravity::from_sg(sg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DateTime;

    const SAMPLE: &str = r#"{"s":"2016-07-01T05:22:33.351Z","u":"C","v":2,
        "t":[{"c":"g","d":6,"t":12,"g":1.026},{"c":"r","d":1},
             {"c":"u","d":3,"t":18,"s":48,"x":2},{"c":"t","d":0.5,"t":2}]}"#;

    #[test]
    fn test_parse_sample() {
        let schedule = parse_profile(SAMPLE.as_bytes(), 0.0, 1).unwrap();

        let start = DateTime::from_calendar_year(2016, 7, 1, 5, 22, 33).unwrap();
        assert_eq!(Some(schedule.start_time), to_epoch_seconds(&start));
        assert_eq!(schedule.unit, Unit::Celsius);
        assert_eq!(schedule.len(), 4);

        let first = &schedule.steps[0];
        assert_eq!(first.condition, StepCondition::Gravity);
        assert_eq!(first.temperature, 12.0);
        assert_eq!(first.gravity, Some(Gravity(10260)));
        assert_eq!(first.duration_s(), 6 * 86_400);

        assert_eq!(schedule.steps[1].condition, StepCondition::Ramp);

        let stable = schedule.steps[2].stability.unwrap();
        assert_eq!(stable.window_hours, 48);
        assert_eq!(stable.threshold, Gravity::from_points(2));
    }

    #[test]
    fn test_default_stable_threshold() {
        let raw = br#"{"s":"2020-01-01T00:00:00","u":"F","v":2,"t":[{"c":"s","d":1,"t":64,"s":24}]}"#;
        let schedule = parse_profile(raw, 0.0, 3).unwrap();
        assert_eq!(
            schedule.steps[0].stability.unwrap().threshold,
            Gravity::from_points(3)
        );
        assert_eq!(schedule.unit, Unit::Fahrenheit);
    }

    #[test]
    fn test_attenuation_percentage() {
        let raw = br#"{"s":"2020-01-01T00:00:00","u":"C","v":2,"t":[{"c":"g","d":0,"t":18,"g":"25%"}]}"#;
        let schedule = parse_profile(raw, 0.050, 1).unwrap();
        // 1 + 0.050 * (100 - 25) / 100 = 1.0375
        assert_eq!(schedule.steps[0].gravity, Some(Gravity(10375)));
    }

    #[test]
    fn test_gravity_as_plain_string() {
        let raw = br#"{"s":"2020-01-01T00:00:00","u":"C","v":2,"t":[{"c":"g","d":0,"t":18,"g":"1.012"}]}"#;
        let schedule = parse_profile(raw, 0.050, 1).unwrap();
        assert_eq!(schedule.steps[0].gravity, Some(Gravity(10120)));
    }

    #[test]
    fn test_missing_version() {
        let raw = br#"{"s":"2020-01-01T00:00:00","u":"C","t":[]}"#;
        assert_eq!(
            parse_profile(raw, 0.0, 1),
            Err(ScheduleError::MalformedDescription)
        );
    }

    #[test]
    fn test_wrong_version() {
        let raw = br#"{"s":"2020-01-01T00:00:00","u":"C","v":1,"t":[]}"#;
        assert_eq!(
            parse_profile(raw, 0.0, 1),
            Err(ScheduleError::UnsupportedVersion)
        );
    }

    #[test]
    fn test_steps_not_an_array() {
        let raw = br#"{"s":"2020-01-01T00:00:00","u":"C","v":2,"t":5}"#;
        assert_eq!(
            parse_profile(raw, 0.0, 1),
            Err(ScheduleError::MalformedDescription)
        );
    }

    #[test]
    fn test_malformed_steps() {
        for raw in [
            // unknown condition tag
            &br#"{"s":"2020-01-01T00:00:00","u":"C","v":2,"t":[{"c":"z","d":1,"t":18}]}"#[..],
            // temperature missing on a non-ramp step
            &br#"{"s":"2020-01-01T00:00:00","u":"C","v":2,"t":[{"c":"t","d":1}]}"#[..],
            // negative duration
            &br#"{"s":"2020-01-01T00:00:00","u":"C","v":2,"t":[{"c":"t","d":-1,"t":18}]}"#[..],
            // bad attenuation
            &br#"{"s":"2020-01-01T00:00:00","u":"C","v":2,"t":[{"c":"g","d":1,"t":18,"g":"lots%"}]}"#[..],
            // bad unit
            &br#"{"s":"2020-01-01T00:00:00","u":"K","v":2,"t":[]}"#[..],
            // truncated start time
            &br#"{"s":"2020-01-01","u":"C","v":2,"t":[]}"#[..],
            // start time beyond the timestamp range
            &br#"{"s":"2200-01-01T00:00:00","u":"C","v":2,"t":[]}"#[..],
            &b"not json"[..],
        ] {
            assert_eq!(
                parse_profile(raw, 0.0, 1),
                Err(ScheduleError::MalformedDescription)
            );
        }
    }
}
