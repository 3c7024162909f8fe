//! Brewing status persistence
//!
//! Saves and restores schedule progress so a brew resumes across power
//! cycles. The record is a small JSON object:
//!
//! ```json
//! {"s":2,"e":1467350553,"b":1467331200,"og":50}
//! ```
//!
//! `og` carries the original-gravity baseline in thousandths, as an
//! integer, so it survives save/load cycles without drift.

use brewkeeper_hal::{Storage, StorageError, StorageKey};
use serde::{Deserialize, Serialize};

use crate::calendar::Timestamp;
use crate::measure::round_half_away;
use crate::schedule::ScheduleState;

/// Maximum serialized status size
pub const MAX_STATUS_LEN: usize = 256;

/// Persisted status record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BrewStatus {
    /// Current step index
    #[serde(rename = "s")]
    pub step: u32,
    /// Time the current step was entered
    #[serde(rename = "e")]
    pub entered: Timestamp,
    /// Schedule start time
    #[serde(rename = "b")]
    pub start: Timestamp,
    /// Original gravity points × 1000
    #[serde(rename = "og")]
    pub og_x1000: i32,
}

impl BrewStatus {
    /// Capture the persisted part of a schedule state
    pub fn from_state(state: &ScheduleState) -> Self {
        Self {
            step: state.current_step as u32,
            entered: state.entered_at,
            start: state.start_time,
            og_x1000: round_half_away(state.og_points * 1000.0),
        }
    }

    /// Original-gravity baseline above 1.000
    pub fn og_points(&self) -> f32 {
        self.og_x1000 as f32 / 1000.0
    }
}

/// Status persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusError {
    /// Storage operation failed
    Storage(StorageError),
    /// Serialization failed
    Serialize,
    /// Record missing fields or not JSON
    Deserialize,
}

impl From<StorageError> for StatusError {
    fn from(e: StorageError) -> Self {
        StatusError::Storage(e)
    }
}

/// Write the status record
pub fn save_status<S: Storage>(storage: &mut S, status: &BrewStatus) -> Result<(), StatusError> {
    let record = serde_json::to_vec(status).map_err(|_| StatusError::Serialize)?;
    if record.len() > MAX_STATUS_LEN {
        return Err(StatusError::Serialize);
    }
    storage.write(StorageKey::BrewStatus, &record)?;
    debug!(
        "status saved: step {}, entered {}, start {}",
        status.step,
        status.entered,
        status.start
    );
    Ok(())
}

/// Read the status record
pub fn load_status<S: Storage>(storage: &mut S) -> Result<BrewStatus, StatusError> {
    let mut buffer = [0u8; MAX_STATUS_LEN];
    let len = storage.read(StorageKey::BrewStatus, &mut buffer)?;
    let status: BrewStatus =
        serde_json::from_slice(&buffer[..len]).map_err(|_| StatusError::Deserialize)?;
    debug!(
        "status loaded: step {}, entered {}, start {}, og {}",
        status.step,
        status.entered,
        status.start,
        status.og_x1000
    );
    Ok(status)
}
