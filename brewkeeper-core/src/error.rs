//! Schedule error taxonomy

use brewkeeper_hal::StorageError;

/// Errors raised while loading or running a brewing schedule
///
/// None of these is fatal: the caller keeps the last known-good schedule
/// and the controller keeps holding its last commanded temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScheduleError {
    /// Backing resource missing or unreadable
    StorageUnavailable,
    /// Structurally invalid description or missing required fields
    MalformedDescription,
    /// Description schema version is not the supported one
    UnsupportedVersion,
    /// Persisted step index is beyond the freshly parsed step count
    OutOfRangeState,
    /// Ramp step at the start or end of the sequence
    InvalidRamp,
}

impl From<StorageError> for ScheduleError {
    fn from(_: StorageError) -> Self {
        ScheduleError::StorageUnavailable
    }
}

impl From<serde_json::Error> for ScheduleError {
    fn from(_: serde_json::Error) -> Self {
        ScheduleError::MalformedDescription
    }
}
