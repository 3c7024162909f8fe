//! Calendar arithmetic
//!
//! Converts between broken-down date/time values and a count of seconds
//! since the reference epoch (1970-01-01 00:00:00). No time zone and no
//! leap seconds: profile start times and persisted step stamps are defined
//! in terms of exactly this arithmetic, so it must not be swapped for a
//! general purpose calendar.
//!
//! Years are carried as an offset from [`EPOCH_YEAR`], not as a four-digit
//! calendar year.

/// Seconds since the reference epoch
pub type Timestamp = u32;

/// Reference epoch year
pub const EPOCH_YEAR: u16 = 1970;

pub const SECS_PER_MIN: u32 = 60;
pub const SECS_PER_HOUR: u32 = 60 * SECS_PER_MIN;
pub const SECS_PER_DAY: u32 = 24 * SECS_PER_HOUR;

/// Month lengths for a non-leap year, January first
const MONTH_DAYS: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Check whether the year `offset` years after the epoch is a leap year
pub const fn is_leap_year(offset: u8) -> bool {
    let year = EPOCH_YEAR as u32 + offset as u32;
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

const fn days_in_year(offset: u8) -> u32 {
    if is_leap_year(offset) {
        366
    } else {
        365
    }
}

/// Length of `month` (1-based) in the year `offset` years after the epoch
pub const fn days_in_month(offset: u8, month: u8) -> u8 {
    if month == 2 && is_leap_year(offset) {
        29
    } else {
        MONTH_DAYS[(month - 1) as usize]
    }
}

/// Broken-down date and time
///
/// `weekday` is derived from the other fields and only ever produced,
/// never consumed: [`to_epoch_seconds`] ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// Years since [`EPOCH_YEAR`]
    pub year: u8,
    /// Month, 1 = January
    pub month: u8,
    /// Day of month, starting at 1
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Day of week, 1 = Sunday
    weekday: u8,
}

impl DateTime {
    /// Create a date/time; the day of week is filled in
    pub fn new(year: u8, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        let mut dt = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            weekday: 0,
        };
        dt.weekday = weekday_of(days_since_epoch(&dt));
        dt
    }

    /// Create from a four-digit calendar year
    ///
    /// Returns None for years before the epoch or beyond the representable range.
    pub fn from_calendar_year(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Option<Self> {
        let offset = year.checked_sub(EPOCH_YEAR)?;
        let offset = u8::try_from(offset).ok()?;
        Some(Self::new(offset, month, day, hour, minute, second))
    }

    /// Four-digit calendar year
    pub fn calendar_year(&self) -> u16 {
        EPOCH_YEAR + self.year as u16
    }

    /// Day of week, 1 = Sunday
    pub fn weekday(&self) -> u8 {
        self.weekday
    }

    /// Check the fields against month lengths and clock ranges
    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.year, self.month)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }
}

const fn weekday_of(days: u32) -> u8 {
    // 1970-01-01 was a Thursday
    ((days + 4) % 7) as u8 + 1
}

/// Whole days between the epoch and the date
fn days_since_epoch(dt: &DateTime) -> u32 {
    let mut days = dt.year as u32 * 365;
    for year in 0..dt.year {
        if is_leap_year(year) {
            days += 1;
        }
    }

    for month in 1..dt.month.min(13) {
        days += days_in_month(dt.year, month) as u32;
    }

    days + (dt.day as u32).saturating_sub(1)
}

/// Convert a broken-down time into seconds since the epoch
///
/// Returns None past 2106-02-07T06:28:15, the last second a [`Timestamp`] holds.
pub fn to_epoch_seconds(dt: &DateTime) -> Option<Timestamp> {
    let time_of_day =
        dt.hour as u32 * SECS_PER_HOUR + dt.minute as u32 * SECS_PER_MIN + dt.second as u32;
    days_since_epoch(dt)
        .checked_mul(SECS_PER_DAY)?
        .checked_add(time_of_day)
}

/// Break seconds since the epoch down into date and time fields
pub fn to_date_time(seconds: Timestamp) -> DateTime {
    let mut time = seconds;
    let second = (time % 60) as u8;
    time /= 60;
    let minute = (time % 60) as u8;
    time /= 60;
    let hour = (time % 24) as u8;
    let mut days = time / 24;

    let mut year = 0u8;
    while days >= days_in_year(year) {
        days -= days_in_year(year);
        year += 1;
    }

    let mut month = 1u8;
    while month < 12 && days >= days_in_month(year, month) as u32 {
        days -= days_in_month(year, month) as u32;
        month += 1;
    }

    DateTime {
        year,
        month,
        day: days as u8 + 1,
        hour,
        minute,
        second,
        weekday: weekday_of(seconds / SECS_PER_DAY),
    }
}

/// Parse the fixed-width `YYYY-MM-DDTHH:MM:SS` prefix of a date-time text
///
/// Only the first 19 characters are consulted; fractional seconds or a
/// zone marker after them are ignored. Dates a [`Timestamp`] cannot hold
/// are rejected.
pub fn parse_iso_prefix(text: &str) -> Option<DateTime> {
    let bytes = text.as_bytes();
    if bytes.len() < 19 {
        return None;
    }

    let year = field(bytes, 0, 4)?;
    let month = field(bytes, 5, 2)?;
    let day = field(bytes, 8, 2)?;
    let hour = field(bytes, 11, 2)?;
    let minute = field(bytes, 14, 2)?;
    let second = field(bytes, 17, 2)?;

    let dt = DateTime::from_calendar_year(
        year as u16,
        month as u8,
        day as u8,
        hour as u8,
        minute as u8,
        second as u8,
    )?;
    (dt.is_valid() && to_epoch_seconds(&dt).is_some()).then_some(dt)
}

/// Fixed-width decimal field
fn field(bytes: &[u8], start: usize, len: usize) -> Option<u32> {
    bytes[start..start + len].iter().try_fold(0u32, |acc, &b| {
        b.is_ascii_digit().then(|| acc * 10 + (b - b'0') as u32)
    })
}
