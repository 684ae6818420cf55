//! Watering programs and the minute-resolution matcher.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use super::station::MAX_NUM_STATIONS;

pub const MAX_NUM_PROGRAMS: usize = 40;
pub const MAX_NUM_START_TIMES: usize = 4;

/// Reserved program id for manual single-station runs (`/cm`).
pub const MANUAL_PROGRAM_ID: u8 = 99;
/// Reserved program id for run-once programs (`/cr`).
pub const RUN_ONCE_PROGRAM_ID: u8 = 254;

const START_TIME_DISABLED_BIT: u16 = 1 << 15;
const START_TIME_SUNRISE_BIT: u16 = 1 << 14;
const START_TIME_SUNSET_BIT: u16 = 1 << 13;
const START_TIME_SIGN_BIT: u16 = 1 << 12;
const START_TIME_OFFSET_MASK: u16 = 0x7FF;

const SECS_PER_DAY: i64 = 86400;
const MINUTES_PER_DAY: u16 = 1440;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramType {
    Weekly,
    SingleRun,
    Monthly,
    Interval,
}

impl ProgramType {
    pub fn code(self) -> u8 {
        match self {
            ProgramType::Weekly => 0,
            ProgramType::SingleRun => 1,
            ProgramType::Monthly => 2,
            ProgramType::Interval => 3,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ProgramType::SingleRun,
            2 => ProgramType::Monthly,
            3 => ProgramType::Interval,
            _ => ProgramType::Weekly,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OddEven {
    None,
    Odd,
    Even,
}

impl OddEven {
    pub fn code(self) -> u8 {
        match self {
            OddEven::None => 0,
            OddEven::Odd => 1,
            OddEven::Even => 2,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => OddEven::Odd,
            2 => OddEven::Even,
            _ => OddEven::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartTimeMode {
    /// `start_times[0]` is the first start, `[1]` the repeat count, `[2]`
    /// the repeat interval in minutes.
    Repeating,
    /// Up to four independently encoded start times.
    Fixed,
}

/// Decode one 16-bit start-time slot into minutes from midnight.
///
/// Bit 15 disables the slot; bit 14/13 select a sunrise/sunset-relative
/// offset with bit 12 as the sign; bits 0–10 carry the offset (or absolute
/// minutes).
pub fn decode_start_time(encoded: u16, sunrise_time: u16, sunset_time: u16) -> Option<u16> {
    if encoded & START_TIME_DISABLED_BIT != 0 {
        return None;
    }

    let mut offset = i32::from(encoded & START_TIME_OFFSET_MASK);
    if encoded & START_TIME_SIGN_BIT != 0 {
        offset = -offset;
    }

    if encoded & START_TIME_SUNRISE_BIT != 0 {
        Some((i32::from(sunrise_time) + offset).max(0) as u16)
    } else if encoded & START_TIME_SUNSET_BIT != 0 {
        Some((i32::from(sunset_time) + offset).clamp(0, i32::from(MINUTES_PER_DAY) - 1) as u16)
    } else {
        Some(encoded & START_TIME_OFFSET_MASK)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub enabled: bool,
    pub use_weather: bool,
    pub program_type: ProgramType,
    pub odd_even: OddEven,
    pub start_time_mode: StartTimeMode,
    /// Interpretation depends on `program_type`: weekday bits, packed epoch
    /// day, day-of-month, or (remainder, interval).
    pub days: [u8; 2],
    pub start_times: [u16; MAX_NUM_START_TIMES],
    /// Seconds per station; zero means "not in this program".
    #[serde(with = "BigArray")]
    pub durations: [u16; MAX_NUM_STATIONS],
    pub date_range_enabled: bool,
    /// `(month << 5) | day` bounds; a `from > to` range wraps the year.
    pub date_range: [u16; 2],
}

impl Default for Program {
    fn default() -> Self {
        Program {
            name: String::new(),
            enabled: true,
            use_weather: false,
            program_type: ProgramType::Weekly,
            odd_even: OddEven::None,
            start_time_mode: StartTimeMode::Fixed,
            days: [0, 0],
            start_times: [START_TIME_DISABLED_BIT; MAX_NUM_START_TIMES],
            durations: [0; MAX_NUM_STATIONS],
            date_range_enabled: false,
            date_range: [0, 0],
        }
    }
}

impl Program {
    /// Match this program against a minute boundary.
    ///
    /// Returns the 1-based run number within the day, [None] when the
    /// program does not fire now. Call exactly once per minute-of-day change.
    pub fn check_match(&self, now: &DateTime<Utc>, sunrise_time: u16, sunset_time: u16) -> Option<u8> {
        if !self.enabled {
            return None;
        }

        let current_minute = (now.hour() * 60 + now.minute()) as u16;

        match self.start_time_mode {
            StartTimeMode::Fixed => {
                if !self.matches_day(now) {
                    return None;
                }
                for (slot, &encoded) in self.start_times.iter().enumerate() {
                    if decode_start_time(encoded, sunrise_time, sunset_time) == Some(current_minute) {
                        return Some(slot as u8 + 1);
                    }
                }
                None
            }
            StartTimeMode::Repeating => {
                let start = decode_start_time(self.start_times[0], sunrise_time, sunset_time)?;
                let repeat_count = self.start_times[1];
                let interval_min = self.start_times[2];

                if self.matches_day(now) {
                    if let Some(run) = repeat_series_match(current_minute, start, interval_min, repeat_count) {
                        return Some(run);
                    }
                }

                // a series that began yesterday can repeat past midnight
                if interval_min > 0 && self.matches_day(&(*now - Duration::days(1))) {
                    return repeat_series_match(current_minute + MINUTES_PER_DAY, start, interval_min, repeat_count);
                }

                None
            }
        }
    }

    /// Calendar gate: program-type day rule, odd/even restriction and the
    /// optional date range.
    fn matches_day(&self, day: &DateTime<Utc>) -> bool {
        let type_match = match self.program_type {
            ProgramType::Weekly => {
                let weekday = day.weekday().num_days_from_monday() as u8;
                self.days[0] & (1 << weekday) != 0
            }
            ProgramType::SingleRun => {
                let target = (u16::from(self.days[0]) << 8) | u16::from(self.days[1]);
                day.timestamp().div_euclid(SECS_PER_DAY) == i64::from(target)
            }
            ProgramType::Monthly => {
                let day_of_month = u32::from(self.days[0] & 0x1F);
                if day_of_month == 0 {
                    // zero means "last day of month"
                    (*day + Duration::seconds(SECS_PER_DAY)).month() != day.month()
                } else {
                    day.day() == day_of_month
                }
            }
            ProgramType::Interval => {
                let interval = i64::from(self.days[1]);
                interval > 0 && day.timestamp().div_euclid(SECS_PER_DAY).rem_euclid(interval) == i64::from(self.days[0])
            }
        };

        type_match && self.odd_even_ok(day) && self.date_range_ok(day)
    }

    fn odd_even_ok(&self, day: &DateTime<Utc>) -> bool {
        match self.odd_even {
            OddEven::None => true,
            OddEven::Odd => {
                if day.day() == 31 || (day.day() == 29 && day.month() == 2) {
                    return false;
                }
                day.day() % 2 == 1
            }
            OddEven::Even => day.day() % 2 == 0,
        }
    }

    fn date_range_ok(&self, day: &DateTime<Utc>) -> bool {
        if !self.date_range_enabled {
            return true;
        }
        let value = ((day.month() << 5) | day.day()) as u16;
        let [from, to] = self.date_range;
        if from <= to {
            (from..=to).contains(&value)
        } else {
            // from > to wraps the year boundary
            value >= from || value <= to
        }
    }
}

/// `minute == start + k * interval` for some `0 <= k <= repeat_count`
/// yields run number `k + 1`.
fn repeat_series_match(minute: u16, start: u16, interval_min: u16, repeat_count: u16) -> Option<u8> {
    if minute == start {
        return Some(1);
    }
    if minute < start || interval_min == 0 {
        return None;
    }
    let elapsed = minute - start;
    let k = elapsed / interval_min;
    if k * interval_min == elapsed && k <= repeat_count {
        Some((k + 1) as u8)
    } else {
        None
    }
}

/// Encode a sunrise/sunset-relative start time (for tests and defaults).
pub fn encode_solar_start_time(sunset: bool, offset_minutes: i16) -> u16 {
    let base = if sunset { START_TIME_SUNSET_BIT } else { START_TIME_SUNRISE_BIT };
    let sign = if offset_minutes < 0 { START_TIME_SIGN_BIT } else { 0 };
    base | sign | (offset_minutes.unsigned_abs() & START_TIME_OFFSET_MASK)
}
