//! Binary sensor debouncing.
//!
//! Each configured sensor (rain or soil) runs an on/off delay state machine
//! over the raw pin level. The debounce timers hold absolute epoch seconds,
//! not countdowns, so a missed tick cannot stretch the delay.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::gpio::Level;

pub const MAX_SENSORS: usize = 2;

/// Hard floor for the on/off delays, even when configuration says zero.
pub const MINIMUM_ON_DELAY: i64 = 5;
pub const MINIMUM_OFF_DELAY: i64 = 5;

/// Pseudo station id base for sensor log records (`200 + sensor index`).
pub const SENSOR_LOG_STATION_BASE: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    None,
    Rain,
    /// Parsed for wire compatibility; flow metering itself is not supported.
    Flow,
    Soil,
}

impl SensorKind {
    pub fn code(self) -> u8 {
        match self {
            SensorKind::None => 0,
            SensorKind::Rain => 1,
            SensorKind::Flow => 2,
            SensorKind::Soil => 3,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => SensorKind::Rain,
            2 => SensorKind::Flow,
            3 => SensorKind::Soil,
            _ => SensorKind::None,
        }
    }

    /// Kinds the debouncer polls.
    pub fn is_binary(self) -> bool {
        matches!(self, SensorKind::Rain | SensorKind::Soil)
    }
}

/// Contact type of the sensor input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalState {
    Closed,
    Open,
}

impl NormalState {
    pub fn code(self) -> u8 {
        match self {
            NormalState::Closed => 0,
            NormalState::Open => 1,
        }
    }

    pub fn from_code(code: u8) -> Self {
        if code == 0 {
            NormalState::Closed
        } else {
            NormalState::Open
        }
    }
}

impl fmt::Display for NormalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalState::Closed => write!(f, "NC"),
            NormalState::Open => write!(f, "NO"),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SensorConfig {
    pub kind: SensorKind,
    pub normal_state: NormalState,
    /// Seconds; floored to [`MINIMUM_ON_DELAY`].
    pub delay_on: u8,
    /// Seconds; floored to [`MINIMUM_OFF_DELAY`].
    pub delay_off: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            kind: SensorKind::None,
            normal_state: NormalState::Closed,
            delay_on: 0,
            delay_off: 0,
        }
    }
}

/// Per-sensor debounce state, mutated only by [`Debouncer::poll`].
#[derive(Clone, Copy, Default)]
pub struct Debouncer {
    pub active: bool,
    on_timer: Option<i64>,
    off_timer: Option<i64>,
    pub last_active_time: Option<i64>,
}

impl Debouncer {
    /// Feed one raw pin sample. Returns the new `active` value when it
    /// transitioned, [None] otherwise.
    pub fn poll(&mut self, raw: Level, config: &SensorConfig, now: i64) -> Option<bool> {
        // NC is triggered by an open (high) contact, NO by a closed one.
        let triggered = u8::from(raw.is_high()) != config.normal_state.code();

        if triggered {
            match self.on_timer {
                None => {
                    self.on_timer = Some(now + i64::from(config.delay_on).max(MINIMUM_ON_DELAY));
                    self.off_timer = None;
                }
                Some(deadline) if now >= deadline && !self.active => {
                    self.active = true;
                    self.last_active_time = Some(now);
                    return Some(true);
                }
                Some(_) => {}
            }
        } else {
            match self.off_timer {
                None => {
                    self.off_timer = Some(now + i64::from(config.delay_off).max(MINIMUM_OFF_DELAY));
                    self.on_timer = None;
                }
                Some(deadline) if now >= deadline && self.active => {
                    self.active = false;
                    return Some(false);
                }
                Some(_) => {}
            }
        }

        None
    }

    pub fn reset(&mut self) {
        *self = Debouncer::default();
    }
}
