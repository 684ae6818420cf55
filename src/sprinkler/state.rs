use serde::Serialize;

use super::station::{StationIndex, MAX_NUM_STATIONS};

/// Start bookkeeping for a station that is currently on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunInfo {
    pub program_id: u8,
    pub start_time: i64,
}

/// A finished run, kept for the log sink and the `/jc lrun` field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CompletedRun {
    pub station_index: StationIndex,
    pub program_id: u8,
    pub duration: i64,
    pub end_time: i64,
}

/// Volatile controller status. Everything here is rebuilt from ticks; only
/// the rain-delay stop time lives in the persisted options.
pub struct ControllerState {
    pub rain_delayed: bool,
    pub pause_state: bool,
    /// Remaining pause, decremented once per tick.
    pub pause_timer: i64,
    /// Tick idempotency guard (epoch second of the last processed tick).
    pub last_tick_second: i64,
    /// Minute-of-day of the last program-match pass; -1 forces a pass on the
    /// first tick after boot. Deliberately not persisted: a restart within
    /// the same minute may re-match a program (see DESIGN.md).
    pub last_checked_minute: i64,
    /// Per-station start info while the output is on.
    pub running_since: [Option<RunInfo>; MAX_NUM_STATIONS],
    pub last_run: Option<CompletedRun>,
}

impl Default for ControllerState {
    fn default() -> Self {
        ControllerState {
            rain_delayed: false,
            pause_state: false,
            pause_timer: 0,
            last_tick_second: -1,
            last_checked_minute: -1,
            running_since: [None; MAX_NUM_STATIONS],
            last_run: None,
        }
    }
}

impl ControllerState {
    /// Remaining pause in seconds (0 when not paused).
    pub fn pause_remaining(&self) -> i64 {
        if self.pause_state {
            self.pause_timer
        } else {
            0
        }
    }
}
