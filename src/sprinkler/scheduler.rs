//! Run admission and ordering.
//!
//! The scheduler owns the runtime queue, the per-group sequential stop
//! times, and the weather scaling rule. It knows nothing about rain state;
//! the controller filters gated stations before admission.

use super::program::{Program, MANUAL_PROGRAM_ID, RUN_ONCE_PROGRAM_ID};
use super::queue::{EnqueueError, RuntimeQueue};
use super::station::{Station, StationIndex, NUM_SEQUENTIAL_GROUPS, PARALLEL_GROUP_ID};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueOption {
    /// Sequential-group placement (parallel stations start immediately).
    Append,
    /// Start immediately regardless of group, no stop-time bump.
    InsertFront,
    /// Clear the queue and zero the stop-time array, then append.
    Replace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Scheduled { start_time: i64 },
    AlreadyQueued,
    Disabled,
    OutOfRange,
    QueueFull,
}

impl Admission {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, Admission::Scheduled { .. })
    }
}

pub struct Scheduler {
    pub queue: RuntimeQueue,
    last_seq_stop_times: [i64; NUM_SEQUENTIAL_GROUPS],
    /// Inter-station dwell added to every sequential stop-time bump (seconds).
    pub station_delay: i64,
    /// Master off-lag per master index (seconds). Items for bound stations
    /// stay queued this long past their end so the master predicate can hold
    /// the pump on.
    pub master_off_tails: [i64; 2],
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            queue: RuntimeQueue::new(),
            last_seq_stop_times: [0; NUM_SEQUENTIAL_GROUPS],
            station_delay: 0,
            master_off_tails: [0; 2],
        }
    }

    /// Weather scaling. Scaled runs shorter than 10 s are dropped entirely
    /// when the percentage is below 20 %.
    pub fn scaled_duration(base: i64, use_weather: bool, percentage: u8) -> i64 {
        if !use_weather {
            return base;
        }
        let adjusted = base * i64::from(percentage) / 100;
        if percentage < 20 && adjusted < 10 {
            0
        } else {
            adjusted
        }
    }

    /// Admit one station run.
    pub fn schedule_station(
        &mut self,
        stations: &[Station],
        station: StationIndex,
        program_id: u8,
        duration: i64,
        now: i64,
        option: QueueOption,
    ) -> Admission {
        let attrib = match stations.get(station) {
            Some(attrib) => attrib,
            None => return Admission::OutOfRange,
        };
        if attrib.disabled {
            return Admission::Disabled;
        }

        if option == QueueOption::Replace {
            self.stop_all();
        }

        let start_time = match option {
            QueueOption::InsertFront => now,
            QueueOption::Append | QueueOption::Replace => {
                if attrib.group_id == PARALLEL_GROUP_ID {
                    now
                } else {
                    let group = (attrib.group_id as usize).min(NUM_SEQUENTIAL_GROUPS - 1);
                    let start = now.max(self.last_seq_stop_times[group]);
                    self.last_seq_stop_times[group] = start + duration + self.station_delay;
                    start
                }
            }
        };

        // reserve the master off-lag tail so the item outlives its run
        let tail = (0..self.master_off_tails.len())
            .filter(|&master| attrib.bound_to_master(master))
            .map(|master| self.master_off_tails[master].max(0))
            .max()
            .unwrap_or(0);
        let dequeue_time = Some(start_time + duration + tail);

        match self.queue.enqueue(station, program_id, start_time, duration, dequeue_time) {
            Ok(()) => Admission::Scheduled { start_time },
            Err(EnqueueError::AlreadyQueued) => Admission::AlreadyQueued,
            Err(EnqueueError::Full) => Admission::QueueFull,
        }
    }

    /// Admit every station of a program with a non-zero effective duration.
    ///
    /// `gate` is the controller's watering gate; stations it rejects are
    /// silently skipped. Returns the number of runs admitted.
    pub fn schedule_program(
        &mut self,
        stations: &[Station],
        program: &Program,
        program_id: u8,
        now: i64,
        water_percentage: u8,
        sunrise_time: u16,
        sunset_time: u16,
        gate: &dyn Fn(&Station) -> bool,
    ) -> usize {
        let mut admitted = 0;

        for (station, attrib) in stations.iter().enumerate() {
            let base = program.durations[station];
            if base == 0 || attrib.disabled {
                continue;
            }
            if !gate(attrib) {
                continue;
            }

            let resolved = crate::utils::water_time_resolve(base, sunrise_time, sunset_time);
            let duration = Self::scaled_duration(resolved, program.use_weather, water_percentage);
            if duration == 0 {
                continue;
            }

            if self.schedule_station(stations, station, program_id, duration, now, QueueOption::Append).is_scheduled() {
                admitted += 1;
            }
        }

        admitted
    }

    /// Manual single-station run (`/cm`), reserved program id 99.
    pub fn manual_run(&mut self, stations: &[Station], station: StationIndex, duration: i64, now: i64) -> Admission {
        self.schedule_station(stations, station, MANUAL_PROGRAM_ID, duration, now, QueueOption::Append)
    }

    /// Run-once program (`/cr`), reserved program id 254; replaces the queue.
    pub fn run_once(&mut self, stations: &[Station], durations: &[i64], now: i64) -> usize {
        self.stop_all();

        let mut admitted = 0;
        for (station, &duration) in durations.iter().enumerate().take(stations.len()) {
            if duration == 0 {
                continue;
            }
            if self
                .schedule_station(stations, station, RUN_ONCE_PROGRAM_ID, duration, now, QueueOption::Append)
                .is_scheduled()
            {
                admitted += 1;
            }
        }
        admitted
    }

    /// Master predicate: a master output must be on at `now` iff some queued
    /// item bound to it satisfies `start - on_adj <= now < end + off_adj`.
    ///
    /// `master_station` is 1-based; 0 means "no master configured".
    pub fn master_should_be_on(
        &self,
        now: i64,
        master_index: usize,
        stations: &[Station],
        master_station: usize,
        on_adjust: i64,
        off_adjust: i64,
    ) -> bool {
        if master_station == 0 {
            return false;
        }

        self.queue.items().iter().any(|item| {
            if item.station_index + 1 == master_station {
                return false;
            }
            let bound = stations
                .get(item.station_index)
                .map(|s| s.bound_to_master(master_index))
                .unwrap_or(false);
            bound && item.start_time - on_adjust <= now && now < item.end_time() + off_adjust
        })
    }

    /// Swap-remove everything past its dequeue time, then return the ids of
    /// the runs active at `now`.
    pub fn process_queue(&mut self, now: i64) -> Vec<StationIndex> {
        self.queue.remove_finished(now);
        self.queue.active_station_ids(now)
    }

    pub fn stop_all(&mut self) {
        self.queue.clear();
        self.last_seq_stop_times = [0; NUM_SEQUENTIAL_GROUPS];
    }

    /// Per-station `(program_id, remaining, start_time, duration)` table for
    /// the API; `(0, 0, 0, 0)` for stations with no queue entry.
    pub fn program_status(&self, now: i64, station_count: usize) -> Vec<[i64; 4]> {
        (0..station_count)
            .map(|station| match self.queue.find_by_station(station) {
                Some(item) => [
                    i64::from(item.program_id),
                    (item.end_time() - now).max(0),
                    item.start_time,
                    item.duration,
                ],
                None => [0, 0, 0, 0],
            })
            .collect()
    }

    /// Guard against concurrent-admission underflow: raise each group's stop
    /// time to the latest still-running end among its queued items.
    pub fn refresh_seq_stop_times(&mut self, stations: &[Station], now: i64) {
        for item in self.queue.items() {
            let end = item.end_time();
            if end <= now {
                continue;
            }
            if let Some(attrib) = stations.get(item.station_index) {
                if attrib.group_id != PARALLEL_GROUP_ID {
                    let group = (attrib.group_id as usize).min(NUM_SEQUENTIAL_GROUPS - 1);
                    if end > self.last_seq_stop_times[group] {
                        self.last_seq_stop_times[group] = end;
                    }
                }
            }
        }
    }

    pub fn seq_stop_time(&self, group: usize) -> i64 {
        self.last_seq_stop_times[group]
    }

    pub fn pause(&mut self, now: i64, pause_duration: i64) {
        self.queue.apply_pause(now, pause_duration);
        for stop in self.last_seq_stop_times.iter_mut() {
            if *stop > now {
                *stop += pause_duration;
            }
        }
    }

    pub fn resume(&mut self, pause_duration: i64) {
        self.queue.apply_resume(pause_duration);
        for stop in self.last_seq_stop_times.iter_mut() {
            if *stop > 0 {
                *stop = *stop - pause_duration + 1;
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprinkler::station::{default_stations, Stations};

    fn stations_with_groups(groups: &[u8]) -> Stations {
        let mut stations = default_stations();
        for (i, &group) in groups.iter().enumerate() {
            stations[i].group_id = group;
        }
        stations
    }

    #[test]
    fn sequential_group_serializes_runs() {
        let stations = stations_with_groups(&[0, 0]);
        let mut scheduler = Scheduler::new();

        scheduler.manual_run(&stations, 0, 300, 1000);
        scheduler.manual_run(&stations, 1, 300, 1000);

        let first = scheduler.queue.find_by_station(0).unwrap();
        let second = scheduler.queue.find_by_station(1).unwrap();
        assert_eq!(first.start_time, 1000);
        assert_eq!(second.start_time, first.start_time + 300);
    }

    #[test]
    fn parallel_group_bypasses_serialization() {
        let stations = stations_with_groups(&[PARALLEL_GROUP_ID, PARALLEL_GROUP_ID]);
        let mut scheduler = Scheduler::new();

        scheduler.manual_run(&stations, 0, 300, 1000);
        scheduler.manual_run(&stations, 1, 300, 1000);

        assert_eq!(scheduler.queue.find_by_station(0).unwrap().start_time, 1000);
        assert_eq!(scheduler.queue.find_by_station(1).unwrap().start_time, 1000);
    }

    #[test]
    fn groups_are_independent() {
        let stations = stations_with_groups(&[0, 1]);
        let mut scheduler = Scheduler::new();

        scheduler.manual_run(&stations, 0, 300, 1000);
        scheduler.manual_run(&stations, 1, 300, 1000);

        assert_eq!(scheduler.queue.find_by_station(1).unwrap().start_time, 1000);
    }

    #[test]
    fn station_delay_extends_the_bump() {
        let stations = stations_with_groups(&[0, 0]);
        let mut scheduler = Scheduler::new();
        scheduler.station_delay = 30;

        scheduler.manual_run(&stations, 0, 300, 1000);
        scheduler.manual_run(&stations, 1, 300, 1000);

        assert_eq!(scheduler.queue.find_by_station(1).unwrap().start_time, 1330);
    }

    #[test]
    fn admission_rejects_duplicates_disabled_and_out_of_range() {
        let mut stations = stations_with_groups(&[0, 0]);
        stations[1].disabled = true;
        let mut scheduler = Scheduler::new();

        assert!(scheduler.manual_run(&stations, 0, 60, 1000).is_scheduled());
        assert_eq!(scheduler.manual_run(&stations, 0, 60, 1000), Admission::AlreadyQueued);
        assert_eq!(scheduler.manual_run(&stations, 1, 60, 1000), Admission::Disabled);
        assert_eq!(scheduler.manual_run(&stations, 999, 60, 1000), Admission::OutOfRange);
    }

    #[test]
    fn insert_front_starts_now_without_bumping_the_group() {
        let stations = stations_with_groups(&[0, 0]);
        let mut scheduler = Scheduler::new();

        scheduler.manual_run(&stations, 0, 300, 1000);
        scheduler.schedule_station(&stations, 1, MANUAL_PROGRAM_ID, 60, 1000, QueueOption::InsertFront);

        let item = scheduler.queue.find_by_station(1).unwrap();
        assert_eq!(item.start_time, 1000);
        assert_eq!(item.dequeue_time, 1060);
        assert_eq!(scheduler.seq_stop_time(0), 1300, "front insert leaves the group stop time alone");
    }

    #[test]
    fn replace_clears_queue_and_stop_times() {
        let stations = stations_with_groups(&[0, 0]);
        let mut scheduler = Scheduler::new();

        scheduler.manual_run(&stations, 0, 300, 1000);
        scheduler.schedule_station(&stations, 1, RUN_ONCE_PROGRAM_ID, 60, 2000, QueueOption::Replace);

        assert!(!scheduler.queue.is_queued(0));
        let item = scheduler.queue.find_by_station(1).unwrap();
        assert_eq!(item.start_time, 2000, "replacement starts fresh, not after the old run");
    }

    #[test]
    fn weather_scaling_skips_marginal_runs() {
        assert_eq!(Scheduler::scaled_duration(10, true, 10), 0, "10 % of 10 s is dropped");
        assert_eq!(Scheduler::scaled_duration(600, true, 50), 300);
        assert_eq!(Scheduler::scaled_duration(10, false, 10), 10, "no weather flag, no scaling");
        assert_eq!(Scheduler::scaled_duration(600, true, 19), 114, "long runs survive low percentages");
    }

    #[test]
    fn schedule_program_respects_gate_and_durations() {
        let stations = stations_with_groups(&[0, 0, 0]);
        let mut scheduler = Scheduler::new();

        let mut program = Program::default();
        program.durations[0] = 60;
        program.durations[1] = 60;

        let admitted = scheduler.schedule_program(&stations, &program, 1, 1000, 100, 360, 1080, &|s| s.name != "S002");

        assert_eq!(admitted, 1);
        assert!(scheduler.queue.is_queued(0));
        assert!(!scheduler.queue.is_queued(1), "gated station is skipped");
        assert!(!scheduler.queue.is_queued(2), "zero-duration station is skipped");
    }

    #[test]
    fn master_window_covers_lead_and_lag() {
        let mut stations = stations_with_groups(&[0]);
        stations[0].master1_bound = true;
        let mut scheduler = Scheduler::new();
        scheduler.manual_run(&stations, 0, 300, 1000);

        // master is station 8 (1-based 9), 60 s lead and lag
        let on = |now| scheduler.master_should_be_on(now, 0, &stations, 9, 60, 60);
        assert!(on(970), "lead window before the run");
        assert!(on(1330), "lag window after the run");
        assert!(!on(1361), "past the lag window");
        assert!(!on(939), "before the lead window");
    }

    #[test]
    fn master_bound_items_carry_the_off_lag_tail() {
        let mut stations = stations_with_groups(&[0, 0]);
        stations[0].master1_bound = true;
        let mut scheduler = Scheduler::new();
        scheduler.master_off_tails = [60, 0];

        scheduler.manual_run(&stations, 0, 300, 1000);
        scheduler.manual_run(&stations, 1, 300, 1000);

        assert_eq!(scheduler.queue.find_by_station(0).unwrap().dequeue_time, 1360, "bound station keeps the lag tail");
        assert_eq!(scheduler.queue.find_by_station(1).unwrap().dequeue_time, 1600, "unbound station dequeues at its end");
    }

    #[test]
    fn master_ignores_unbound_and_unconfigured() {
        let stations = stations_with_groups(&[0]);
        let mut scheduler = Scheduler::new();
        scheduler.manual_run(&stations, 0, 300, 1000);

        assert!(!scheduler.master_should_be_on(1100, 0, &stations, 9, 60, 60), "station not bound");
        assert!(!scheduler.master_should_be_on(1100, 0, &stations, 0, 60, 60), "no master configured");
    }

    #[test]
    fn process_queue_drops_finished_and_reports_active() {
        let stations = stations_with_groups(&[0, PARALLEL_GROUP_ID]);
        let mut scheduler = Scheduler::new();
        scheduler.manual_run(&stations, 0, 60, 1000);
        scheduler.manual_run(&stations, 1, 300, 1000);

        assert_eq!(scheduler.process_queue(1030), vec![0, 1]);

        let active = scheduler.process_queue(1100);
        assert_eq!(active, vec![1]);
        assert!(!scheduler.queue.is_queued(0), "finished run was dequeued");
    }

    #[test]
    fn program_status_table_shape() {
        let stations = stations_with_groups(&[0]);
        let mut scheduler = Scheduler::new();
        scheduler.manual_run(&stations, 0, 300, 1000);

        let status = scheduler.program_status(1100, 2);
        assert_eq!(status[0], [i64::from(MANUAL_PROGRAM_ID), 200, 1000, 300]);
        assert_eq!(status[1], [0, 0, 0, 0]);
    }

    #[test]
    fn refresh_raises_stop_times_from_queue() {
        let stations = stations_with_groups(&[2]);
        let mut scheduler = Scheduler::new();
        scheduler.queue.enqueue(0, 1, 1000, 500, None).unwrap();

        scheduler.refresh_seq_stop_times(&stations, 1100);
        assert_eq!(scheduler.seq_stop_time(2), 1500);

        // never lowers an already later stop time
        scheduler.refresh_seq_stop_times(&stations, 1499);
        assert_eq!(scheduler.seq_stop_time(2), 1500);
    }
}
