//! Controller core: owns the station set, programs, scheduler, sensors and
//! the shift-register driver, and advances them once per wall-clock second.

pub mod config;
pub mod effector;
pub mod gpio;
pub mod log;
pub mod program;
pub mod queue;
pub mod scheduler;
pub mod sensor;
pub mod shift_register;
pub mod state;
pub mod station;
pub mod telemetry;

use chrono::{DateTime, Timelike, Utc};

use self::config::{ConfigStore, Options};
use self::effector::Effector;
use self::gpio::Backend;
use self::log::{LogRecord, LogStore};
use self::program::{Program, ProgramType, MANUAL_PROGRAM_ID, MAX_NUM_PROGRAMS};
use self::scheduler::{Admission, Scheduler};
use self::sensor::{Debouncer, SensorKind, MAX_SENSORS};
use self::shift_register::{BitChange, SetBit, ShiftRegister};
use self::state::{CompletedRun, ControllerState, RunInfo};
use self::station::{StationIndex, Stations, MAX_NUM_BOARDS, MAX_NUM_STATIONS};
use self::telemetry::Telemetry;

const SENSOR_PINS: [u8; MAX_SENSORS] = [gpio::pin::SENSOR_1, gpio::pin::SENSOR_2];

pub struct Controller {
    pub options: Options,
    pub stations: Stations,
    pub programs: Vec<Program>,
    pub scheduler: Scheduler,
    pub state: ControllerState,
    sensors: [Debouncer; MAX_SENSORS],
    shift_register: ShiftRegister,
    gpio: Box<dyn Backend>,
    effector: Box<dyn Effector>,
    store: ConfigStore,
    log_store: LogStore,
    telemetry: Telemetry,
}

impl Controller {
    pub fn new(store: ConfigStore, mut gpio: Box<dyn Backend>, effector: Box<dyn Effector>) -> Self {
        let options = store.load_options();
        let stations = store.load_stations();
        let programs = store.load_programs();
        let log_store = LogStore::new(store.log_dir());

        let shift_register = ShiftRegister::new();
        if let Err(error) = shift_register.setup(&mut *gpio) {
            tracing::error!("failed to set up shift register pins: {}", error);
        }
        for pin in SENSOR_PINS {
            if let Err(error) = gpio.pin_mode(pin, gpio::Mode::InputPullup) {
                tracing::error!("failed to set up sensor pin {}: {}", pin, error);
            }
        }

        Controller {
            options,
            stations,
            programs,
            scheduler: Scheduler::new(),
            state: ControllerState::default(),
            sensors: [Debouncer::default(); MAX_SENSORS],
            shift_register,
            gpio,
            effector,
            store,
            log_store,
            telemetry: Telemetry::new(),
        }
    }

    // region: TICK

    /// One control-loop step. Idempotent within the same integer second.
    ///
    /// Fixed order: rain delay, sensors, minute-boundary program match,
    /// pause countdown, queue, station bits, master bits, diff/log, apply,
    /// sequential stop-time guard.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        let now_seconds = now.timestamp();
        if now_seconds == self.state.last_tick_second {
            return;
        }
        self.state.last_tick_second = now_seconds;
        self.sync_scheduler_options();

        self.check_rain_delay(now_seconds);
        self.poll_sensors(now_seconds);

        // start times have minute granularity; match once per minute-of-day
        // change (a missed minute is not back-filled)
        let minute = i64::from(now.hour() * 60 + now.minute());
        if minute != self.state.last_checked_minute {
            self.state.last_checked_minute = minute;
            self.check_program_schedule(&now);
        }

        if self.state.pause_state {
            self.state.pause_timer -= 1;
            if self.state.pause_timer <= 0 {
                self.state.pause_timer = 0;
                self.state.pause_state = false;
            }
        }

        self.apply_dynamic_gates(now_seconds);

        let active = if self.state.pause_state {
            Vec::new()
        } else {
            self.scheduler.process_queue(now_seconds)
        };

        let mut active_bits = [false; MAX_NUM_STATIONS];
        for station in &active {
            active_bits[*station] = true;
        }

        let station_count = self.options.station_count();
        let mut transitions: Vec<(StationIndex, bool)> = Vec::new();

        for station in 0..station_count {
            if self.options.is_master_station(station) {
                continue;
            }
            if let SetBit::Changed(change) = self.shift_register.set_bit(station, active_bits[station]) {
                transitions.push((station, change == BitChange::TurnedOn));
            }
        }

        for master_index in 0..self.options.masters.len() {
            let master = self.options.masters[master_index];
            if master.station == 0 {
                continue;
            }
            let value = self.scheduler.master_should_be_on(
                now_seconds,
                master_index,
                &self.stations,
                master.station,
                master.on_adjust_seconds(),
                master.off_adjust_seconds(),
            );
            if let SetBit::Changed(change) = self.shift_register.set_bit(master.station - 1, value) {
                transitions.push((master.station - 1, change == BitChange::TurnedOn));
            }
        }

        self.handle_transitions(&transitions, now_seconds);

        if let Err(error) = self.shift_register.apply(&mut *self.gpio, self.options.device_enable) {
            tracing::error!("shift register apply failed: {}", error);
        }

        self.scheduler.refresh_seq_stop_times(&self.stations, now_seconds);
    }

    fn handle_transitions(&mut self, transitions: &[(StationIndex, bool)], now_seconds: i64) {
        let highest_active = self.shift_register.active_stations().last().map(|s| s + 1).unwrap_or(0);

        for &(station, turned_on) in transitions {
            if turned_on {
                let program_id = self
                    .scheduler
                    .queue
                    .find_by_station(station)
                    .map(|item| item.program_id)
                    .unwrap_or(0);
                self.state.running_since[station] = Some(RunInfo { program_id, start_time: now_seconds });
                tracing::info!("station {} on", station);
            } else if let Some(info) = self.state.running_since[station].take() {
                let run = CompletedRun {
                    station_index: station,
                    program_id: info.program_id,
                    duration: (now_seconds - info.start_time).max(0),
                    end_time: now_seconds,
                };
                tracing::info!("station {} off after {}", station, crate::utils::duration_to_hms(run.duration));

                if !self.options.is_master_station(station) {
                    self.state.last_run = Some(run);
                    if self.options.enable_log {
                        if let Err(error) = self.log_store.append(&LogRecord::completed_run(&run)) {
                            tracing::error!("failed to write run log: {}", error);
                        }
                    }
                }
            }

            if let Some(attrib) = self.stations.get(station) {
                self.effector.switch(&mut *self.gpio, attrib, &self.options.device_key, turned_on);
            }

            if self.options.influx_enable {
                self.telemetry
                    .valve_changed(&self.options.influx_url, station, turned_on, highest_active, now_seconds);
            }
        }
    }

    fn check_rain_delay(&mut self, now_seconds: i64) {
        let stop_time = self.options.rain_delay_stop_time.unwrap_or(0);
        if self.state.rain_delayed {
            if now_seconds >= stop_time {
                self.state.rain_delayed = false;
                self.options.rain_delay_stop_time = None;
                self.persist_options();
                tracing::info!("rain delay over");
            }
        } else if stop_time > now_seconds {
            self.state.rain_delayed = true;
            tracing::info!("rain delay until {}", stop_time);
        }
    }

    fn poll_sensors(&mut self, now_seconds: i64) {
        for index in 0..MAX_SENSORS {
            let sensor_config = self.options.sensors[index];
            if !sensor_config.kind.is_binary() {
                continue;
            }

            let raw = match self.gpio.digital_read(SENSOR_PINS[index]) {
                Ok(level) => level,
                Err(error) => {
                    tracing::error!("sensor {} read failed: {}", index + 1, error);
                    continue;
                }
            };

            if let Some(active) = self.sensors[index].poll(raw, &sensor_config, now_seconds) {
                tracing::info!("sensor {} {}", index + 1, if active { "active" } else { "inactive" });
                if self.options.enable_log {
                    if let Err(error) = self.log_store.append(&LogRecord::sensor_change(index, active, now_seconds)) {
                        tracing::error!("failed to write sensor log: {}", error);
                    }
                }
            }
        }
    }

    fn check_program_schedule(&mut self, now: &DateTime<Utc>) {
        let now_seconds = now.timestamp();
        let sunrise = self.options.sunrise_time;
        let sunset = self.options.sunset_time;
        let water_percentage = self.options.water_percentage;

        // watering gate: rain-ignoring stations run regardless
        let should_skip = self.state.rain_delayed || (self.rain_sensed() && !self.options.ignore_rain);
        let gate = move |station: &station::Station| !should_skip || station.ignore_rain;

        let mut matched_single_runs = Vec::new();

        for (index, program) in self.programs.iter().enumerate() {
            if let Some(run_number) = program.check_match(now, sunrise, sunset) {
                let admitted = self.scheduler.schedule_program(
                    &self.stations,
                    program,
                    (index + 1) as u8,
                    now_seconds,
                    water_percentage,
                    sunrise,
                    sunset,
                    &gate,
                );
                if admitted > 0 {
                    tracing::debug!("program {} ({}) run {} scheduled {} stations", index, program.name, run_number, admitted);
                }
                if program.program_type == ProgramType::SingleRun {
                    matched_single_runs.push(index);
                }
            }
        }

        // single-run programs are deleted after their last match of the day
        if !matched_single_runs.is_empty() {
            for index in matched_single_runs.into_iter().rev() {
                self.programs.remove(index);
            }
            self.persist_programs();
        }
    }

    /// Continuous gate: dequeue program-scheduled runs (never manual or
    /// run-once) when the device is disabled, rain applies, or an active
    /// sensor is not ignored by the station.
    fn apply_dynamic_gates(&mut self, _now_seconds: i64) {
        let sensor_blocked: [bool; MAX_SENSORS] = [self.sensor_active(0), self.sensor_active(1)];
        let rain = self.state.rain_delayed || self.rain_sensed();

        let mut gated: Vec<StationIndex> = Vec::new();
        for item in self.scheduler.queue.items() {
            if item.program_id >= MANUAL_PROGRAM_ID {
                continue;
            }
            let station = item.station_index;
            if self.options.is_master_station(station) {
                continue;
            }
            let attrib = match self.stations.get(station) {
                Some(attrib) => attrib,
                None => continue,
            };

            if !self.options.device_enable
                || (rain && !attrib.ignore_rain)
                || (sensor_blocked[0] && !attrib.ignores_sensor(0))
                || (sensor_blocked[1] && !attrib.ignores_sensor(1))
            {
                gated.push(station);
            }
        }

        for station in gated {
            self.scheduler.queue.dequeue_station(station);
        }
    }

    // endregion TICK

    // region: SENSORS

    pub fn sensor_active(&self, index: usize) -> bool {
        self.options.sensors[index].kind.is_binary() && self.sensors[index].active
    }

    /// Any configured rain sensor is active.
    pub fn rain_sensed(&self) -> bool {
        (0..MAX_SENSORS).any(|i| self.options.sensors[i].kind == SensorKind::Rain && self.sensors[i].active)
    }

    /// Any configured soil sensor is active.
    pub fn soil_sensed(&self) -> bool {
        (0..MAX_SENSORS).any(|i| self.options.sensors[i].kind == SensorKind::Soil && self.sensors[i].active)
    }

    /// Drop all debounce state, e.g. after a sensor reconfiguration.
    pub fn reset_sensors(&mut self) {
        for debouncer in self.sensors.iter_mut() {
            debouncer.reset();
        }
    }

    // endregion SENSORS

    /// Mirror the option-derived scheduling knobs into the scheduler.
    fn sync_scheduler_options(&mut self) {
        self.scheduler.station_delay = self.options.station_delay_seconds();
        self.scheduler.master_off_tails = [
            self.options.masters[0].off_adjust_seconds(),
            self.options.masters[1].off_adjust_seconds(),
        ];
    }

    // region: COMMANDS (API entry points; callers hold the controller lock)

    /// Set (hours > 0) or cancel (hours == 0) a rain delay.
    pub fn set_rain_delay(&mut self, hours: i64, now_seconds: i64) {
        if hours > 0 {
            self.options.rain_delay_stop_time = Some(now_seconds + hours * 3600);
        } else {
            self.options.rain_delay_stop_time = None;
            self.state.rain_delayed = false;
        }
        self.persist_options();
    }

    /// Stop everything: queue, stop times and the register itself.
    ///
    /// No run records are written for interrupted runs.
    pub fn stop_all_stations(&mut self) {
        let was_on: Vec<StationIndex> = self.shift_register.active_stations().collect();

        self.scheduler.stop_all();
        self.shift_register.clear_all();
        self.state.running_since = [None; MAX_NUM_STATIONS];

        for station in was_on {
            if let Some(attrib) = self.stations.get(station) {
                if attrib.kind != station::StationKind::Standard {
                    self.effector.switch(&mut *self.gpio, attrib, &self.options.device_key, false);
                }
            }
        }

        if let Err(error) = self.shift_register.apply(&mut *self.gpio, self.options.device_enable) {
            tracing::error!("shift register apply failed: {}", error);
        }
    }

    /// Manual single-station command (`/cm`).
    pub fn manual_station(&mut self, station: StationIndex, enable: bool, duration: i64, now_seconds: i64) -> Admission {
        if enable {
            self.sync_scheduler_options();
            self.scheduler.manual_run(&self.stations, station, duration, now_seconds)
        } else {
            self.scheduler.queue.dequeue_station(station);
            Admission::Scheduled { start_time: now_seconds }
        }
    }

    /// Manual program start (`/mp`): replaces the queue.
    pub fn manual_program(&mut self, index: usize, use_weather: bool, now_seconds: i64) -> usize {
        let program = match self.programs.get(index) {
            Some(program) => program.clone(),
            None => return 0,
        };
        self.sync_scheduler_options();
        self.scheduler.stop_all();

        let water_percentage = if use_weather { self.options.water_percentage } else { 100 };
        let mut scaled = program.clone();
        scaled.use_weather = use_weather;

        self.scheduler.schedule_program(
            &self.stations,
            &scaled,
            (index + 1) as u8,
            now_seconds,
            water_percentage,
            self.options.sunrise_time,
            self.options.sunset_time,
            &|_| true,
        )
    }

    /// Run-once program (`/cr`): replaces the queue, program id 254.
    pub fn run_once_program(&mut self, durations: &[i64], now_seconds: i64) -> usize {
        self.sync_scheduler_options();
        self.scheduler.run_once(&self.stations, durations, now_seconds)
    }

    /// Toggle pause (`/pq`). Returns `true` when now paused.
    pub fn toggle_pause(&mut self, duration: i64, now_seconds: i64) -> bool {
        if !self.state.pause_state {
            self.state.pause_state = true;
            self.state.pause_timer = duration;
            self.scheduler.pause(now_seconds, duration);
            true
        } else {
            let remaining = self.state.pause_timer;
            self.state.pause_state = false;
            self.state.pause_timer = 0;
            self.scheduler.resume(remaining);
            false
        }
    }

    pub fn add_program(&mut self, program: Program) -> Result<usize, ()> {
        if self.programs.len() >= MAX_NUM_PROGRAMS {
            return Err(());
        }
        self.programs.push(program);
        Ok(self.programs.len() - 1)
    }

    // endregion COMMANDS

    // region: ACCESSORS

    pub fn station_bits(&self) -> &[u8; MAX_NUM_BOARDS] {
        self.shift_register.board_bytes()
    }

    pub fn is_station_on(&self, station: StationIndex) -> bool {
        self.shift_register.bit(station)
    }

    pub fn log_store(&self) -> &LogStore {
        &self.log_store
    }

    // endregion ACCESSORS

    // region: PERSISTENCE (save failures keep in-memory state)

    pub fn persist_options(&self) {
        if let Err(error) = self.store.save_options(&self.options) {
            tracing::error!("failed to save options: {}", error);
        }
    }

    pub fn persist_stations(&self) {
        if let Err(error) = self.store.save_stations(&self.stations) {
            tracing::error!("failed to save stations: {}", error);
        }
    }

    pub fn persist_programs(&self) {
        if let Err(error) = self.store.save_programs(&self.programs) {
            tracing::error!("failed to save programs: {}", error);
        }
    }

    // endregion PERSISTENCE

    /// Terminal handler: drive every output low before exiting.
    pub fn shutdown(&mut self) {
        self.shift_register.clear_all();
        if let Err(error) = self.shift_register.apply(&mut *self.gpio, false) {
            tracing::error!("failed to zero outputs on shutdown: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effector::NullEffector;
    use super::gpio::MemoryBackend;
    use super::program::{Program, StartTimeMode};
    use super::*;
    use chrono::TimeZone;

    fn controller() -> (tempfile::TempDir, Controller) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let controller = Controller::new(store, Box::new(MemoryBackend::new()), Box::new(NullEffector));
        (dir, controller)
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 3, h, m, s).unwrap()
    }

    #[test]
    fn tick_is_idempotent_within_a_second() {
        let (_dir, mut c) = controller();
        let now = at(8, 0, 0);

        c.manual_station(0, true, 60, now.timestamp());
        c.tick(now);
        assert!(c.is_station_on(0));

        // a second tick in the same second must not re-run the pipeline
        c.scheduler.queue.dequeue_station(0);
        c.tick(now);
        assert!(c.is_station_on(0), "second tick in the same second is a no-op");

        c.tick(at(8, 0, 1));
        assert!(!c.is_station_on(0));
    }

    #[test]
    fn rain_delay_enters_and_exits() {
        let (_dir, mut c) = controller();
        let t0 = at(8, 0, 0);

        c.set_rain_delay(1, t0.timestamp());
        c.tick(t0);
        assert!(c.state.rain_delayed);

        c.tick(at(10, 0, 0));
        assert!(!c.state.rain_delayed, "two hours later the one-hour delay is over");
        assert_eq!(c.options.rain_delay_stop_time, None);
    }

    #[test]
    fn cancelling_rain_delay_is_immediate() {
        let (_dir, mut c) = controller();
        let t0 = at(8, 0, 0);

        c.set_rain_delay(4, t0.timestamp());
        c.tick(t0);
        assert!(c.state.rain_delayed);

        c.set_rain_delay(0, t0.timestamp() + 5);
        assert!(!c.state.rain_delayed);
    }

    #[test]
    fn manual_run_lifecycle_writes_a_log_record() {
        let (_dir, mut c) = controller();
        let t0 = at(8, 0, 0);

        c.manual_station(0, true, 60, t0.timestamp());
        c.tick(t0);
        assert!(c.is_station_on(0));

        c.tick(at(8, 1, 0));
        assert!(!c.is_station_on(0));

        let run = c.state.last_run.expect("completed run recorded");
        assert_eq!(run.station_index, 0);
        assert_eq!(run.program_id, MANUAL_PROGRAM_ID);
        assert_eq!(run.duration, 60);

        let records = c.log_store().read_range(t0.timestamp(), t0.timestamp() + 120);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, log::RecordKind::Manual);
    }

    #[test]
    fn minute_boundary_admits_matching_programs() {
        let (_dir, mut c) = controller();

        let mut program = Program {
            start_time_mode: StartTimeMode::Fixed,
            start_times: [8 * 60, 1 << 15, 1 << 15, 1 << 15],
            days: [0x7F, 0],
            ..Default::default()
        };
        program.durations[1] = 120;
        c.programs.push(program);

        // boot tick in an earlier minute, then cross into 08:00
        c.tick(at(7, 59, 59));
        assert!(!c.scheduler.queue.is_queued(1));

        c.tick(at(8, 0, 0));
        assert!(c.scheduler.queue.is_queued(1));
        assert!(c.is_station_on(1));
        assert_eq!(c.scheduler.queue.find_by_station(1).unwrap().program_id, 1);
    }

    #[test]
    fn rain_delay_gates_program_admission() {
        let (_dir, mut c) = controller();

        let mut program = Program {
            start_time_mode: StartTimeMode::Fixed,
            start_times: [8 * 60, 1 << 15, 1 << 15, 1 << 15],
            days: [0x7F, 0],
            ..Default::default()
        };
        program.durations[0] = 120;
        program.durations[1] = 120;
        c.programs.push(program);
        c.stations[1].ignore_rain = true;

        c.set_rain_delay(1, at(7, 59, 59).timestamp());
        c.tick(at(7, 59, 59));
        c.tick(at(8, 0, 0));

        assert!(!c.scheduler.queue.is_queued(0), "gated by rain delay");
        assert!(c.scheduler.queue.is_queued(1), "rain-ignoring station still runs");
    }

    #[test]
    fn active_sensor_dequeues_program_runs_but_not_manual() {
        let (_dir, mut c) = controller();
        c.options.set_int("sn1t", 1).unwrap();
        // NC rain sensor: open contact (pulled high) means triggered

        let t0 = at(8, 0, 0);
        c.scheduler.queue.enqueue(0, 1, t0.timestamp(), 600, None).unwrap();
        c.scheduler.queue.enqueue(1, MANUAL_PROGRAM_ID, t0.timestamp(), 600, None).unwrap();

        c.tick(t0);
        assert!(c.is_station_on(0));

        // debouncer needs the 5 s minimum on-delay
        for offset in 1..=6 {
            c.tick(at(8, 0, offset));
        }

        assert!(c.sensor_active(0));
        assert!(!c.scheduler.queue.is_queued(0), "program run gated off");
        assert!(!c.is_station_on(0));
        assert!(c.scheduler.queue.is_queued(1), "manual run keeps going");
        assert!(c.is_station_on(1));
    }

    #[test]
    fn master_bit_follows_bound_station() {
        let (_dir, mut c) = controller();
        c.options.set_int("mas", 8).unwrap(); // station 7 is master 1
        c.options.masters[0].on_adjust = crate::utils::water_time_encode_signed(0);
        c.options.masters[0].off_adjust = crate::utils::water_time_encode_signed(0);
        c.stations[0].master1_bound = true;

        let t0 = at(8, 0, 0);
        c.manual_station(0, true, 60, t0.timestamp());
        c.tick(t0);
        assert!(c.is_station_on(0));
        assert!(c.is_station_on(7), "master follows the bound station");

        c.tick(at(8, 1, 1));
        assert!(!c.is_station_on(7));
    }

    #[test]
    fn pause_empties_active_set_and_preserves_runtime() {
        let (_dir, mut c) = controller();
        let t0 = at(8, 0, 0);

        c.manual_station(0, true, 300, t0.timestamp());
        c.tick(t0);
        assert!(c.is_station_on(0));

        // 60 s in, pause for 100 s
        let paused = c.toggle_pause(100, t0.timestamp() + 60);
        assert!(paused);
        c.tick(at(8, 1, 1));
        assert!(!c.is_station_on(0), "paused controller drives nothing");

        let item = c.scheduler.queue.find_by_station(0).unwrap();
        assert_eq!(item.duration, 240, "remaining runtime preserved");

        assert!(!c.toggle_pause(0, t0.timestamp() + 70), "second toggle resumes");
        c.tick(at(8, 1, 2));
        assert!(c.is_station_on(0));
    }

    #[test]
    fn single_run_programs_are_deleted_after_matching() {
        let (_dir, mut c) = controller();
        let when = at(8, 0, 0);
        let epoch_day = when.timestamp() / 86400;

        let mut program = Program {
            program_type: ProgramType::SingleRun,
            start_time_mode: StartTimeMode::Fixed,
            start_times: [8 * 60, 1 << 15, 1 << 15, 1 << 15],
            days: [(epoch_day >> 8) as u8, (epoch_day & 0xFF) as u8],
            ..Default::default()
        };
        program.durations[0] = 60;
        c.programs.push(program);

        c.tick(at(7, 59, 59));
        c.tick(when);

        assert!(c.scheduler.queue.is_queued(0));
        assert!(c.programs.is_empty(), "single-run program deleted after its match");
    }

    #[test]
    fn soil_sensor_reports_separately_from_rain() {
        let (_dir, mut c) = controller();
        c.options.set_int("sn2t", 3).unwrap(); // soil, NC

        for offset in 0..=6 {
            c.tick(at(8, 0, offset));
        }

        assert!(c.soil_sensed());
        assert!(!c.rain_sensed());
        assert!(c.sensor_active(1));
    }

    #[test]
    fn stop_all_clears_queue_and_bits() {
        let (_dir, mut c) = controller();
        let t0 = at(8, 0, 0);

        c.manual_station(0, true, 300, t0.timestamp());
        c.tick(t0);
        assert!(c.is_station_on(0));

        c.stop_all_stations();
        assert!(!c.is_station_on(0));
        assert!(c.scheduler.queue.is_empty());
    }

    #[test]
    fn device_disable_gates_program_runs() {
        let (_dir, mut c) = controller();
        let t0 = at(8, 0, 0);

        c.scheduler.queue.enqueue(0, 1, t0.timestamp(), 600, None).unwrap();
        c.options.device_enable = false;

        c.tick(t0);
        assert!(!c.scheduler.queue.is_queued(0), "disabled device sheds program runs");
    }
}
