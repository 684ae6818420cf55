//! Options and YAML persistence.
//!
//! The dynamic option table of the legacy firmware is modeled as a closed
//! enumeration: every integer option has a fixed wire name, default, maximum
//! and read-only flag, and the API layer translates between wire names and
//! the typed [`Options`] struct. Persistence is three YAML files in the data
//! directory (`options.yml`, `stations.yml`, `programs.yml`); an unreadable
//! or corrupt file falls back to defaults at load time, save errors are
//! logged by the caller and in-memory state is retained.

use core::fmt;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::utils;

use super::program::{Program, MAX_NUM_PROGRAMS};
use super::sensor::{NormalState, SensorConfig, SensorKind, MAX_SENSORS};
use super::station::{default_stations, Station, StationIndex, Stations, MAX_NUM_BOARDS, MAX_NUM_STATIONS, SHIFT_REGISTER_LINES};

pub const FIRMWARE_VERSION: u16 = 100;

/// Default HTTP port for the legacy API.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MasterOptions {
    /// 1-based station number; 0 means "no master configured".
    pub station: usize,
    /// Signed water-time byte (see [`utils::water_time_decode_signed`]).
    pub on_adjust: u8,
    /// Signed water-time byte.
    pub off_adjust: u8,
}

impl Default for MasterOptions {
    fn default() -> Self {
        MasterOptions {
            station: 0,
            on_adjust: utils::water_time_encode_signed(0),
            off_adjust: utils::water_time_encode_signed(0),
        }
    }
}

impl MasterOptions {
    pub fn on_adjust_seconds(&self) -> i64 {
        utils::water_time_decode_signed(self.on_adjust).into()
    }

    pub fn off_adjust_seconds(&self) -> i64 {
        utils::water_time_decode_signed(self.off_adjust).into()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Options {
    /// Read-only.
    pub firmware_version: u16,
    /// Quarter-hours biased by 48 (48 = UTC).
    pub timezone: u8,
    pub http_port: u16,
    /// Number of extension boards beyond the base board.
    pub extension_boards: usize,
    /// Inter-station dwell, signed water-time byte.
    pub station_delay_time: u8,
    pub masters: [MasterOptions; 2],
    pub water_percentage: u8,
    pub device_enable: bool,
    pub ignore_password: bool,
    pub enable_log: bool,
    /// Ignore rain sensing globally (rain delay still applies).
    pub ignore_rain: bool,
    pub sensors: [SensorConfig; MAX_SENSORS],
    /// Minutes from midnight, pushed in by an external solar calculator.
    pub sunrise_time: u16,
    pub sunset_time: u16,
    /// Epoch seconds; watering is suppressed until then.
    pub rain_delay_stop_time: Option<i64>,
    /// MD5 hex digest of the device password.
    pub device_key: String,
    pub location: String,
    pub influx_enable: bool,
    pub influx_url: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            firmware_version: FIRMWARE_VERSION,
            timezone: 48,
            http_port: DEFAULT_HTTP_PORT,
            extension_boards: 0,
            station_delay_time: utils::water_time_encode_signed(0),
            masters: [MasterOptions::default(); 2],
            water_percentage: 100,
            device_enable: true,
            ignore_password: false,
            enable_log: true,
            ignore_rain: false,
            sensors: [SensorConfig::default(); MAX_SENSORS],
            sunrise_time: 360,
            sunset_time: 1080,
            rain_delay_stop_time: None,
            device_key: format!("{:x}", md5::compute(b"opendoor")),
            location: String::new(),
            influx_enable: false,
            influx_url: String::new(),
        }
    }
}

impl Options {
    pub fn board_count(&self) -> usize {
        (self.extension_boards + 1).min(MAX_NUM_BOARDS)
    }

    pub fn station_count(&self) -> usize {
        self.board_count() * SHIFT_REGISTER_LINES
    }

    pub fn station_delay_seconds(&self) -> i64 {
        utils::water_time_decode_signed(self.station_delay_time).into()
    }

    /// 0-based index of a master station, if configured.
    pub fn master_station_index(&self, master_index: usize) -> Option<StationIndex> {
        match self.masters.get(master_index) {
            Some(master) if master.station > 0 => Some(master.station - 1),
            _ => None,
        }
    }

    pub fn is_master_station(&self, station: StationIndex) -> bool {
        self.master_station_index(0) == Some(station) || self.master_station_index(1) == Some(station)
    }

    /// Local device time given UTC `now` (legacy quarter-hour timezone code).
    pub fn device_time(&self, now_utc: i64) -> i64 {
        now_utc + (i64::from(self.timezone) - 48) * 900
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum OptionError {
    UnknownKey,
    ReadOnly,
}

impl fmt::Display for OptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionError::UnknownKey => write!(f, "unknown option key"),
            OptionError::ReadOnly => write!(f, "option is read-only"),
        }
    }
}

impl std::error::Error for OptionError {}

pub struct IntOptionMeta {
    pub name: &'static str,
    pub max: i64,
    pub read_only: bool,
}

/// Closed integer-option table; wire names follow the legacy firmware.
pub const INT_OPTIONS: &[IntOptionMeta] = &[
    IntOptionMeta { name: "fwv", max: 0, read_only: true },
    IntOptionMeta { name: "tz", max: 108, read_only: false },
    IntOptionMeta { name: "htp", max: 65535, read_only: false },
    IntOptionMeta { name: "ext", max: (MAX_NUM_BOARDS - 1) as i64, read_only: false },
    IntOptionMeta { name: "sdt", max: 240, read_only: false },
    IntOptionMeta { name: "mas", max: MAX_NUM_STATIONS as i64, read_only: false },
    IntOptionMeta { name: "mton", max: 240, read_only: false },
    IntOptionMeta { name: "mtof", max: 240, read_only: false },
    IntOptionMeta { name: "mas2", max: MAX_NUM_STATIONS as i64, read_only: false },
    IntOptionMeta { name: "mton2", max: 240, read_only: false },
    IntOptionMeta { name: "mtof2", max: 240, read_only: false },
    IntOptionMeta { name: "wl", max: 250, read_only: false },
    IntOptionMeta { name: "den", max: 1, read_only: false },
    IntOptionMeta { name: "ipas", max: 1, read_only: false },
    IntOptionMeta { name: "lg", max: 1, read_only: false },
    IntOptionMeta { name: "igr", max: 1, read_only: false },
    IntOptionMeta { name: "ifen", max: 1, read_only: false },
    IntOptionMeta { name: "sn1t", max: 255, read_only: false },
    IntOptionMeta { name: "sn1o", max: 1, read_only: false },
    IntOptionMeta { name: "sn1on", max: 255, read_only: false },
    IntOptionMeta { name: "sn1of", max: 255, read_only: false },
    IntOptionMeta { name: "sn2t", max: 255, read_only: false },
    IntOptionMeta { name: "sn2o", max: 1, read_only: false },
    IntOptionMeta { name: "sn2on", max: 255, read_only: false },
    IntOptionMeta { name: "sn2of", max: 255, read_only: false },
    IntOptionMeta { name: "sunrise", max: 1439, read_only: false },
    IntOptionMeta { name: "sunset", max: 1439, read_only: false },
];

impl Options {
    pub fn int_value(&self, name: &str) -> Option<i64> {
        Some(match name {
            "fwv" => self.firmware_version.into(),
            "tz" => self.timezone.into(),
            "htp" => self.http_port.into(),
            "ext" => self.extension_boards as i64,
            "sdt" => self.station_delay_time.into(),
            "mas" => self.masters[0].station as i64,
            "mton" => self.masters[0].on_adjust.into(),
            "mtof" => self.masters[0].off_adjust.into(),
            "mas2" => self.masters[1].station as i64,
            "mton2" => self.masters[1].on_adjust.into(),
            "mtof2" => self.masters[1].off_adjust.into(),
            "wl" => self.water_percentage.into(),
            "den" => self.device_enable.into(),
            "ipas" => self.ignore_password.into(),
            "lg" => self.enable_log.into(),
            "igr" => self.ignore_rain.into(),
            "ifen" => self.influx_enable.into(),
            "sn1t" => self.sensors[0].kind.code().into(),
            "sn1o" => self.sensors[0].normal_state.code().into(),
            "sn1on" => self.sensors[0].delay_on.into(),
            "sn1of" => self.sensors[0].delay_off.into(),
            "sn2t" => self.sensors[1].kind.code().into(),
            "sn2o" => self.sensors[1].normal_state.code().into(),
            "sn2on" => self.sensors[1].delay_on.into(),
            "sn2of" => self.sensors[1].delay_off.into(),
            "sunrise" => self.sunrise_time.into(),
            "sunset" => self.sunset_time.into(),
            _ => return None,
        })
    }

    /// Assign an integer option by wire name, clamped to the table maximum.
    pub fn set_int(&mut self, name: &str, value: i64) -> Result<(), OptionError> {
        let meta = INT_OPTIONS.iter().find(|meta| meta.name == name).ok_or(OptionError::UnknownKey)?;
        if meta.read_only {
            return Err(OptionError::ReadOnly);
        }
        let value = value.clamp(0, meta.max);

        match name {
            "tz" => self.timezone = value as u8,
            "htp" => self.http_port = value as u16,
            "ext" => self.extension_boards = value as usize,
            "sdt" => self.station_delay_time = value as u8,
            "mas" => self.masters[0].station = value as usize,
            "mton" => self.masters[0].on_adjust = value as u8,
            "mtof" => self.masters[0].off_adjust = value as u8,
            "mas2" => self.masters[1].station = value as usize,
            "mton2" => self.masters[1].on_adjust = value as u8,
            "mtof2" => self.masters[1].off_adjust = value as u8,
            "wl" => self.water_percentage = value as u8,
            "den" => self.device_enable = value != 0,
            "ipas" => self.ignore_password = value != 0,
            "lg" => self.enable_log = value != 0,
            "igr" => self.ignore_rain = value != 0,
            "ifen" => self.influx_enable = value != 0,
            "sn1t" => self.sensors[0].kind = SensorKind::from_code(value as u8),
            "sn1o" => self.sensors[0].normal_state = NormalState::from_code(value as u8),
            "sn1on" => self.sensors[0].delay_on = value as u8,
            "sn1of" => self.sensors[0].delay_off = value as u8,
            "sn2t" => self.sensors[1].kind = SensorKind::from_code(value as u8),
            "sn2o" => self.sensors[1].normal_state = NormalState::from_code(value as u8),
            "sn2on" => self.sensors[1].delay_on = value as u8,
            "sn2of" => self.sensors[1].delay_off = value as u8,
            "sunrise" => self.sunrise_time = value as u16,
            "sunset" => self.sunset_time = value as u16,
            _ => unreachable!("key is in INT_OPTIONS"),
        }
        Ok(())
    }

    pub fn set_string(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        match name {
            "loc" => self.location = value.into(),
            "ifurl" => self.influx_url = value.into(),
            _ => return Err(OptionError::UnknownKey),
        }
        Ok(())
    }

    /// Wire view for `/jo` and `options.yml`. The device key is never echoed.
    pub fn int_map(&self) -> BTreeMap<String, i64> {
        INT_OPTIONS
            .iter()
            .filter_map(|meta| self.int_value(meta.name).map(|value| (meta.name.to_string(), value)))
            .collect()
    }

    pub fn string_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("loc".to_string(), self.location.clone()),
            ("ifurl".to_string(), self.influx_url.clone()),
        ])
    }
}

#[derive(Clone, Debug)]
pub enum Error {
    Io(Arc<io::Error>),
    Yaml(Arc<serde_yaml::Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "config io error: {}", err),
            Error::Yaml(err) => write!(f, "config yaml error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml(Arc::new(err))
    }
}

/// On-disk shape of `options.yml`.
#[derive(Serialize, Deserialize)]
struct OptionsFile {
    options: BTreeMap<String, i64>,
    strings: BTreeMap<String, String>,
    device_key: String,
    rain_delay_stop_time: Option<i64>,
}

#[derive(Serialize, Deserialize)]
struct StationsFile {
    stations: Vec<Station>,
}

#[derive(Serialize, Deserialize)]
struct ProgramsFile {
    programs: Vec<Program>,
}

/// File-per-concern store rooted at the data directory.
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        ConfigStore { dir: dir.as_ref().into() }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.dir.join("logs")
    }

    fn read<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<T, Error> {
        let raw = fs::read_to_string(self.dir.join(file))?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<(), Error> {
        fs::create_dir_all(&self.dir)?;
        Ok(fs::write(self.dir.join(file), serde_yaml::to_string(value)?)?)
    }

    pub fn load_options(&self) -> Options {
        let mut options = Options::default();
        match self.read::<OptionsFile>("options.yml") {
            Ok(file) => {
                for (name, value) in &file.options {
                    if let Err(error) = options.set_int(name, *value) {
                        if error == OptionError::UnknownKey {
                            tracing::warn!("options.yml: skipping {} ({})", name, error);
                        }
                    }
                }
                for (name, value) in &file.strings {
                    if options.set_string(name, value).is_err() {
                        tracing::warn!("options.yml: skipping string option {}", name);
                    }
                }
                options.device_key = file.device_key;
                options.rain_delay_stop_time = file.rain_delay_stop_time;
            }
            Err(error) => {
                tracing::warn!("options.yml unreadable, using defaults: {}", error);
            }
        }
        options
    }

    pub fn save_options(&self, options: &Options) -> Result<(), Error> {
        self.write(
            "options.yml",
            &OptionsFile {
                options: options.int_map(),
                strings: options.string_map(),
                device_key: options.device_key.clone(),
                rain_delay_stop_time: options.rain_delay_stop_time,
            },
        )
    }

    /// Load the station set, padded with defaults up to [`MAX_NUM_STATIONS`].
    pub fn load_stations(&self) -> Stations {
        let mut stations = match self.read::<StationsFile>("stations.yml") {
            Ok(file) => file.stations,
            Err(error) => {
                tracing::warn!("stations.yml unreadable, using defaults: {}", error);
                return default_stations();
            }
        };

        stations.truncate(MAX_NUM_STATIONS);
        let defaults = default_stations();
        for filler in stations.len()..MAX_NUM_STATIONS {
            stations.push(defaults[filler].clone());
        }
        stations
    }

    pub fn save_stations(&self, stations: &[Station]) -> Result<(), Error> {
        self.write("stations.yml", &StationsFile { stations: stations.to_vec() })
    }

    pub fn load_programs(&self) -> Vec<Program> {
        match self.read::<ProgramsFile>("programs.yml") {
            Ok(file) => {
                let mut programs = file.programs;
                programs.truncate(MAX_NUM_PROGRAMS);
                programs
            }
            Err(error) => {
                tracing::warn!("programs.yml unreadable, starting empty: {}", error);
                Vec::new()
            }
        }
    }

    pub fn save_programs(&self, programs: &[Program]) -> Result<(), Error> {
        self.write("programs.yml", &ProgramsFile { programs: programs.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprinkler::program::ProgramType;

    #[test]
    fn defaults_are_sane() {
        let options = Options::default();
        assert_eq!(options.board_count(), 1);
        assert_eq!(options.station_count(), 8);
        assert_eq!(options.station_delay_seconds(), 0);
        assert_eq!(options.master_station_index(0), None);
        assert_eq!(options.device_key, "a6d82bced638de3def1e9bbb4983225c");
    }

    #[test]
    fn device_time_applies_quarter_hour_offset() {
        let mut options = Options::default();
        assert_eq!(options.device_time(1000), 1000, "tz 48 is UTC");
        options.set_int("tz", 52).unwrap();
        assert_eq!(options.device_time(1000), 1000 + 3600);
    }

    #[test]
    fn set_int_clamps_and_guards() {
        let mut options = Options::default();

        options.set_int("wl", 9999).unwrap();
        assert_eq!(options.water_percentage, 250, "clamped to table max");

        assert_eq!(options.set_int("fwv", 1), Err(OptionError::ReadOnly));
        assert_eq!(options.set_int("nope", 1), Err(OptionError::UnknownKey));

        options.set_int("mas", 9).unwrap();
        assert_eq!(options.master_station_index(0), Some(8));
        assert!(options.is_master_station(8));
    }

    #[test]
    fn sensor_options_round_trip_through_codes() {
        let mut options = Options::default();
        options.set_int("sn1t", 1).unwrap();
        options.set_int("sn1o", 1).unwrap();
        assert_eq!(options.sensors[0].kind, SensorKind::Rain);
        assert_eq!(options.sensors[0].normal_state, NormalState::Open);
        assert_eq!(options.int_value("sn1t"), Some(1));
    }

    #[test]
    fn options_persist_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        let mut options = Options::default();
        options.set_int("wl", 50).unwrap();
        options.set_int("mas", 3).unwrap();
        options.set_string("loc", "51.0,-114.0").unwrap();
        options.rain_delay_stop_time = Some(123456);
        store.save_options(&options).unwrap();

        let loaded = store.load_options();
        assert_eq!(loaded.water_percentage, 50);
        assert_eq!(loaded.masters[0].station, 3);
        assert_eq!(loaded.location, "51.0,-114.0");
        assert_eq!(loaded.rain_delay_stop_time, Some(123456));
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        assert_eq!(store.load_options().water_percentage, 100);
        assert_eq!(store.load_stations().len(), MAX_NUM_STATIONS);
        assert!(store.load_programs().is_empty());
    }

    #[test]
    fn stations_persist_round_trip_and_pad() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        let mut stations = default_stations();
        stations[2].name = "Front lawn".into();
        stations[2].group_id = 1;
        stations[2].master1_bound = true;
        stations[2].ignore_rain = true;
        stations[3].kind = crate::sprinkler::station::StationKind::Gpio(crate::sprinkler::station::GpioStationData { pin: 5, active_high: false });
        stations.truncate(8);
        store.save_stations(&stations).unwrap();

        let loaded = store.load_stations();
        assert_eq!(loaded.len(), MAX_NUM_STATIONS, "padded back to capacity");
        assert_eq!(loaded[2], stations[2]);
        assert_eq!(loaded[3], stations[3], "kind payload survives the trip");
        assert_eq!(loaded[9].name, "S010");
    }

    #[test]
    fn programs_persist_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        let mut program = Program::default();
        program.name = "Morning".into();
        program.program_type = ProgramType::Interval;
        program.days = [1, 3];
        program.durations[5] = 900;
        store.save_programs(&[program.clone()]).unwrap();

        let loaded = store.load_programs();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], program);
    }
}
