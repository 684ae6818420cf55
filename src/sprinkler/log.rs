//! Daily run-log store.
//!
//! One file per day under `<data>/logs/YYYYMMDD.json`, one JSON record array
//! per line: `[program_id, station_id, duration, end_epoch, kind]`. Sensor
//! transitions are logged with pseudo station ids (200 + sensor index) and a
//! duration of 1 (active) or 0 (inactive).

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::sprinkler::sensor::SENSOR_LOG_STATION_BASE;
use crate::sprinkler::state::CompletedRun;

use super::program::{MANUAL_PROGRAM_ID, RUN_ONCE_PROGRAM_ID};

const SECS_PER_DAY: i64 = 86400;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Program,
    Manual,
    RunOnce,
    Sensor,
    Flow,
}

impl RecordKind {
    pub fn code(self) -> u8 {
        match self {
            RecordKind::Program => 0,
            RecordKind::Manual => 1,
            RecordKind::RunOnce => 2,
            RecordKind::Sensor => 3,
            RecordKind::Flow => 4,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => RecordKind::Manual,
            2 => RecordKind::RunOnce,
            3 => RecordKind::Sensor,
            4 => RecordKind::Flow,
            _ => RecordKind::Program,
        }
    }

    /// Manual and run-once runs are identified by their reserved program ids.
    pub fn from_program_id(program_id: u8) -> Self {
        match program_id {
            MANUAL_PROGRAM_ID => RecordKind::Manual,
            RUN_ONCE_PROGRAM_ID => RecordKind::RunOnce,
            _ => RecordKind::Program,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogRecord {
    pub program_id: u8,
    pub station_index: usize,
    pub duration: i64,
    pub end_time: i64,
    pub kind: RecordKind,
}

impl LogRecord {
    pub fn completed_run(run: &CompletedRun) -> Self {
        LogRecord {
            program_id: run.program_id,
            station_index: run.station_index,
            duration: run.duration,
            end_time: run.end_time,
            kind: RecordKind::from_program_id(run.program_id),
        }
    }

    pub fn sensor_change(sensor_index: usize, active: bool, now: i64) -> Self {
        LogRecord {
            program_id: 0,
            station_index: SENSOR_LOG_STATION_BASE + sensor_index,
            duration: i64::from(active),
            end_time: now,
            kind: RecordKind::Sensor,
        }
    }

    fn to_line(self) -> String {
        serde_json::json!([self.program_id, self.station_index, self.duration, self.end_time, self.kind.code()]).to_string()
    }

    fn from_line(line: &str) -> Option<Self> {
        let fields: Vec<serde_json::Value> = serde_json::from_str(line).ok()?;
        if fields.len() != 5 {
            return None;
        }
        Some(LogRecord {
            program_id: fields[0].as_u64()? as u8,
            station_index: fields[1].as_u64()? as usize,
            duration: fields[2].as_i64()?,
            end_time: fields[3].as_i64()?,
            kind: RecordKind::from_code(fields[4].as_u64()? as u8),
        })
    }

    /// Wire shape for `/jl`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!([self.program_id, self.station_index, self.duration, self.end_time, self.kind.code()])
    }
}

pub struct LogStore {
    dir: PathBuf,
}

impl LogStore {
    pub fn new(dir: PathBuf) -> Self {
        LogStore { dir }
    }

    fn file_for_day(&self, epoch_day: i64) -> Option<PathBuf> {
        let date = DateTime::<Utc>::from_timestamp(epoch_day * SECS_PER_DAY, 0)?;
        Some(self.dir.join(format!("{}.json", date.format("%Y%m%d"))))
    }

    pub fn append(&self, record: &LogRecord) -> io::Result<()> {
        let path = self
            .file_for_day(record.end_time.div_euclid(SECS_PER_DAY))
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "timestamp out of range"))?;
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", record.to_line())
    }

    /// All records whose end time falls in `[start, end]` (epoch seconds).
    pub fn read_range(&self, start: i64, end: i64) -> Vec<LogRecord> {
        let mut records = Vec::new();
        if end < start {
            return records;
        }

        // a year of daily files is the most a query may touch
        let first_day = start.div_euclid(SECS_PER_DAY);
        let last_day = end.div_euclid(SECS_PER_DAY).min(first_day + 366);

        for epoch_day in first_day..=last_day {
            let path = match self.file_for_day(epoch_day) {
                Some(path) => path,
                None => continue,
            };
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(_) => continue,
            };
            records.extend(
                content
                    .lines()
                    .filter_map(LogRecord::from_line)
                    .filter(|record| record.end_time >= start && record.end_time <= end),
            );
        }

        records
    }

    /// Delete one day (`YYYYMMDD`) or the whole directory's files.
    pub fn delete(&self, day: Option<&str>) -> io::Result<()> {
        match day {
            Some(day) => fs::remove_file(self.dir.join(format!("{}.json", day))),
            None => {
                // individual files only, so a symlinked log directory survives
                for entry in fs::read_dir(&self.dir)? {
                    fs::remove_file(entry?.path())?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().into());
        (dir, store)
    }

    #[test]
    fn kind_follows_reserved_program_ids() {
        assert_eq!(RecordKind::from_program_id(99), RecordKind::Manual);
        assert_eq!(RecordKind::from_program_id(254), RecordKind::RunOnce);
        assert_eq!(RecordKind::from_program_id(3), RecordKind::Program);
    }

    #[test]
    fn append_and_read_back() {
        let (_dir, store) = store();
        let record = LogRecord {
            program_id: 2,
            station_index: 5,
            duration: 600,
            end_time: 1_754_000_000,
            kind: RecordKind::Program,
        };

        store.append(&record).unwrap();
        let records = store.read_range(1_753_999_000, 1_754_001_000);
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn range_filters_by_end_time() {
        let (_dir, store) = store();
        for (end, station) in [(1_754_000_000, 0), (1_754_000_600, 1), (1_754_100_000, 2)] {
            store
                .append(&LogRecord {
                    program_id: 1,
                    station_index: station,
                    duration: 60,
                    end_time: end,
                    kind: RecordKind::Program,
                })
                .unwrap();
        }

        let records = store.read_range(1_754_000_000, 1_754_000_600);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.station_index < 2));
    }

    #[test]
    fn sensor_records_use_pseudo_station_ids() {
        let record = LogRecord::sensor_change(1, true, 1_754_000_000);
        assert_eq!(record.station_index, 201);
        assert_eq!(record.duration, 1);
        assert_eq!(record.kind, RecordKind::Sensor);
        assert_eq!(record.to_json().to_string(), "[0,201,1,1754000000,3]");
    }

    #[test]
    fn delete_single_day_and_all() {
        let (_dir, store) = store();
        let record = LogRecord {
            program_id: 1,
            station_index: 0,
            duration: 60,
            end_time: 1_754_000_000,
            kind: RecordKind::Program,
        };
        store.append(&record).unwrap();

        let day = DateTime::<Utc>::from_timestamp(record.end_time, 0).unwrap().format("%Y%m%d").to_string();
        store.delete(Some(&day)).unwrap();
        assert!(store.read_range(1_753_900_000, 1_754_100_000).is_empty());

        store.append(&record).unwrap();
        store.delete(None).unwrap();
        assert!(store.read_range(1_753_900_000, 1_754_100_000).is_empty());
    }
}
