//! Program wire format.
//!
//! `pd[i] = [flag, days0, days1, [st0..st3], [durations...], name,
//! [dr_en, dr_from, dr_to]]` with the flag byte packing enabled,
//! use-weather, odd/even, type, start-time mode and date-range-enabled.

use serde_json::{json, Value};

use crate::sprinkler::program::{OddEven, Program, ProgramType, StartTimeMode, MAX_NUM_START_TIMES};
use crate::sprinkler::station::MAX_NUM_STATIONS;

pub fn flag_byte(program: &Program) -> u8 {
    u8::from(program.enabled)
        | u8::from(program.use_weather) << 1
        | program.odd_even.code() << 2
        | program.program_type.code() << 4
        | u8::from(program.start_time_mode == StartTimeMode::Fixed) << 6
        | u8::from(program.date_range_enabled) << 7
}

pub fn to_wire(program: &Program, station_count: usize) -> Value {
    json!([
        flag_byte(program),
        program.days[0],
        program.days[1],
        program.start_times,
        program.durations[..station_count.min(MAX_NUM_STATIONS)].to_vec(),
        program.name,
        [
            u8::from(program.date_range_enabled) as u16,
            program.date_range[0],
            program.date_range[1],
        ],
    ])
}

/// Rebuild a program from wire parts; durations are zero-padded to
/// [`MAX_NUM_STATIONS`].
pub fn from_wire(flag: u8, days: [u8; 2], start_times: [u16; MAX_NUM_START_TIMES], durations: &[u16], name: String, date_range: Option<[u16; 3]>) -> Program {
    let mut padded = [0u16; MAX_NUM_STATIONS];
    for (slot, &duration) in padded.iter_mut().zip(durations.iter()) {
        *slot = duration;
    }

    let (date_range_enabled, range) = match date_range {
        Some([enabled, from, to]) => (flag & 0x80 != 0 || enabled != 0, [from, to]),
        None => (flag & 0x80 != 0, [0, 0]),
    };

    Program {
        name,
        enabled: flag & 0x01 != 0,
        use_weather: flag & 0x02 != 0,
        odd_even: OddEven::from_code((flag >> 2) & 0x03),
        program_type: ProgramType::from_code((flag >> 4) & 0x03),
        start_time_mode: if flag & 0x40 != 0 { StartTimeMode::Fixed } else { StartTimeMode::Repeating },
        days,
        start_times,
        durations: padded,
        date_range_enabled,
        date_range: range,
    }
}

/// `/jp` body.
pub fn list(programs: &[Program], station_count: usize, board_count: usize) -> Value {
    json!({
        "nprogs": programs.len(),
        "nboards": board_count,
        "mnp": crate::sprinkler::program::MAX_NUM_PROGRAMS,
        "pd": programs.iter().map(|program| to_wire(program, station_count)).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Program {
        let mut program = Program {
            name: "Beds".into(),
            enabled: true,
            use_weather: true,
            program_type: ProgramType::Interval,
            odd_even: OddEven::Even,
            start_time_mode: StartTimeMode::Fixed,
            days: [2, 5],
            start_times: [480, 720, 1 << 15, 1 << 15],
            date_range_enabled: true,
            date_range: [(6 << 5) | 1, (9 << 5) | 30],
            ..Default::default()
        };
        program.durations[0] = 300;
        program.durations[7] = 900;
        program
    }

    #[test]
    fn flag_byte_packs_all_fields() {
        let flag = flag_byte(&sample());
        assert_eq!(flag & 0x01, 1, "enabled");
        assert_eq!(flag & 0x02, 2, "use weather");
        assert_eq!((flag >> 2) & 0x03, 2, "even restriction");
        assert_eq!((flag >> 4) & 0x03, 3, "interval type");
        assert_eq!(flag & 0x40, 0x40, "fixed start times");
        assert_eq!(flag & 0x80, 0x80, "date range enabled");
    }

    #[test]
    fn wire_round_trip_preserves_the_program() {
        let original = sample();
        let flag = flag_byte(&original);

        let rebuilt = from_wire(
            flag,
            original.days,
            original.start_times,
            &original.durations[..8],
            original.name.clone(),
            Some([1, original.date_range[0], original.date_range[1]]),
        );

        assert_eq!(rebuilt, original, "durations zero-pad back to capacity");
    }

    #[test]
    fn wire_shape_matches_the_legacy_layout() {
        let wire = to_wire(&sample(), 8);
        let fields = wire.as_array().unwrap();
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[3].as_array().unwrap().len(), 4);
        assert_eq!(fields[4].as_array().unwrap().len(), 8);
        assert_eq!(fields[5], "Beds");
        assert_eq!(fields[6].as_array().unwrap()[0], 1);
    }
}
