use serde::Serialize;

use crate::sprinkler::station::{Station, StationKind, SHIFT_REGISTER_LINES};
use crate::sprinkler::Controller;

const STATION_NAME_MAX_LEN: usize = 32;

/// `/jn` body: names plus per-board attribute bitmasks and the per-station
/// sequential group array.
#[derive(Serialize)]
pub struct StationsPayload {
    snames: Vec<String>,
    maxlen: usize,
    masop: Vec<u8>,
    masop2: Vec<u8>,
    ignore_rain: Vec<u8>,
    ignore_sn1: Vec<u8>,
    ignore_sn2: Vec<u8>,
    stn_dis: Vec<u8>,
    act_relay: Vec<u8>,
    stn_spe: Vec<u8>,
    stn_grp: Vec<u8>,
}

impl StationsPayload {
    pub fn new(controller: &Controller) -> Self {
        let board_count = controller.options.board_count();
        let station_count = controller.options.station_count();
        let stations = &controller.stations[..station_count];

        StationsPayload {
            snames: stations.iter().map(|s| s.name.clone()).collect(),
            maxlen: STATION_NAME_MAX_LEN,
            masop: board_masks(stations, board_count, |s| s.master1_bound),
            masop2: board_masks(stations, board_count, |s| s.master2_bound),
            ignore_rain: board_masks(stations, board_count, |s| s.ignore_rain),
            ignore_sn1: board_masks(stations, board_count, |s| s.ignore_sensor1),
            ignore_sn2: board_masks(stations, board_count, |s| s.ignore_sensor2),
            stn_dis: board_masks(stations, board_count, |s| s.disabled),
            act_relay: board_masks(stations, board_count, |s| s.activate_relay),
            stn_spe: board_masks(stations, board_count, |s| s.kind != StationKind::Standard),
            stn_grp: stations.iter().map(|s| s.group_id).collect(),
        }
    }
}

/// One byte per board, bit `i & 7` describing station `i`.
fn board_masks(stations: &[Station], board_count: usize, attribute: impl Fn(&Station) -> bool) -> Vec<u8> {
    (0..board_count)
        .map(|board| {
            (0..SHIFT_REGISTER_LINES)
                .filter(|line| {
                    stations
                        .get(board * SHIFT_REGISTER_LINES + line)
                        .map(&attribute)
                        .unwrap_or(false)
                })
                .fold(0u8, |mask, line| mask | 1 << line)
        })
        .collect()
}

/// One `/je` entry per non-standard station.
#[derive(Serialize)]
pub struct SpecialStationEntry {
    pub sid: usize,
    pub st: u8,
    pub sd: String,
}

pub fn special_list(controller: &Controller) -> Vec<SpecialStationEntry> {
    controller.stations[..controller.options.station_count()]
        .iter()
        .enumerate()
        .filter(|(_, station)| station.kind != StationKind::Standard)
        .filter_map(|(sid, station)| {
            Some(SpecialStationEntry {
                sid,
                st: station.kind.code(),
                sd: station.kind.legacy_data()?,
            })
        })
        .collect()
}
