use serde::Serialize;

use crate::sprinkler::Controller;

use super::bool_to_u8;

/// `/jc` body.
#[derive(Serialize)]
pub struct Settings {
    devt: i64,
    nbrd: usize,
    en: u8,
    rd: u8,
    rs: u8,
    rdst: i64,
    sbits: Vec<u8>,
    /// Per station: `[program_id, remaining, start_time, duration]`.
    ps: Vec<[i64; 4]>,
    /// `[station_id, program_id, duration, end_time]` of the last finished run.
    lrun: [i64; 4],
    sn1: u8,
    sn2: u8,
    pq: u8,
    pt: i64,
}

impl Settings {
    pub fn new(controller: &Controller, now_seconds: i64) -> Self {
        let board_count = controller.options.board_count();

        let mut sbits: Vec<u8> = controller.station_bits()[..board_count].to_vec();
        // legacy clients expect a trailing zero byte
        sbits.push(0);

        let lrun = match controller.state.last_run {
            Some(run) => [run.station_index as i64, run.program_id.into(), run.duration, run.end_time],
            None => [0, 0, 0, 0],
        };

        Settings {
            devt: controller.options.device_time(now_seconds),
            nbrd: board_count,
            en: bool_to_u8(controller.options.device_enable),
            rd: bool_to_u8(controller.state.rain_delayed),
            rs: bool_to_u8(controller.rain_sensed()),
            rdst: controller.options.rain_delay_stop_time.unwrap_or(0),
            sbits,
            ps: controller.scheduler.program_status(now_seconds, controller.options.station_count()),
            lrun,
            sn1: bool_to_u8(controller.sensor_active(0)),
            sn2: bool_to_u8(controller.sensor_active(1)),
            pq: bool_to_u8(controller.state.pause_state),
            pt: controller.state.pause_remaining(),
        }
    }
}
