use std::collections::HashMap;

use actix_web::{web, HttpRequest, Responder, Result};
use serde::Deserialize;

use crate::server::legacy::error::{self, ReturnCode};
use crate::server::SharedController;
use crate::sprinkler::station::{StationKind, PARALLEL_GROUP_ID, SHIFT_REGISTER_LINES};
use crate::sprinkler::Controller;

#[derive(Debug, Deserialize)]
pub struct SpecialStationRequest {
    sid: usize,
    st: u8,
    sd: String,
}

/// Change station names, attributes, groups and kind payloads.
///
/// Names arrive as `s<sid>`, boolean attributes as per-board bitmasks
/// (`m` master1, `n` master2, `i` ignore-rain, `j`/`k` ignore-sensor,
/// `d` disabled, `a` activate-relay), groups as `g<sid>`, and kind payloads
/// as an `sid`/`st`/`sd` triple.
///
/// URI: `/cs`
pub async fn handler(
    controller: web::Data<SharedController>,
    parameters: web::Query<HashMap<String, String>>,
    req: HttpRequest,
) -> Result<impl Responder> {
    let mut controller = controller.lock().map_err(|_| error::SyncError)?;
    let station_count = controller.options.station_count();

    for station in 0..station_count {
        if let Some(name) = parameters.get(&format!("s{}", station)) {
            controller.stations[station].name = name.clone();
        }
        if let Some(group) = parameters.get(&format!("g{}", station)) {
            match group.parse::<u8>() {
                Ok(group) if group <= 3 || group == PARALLEL_GROUP_ID => {
                    controller.stations[station].group_id = group;
                }
                _ => return Ok(ReturnCode::DataOutOfBounds),
            }
        }
    }

    apply_board_masks(&mut controller, &parameters, 'm', |station, value| station.master1_bound = value);
    apply_board_masks(&mut controller, &parameters, 'n', |station, value| station.master2_bound = value);
    apply_board_masks(&mut controller, &parameters, 'i', |station, value| station.ignore_rain = value);
    apply_board_masks(&mut controller, &parameters, 'j', |station, value| station.ignore_sensor1 = value);
    apply_board_masks(&mut controller, &parameters, 'k', |station, value| station.ignore_sensor2 = value);
    apply_board_masks(&mut controller, &parameters, 'd', |station, value| station.disabled = value);
    apply_board_masks(&mut controller, &parameters, 'a', |station, value| station.activate_relay = value);

    if let Ok(special) = web::Query::<SpecialStationRequest>::from_query(req.query_string()) {
        if special.sid >= station_count {
            return Ok(ReturnCode::DataOutOfBounds);
        }
        match StationKind::try_from_legacy(special.st, &special.sd) {
            Ok(kind) => controller.stations[special.sid].kind = kind,
            Err(_) => return Ok(ReturnCode::DataFormatError),
        }
    }

    controller.persist_stations();
    Ok(ReturnCode::Success)
}

fn apply_board_masks(
    controller: &mut Controller,
    parameters: &web::Query<HashMap<String, String>>,
    attribute: char,
    mut assign: impl FnMut(&mut crate::sprinkler::station::Station, bool),
) {
    for board in 0..controller.options.board_count() {
        let mask = match parameters.get(&format!("{}{}", attribute, board)).and_then(|v| v.parse::<u8>().ok()) {
            Some(mask) => mask,
            None => continue,
        };
        for line in 0..SHIFT_REGISTER_LINES {
            let station = board * SHIFT_REGISTER_LINES + line;
            assign(&mut controller.stations[station], mask & (1 << line) != 0);
        }
    }
}
