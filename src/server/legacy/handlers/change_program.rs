use actix_web::{web, Responder, Result};
use serde::Deserialize;

use crate::server::legacy::error::{self, ReturnCode};
use crate::server::legacy::payload::programs::from_wire;
use crate::server::SharedController;
use crate::sprinkler::program::MAX_NUM_START_TIMES;

#[derive(Debug, Deserialize)]
pub struct ChangeProgramRequest {
    /// Program index; -1 appends a new program.
    pid: i64,
    /// `[flag, days0, days1, [st0..st3], [durations...]]`
    v: String,
    name: Option<String>,
    /// `[enabled, from, to]`
    dr: Option<String>,
}

/// Create or modify a program.
///
/// URI: `/cp`
pub async fn handler(controller: web::Data<SharedController>, parameters: web::Query<ChangeProgramRequest>) -> Result<impl Responder> {
    let mut controller = controller.lock().map_err(|_| error::SyncError)?;

    let parts = match parse_wire(&parameters.v) {
        Some(parts) => parts,
        None => return Ok(ReturnCode::DataFormatError),
    };
    let (flag, days, start_times, durations) = parts;

    let date_range = match &parameters.dr {
        Some(raw) => match serde_json::from_str::<[u16; 3]>(raw) {
            Ok(range) => Some(range),
            Err(_) => return Ok(ReturnCode::DataFormatError),
        },
        None => None,
    };

    let name = parameters.name.clone().unwrap_or_default();
    let program = from_wire(flag, days, start_times, &durations, name, date_range);

    if parameters.pid == -1 {
        if controller.add_program(program).is_err() {
            return Ok(ReturnCode::DataOutOfBounds);
        }
    } else {
        let index = match usize::try_from(parameters.pid) {
            Ok(index) if index < controller.programs.len() => index,
            _ => return Ok(ReturnCode::DataOutOfBounds),
        };
        controller.programs[index] = program;
    }

    controller.persist_programs();
    Ok(ReturnCode::Success)
}

type WireParts = (u8, [u8; 2], [u16; MAX_NUM_START_TIMES], Vec<u16>);

fn parse_wire(raw: &str) -> Option<WireParts> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let fields = value.as_array()?;
    if fields.len() < 5 {
        return None;
    }

    let flag = u8::try_from(fields[0].as_u64()?).ok()?;
    let days = [u8::try_from(fields[1].as_u64()?).ok()?, u8::try_from(fields[2].as_u64()?).ok()?];

    let raw_starts = fields[3].as_array()?;
    if raw_starts.len() != MAX_NUM_START_TIMES {
        return None;
    }
    let mut start_times = [0u16; MAX_NUM_START_TIMES];
    for (slot, raw) in start_times.iter_mut().zip(raw_starts.iter()) {
        *slot = u16::try_from(raw.as_u64()?).ok()?;
    }

    let durations = fields[4]
        .as_array()?
        .iter()
        .map(|raw| raw.as_u64().and_then(|v| u16::try_from(v).ok()))
        .collect::<Option<Vec<u16>>>()?;

    Some((flag, days, start_times, durations))
}
