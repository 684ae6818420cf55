use actix_web::{web, Responder, Result};
use serde::Deserialize;

use crate::server::legacy::error::{self, ReturnCode};
use crate::server::SharedController;
use crate::sprinkler::scheduler::Admission;
use crate::sprinkler::station::MAX_WATER_TIME;

#[derive(Debug, Deserialize)]
pub struct ChangeManualRequest {
    sid: usize,
    en: u8,
    /// Run time in seconds; required when `en=1`.
    t: Option<i64>,
}

/// Manual single-station command (reserved program id 99).
///
/// URI: `/cm`
pub async fn handler(controller: web::Data<SharedController>, parameters: web::Query<ChangeManualRequest>) -> Result<impl Responder> {
    let mut controller = controller.lock().map_err(|_| error::SyncError)?;
    let now_seconds = chrono::Utc::now().timestamp();

    if parameters.sid >= controller.options.station_count() {
        return Ok(ReturnCode::DataOutOfBounds);
    }
    if controller.options.is_master_station(parameters.sid) {
        return Ok(ReturnCode::NotPermitted);
    }

    if parameters.en == 0 {
        controller.manual_station(parameters.sid, false, 0, now_seconds);
        return Ok(ReturnCode::Success);
    }

    let duration = match parameters.t {
        Some(duration) if (1..=i64::from(MAX_WATER_TIME)).contains(&duration) => duration,
        Some(_) => return Ok(ReturnCode::DataOutOfBounds),
        None => return Ok(ReturnCode::DataMissing),
    };

    match controller.manual_station(parameters.sid, true, duration, now_seconds) {
        Admission::OutOfRange => Ok(ReturnCode::DataOutOfBounds),
        Admission::QueueFull => Ok(ReturnCode::DataOutOfBounds),
        // duplicates and disabled stations are silent no-ops
        _ => Ok(ReturnCode::Success),
    }
}
