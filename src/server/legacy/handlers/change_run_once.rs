use actix_web::{web, Responder, Result};
use serde::Deserialize;

use crate::server::legacy::{self, error, error::ReturnCode};
use crate::server::SharedController;
use crate::utils;

#[derive(Debug, Deserialize)]
pub struct RunOnceRequest {
    /// Per-station run times in seconds, `[t0,t1,...]`.
    #[serde(rename = "t", deserialize_with = "legacy::serde::de::int_array_from_string")]
    pub times: Vec<u16>,
}

/// Run-once program (reserved program id 254); replaces the queue.
///
/// URI: `/cr`
pub async fn handler(controller: web::Data<SharedController>, parameters: web::Query<RunOnceRequest>) -> Result<impl Responder> {
    let mut controller = controller.lock().map_err(|_| error::SyncError)?;

    if parameters.times.iter().all(|&t| t == 0) {
        return Ok(ReturnCode::DataMissing);
    }

    let sunrise = controller.options.sunrise_time;
    let sunset = controller.options.sunset_time;
    let durations: Vec<i64> = parameters
        .times
        .iter()
        .map(|&t| utils::water_time_resolve(t, sunrise, sunset))
        .collect();

    controller.run_once_program(&durations, chrono::Utc::now().timestamp());

    Ok(ReturnCode::Success)
}
