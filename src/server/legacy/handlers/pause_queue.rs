use actix_web::{web, Responder, Result};
use serde::Deserialize;

use crate::server::legacy::error::{self, ReturnCode};
use crate::server::SharedController;

#[derive(Debug, Deserialize)]
pub struct PauseQueueRequest {
    /// Pause duration in seconds.
    dur: Option<i64>,
}

/// Toggle the queue pause.
///
/// URI: `/pq`
pub async fn handler(controller: web::Data<SharedController>, parameters: web::Query<PauseQueueRequest>) -> Result<impl Responder> {
    let mut controller = controller.lock().map_err(|_| error::SyncError)?;

    let paused = controller.state.pause_state;
    if !paused {
        let duration = match parameters.dur {
            Some(duration) if duration > 0 => duration,
            Some(_) => return Ok(ReturnCode::DataOutOfBounds),
            None => return Ok(ReturnCode::DataMissing),
        };
        controller.toggle_pause(duration, chrono::Utc::now().timestamp());
    } else {
        controller.toggle_pause(0, chrono::Utc::now().timestamp());
    }

    Ok(ReturnCode::Success)
}
