use actix_web::{web, Responder, Result};
use serde::Deserialize;

use crate::server::legacy::error::{self, ReturnCode};
use crate::server::SharedController;

#[derive(Debug, Deserialize)]
pub struct ManualProgramRequest {
    /// Program index.
    pid: usize,
    /// Apply weather scaling.
    uwt: Option<u8>,
}

/// Start a program manually, replacing the queue.
///
/// URI: `/mp`
pub async fn handler(controller: web::Data<SharedController>, parameters: web::Query<ManualProgramRequest>) -> Result<impl Responder> {
    let mut controller = controller.lock().map_err(|_| error::SyncError)?;

    if parameters.pid >= controller.programs.len() {
        return Ok(ReturnCode::DataOutOfBounds);
    }

    let use_weather = parameters.uwt.unwrap_or(0) != 0;
    controller.manual_program(parameters.pid, use_weather, chrono::Utc::now().timestamp());

    Ok(ReturnCode::Success)
}
