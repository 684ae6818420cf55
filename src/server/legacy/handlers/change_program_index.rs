use actix_web::{web, Responder, Result};
use serde::Deserialize;

use crate::server::legacy::error::{self, ReturnCode};
use crate::server::SharedController;

#[derive(Debug, Deserialize)]
pub struct MoveProgramRequest {
    pid: usize,
}

/// Move a program up one slot (swap with its predecessor).
///
/// URI: `/up`
pub async fn handler(controller: web::Data<SharedController>, parameters: web::Query<MoveProgramRequest>) -> Result<impl Responder> {
    let mut controller = controller.lock().map_err(|_| error::SyncError)?;

    let index = parameters.pid;
    if index >= controller.programs.len() {
        return Ok(ReturnCode::DataOutOfBounds);
    }
    if index > 0 {
        controller.programs.swap(index, index - 1);
        controller.persist_programs();
    }

    Ok(ReturnCode::Success)
}
