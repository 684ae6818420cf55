use actix_web::{web, Responder, Result};
use serde::Deserialize;

use crate::server::legacy::error::{self, ReturnCode};
use crate::server::SharedController;

#[derive(Debug, Deserialize)]
pub struct DeleteProgramRequest {
    /// Program index; -1 deletes all.
    pid: i64,
}

/// Delete one program or all of them.
///
/// URI: `/dp`
pub async fn handler(controller: web::Data<SharedController>, parameters: web::Query<DeleteProgramRequest>) -> Result<impl Responder> {
    let mut controller = controller.lock().map_err(|_| error::SyncError)?;

    if parameters.pid == -1 {
        controller.programs.clear();
    } else {
        match usize::try_from(parameters.pid) {
            Ok(index) if index < controller.programs.len() => {
                controller.programs.remove(index);
            }
            _ => return Ok(ReturnCode::DataOutOfBounds),
        }
    }

    controller.persist_programs();
    Ok(ReturnCode::Success)
}
