use actix_web::{web, Responder, Result};
use serde::Deserialize;

use crate::server::legacy::error::{self, ReturnCode};
use crate::server::SharedController;

#[derive(Debug, Deserialize)]
pub struct DeleteLogRequest {
    /// `YYYYMMDD` or `all`.
    day: String,
}

/// Delete run-log files.
///
/// URI: `/dl`
pub async fn handler(controller: web::Data<SharedController>, parameters: web::Query<DeleteLogRequest>) -> Result<impl Responder> {
    let controller = controller.lock().map_err(|_| error::SyncError)?;

    let target = if parameters.day == "all" {
        None
    } else if parameters.day.len() == 8 && parameters.day.chars().all(|c| c.is_ascii_digit()) {
        Some(parameters.day.as_str())
    } else {
        return Ok(ReturnCode::DataFormatError);
    };

    if let Err(error) = controller.log_store().delete(target) {
        // deleting something that is already gone is not a failure
        if error.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("log delete failed: {}", error);
        }
    }

    Ok(ReturnCode::Success)
}
