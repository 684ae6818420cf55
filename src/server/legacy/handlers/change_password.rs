use actix_web::{web, Responder, Result};
use serde::Deserialize;

use crate::server::legacy::error::{self, ReturnCode};
use crate::server::SharedController;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// New device key (MD5 hex).
    npw: String,
    /// Confirmation, must match `npw`.
    cpw: String,
}

/// Change the device key.
///
/// URI: `/sp`
pub async fn handler(controller: web::Data<SharedController>, parameters: web::Query<ChangePasswordRequest>) -> Result<impl Responder> {
    let mut controller = controller.lock().map_err(|_| error::SyncError)?;

    if parameters.npw != parameters.cpw {
        return Ok(ReturnCode::Mismatch);
    }
    if parameters.npw.len() != 32 || !parameters.npw.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(ReturnCode::DataFormatError);
    }

    controller.options.device_key = parameters.npw.to_lowercase();
    controller.persist_options();

    Ok(ReturnCode::Success)
}
