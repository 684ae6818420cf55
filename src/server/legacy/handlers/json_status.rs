use actix_web::{web, Responder, Result};

use crate::server::legacy::{error, payload};
use crate::server::SharedController;

/// Station on/off bits.
///
/// URI: `/js`
pub async fn handler(controller: web::Data<SharedController>) -> Result<impl Responder> {
    let controller = controller.lock().map_err(|_| error::SyncError)?;

    Ok(web::Json(payload::status::Status::new(&controller)))
}
