use actix_web::{web, Responder, Result};

use crate::server::legacy::{error, payload};
use crate::server::SharedController;

/// Non-standard stations with their legacy payload strings.
///
/// URI: `/je`
pub async fn handler(controller: web::Data<SharedController>) -> Result<impl Responder> {
    let controller = controller.lock().map_err(|_| error::SyncError)?;

    Ok(web::Json(payload::stations::special_list(&controller)))
}
