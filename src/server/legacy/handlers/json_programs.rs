use actix_web::{web, Responder, Result};

use crate::server::legacy::{error, payload};
use crate::server::SharedController;

/// Program list in wire form.
///
/// URI: `/jp`
pub async fn handler(controller: web::Data<SharedController>) -> Result<impl Responder> {
    let controller = controller.lock().map_err(|_| error::SyncError)?;

    Ok(web::Json(payload::programs::list(
        &controller.programs,
        controller.options.station_count(),
        controller.options.board_count(),
    )))
}
