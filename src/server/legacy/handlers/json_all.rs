use actix_web::{web, Responder, Result};
use serde_json::json;

use crate::server::legacy::{error, payload};
use crate::server::SharedController;

/// Aggregated snapshot for UI boot.
///
/// URI: `/ja`
pub async fn handler(controller: web::Data<SharedController>) -> Result<impl Responder> {
    let controller = controller.lock().map_err(|_| error::SyncError)?;
    let now_seconds = chrono::Utc::now().timestamp();

    Ok(web::Json(json!({
        "settings": payload::settings::Settings::new(&controller, now_seconds),
        "options": payload::options::payload(&controller.options),
        "status": payload::status::Status::new(&controller),
        "stations": payload::stations::StationsPayload::new(&controller),
        "programs": payload::programs::list(
            &controller.programs,
            controller.options.station_count(),
            controller.options.board_count(),
        ),
    })))
}
