use actix_web::{web, Responder, Result};
use serde::Deserialize;

use crate::server::legacy::error::{self, ReturnCode};
use crate::server::SharedController;

#[derive(Debug, Deserialize)]
pub struct ChangeSettingsRequest {
    /// Stop all stations.
    rsn: Option<u8>,
    /// Enable/disable device operation.
    en: Option<u8>,
    /// Rain delay in hours; 0 cancels.
    rd: Option<i64>,
}

/// Change controller variables.
///
/// URI: `/cv`
pub async fn handler(controller: web::Data<SharedController>, parameters: web::Query<ChangeSettingsRequest>) -> Result<impl Responder> {
    let mut controller = controller.lock().map_err(|_| error::SyncError)?;
    let now_seconds = chrono::Utc::now().timestamp();

    if let Some(rd) = parameters.rd {
        if !(0..=32767).contains(&rd) {
            return Ok(ReturnCode::DataOutOfBounds);
        }
        controller.set_rain_delay(rd, now_seconds);
    }

    if let Some(en) = parameters.en {
        controller.options.device_enable = en != 0;
        controller.persist_options();
    }

    if parameters.rsn == Some(1) {
        controller.stop_all_stations();
    }

    Ok(ReturnCode::Success)
}
