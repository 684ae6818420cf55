use actix_web::{web, Either, Responder, Result};
use serde::Deserialize;

use crate::server::legacy::error::{self, ReturnCode};
use crate::server::SharedController;

#[derive(Debug, Deserialize)]
pub struct LogRequest {
    /// Range start, epoch seconds.
    start: Option<i64>,
    /// Range end, epoch seconds.
    end: Option<i64>,
    /// Alternative: the last N days.
    hist: Option<i64>,
}

/// Run-log query.
///
/// URI: `/jl`
pub async fn handler(controller: web::Data<SharedController>, parameters: web::Query<LogRequest>) -> Result<impl Responder> {
    let controller = controller.lock().map_err(|_| error::SyncError)?;

    let (start, end) = match (parameters.hist, parameters.start, parameters.end) {
        (Some(hist), _, _) if hist >= 0 => {
            let now = chrono::Utc::now().timestamp();
            (now - hist * 86400, now)
        }
        (_, Some(start), Some(end)) => (start, end),
        _ => return Ok(Either::Left(ReturnCode::DataMissing)),
    };
    if start > end || start < 0 {
        return Ok(Either::Left(ReturnCode::DataOutOfBounds));
    }

    let records: Vec<_> = controller
        .log_store()
        .read_range(start, end)
        .iter()
        .map(|record| record.to_json())
        .collect();

    Ok(Either::Right(web::Json(records)))
}
