use std::collections::HashMap;

use actix_web::{web, Responder, Result};

use crate::server::legacy::error::{self, ReturnCode};
use crate::server::SharedController;
use crate::sprinkler::config::OptionError;

/// Assign options by wire name.
///
/// URI: `/co`
pub async fn handler(controller: web::Data<SharedController>, parameters: web::Query<HashMap<String, String>>) -> Result<impl Responder> {
    let mut controller = controller.lock().map_err(|_| error::SyncError)?;
    let mut sensors_touched = false;

    for (name, value) in parameters.iter() {
        if name == "pw" {
            continue;
        }
        sensors_touched |= name.starts_with("sn");

        if matches!(name.as_str(), "loc" | "ifurl") {
            // string options cannot fail beyond key lookup
            let _ = controller.options.set_string(name, value);
            continue;
        }

        let value: i64 = match value.parse() {
            Ok(value) => value,
            Err(_) => return Ok(ReturnCode::DataFormatError),
        };

        match controller.options.set_int(name, value) {
            Ok(()) => {}
            Err(OptionError::UnknownKey) => return Ok(ReturnCode::DataFormatError),
            Err(OptionError::ReadOnly) => return Ok(ReturnCode::NotPermitted),
        }
    }

    if sensors_touched {
        controller.reset_sensors();
    }

    controller.persist_options();
    Ok(ReturnCode::Success)
}
