pub mod legacy;

use std::sync::{Arc, Mutex};

use actix_web::{web, App, HttpServer};

use crate::sprinkler::Controller;

pub type SharedController = Arc<Mutex<Controller>>;

/// Run the legacy JSON API until the actix system is stopped.
///
/// Blocks the calling thread; the control loop runs elsewhere and every
/// handler takes the controller lock for the duration of its call.
pub fn run(controller: SharedController, address: String, port: u16) -> std::io::Result<()> {
    let data = web::Data::new(controller);

    actix_web::rt::System::new().block_on(async move {
        tracing::info!("legacy API listening on {}:{}", address, port);
        HttpServer::new(move || App::new().app_data(data.clone()).configure(legacy::service_config))
            .bind((address.as_str(), port))?
            .run()
            .await
    })
}
