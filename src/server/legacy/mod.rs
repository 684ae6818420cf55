//! The legacy JSON API that existing third-party UIs target verbatim.

use actix_web::{web, HttpResponse, Responder};

pub mod auth;
pub mod error;
pub mod handlers;
pub mod payload;
pub mod serde;

use crate::sprinkler::config::FIRMWARE_VERSION;

/// `/` serves the tiny bootstrap page; it is the only unauthenticated route.
async fn index() -> impl Responder {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(format!(
        "<!DOCTYPE html>\
        <html>\
            <head>\
                <meta name=\"viewport\" content=\"width=device-width,initial-scale=1.0,minimum-scale=1.0,user-scalable=no\">\
                <meta name=\"firmware-version\" content=\"{}\">\
            </head>\
            <body><p>sprinklerd</p></body>\
        </html>",
        FIRMWARE_VERSION
    ))
}

pub fn service_config(config: &mut web::ServiceConfig) {
    config.service(web::resource("/").route(web::get().to(index)));

    config.service(
        web::scope("")
            .wrap(auth::DeviceKeyAuth)
            .service(web::resource("/jc").route(web::get().to(handlers::json_settings::handler)))
            .service(web::resource("/jo").route(web::get().to(handlers::json_options::handler)))
            .service(web::resource("/jp").route(web::get().to(handlers::json_programs::handler)))
            .service(web::resource("/js").route(web::get().to(handlers::json_status::handler)))
            .service(web::resource("/jn").route(web::get().to(handlers::json_stations::handler)))
            .service(web::resource("/je").route(web::get().to(handlers::json_stations_special::handler)))
            .service(web::resource("/jl").route(web::get().to(handlers::json_log::handler)))
            .service(web::resource("/ja").route(web::get().to(handlers::json_all::handler)))
            .service(web::resource("/cv").route(web::get().to(handlers::change_settings::handler)))
            .service(web::resource("/co").route(web::get().to(handlers::change_options::handler)))
            .service(web::resource("/sp").route(web::get().to(handlers::change_password::handler)))
            .service(web::resource("/cp").route(web::get().to(handlers::change_program::handler)))
            .service(web::resource("/dp").route(web::get().to(handlers::delete_program::handler)))
            .service(web::resource("/up").route(web::get().to(handlers::change_program_index::handler)))
            .service(web::resource("/mp").route(web::get().to(handlers::manual_program::handler)))
            .service(web::resource("/cs").route(web::get().to(handlers::change_stations::handler)))
            .service(web::resource("/cm").route(web::get().to(handlers::change_manual::handler)))
            .service(web::resource("/cr").route(web::get().to(handlers::change_run_once::handler)))
            .service(web::resource("/pq").route(web::get().to(handlers::pause_queue::handler)))
            .service(web::resource("/dl").route(web::get().to(handlers::delete_log::handler)))
            .default_service(web::to(|| async { error::ReturnCode::PageNotFound })),
    );
}
