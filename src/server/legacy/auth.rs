//! Device-key authentication middleware.
//!
//! Every route except `/` requires the `pw` query parameter to equal the
//! stored MD5 device key, unless the `ipas` option is set. Mismatches are
//! answered with the legacy `{"result": 2}` body, HTTP 200.

use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, HttpResponse};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use serde_json::json;

use crate::server::SharedController;

use super::error::ReturnCode;

pub struct DeviceKeyAuth;

impl<S, B> Transform<S, ServiceRequest> for DeviceKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = DeviceKeyAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(DeviceKeyAuthMiddleware { service: Rc::new(service) }))
    }
}

pub struct DeviceKeyAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for DeviceKeyAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let authorized = is_authorized(&req);
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if authorized {
                service.call(req).await.map(|res| res.map_into_left_body())
            } else {
                let response = HttpResponse::Ok().json(json!({ "result": ReturnCode::Unauthorized as u8 }));
                Ok(req.into_response(response).map_into_right_body())
            }
        })
    }
}

fn is_authorized(req: &ServiceRequest) -> bool {
    let controller = match req.app_data::<web::Data<SharedController>>() {
        Some(data) => data,
        None => return false,
    };
    let controller = match controller.lock() {
        Ok(guard) => guard,
        Err(_) => return false,
    };

    if controller.options.ignore_password {
        return true;
    }

    form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == "pw")
        .map(|(_, value)| value == controller.options.device_key.as_str())
        .unwrap_or(false)
}
