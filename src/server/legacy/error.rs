use core::fmt;

use actix_web::{body::BoxBody, HttpRequest, HttpResponse, Responder, ResponseError};
use serde_json::json;

/// Legacy result codes; always delivered as HTTP 200 `{"result": N}`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnCode {
    Success = 1,
    Unauthorized = 2,
    Mismatch = 3,
    DataMissing = 16,
    DataOutOfBounds = 17,
    DataFormatError = 18,
    PageNotFound = 32,
    NotPermitted = 48,
}

impl Responder for ReturnCode {
    type Body = BoxBody;

    fn respond_to(self, _: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::Ok().json(json!({ "result": self as u8 }))
    }
}

/// A poisoned controller lock; surfaces as HTTP 500.
#[derive(Debug)]
pub struct SyncError;

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller lock poisoned")
    }
}

impl ResponseError for SyncError {}
