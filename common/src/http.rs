use actix_web::{HttpResponse, Responder};
use serde::Serialize;

use super::error::Res;

/// JSON success responses shared by every route module.
pub struct Success;
impl Success {
    pub fn created<T: Serialize>(body: T) -> Res<impl Responder> {
        Ok(HttpResponse::Created().json(body))
    }
    pub fn ok<T: Serialize>(body: T) -> Res<impl Responder> {
        Ok(HttpResponse::Ok().json(body))
    }
    /// `{"message": ...}` acknowledgement used by delete routes.
    pub fn message(text: &str) -> Res<impl Responder> {
        Ok(HttpResponse::Ok().json(serde_json::json!({ "message": text })))
    }
}
