use actix_web::{HttpRequest, Responder};
use common::{
    error::{AppError, Res},
    http::Success,
    jwt::principal_of,
};

use crate::dtos::auth::{AdminOnlyResponse, MeResponse};

/// Echoes the decoded token of the caller.
pub async fn get_me(req: HttpRequest) -> Res<impl Responder> {
    let user = principal_of(&req).ok_or_else(unauthenticated)?;
    Success::ok(MeResponse { user })
}

pub async fn get_admin_only(req: HttpRequest) -> Res<impl Responder> {
    let user = principal_of(&req).ok_or_else(unauthenticated)?;
    Success::ok(AdminOnlyResponse {
        msg: "Welcome Admin".to_string(),
        user,
    })
}

fn unauthenticated() -> AppError {
    AppError::Unauthorized("No authorization token provided".to_string())
}
