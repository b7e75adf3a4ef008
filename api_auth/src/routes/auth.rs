use std::sync::Arc;

use actix_web::{Responder, post, web};
use common::{env_config::Config, error::Res, http::Success, jwt};
use db::CrmStore;

use crate::dtos::auth::{AuthResponse, LoginRequest, PublicUser, RegisterRequest};
use crate::services;

/// Registers a new `user`-role account and returns it with a session token.
///
/// # Output
/// - 201 `{ "user": {id, name, email, role}, "token": "..." }`
/// - 400 when a field fails validation
/// - 409 when the email is already registered
#[post("/register")]
pub async fn post_register(
    req: web::Json<RegisterRequest>,
    store: web::Data<Arc<dyn CrmStore>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let account = services::auth::validate_register(req.into_inner())?;
    let user = PublicUser::from(services::auth::register_user(store.get_ref().as_ref(), account).await?);
    let token = jwt::generate_jwt(&user.principal(), &config.jwt_config)?;
    log::info!("Registered user {}", user.id);
    Success::created(AuthResponse { user, token })
}

/// Authenticates with email and password.
///
/// # Output
/// - 200 `{ "user": {...}, "token": "..." }`
/// - 401 `Invalid credentials` for an unknown email or wrong password
#[post("/login")]
pub async fn post_login(
    req: web::Json<LoginRequest>,
    store: web::Data<Arc<dyn CrmStore>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let (email, password) = services::auth::validate_login(req.into_inner())?;
    let user = PublicUser::from(
        services::auth::authenticate_user(store.get_ref().as_ref(), &email, &password).await?,
    );
    let token = jwt::generate_jwt(&user.principal(), &config.jwt_config)?;
    Success::ok(AuthResponse { user, token })
}
