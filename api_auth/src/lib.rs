use common::{env_config::Config, scope::Role};
use middleware::auth::AuthMiddleware;

use actix_web::web;

pub mod dtos {
    pub mod auth;
}
pub mod middleware {
    pub mod auth;
}
pub mod services {
    pub mod auth;
}
mod routes {
    pub(crate) mod auth;
    pub(crate) mod protected;
}

/// Guard that accepts any valid token.
pub fn auth_middleware(config: &Config) -> AuthMiddleware {
    AuthMiddleware::new(config.jwt_config.secret.clone(), None)
}

/// Guard that additionally requires the admin role.
pub fn admin_middleware(config: &Config) -> AuthMiddleware {
    AuthMiddleware::new(config.jwt_config.secret.clone(), Some(Role::Admin))
}

/// `/auth/register` and `/auth/login`.
pub fn mount_auth() -> actix_web::Scope {
    web::scope("/auth")
        .service(routes::auth::post_register)
        .service(routes::auth::post_login)
}

/// `/protected/me` for any signed-in caller, `/protected/admin-only` for admins.
pub fn mount_protected(config: &Config) -> actix_web::Scope {
    web::scope("/protected")
        .service(
            web::resource("/me")
                .wrap(auth_middleware(config))
                .route(web::get().to(routes::protected::get_me)),
        )
        .service(
            web::resource("/admin-only")
                .wrap(admin_middleware(config))
                .route(web::get().to(routes::protected::get_admin_only)),
        )
}
