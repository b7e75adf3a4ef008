use actix_web::{HttpRequest, dev::HttpServiceFactory, web};
use common::{
    env_config::Config,
    error::{AppError, Res},
    jwt::principal_of,
    scope::Principal,
};

pub mod dtos {
    pub mod customer;
    pub mod lead;
}
pub mod services {
    pub mod customer;
    pub mod lead;
}
mod routes {
    pub(crate) mod customer;
    pub(crate) mod lead;
}

/// Principal set by the access guard on every route of this crate.
pub(crate) fn caller(req: &HttpRequest) -> Res<Principal> {
    principal_of(req)
        .ok_or_else(|| AppError::Unauthorized("No authorization token provided".to_string()))
}

/// `/customers` with its nested `/customers/{customer_id}/leads` routes.
pub fn mount_customers(config: &Config) -> impl HttpServiceFactory + use<> {
    web::scope("/customers")
        .wrap(api_auth::auth_middleware(config))
        .service(routes::customer::post_customer)
        .service(routes::customer::get_customers)
        .service(routes::customer::get_customer)
        .service(routes::customer::put_customer)
        .service(routes::customer::delete_customer)
        .service(routes::lead::post_lead)
        .service(routes::lead::get_customer_leads)
        .service(routes::lead::get_lead)
        .service(routes::lead::put_lead)
        .service(routes::lead::delete_lead)
}

/// `/leads`: leads of every customer the caller can see.
pub fn mount_leads(config: &Config) -> impl HttpServiceFactory + use<> {
    web::scope("/leads")
        .wrap(api_auth::auth_middleware(config))
        .service(routes::lead::get_all_leads)
}
