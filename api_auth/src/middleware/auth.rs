use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    Error, HttpMessage,
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::AUTHORIZATION,
};
use common::{
    error::{AppError, Res},
    jwt,
    scope::{Principal, Role},
};
use futures::future::{Ready, ok};

/// Access guard for protected routes.
///
/// Validates the bearer token, optionally requires a role, and stores the
/// resulting [`Principal`] in the request extensions for handlers to read.
pub struct AuthMiddleware {
    secret: Rc<String>,
    required_role: Option<Role>,
}

impl AuthMiddleware {
    pub fn new(secret: String, required_role: Option<Role>) -> Self {
        AuthMiddleware {
            secret: Rc::new(secret),
            required_role,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
            secret: self.secret.clone(),
            required_role: self.required_role,
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    secret: Rc<String>,
    required_role: Option<Role>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match authorize(header, &self.secret, self.required_role) {
            Ok(principal) => {
                req.extensions_mut().insert(principal);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(|res| res.map_into_boxed_body()) })
            }
            Err(err) => {
                log::debug!("Rejected {} {}: {}", req.method(), req.path(), err);
                let response = err.to_http_response();
                Box::pin(async move { Ok(req.into_response(response)) })
            }
        }
    }
}

/// Decides whether an `Authorization` header grants access.
///
/// A missing header or one without the `Bearer ` prefix counts as no token.
/// Signature or expiry failures are an invalid token. A valid token with the
/// wrong role is forbidden.
pub fn authorize(header: Option<&str>, secret: &str, required_role: Option<Role>) -> Res<Principal> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("No authorization token provided".to_string()))?;

    let claims = jwt::validate_jwt(token, secret)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;
    let principal = Principal::from(&claims);

    match required_role {
        Some(role) if principal.role != role => {
            Err(AppError::Forbidden("Access denied".to_string()))
        }
        _ => Ok(principal),
    }
}
