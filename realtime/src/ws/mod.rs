//! WebSocket endpoint that subscribes clients to broadcast rooms.

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, get, web};

use crate::registry::ConnectionRegistry;

pub mod messages;
mod session;

/// Upgrades `/ws` and hands the connection to a session task.
#[get("/ws")]
pub async fn ws_entry(
    registry: web::Data<Arc<ConnectionRegistry>>,
    req: HttpRequest,
    body: web::Payload,
) -> actix_web::Result<HttpResponse> {
    let (response, ws_session, stream) = actix_ws::handle(&req, body).map_err(|e| {
        log::error!("WebSocket upgrade failed: {}", e);
        e
    })?;

    let registry = registry.get_ref().clone();
    actix_web::rt::spawn(session::handle_ws_session(registry, ws_session, stream));
    Ok(response)
}
