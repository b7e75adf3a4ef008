//! Per-connection WebSocket loop.
//!
//! Pings every 5s and drops clients that stay silent for 10s. Outbound
//! events arrive on the connection's registry queue.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::{sync::mpsc::UnboundedReceiver, time};

use crate::registry::{ConnectionId, ConnectionRegistry};

use super::messages::ClientFrame;

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network(Closed),
}

pub(super) async fn handle_ws_session(
    registry: Arc<ConnectionRegistry>,
    session: Session,
    stream: MessageStream,
) {
    let (id, outbound) = registry.register();
    WsSession { registry, id }
        .run(session, stream, outbound)
        .await;
}

struct WsSession {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl WsSession {
    async fn run(
        &self,
        mut session: Session,
        mut stream: MessageStream,
        mut outbound: UnboundedReceiver<String>,
    ) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    self.handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                Some(frame) = outbound.recv() => {
                    session.text(frame).await.map_err(SessionError::Network)
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
            };

            if let Err(error) = result {
                self.registry.unregister(self.id);
                self.shutdown(session, error).await;
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        &self,
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let message = match message {
            Some(Ok(message)) => message,
            Some(Err(error)) => return Err(SessionError::Protocol(error)),
            None => return Err(SessionError::StreamClosed),
        };

        *last_heartbeat = Instant::now();
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(SessionError::Network),
            Message::Text(text) => {
                self.handle_text_message(text.as_ref());
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                Ok(())
            }
        }
    }

    fn handle_text_message(&self, text: &str) {
        match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => frame.apply(&self.registry, self.id),
            Err(error) => log::warn!("Ignoring WebSocket frame on {}: {}", self.id, error),
        }
    }

    async fn shutdown(&self, session: Session, error: SessionError) {
        let reason = match error {
            SessionError::HeartbeatTimeout => {
                log::warn!("WebSocket {} heartbeat timeout; closing connection", self.id);
                Some(CloseReason {
                    code: CloseCode::Normal,
                    description: Some("heartbeat timeout".to_owned()),
                })
            }
            SessionError::Protocol(error) => {
                log::warn!("WebSocket {} protocol error: {}", self.id, error);
                Some(CloseReason {
                    code: CloseCode::Protocol,
                    description: Some("protocol error".to_owned()),
                })
            }
            SessionError::ClientClosed(reason) => reason,
            SessionError::Network(error) => {
                log::warn!("WebSocket {} send failed: {}", self.id, error);
                return;
            }
            SessionError::StreamClosed => return,
        };

        if let Err(error) = session.close(reason).await {
            log::warn!("Failed to close WebSocket {}: {}", self.id, error);
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
