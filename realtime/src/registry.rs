use std::{
    collections::HashSet,
    sync::atomic::{AtomicU64, Ordering},
};

use common::error::{AppError, Res};
use dashmap::DashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::{event::Event, notifier::Broadcaster};

pub type ConnectionId = u64;

/// Broadcast group a connection can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    /// Every connection joins this on connect.
    Global,
    /// Events about records owned by the user.
    User(Uuid),
    /// Events about every record.
    Admin,
}

struct Connection {
    sender: UnboundedSender<String>,
    rooms: HashSet<Room>,
}

/// Live WebSocket connections and their room memberships.
#[derive(Default)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    connections: DashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the global room and returns the receiving end of
    /// its outbound queue.
    pub fn register(&self) -> (ConnectionId, UnboundedReceiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.connections.insert(
            id,
            Connection {
                sender,
                rooms: HashSet::from([Room::Global]),
            },
        );
        log::debug!("Connection {} registered", id);
        (id, receiver)
    }

    pub fn join(&self, id: ConnectionId, room: Room) {
        if let Some(mut connection) = self.connections.get_mut(&id) {
            connection.rooms.insert(room);
            log::debug!("Connection {} joined {:?}", id, room);
        }
    }

    pub fn leave(&self, id: ConnectionId, room: Room) {
        if let Some(mut connection) = self.connections.get_mut(&id) {
            connection.rooms.remove(&room);
        }
    }

    pub fn unregister(&self, id: ConnectionId) {
        if self.connections.remove(&id).is_some() {
            log::debug!("Connection {} unregistered", id);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_member(&self, id: ConnectionId, room: Room) -> bool {
        self.connections
            .get(&id)
            .is_some_and(|connection| connection.rooms.contains(&room))
    }

    /// Queues a pre-serialized frame for every member of `room` and returns
    /// how many connections accepted it. Connections whose receiver is gone
    /// are dropped.
    pub fn send_to(&self, room: Room, frame: &str) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for entry in self.connections.iter() {
            if !entry.rooms.contains(&room) {
                continue;
            }
            if entry.sender.send(frame.to_string()).is_ok() {
                delivered += 1;
            } else {
                closed.push(*entry.key());
            }
        }

        for id in closed {
            self.unregister(id);
        }
        delivered
    }
}

impl Broadcaster for ConnectionRegistry {
    fn emit(&self, room: Room, event: &Event) -> Res<()> {
        let frame = serde_json::to_string(event)
            .map_err(|e| AppError::Internal(format!("Failed to serialize {}: {}", event.name(), e)))?;
        let delivered = self.send_to(room, &frame);
        log::debug!("{} delivered to {} connection(s) in {:?}", event.name(), delivered, room);
        Ok(())
    }
}
