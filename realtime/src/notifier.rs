use std::sync::Arc;

use common::error::Res;
use uuid::Uuid;

use crate::{event::Event, registry::Room};

/// Anything that can deliver an event to a room.
pub trait Broadcaster: Send + Sync {
    fn emit(&self, room: Room, event: &Event) -> Res<()>;
}

/// Handle the route handlers use to publish mutations.
///
/// Publishing never fails from the caller's point of view: with no
/// broadcaster configured nothing happens, and emit errors are logged.
#[derive(Clone, Default)]
pub struct Notifier {
    broadcaster: Option<Arc<dyn Broadcaster>>,
}

impl Notifier {
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        Notifier {
            broadcaster: Some(broadcaster),
        }
    }

    pub fn disabled() -> Self {
        Notifier { broadcaster: None }
    }

    /// Sends `event` to the owner's room and to the admin room.
    pub fn owner_and_admin(&self, owner_id: Uuid, event: Event) {
        let Some(broadcaster) = &self.broadcaster else {
            return;
        };
        for room in [Room::User(owner_id), Room::Admin] {
            if let Err(e) = broadcaster.emit(room, &event) {
                log::warn!("Failed to emit {} to {:?}: {}", event.name(), room, e);
            }
        }
    }
}
