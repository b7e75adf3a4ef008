use serde::Deserialize;
use uuid::Uuid;

use crate::registry::{ConnectionId, ConnectionRegistry, Room};

/// Text frames a client may send.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    JoinRoom {
        #[serde(rename = "userId")]
        user_id: Uuid,
    },
    LeaveRoom {
        #[serde(rename = "userId")]
        user_id: Uuid,
    },
    // TODO: check the connection's token before granting the admin room.
    JoinAdmin,
}

impl ClientFrame {
    pub fn apply(self, registry: &ConnectionRegistry, id: ConnectionId) {
        match self {
            ClientFrame::JoinRoom { user_id } => registry.join(id, Room::User(user_id)),
            ClientFrame::LeaveRoom { user_id } => registry.leave(id, Room::User(user_id)),
            ClientFrame::JoinAdmin => registry.join(id, Room::Admin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_join_room() {
        let user_id = Uuid::new_v4();
        let raw = format!(r#"{{"type":"joinRoom","userId":"{user_id}"}}"#);
        assert_eq!(
            serde_json::from_str::<ClientFrame>(&raw).unwrap(),
            ClientFrame::JoinRoom { user_id }
        );
    }

    #[rstest]
    #[case(r#"{"type":"joinAdmin"}"#, true)]
    #[case(r#"{"type":"joinRoom","userId":"nope"}"#, false)]
    #[case(r#"{"type":"userLoggedOut"}"#, false)]
    #[case("joinRoom", false)]
    fn frame_validity(#[case] raw: &str, #[case] valid: bool) {
        assert_eq!(serde_json::from_str::<ClientFrame>(raw).is_ok(), valid);
    }

    #[test]
    fn apply_updates_membership() {
        let registry = ConnectionRegistry::new();
        let (id, _rx) = registry.register();
        let user_id = Uuid::new_v4();

        ClientFrame::JoinRoom { user_id }.apply(&registry, id);
        ClientFrame::JoinAdmin.apply(&registry, id);
        assert!(registry.is_member(id, Room::User(user_id)));
        assert!(registry.is_member(id, Room::Admin));

        ClientFrame::LeaveRoom { user_id }.apply(&registry, id);
        assert!(!registry.is_member(id, Room::User(user_id)));
    }
}
