//! JSON serialization for room messages.

use projtree_core::result::AppResult;

use super::envelope::RoomMessage;

/// Serialize a room message to JSON.
pub fn serialize_message(msg: &RoomMessage) -> AppResult<String> {
    Ok(serde_json::to_string(msg)?)
}

/// Deserialize a room message from JSON.
pub fn deserialize_message(text: &str) -> AppResult<RoomMessage> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use projtree_core::types::id::{EntityId, ProjectId};
    use projtree_service::RoomEvent;

    #[test]
    fn test_event_tag_inside_envelope() {
        let msg = RoomMessage::new(
            ProjectId::new(),
            RoomEvent::RemoveEntity {
                id: EntityId::new(),
                source: "editor".to_string(),
            },
            3,
        );
        let json = serialize_message(&msg).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["data"]["event"], "removeEntity");
        assert_eq!(value["seq"], 3);
        assert_eq!(deserialize_message(&json).unwrap(), msg);
    }

    #[test]
    fn test_bad_json_is_serialization_error() {
        let err = deserialize_message("{").unwrap_err();
        assert_eq!(err.kind, projtree_core::ErrorKind::Serialization);
    }
}
