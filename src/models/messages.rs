use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::utils::time::iso_micros;

/// Frame a chat client sends on `/ws/chat/{group_id}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InboundChatMessage {
    pub user: String,
    pub text: String,
}

impl InboundChatMessage {
    /// Only a JSON object is a chat message; serde would also take `[user, text]`.
    pub fn parse(frame: &str) -> Result<Self, serde_json::Error> {
        let object: Map<String, Value> = serde_json::from_str(frame)?;
        serde_json::from_value(Value::Object(object))
    }
}

/// A chat message as persisted and as broadcast to the group
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct ChatMessage {
    pub group_id: String,
    pub user: String,
    pub text: String,
    #[serde(with = "iso_micros")]
    #[schema(value_type = String, format = DateTime, example = "2026-10-16T09:30:00.123456Z")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn stamped(group_id: &str, inbound: InboundChatMessage, timestamp: DateTime<Utc>) -> Self {
        Self {
            group_id: group_id.to_string(),
            user: inbound.user,
            text: inbound.text,
            timestamp,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ProtocolError,
    StoreUnavailable,
}

/// Sent to one connection only, never broadcast
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorFrame {
    pub error: ErrorKind,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn outbound_frame_has_the_four_fields() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();
        let msg = ChatMessage::stamped(
            "cs101",
            InboundChatMessage { user: "alice".into(), text: "hi".into() },
            ts,
        );

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "group_id": "cs101",
                "user": "alice",
                "text": "hi",
                "timestamp": "2026-10-16T09:30:00.000000Z",
            })
        );
    }

    #[test]
    fn inbound_ignores_extra_fields_but_needs_both_strings() {
        let ok = InboundChatMessage::parse(r#"{"user":"bob","text":"yo","timestamp":"1999-01-01"}"#)
            .unwrap();
        assert_eq!(ok, InboundChatMessage { user: "bob".into(), text: "yo".into() });

        assert!(InboundChatMessage::parse(r#"{"user":"bob"}"#).is_err());
        assert!(InboundChatMessage::parse(r#"{"user":1,"text":"x"}"#).is_err());
        assert!(InboundChatMessage::parse(r#"["bob","yo"]"#).is_err());
        assert!(InboundChatMessage::parse("not json").is_err());
    }

    #[test]
    fn error_frame_uses_snake_case_kinds() {
        let frame = ErrorFrame { error: ErrorKind::StoreUnavailable, detail: "down".into() };
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({"error": "store_unavailable", "detail": "down"})
        );
    }
}
