use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// One inbound realtime frame, read leniently: every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundFrame {
    pub kind: Option<String>,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub content: Option<String>,
    pub timestamp: Option<String>,
}

impl InboundFrame {
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(fields) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        Ok(Self {
            kind: text_field(&fields, "type"),
            user_id: text_field(&fields, "userId"),
            username: text_field(&fields, "username"),
            content: text_field(&fields, "content"),
            timestamp: text_field(&fields, "timestamp"),
        })
    }
}

/// Strings pass through, numbers and booleans are rendered, anything else is absent.
fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub username: String,
}

impl OutboundFrame {
    pub fn chat(content: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            kind: "chat".to_string(),
            content: content.into(),
            username: username.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedUser {
    pub id: String,
    pub username: String,
}

/// Raw `/api/users` body. The backend may send either list, both, or nulls.
///
/// A list that is present but malformed reads as absent, so a broken detailed
/// list still lets the name list through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub users_detailed: Option<Vec<DetailedUser>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub users: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// The two accepted snapshot shapes. The detailed list wins when both are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceSnapshot {
    Detailed(Vec<DetailedUser>),
    Names(Vec<String>),
}

impl PresenceSnapshot {
    pub fn from_json(raw: &str) -> Result<Self, ProtocolError> {
        let response: UsersResponse = serde_json::from_str(raw)?;
        Self::try_from(response)
    }
}

impl TryFrom<UsersResponse> for PresenceSnapshot {
    type Error = ProtocolError;

    fn try_from(value: UsersResponse) -> Result<Self, Self::Error> {
        match (value.users_detailed, value.users) {
            (Some(detailed), _) => Ok(Self::Detailed(detailed)),
            (None, Some(names)) => Ok(Self::Names(names)),
            (None, None) => Err(ProtocolError::MissingUserList),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_frame() {
        let frame = InboundFrame::parse(
            r#"{"type":"chat","userId":"u1","username":"Alice","content":"hi","timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .expect("frame");
        assert_eq!(frame.kind.as_deref(), Some("chat"));
        assert_eq!(frame.user_id.as_deref(), Some("u1"));
        assert_eq!(frame.username.as_deref(), Some("Alice"));
        assert_eq!(frame.content.as_deref(), Some("hi"));
        assert_eq!(frame.timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn numeric_user_id_is_rendered_and_nulls_are_absent() {
        let frame = InboundFrame::parse(r#"{"userId":42,"username":null,"content":[1]}"#)
            .expect("frame");
        assert_eq!(frame.user_id.as_deref(), Some("42"));
        assert_eq!(frame.username, None);
        assert_eq!(frame.content, None);
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(matches!(
            InboundFrame::parse("[1,2,3]"),
            Err(ProtocolError::NotAnObject)
        ));
        assert!(matches!(
            InboundFrame::parse("not json"),
            Err(ProtocolError::InvalidJson(_))
        ));
    }

    #[test]
    fn outbound_chat_frame_uses_wire_field_names() {
        let json = OutboundFrame::chat("hello", "Alice")
            .to_json()
            .expect("encode");
        let value: Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["type"], "chat");
        assert_eq!(value["content"], "hello");
        assert_eq!(value["username"], "Alice");
    }

    #[test]
    fn snapshot_prefers_detailed_list() {
        let snapshot = PresenceSnapshot::from_json(
            r#"{"users":["Bob"],"usersDetailed":[{"id":"7","username":"Bob"}],"count":1}"#,
        )
        .expect("snapshot");
        assert_eq!(
            snapshot,
            PresenceSnapshot::Detailed(vec![DetailedUser {
                id: "7".to_string(),
                username: "Bob".to_string(),
            }])
        );
    }

    #[test]
    fn snapshot_falls_back_to_names() {
        let snapshot = PresenceSnapshot::from_json(r#"{"users":["Bob","Carol"],"usersDetailed":null}"#)
            .expect("snapshot");
        assert_eq!(
            snapshot,
            PresenceSnapshot::Names(vec!["Bob".to_string(), "Carol".to_string()])
        );
    }

    #[test]
    fn malformed_detailed_list_falls_back_to_names() {
        for detailed in [r#""oops""#, "[1,2]", r#"[{"id":"7"}]"#, r#"{"id":"7"}"#] {
            let raw = format!(r#"{{"usersDetailed":{detailed},"users":["Bob"]}}"#);
            let snapshot = PresenceSnapshot::from_json(&raw).expect("snapshot");
            assert_eq!(snapshot, PresenceSnapshot::Names(vec!["Bob".to_string()]), "{raw}");
        }
    }

    #[test]
    fn snapshot_with_only_malformed_lists_is_an_error() {
        assert!(matches!(
            PresenceSnapshot::from_json(r#"{"users":"Bob","usersDetailed":7}"#),
            Err(ProtocolError::MissingUserList)
        ));
    }

    #[test]
    fn snapshot_without_any_list_is_an_error() {
        assert!(matches!(
            PresenceSnapshot::from_json(r#"{"users":null,"usersDetailed":null,"count":0}"#),
            Err(ProtocolError::MissingUserList)
        ));
    }
}
