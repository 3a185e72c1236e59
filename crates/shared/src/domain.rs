use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Actor name used for events synthesized by the client itself.
pub const SYSTEM_ACTOR: &str = "System";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatEventKind {
    Chat,
    Join,
    Leave,
    Welcome,
    Error,
    System,
    /// A `type` the client does not know; kept verbatim.
    Other(String),
}

impl ChatEventKind {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "chat" => Self::Chat,
            "join" => Self::Join,
            "leave" => Self::Leave,
            "welcome" => Self::Welcome,
            "error" => Self::Error,
            "system" => Self::System,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Chat => "chat",
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Welcome => "welcome",
            Self::Error => "error",
            Self::System => "system",
            Self::Other(raw) => raw,
        }
    }

    /// Join and leave notices are the push-side presence signals.
    pub fn is_presence_signal(&self) -> bool {
        matches!(self, Self::Join | Self::Leave)
    }
}

impl fmt::Display for ChatEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub kind: ChatEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<ParticipantId>,
    pub actor_name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatEvent {
    pub fn system(content: impl Into<String>) -> Self {
        Self::synthetic(ChatEventKind::System, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::synthetic(ChatEventKind::Error, content)
    }

    fn synthetic(kind: ChatEventKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            actor_id: None,
            actor_name: SYSTEM_ACTOR.to_string(),
            content: content.into(),
            timestamp: None,
        }
    }

    /// True iff both ids are known and equal.
    pub fn is_from(&self, self_id: Option<&ParticipantId>) -> bool {
        match (&self.actor_id, self_id) {
            (Some(actor), Some(me)) => actor == me,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub id: ParticipantId,
    pub name: String,
}
