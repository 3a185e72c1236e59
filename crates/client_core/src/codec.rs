//! Inbound frame decoding and outbound frame encoding.
//!
//! Decoding never fails: a frame that cannot be parsed becomes a synthetic
//! error event, and a parseable frame with missing fields gets defaults.

use chrono::{DateTime, Utc};
use shared::{
    domain::{ChatEvent, ChatEventKind, ParticipantId},
    error::ProtocolError,
    protocol::{InboundFrame, OutboundFrame},
};
use tracing::debug;

pub const INVALID_MESSAGE: &str = "Invalid message";
pub const UNKNOWN_ACTOR: &str = "Unknown";

pub fn decode(raw: &str) -> ChatEvent {
    match InboundFrame::parse(raw) {
        Ok(frame) => from_frame(frame),
        Err(err) => {
            debug!(error = %err, len = raw.len(), "codec: rejecting malformed frame");
            ChatEvent::error(INVALID_MESSAGE)
        }
    }
}

fn from_frame(frame: InboundFrame) -> ChatEvent {
    ChatEvent {
        kind: frame
            .kind
            .as_deref()
            .map_or(ChatEventKind::Chat, ChatEventKind::from_wire),
        actor_id: frame
            .user_id
            .filter(|id| !id.trim().is_empty())
            .map(ParticipantId::new),
        actor_name: frame.username.unwrap_or_else(|| UNKNOWN_ACTOR.to_string()),
        content: frame.content.unwrap_or_default(),
        timestamp: frame.timestamp.as_deref().and_then(parse_timestamp),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
}

pub fn encode_chat(content: &str, username: &str) -> Result<String, ProtocolError> {
    OutboundFrame::chat(content, username).to_json()
}

#[cfg(test)]
#[path = "tests/codec_tests.rs"]
mod tests;
