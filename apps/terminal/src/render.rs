use client_core::{ClientEvent, ConnectionState};
use shared::domain::{ChatEvent, ParticipantId, PresenceEntry};

/// Turns client events into printable lines.
///
/// Tracks the local participant id so own messages can be marked.
#[derive(Debug, Default)]
pub struct Renderer {
    self_id: Option<ParticipantId>,
}

impl Renderer {
    pub fn render(&mut self, event: &ClientEvent) -> Option<String> {
        match event {
            ClientEvent::StateChanged(state) => {
                if *state == ConnectionState::Connecting {
                    self.self_id = None;
                }
                Some(format!("-- {}", state_label(*state)))
            }
            ClientEvent::TimelineAppended(event) => Some(self.timeline_line(event)),
            ClientEvent::PresenceUpdated(entries) => Some(presence_line(entries)),
            ClientEvent::SelfIdentified(id) => {
                self.self_id = Some(id.clone());
                None
            }
            ClientEvent::LivenessChanged(status) => Some(format!("-- API: {status}")),
        }
    }

    fn timeline_line(&self, event: &ChatEvent) -> String {
        let mut line = format!("[{}] {}: {}", event.kind, event.actor_name, event.content);
        if event.is_from(self.self_id.as_ref()) {
            line.push_str(" (me)");
        }
        line
    }
}

fn state_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "disconnected",
        ConnectionState::Connecting => "connecting...",
        ConnectionState::Connected => "connected",
    }
}

pub fn presence_line(entries: &[PresenceEntry]) -> String {
    if entries.is_empty() {
        return "-- online: nobody".to_string();
    }
    let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
    format!("-- online ({}): {}", entries.len(), names.join(", "))
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
