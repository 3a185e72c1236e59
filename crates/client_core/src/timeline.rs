use shared::domain::{ChatEvent, ParticipantId};

/// Append-only log of chat and system events in arrival order.
#[derive(Debug, Clone, Default)]
pub struct ChatTimeline {
    events: Vec<ChatEvent>,
}

impl ChatTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: ChatEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ChatEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&ChatEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_mine(event: &ChatEvent, self_id: Option<&ParticipantId>) -> bool {
        event.is_from(self_id)
    }
}

#[cfg(test)]
#[path = "tests/timeline_tests.rs"]
mod tests;
