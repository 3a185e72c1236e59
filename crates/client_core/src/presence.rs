//! Presence view built from the authoritative REST snapshot.
//!
//! Every successful poll rebuilds the whole view; push-side join/leave
//! notices never touch it.

use std::collections::HashSet;

use shared::{
    domain::{ParticipantId, PresenceEntry},
    protocol::PresenceSnapshot,
};

/// Participants in snapshot order, at most one entry per id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceView {
    entries: Vec<PresenceEntry>,
}

impl PresenceView {
    pub fn from_snapshot(snapshot: PresenceSnapshot) -> Self {
        let candidates: Vec<PresenceEntry> = match snapshot {
            PresenceSnapshot::Detailed(users) => users
                .into_iter()
                .map(|user| PresenceEntry {
                    id: ParticipantId::new(user.id),
                    name: user.username,
                })
                .collect(),
            // Name-only snapshots get 1-based positional ids.
            PresenceSnapshot::Names(names) => names
                .into_iter()
                .enumerate()
                .map(|(idx, name)| PresenceEntry {
                    id: ParticipantId::new((idx + 1).to_string()),
                    name,
                })
                .collect(),
        };

        let mut seen = HashSet::with_capacity(candidates.len());
        let entries = candidates
            .into_iter()
            .filter(|entry| seen.insert(entry.id.clone()))
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[PresenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.entries.iter().any(|entry| &entry.id == id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PresenceReconciler {
    view: PresenceView,
}

impl PresenceReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current view. Returns true when it actually changed.
    pub fn apply_snapshot(&mut self, snapshot: PresenceSnapshot) -> bool {
        let next = PresenceView::from_snapshot(snapshot);
        if next == self.view {
            return false;
        }
        self.view = next;
        true
    }

    /// Returns true when there was anything to clear.
    pub fn clear(&mut self) -> bool {
        if self.view.is_empty() {
            return false;
        }
        self.view = PresenceView::default();
        true
    }

    pub fn view(&self) -> &PresenceView {
        &self.view
    }
}

#[cfg(test)]
#[path = "tests/presence_tests.rs"]
mod tests;
