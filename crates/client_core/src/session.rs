//! Connection lifecycle state machine over the owned session aggregate.
//!
//! [`Session::handle`] is a pure reducer: it consumes one [`SessionInput`]
//! (a user command or an I/O completion posted by the runtime), mutates the
//! session, and returns the [`SessionAction`]s the runtime must perform. It
//! never touches the network, which keeps every transition testable.
//!
//! Each connection attempt gets a new generation. Inputs tagged with an older
//! generation belong to a transport or poll that no longer matters and are
//! dropped, so a late snapshot cannot repopulate presence after disconnect.

use shared::{
    domain::{ChatEvent, ChatEventKind, ParticipantId, PresenceEntry},
    protocol::PresenceSnapshot,
};
use tracing::{debug, info, warn};

use crate::{
    codec,
    config::{normalize_display_name, BackendUrl},
    liveness::LivenessStatus,
    presence::PresenceReconciler,
    timeline::ChatTimeline,
};

pub const CONNECTED_NOTICE: &str = "Connected";
pub const DISCONNECTED_NOTICE: &str = "Disconnected";
pub const TRANSPORT_ERROR_NOTICE: &str = "WebSocket error";

pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        matches!(
            (self, next),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connected)
                | (Self::Connecting, Self::Disconnected)
                | (Self::Connected, Self::Disconnected)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Connect {
        display_name: String,
    },
    Disconnect,
    Send {
        content: String,
    },
    TransportOpened {
        generation: Generation,
    },
    FrameReceived {
        generation: Generation,
        raw: String,
    },
    TransportError {
        generation: Generation,
        detail: String,
    },
    TransportClosed {
        generation: Generation,
    },
    PollTick {
        generation: Generation,
    },
    PollCompleted {
        generation: Generation,
        result: Result<PresenceSnapshot, String>,
    },
    LivenessChecked(LivenessStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    OpenTransport { generation: Generation, url: String },
    SendFrame { generation: Generation, payload: String },
    CloseTransport { generation: Generation },
    ReleaseTransport { generation: Generation },
    StartPolling { generation: Generation },
    StopPolling,
    FetchPresence { generation: Generation },
    Emit(ClientEvent),
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    StateChanged(ConnectionState),
    TimelineAppended(ChatEvent),
    PresenceUpdated(Vec<PresenceEntry>),
    SelfIdentified(ParticipantId),
    LivenessChanged(LivenessStatus),
}

/// Read-only projection of the session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub backend_url: String,
    pub state: ConnectionState,
    pub display_name: Option<String>,
    pub self_id: Option<ParticipantId>,
    pub timeline: Vec<ChatEvent>,
    pub presence: Vec<PresenceEntry>,
    pub liveness: LivenessStatus,
}

impl SessionView {
    pub fn is_mine(&self, event: &ChatEvent) -> bool {
        ChatTimeline::is_mine(event, self.self_id.as_ref())
    }

    pub fn can_connect(&self) -> bool {
        self.state == ConnectionState::Disconnected
    }

    pub fn can_disconnect(&self) -> bool {
        self.state != ConnectionState::Disconnected
    }

    pub fn can_send(&self, draft: &str) -> bool {
        self.state == ConnectionState::Connected && !draft.trim().is_empty()
    }
}

pub struct Session {
    backend: BackendUrl,
    state: ConnectionState,
    generation: Generation,
    display_name: Option<String>,
    self_id: Option<ParticipantId>,
    timeline: ChatTimeline,
    presence: PresenceReconciler,
    liveness: LivenessStatus,
    /// At most one snapshot request per connection is outstanding.
    poll_in_flight: bool,
}

impl Session {
    pub fn new(backend: BackendUrl) -> Self {
        Self {
            backend,
            state: ConnectionState::Disconnected,
            generation: 0,
            display_name: None,
            self_id: None,
            timeline: ChatTimeline::new(),
            presence: PresenceReconciler::new(),
            liveness: LivenessStatus::Pending,
            poll_in_flight: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn self_id(&self) -> Option<&ParticipantId> {
        self.self_id.as_ref()
    }

    pub fn timeline(&self) -> &ChatTimeline {
        &self.timeline
    }

    pub fn presence(&self) -> &PresenceReconciler {
        &self.presence
    }

    pub fn liveness(&self) -> LivenessStatus {
        self.liveness
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            backend_url: self.backend.as_str().to_string(),
            state: self.state,
            display_name: self.display_name.clone(),
            self_id: self.self_id.clone(),
            timeline: self.timeline.events().to_vec(),
            presence: self.presence.view().entries().to_vec(),
            liveness: self.liveness,
        }
    }

    pub fn handle(&mut self, input: SessionInput) -> Vec<SessionAction> {
        match input {
            SessionInput::Connect { display_name } => self.connect(&display_name),
            SessionInput::Disconnect => self.disconnect(),
            SessionInput::Send { content } => self.send(&content),
            SessionInput::TransportOpened { generation } => self.on_open(generation),
            SessionInput::FrameReceived { generation, raw } => self.on_frame(generation, &raw),
            SessionInput::TransportError { generation, detail } => {
                self.on_transport_error(generation, &detail)
            }
            SessionInput::TransportClosed { generation } => self.on_close(generation),
            SessionInput::PollTick { generation } => self.on_poll_tick(generation),
            SessionInput::PollCompleted { generation, result } => {
                self.on_poll_completed(generation, result)
            }
            SessionInput::LivenessChecked(status) => self.on_liveness(status),
        }
    }

    fn connect(&mut self, requested_name: &str) -> Vec<SessionAction> {
        if self.state != ConnectionState::Disconnected {
            debug!(state = ?self.state, "session: connect ignored, connection already active");
            return Vec::new();
        }

        let display_name = normalize_display_name(requested_name);
        self.generation += 1;
        self.self_id = None;
        self.poll_in_flight = false;
        self.display_name = Some(display_name.clone());

        let url = self.backend.realtime_url(&display_name);
        info!(generation = self.generation, %url, "session: opening realtime connection");

        let mut actions = Vec::new();
        self.transition(ConnectionState::Connecting, &mut actions);
        actions.push(SessionAction::OpenTransport {
            generation: self.generation,
            url,
        });
        actions
    }

    fn disconnect(&mut self) -> Vec<SessionAction> {
        if self.state == ConnectionState::Disconnected {
            debug!("session: disconnect ignored, no active connection");
            return Vec::new();
        }
        info!(generation = self.generation, "session: closing realtime connection");
        vec![SessionAction::CloseTransport {
            generation: self.generation,
        }]
    }

    fn send(&self, content: &str) -> Vec<SessionAction> {
        let trimmed = content.trim();
        if self.state != ConnectionState::Connected || trimmed.is_empty() {
            debug!(state = ?self.state, empty = trimmed.is_empty(), "session: send skipped");
            return Vec::new();
        }
        let Some(display_name) = self.display_name.as_deref() else {
            return Vec::new();
        };

        match codec::encode_chat(trimmed, display_name) {
            Ok(payload) => vec![SessionAction::SendFrame {
                generation: self.generation,
                payload,
            }],
            Err(err) => {
                warn!(error = %err, "session: failed to encode outbound chat frame");
                Vec::new()
            }
        }
    }

    fn on_open(&mut self, generation: Generation) -> Vec<SessionAction> {
        if !self.is_current(generation) || self.state != ConnectionState::Connecting {
            debug!(generation, current = self.generation, "session: ignoring stale open");
            return Vec::new();
        }

        info!(generation, "session: realtime connection open");
        let mut actions = Vec::new();
        self.transition(ConnectionState::Connected, &mut actions);
        self.append(ChatEvent::system(CONNECTED_NOTICE), &mut actions);
        actions.push(SessionAction::StartPolling { generation });
        actions
    }

    fn on_frame(&mut self, generation: Generation, raw: &str) -> Vec<SessionAction> {
        if !self.is_current(generation) {
            debug!(generation, current = self.generation, "session: dropping frame from stale transport");
            return Vec::new();
        }

        let event = codec::decode(raw);
        let mut actions = Vec::new();

        if event.kind == ChatEventKind::Welcome {
            if let Some(assigned) = &event.actor_id {
                self.assign_self_id(assigned, &mut actions);
            }
        }
        if event.kind.is_presence_signal() {
            debug!(kind = %event.kind, actor = %event.actor_name, "session: presence signal recorded in timeline only");
        }

        self.append(event, &mut actions);
        actions
    }

    fn assign_self_id(&mut self, assigned: &ParticipantId, actions: &mut Vec<SessionAction>) {
        match &self.self_id {
            None => {
                info!(self_id = %assigned, "session: identity assigned by backend");
                self.self_id = Some(assigned.clone());
                actions.push(SessionAction::Emit(ClientEvent::SelfIdentified(
                    assigned.clone(),
                )));
            }
            Some(current) if current == assigned => {}
            Some(current) => {
                warn!(
                    self_id = %current,
                    rejected = %assigned,
                    "session: ignoring welcome with a different id on the same connection"
                );
            }
        }
    }

    fn on_transport_error(&mut self, generation: Generation, detail: &str) -> Vec<SessionAction> {
        if !self.is_current(generation) {
            return Vec::new();
        }
        warn!(generation, detail = %detail, "session: transport error");
        let mut actions = Vec::new();
        self.append(ChatEvent::error(TRANSPORT_ERROR_NOTICE), &mut actions);
        actions
    }

    fn on_close(&mut self, generation: Generation) -> Vec<SessionAction> {
        if !self.is_current(generation) {
            debug!(generation, current = self.generation, "session: ignoring close of stale transport");
            return Vec::new();
        }

        info!(generation, "session: realtime connection closed");
        let mut actions = vec![
            SessionAction::StopPolling,
            SessionAction::ReleaseTransport { generation },
        ];
        self.transition(ConnectionState::Disconnected, &mut actions);
        if self.presence.clear() {
            actions.push(SessionAction::Emit(ClientEvent::PresenceUpdated(Vec::new())));
        }
        self.append(ChatEvent::system(DISCONNECTED_NOTICE), &mut actions);
        actions
    }

    fn on_poll_tick(&mut self, generation: Generation) -> Vec<SessionAction> {
        if !self.is_current(generation) || self.state != ConnectionState::Connected {
            return Vec::new();
        }
        if self.poll_in_flight {
            debug!(generation, "session: previous snapshot still pending, skipping tick");
            return Vec::new();
        }
        self.poll_in_flight = true;
        vec![SessionAction::FetchPresence { generation }]
    }

    fn on_poll_completed(
        &mut self,
        generation: Generation,
        result: Result<PresenceSnapshot, String>,
    ) -> Vec<SessionAction> {
        if !self.is_current(generation) || self.state != ConnectionState::Connected {
            warn!(generation, current = self.generation, state = ?self.state, "session: discarding stale presence snapshot");
            return Vec::new();
        }
        self.poll_in_flight = false;

        match result {
            Ok(snapshot) => {
                if self.presence.apply_snapshot(snapshot) {
                    vec![SessionAction::Emit(ClientEvent::PresenceUpdated(
                        self.presence.view().entries().to_vec(),
                    ))]
                } else {
                    Vec::new()
                }
            }
            Err(detail) => {
                debug!(generation, detail = %detail, "session: presence poll failed, keeping last known view");
                Vec::new()
            }
        }
    }

    fn on_liveness(&mut self, status: LivenessStatus) -> Vec<SessionAction> {
        self.liveness = status;
        vec![SessionAction::Emit(ClientEvent::LivenessChanged(status))]
    }

    fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation && self.state != ConnectionState::Disconnected
    }

    fn transition(&mut self, next: ConnectionState, actions: &mut Vec<SessionAction>) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        self.state = next;
        actions.push(SessionAction::Emit(ClientEvent::StateChanged(next)));
    }

    fn append(&mut self, event: ChatEvent, actions: &mut Vec<SessionAction>) {
        actions.push(SessionAction::Emit(ClientEvent::TimelineAppended(
            event.clone(),
        )));
        self.timeline.append(event);
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
