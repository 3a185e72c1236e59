//! The single consumer loop and the public [`ChatClient`] handle.
//!
//! Commands from the host and completions from I/O tasks (transport, poll
//! timer, snapshot fetch, liveness probe) are all posted to one queue. The
//! loop applies them to the [`Session`] one at a time and then performs the
//! returned actions, so no two inputs ever interleave mid-mutation.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, mpsc, oneshot, RwLock},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{
    backend::{BackendApi, HttpBackend},
    config::{BackendUrl, ClientConfig, DEFAULT_POLL_INTERVAL},
    error::ClientError,
    liveness::LivenessProbe,
    session::{ClientEvent, Generation, Session, SessionAction, SessionInput, SessionView},
    transport::TransportHandle,
};

/// Dropping the handle stops the loop, as does [`ChatClient::shutdown`].
pub struct ChatClient {
    inputs: mpsc::Sender<SessionInput>,
    session: Arc<RwLock<Session>>,
    events: broadcast::Sender<ClientEvent>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ChatClient {
    /// Starts the loop on the current tokio runtime and fires the liveness probe.
    pub fn start(config: ClientConfig) -> Result<Self, ClientError> {
        let backend_url = BackendUrl::parse(&config.backend_url)?;
        let backend = Arc::new(HttpBackend::new(backend_url.clone()));
        Ok(Self::spawn(&config, backend_url, backend))
    }

    pub fn start_with_backend(
        config: ClientConfig,
        backend: Arc<dyn BackendApi>,
    ) -> Result<Self, ClientError> {
        let backend_url = BackendUrl::parse(&config.backend_url)?;
        Ok(Self::spawn(&config, backend_url, backend))
    }

    fn spawn(config: &ClientConfig, backend_url: BackendUrl, backend: Arc<dyn BackendApi>) -> Self {
        let buffer = config.event_buffer.max(1);
        let (inputs_tx, inputs_rx) = mpsc::channel(buffer);
        let (events, _) = broadcast::channel(buffer);
        let (stop, stop_rx) = oneshot::channel();
        let session = Arc::new(RwLock::new(Session::new(backend_url)));
        let poll_interval = if config.poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            config.poll_interval
        };

        let event_loop = EventLoop {
            session: Arc::clone(&session),
            backend,
            inputs_tx: inputs_tx.clone(),
            inputs_rx,
            stop: stop_rx,
            events: events.clone(),
            transport: None,
            poller: None,
            poll_interval,
        };
        let task = tokio::spawn(event_loop.run());

        Self {
            inputs: inputs_tx,
            session,
            events,
            stop,
            task,
        }
    }

    pub async fn connect(&self, display_name: &str) -> Result<(), ClientError> {
        self.post(SessionInput::Connect {
            display_name: display_name.to_string(),
        })
        .await
    }

    /// Requests closure; the state changes only once the transport reports it closed.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.post(SessionInput::Disconnect).await
    }

    /// Silently does nothing unless connected and `content` is non-blank.
    pub async fn send(&self, content: &str) -> Result<(), ClientError> {
        self.post(SessionInput::Send {
            content: content.to_string(),
        })
        .await
    }

    pub async fn view(&self) -> SessionView {
        self.session.read().await.view()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        let _ = self.task.await;
    }

    async fn post(&self, input: SessionInput) -> Result<(), ClientError> {
        self.inputs
            .send(input)
            .await
            .map_err(|_| ClientError::Closed)
    }
}

struct EventLoop {
    session: Arc<RwLock<Session>>,
    backend: Arc<dyn BackendApi>,
    inputs_tx: mpsc::Sender<SessionInput>,
    inputs_rx: mpsc::Receiver<SessionInput>,
    /// Resolves on an explicit shutdown or when the client handle is dropped.
    stop: oneshot::Receiver<()>,
    events: broadcast::Sender<ClientEvent>,
    transport: Option<TransportHandle>,
    poller: Option<JoinHandle<()>>,
    poll_interval: Duration,
}

impl EventLoop {
    async fn run(mut self) {
        self.spawn_liveness_probe();

        loop {
            // Spawned tasks keep senders alive; only `stop` ends the loop.
            let input = tokio::select! {
                biased;
                _ = &mut self.stop => break,
                input = self.inputs_rx.recv() => match input {
                    Some(input) => input,
                    None => break,
                },
            };
            let actions = self.session.write().await.handle(input);
            for action in actions {
                self.execute(action);
            }
        }

        info!("client: event loop stopped");
        self.stop_polling();
        if let Some(transport) = self.transport.take() {
            transport.abort();
        }
    }

    fn execute(&mut self, action: SessionAction) {
        match action {
            SessionAction::OpenTransport { generation, url } => {
                if let Some(stale) = self.transport.take() {
                    stale.abort();
                }
                self.transport = Some(TransportHandle::spawn(
                    generation,
                    url,
                    self.inputs_tx.clone(),
                ));
            }
            SessionAction::SendFrame {
                generation,
                payload,
            } => match self.current_transport(generation) {
                Some(transport) => {
                    if !transport.send_text(payload) {
                        warn!(generation, "client: transport task gone, outbound frame dropped");
                    }
                }
                None => debug!(generation, "client: no transport for outbound frame"),
            },
            SessionAction::CloseTransport { generation } => {
                if let Some(transport) = self.current_transport(generation) {
                    transport.close();
                }
            }
            SessionAction::ReleaseTransport { generation } => {
                if self.current_transport(generation).is_some() {
                    self.transport = None;
                }
            }
            SessionAction::StartPolling { generation } => {
                self.stop_polling();
                self.poller = Some(self.spawn_poll_timer(generation));
            }
            SessionAction::StopPolling => self.stop_polling(),
            SessionAction::FetchPresence { generation } => self.spawn_presence_fetch(generation),
            SessionAction::Emit(event) => {
                let _ = self.events.send(event);
            }
        }
    }

    fn current_transport(&self, generation: Generation) -> Option<&TransportHandle> {
        self.transport
            .as_ref()
            .filter(|transport| transport.generation() == generation)
    }

    fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }

    fn spawn_poll_timer(&self, generation: Generation) -> JoinHandle<()> {
        let inputs = self.inputs_tx.clone();
        let period = self.poll_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if inputs.send(SessionInput::PollTick { generation }).await.is_err() {
                    break;
                }
            }
        })
    }

    /// Not cancelled on disconnect; the session discards results that arrive late
    /// and issues no new fetch until this one reports back.
    fn spawn_presence_fetch(&self, generation: Generation) {
        let backend = Arc::clone(&self.backend);
        let inputs = self.inputs_tx.clone();
        tokio::spawn(async move {
            let result = backend
                .fetch_presence()
                .await
                .map_err(|err| format!("{err:#}"));
            let _ = inputs
                .send(SessionInput::PollCompleted { generation, result })
                .await;
        });
    }

    fn spawn_liveness_probe(&self) {
        let backend = Arc::clone(&self.backend);
        let inputs = self.inputs_tx.clone();
        tokio::spawn(async move {
            let status = LivenessProbe::check(backend.as_ref()).await;
            let _ = inputs
                .send(SessionInput::LivenessChecked(status))
                .await;
        });
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
