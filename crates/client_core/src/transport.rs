use std::time::Duration;

use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::{
    net::TcpStream,
    sync::mpsc,
    task::JoinHandle,
    time::timeout,
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::session::{Generation, SessionInput};

const CLOSE_HANDSHAKE_GRACE: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// The one live websocket. Only the event loop holds it.
pub(crate) struct TransportHandle {
    generation: Generation,
    outbound: mpsc::UnboundedSender<Outbound>,
    task: JoinHandle<()>,
}

impl TransportHandle {
    pub(crate) fn spawn(
        generation: Generation,
        url: String,
        inputs: mpsc::Sender<SessionInput>,
    ) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(generation, url, outbound_rx, inputs));
        Self {
            generation,
            outbound,
            task,
        }
    }

    pub(crate) fn generation(&self) -> Generation {
        self.generation
    }

    pub(crate) fn send_text(&self, payload: String) -> bool {
        self.outbound.send(Outbound::Text(payload)).is_ok()
    }

    pub(crate) fn close(&self) {
        let _ = self.outbound.send(Outbound::Close);
    }

    pub(crate) fn abort(&self) {
        self.task.abort();
    }
}

async fn post(inputs: &mpsc::Sender<SessionInput>, input: SessionInput) -> bool {
    inputs.send(input).await.is_ok()
}

/// Text frames pass through; binary frames are read as lossy UTF-8.
fn inbound_text(message: Message) -> Option<String> {
    match message {
        Message::Text(text) => Some(text),
        Message::Binary(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        _ => None,
    }
}

async fn run(
    generation: Generation,
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    inputs: mpsc::Sender<SessionInput>,
) {
    let connected = tokio::select! {
        result = connect_async(url.as_str()) => result,
        _ = wait_for_close(&mut outbound) => {
            info!(generation, "transport: open cancelled before completion");
            post(&inputs, SessionInput::TransportClosed { generation }).await;
            return;
        }
    };

    let stream = match connected {
        Ok((stream, _response)) => stream,
        Err(err) => {
            warn!(generation, %url, error = %err, "transport: failed to open websocket");
            post(
                &inputs,
                SessionInput::TransportError {
                    generation,
                    detail: err.to_string(),
                },
            )
            .await;
            post(&inputs, SessionInput::TransportClosed { generation }).await;
            return;
        }
    };

    if !post(&inputs, SessionInput::TransportOpened { generation }).await {
        return;
    }

    let (mut writer, mut reader) = stream.split();
    loop {
        tokio::select! {
            incoming = reader.next() => match incoming {
                Some(Ok(Message::Close(frame))) => {
                    debug!(generation, ?frame, "transport: peer closed websocket");
                    break;
                }
                Some(Ok(message)) => {
                    if let Some(raw) = inbound_text(message) {
                        if !post(&inputs, SessionInput::FrameReceived { generation, raw }).await {
                            return;
                        }
                    }
                }
                Some(Err(err)) => {
                    post(
                        &inputs,
                        SessionInput::TransportError {
                            generation,
                            detail: err.to_string(),
                        },
                    )
                    .await;
                    break;
                }
                None => break,
            },
            command = outbound.recv() => match command {
                Some(Outbound::Text(payload)) => {
                    if let Err(err) = writer.send(Message::Text(payload)).await {
                        post(
                            &inputs,
                            SessionInput::TransportError {
                                generation,
                                detail: err.to_string(),
                            },
                        )
                        .await;
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    close_gracefully(generation, &mut writer, &mut reader, &inputs).await;
                    break;
                }
            },
        }
    }

    post(&inputs, SessionInput::TransportClosed { generation }).await;
}

/// Frames queued before the socket opens are dropped; the session only sends while connected.
async fn wait_for_close(outbound: &mut mpsc::UnboundedReceiver<Outbound>) {
    while let Some(command) = outbound.recv().await {
        if matches!(command, Outbound::Close) {
            return;
        }
    }
}

async fn close_gracefully(
    generation: Generation,
    writer: &mut WsWriter,
    reader: &mut WsReader,
    inputs: &mpsc::Sender<SessionInput>,
) {
    if let Err(err) = writer.send(Message::Close(None)).await {
        debug!(generation, error = %err, "transport: close frame not sent");
        return;
    }

    // Frames already in flight are still delivered until the peer acknowledges.
    let drained = timeout(CLOSE_HANDSHAKE_GRACE, async {
        while let Some(incoming) = reader.next().await {
            match incoming {
                Ok(Message::Close(_)) | Err(_) => return,
                Ok(message) => {
                    if let Some(raw) = inbound_text(message) {
                        if !post(inputs, SessionInput::FrameReceived { generation, raw }).await {
                            return;
                        }
                    }
                }
            }
        }
    })
    .await;

    if drained.is_err() {
        warn!(generation, "transport: close handshake timed out");
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
