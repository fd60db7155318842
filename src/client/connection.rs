//! Client side of the WebSocket session

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::ws::protocol::{decode_server, encode, ClientMsg, Direction, ServerMsg};

use super::buffer::SharedSnapshotBuffer;
use super::input::InputTracker;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Failed to decode server message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Expected welcome, got {0}")]
    Handshake(String),

    #[error("Server closed the connection")]
    Closed,
}

/// An open session after the welcome exchange
pub struct Connection {
    pub player_id: String,
    pub sender: InputSender,
    pub receiver: SplitStream<WsStream>,
}

/// Connect and wait for the identity assignment
pub async fn connect(url: &str) -> Result<Connection, ClientError> {
    let (ws, _response) = connect_async(url).await?;
    let (sink, mut stream) = ws.split();

    let player_id = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => match decode_server(&text)? {
                ServerMsg::Welcome { player_id, message } => {
                    info!(player_id = %player_id, %message, "Welcome received");
                    break player_id;
                }
                other => return Err(ClientError::Handshake(format!("{other:?}"))),
            },
            Some(Ok(Message::Close(_))) | None => return Err(ClientError::Closed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
        }
    };

    Ok(Connection {
        sender: InputSender::new(player_id.clone(), sink),
        player_id,
        receiver: stream,
    })
}

/// Receive loop: state messages -> snapshot buffer.
///
/// Returns when the server closes the connection; a decode failure ends the
/// session with an error.
pub async fn run_receiver(
    mut stream: SplitStream<WsStream>,
    buffer: SharedSnapshotBuffer,
) -> Result<(), ClientError> {
    while let Some(result) = stream.next().await {
        match result? {
            Message::Text(text) => match decode_server(&text)? {
                ServerMsg::State(snapshot) => buffer.lock().push(snapshot),
                ServerMsg::Welcome { player_id, .. } => {
                    debug!(player_id = %player_id, "Ignoring repeated welcome");
                }
                ServerMsg::Error { message } => {
                    warn!(%message, "Server reported an error");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}

/// Sends direction changes for this client's mover
pub struct InputSender {
    player_id: String,
    sink: SplitSink<WsStream, Message>,
    tracker: InputTracker,
}

impl InputSender {
    pub fn new(player_id: String, sink: SplitSink<WsStream, Message>) -> Self {
        Self {
            player_id,
            sink,
            tracker: InputTracker::new(),
        }
    }

    /// Send `direction` if it differs from the last one sent.
    /// Returns whether a message went out.
    pub async fn send(&mut self, direction: Direction) -> Result<bool, ClientError> {
        let Some(direction) = self.tracker.update(direction) else {
            return Ok(false);
        };

        let msg = ClientMsg::Input {
            id: Some(self.player_id.clone()),
            direction,
        };
        self.sink.send(Message::Text(encode(&msg)?)).await?;
        debug!(direction = direction.as_str(), "Input sent");
        Ok(true)
    }

    pub async fn close(mut self) {
        let _ = self.sink.close().await;
    }
}
