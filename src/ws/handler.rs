//! WebSocket upgrade handler and per-peer session

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::game::session::Outbound;
use crate::net::Delayed;
use crate::ws::protocol::{decode_client, ClientMsg, Direction};

/// Outbound messages a slow peer may fall behind by before snapshots drop
const OUTBOUND_QUEUE: usize = 64;
/// Inbound commands waiting out the injected latency
const COMMAND_QUEUE: usize = 64;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (ws_sink, ws_stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<Outbound>(OUTBOUND_QUEUE);

    let player_id = match state.connect_peer(outbound_tx) {
        Ok(id) => id,
        Err(e) => {
            error!(error = %e, "Failed to admit peer");
            return;
        }
    };

    let mut writer = tokio::spawn(run_writer(player_id.clone(), ws_sink, outbound_rx));

    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
    let applier = tokio::spawn(run_command_applier(
        state.clone(),
        player_id.clone(),
        command_rx,
    ));

    // Either side ending closes the session
    tokio::select! {
        _ = run_reader(&state, &player_id, ws_stream, command_tx) => {}
        _ = &mut writer => {
            debug!(player_id = %player_id, "Writer finished first");
        }
    }

    state.disconnect_peer(&player_id);
    applier.abort();
    writer.abort();

    info!(player_id = %player_id, "WebSocket connection closed");
}

/// Reader loop: WebSocket -> command queue
async fn run_reader(
    state: &AppState,
    player_id: &str,
    mut ws_stream: SplitStream<WebSocket>,
    command_tx: mpsc::Sender<Delayed<Direction>>,
) {
    let latency = state.broadcaster.latency();

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match decode_client(&text) {
                Ok(ClientMsg::Input { id, direction }) => {
                    if let Some(claimed) = id.as_deref().filter(|id| *id != player_id) {
                        debug!(player_id = %player_id, %claimed, "Input carries foreign id");
                    }
                    if command_tx
                        .send(Delayed::after(latency, direction))
                        .await
                        .is_err()
                    {
                        debug!(player_id = %player_id, "Command queue closed");
                        break;
                    }
                }
                Ok(ClientMsg::Unknown) => {
                    debug!(player_id = %player_id, "Ignoring unknown message type");
                }
                Err(e) => {
                    warn!(player_id = %player_id, error = %e, "Undecodable message, closing");
                    break;
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Binary message on text protocol, closing");
                break;
            }
            Ok(Message::Ping(_)) => {
                debug!(player_id = %player_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(player_id = %player_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                debug!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }
}

/// Apply queued commands once their latency has elapsed
async fn run_command_applier(
    state: AppState,
    player_id: String,
    mut command_rx: mpsc::Receiver<Delayed<Direction>>,
) {
    while let Some(command) = command_rx.recv().await {
        let direction = command.ready().await;
        if !state.apply_command(&player_id, direction) {
            break;
        }
    }
}

/// Writer loop: outbound queue -> WebSocket
async fn run_writer(
    player_id: String,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<Outbound>,
) {
    while let Some(outbound) = outbound_rx.recv().await {
        let text = outbound.ready().await;
        if let Err(e) = ws_sink.send(Message::Text(text.to_string())).await {
            debug!(player_id = %player_id, error = %e, "WebSocket send failed");
            break;
        }
    }
    let _ = ws_sink.close().await;
}
