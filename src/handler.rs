//! WebSocket connection handler
//!
//! Per-connection plumbing: WebSocket handshake, frame parsing, and
//! bidirectional bridging between the socket and the RelayServer actor.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::{ClientMessage, ErrorCode, ServerMessage};
use crate::server::ServerCommand;
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, registers the connection with the
/// actor, and runs the read/write tasks until either side closes.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let client_id = ClientId::new();
    info!("Client {} connected from {}", client_id, peer_addr);

    // Channel for server -> client messages
    let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(32);

    if cmd_tx
        .send(ServerCommand::Connect {
            client_id,
            sender: msg_tx.clone(),
        })
        .await
        .is_err()
    {
        error!("Failed to register client {} - server closed", client_id);
        return Err(AppError::ChannelSend);
    }

    // Handshake ack with the assigned connection id
    let connected_msg = ServerMessage::Connected {
        client_id: client_id.to_string(),
    };
    let json = serde_json::to_string(&connected_msg)?;
    ws_sender.send(Message::Text(json.into())).await?;

    let cmd_tx_read = cmd_tx.clone();

    // Read task: WebSocket frames -> ServerCommand
    let read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match parse_client_frame(client_id, &text) {
                    Ok(cmd) => {
                        if cmd_tx_read.send(cmd).await.is_err() {
                            debug!("Server closed, ending read task for {}", client_id);
                            break;
                        }
                    }
                    Err(err) => {
                        warn!("Invalid frame from {}", client_id);
                        let _ = msg_tx.send(err).await;
                    }
                },
                Ok(Message::Close(_)) => {
                    debug!("Client {} sent close frame", client_id);
                    break;
                }
                Ok(Message::Ping(_)) => {
                    // Pong is handled automatically by tungstenite
                    debug!("Ping from {}", client_id);
                }
                Ok(Message::Pong(_)) => {
                    debug!("Pong from {}", client_id);
                }
                Ok(_) => {
                    // Binary or other frame types - ignore
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", client_id, e);
                    break;
                }
            }
        }
        debug!("Read task ended for {}", client_id);
    });

    // Write task: ServerMessage -> WebSocket
    let write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    // Continue - don't break on serialization errors
                }
            }
        }
        debug!("Write task ended for client");

        let _ = ws_sender.close().await;
    });

    // Either task ending means the connection is done
    tokio::select! {
        _ = read_task => {
            debug!("Read task completed for {}", client_id);
        }
        _ = write_task => {
            debug!("Write task completed for {}", client_id);
        }
    }

    // Tell the actor so the room gets a leave notice
    let _ = cmd_tx.send(ServerCommand::Disconnect { client_id }).await;

    info!("Client {} disconnected", client_id);

    Ok(())
}

/// Parse a text frame into a command
///
/// Malformed input is turned into the `invalid_message` error event the
/// read task unicasts back to the sender.
fn parse_client_frame(client_id: ClientId, text: &str) -> Result<ServerCommand, ServerMessage> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(client_msg) => Ok(client_message_to_command(client_id, client_msg)),
        Err(e) => Err(ServerMessage::Error {
            code: ErrorCode::InvalidMessage,
            message: format!("Invalid message format: {}", e),
        }),
    }
}

/// Convert a ClientMessage to a ServerCommand
fn client_message_to_command(client_id: ClientId, msg: ClientMessage) -> ServerCommand {
    match msg {
        ClientMessage::CreateRoom { ttl_millis, username } => ServerCommand::CreateRoom {
            client_id,
            ttl_millis,
            username,
        },
        ClientMessage::JoinRoom { room_code, username } => ServerCommand::JoinRoom {
            client_id,
            room_code,
            username,
        },
        ClientMessage::SendMessage { room_code, payload } => ServerCommand::SendMessage {
            client_id,
            room_code,
            payload,
        },
    }
}
