//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake, message
//! parsing, and driving a per-client `Session` against the shared store.
//! All reads are client-initiated polls, so replies go out inline on the
//! same loop — there is no server-push path and no fan-out channel.

use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::{ClientMessage, ErrorCode, ServerMessage};
use crate::session::Session;
use crate::store::RoomStore;

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, then serves the request/reply loop
/// until the client disconnects. The session leaves its room however the
/// connection ends — clean close, read error, or a reply write hitting a
/// dead socket — so presence stays accurate and empty rooms can expire.
pub async fn handle_connection(stream: TcpStream, store: Arc<RoomStore>) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let mut session = Session::new(store);
    info!("Client {} connected from {}", session.id, peer_addr);

    let result = serve(&mut session, &mut ws_sender, &mut ws_receiver).await;

    let _ = ws_sender.close().await;
    // Unconditional: serve() may have bailed out mid-write
    session.disconnect();
    info!("Client {} disconnected", session.id);

    result
}

/// The request/reply loop
///
/// Split out of `handle_connection` so transport failures can use `?`
/// freely while room cleanup still runs unconditionally in the caller.
async fn serve(
    session: &mut Session,
    ws_sender: &mut SplitSink<WebSocketStream<TcpStream>, Message>,
    ws_receiver: &mut SplitStream<WebSocketStream<TcpStream>>,
) -> Result<(), AppError> {
    // Send connection success message
    let connected_msg = ServerMessage::Connected {
        client_id: session.id.to_string(),
    };
    let json = serde_json::to_string(&connected_msg)?;
    ws_sender.send(Message::Text(json.into())).await?;

    while let Some(msg_result) = ws_receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                let reply = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => apply(session, client_msg),
                    Err(e) => {
                        warn!("Invalid JSON from {}: {}", session.id, e);
                        ServerMessage::Error {
                            code: ErrorCode::InvalidMessage,
                            message: format!("Invalid message format: {}", e),
                        }
                    }
                };
                let json = serde_json::to_string(&reply)?;
                ws_sender.send(Message::Text(json.into())).await?;
            }
            Ok(Message::Close(_)) => {
                debug!("Client {} sent close frame", session.id);
                break;
            }
            Ok(Message::Ping(_)) => {
                // Pong is handled automatically by tungstenite
                debug!("Ping from {}", session.id);
            }
            Ok(Message::Pong(_)) => {
                debug!("Pong from {}", session.id);
            }
            Ok(_) => {
                // Binary or other message types - ignore
            }
            Err(e) => {
                error!("WebSocket error for {}: {}", session.id, e);
                break;
            }
        }
    }

    Ok(())
}

/// Apply one client message to the session and build the reply
fn apply(session: &mut Session, msg: ClientMessage) -> ServerMessage {
    match msg {
        ClientMessage::SetUsername { username } => match session.set_username(&username) {
            Ok(()) => {
                info!("Client {} set username to '{}'", session.id, username);
                ServerMessage::UsernameSet { username }
            }
            Err(e) => e.into(),
        },
        ClientMessage::CreateRoom => match session.create_room() {
            Ok(snapshot) => ServerMessage::RoomJoined {
                room_code: snapshot.code.to_string(),
                users: snapshot.users,
                messages: snapshot.messages,
            },
            Err(e) => e.into(),
        },
        ClientMessage::JoinRoom { room_code } => match session.join_room(&room_code) {
            Ok(snapshot) => ServerMessage::RoomJoined {
                room_code: snapshot.code.to_string(),
                users: snapshot.users,
                messages: snapshot.messages,
            },
            Err(e) => e.into(),
        },
        ClientMessage::Send { body } => match session.send(&body) {
            Ok(timestamp) => ServerMessage::Sent { timestamp },
            Err(e) => e.into(),
        },
        ClientMessage::Poll { since } => match session.poll(since) {
            Ok(messages) => ServerMessage::Messages { messages },
            Err(e) => e.into(),
        },
        ClientMessage::ListUsers => match session.users() {
            Ok(users) => ServerMessage::Users { users },
            Err(e) => e.into(),
        },
        ClientMessage::LeaveRoom => match session.leave_room() {
            Ok(()) => ServerMessage::RoomLeft,
            Err(e) => e.into(),
        },
    }
}
