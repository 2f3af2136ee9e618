//! Message entity and wire protocol definitions
//!
//! `ChatMessage` is the stored message entity. The rest is the JSON-based
//! bidirectional protocol using Serde's tagged enum for type-safe
//! serialization/deserialization. Reads are poll-driven: the client sends
//! its last-seen timestamp as a watermark and receives only newer messages.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::Timestamp;

/// A single stored chat message
///
/// The timestamp is assigned by the store at append time and is
/// non-decreasing within a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author's username
    pub username: String,
    /// Message text
    pub body: String,
    /// Store-assigned timestamp
    pub timestamp: Timestamp,
}

/// Client → Server message
///
/// All messages from client to server. Uses tagged enum with snake_case naming.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Set username (required before room operations)
    SetUsername { username: String },
    /// Create a new room with a generated code
    CreateRoom,
    /// Join an existing room by code (creates it if absent)
    JoinRoom { room_code: String },
    /// Send a chat message to the current room
    Send { body: String },
    /// Fetch messages newer than the given watermark
    Poll { since: Timestamp },
    /// Fetch the current room's user list
    ListUsers,
    /// Leave the current room
    LeaveRoom,
}

/// Server → Client message
///
/// All messages from server to client. Uses tagged enum with snake_case naming.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection successful, client ID issued
    Connected { client_id: String },
    /// Username set successfully
    UsernameSet { username: String },
    /// Room entered (created or joined); snapshot for initial render
    RoomJoined {
        room_code: String,
        users: Vec<String>,
        messages: Vec<ChatMessage>,
    },
    /// Message accepted; echoes the assigned timestamp for use as the
    /// next poll watermark
    Sent { timestamp: Timestamp },
    /// Messages newer than the polled watermark, oldest first
    Messages { messages: Vec<ChatMessage> },
    /// Current user list of the room
    Users { users: Vec<String> },
    /// Left the room successfully
    RoomLeft,
    /// Error occurred
    Error { code: ErrorCode, message: String },
}

/// Error codes for ServerMessage::Error
///
/// Represents different error scenarios that can be communicated to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Attempted action without setting username
    UsernameRequired,
    /// Non-existent room code
    RoomNotFound,
    /// Room code failed the 6-character alphanumeric check
    InvalidCode,
    /// Username empty or too long
    InvalidUsername,
    /// Empty message body
    EmptyMessage,
    /// Attempted room action without joining a room
    NotInRoom,
    /// Already in a room
    AlreadyInRoom,
    /// Invalid message format
    InvalidMessage,
}

/// Convert AppError to ServerMessage for client notification
impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        let (code, message) = match &err {
            AppError::UsernameRequired => {
                (ErrorCode::UsernameRequired, "Username is required".to_string())
            }
            AppError::RoomNotFound(room_code) => {
                (ErrorCode::RoomNotFound, format!("Room '{}' not found", room_code))
            }
            AppError::InvalidCode(code) => (
                ErrorCode::InvalidCode,
                format!("'{}' is not a valid 6-character room code", code),
            ),
            AppError::InvalidUsername => (
                ErrorCode::InvalidUsername,
                "Username must be 1-20 characters".to_string(),
            ),
            AppError::EmptyMessage => {
                (ErrorCode::EmptyMessage, "Message body is empty".to_string())
            }
            AppError::NotInRoom => {
                (ErrorCode::NotInRoom, "You are not in a room".to_string())
            }
            AppError::AlreadyInRoom => {
                (ErrorCode::AlreadyInRoom, "You are already in a room".to_string())
            }
            AppError::Json(e) => {
                (ErrorCode::InvalidMessage, format!("Invalid message format: {}", e))
            }
            // Fatal errors are not typically converted (connection closes)
            _ => {
                (ErrorCode::InvalidMessage, "Internal error".to_string())
            }
        };
        ServerMessage::Error { code, message }
    }
}
