//! Error types for the chat-room store
//!
//! Defines application-level errors raised at the session boundary and
//! the connection handler. Uses thiserror for ergonomic error definitions.
//!
//! The store itself has no error type: operations on an absent room yield
//! empty or false-shaped results, never a fault.

use thiserror::Error;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// business errors (send error message to client).
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Room not found with the given code
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Room code is not 6 alphanumeric characters
    #[error("Invalid room code: {0}")]
    InvalidCode(String),

    /// Username is empty or longer than 20 characters
    #[error("Invalid username")]
    InvalidUsername,

    /// Message body is empty
    #[error("Empty message")]
    EmptyMessage,

    /// Username is required but not set
    #[error("Username required")]
    UsernameRequired,

    /// Client is not in any room
    #[error("Not in room")]
    NotInRoom,

    /// Client is already in a room
    #[error("Already in room")]
    AlreadyInRoom,
}
