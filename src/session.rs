//! Session façade
//!
//! Per-client view over the store: tracks the client's username and
//! current room and delegates everything stateful to an injected
//! `Arc<RoomStore>`. All boundary validation lives here — username
//! length, room-code format, non-empty bodies — so the store never has
//! to second-guess its inputs.

use std::sync::Arc;

use crate::error::AppError;
use crate::message::ChatMessage;
use crate::store::{RoomSnapshot, RoomStore};
use crate::types::{ClientId, RoomCode, Timestamp, CODE_LEN};

/// Maximum accepted username length, in characters
const MAX_USERNAME_LEN: usize = 20;

/// One client's view of the chat
///
/// Holds no room data of its own; the store is the single source of
/// truth and the session only remembers which room this client is in.
pub struct Session {
    /// Unique identifier for this client, used in logs
    pub id: ClientId,
    store: Arc<RoomStore>,
    username: Option<String>,
    room: Option<RoomCode>,
}

impl Session {
    /// Create a session over the shared store
    pub fn new(store: Arc<RoomStore>) -> Self {
        Self {
            id: ClientId::new(),
            store,
            username: None,
            room: None,
        }
    }

    /// The username, once set
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The current room's code, if the client is in one
    pub fn room_code(&self) -> Option<&RoomCode> {
        self.room.as_ref()
    }

    /// Set the username (1-20 characters)
    pub fn set_username(&mut self, username: &str) -> Result<(), AppError> {
        let len = username.chars().count();
        if len == 0 || len > MAX_USERNAME_LEN {
            return Err(AppError::InvalidUsername);
        }
        self.username = Some(username.to_string());
        Ok(())
    }

    /// Create a new room with a generated code and enter it
    pub fn create_room(&mut self) -> Result<RoomSnapshot, AppError> {
        let username = self.require_username()?.to_string();
        if self.room.is_some() {
            return Err(AppError::AlreadyInRoom);
        }
        let snapshot = self.store.create(&username);
        self.room = Some(snapshot.code.clone());
        Ok(snapshot)
    }

    /// Enter the room named by `code`, creating it if absent
    ///
    /// The code must be exactly 6 alphanumeric characters; lowercase
    /// input is accepted and normalized to uppercase.
    pub fn join_room(&mut self, code: &str) -> Result<RoomSnapshot, AppError> {
        let username = self.require_username()?.to_string();
        if self.room.is_some() {
            return Err(AppError::AlreadyInRoom);
        }
        let code = validate_code(code)?;
        let snapshot = self.store.create_or_join(code, &username);
        self.room = Some(snapshot.code.clone());
        Ok(snapshot)
    }

    /// Leave the current room
    pub fn leave_room(&mut self) -> Result<(), AppError> {
        let code = self.room.take().ok_or(AppError::NotInRoom)?;
        if let Some(username) = &self.username {
            self.store.leave(&code, username);
        }
        Ok(())
    }

    /// Send a message to the current room
    ///
    /// Returns the assigned timestamp, usable as the next poll watermark.
    /// If the room vanished underneath us (reaped after this username
    /// left through another session), the stale reference is dropped and
    /// `RoomNotFound` is reported.
    pub fn send(&mut self, body: &str) -> Result<Timestamp, AppError> {
        let username = self.require_username()?.to_string();
        let code = self.room.clone().ok_or(AppError::NotInRoom)?;
        if body.is_empty() {
            return Err(AppError::EmptyMessage);
        }
        match self.store.send(&code, &username, body.to_string()) {
            Some(timestamp) => Ok(timestamp),
            None => {
                self.room = None;
                Err(AppError::RoomNotFound(code.to_string()))
            }
        }
    }

    /// Messages in the current room newer than `since`
    pub fn poll(&self, since: Timestamp) -> Result<Vec<ChatMessage>, AppError> {
        let code = self.room.as_ref().ok_or(AppError::NotInRoom)?;
        Ok(self.store.messages_since(code, since))
    }

    /// Users currently present in the room, sorted
    pub fn users(&self) -> Result<Vec<String>, AppError> {
        let code = self.room.as_ref().ok_or(AppError::NotInRoom)?;
        let mut users: Vec<String> = self.store.users_in(code).into_iter().collect();
        users.sort();
        Ok(users)
    }

    /// Tear down on disconnect: leave the room so presence stays accurate
    pub fn disconnect(&mut self) {
        let _ = self.leave_room();
    }

    fn require_username(&self) -> Result<&str, AppError> {
        self.username.as_deref().ok_or(AppError::UsernameRequired)
    }
}

/// Check the 6-character alphanumeric format and normalize case
fn validate_code(code: &str) -> Result<RoomCode, AppError> {
    if code.chars().count() != CODE_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::InvalidCode(code.to_string()));
    }
    Ok(RoomCode::from_input(code))
}
