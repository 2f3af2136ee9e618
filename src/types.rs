//! Basic type definitions for the chat-room store
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: UUID-based unique connection identifier
//! - `RoomCode`: 6-character uppercase alphanumeric room code
//! - `Timestamp`: milliseconds since the Unix epoch

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe identification of a connected client.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Characters a room code is drawn from (36 symbols)
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of every room code
pub const CODE_LEN: usize = 6;

/// Room code (6-character uppercase alphanumeric)
///
/// Used to identify and join chat rooms.
/// Generated randomly or parsed from user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Generate a new random 6-character room code
    ///
    /// Each character is drawn uniformly from `A-Z0-9`. Uniqueness is not
    /// guaranteed here; the store checks for collisions on insert.
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let code: String = (0..CODE_LEN)
            .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
            .collect();
        Self(code)
    }

    /// Create a RoomCode from user input (converts to uppercase)
    ///
    /// Codes are case-normalized before any lookup or creation, so "abc123"
    /// and "ABC123" name the same room. Format validation (exact length,
    /// alphanumeric) is the session boundary's job, not this constructor's.
    pub fn from_input(code: &str) -> Self {
        Self(code.to_uppercase())
    }

    /// Borrow the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wall-clock timestamp in milliseconds since the Unix epoch
///
/// Used both as message timestamps and as the watermark in incremental
/// reads. Totally ordered; the store keeps per-room message timestamps
/// non-decreasing by clamping at append time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The zero timestamp, useful as an initial watermark
    pub const ZERO: Timestamp = Timestamp(0);

    /// Current wall-clock time
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64;
        Self(millis)
    }

    /// This timestamp shifted forward by `d`
    pub fn saturating_add(self, d: Duration) -> Self {
        Self(self.0.saturating_add(d.as_millis() as u64))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
