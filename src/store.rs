//! RoomStore implementation
//!
//! The single source of truth for all rooms. Rooms live in a concurrent
//! map keyed by room code; each operation locks only the entry it touches,
//! so traffic to different rooms proceeds in parallel while operations on
//! one room are serialized and appear atomic.
//!
//! The store is constructed explicitly and shared via `Arc` — there is no
//! process-wide singleton, which keeps tests free to run independent
//! instances side by side.

use std::collections::HashSet;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::message::ChatMessage;
use crate::room::Room;
use crate::types::{RoomCode, Timestamp};

/// How long an empty room is kept before the reaper may remove it
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(300);

/// Read snapshot of a room, taken under the room's lock
///
/// Returned by create/join for the initial render: the full user list and
/// message history as of one consistent instant.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    /// The room's code
    pub code: RoomCode,
    /// Users present at snapshot time, sorted for stable output
    pub users: Vec<String>,
    /// Full message history at snapshot time
    pub messages: Vec<ChatMessage>,
}

impl RoomSnapshot {
    fn of(room: &Room) -> Self {
        let mut users: Vec<String> = room.users.iter().cloned().collect();
        users.sort();
        Self {
            code: room.code.clone(),
            users,
            messages: room.messages.clone(),
        }
    }
}

/// The room table
///
/// All mutations to a given room's users, messages and expiry deadline
/// happen under that room's entry lock as a single step; insertion and
/// removal of entries go through the map's own sharded locking.
pub struct RoomStore {
    /// All live rooms: RoomCode -> Room
    rooms: DashMap<RoomCode, Room>,
    /// Grace period applied when a room goes empty
    grace: Duration,
}

impl RoomStore {
    /// Create a store with the default 300-second grace period
    pub fn new() -> Self {
        Self::with_grace_period(DEFAULT_GRACE_PERIOD)
    }

    /// Create a store with a custom grace period
    pub fn with_grace_period(grace: Duration) -> Self {
        Self {
            rooms: DashMap::new(),
            grace,
        }
    }

    /// Create a brand-new room with a freshly generated, unused code
    ///
    /// The generator itself does not guarantee uniqueness, so generation
    /// retries until the code lands on a vacant entry. The vacancy check
    /// and insert are one atomic step via the entry API.
    pub fn create(&self, username: &str) -> RoomSnapshot {
        loop {
            let code = RoomCode::generate();
            match self.rooms.entry(code.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(entry) => {
                    let room = entry.insert(Room::new(code.clone(), username, Timestamp::now()));
                    info!("Room {} created by '{}'", code, username);
                    return RoomSnapshot::of(&room);
                }
            }
        }
    }

    /// Join the room with the given code, creating it if absent
    ///
    /// The code must already be uppercased (`RoomCode::from_input` does
    /// this). Joining disarms a pending expiry deadline; joining with a
    /// username already present is a no-op beyond the first.
    pub fn create_or_join(&self, code: RoomCode, username: &str) -> RoomSnapshot {
        match self.rooms.entry(code.clone()) {
            Entry::Occupied(mut entry) => {
                let room = entry.get_mut();
                room.join(username);
                debug!("'{}' joined room {} ({} present)", username, code, room.users.len());
                RoomSnapshot::of(room)
            }
            Entry::Vacant(entry) => {
                let room = entry.insert(Room::new(code.clone(), username, Timestamp::now()));
                info!("Room {} created by '{}'", code, username);
                RoomSnapshot::of(&room)
            }
        }
    }

    /// Remove a user from a room
    ///
    /// No-op when the room or the user is absent. When the last user
    /// leaves, the room's grace countdown starts.
    pub fn leave(&self, code: &RoomCode, username: &str) {
        if let Some(mut room) = self.rooms.get_mut(code) {
            room.leave(username, Timestamp::now(), self.grace);
            if room.is_empty() {
                debug!("Room {} is empty, grace period started", code);
            }
        }
    }

    /// Append a message to a room
    ///
    /// Returns the assigned timestamp, or `None` when no room exists for
    /// the code. The author does not need to be a present user of the
    /// room; only the room's existence is checked.
    pub fn send(&self, code: &RoomCode, username: &str, body: String) -> Option<Timestamp> {
        let mut room = self.rooms.get_mut(code)?;
        Some(room.append(username, body, Timestamp::now()))
    }

    /// Messages in a room with a timestamp strictly after `watermark`
    ///
    /// Empty when the room is absent or has nothing new — never an error,
    /// so any polling cadence can sit on top.
    pub fn messages_since(&self, code: &RoomCode, watermark: Timestamp) -> Vec<ChatMessage> {
        self.rooms
            .get(code)
            .map(|room| room.messages_since(watermark))
            .unwrap_or_default()
    }

    /// Current user set of a room; empty when the room is absent
    pub fn users_in(&self, code: &RoomCode) -> HashSet<String> {
        self.rooms
            .get(code)
            .map(|room| room.users.clone())
            .unwrap_or_default()
    }

    /// Remove every room whose grace deadline has passed
    ///
    /// Returns the number of rooms removed. Expired codes are gathered
    /// first, then each is removed under its entry lock with the expiry
    /// re-checked, so a join that lands between the scan and the removal
    /// keeps its room. Sweeping with nothing expired is a silent no-op.
    pub fn sweep(&self, now: Timestamp) -> usize {
        let expired: Vec<RoomCode> = self
            .rooms
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for code in expired {
            if self
                .rooms
                .remove_if(&code, |_, room| room.is_expired(now))
                .is_some()
            {
                info!("Room {} expired and was removed", code);
                removed += 1;
            }
        }
        removed
    }

    /// Number of live rooms (occupied or in grace)
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Check whether a room currently exists for the code
    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}
