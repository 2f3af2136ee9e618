//! Room struct definition
//!
//! Represents an ephemeral chat room: the set of users currently present
//! and the ordered message history, plus the expiry deadline that is armed
//! while the room sits empty.

use std::collections::HashSet;
use std::time::Duration;

use crate::message::ChatMessage;
use crate::types::{RoomCode, Timestamp};

/// Ephemeral chat room
///
/// Occupancy drives the lifecycle: while any user is present `expires_at`
/// is `None`; when the last user leaves, `expires_at` is armed and the
/// reaper removes the room once the deadline passes. A join during the
/// grace window disarms the deadline and keeps the history intact.
///
/// Invariant: `users.is_empty()` ⇔ `expires_at.is_some()`, after every
/// mutation.
#[derive(Debug)]
pub struct Room {
    /// Room code for identification
    pub code: RoomCode,
    /// Usernames currently present (one entry per name, however many
    /// sessions hold it)
    pub users: HashSet<String>,
    /// Message history, append-only in insertion order.
    /// Unbounded: retention is an open question upstream and no cap is
    /// applied here.
    pub messages: Vec<ChatMessage>,
    /// Room creation time, set once
    pub created_at: Timestamp,
    /// Deadline after which the reaper may remove this room.
    /// `Some` exactly while the room is empty.
    pub expires_at: Option<Timestamp>,
}

impl Room {
    /// Create a new room occupied by `username`
    pub fn new(code: RoomCode, username: &str, now: Timestamp) -> Self {
        let mut users = HashSet::new();
        users.insert(username.to_string());
        Self {
            code,
            users,
            messages: Vec::new(),
            created_at: now,
            expires_at: None,
        }
    }

    /// Add a user and disarm the expiry deadline
    ///
    /// Idempotent: joining twice with the same username is a no-op beyond
    /// the first (set semantics).
    pub fn join(&mut self, username: &str) {
        self.users.insert(username.to_string());
        self.expires_at = None;
    }

    /// Remove a user; arm the expiry deadline if the room became empty
    ///
    /// No-op when the user is absent. Leaving an already-empty room never
    /// re-arms the deadline (the original one keeps counting down).
    pub fn leave(&mut self, username: &str, now: Timestamp, grace: Duration) {
        if self.users.remove(username) && self.users.is_empty() {
            self.expires_at = Some(now.saturating_add(grace));
        }
    }

    /// Append a message, assigning a timestamp
    ///
    /// The assigned timestamp is clamped to the previous message's so
    /// timestamps within a room are non-decreasing even if the wall clock
    /// steps backwards. Membership is not checked here.
    pub fn append(&mut self, username: &str, body: String, now: Timestamp) -> Timestamp {
        let timestamp = match self.messages.last() {
            Some(last) => now.max(last.timestamp),
            None => now,
        };
        self.messages.push(ChatMessage {
            username: username.to_string(),
            body,
            timestamp,
        });
        timestamp
    }

    /// Messages with a timestamp strictly after `watermark`, in stored order
    pub fn messages_since(&self, watermark: Timestamp) -> Vec<ChatMessage> {
        // Timestamps are non-decreasing, so everything new sits in one
        // suffix of the vector.
        let start = self
            .messages
            .partition_point(|m| m.timestamp <= watermark);
        self.messages[start..].to_vec()
    }

    /// Check whether the grace period has elapsed
    ///
    /// Always false while the room is occupied, no matter how old it is.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }

    /// Check if no user is present
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: Duration = Duration::from_secs(300);

    fn test_room(username: &str) -> Room {
        Room::new(RoomCode::from_input("ABCXYZ"), username, Timestamp(1_000))
    }

    #[test]
    fn test_room_creation() {
        let room = test_room("alice");

        assert_eq!(room.code.as_str(), "ABCXYZ");
        assert!(room.users.contains("alice"));
        assert!(room.messages.is_empty());
        assert_eq!(room.created_at, Timestamp(1_000));
        assert!(room.expires_at.is_none());
    }

    #[test]
    fn test_join_is_idempotent() {
        let mut room = test_room("alice");

        room.join("alice");
        room.join("bob");
        room.join("bob");

        assert_eq!(room.users.len(), 2);
    }

    #[test]
    fn test_last_leave_arms_expiry() {
        let mut room = test_room("alice");
        room.join("bob");

        room.leave("alice", Timestamp(2_000), GRACE);
        assert!(room.expires_at.is_none());

        room.leave("bob", Timestamp(3_000), GRACE);
        assert_eq!(room.expires_at, Some(Timestamp(3_000 + 300_000)));
    }

    #[test]
    fn test_leave_absent_user_keeps_deadline() {
        let mut room = test_room("alice");
        room.leave("alice", Timestamp(2_000), GRACE);
        let deadline = room.expires_at;

        // A stray leave must not push the deadline forward
        room.leave("ghost", Timestamp(9_000), GRACE);
        assert_eq!(room.expires_at, deadline);
    }

    #[test]
    fn test_rejoin_disarms_expiry_and_keeps_history() {
        let mut room = test_room("alice");
        room.append("alice", "hello".to_string(), Timestamp(1_500));
        room.leave("alice", Timestamp(2_000), GRACE);
        assert!(room.expires_at.is_some());

        room.join("carol");

        assert!(room.expires_at.is_none());
        assert_eq!(room.messages.len(), 1);
        assert_eq!(room.messages[0].body, "hello");
    }

    #[test]
    fn test_occupancy_invariant_after_every_mutation() {
        let mut room = test_room("alice");
        let check = |room: &Room| {
            assert_eq!(room.users.is_empty(), room.expires_at.is_some());
        };

        check(&room);
        room.join("bob");
        check(&room);
        room.leave("alice", Timestamp(2_000), GRACE);
        check(&room);
        room.leave("bob", Timestamp(3_000), GRACE);
        check(&room);
        room.join("alice");
        check(&room);
    }

    #[test]
    fn test_append_clamps_backwards_clock() {
        let mut room = test_room("alice");

        let t1 = room.append("alice", "first".to_string(), Timestamp(5_000));
        // Wall clock stepped back; timestamp must not decrease
        let t2 = room.append("alice", "second".to_string(), Timestamp(4_000));

        assert_eq!(t1, Timestamp(5_000));
        assert_eq!(t2, Timestamp(5_000));
        assert!(room.messages[0].timestamp <= room.messages[1].timestamp);
    }

    #[test]
    fn test_messages_since_watermark() {
        let mut room = test_room("alice");
        room.append("alice", "one".to_string(), Timestamp(1_000));
        room.append("alice", "two".to_string(), Timestamp(2_000));
        room.append("alice", "three".to_string(), Timestamp(3_000));

        let all = room.messages_since(Timestamp::ZERO);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].body, "one");
        assert_eq!(all[2].body, "three");

        // Strictly-after semantics: the watermark message itself is excluded
        let tail = room.messages_since(Timestamp(2_000));
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].body, "three");

        assert!(room.messages_since(Timestamp(3_000)).is_empty());
    }

    #[test]
    fn test_is_expired() {
        let mut room = test_room("alice");
        assert!(!room.is_expired(Timestamp(u64::MAX)));

        room.leave("alice", Timestamp(2_000), GRACE);
        let deadline = Timestamp(2_000 + 300_000);

        assert!(!room.is_expired(Timestamp(deadline.0 - 1)));
        assert!(room.is_expired(deadline));
        assert!(room.is_expired(Timestamp(deadline.0 + 1)));
    }
}
