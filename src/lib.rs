//! Ephemeral In-Memory Chat-Room Store
//!
//! Short-lived chat rooms keyed by 6-character codes, served over
//! WebSocket with a polling read model. All state lives in memory for the
//! lifetime of the process; nothing survives a restart, by design.
//!
//! # Features
//! - Room creation with 6-character codes (create-or-join semantics)
//! - Per-room presence tracking (a username appears once per room)
//! - Append-only, insertion-ordered message history
//! - Incremental reads via a timestamp watermark
//! - Automatic reclamation of rooms left empty past a grace period
//!
//! # Architecture
//! A single `RoomStore` holds every room in a concurrent map with
//! per-entry locking, so operations on one room are atomic while
//! unrelated rooms proceed in parallel. The store is constructed once and
//! injected (`Arc`) into each connection's `Session` and into the
//! background reaper task:
//! - `Session` is the per-client façade and validation boundary
//! - `handle_connection` drives a session over a WebSocket request/reply loop
//! - `spawn_reaper` sweeps expired rooms on a fixed interval
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::net::TcpListener;
//! use tempchat::{handle_connection, spawn_reaper, RoomStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(RoomStore::new());
//!     spawn_reaper(Arc::clone(&store), Duration::from_secs(30));
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let store = Arc::clone(&store);
//!         tokio::spawn(handle_connection(stream, store));
//!     }
//! }
//! ```

pub mod error;
pub mod handler;
pub mod message;
pub mod reaper;
pub mod room;
pub mod session;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use error::AppError;
pub use handler::handle_connection;
pub use message::{ChatMessage, ClientMessage, ErrorCode, ServerMessage};
pub use reaper::{spawn_reaper, DEFAULT_SWEEP_INTERVAL};
pub use room::Room;
pub use session::Session;
pub use store::{RoomSnapshot, RoomStore, DEFAULT_GRACE_PERIOD};
pub use types::{ClientId, RoomCode, Timestamp};
