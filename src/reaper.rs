//! Expiry reaper task
//!
//! Background task that periodically sweeps the store for rooms whose
//! grace period has elapsed. Runs independently of any client request;
//! clients only ever observe a room as fully present or fully gone.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::store::RoomStore;
use crate::types::Timestamp;

/// Default sweep cadence
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Spawn the reaper task for a store
///
/// Ticks on a fixed interval and removes every room whose deadline has
/// passed. A sweep that finds nothing is silent. The returned handle can
/// be used to abort the task in tests; in the server it runs for the
/// process lifetime.
pub fn spawn_reaper(store: Arc<RoomStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; harmless, the store is empty
        // or the sweep is a no-op.
        loop {
            ticker.tick().await;
            let removed = store.sweep(Timestamp::now());
            if removed > 0 {
                debug!("Reaper removed {} room(s), {} remaining", removed, store.room_count());
            }
        }
    })
}
