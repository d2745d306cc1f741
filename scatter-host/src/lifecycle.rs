//! Stream lifecycle management - idle stream cleanup

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::AppState;
use crate::api::stream::BroadcastHub;
use crate::storage::FrameStore;

/// Background task that drops idle streams nobody is watching
pub async fn cleanup_task(state: Arc<AppState>) {
    let interval = Duration::from_secs(state.config.cleanup_interval);
    let ttl = state.config.stream_ttl();
    info!("Starting cleanup task with interval: {:?}", interval);

    loop {
        tokio::time::sleep(interval).await;
        debug!("Running stream cleanup...");

        let (evicted, released) = sweep(&state.store, &state.broadcast_hub, ttl);
        if !evicted.is_empty() {
            info!("Cleaned up {} idle streams", evicted.len());
        }
        if released > 0 {
            debug!("Released {} unused channels", released);
        }
    }
}

/// Evict expired frames along with their channels, then drop channels left
/// without viewers or a stored frame. Returns the evicted names and the
/// number of stray channels released.
pub fn sweep(
    store: &FrameStore,
    hub: &BroadcastHub,
    ttl: chrono::Duration,
) -> (Vec<String>, usize) {
    // Streams with open WebSocket connections are kept regardless of age
    let evicted = store.cleanup_expired(&hub.active_streams(), ttl);
    for name in &evicted {
        hub.remove_stream(name);
    }

    let released = hub
        .stream_names()
        .into_iter()
        .filter(|name| !store.contains(name) && hub.release(name))
        .count();

    (evicted, released)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scatter_embed::frame::{Cell, Frame};

    fn frame() -> Frame {
        Frame::new(vec!["size".into()], vec![vec![Cell::Number(1.0)]])
    }

    #[test]
    fn sweep_drops_hub_entries_of_evicted_streams() {
        let store = FrameStore::new();
        let hub = BroadcastHub::new();
        for i in 0..1000 {
            let name = format!("s{}", i);
            let _rx = hub.subscribe(&name);
            hub.unsubscribe(&name);
            store.put(&name, frame());
        }

        let (evicted, _) = sweep(&store, &hub, chrono::Duration::seconds(-1));
        assert_eq!(evicted.len(), 1000);
        assert_eq!(store.len(), 0);
        assert!(hub.stream_names().is_empty());
        assert_eq!(hub.connection_count("s0"), 0);
    }

    #[test]
    fn sweep_releases_channels_without_frames() {
        let store = FrameStore::new();
        let hub = BroadcastHub::new();
        let _rx = hub.subscribe("ghost");
        hub.unsubscribe("ghost");

        let (evicted, released) = sweep(&store, &hub, chrono::Duration::hours(1));
        assert!(evicted.is_empty());
        assert_eq!(released, 1);
        assert!(hub.stream_names().is_empty());
    }

    #[test]
    fn sweep_keeps_watched_and_fresh_streams() {
        let store = FrameStore::new();
        let hub = BroadcastHub::new();
        let _watcher = hub.subscribe("watched");
        store.put("watched", frame());
        store.put("fresh", frame());
        let _early = hub.subscribe("waiting");

        let (evicted, released) = sweep(&store, &hub, chrono::Duration::seconds(-1));
        assert_eq!(evicted, vec!["fresh".to_string()]);
        assert_eq!(released, 0);
        assert!(store.contains("watched"));
        let mut names = hub.stream_names();
        names.sort();
        assert_eq!(names, vec!["waiting".to_string(), "watched".to_string()]);
    }
}
