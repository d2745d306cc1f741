//! WebSocket relay of frames to host pages

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::error::HostError;
use crate::models::stream::is_valid_name;
use crate::models::{ClientMessage, ServerMessage};

const CHANNEL_CAPACITY: usize = 64;

/// Hub for managing per-stream broadcast channels
pub struct BroadcastHub {
    /// Map of stream name to broadcast sender
    channels: DashMap<String, broadcast::Sender<ServerMessage>>,
    /// Sequence counter per stream
    sequences: DashMap<String, AtomicU64>,
    /// Track active connections per stream
    connections: DashMap<String, AtomicU64>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            sequences: DashMap::new(),
            connections: DashMap::new(),
        }
    }

    /// Subscribe to frames for a stream, creating its channel on first use
    pub fn subscribe(&self, name: &str) -> broadcast::Receiver<ServerMessage> {
        // The channel entry stays locked until the connection is counted so
        // `release` cannot drop it in between.
        let sender = self.channels.entry(name.to_string()).or_insert_with(|| {
            let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
            self.sequences.insert(name.to_string(), AtomicU64::new(0));
            self.connections.insert(name.to_string(), AtomicU64::new(0));
            tx
        });
        self.connections
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
        sender.subscribe()
    }

    /// Unsubscribe from a stream. Returns the connections still open.
    pub fn unsubscribe(&self, name: &str) -> u64 {
        self.connections
            .get(name)
            .and_then(|conn| {
                conn.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| c.checked_sub(1))
                    .ok()
            })
            .map(|prev| prev - 1)
            .unwrap_or(0)
    }

    /// Drop a stream's channel if nobody is watching it. Returns whether it was dropped.
    pub fn release(&self, name: &str) -> bool {
        self.channels
            .remove_if(name, |_, _| {
                if self.connection_count(name) > 0 {
                    return false;
                }
                self.sequences.remove(name);
                self.connections.remove(name);
                true
            })
            .is_some()
    }

    /// Get next sequence number for a stream
    fn next_seq(&self, name: &str) -> u64 {
        self.sequences
            .get(name)
            .map(|seq| seq.fetch_add(1, Ordering::Relaxed) + 1)
            .unwrap_or(1)
    }

    /// Send a frame to every page watching `name`. Returns the sequence number used.
    pub fn broadcast_frame(&self, name: &str, data: String) -> u64 {
        let seq = self.next_seq(name);
        self.send(name, ServerMessage::Frame { seq, data });
        seq
    }

    fn send(&self, name: &str, msg: ServerMessage) {
        if let Some(sender) = self.channels.get(name) {
            // No receivers is fine
            let _ = sender.send(msg);
        }
    }

    /// Tell watchers the stream is gone and drop its channel
    pub fn remove_stream(&self, name: &str) {
        let seq = self.next_seq(name);
        self.send(name, ServerMessage::Removed { seq });
        self.channels.remove(name);
        self.sequences.remove(name);
        self.connections.remove(name);
    }

    /// Names of every stream that currently has a channel
    pub fn stream_names(&self) -> Vec<String> {
        self.channels.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Get list of stream names with active connections
    pub fn active_streams(&self) -> Vec<String> {
        self.connections
            .iter()
            .filter(|entry| entry.value().load(Ordering::Relaxed) > 0)
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Get connection count for a stream
    pub fn connection_count(&self, name: &str) -> u64 {
        self.connections
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, HostError> {
    if !is_valid_name(&name) {
        return Err(HostError::BadRequest(format!("invalid stream name: {}", name)));
    }
    Ok(ws.on_upgrade(move |socket| handle_socket(state, name, socket)))
}

/// Re-send the stored frame so a freshly loaded page has something to draw
fn replay_latest(state: &AppState, name: &str) {
    let Some(record) = state.store.get(name) else {
        debug!("No frame stored for stream {} yet", name);
        return;
    };
    match record.frame.to_json() {
        Ok(json) => {
            state.broadcast_hub.broadcast_frame(name, json);
        }
        Err(e) => error!("Failed to serialize frame for {}: {}", name, e),
    }
}

/// Handle a WebSocket connection
async fn handle_socket(state: Arc<AppState>, name: String, socket: WebSocket) {
    info!("WebSocket connected for stream {}", name);

    // Subscribe before replaying so the replay reaches this socket
    let mut rx = state.broadcast_hub.subscribe(&name);

    let (mut sender, mut receiver) = socket.split();

    let connected_msg = ServerMessage::Connected {
        seq: 0,
        stream: name.clone(),
    };
    if let Ok(json) = serde_json::to_string(&connected_msg) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    replay_latest(&state, &name);

    // Spawn task to forward broadcast messages to the page
    let forward_task = tokio::spawn(async move {
        loop {
            let msg = match rx.recv().await {
                Ok(msg) => msg,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Only the newest frame matters; older ones are superseded
                    warn!("Client lagged, skipped {} frames", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let done = matches!(msg, ServerMessage::Removed { .. });
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                }
            }
            if done {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    });

    // Handle incoming messages from the page
    let state_clone = Arc::clone(&state);
    let name_clone = name.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::GetState) => {
                        debug!("Client requesting state for {}", name_clone);
                        replay_latest(&state_clone, &name_clone);
                    }
                    Ok(ClientMessage::Ack { seq }) => {
                        debug!("Client acked seq {}", seq);
                    }
                    Err(e) => {
                        warn!("Invalid client message: {}", e);
                    }
                },
                Ok(Message::Close(_)) => {
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    let remaining = state.broadcast_hub.unsubscribe(&name);
    info!("WebSocket disconnected for stream {}", name);

    // A name that was watched but never given a frame leaves nothing behind
    if remaining == 0 && !state.store.contains(&name) && state.broadcast_hub.release(&name) {
        debug!("Dropped channel for unused stream {}", name);
    }
}
