//! WebSocket message types for relaying frames to host pages

use serde::{Deserialize, Serialize};

/// Messages sent from server to host pages
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected { seq: u64, stream: String },

    /// A new frame. `data` is the frame JSON, posted to the visualizer verbatim
    Frame { seq: u64, data: String },

    /// The stream was deleted; the page should stop expecting frames
    Removed { seq: u64 },

    /// Error message
    Error { seq: u64, message: String },
}

/// Messages sent from host pages to server
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for the latest frame again (after a visualizer reload)
    GetState,

    /// Acknowledge receipt of a message
    Ack { seq: u64 },
}
