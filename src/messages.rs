//! Wire messages exchanged over the broker.
//!
//! Every control message is a small JSON object; chunk payloads are raw
//! bytes and never pass through here.

use serde::{Deserialize, Serialize};

/// Wake-word signal published by the wake node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMessage {
    pub device_id: String,
    /// Milliseconds since the publishing node started (monotonic).
    pub timestamp: u64,
}

/// Command sent by the backend to the camera node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub action: CommandAction,
}

/// Recognized command actions; anything else deserializes to `Unknown`
/// and is ignored, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    CaptureOnce,
    #[serde(other)]
    Unknown,
}

/// Header announcing a chunked image transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferStart {
    pub image_id: u32,
    /// Total payload size in bytes.
    pub size: u32,
    /// Number of chunk messages that follow.
    pub total: u32,
}

/// Trailer marking a completed transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEnd {
    pub image_id: u32,
}
