//! Best-effort activity logging over the broker.
//!
//! Fire-and-forget: a log line is published once, never retried, and a
//! failure (including "not connected") is silently absorbed. Logging must
//! not be able to affect the functional path.

use crate::net::broker::BrokerClient;
use crate::net::connection::ConnectionManager;
use tracing::trace;

/// Publishes short human-readable status lines to the device logs topic.
pub struct ActivityLogger {
    topic: String,
    device_id: String,
}

impl ActivityLogger {
    pub fn new(topic: &str, device_id: &str) -> Self {
        Self {
            topic: topic.to_string(),
            device_id: device_id.to_string(),
        }
    }

    /// Emits one status line, prefixed with the device id.
    pub fn log<B: BrokerClient>(&self, connection: &mut ConnectionManager<B>, line: &str) {
        let message = format!("{}: {}", self.device_id, line);
        trace!(activity = %message);
        // Dropped when not ready; failure is deliberately ignored
        let _ = connection.publish(&self.topic, message.as_bytes());
    }
}
