//! Inbound message dispatch for the camera node.
//!
//! Validates wake-word signals and server commands and latches a single
//! pending capture request. Duplicate triggers before consumption collapse
//! into one; an unconsumed request auto-clears after the signal timeout so
//! a stale trigger is never acted on after a long disconnection. Malformed
//! payloads are ignored, never errors.

use crate::messages::{CommandAction, CommandMessage, SignalMessage};
use crate::net::broker::InboundMessage;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// What the router did with one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A valid trigger latched (or re-latched) the capture request.
    CaptureRequested,
    /// The message was ignored.
    Ignored,
}

/// Dispatch table keyed by topic, plus the capture-request latch.
pub struct SignalRouter {
    signal_topic: String,
    command_topic: String,
    timeout: Duration,
    requested_at: Option<Instant>,
}

impl SignalRouter {
    pub fn new(signal_topic: &str, command_topic: &str, timeout: Duration) -> Self {
        Self {
            signal_topic: signal_topic.to_string(),
            command_topic: command_topic.to_string(),
            timeout,
            requested_at: None,
        }
    }

    /// Routes one inbound message.
    pub fn handle(&mut self, message: &InboundMessage, now: Instant) -> RouteOutcome {
        if message.topic == self.signal_topic {
            return self.handle_signal(&message.payload, now);
        }
        if message.topic == self.command_topic {
            return self.handle_command(&message.payload, now);
        }
        debug!(topic = %message.topic, "message from unrouted topic ignored");
        RouteOutcome::Ignored
    }

    fn handle_signal(&mut self, payload: &[u8], now: Instant) -> RouteOutcome {
        match serde_json::from_slice::<SignalMessage>(payload) {
            Ok(signal) => {
                debug!(device_id = %signal.device_id, "wake-word signal, capture requested");
                self.latch(now);
                RouteOutcome::CaptureRequested
            }
            Err(e) => {
                warn!(error = %e, "invalid signal payload ignored");
                RouteOutcome::Ignored
            }
        }
    }

    fn handle_command(&mut self, payload: &[u8], now: Instant) -> RouteOutcome {
        match serde_json::from_slice::<CommandMessage>(payload) {
            Ok(CommandMessage {
                action: CommandAction::CaptureOnce,
            }) => {
                debug!("capture_once command, capture requested");
                self.latch(now);
                RouteOutcome::CaptureRequested
            }
            Ok(_) => RouteOutcome::Ignored,
            Err(e) => {
                warn!(error = %e, "invalid command payload ignored");
                RouteOutcome::Ignored
            }
        }
    }

    /// Consumes the pending capture request if it is still fresh.
    pub fn take_request(&mut self, now: Instant) -> bool {
        self.expire(now);
        self.requested_at.take().is_some()
    }

    /// Whether a fresh request is pending, without consuming it.
    pub fn has_request(&mut self, now: Instant) -> bool {
        self.expire(now);
        self.requested_at.is_some()
    }

    fn latch(&mut self, now: Instant) {
        // Idempotent: duplicates refresh the timestamp, nothing queues
        self.requested_at = Some(now);
    }

    fn expire(&mut self, now: Instant) {
        if let Some(at) = self.requested_at
            && now.duration_since(at) >= self.timeout
        {
            debug!("stale capture request cleared");
            self.requested_at = None;
        }
    }
}
