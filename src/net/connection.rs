//! Broker session state machine.
//!
//! Owns the `ConnectionState` exclusively and converges toward `Ready`
//! with a fixed-interval, infinite retry. `tick` is called once per
//! control-loop turn and never blocks beyond one bounded I/O wait; the
//! legacy blocking-reconnect discipline is deliberately not reproduced.
//!
//! While not `Ready`, publish attempts are dropped (never queued) and
//! subscriptions are re-issued from scratch on every reconnection.

use crate::net::broker::{BrokerClient, InboundMessage};
use crate::transfer::encoder::ChunkSink;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Session lifecycle states. Mutated only by `ConnectionManager`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    SubscriptionPending,
    Ready,
}

/// Result of one control-loop turn.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Inbound messages drained this turn (empty unless `Ready`).
    pub inbound: Vec<InboundMessage>,
    /// True on the turn the session first reached `Ready` again.
    pub became_ready: bool,
}

/// State machine owning the broker session for one node.
pub struct ConnectionManager<B: BrokerClient> {
    broker: B,
    state: ConnectionState,
    client_id: String,
    subscriptions: Vec<String>,
    pending_subscriptions: Vec<String>,
    retry_interval: Duration,
    last_attempt: Option<Instant>,
}

impl<B: BrokerClient> ConnectionManager<B> {
    pub fn new(
        broker: B,
        client_id: &str,
        subscriptions: Vec<String>,
        retry_interval: Duration,
    ) -> Self {
        Self {
            broker,
            state: ConnectionState::Disconnected,
            client_id: client_id.to_string(),
            subscriptions,
            pending_subscriptions: Vec::new(),
            retry_interval,
            last_attempt: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Direct access to the underlying client, for tests and diagnostics.
    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }

    /// Advances the state machine by one turn.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if self.state == ConnectionState::Disconnected && self.retry_elapsed(now) {
            self.state = ConnectionState::Connecting;
            self.last_attempt = Some(now);
            match self.broker.connect(&self.client_id) {
                Ok(()) => {
                    debug!(client_id = %self.client_id, "broker handshake succeeded");
                    self.state = ConnectionState::Connected;
                    self.pending_subscriptions = self.subscriptions.clone();
                    self.state = ConnectionState::SubscriptionPending;
                }
                Err(e) => {
                    warn!(error = %e, "broker handshake failed, waiting for retry timer");
                    self.state = ConnectionState::Disconnected;
                }
            }
        }

        if self.state == ConnectionState::SubscriptionPending {
            self.issue_pending_subscriptions();
            if !self.broker.is_alive() {
                warn!("session lost during subscription");
                self.state = ConnectionState::Disconnected;
            } else if self.pending_subscriptions.is_empty() {
                info!(client_id = %self.client_id, "broker session ready");
                self.state = ConnectionState::Ready;
                outcome.became_ready = true;
            }
        }

        if self.state == ConnectionState::Ready {
            if self.broker.is_alive() {
                outcome.inbound = self.broker.poll();
            } else {
                warn!("broker session lost");
                self.state = ConnectionState::Disconnected;
            }
        }

        outcome
    }

    /// Publishes on the live session; drops (and logs) when not `Ready`.
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        if self.state != ConnectionState::Ready {
            debug!(topic, "publish dropped, session not ready");
            return false;
        }
        self.broker.publish(topic, payload)
    }

    fn retry_elapsed(&self, now: Instant) -> bool {
        match self.last_attempt {
            None => true, // first attempt
            Some(at) => now.duration_since(at) >= self.retry_interval,
        }
    }

    fn issue_pending_subscriptions(&mut self) {
        let pending = std::mem::take(&mut self.pending_subscriptions);
        for topic in pending {
            match self.broker.subscribe(&topic) {
                Ok(()) => debug!(topic = %topic, "subscribed"),
                Err(e) => {
                    warn!(topic = %topic, error = %e, "subscribe failed, will retry");
                    self.pending_subscriptions.push(topic);
                }
            }
        }
    }
}

// The chunked transfer publishes through the same session as everything else.
impl<B: BrokerClient> ChunkSink for ConnectionManager<B> {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        ConnectionManager::publish(self, topic, payload)
    }
}
