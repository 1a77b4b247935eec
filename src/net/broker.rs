//! Broker client seam.
//!
//! This trait mirrors the external collaborator contract: connect with a
//! client id, subscribe, fire-and-forget publish, a bounded inbound drain,
//! and a liveness check. Swapping implementations (real MQTT client vs
//! mock) keeps every state machine above it testable.

use crate::error::Result;

/// One inbound broker message.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: &str, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.to_string(),
            payload: payload.into(),
        }
    }
}

/// Trait for the broker session.
pub trait BrokerClient {
    /// Perform the session handshake under the given client identifier.
    fn connect(&mut self, client_id: &str) -> Result<()>;

    /// Issue one topic subscription on the live session.
    fn subscribe(&mut self, topic: &str) -> Result<()>;

    /// Publish a message; returns false on failure (no retry here).
    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool;

    /// Drain inbound messages with a bounded wait, at most one batch.
    fn poll(&mut self) -> Vec<InboundMessage>;

    /// Whether the session is still alive.
    fn is_alive(&self) -> bool;
}

/// Mock broker for testing
#[derive(Debug, Clone, Default)]
pub struct MockBroker {
    connect_failures: usize,
    connect_attempts: usize,
    subscribe_ok: bool,
    publish_fail_after: Option<usize>,
    alive: bool,
    pub published: Vec<(String, Vec<u8>)>,
    inbound: Vec<InboundMessage>,
}

impl MockBroker {
    /// Create a mock that connects on the first attempt.
    pub fn new() -> Self {
        Self {
            connect_failures: 0,
            connect_attempts: 0,
            subscribe_ok: true,
            publish_fail_after: None,
            alive: false,
            published: Vec::new(),
            inbound: Vec::new(),
        }
    }

    /// Configure the first `n` connect attempts to fail.
    pub fn with_connect_failures(mut self, n: usize) -> Self {
        self.connect_failures = n;
        self
    }

    /// Configure subscriptions to fail.
    pub fn with_subscribe_failure(mut self) -> Self {
        self.subscribe_ok = false;
        self
    }

    /// Configure publishes to fail after the first `n` successes.
    pub fn with_publish_fail_after(mut self, n: usize) -> Self {
        self.publish_fail_after = Some(n);
        self
    }

    /// Queue an inbound message for the next poll.
    pub fn push_inbound(&mut self, message: InboundMessage) {
        self.inbound.push(message);
    }

    /// Simulate session loss.
    pub fn kill_session(&mut self) {
        self.alive = false;
    }

    /// Number of connect attempts seen so far.
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts
    }

    /// Topics of every successful publish, in order.
    pub fn published_topics(&self) -> Vec<&str> {
        self.published.iter().map(|(t, _)| t.as_str()).collect()
    }
}

impl BrokerClient for MockBroker {
    fn connect(&mut self, _client_id: &str) -> Result<()> {
        self.connect_attempts += 1;
        if self.connect_attempts <= self.connect_failures {
            return Err(crate::error::WakecamError::BrokerConnect {
                message: "mock handshake refused".to_string(),
            });
        }
        self.alive = true;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<()> {
        if !self.subscribe_ok {
            return Err(crate::error::WakecamError::BrokerSubscribe {
                topic: topic.to_string(),
                message: "mock subscribe refused".to_string(),
            });
        }
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        if let Some(limit) = self.publish_fail_after
            && self.published.len() >= limit
        {
            return false;
        }
        self.published.push((topic.to_string(), payload.to_vec()));
        true
    }

    fn poll(&mut self) -> Vec<InboundMessage> {
        std::mem::take(&mut self.inbound)
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}
