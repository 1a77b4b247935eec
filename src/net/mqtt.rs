//! MQTT implementation of the broker seam, backed by rumqttc.
//!
//! The synchronous client is driven from the control loop itself: every
//! publish and poll pumps the event loop with a bounded wait, so no call
//! here blocks longer than one I/O timeout. A connection error marks the
//! session dead and the state machine above decides when to rebuild it.

use crate::defaults;
use crate::error::{Result, WakecamError};
use crate::net::broker::{BrokerClient, InboundMessage};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_CHANNEL_CAP: usize = 64;
const FLUSH_TIMEOUT: Duration = Duration::from_millis(1);

struct Session {
    client: Client,
    connection: Connection,
    alive: bool,
    inbound: Vec<InboundMessage>,
}

/// Broker client over plain MQTT (QoS 0 throughout).
pub struct MqttBroker {
    host: String,
    port: u16,
    session: Option<Session>,
}

impl MqttBroker {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            session: None,
        }
    }

    /// Pumps the event loop, buffering inbound publishes.
    ///
    /// Waits at most `timeout` for the first event and drains whatever else
    /// is immediately available, up to the batch limit.
    fn pump(&mut self, timeout: Duration) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.alive {
            return;
        }
        let mut wait = timeout;
        while session.inbound.len() < defaults::POLL_BATCH_LIMIT {
            match session.connection.recv_timeout(wait) {
                Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                    session.inbound.push(InboundMessage {
                        topic: publish.topic.clone(),
                        payload: publish.payload.to_vec(),
                    });
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "mqtt session error");
                    session.alive = false;
                    return;
                }
                Err(_) => return, // nothing more within the wait
            }
            wait = Duration::ZERO;
        }
    }
}

impl BrokerClient for MqttBroker {
    fn connect(&mut self, client_id: &str) -> Result<()> {
        self.session = None;

        let mut options = MqttOptions::new(client_id, &self.host, self.port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_max_packet_size(defaults::MAX_PACKET_SIZE, defaults::MAX_PACKET_SIZE);
        let (client, mut connection) = Client::new(options, REQUEST_CHANNEL_CAP);

        // Drive the event loop until the broker acknowledges the session.
        let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(WakecamError::BrokerConnect {
                    message: "handshake timed out".to_string(),
                });
            }
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(_)))) => {
                    debug!(host = %self.host, port = self.port, "mqtt session established");
                    self.session = Some(Session {
                        client,
                        connection,
                        alive: true,
                        inbound: Vec::new(),
                    });
                    return Ok(());
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    return Err(WakecamError::BrokerConnect {
                        message: e.to_string(),
                    });
                }
                Err(_) => {
                    return Err(WakecamError::BrokerConnect {
                        message: "handshake timed out".to_string(),
                    });
                }
            }
        }
    }

    fn subscribe(&mut self, topic: &str) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Err(WakecamError::BrokerSubscribe {
                topic: topic.to_string(),
                message: "no live session".to_string(),
            });
        };
        session
            .client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| WakecamError::BrokerSubscribe {
                topic: topic.to_string(),
                message: e.to_string(),
            })?;
        // Flush the subscribe onto the wire
        self.pump(FLUSH_TIMEOUT);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        let queued = match self.session.as_mut() {
            Some(session) if session.alive => session
                .client
                .try_publish(topic, QoS::AtMostOnce, false, payload.to_vec())
                .is_ok(),
            _ => false,
        };
        // Pump so queued writes reach the socket before the next publish
        self.pump(FLUSH_TIMEOUT);
        queued && self.is_alive()
    }

    fn poll(&mut self) -> Vec<InboundMessage> {
        self.pump(defaults::POLL_TIMEOUT);
        match self.session.as_mut() {
            Some(session) => std::mem::take(&mut session.inbound),
            None => Vec::new(),
        }
    }

    fn is_alive(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.alive)
    }
}
