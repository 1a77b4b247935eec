//! Broker session plumbing: client seam, state machine, topic map.

pub mod broker;
pub mod connection;
pub mod mqtt;
pub mod topics;

pub use broker::{BrokerClient, InboundMessage, MockBroker};
pub use connection::{ConnectionManager, ConnectionState, TickOutcome};
pub use mqtt::MqttBroker;
pub use topics::{ImagePart, TopicMap};
