//! wakecam - wake-word triggered image capture over MQTT
//!
//! Two cooperative single-threaded nodes: a wake node that classifies
//! audio windows and publishes a trigger signal, and a camera node that
//! answers the signal with a chunked JPEG transfer. Both share one broker
//! session layer and one feedback vocabulary.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod feedback;
pub mod messages;
pub mod net;
pub mod node;
pub mod transfer;
pub mod wake;

// Hardware and network seams (trait per peripheral)
pub use audio::capture::AudioSource;
pub use feedback::FeedbackEmitter;
pub use net::broker::BrokerClient;
pub use node::frame::FrameSource;
pub use wake::classifier::Classifier;

// Control loops
pub use node::{CamNode, WakeNode};

// Error handling
pub use error::{Result, WakecamError};

// Config
pub use config::Config;

/// Crate version string.
pub fn version_string() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
