//! Error types for wakecam.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WakecamError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    #[error("Sample window allocation failed: {samples} samples")]
    WindowAllocation { samples: usize },

    // Classifier errors
    #[error("Model input length mismatch: expected {expected} samples, got {actual}")]
    ModelInput { expected: usize, actual: usize },

    #[error("Classification failed: {message}")]
    Classification { message: String },

    // Frame capture errors
    #[error("Frame capture failed: {message}")]
    FrameCapture { message: String },

    // Broker session errors
    #[error("Broker connection failed: {message}")]
    BrokerConnect { message: String },

    #[error("Broker subscription failed for {topic}: {message}")]
    BrokerSubscribe { topic: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, WakecamError>;
