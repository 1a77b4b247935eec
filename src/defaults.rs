//! Default configuration constants for wakecam.
//!
//! Shared constants used across configuration types and both node roles,
//! kept in one place to eliminate duplication.

use std::time::Duration;

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for wake-word models and matches the input rate
/// the reference model was trained at.
pub const SAMPLE_RATE: u32 = 16_000;

/// Number of samples in one classification window.
///
/// One second of audio at the default sample rate. Must equal the
/// classifier's expected input length.
pub const WINDOW_SAMPLES: usize = 16_000;

/// Samples pulled from the audio peripheral per block read.
pub const CAPTURE_BLOCK_SAMPLES: usize = 256;

/// Bounded wait for a single audio block read.
pub const BLOCK_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Confidence threshold a label must strictly exceed to fire a detection.
pub const DETECTION_THRESHOLD: f32 = 0.4;

/// Labels that mean "no event" and can never fire a detection.
pub const EXCLUDED_LABELS: &[&str] = &["noise", "unknown", "_unknown", "background"];

/// Minimum peak-to-peak amplitude before the microphone is suspect.
///
/// Below this a short warning pattern fires; classification still runs.
pub const LOW_RANGE_FLOOR: i32 = 100;

/// Bytes per image chunk.
///
/// Chosen to stay under the broker's maximum message size after protocol
/// overhead.
pub const CHUNK_SIZE: usize = 2048;

/// Fixed interval between broker reconnection attempts.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// How long an unconsumed capture request stays valid.
pub const SIGNAL_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the wake node holds its "detected" state before going idle.
pub const DETECTION_HOLD: Duration = Duration::from_secs(5);

/// Debounce window for the trigger edge.
pub const TRIGGER_DEBOUNCE: Duration = Duration::from_millis(200);

/// Sleep between control-loop turns.
pub const TURN_INTERVAL: Duration = Duration::from_millis(10);

/// Bounded wait while draining inbound broker messages.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Maximum inbound messages drained in one control-loop turn.
pub const POLL_BATCH_LIMIT: usize = 32;

/// Default public broker host.
pub const BROKER_HOST: &str = "broker.hivemq.com";

/// Default broker port (plain MQTT).
pub const BROKER_PORT: u16 = 1883;

/// Maximum MQTT packet size, large enough for a full chunk plus overhead.
pub const MAX_PACKET_SIZE: usize = 30_000;

/// Default topic prefix all node topics live under.
pub const TOPIC_PREFIX: &str = "wakecam";

/// Default device id for the wake node.
pub const WAKE_DEVICE_ID: &str = "wakecam-wroom-001";

/// Default device id for the camera node.
pub const CAM_DEVICE_ID: &str = "wakecam-cam-001";
