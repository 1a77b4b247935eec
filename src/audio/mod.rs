//! Audio capture for the wake node.

pub mod capture;
pub mod pcm;
pub mod window;

pub use capture::{AudioSource, MockAudioSource, capture_window};
pub use pcm::{PcmFileSource, SilenceSource};
pub use window::SampleWindow;
