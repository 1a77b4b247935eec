//! Audible feedback patterns.
//!
//! A small fixed catalogue of buzzer patterns, emitted synchronously: a
//! pattern occupies the control loop for its full duration, which is fine
//! because patterns are short and serve as a user-facing cue. Feedback is
//! pure output and never feeds back into the pipeline logic.

use std::time::Duration;
use tracing::debug;

/// One tone step: frequency, on-time, then silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneStep {
    pub freq_hz: u16,
    pub on_ms: u64,
    pub off_ms: u64,
}

const fn step(freq_hz: u16, on_ms: u64, off_ms: u64) -> ToneStep {
    ToneStep {
        freq_hz,
        on_ms,
        off_ms,
    }
}

const BASE_TONE: u16 = 2000;

/// The fixed pattern catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackPattern {
    /// Buzzer off; no detection.
    Idle,
    /// One short beep marking the start of a cycle.
    Start,
    /// Wake word detected: three short beeps and one long.
    Detected,
    /// One very short beep, e.g. suspect microphone.
    Warning,
    /// Alternating high and low tones.
    Error,
    /// Two medium beeps.
    Success,
}

impl FeedbackPattern {
    /// The tone schedule for this pattern.
    pub fn schedule(&self) -> &'static [ToneStep] {
        match self {
            FeedbackPattern::Idle => &[],
            FeedbackPattern::Start => const { &[step(BASE_TONE, 50, 0)] },
            FeedbackPattern::Detected => const {
                &[
                    step(BASE_TONE, 100, 100),
                    step(BASE_TONE, 100, 100),
                    step(BASE_TONE, 100, 100),
                    step(BASE_TONE, 500, 0),
                ]
            },
            FeedbackPattern::Warning => const { &[step(BASE_TONE, 50, 0)] },
            FeedbackPattern::Error => const {
                &[
                    step(1000, 200, 0),
                    step(500, 200, 0),
                    step(1000, 200, 0),
                    step(500, 200, 0),
                ]
            },
            FeedbackPattern::Success => {
                const { &[step(BASE_TONE, 200, 100), step(BASE_TONE, 200, 0)] }
            }
        }
    }

    /// Total time the pattern occupies the control loop.
    pub fn total_duration(&self) -> Duration {
        let ms: u64 = self.schedule().iter().map(|s| s.on_ms + s.off_ms).sum();
        Duration::from_millis(ms)
    }
}

/// Trait for the feedback output device.
pub trait FeedbackEmitter {
    /// Plays a pattern to completion (blocking).
    fn emit(&mut self, pattern: FeedbackPattern);
}

/// Emitter that paces through the schedule with sleeps.
///
/// Tone generation itself is a peripheral concern; this default keeps the
/// timing contract so the loop blocks exactly as the hardware would.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepFeedback;

impl FeedbackEmitter for SleepFeedback {
    fn emit(&mut self, pattern: FeedbackPattern) {
        debug!(?pattern, "feedback");
        for step in pattern.schedule() {
            std::thread::sleep(Duration::from_millis(step.on_ms + step.off_ms));
        }
    }
}

/// Mock emitter that records patterns for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockFeedback {
    pub emitted: Vec<FeedbackPattern>,
}

impl MockFeedback {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackEmitter for MockFeedback {
    fn emit(&mut self, pattern: FeedbackPattern) {
        self.emitted.push(pattern);
    }
}
