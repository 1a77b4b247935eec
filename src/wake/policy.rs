//! Threshold-and-argmax policy over raw classification scores.
//!
//! A single linear pass: excluded labels never fire, the strictly highest
//! remaining confidence wins (first seen wins on ties, iteration order is
//! the model's stable label-table order), and nothing fires unless that
//! confidence strictly exceeds the threshold.

use crate::config::DetectionConfig;
use crate::wake::classifier::Score;
use std::time::Instant;

/// A qualifying wake-word detection.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionEvent {
    pub label: String,
    pub confidence: f32,
    pub at: Instant,
}

/// Converts raw scores into a detection or "no detection".
#[derive(Debug, Clone)]
pub struct DetectionPolicy {
    threshold: f32,
    excluded: Vec<String>,
}

impl DetectionPolicy {
    pub fn new(threshold: f32, excluded: Vec<String>) -> Self {
        Self { threshold, excluded }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.threshold, config.excluded_labels.clone())
    }

    /// The configured confidence threshold (strict `>`).
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Evaluates one classification result.
    ///
    /// Returns `None` when no non-excluded label strictly exceeds the
    /// threshold.
    pub fn evaluate(&self, scores: &[Score], now: Instant) -> Option<DetectionEvent> {
        let mut best: Option<&Score> = None;
        for score in scores {
            if self.excluded.iter().any(|e| e == &score.label) {
                continue;
            }
            // Strict comparison keeps first-seen-wins on ties
            if best.is_none_or(|b| score.confidence > b.confidence) {
                best = Some(score);
            }
        }

        let best = best?;
        if best.confidence > self.threshold {
            Some(DetectionEvent {
                label: best.label.clone(),
                confidence: best.confidence,
                at: now,
            })
        } else {
            None
        }
    }
}
