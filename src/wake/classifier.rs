//! Classifier seam over the pretrained wake-word model.

use crate::audio::window::SampleWindow;
use crate::error::{Result, WakecamError};

/// Confidence score for one label.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub label: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
}

/// One score per known label, in stable label-table order.
///
/// Produced fresh per classification call; never retained.
pub type ClassificationResult = Vec<Score>;

/// Trait for the wake-word model runtime.
///
/// `classify` is synchronous and deterministic for a given model and window.
pub trait Classifier {
    /// Known labels in the model's table order, stable across runs.
    fn labels(&self) -> &[String];

    /// Run inference over a full sample window.
    ///
    /// Fails with a model-input error when the window length does not match
    /// the model's expected input length — a configuration invariant that
    /// should never trip at runtime given fixed buffer sizing.
    fn classify(&self, window: &SampleWindow) -> Result<ClassificationResult>;
}

/// Mock classifier for testing
#[derive(Debug, Clone)]
pub struct MockClassifier {
    labels: Vec<String>,
    confidences: Vec<f32>,
    expected_samples: usize,
    fail_message: Option<String>,
}

impl MockClassifier {
    /// Create a mock expecting `expected_samples` input samples.
    pub fn new(expected_samples: usize) -> Self {
        Self {
            labels: Vec::new(),
            confidences: Vec::new(),
            expected_samples,
            fail_message: None,
        }
    }

    /// Configure the scores the mock returns, in table order.
    pub fn with_scores(mut self, scores: &[(&str, f32)]) -> Self {
        self.labels = scores.iter().map(|(l, _)| l.to_string()).collect();
        self.confidences = scores.iter().map(|(_, c)| *c).collect();
        self
    }

    /// Configure the mock to fail inference.
    pub fn with_failure(mut self, message: &str) -> Self {
        self.fail_message = Some(message.to_string());
        self
    }
}

impl Classifier for MockClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, window: &SampleWindow) -> Result<ClassificationResult> {
        if window.capacity() != self.expected_samples {
            return Err(WakecamError::ModelInput {
                expected: self.expected_samples,
                actual: window.capacity(),
            });
        }
        if let Some(message) = &self.fail_message {
            return Err(WakecamError::Classification {
                message: message.clone(),
            });
        }
        Ok(self
            .labels
            .iter()
            .zip(&self.confidences)
            .map(|(label, &confidence)| Score {
                label: label.clone(),
                confidence,
            })
            .collect())
    }
}
