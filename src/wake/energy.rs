//! Energy-based stand-in classifier for hosts without a trained model.
//!
//! Maps the window's dynamic range onto a confidence for a single wake
//! label, with the remainder assigned to `background`. Useful for wiring
//! and soak tests of the full pipeline; a production deployment puts a
//! real neural classifier behind the same trait.

use crate::audio::window::SampleWindow;
use crate::error::{Result, WakecamError};
use crate::wake::classifier::{ClassificationResult, Classifier, Score};

const FULL_SCALE_RANGE: f32 = (i16::MAX as f32) - (i16::MIN as f32);

pub struct EnergyClassifier {
    expected_samples: usize,
    labels: Vec<String>,
}

impl EnergyClassifier {
    pub fn new(expected_samples: usize, wake_label: &str) -> Self {
        Self {
            expected_samples,
            labels: vec!["background".to_string(), wake_label.to_string()],
        }
    }
}

impl Classifier for EnergyClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, window: &SampleWindow) -> Result<ClassificationResult> {
        if window.samples().len() != self.expected_samples {
            return Err(WakecamError::ModelInput {
                expected: self.expected_samples,
                actual: window.samples().len(),
            });
        }
        let confidence = (window.dynamic_range() as f32 / FULL_SCALE_RANGE).clamp(0.0, 1.0);
        Ok(vec![
            Score {
                label: self.labels[0].clone(),
                confidence: 1.0 - confidence,
            },
            Score {
                label: self.labels[1].clone(),
                confidence,
            },
        ])
    }
}
