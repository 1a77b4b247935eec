//! Wake-word classification and detection policy.

pub mod classifier;
pub mod energy;
pub mod policy;

pub use classifier::{ClassificationResult, Classifier, MockClassifier, Score};
pub use energy::EnergyClassifier;
pub use policy::{DetectionEvent, DetectionPolicy};
