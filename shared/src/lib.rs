use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// The closed set of labels a prediction can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClassLabel {
    Cat,
    Dog,
    Uncertain,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionResult {
    pub class_label: ClassLabel,
    /// Probability of the winning class before the uncertainty rule, in `[0, 1]`.
    pub confidence: f32,
    pub message: String,
}

impl PredictionResult {
    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.0
    }

    pub fn is_uncertain(&self) -> bool {
        self.class_label == ClassLabel::Uncertain
    }
}

/// Lifecycle of the classifier model as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModelStatus {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Failed,
}
