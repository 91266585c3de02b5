//! Type definitions for classifier results

use crate::aggregate::BatchSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One classified record.
///
/// Produced only by ingestion (`parse_single`, `parse_batch_row`) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    /// Position in the uploaded batch (0 for single predictions)
    pub row_index: usize,
    /// Opaque identifier correlating back to the input row
    pub subject_id: String,
    /// Predicted bundle label
    pub predicted_class: String,
    /// Probability mass of the predicted class, 0..=100
    pub confidence: f64,
    /// Class label to probability, 0..=100. Empty when the service sent none.
    #[serde(default)]
    pub class_probabilities: BTreeMap<String, f64>,
}

impl PredictionRow {
    /// Display band for this row's confidence
    pub fn confidence_band(&self) -> ConfidenceBand {
        ConfidenceBand::of(self.confidence)
    }

    /// Whether a probability distribution can be rendered for this row
    pub fn has_probabilities(&self) -> bool {
        !self.class_probabilities.is_empty()
    }
}

/// Confidence bands used to color confidence figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    /// 80 and above
    High,
    /// 60 up to 80
    Medium,
    /// Below 60
    Low,
}

impl ConfidenceBand {
    pub fn of(confidence: f64) -> Self {
        if confidence >= 80.0 {
            ConfidenceBand::High
        } else if confidence >= 60.0 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// One attribution term.
///
/// Local (per-prediction) values are signed; global importances are
/// non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub value: f64,
}

impl FeatureContribution {
    pub fn new(feature: impl Into<String>, value: f64) -> Self {
        Self {
            feature: feature.into(),
            value,
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.value.abs()
    }
}

/// Parsed single-prediction response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinglePrediction {
    pub row: PredictionRow,
    /// Index of the predicted class in the service's class list
    pub predicted_index: Option<usize>,
    /// Signed per-feature attributions, in service order
    pub explanations: Vec<FeatureContribution>,
    /// Model base value the attributions are relative to
    pub base_value: f64,
}

/// Parsed batch response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchPrediction {
    /// Rows in uploaded-file order
    pub rows: Vec<PredictionRow>,
    /// Summary recomputed from `rows`
    pub summary: BatchSummary,
    /// Model-level importances, largest first. Empty when absent.
    pub global_importances: Vec<FeatureContribution>,
}

/// Parsed `/api/classify/metadata` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceMetadata {
    pub ready: bool,
    pub classes: Vec<String>,
    pub global_importances: Vec<FeatureContribution>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_band_boundaries() {
        assert_eq!(ConfidenceBand::of(100.0), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::of(80.0), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::of(79.99), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::of(60.0), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::of(59.9), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::of(0.0), ConfidenceBand::Low);
    }

    #[test]
    fn missing_probabilities_are_not_renderable() {
        let row = PredictionRow {
            row_index: 0,
            subject_id: "U1".into(),
            predicted_class: "Home_Standard".into(),
            confidence: 71.0,
            class_probabilities: BTreeMap::new(),
        };
        assert!(!row.has_probabilities());
        assert_eq!(row.confidence_band(), ConfidenceBand::Medium);
    }
}
