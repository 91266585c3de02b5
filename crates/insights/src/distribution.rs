//! Class-probability view for one prediction
//!
//! Probabilities are shown as received. Vectors that do not sum to 100 are
//! neither rescaled nor rejected; the view reports the sum and whether it is
//! within the configured tolerance.

use crate::{
    catalog::{BundleCatalog, BundleDisplay},
    types::PredictionRow,
};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityEntry {
    pub label: String,
    /// 0..=100; catalog classes absent from the payload show 0
    pub probability: f64,
    pub is_predicted: bool,
    pub display: BundleDisplay,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityDistribution {
    /// Highest probability first
    pub entries: Vec<ProbabilityEntry>,
    /// Sum of the probabilities present in the payload
    pub total: f64,
    pub within_tolerance: bool,
}

impl ProbabilityDistribution {
    /// `None` when the row carries no probability vector.
    pub fn from_row(row: &PredictionRow, catalog: &BundleCatalog, tolerance: f64) -> Option<Self> {
        if !row.has_probabilities() {
            return None;
        }

        let known = catalog.labels().map(|label| {
            (
                label.to_string(),
                row.class_probabilities.get(label).copied().unwrap_or(0.0),
            )
        });
        let unknown = row
            .class_probabilities
            .iter()
            .filter(|(label, _)| !catalog.is_known(label))
            .map(|(label, p)| (label.clone(), *p));

        let mut entries: Vec<ProbabilityEntry> = known
            .chain(unknown)
            .map(|(label, probability)| ProbabilityEntry {
                is_predicted: label == row.predicted_class,
                display: catalog.resolve(&label).into_owned(),
                label,
                probability,
            })
            .collect();
        entries.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        let total: f64 = row.class_probabilities.values().sum();
        let within_tolerance = (total - 100.0).abs() <= tolerance;
        if !within_tolerance {
            warn!(
                row = row.row_index,
                total, tolerance, "class probabilities do not sum to 100"
            );
        }

        Some(Self {
            entries,
            total,
            within_tolerance,
        })
    }

    /// Entry for the predicted class, if the vector includes it
    pub fn predicted(&self) -> Option<&ProbabilityEntry> {
        self.entries.iter().find(|e| e.is_predicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CLASS_ORDER;
    use std::collections::BTreeMap;

    fn row_with(probabilities: &[(&str, f64)], predicted: &str) -> PredictionRow {
        PredictionRow {
            row_index: 7,
            subject_id: "U7".into(),
            predicted_class: predicted.into(),
            confidence: probabilities
                .iter()
                .find(|(l, _)| *l == predicted)
                .map_or(0.0, |(_, p)| *p),
            class_probabilities: probabilities
                .iter()
                .map(|(l, p)| (l.to_string(), *p))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn missing_vector_cannot_render() {
        let row = row_with(&[], "Home_Standard");
        assert!(ProbabilityDistribution::from_row(&row, &BundleCatalog::builtin(), 1.0).is_none());
    }

    #[test]
    fn every_catalog_class_is_listed_highest_first() {
        let row = row_with(&[("Home_Premium", 70.0), ("Home_Standard", 30.0)], "Home_Premium");
        let dist = ProbabilityDistribution::from_row(&row, &BundleCatalog::builtin(), 1.0).unwrap();
        assert_eq!(dist.entries.len(), CLASS_ORDER.len());
        assert_eq!(dist.entries[0].label, "Home_Premium");
        assert!(dist.entries[0].is_predicted);
        assert_eq!(dist.entries[1].label, "Home_Standard");
        assert_eq!(dist.entries[2].probability, 0.0);
        assert_eq!(dist.entries[2].label, CLASS_ORDER[0]);
        assert!(dist.within_tolerance);
    }

    #[test]
    fn unknown_labels_are_kept_and_sum_is_reported() {
        let row = row_with(&[("Mystery_Bundle", 60.0), ("Basic_Health", 30.0)], "Mystery_Bundle");
        let dist = ProbabilityDistribution::from_row(&row, &BundleCatalog::builtin(), 1.0).unwrap();
        assert_eq!(dist.entries.len(), CLASS_ORDER.len() + 1);
        let predicted = dist.predicted().unwrap();
        assert_eq!(predicted.label, "Mystery_Bundle");
        assert!(predicted.display.is_fallback());
        assert_eq!(dist.total, 90.0);
        assert!(!dist.within_tolerance);
    }
}
