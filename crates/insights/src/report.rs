//! Assembled view models handed to display collaborators

use crate::{
    aggregate::{distribution_entries, BatchState, BatchTable, DistributionEntry, Page, SortState},
    catalog::{BundleCatalog, BundleDisplay},
    config::InsightConfig,
    distribution::ProbabilityDistribution,
    ranking::{explanation_view, ExplanationKind, ExplanationView},
    types::{ConfidenceBand, FeatureContribution, PredictionRow, SinglePrediction},
};
use serde::Serialize;

/// Everything shown for one single prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleReport {
    pub row: PredictionRow,
    pub bundle: BundleDisplay,
    pub band: ConfidenceBand,
    pub predicted_index: Option<usize>,
    pub base_value: f64,
    pub distribution: Option<ProbabilityDistribution>,
    pub explanation: Option<ExplanationView>,
}

impl SingleReport {
    pub fn build(prediction: &SinglePrediction, config: &InsightConfig, catalog: &BundleCatalog) -> Self {
        let row = &prediction.row;
        Self {
            bundle: catalog.resolve(&row.predicted_class).into_owned(),
            band: row.confidence_band(),
            predicted_index: prediction.predicted_index,
            base_value: prediction.base_value,
            distribution: ProbabilityDistribution::from_row(row, catalog, config.probability_tolerance),
            explanation: explanation_view(
                &prediction.explanations,
                config.explanation_top_n,
                ExplanationKind::Local,
            ),
            row: row.clone(),
        }
    }
}

/// Everything shown for one batch upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport<'a> {
    pub state: BatchState,
    pub sort: SortState,
    /// Largest bucket first; the first entry is the top bundle
    pub distribution: Vec<DistributionEntry>,
    pub rows: Page<'a>,
    pub global_importance: Option<ExplanationView>,
}

impl<'a> BatchReport<'a> {
    pub fn build(
        table: &'a BatchTable,
        global_importances: &[FeatureContribution],
        config: &InsightConfig,
        catalog: &BundleCatalog,
    ) -> Self {
        Self {
            state: table.state(),
            sort: table.sort_state(),
            distribution: distribution_entries(table.summary(), catalog),
            rows: table.page(),
            global_importance: explanation_view(
                global_importances,
                config.global_top_n,
                ExplanationKind::Global,
            ),
        }
    }

    pub fn top_bundle(&self) -> Option<&DistributionEntry> {
        self.distribution.first()
    }
}
