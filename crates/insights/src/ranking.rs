//! Feature-importance ranking
//!
//! Shared by local (signed, per-prediction) attributions and global
//! (non-negative, model-level) importances.

use crate::types::FeatureContribution;
use serde::Serialize;

/// Effect of a local attribution on the predicted class.
///
/// Zero counts as supporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Supports,
    Opposes,
}

impl Direction {
    pub fn of(value: f64) -> Self {
        if value >= 0.0 {
            Direction::Supports
        } else {
            Direction::Opposes
        }
    }
}

/// Leading contributions by magnitude
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked {
    pub items: Vec<FeatureContribution>,
    /// Whether contributions were cut off at `top_n`
    pub has_more: bool,
}

/// Magnitude used for ordering and scaling; non-finite values weigh nothing.
fn weight(contribution: &FeatureContribution) -> f64 {
    let magnitude = contribution.magnitude();
    if magnitude.is_finite() {
        magnitude
    } else {
        0.0
    }
}

/// Rank by descending `|value|`, ties in input order, keeping `top_n`.
pub fn rank(contributions: &[FeatureContribution], top_n: usize) -> Ranked {
    let mut items = contributions.to_vec();
    items.sort_by(|a, b| weight(b).total_cmp(&weight(a)));
    let has_more = items.len() > top_n;
    items.truncate(top_n);
    Ranked { items, has_more }
}

/// One display bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedContribution {
    pub feature: String,
    pub value: f64,
    /// `|value|` relative to the largest magnitude in the set, 0..=100
    pub magnitude_percent: f64,
    pub direction: Direction,
}

/// Scale magnitudes to bar widths. Order is preserved; an all-zero set
/// yields zero widths and non-finite values get an empty bar.
pub fn normalize(contributions: &[FeatureContribution]) -> Vec<NormalizedContribution> {
    let max = contributions.iter().map(weight).fold(0.0_f64, f64::max);

    contributions
        .iter()
        .map(|c| NormalizedContribution {
            feature: c.feature.clone(),
            value: c.value,
            magnitude_percent: if max > 0.0 {
                (weight(c) / max * 100.0).min(100.0)
            } else {
                0.0
            },
            direction: Direction::of(c.value),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationKind {
    /// Signed SHAP-style attributions for one prediction
    Local,
    /// Model-level importances
    Global,
}

/// Ranked and scaled bars ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationView {
    pub kind: ExplanationKind,
    pub bars: Vec<NormalizedContribution>,
    pub has_more: bool,
    pub total_features: usize,
}

/// Build the bar view, or `None` when there is nothing to explain.
///
/// Missing explanation data renders nothing at all, unlike an empty batch.
pub fn explanation_view(
    contributions: &[FeatureContribution],
    top_n: usize,
    kind: ExplanationKind,
) -> Option<ExplanationView> {
    if contributions.is_empty() {
        return None;
    }
    let ranked = rank(contributions, top_n);
    Some(ExplanationView {
        kind,
        bars: normalize(&ranked.items),
        has_more: ranked.has_more,
        total_features: contributions.len(),
    })
}
