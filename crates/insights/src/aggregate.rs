//! Batch aggregation, ordering and pagination
//!
//! All functions here are pure over an immutable snapshot of rows and may be
//! recomputed on every refresh.

use crate::{
    catalog::{BundleCatalog, BundleDisplay},
    types::PredictionRow,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Aggregate confidence statistics over a non-empty batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Summary of a batch, recomputed wholesale whenever the rows change
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_rows: usize,
    /// Count per predicted class. Only classes that occur are present.
    pub bundle_distribution: BTreeMap<String, usize>,
    /// `None` for an empty batch
    pub confidence: Option<ConfidenceStats>,
}

impl BatchSummary {
    pub fn is_empty(&self) -> bool {
        self.total_rows == 0
    }

    pub fn avg_confidence(&self) -> f64 {
        self.confidence.map_or(0.0, |c| c.avg)
    }

    pub fn min_confidence(&self) -> f64 {
        self.confidence.map_or(0.0, |c| c.min)
    }

    pub fn max_confidence(&self) -> f64 {
        self.confidence.map_or(0.0, |c| c.max)
    }
}

/// Display state of a batch: an empty upload is a state of its own, not an error
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchState {
    Empty,
    Ready { summary: BatchSummary },
}

impl From<BatchSummary> for BatchState {
    fn from(summary: BatchSummary) -> Self {
        if summary.is_empty() {
            BatchState::Empty
        } else {
            BatchState::Ready { summary }
        }
    }
}

/// Summarize a batch of rows.
///
/// Class labels are not validated; unknown labels are counted like any other.
pub fn summarize(rows: &[PredictionRow]) -> BatchSummary {
    let mut bundle_distribution = BTreeMap::new();
    for row in rows {
        *bundle_distribution
            .entry(row.predicted_class.clone())
            .or_insert(0) += 1;
    }

    let confidence = if rows.is_empty() {
        None
    } else {
        let (sum, min, max) = rows.iter().fold(
            (0.0_f64, f64::INFINITY, f64::NEG_INFINITY),
            |(sum, min, max), row| (sum + row.confidence, min.min(row.confidence), max.max(row.confidence)),
        );
        // Rounding in the sum can push the mean a hair past an extremum.
        let avg = (sum / rows.len() as f64).clamp(min, max);
        Some(ConfidenceStats { avg, min, max })
    };

    BatchSummary {
        total_rows: rows.len(),
        bundle_distribution,
        confidence,
    }
}

/// Column a batch table can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    RowIndex,
    Confidence,
    PredictedClass,
}

impl SortKey {
    /// Direction applied when switching to this key.
    ///
    /// Confidence opens descending so the most confident rows come first.
    pub fn default_direction(self) -> SortDirection {
        match self {
            SortKey::Confidence => SortDirection::Descending,
            SortKey::RowIndex | SortKey::PredictedClass => SortDirection::Ascending,
        }
    }

    fn compare(self, a: &PredictionRow, b: &PredictionRow) -> Ordering {
        match self {
            SortKey::RowIndex => a.row_index.cmp(&b.row_index),
            SortKey::Confidence => a.confidence.total_cmp(&b.confidence),
            SortKey::PredictedClass => a.predicted_class.cmp(&b.predicted_class),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::RowIndex => "row_index",
            SortKey::Confidence => "confidence",
            SortKey::PredictedClass => "predicted_bundle",
        })
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "row" | "row_index" | "index" => Ok(SortKey::RowIndex),
            "confidence" => Ok(SortKey::Confidence),
            "class" | "bundle" | "predicted_bundle" | "predicted_class" => Ok(SortKey::PredictedClass),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Current ordering of a batch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::RowIndex,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortState {
    /// State after a sort request on `key`: the same key flips direction,
    /// a new key starts from its default direction.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                key,
                direction: key.default_direction(),
            }
        }
    }
}

/// Stable sort of `rows`; ties keep their input order.
pub fn sort_rows(rows: &[PredictionRow], key: SortKey, direction: SortDirection) -> Vec<PredictionRow> {
    let mut sorted = rows.to_vec();
    match direction {
        SortDirection::Ascending => sorted.sort_by(|a, b| key.compare(a, b)),
        SortDirection::Descending => sorted.sort_by(|a, b| key.compare(b, a)),
    }
    sorted
}

/// Leading slice of a sorted row list
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Page<'a> {
    pub shown: &'a [PredictionRow],
    /// Whether the list is longer than the preview limit
    pub has_more: bool,
}

pub fn paginate(rows: &[PredictionRow], limit: usize) -> Page<'_> {
    Page {
        shown: &rows[..rows.len().min(limit)],
        has_more: rows.len() > limit,
    }
}

/// Sortable, pageable view over one batch result.
///
/// A new upload builds a new table; rows are never merged.
#[derive(Debug, Clone)]
pub struct BatchTable {
    /// Rows in uploaded-file order
    rows: Vec<PredictionRow>,
    sorted: Vec<PredictionRow>,
    summary: BatchSummary,
    sort: SortState,
    show_all: bool,
    preview_limit: usize,
}

impl BatchTable {
    pub fn new(rows: Vec<PredictionRow>, preview_limit: usize) -> Self {
        let summary = summarize(&rows);
        let sort = SortState::default();
        Self {
            sorted: sort_rows(&rows, sort.key, sort.direction),
            rows,
            summary,
            sort,
            show_all: false,
            preview_limit,
        }
    }

    /// Apply a sort request on `key` and return the resulting state
    pub fn sort_by(&mut self, key: SortKey) -> SortState {
        self.sort = self.sort.toggle(key);
        self.sorted = sort_rows(&self.rows, self.sort.key, self.sort.direction);
        self.sort
    }

    pub fn set_show_all(&mut self, show_all: bool) {
        self.show_all = show_all;
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }

    pub fn state(&self) -> BatchState {
        BatchState::from(self.summary.clone())
    }

    /// All rows in the current order
    pub fn rows(&self) -> &[PredictionRow] {
        &self.sorted
    }

    /// Rows currently visible
    pub fn page(&self) -> Page<'_> {
        let mut page = paginate(&self.sorted, self.preview_limit);
        if self.show_all {
            page.shown = &self.sorted;
        }
        page
    }
}

/// One bar of the bundle distribution chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionEntry {
    pub label: String,
    pub count: usize,
    /// Count relative to the largest bucket, 0..=100
    pub share_percent: f64,
    pub display: BundleDisplay,
}

/// Distribution entries for display, largest first.
///
/// Known labels are laid out in catalog order and unknown ones after them,
/// then stably sorted by count, so equal counts keep catalog order. The first
/// entry is the batch's top bundle.
pub fn distribution_entries(summary: &BatchSummary, catalog: &BundleCatalog) -> Vec<DistributionEntry> {
    let mut labels: Vec<&String> = summary.bundle_distribution.keys().collect();
    labels.sort_by(|a, b| {
        let rank = |label: &str| catalog.position(label).unwrap_or(usize::MAX);
        rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
    });

    let max_count = summary
        .bundle_distribution
        .values()
        .copied()
        .max()
        .unwrap_or(0)
        .max(1);

    let mut entries: Vec<DistributionEntry> = labels
        .into_iter()
        .filter_map(|label| {
            let count = summary.bundle_distribution.get(label).copied().unwrap_or(0);
            (count > 0).then(|| DistributionEntry {
                label: label.clone(),
                count,
                share_percent: count as f64 / max_count as f64 * 100.0,
                display: catalog.resolve(label).into_owned(),
            })
        })
        .collect();

    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}
