//! Prediction insights for coverage-bundle classification
//!
//! Turns classifier payloads into typed records and derives the display
//! state consumed by dashboards and reports. Everything here is pure and
//! synchronous; the network round trip lives in `bundlelens-classifier`.
//!
//! Modules:
//! - `types`: Prediction rows, feature contributions and parsed payloads
//! - `ingest`: Validation of raw service JSON into typed records
//! - `aggregate`: Batch summary, sorting, pagination and table state
//! - `ranking`: Feature-importance ranking and bar normalization
//! - `catalog`: Bundle display metadata with fallback for unknown labels
//! - `distribution`: Per-row class-probability view
//! - `report`: Assembled single and batch view models
//! - `config`: View configuration

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod distribution;
pub mod errors;
pub mod ingest;
pub mod ranking;
pub mod report;
pub mod types;

pub use aggregate::{
    distribution_entries, paginate, sort_rows, summarize, BatchState, BatchSummary, BatchTable,
    ConfidenceStats, DistributionEntry, Page, SortDirection, SortKey, SortState,
};
pub use catalog::{BundleCatalog, BundleDisplay, Tier, CLASS_ORDER};
pub use config::InsightConfig;
pub use distribution::{ProbabilityDistribution, ProbabilityEntry};
pub use errors::{InsightError, Result};
pub use ingest::{parse_batch, parse_batch_row, parse_metadata, parse_single, parse_single_prediction};
pub use ranking::{
    explanation_view, normalize, rank, Direction, ExplanationKind, ExplanationView,
    NormalizedContribution, Ranked,
};
pub use report::{BatchReport, SingleReport};
pub use types::{
    BatchPrediction, ConfidenceBand, FeatureContribution, PredictionRow, ServiceMetadata,
    SinglePrediction,
};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
