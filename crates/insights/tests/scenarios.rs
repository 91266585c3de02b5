//! End-to-end scenarios over service payloads

use bundlelens_insights::{
    distribution_entries, parse_batch, parse_single, rank, summarize, BatchState, BatchTable,
    BundleCatalog, FeatureContribution, InsightError, PredictionRow, SortKey,
};
use serde_json::json;
use std::collections::BTreeMap;

fn row(class: &str, confidence: f64) -> PredictionRow {
    PredictionRow {
        row_index: 0,
        subject_id: String::new(),
        predicted_class: class.to_string(),
        confidence,
        class_probabilities: BTreeMap::new(),
    }
}

#[test]
fn summary_of_three_rows() {
    let rows = vec![row("X", 90.0), row("Y", 70.0), row("X", 80.0)];
    let summary = summarize(&rows);

    assert_eq!(summary.bundle_distribution, BTreeMap::from([("X".to_string(), 2), ("Y".to_string(), 1)]));
    assert_eq!(summary.avg_confidence(), 80.0);
    assert_eq!(summary.min_confidence(), 70.0);
    assert_eq!(summary.max_confidence(), 90.0);
}

#[test]
fn empty_rows_are_the_empty_state() {
    let summary = summarize(&[]);
    assert_eq!(summary.total_rows, 0);
    assert!(summary.bundle_distribution.is_empty());
    assert_eq!(BatchState::from(summary), BatchState::Empty);
}

#[test]
fn rank_top_two_with_magnitude_tie() {
    let contributions = vec![
        FeatureContribution::new("A", -5.0),
        FeatureContribution::new("B", 3.0),
        FeatureContribution::new("C", 5.0),
    ];
    let ranked = rank(&contributions, 2);
    assert_eq!(
        ranked.items,
        vec![FeatureContribution::new("A", -5.0), FeatureContribution::new("C", 5.0)]
    );
}

#[test]
fn single_without_confidence_is_malformed() {
    let result = parse_single(&json!({
        "predicted_bundle": "Home_Standard",
        "class_probabilities": { "Home_Standard": 100.0 }
    }));
    match result {
        Err(InsightError::MalformedResponse { field, .. }) => assert_eq!(field, "confidence"),
        other => panic!("expected malformed response, got {other:?}"),
    }
}

#[test]
fn unrecognized_class_still_counts() {
    let batch = parse_batch(&json!({
        "total_rows": 3,
        "predictions": [
            { "row_index": 0, "user_id": "A1", "predicted_bundle": "Mystery_Bundle", "confidence": 66.0 },
            { "row_index": 1, "user_id": "A2", "predicted_bundle": "Home_Standard", "confidence": 81.5 },
            { "row_index": 2, "user_id": "A3", "predicted_bundle": "Mystery_Bundle", "confidence": 72.5 }
        ],
        "summary": {
            "bundle_distribution": { "Mystery_Bundle": 2, "Home_Standard": 1 },
            "avg_confidence": 73.33, "min_confidence": 66.0, "max_confidence": 81.5
        }
    }))
    .unwrap();

    assert_eq!(batch.rows.len(), 3);
    assert_eq!(batch.summary.bundle_distribution.get("Mystery_Bundle"), Some(&2));
    assert_eq!(batch.summary.min_confidence(), 66.0);

    let catalog = BundleCatalog::builtin();
    let entries = distribution_entries(&batch.summary, &catalog);
    assert_eq!(entries[0].label, "Mystery_Bundle");
    assert!(entries[0].display.is_fallback());
    assert_eq!(entries[0].display.name, "Mystery_Bundle");
}

#[test]
fn uploaded_order_is_the_initial_table_order() {
    let batch = parse_batch(&json!({
        "total_rows": 3,
        "predictions": [
            { "row_index": 2, "user_id": "C", "predicted_bundle": "Renter_Basic", "confidence": 50.0 },
            { "row_index": 0, "user_id": "A", "predicted_bundle": "Home_Premium", "confidence": 90.0 },
            { "row_index": 1, "user_id": "B", "predicted_bundle": "Basic_Health", "confidence": 70.0 }
        ]
    }))
    .unwrap();

    let mut table = BatchTable::new(batch.rows, 50);
    let ids: Vec<_> = table.rows().iter().map(|r| r.subject_id.as_str()).collect();
    assert_eq!(ids, vec!["C", "A", "B"]);

    table.sort_by(SortKey::Confidence);
    let ids: Vec<_> = table.rows().iter().map(|r| r.subject_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);

    table.sort_by(SortKey::PredictedClass);
    let ids: Vec<_> = table.rows().iter().map(|r| r.subject_id.as_str()).collect();
    assert_eq!(ids, vec!["B", "A", "C"]);
}
