//! Classifier payload ingestion
//!
//! Validates raw service JSON into typed records before any aggregation runs.
//! Violations are rejected with `InsightError::MalformedResponse`; nothing is
//! coerced to a default except where the wire contract marks a field optional.

use crate::{
    aggregate::summarize,
    errors::{InsightError, Result},
    types::{BatchPrediction, FeatureContribution, PredictionRow, ServiceMetadata, SinglePrediction},
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Parse a single-prediction response into its `PredictionRow`.
pub fn parse_single(json: &Value) -> Result<PredictionRow> {
    parse_row(json, 0, "")
}

/// Parse a single-prediction response including its explanation terms.
pub fn parse_single_prediction(json: &Value) -> Result<SinglePrediction> {
    let row = parse_single(json)?;

    let predicted_index = match json.get("predicted_index") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_u64()
                .map(|index| index as usize)
                .ok_or_else(|| InsightError::malformed("predicted_index", "is not a non-negative integer"))?,
        ),
    };

    let explanations = match json.get("feature_explanations") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_explanation(item, &format!("feature_explanations[{i}]")))
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(InsightError::malformed("feature_explanations", "is not an array")),
    };

    let base_value = optional_finite(json, "base_value", "")?.unwrap_or(0.0);

    debug!(
        predicted = %row.predicted_class,
        confidence = row.confidence,
        explanations = explanations.len(),
        "ingested single prediction"
    );

    Ok(SinglePrediction {
        row,
        predicted_index,
        explanations,
        base_value,
    })
}

/// Parse one element of a batch `predictions` array.
///
/// `row_index` is the position in the uploaded file; any index the service
/// echoes back is ignored.
pub fn parse_batch_row(json: &Value, row_index: usize) -> Result<PredictionRow> {
    parse_row(json, row_index, &format!("predictions[{row_index}]"))
}

/// Parse a full batch response and recompute its summary from the rows.
pub fn parse_batch(json: &Value) -> Result<BatchPrediction> {
    let predictions = json
        .get("predictions")
        .ok_or_else(|| InsightError::malformed("predictions", "is missing"))?
        .as_array()
        .ok_or_else(|| InsightError::malformed("predictions", "is not an array"))?;

    let rows = predictions
        .iter()
        .enumerate()
        .map(|(i, item)| parse_batch_row(item, i))
        .collect::<Result<Vec<_>>>()?;

    if let Some(reported) = json.get("total_rows").and_then(Value::as_u64) {
        if reported as usize != rows.len() {
            warn!(
                reported,
                received = rows.len(),
                "batch total_rows disagrees with predictions received"
            );
        }
    }

    let global_importances = match json.get("global_importances") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => parse_importance_map(value, "global_importances")?,
    };

    let summary = summarize(&rows);

    if let Some(reported) = json
        .get("summary")
        .and_then(|s| s.get("bundle_distribution"))
        .and_then(Value::as_object)
    {
        let matches = reported.len() == summary.bundle_distribution.len()
            && reported.iter().all(|(label, count)| {
                count.as_u64().map(|c| c as usize) == summary.bundle_distribution.get(label).copied()
            });
        if !matches {
            debug!("service bundle_distribution differs from recomputed summary");
        }
    }

    debug!(
        rows = rows.len(),
        classes = summary.bundle_distribution.len(),
        global_importances = global_importances.len(),
        "ingested batch prediction"
    );

    Ok(BatchPrediction {
        rows,
        summary,
        global_importances,
    })
}

/// Parse the model metadata response.
pub fn parse_metadata(json: &Value) -> Result<ServiceMetadata> {
    let ready = match json.get("ready") {
        None | Some(Value::Null) => false,
        Some(value) => value
            .as_bool()
            .ok_or_else(|| InsightError::malformed("ready", "is not a boolean"))?,
    };

    let classes = json
        .get("classes")
        .ok_or_else(|| InsightError::malformed("classes", "is missing"))?
        .as_array()
        .ok_or_else(|| InsightError::malformed("classes", "is not an array"))?
        .iter()
        .enumerate()
        .map(|(i, label)| {
            label
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| InsightError::malformed(format!("classes[{i}]"), "is not a string"))
        })
        .collect::<Result<Vec<_>>>()?;

    let global_importances = match json.get("global_importances") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => parse_importance_map(value, "global_importances")?,
    };

    Ok(ServiceMetadata {
        ready,
        classes,
        global_importances,
    })
}

fn parse_row(json: &Value, row_index: usize, prefix: &str) -> Result<PredictionRow> {
    let object = json
        .as_object()
        .ok_or_else(|| InsightError::malformed(path(prefix, ""), "is not an object"))?;

    let predicted_class = required_str(object, "predicted_bundle", prefix)?;
    let confidence = percentage(
        object
            .get("confidence")
            .ok_or_else(|| InsightError::malformed(path(prefix, "confidence"), "is missing"))?,
        &path(prefix, "confidence"),
    )?;

    let class_probabilities = match object.get("class_probabilities") {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Object(map)) => {
            let mut probabilities = BTreeMap::new();
            for (label, value) in map {
                let field = path(prefix, &format!("class_probabilities.{label}"));
                probabilities.insert(label.clone(), percentage(value, &field)?);
            }
            probabilities
        }
        Some(_) => {
            return Err(InsightError::malformed(
                path(prefix, "class_probabilities"),
                "is not an object",
            ))
        }
    };

    let subject_id = match object.get("user_id") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        Some(_) => {
            return Err(InsightError::malformed(
                path(prefix, "user_id"),
                "is not a string or number",
            ))
        }
    };

    Ok(PredictionRow {
        row_index,
        subject_id,
        predicted_class,
        confidence,
        class_probabilities,
    })
}

fn parse_explanation(json: &Value, prefix: &str) -> Result<FeatureContribution> {
    let object = json
        .as_object()
        .ok_or_else(|| InsightError::malformed(prefix, "is not an object"))?;
    let feature = required_str(object, "feature", prefix)?;
    let value = finite(
        object
            .get("shap_value")
            .ok_or_else(|| InsightError::malformed(path(prefix, "shap_value"), "is missing"))?,
        &path(prefix, "shap_value"),
    )?;
    Ok(FeatureContribution { feature, value })
}

/// JSON objects carry no order, so importances are ingested largest first
/// with the feature name as tie break.
fn parse_importance_map(json: &Value, field: &str) -> Result<Vec<FeatureContribution>> {
    let map = json
        .as_object()
        .ok_or_else(|| InsightError::malformed(field, "is not an object"))?;

    let mut importances = map
        .iter()
        .map(|(feature, value)| {
            Ok(FeatureContribution {
                feature: feature.clone(),
                value: finite(value, &format!("{field}.{feature}"))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    importances.sort_by(|a, b| {
        b.magnitude()
            .total_cmp(&a.magnitude())
            .then_with(|| a.feature.cmp(&b.feature))
    });
    Ok(importances)
}

fn required_str(object: &Map<String, Value>, field: &str, prefix: &str) -> Result<String> {
    match object.get(field) {
        None | Some(Value::Null) => Err(InsightError::malformed(path(prefix, field), "is missing")),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(InsightError::malformed(path(prefix, field), "is empty")),
        Some(_) => Err(InsightError::malformed(path(prefix, field), "is not a string")),
    }
}

fn optional_finite(json: &Value, field: &str, prefix: &str) -> Result<Option<f64>> {
    match json.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => finite(value, &path(prefix, field)).map(Some),
    }
}

fn finite(value: &Value, field: &str) -> Result<f64> {
    let number = value
        .as_f64()
        .ok_or_else(|| InsightError::malformed(field, "is not numeric"))?;
    if !number.is_finite() {
        return Err(InsightError::malformed(field, "is not finite"));
    }
    Ok(number)
}

fn percentage(value: &Value, field: &str) -> Result<f64> {
    let number = finite(value, field)?;
    if !(0.0..=100.0).contains(&number) {
        return Err(InsightError::malformed(
            field,
            format!("{number} is outside 0..=100"),
        ));
    }
    Ok(number)
}

fn path(prefix: &str, field: &str) -> String {
    match (prefix.is_empty(), field.is_empty()) {
        (true, true) => "payload".to_string(),
        (true, false) => field.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}.{field}"),
    }
}
