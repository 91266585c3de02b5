//! Plain-text rendering of insight view models

use bundlelens_insights::{
    explanation_view, BatchReport, BatchState, BundleCatalog, BundleDisplay, ConfidenceBand,
    Direction, ExplanationKind, ExplanationView, ProbabilityDistribution, ServiceMetadata,
    SingleReport, SortDirection, Tier,
};

const BAR_WIDTH: usize = 24;

pub fn metadata(meta: &ServiceMetadata, catalog: &BundleCatalog, global_top_n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Model: {}\n",
        if meta.ready { "ready" } else { "not loaded" }
    ));

    out.push_str(&format!("\nClasses ({})\n", meta.classes.len()));
    for class in &meta.classes {
        out.push_str(&format!("  {}\n", bundle_line(&catalog.resolve(class))));
    }

    if let Some(view) = explanation_view(&meta.global_importances, global_top_n, ExplanationKind::Global) {
        out.push('\n');
        out.push_str(&explanation(&view));
    }
    out
}

pub fn single(report: &SingleReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Recommended bundle: {}\n", bundle_line(&report.bundle)));
    out.push_str(&format!(
        "Confidence: {:.1}% ({})\n",
        report.row.confidence,
        band(report.band)
    ));
    if !report.row.subject_id.is_empty() {
        out.push_str(&format!("Client: {}\n", report.row.subject_id));
    }

    if let Some(distribution) = &report.distribution {
        out.push('\n');
        out.push_str(&probabilities(distribution));
    }

    match &report.explanation {
        Some(view) => {
            out.push('\n');
            out.push_str(&explanation(view));
            out.push_str(&format!("  base value {:+.4}\n", report.base_value));
        }
        None => out.push_str("\nNo feature explanation available.\n"),
    }
    out
}

pub fn batch(report: &BatchReport<'_>) -> String {
    let summary = match &report.state {
        BatchState::Empty => return "No predictions in this upload.\n".to_string(),
        BatchState::Ready { summary } => summary,
    };

    let mut out = String::new();
    out.push_str(&format!(
        "Rows: {}  Avg confidence: {:.1}%  Min: {:.1}%  Max: {:.1}%\n",
        summary.total_rows,
        summary.avg_confidence(),
        summary.min_confidence(),
        summary.max_confidence()
    ));
    let share_of_rows = |count: usize| count as f64 / summary.total_rows.max(1) as f64 * 100.0;
    if let Some(top) = report.top_bundle() {
        out.push_str(&format!(
            "Top bundle: {} ({} rows, {:.1}%)\n",
            top.display.name,
            top.count,
            share_of_rows(top.count)
        ));
    }

    out.push_str("\nBundle distribution\n");
    for entry in &report.distribution {
        out.push_str(&format!(
            "  {:<28} {:>5}  {:>5.1}%  {}\n",
            display_name(&entry.display),
            entry.count,
            share_of_rows(entry.count),
            bar(entry.share_percent)
        ));
    }

    let direction = match report.sort.direction {
        SortDirection::Ascending => "ascending",
        SortDirection::Descending => "descending",
    };
    out.push_str(&format!(
        "\nPredictions (sorted by {}, {})\n",
        report.sort.key, direction
    ));
    out.push_str(&format!(
        "  {:>5}  {:<12} {:<28} {:>10}\n",
        "#", "Client", "Bundle", "Confidence"
    ));
    for row in report.rows.shown {
        out.push_str(&format!(
            "  {:>5}  {:<12} {:<28} {:>9.1}% {}\n",
            row.row_index + 1,
            row.subject_id,
            row.predicted_class,
            row.confidence,
            band(row.confidence_band())
        ));
    }
    if report.rows.shown.len() < summary.total_rows {
        out.push_str(&format!(
            "  showing {} of {} rows; pass --all to show every row\n",
            report.rows.shown.len(),
            summary.total_rows
        ));
    }

    if let Some(view) = &report.global_importance {
        out.push('\n');
        out.push_str(&explanation(view));
    }
    out
}

fn probabilities(distribution: &ProbabilityDistribution) -> String {
    let mut out = format!("Class probabilities (sum {:.1}%)\n", distribution.total);
    for entry in &distribution.entries {
        out.push_str(&format!(
            "  {} {:<28} {:>5.1}%  {}\n",
            if entry.is_predicted { '>' } else { ' ' },
            display_name(&entry.display),
            entry.probability,
            bar(entry.probability)
        ));
    }
    if !distribution.within_tolerance {
        out.push_str("  note: probabilities do not sum to 100%; shown as received\n");
    }
    out
}

fn explanation(view: &ExplanationView) -> String {
    let title = match view.kind {
        ExplanationKind::Local => "Top factors",
        ExplanationKind::Global => "Global feature importance",
    };
    let mut out = format!("{title} ({} of {})\n", view.bars.len(), view.total_features);
    for item in &view.bars {
        let sign = match item.direction {
            Direction::Supports => '+',
            Direction::Opposes => '-',
        };
        out.push_str(&format!(
            "  {sign} {:<32} {:>+10.4}  {}\n",
            item.feature,
            item.value,
            bar(item.magnitude_percent)
        ));
    }
    if view.has_more {
        out.push_str(&format!(
            "  ... {} more\n",
            view.total_features - view.bars.len()
        ));
    }
    out
}

fn bundle_line(display: &BundleDisplay) -> String {
    format!(
        "{} {} ({}) [{}]",
        display.icon,
        display.name,
        display.label,
        tier(display.tier)
    )
}

fn display_name(display: &BundleDisplay) -> String {
    format!("{} {}", display.icon, display.name)
}

fn band(band: ConfidenceBand) -> &'static str {
    match band {
        ConfidenceBand::High => "high",
        ConfidenceBand::Medium => "medium",
        ConfidenceBand::Low => "low",
    }
}

fn tier(tier: Tier) -> &'static str {
    match tier {
        Tier::Basic => "basic",
        Tier::Standard => "standard",
        Tier::Premium => "premium",
        Tier::Unclassified => "unclassified",
    }
}

/// Horizontal bar for a 0..=100 percentage
fn bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled.min(BAR_WIDTH))
}
