//! Reporting utilities: formatted terminal output for training, prediction
//! and sampling.
//!
//! We keep formatting code in one place so:
//! - the model code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::data::sample::SampleSummary;
use crate::domain::{CardinalDirection, OutcomeKind, PredictionResult, SampleConfig, TrainConfig};
use crate::io::ingest::{IngestedData, RowError};
use crate::model::knn::{ClassifierEvaluation, N_NEIGHBORS};
use crate::model::linear::RegressorEvaluation;

/// Duration below which a storm is reported as having no meaningful extent.
const INSTANT_MINUTES: f64 = 0.5;

/// Format the full training summary (dataset stats + both stage evaluations).
pub fn format_train_summary(
    ingest: &IngestedData,
    classifier: &ClassifierEvaluation,
    regressor: &RegressorEvaluation,
    regressor_rows: usize,
    direction_labels: &[String],
    config: &TrainConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== stormcast - Severe Weather Event Model Training ===\n");
    out.push_str(&format!("Input: {}\n", config.csv_path.display()));
    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    out.push_str(&format!(
        "Events: {} types | {} .. {} | tracked={}\n",
        ingest.stats.distinct_event_types,
        ingest.stats.first_begin.format("%d-%b-%y"),
        ingest.stats.last_begin.format("%d-%b-%y"),
        ingest.stats.with_track
    ));

    out.push_str(&format!(
        "\nEvent-type classifier (KNN, k={N_NEIGHBORS}):\n"
    ));
    out.push_str(&format!(
        "Split: train={} test={} (seed {})\n",
        classifier.train_rows, classifier.test_rows, config.seed
    ));
    out.push_str(&format!("Accuracy: {:.3}\n\n", classifier.report.accuracy));
    out.push_str(&format_class_table(classifier));

    out.push_str(&format!(
        "\nOutcome regressor (least squares, {} targets):\n",
        OutcomeKind::COUNT
    ));
    out.push_str(&format!(
        "Split: train={} test={} of {} fully observed rows (seed {})\n",
        regressor.train_rows, regressor.test_rows, regressor_rows, config.seed
    ));
    out.push_str(&format!("MSE: {:.4}\n", regressor.mse));
    out.push_str(&format!("R^2: {:.4}\n", regressor.r2));
    let directions: Vec<String> = direction_labels
        .iter()
        .enumerate()
        .map(|(code, label)| format!("{label}={code}"))
        .collect();
    out.push_str(&format!("Direction codes: {}\n", directions.join(" ")));

    out.push_str(&format!("\nSaved models to '{}'.\n", config.model_dir.display()));

    if !ingest.row_errors.is_empty() {
        out.push('\n');
        out.push_str(&format_row_errors(&ingest.row_errors, config.max_row_errors));
    }

    out
}

fn format_class_table(evaluation: &ClassifierEvaluation) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<24} {:>9} {:>9} {:>9} {:>8}\n",
        "event type", "precision", "recall", "f1", "support"
    ));
    out.push_str(&format!(
        "{:-<24} {:-<9} {:-<9} {:-<9} {:-<8}\n",
        "", "", "", "", ""
    ));

    for class in &evaluation.report.per_class {
        out.push_str(&format!(
            "{:<24} {:>9.3} {:>9.3} {:>9.3} {:>8}\n",
            truncate(&class.label, 24),
            class.precision,
            class.recall,
            class.f1,
            class.support
        ));
    }

    out.push_str(&format!(
        "{:<24} {:>9.3} {:>9.3} {:>9.3} {:>8}\n",
        "macro avg",
        evaluation.report.macro_precision,
        evaluation.report.macro_recall,
        evaluation.report.macro_f1,
        evaluation.test_rows
    ));

    out
}

/// Format skipped-row diagnostics, capped at `max` lines.
pub fn format_row_errors(errors: &[RowError], max: usize) -> String {
    let mut out = String::new();
    out.push_str("Skipped rows:\n");
    for error in errors.iter().take(max) {
        match &error.event_type {
            Some(label) => out.push_str(&format!(
                "  line {} ({}): {}\n",
                error.line,
                truncate(label, 24),
                error.message
            )),
            None => out.push_str(&format!("  line {}: {}\n", error.line, error.message)),
        }
    }
    if errors.len() > max {
        out.push_str(&format!("  ... and {} more\n", errors.len() - max));
    }
    out
}

/// Format one prediction for the terminal.
pub fn format_prediction(result: &PredictionResult) -> String {
    let mut out = String::new();

    out.push_str("=== Predicted outcomes ===\n");
    out.push_str(&format!("{:<24} {}\n", "Event type", result.event_type));

    for kind in OutcomeKind::ALL {
        out.push_str(&format!(
            "{:<24} {}\n",
            kind.display_name(),
            format_outcome(kind, result.outcome(kind))
        ));
    }

    out
}

/// Render one outcome value the way the prompt loop shows it.
pub fn format_outcome(kind: OutcomeKind, value: f64) -> String {
    match kind {
        OutcomeKind::DurationMinutes => {
            if value < INSTANT_MINUTES {
                "Instantaneous (less than 1 minute storm)".to_string()
            } else {
                format!("{value:.1} minutes")
            }
        }
        OutcomeKind::DistanceKm => format!("{value:.2} km"),
        OutcomeKind::BearingDegrees => match CardinalDirection::from_bearing(value) {
            // The regression is free to produce bearings outside one turn;
            // only label the compass point when the value reads as a bearing.
            Some(direction) if (0.0..=360.0).contains(&value) => {
                format!("{value:.1} deg ({})", direction.display_name())
            }
            _ => format!("{value:.1} deg (direction unknown)"),
        },
        OutcomeKind::EndLat | OutcomeKind::EndLon => format!("{value:.4}"),
        _ => format!("{value:.2}"),
    }
}

/// Format the sample-generation summary.
pub fn format_sample_summary(summary: &SampleSummary, config: &SampleConfig) -> String {
    let mut out = String::new();

    out.push_str("=== stormcast - Synthetic Sample ===\n");
    out.push_str(&format!("Output: {}\n", config.out_path.display()));
    out.push_str(&format!(
        "Rows: {} (seed {})\n",
        summary.rows_written, config.seed
    ));

    out.push_str("\nEvent mix:\n");
    for (label, count) in &summary.by_event {
        out.push_str(&format!("{:<24} {:>6}\n", truncate(label, 24), count));
    }
    let labeled: usize = summary.by_event.iter().map(|(_, n)| n).sum();
    if labeled < summary.rows_written {
        out.push_str(&format!(
            "{:<24} {:>6}\n",
            "(unlabeled)",
            summary.rows_written - labeled
        ));
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_below_half_a_minute_reads_instantaneous() {
        assert_eq!(
            format_outcome(OutcomeKind::DurationMinutes, 0.49),
            "Instantaneous (less than 1 minute storm)"
        );
        assert_eq!(
            format_outcome(OutcomeKind::DurationMinutes, 0.0),
            "Instantaneous (less than 1 minute storm)"
        );
        assert_eq!(format_outcome(OutcomeKind::DurationMinutes, 32.06), "32.1 minutes");
    }

    #[test]
    fn bearing_gets_a_compass_label_only_in_range() {
        assert_eq!(format_outcome(OutcomeKind::BearingDegrees, 48.3), "48.3 deg (NE)");
        assert_eq!(format_outcome(OutcomeKind::BearingDegrees, 0.0), "0.0 deg (N)");
        assert_eq!(
            format_outcome(OutcomeKind::BearingDegrees, -12.0),
            "-12.0 deg (direction unknown)"
        );
        assert_eq!(
            format_outcome(OutcomeKind::BearingDegrees, 400.0),
            "400.0 deg (direction unknown)"
        );
    }

    #[test]
    fn prediction_block_lists_every_outcome() {
        let result = PredictionResult {
            event_type: "Tornado".to_string(),
            outcomes: [0.0; OutcomeKind::COUNT],
        };
        let text = format_prediction(&result);

        assert!(text.starts_with("=== Predicted outcomes ==="));
        assert!(text.contains("Event type"));
        assert!(text.contains("Tornado"));
        for kind in OutcomeKind::ALL {
            assert!(text.contains(kind.display_name()), "missing {kind:?}");
        }
        assert!(text.contains("Instantaneous"));
    }

    #[test]
    fn row_error_list_is_capped() {
        let errors: Vec<RowError> = (0..8)
            .map(|i| RowError {
                line: i + 2,
                event_type: if i % 2 == 0 { Some("Hail".to_string()) } else { None },
                message: "bad row".to_string(),
            })
            .collect();

        let text = format_row_errors(&errors, 5);
        assert_eq!(text.matches("bad row").count(), 5);
        assert!(text.contains("... and 3 more"));
        assert!(text.contains("line 2 (Hail)"));
    }

    #[test]
    fn truncate_marks_clipped_labels() {
        assert_eq!(truncate("Hail", 24), "Hail");
        let long = "Extreme Cold/Wind Chill Advisory Event";
        let cut = truncate(long, 24);
        assert_eq!(cut.chars().count(), 24);
        assert!(cut.ends_with('.'));
    }
}
