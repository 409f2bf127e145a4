//! Evaluation metrics for the two model stages.
//!
//! Classification: accuracy plus a per-class precision/recall/F1 table with
//! macro averages. Regression: mean squared error over every target entry and
//! a uniform-average R² across target columns. All zero-division cases score
//! 0 rather than NaN, except a constant target column that is predicted
//! exactly, which scores 1.

/// Per-class row of a classification report.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Occurrences of the label in the actual test labels.
    pub support: usize,
}

/// Full classification report over a test set.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub accuracy: f64,
    /// One row per label, sorted alphabetically.
    pub per_class: Vec<ClassMetrics>,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
}

/// Fraction of exact label matches. Empty input scores 0.
pub fn accuracy(actual: &[String], predicted: &[String]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let hits = actual
        .iter()
        .zip(predicted)
        .filter(|(a, p)| a == p)
        .count();
    hits as f64 / actual.len() as f64
}

/// Build the per-class report for paired actual/predicted label sequences.
///
/// The label set is the union of both sequences. A label that never appears
/// on one side gets 0 for the metric that would divide by zero.
pub fn classification_report(actual: &[String], predicted: &[String]) -> ClassificationReport {
    let mut labels: Vec<&String> = actual.iter().chain(predicted).collect();
    labels.sort_unstable();
    labels.dedup();

    let mut per_class = Vec::with_capacity(labels.len());
    for label in labels {
        let tp = actual
            .iter()
            .zip(predicted)
            .filter(|(a, p)| *a == label && *p == label)
            .count();
        let predicted_count = predicted.iter().filter(|p| *p == label).count();
        let support = actual.iter().filter(|a| *a == label).count();

        let precision = ratio_or_zero(tp, predicted_count);
        let recall = ratio_or_zero(tp, support);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        per_class.push(ClassMetrics {
            label: label.clone(),
            precision,
            recall,
            f1,
            support,
        });
    }

    let n = per_class.len();
    let mean = |f: fn(&ClassMetrics) -> f64| {
        if n == 0 {
            0.0
        } else {
            per_class.iter().map(f).sum::<f64>() / n as f64
        }
    };

    ClassificationReport {
        accuracy: accuracy(actual, predicted),
        macro_precision: mean(|c| c.precision),
        macro_recall: mean(|c| c.recall),
        macro_f1: mean(|c| c.f1),
        per_class,
    }
}

fn ratio_or_zero(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Mean squared error over every entry of every target row.
pub fn mean_squared_error(actual: &[Vec<f64>], predicted: &[Vec<f64>]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (a_row, p_row) in actual.iter().zip(predicted) {
        for (a, p) in a_row.iter().zip(p_row) {
            sum += (a - p) * (a - p);
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Coefficient of determination, uniformly averaged over target columns.
///
/// A constant actual column scores 1 when the residual is also zero and 0
/// otherwise, so a model that nails a degenerate target is not punished for
/// the target's lack of variance.
pub fn r2_score(actual: &[Vec<f64>], predicted: &[Vec<f64>]) -> f64 {
    let n = actual.len();
    if n == 0 {
        return 0.0;
    }
    let width = actual[0].len();
    if width == 0 {
        return 0.0;
    }

    let mut total = 0.0;
    for col in 0..width {
        let mean = actual.iter().map(|row| row[col]).sum::<f64>() / n as f64;
        let ss_res: f64 = actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| (a[col] - p[col]) * (a[col] - p[col]))
            .sum();
        let ss_tot: f64 = actual
            .iter()
            .map(|row| (row[col] - mean) * (row[col] - mean))
            .sum();

        total += if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };
    }
    total / width as f64
}
