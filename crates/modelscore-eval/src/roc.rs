//! ROC curve construction and AUC.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use modelscore_core::{Field, Table, Value, apply_per_group};

use crate::columns::{LabelMapping, label_values, numeric_values};
use crate::errors::{EvalError, Result};

/// Output column for the true-positive rate.
pub const TPR_COLUMN: &str = "true_positive_rate";
/// Output column for the false-positive rate.
pub const FPR_COLUMN: &str = "false_positive_rate";

/// A single point on the ROC curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub true_positive_rate: f64,
    pub false_positive_rate: f64,
}

/// Ordered ROC curve, starting at (0, 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    points: Vec<RocPoint>,
}

impl RocCurve {
    pub fn points(&self) -> &[RocPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn true_positive_rates(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.true_positive_rate).collect()
    }

    pub fn false_positive_rates(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.false_positive_rate).collect()
    }

    /// Area under the curve, accumulated along the FPR axis with the TPR of
    /// the right end of each interval:
    /// `sum over i >= 1 of (fpr[i] - fpr[i-1]) * tpr[i]`.
    pub fn auc(&self) -> f64 {
        let mut area = 0.0;
        for i in 1..self.points.len() {
            let width = self.points[i].false_positive_rate - self.points[i - 1].false_positive_rate;
            area += width * self.points[i].true_positive_rate;
        }
        area
    }

    /// Curve as a two-column table (`true_positive_rate`, `false_positive_rate`).
    pub fn to_table(&self) -> Result<Table> {
        let rows = self
            .points
            .iter()
            .map(|point| {
                vec![
                    Value::Float(point.true_positive_rate),
                    Value::Float(point.false_positive_rate),
                ]
            })
            .collect();
        Ok(Table::from_rows(
            vec![Field::numeric(TPR_COLUMN), Field::numeric(FPR_COLUMN)],
            rows,
        )?)
    }
}

/// Build the ROC curve from already-filtered scores and labels.
///
/// Rows are stable-sorted by score descending with missing scores last.
/// When one class is absent its rate axis is all zeros plus a terminal 1,
/// and the other axis is extended with its last value, giving `n + 2` points.
pub fn roc_curve(scores: &[Option<f64>], labels: &[bool]) -> Result<RocCurve> {
    if scores.len() != labels.len() {
        return Err(EvalError::InvalidDataset(format!(
            "scores length {} != labels length {}",
            scores.len(),
            labels.len()
        )));
    }
    if labels.is_empty() {
        return Err(EvalError::EmptyDataAfterFiltering("label".to_string()));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| descending_missing_last(scores[a], scores[b]));
    let sorted: Vec<bool> = order.iter().map(|&idx| labels[idx]).collect();

    let positives = sorted.iter().filter(|&&label| label).count();
    let negatives = sorted.len() - positives;
    if positives == 0 || negatives == 0 {
        tracing::warn!(
            event = "roc_single_class",
            rows = sorted.len(),
            positives,
            negatives
        );
    }

    let mut tpr = rate_axis(&sorted, true, positives);
    let mut fpr = rate_axis(&sorted, false, negatives);
    let len = tpr.len().max(fpr.len());
    pad_to(&mut tpr, len);
    pad_to(&mut fpr, len);

    let points = tpr
        .into_iter()
        .zip(fpr)
        .map(|(true_positive_rate, false_positive_rate)| RocPoint {
            true_positive_rate,
            false_positive_rate,
        })
        .collect();
    Ok(RocCurve { points })
}

/// Build the ROC curve of one table. Rows with a missing label are dropped;
/// rows with a missing probability are kept and ranked last.
pub fn build_roc(
    rows: &Table,
    prob_col: &str,
    label_col: &str,
    mapping: &LabelMapping,
) -> Result<RocCurve> {
    let labels = label_values(rows, label_col, mapping)?;
    let probs = numeric_values(rows, prob_col)?;

    let (scores, labels): (Vec<Option<f64>>, Vec<bool>) = probs
        .into_iter()
        .zip(labels)
        .filter_map(|(prob, label)| label.map(|label| (prob, label)))
        .unzip();
    if labels.is_empty() {
        return Err(EvalError::EmptyDataAfterFiltering(label_col.to_string()));
    }

    roc_curve(&scores, &labels)
}

/// ROC curve per group: one output row per group per curve point, group
/// keys first, then `true_positive_rate` and `false_positive_rate`.
pub fn do_roc<S: AsRef<str>>(
    table: &Table,
    group_key: &[S],
    prob_col: &str,
    label_col: &str,
    mapping: &LabelMapping,
) -> Result<Table> {
    crate::ensure_not_grouped(group_key, &[prob_col, label_col])?;
    table.column_index(prob_col)?;
    table.column_index(label_col)?;

    let out = apply_per_group(table, group_key, |rows: &Table| {
        build_roc(rows, prob_col, label_col, mapping).and_then(|curve| curve.to_table())
    })?;
    Ok(out)
}

fn descending_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn rate_axis(sorted: &[bool], target: bool, total: usize) -> Vec<f64> {
    if total == 0 {
        let mut axis = vec![0.0; sorted.len() + 1];
        axis.push(1.0);
        return axis;
    }

    let mut axis = Vec::with_capacity(sorted.len() + 2);
    axis.push(0.0);
    let mut count = 0usize;
    for &label in sorted {
        if label == target {
            count += 1;
        }
        axis.push(count as f64 / total as f64);
    }
    axis
}

fn pad_to(axis: &mut Vec<f64>, len: usize) {
    let last = axis.last().copied().unwrap_or(0.0);
    axis.resize(len, last);
}
