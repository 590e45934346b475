//! Regression error statistics.

use serde::{Deserialize, Serialize};

use modelscore_core::{Field, Table, Value, apply_per_group};

use crate::columns::numeric_values;
use crate::errors::Result;

/// Output columns of the regression evaluator, in order.
pub const REGRESSION_COLUMNS: [&str; 6] = [
    "r_squared",
    "explained_variance",
    "mean_square_error",
    "root_mean_square_error",
    "mean_absolute_error",
    "mean_absolute_percentage_error",
];

/// Regression metrics for one group.
///
/// Degenerate inputs are not errors: a constant actual column makes
/// `r_squared` and `explained_variance` non-finite, and an all-missing group
/// makes every metric `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionScore {
    pub r_squared: f64,
    pub explained_variance: f64,
    pub mean_square_error: f64,
    pub root_mean_square_error: f64,
    pub mean_absolute_error: f64,
    /// Undefined when no row has a non-zero actual value.
    pub mean_absolute_percentage_error: Option<f64>,
}

impl RegressionScore {
    fn to_row(self) -> Vec<Value> {
        vec![
            Value::Float(self.r_squared),
            Value::Float(self.explained_variance),
            Value::Float(self.mean_square_error),
            Value::Float(self.root_mean_square_error),
            Value::Float(self.mean_absolute_error),
            self.mean_absolute_percentage_error
                .map(Value::Float)
                .unwrap_or(Value::Null),
        ]
    }

    /// Single-row table with [`REGRESSION_COLUMNS`].
    pub fn to_table(self) -> Result<Table> {
        let fields = REGRESSION_COLUMNS
            .iter()
            .map(|name| Field::numeric(*name))
            .collect();
        Ok(Table::from_rows(fields, vec![self.to_row()])?)
    }
}

/// Compute the metrics from paired columns. Missing cells (on either side
/// for differences, on the actual side for its mean and variance) are
/// ignored independently by every aggregate.
pub fn regression_scores(predicted: &[Option<f64>], actual: &[Option<f64>]) -> RegressionScore {
    let diff: Vec<Option<f64>> = actual
        .iter()
        .zip(predicted)
        .map(|(actual, predicted)| Some((*actual)? - (*predicted)?))
        .collect();
    let diff_sq = diff.iter().map(|d| d.map(|d| d * d));
    let abs_diff = diff.iter().map(|d| d.map(f64::abs));

    let mean_square_error = mean_na(diff_sq.clone());
    let root_mean_square_error = mean_square_error.sqrt();
    let mean_absolute_error = mean_na(abs_diff);

    let percentage = actual
        .iter()
        .zip(&diff)
        .filter(|(actual, _)| matches!(actual, Some(a) if *a != 0.0))
        .map(|(actual, diff)| match (actual, diff) {
            (Some(actual), Some(diff)) => Some((diff / actual).abs()),
            _ => None,
        });
    let mean_absolute_percentage_error = mean_opt(percentage).map(|mean| mean * 100.0);

    let actual_mean = mean_na(actual.iter().copied());
    let total_sum_sq = sum_na(actual.iter().map(|a| a.map(|a| (a - actual_mean).powi(2))));
    let r_squared = 1.0 - sum_na(diff_sq) / total_sum_sq;

    let explained_variance =
        1.0 - variance_na(diff.iter().copied()) / variance_na(actual.iter().copied());

    RegressionScore {
        r_squared,
        explained_variance,
        mean_square_error,
        root_mean_square_error,
        mean_absolute_error,
        mean_absolute_percentage_error,
    }
}

/// Evaluate one group.
pub fn evaluate_regression(
    rows: &Table,
    pred_col: &str,
    actual_col: &str,
) -> Result<RegressionScore> {
    let predicted = numeric_values(rows, pred_col)?;
    let actual = numeric_values(rows, actual_col)?;
    Ok(regression_scores(&predicted, &actual))
}

/// Evaluate every group of `table`; one output row per group, group keys
/// first.
pub fn evaluate_regression_grouped<S: AsRef<str>>(
    table: &Table,
    group_key: &[S],
    pred_col: &str,
    actual_col: &str,
) -> Result<Table> {
    crate::ensure_not_grouped(group_key, &[pred_col, actual_col])?;
    table.column_index(pred_col)?;
    table.column_index(actual_col)?;

    let out = apply_per_group(table, group_key, |rows: &Table| -> Result<Table> {
        evaluate_regression(rows, pred_col, actual_col)?.to_table()
    })?;
    Ok(out)
}

fn present(values: impl Iterator<Item = Option<f64>>) -> Vec<f64> {
    values.flatten().filter(|v| !v.is_nan()).collect()
}

fn mean_opt(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let values = present(values);
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn mean_na(values: impl Iterator<Item = Option<f64>>) -> f64 {
    mean_opt(values).unwrap_or(f64::NAN)
}

fn sum_na(values: impl Iterator<Item = Option<f64>>) -> f64 {
    present(values).iter().sum()
}

/// Sample variance (n - 1); `NaN` with fewer than two values.
fn variance_na(values: impl Iterator<Item = Option<f64>>) -> f64 {
    let values = present(values);
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}
