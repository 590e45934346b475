//! Binary classification evaluation: AUC plus a confusion score at a fixed
//! or optimized threshold.

use serde::{Deserialize, Serialize};

use modelscore_core::{Field, Table, Value, apply_per_group};

use crate::columns::{LabelMapping, label_values, numeric_values};
use crate::confusion::{ConfusionScore, ThresholdOptimizer};
use crate::errors::{EvalError, Result};
use crate::roc::roc_curve;
use crate::threshold::Threshold;

/// Output columns of the binary evaluator, in order.
pub const BINARY_COLUMNS: [&str; 12] = [
    "auc",
    "f_score",
    "accuracy_rate",
    "misclassification_rate",
    "precision",
    "recall",
    "specificity",
    "threshold",
    "true_positive",
    "false_positive",
    "true_negative",
    "false_negative",
];

/// AUC merged with one confusion score row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryScore {
    pub auc: f64,
    #[serde(flatten)]
    pub confusion: ConfusionScore,
}

impl BinaryScore {
    fn to_row(self) -> Vec<Value> {
        let c = self.confusion;
        vec![
            Value::Float(self.auc),
            Value::Float(c.f_score),
            Value::Float(c.accuracy_rate),
            Value::Float(c.misclassification_rate),
            Value::Float(c.precision),
            Value::Float(c.recall),
            Value::Float(c.specificity),
            Value::Float(c.threshold),
            Value::Int(c.true_positive as i64),
            Value::Int(c.false_positive as i64),
            Value::Int(c.true_negative as i64),
            Value::Int(c.false_negative as i64),
        ]
    }
}

/// Score rows as a table with [`BINARY_COLUMNS`].
pub fn binary_scores_table(scores: &[BinaryScore]) -> Result<Table> {
    let fields = BINARY_COLUMNS.iter().map(|name| Field::numeric(*name)).collect();
    let rows = scores.iter().map(|score| score.to_row()).collect();
    Ok(Table::from_rows(fields, rows)?)
}

/// Evaluate one group.
///
/// Rows with a missing label are dropped. The ROC curve (and AUC) keeps
/// rows with a missing probability, ranked last; the threshold step drops
/// them. The AUC is repeated on every score row the optimizer returns.
pub fn evaluate_binary<O>(
    rows: &Table,
    prob_col: &str,
    label_col: &str,
    threshold: &Threshold,
    mapping: &LabelMapping,
    optimizer: &O,
) -> Result<Vec<BinaryScore>>
where
    O: ThresholdOptimizer + ?Sized,
{
    threshold.validate()?;

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

    let auc = roc_curve(&scores, &labels)?.auc();

    let (prob, actual): (Vec<f64>, Vec<bool>) = scores
        .iter()
        .zip(&labels)
        .filter_map(|(prob, label)| prob.map(|prob| (prob, *label)))
        .unzip();
    if actual.is_empty() {
        return Err(EvalError::EmptyDataAfterFiltering(prob_col.to_string()));
    }

    let confusion = match threshold {
        Threshold::Fixed(value) => {
            let predicted = prob.iter().map(|p| *p >= *value).collect::<Vec<_>>();
            let mut score = optimizer.fixed_threshold_score(&actual, &predicted)?;
            score.threshold = *value;
            vec![score]
        }
        Threshold::Optimize(criterion) => {
            let rows = optimizer.optimize_threshold(&actual, &prob, *criterion)?;
            if rows.is_empty() {
                return Err(EvalError::Optimizer(format!(
                    "no score rows returned for criterion {criterion}"
                )));
            }
            rows
        }
    };

    Ok(confusion
        .into_iter()
        .map(|confusion| BinaryScore { auc, confusion })
        .collect())
}

/// Evaluate every group of `table`; one output row per group (per optimizer
/// row), group keys first.
pub fn evaluate_binary_grouped<S, O>(
    table: &Table,
    group_key: &[S],
    prob_col: &str,
    label_col: &str,
    threshold: &Threshold,
    mapping: &LabelMapping,
    optimizer: &O,
) -> Result<Table>
where
    S: AsRef<str>,
    O: ThresholdOptimizer + Sync + ?Sized,
{
    threshold.validate()?;
    crate::ensure_not_grouped(group_key, &[prob_col, label_col])?;
    table.column_index(prob_col)?;
    table.column_index(label_col)?;

    tracing::debug!(
        event = "binary_evaluation_started",
        threshold = %threshold,
        rows = table.num_rows()
    );

    let out = apply_per_group(table, group_key, |rows: &Table| {
        evaluate_binary(rows, prob_col, label_col, threshold, mapping, optimizer)
            .and_then(|scores| binary_scores_table(&scores))
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confusion::ExhaustiveOptimizer;
    use crate::threshold::Criterion;

    fn scored(probs: &[f64], labels: &[bool]) -> Table {
        Table::from_rows(
            vec![Field::numeric("prob"), Field::boolean("label")],
            probs
                .iter()
                .zip(labels)
                .map(|(p, l)| vec![Value::Float(*p), Value::Bool(*l)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn fixed_threshold_is_recorded_verbatim() {
        let table = scored(&[0.9, 0.8, 0.4, 0.1], &[true, false, true, false]);
        let scores = evaluate_binary(
            &table,
            "prob",
            "label",
            &Threshold::Fixed(0.5),
            &LabelMapping::Legacy,
            &ExhaustiveOptimizer,
        )
        .unwrap();

        assert_eq!(scores.len(), 1);
        let score = scores[0];
        assert!((score.auc - 0.75).abs() < 1e-12);
        assert_eq!(score.confusion.threshold, 0.5);
        assert_eq!(score.confusion.true_positive, 1);
        assert_eq!(score.confusion.false_positive, 1);
        assert_eq!(score.confusion.true_negative, 1);
        assert_eq!(score.confusion.false_negative, 1);
    }

    #[test]
    fn threshold_step_drops_missing_probabilities() {
        let table = Table::from_rows(
            vec![Field::numeric("prob"), Field::boolean("label")],
            vec![
                vec![Value::Float(0.9), Value::Bool(true)],
                vec![Value::Null, Value::Bool(false)],
                vec![Value::Float(0.2), Value::Bool(false)],
            ],
        )
        .unwrap();
        let scores = evaluate_binary(
            &table,
            "prob",
            "label",
            &Threshold::Optimize(Criterion::AccuracyRate),
            &LabelMapping::Legacy,
            &ExhaustiveOptimizer,
        )
        .unwrap();
        let counts = scores[0].confusion;
        assert_eq!(
            counts.true_positive + counts.false_positive + counts.true_negative + counts.false_negative,
            2
        );
        assert_eq!(scores[0].auc, 1.0);
    }

    #[test]
    fn out_of_range_fixed_threshold_is_rejected() {
        let table = scored(&[0.9], &[true]);
        let err = evaluate_binary(
            &table,
            "prob",
            "label",
            &Threshold::Fixed(-0.1),
            &LabelMapping::Legacy,
            &ExhaustiveOptimizer,
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::InvalidThresholdKind(_)));
    }

    #[test]
    fn all_missing_labels_fail() {
        let table = Table::from_rows(
            vec![Field::numeric("prob"), Field::boolean("label")],
            vec![vec![Value::Float(0.4), Value::Null]],
        )
        .unwrap();
        let err = evaluate_binary(
            &table,
            "prob",
            "label",
            &Threshold::default(),
            &LabelMapping::Legacy,
            &ExhaustiveOptimizer,
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::EmptyDataAfterFiltering(col) if col == "label"));
    }
}
