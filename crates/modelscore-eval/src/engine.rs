use std::time::Instant;

use serde::{Deserialize, Serialize};

use modelscore_core::{Table, Value};

use crate::binary::evaluate_binary_grouped;
use crate::columns::LabelMapping;
use crate::confusion::{ExhaustiveOptimizer, ThresholdOptimizer};
use crate::errors::Result;
use crate::metrics::WarningItem;
use crate::regression::evaluate_regression_grouped;
use crate::roc::do_roc;
use crate::threshold::Threshold;

/// Which evaluator to run and on which columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evaluation {
    Roc {
        prob_col: String,
        label_col: String,
    },
    Binary {
        prob_col: String,
        label_col: String,
        #[serde(default)]
        threshold: Threshold,
    },
    Regression {
        pred_col: String,
        actual_col: String,
    },
}

impl Evaluation {
    pub fn kind(&self) -> &'static str {
        match self {
            Evaluation::Roc { .. } => "roc",
            Evaluation::Binary { .. } => "binary",
            Evaluation::Regression { .. } => "regression",
        }
    }
}

/// Options shared by every evaluation kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluateOptions {
    /// Key columns; empty evaluates the whole table as one group.
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub label_mapping: LabelMapping,
}

/// Result of one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub table: Table,
    pub groups: usize,
    pub undefined_values: u64,
    pub warnings: Vec<WarningItem>,
    pub evaluate_ms: u128,
}

/// Runs an [`Evaluation`] over a table, grouped by the configured keys.
#[derive(Debug, Clone)]
pub struct EvaluationEngine<O = ExhaustiveOptimizer> {
    options: EvaluateOptions,
    optimizer: O,
}

impl EvaluationEngine {
    pub fn new(options: EvaluateOptions) -> Self {
        Self {
            options,
            optimizer: ExhaustiveOptimizer,
        }
    }
}

impl<O: ThresholdOptimizer + Sync> EvaluationEngine<O> {
    pub fn with_optimizer(options: EvaluateOptions, optimizer: O) -> Self {
        Self { options, optimizer }
    }

    pub fn options(&self) -> &EvaluateOptions {
        &self.options
    }

    pub fn run(&self, table: &Table, evaluation: &Evaluation) -> Result<EvaluationResult> {
        let start = Instant::now();
        let group_by = &self.options.group_by;

        tracing::info!(
            event = "evaluation_started",
            kind = evaluation.kind(),
            rows = table.num_rows(),
            group_by = ?group_by
        );

        let result = match evaluation {
            Evaluation::Roc {
                prob_col,
                label_col,
            } => do_roc(
                table,
                group_by,
                prob_col,
                label_col,
                &self.options.label_mapping,
            )?,
            Evaluation::Binary {
                prob_col,
                label_col,
                threshold,
            } => evaluate_binary_grouped(
                table,
                group_by,
                prob_col,
                label_col,
                threshold,
                &self.options.label_mapping,
                &self.optimizer,
            )?,
            Evaluation::Regression {
                pred_col,
                actual_col,
            } => evaluate_regression_grouped(table, group_by, pred_col, actual_col)?,
        };

        let mut warnings = Vec::new();
        if let Evaluation::Binary { .. } = evaluation {
            collect_auc_warnings(&result, group_by.len(), &mut warnings);
        }
        let groups = count_groups(&result, group_by.len());
        let undefined_values = count_undefined(&result, group_by.len());
        let evaluate_ms = start.elapsed().as_millis();

        tracing::info!(
            event = "evaluation_finished",
            kind = evaluation.kind(),
            groups,
            result_rows = result.num_rows(),
            undefined_values,
            warnings = warnings.len()
        );

        Ok(EvaluationResult {
            table: result,
            groups,
            undefined_values,
            warnings,
            evaluate_ms,
        })
    }
}

/// Groups in a flattened result. Every evaluator emits at least one row per
/// group and the rows of a group are contiguous, so each run of equal keys
/// is one group.
fn count_groups(result: &Table, key_len: usize) -> usize {
    let mut groups = 0;
    let mut previous: Option<&[Value]> = None;
    for row in result.rows() {
        let key = &row[..key_len];
        let same = previous.is_some_and(|previous| {
            previous
                .iter()
                .zip(key)
                .all(|(left, right)| same_cell(left, right))
        });
        if !same {
            groups += 1;
        }
        previous = Some(key);
    }
    groups
}

fn same_cell(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Float(left), Value::Float(right)) => left.to_bits() == right.to_bits(),
        _ => left == right,
    }
}

/// Metric cells that are NA or non-finite.
fn count_undefined(result: &Table, key_len: usize) -> u64 {
    result
        .rows()
        .iter()
        .flat_map(|row| row.iter().skip(key_len))
        .filter(|value| value.is_undefined())
        .count() as u64
}

fn collect_auc_warnings(result: &Table, key_len: usize, warnings: &mut Vec<WarningItem>) {
    let Ok(auc_idx) = result.column_index("auc") else {
        return;
    };
    let names = result.column_names();
    for row in result.rows() {
        let Some(auc) = row[auc_idx].as_f64() else {
            continue;
        };
        if auc >= 0.5 {
            continue;
        }
        let path = if key_len == 0 {
            "<all rows>".to_string()
        } else {
            names
                .iter()
                .zip(row.iter())
                .take(key_len)
                .map(|(name, value)| format!("{name}={}", value.render()))
                .collect::<Vec<_>>()
                .join(", ")
        };
        warnings.push(WarningItem {
            code: "auc_below_half".to_string(),
            path,
            message: format!("auc {auc:.4} is below 0.5"),
            hint: Some(
                "check the label level order or pass an explicit positive label".to_string(),
            ),
        });
    }
}
