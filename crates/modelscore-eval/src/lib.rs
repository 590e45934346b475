//! Grouped model-quality evaluators: ROC curves, binary classification
//! scores and regression error statistics.

pub mod binary;
pub mod columns;
pub mod confusion;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod output;
pub mod regression;
pub mod report;
pub mod roc;
pub mod threshold;

pub use binary::{
    BINARY_COLUMNS, BinaryScore, binary_scores_table, evaluate_binary, evaluate_binary_grouped,
};
pub use columns::{LabelMapping, label_values, numeric_values};
pub use confusion::{ConfusionCounts, ConfusionScore, ExhaustiveOptimizer, ThresholdOptimizer};
pub use dataset::{ColumnSpec, load_table_csv, read_table_csv};
pub use engine::{EvaluateOptions, Evaluation, EvaluationEngine, EvaluationResult};
pub use errors::{EvalError, Result};
pub use metrics::{METRICS_VERSION, MetricsReport, PerformanceMetrics, WarningItem};
pub use output::{table_to_csv_string, write_table_csv};
pub use regression::{
    REGRESSION_COLUMNS, RegressionScore, evaluate_regression, evaluate_regression_grouped,
    regression_scores,
};
pub use report::render_report;
pub use roc::{FPR_COLUMN, RocCurve, RocPoint, TPR_COLUMN, build_roc, do_roc, roc_curve};
pub use threshold::{Criterion, Threshold};

/// Value columns must not double as group keys: per-group sub-tables drop
/// the key columns.
pub(crate) fn ensure_not_grouped<S: AsRef<str>>(group_key: &[S], columns: &[&str]) -> Result<()> {
    for column in columns {
        if group_key.iter().any(|key| key.as_ref() == *column) {
            return Err(EvalError::InvalidDataset(format!(
                "column '{column}' is used both as a group key and as an input"
            )));
        }
    }
    Ok(())
}
