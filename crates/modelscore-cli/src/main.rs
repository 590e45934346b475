use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use modelscore_cli::config::{ConfigError, EvaluationConfig, EvaluationKind};
use modelscore_cli::registry::{
    self, RunContext, init_run_logging, start_run, write_metrics, write_report, write_result,
};
use modelscore_eval::{
    EvalError, EvaluateOptions, EvaluationEngine, METRICS_VERSION, MetricsReport,
    PerformanceMetrics, load_table_csv, render_report,
};
use thiserror::Error;
use uuid::Uuid;

const REPORT_MAX_ROWS: usize = 50;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
}

#[derive(Parser, Debug)]
#[command(name = "modelscore", version, about = "Grouped model-quality metrics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// ROC curve points per group.
    Roc(ClassifierArgs),
    /// AUC and confusion-matrix scores per group.
    Binary(BinaryArgs),
    /// Regression error statistics per group.
    Regression(RegressionArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Input CSV file with a header row.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Group key column; repeat for composite keys.
    #[arg(long = "group-by", value_name = "COLUMN")]
    group_by: Vec<String>,
    /// TOML config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output directory for runs.
    #[arg(long)]
    run_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ClassifierArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Predicted probability column.
    #[arg(long, value_name = "COLUMN")]
    prob: Option<String>,
    /// Actual label column.
    #[arg(long, value_name = "COLUMN")]
    label: Option<String>,
    /// Label value counted as the positive class.
    #[arg(long, value_name = "VALUE")]
    positive_label: Option<String>,
}

#[derive(Args, Debug)]
struct BinaryArgs {
    #[command(flatten)]
    classifier: ClassifierArgs,
    /// Fixed cut-off in [0, 1] or a criterion: f_score, accuracy_rate,
    /// precision, recall, specificity.
    #[arg(long)]
    threshold: Option<String>,
}

#[derive(Args, Debug)]
struct RegressionArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Predicted value column.
    #[arg(long, value_name = "COLUMN")]
    pred: Option<String>,
    /// Actual value column.
    #[arg(long, value_name = "COLUMN")]
    actual: Option<String>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Roc(args) => {
            let (common, overrides) = classifier_overrides(args, None);
            run_evaluation(EvaluationKind::Roc, common, overrides)
        }
        Command::Binary(args) => {
            let (common, overrides) = classifier_overrides(args.classifier, args.threshold);
            run_evaluation(EvaluationKind::Binary, common, overrides)
        }
        Command::Regression(args) => {
            let overrides = EvaluationConfig {
                pred_col: args.pred,
                actual_col: args.actual,
                ..EvaluationConfig::default()
            };
            run_evaluation(EvaluationKind::Regression, args.common, overrides)
        }
    }
}

fn classifier_overrides(
    args: ClassifierArgs,
    threshold: Option<String>,
) -> (CommonArgs, EvaluationConfig) {
    let overrides = EvaluationConfig {
        prob_col: args.prob,
        label_col: args.label,
        positive_label: args.positive_label,
        threshold,
        ..EvaluationConfig::default()
    };
    (args.common, overrides)
}

fn run_evaluation(
    kind: EvaluationKind,
    common: CommonArgs,
    overrides: EvaluationConfig,
) -> Result<(), CliError> {
    let CommonArgs {
        input,
        group_by,
        config,
        run_dir,
    } = common;

    let base = match &config {
        Some(path) => EvaluationConfig::load(path)?,
        None => EvaluationConfig::default(),
    };
    let resolved = base
        .merge(EvaluationConfig {
            input,
            group_by,
            run_dir,
            ..overrides
        })
        .resolve(kind)?;

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        config: resolved,
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    let config = &run_ctx.config;
    tracing::info!(event = "run_started", run_id = %run_id, kind = kind.as_str());

    let total_timer = Instant::now();

    let load_timer = Instant::now();
    let table = load_table_csv(&config.input, &config.columns)?;
    let load_ms = load_timer.elapsed().as_millis();
    tracing::info!(
        event = "input_loaded",
        path = %config.input.display(),
        rows = table.num_rows(),
        columns = table.fields().len()
    );

    let engine = EvaluationEngine::new(EvaluateOptions {
        group_by: config.group_by.clone(),
        label_mapping: config.label_mapping.clone(),
    });
    let result = engine.run(&table, &config.evaluation)?;

    let bytes = write_result(&run_paths, &result.table)?;
    tracing::info!(
        event = "result_written",
        path = %run_paths.result_path.display(),
        rows = result.table.num_rows(),
        bytes
    );

    for warning in &result.warnings {
        tracing::warn!(
            event = "metric_warning",
            code = %warning.code,
            path = %warning.path,
            message = %warning.message
        );
    }

    let metrics = MetricsReport {
        metrics_version: METRICS_VERSION.to_string(),
        run_id: run_id.clone(),
        kind: kind.as_str().to_string(),
        group_by: config.group_by.clone(),
        input_rows: table.num_rows() as u64,
        groups: result.groups as u64,
        result_rows: result.table.num_rows() as u64,
        undefined_values: result.undefined_values,
        warnings: result.warnings.clone(),
        performance: PerformanceMetrics {
            load_ms,
            evaluate_ms: result.evaluate_ms,
            total_ms: total_timer.elapsed().as_millis(),
        },
    };
    write_metrics(&run_paths, &metrics)?;
    write_report(
        &run_paths,
        &render_report(&metrics, &result.table, REPORT_MAX_ROWS),
    )?;

    tracing::info!(
        event = "run_finished",
        run_id = %run_id,
        groups = result.groups,
        duration_ms = metrics.performance.total_ms as u64
    );

    println!("{}", run_paths.root.display());
    Ok(())
}
