use std::fs::{OpenOptions, create_dir_all};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use modelscore_core::Table;
use modelscore_eval::{MetricsReport, write_table_csv};

use super::{RegistryError, RegistryResult};
use crate::config::ResolvedConfig;

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub config: ResolvedConfig,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig<'a> {
    pub run_id: &'a str,
    pub started_at: String,
    pub config: &'a ResolvedConfig,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
    pub result_path: PathBuf,
    pub metrics_path: PathBuf,
    pub report_path: PathBuf,
}

/// Create `<run_dir>/<timestamp>__run_<run_id>/` with `config.json` and an
/// empty `logs.ndjson`.
pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx
        .config
        .run_dir
        .join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let config_path = root.join("config.json");
    let logs_path = root.join("logs.ndjson");

    let config = RunConfig {
        run_id: &ctx.run_id,
        started_at: ctx.started_at.to_rfc3339(),
        config: &ctx.config,
        git: collect_git_info(),
    };

    write_json(&config_path, &config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logs_path)?;

    Ok(RunPaths {
        result_path: root.join("result.csv"),
        metrics_path: root.join("metrics.json"),
        report_path: root.join("report.md"),
        logs_path,
        root,
    })
}

/// Write the result table; returns the bytes written.
pub fn write_result(paths: &RunPaths, table: &Table) -> RegistryResult<u64> {
    let bytes = write_table_csv(&paths.result_path, table).map_err(io::Error::from)?;
    Ok(bytes)
}

pub fn write_metrics(paths: &RunPaths, metrics: &MetricsReport) -> RegistryResult<()> {
    write_json(&paths.metrics_path, metrics)
}

pub fn write_report(paths: &RunPaths, report: &str) -> RegistryResult<()> {
    std::fs::write(&paths.report_path, report).map_err(RegistryError::from)
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EvaluationConfig, EvaluationKind};
    use modelscore_core::{Field, Value};

    fn temp_run_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("modelscore_cli_test_{}", uuid::Uuid::new_v4()));
        dir
    }

    #[test]
    fn creates_run_directory_with_artifacts() {
        let run_dir = temp_run_dir();
        let config = EvaluationConfig {
            input: Some(PathBuf::from("y.csv")),
            pred_col: Some("pred".to_string()),
            actual_col: Some("actual".to_string()),
            run_dir: Some(run_dir.clone()),
            ..EvaluationConfig::default()
        }
        .resolve(EvaluationKind::Regression)
        .unwrap();

        let ctx = RunContext {
            run_id: "abc".to_string(),
            started_at: Utc::now(),
            config,
        };
        let paths = start_run(&ctx).unwrap();

        let name = paths.root.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("__run_abc"));
        assert!(paths.logs_path.exists());

        let config_json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(paths.root.join("config.json")).unwrap())
                .unwrap();
        assert_eq!(config_json["run_id"], "abc");
        assert_eq!(config_json["config"]["evaluation"]["kind"], "regression");

        let table = Table::from_rows(
            vec![Field::numeric("mean_square_error")],
            vec![vec![Value::Float(0.5)]],
        )
        .unwrap();
        let bytes = write_result(&paths, &table).unwrap();
        assert_eq!(
            std::fs::read_to_string(&paths.result_path).unwrap(),
            "mean_square_error\n0.5\n"
        );
        assert_eq!(bytes, 22);

        std::fs::remove_dir_all(&run_dir).ok();
    }
}
