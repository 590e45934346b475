//! TOML evaluation config and its resolution against command-line flags.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use modelscore_core::FieldKind;
use modelscore_eval::{ColumnSpec, EvalError, Evaluation, LabelMapping, Threshold};

pub const DEFAULT_RUN_DIR: &str = "runs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationKind {
    Roc,
    Binary,
    Regression,
}

impl EvaluationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationKind::Roc => "roc",
            EvaluationKind::Binary => "binary",
            EvaluationKind::Regression => "regression",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Bool,
    Numeric,
    Text,
    Categorical,
}

/// Declared kind of one input column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ColumnDecl {
    pub name: String,
    pub kind: ColumnKind,
    /// Level order for categorical columns. For labels the first level is
    /// the negative class unless `positive_label` is set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<String>,
}

impl ColumnDecl {
    fn to_spec(&self) -> ConfigResult<ColumnSpec> {
        let kind = match self.kind {
            ColumnKind::Bool => FieldKind::Bool,
            ColumnKind::Numeric => FieldKind::Numeric,
            ColumnKind::Text => FieldKind::Text,
            ColumnKind::Categorical => {
                if self.levels.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "categorical column '{}' declares no levels",
                        self.name
                    )));
                }
                FieldKind::Categorical {
                    levels: self.levels.clone(),
                }
            }
        };
        if !self.levels.is_empty() && !matches!(kind, FieldKind::Categorical { .. }) {
            return Err(ConfigError::Invalid(format!(
                "column '{}' declares levels but is not categorical",
                self.name
            )));
        }
        Ok(ColumnSpec {
            name: self.name.clone(),
            kind,
        })
    }
}

/// Evaluation settings read from `--config`. Every field is optional;
/// command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    pub input: Option<PathBuf>,
    #[serde(default)]
    pub group_by: Vec<String>,
    pub kind: Option<EvaluationKind>,
    pub prob_col: Option<String>,
    pub label_col: Option<String>,
    pub pred_col: Option<String>,
    pub actual_col: Option<String>,
    /// A fixed cut-off in [0, 1] or a criterion name such as `f_score`.
    pub threshold: Option<String>,
    pub positive_label: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDecl>,
    pub run_dir: Option<PathBuf>,
}

impl EvaluationConfig {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay values set in `overrides`; a non-empty `group_by` replaces
    /// the whole key list.
    pub fn merge(mut self, overrides: EvaluationConfig) -> Self {
        fn pick<T>(base: &mut Option<T>, other: Option<T>) {
            if other.is_some() {
                *base = other;
            }
        }

        pick(&mut self.input, overrides.input);
        pick(&mut self.kind, overrides.kind);
        pick(&mut self.prob_col, overrides.prob_col);
        pick(&mut self.label_col, overrides.label_col);
        pick(&mut self.pred_col, overrides.pred_col);
        pick(&mut self.actual_col, overrides.actual_col);
        pick(&mut self.threshold, overrides.threshold);
        pick(&mut self.positive_label, overrides.positive_label);
        pick(&mut self.run_dir, overrides.run_dir);
        if !overrides.group_by.is_empty() {
            self.group_by = overrides.group_by;
        }
        if !overrides.columns.is_empty() {
            self.columns = overrides.columns;
        }
        self
    }

    /// Check the merged config for the requested kind and build the
    /// evaluation inputs.
    pub fn resolve(&self, kind: EvaluationKind) -> ConfigResult<ResolvedConfig> {
        if let Some(configured) = self.kind {
            if configured != kind {
                return Err(ConfigError::Invalid(format!(
                    "config declares kind '{}' but the '{}' command was run",
                    configured.as_str(),
                    kind.as_str()
                )));
            }
        }

        let input = self
            .input
            .clone()
            .ok_or_else(|| missing("input", "--input"))?;

        let evaluation = match kind {
            EvaluationKind::Roc => Evaluation::Roc {
                prob_col: required(&self.prob_col, "prob_col", "--prob")?,
                label_col: required(&self.label_col, "label_col", "--label")?,
            },
            EvaluationKind::Binary => Evaluation::Binary {
                prob_col: required(&self.prob_col, "prob_col", "--prob")?,
                label_col: required(&self.label_col, "label_col", "--label")?,
                threshold: match &self.threshold {
                    Some(value) => value.parse::<Threshold>()?,
                    None => Threshold::default(),
                },
            },
            EvaluationKind::Regression => Evaluation::Regression {
                pred_col: required(&self.pred_col, "pred_col", "--pred")?,
                actual_col: required(&self.actual_col, "actual_col", "--actual")?,
            },
        };

        if kind == EvaluationKind::Regression
            && (self.threshold.is_some() || self.positive_label.is_some())
        {
            return Err(ConfigError::Invalid(
                "threshold and positive_label apply to classifier evaluations only".to_string(),
            ));
        }

        let label_mapping = match &self.positive_label {
            Some(value) => LabelMapping::Positive(value.clone()),
            None => LabelMapping::Legacy,
        };

        let columns = self
            .columns
            .iter()
            .map(ColumnDecl::to_spec)
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(ResolvedConfig {
            input,
            group_by: self.group_by.clone(),
            evaluation,
            label_mapping,
            columns,
            run_dir: self
                .run_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RUN_DIR)),
        })
    }
}

/// Fully resolved inputs of one run; written to `config.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub input: PathBuf,
    pub group_by: Vec<String>,
    pub evaluation: Evaluation,
    pub label_mapping: LabelMapping,
    pub columns: Vec<ColumnSpec>,
    pub run_dir: PathBuf,
}

fn missing(key: &str, flag: &str) -> ConfigError {
    ConfigError::Invalid(format!("missing {key} (set it in the config or pass {flag})"))
}

fn required(value: &Option<String>, key: &str, flag: &str) -> ConfigResult<String> {
    value.clone().ok_or_else(|| missing(key, flag))
}
