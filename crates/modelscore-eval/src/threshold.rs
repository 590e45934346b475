use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::confusion::ConfusionScore;
use crate::errors::{EvalError, Result};

/// Metric maximized when the decision threshold is searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    FScore,
    AccuracyRate,
    Precision,
    Recall,
    Specificity,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::FScore,
        Criterion::AccuracyRate,
        Criterion::Precision,
        Criterion::Recall,
        Criterion::Specificity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::FScore => "f_score",
            Criterion::AccuracyRate => "accuracy_rate",
            Criterion::Precision => "precision",
            Criterion::Recall => "recall",
            Criterion::Specificity => "specificity",
        }
    }

    /// Value of this criterion in a score row.
    pub fn value(&self, score: &ConfusionScore) -> f64 {
        match self {
            Criterion::FScore => score.f_score,
            Criterion::AccuracyRate => score.accuracy_rate,
            Criterion::Precision => score.precision,
            Criterion::Recall => score.recall,
            Criterion::Specificity => score.specificity,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = EvalError;

    fn from_str(value: &str) -> Result<Self> {
        Criterion::ALL
            .into_iter()
            .find(|criterion| criterion.as_str() == value)
            .ok_or_else(|| {
                EvalError::InvalidThresholdKind(format!(
                    "'{value}' is neither a number in [0, 1] nor one of: {}",
                    Criterion::ALL.map(|c| c.as_str()).join(", ")
                ))
            })
    }
}

/// Decision threshold: a fixed cut-off or a criterion to optimize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    Fixed(f64),
    Optimize(Criterion),
}

impl Threshold {
    /// Reject fixed thresholds outside [0, 1].
    pub fn validate(&self) -> Result<()> {
        match self {
            Threshold::Fixed(value) if !(0.0..=1.0).contains(value) => {
                Err(EvalError::InvalidThresholdKind(format!(
                    "fixed threshold {value} is outside [0, 1]"
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Optimize(Criterion::FScore)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Fixed(value) => write!(f, "{value}"),
            Threshold::Optimize(criterion) => write!(f, "{criterion}"),
        }
    }
}

impl FromStr for Threshold {
    type Err = EvalError;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        if let Ok(number) = value.parse::<f64>() {
            let threshold = Threshold::Fixed(number);
            threshold.validate()?;
            return Ok(threshold);
        }
        value.parse::<Criterion>().map(Threshold::Optimize)
    }
}
