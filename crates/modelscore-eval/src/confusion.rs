//! Confusion-matrix scores and the threshold-optimizer seam.

use serde::{Deserialize, Serialize};

use crate::errors::{EvalError, Result};
use crate::threshold::Criterion;

/// Binary confusion-matrix counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positive: u64,
    pub false_positive: u64,
    pub true_negative: u64,
    pub false_negative: u64,
}

impl ConfusionCounts {
    pub fn from_predictions(actual: &[bool], predicted: &[bool]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(EvalError::Optimizer(format!(
                "actual length {} != predicted length {}",
                actual.len(),
                predicted.len()
            )));
        }

        let mut counts = Self::default();
        for (&actual, &predicted) in actual.iter().zip(predicted) {
            match (actual, predicted) {
                (true, true) => counts.true_positive += 1,
                (false, true) => counts.false_positive += 1,
                (false, false) => counts.true_negative += 1,
                (true, false) => counts.false_negative += 1,
            }
        }
        Ok(counts)
    }

    pub fn total(&self) -> u64 {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

/// One row of classification metrics at a single decision threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfusionScore {
    pub f_score: f64,
    pub accuracy_rate: f64,
    pub misclassification_rate: f64,
    pub precision: f64,
    pub recall: f64,
    pub specificity: f64,
    pub threshold: f64,
    pub true_positive: u64,
    pub false_positive: u64,
    pub true_negative: u64,
    pub false_negative: u64,
}

impl ConfusionScore {
    /// Ratios with a zero denominator are `NaN`; `f_score` is 0 when
    /// precision and recall give no usable harmonic mean.
    pub fn from_counts(counts: ConfusionCounts, threshold: f64) -> Self {
        let tp = counts.true_positive as f64;
        let fp = counts.false_positive as f64;
        let tn = counts.true_negative as f64;
        let fn_ = counts.false_negative as f64;

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f_score = if precision.is_nan() || recall.is_nan() || precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        let accuracy_rate = ratio(tp + tn, counts.total() as f64);

        Self {
            f_score,
            accuracy_rate,
            misclassification_rate: 1.0 - accuracy_rate,
            precision,
            recall,
            specificity: ratio(tn, tn + fp),
            threshold,
            true_positive: counts.true_positive,
            false_positive: counts.false_positive,
            true_negative: counts.true_negative,
            false_negative: counts.false_negative,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Collaborator that scores predictions and searches decision thresholds.
pub trait ThresholdOptimizer {
    /// Score rows for the best threshold under `criterion`.
    fn optimize_threshold(
        &self,
        actual: &[bool],
        prob: &[f64],
        criterion: Criterion,
    ) -> Result<Vec<ConfusionScore>>;

    /// Score fixed predictions. The returned `threshold` is `NaN`; the caller
    /// records the threshold it used.
    fn fixed_threshold_score(&self, actual: &[bool], predicted: &[bool]) -> Result<ConfusionScore>;
}

/// Scores every distinct probability as a candidate threshold and keeps the
/// first (lowest) candidate with the highest criterion value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveOptimizer;

impl ThresholdOptimizer for ExhaustiveOptimizer {
    fn optimize_threshold(
        &self,
        actual: &[bool],
        prob: &[f64],
        criterion: Criterion,
    ) -> Result<Vec<ConfusionScore>> {
        if actual.len() != prob.len() {
            return Err(EvalError::Optimizer(format!(
                "actual length {} != prob length {}",
                actual.len(),
                prob.len()
            )));
        }

        let mut candidates = prob
            .iter()
            .copied()
            .filter(|p| !p.is_nan())
            .collect::<Vec<_>>();
        candidates.sort_by(f64::total_cmp);
        candidates.dedup();
        if candidates.is_empty() {
            return Err(EvalError::Optimizer("no candidate thresholds".to_string()));
        }

        let mut best: Option<(f64, ConfusionScore)> = None;
        let mut fallback = None;
        for threshold in candidates {
            let predicted = prob.iter().map(|p| *p >= threshold).collect::<Vec<_>>();
            let counts = ConfusionCounts::from_predictions(actual, &predicted)?;
            let score = ConfusionScore::from_counts(counts, threshold);
            if fallback.is_none() {
                fallback = Some(score);
            }

            let value = criterion.value(&score);
            if value.is_nan() {
                continue;
            }
            if best.as_ref().is_none_or(|(current, _)| value > *current) {
                best = Some((value, score));
            }
        }

        best.map(|(_, score)| score)
            .or(fallback)
            .map(|score| vec![score])
            .ok_or_else(|| EvalError::Optimizer("no candidate thresholds".to_string()))
    }

    fn fixed_threshold_score(&self, actual: &[bool], predicted: &[bool]) -> Result<ConfusionScore> {
        let counts = ConfusionCounts::from_predictions(actual, predicted)?;
        Ok(ConfusionScore::from_counts(counts, f64::NAN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_from_counts() {
        let counts = ConfusionCounts::from_predictions(
            &[true, true, false, false, true],
            &[true, false, true, false, true],
        )
        .unwrap();
        assert_eq!(counts.true_positive, 2);
        assert_eq!(counts.false_negative, 1);
        assert_eq!(counts.false_positive, 1);
        assert_eq!(counts.true_negative, 1);

        let score = ConfusionScore::from_counts(counts, 0.5);
        assert!((score.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((score.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((score.f_score - 2.0 / 3.0).abs() < 1e-12);
        assert!((score.accuracy_rate - 0.6).abs() < 1e-12);
        assert!((score.misclassification_rate - 0.4).abs() < 1e-12);
        assert!((score.specificity - 0.5).abs() < 1e-12);
    }

    #[test]
    fn undefined_precision_gives_zero_f_score() {
        let counts = ConfusionCounts::from_predictions(&[true, false], &[false, false]).unwrap();
        let score = ConfusionScore::from_counts(counts, 0.9);
        assert!(score.precision.is_nan());
        assert_eq!(score.recall, 0.0);
        assert_eq!(score.f_score, 0.0);
    }

    #[test]
    fn exhaustive_picks_best_f_score() {
        let actual = [true, false, true, false];
        let prob = [0.9, 0.8, 0.4, 0.1];
        let rows = ExhaustiveOptimizer
            .optimize_threshold(&actual, &prob, Criterion::FScore)
            .unwrap();
        assert_eq!(rows.len(), 1);
        // 0.1 -> f = 2/3, 0.4 -> f = 0.8, 0.8 -> f = 0.5, 0.9 -> f = 2/3
        assert_eq!(rows[0].threshold, 0.4);
        assert!((rows[0].f_score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn exhaustive_breaks_ties_on_lowest_threshold() {
        let actual = [true, false];
        let prob = [0.2, 0.2];
        let rows = ExhaustiveOptimizer
            .optimize_threshold(&actual, &prob, Criterion::Recall)
            .unwrap();
        assert_eq!(rows[0].threshold, 0.2);
        assert_eq!(rows[0].recall, 1.0);
    }

    #[test]
    fn fixed_score_leaves_threshold_unset() {
        let score = ExhaustiveOptimizer
            .fixed_threshold_score(&[true, false], &[true, true])
            .unwrap();
        assert!(score.threshold.is_nan());
        assert_eq!(score.false_positive, 1);
    }
}
