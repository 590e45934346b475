use serde::{Deserialize, Serialize};

/// Metrics contract version for evaluation runs.
pub const METRICS_VERSION: &str = "0.1";

/// Machine-readable summary of one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub metrics_version: String,
    pub run_id: String,
    pub kind: String,
    pub group_by: Vec<String>,
    pub input_rows: u64,
    pub groups: u64,
    pub result_rows: u64,
    /// Metric cells that are NA or non-finite in the result table.
    pub undefined_values: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<WarningItem>,
    pub performance: PerformanceMetrics,
}

/// Structured warning entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningItem {
    pub code: String,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Performance timings for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub load_ms: u128,
    pub evaluate_ms: u128,
    pub total_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_warnings_are_omitted() {
        let report = MetricsReport {
            metrics_version: METRICS_VERSION.to_string(),
            run_id: "run-1".to_string(),
            kind: "regression".to_string(),
            group_by: Vec::new(),
            input_rows: 3,
            groups: 1,
            result_rows: 1,
            undefined_values: 0,
            warnings: Vec::new(),
            performance: PerformanceMetrics {
                load_ms: 1,
                evaluate_ms: 2,
                total_ms: 3,
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("warnings").is_none());
        assert_eq!(json["performance"]["total_ms"], 3);
        assert_eq!(json["metrics_version"], METRICS_VERSION);
    }
}
