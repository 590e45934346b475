use modelscore_core::Table;

use crate::metrics::MetricsReport;

/// Render a deterministic markdown report from run metrics and the result
/// table. At most `max_rows` result rows are listed.
pub fn render_report(metrics: &MetricsReport, result: &Table, max_rows: usize) -> String {
    let mut lines = Vec::new();

    lines.push("# modelscore Evaluation Report".to_string());
    lines.push(String::new());
    lines.push("## Run summary".to_string());
    lines.push(format!("- run_id: {}", metrics.run_id));
    lines.push(format!("- kind: {}", metrics.kind));
    let group_by = if metrics.group_by.is_empty() {
        "-".to_string()
    } else {
        metrics.group_by.join(", ")
    };
    lines.push(format!("- group_by: {group_by}"));
    lines.push(format!("- input_rows: {}", metrics.input_rows));
    lines.push(format!("- groups: {}", metrics.groups));
    lines.push(format!("- result_rows: {}", metrics.result_rows));
    lines.push(format!("- undefined_values: {}", metrics.undefined_values));
    lines.push(String::new());

    lines.push("## Results".to_string());
    let names = result.column_names();
    lines.push(format!(
        "| {} |",
        names
            .iter()
            .map(|name| escape_cell(name))
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    lines.push(format!(
        "| {} |",
        names.iter().map(|_| "---").collect::<Vec<_>>().join(" | ")
    ));
    for row in result.rows().iter().take(max_rows) {
        let cells = row
            .iter()
            .map(|value| {
                if value.is_null() {
                    "NA".to_string()
                } else {
                    escape_cell(&value.render())
                }
            })
            .collect::<Vec<_>>();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    if result.num_rows() > max_rows {
        lines.push(format!(
            "_{} more row(s) in result.csv_",
            result.num_rows() - max_rows
        ));
    }
    lines.push(String::new());

    if !metrics.warnings.is_empty() {
        lines.push("## Warnings".to_string());
        for warning in &metrics.warnings {
            let hint = warning
                .hint
                .as_ref()
                .map(|hint| format!(" (hint: {hint})"))
                .unwrap_or_default();
            lines.push(format!("- {}: {}{}", warning.path, warning.message, hint));
        }
        lines.push(String::new());
    }

    lines.push("## Recommendations".to_string());
    lines.extend(recommendations(metrics));
    lines.join("\n")
}

/// Keep a cell on one table row: `|` is escaped and line breaks become spaces.
fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

fn recommendations(metrics: &MetricsReport) -> Vec<String> {
    let mut lines = Vec::new();
    if metrics.undefined_values > 0 {
        lines.push(
            "- undefined metrics present; look for single-class groups or constant actual values."
                .to_string(),
        );
    }
    if metrics
        .warnings
        .iter()
        .any(|warning| warning.code == "auc_below_half")
    {
        lines.push("- auc below 0.5 usually means an inverted label; set positive_label.".to_string());
    }
    if metrics.groups == 0 {
        lines.push("- no groups found; check the input rows and group_by columns.".to_string());
    }
    if lines.is_empty() {
        lines.push("- no issues detected; compare metrics across runs for drift.".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{METRICS_VERSION, PerformanceMetrics, WarningItem};
    use modelscore_core::{Field, Value};

    fn metrics(warnings: Vec<WarningItem>, undefined_values: u64) -> MetricsReport {
        MetricsReport {
            metrics_version: METRICS_VERSION.to_string(),
            run_id: "run-1".to_string(),
            kind: "binary".to_string(),
            group_by: vec!["model".to_string()],
            input_rows: 8,
            groups: 2,
            result_rows: 2,
            undefined_values,
            warnings,
            performance: PerformanceMetrics {
                load_ms: 0,
                evaluate_ms: 0,
                total_ms: 0,
            },
        }
    }

    fn result() -> Table {
        Table::from_rows(
            vec![Field::text("model"), Field::numeric("auc")],
            vec![
                vec!["m1".into(), Value::Float(0.75)],
                vec!["m2".into(), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn lists_results_and_truncates() {
        let report = render_report(&metrics(Vec::new(), 0), &result(), 1);
        assert!(report.starts_with("# modelscore Evaluation Report"));
        assert!(report.contains("| model | auc |"));
        assert!(report.contains("| m1 | 0.75 |"));
        assert!(!report.contains("| m2 |"));
        assert!(report.contains("_1 more row(s) in result.csv_"));
        assert!(report.contains("- no issues detected"));
    }

    #[test]
    fn recommends_on_warnings_and_undefined_values() {
        let warning = WarningItem {
            code: "auc_below_half".to_string(),
            path: "model=m1".to_string(),
            message: "auc 0.2500 is below 0.5".to_string(),
            hint: None,
        };
        let report = render_report(&metrics(vec![warning], 1), &result(), 10);
        assert!(report.contains("| m2 | NA |"));
        assert!(report.contains("## Warnings\n- model=m1: auc 0.2500 is below 0.5"));
        assert!(report.contains("inverted label"));
        assert!(report.contains("single-class groups"));
        assert!(!report.contains("no issues detected"));
    }

    #[test]
    fn pipes_and_line_breaks_stay_inside_cells() {
        let result = Table::from_rows(
            vec![Field::text("segment|tier"), Field::numeric("auc")],
            vec![vec!["a|b\nc".into(), Value::Float(f64::NAN)]],
        )
        .unwrap();
        let report = render_report(&metrics(Vec::new(), 1), &result, 10);
        assert!(report.contains("| segment\\|tier | auc |"));
        assert!(report.contains("| a\\|b c | NaN |"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let metrics = metrics(Vec::new(), 1);
        assert_eq!(
            render_report(&metrics, &result(), 5),
            render_report(&metrics, &result(), 5)
        );
    }
}
