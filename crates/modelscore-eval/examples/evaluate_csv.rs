use std::env;
use std::path::PathBuf;

use modelscore_eval::{
    EvaluateOptions, Evaluation, EvaluationEngine, Threshold, load_table_csv, table_to_csv_string,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut input: Option<PathBuf> = None;
    let mut group_by = Vec::new();
    let mut prob_col = "prob".to_string();
    let mut label_col = "label".to_string();
    let mut threshold = Threshold::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--group-by" => group_by.extend(args.next()),
            "--prob" => prob_col = args.next().ok_or("missing --prob column")?,
            "--label" => label_col = args.next().ok_or("missing --label column")?,
            "--threshold" => {
                threshold = args.next().ok_or("missing --threshold value")?.parse()?;
            }
            _ => {
                if input.is_none() {
                    input = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let input = input.ok_or("missing input csv path")?;
    let table = load_table_csv(&input, &[])?;

    let engine = EvaluationEngine::new(EvaluateOptions {
        group_by,
        ..EvaluateOptions::default()
    });
    let result = engine.run(
        &table,
        &Evaluation::Binary {
            prob_col,
            label_col,
            threshold,
        },
    )?;

    print!("{}", table_to_csv_string(&result.table)?);
    for warning in &result.warnings {
        eprintln!("warning {}: {}", warning.path, warning.message);
    }
    Ok(())
}
