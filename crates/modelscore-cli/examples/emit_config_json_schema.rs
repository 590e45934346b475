use modelscore_cli::config::EvaluationConfig;
use schemars::schema_for;

fn main() {
    let schema = schema_for!(EvaluationConfig);
    let json = serde_json::to_string_pretty(&schema).expect("serialize json schema");
    println!("{json}");
}
