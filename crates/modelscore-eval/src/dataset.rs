use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use modelscore_core::{Field, FieldKind, Table, Value};

use crate::columns::parse_bool;
use crate::errors::{EvalError, Result};

/// Declared kind for one CSV column. Undeclared columns are inferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Load a CSV file with a header row into a [`Table`].
pub fn load_table_csv(path: &Path, specs: &[ColumnSpec]) -> Result<Table> {
    let file = File::open(path)?;
    read_table_csv(file, specs)
}

/// Read CSV data with a header row into a [`Table`].
///
/// Empty cells and `null`/`NA` (any case) are missing. Column kinds come from
/// `specs` or, when undeclared, from the data: all numeric, then all
/// boolean words, otherwise text.
pub fn read_table_csv<R: Read>(reader: R, specs: &[ColumnSpec]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();

    for spec in specs {
        if !headers.contains(&spec.name) {
            return Err(EvalError::InvalidDataset(format!(
                "declared column '{}' not found in header",
                spec.name
            )));
        }
    }

    let mut raw: Vec<Vec<String>> = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() != headers.len() {
            return Err(EvalError::InvalidDataset(format!(
                "row {} has {} field(s), expected {}",
                row_idx + 1,
                record.len(),
                headers.len()
            )));
        }
        raw.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }

    let fields = headers
        .iter()
        .enumerate()
        .map(|(col_idx, name)| {
            let kind = specs
                .iter()
                .find(|spec| spec.name == *name)
                .map(|spec| spec.kind.clone())
                .unwrap_or_else(|| infer_kind(raw.iter().map(|row| row[col_idx].as_str())));
            Field::new(name.clone(), kind)
        })
        .collect::<Vec<_>>();

    let mut rows = Vec::with_capacity(raw.len());
    for (row_idx, record) in raw.iter().enumerate() {
        let row = fields
            .iter()
            .zip(record)
            .map(|(field, cell)| {
                parse_value(&field.kind, cell).map_err(|message| {
                    EvalError::InvalidDataset(format!(
                        "{} row {}: {}",
                        field.name,
                        row_idx + 1,
                        message
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }

    tracing::debug!(
        event = "dataset_loaded",
        rows = rows.len(),
        columns = fields.len()
    );

    Ok(Table::from_rows(fields, rows)?)
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("null") || value.eq_ignore_ascii_case("na")
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> FieldKind {
    let present = cells.filter(|cell| !is_missing(cell)).collect::<Vec<_>>();
    if present.is_empty() {
        return FieldKind::Text;
    }
    if present.iter().all(|cell| cell.parse::<f64>().is_ok()) {
        return FieldKind::Numeric;
    }
    if present.iter().all(|cell| parse_bool(cell).is_some()) {
        return FieldKind::Bool;
    }
    FieldKind::Text
}

fn parse_value(kind: &FieldKind, value: &str) -> std::result::Result<Value, String> {
    if is_missing(value) {
        return Ok(Value::Null);
    }

    match kind {
        FieldKind::Numeric => {
            if let Ok(value) = value.parse::<i64>() {
                Ok(Value::Int(value))
            } else {
                value
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| format!("invalid number '{value}'"))
            }
        }
        FieldKind::Bool => parse_bool(value)
            .map(Value::Bool)
            .ok_or_else(|| format!("invalid boolean '{value}'")),
        FieldKind::Text => Ok(Value::Text(value.to_string())),
        FieldKind::Categorical { levels } => {
            if levels.iter().any(|level| level == value) {
                Ok(Value::Text(value.to_string()))
            } else {
                Err(format!(
                    "'{value}' is not one of the levels [{}]",
                    levels.join(", ")
                ))
            }
        }
    }
}
