//! Typed views over table columns: numeric scores and boolean labels.

use serde::{Deserialize, Serialize};

use modelscore_core::{FieldKind, Table, Value};

use crate::errors::{EvalError, Result};

/// How label cells are turned into booleans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMapping {
    /// Compatibility rules: booleans as is, numeric `0`/`1`, boolean-like
    /// text, and two-level categoricals where the FIRST level is `false`
    /// and the second is `true`. A categorical whose levels are declared in
    /// the other order silently inverts every curve and score; prefer
    /// [`LabelMapping::Positive`] when the level order is not controlled.
    #[default]
    Legacy,
    /// A cell is `true` when its text rendering equals this value and `false`
    /// otherwise.
    Positive(String),
}

impl LabelMapping {
    pub fn positive(value: impl Into<String>) -> Self {
        LabelMapping::Positive(value.into())
    }
}

/// Boolean labels of `column`; missing cells are `None`.
pub fn label_values(
    table: &Table,
    column: &str,
    mapping: &LabelMapping,
) -> Result<Vec<Option<bool>>> {
    let field = table.field(column)?;
    let cells = table.column(column)?;

    match mapping {
        LabelMapping::Positive(positive) => Ok(cells
            .into_iter()
            .map(|cell| (!is_missing(cell)).then(|| cell.render() == *positive))
            .collect()),
        LabelMapping::Legacy => match &field.kind {
            FieldKind::Categorical { levels } => {
                if levels.len() != 2 {
                    return Err(EvalError::InvalidLabel {
                        column: column.to_string(),
                        message: format!(
                            "categorical label needs exactly 2 levels, found {}",
                            levels.len()
                        ),
                    });
                }
                cells
                    .into_iter()
                    .map(|cell| {
                        if is_missing(cell) {
                            return Ok(None);
                        }
                        let rendered = cell.render();
                        match levels.iter().position(|level| *level == rendered) {
                            Some(position) => Ok(Some(position == 1)),
                            None => Err(EvalError::InvalidLabel {
                                column: column.to_string(),
                                message: format!("value '{rendered}' is not a declared level"),
                            }),
                        }
                    })
                    .collect()
            }
            _ => cells
                .into_iter()
                .map(|cell| legacy_bool(cell, column))
                .collect(),
        },
    }
}

/// Numeric cells of `column`; `Null` and `NaN` are `None`, any other
/// non-numeric cell is an error.
pub fn numeric_values(table: &Table, column: &str) -> Result<Vec<Option<f64>>> {
    table
        .column(column)?
        .into_iter()
        .map(|cell| match cell {
            Value::Null => Ok(None),
            Value::Int(_) | Value::Float(_) => Ok(cell.as_f64()),
            other => Err(EvalError::NonNumeric {
                column: column.to_string(),
                value: other.render(),
            }),
        })
        .collect()
}

/// Boolean reading of free-form text, shared with the CSV loader.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "t" | "yes" | "1" => Some(true),
        "false" | "f" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn is_missing(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::Float(value) => value.is_nan(),
        _ => false,
    }
}

fn legacy_bool(cell: &Value, column: &str) -> Result<Option<bool>> {
    if is_missing(cell) {
        return Ok(None);
    }
    let parsed = match cell {
        Value::Bool(value) => Some(*value),
        Value::Int(0) => Some(false),
        Value::Int(1) => Some(true),
        Value::Float(value) if *value == 0.0 => Some(false),
        Value::Float(value) if *value == 1.0 => Some(true),
        Value::Text(value) => parse_bool(value.trim()),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| EvalError::InvalidLabel {
        column: column.to_string(),
        message: format!(
            "cannot read '{}' as a boolean; declare the column categorical or pass a positive label",
            cell.render()
        ),
    })
}
