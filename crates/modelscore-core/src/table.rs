use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// Declared kind of a table field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldKind {
    Bool,
    Numeric,
    Text,
    /// Text with an ordered level list. Level order is significant for
    /// label coercion: with two levels the first one reads as `false`.
    Categorical { levels: Vec<String> },
}

/// Named column of a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Numeric)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn categorical<I, S>(name: impl Into<String>, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            FieldKind::Categorical {
                levels: levels.into_iter().map(Into::into).collect(),
            },
        )
    }
}

/// Ordered rows over a fixed list of fields.
///
/// Tables handed to evaluators are never mutated; every operation that
/// reshapes data builds a new table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    fields: Vec<Field>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
        }
    }

    /// Build a table and check that every row has one cell per field.
    pub fn from_rows(fields: Vec<Field>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::new(fields);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.fields.len() {
            return Err(Error::RowArity {
                row: self.rows.len(),
                found: row.len(),
                expected: self.fields.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|field| field.name == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    pub fn field(&self, name: &str) -> Result<&Field> {
        let idx = self.column_index(name)?;
        Ok(&self.fields[idx])
    }

    /// Cells of one column in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Numeric view of a column; non-numeric and missing cells are `None`.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(self
            .column(name)?
            .into_iter()
            .map(Value::as_f64)
            .collect())
    }

    /// Copy the given rows and columns (by index) into a new table.
    pub fn select(&self, row_indices: &[usize], column_indices: &[usize]) -> Table {
        let fields = column_indices
            .iter()
            .map(|idx| self.fields[*idx].clone())
            .collect();
        let rows = row_indices
            .iter()
            .map(|row_idx| {
                let row = &self.rows[*row_idx];
                column_indices.iter().map(|idx| row[*idx].clone()).collect()
            })
            .collect();
        Table { fields, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_rows_with_wrong_arity() {
        let err = Table::from_rows(
            vec![Field::numeric("a"), Field::numeric("b")],
            vec![vec![Value::Int(1)]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::RowArity {
                row: 0,
                found: 1,
                expected: 2
            }
        ));
    }

    #[test]
    fn select_copies_rows_and_columns() {
        let table = Table::from_rows(
            vec![Field::text("g"), Field::numeric("x")],
            vec![
                vec!["a".into(), Value::Int(1)],
                vec!["b".into(), Value::Int(2)],
                vec!["a".into(), Value::Int(3)],
            ],
        )
        .unwrap();

        let sub = table.select(&[0, 2], &[1]);
        assert_eq!(sub.column_names(), vec!["x"]);
        assert_eq!(sub.numeric_column("x").unwrap(), vec![Some(1.0), Some(3.0)]);
        assert_eq!(table.num_rows(), 3);
    }

    #[test]
    fn missing_column_is_reported() {
        let table = Table::new(vec![Field::numeric("x")]);
        assert!(matches!(
            table.column("y"),
            Err(Error::MissingColumn(name)) if name == "y"
        ));
    }
}
