//! Grouped apply-then-flatten over a [`Table`].
//!
//! Rows are partitioned by the values of the key columns into groups kept in
//! first-seen order. Each group is handed to a per-group function as its own
//! sub-table (key columns removed) and the returned tables are concatenated
//! with the group's key values prefixed to every result row.

use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::naming::disambiguate;
use crate::table::{Field, Table};
use crate::value::Value;

/// One group: its key values and the indices of its rows in the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: Vec<Value>,
    pub rows: Vec<usize>,
}

/// Row-index partition of a table by a list of key columns.
#[derive(Debug, Clone)]
pub struct Partition {
    key_names: Vec<String>,
    key_indices: Vec<usize>,
    value_indices: Vec<usize>,
    groups: Vec<Group>,
}

impl Partition {
    /// Partition `table` by `group_key`. An empty key yields a single group
    /// holding every row, even when the table has no rows.
    pub fn new<S: AsRef<str>>(table: &Table, group_key: &[S]) -> Result<Self> {
        let key_indices = group_key
            .iter()
            .map(|name| table.column_index(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let key_names = group_key
            .iter()
            .map(|name| name.as_ref().to_string())
            .collect::<Vec<_>>();
        let value_indices = (0..table.fields().len())
            .filter(|idx| !key_indices.contains(idx))
            .collect::<Vec<_>>();

        if key_indices.is_empty() {
            return Ok(Self {
                key_names,
                key_indices,
                value_indices,
                groups: vec![Group {
                    key: Vec::new(),
                    rows: (0..table.num_rows()).collect(),
                }],
            });
        }

        let mut lookup: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();
        for (row_idx, row) in table.rows().iter().enumerate() {
            let key = key_indices
                .iter()
                .map(|idx| row[*idx].clone())
                .collect::<Vec<_>>();
            let lookup_key = key.iter().map(Value::key).collect::<Vec<_>>().join("|");
            match lookup.get(&lookup_key) {
                Some(group_idx) => groups[*group_idx].rows.push(row_idx),
                None => {
                    lookup.insert(lookup_key, groups.len());
                    groups.push(Group {
                        key,
                        rows: vec![row_idx],
                    });
                }
            }
        }

        Ok(Self {
            key_names,
            key_indices,
            value_indices,
            groups,
        })
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sub-table of one group without the key columns.
    pub fn sub_table(&self, table: &Table, group: &Group) -> Table {
        table.select(&group.rows, &self.value_indices)
    }

    /// Human-readable rendering of a group key, used in logs and errors.
    pub fn label(&self, group: &Group) -> String {
        if self.key_names.is_empty() {
            return "<all rows>".to_string();
        }
        self.key_names
            .iter()
            .zip(&group.key)
            .map(|(name, value)| format!("{name}={}", value.render()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Apply `per_group` to every group of `table` and flatten the results.
///
/// Output fields are the key fields followed by the fields of the per-group
/// results; result names that collide with a key name get a `.new` suffix.
/// Every group must return the same field names. The first failing group
/// aborts the call.
pub fn apply_per_group<S, F, E>(table: &Table, group_key: &[S], per_group: F) -> Result<Table>
where
    S: AsRef<str>,
    F: Fn(&Table) -> std::result::Result<Table, E> + Sync,
    E: std::error::Error + Send + Sync + 'static,
{
    let partition = Partition::new(table, group_key)?;

    let run = |group: &Group| -> Result<Table> {
        let sub = partition.sub_table(table, group);
        let result = per_group(&sub).map_err(|err| Error::GroupFailed {
            group: partition.label(group),
            source: Box::new(err),
        })?;
        tracing::debug!(
            event = "group_evaluated",
            group = %partition.label(group),
            rows = group.rows.len(),
            result_rows = result.num_rows()
        );
        Ok(result)
    };

    #[cfg(feature = "parallel")]
    let results = partition
        .groups
        .par_iter()
        .map(run)
        .collect::<Result<Vec<_>>>()?;
    #[cfg(not(feature = "parallel"))]
    let results = partition
        .groups
        .iter()
        .map(run)
        .collect::<Result<Vec<_>>>()?;

    flatten(table, &partition, results)
}

fn flatten(table: &Table, partition: &Partition, results: Vec<Table>) -> Result<Table> {
    let mut fields: Vec<Field> = partition
        .key_indices
        .iter()
        .map(|idx| table.fields()[*idx].clone())
        .collect();

    let Some(first) = results.first() else {
        return Ok(Table::new(fields));
    };

    let result_names = first
        .fields()
        .iter()
        .map(|field| field.name.clone())
        .collect::<Vec<_>>();
    for (group, result) in partition.groups.iter().zip(&results).skip(1) {
        let names = result.column_names();
        if names != result_names {
            return Err(Error::SchemaMismatch(format!(
                "group {} returned columns [{}], expected [{}]",
                partition.label(group),
                names.join(", "),
                result_names.join(", ")
            )));
        }
    }

    let renamed = disambiguate(&partition.key_names, &result_names);
    fields.extend(
        first
            .fields()
            .iter()
            .zip(renamed)
            .map(|(field, name)| Field::new(name, field.kind.clone())),
    );

    let mut out = Table::new(fields);
    for (group, result) in partition.groups.iter().zip(results) {
        for row in result.rows() {
            let mut flat = Vec::with_capacity(group.key.len() + row.len());
            flat.extend(group.key.iter().cloned());
            flat.extend(row.iter().cloned());
            out.push_row(flat)?;
        }
    }
    Ok(out)
}
