#![cfg(feature = "parallel")]

use modelscore_core::{Error, Field, Table, Value, apply_per_group};

#[derive(Debug, thiserror::Error)]
#[error("rejected group {0}")]
struct Rejected(i64);

const GROUPS: i64 = 200;

/// Interleaved rows for `GROUPS` groups, discovered in descending order.
/// Group `g` holds `g % 7 + 1` rows.
fn interleaved() -> Table {
    let mut rows = Vec::new();
    for round in 0..7 {
        for group in (0..GROUPS).rev() {
            if round < group % 7 + 1 {
                rows.push(vec![
                    Value::Text(format!("g{group:03}")),
                    Value::Int(group),
                    Value::Int(round),
                ]);
            }
        }
    }
    Table::from_rows(
        vec![Field::text("g"), Field::numeric("id"), Field::numeric("x")],
        rows,
    )
    .expect("build table")
}

fn group_id(sub: &Table) -> i64 {
    sub.numeric_column("id")
        .expect("id column")
        .first()
        .copied()
        .flatten()
        .unwrap_or(-1.0) as i64
}

fn summarize(sub: &Table) -> Result<Table, Rejected> {
    let id = group_id(sub);
    Table::from_rows(
        vec![Field::numeric("id"), Field::numeric("n")],
        vec![vec![Value::Int(id), Value::Int(sub.num_rows() as i64)]],
    )
    .map_err(|_| Rejected(id))
}

#[test]
fn parallel_output_keeps_discovery_order() {
    let table = interleaved();
    let out = apply_per_group(&table, &["g"], summarize).expect("grouped apply");

    assert_eq!(out.column_names(), vec!["g", "id", "n"]);
    assert_eq!(out.num_rows(), GROUPS as usize);

    let keys = out
        .column("g")
        .expect("key column")
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
    let expected = (0..GROUPS)
        .rev()
        .map(|group| Value::Text(format!("g{group:03}")))
        .collect::<Vec<_>>();
    assert_eq!(keys, expected);

    let ids = out.numeric_column("id").expect("ids");
    let counts = out.numeric_column("n").expect("counts");
    for ((group, id), count) in (0..GROUPS).rev().zip(ids).zip(counts) {
        assert_eq!(id, Some(group as f64));
        assert_eq!(count, Some((group % 7 + 1) as f64));
    }
}

#[test]
fn parallel_failure_yields_group_failed_without_output() {
    let table = interleaved();
    let result = apply_per_group(&table, &["g"], |sub: &Table| {
        if group_id(sub) == 150 {
            return Err(Rejected(150));
        }
        summarize(sub)
    });

    match result {
        Err(Error::GroupFailed { group, source }) => {
            assert_eq!(group, "g=g150");
            assert_eq!(source.to_string(), "rejected group 150");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(table) => panic!("expected failure, got {} rows", table.num_rows()),
    }
}
