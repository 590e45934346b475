use modelscore_core::{Error, Field, Table, Value, apply_per_group};

#[derive(Debug, thiserror::Error)]
#[error("boom in {0}")]
struct Boom(String);

fn folds() -> Table {
    Table::from_rows(
        vec![
            Field::text("fold"),
            Field::numeric("x"),
            Field::numeric("total"),
        ],
        vec![
            vec!["f2".into(), Value::Int(1), Value::Int(0)],
            vec!["f1".into(), Value::Int(2), Value::Int(0)],
            vec!["f2".into(), Value::Int(3), Value::Int(0)],
            vec!["f3".into(), Value::Int(4), Value::Int(0)],
        ],
    )
    .expect("build table")
}

fn sum_x(sub: &Table) -> Result<Table, Boom> {
    let total: f64 = sub
        .numeric_column("x")
        .map_err(|err| Boom(err.to_string()))?
        .into_iter()
        .flatten()
        .sum();
    Table::from_rows(
        vec![Field::numeric("total")],
        vec![vec![Value::Float(total)]],
    )
    .map_err(|err| Boom(err.to_string()))
}

#[test]
fn one_row_per_group_in_discovery_order() {
    let table = folds();
    let out = apply_per_group(&table, &["fold"], sum_x).expect("grouped apply");

    assert_eq!(out.column_names(), vec!["fold", "total"]);
    assert_eq!(out.num_rows(), 3);
    assert_eq!(
        out.column("fold").unwrap(),
        vec![
            &Value::from("f2"),
            &Value::from("f1"),
            &Value::from("f3")
        ]
    );
    assert_eq!(
        out.numeric_column("total").unwrap(),
        vec![Some(4.0), Some(2.0), Some(4.0)]
    );
}

#[test]
fn sub_tables_exclude_key_columns() {
    let table = folds();
    let out = apply_per_group(&table, &["fold"], |sub: &Table| {
        assert_eq!(sub.column_names(), vec!["x", "total"]);
        Ok::<_, Boom>(Table::new(vec![Field::numeric("n")]))
    })
    .expect("grouped apply");
    assert_eq!(out.num_rows(), 0);
    assert_eq!(out.column_names(), vec!["fold", "n"]);
}

#[test]
fn result_columns_colliding_with_keys_are_renamed() {
    let table = folds();
    let out = apply_per_group(&table, &["total"], sum_x).expect("grouped apply");
    assert_eq!(out.column_names(), vec!["total", "total.new"]);
    assert_eq!(out.num_rows(), 1);
    assert_eq!(out.numeric_column("total.new").unwrap(), vec![Some(10.0)]);
}

#[test]
fn empty_key_evaluates_whole_table() {
    let table = folds();
    let out = apply_per_group::<&str, _, _>(&table, &[], sum_x).expect("grouped apply");
    assert_eq!(out.column_names(), vec!["total"]);
    assert_eq!(out.numeric_column("total").unwrap(), vec![Some(10.0)]);
}

#[test]
fn failing_group_aborts_whole_call() {
    let table = folds();
    let err = apply_per_group(&table, &["fold"], |sub: &Table| {
        if sub.num_rows() == 2 {
            return Err(Boom("f2".to_string()));
        }
        sum_x(sub)
    })
    .unwrap_err();

    match err {
        Error::GroupFailed { group, source } => {
            assert_eq!(group, "fold=f2");
            assert_eq!(source.to_string(), "boom in f2");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn mismatched_result_columns_fail() {
    let table = folds();
    let err = apply_per_group(&table, &["fold"], |sub: &Table| {
        let name = if sub.num_rows() == 2 { "a" } else { "b" };
        Ok::<_, Boom>(Table::new(vec![Field::numeric(name)]))
    })
    .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch(_)));
}

#[test]
fn keyed_empty_table_has_no_groups() {
    let table = Table::new(vec![Field::text("fold"), Field::numeric("x")]);
    let out = apply_per_group(&table, &["fold"], sum_x).expect("grouped apply");
    assert_eq!(out.column_names(), vec!["fold"]);
    assert!(out.is_empty());
}

#[test]
fn equal_numeric_keys_share_a_group() {
    let table = Table::from_rows(
        vec![Field::numeric("bucket"), Field::numeric("x")],
        vec![
            vec![Value::Int(1), Value::Int(1)],
            vec![Value::Float(1.0), Value::Int(2)],
            vec![Value::Float(0.0), Value::Int(3)],
            vec![Value::Float(-0.0), Value::Int(4)],
            vec![Value::Float(1.5), Value::Int(5)],
        ],
    )
    .expect("build table");
    let out = apply_per_group(&table, &["bucket"], sum_x).expect("grouped apply");

    assert_eq!(out.num_rows(), 3);
    assert_eq!(
        out.numeric_column("total").unwrap(),
        vec![Some(3.0), Some(7.0), Some(5.0)]
    );
}
