use super::*;
use sb_core::DesiredRow;

fn countries_store() -> DuckDbStore {
    let db = DuckDbStore::in_memory().unwrap();
    db.execute_batch(
        "CREATE SEQUENCE countries_id_seq;
         CREATE TABLE countries (
             id INTEGER PRIMARY KEY DEFAULT nextval('countries_id_seq'),
             code VARCHAR NOT NULL,
             name VARCHAR,
             population BIGINT
         );",
    )
    .unwrap();
    db
}

fn countries(db: &DuckDbStore) -> Arc<EntityType> {
    Arc::new(db.describe(&TableName::new("countries")).unwrap())
}

fn row(pairs: &[(&str, Value)]) -> DesiredRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn by_code(code: &str) -> Vec<(String, Value)> {
    vec![("code".to_string(), Value::from(code))]
}

#[test]
fn test_in_memory() {
    let db = DuckDbStore::in_memory().unwrap();
    assert_eq!(db.store_type(), "duckdb");
    assert!(db.sequence_support().is_some());
}

#[test]
fn test_new_with_file_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seeds.duckdb");
    let db = DuckDbStore::new(path.to_str().unwrap()).unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
    assert!(path.exists());
}

#[test]
fn test_describe_table() {
    let db = countries_store();
    let entity = countries(&db);
    assert_eq!(
        entity.known_attributes(),
        vec!["id", "code", "name", "population"]
    );
    assert_eq!(entity.primary_key(), Some("id"));
    assert_eq!(entity.sequence(), Some("countries_id_seq"));

    let code = entity.column("code").unwrap();
    assert_eq!(code.data_type, "VARCHAR");
    assert!(!code.nullable);
    assert!(entity.column("id").unwrap().has_default);
    assert!(entity.column("name").unwrap().nullable);
}

#[test]
fn test_describe_table_without_key() {
    let db = DuckDbStore::in_memory().unwrap();
    db.execute_batch("CREATE SCHEMA ref; CREATE TABLE ref.flags (flag VARCHAR, enabled BOOLEAN)")
        .unwrap();
    let entity = db.describe(&TableName::new("ref.flags")).unwrap();
    assert_eq!(entity.known_attributes(), vec!["flag", "enabled"]);
    assert_eq!(entity.primary_key(), None);
    assert_eq!(entity.sequence(), None);
}

#[test]
fn test_describe_missing_table() {
    let db = DuckDbStore::in_memory().unwrap();
    let err = db.describe(&TableName::new("nope")).unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(_)));
}

#[test]
fn test_insert_returns_generated_key() {
    let db = countries_store();
    let entity = countries(&db);
    let mut record = db.new_record(&entity);
    db.assign(&mut record, &row(&[("code", "US".into()), ("name", "United States".into())]))
        .unwrap();
    assert!(db.is_new_record(&record));

    db.persist(&mut record, false).unwrap();

    assert!(!db.is_new_record(&record));
    assert_eq!(record.get("id"), Some(&Value::Int(1)));
    assert_eq!(record.get("population"), Some(&Value::Null));
    assert_eq!(db.query_count("SELECT * FROM countries").unwrap(), 1);
}

#[test]
fn test_find_one_and_update_changed_columns() {
    let db = countries_store();
    db.execute_batch("INSERT INTO countries (code, name) VALUES ('US', 'USA'), ('CA', 'Canada')")
        .unwrap();
    let entity = countries(&db);

    let mut found = db.find_one(&entity, &by_code("US")).unwrap().unwrap();
    assert!(!found.is_new_record());
    assert_eq!(found.get("name"), Some(&Value::from("USA")));

    db.assign(&mut found, &row(&[("code", "US".into()), ("name", "United States".into())]))
        .unwrap();
    assert_eq!(found.changed_attributes().collect::<Vec<_>>(), vec!["name"]);
    db.persist(&mut found, false).unwrap();

    let reloaded = db.find_one(&entity, &by_code("US")).unwrap().unwrap();
    assert_eq!(reloaded.get("name"), Some(&Value::from("United States")));
    assert_eq!(db.query_count("SELECT * FROM countries").unwrap(), 2);
}

#[test]
fn test_find_one_null_matches_null() {
    let db = countries_store();
    db.execute_batch(
        "INSERT INTO countries (code, name) VALUES ('XX', NULL), ('YY', 'Named')",
    )
    .unwrap();
    let entity = countries(&db);

    let predicate = vec![("name".to_string(), Value::Null)];
    let found = db.find_one(&entity, &predicate).unwrap().unwrap();
    assert_eq!(found.get("code"), Some(&Value::from("XX")));

    assert!(db.find_one(&entity, &by_code("ZZ")).unwrap().is_none());
}

#[test]
fn test_find_one_unknown_attribute() {
    let db = countries_store();
    let entity = countries(&db);
    let predicate = vec![("capital".to_string(), Value::from("Ottawa"))];
    assert!(matches!(
        db.find_one(&entity, &predicate).unwrap_err(),
        DbError::Record(_)
    ));
}

#[test]
fn test_persist_with_validation() {
    let db = countries_store();
    let entity = countries(&db);
    let mut record = db.new_record(&entity);
    db.assign(&mut record, &row(&[("name", "Nowhere".into())])).unwrap();

    let err = db.persist(&mut record, true).unwrap_err();
    assert!(matches!(err, DbError::ValidationFailed { .. }));
    assert!(err.to_string().contains("code can't be null"));
    assert_eq!(db.query_count("SELECT * FROM countries").unwrap(), 0);
}

#[test]
fn test_persist_without_validation_hits_store_constraint() {
    let db = countries_store();
    let entity = countries(&db);
    let mut record = db.new_record(&entity);
    db.assign(&mut record, &row(&[("name", "Nowhere".into())])).unwrap();

    let err = db.persist(&mut record, false).unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(_)), "{err}");
    assert!(db.is_new_record(&record));
}

#[test]
fn test_transaction_rolls_back_on_error() {
    let db = countries_store();
    let entity = countries(&db);

    let result: Result<(), DbError> = db.transaction(&entity, |db| {
        let mut first = db.new_record(&entity);
        db.assign(&mut first, &row(&[("code", "US".into())]))?;
        db.persist(&mut first, false)?;
        Err(DbError::Internal("boom".to_string()))
    });

    assert!(result.is_err());
    assert_eq!(db.query_count("SELECT * FROM countries").unwrap(), 0);
}

#[test]
fn test_transaction_commits() {
    let db = countries_store();
    let entity = countries(&db);

    let inserted: Result<usize, DbError> = db.transaction(&entity, |db| {
        for code in ["US", "CA"] {
            let mut record = db.new_record(&entity);
            db.assign(&mut record, &row(&[("code", code.into())]))?;
            db.persist(&mut record, false)?;
        }
        Ok(2)
    });

    assert_eq!(inserted.unwrap(), 2);
    assert_eq!(db.query_count("SELECT * FROM countries").unwrap(), 2);
}

#[test]
fn test_sequence_last_value() {
    let db = countries_store();
    let entity = countries(&db);
    let sequences = db.sequence_support().unwrap();

    assert_eq!(sequences.last_sequence_value(&entity).unwrap(), None);
    db.execute_batch("INSERT INTO countries (code) VALUES ('US'), ('CA')")
        .unwrap();
    assert_eq!(sequences.last_sequence_value(&entity).unwrap(), Some(2));
}

#[test]
fn test_resync_sequence_to_table_max() {
    let db = countries_store();
    let entity = countries(&db);
    db.execute_batch("INSERT INTO countries (id, code) VALUES (12, 'US'), (5, 'CA')")
        .unwrap();
    let sequences = db.sequence_support().unwrap();

    sequences.resync_sequence_to_table_max(&entity).unwrap();
    assert_eq!(sequences.last_sequence_value(&entity).unwrap(), Some(12));

    db.execute_batch("INSERT INTO countries (code) VALUES ('MX')")
        .unwrap();
    let mx = db.find_one(&entity, &by_code("MX")).unwrap().unwrap();
    assert_eq!(mx.get("id"), Some(&Value::Int(13)));
}

#[test]
fn test_resync_leaves_advanced_sequence_alone() {
    let db = countries_store();
    let entity = countries(&db);
    db.execute_batch(
        "SELECT nextval('countries_id_seq') FROM range(20);
         INSERT INTO countries (id, code) VALUES (12, 'US');",
    )
    .unwrap();
    let sequences = db.sequence_support().unwrap();

    sequences.resync_sequence_to_table_max(&entity).unwrap();
    assert_eq!(sequences.last_sequence_value(&entity).unwrap(), Some(20));
}

#[test]
fn test_value_round_trip_types() {
    let db = DuckDbStore::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE things (flag BOOLEAN, ratio DOUBLE, price DECIMAL(10,2), born DATE, label VARCHAR)",
    )
    .unwrap();
    let entity = Arc::new(db.describe(&TableName::new("things")).unwrap());
    let mut record = db.new_record(&entity);
    db.assign(
        &mut record,
        &row(&[
            ("flag", Value::Bool(true)),
            ("ratio", Value::Float(0.5)),
            ("price", Value::Float(2.5)),
            ("born", Value::from("2024-01-31")),
            ("label", Value::from("x")),
        ]),
    )
    .unwrap();
    db.persist(&mut record, true).unwrap();

    assert_eq!(record.get("flag"), Some(&Value::Bool(true)));
    assert_eq!(record.get("ratio"), Some(&Value::Float(0.5)));
    assert_eq!(record.get("price"), Some(&Value::Float(2.5)));
    assert_eq!(record.get("born"), Some(&Value::from("2024-01-31")));
}

fn wide_store() -> DuckDbStore {
    let db = DuckDbStore::in_memory().unwrap();
    db.execute_batch(
        "CREATE SEQUENCE accounts_id_seq;
         CREATE TABLE accounts (
             id BIGINT PRIMARY KEY DEFAULT nextval('accounts_id_seq'),
             owner VARCHAR
         );",
    )
    .unwrap();
    db
}

#[test]
fn test_resync_large_gap() {
    let db = wide_store();
    let entity = db.describe(&TableName::new("accounts")).unwrap();
    db.execute_batch("INSERT INTO accounts (id, owner) VALUES (1500000, 'ops')")
        .unwrap();
    let sequences = db.sequence_support().unwrap();

    sequences.resync_sequence_to_table_max(&entity).unwrap();
    assert_eq!(sequences.last_sequence_value(&entity).unwrap(), Some(1_500_000));
}

#[test]
fn test_resync_refuses_unbounded_advance() {
    let db = wide_store();
    let entity = db.describe(&TableName::new("accounts")).unwrap();
    db.execute_batch(&format!(
        "INSERT INTO accounts (id, owner) VALUES (2000000000, 'a'), ({}, 'b')",
        i64::MAX
    ))
    .unwrap();
    let sequences = db.sequence_support().unwrap();

    let err = sequences.resync_sequence_to_table_max(&entity).unwrap_err();
    assert!(matches!(err, DbError::Internal(_)));
    assert!(err.to_string().contains("advance it manually"));
    assert_eq!(sequences.last_sequence_value(&entity).unwrap(), None);
}

#[test]
fn test_resync_steps() {
    let info = |start_value, increment_by, last_value| SequenceInfo {
        start_value,
        increment_by,
        last_value,
    };

    assert_eq!(resync_steps(&info(1, 1, None), "s", 12).unwrap(), Some(12));
    assert_eq!(resync_steps(&info(1, 1, Some(7)), "s", 12).unwrap(), Some(5));
    assert_eq!(resync_steps(&info(1, 5, Some(6)), "s", 12).unwrap(), Some(2));
    assert_eq!(resync_steps(&info(1, 1, Some(20)), "s", 12).unwrap(), None);
    assert!(resync_steps(&info(1, 0, None), "s", 12).is_err());
}

#[test]
fn test_resync_steps_overflow() {
    let at_min = SequenceInfo {
        start_value: i64::MIN,
        increment_by: 1,
        last_value: None,
    };
    let err = resync_steps(&at_min, "s", 5).unwrap_err();
    assert!(err.to_string().contains("overflow"));

    let far_below = SequenceInfo {
        start_value: 1,
        increment_by: 1,
        last_value: Some(i64::MIN + 1),
    };
    let err = resync_steps(&far_below, "s", i64::MAX).unwrap_err();
    assert!(err.to_string().contains("overflow"));
}

#[test]
fn test_describe_ignores_identifier_case() {
    let db = countries_store();
    let entity = db.describe(&TableName::new("Main.COUNTRIES")).unwrap();
    assert_eq!(entity.known_attributes(), vec!["id", "code", "name", "population"]);
    assert_eq!(entity.primary_key(), Some("id"));
    assert_eq!(entity.sequence(), Some("countries_id_seq"));
}

#[test]
fn test_describe_ignores_attached_databases() {
    let db = countries_store();
    db.execute_batch(
        "ATTACH ':memory:' AS other;
         CREATE TABLE other.main.countries (id INTEGER PRIMARY KEY, code VARCHAR, extra VARCHAR);",
    )
    .unwrap();
    let entity = db.describe(&TableName::new("countries")).unwrap();
    assert_eq!(entity.known_attributes(), vec!["id", "code", "name", "population"]);
}
