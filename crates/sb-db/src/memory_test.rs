use super::*;
use sb_core::{Column, DesiredRow};

fn store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .create_table(
            EntityType::new(
                TableName::new("countries"),
                vec![
                    Column::new("id", "INTEGER").not_null(),
                    Column::new("code", "VARCHAR").not_null(),
                    Column::new("name", "VARCHAR"),
                ],
            )
            .with_primary_key("id"),
        )
        .unwrap();
    store.add_unique_key("countries", &["code"]).unwrap();
    store
}

fn row(pairs: &[(&str, Value)]) -> DesiredRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn countries(store: &MemoryStore) -> Arc<EntityType> {
    Arc::new(store.describe(&TableName::new("countries")).unwrap())
}

#[test]
fn test_memory_store_has_no_sequences() {
    let store = store();
    assert_eq!(store.store_type(), "memory");
    assert!(store.sequence_support().is_none());
}

#[test]
fn test_describe_unknown_table() {
    let store = store();
    assert!(matches!(
        store.describe(&TableName::new("regions")).unwrap_err(),
        DbError::TableNotFound(_)
    ));
}

#[test]
fn test_insert_and_find() {
    let store = store();
    let entity = countries(&store);
    let mut record = store.new_record(&entity);
    store
        .assign(&mut record, &row(&[("id", Value::Int(1)), ("code", "US".into())]))
        .unwrap();
    store.persist(&mut record, false).unwrap();

    assert_eq!(record.get("name"), Some(&Value::Null));
    let found = store
        .find_one(&entity, &[("code".to_string(), Value::from("US"))])
        .unwrap()
        .unwrap();
    assert_eq!(found.get("id"), Some(&Value::Int(1)));
    assert_eq!(found.row_id(), record.row_id());
}

#[test]
fn test_find_first_of_duplicates() {
    let store = store();
    store
        .insert_row("countries", row(&[("id", Value::Int(1)), ("code", "A".into()), ("name", "dup".into())]))
        .unwrap();
    store
        .insert_row("countries", row(&[("id", Value::Int(2)), ("code", "B".into()), ("name", "dup".into())]))
        .unwrap();
    let entity = countries(&store);
    let found = store
        .find_one(&entity, &[("name".to_string(), Value::from("dup"))])
        .unwrap()
        .unwrap();
    assert_eq!(found.get("code"), Some(&Value::from("A")));
}

#[test]
fn test_unique_key_violation() {
    let store = store();
    store
        .insert_row("countries", row(&[("id", Value::Int(1)), ("code", "US".into())]))
        .unwrap();
    let err = store
        .insert_row("countries", row(&[("id", Value::Int(2)), ("code", "US".into())]))
        .unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(_)));
    assert!(err.to_string().contains("(code) = (\"US\")"));
}

#[test]
fn test_not_null_violation() {
    let store = store();
    let err = store
        .insert_row("countries", row(&[("code", "US".into())]))
        .unwrap_err();
    assert!(err.to_string().contains("countries.id"));
}

#[test]
fn test_update_in_place() {
    let store = store();
    store
        .insert_row("countries", row(&[("id", Value::Int(1)), ("code", "US".into())]))
        .unwrap();
    let entity = countries(&store);
    let mut found = store
        .find_one(&entity, &[("code".to_string(), Value::from("US"))])
        .unwrap()
        .unwrap();
    store
        .assign(&mut found, &row(&[("name", "United States".into())]))
        .unwrap();
    store.persist(&mut found, false).unwrap();

    let rows = store.rows("countries").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::from("United States")));
}

#[test]
fn test_transaction_restores_snapshot() {
    let store = store();
    let entity = countries(&store);
    let result: Result<(), DbError> = store.transaction(&entity, |s| {
        s.insert_row("countries", row(&[("id", Value::Int(1)), ("code", "US".into())]))?;
        s.insert_row("countries", row(&[("id", Value::Int(1)), ("code", "CA".into())]))?;
        Ok(())
    });
    assert!(result.is_err());
    assert_eq!(store.row_count("countries").unwrap(), 0);
}

#[test]
fn test_nested_transaction_rejected() {
    let store = store();
    let entity = countries(&store);
    let result: Result<(), DbError> =
        store.transaction(&entity, |s| s.transaction(&entity, |_| Ok(())));
    assert!(matches!(result.unwrap_err(), DbError::TransactionError(_)));
}
