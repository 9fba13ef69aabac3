use super::*;
use crate::value::Value;

fn countries() -> Arc<EntityType> {
    Arc::new(
        EntityType::new(
            TableName::new("countries"),
            vec![
                Column::new("id", "INTEGER").not_null().with_default(),
                Column::new("code", "VARCHAR").not_null(),
                Column::new("name", "VARCHAR"),
                Column::new("population", "BIGINT"),
            ],
        )
        .with_primary_key("id")
        .with_sequence("countries_id_seq"),
    )
}

fn row(pairs: &[(&str, Value)]) -> DesiredRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_column_kind_from_sql_type() {
    assert_eq!(ColumnKind::from_sql_type("INTEGER"), ColumnKind::Integer);
    assert_eq!(ColumnKind::from_sql_type("decimal(10,2)"), ColumnKind::Float);
    assert_eq!(ColumnKind::from_sql_type("VARCHAR"), ColumnKind::Text);
    assert_eq!(ColumnKind::from_sql_type("BOOLEAN"), ColumnKind::Boolean);
    assert_eq!(ColumnKind::from_sql_type("DATE"), ColumnKind::Other);
}

#[test]
fn test_column_kind_accepts() {
    assert!(ColumnKind::Float.accepts(&Value::Int(1)));
    assert!(!ColumnKind::Integer.accepts(&Value::Float(1.5)));
    assert!(ColumnKind::Integer.accepts(&Value::Null));
    assert!(ColumnKind::Other.accepts(&Value::from("2024-01-01")));
}

#[test]
fn test_known_attributes_in_declaration_order() {
    let entity = countries();
    assert_eq!(
        entity.known_attributes(),
        vec!["id", "code", "name", "population"]
    );
    assert!(entity.has_attribute("code"));
    assert!(!entity.has_attribute("CODE"));
}

#[test]
fn test_resolve_attribute_case_insensitive() {
    let entity = countries();
    assert_eq!(entity.resolve_attribute("Code"), Some("code"));
    assert_eq!(entity.resolve_attribute(" name "), Some("name"));
    assert_eq!(entity.resolve_attribute("capital"), None);
}

#[test]
fn test_normalize_row_rewrites_keys() {
    let entity = countries();
    let normalized = entity
        .normalize_row(&row(&[("CODE", "US".into()), ("Name", "United States".into())]))
        .unwrap();
    assert_eq!(normalized.get("code"), Some(&Value::from("US")));
    assert_eq!(normalized.get("name"), Some(&Value::from("United States")));
}

#[test]
fn test_normalize_row_unknown_attribute() {
    let entity = countries();
    let err = entity
        .normalize_row(&row(&[("capital", "Ottawa".into())]))
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("[E004]"));
    assert!(msg.contains("capital"));
    assert!(msg.contains("id, code, name, population"));
}

#[test]
fn test_normalize_row_duplicate_attribute() {
    let entity = countries();
    let err = entity
        .normalize_row(&row(&[("code", "US".into()), ("CODE", "CA".into())]))
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateAttribute { .. }));
}

#[test]
fn test_validate_accepts_generated_primary_key() {
    let entity = countries();
    let mut record = entity.new_record();
    record.assign(&row(&[("code", "US".into())])).unwrap();
    assert!(entity.validate(&record).is_empty());
}

#[test]
fn test_validate_reports_missing_not_null() {
    let entity = countries();
    let mut record = entity.new_record();
    record.assign(&row(&[("name", "Nowhere".into())])).unwrap();
    let issues = entity.validate(&record);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].attribute, "code");
    assert_eq!(issues[0].to_string(), "code can't be null");
}

#[test]
fn test_validate_reports_type_mismatch() {
    let entity = countries();
    let mut record = entity.new_record();
    record
        .assign(&row(&[
            ("code", "US".into()),
            ("population", "many".into()),
        ]))
        .unwrap();
    let issues = entity.validate(&record);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].attribute, "population");
    assert!(issues[0].message.contains("BIGINT"));
}
