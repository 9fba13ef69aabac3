use super::*;

#[test]
fn test_deserialize_yaml_scalars() {
    let values: Vec<Value> = serde_yaml::from_str("[~, true, 5, 1.5, US]").unwrap();
    assert_eq!(
        values,
        vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(5),
            Value::Float(1.5),
            Value::Text("US".to_string()),
        ]
    );
}

#[test]
fn test_deserialize_json_null() {
    let value: Value = serde_json::from_str("null").unwrap();
    assert!(value.is_null());
}

#[test]
fn test_as_i64() {
    assert_eq!(Value::Int(12).as_i64(), Some(12));
    assert_eq!(Value::Float(3.0).as_i64(), Some(3));
    assert_eq!(Value::Float(3.5).as_i64(), None);
    assert_eq!(Value::from(" 42 ").as_i64(), Some(42));
    assert_eq!(Value::from("abc").as_i64(), None);
    assert_eq!(Value::Null.as_i64(), None);
}

#[test]
fn test_matches_numeric_and_null() {
    assert!(Value::Int(5).matches(&Value::Float(5.0)));
    assert!(Value::Null.matches(&Value::Null));
    assert!(!Value::Int(5).matches(&Value::from("5")));
    assert!(!Value::Null.matches(&Value::Int(0)));
}

#[test]
fn test_display_quotes_text() {
    assert_eq!(Value::from("United States").to_string(), "\"United States\"");
    assert_eq!(Value::Int(7).to_string(), "7");
    assert_eq!(Value::Null.to_string(), "null");
}

#[test]
fn test_from_option() {
    assert_eq!(Value::from(None::<i64>), Value::Null);
    assert_eq!(Value::from(Some("x")), Value::from("x"));
}
