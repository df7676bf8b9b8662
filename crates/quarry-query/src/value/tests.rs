use super::*;
use rstest::rstest;

#[rstest]
#[case(Value::Null, "NULL")]
#[case(Value::Bool(true), "TRUE")]
#[case(Value::Int(7), "7")]
#[case(Value::BigInt(-3), "-3")]
#[case(Value::String("o'neil".to_string()), "'o''neil'")]
#[case(Value::Bytes(vec![0xAB, 0x01]), "X'AB01'")]
fn test_sql_literal(#[case] value: Value, #[case] expected: &str) {
	assert_eq!(value.to_sql_literal(), expected);
	assert_eq!(value.to_string(), expected);
}

#[rstest]
fn test_numeric_compare_across_variants() {
	assert_eq!(Value::Int(3).compare(&Value::BigInt(3)), Some(Ordering::Equal));
	assert_eq!(Value::Int(2).compare(&Value::Double(2.5)), Some(Ordering::Less));
	assert_eq!(Value::BigInt(10).compare(&Value::Int(9)), Some(Ordering::Greater));
}

#[rstest]
fn test_null_and_mismatched_kinds_are_incomparable() {
	assert_eq!(Value::Null.compare(&Value::Int(1)), None);
	assert_eq!(Value::Int(1).compare(&Value::Null), None);
	assert_eq!(Value::from("1").compare(&Value::Int(1)), None);
}

#[rstest]
fn test_option_conversion() {
	assert_eq!(Value::from(Some(5i64)), Value::BigInt(5));
	assert_eq!(Value::from(None::<String>), Value::Null);
}

#[rstest]
fn test_to_json() {
	assert_eq!(Value::Int(5).to_json(), serde_json::json!(5));
	assert_eq!(Value::from("x").to_json(), serde_json::json!("x"));
	assert_eq!(Value::Double(f64::NAN).to_json(), serde_json::Value::Null);
}

#[rstest]
fn test_from_json() {
	assert_eq!(Value::from_json(&serde_json::json!(7)), Value::BigInt(7));
	assert_eq!(Value::from_json(&serde_json::json!(1.5)), Value::Double(1.5));
	assert_eq!(Value::from_json(&serde_json::json!(null)), Value::Null);
	assert_eq!(Value::from_json(&serde_json::json!("a")), Value::from("a"));
	assert_eq!(Value::from_json(&serde_json::json!([1])), Value::from("[1]"));
}
