//! Unit tests for Value

use core_types::{ErrorKind, Value};

#[test]
fn test_display_primitives() {
    assert_eq!(Value::Undefined.to_string(), "undefined");
    assert_eq!(Value::Null.to_string(), "null");
    assert_eq!(Value::Boolean(false).to_string(), "false");
    assert_eq!(Value::Smi(-7).to_string(), "-7");
    assert_eq!(Value::string("hi").to_string(), "hi");
}

#[test]
fn test_display_doubles() {
    assert_eq!(Value::Double(12.5).to_string(), "12.5");
    assert_eq!(Value::Double(30.0).to_string(), "30");
    assert_eq!(Value::Double(f64::NAN).to_string(), "NaN");
    assert_eq!(Value::Double(f64::INFINITY).to_string(), "Infinity");
    assert_eq!(Value::Double(f64::NEG_INFINITY).to_string(), "-Infinity");
}

#[test]
fn test_display_object() {
    let obj = Value::object([("arr", Value::array(Vec::<Value>::new()))]);
    assert_eq!(obj.to_string(), "[object Object]");
}

#[test]
fn test_nested_property_chain() {
    let obj = Value::object([(
        "arr",
        Value::object([("4", Value::string("string"))]),
    )]);
    let length = obj.get("arr").and_then(|a| a.get("4")).and_then(|v| v.get("length"));
    assert_eq!(length.unwrap(), Value::Smi(6));
}

#[test]
fn test_missing_index_then_length_fails() {
    let obj = Value::object([(
        "arr",
        Value::array([Value::Smi(1), Value::Smi(2), Value::Smi(3), Value::Smi(4)]),
    )]);
    let err = obj
        .get("arr")
        .and_then(|a| a.get("4"))
        .and_then(|v| v.get("length"))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert_eq!(err.message, "Cannot read property 'length' of undefined");
}

#[test]
fn test_as_number() {
    assert_eq!(Value::Smi(3).as_number(), Some(3.0));
    assert_eq!(Value::Double(2.5).as_number(), Some(2.5));
    assert_eq!(Value::string("3").as_number(), None);
    assert_eq!(Value::Null.as_number(), None);
}
