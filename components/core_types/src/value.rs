//! JavaScript-like value representation.
//!
//! This module provides the `Value` enum the scenarios pass through promises
//! and print to the console. Objects are immutable string-keyed maps; arrays
//! are objects keyed by index with a `length` property, which is close enough
//! to JavaScript for property-access failures to read the same way.

use crate::{ErrorKind, JsError};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Represents any value a scenario can produce or print.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let number = Value::Smi(42);
/// let float = Value::Double(3.5);
///
/// assert_eq!(number.as_number(), Some(42.0));
/// assert_eq!(float.to_string(), "3.5");
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// JavaScript undefined value
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean(bool),
    /// Small integer
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// JavaScript string value
    String(String),
    /// Plain object with string keys (arrays use index keys)
    Object(Rc<BTreeMap<String, Value>>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Smi(a), Value::Smi(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Smi(a), Value::Double(b)) | (Value::Double(b), Value::Smi(a)) => {
                f64::from(*a) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            // Objects compare by identity, as in JavaScript.
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Creates a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Builds an object from `(key, value)` pairs.
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// let obj = Value::object([("answer", Value::Smi(42))]);
    /// assert_eq!(obj.get("answer").unwrap(), Value::Smi(42));
    /// ```
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(Rc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Builds an array-like object: index keys plus `length`.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let mut map: BTreeMap<String, Value> = items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        let len = i32::try_from(map.len()).unwrap_or(i32::MAX);
        map.insert("length".to_string(), Value::Smi(len));
        Value::Object(Rc::new(map))
    }

    /// Reads a property the way `value[key]` does.
    ///
    /// Missing properties read as `undefined`. Reading any property of
    /// `undefined` or `null` fails with a `TypeError`.
    ///
    /// ```
    /// use core_types::{ErrorKind, Value};
    ///
    /// assert_eq!(Value::string("abc").get("length").unwrap(), Value::Smi(3));
    /// let err = Value::Undefined.get("length").unwrap_err();
    /// assert_eq!(err.kind, ErrorKind::TypeError);
    /// assert_eq!(err.message, "Cannot read property 'length' of undefined");
    /// ```
    pub fn get(&self, key: &str) -> Result<Value, JsError> {
        match self {
            Value::Undefined | Value::Null => Err(JsError::new(
                ErrorKind::TypeError,
                format!("Cannot read property '{}' of {}", key, self),
            )),
            Value::Object(map) => Ok(map.get(key).cloned().unwrap_or(Value::Undefined)),
            Value::String(s) => match key {
                "length" => Ok(Value::Smi(
                    i32::try_from(s.chars().count()).unwrap_or(i32::MAX),
                )),
                _ => Ok(key
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Undefined)),
            },
            _ => Ok(Value::Undefined),
        }
    }

    /// Returns the numeric value if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Smi(n) => Some(f64::from(*n)),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }
}

/// JavaScript `String()` conversion.
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Double(2.0).to_string(), "2");
/// assert_eq!(Value::array([Value::Smi(1)]).to_string(), "[object Object]");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    // Integer-valued doubles display without decimal point
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Object(_) => write!(f, "[object Object]"),
        }
    }
}
