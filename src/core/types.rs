//! Scalar type descriptors
//!
//! A [`FieldType`] knows three things about the values it describes: what
//! the default looks like, how to coerce arbitrary input into a typed value
//! and how to sanitize an already-typed value. Casting is total: any JSON
//! input yields a value of the right shape, falling back to the default.

use serde_json::{Number, Value};
use std::collections::HashMap;
use std::fmt;

/// The closed set of value types a field can declare
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    /// Floating point, registered as "number"
    Number,
    /// Floating point, registered as "float"
    Float,
    Integer,
    /// Non-negative integer; casting takes the absolute value
    UnsignedInteger,
    Boolean,
    /// Homogeneous list whose items are cast through the inner type
    Array(Box<FieldType>),
    /// Untyped passthrough
    Any,
}

impl FieldType {
    /// Shorthand for `Array(Box::new(item))`
    pub fn array_of(item: FieldType) -> Self {
        FieldType::Array(Box::new(item))
    }

    /// The registry name of this type
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Float => "float",
            FieldType::Integer => "integer",
            FieldType::UnsignedInteger => "uint",
            FieldType::Boolean => "boolean",
            FieldType::Array(_) => "array",
            FieldType::Any => "any",
        }
    }

    /// Value a field of this type holds when nothing was provided
    pub fn default_value(&self) -> Value {
        match self {
            FieldType::String => Value::String(String::new()),
            FieldType::Number | FieldType::Float => float_value(0.0),
            FieldType::Integer | FieldType::UnsignedInteger => Value::from(0),
            FieldType::Boolean => Value::Bool(false),
            FieldType::Array(_) => Value::Array(Vec::new()),
            FieldType::Any => Value::Null,
        }
    }

    /// Coerce any input into this type, falling back to the default
    pub fn cast(&self, value: &Value) -> Value {
        match self {
            FieldType::String => match value {
                Value::String(s) => Value::String(s.clone()),
                Value::Number(n) => Value::String(n.to_string()),
                Value::Bool(true) => Value::String("1".to_string()),
                _ => self.default_value(),
            },
            FieldType::Number | FieldType::Float => match as_f64(value) {
                Some(f) => float_value(f),
                None => self.default_value(),
            },
            FieldType::Integer => match as_i64(value) {
                Some(i) => Value::from(i),
                None => self.default_value(),
            },
            FieldType::UnsignedInteger => match as_i64(value) {
                Some(i) => Value::from(i.unsigned_abs()),
                None => self.default_value(),
            },
            FieldType::Boolean => Value::Bool(as_bool(value)),
            FieldType::Array(item) => match value {
                Value::Null => self.default_value(),
                Value::Array(items) => Value::Array(cast_items(item, items.iter())),
                Value::Object(map) => Value::Array(cast_items(item, map.values())),
                Value::String(s) if s.is_empty() => self.default_value(),
                scalar => Value::Array(vec![item.cast(scalar)]),
            },
            FieldType::Any => value.clone(),
        }
    }

    /// Normalize a value to its canonical stored form
    pub fn sanitize(&self, value: &Value) -> Value {
        match self {
            FieldType::String => match self.cast(value) {
                Value::String(s) => Value::String(s.trim().to_string()),
                other => other,
            },
            FieldType::Array(item) => match self.cast(value) {
                Value::Array(items) => {
                    Value::Array(items.iter().map(|v| item.sanitize(v)).collect())
                }
                other => other,
            },
            _ => self.cast(value),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Array(item) => write!(f, "array<{}>", item),
            other => f.write_str(other.name()),
        }
    }
}

/// Name → type lookup used when declarations come from metadata
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, FieldType>,
}

impl TypeRegistry {
    /// Create a registry with the built-in types and their aliases
    pub fn new() -> Self {
        let mut types = HashMap::new();
        for (name, field_type) in [
            ("string", FieldType::String),
            ("number", FieldType::Number),
            ("float", FieldType::Float),
            ("integer", FieldType::Integer),
            ("int", FieldType::Integer),
            ("uint", FieldType::UnsignedInteger),
            ("boolean", FieldType::Boolean),
            ("bool", FieldType::Boolean),
            ("array", FieldType::array_of(FieldType::Any)),
            ("any", FieldType::Any),
        ] {
            types.insert(name.to_string(), field_type);
        }
        Self { types }
    }

    /// Look up a type by name
    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.types.get(name).cloned()
    }

    /// Register (or replace) a named type
    pub fn register(&mut self, name: impl Into<String>, field_type: FieldType) {
        self.types.insert(name.into(), field_type);
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Emptiness as the host platform sees it.
///
/// null, false, 0, 0.0, "", "0", [] and {} are empty.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Cast every non-null element through the item type
fn cast_items<'a>(item: &FieldType, values: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    values.filter(|v| !v.is_null()).map(|v| item.cast(v)).collect()
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| as_f64(value).map(|f| f.trunc() as i64))
                .filter(|_| !trimmed.is_empty())
        }
        _ => None,
    }
}

fn as_bool(value: &Value) -> bool {
    match value {
        Value::String(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        other => !is_empty(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALL: [FieldType; 7] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Float,
        FieldType::Integer,
        FieldType::UnsignedInteger,
        FieldType::Boolean,
        FieldType::Any,
    ];

    #[test]
    fn test_cast_is_total() {
        let inputs = [
            json!(null),
            json!("not a number"),
            json!([]),
            json!({}),
            json!(true),
            json!(-3.5),
            json!("42"),
        ];
        for field_type in ALL.iter().cloned().chain([FieldType::array_of(FieldType::Integer)]) {
            for input in &inputs {
                // must never panic and must be stable under a second cast
                let once = field_type.cast(input);
                assert_eq!(field_type.cast(&once), once, "{} / {}", field_type, input);
            }
        }
    }

    #[test]
    fn test_number_falls_back_to_default() {
        let number = FieldType::Number;
        assert_eq!(number.cast(&json!("abc")), json!(0.0));
        assert_eq!(number.cast(&json!(null)), json!(0.0));
        assert_eq!(number.cast(&json!([1, 2])), json!(0.0));
        assert_eq!(number.cast(&json!(" 2.5 ")), json!(2.5));
        assert_eq!(number.cast(&json!(7)), json!(7.0));
    }

    #[test]
    fn test_number_sanitize_matches_cast() {
        let number = FieldType::Number;
        for input in [json!("3.25"), json!("x"), json!(null), json!(10)] {
            assert_eq!(number.sanitize(&input), number.cast(&input));
        }
    }

    #[test]
    fn test_integer_cast() {
        assert_eq!(FieldType::Integer.cast(&json!("12")), json!(12));
        assert_eq!(FieldType::Integer.cast(&json!("12.9")), json!(12));
        assert_eq!(FieldType::Integer.cast(&json!(3.7)), json!(3));
        assert_eq!(FieldType::Integer.cast(&json!("")), json!(0));
        assert_eq!(FieldType::UnsignedInteger.cast(&json!(-9)), json!(9));
    }

    #[test]
    fn test_boolean_cast() {
        let boolean = FieldType::Boolean;
        assert_eq!(boolean.cast(&json!("1")), json!(true));
        assert_eq!(boolean.cast(&json!("0")), json!(false));
        assert_eq!(boolean.cast(&json!("false")), json!(false));
        assert_eq!(boolean.cast(&json!("")), json!(false));
        assert_eq!(boolean.cast(&json!("yes")), json!(true));
        assert_eq!(boolean.cast(&json!(0)), json!(false));
        assert_eq!(boolean.cast(&json!(null)), json!(false));
    }

    #[test]
    fn test_string_cast_and_sanitize() {
        assert_eq!(FieldType::String.cast(&json!(5)), json!("5"));
        assert_eq!(FieldType::String.cast(&json!(null)), json!(""));
        assert_eq!(FieldType::String.cast(&json!(false)), json!(""));
        assert_eq!(FieldType::String.sanitize(&json!("  Mix 1 ")), json!("Mix 1"));
    }

    #[test]
    fn test_array_cast() {
        let songs = FieldType::array_of(FieldType::Integer);
        assert_eq!(songs.cast(&json!([1, "2", "x"])), json!([1, 2, 0]));
        assert_eq!(songs.cast(&json!(null)), json!([]));
        assert_eq!(songs.cast(&json!(4)), json!([4]));
        assert_eq!(songs.cast(&json!([1, null, 3])), json!([1, 3]));
        assert_eq!(songs.default_value(), json!([]));
    }

    #[test]
    fn test_is_empty() {
        for empty in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!("0"), json!([]), json!({})] {
            assert!(is_empty(&empty), "{} should be empty", empty);
        }
        for full in [json!(true), json!(1), json!("a"), json!("false"), json!([0]), json!({"a": 1})] {
            assert!(!is_empty(&full), "{} should not be empty", full);
        }
    }

    #[test]
    fn test_registry_aliases() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.get("int"), Some(FieldType::Integer));
        assert_eq!(registry.get("bool"), Some(FieldType::Boolean));
        assert_eq!(registry.get("uint"), Some(FieldType::UnsignedInteger));
        assert_eq!(registry.get("nope"), None);
    }
}
