//! Reusable field filters
//!
//! Filters are custom sanitizers: attach one with
//! `FieldBuilder::with_sanitizer` and `Model::sanitize` runs it instead of
//! the field type's own sanitize step. The result is written back through
//! `Model::set`, so the type cast still applies afterwards.

use crate::core::model::Model;
use serde_json::{Value, json};

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(&Model, Value) -> Value + Send + Sync + Clone {
    |_: &Model, value: Value| match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    }
}

/// Filter: convert string to uppercase
pub fn uppercase() -> impl Fn(&Model, Value) -> Value + Send + Sync + Clone {
    |_: &Model, value: Value| match value {
        Value::String(s) => Value::String(s.to_uppercase()),
        other => other,
    }
}

/// Filter: convert string to lowercase
pub fn lowercase() -> impl Fn(&Model, Value) -> Value + Send + Sync + Clone {
    |_: &Model, value: Value| match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other,
    }
}

/// Filter: round number to specified decimal places
pub fn round_decimals(decimals: u32) -> impl Fn(&Model, Value) -> Value + Send + Sync + Clone {
    move |_: &Model, value: Value| {
        if let Some(num) = value.as_f64() {
            let factor = 10_f64.powi(decimals as i32);
            json!((num * factor).round() / factor)
        } else {
            value
        }
    }
}

/// Filter: drop duplicate entries from a list, keeping first occurrences
pub fn unique() -> impl Fn(&Model, Value) -> Value + Send + Sync + Clone {
    |_: &Model, value: Value| match value {
        Value::Array(items) => {
            let mut seen = Vec::with_capacity(items.len());
            for item in items {
                if !seen.contains(&item) {
                    seen.push(item);
                }
            }
            Value::Array(seen)
        }
        other => other,
    }
}
