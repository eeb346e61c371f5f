//! Reusable field validators
//!
//! Attach them with `FieldBuilder::with_validation`. A model only runs a
//! field's validators when the field is optional and its value is non-empty,
//! so none of these need to handle the empty case. Values of a shape a
//! validator does not understand pass through; another validator owns them.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use uuid::Uuid;

/// Validator: number must be positive
pub fn positive() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num <= 0.0 => Err(format!("'{}' must be positive (got {})", field, num)),
        _ => Ok(()),
    }
}

/// Validator: string length must be within range
pub fn string_length(
    min: usize,
    max: usize,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        let Some(s) = value.as_str() else {
            return Ok(());
        };
        let len = s.chars().count();
        if len < min {
            Err(format!(
                "'{}' must be at least {} characters (got {})",
                field, min, len
            ))
        } else if len > max {
            Err(format!(
                "'{}' must not exceed {} characters (got {})",
                field, max, len
            ))
        } else {
            Ok(())
        }
    }
}

/// Validator: number must not be below minimum
pub fn min_value(min: f64) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num < min => Err(format!(
            "'{}' must be at least {} (got {})",
            field, min, num
        )),
        _ => Ok(()),
    }
}

/// Validator: number must not exceed maximum
pub fn max_value(max: f64) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num > max => Err(format!(
            "'{}' must not exceed {} (got {})",
            field, max, num
        )),
        _ => Ok(()),
    }
}

/// Validator: value must be in allowed list
pub fn in_list(
    allowed: Vec<String>,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        let candidate = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return Ok(()),
        };
        if allowed.contains(&candidate) {
            Ok(())
        } else {
            Err(format!(
                "'{}' must be one of {:?} (got {})",
                field, allowed, candidate
            ))
        }
    }
}

/// Validator: date must match format
pub fn date_format(
    format: &'static str,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        let Some(s) = value.as_str() else {
            return Ok(());
        };
        chrono::NaiveDate::parse_from_str(s, format)
            .map(|_| ())
            .map_err(|_| format!("'{}' must use the format {} (got {})", field, format, s))
    }
}

/// Validator: string must look like an email address
pub fn email() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = EMAIL_REGEX.get_or_init(|| {
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
                .expect("email pattern is valid")
        });
        check_pattern(field, value, regex, "an email address")
    }
}

/// Validator: string must be an http(s) URL
pub fn url() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        static URL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = URL_REGEX.get_or_init(|| {
            Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("url pattern is valid")
        });
        check_pattern(field, value, regex, "a URL")
    }
}

/// Validator: string must parse as a UUID
pub fn uuid() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value.as_str() {
        Some(s) if Uuid::parse_str(s).is_err() => {
            Err(format!("'{}' must be a UUID (got {})", field, s))
        }
        _ => Ok(()),
    }
}

/// Validator: string must match a custom pattern
pub fn matches(pattern: Regex) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        check_pattern(field, value, &pattern, &format!("matching {}", pattern.as_str()))
    }
}

fn check_pattern(field: &str, value: &Value, regex: &Regex, what: &str) -> Result<(), String> {
    match value.as_str() {
        Some(s) if !regex.is_match(s) => {
            Err(format!("'{}' must be {} (got {})", field, what, s))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === positive() ===

    #[test]
    fn test_positive_negative_number_returns_error() {
        let v = positive();
        let result = v("price", &json!(-5.0));
        assert!(result.unwrap_err().contains("positive"));
    }

    #[test]
    fn test_positive_zero_returns_error() {
        assert!(positive()("price", &json!(0.0)).is_err());
    }

    #[test]
    fn test_positive_non_number_passthrough() {
        assert!(positive()("name", &json!("hello")).is_ok());
    }

    // === string_length() ===

    #[test]
    fn test_string_length_bounds() {
        let v = string_length(3, 5);
        assert!(v("name", &json!("ab")).unwrap_err().contains("at least 3"));
        assert!(v("name", &json!("abcdef")).unwrap_err().contains("exceed 5"));
        assert!(v("name", &json!("abc")).is_ok());
        assert!(v("name", &json!("abcde")).is_ok());
    }

    #[test]
    fn test_string_length_counts_characters() {
        assert!(string_length(1, 3)("name", &json!("éèà")).is_ok());
    }

    // === min_value() / max_value() ===

    #[test]
    fn test_min_max_value() {
        assert!(min_value(1.0)("count", &json!(0.5)).is_err());
        assert!(min_value(1.0)("count", &json!(1)).is_ok());
        assert!(max_value(100.0)("score", &json!(101.0)).is_err());
        assert!(max_value(100.0)("score", &json!(100.0)).is_ok());
        assert!(max_value(100.0)("name", &json!("hello")).is_ok());
    }

    // === in_list() ===

    #[test]
    fn test_in_list() {
        let v = in_list(vec!["draft".into(), "publish".into()]);
        assert!(v("status", &json!("draft")).is_ok());
        assert!(v("status", &json!("trash")).unwrap_err().contains("one of"));
        assert!(v("status", &json!(true)).is_ok());
    }

    #[test]
    fn test_in_list_matches_numbers_by_text() {
        let v = in_list(vec!["10".into(), "20".into()]);
        assert!(v("per_page", &json!(10)).is_ok());
        assert!(v("per_page", &json!(15)).is_err());
    }

    // === date_format() ===

    #[test]
    fn test_date_format() {
        let v = date_format("%Y-%m-%d");
        assert!(v("released", &json!("2024-01-15")).is_ok());
        assert!(v("released", &json!("15/01/2024")).unwrap_err().contains("format"));
        assert!(v("released", &json!(12345)).is_ok());
    }

    // === formats ===

    #[test]
    fn test_email() {
        let v = email();
        assert!(v("email", &json!("test@example.com")).is_ok());
        assert!(v("email", &json!("user.name+tag@example.co.uk")).is_ok());
        assert!(v("email", &json!("invalid-email")).is_err());
        assert!(v("email", &json!("@example.com")).is_err());
    }

    #[test]
    fn test_url() {
        let v = url();
        assert!(v("link", &json!("https://example.com")).is_ok());
        assert!(v("link", &json!("http://test.com/path?query=1")).is_ok());
        assert!(v("link", &json!("not a url")).is_err());
    }

    #[test]
    fn test_uuid() {
        let v = uuid();
        assert!(v("ref", &json!(Uuid::new_v4().to_string())).is_ok());
        assert!(v("ref", &json!("not-a-uuid")).is_err());
    }

    #[test]
    fn test_custom_pattern() {
        let v = matches(Regex::new(r"^[A-Z]{3}\d{3}$").unwrap());
        assert!(v("code", &json!("ABC123")).is_ok());
        assert!(v("code", &json!("abc123")).is_err());
    }
}
