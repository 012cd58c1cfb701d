//! Environment placeholder resolution
//!
//! Manifest field values of the form `${NAME}` are indirections through the
//! process environment; anything else passes through unchanged, so literal
//! values in the manifest are respected as-is. Resolved values get a light
//! type coercion (`"true"`/`"false"` to booleans, numeric strings to
//! numbers) so credential fields land in the platform with the types its
//! editor would have produced.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\$\{([^}]+)\}$").unwrap());

/// Outcome of resolving a single manifest field value
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// A usable value: either a literal passed through or a coerced
    /// environment lookup
    Value(Value),
    /// The value was a placeholder whose environment variable is unset or
    /// empty; carries the variable name for reporting
    Missing(String),
}

/// Resolve a manifest field value against the process environment.
///
/// Non-string values and strings that are not of the `${NAME}` shape pass
/// through unchanged. A placeholder whose variable is absent or empty
/// resolves to [`Resolved::Missing`]; callers decide whether that skips the
/// field or the whole record.
pub fn resolve(value: &serde_yaml::Value) -> Resolved {
    let Some(raw) = value.as_str() else {
        return Resolved::Value(serde_json::to_value(value).unwrap_or(Value::Null));
    };
    let Some(captures) = PLACEHOLDER.captures(raw) else {
        return Resolved::Value(Value::String(raw.to_string()));
    };
    let name = captures[1].to_string();
    match std::env::var(&name) {
        Ok(resolved) if !resolved.is_empty() => Resolved::Value(coerce(&resolved)),
        _ => Resolved::Missing(name),
    }
}

/// Coerce a raw environment string to a typed JSON value.
///
/// `"true"`/`"false"` become booleans, anything parseable as a number (and
/// not only whitespace) becomes a number with integers preferred, everything
/// else stays a string.
pub fn coerce(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        if let Ok(int) = trimmed.parse::<i64>() {
            return Value::Number(int.into());
        }
        if let Ok(float) = trimmed.parse::<f64>()
            && let Some(number) = serde_json::Number::from_f64(float)
        {
            return Value::Number(number);
        }
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn yaml(s: &str) -> serde_yaml::Value {
        serde_yaml::Value::String(s.to_string())
    }

    #[test]
    fn test_coerce_booleans() {
        assert_eq!(coerce("true"), Value::Bool(true));
        assert_eq!(coerce("false"), Value::Bool(false));
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(coerce("42"), Value::Number(42.into()));
        assert_eq!(coerce("-7"), Value::Number((-7).into()));
        assert_eq!(coerce("3.5"), serde_json::json!(3.5));
    }

    #[test]
    fn test_coerce_strings() {
        assert_eq!(coerce("hello"), Value::String("hello".to_string()));
        assert_eq!(coerce("   "), Value::String("   ".to_string()));
        assert_eq!(coerce("True"), Value::String("True".to_string()));
        assert_eq!(coerce("1.2.3"), Value::String("1.2.3".to_string()));
    }

    #[test]
    #[serial]
    fn test_resolve_placeholder_set() {
        unsafe {
            std::env::set_var("FLOWSYNC_TEST_BOOL", "true");
            std::env::set_var("FLOWSYNC_TEST_NUM", "42");
            std::env::set_var("FLOWSYNC_TEST_STR", "hello");
        }

        assert_eq!(
            resolve(&yaml("${FLOWSYNC_TEST_BOOL}")),
            Resolved::Value(Value::Bool(true))
        );
        assert_eq!(
            resolve(&yaml("${FLOWSYNC_TEST_NUM}")),
            Resolved::Value(Value::Number(42.into()))
        );
        assert_eq!(
            resolve(&yaml("${FLOWSYNC_TEST_STR}")),
            Resolved::Value(Value::String("hello".to_string()))
        );

        unsafe {
            std::env::remove_var("FLOWSYNC_TEST_BOOL");
            std::env::remove_var("FLOWSYNC_TEST_NUM");
            std::env::remove_var("FLOWSYNC_TEST_STR");
        }
    }

    #[test]
    #[serial]
    fn test_resolve_placeholder_missing() {
        unsafe {
            std::env::remove_var("FLOWSYNC_TEST_UNSET");
        }
        assert_eq!(
            resolve(&yaml("${FLOWSYNC_TEST_UNSET}")),
            Resolved::Missing("FLOWSYNC_TEST_UNSET".to_string())
        );
    }

    #[test]
    #[serial]
    fn test_resolve_placeholder_empty_is_missing() {
        unsafe {
            std::env::set_var("FLOWSYNC_TEST_EMPTY", "");
        }
        assert_eq!(
            resolve(&yaml("${FLOWSYNC_TEST_EMPTY}")),
            Resolved::Missing("FLOWSYNC_TEST_EMPTY".to_string())
        );
        unsafe {
            std::env::remove_var("FLOWSYNC_TEST_EMPTY");
        }
    }

    #[test]
    fn test_resolve_literal_passthrough() {
        assert_eq!(
            resolve(&yaml("just-a-literal")),
            Resolved::Value(Value::String("just-a-literal".to_string()))
        );
        // interior placeholders are not indirections
        assert_eq!(
            resolve(&yaml("prefix-${NOT_A_PLACEHOLDER}")),
            Resolved::Value(Value::String("prefix-${NOT_A_PLACEHOLDER}".to_string()))
        );
    }

    #[test]
    fn test_resolve_non_string_passthrough() {
        assert_eq!(
            resolve(&serde_yaml::Value::Number(5432.into())),
            Resolved::Value(serde_json::json!(5432))
        );
        assert_eq!(
            resolve(&serde_yaml::Value::Bool(true)),
            Resolved::Value(Value::Bool(true))
        );
    }
}
