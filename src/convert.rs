//! JSON argument extraction helpers for tool dispatch.

use serde_json::{Map, Value as JsonValue};

use crate::error::{ProxyError, Result};

/// Get a required string argument.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ProxyError::MissingArg(name.to_string()))
}

/// Get an optional string argument.
pub fn get_optional_string(args: &Map<String, JsonValue>, name: &str) -> Option<String> {
    args.get(name).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Get an optional unsigned integer argument.
pub fn get_optional_u64(args: &Map<String, JsonValue>, name: &str) -> Option<u64> {
    args.get(name).and_then(|v| v.as_u64())
}

/// Get an optional boolean argument.
pub fn get_optional_bool(args: &Map<String, JsonValue>, name: &str) -> Option<bool> {
    args.get(name).and_then(|v| v.as_bool())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn string_arg_required() {
        let a = args(json!({"q": "hello"}));
        assert_eq!(get_string_arg(&a, "q").unwrap(), "hello");
        assert!(matches!(
            get_string_arg(&a, "missing"),
            Err(ProxyError::MissingArg(_))
        ));
        // Wrong type counts as missing.
        let a = args(json!({"q": 7}));
        assert!(get_string_arg(&a, "q").is_err());
    }

    #[test]
    fn optional_args_default_to_none() {
        let a = args(json!({"n": 3, "b": true}));
        assert_eq!(get_optional_u64(&a, "n"), Some(3));
        assert_eq!(get_optional_u64(&a, "x"), None);
        assert_eq!(get_optional_bool(&a, "b"), Some(true));
        assert_eq!(get_optional_string(&a, "x"), None);
    }
}
