//! Parsing of user-supplied field maps.
//!
//! Field maps come from the command line either as `key=value` pairs or as
//! one JSON object. Input is only ever parsed as data.

use serde_json::Value;

use widecol_common::{StoreError, StoreResult};

use crate::row::FieldMap;

/// Parses one `key=value` pair. The value may be empty and may contain `=`.
pub fn parse_assignment(text: &str) -> StoreResult<(String, String)> {
    let (key, value) = text.split_once('=').ok_or_else(|| {
        StoreError::invalid_input(format!("expected key=value, got '{text}'"))
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(StoreError::invalid_input(format!(
            "missing field name in '{text}'"
        )));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parses a list of `key=value` pairs. A key given twice is rejected.
pub fn parse_assignments<I, S>(items: I) -> StoreResult<FieldMap>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut fields = FieldMap::new();
    for item in items {
        let (key, value) = parse_assignment(item.as_ref())?;
        if fields.contains_key(&key) {
            return Err(StoreError::invalid_input(format!(
                "field '{key}' given more than once"
            )));
        }
        fields.insert(key, value);
    }
    Ok(fields)
}

/// Parses a flat JSON object into a field map.
///
/// Strings are taken as-is; numbers and booleans use their JSON text.
/// `null`, arrays and nested objects are rejected.
pub fn parse_json_object(text: &str) -> StoreResult<FieldMap> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| StoreError::invalid_input(format!("invalid JSON: {e}")))?;
    let Value::Object(object) = value else {
        return Err(StoreError::invalid_input("expected a JSON object"));
    };

    let mut fields = FieldMap::new();
    for (key, value) in object {
        if key.is_empty() {
            return Err(StoreError::invalid_input("field name must not be empty"));
        }
        let value = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => {
                return Err(StoreError::invalid_input(format!(
                    "field '{key}' must be a string, number or boolean"
                )));
            }
        };
        fields.insert(key, value);
    }
    Ok(fields)
}

/// Merges `extra` into `base`, failing on a key present in both.
pub fn merge_fields(mut base: FieldMap, extra: FieldMap) -> StoreResult<FieldMap> {
    for (key, value) in extra {
        if base.contains_key(&key) {
            return Err(StoreError::invalid_input(format!(
                "field '{key}' given more than once"
            )));
        }
        base.insert(key, value);
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use widecol_common::ErrorCode;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("name=Widget").unwrap(),
            ("name".to_string(), "Widget".to_string())
        );
        assert_eq!(
            parse_assignment("formula=a=b").unwrap(),
            ("formula".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_assignment("note=").unwrap().1, "");
        assert_eq!(parse_assignment("info:price=9").unwrap().0, "info:price");

        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_parse_assignments_rejects_duplicates() {
        let fields = parse_assignments(["a=1", "b=2"]).unwrap();
        assert_eq!(fields.len(), 2);

        let err = parse_assignments(["a=1", "a=2"]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn test_parse_json_object() {
        let fields =
            parse_json_object(r#"{"name": "Widget", "price": 12.5, "active": true}"#).unwrap();
        assert_eq!(fields["name"], "Widget");
        assert_eq!(fields["price"], "12.5");
        assert_eq!(fields["active"], "true");
    }

    #[test]
    fn test_parse_json_is_data_only() {
        assert!(parse_json_object("__import__('os')").is_err());
        assert!(parse_json_object("[1, 2]").is_err());
        assert!(parse_json_object(r#"{"a": null}"#).is_err());
        assert!(parse_json_object(r#"{"a": {"b": 1}}"#).is_err());
        assert!(parse_json_object(r#"{"a": [1]}"#).is_err());
    }

    #[test]
    fn test_merge_fields() {
        let base = parse_assignments(["a=1"]).unwrap();
        let merged = merge_fields(base.clone(), parse_json_object(r#"{"b": "2"}"#).unwrap())
            .unwrap();
        assert_eq!(merged.len(), 2);
        assert!(merge_fields(base, parse_json_object(r#"{"a": "2"}"#).unwrap()).is_err());
    }
}
