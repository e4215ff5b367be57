//! Deterministic cache-key derivation.
//!
//! The key is a UUID v5 over a canonical rendering of
//! {connector type, connector identity, data source, permissions}. Canonical
//! rendering is JSON with recursively sorted object keys and standard
//! escaping, so equal logical content always produces the same bytes across
//! processes and runs. Segments are joined with the `U+001F` unit separator;
//! JSON escapes control characters, so the separator cannot occur inside a
//! segment. Secret fields already serialize to a constant marker and
//! therefore never influence the key.

use quarry_core::Condition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

const SEGMENT_SEPARATOR: char = '\u{1F}';

/// Cache key derivation failure (an input could not be serialized).
#[derive(Debug, Error)]
pub enum CacheKeyError {
    #[error("cannot serialize {what} for cache key: {message}")]
    Serialize { what: &'static str, message: String },
}

/// An opaque deterministic fingerprint of a connector call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Uuid);

impl CacheKey {
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Derive the cache key for a connector call.
///
/// `data_source` and `permissions` are optional: a connector-identity-only
/// key is valid. Absent inputs are rendered as `null`, so "no data source"
/// and "data source present" never collide. Pure function: no I/O, no clock.
pub fn derive_cache_key<C, D>(
    type_tag: &str,
    connector: &C,
    data_source: Option<&D>,
    permissions: Option<&Condition>,
) -> Result<CacheKey, CacheKeyError>
where
    C: Serialize + ?Sized,
    D: Serialize + ?Sized,
{
    let mut buf = String::new();
    write_segment(&mut buf, "connector type", &Value::String(type_tag.to_string()))?;
    buf.push(SEGMENT_SEPARATOR);
    write_segment(&mut buf, "connector", &to_value("connector", connector)?)?;
    buf.push(SEGMENT_SEPARATOR);
    let ds = match data_source {
        Some(ds) => to_value("data source", ds)?,
        None => Value::Null,
    };
    write_segment(&mut buf, "data source", &ds)?;
    buf.push(SEGMENT_SEPARATOR);
    let perms = match permissions {
        Some(p) => to_value("permissions", p)?,
        None => Value::Null,
    };
    write_segment(&mut buf, "permissions", &perms)?;

    Ok(CacheKey(Uuid::new_v5(&Uuid::NAMESPACE_OID, buf.as_bytes())))
}

fn to_value<T: Serialize + ?Sized>(what: &'static str, value: &T) -> Result<Value, CacheKeyError> {
    serde_json::to_value(value).map_err(|e| CacheKeyError::Serialize {
        what,
        message: e.to_string(),
    })
}

/// Append the canonical JSON rendering of `value`: object keys sorted
/// recursively, no whitespace, standard JSON string escaping.
fn write_segment(out: &mut String, what: &'static str, value: &Value) -> Result<(), CacheKeyError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            let escaped = serde_json::to_string(s).map_err(|e| CacheKeyError::Serialize {
                what,
                message: e.to_string(),
            })?;
            out.push_str(&escaped);
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_segment(out, what, item)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let escaped = serde_json::to_string(key).map_err(|e| CacheKeyError::Serialize {
                    what,
                    message: e.to_string(),
                })?;
                out.push_str(&escaped);
                out.push(':');
                write_segment(out, what, &map[key])?;
            }
            out.push('}');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_rendering_sorts_keys_recursively() {
        let mut out = String::new();
        let value = json!({"b": {"z": 1, "a": [true, null]}, "a": "x"});
        write_segment(&mut out, "test", &value).unwrap();
        assert_eq!(out, r#"{"a":"x","b":{"a":[true,null],"z":1}}"#);
    }

    #[test]
    fn test_canonical_rendering_escapes_control_characters() {
        let mut out = String::new();
        write_segment(&mut out, "test", &json!("a\u{1F}b")).unwrap();
        assert!(!out.contains('\u{1F}'));
        assert_eq!(out, r#""a\u001fb""#);
    }

    #[test]
    fn test_derives_through_unsized_inputs() {
        // The facade hands `self` over behind a reference, so unsized
        // serializable inputs must be accepted.
        let k1 = derive_cache_key::<str, str>("sql", "conn", Some("ds"), None).unwrap();
        let k2 = derive_cache_key::<str, str>("sql", "conn", Some("ds"), None).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_key_is_deterministic() {
        let connector = json!({"name": "a", "host": "db.local"});
        let ds = json!({"domain": "d", "name": "q", "query": "select 1"});
        let k1 = derive_cache_key("sql", &connector, Some(&ds), None).unwrap();
        let k2 = derive_cache_key("sql", &connector, Some(&ds), None).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_key_insensitive_to_field_order() {
        let a = json!({"name": "a", "host": "db.local"});
        let b = json!({"host": "db.local", "name": "a"});
        let k1 = derive_cache_key::<_, Value>("sql", &a, None, None).unwrap();
        let k2 = derive_cache_key::<_, Value>("sql", &b, None, None).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_key_changes_with_type_tag() {
        let connector = json!({"name": "a"});
        let k1 = derive_cache_key::<_, Value>("sql", &connector, None, None).unwrap();
        let k2 = derive_cache_key::<_, Value>("http", &connector, None, None).unwrap();
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_absent_data_source_differs_from_present() {
        let connector = json!({"name": "a"});
        let ds = json!({"domain": "d", "name": "q"});
        let with = derive_cache_key("sql", &connector, Some(&ds), None).unwrap();
        let without = derive_cache_key::<_, Value>("sql", &connector, None, None).unwrap();
        assert_ne!(with, without);
    }
}
