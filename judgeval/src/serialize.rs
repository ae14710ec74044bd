//! Deterministic string encoding of arbitrary values for attribute storage
//! (spec.md §4.A).
//!
//! Scalars round-trip as their native [`crate::attributes::Value`] variant —
//! the round-trip law in spec.md §8 requires `setAttribute(k, v)` to export
//! `v` unchanged for scalar `v`, so scalars never go through the string
//! serializer at all (see `Tracer::set_attribute` in `judgeval-sdk`).
//! Everything else — structs, maps, vecs of non-scalars — is encoded with
//! `serde_json::to_string`, matching the teacher's pattern of falling back to
//! a debug/string rendering for values that don't fit a native `Value` arm.
use serde::Serialize;
use thiserror::Error;

/// Raised when a user-supplied value cannot be serialized. Per spec.md §7
/// this is treated as a user-body error for the enclosing span, not an
/// internal SDK failure.
#[derive(Debug, Error)]
#[error("failed to serialize value: {0}")]
pub struct SerializeError(#[from] serde_json::Error);

/// Serializes any `Serialize` value to its deterministic string form.
pub fn serialize<T: Serialize>(value: &T) -> Result<String, SerializeError> {
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn struct_is_deterministic() {
        let p = Point { x: 1, y: 2 };
        assert_eq!(serialize(&p).unwrap(), r#"{"x":1,"y":2}"#);
    }

    #[test]
    fn vec_of_strings() {
        let v = vec!["a", "b"];
        assert_eq!(serialize(&v).unwrap(), r#"["a","b"]"#);
    }
}
