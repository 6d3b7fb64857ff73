//! # Event payload.
//!
//! A [`Payload`] is the structured value posted with an event: a JSON object
//! (mapping of string keys to arbitrary values). It is reference-counted, so
//! every handler of a posted event receives the same allocation and the
//! dispatcher never deep-copies it.

use std::ops::Deref;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::DispatchError;

/// Shared, immutable event data.
///
/// ## Example
/// ```rust
/// use eventvisor::Payload;
/// use serde_json::json;
///
/// let p = Payload::try_from(json!({ "dummy_data": "x" })).unwrap();
/// assert_eq!(p.get("dummy_data"), Some(&json!("x")));
///
/// let shared = p.clone();
/// assert!(Payload::ptr_eq(&p, &shared));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload(Arc<Map<String, Value>>);

impl Payload {
    /// Creates an empty payload.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` if both handles point at the same allocation.
    pub fn ptr_eq(a: &Payload, b: &Payload) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Returns the payload as a JSON object value (deep copy).
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.as_ref().clone())
    }
}

impl Deref for Payload {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(Arc::new(map))
    }
}

impl TryFrom<Value> for Payload {
    type Error = DispatchError;

    /// Accepts JSON objects only.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(map.into()),
            other => Err(DispatchError::InvalidPayload {
                reason: format!("expected a JSON object, got {}", kind_of(&other)),
            }),
        }
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_is_rejected() {
        let err = Payload::try_from(json!([1, 2])).unwrap_err();
        assert_eq!(
            err,
            DispatchError::InvalidPayload {
                reason: "expected a JSON object, got array".into()
            }
        );
    }

    #[test]
    fn test_clone_shares_allocation() {
        let p = Payload::try_from(json!({"k": 1})).unwrap();
        let q = p.clone();
        assert!(Payload::ptr_eq(&p, &q));
        assert!(!Payload::ptr_eq(&p, &Payload::try_from(json!({"k": 1})).unwrap()));
        assert_eq!(q.to_value(), json!({"k": 1}));
    }
}
