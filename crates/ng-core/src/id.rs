use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Integer identifier of a node, unique within one workspace.
///
/// Imported documents carry identifiers as JSON numbers or numeric strings;
/// [`NodeId::coerce`] folds both onto the same integer space.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub i64);

impl NodeId {
    pub const fn new(raw: i64) -> Self {
        NodeId(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// The identifier that follows this one, `None` past `i64::MAX`.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(raw) => Some(NodeId(raw)),
            None => None,
        }
    }

    /// Coerce a JSON value into an identifier.
    ///
    /// Numbers are truncated toward zero. Strings are trimmed and parsed as
    /// decimal numbers; a blank string coerces to `0`. Everything else, and
    /// any non-finite result, yields `None`.
    pub fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(NodeId(i))
                } else {
                    n.as_f64().and_then(Self::from_f64)
                }
            }
            Value::String(s) => Self::coerce_str(s),
            _ => None,
        }
    }

    /// Coerce a string the same way [`NodeId::coerce`] treats JSON strings.
    pub fn coerce_str(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Some(NodeId(0));
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Some(NodeId(i));
        }
        // `f64::from_str` accepts "inf"/"NaN" spellings; they never coerce.
        let first = trimmed.as_bytes()[0];
        if !(first.is_ascii_digit() || matches!(first, b'-' | b'+' | b'.')) {
            return None;
        }
        trimmed.parse::<f64>().ok().and_then(Self::from_f64)
    }

    fn from_f64(v: f64) -> Option<Self> {
        if !v.is_finite() || v.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(NodeId(v.trunc() as i64))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(raw: i64) -> Self {
        NodeId(raw)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        NodeId::coerce(&value)
            .ok_or_else(|| de::Error::custom(format!("not a node identifier: {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_numbers_and_numeric_strings() {
        assert_eq!(NodeId::coerce(&json!(7)), Some(NodeId(7)));
        assert_eq!(NodeId::coerce(&json!(-3)), Some(NodeId(-3)));
        assert_eq!(NodeId::coerce(&json!(4.9)), Some(NodeId(4)));
        assert_eq!(NodeId::coerce(&json!("12")), Some(NodeId(12)));
        assert_eq!(NodeId::coerce(&json!(" 5 ")), Some(NodeId(5)));
        assert_eq!(NodeId::coerce(&json!("1e2")), Some(NodeId(100)));
        assert_eq!(NodeId::coerce(&json!("")), Some(NodeId(0)));
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert_eq!(NodeId::coerce(&json!("abc")), None);
        assert_eq!(NodeId::coerce(&json!("NaN")), None);
        assert_eq!(NodeId::coerce(&json!("inf")), None);
        assert_eq!(NodeId::coerce(&json!(null)), None);
        assert_eq!(NodeId::coerce(&json!(true)), None);
        assert_eq!(NodeId::coerce(&json!({"id": 1})), None);
    }

    #[test]
    fn distinct_strings_can_collapse() {
        // Known ambiguity: both spellings land on the same integer.
        assert_eq!(NodeId::coerce(&json!("01")), NodeId::coerce(&json!("1")));
    }

    #[test]
    fn next_stops_at_the_top_of_the_range() {
        assert_eq!(NodeId(41).next(), Some(NodeId(42)));
        assert_eq!(NodeId(-1).next(), Some(NodeId(0)));
        assert_eq!(NodeId(i64::MAX).next(), None);
    }

    #[test]
    fn serde_accepts_strings_and_emits_numbers() {
        let id: NodeId = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(id, NodeId(42));
        assert_eq!(serde_json::to_value(id).unwrap(), json!(42));
        assert!(serde_json::from_value::<NodeId>(json!("x")).is_err());
    }
}
