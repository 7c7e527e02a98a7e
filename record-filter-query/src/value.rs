//! Bind values carried alongside compiled conditions.

use serde::{Deserialize, Serialize};

/// A value bound to a positional placeholder.
///
/// ```rust
/// use record_filter_query::FilterValue;
///
/// let val: FilterValue = 42.into();
/// assert!(matches!(val, FilterValue::Int(42)));
///
/// let val: FilterValue = vec![1, 3, 5].into();
/// assert_eq!(val.as_list().map(|l| l.len()), Some(3));
///
/// let val: FilterValue = None::<i64>.into();
/// assert!(val.is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// JSON value.
    Json(serde_json::Value),
    /// List of values, bound as a single parameter.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this is a list value.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Borrow the elements of a list value.
    pub fn as_list(&self) -> Option<&[FilterValue]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Json(_) => "json",
            Self::List(_) => "list",
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u32> for FilterValue {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<serde_json::Value> for FilterValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_value_from() {
        assert_eq!(FilterValue::from(42i32), FilterValue::Int(42));
        assert_eq!(FilterValue::from("hello"), FilterValue::String("hello".to_string()));
        assert_eq!(FilterValue::from(true), FilterValue::Bool(true));
        assert_eq!(FilterValue::from(None::<&str>), FilterValue::Null);
    }

    #[test]
    fn test_list_is_one_value() {
        let value = FilterValue::from(vec!["a", "b"]);
        assert!(value.is_list());
        assert_eq!(value.kind(), "list");
        assert_eq!(
            value.as_list(),
            Some(&[FilterValue::from("a"), FilterValue::from("b")][..])
        );
    }

    #[test]
    fn test_serializes_untagged() {
        let value = FilterValue::from(vec![FilterValue::Int(1), FilterValue::Null]);
        assert_eq!(serde_json::to_string(&value).unwrap(), "[1,null]");
    }
}
