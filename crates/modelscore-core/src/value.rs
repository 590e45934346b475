use serde::{Deserialize, Serialize};

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Missing cell. A float `NaN` is not null here; numeric readers treat it
    /// as missing through [`Value::as_f64`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell. `Null`, text and `NaN` yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) if !value.is_nan() => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Missing cell or a non-finite float: a metric value that carries no
    /// usable number.
    pub fn is_undefined(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(value) => !value.is_finite(),
            _ => false,
        }
    }

    /// Text rendering used for CSV output and label comparison.
    /// `Null` renders as an empty string.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(value) => value.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Text(value) => value.clone(),
        }
    }

    /// Stable identity string used to compare cells as grouping keys.
    /// Integral floats share the key of the equal integer and `-0.0` the key
    /// of `0`; every `NaN` shares one key.
    pub(crate) fn key(&self) -> String {
        let raw = match self {
            Value::Null => "n:".to_string(),
            Value::Bool(value) => format!("b:{value}"),
            Value::Int(value) => format!("i:{value}"),
            Value::Float(value) => float_key(*value),
            Value::Text(value) => format!("t:{value}"),
        };
        raw.replace('\\', "\\\\").replace('|', "\\|")
    }
}

fn float_key(value: f64) -> String {
    if value.is_nan() {
        return "f:nan".to_string();
    }
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        return format!("i:{}", value as i64);
    }
    format!("f:{}", value.to_bits())
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_not_numeric() {
        assert_eq!(Value::Float(f64::NAN).as_f64(), None);
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert!(!Value::Float(f64::NAN).is_null());
    }

    #[test]
    fn undefined_covers_null_and_non_finite() {
        assert!(Value::Null.is_undefined());
        assert!(Value::Float(f64::NAN).is_undefined());
        assert!(Value::Float(f64::NEG_INFINITY).is_undefined());
        assert!(!Value::Float(0.0).is_undefined());
        assert!(!Value::Int(0).is_undefined());
    }

    #[test]
    fn numeric_keys_are_normalized() {
        assert_eq!(Value::Int(1).key(), Value::Float(1.0).key());
        assert_eq!(Value::Float(0.0).key(), Value::Float(-0.0).key());
        assert_eq!(Value::Int(0).key(), Value::Float(-0.0).key());
        assert_eq!(Value::Float(f64::NAN).key(), Value::Float(-f64::NAN).key());
        assert_ne!(Value::Float(1.5).key(), Value::Int(1).key());
        assert_ne!(Value::Float(1e300).key(), Value::Int(i64::MAX).key());
    }

    #[test]
    fn keys_distinguish_types() {
        assert_ne!(Value::Int(1).key(), Value::Text("1".to_string()).key());
        assert_ne!(Value::Text("a|b".into()).key(), Value::Text("a\\|b".into()).key());
    }
}
