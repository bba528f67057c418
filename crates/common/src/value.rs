//! Runtime value representation for the Branchline VM.
//!
//! Values are what live on the stack, in the variable store, and inside
//! instruction operands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_kind::ValueKind;

/// A flat tagged value.
///
/// Two values are equal iff both tag and payload are equal. There is no
/// coercion between tags: `Number(1)` never equals `Bool(true)` and
/// `Str("x")` never equals `Symbol("x")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Number(i64),
    /// UTF-8 text.
    #[serde(rename = "string")]
    Str(String),
    /// The absence of a value. Unset variables read as `Null`.
    Null,
    /// An identifier. Not a player-facing value.
    Symbol(String),
}

impl Value {
    /// Returns the kind (tag) of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::Str(_) => ValueKind::String,
            Value::Null => ValueKind::Null,
            Value::Symbol(_) => ValueKind::Symbol,
        }
    }

    /// Convenience constructor for a string value.
    pub fn str(text: impl Into<String>) -> Self {
        Value::Str(text.into())
    }

    /// Convenience constructor for a symbol value.
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    /// Borrow the payload of a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the payload of a `Symbol` value.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// The payload of a `Number` value.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The payload of a `Bool` value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Renders the text a value contributes to a concatenation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Null => f.write_str("null"),
            Value::Symbol(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Value::Bool(true).kind(), ValueKind::Bool);
        assert_eq!(Value::Number(42).kind(), ValueKind::Number);
        assert_eq!(Value::str("hi").kind(), ValueKind::String);
        assert_eq!(Value::Null.kind(), ValueKind::Null);
        assert_eq!(Value::symbol("gold").kind(), ValueKind::Symbol);
    }

    #[test]
    fn equality_is_tag_and_payload() {
        assert_eq!(Value::Number(42), Value::Number(42));
        assert_ne!(Value::Number(42), Value::Number(43));
        assert_ne!(Value::Number(1), Value::Bool(true));
        assert_ne!(Value::str("x"), Value::symbol("x"));
        assert_ne!(Value::str("null"), Value::Null);
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn display_renders_concatenation_text() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Number(-17).to_string(), "-17");
        assert_eq!(Value::str("Hello").to_string(), "Hello");
        assert_eq!(Value::symbol("gold").to_string(), "gold");
    }

    #[test]
    fn accessors_reject_other_tags() {
        assert_eq!(Value::str("a").as_str(), Some("a"));
        assert_eq!(Value::symbol("a").as_str(), None);
        assert_eq!(Value::symbol("a").as_symbol(), Some("a"));
        assert_eq!(Value::Number(3).as_number(), Some(3));
        assert_eq!(Value::Bool(true).as_number(), None);
        assert_eq!(Value::Bool(false).as_bool(), Some(false));
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_string(&vec![
            Value::Bool(true),
            Value::Number(7),
            Value::str("hi"),
            Value::Null,
            Value::symbol("gold"),
        ])
        .unwrap();
        assert_eq!(
            json,
            r#"[{"bool":true},{"number":7},{"string":"hi"},"null",{"symbol":"gold"}]"#
        );
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[2], Value::str("hi"));
    }
}
