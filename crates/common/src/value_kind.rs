//! Value kinds: the tag half of a [`Value`](crate::Value).
//!
//! Kinds describe host-function prototypes and tag the operand bytes of the
//! binary program encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Identifies the tag of a value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// `true` or `false`.
    Bool = 0x01,
    /// Signed 64-bit integer.
    Number = 0x02,
    /// UTF-8 text.
    String = 0x03,
    /// The absence of a value.
    Null = 0x04,
    /// An identifier naming a variable, node or function.
    Symbol = 0x05,
}

/// All value kinds, in definition order.
pub const ALL_VALUE_KINDS: [ValueKind; 5] = [
    ValueKind::Bool,
    ValueKind::Number,
    ValueKind::String,
    ValueKind::Null,
    ValueKind::Symbol,
];

impl TryFrom<u8> for ValueKind {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(ValueKind::Bool),
            0x02 => Ok(ValueKind::Number),
            0x03 => Ok(ValueKind::String),
            0x04 => Ok(ValueKind::Null),
            0x05 => Ok(ValueKind::Symbol),
            _ => Err(DecodeError::ReservedValueKind(value)),
        }
    }
}

impl ValueKind {
    /// Returns the lowercase name used in listings and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Null => "null",
            ValueKind::Symbol => "symbol",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
