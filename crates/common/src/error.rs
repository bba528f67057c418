//! Encode and decode errors for Branchline program images.

use thiserror::Error;

/// Errors that occur while decoding an encoded [`Program`](crate::Program).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The image does not start with the `BRLN` magic.
    #[error("bad magic: not a branchline program")]
    BadMagic,

    /// The image was written by an unknown encoder version.
    #[error("unsupported program version {0}")]
    UnsupportedVersion(u8),

    /// Opcode 0x00 is illegal and always rejected.
    #[error("illegal opcode 0x00")]
    IllegalOpcode,

    /// Opcode byte is not assigned to any instruction.
    #[error("reserved opcode: {0:#04x}")]
    ReservedOpcode(u8),

    /// Operand or parameter tag byte is not assigned to any value kind.
    #[error("reserved value kind: {0:#04x}")]
    ReservedValueKind(u8),

    /// The image ended in the middle of a field.
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),

    /// A string or symbol payload is not valid UTF-8.
    #[error("invalid utf-8 at byte {0}")]
    InvalidUtf8(usize),

    /// Bytes remain after the last instruction.
    #[error("{0} trailing byte(s) after program")]
    TrailingBytes(usize),

    /// The start offset does not index into the code.
    #[error("start offset {start} outside code of length {len}")]
    StartOutOfRange { start: usize, len: usize },
}

/// Errors that occur while encoding a [`Program`](crate::Program) whose
/// contents do not fit the image's fixed-width fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A prototype's parameter count does not fit in a `u8`.
    #[error("function '{function}' declares {count} parameters, at most 255 are encodable")]
    TooManyParams { function: String, count: usize },

    /// A start offset, count or string length does not fit in a `u32`.
    #[error("{field} {value} exceeds the u32 range")]
    Overflow { field: &'static str, value: usize },
}
