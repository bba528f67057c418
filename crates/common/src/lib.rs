//! Branchline common types and program encoding.
//!
//! This crate provides the data structures shared by the compiler and the
//! virtual machine:
//!
//! - [`Value`]: the five-tag runtime value
//! - [`ValueKind`]: value tags, used by host function prototypes
//! - [`Opcode`]: the closed instruction set, with arity and stack tables
//! - [`Instruction`]: an opcode plus at most one operand
//! - [`Program`]: start offset, code and host function table, with a
//!   binary encoding and a blake3 fingerprint
//! - [`DecodeError`], [`EncodeError`]: errors from decoding and encoding
//!   program images

pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod value;
pub mod value_kind;

mod codec;

// Re-export commonly used types at the crate root.
pub use error::{DecodeError, EncodeError};
pub use instruction::Instruction;
pub use opcode::{Arity, Opcode};
pub use program::Program;
pub use value::Value;
pub use value_kind::ValueKind;
