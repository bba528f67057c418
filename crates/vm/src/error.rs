//! Errors for the Branchline VM.
//!
//! [`RuntimeError`] is a fault raised while executing instructions: it moves
//! the VM to [`RunState::Error`] and carries the offending instruction index
//! (`at`). [`VmError`] is what the host-facing operations return; its
//! misuse variants leave the VM untouched.

use branchline_common::{Opcode, ValueKind};
use thiserror::Error;

use crate::machine::RunState;

/// Faults raised by the fetch-execute loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The program counter does not index into the code.
    #[error("program counter {pc} out of bounds (code length {len})")]
    OutOfBounds { pc: usize, len: usize },

    /// A jump or choice operand is a negative offset.
    #[error("jump target {target} out of bounds at instruction {at}")]
    JumpOutOfBounds { at: usize, target: i64 },

    /// The stack holds fewer values than the opcode consumes.
    #[error("stack underflow at instruction {at}: {opcode} needs {needed}, depth {depth}")]
    StackUnderflow {
        at: usize,
        opcode: Opcode,
        needed: usize,
        depth: usize,
    },

    /// The stack reached the configured maximum depth.
    #[error("stack overflow at instruction {at} (limit {limit})")]
    StackOverflow { at: usize, limit: usize },

    /// A unary opcode carries no operand.
    #[error("{opcode} at instruction {at} is missing its operand")]
    MissingOperand { at: usize, opcode: Opcode },

    /// The embedded operand has the wrong tag for its opcode.
    #[error("{opcode} at instruction {at} expects a {expected} operand, found {found}")]
    OperandMismatch {
        at: usize,
        opcode: Opcode,
        expected: ValueKind,
        found: ValueKind,
    },

    /// A popped stack value has the wrong tag for its opcode.
    #[error("type mismatch at instruction {at}: {opcode} expects {expected}, found {found}")]
    TypeMismatch {
        at: usize,
        opcode: Opcode,
        expected: ValueKind,
        found: ValueKind,
    },

    /// Integer division or modulo by zero.
    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: usize },

    /// The callee is missing from the program's function table or from the
    /// host's registered functions.
    #[error("callback not found: '{name}' at instruction {at}")]
    CallbackNotFound { at: usize, name: String },

    /// The stack holds fewer values than the callee's prototype declares.
    #[error("call to '{name}' at instruction {at} needs {expected} argument(s), stack depth {depth}")]
    ArgumentCount {
        at: usize,
        name: String,
        expected: usize,
        depth: usize,
    },

    /// An argument's tag disagrees with the callee's prototype.
    #[error("argument {position} of '{name}' at instruction {at} expects {expected}, found {found}")]
    ArgumentType {
        at: usize,
        name: String,
        position: usize,
        expected: ValueKind,
        found: ValueKind,
    },
}

/// Errors returned by the host-facing VM operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// The operation is not permitted in the VM's current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: RunState,
    },

    /// The choice index does not name a pending choice.
    #[error("choice index {index} out of range ({available} available)")]
    ChoiceOutOfRange { index: usize, available: usize },

    /// Execution faulted; the VM is now in [`RunState::Error`].
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
