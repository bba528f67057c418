//! Opcode definitions for the Branchline instruction set.
//!
//! Every opcode is fixed-arity: it either carries exactly one operand
//! ([`Arity::Unary`]) or none ([`Arity::Nullary`]). The arity and the minimum
//! stack depth each opcode needs live next to the enum so that adding an
//! opcode fails to compile until both tables are updated.

use std::fmt;

use crate::error::DecodeError;

/// Identifies the operation to perform.
///
/// The `#[repr(u8)]` attribute gives each variant a stable byte value used
/// by the binary program encoding.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Stack
    /// Push the embedded `Bool` operand.
    PushBool = 0x01,
    /// Push the embedded `Number` operand.
    PushNumber = 0x02,
    /// Push the embedded `Str` operand.
    PushString = 0x03,
    /// Push `Null`.
    PushNull = 0x04,
    /// Discard the top of stack.
    Pop = 0x05,

    // Arithmetic
    /// Pop two numbers, push their sum.
    Add = 0x10,
    /// Pop two numbers, push (second_popped - first_popped).
    Sub = 0x11,
    /// Pop two numbers, push their product.
    Mul = 0x12,
    /// Pop two numbers, push the truncated quotient.
    Div = 0x13,
    /// Pop two numbers, push the truncated remainder.
    Mod = 0x14,
    /// Pop one number, push its negation.
    Neg = 0x15,
    /// Pop one number, push it plus one.
    Inc = 0x16,
    /// Pop one number, push it minus one.
    Dec = 0x17,

    // Comparison
    /// Pop two values of any tag, push `Bool` (tag and payload equal).
    Eq = 0x20,
    /// Pop two values of any tag, push `Bool` (tag or payload differ).
    Neq = 0x21,
    /// Pop two numbers, push `Bool` (second_popped > first_popped).
    Gt = 0x22,
    /// Pop two numbers, push `Bool` (second_popped >= first_popped).
    Gte = 0x23,
    /// Pop two numbers, push `Bool` (second_popped < first_popped).
    Lt = 0x24,
    /// Pop two numbers, push `Bool` (second_popped <= first_popped).
    Lte = 0x25,

    // Logic
    /// Pop two booleans, push their conjunction.
    And = 0x30,
    /// Pop two booleans, push their disjunction.
    Or = 0x31,
    /// Pop one boolean, push its negation.
    Not = 0x32,

    // Text
    /// Pop two values of any tag, push the concatenation of their text.
    Concat = 0x38,

    // Control flow
    /// Jump to the embedded target offset.
    Jmp = 0x40,
    /// Pop a boolean, jump to the embedded target offset if it is false.
    Jmpf = 0x41,

    // Node lifecycle
    /// Report entry into the node named by the embedded symbol.
    NodeEnter = 0x50,
    /// Report exit from the node named by the embedded symbol.
    NodeExit = 0x51,

    // Narrative
    /// Pop a string and show it as a line of dialogue.
    ShowLine = 0x60,
    /// Pop a string and record it as a pending choice targeting the operand.
    PushChoice = 0x61,
    /// Present all pending choices and wait for the host to pick one.
    ShowChoices = 0x62,

    // Variables
    /// Push the value bound to the embedded symbol, or `Null`.
    LoadVar = 0x70,
    /// Pop a value and bind it to the embedded symbol.
    StoreVar = 0x71,

    // Host functions
    /// Call the host function named by the embedded symbol.
    Call = 0x80,

    // Termination
    /// End the dialogue.
    End = 0xFF,
}

/// Operand arity of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// The instruction carries no operand.
    Nullary,
    /// The instruction carries exactly one operand.
    Unary,
}

/// All valid opcodes, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 34] = [
    Opcode::PushBool,
    Opcode::PushNumber,
    Opcode::PushString,
    Opcode::PushNull,
    Opcode::Pop,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Mod,
    Opcode::Neg,
    Opcode::Inc,
    Opcode::Dec,
    Opcode::Eq,
    Opcode::Neq,
    Opcode::Gt,
    Opcode::Gte,
    Opcode::Lt,
    Opcode::Lte,
    Opcode::And,
    Opcode::Or,
    Opcode::Not,
    Opcode::Concat,
    Opcode::Jmp,
    Opcode::Jmpf,
    Opcode::NodeEnter,
    Opcode::NodeExit,
    Opcode::ShowLine,
    Opcode::PushChoice,
    Opcode::ShowChoices,
    Opcode::LoadVar,
    Opcode::StoreVar,
    Opcode::Call,
    Opcode::End,
];

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Err(DecodeError::IllegalOpcode),

            0x01 => Ok(Opcode::PushBool),
            0x02 => Ok(Opcode::PushNumber),
            0x03 => Ok(Opcode::PushString),
            0x04 => Ok(Opcode::PushNull),
            0x05 => Ok(Opcode::Pop),

            0x10 => Ok(Opcode::Add),
            0x11 => Ok(Opcode::Sub),
            0x12 => Ok(Opcode::Mul),
            0x13 => Ok(Opcode::Div),
            0x14 => Ok(Opcode::Mod),
            0x15 => Ok(Opcode::Neg),
            0x16 => Ok(Opcode::Inc),
            0x17 => Ok(Opcode::Dec),

            0x20 => Ok(Opcode::Eq),
            0x21 => Ok(Opcode::Neq),
            0x22 => Ok(Opcode::Gt),
            0x23 => Ok(Opcode::Gte),
            0x24 => Ok(Opcode::Lt),
            0x25 => Ok(Opcode::Lte),

            0x30 => Ok(Opcode::And),
            0x31 => Ok(Opcode::Or),
            0x32 => Ok(Opcode::Not),
            0x38 => Ok(Opcode::Concat),

            0x40 => Ok(Opcode::Jmp),
            0x41 => Ok(Opcode::Jmpf),

            0x50 => Ok(Opcode::NodeEnter),
            0x51 => Ok(Opcode::NodeExit),

            0x60 => Ok(Opcode::ShowLine),
            0x61 => Ok(Opcode::PushChoice),
            0x62 => Ok(Opcode::ShowChoices),

            0x70 => Ok(Opcode::LoadVar),
            0x71 => Ok(Opcode::StoreVar),

            0x80 => Ok(Opcode::Call),

            0xFF => Ok(Opcode::End),

            _ => Err(DecodeError::ReservedOpcode(value)),
        }
    }
}

impl Opcode {
    /// Returns the listing mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::PushBool => "PUSH_BOOL",
            Opcode::PushNumber => "PUSH_NUMBER",
            Opcode::PushString => "PUSH_STRING",
            Opcode::PushNull => "PUSH_NULL",
            Opcode::Pop => "POP",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Neg => "NEG",
            Opcode::Inc => "INC",
            Opcode::Dec => "DEC",
            Opcode::Eq => "EQ",
            Opcode::Neq => "NEQ",
            Opcode::Gt => "GT",
            Opcode::Gte => "GTE",
            Opcode::Lt => "LT",
            Opcode::Lte => "LTE",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Concat => "CONCAT",
            Opcode::Jmp => "JMP",
            Opcode::Jmpf => "JMPF",
            Opcode::NodeEnter => "NODE_ENTER",
            Opcode::NodeExit => "NODE_EXIT",
            Opcode::ShowLine => "SHOW_LINE",
            Opcode::PushChoice => "PUSH_CHOICE",
            Opcode::ShowChoices => "SHOW_CHOICES",
            Opcode::LoadVar => "LOAD_VAR",
            Opcode::StoreVar => "STORE_VAR",
            Opcode::Call => "CALL",
            Opcode::End => "END",
        }
    }

    /// Whether this opcode carries an operand.
    pub fn arity(&self) -> Arity {
        match self {
            Opcode::PushBool
            | Opcode::PushNumber
            | Opcode::PushString
            | Opcode::Jmp
            | Opcode::Jmpf
            | Opcode::NodeEnter
            | Opcode::NodeExit
            | Opcode::PushChoice
            | Opcode::LoadVar
            | Opcode::StoreVar
            | Opcode::Call => Arity::Unary,

            Opcode::PushNull
            | Opcode::Pop
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::Neg
            | Opcode::Inc
            | Opcode::Dec
            | Opcode::Eq
            | Opcode::Neq
            | Opcode::Gt
            | Opcode::Gte
            | Opcode::Lt
            | Opcode::Lte
            | Opcode::And
            | Opcode::Or
            | Opcode::Not
            | Opcode::Concat
            | Opcode::ShowLine
            | Opcode::ShowChoices
            | Opcode::End => Arity::Nullary,
        }
    }

    /// Minimum number of stack values that must be present before this
    /// opcode executes.
    ///
    /// `CALL` reports 0: its depth depends on the callee's prototype and is
    /// checked against the function table at call time.
    pub fn min_stack(&self) -> usize {
        match self {
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::Eq
            | Opcode::Neq
            | Opcode::Gt
            | Opcode::Gte
            | Opcode::Lt
            | Opcode::Lte
            | Opcode::And
            | Opcode::Or
            | Opcode::Concat => 2,

            Opcode::Pop
            | Opcode::Neg
            | Opcode::Inc
            | Opcode::Dec
            | Opcode::Not
            | Opcode::Jmpf
            | Opcode::ShowLine
            | Opcode::PushChoice
            | Opcode::StoreVar => 1,

            Opcode::PushBool
            | Opcode::PushNumber
            | Opcode::PushString
            | Opcode::PushNull
            | Opcode::Jmp
            | Opcode::NodeEnter
            | Opcode::NodeExit
            | Opcode::ShowChoices
            | Opcode::LoadVar
            | Opcode::Call
            | Opcode::End => 0,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
