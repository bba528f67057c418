//! Instructions: an opcode plus at most one operand value.
//!
//! Encoded layout:
//! ```text
//! opcode (u8)
//! -- unary opcodes only --
//! operand kind (u8)
//! payload: Bool = u8, Number = i64 LE, String/Symbol = u32 LE length + UTF-8, Null = empty
//! ```

use std::fmt;

use crate::codec::{put_str, Reader};
use crate::error::{DecodeError, EncodeError};
use crate::opcode::{Arity, Opcode};
use crate::value::Value;
use crate::value_kind::ValueKind;

/// A single Branchline instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// Embedded operand. `Some` exactly when `opcode.arity()` is unary in
    /// a well-formed program.
    pub operand: Option<Value>,
}

impl Instruction {
    /// Create an instruction from raw parts. No arity check is made; the VM
    /// faults on a missing or mistagged operand.
    pub fn new(opcode: Opcode, operand: Option<Value>) -> Self {
        Self { opcode, operand }
    }

    /// An instruction with no operand.
    pub fn nullary(opcode: Opcode) -> Self {
        Self::new(opcode, None)
    }

    /// An instruction with one operand.
    pub fn unary(opcode: Opcode, operand: Value) -> Self {
        Self::new(opcode, Some(operand))
    }

    pub fn push_bool(b: bool) -> Self {
        Self::unary(Opcode::PushBool, Value::Bool(b))
    }

    pub fn push_number(n: i64) -> Self {
        Self::unary(Opcode::PushNumber, Value::Number(n))
    }

    pub fn push_string(text: impl Into<String>) -> Self {
        Self::unary(Opcode::PushString, Value::str(text))
    }

    /// `JMP`, `JMPF` or `PUSH_CHOICE` to an absolute code offset.
    pub fn jump(opcode: Opcode, target: usize) -> Self {
        Self::unary(opcode, Value::Number(target as i64))
    }

    /// An instruction whose operand names a node, variable or function.
    pub fn with_symbol(opcode: Opcode, name: impl Into<String>) -> Self {
        Self::unary(opcode, Value::symbol(name))
    }

    /// The operand kind a unary opcode requires, `None` for nullary opcodes.
    pub fn expected_operand(opcode: Opcode) -> Option<ValueKind> {
        match opcode {
            Opcode::PushBool => Some(ValueKind::Bool),
            Opcode::PushNumber | Opcode::Jmp | Opcode::Jmpf | Opcode::PushChoice => {
                Some(ValueKind::Number)
            }
            Opcode::PushString => Some(ValueKind::String),
            Opcode::NodeEnter
            | Opcode::NodeExit
            | Opcode::LoadVar
            | Opcode::StoreVar
            | Opcode::Call => Some(ValueKind::Symbol),
            _ => None,
        }
    }

    /// Append the encoding of this instruction to `out`.
    ///
    /// A nullary opcode never writes an operand, even if one is attached.
    /// A unary opcode without an operand is written with a `Null` operand.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        out.push(self.opcode as u8);
        if self.opcode.arity() == Arity::Nullary {
            return Ok(());
        }
        let operand = self.operand.as_ref().unwrap_or(&Value::Null);
        out.push(operand.kind() as u8);
        match operand {
            Value::Bool(b) => out.push(u8::from(*b)),
            Value::Number(n) => out.extend_from_slice(&n.to_le_bytes()),
            Value::Str(s) | Value::Symbol(s) => put_str(out, s)?,
            Value::Null => {}
        }
        Ok(())
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let opcode = Opcode::try_from(reader.u8()?)?;
        if opcode.arity() == Arity::Nullary {
            return Ok(Self::nullary(opcode));
        }
        let operand = match ValueKind::try_from(reader.u8()?)? {
            ValueKind::Bool => Value::Bool(reader.u8()? != 0),
            ValueKind::Number => Value::Number(reader.i64()?),
            ValueKind::String => Value::Str(reader.string()?),
            ValueKind::Null => Value::Null,
            ValueKind::Symbol => Value::Symbol(reader.string()?),
        };
        Ok(Self::unary(opcode, operand))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        match &self.operand {
            None => Ok(()),
            Some(Value::Str(s)) => write!(f, " {s:?}"),
            Some(other) => write!(f, " {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(instr: &Instruction) -> Instruction {
        let mut bytes = Vec::new();
        instr.encode(&mut bytes).unwrap();
        let mut reader = Reader::new(&bytes);
        let decoded = Instruction::decode(&mut reader).unwrap();
        assert_eq!(reader.remaining(), 0);
        decoded
    }

    #[test]
    fn nullary_is_one_byte() {
        let mut bytes = Vec::new();
        Instruction::nullary(Opcode::Add).encode(&mut bytes).unwrap();
        assert_eq!(bytes, vec![0x10]);
    }

    #[test]
    fn number_operand_layout() {
        let mut bytes = Vec::new();
        Instruction::push_number(-2).encode(&mut bytes).unwrap();
        assert_eq!(bytes[0], 0x02);
        assert_eq!(bytes[1], ValueKind::Number as u8);
        assert_eq!(&bytes[2..], &(-2i64).to_le_bytes());
    }

    #[test]
    fn symbol_operand_layout() {
        let mut bytes = Vec::new();
        Instruction::with_symbol(Opcode::NodeEnter, "hub").encode(&mut bytes).unwrap();
        assert_eq!(bytes, vec![0x50, 0x05, 3, 0, 0, 0, b'h', b'u', b'b']);
    }

    #[test]
    fn operands_survive_encoding() {
        for instr in [
            Instruction::push_bool(true),
            Instruction::push_string("Hello, traveller"),
            Instruction::jump(Opcode::Jmpf, 12),
            Instruction::with_symbol(Opcode::Call, "give_gold"),
            Instruction::unary(Opcode::PushString, Value::Null),
        ] {
            assert_eq!(roundtrip(&instr), instr);
        }
    }

    #[test]
    fn operand_on_nullary_opcode_is_dropped() {
        let instr = Instruction::unary(Opcode::End, Value::Number(1));
        assert_eq!(roundtrip(&instr), Instruction::nullary(Opcode::End));
    }

    #[test]
    fn decode_rejects_reserved_operand_kind() {
        let bytes = [0x02, 0x09];
        let mut reader = Reader::new(&bytes);
        assert_eq!(
            Instruction::decode(&mut reader),
            Err(DecodeError::ReservedValueKind(0x09))
        );
    }

    #[test]
    fn expected_operands() {
        assert_eq!(
            Instruction::expected_operand(Opcode::PushChoice),
            Some(ValueKind::Number)
        );
        assert_eq!(
            Instruction::expected_operand(Opcode::StoreVar),
            Some(ValueKind::Symbol)
        );
        assert_eq!(Instruction::expected_operand(Opcode::Concat), None);
        for &op in &crate::opcode::ALL_OPCODES {
            assert_eq!(
                Instruction::expected_operand(op).is_some(),
                op.arity() == Arity::Unary,
                "operand table disagrees with arity for {op}"
            );
        }
    }

    #[test]
    fn display() {
        assert_eq!(Instruction::push_string("Hi").to_string(), "PUSH_STRING \"Hi\"");
        assert_eq!(Instruction::jump(Opcode::Jmp, 4).to_string(), "JMP 4");
        assert_eq!(
            Instruction::with_symbol(Opcode::LoadVar, "gold").to_string(),
            "LOAD_VAR gold"
        );
        assert_eq!(Instruction::nullary(Opcode::End).to_string(), "END");
    }
}
