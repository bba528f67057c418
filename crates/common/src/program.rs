//! The program container exchanged between the compiler and the VM.
//!
//! Encoded image (all integers little-endian):
//! ```text
//! "BRLN" magic, version (u8)
//! start (u32)
//! function count (u32), then per function:
//!     name (u32 length + UTF-8), param count (u8), param kinds (u8 each)
//! instruction count (u32), then the instructions
//! ```
//! Functions are written in name order, so equal programs always produce
//! identical bytes.

use std::collections::BTreeMap;

use crate::codec::{put_len, put_str, Reader};
use crate::error::{DecodeError, EncodeError};
use crate::instruction::Instruction;
use crate::value_kind::ValueKind;

/// Leading bytes of every encoded program.
pub const MAGIC: [u8; 4] = *b"BRLN";

/// Encoding version written by [`Program::encode`].
pub const VERSION: u8 = 1;

/// A compiled dialogue program.
///
/// Immutable once built; many VMs may borrow the same program at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Offset of the first instruction to execute.
    pub start: usize,
    /// The instruction stream.
    pub code: Vec<Instruction>,
    /// Host function prototypes: name to ordered parameter kinds.
    pub functions: BTreeMap<String, Vec<ValueKind>>,
}

impl Program {
    /// Create a program with no host functions.
    pub fn new(start: usize, code: Vec<Instruction>) -> Self {
        Self {
            start,
            code,
            functions: BTreeMap::new(),
        }
    }

    /// Builder-style function declaration.
    pub fn with_function(mut self, name: impl Into<String>, params: Vec<ValueKind>) -> Self {
        self.functions.insert(name.into(), params);
        self
    }

    /// Encode the program to its binary image.
    ///
    /// Fails if a prototype has more than 255 parameters, or if the start
    /// offset, a count or a string length does not fit in a `u32`.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(16 + self.code.len() * 4);
        out.extend_from_slice(&MAGIC);
        out.push(VERSION);
        put_len(&mut out, "start offset", self.start)?;

        put_len(&mut out, "function count", self.functions.len())?;
        for (name, params) in &self.functions {
            put_str(&mut out, name)?;
            let count = u8::try_from(params.len()).map_err(|_| EncodeError::TooManyParams {
                function: name.clone(),
                count: params.len(),
            })?;
            out.push(count);
            out.extend(params.iter().map(|kind| *kind as u8));
        }

        put_len(&mut out, "instruction count", self.code.len())?;
        for instr in &self.code {
            instr.encode(&mut out)?;
        }
        Ok(out)
    }

    /// Decode a binary image produced by [`Program::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);

        if reader.take(MAGIC.len()).map_err(|_| DecodeError::BadMagic)? != MAGIC {
            return Err(DecodeError::BadMagic);
        }
        let version = reader.u8()?;
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let start = reader.u32()? as usize;

        let mut functions = BTreeMap::new();
        for _ in 0..reader.u32()? {
            let name = reader.string()?;
            let count = reader.u8()?;
            let params = (0..count)
                .map(|_| reader.u8().and_then(ValueKind::try_from))
                .collect::<Result<Vec<_>, _>>()?;
            functions.insert(name, params);
        }

        let count = reader.u32()? as usize;
        // Every instruction is at least one byte; cap the preallocation.
        let mut code = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            code.push(Instruction::decode(&mut reader)?);
        }

        if reader.remaining() > 0 {
            return Err(DecodeError::TrailingBytes(reader.remaining()));
        }
        if start >= code.len() && !(code.is_empty() && start == 0) {
            return Err(DecodeError::StartOutOfRange {
                start,
                len: code.len(),
            });
        }

        Ok(Self {
            start,
            code,
            functions,
        })
    }

    /// blake3 digest of the encoded image.
    pub fn fingerprint(&self) -> Result<[u8; 32], EncodeError> {
        Ok(*blake3::hash(&self.encode()?).as_bytes())
    }

    /// Hex rendering of [`Program::fingerprint`].
    pub fn fingerprint_hex(&self) -> Result<String, EncodeError> {
        Ok(blake3::hash(&self.encode()?).to_hex().to_string())
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}
