//! Disassembler: program → listing text.
//!
//! One directive line per host function, a `.start` line, then one line per
//! instruction prefixed with its zero-padded offset. Jump operands are
//! absolute offsets, so they can be read against the left column.

use std::fmt::Write;

use branchline_common::Program;

/// Render a program as a listing.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();

    for (name, params) in &program.functions {
        let params: Vec<&str> = params.iter().map(|kind| kind.name()).collect();
        let _ = writeln!(out, ".func {name}({})", params.join(", "));
    }
    let _ = writeln!(out, ".start {}", program.start);

    for (offset, instr) in program.code.iter().enumerate() {
        let _ = writeln!(out, "{offset:04}  {instr}");
    }
    out
}
