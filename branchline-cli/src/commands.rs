//! CLI command implementations.

use std::fs;
use std::io;

use branchline_common::Program;
use branchline_compiler::ast::Script;
use branchline_vm::{RunState, VmError, VM};

use crate::console::{self, Console};

/// Compile a JSON script tree to a .brl program.
pub fn compile(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: compile requires an input file");
        eprintln!("Usage: branchline compile <script.json> [-o output.brl]");
        return Err(1);
    }

    let input = &args[0];

    let output = if args.len() >= 3 && args[1] == "-o" {
        args[2].clone()
    } else if let Some(stem) = input.strip_suffix(".json") {
        format!("{stem}.brl")
    } else {
        format!("{input}.brl")
    };

    let text = fs::read_to_string(input).map_err(|e| {
        eprintln!("error: cannot read '{input}': {e}");
        1
    })?;

    let script: Script = serde_json::from_str(&text).map_err(|e| {
        eprintln!("error: invalid script: {e}");
        1
    })?;

    let program = branchline_compiler::compile(&script).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;

    let bytes = program.encode().map_err(|e| {
        eprintln!("error: cannot encode program: {e}");
        1
    })?;
    fs::write(&output, &bytes).map_err(|e| {
        eprintln!("error: cannot write '{output}': {e}");
        1
    })?;

    eprintln!(
        "compiled {} nodes into {} instructions ({} bytes) -> {output}",
        script.nodes.len(),
        program.len(),
        bytes.len()
    );
    Ok(())
}

/// Play a .brl program on the console.
pub fn run(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: run requires an input file");
        eprintln!("Usage: branchline run <input.brl>");
        return Err(1);
    }

    let program = read_binary(&args[0])?;
    let mut vm = VM::new(&program, Console).with_functions(console::echo_functions(&program));
    let mut stdin = io::stdin().lock();

    let mut state = vm.start().map_err(runtime_error)?;
    loop {
        state = match state {
            RunState::WaitingForInput => {
                let Some(index) = console::read_choice(&mut stdin, vm.choices().len()) else {
                    eprintln!("error: input ended before a choice was made");
                    return Err(1);
                };
                vm.choose(index).map_err(runtime_error)?
            }
            RunState::Suspended => vm.resume().map_err(runtime_error)?,
            _ => return Ok(()),
        };
    }
}

/// Disassemble a .brl program to text.
pub fn disassemble(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: disassemble requires an input file");
        eprintln!("Usage: branchline disassemble <input.brl>");
        return Err(1);
    }

    let program = read_binary(&args[0])?;
    print!("{}", branchline_compiler::disassemble(&program));
    Ok(())
}

/// Print the blake3 fingerprint of a .brl program.
pub fn hash(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: hash requires an input file");
        eprintln!("Usage: branchline hash <input.brl>");
        return Err(1);
    }

    let input = &args[0];
    let program = read_binary(input)?;
    let digest = program.fingerprint_hex().map_err(|e| {
        eprintln!("error: cannot encode program: {e}");
        1
    })?;
    println!("{digest}  {input}");
    Ok(())
}

fn runtime_error(e: VmError) -> i32 {
    eprintln!("runtime error: {e}");
    3
}

fn read_binary(path: &str) -> Result<Program, i32> {
    let bytes = fs::read(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })?;

    Program::decode(&bytes).map_err(|e| {
        eprintln!("error: invalid binary: {e}");
        1
    })
}
