//! Branchline compiler: script tree to bytecode program.
//!
//! The compiler is the code generator half of the toolchain. Lexing,
//! parsing and tree-level optimisation happen upstream; this crate receives
//! a finished [`Script`] tree and lowers it to a flat [`Program`] in a single
//! pass, resolving node references by backpatching.
//!
//! # Usage
//!
//! ```
//! use branchline_compiler::ast::{Block, Expr, Node, Script};
//! use branchline_compiler::{compile, disassemble};
//!
//! let script = Script::new(vec![Node::new(
//!     "start",
//!     vec![Block::Paragraph(vec![Expr::text("Hello")])],
//! )]);
//! let program = compile(&script).unwrap();
//! assert_eq!(program.start, 0);
//! assert!(disassemble(&program).contains("SHOW_LINE"));
//! ```

pub mod ast;
pub mod error;

mod codegen;
mod disassembler;

pub use codegen::compile;
pub use disassembler::disassemble;
pub use error::CompileError;

