//! Branchline virtual machine: executes compiled dialogue programs.
//!
//! The VM is a suspendable stack machine with:
//! - An operand stack of [`Value`]s, bounded by [`VmConfig::max_stack_depth`]
//! - A name-keyed variable store, readable and writable by the host
//! - A list of pending choices filled by `PUSH_CHOICE`
//! - Narrative callbacks ([`Host`]) that may pause execution
//! - Host functions ([`Functions`]) checked against the program's prototypes
//!
//! Execution is driven by the host through [`VM::start`], [`VM::resume`],
//! [`VM::choose`] and [`VM::reset`], each of which runs until the VM settles
//! in a [`RunState`] other than `Running`.
//!
//! # Usage
//!
//! ```
//! use branchline_common::{Instruction, Opcode, Program, Value};
//! use branchline_vm::run;
//!
//! let program = Program::new(0, vec![
//!     Instruction::push_number(30),
//!     Instruction::push_number(4),
//!     Instruction::nullary(Opcode::Add),
//!     Instruction::nullary(Opcode::End),
//! ]);
//!
//! let stack = run(&program).unwrap();
//! assert_eq!(stack, vec![Value::Number(34)]);
//! ```

pub mod error;
pub mod execute;
pub mod host;
pub mod machine;

pub use error::{RuntimeError, VmError};
pub use host::{Flow, Functions, Host, HostFn, SilentHost};
pub use machine::{Choice, RunState, VmConfig, DEFAULT_MAX_STACK_DEPTH, VM};

use branchline_common::{Program, Value};

/// Execute a program with a [`SilentHost`] and no host functions, and
/// return the stack once the VM stops running.
///
/// Pending choices are left unanswered, so a program that reaches
/// `SHOW_CHOICES` returns early with whatever is on the stack.
///
/// # Errors
///
/// Returns [`VmError::Runtime`] if execution faults.
pub fn run(program: &Program) -> Result<Vec<Value>, VmError> {
    let mut vm = VM::new(program, SilentHost);
    vm.start()?;
    Ok(vm.stack)
}
