//! VM state management: stack, variables, pending choices, run state.

use std::collections::HashMap;
use std::fmt;

use branchline_common::{Opcode, Program, Value};
use tracing::debug;

use crate::error::RuntimeError;
use crate::host::{Functions, Host};

/// Default maximum stack depth.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 4096;

/// Execution state of a [`VM`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Inside the fetch-execute loop.
    Running,
    /// Paused by a host callback; [`VM::resume`] continues.
    Suspended,
    /// Choices are pending; [`VM::choose`] continues.
    WaitingForInput,
    /// Not started, reset, or finished.
    Stopped,
    /// Terminated by a runtime fault; only [`VM::reset`] recovers.
    Error,
}

impl RunState {
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Running => "running",
            RunState::Suspended => "suspended",
            RunState::WaitingForInput => "waiting for input",
            RunState::Stopped => "stopped",
            RunState::Error => "error",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    /// Pushing beyond this depth faults with [`RuntimeError::StackOverflow`].
    pub max_stack_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
        }
    }
}

/// A pending choice registered by `PUSH_CHOICE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub text: String,
    /// Instruction offset execution continues at when chosen.
    pub target: usize,
}

/// The Branchline virtual machine.
///
/// Borrows a [`Program`] and owns its host. A fresh VM is
/// [`RunState::Stopped`] with the program counter at the program's start.
pub struct VM<'a, H> {
    pub(crate) program: &'a Program,
    pub(crate) host: H,
    pub(crate) functions: Functions,
    pub(crate) config: VmConfig,
    pub(crate) stack: Vec<Value>,
    pub(crate) variables: HashMap<String, Value>,
    pub(crate) choices: Vec<Choice>,
    pub(crate) pc: usize,
    pub(crate) state: RunState,
    pub(crate) fault: Option<RuntimeError>,
}

impl<'a, H: Host> VM<'a, H> {
    /// Create a VM with no host functions and the default config.
    pub fn new(program: &'a Program, host: H) -> Self {
        Self {
            program,
            host,
            functions: Functions::new(),
            config: VmConfig::default(),
            stack: Vec::new(),
            variables: HashMap::new(),
            choices: Vec::new(),
            pc: program.start,
            state: RunState::Stopped,
            fault: None,
        }
    }

    /// Replace the host function registry.
    pub fn with_functions(mut self, functions: Functions) -> Self {
        self.functions = functions;
        self
    }

    /// Replace the runtime limits.
    pub fn with_config(mut self, config: VmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// The operand stack, bottom first.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Choices registered since the last `SHOW_CHOICES` was answered.
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// The fault that moved the VM to [`RunState::Error`], if any.
    pub fn fault(&self) -> Option<&RuntimeError> {
        self.fault.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn functions_mut(&mut self) -> &mut Functions {
        &mut self.functions
    }

    /// Read a variable. `None` means it was never assigned.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Write a variable, replacing any previous value of any tag.
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn set_bool(&mut self, name: impl Into<String>, b: bool) {
        self.set_variable(name, Value::Bool(b));
    }

    pub fn set_number(&mut self, name: impl Into<String>, n: i64) {
        self.set_variable(name, Value::Number(n));
    }

    pub fn set_string(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.set_variable(name, Value::str(text));
    }

    pub fn set_null(&mut self, name: impl Into<String>) {
        self.set_variable(name, Value::Null);
    }

    pub fn set_symbol(&mut self, name: impl Into<String>, symbol: impl Into<String>) {
        self.set_variable(name, Value::symbol(symbol));
    }

    /// Return to the initial state: empty stack, no variables, no pending
    /// choices, program counter at the start, [`RunState::Stopped`].
    ///
    /// Permitted in every state and idempotent.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.variables.clear();
        self.choices.clear();
        self.fault = None;
        self.pc = self.program.start;
        self.transition(RunState::Stopped);
    }

    pub(crate) fn transition(&mut self, next: RunState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, pc = self.pc, "state transition");
        }
        self.state = next;
    }

    /// Push a value onto the stack, checking the configured depth.
    pub(crate) fn push(&mut self, at: usize, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.config.max_stack_depth {
            return Err(RuntimeError::StackOverflow {
                at,
                limit: self.config.max_stack_depth,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pop a value from the stack. Depth was checked before dispatch, so
    /// this only fails on an internal miscount.
    pub(crate) fn pop(&mut self, at: usize, opcode: Opcode) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow {
            at,
            opcode,
            needed: 1,
            depth: 0,
        })
    }
}
