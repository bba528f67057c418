//! Host-facing run operations, the fetch-execute loop and opcode dispatch.

use branchline_common::{Instruction, Opcode, Value, ValueKind};
use tracing::{debug, trace, warn};

use crate::error::{RuntimeError, VmError};
use crate::host::{Flow, Host};
use crate::machine::{Choice, RunState, VM};

impl<'a, H: Host> VM<'a, H> {
    /// Begin execution from the current program counter.
    ///
    /// Requires [`RunState::Stopped`]. Returns the state the VM settled in:
    /// `Suspended`, `WaitingForInput` or `Stopped`. A fault returns
    /// [`VmError::Runtime`] and leaves the VM in [`RunState::Error`].
    pub fn start(&mut self) -> Result<RunState, VmError> {
        self.enter(RunState::Stopped, "start")?;
        self.run()
    }

    /// Continue after a callback asked to pause. Requires
    /// [`RunState::Suspended`].
    pub fn resume(&mut self) -> Result<RunState, VmError> {
        self.enter(RunState::Suspended, "resume")?;
        self.run()
    }

    /// Pick one of the pending choices and continue at its target.
    ///
    /// Requires [`RunState::WaitingForInput`] and a valid index; otherwise
    /// the VM is left unchanged.
    pub fn choose(&mut self, index: usize) -> Result<RunState, VmError> {
        if self.state != RunState::WaitingForInput {
            return Err(VmError::InvalidState {
                operation: "choose",
                state: self.state,
            });
        }
        let target = match self.choices.get(index) {
            Some(choice) => choice.target,
            None => {
                return Err(VmError::ChoiceOutOfRange {
                    index,
                    available: self.choices.len(),
                })
            }
        };
        debug!(index, target, "choice taken");
        self.choices.clear();
        self.pc = target;
        self.transition(RunState::Running);
        self.run()
    }

    fn enter(&mut self, required: RunState, operation: &'static str) -> Result<(), VmError> {
        if self.state != required {
            return Err(VmError::InvalidState {
                operation,
                state: self.state,
            });
        }
        self.transition(RunState::Running);
        Ok(())
    }

    /// Step until the VM leaves [`RunState::Running`].
    fn run(&mut self) -> Result<RunState, VmError> {
        while self.state == RunState::Running {
            if let Err(fault) = self.step() {
                warn!(%fault, "runtime fault");
                self.transition(RunState::Error);
                self.fault = Some(fault.clone());
                return Err(fault.into());
            }
        }
        Ok(self.state)
    }

    /// Fetch, check and execute one instruction.
    fn step(&mut self) -> Result<(), RuntimeError> {
        let at = self.pc;
        let program = self.program;
        let instr = program.code.get(at).ok_or(RuntimeError::OutOfBounds {
            pc: at,
            len: program.code.len(),
        })?;
        self.pc += 1;

        let opcode = instr.opcode;
        let needed = opcode.min_stack();
        if self.stack.len() < needed {
            return Err(RuntimeError::StackUnderflow {
                at,
                opcode,
                needed,
                depth: self.stack.len(),
            });
        }
        trace!(pc = at, %instr, depth = self.stack.len(), "dispatch");

        match opcode {
            // Stack
            Opcode::PushBool | Opcode::PushNumber | Opcode::PushString => {
                let value = operand(at, instr)?.clone();
                self.push(at, value)?;
            }
            Opcode::PushNull => self.push(at, Value::Null)?,
            Opcode::Pop => {
                self.pop(at, opcode)?;
            }

            // Arithmetic
            Opcode::Add => self.exec_arith(at, opcode, |a, b| Some(a.wrapping_add(b)))?,
            Opcode::Sub => self.exec_arith(at, opcode, |a, b| Some(a.wrapping_sub(b)))?,
            Opcode::Mul => self.exec_arith(at, opcode, |a, b| Some(a.wrapping_mul(b)))?,
            Opcode::Div => self.exec_arith(at, opcode, |a, b| {
                (b != 0).then(|| a.wrapping_div(b))
            })?,
            Opcode::Mod => self.exec_arith(at, opcode, |a, b| {
                (b != 0).then(|| a.wrapping_rem(b))
            })?,
            Opcode::Neg => self.exec_unary_number(at, opcode, i64::wrapping_neg)?,
            Opcode::Inc => self.exec_unary_number(at, opcode, |n| n.wrapping_add(1))?,
            Opcode::Dec => self.exec_unary_number(at, opcode, |n| n.wrapping_sub(1))?,

            // Comparison
            Opcode::Eq => self.exec_equality(at, opcode, true)?,
            Opcode::Neq => self.exec_equality(at, opcode, false)?,
            Opcode::Gt => self.exec_compare(at, opcode, |a, b| a > b)?,
            Opcode::Gte => self.exec_compare(at, opcode, |a, b| a >= b)?,
            Opcode::Lt => self.exec_compare(at, opcode, |a, b| a < b)?,
            Opcode::Lte => self.exec_compare(at, opcode, |a, b| a <= b)?,

            // Logic
            Opcode::And => self.exec_logic(at, opcode, |a, b| a && b)?,
            Opcode::Or => self.exec_logic(at, opcode, |a, b| a || b)?,
            Opcode::Not => {
                let b = self.pop_bool(at, opcode)?;
                self.push(at, Value::Bool(!b))?;
            }

            Opcode::Concat => {
                let b = self.pop(at, opcode)?;
                let a = self.pop(at, opcode)?;
                self.push(at, Value::Str(format!("{a}{b}")))?;
            }

            // Control flow
            Opcode::Jmp => self.pc = target_operand(at, instr)?,
            Opcode::Jmpf => {
                let target = target_operand(at, instr)?;
                if !self.pop_bool(at, opcode)? {
                    self.pc = target;
                }
            }

            // Node lifecycle
            Opcode::NodeEnter => {
                let name = symbol_operand(at, instr)?;
                let flow = self.host.node_entered(name);
                self.apply(flow);
            }
            Opcode::NodeExit => {
                let name = symbol_operand(at, instr)?;
                let flow = self.host.node_exited(name);
                self.apply(flow);
            }

            // Narrative
            Opcode::ShowLine => {
                let text = self.pop_string(at, opcode)?;
                let flow = self.host.line_shown(&text);
                self.apply(flow);
            }
            Opcode::PushChoice => {
                let target = target_operand(at, instr)?;
                let text = self.pop_string(at, opcode)?;
                self.choices.push(Choice { text, target });
            }
            Opcode::ShowChoices => {
                let texts: Vec<String> = self.choices.iter().map(|c| c.text.clone()).collect();
                self.host.choices_shown(&texts);
                self.transition(RunState::WaitingForInput);
            }

            // Variables
            Opcode::LoadVar => {
                let name = symbol_operand(at, instr)?;
                let value = self.variables.get(name).cloned().unwrap_or(Value::Null);
                self.push(at, value)?;
            }
            Opcode::StoreVar => {
                let name = symbol_operand(at, instr)?;
                let value = self.pop(at, opcode)?;
                self.variables.insert(name.to_string(), value);
            }

            Opcode::Call => self.exec_call(at, instr)?,

            Opcode::End => {
                self.host.dialogue_ended();
                self.transition(RunState::Stopped);
            }
        }
        Ok(())
    }

    fn apply(&mut self, flow: Flow) {
        if flow == Flow::Pause {
            self.transition(RunState::Suspended);
        }
    }

    fn exec_arith(
        &mut self,
        at: usize,
        opcode: Opcode,
        op: fn(i64, i64) -> Option<i64>,
    ) -> Result<(), RuntimeError> {
        let b = self.pop_number(at, opcode)?;
        let a = self.pop_number(at, opcode)?;
        let result = op(a, b).ok_or(RuntimeError::DivisionByZero { at })?;
        self.push(at, Value::Number(result))
    }

    fn exec_unary_number(
        &mut self,
        at: usize,
        opcode: Opcode,
        op: fn(i64) -> i64,
    ) -> Result<(), RuntimeError> {
        let n = self.pop_number(at, opcode)?;
        self.push(at, Value::Number(op(n)))
    }

    /// Structural equality across any pair of tags.
    fn exec_equality(&mut self, at: usize, opcode: Opcode, equal: bool) -> Result<(), RuntimeError> {
        let b = self.pop(at, opcode)?;
        let a = self.pop(at, opcode)?;
        self.push(at, Value::Bool((a == b) == equal))
    }

    fn exec_compare(
        &mut self,
        at: usize,
        opcode: Opcode,
        op: fn(i64, i64) -> bool,
    ) -> Result<(), RuntimeError> {
        let b = self.pop_number(at, opcode)?;
        let a = self.pop_number(at, opcode)?;
        self.push(at, Value::Bool(op(a, b)))
    }

    fn exec_logic(
        &mut self,
        at: usize,
        opcode: Opcode,
        op: fn(bool, bool) -> bool,
    ) -> Result<(), RuntimeError> {
        let b = self.pop_bool(at, opcode)?;
        let a = self.pop_bool(at, opcode)?;
        self.push(at, Value::Bool(op(a, b)))
    }

    /// Check the callee against the program's prototype and the registered
    /// functions, then hand it its arguments in declaration order.
    fn exec_call(&mut self, at: usize, instr: &'a Instruction) -> Result<(), RuntimeError> {
        let name = symbol_operand(at, instr)?;
        let not_found = || RuntimeError::CallbackNotFound {
            at,
            name: name.to_string(),
        };
        let program = self.program;
        let prototype = program.functions.get(name).ok_or_else(not_found)?;
        if !self.functions.contains(name) {
            return Err(not_found());
        }

        let depth = self.stack.len();
        if depth < prototype.len() {
            return Err(RuntimeError::ArgumentCount {
                at,
                name: name.to_string(),
                expected: prototype.len(),
                depth,
            });
        }
        let base = depth - prototype.len();
        for (position, (value, &expected)) in self.stack[base..].iter().zip(prototype).enumerate() {
            if value.kind() != expected {
                return Err(RuntimeError::ArgumentType {
                    at,
                    name: name.to_string(),
                    position,
                    expected,
                    found: value.kind(),
                });
            }
        }

        let args = self.stack.split_off(base);
        debug!(function = name, args = args.len(), "host call");
        let callback = self.functions.get_mut(name).ok_or_else(not_found)?;
        let flow = callback(args.as_slice());
        self.apply(flow);
        Ok(())
    }

    fn pop_number(&mut self, at: usize, opcode: Opcode) -> Result<i64, RuntimeError> {
        match self.pop(at, opcode)? {
            Value::Number(n) => Ok(n),
            other => Err(type_mismatch(at, opcode, ValueKind::Number, &other)),
        }
    }

    fn pop_bool(&mut self, at: usize, opcode: Opcode) -> Result<bool, RuntimeError> {
        match self.pop(at, opcode)? {
            Value::Bool(b) => Ok(b),
            other => Err(type_mismatch(at, opcode, ValueKind::Bool, &other)),
        }
    }

    fn pop_string(&mut self, at: usize, opcode: Opcode) -> Result<String, RuntimeError> {
        match self.pop(at, opcode)? {
            Value::Str(s) => Ok(s),
            other => Err(type_mismatch(at, opcode, ValueKind::String, &other)),
        }
    }
}

fn type_mismatch(at: usize, opcode: Opcode, expected: ValueKind, found: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        at,
        opcode,
        expected,
        found: found.kind(),
    }
}

/// The embedded operand, checked against the tag its opcode requires.
fn operand(at: usize, instr: &Instruction) -> Result<&Value, RuntimeError> {
    let value = instr.operand.as_ref().ok_or(RuntimeError::MissingOperand {
        at,
        opcode: instr.opcode,
    })?;
    match Instruction::expected_operand(instr.opcode) {
        Some(expected) if value.kind() != expected => Err(RuntimeError::OperandMismatch {
            at,
            opcode: instr.opcode,
            expected,
            found: value.kind(),
        }),
        _ => Ok(value),
    }
}

fn symbol_operand(at: usize, instr: &Instruction) -> Result<&str, RuntimeError> {
    let value = operand(at, instr)?;
    value.as_symbol().ok_or(RuntimeError::OperandMismatch {
        at,
        opcode: instr.opcode,
        expected: ValueKind::Symbol,
        found: value.kind(),
    })
}

fn target_operand(at: usize, instr: &Instruction) -> Result<usize, RuntimeError> {
    let value = operand(at, instr)?;
    let target = value.as_number().ok_or(RuntimeError::OperandMismatch {
        at,
        opcode: instr.opcode,
        expected: ValueKind::Number,
        found: value.kind(),
    })?;
    usize::try_from(target).map_err(|_| RuntimeError::JumpOutOfBounds { at, target })
}
