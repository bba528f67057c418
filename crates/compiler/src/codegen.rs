//! Single-pass code generation: script tree → [`Program`].
//!
//! Node entry points are collected in a label table as nodes are emitted.
//! Every instruction that targets a node (link, goto, choice) is emitted with
//! a placeholder operand and recorded in a backreference table keyed by its
//! offset; once all nodes are emitted the table is drained and each
//! placeholder is overwritten with the resolved offset. Jumps internal to a
//! conditional or loop are patched directly, since their targets are known
//! by the time the construct has been emitted.

use std::collections::{BTreeMap, HashMap};

use branchline_common::{Instruction, Opcode, Program, Value};
use tracing::{debug, trace, warn};

use crate::ast::{Block, Expr, Node, Script, Stmt};
use crate::error::CompileError;

/// Operand written into jumps before their target is known.
const PLACEHOLDER: i64 = -1;

/// Compile a script tree into a program.
///
/// Deterministic: the same tree always yields an identical program.
///
/// # Errors
///
/// Returns [`CompileError::UnresolvedSymbol`] if any link, goto or choice
/// names a node that the script does not define.
pub fn compile(script: &Script) -> Result<Program, CompileError> {
    let mut functions = BTreeMap::new();
    for decl in &script.functions {
        if functions.contains_key(&decl.name) {
            warn!(function = %decl.name, "duplicate function declaration; first definition kept");
        } else {
            functions.insert(decl.name.clone(), decl.params.clone());
        }
    }

    let mut codegen = CodeGen::default();
    if script.nodes.is_empty() {
        codegen.emit(Instruction::nullary(Opcode::End));
    }
    for node in &script.nodes {
        codegen.node(node);
    }
    codegen.resolve()?;

    let start = script
        .nodes
        .first()
        .and_then(|node| codegen.labels.get(&node.name).copied())
        .unwrap_or(0);

    debug!(
        nodes = script.nodes.len(),
        instructions = codegen.code.len(),
        start,
        "compiled script"
    );

    Ok(Program {
        start,
        code: codegen.code,
        functions,
    })
}

/// Transient compilation state.
#[derive(Default)]
struct CodeGen {
    /// Accumulated instructions; its length is the cursor.
    code: Vec<Instruction>,
    /// Node name → offset of its `NODE_ENTER`.
    labels: HashMap<String, usize>,
    /// Offset awaiting a patch → node name it targets.
    backrefs: BTreeMap<usize, String>,
    /// Name reported by exit markers, fixed for the node being emitted.
    current: String,
}

impl CodeGen {
    fn cursor(&self) -> usize {
        self.code.len()
    }

    fn emit(&mut self, instr: Instruction) -> usize {
        let at = self.cursor();
        self.code.push(instr);
        at
    }

    /// Emit a jump-like instruction whose target is patched later.
    fn emit_placeholder(&mut self, opcode: Opcode) -> usize {
        self.emit(Instruction::unary(opcode, Value::Number(PLACEHOLDER)))
    }

    /// Emit a jump-like instruction targeting a node by name.
    fn emit_ref(&mut self, opcode: Opcode, target: &str) {
        let at = self.emit_placeholder(opcode);
        self.backrefs.insert(at, target.to_string());
    }

    fn patch(&mut self, at: usize, target: usize) {
        self.code[at].operand = Some(Value::Number(target as i64));
    }

    fn emit_exit(&mut self) {
        let name = self.current.clone();
        self.emit(Instruction::with_symbol(Opcode::NodeExit, name));
    }

    fn node(&mut self, node: &Node) {
        let at = self.cursor();
        if self.labels.contains_key(&node.name) {
            warn!(node = %node.name, at, "duplicate node name; first definition kept");
        } else {
            self.labels.insert(node.name.clone(), at);
        }
        self.current = node.name.clone();

        self.emit(Instruction::with_symbol(Opcode::NodeEnter, node.name.as_str()));
        for block in &node.body {
            self.block(block);
        }
        self.emit_exit();
        // Emitted even when unreachable; pruning happens before codegen.
        self.emit(Instruction::nullary(Opcode::End));
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Paragraph(fragments) => {
                if fragments.is_empty() {
                    return;
                }
                for (i, fragment) in fragments.iter().enumerate() {
                    self.expr(fragment);
                    if i > 0 {
                        self.emit(Instruction::nullary(Opcode::Concat));
                    }
                }
                self.emit(Instruction::nullary(Opcode::ShowLine));
            }
            Block::Link { text, target } => {
                self.emit(Instruction::push_string(text.as_str()));
                self.emit(Instruction::nullary(Opcode::ShowLine));
                self.emit_exit();
                self.emit_ref(Opcode::Jmp, target);
            }
            Block::Options(choices) => {
                for choice in choices {
                    self.emit(Instruction::push_string(choice.text.as_str()));
                    self.emit_ref(Opcode::PushChoice, &choice.target);
                }
                self.emit_exit();
                self.emit(Instruction::nullary(Opcode::ShowChoices));
            }
            Block::Code(stmts) => self.stmts(stmts),
        }
    }

    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Goto(target) => {
                self.emit_exit();
                self.emit_ref(Opcode::Jmp, target);
            }
            Stmt::Assign { name, value } => {
                self.expr(value);
                self.emit(Instruction::with_symbol(Opcode::StoreVar, name.as_str()));
            }
            Stmt::Call { name, args } => {
                for arg in args {
                    self.expr(arg);
                }
                self.emit(Instruction::with_symbol(Opcode::Call, name.as_str()));
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                self.expr(cond);
                let skip_then = self.emit_placeholder(Opcode::Jmpf);
                self.stmts(then);
                if otherwise.is_empty() {
                    let end = self.cursor();
                    self.patch(skip_then, end);
                } else {
                    let skip_otherwise = self.emit_placeholder(Opcode::Jmp);
                    let alternate = self.cursor();
                    self.patch(skip_then, alternate);
                    self.stmts(otherwise);
                    let end = self.cursor();
                    self.patch(skip_otherwise, end);
                }
            }
            Stmt::While { cond, body } => {
                let top = self.cursor();
                self.expr(cond);
                let exit = self.emit_placeholder(Opcode::Jmpf);
                self.stmts(body);
                self.emit(Instruction::jump(Opcode::Jmp, top));
                let end = self.cursor();
                self.patch(exit, end);
            }
            Stmt::Loop(body) => {
                let top = self.cursor();
                self.stmts(body);
                self.emit(Instruction::jump(Opcode::Jmp, top));
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(value) => {
                let instr = match value {
                    Value::Bool(b) => Instruction::push_bool(*b),
                    Value::Number(n) => Instruction::push_number(*n),
                    Value::Str(s) => Instruction::push_string(s.as_str()),
                    Value::Null => Instruction::nullary(Opcode::PushNull),
                    Value::Symbol(name) => Instruction::with_symbol(Opcode::LoadVar, name.as_str()),
                };
                self.emit(instr);
            }
            Expr::Binary { op, lhs, rhs } => {
                self.expr(lhs);
                self.expr(rhs);
                self.emit(Instruction::nullary(op.opcode()));
            }
            Expr::Unary { op, operand } => {
                self.expr(operand);
                self.emit(Instruction::nullary(op.opcode()));
            }
        }
    }

    /// Drain the backreference table into the instruction buffer.
    fn resolve(&mut self) -> Result<(), CompileError> {
        for (at, symbol) in std::mem::take(&mut self.backrefs) {
            let Some(&target) = self.labels.get(&symbol) else {
                return Err(CompileError::UnresolvedSymbol { symbol, at });
            };
            trace!(at, %symbol, target, "backpatch");
            self.patch(at, target);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, UnaryOp};

    fn op(opcode: Opcode) -> Instruction {
        Instruction::nullary(opcode)
    }

    fn sym(opcode: Opcode, name: &str) -> Instruction {
        Instruction::with_symbol(opcode, name)
    }

    fn code_of(stmts: Vec<Stmt>) -> Vec<Instruction> {
        let script = Script::new(vec![Node::new("n", vec![Block::Code(stmts)])]);
        let code = compile(&script).unwrap().code;
        // Strip the NODE_ENTER header and the NODE_EXIT/END trailer.
        code[1..code.len() - 2].to_vec()
    }

    #[test]
    fn empty_script_is_a_single_end() {
        let program = compile(&Script::default()).unwrap();
        assert_eq!(program.code, vec![op(Opcode::End)]);
        assert_eq!(program.start, 0);
        assert!(program.functions.is_empty());
    }

    #[test]
    fn empty_node_is_enter_exit_end() {
        let program = compile(&Script::new(vec![Node::new("hub", vec![])])).unwrap();
        assert_eq!(
            program.code,
            vec![
                sym(Opcode::NodeEnter, "hub"),
                sym(Opcode::NodeExit, "hub"),
                op(Opcode::End)
            ]
        );
    }

    #[test]
    fn paragraph_interleaves_concat() {
        let script = Script::new(vec![Node::new(
            "n",
            vec![Block::Paragraph(vec![
                Expr::text("a"),
                Expr::var("b"),
                Expr::number(3),
            ])],
        )]);
        let code = compile(&script).unwrap().code;
        assert_eq!(
            &code[1..7],
            &[
                Instruction::push_string("a"),
                sym(Opcode::LoadVar, "b"),
                op(Opcode::Concat),
                Instruction::push_number(3),
                op(Opcode::Concat),
                op(Opcode::ShowLine),
            ]
        );
    }

    #[test]
    fn empty_paragraph_emits_nothing() {
        let script = Script::new(vec![Node::new("n", vec![Block::Paragraph(vec![])])]);
        assert_eq!(compile(&script).unwrap().len(), 3);
    }

    #[test]
    fn link_exits_then_jumps_to_target() {
        let script = Script::new(vec![
            Node::new("a", vec![Block::link("Onward", "b")]),
            Node::new("b", vec![]),
        ]);
        let code = compile(&script).unwrap().code;
        assert_eq!(
            &code[..7],
            &[
                sym(Opcode::NodeEnter, "a"),
                Instruction::push_string("Onward"),
                op(Opcode::ShowLine),
                sym(Opcode::NodeExit, "a"),
                Instruction::jump(Opcode::Jmp, 7),
                sym(Opcode::NodeExit, "a"),
                op(Opcode::End),
            ]
        );
        assert_eq!(code[7], sym(Opcode::NodeEnter, "b"));
    }

    #[test]
    fn options_patch_each_destination() {
        let script = Script::new(vec![
            Node::new("a", vec![Block::options([("To b", "b"), ("Again", "a")])]),
            Node::new("b", vec![]),
        ]);
        let code = compile(&script).unwrap().code;
        assert_eq!(
            &code[1..7],
            &[
                Instruction::push_string("To b"),
                Instruction::jump(Opcode::PushChoice, 9),
                Instruction::push_string("Again"),
                Instruction::jump(Opcode::PushChoice, 0),
                sym(Opcode::NodeExit, "a"),
                op(Opcode::ShowChoices),
            ]
        );
    }

    #[test]
    fn unresolved_symbol_fails() {
        let script = Script::new(vec![
            Node::new("a", vec![]),
            Node::new("b", vec![Block::Code(vec![Stmt::goto("nowhere")])]),
            Node::new("c", vec![]),
        ]);
        assert_eq!(
            compile(&script),
            Err(CompileError::UnresolvedSymbol {
                symbol: "nowhere".to_string(),
                at: 5,
            })
        );
    }

    #[test]
    fn exit_after_goto_keeps_node_name() {
        let script = Script::new(vec![
            Node::new(
                "a",
                vec![Block::Code(vec![
                    Stmt::goto("b"),
                    Stmt::assign("x", Expr::number(1)),
                ])],
            ),
            Node::new("b", vec![]),
        ]);
        let code = compile(&script).unwrap().code;
        let exits: Vec<_> = code
            .iter()
            .filter(|i| i.opcode == Opcode::NodeExit)
            .map(|i| i.operand.clone())
            .collect();
        assert_eq!(
            exits,
            vec![
                Some(Value::symbol("a")),
                Some(Value::symbol("a")),
                Some(Value::symbol("b"))
            ]
        );
    }

    #[test]
    fn duplicate_node_keeps_first_label() {
        let script = Script::new(vec![
            Node::new("a", vec![Block::link("loop", "a")]),
            Node::new("a", vec![]),
        ]);
        let code = compile(&script).unwrap().code;
        assert_eq!(code[4], Instruction::jump(Opcode::Jmp, 0));
    }

    #[test]
    fn naked_if_skips_to_after_consequent() {
        let code = code_of(vec![Stmt::If {
            cond: Expr::boolean(true),
            then: vec![Stmt::assign("x", Expr::number(1))],
            otherwise: vec![],
        }]);
        // Offsets are absolute; the node header occupies offset 0.
        assert_eq!(
            code,
            vec![
                Instruction::push_bool(true),
                Instruction::jump(Opcode::Jmpf, 5),
                Instruction::push_number(1),
                sym(Opcode::StoreVar, "x"),
            ]
        );
    }

    #[test]
    fn if_else_jumps_over_alternate() {
        let code = code_of(vec![Stmt::If {
            cond: Expr::var("c"),
            then: vec![Stmt::assign("x", Expr::number(1))],
            otherwise: vec![Stmt::assign("x", Expr::number(2))],
        }]);
        assert_eq!(
            code,
            vec![
                sym(Opcode::LoadVar, "c"),
                Instruction::jump(Opcode::Jmpf, 6),
                Instruction::push_number(1),
                sym(Opcode::StoreVar, "x"),
                Instruction::jump(Opcode::Jmp, 8),
                Instruction::push_number(2),
                sym(Opcode::StoreVar, "x"),
            ]
        );
    }

    #[test]
    fn while_reevaluates_condition() {
        let code = code_of(vec![Stmt::While {
            cond: Expr::binary(BinaryOp::Lt, Expr::var("i"), Expr::number(3)),
            body: vec![Stmt::assign(
                "i",
                Expr::unary(UnaryOp::Inc, Expr::var("i")),
            )],
        }]);
        assert_eq!(
            code,
            vec![
                sym(Opcode::LoadVar, "i"),
                Instruction::push_number(3),
                op(Opcode::Lt),
                Instruction::jump(Opcode::Jmpf, 9),
                sym(Opcode::LoadVar, "i"),
                op(Opcode::Inc),
                sym(Opcode::StoreVar, "i"),
                Instruction::jump(Opcode::Jmp, 1),
            ]
        );
    }

    #[test]
    fn unbounded_loop_jumps_to_own_start() {
        let code = code_of(vec![Stmt::Loop(vec![Stmt::call("tick", vec![])])]);
        assert_eq!(
            code,
            vec![sym(Opcode::Call, "tick"), Instruction::jump(Opcode::Jmp, 1)]
        );
    }

    #[test]
    fn call_pushes_arguments_in_order() {
        let code = code_of(vec![Stmt::call(
            "give",
            vec![Expr::text("sword"), Expr::number(2)],
        )]);
        assert_eq!(
            code,
            vec![
                Instruction::push_string("sword"),
                Instruction::push_number(2),
                sym(Opcode::Call, "give"),
            ]
        );
    }

    #[test]
    fn null_literal_pushes_null() {
        let code = code_of(vec![Stmt::assign("x", Expr::Literal(Value::Null))]);
        assert_eq!(code, vec![op(Opcode::PushNull), sym(Opcode::StoreVar, "x")]);
    }

    #[test]
    fn functions_become_the_program_table() {
        let script = Script::new(vec![]).with_function(
            "give",
            vec![branchline_common::ValueKind::String],
        );
        let program = compile(&script).unwrap();
        assert_eq!(
            program.functions.get("give"),
            Some(&vec![branchline_common::ValueKind::String])
        );
    }

    #[test]
    fn duplicate_function_keeps_first_declaration() {
        use branchline_common::ValueKind;

        let script = Script::new(vec![])
            .with_function("give", vec![ValueKind::Number])
            .with_function("give", vec![ValueKind::String, ValueKind::Bool]);
        let program = compile(&script).unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions.get("give"), Some(&vec![ValueKind::Number]));
    }
}
