//! Script tree consumed by the code generator.
//!
//! This is the shape the external parser and semantic passes hand over:
//! an ordered list of named nodes, each with an ordered body of blocks.
//! Every type deserializes from JSON so trees can come from other tools.

use branchline_common::{Opcode, Value, ValueKind};
use serde::{Deserialize, Serialize};

/// A whole dialogue script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Host functions the script may call.
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
    /// Nodes in source order. The first node is the entry point.
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// A host function prototype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ValueKind>,
}

/// A named, independently addressable unit of dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub body: Vec<Block>,
}

/// A body element of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    /// A line of dialogue assembled from text and expression fragments.
    Paragraph(Vec<Expr>),
    /// A single-destination prompt: show `text`, then go to `target`.
    Link { text: String, target: String },
    /// A multiple-choice prompt.
    Options(Vec<Choice>),
    /// Logic with no direct narrative output.
    Code(Vec<Stmt>),
}

/// One alternative of an option group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// Leave the current node and continue at the named node.
    Goto(String),
    Assign {
        name: String,
        value: Expr,
    },
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    If {
        cond: Expr,
        #[serde(default)]
        then: Vec<Stmt>,
        #[serde(default)]
        otherwise: Vec<Stmt>,
    },
    /// Loop while `cond` holds, checked before every iteration.
    While {
        cond: Expr,
        #[serde(default)]
        body: Vec<Stmt>,
    },
    /// Loop forever; only a goto inside the body leaves it.
    Loop(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// A literal value. A `Symbol` literal is a variable reference.
    Literal(Value),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    And,
    Or,
    Concat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
    Inc,
    Dec,
}

impl BinaryOp {
    /// The instruction this operator compiles to.
    pub fn opcode(self) -> Opcode {
        match self {
            BinaryOp::Add => Opcode::Add,
            BinaryOp::Sub => Opcode::Sub,
            BinaryOp::Mul => Opcode::Mul,
            BinaryOp::Div => Opcode::Div,
            BinaryOp::Mod => Opcode::Mod,
            BinaryOp::Eq => Opcode::Eq,
            BinaryOp::Neq => Opcode::Neq,
            BinaryOp::Gt => Opcode::Gt,
            BinaryOp::Gte => Opcode::Gte,
            BinaryOp::Lt => Opcode::Lt,
            BinaryOp::Lte => Opcode::Lte,
            BinaryOp::And => Opcode::And,
            BinaryOp::Or => Opcode::Or,
            BinaryOp::Concat => Opcode::Concat,
        }
    }
}

impl UnaryOp {
    /// The instruction this operator compiles to.
    pub fn opcode(self) -> Opcode {
        match self {
            UnaryOp::Neg => Opcode::Neg,
            UnaryOp::Not => Opcode::Not,
            UnaryOp::Inc => Opcode::Inc,
            UnaryOp::Dec => Opcode::Dec,
        }
    }
}

impl Script {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            functions: Vec::new(),
            nodes,
        }
    }

    /// Builder-style host function declaration.
    pub fn with_function(mut self, name: impl Into<String>, params: Vec<ValueKind>) -> Self {
        self.functions.push(FunctionDecl {
            name: name.into(),
            params,
        });
        self
    }
}

impl Node {
    pub fn new(name: impl Into<String>, body: Vec<Block>) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

impl Block {
    pub fn link(text: impl Into<String>, target: impl Into<String>) -> Self {
        Block::Link {
            text: text.into(),
            target: target.into(),
        }
    }

    /// An option group from `(text, target)` pairs.
    pub fn options<T: Into<String>, U: Into<String>>(choices: impl IntoIterator<Item = (T, U)>) -> Self {
        Block::Options(
            choices
                .into_iter()
                .map(|(text, target)| Choice {
                    text: text.into(),
                    target: target.into(),
                })
                .collect(),
        )
    }
}

impl Stmt {
    pub fn goto(target: impl Into<String>) -> Self {
        Stmt::Goto(target.into())
    }

    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        Stmt::Assign {
            name: name.into(),
            value,
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Stmt::Call {
            name: name.into(),
            args,
        }
    }
}

impl Expr {
    pub fn text(s: impl Into<String>) -> Self {
        Expr::Literal(Value::str(s))
    }

    pub fn number(n: i64) -> Self {
        Expr::Literal(Value::Number(n))
    }

    pub fn boolean(b: bool) -> Self {
        Expr::Literal(Value::Bool(b))
    }

    /// A variable reference.
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Literal(Value::symbol(name))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }
}
