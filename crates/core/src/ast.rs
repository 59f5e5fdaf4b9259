//! Expression AST for conditional logic.
//!
//! These types are produced by the parser and consumed by the dependency
//! graph, the type inferrer and the logic validator. They live here so those
//! modules can import them without depending on the parser.

use serde::Serialize;
use std::fmt;

// ──────────────────────────────────────────────
// Literals
// ──────────────────────────────────────────────

/// A literal value as written in the expression text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Bool(bool),
    /// Numeric literal -- kept as text to preserve the exact representation.
    Number(String),
    Str(String),
}

// ──────────────────────────────────────────────
// Operators
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::Or | BinaryOp::And)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Neq
                | BinaryOp::Lt
                | BinaryOp::Lte
                | BinaryOp::Gt
                | BinaryOp::Gte
        )
    }
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

/// A parsed expression. `offset` is the character offset of the node's
/// first token (for binary nodes, the operator token).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        value: Literal,
        offset: usize,
    },
    /// Dotted path (`fields.age.value`) or bare name (`isAdult`).
    Variable {
        name: String,
        offset: usize,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        offset: usize,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        offset: usize,
    },
    /// Built-in function call: `name(args...)`
    Call {
        name: String,
        args: Vec<Expr>,
        offset: usize,
    },
}

/// Fully parenthesized rendering; makes grouping visible in diagnostics.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal { value, .. } => match value {
                Literal::Bool(b) => write!(f, "{}", b),
                Literal::Number(n) => write!(f, "{}", n),
                Literal::Str(s) => write!(f, "{:?}", s),
            },
            Expr::Variable { name, .. } => write!(f, "{}", name),
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Not => write!(f, "(not {})", operand),
                UnaryOp::Neg => write!(f, "(-{})", operand),
            },
            Expr::Binary {
                op, left, right, ..
            } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::Call { name, args, .. } => {
                write!(f, "{}(", name)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
        }
    }
}
