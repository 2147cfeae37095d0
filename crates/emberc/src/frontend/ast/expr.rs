//! Expression AST nodes

use std::fmt;

use super::{Ident, NodeId};
use crate::common::Span;

/// Expression node
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind, span: Span) -> Self {
        Self { id, kind, span }
    }

    /// Expressions allowed to stand alone as a statement
    pub fn is_statement(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Assign { .. } | ExprKind::Call { .. } | ExprKind::New { .. }
        )
    }

    /// The value of a boolean literal
    pub fn constant_bool(&self) -> Option<bool> {
        match self.kind {
            ExprKind::Bool(value) => Some(value),
            _ => None,
        }
    }
}

/// Expression kinds
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// null
    Null,

    /// true, false
    Bool(bool),

    /// 42
    Int(i32),

    /// 42L
    Long(i64),

    /// 1.5f
    Float(f32),

    /// 1.5, 1.5d
    Double(f64),

    /// "text" or 'text'
    Str(String),

    /// A bare name: a local variable, a type, or the start of a qualified
    /// type name
    Symbol(Ident),

    /// prefix.name: a field, or the next segment of a qualified type name
    Dot {
        prefix: Box<Expr>,
        name: Ident,
    },

    /// prefix.name(args)
    Call {
        prefix: Box<Expr>,
        name: Ident,
        args: Vec<Expr>,
    },

    /// new Type(args)
    New {
        ty: TypeName,
        args: Vec<Expr>,
    },

    /// -x, !flag
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    /// a + b, x << 2
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// a < b, x == y
    Comparison {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// a && b, a || b
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// cond ? a : b
    Conditional {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },

    /// x = y, x += y, x++, --x
    Assign {
        target: Box<Expr>,
        /// Operator of a compound assignment
        op: Option<BinaryOp>,
        value: Box<Expr>,
        /// x++ / x--: a read yields the value before the update
        postfix: bool,
    },

    /// (Type) expr
    Cast {
        ty: TypeName,
        expr: Box<Expr>,
    },

    /// expr instanceof Type
    Instanceof {
        expr: Box<Expr>,
        ty: TypeName,
    },
}

/// A type as written in the source: `int`, `def`, `java.util.List`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub name: String,
    pub span: Span,
}

impl TypeName {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self { name: name.into(), span }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinaryOp {
    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }

    pub fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn is_equality(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::BitNot => write!(f, "~"),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Rem => write!(f, "%"),
            BinaryOp::Shl => write!(f, "<<"),
            BinaryOp::Shr => write!(f, ">>"),
            BinaryOp::BitAnd => write!(f, "&"),
            BinaryOp::BitOr => write!(f, "|"),
            BinaryOp::BitXor => write!(f, "^"),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Ne => write!(f, "!="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Le => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Ge => write!(f, ">="),
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "&&"),
            LogicalOp::Or => write!(f, "||"),
        }
    }
}
