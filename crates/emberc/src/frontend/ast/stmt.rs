//! Statement AST nodes

use super::{Expr, Ident, NodeId, TypeName};
use crate::common::Span;

/// Statement node
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(id: NodeId, kind: StmtKind, span: Span) -> Self {
        Self { id, kind, span }
    }
}

/// Statement kinds
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// Expression statement: expr;
    Expression(Expr),

    /// Local declaration: Type name [= init];
    Declaration {
        ty: TypeName,
        name: Ident,
        init: Option<Expr>,
    },

    /// If statement: if (cond) then [else else]
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },

    /// While loop: while (cond) body; the body is absent for `while (cond);`
    While {
        condition: Expr,
        body: Option<Block>,
    },

    /// Do-while loop: do body while (cond);
    DoWhile {
        body: Block,
        condition: Expr,
    },

    /// For loop: for (init; cond; update) body
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Option<Block>,
    },

    /// Break statement
    Break,

    /// Continue statement
    Continue,

    /// Return statement: return [expr];
    Return(Option<Expr>),

    /// Throw statement: throw expr;
    Throw(Expr),
}

/// An ordered sequence of statements
#[derive(Debug, Clone)]
pub struct Block {
    pub id: NodeId,
    pub statements: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(id: NodeId, statements: Vec<Stmt>, span: Span) -> Self {
        Self { id, statements, span }
    }
}
