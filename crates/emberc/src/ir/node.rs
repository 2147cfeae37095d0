//! Typed IR nodes

use crate::common::Span;
use crate::frontend::ast::{BinaryOp, CompareOp, LogicalOp, UnaryOp};
use crate::types::{CastKind, CastPlan, FieldSig, MethodSig, Primitive, ScriptType};

/// A resolved local variable
#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    pub name: String,
    pub ty: ScriptType,
    /// Position in the script's local table, in declaration order
    pub slot: u32,
    pub read_only: bool,
}

impl std::fmt::Display for Local {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} @{}", self.ty, self.name, self.slot)
    }
}

/// A constant value
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
}

/// An analyzed expression; `ty` is the type of the value it produces
#[derive(Debug, Clone, PartialEq)]
pub struct ExprIr {
    pub kind: ExprIrKind,
    pub ty: ScriptType,
    pub span: Span,
}

impl ExprIr {
    pub fn new(kind: ExprIrKind, ty: ScriptType, span: Span) -> Self {
        Self { kind, ty, span }
    }

    /// Wrap `child` in the conversion described by `plan`
    pub fn cast(plan: CastPlan, child: ExprIr) -> Self {
        let ty = plan.target.clone();
        let span = child.span;
        Self::new(
            ExprIrKind::Cast(CastIr {
                plan,
                child: Box::new(child),
            }),
            ty,
            span,
        )
    }

    /// The value a script returns when it falls off its end.
    ///
    /// Constants only exist for `int` and wider, so the default of a
    /// `byte`, `short` or `char` script is an `int` zero narrowed by an
    /// internal cast.
    pub fn default_value(ty: &ScriptType, span: Span) -> Self {
        let constant = match ty {
            ScriptType::Primitive(Primitive::Boolean) => Constant::Bool(false),
            ScriptType::Primitive(Primitive::Long) => Constant::Long(0),
            ScriptType::Primitive(Primitive::Float) => Constant::Float(0.0),
            ScriptType::Primitive(Primitive::Double) => Constant::Double(0.0),
            ScriptType::Primitive(Primitive::Int) => Constant::Int(0),
            ScriptType::Primitive(_) => {
                let zero = Self::new(ExprIrKind::Constant(Constant::Int(0)), ScriptType::int(), span);
                let plan = CastPlan {
                    source: ScriptType::int(),
                    target: ty.clone(),
                    kind: CastKind::Narrow,
                    explicit: false,
                };
                return Self::cast(plan, zero);
            }
            _ => Constant::Null,
        };
        Self::new(ExprIrKind::Constant(constant), ty.clone(), span)
    }

    /// The plan of the outermost conversion, if this node is one
    pub fn cast_plan(&self) -> Option<&CastPlan> {
        match &self.kind {
            ExprIrKind::Cast(cast) => Some(&cast.plan),
            _ => None,
        }
    }
}

/// A conversion inserted around an analyzed child
#[derive(Debug, Clone, PartialEq)]
pub struct CastIr {
    pub plan: CastPlan,
    pub child: Box<ExprIr>,
}

/// Expression IR kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExprIrKind {
    Constant(Constant),

    /// Read of a local variable
    Local(Local),

    /// Field read; `receiver` is `None` for static fields
    Field {
        receiver: Option<Box<ExprIr>>,
        field: FieldSig,
    },

    /// Field read on a `def` receiver, resolved at run time
    DefField {
        receiver: Box<ExprIr>,
        name: String,
    },

    /// Method call; `receiver` is `None` for static methods
    Invoke {
        receiver: Option<Box<ExprIr>>,
        method: MethodSig,
        args: Vec<ExprIr>,
    },

    /// Method call on a `def` receiver, resolved at run time
    DefInvoke {
        receiver: Box<ExprIr>,
        name: String,
        args: Vec<ExprIr>,
    },

    NewInstance {
        constructor: MethodSig,
        args: Vec<ExprIr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<ExprIr>,
    },

    /// Arithmetic, bitwise or shift operation at the node's type
    Binary {
        op: BinaryOp,
        lhs: Box<ExprIr>,
        rhs: Box<ExprIr>,
    },

    /// String concatenation; operands keep their own types
    Concat {
        lhs: Box<ExprIr>,
        rhs: Box<ExprIr>,
    },

    Comparison {
        op: CompareOp,
        /// Type both operands were promoted to
        operand_type: ScriptType,
        lhs: Box<ExprIr>,
        rhs: Box<ExprIr>,
    },

    Logical {
        op: LogicalOp,
        lhs: Box<ExprIr>,
        rhs: Box<ExprIr>,
    },

    Conditional {
        condition: Box<ExprIr>,
        then_expr: Box<ExprIr>,
        else_expr: Box<ExprIr>,
    },

    Assign {
        target: AssignTarget,
        /// Present for compound assignments
        compound: Option<CompoundIr>,
        value: Box<ExprIr>,
        /// The assigned (or, for postfix updates, previous) value is used
        read: bool,
        postfix: bool,
    },

    Cast(CastIr),

    Instanceof {
        expr: Box<ExprIr>,
        ty: ScriptType,
    },
}

/// The storage an assignment writes to
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Local(Local),
    Field {
        receiver: Option<Box<ExprIr>>,
        field: FieldSig,
    },
    DefField {
        receiver: Box<ExprIr>,
        name: String,
    },
}

/// How a compound assignment combines the old value with the new one.
///
/// The stored value is read, converted to `promoted` (`to_promoted`),
/// combined with the value and converted back (`to_target`).
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundIr {
    pub op: BinaryOp,
    pub promoted: ScriptType,
    pub to_promoted: Option<CastPlan>,
    pub to_target: Option<CastPlan>,
    /// `+=` on a String target
    pub concat: bool,
}

/// An analyzed statement
#[derive(Debug, Clone, PartialEq)]
pub struct StmtIr {
    pub kind: StmtIrKind,
    pub span: Span,
}

impl StmtIr {
    pub fn new(kind: StmtIrKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement IR kinds
#[derive(Debug, Clone, PartialEq)]
pub enum StmtIrKind {
    Expression(ExprIr),
    Declaration {
        local: Local,
        init: Option<ExprIr>,
    },
    If {
        condition: ExprIr,
        then_block: BlockIr,
        else_block: Option<BlockIr>,
    },
    While {
        condition: ExprIr,
        body: Option<BlockIr>,
        continuous: bool,
    },
    DoWhile {
        body: BlockIr,
        condition: ExprIr,
        continuous: bool,
    },
    For {
        init: Option<Box<StmtIr>>,
        condition: Option<ExprIr>,
        update: Option<ExprIr>,
        body: Option<BlockIr>,
        continuous: bool,
    },
    Break,
    Continue,
    /// Explicit return, or the implicit return of a script's last expression
    Return(Option<ExprIr>),
    Throw(ExprIr),
}

/// An analyzed block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockIr {
    pub statements: Vec<StmtIr>,
    /// Every path through the block leaves it
    pub all_escape: bool,
    pub span: Span,
}

/// The analyzed form of a whole script
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptIr {
    pub body: BlockIr,
    pub return_type: ScriptType,
    /// Every local declared by the script, by slot
    pub locals: Vec<Local>,
}
