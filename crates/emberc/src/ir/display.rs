//! Indented text rendering of the IR, used by `--dump-ir`

use std::fmt;

use super::node::*;

impl fmt::Display for ScriptIr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "script -> {}", self.return_type)?;
        for local in &self.locals {
            writeln!(f, "  local {}", local)?;
        }
        write_block(f, &self.body, 1)
    }
}

impl fmt::Display for BlockIr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_block(f, self, 0)
    }
}

impl fmt::Display for ExprIr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self, 0)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Int(n) => write!(f, "{}", n),
            Constant::Long(n) => write!(f, "{}L", n),
            Constant::Float(x) => write!(f, "{}f", x),
            Constant::Double(x) => write!(f, "{}d", x),
            Constant::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl fmt::Display for AssignTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignTarget::Local(local) => write!(f, "local {} @{}", local.name, local.slot),
            AssignTarget::Field { field, .. } => write!(f, "field {}.{}", field.owner, field.name),
            AssignTarget::DefField { name, .. } => write!(f, "def-field {}", name),
        }
    }
}

fn pad(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    write!(f, "{:width$}", "", width = depth * 2)
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &BlockIr, depth: usize) -> fmt::Result {
    pad(f, depth)?;
    writeln!(f, "block{}", if block.all_escape { " [all-escape]" } else { "" })?;
    for stmt in &block.statements {
        write_stmt(f, stmt, depth + 1)?;
    }
    Ok(())
}

fn write_loop_header(f: &mut fmt::Formatter<'_>, name: &str, continuous: bool) -> fmt::Result {
    writeln!(f, "{}{}", name, if continuous { " [continuous]" } else { "" })
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &StmtIr, depth: usize) -> fmt::Result {
    pad(f, depth)?;
    match &stmt.kind {
        StmtIrKind::Expression(expr) => {
            writeln!(f, "expr")?;
            write_expr(f, expr, depth + 1)
        }
        StmtIrKind::Declaration { local, init } => {
            writeln!(f, "declare {}", local)?;
            match init {
                Some(init) => write_expr(f, init, depth + 1),
                None => Ok(()),
            }
        }
        StmtIrKind::If {
            condition,
            then_block,
            else_block,
        } => {
            writeln!(f, "if")?;
            write_expr(f, condition, depth + 1)?;
            write_block(f, then_block, depth + 1)?;
            if let Some(else_block) = else_block {
                pad(f, depth)?;
                writeln!(f, "else")?;
                write_block(f, else_block, depth + 1)?;
            }
            Ok(())
        }
        StmtIrKind::While {
            condition,
            body,
            continuous,
        } => {
            write_loop_header(f, "while", *continuous)?;
            write_expr(f, condition, depth + 1)?;
            match body {
                Some(body) => write_block(f, body, depth + 1),
                None => Ok(()),
            }
        }
        StmtIrKind::DoWhile {
            body,
            condition,
            continuous,
        } => {
            write_loop_header(f, "do", *continuous)?;
            write_block(f, body, depth + 1)?;
            write_expr(f, condition, depth + 1)
        }
        StmtIrKind::For {
            init,
            condition,
            update,
            body,
            continuous,
        } => {
            write_loop_header(f, "for", *continuous)?;
            if let Some(init) = init {
                write_stmt(f, init, depth + 1)?;
            }
            if let Some(condition) = condition {
                write_expr(f, condition, depth + 1)?;
            }
            if let Some(update) = update {
                write_expr(f, update, depth + 1)?;
            }
            match body {
                Some(body) => write_block(f, body, depth + 1),
                None => Ok(()),
            }
        }
        StmtIrKind::Break => writeln!(f, "break"),
        StmtIrKind::Continue => writeln!(f, "continue"),
        StmtIrKind::Return(value) => {
            writeln!(f, "return")?;
            match value {
                Some(value) => write_expr(f, value, depth + 1),
                None => Ok(()),
            }
        }
        StmtIrKind::Throw(value) => {
            writeln!(f, "throw")?;
            write_expr(f, value, depth + 1)
        }
    }
}

fn write_children<'e>(
    f: &mut fmt::Formatter<'_>,
    children: impl IntoIterator<Item = &'e ExprIr>,
    depth: usize,
) -> fmt::Result {
    for child in children {
        write_expr(f, child, depth)?;
    }
    Ok(())
}

fn write_expr(f: &mut fmt::Formatter<'_>, expr: &ExprIr, depth: usize) -> fmt::Result {
    pad(f, depth)?;
    let ty = &expr.ty;
    let next = depth + 1;

    match &expr.kind {
        ExprIrKind::Constant(constant) => writeln!(f, "const {} : {}", constant, ty),
        ExprIrKind::Local(local) => writeln!(f, "local {} @{} : {}", local.name, local.slot, ty),
        ExprIrKind::Field { receiver, field } => {
            writeln!(f, "field {}.{} : {}", field.owner, field.name, ty)?;
            write_children(f, receiver.as_deref(), next)
        }
        ExprIrKind::DefField { receiver, name } => {
            writeln!(f, "def-field {} : {}", name, ty)?;
            write_expr(f, receiver, next)
        }
        ExprIrKind::Invoke {
            receiver,
            method,
            args,
        } => {
            writeln!(f, "invoke {}.{} : {}", method.owner, method.name, ty)?;
            write_children(f, receiver.as_deref(), next)?;
            write_children(f, args, next)
        }
        ExprIrKind::DefInvoke {
            receiver,
            name,
            args,
        } => {
            writeln!(f, "def-invoke {} : {}", name, ty)?;
            write_expr(f, receiver, next)?;
            write_children(f, args, next)
        }
        ExprIrKind::NewInstance { constructor, args } => {
            writeln!(f, "new {} : {}", constructor.owner, ty)?;
            write_children(f, args, next)
        }
        ExprIrKind::Unary { op, operand } => {
            writeln!(f, "unary {} : {}", op, ty)?;
            write_expr(f, operand, next)
        }
        ExprIrKind::Binary { op, lhs, rhs } => {
            writeln!(f, "binary {} : {}", op, ty)?;
            write_expr(f, lhs, next)?;
            write_expr(f, rhs, next)
        }
        ExprIrKind::Concat { lhs, rhs } => {
            writeln!(f, "concat : {}", ty)?;
            write_expr(f, lhs, next)?;
            write_expr(f, rhs, next)
        }
        ExprIrKind::Comparison {
            op,
            operand_type,
            lhs,
            rhs,
        } => {
            writeln!(f, "compare {} ({}) : {}", op, operand_type, ty)?;
            write_expr(f, lhs, next)?;
            write_expr(f, rhs, next)
        }
        ExprIrKind::Logical { op, lhs, rhs } => {
            writeln!(f, "logical {} : {}", op, ty)?;
            write_expr(f, lhs, next)?;
            write_expr(f, rhs, next)
        }
        ExprIrKind::Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            writeln!(f, "conditional : {}", ty)?;
            write_expr(f, condition, next)?;
            write_expr(f, then_expr, next)?;
            write_expr(f, else_expr, next)
        }
        ExprIrKind::Assign {
            target,
            compound,
            value,
            read,
            postfix,
        } => {
            let op = match compound {
                Some(compound) => format!("{}=", compound.op),
                None => "=".to_string(),
            };
            writeln!(
                f,
                "assign {} {}{}{} : {}",
                op,
                target,
                if *read { " [read]" } else { "" },
                if *postfix { " [postfix]" } else { "" },
                ty
            )?;
            match target {
                AssignTarget::Field { receiver, .. } => write_children(f, receiver.as_deref(), next)?,
                AssignTarget::DefField { receiver, .. } => write_expr(f, receiver, next)?,
                AssignTarget::Local(_) => {}
            }
            write_expr(f, value, next)
        }
        ExprIrKind::Cast(cast) => {
            writeln!(
                f,
                "cast {} -> {} ({:?}{})",
                cast.plan.source,
                cast.plan.target,
                cast.plan.kind,
                if cast.plan.explicit { ", explicit" } else { "" }
            )?;
            write_expr(f, &cast.child, next)
        }
        ExprIrKind::Instanceof { expr: operand, ty: checked } => {
            writeln!(f, "instanceof {} : {}", checked, ty)?;
            write_expr(f, operand, next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Span;
    use crate::types::{resolve_cast, ScriptType};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_script_dump() {
        let span = Span::new(0, 1);
        let one = ExprIr::new(ExprIrKind::Constant(Constant::Int(1)), ScriptType::int(), span);
        let plan = resolve_cast(span, &ScriptType::int(), &ScriptType::Def, false, true)
            .unwrap()
            .unwrap();
        let ret = StmtIr::new(StmtIrKind::Return(Some(ExprIr::cast(plan, one))), span);
        let script = ScriptIr {
            body: BlockIr {
                statements: vec![ret],
                all_escape: true,
                span,
            },
            return_type: ScriptType::Def,
            locals: Vec::new(),
        };

        let expected = "\
script -> def
  block [all-escape]
    return
      cast int -> def (ToDef)
        const 1 : int
";
        assert_eq!(script.to_string(), expected);
    }
}
