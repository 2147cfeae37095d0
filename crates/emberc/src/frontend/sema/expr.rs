//! Expression analysis
//!
//! Every expression goes through [`analyze_expression`]: the variant
//! analyzer decorates the node with its value type (or marks it as naming a
//! type), then the shared checks run and the conversion to the node's
//! target type, if the parent asked for one, is attached.

use tracing::trace;

use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::ast::{BinaryOp, CompareOp, Expr, ExprKind, UnaryOp};
use crate::ir::{AssignTarget, CompoundIr, Constant, ExprIr, ExprIrKind};
use crate::types::{
    binary_numeric_promotion, conditional_promotion, integral_promotion, resolve_cast,
    unary_numeric_promotion, MethodSig, ScriptType,
};
use super::decorations::{Condition, Decoration, DecorationKind};
use super::scope::SemanticScope;

const STRING: &str = "String";

/// Analyze `expr` as a value and convert it to its target type, if any
pub fn analyze_expression(expr: &Expr, scope: &mut SemanticScope<'_>) -> CompileResult<ExprIr> {
    let ir = analyze_variant(expr, scope)?;
    finish(expr, ir, scope)
}

/// The checks shared by every expression used as a value
fn finish(expr: &Expr, ir: Option<ExprIr>, scope: &mut SemanticScope<'_>) -> CompileResult<ExprIr> {
    let decorations = scope.decorations();
    if let Some(partial) = decorations.partial_canonical_type_name(expr.id) {
        return Err(CompileError::unresolved_symbol(partial, expr.span));
    }
    if let Some(ty) = decorations.static_type(expr.id) {
        return Err(CompileError::type_used_as_value(ty.name(), expr.span));
    }
    if !decorations.has(expr.id, DecorationKind::ValueType) {
        return Err(CompileError::NoValue { span: expr.span });
    }
    let ir = ir.ok_or(CompileError::NoValue { span: expr.span })?;
    attach_cast(expr, ir, scope)
}

/// Wrap `ir` in the conversion from the node's value type to its target type
pub(super) fn attach_cast(
    expr: &Expr,
    ir: ExprIr,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<ExprIr> {
    let Some(target) = scope.decorations().target_type(expr.id).cloned() else {
        return Ok(ir);
    };
    let source = scope.decorations().value_type(expr.id)?.clone();
    let explicit = scope.condition(expr.id, Condition::Explicit);
    let internal = scope.condition(expr.id, Condition::Internal);

    match resolve_cast(expr.span, &source, &target, explicit, internal)? {
        Some(plan) => {
            trace!(node = %expr.id, from = %plan.source, to = %plan.target, kind = ?plan.kind, "cast inserted");
            scope.set(expr.id, Decoration::ExpressionCast(plan.clone()))?;
            Ok(ExprIr::cast(plan, ir))
        }
        None => Ok(ir),
    }
}

/// Convert an already analyzed child to `ty`, for operators that only know
/// their operand type after seeing both operands
fn cast_to(
    expr: &Expr,
    ir: ExprIr,
    ty: &ScriptType,
    internal: bool,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<ExprIr> {
    scope.set(expr.id, Decoration::TargetType(ty.clone()))?;
    if internal {
        scope.set_condition(expr.id, Condition::Internal);
    }
    attach_cast(expr, ir, scope)
}

fn analyze_read(expr: &Expr, scope: &mut SemanticScope<'_>) -> CompileResult<ExprIr> {
    scope.set_condition(expr.id, Condition::Read);
    analyze_expression(expr, scope)
}

pub(super) fn analyze_with_target(
    expr: &Expr,
    ty: ScriptType,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<ExprIr> {
    scope.set_condition(expr.id, Condition::Read);
    scope.set(expr.id, Decoration::TargetType(ty))?;
    analyze_expression(expr, scope)
}

/// Analyze a child whose conversion to `ty` is the compiler's own doing
pub(super) fn analyze_internal(
    expr: &Expr,
    ty: ScriptType,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<ExprIr> {
    scope.set_condition(expr.id, Condition::Internal);
    analyze_with_target(expr, ty, scope)
}

pub(super) fn analyze_condition(expr: &Expr, scope: &mut SemanticScope<'_>) -> CompileResult<ExprIr> {
    analyze_with_target(expr, ScriptType::boolean(), scope)
}

fn set_value(scope: &mut SemanticScope<'_>, expr: &Expr, ty: &ScriptType) -> CompileResult<()> {
    scope.set(expr.id, Decoration::ValueType(ty.clone()))
}

/// Decorate `expr` with `ty` and build its IR node
fn produce(
    scope: &mut SemanticScope<'_>,
    expr: &Expr,
    kind: ExprIrKind,
    ty: ScriptType,
) -> CompileResult<Option<ExprIr>> {
    set_value(scope, expr, &ty)?;
    Ok(Some(ExprIr::new(kind, ty, expr.span)))
}

fn operator_error(op: impl std::fmt::Display, lhs: &ScriptType, rhs: &ScriptType, span: Span) -> CompileError {
    CompileError::semantic(
        format!("cannot apply [{}] to types [{}] and [{}]", op, lhs, rhs),
        span,
    )
}

/// Analyze `expr` by kind. Returns `None` when the node names a type or a
/// partial type name instead of producing a value.
fn analyze_variant(expr: &Expr, scope: &mut SemanticScope<'_>) -> CompileResult<Option<ExprIr>> {
    match &expr.kind {
        ExprKind::Null => analyze_null(expr, scope),
        ExprKind::Bool(value) => {
            produce(scope, expr, ExprIrKind::Constant(Constant::Bool(*value)), ScriptType::boolean())
        }
        ExprKind::Int(value) => {
            produce(scope, expr, ExprIrKind::Constant(Constant::Int(*value)), ScriptType::int())
        }
        ExprKind::Long(value) => {
            produce(scope, expr, ExprIrKind::Constant(Constant::Long(*value)), ScriptType::long())
        }
        ExprKind::Float(value) => {
            produce(scope, expr, ExprIrKind::Constant(Constant::Float(*value)), ScriptType::float())
        }
        ExprKind::Double(value) => {
            produce(scope, expr, ExprIrKind::Constant(Constant::Double(*value)), ScriptType::double())
        }
        ExprKind::Str(value) => {
            let ty = scope.resolve_type(STRING, expr.span)?;
            produce(scope, expr, ExprIrKind::Constant(Constant::Str(value.clone())), ty)
        }
        ExprKind::Symbol(ident) => {
            let name = scope.name(*ident);
            analyze_symbol(expr, name, scope)
        }
        ExprKind::Dot { prefix, name } => {
            let name = scope.name(*name);
            analyze_dot(expr, prefix, name, scope)
        }
        ExprKind::Call { prefix, name, args } => {
            let name = scope.name(*name);
            analyze_call(expr, prefix, name, args, scope)
        }
        ExprKind::New { ty, args } => {
            let owner = scope.resolve_type(&ty.name, ty.span)?;
            let constructor = scope.lookup().constructor(&owner, args.len()).ok_or_else(|| {
                CompileError::semantic(
                    format!("constructor [{}/{}] not found", owner, args.len()),
                    expr.span,
                )
            })?;
            let args = analyze_arguments(args, &constructor, scope)?;
            produce(scope, expr, ExprIrKind::NewInstance { constructor, args }, owner)
        }
        ExprKind::Unary { op, operand } => analyze_unary(expr, *op, operand, scope),
        ExprKind::Binary { op, lhs, rhs } => analyze_binary(expr, *op, lhs, rhs, scope),
        ExprKind::Comparison { op, lhs, rhs } => analyze_comparison(expr, *op, lhs, rhs, scope),
        ExprKind::Logical { op, lhs, rhs } => {
            let lhs = analyze_condition(lhs, scope)?;
            let rhs = analyze_condition(rhs, scope)?;
            let kind = ExprIrKind::Logical {
                op: *op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
            produce(scope, expr, kind, ScriptType::boolean())
        }
        ExprKind::Conditional {
            condition,
            then_expr,
            else_expr,
        } => analyze_conditional(expr, condition, then_expr, else_expr, scope),
        ExprKind::Assign {
            target,
            op,
            value,
            postfix,
        } => analyze_assign(expr, target, *op, value, *postfix, scope),
        ExprKind::Cast { ty, expr: child } => {
            let ty = scope.resolve_type(&ty.name, ty.span)?;
            scope.set_condition(child.id, Condition::Explicit);
            let child = analyze_with_target(child, ty.clone(), scope)?;
            set_value(scope, expr, &ty)?;
            Ok(Some(child))
        }
        ExprKind::Instanceof { expr: child, ty } => {
            let checked = scope.resolve_type(&ty.name, ty.span)?;
            let child = analyze_read(child, scope)?;
            let kind = ExprIrKind::Instanceof {
                expr: Box::new(child),
                ty: checked,
            };
            produce(scope, expr, kind, ScriptType::boolean())
        }
    }
}

fn analyze_null(expr: &Expr, scope: &mut SemanticScope<'_>) -> CompileResult<Option<ExprIr>> {
    let ty = match scope.decorations().target_type(expr.id) {
        Some(target) if target.is_primitive() => {
            return Err(CompileError::semantic(
                format!("cannot cast null to a primitive type [{}]", target),
                expr.span,
            ));
        }
        Some(target) if target.is_reference() || target.is_def() => target.clone(),
        _ => scope.object_type(),
    };
    produce(scope, expr, ExprIrKind::Constant(Constant::Null), ty)
}

fn analyze_symbol(
    expr: &Expr,
    name: &str,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<Option<ExprIr>> {
    let write = scope.condition(expr.id, Condition::Write);

    if let Some(local) = scope.lookup_variable(name).cloned() {
        if write && local.read_only {
            return Err(CompileError::semantic(
                format!("variable [{}] is read-only", name),
                expr.span,
            ));
        }
        let ty = local.ty.clone();
        scope.set(expr.id, Decoration::StandardLocal(local.clone()))?;
        return produce(scope, expr, ExprIrKind::Local(local), ty);
    }

    if write {
        return Err(CompileError::semantic(
            format!("invalid assignment: [{}] is not a variable", name),
            expr.span,
        ));
    }

    let lookup = scope.lookup();
    if let Some(ty) = lookup.resolve_type(name) {
        scope.set(expr.id, Decoration::StaticType(ty))?;
    } else if lookup.is_type_prefix(name) {
        scope.set(expr.id, Decoration::PartialCanonicalTypeName(name.to_string()))?;
    } else {
        return Err(CompileError::unresolved_symbol(name, expr.span));
    }
    Ok(None)
}

fn analyze_dot(
    expr: &Expr,
    prefix: &Expr,
    name: &str,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<Option<ExprIr>> {
    let write = scope.condition(expr.id, Condition::Write);
    scope.set_condition(prefix.id, Condition::Read);
    let prefix_ir = analyze_variant(prefix, scope)?;
    let lookup = scope.lookup();

    if let Some(partial) = scope
        .decorations()
        .partial_canonical_type_name(prefix.id)
        .map(str::to_string)
    {
        let qualified = format!("{}.{}", partial, name);
        if let Some(ty) = lookup.resolve_type(&qualified) {
            scope.set(expr.id, Decoration::StaticType(ty))?;
        } else if lookup.is_type_prefix(&qualified) {
            scope.set(expr.id, Decoration::PartialCanonicalTypeName(qualified))?;
        } else {
            return Err(CompileError::unresolved_symbol(qualified, expr.span));
        }
        return Ok(None);
    }

    if let Some(owner) = scope.decorations().static_type(prefix.id).cloned() {
        let field = lookup.static_field(&owner, name).ok_or_else(|| {
            CompileError::semantic(
                format!("static field [{}] not found for type [{}]", name, owner),
                expr.span,
            )
        })?;
        check_writable(write, field.read_only, name, expr.span)?;
        let ty = field.ty.clone();
        return produce(scope, expr, ExprIrKind::Field { receiver: None, field }, ty);
    }

    let receiver = finish(prefix, prefix_ir, scope)?;
    if receiver.ty.is_def() {
        let kind = ExprIrKind::DefField {
            receiver: Box::new(receiver),
            name: name.to_string(),
        };
        return produce(scope, expr, kind, ScriptType::Def);
    }

    let field = lookup.field(&receiver.ty, name).ok_or_else(|| {
        CompileError::semantic(
            format!("field [{}] not found for type [{}]", name, receiver.ty),
            expr.span,
        )
    })?;
    check_writable(write, field.read_only, name, expr.span)?;
    let ty = field.ty.clone();
    let kind = ExprIrKind::Field {
        receiver: Some(Box::new(receiver)),
        field,
    };
    produce(scope, expr, kind, ty)
}

fn check_writable(write: bool, read_only: bool, name: &str, span: Span) -> CompileResult<()> {
    if write && read_only {
        return Err(CompileError::semantic(
            format!("invalid assignment: cannot write to read-only field [{}]", name),
            span,
        ));
    }
    Ok(())
}

fn analyze_call(
    expr: &Expr,
    prefix: &Expr,
    name: &str,
    args: &[Expr],
    scope: &mut SemanticScope<'_>,
) -> CompileResult<Option<ExprIr>> {
    scope.set_condition(prefix.id, Condition::Read);
    let prefix_ir = analyze_variant(prefix, scope)?;
    let lookup = scope.lookup();

    if let Some(owner) = scope.decorations().static_type(prefix.id).cloned() {
        let method = lookup
            .static_method(&owner, name, args.len())
            .ok_or_else(|| method_not_found(&owner, name, args.len(), expr.span))?;
        let args = analyze_arguments(args, &method, scope)?;
        let ty = method.return_type.clone();
        let kind = ExprIrKind::Invoke {
            receiver: None,
            method,
            args,
        };
        return produce(scope, expr, kind, ty);
    }

    let receiver = finish(prefix, prefix_ir, scope)?;
    if receiver.ty.is_def() {
        let args = args
            .iter()
            .map(|arg| analyze_with_target(arg, ScriptType::Def, scope))
            .collect::<CompileResult<Vec<_>>>()?;
        let kind = ExprIrKind::DefInvoke {
            receiver: Box::new(receiver),
            name: name.to_string(),
            args,
        };
        return produce(scope, expr, kind, ScriptType::Def);
    }

    let method = lookup
        .method(&receiver.ty, name, args.len())
        .ok_or_else(|| method_not_found(&receiver.ty, name, args.len(), expr.span))?;
    let args = analyze_arguments(args, &method, scope)?;
    let ty = method.return_type.clone();
    let kind = ExprIrKind::Invoke {
        receiver: Some(Box::new(receiver)),
        method,
        args,
    };
    produce(scope, expr, kind, ty)
}

fn method_not_found(owner: &ScriptType, name: &str, arity: usize, span: Span) -> CompileError {
    CompileError::semantic(
        format!("method [{}, {}/{}] not found", owner, name, arity),
        span,
    )
}

/// Analyze call arguments against the parameter types of `method`
fn analyze_arguments(
    args: &[Expr],
    method: &MethodSig,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<Vec<ExprIr>> {
    args.iter()
        .zip(&method.params)
        .map(|(arg, param)| analyze_with_target(arg, param.clone(), scope))
        .collect()
}

fn analyze_unary(
    expr: &Expr,
    op: UnaryOp,
    operand: &Expr,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<Option<ExprIr>> {
    if op == UnaryOp::Not {
        let operand = analyze_condition(operand, scope)?;
        let kind = ExprIrKind::Unary {
            op,
            operand: Box::new(operand),
        };
        return produce(scope, expr, kind, ScriptType::boolean());
    }

    let operand_ir = analyze_read(operand, scope)?;
    let promoted = match op {
        UnaryOp::BitNot => integral_promotion(&operand_ir.ty, None, false),
        _ => unary_numeric_promotion(&operand_ir.ty),
    }
    .ok_or_else(|| {
        CompileError::semantic(
            format!("cannot apply [{}] to type [{}]", op, operand_ir.ty),
            expr.span,
        )
    })?;

    let operand_ir = cast_to(operand, operand_ir, &promoted, false, scope)?;
    let kind = ExprIrKind::Unary {
        op,
        operand: Box::new(operand_ir),
    };
    produce(scope, expr, kind, promoted)
}

/// Promoted type of a shift and the type its distance is converted to
fn shift_promotion(lhs: &ScriptType, rhs: &ScriptType) -> Option<(ScriptType, ScriptType)> {
    if lhs.is_def() || rhs.is_def() {
        return Some((ScriptType::Def, ScriptType::Def));
    }
    integral_promotion(rhs, None, false)?;
    let promoted = integral_promotion(lhs, None, false)?;
    Some((promoted, ScriptType::int()))
}

fn analyze_binary(
    expr: &Expr,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<Option<ExprIr>> {
    let lhs_ir = analyze_read(lhs, scope)?;
    let rhs_ir = analyze_read(rhs, scope)?;
    let (lhs_ty, rhs_ty) = (lhs_ir.ty.clone(), rhs_ir.ty.clone());

    if op == BinaryOp::Add && (lhs_ty.is_class(STRING) || rhs_ty.is_class(STRING)) {
        let string = if lhs_ty.is_class(STRING) { lhs_ty } else { rhs_ty };
        let kind = ExprIrKind::Concat {
            lhs: Box::new(lhs_ir),
            rhs: Box::new(rhs_ir),
        };
        return produce(scope, expr, kind, string);
    }

    let (promoted, lhs_ir, rhs_ir) = if op.is_shift() {
        let (promoted, distance) = shift_promotion(&lhs_ty, &rhs_ty)
            .ok_or_else(|| operator_error(op, &lhs_ty, &rhs_ty, expr.span))?;
        let lhs_ir = cast_to(lhs, lhs_ir, &promoted, false, scope)?;
        let rhs_ir = cast_to(rhs, rhs_ir, &distance, true, scope)?;
        (promoted, lhs_ir, rhs_ir)
    } else {
        let promoted = if op.is_bitwise() {
            integral_promotion(&lhs_ty, Some(&rhs_ty), true)
        } else {
            binary_numeric_promotion(&lhs_ty, &rhs_ty)
        }
        .ok_or_else(|| operator_error(op, &lhs_ty, &rhs_ty, expr.span))?;
        let lhs_ir = cast_to(lhs, lhs_ir, &promoted, false, scope)?;
        let rhs_ir = cast_to(rhs, rhs_ir, &promoted, false, scope)?;
        (promoted, lhs_ir, rhs_ir)
    };

    let kind = ExprIrKind::Binary {
        op,
        lhs: Box::new(lhs_ir),
        rhs: Box::new(rhs_ir),
    };
    produce(scope, expr, kind, promoted)
}

fn analyze_comparison(
    expr: &Expr,
    op: CompareOp,
    lhs: &Expr,
    rhs: &Expr,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<Option<ExprIr>> {
    let lhs_ir = analyze_read(lhs, scope)?;
    let rhs_ir = analyze_read(rhs, scope)?;
    let (lhs_ty, rhs_ty) = (&lhs_ir.ty, &rhs_ir.ty);

    let promoted = if op.is_equality() {
        if lhs_ty.is_boolean() && rhs_ty.is_boolean() {
            Some(ScriptType::boolean())
        } else if lhs_ty.is_def() || rhs_ty.is_def() {
            Some(ScriptType::Def)
        } else if let Some(numeric) = binary_numeric_promotion(lhs_ty, rhs_ty) {
            Some(numeric)
        } else if lhs_ty.is_reference() && rhs_ty.is_reference() {
            Some(scope.object_type())
        } else {
            None
        }
    } else {
        binary_numeric_promotion(lhs_ty, rhs_ty)
    }
    .ok_or_else(|| operator_error(op, lhs_ty, rhs_ty, expr.span))?;

    let lhs_ir = cast_to(lhs, lhs_ir, &promoted, false, scope)?;
    let rhs_ir = cast_to(rhs, rhs_ir, &promoted, false, scope)?;
    let kind = ExprIrKind::Comparison {
        op,
        operand_type: promoted,
        lhs: Box::new(lhs_ir),
        rhs: Box::new(rhs_ir),
    };
    produce(scope, expr, kind, ScriptType::boolean())
}

fn analyze_conditional(
    expr: &Expr,
    condition: &Expr,
    then_expr: &Expr,
    else_expr: &Expr,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<Option<ExprIr>> {
    let condition = analyze_condition(condition, scope)?;

    let (ty, then_ir, else_ir) = match scope.decorations().target_type(expr.id).cloned() {
        Some(target) => {
            for branch in [then_expr, else_expr] {
                scope.replicate_condition(expr.id, branch.id, Condition::Explicit);
                scope.replicate_condition(expr.id, branch.id, Condition::Internal);
            }
            let then_ir = analyze_with_target(then_expr, target.clone(), scope)?;
            let else_ir = analyze_with_target(else_expr, target.clone(), scope)?;
            (target, then_ir, else_ir)
        }
        None => {
            let then_ir = analyze_read(then_expr, scope)?;
            let else_ir = analyze_read(else_expr, scope)?;
            let promoted = conditional_promotion(&then_ir.ty, &else_ir.ty, &scope.object_type())
                .ok_or_else(|| operator_error("?:", &then_ir.ty, &else_ir.ty, expr.span))?;
            let then_ir = cast_to(then_expr, then_ir, &promoted, false, scope)?;
            let else_ir = cast_to(else_expr, else_ir, &promoted, false, scope)?;
            (promoted, then_ir, else_ir)
        }
    };

    let kind = ExprIrKind::Conditional {
        condition: Box::new(condition),
        then_expr: Box::new(then_ir),
        else_expr: Box::new(else_ir),
    };
    produce(scope, expr, kind, ty)
}

fn into_assign_target(ir: ExprIr, span: Span) -> CompileResult<AssignTarget> {
    match ir.kind {
        ExprIrKind::Local(local) => Ok(AssignTarget::Local(local)),
        ExprIrKind::Field { receiver, field } => Ok(AssignTarget::Field { receiver, field }),
        ExprIrKind::DefField { receiver, name } => Ok(AssignTarget::DefField { receiver, name }),
        _ => Err(CompileError::semantic("invalid assignment target", span)),
    }
}

fn analyze_assign(
    expr: &Expr,
    target: &Expr,
    op: Option<BinaryOp>,
    value: &Expr,
    postfix: bool,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<Option<ExprIr>> {
    let read = scope.condition(expr.id, Condition::Read);

    scope.set_condition(target.id, Condition::Write);
    if op.is_some() {
        scope.set_condition(target.id, Condition::Read);
    }
    let target_ir = analyze_expression(target, scope)?;
    let target_ty = target_ir.ty.clone();
    let assign_target = into_assign_target(target_ir, target.span)?;

    let (compound, value_ir) = match op {
        None => (None, analyze_with_target(value, target_ty.clone(), scope)?),
        Some(op) => {
            let value_ir = analyze_read(value, scope)?;
            let value_ty = value_ir.ty.clone();

            if op == BinaryOp::Add && target_ty.is_class(STRING) {
                let compound = CompoundIr {
                    op,
                    promoted: target_ty.clone(),
                    to_promoted: None,
                    to_target: None,
                    concat: true,
                };
                (Some(compound), value_ir)
            } else {
                let (promoted, value_ir) = if op.is_shift() {
                    let (promoted, distance) = shift_promotion(&target_ty, &value_ty)
                        .ok_or_else(|| operator_error(op, &target_ty, &value_ty, expr.span))?;
                    (promoted, cast_to(value, value_ir, &distance, true, scope)?)
                } else {
                    let promoted = if op.is_bitwise() {
                        integral_promotion(&target_ty, Some(&value_ty), true)
                    } else {
                        binary_numeric_promotion(&target_ty, &value_ty)
                    }
                    .ok_or_else(|| operator_error(op, &target_ty, &value_ty, expr.span))?;
                    let value_ir = cast_to(value, value_ir, &promoted, false, scope)?;
                    (promoted, value_ir)
                };

                let compound = CompoundIr {
                    op,
                    to_promoted: resolve_cast(expr.span, &target_ty, &promoted, false, true)?,
                    to_target: resolve_cast(expr.span, &promoted, &target_ty, false, true)?,
                    promoted,
                    concat: false,
                };
                (Some(compound), value_ir)
            }
        }
    };

    let ty = if read { target_ty } else { ScriptType::Void };
    let kind = ExprIrKind::Assign {
        target: assign_target,
        compound,
        value: Box::new(value_ir),
        read,
        postfix,
    };
    produce(scope, expr, kind, ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::NodeId;
    use crate::frontend::ast::{Interner, Script, StmtKind};
    use crate::frontend::parser::Parser;
    use crate::frontend::sema::analyze_script;
    use crate::ir::{ScriptIr, StmtIrKind};
    use crate::types::{BuiltinLookup, CastKind, Primitive, TypeLookup};
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Script {
        Parser::new(source).unwrap().parse().unwrap()
    }

    fn first_expression(script: &Script) -> &Expr {
        match &script.body.statements[0].kind {
            StmtKind::Expression(expr) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    /// Analyze the script's first expression statement, optionally against
    /// a target type
    fn analyze(source: &str, target: Option<ScriptType>) -> CompileResult<ExprIr> {
        let script = parse(source);
        let lookup = BuiltinLookup::new();
        let mut scope = SemanticScope::new(&lookup, &script.names, ScriptType::Def);
        let expr = first_expression(&script);
        if let Some(target) = target {
            scope.set(expr.id, Decoration::TargetType(target)).unwrap();
        }
        analyze_expression(expr, &mut scope)
    }

    #[test]
    fn test_literal_types() {
        assert_eq!(analyze("1", None).unwrap().ty, ScriptType::int());
        assert_eq!(analyze("1L", None).unwrap().ty, ScriptType::long());
        assert_eq!(analyze("1.5f", None).unwrap().ty, ScriptType::float());
        assert_eq!(analyze("1.5", None).unwrap().ty, ScriptType::double());
        assert_eq!(analyze("true", None).unwrap().ty, ScriptType::boolean());
        assert!(analyze("'text'", None).unwrap().ty.is_class(STRING));
    }

    #[test]
    fn test_implicit_widening_is_attached() {
        let ir = analyze("1", Some(ScriptType::double())).unwrap();
        assert_eq!(ir.ty, ScriptType::double());
        let plan = ir.cast_plan().expect("cast attached");
        assert_eq!(plan.kind, CastKind::Widen);
        assert!(!plan.explicit);
        match &ir.kind {
            ExprIrKind::Cast(cast) => assert_eq!(cast.child.ty, ScriptType::int()),
            other => panic!("expected cast, got {:?}", other),
        }
    }

    #[test]
    fn test_cast_decoration_recorded() {
        let script = parse("2.5");
        let lookup = BuiltinLookup::new();
        let mut scope = SemanticScope::new(&lookup, &script.names, ScriptType::Def);
        let expr = first_expression(&script);
        scope.set(expr.id, Decoration::TargetType(ScriptType::Def)).unwrap();
        analyze_expression(expr, &mut scope).unwrap();

        let decorations = scope.decorations();
        assert_eq!(decorations.value_type(expr.id).unwrap(), &ScriptType::double());
        assert_eq!(
            decorations.expression_cast(expr.id).map(|plan| plan.kind),
            Some(CastKind::ToDef)
        );
    }

    #[test]
    fn test_implicit_narrowing_rejected() {
        let err = analyze("1.5", Some(ScriptType::int())).unwrap_err();
        assert!(matches!(err, CompileError::InvalidCast { .. }));
    }

    #[test]
    fn test_explicit_cast() {
        let ir = analyze("(int) 1.5", None).unwrap();
        assert_eq!(ir.ty, ScriptType::int());
        let plan = ir.cast_plan().expect("explicit cast");
        assert_eq!(plan.kind, CastKind::Narrow);
        assert!(plan.explicit);

        let err = analyze("(int) true", None).unwrap_err();
        assert!(matches!(err, CompileError::InvalidCast { .. }));
    }

    #[test]
    fn test_unresolved_symbol() {
        let err = analyze("missing", None).unwrap_err();
        match err {
            CompileError::UnresolvedSymbol { name, span } => {
                assert_eq!(name, "missing");
                assert_eq!(span, Span::new(0, 7));
            }
            other => panic!("expected unresolved symbol, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_type_name_is_unresolved() {
        let err = analyze("java.util", None).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedSymbol { ref name, .. } if name == "java.util"));

        let err = analyze("java.util.Nope", None).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedSymbol { ref name, .. } if name == "java.util.Nope"));
    }

    #[test]
    fn test_type_used_as_value() {
        let err = analyze("Math", None).unwrap_err();
        assert!(matches!(err, CompileError::TypeUsedAsValue { ref type_name, .. } if type_name == "Math"));

        let err = analyze("java.util.List", None).unwrap_err();
        assert!(matches!(err, CompileError::TypeUsedAsValue { ref type_name, .. } if type_name == "List"));
    }

    #[test]
    fn test_static_members() {
        let ir = analyze("Math.PI", None).unwrap();
        assert_eq!(ir.ty, ScriptType::double());
        assert!(matches!(ir.kind, ExprIrKind::Field { receiver: None, .. }));

        let ir = analyze("Math.max(1, 2)", None).unwrap();
        assert_eq!(ir.ty, ScriptType::double());
        match &ir.kind {
            ExprIrKind::Invoke { receiver: None, args, .. } => {
                assert_eq!(args.len(), 2);
                assert_eq!(args[0].cast_plan().map(|p| p.kind), Some(CastKind::Widen));
            }
            other => panic!("expected static invoke, got {:?}", other),
        }

        assert!(analyze("Math.max(1)", None).is_err());
    }

    #[test]
    fn test_instance_methods() {
        let ir = analyze("'abc'.length()", None).unwrap();
        assert_eq!(ir.ty, ScriptType::int());

        let ir = analyze("'abc'.hashCode()", None).unwrap();
        assert_eq!(ir.ty, ScriptType::int());

        let err = analyze("'abc'.size()", None).unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn test_string_concatenation() {
        let ir = analyze("'a' + 1", None).unwrap();
        assert!(ir.ty.is_class(STRING));
        match &ir.kind {
            ExprIrKind::Concat { rhs, .. } => {
                assert_eq!(rhs.ty, ScriptType::int());
                assert_eq!(rhs.cast_plan(), None);
            }
            other => panic!("expected concat, got {:?}", other),
        }
    }

    #[test]
    fn test_binary_promotion() {
        let ir = analyze("1 + 2L", None).unwrap();
        assert_eq!(ir.ty, ScriptType::long());
        match &ir.kind {
            ExprIrKind::Binary { lhs, rhs, .. } => {
                assert_eq!(lhs.cast_plan().map(|p| p.kind), Some(CastKind::Widen));
                assert_eq!(rhs.cast_plan(), None);
            }
            other => panic!("expected binary, got {:?}", other),
        }

        let err = analyze("1 + true", None).unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn test_shift_distance_is_int() {
        let ir = analyze("1 << 2L", None).unwrap();
        assert_eq!(ir.ty, ScriptType::int());
        match &ir.kind {
            ExprIrKind::Binary { rhs, .. } => {
                let plan = rhs.cast_plan().expect("distance narrowed");
                assert_eq!(plan.kind, CastKind::Narrow);
                assert!(!plan.explicit);
            }
            other => panic!("expected binary, got {:?}", other),
        }
        assert!(analyze("1.5 << 2", None).is_err());
    }

    #[test]
    fn test_bitwise_booleans() {
        assert_eq!(analyze("true & false", None).unwrap().ty, ScriptType::boolean());
        assert_eq!(analyze("1 | 2L", None).unwrap().ty, ScriptType::long());
        assert!(analyze("1 & true", None).is_err());
    }

    #[test]
    fn test_comparisons() {
        let ir = analyze("1 < 2.0", None).unwrap();
        assert_eq!(ir.ty, ScriptType::boolean());
        assert!(matches!(
            ir.kind,
            ExprIrKind::Comparison { ref operand_type, .. } if *operand_type == ScriptType::double()
        ));

        let ir = analyze("'a' == null", None).unwrap();
        assert!(matches!(
            ir.kind,
            ExprIrKind::Comparison { ref operand_type, .. } if operand_type.is_class("Object")
        ));

        assert!(analyze("'a' < 'b'", None).is_err());
        assert!(analyze("true == 1", None).is_err());
    }

    #[test]
    fn test_logical_and_not() {
        assert_eq!(analyze("!true || false", None).unwrap().ty, ScriptType::boolean());
        assert!(matches!(
            analyze("1 && true", None).unwrap_err(),
            CompileError::InvalidCast { .. }
        ));
    }

    #[test]
    fn test_unary_promotion() {
        let ir = analyze("-(byte) 1", None).unwrap();
        assert_eq!(ir.ty, ScriptType::int());
        assert_eq!(analyze("~1L", None).unwrap().ty, ScriptType::long());
        assert!(analyze("~1.5", None).is_err());
        assert!(analyze("-true", None).is_err());
    }

    #[test]
    fn test_conditional_promotion() {
        assert_eq!(analyze("true ? 1 : 2.0", None).unwrap().ty, ScriptType::double());
        assert!(analyze("true ? 'a' : new ArrayList()", None).unwrap().ty.is_class("Object"));
        assert!(analyze("true ? 1 : 'a'", None).is_err());

        let ir = analyze("true ? 1 : 2", Some(ScriptType::long())).unwrap();
        assert_eq!(ir.ty, ScriptType::long());
        match &ir.kind {
            ExprIrKind::Conditional { then_expr, else_expr, .. } => {
                assert_eq!(then_expr.ty, ScriptType::long());
                assert_eq!(else_expr.ty, ScriptType::long());
            }
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_null_takes_target() {
        let string = BuiltinLookup::new().resolve_type(STRING);
        let ir = analyze("null", string.clone()).unwrap();
        assert_eq!(Some(ir.ty), string);
        assert!(analyze("null", Some(ScriptType::int())).is_err());
        assert!(analyze("null", None).unwrap().ty.is_class("Object"));
    }

    #[test]
    fn test_new_instance() {
        let ir = analyze("new IllegalArgumentException('bad')", None).unwrap();
        assert!(ir.ty.is_class("IllegalArgumentException"));
        assert!(analyze("new ArrayList(1, 2)", None).is_err());
        assert!(analyze("new Nope()", None).is_err());
    }

    #[test]
    fn test_instanceof() {
        let ir = analyze("'a' instanceof Object", None).unwrap();
        assert_eq!(ir.ty, ScriptType::boolean());
    }

    #[test]
    fn test_assignment_to_type_fails() {
        let err = analyze("Math = 1", None).unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
        let err = analyze("Math.PI = 3.0", None).unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn test_def_receivers() {
        let script = parse("def x = 1; x.foo(1, 'a')");
        let lookup = BuiltinLookup::new();
        let mut scope = SemanticScope::new(&lookup, &script.names, ScriptType::Def);
        scope
            .define_variable("x", ScriptType::Def, false, Span::default())
            .unwrap();
        let expr = match &script.body.statements[1].kind {
            StmtKind::Expression(expr) => expr,
            other => panic!("expected expression, got {:?}", other),
        };
        let ir = analyze_expression(expr, &mut scope).unwrap();
        assert_eq!(ir.ty, ScriptType::Def);
        match &ir.kind {
            ExprIrKind::DefInvoke { name, args, .. } => {
                assert_eq!(name, "foo");
                assert!(args.iter().all(|arg| arg.ty.is_def()));
            }
            other => panic!("expected dynamic invoke, got {:?}", other),
        }
    }

    #[test]
    fn test_compound_assignment() {
        let script = parse("x += 1.5");
        let lookup = BuiltinLookup::new();
        let mut scope = SemanticScope::new(&lookup, &script.names, ScriptType::Def);
        scope
            .define_variable("x", ScriptType::int(), false, Span::default())
            .unwrap();
        let expr = first_expression(&script);
        let ir = analyze_expression(expr, &mut scope).unwrap();

        assert_eq!(ir.ty, ScriptType::Void);
        match &ir.kind {
            ExprIrKind::Assign { compound: Some(compound), read, .. } => {
                assert!(!read);
                assert_eq!(compound.promoted, ScriptType::double());
                assert_eq!(compound.to_promoted.as_ref().map(|p| p.kind), Some(CastKind::Widen));
                assert_eq!(compound.to_target.as_ref().map(|p| p.kind), Some(CastKind::Narrow));
            }
            other => panic!("expected compound assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_read_only_local() {
        let script = parse("x = 1");
        let lookup = BuiltinLookup::new();
        let mut scope = SemanticScope::new(&lookup, &script.names, ScriptType::Def);
        scope
            .define_variable("x", ScriptType::Primitive(Primitive::Int), true, Span::default())
            .unwrap();
        let err = analyze_expression(first_expression(&script), &mut scope).unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn test_local_symbol_is_decorated() {
        let script = parse("x");
        let lookup = BuiltinLookup::new();
        let mut scope = SemanticScope::new(&lookup, &script.names, ScriptType::Def);
        let local = scope
            .define_variable("x", ScriptType::long(), false, Span::default())
            .unwrap();
        let expr = first_expression(&script);
        let ir = analyze_expression(expr, &mut scope).unwrap();
        assert_eq!(ir.kind, ExprIrKind::Local(local.clone()));
        assert_eq!(scope.decorations().standard_local(expr.id), Some(&local));
        assert_eq!(scope.decorations().value_type(expr.id).unwrap(), &ScriptType::long());
    }

    #[test]
    fn test_missing_value_type_is_no_value() {
        let names = Interner::new();
        let lookup = BuiltinLookup::new();
        let mut scope = SemanticScope::new(&lookup, &names, ScriptType::Def);
        let expr = Expr::new(NodeId(0), ExprKind::Int(1), Span::new(0, 1));

        let err = finish(&expr, None, &mut scope).unwrap_err();
        match err {
            CompileError::NoValue { span } => assert_eq!(span, Span::new(0, 1)),
            other => panic!("expected no value, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_type_name_is_reported_first() {
        let names = Interner::new();
        let lookup = BuiltinLookup::new();
        let mut scope = SemanticScope::new(&lookup, &names, ScriptType::Def);

        let static_only = Expr::new(NodeId(0), ExprKind::Int(1), Span::new(0, 1));
        scope.set(static_only.id, Decoration::StaticType(ScriptType::Def)).unwrap();
        let err = finish(&static_only, None, &mut scope).unwrap_err();
        assert!(matches!(err, CompileError::TypeUsedAsValue { .. }));

        let both = Expr::new(NodeId(1), ExprKind::Int(1), Span::new(2, 3));
        scope.set(both.id, Decoration::StaticType(ScriptType::Def)).unwrap();
        scope
            .set(both.id, Decoration::PartialCanonicalTypeName("a.b".to_string()))
            .unwrap();
        match finish(&both, None, &mut scope).unwrap_err() {
            CompileError::UnresolvedSymbol { name, span } => {
                assert_eq!(name, "a.b");
                assert_eq!(span, Span::new(2, 3));
            }
            other => panic!("expected unresolved symbol, got {:?}", other),
        }
    }

    /// The built-in library plus a `Point` class with a writable `x` and a
    /// read-only `id`
    fn point_lookup() -> BuiltinLookup {
        let mut lookup = BuiltinLookup::new();
        let object = lookup.resolve_type(crate::types::OBJECT).unwrap();
        let point = lookup.register_class("Point", &["geom.Point"], Some(&object));
        lookup.add_constructor(&point, vec![]);
        lookup.add_field(&point, "x", ScriptType::int(), false);
        lookup.add_field(&point, "id", ScriptType::long(), true);
        lookup
    }

    fn analyze_with(lookup: &BuiltinLookup, source: &str) -> CompileResult<ScriptIr> {
        analyze_script(&parse(source), lookup, ScriptType::Def)
    }

    #[test]
    fn test_instance_field_read() {
        let lookup = point_lookup();
        let ir = analyze_with(&lookup, "Point p = new Point(); p.x").unwrap();
        let value = match &ir.body.statements[1].kind {
            StmtIrKind::Return(Some(value)) => value,
            other => panic!("expected implicit return, got {:?}", other),
        };
        assert_eq!(value.cast_plan().map(|p| p.kind), Some(CastKind::ToDef));
        match &value.kind {
            ExprIrKind::Cast(cast) => match &cast.child.kind {
                ExprIrKind::Field { receiver: Some(receiver), field } => {
                    assert_eq!(field.name, "x");
                    assert_eq!(field.ty, ScriptType::int());
                    assert!(matches!(receiver.kind, ExprIrKind::Local(_)));
                }
                other => panic!("expected field read, got {:?}", other),
            },
            other => panic!("expected cast, got {:?}", other),
        }
    }

    #[test]
    fn test_instance_field_write() {
        let lookup = point_lookup();
        let ir = analyze_with(&lookup, "Point p = new Point(); p.x = 3; p.x += 1; p.id").unwrap();
        assert_eq!(ir.body.statements.len(), 4);
        match &ir.body.statements[1].kind {
            StmtIrKind::Expression(ExprIr {
                kind: ExprIrKind::Assign { target: AssignTarget::Field { field, .. }, .. },
                ..
            }) => assert_eq!(field.name, "x"),
            other => panic!("expected field assignment, got {:?}", other),
        }

        let err = analyze_with(&lookup, "Point p = new Point(); p.id = 2L;").unwrap_err();
        match err {
            CompileError::Semantic { message, .. } => assert!(message.contains("read-only field [id]")),
            other => panic!("expected read-only field error, got {:?}", other),
        }

        let err = analyze_with(&lookup, "Point p = new Point(); p.y").unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }
}
