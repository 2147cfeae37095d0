//! Statement analysis

use tracing::trace;

use crate::common::{CompileError, CompileResult};
use crate::frontend::ast::{Block, Expr, Stmt, StmtKind};
use crate::ir::{BlockIr, ExprIr, StmtIr, StmtIrKind};
use super::block::analyze_block;
use super::decorations::{Condition, Decoration};
use super::expr::{
    analyze_condition, analyze_expression, analyze_internal, analyze_with_target, attach_cast,
};
use super::scope::SemanticScope;

const ESCAPES: [Condition; 3] = [
    Condition::MethodEscape,
    Condition::LoopEscape,
    Condition::AllEscape,
];

/// Analyze one statement of a block
pub fn analyze_statement(stmt: &Stmt, scope: &mut SemanticScope<'_>) -> CompileResult<StmtIr> {
    let kind = match &stmt.kind {
        StmtKind::Expression(expr) => analyze_expression_statement(stmt, expr, scope)?,
        StmtKind::Declaration { ty, name, init } => {
            let ty = scope.resolve_type(&ty.name, ty.span)?;
            if ty.is_void() {
                return Err(CompileError::semantic(
                    "cannot declare a variable of type [void]",
                    stmt.span,
                ));
            }
            let init = init
                .as_ref()
                .map(|init| analyze_with_target(init, ty.clone(), scope))
                .transpose()?;
            let name = scope.name(*name);
            let local = scope.define_variable(name, ty, false, stmt.span)?;
            StmtIrKind::Declaration { local, init }
        }
        StmtKind::If {
            condition,
            then_block,
            else_block,
        } => analyze_if(stmt, condition, then_block, else_block.as_ref(), scope)?,
        StmtKind::While { condition, body } => {
            let condition = analyze_loop_condition(stmt, condition, "while", scope)?;
            let body_ir = body
                .as_ref()
                .map(|body| analyze_loop_body(stmt, body, "while", scope))
                .transpose()?;
            let continuous = finish_loop(stmt, body.as_ref(), "while", scope)?;
            StmtIrKind::While {
                condition,
                body: body_ir,
                continuous,
            }
        }
        StmtKind::DoWhile { body, condition } => {
            let body_ir = analyze_loop_body(stmt, body, "do while", scope)?;
            let condition = analyze_loop_condition(stmt, condition, "do while", scope)?;
            let continuous = finish_loop(stmt, Some(body), "do while", scope)?;
            StmtIrKind::DoWhile {
                body: body_ir,
                condition,
                continuous,
            }
        }
        StmtKind::For {
            init,
            condition,
            update,
            body,
        } => {
            scope.push_frame();
            let kind = analyze_for(
                stmt,
                init.as_deref(),
                condition.as_ref(),
                update.as_ref(),
                body.as_ref(),
                scope,
            )?;
            scope.pop_frame();
            kind
        }
        StmtKind::Break => {
            if !scope.condition(stmt.id, Condition::InLoop) {
                return Err(CompileError::semantic("break statement outside of a loop", stmt.span));
            }
            scope.set_condition(stmt.id, Condition::AllEscape);
            scope.set_condition(stmt.id, Condition::LoopEscape);
            scope.set_condition(stmt.id, Condition::AnyBreak);
            StmtIrKind::Break
        }
        StmtKind::Continue => {
            if !scope.condition(stmt.id, Condition::InLoop) {
                return Err(CompileError::semantic(
                    "continue statement outside of a loop",
                    stmt.span,
                ));
            }
            if scope.condition(stmt.id, Condition::LastLoop) {
                return Err(CompileError::semantic("extraneous continue statement", stmt.span));
            }
            scope.set_condition(stmt.id, Condition::AllEscape);
            scope.set_condition(stmt.id, Condition::AnyContinue);
            StmtIrKind::Continue
        }
        StmtKind::Return(value) => {
            let return_type = scope.return_type().clone();
            let value = match value {
                None if !return_type.is_void() => {
                    return Err(CompileError::invalid_cast("void", return_type.name(), stmt.span));
                }
                None => None,
                Some(value) if return_type.is_void() => {
                    return Err(CompileError::semantic(
                        "cannot return a value from a script of type [void]",
                        value.span,
                    ));
                }
                Some(value) => Some(analyze_internal(value, return_type, scope)?),
            };
            set_escapes(stmt, scope);
            StmtIrKind::Return(value)
        }
        StmtKind::Throw(value) => {
            let exception = scope.resolve_type("Exception", stmt.span)?;
            let value = analyze_with_target(value, exception, scope)?;
            set_escapes(stmt, scope);
            StmtIrKind::Throw(value)
        }
    };

    Ok(StmtIr::new(kind, stmt.span))
}

fn set_escapes(stmt: &Stmt, scope: &mut SemanticScope<'_>) {
    for condition in ESCAPES {
        scope.set_condition(stmt.id, condition);
    }
}

/// An expression statement. The last one of a script that returns a value
/// becomes the script's return.
fn analyze_expression_statement(
    stmt: &Stmt,
    expr: &Expr,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<StmtIrKind> {
    let return_type = scope.return_type().clone();
    let returns_value =
        scope.condition(stmt.id, Condition::LastSource) && !return_type.is_void();
    if returns_value {
        scope.set_condition(expr.id, Condition::Read);
    }

    let ir = analyze_expression(expr, scope)?;
    let implicit_return = returns_value && !ir.ty.is_void();

    if !implicit_return && !expr.is_statement() {
        return Err(CompileError::semantic(
            "not a statement: result not used",
            expr.span,
        ));
    }
    if !implicit_return {
        return Ok(StmtIrKind::Expression(ir));
    }

    trace!(node = %stmt.id, "last expression becomes the script result");
    scope.set(expr.id, Decoration::TargetType(return_type))?;
    scope.set_condition(expr.id, Condition::Internal);
    let ir = attach_cast(expr, ir, scope)?;
    set_escapes(stmt, scope);
    Ok(StmtIrKind::Return(Some(ir)))
}

fn analyze_if(
    stmt: &Stmt,
    condition: &Expr,
    then_block: &Block,
    else_block: Option<&Block>,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<StmtIrKind> {
    let condition_ir = analyze_condition(condition, scope)?;
    if condition.constant_bool().is_some() {
        return Err(CompileError::semantic("extraneous if statement", condition.span));
    }

    for block in std::iter::once(then_block).chain(else_block) {
        for inherited in [Condition::InLoop, Condition::LastSource, Condition::LastLoop] {
            scope.replicate_condition(stmt.id, block.id, inherited);
        }
    }

    let then_ir = analyze_block(then_block, scope)?;
    let else_ir = match else_block {
        None => {
            scope.replicate_condition(then_block.id, stmt.id, Condition::AnyBreak);
            scope.replicate_condition(then_block.id, stmt.id, Condition::AnyContinue);
            None
        }
        Some(else_block) => {
            let else_ir = analyze_block(else_block, scope)?;
            for condition in ESCAPES {
                if scope.condition(then_block.id, condition)
                    && scope.condition(else_block.id, condition)
                {
                    scope.set_condition(stmt.id, condition);
                }
            }
            for condition in [Condition::AnyBreak, Condition::AnyContinue] {
                scope.replicate_condition(then_block.id, stmt.id, condition);
                scope.replicate_condition(else_block.id, stmt.id, condition);
            }
            Some(else_ir)
        }
    };

    Ok(StmtIrKind::If {
        condition: condition_ir,
        then_block: then_ir,
        else_block: else_ir,
    })
}

/// Analyze a loop condition; the constant `true` marks the loop continuous
fn analyze_loop_condition(
    stmt: &Stmt,
    condition: &Expr,
    what: &str,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<ExprIr> {
    let ir = analyze_condition(condition, scope)?;
    match condition.constant_bool() {
        Some(false) => Err(CompileError::semantic(
            format!("extraneous {} loop", what),
            condition.span,
        )),
        Some(true) => {
            scope.set_condition(stmt.id, Condition::ContinuousLoop);
            Ok(ir)
        }
        None => Ok(ir),
    }
}

fn analyze_loop_body(
    stmt: &Stmt,
    body: &Block,
    what: &str,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<BlockIr> {
    scope.set_condition(body.id, Condition::BeginLoop);
    scope.set_condition(body.id, Condition::InLoop);
    let ir = analyze_block(body, scope)?;

    if scope.condition(body.id, Condition::LoopEscape)
        && !scope.condition(body.id, Condition::AnyContinue)
    {
        return Err(CompileError::semantic(format!("extraneous {} loop", what), stmt.span));
    }
    Ok(ir)
}

/// Escape facts of a loop whose condition never turns false; returns
/// whether the loop is continuous
fn finish_loop(
    stmt: &Stmt,
    body: Option<&Block>,
    what: &str,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<bool> {
    if !scope.condition(stmt.id, Condition::ContinuousLoop) {
        return Ok(false);
    }

    match body {
        None => Err(CompileError::semantic(
            format!("no paths escape from {} loop", what),
            stmt.span,
        )),
        Some(body) => {
            if !scope.condition(body.id, Condition::AnyBreak) {
                scope.set_condition(stmt.id, Condition::MethodEscape);
                scope.set_condition(stmt.id, Condition::AllEscape);
            }
            Ok(true)
        }
    }
}

fn analyze_for(
    stmt: &Stmt,
    init: Option<&Stmt>,
    condition: Option<&Expr>,
    update: Option<&Expr>,
    body: Option<&Block>,
    scope: &mut SemanticScope<'_>,
) -> CompileResult<StmtIrKind> {
    let init = init
        .map(|init| analyze_statement(init, scope).map(Box::new))
        .transpose()?;

    let condition = match condition {
        Some(condition) => Some(analyze_loop_condition(stmt, condition, "for", scope)?),
        None => {
            scope.set_condition(stmt.id, Condition::ContinuousLoop);
            None
        }
    };

    let update = match update {
        Some(update) if !update.is_statement() => {
            return Err(CompileError::semantic(
                "not a statement: for loop update",
                update.span,
            ));
        }
        Some(update) => Some(analyze_expression(update, scope)?),
        None => None,
    };

    let body_ir = body
        .map(|body| analyze_loop_body(stmt, body, "for", scope))
        .transpose()?;
    let continuous = finish_loop(stmt, body, "for", scope)?;

    Ok(StmtIrKind::For {
        init,
        condition,
        update,
        body: body_ir,
        continuous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::sema::analyze_source;
    use crate::ir::ExprIrKind;
    use crate::common::Span;
    use crate::frontend::parser::Parser;
    use crate::types::{BuiltinLookup, CastKind, ScriptType};
    use pretty_assertions::assert_eq;

    fn semantic_message(err: CompileError) -> String {
        match err {
            CompileError::Semantic { message, .. } => message,
            other => panic!("expected semantic error, got {:?}", other),
        }
    }

    #[test]
    fn test_last_expression_is_returned() {
        let ir = analyze_source("1 + 2", ScriptType::Def).unwrap();
        assert!(ir.body.all_escape);
        match &ir.body.statements[0].kind {
            StmtIrKind::Return(Some(value)) => {
                assert_eq!(value.cast_plan().map(|p| p.kind), Some(CastKind::ToDef));
            }
            other => panic!("expected implicit return, got {:?}", other),
        }
    }

    #[test]
    fn test_not_a_statement() {
        let err = analyze_source("1 + 2", ScriptType::Void).unwrap_err();
        assert!(semantic_message(err).starts_with("not a statement"));

        let err = analyze_source("1; 2", ScriptType::Def).unwrap_err();
        assert!(semantic_message(err).starts_with("not a statement"));
    }

    #[test]
    fn test_declarations() {
        let ir = analyze_source("long x = 1; x", ScriptType::long()).unwrap();
        match &ir.body.statements[0].kind {
            StmtIrKind::Declaration { local, init: Some(init) } => {
                assert_eq!(local.ty, ScriptType::long());
                assert_eq!(init.cast_plan().map(|p| p.kind), Some(CastKind::Widen));
            }
            other => panic!("expected declaration, got {:?}", other),
        }

        let err = analyze_source("int x = x;", ScriptType::Void).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedSymbol { ref name, .. } if name == "x"));

        let err = analyze_source("int x = 1; int x = 2;", ScriptType::Void).unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));

        let err = analyze_source("void x;", ScriptType::Void).unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn test_constant_conditions() {
        let err = analyze_source("if (true) { return 1; }", ScriptType::Def).unwrap_err();
        assert_eq!(semantic_message(err), "extraneous if statement");

        let err = analyze_source("int i = 0; while (false) { i += 1; }", ScriptType::Void).unwrap_err();
        assert_eq!(semantic_message(err), "extraneous while loop");
    }

    #[test]
    fn test_infinite_loop_escapes() {
        let ir = analyze_source("while (true) { int i = 0; }", ScriptType::int()).unwrap();
        assert!(ir.body.all_escape);
        assert_eq!(ir.body.statements.len(), 1);
        assert!(matches!(
            ir.body.statements[0].kind,
            StmtIrKind::While { continuous: true, .. }
        ));

        let ir = analyze_source("for (;;) { int i = 0; }", ScriptType::int()).unwrap();
        assert!(ir.body.all_escape);

        let err = analyze_source("while (true);", ScriptType::Void).unwrap_err();
        assert_eq!(semantic_message(err), "no paths escape from while loop");
    }

    #[test]
    fn test_break_ends_infinite_loop() {
        let source = "int i = 0; while (true) { if (i > 3) { break; } i += 1; } i";
        let ir = analyze_source(source, ScriptType::int()).unwrap();
        assert_eq!(ir.body.statements.len(), 3);
        assert!(matches!(ir.body.statements[2].kind, StmtIrKind::Return(Some(_))));
    }

    #[test]
    fn test_jumps_outside_loops() {
        let err = analyze_source("break;", ScriptType::Void).unwrap_err();
        assert_eq!(semantic_message(err), "break statement outside of a loop");

        let err = analyze_source("continue;", ScriptType::Void).unwrap_err();
        assert_eq!(semantic_message(err), "continue statement outside of a loop");
    }

    #[test]
    fn test_extraneous_continue() {
        let err = analyze_source("boolean x = true; while (x) { continue; }", ScriptType::Void)
            .unwrap_err();
        assert_eq!(semantic_message(err), "extraneous continue statement");

        let source = "boolean x = true; while (x) { if (x) { continue; } x = false; }";
        assert!(analyze_source(source, ScriptType::Void).is_ok());
    }

    #[test]
    fn test_loop_that_always_leaves() {
        let err = analyze_source("boolean x = true; while (x) { return 1; }", ScriptType::Def)
            .unwrap_err();
        assert_eq!(semantic_message(err), "extraneous while loop");
    }

    #[test]
    fn test_for_and_do_while() {
        let source = "int s = 0; for (int i = 0; i < 10; i += 1) { s += i; } s";
        let ir = analyze_source(source, ScriptType::int()).unwrap();
        assert_eq!(ir.locals.len(), 2);
        assert!(matches!(ir.body.statements[1].kind, StmtIrKind::For { continuous: false, .. }));

        let source = "int i = 0; do { i += 1; } while (i < 3); i";
        let ir = analyze_source(source, ScriptType::int()).unwrap();
        assert!(matches!(ir.body.statements[1].kind, StmtIrKind::DoWhile { .. }));

        let err = analyze_source("for (int i = 0; i < 3; i + 1) { int x = i; }", ScriptType::Void)
            .unwrap_err();
        assert!(semantic_message(err).starts_with("not a statement"));
    }

    #[test]
    fn test_for_variable_is_scoped_to_loop() {
        let source = "for (int i = 0; i < 3; i += 1) { int x = i; } i";
        let err = analyze_source(source, ScriptType::int()).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedSymbol { ref name, .. } if name == "i"));
    }

    #[test]
    fn test_returns() {
        let err = analyze_source("return;", ScriptType::int()).unwrap_err();
        assert!(matches!(err, CompileError::InvalidCast { ref from, .. } if from == "void"));

        let err = analyze_source("return 1;", ScriptType::Void).unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));

        let ir = analyze_source("return 1.5;", ScriptType::int()).unwrap();
        match &ir.body.statements[0].kind {
            StmtIrKind::Return(Some(value)) => {
                let plan = value.cast_plan().expect("internal narrowing");
                assert_eq!(plan.kind, CastKind::Narrow);
                assert!(!plan.explicit);
            }
            other => panic!("expected return, got {:?}", other),
        }
    }

    #[test]
    fn test_throw() {
        let ir = analyze_source("throw new IllegalArgumentException('bad');", ScriptType::Def)
            .unwrap();
        assert!(ir.body.all_escape);
        assert_eq!(ir.body.statements.len(), 1);
        match &ir.body.statements[0].kind {
            StmtIrKind::Throw(value) => {
                assert_eq!(value.cast_plan().map(|p| p.kind), Some(CastKind::Upcast));
                assert!(matches!(value.kind, ExprIrKind::Cast(_)));
            }
            other => panic!("expected throw, got {:?}", other),
        }

        let err = analyze_source("throw 'bad';", ScriptType::Def).unwrap_err();
        assert!(matches!(err, CompileError::InvalidCast { .. }));
    }

    #[test]
    fn test_continuous_loop_condition() {
        let script = Parser::new("for (;;) { if (c) { break; } c = false; } while (c) { c = false; }")
            .unwrap()
            .parse()
            .unwrap();
        let lookup = BuiltinLookup::new();
        let mut scope = SemanticScope::new(&lookup, &script.names, ScriptType::Void);
        scope
            .define_variable("c", ScriptType::boolean(), false, Span::default())
            .unwrap();

        let (endless, bounded) = (&script.body.statements[0], &script.body.statements[1]);
        let ir = analyze_statement(endless, &mut scope).unwrap();
        assert!(matches!(ir.kind, StmtIrKind::For { continuous: true, .. }));
        assert!(scope.condition(endless.id, Condition::ContinuousLoop));
        assert!(!scope.condition(endless.id, Condition::AllEscape));

        let ir = analyze_statement(bounded, &mut scope).unwrap();
        assert!(matches!(ir.kind, StmtIrKind::While { continuous: false, .. }));
        assert!(!scope.condition(bounded.id, Condition::ContinuousLoop));
    }
}
