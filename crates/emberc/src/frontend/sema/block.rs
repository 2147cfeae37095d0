//! Block analysis and escape propagation

use tracing::debug;

use crate::common::{CompileError, CompileResult};
use crate::frontend::ast::Block;
use crate::ir::BlockIr;
use super::decorations::Condition;
use super::scope::SemanticScope;
use super::stmt::analyze_statement;

/// Analyze the statements of `block` in order.
///
/// Loop and source position conditions flow from the block into its
/// statements before each is analyzed; escape facts flow back out of them
/// afterwards. A statement that follows one that always escapes is
/// unreachable.
pub fn analyze_block(block: &Block, scope: &mut SemanticScope<'_>) -> CompileResult<BlockIr> {
    if block.statements.is_empty() {
        return Err(CompileError::EmptyBlock { span: block.span });
    }
    debug!(node = %block.id, statements = block.statements.len(), "analyzing block");

    let in_loop = scope.condition(block.id, Condition::InLoop);
    let last_loop = scope.condition(block.id, Condition::BeginLoop)
        || scope.condition(block.id, Condition::LastLoop);
    let last_source = scope.condition(block.id, Condition::LastSource);
    let last_index = block.statements.len() - 1;

    scope.push_frame();
    let mut statements = Vec::with_capacity(block.statements.len());

    for (index, stmt) in block.statements.iter().enumerate() {
        let is_last = index == last_index;
        if in_loop {
            scope.set_condition(stmt.id, Condition::InLoop);
        }
        if is_last && last_loop {
            scope.set_condition(stmt.id, Condition::LastLoop);
        }
        if is_last && last_source {
            scope.set_condition(stmt.id, Condition::LastSource);
        }

        statements.push(analyze_statement(stmt, scope)?);

        if !is_last && scope.condition(stmt.id, Condition::AllEscape) {
            let next = &block.statements[index + 1];
            return Err(CompileError::UnreachableCode { span: next.span });
        }
        if is_last {
            for condition in [Condition::MethodEscape, Condition::LoopEscape, Condition::AllEscape] {
                scope.replicate_condition(stmt.id, block.id, condition);
            }
        }
        scope.replicate_condition(stmt.id, block.id, Condition::AnyBreak);
        scope.replicate_condition(stmt.id, block.id, Condition::AnyContinue);
    }

    scope.pop_frame();

    let all_escape = scope.condition(block.id, Condition::AllEscape);
    debug!(node = %block.id, all_escape, "block analyzed");
    Ok(BlockIr {
        statements,
        all_escape,
        span: block.span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Span;
    use crate::frontend::ast::{Script, StmtKind};
    use crate::frontend::parser::Parser;
    use crate::frontend::sema::analyze_source;
    use crate::ir::StmtIrKind;
    use crate::types::{BuiltinLookup, ScriptType};
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Script {
        Parser::new(source).unwrap().parse().unwrap()
    }

    fn loop_body(script: &Script) -> &Block {
        match &script.body.statements[0].kind {
            StmtKind::While { body: Some(body), .. } => body,
            other => panic!("expected while loop with a body, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_block() {
        let err = analyze_source("boolean x = true; if (x) {}", ScriptType::Def).unwrap_err();
        assert!(matches!(err, CompileError::EmptyBlock { .. }));

        let err = analyze_source("", ScriptType::Def).unwrap_err();
        assert!(matches!(err, CompileError::EmptyBlock { .. }));
    }

    #[test]
    fn test_unreachable_code_points_at_next_statement() {
        let err = analyze_source("return 1; int y = 2;", ScriptType::Def).unwrap_err();
        match err {
            CompileError::UnreachableCode { span } => assert_eq!(span.start, 10),
            other => panic!("expected unreachable code, got {:?}", other),
        }
    }

    #[test]
    fn test_escape_is_taken_from_last_statement() {
        let ir = analyze_source("int x = 1; return x;", ScriptType::int()).unwrap();
        assert!(ir.body.all_escape);
        assert_eq!(ir.body.statements.len(), 2);

        let ir = analyze_source("int x = 1; x = 2", ScriptType::Void).unwrap();
        assert!(!ir.body.all_escape);
    }

    #[test]
    fn test_if_else_both_escaping() {
        let source = "boolean x = true; if (x) { return 1; } else { return 2; }";
        let ir = analyze_source(source, ScriptType::Def).unwrap();
        assert!(ir.body.all_escape);
        assert_eq!(ir.body.statements.len(), 2);
        match &ir.body.statements[1].kind {
            StmtIrKind::If { then_block, else_block: Some(else_block), .. } => {
                assert!(then_block.all_escape);
                assert!(else_block.all_escape);
            }
            other => panic!("expected if/else, got {:?}", other),
        }

        let err = analyze_source(
            "boolean x = true; if (x) { return 1; } else { return 2; } int y = 0;",
            ScriptType::Def,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UnreachableCode { .. }));
    }

    #[test]
    fn test_if_without_else_does_not_escape() {
        let source = "boolean x = true; if (x) { return 1; } 2";
        let ir = analyze_source(source, ScriptType::Def).unwrap();
        assert_eq!(ir.body.statements.len(), 3);
        assert!(matches!(ir.body.statements[2].kind, StmtIrKind::Return(Some(_))));
    }

    #[test]
    fn test_block_scoping() {
        let source = "int x = 1; if (x > 0) { int y = 2; } int y = 3; y";
        let ir = analyze_source(source, ScriptType::int()).unwrap();
        let names: Vec<_> = ir.locals.iter().map(|l| (l.name.as_str(), l.slot)).collect();
        assert_eq!(names, vec![("x", 0), ("y", 1), ("y", 2)]);
        assert_eq!(ir.body.span.start, 0);
        assert_ne!(ir.body.span, Span::default());
    }

    #[test]
    fn test_break_in_earlier_statement_marks_block() {
        let script = parse("while (c) { if (c) { break; } c = false; }");
        let body = loop_body(&script);
        let lookup = BuiltinLookup::new();
        let mut scope = SemanticScope::new(&lookup, &script.names, ScriptType::Def);
        scope
            .define_variable("c", ScriptType::boolean(), false, Span::default())
            .unwrap();
        scope.set_condition(body.id, Condition::BeginLoop);
        scope.set_condition(body.id, Condition::InLoop);

        let ir = analyze_block(body, &mut scope).unwrap();
        assert!(!ir.all_escape);
        assert!(scope.condition(body.id, Condition::AnyBreak));
        assert!(!scope.condition(body.id, Condition::AnyContinue));
        assert!(!scope.condition(body.id, Condition::LoopEscape));

        let (first, last) = (&body.statements[0], &body.statements[1]);
        assert!(scope.condition(first.id, Condition::InLoop));
        assert!(scope.condition(last.id, Condition::InLoop));
        assert!(!scope.condition(first.id, Condition::LastLoop));
        assert!(scope.condition(last.id, Condition::LastLoop));
    }

    #[test]
    fn test_escapes_copied_from_terminal_statement() {
        let script = parse("int y = 1; return y;");
        let lookup = BuiltinLookup::new();
        let mut scope = SemanticScope::new(&lookup, &script.names, ScriptType::int());
        analyze_block(&script.body, &mut scope).unwrap();
        for condition in [Condition::MethodEscape, Condition::LoopEscape, Condition::AllEscape] {
            assert!(scope.condition(script.body.id, condition), "{:?}", condition);
        }

        let script = parse("while (c) { c = false; break; }");
        let body = loop_body(&script);
        let mut scope = SemanticScope::new(&lookup, &script.names, ScriptType::Def);
        scope
            .define_variable("c", ScriptType::boolean(), false, Span::default())
            .unwrap();
        scope.set_condition(body.id, Condition::InLoop);
        analyze_block(body, &mut scope).unwrap();
        assert!(scope.condition(body.id, Condition::LoopEscape));
        assert!(scope.condition(body.id, Condition::AllEscape));
        assert!(scope.condition(body.id, Condition::AnyBreak));
        assert!(!scope.condition(body.id, Condition::MethodEscape));
    }

    #[test]
    fn test_single_statement_of_loop_body_is_last_loop() {
        let script = parse("while (c) { c = false; }");
        let body = loop_body(&script);
        let lookup = BuiltinLookup::new();
        let mut scope = SemanticScope::new(&lookup, &script.names, ScriptType::Def);
        scope
            .define_variable("c", ScriptType::boolean(), false, Span::default())
            .unwrap();
        scope.set_condition(body.id, Condition::BeginLoop);
        analyze_block(body, &mut scope).unwrap();
        assert!(scope.condition(body.statements[0].id, Condition::LastLoop));
        assert!(!scope.condition(body.statements[0].id, Condition::InLoop));

        let script = parse("while (c) { continue; }");
        let body = loop_body(&script);
        let mut scope = SemanticScope::new(&lookup, &script.names, ScriptType::Def);
        scope.set_condition(body.id, Condition::BeginLoop);
        scope.set_condition(body.id, Condition::InLoop);
        match analyze_block(body, &mut scope).unwrap_err() {
            CompileError::Semantic { message, .. } => {
                assert_eq!(message, "extraneous continue statement");
            }
            other => panic!("expected extraneous continue, got {:?}", other),
        }
    }
}
