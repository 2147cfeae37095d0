//! Whole-script analysis

use tracing::debug;

use crate::common::CompileResult;
use crate::frontend::ast::Script;
use crate::ir::{ExprIr, ScriptIr, StmtIr, StmtIrKind};
use crate::types::{ScriptType, TypeLookup};
use super::block::analyze_block;
use super::decorations::Condition;
use super::scope::SemanticScope;

/// Analyze a parsed script whose result has type `return_type`.
///
/// A script that can fall off its end without returning gets an implicit
/// `return` of the return type's default value.
pub fn analyze_script(
    script: &Script,
    lookup: &dyn TypeLookup,
    return_type: ScriptType,
) -> CompileResult<ScriptIr> {
    let mut scope = SemanticScope::new(lookup, &script.names, return_type.clone());
    let body = &script.body;

    scope.set_condition(body.id, Condition::LastSource);
    let mut ir = analyze_block(body, &mut scope)?;

    if !scope.condition(body.id, Condition::MethodEscape) && !return_type.is_void() {
        debug!(return_type = %return_type, "appending implicit default return");
        let value = ExprIr::default_value(&return_type, body.span);
        ir.statements
            .push(StmtIr::new(StmtIrKind::Return(Some(value)), body.span));
        ir.all_escape = true;
    }

    let (_, locals) = scope.into_parts();
    Ok(ScriptIr {
        body: ir,
        return_type,
        locals,
    })
}
