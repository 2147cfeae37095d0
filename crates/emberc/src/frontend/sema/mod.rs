//! Semantic analysis
//!
//! A single depth-first walk over the AST. Parents set conditions and
//! target types on a child before analyzing it; the child's facts (value
//! type, escapes) are read back afterwards. The walk builds the typed IR as
//! it goes.

mod decorations;
mod scope;
mod expr;
mod block;
mod stmt;
mod analyzer;

pub use decorations::{Condition, Decoration, DecorationKind, Decorations};
pub use scope::SemanticScope;
pub use expr::analyze_expression;
pub use block::analyze_block;
pub use stmt::analyze_statement;
pub use analyzer::analyze_script;

#[cfg(test)]
pub(crate) fn analyze_source(
    source: &str,
    return_type: crate::types::ScriptType,
) -> crate::common::CompileResult<crate::ir::ScriptIr> {
    let script = crate::frontend::parser::Parser::new(source)?.parse()?;
    let lookup = crate::types::BuiltinLookup::new();
    analyze_script(&script, &lookup, return_type)
}
