//! Script front end
//!
//! The front end is responsible for:
//! 1. Lexing source code into tokens
//! 2. Parsing tokens into an AST
//! 3. Semantic analysis, which produces the typed IR

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod sema;

use std::sync::Arc;

use tracing::{debug, info};

use crate::common::{CompileError, CompileResult, DiagnosticReporter, Span};
use crate::ir::ScriptIr;
use crate::types::TypeLookup;

pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use sema::analyze_script;

/// Configuration options passed to the front end
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    pub dump_tokens: bool,
    pub dump_ast: bool,
    pub dump_ir: bool,
    /// Name of the type the script's result is converted to
    pub return_type: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dump_tokens: false,
            dump_ast: false,
            dump_ir: false,
            return_type: "def".to_string(),
        }
    }
}

/// Compilation context providing access to diagnostics and file info
pub struct CompileContext<'a> {
    pub filename: String,
    pub file_id: usize,
    pub reporter: &'a DiagnosticReporter,
}

impl<'a> CompileContext<'a> {
    pub fn new(filename: String, file_id: usize, reporter: &'a DiagnosticReporter) -> Self {
        Self { filename, file_id, reporter }
    }
}

/// Trait for script front ends
pub trait Frontend: Send + Sync {
    /// The name of this front end
    fn name(&self) -> &'static str;

    /// File extensions this front end handles
    fn extensions(&self) -> &'static [&'static str];

    /// Compile source code to IR: lex -> parse -> analyze
    fn compile(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &FrontendConfig,
    ) -> CompileResult<ScriptIr>;
}

/// The ember script front end, bound to one host type lookup
pub struct ScriptFrontend {
    lookup: Arc<dyn TypeLookup>,
}

impl ScriptFrontend {
    pub fn new(lookup: Arc<dyn TypeLookup>) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &dyn TypeLookup {
        self.lookup.as_ref()
    }
}

impl Frontend for ScriptFrontend {
    fn name(&self) -> &'static str {
        "ember"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".ember"]
    }

    fn compile(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &FrontendConfig,
    ) -> CompileResult<ScriptIr> {
        let report = |e: CompileError| {
            ctx.reporter.report_error(ctx.file_id, &e);
            e
        };

        // Phase 1: Lexing (optional token dump)
        if config.dump_tokens {
            let tokens = Lexer::new(source).tokenize_all().map_err(report)?;
            eprintln!("=== Tokens ===");
            for token in &tokens {
                eprintln!("{:?}", token);
            }
            eprintln!("=== End Tokens ===\n");
        }

        // Phase 2: Parsing
        info!(file = %ctx.filename, "parsing");
        let script = Parser::new(source)
            .and_then(Parser::parse)
            .map_err(report)?;
        debug!(nodes = script.node_count, names = script.names.len(), "parsed");

        if config.dump_ast {
            eprintln!("=== AST ===");
            eprintln!("{:#?}", script.body);
            eprintln!("=== End AST ===\n");
        }

        // Phase 3: Semantic analysis
        let return_type = self
            .lookup
            .resolve_type(&config.return_type)
            .ok_or_else(|| {
                CompileError::semantic(
                    format!("cannot resolve script return type [{}]", config.return_type),
                    Span::default(),
                )
            })
            .map_err(report)?;

        info!(file = %ctx.filename, return_type = %return_type, "analyzing");
        let ir = analyze_script(&script, self.lookup(), return_type).map_err(report)?;
        debug!(locals = ir.locals.len(), statements = ir.body.statements.len(), "analysis complete");

        Ok(ir)
    }
}
