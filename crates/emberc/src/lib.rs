//! ember compiler - semantic analysis front end for the ember scripting language
//!
//! ember scripts are a sequence of statements whose last expression is the
//! script's result. This library parses a script, resolves every name and
//! type against a host-supplied type lookup, inserts the conversions the
//! language allows, checks reachability, and produces a typed IR.
//!
//! ## Architecture
//!
//! - **Common** (`common/`): errors, diagnostics, spans and node ids
//! - **Types** (`types/`): resolved types, cast legality and the host lookup
//! - **Frontend** (`frontend/`): lexer, parser, AST and semantic analysis
//! - **IR** (`ir/`): the typed output of analysis
//! - **Driver** (`driver/`): pipeline orchestration

pub mod common;
pub mod types;
pub mod frontend;
pub mod ir;
pub mod driver;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, DiagnosticReporter, Span};
pub use frontend::{CompileContext, Frontend, FrontendConfig, ScriptFrontend};
pub use driver::Pipeline;
