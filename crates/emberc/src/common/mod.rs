//! Common infrastructure shared by the front end, analyzers and IR

mod error;
mod span;

pub use error::{CompileError, CompileResult, DiagnosticReporter};
pub use span::{NodeId, Span};
