//! Compilation driver and pipeline orchestration

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::common::{CompileResult, DiagnosticReporter};
use crate::frontend::{CompileContext, Frontend, FrontendConfig, ScriptFrontend};
use crate::ir::ScriptIr;
use crate::types::{BuiltinLookup, TypeLookup};

/// Compilation pipeline: owns the host type lookup and the front end that
/// analyzes scripts against it
pub struct Pipeline {
    frontend: ScriptFrontend,
}

impl Pipeline {
    /// A pipeline backed by the built-in standard library
    pub fn new() -> Self {
        Self::with_lookup(Arc::new(BuiltinLookup::new()))
    }

    /// A pipeline backed by a host-supplied lookup
    pub fn with_lookup(lookup: Arc<dyn TypeLookup>) -> Self {
        Self {
            frontend: ScriptFrontend::new(lookup),
        }
    }

    /// Analyze one script
    pub fn compile_source(
        &self,
        source: &str,
        filename: &str,
        config: &FrontendConfig,
        reporter: &DiagnosticReporter,
        file_id: usize,
    ) -> CompileResult<ScriptIr> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        if !self.frontend.extensions().contains(&ext.as_str()) {
            warn!(file = filename, "unexpected file extension, compiling as {}", self.frontend.name());
        }

        let ctx = CompileContext::new(filename.to_string(), file_id, reporter);
        self.frontend.compile(source, &ctx, config)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CompileError;
    use crate::types::ScriptType;
    use pretty_assertions::assert_eq;

    fn compile(pipeline: &Pipeline, source: &str) -> CompileResult<ScriptIr> {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("script.ember", source);
        pipeline.compile_source(source, "script.ember", &FrontendConfig::default(), &reporter, file_id)
    }

    #[test]
    fn test_compile_with_builtin_library() {
        let pipeline = Pipeline::new();
        let ir = compile(&pipeline, "String s = 'a'; s.length() + 1").unwrap();
        assert_eq!(ir.return_type, ScriptType::Def);
        assert_eq!(ir.locals.len(), 1);
    }

    #[test]
    fn test_custom_lookup() {
        let pipeline = Pipeline::with_lookup(Arc::new(BuiltinLookup::empty()));
        assert!(compile(&pipeline, "int x = 1; x").is_ok());
        let err = compile(&pipeline, "'text'").unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }
}
