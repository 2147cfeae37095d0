//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;
use super::{NodeId, Span};

/// Compile error with source location
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    #[error("Semantic error at {span:?}: {message}")]
    Semantic { message: String, span: Span },

    #[error("a block must contain at least one statement")]
    EmptyBlock { span: Span },

    #[error("unreachable statement")]
    UnreachableCode { span: Span },

    #[error("cannot resolve symbol [{name}]")]
    UnresolvedSymbol { name: String, span: Span },

    #[error("value required: instead found unexpected type [{type_name}]")]
    TypeUsedAsValue { type_name: String, span: Span },

    #[error("value required: instead found no value")]
    NoValue { span: Span },

    #[error("cannot cast from [{from}] to [{to}]")]
    InvalidCast { from: String, to: String, span: Span },

    /// An analyzer read a decoration before setting it
    #[error("internal error: decoration [{kind}] read before it was set on node {node}")]
    MissingDecoration { node: NodeId, kind: &'static str },

    /// An analyzer set the same value decoration twice in one pass
    #[error("internal error: decoration [{kind}] set twice on node {node}")]
    DecorationAlreadySet { node: NodeId, kind: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self::Semantic {
            message: message.into(),
            span,
        }
    }

    pub fn unresolved_symbol(name: impl Into<String>, span: Span) -> Self {
        Self::UnresolvedSymbol {
            name: name.into(),
            span,
        }
    }

    pub fn type_used_as_value(type_name: impl Into<String>, span: Span) -> Self {
        Self::TypeUsedAsValue {
            type_name: type_name.into(),
            span,
        }
    }

    pub fn invalid_cast(from: impl Into<String>, to: impl Into<String>, span: Span) -> Self {
        Self::InvalidCast {
            from: from.into(),
            to: to.into(),
            span,
        }
    }

    /// Source location of the offending construct, if the error has one
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. }
            | Self::Parser { span, .. }
            | Self::Semantic { span, .. }
            | Self::EmptyBlock { span }
            | Self::UnreachableCode { span }
            | Self::UnresolvedSymbol { span, .. }
            | Self::TypeUsedAsValue { span, .. }
            | Self::NoValue { span }
            | Self::InvalidCast { span, .. } => Some(*span),
            Self::MissingDecoration { .. } | Self::DecorationAlreadySet { .. } | Self::Io(_) => None,
        }
    }

    /// True for analyzer defects, as opposed to errors in the script itself
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::MissingDecoration { .. } | Self::DecorationAlreadySet { .. }
        )
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    /// Build the diagnostic for an error without emitting it
    pub fn diagnostic(&self, file_id: usize, error: &CompileError) -> Diagnostic<usize> {
        let header = match error {
            CompileError::Lexer { .. } => "Lexer error",
            CompileError::Parser { .. } => "Syntax error",
            CompileError::Semantic { .. } => "Semantic error",
            CompileError::EmptyBlock { .. } => "Empty block",
            CompileError::UnreachableCode { .. } => "Unreachable code",
            CompileError::UnresolvedSymbol { .. } => "Unresolved symbol",
            CompileError::TypeUsedAsValue { .. } | CompileError::NoValue { .. } => "Value required",
            CompileError::InvalidCast { .. } => "Invalid cast",
            CompileError::MissingDecoration { .. } | CompileError::DecorationAlreadySet { .. } => {
                return Diagnostic::bug()
                    .with_message(format!("internal compiler error: {}", error));
            }
            CompileError::Io(err) => {
                return Diagnostic::error().with_message(format!("IO error: {}", err));
            }
        };

        let label = match error {
            CompileError::Lexer { message, .. }
            | CompileError::Parser { message, .. }
            | CompileError::Semantic { message, .. } => message.clone(),
            other => other.to_string(),
        };

        let diagnostic = Diagnostic::error().with_message(header);
        match error.span() {
            Some(span) => diagnostic
                .with_labels(vec![Label::primary(file_id, span.start..span.end).with_message(label)]),
            None => diagnostic.with_notes(vec![label]),
        }
    }

    pub fn report_error(&self, file_id: usize, error: &CompileError) {
        let diagnostic = self.diagnostic(file_id, error);
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codespan_reporting::diagnostic::Severity;

    #[test]
    fn test_span_and_internal_classification() {
        let err = CompileError::UnreachableCode { span: Span::new(4, 9) };
        assert_eq!(err.span(), Some(Span::new(4, 9)));
        assert!(!err.is_internal());

        let bug = CompileError::MissingDecoration { node: NodeId(3), kind: "ValueType" };
        assert_eq!(bug.span(), None);
        assert!(bug.is_internal());
    }

    #[test]
    fn test_diagnostic_severity() {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("test.ember", "int x = 1.5;");

        let cast = CompileError::invalid_cast("double", "int", Span::new(8, 11));
        let diagnostic = reporter.diagnostic(file_id, &cast);
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.labels.len(), 1);

        let bug = CompileError::DecorationAlreadySet { node: NodeId(0), kind: "TargetType" };
        assert_eq!(reporter.diagnostic(file_id, &bug).severity, Severity::Bug);
    }
}
