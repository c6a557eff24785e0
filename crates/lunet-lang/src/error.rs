use crate::syntax::ast::Span;

/// Error codes prefixed by phase: L = lexer, P = parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // unterminated string literal
    L003, // invalid escape sequence
    L004, // unterminated block comment

    // Parser
    P001, // unexpected token
    P002, // missing expected token
    P003, // `break` outside a loop
    P004, // `local` declaration with an index path
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::L003 => "L003",
            Self::L004 => "L004",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
            Self::P004 => "P004",
        }
    }
}

/// A syntax error. Any of these stops a program before evaluation starts.
#[derive(Debug, Clone, thiserror::Error)]
#[error("[{}] {line}:{column}: {message}", .code.as_str())]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeErrorKind {
    /// Call to a function that was never defined.
    #[error("NameError")]
    Name,
    /// Operator, indexing or condition applied to the wrong kind of value.
    #[error("TypeError")]
    Type,
    /// Text that should be numeric is not: a literal or an input line.
    #[error("FormatError")]
    Format,
    /// Integer division or modulo by zero, zero `for` step.
    #[error("ArithmeticError")]
    Arithmetic,
    /// Call depth exceeded `InterpreterConfig::max_call_depth`.
    #[error("RecursionError")]
    Recursion,
    /// The print or read capability failed.
    #[error("IoError")]
    Io,
}

/// Unrecoverable evaluation failure. There is no catch in the language, so
/// the first one aborts the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{kind}] {line}:{column}: {message}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, span: &Span, message: impl Into<String>) -> Self {
        Self { kind, line: span.line, column: span.column, message: message.into() }
    }

    pub fn name(span: &Span, message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Name, span, message)
    }

    pub fn type_error(span: &Span, message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Type, span, message)
    }

    pub fn format(span: &Span, message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Format, span, message)
    }

    pub fn arithmetic(span: &Span, message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Arithmetic, span, message)
    }

    pub fn recursion(span: &Span, message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Recursion, span, message)
    }

    pub fn io(span: &Span, err: &std::io::Error) -> Self {
        Self::new(RuntimeErrorKind::Io, span, err.to_string())
    }
}
