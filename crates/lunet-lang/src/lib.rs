pub mod config;
pub mod error;
pub mod runtime;
pub mod syntax;

pub use config::InterpreterConfig;
pub use error::{Error, ErrorCode, RuntimeError, RuntimeErrorKind};
pub use runtime::interpreter::{Flow, Interpreter};
pub use runtime::io::{
    buffer_handler, scripted_input, silent_handler, stdin_handler, stdout_handler, PrintHandler,
    ReadHandler, SharedPrintHandler, SharedReadHandler,
};
pub use runtime::value::{Table, Value};
pub use syntax::ast::Chunk;
pub use syntax::token::{Token, TokenKind};

// ─── Public API ───────────────────────────────────────────────────────────────

/// Lex and parse source text. Every syntax error found is returned; a program
/// with any of them is never evaluated.
pub fn compile(source: &str) -> Result<Chunk, Vec<Error>> {
    let tokens = syntax::lexer::Lexer::new(source).tokenize()?;
    let chunk = syntax::parser::Parser::new(tokens).parse()?;
    Ok(chunk)
}

/// Compile and run `source` with default limits, stdout and stdin.
pub fn run(source: &str) -> Result<Value, LunetError> {
    let chunk = compile(source).map_err(LunetError::Syntax)?;
    Ok(Interpreter::new(InterpreterConfig::default()).execute(&chunk)?)
}

/// Either stage of `run` failing.
#[derive(Debug, thiserror::Error)]
pub enum LunetError {
    #[error("{} syntax error(s), first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    Syntax(Vec<Error>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
