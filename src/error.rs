use crate::lexer::Position;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("Unterminated phrase starting at {0}")]
    UnterminatedPhrase(Position),

    #[error("Dangling escape at end of input ({0})")]
    DanglingEscape(Position),

    #[error("Unexpected character '{ch}' at {position}")]
    UnexpectedChar { ch: char, position: Position },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Expected {expected} at {position}, found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: Position,
    },

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Groups nested deeper than {limit} levels")]
    TooDeeplyNested { limit: usize },
}

/// Failure raised by a filter macro. Surfaced unchanged by the compiler.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ExpansionError {
    pub message: String,
}

impl ExpansionError {
    pub fn new(message: impl Into<String>) -> Self {
        ExpansionError {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Groups nested deeper than {limit} levels")]
    TooDeeplyNested { limit: usize },

    #[error("Unsupported aggregation '{kind}'")]
    UnsupportedAggregation { kind: String },

    #[error("Invalid aggregation '{clause}': {reason}")]
    InvalidAggregation { clause: String, reason: String },

    #[error(transparent)]
    Expansion(#[from] ExpansionError),
}

/// Crate-level error for calls that parse and compile in one step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
}

impl From<LexError> for Error {
    fn from(e: LexError) -> Self {
        Error::Parse(ParseError::Lex(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
