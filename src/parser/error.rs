use crate::ir::{CircuitError, ExprError};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 1-based position of a statement in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Location of byte `offset` in `source`.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let before = &source[..offset.min(source.len())];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rfind('\n')
            .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
            + 1;
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Missing or invalid OPENQASM header. File must start with 'OPENQASM 2.0;'")]
    MissingHeader,

    #[error("Unsupported OpenQASM version: '{0}'. Only '2.0' is supported.")]
    UnsupportedVersion(String),

    #[error("{location}: include \"{file}\" is not supported; only built-in libraries can be included")]
    UnsupportedInclude { file: String, location: Location },

    #[error("{location}: parse error near '{near}'")]
    Syntax { near: String, location: Location },

    #[error("{location}: undefined {kind} register '{name}'")]
    UndefinedRegister {
        kind: &'static str,
        name: String,
        location: Location,
    },

    #[error("{location}: index {index} out of bounds for register '{name}' of size {size}")]
    IndexOutOfBounds {
        name: String,
        index: usize,
        size: usize,
        location: Location,
    },

    #[error("{location}: register size mismatch in {statement}")]
    BroadcastMismatch {
        statement: &'static str,
        location: Location,
    },

    #[error("{location}: '{name}' is already defined")]
    Redefinition { name: String, location: Location },

    #[error("{location}: {message}")]
    Invalid { message: String, location: Location },

    #[error("{location}: {source}")]
    Expression {
        #[source]
        source: ExprError,
        location: Location,
    },

    #[error("{location}: {source}")]
    Circuit {
        #[source]
        source: CircuitError,
        location: Location,
    },

    #[error("failed to read '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Where in the source the error was raised, if it is tied to a statement.
    pub fn location(&self) -> Option<Location> {
        match self {
            ParseError::UnsupportedInclude { location, .. }
            | ParseError::Syntax { location, .. }
            | ParseError::UndefinedRegister { location, .. }
            | ParseError::IndexOutOfBounds { location, .. }
            | ParseError::BroadcastMismatch { location, .. }
            | ParseError::Redefinition { location, .. }
            | ParseError::Invalid { location, .. }
            | ParseError::Expression { location, .. }
            | ParseError::Circuit { location, .. } => Some(*location),
            ParseError::MissingHeader | ParseError::UnsupportedVersion(_) | ParseError::Io { .. } => {
                None
            }
        }
    }
}
