//! Error types for the Tarn assembler.

use tarn_common::ValidationError;
use thiserror::Error;

/// Errors produced while building or assembling a module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    // ---- Builder errors ----
    /// A label was marked twice.
    #[error("duplicate label '{label}'")]
    DuplicateLabel { label: String },

    /// A jump refers to a label that was never marked.
    #[error("undefined label '{label}' referenced by instruction {at}")]
    UndefinedLabel { label: String, at: usize },

    /// A function name was declared twice.
    #[error("duplicate function '{name}'")]
    DuplicateFunction { name: String },

    /// A call refers to a function that was never declared.
    #[error("undefined function '{name}' referenced by instruction {at}")]
    UndefinedFunction { name: String, at: usize },

    /// The entry names a function that was never declared.
    #[error("entry function '{name}' is not declared")]
    UndefinedEntry { name: String },

    /// A function declared at a label whose label was never marked.
    #[error("function '{function}' starts at undefined label '{label}'")]
    UndefinedEntryLabel { function: String, label: String },

    /// A resolved position does not fit an instruction operand.
    #[error("position {position} does not fit in an operand")]
    OperandOverflow { position: usize },

    /// The finished module failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // ---- Text errors ----
    /// An unrecognized opcode mnemonic was encountered.
    #[error("line {line}: unknown opcode '{token}'")]
    UnknownOpcode { line: usize, token: String },

    /// A `.name` directive that the assembler does not know.
    #[error("line {line}: unknown directive '{token}'")]
    UnknownDirective { line: usize, token: String },

    /// An opcode or directive did not have enough arguments.
    #[error("line {line}: {opcode} expects {expected} argument(s)")]
    MissingArgument {
        line: usize,
        opcode: &'static str,
        expected: usize,
    },

    /// A numeric operand could not be parsed or is out of range.
    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },

    /// A `.const` literal does not parse as its declared kind.
    #[error("line {line}: invalid {kind} literal '{token}'")]
    InvalidLiteral {
        line: usize,
        kind: &'static str,
        token: String,
    },

    /// A token appeared where it was not expected.
    #[error("line {line}: unexpected token '{token}'")]
    UnexpectedToken { line: usize, token: String },

    /// A string literal is missing its closing quote.
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    /// A builder error raised by a specific source line.
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<AsmError>,
    },
}

impl AsmError {
    /// Attach a source line to a builder error.
    pub(crate) fn at_line(self, line: usize) -> Self {
        AsmError::AtLine {
            line,
            source: Box::new(self),
        }
    }

    /// The source line, when the error came from text.
    pub fn line(&self) -> Option<usize> {
        match self {
            AsmError::UnknownOpcode { line, .. }
            | AsmError::UnknownDirective { line, .. }
            | AsmError::MissingArgument { line, .. }
            | AsmError::InvalidNumber { line, .. }
            | AsmError::InvalidLiteral { line, .. }
            | AsmError::UnexpectedToken { line, .. }
            | AsmError::UnterminatedString { line }
            | AsmError::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }
}
