use thiserror::Error;

use crate::value::RecordKind;

/// Top-level error returned by the deck loaders.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Unable to read deck: {path}")]
    ReadError { path: String },

    #[error("Unable to write {path}")]
    WriteError { path: String },

    #[error("Unable to parse toml: {msg}")]
    TomlParseError { msg: String },

    #[error("Unable to serialize toml: {msg}")]
    TomlWriteError { msg: String },

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Why a fragment of the source could not be tokenized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    /// A character sequence that fits no token.
    #[default]
    UnexpectedInput,
    /// An integer literal that does not fit in an `i64`.
    IntegerTooLarge,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}, column {column}: {} `{fragment}`", .kind.describe())]
pub struct LexError {
    pub line: usize,
    pub column: usize,
    pub fragment: String,
    pub kind: LexErrorKind,
}

impl LexErrorKind {
    fn describe(&self) -> &'static str {
        match self {
            LexErrorKind::UnexpectedInput => "unexpected input",
            LexErrorKind::IntegerTooLarge => "integer literal too large",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Errors raised while executing the statements of a deck.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("line {line}: name `{name}` is not defined")]
    UndefinedName { name: String, line: usize },

    #[error("line {line}: no module named `{module}`")]
    UnknownModule { module: String, line: usize },

    #[error("line {line}: module `{module}` is used before `import {module}`")]
    ModuleNotImported { module: String, line: usize },

    #[error("line {line}: module `{module}` has no attribute `{name}`")]
    UnknownFunction {
        module: String,
        name: String,
        line: usize,
    },

    #[error("line {line}: unknown profile `{name}`")]
    UnknownProfile { name: String, line: usize },

    #[error("line {line}: unsupported operand types for {op}: {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
        line: usize,
    },

    #[error("line {line}: bad operand type for unary {op}: {operand}")]
    BadOperand {
        op: &'static str,
        operand: &'static str,
        line: usize,
    },

    #[error("line {line}: division by zero")]
    DivisionByZero { line: usize },

    #[error("line {line}: math domain error in `{function}`")]
    MathDomain { function: String, line: usize },

    #[error("line {line}: {callee}: {reason}")]
    BadArguments {
        callee: String,
        reason: String,
        line: usize,
    },

    #[error("line {line}: `{kind}` blocks must be top-level statements")]
    NestedRecord { kind: RecordKind, line: usize },
}

/// Errors raised while turning evaluated records into a [`crate::Deck`].
///
/// `record` fields hold a label such as `Collisions #0` or `Main`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("a `{kind}` block is required")]
    MissingRecord { kind: RecordKind },

    #[error("line {line}: only one `{kind}` block is allowed")]
    DuplicateRecord { kind: RecordKind, line: usize },

    #[error("{record}: missing required field `{field}`")]
    MissingField { record: String, field: String },

    #[error("{record}: field `{field}` expects {expected}, found {found}")]
    WrongType {
        record: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{record}: unknown species `{name}`")]
    UnknownSpecies { record: String, name: String },

    #[error("species `{name}` is declared more than once")]
    DuplicateSpecies { name: String },

    #[error("{record}: invalid `{field}`: {reason}")]
    InvalidRange {
        record: String,
        field: String,
        reason: String,
    },

    #[error("{record}: `{field}` = \"{value}\" is not one of {allowed}")]
    InvalidTag {
        record: String,
        field: String,
        value: String,
        allowed: String,
    },

    #[error("{record}: `{field}` needs {expected} element(s), found {found}")]
    LengthMismatch {
        record: String,
        field: String,
        expected: String,
        found: usize,
    },

    #[error("{record}: {reason}")]
    Collision { record: String, reason: String },

    #[error("{record}: invalid profile in `{field}`: {reason}")]
    InvalidProfile {
        record: String,
        field: String,
        reason: String,
    },
}

impl ValidationError {
    pub(crate) fn range(record: &str, field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidRange {
            record: record.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn length(record: &str, field: &str, expected: impl ToString, found: usize) -> Self {
        ValidationError::LengthMismatch {
            record: record.to_string(),
            field: field.to_string(),
            expected: expected.to_string(),
            found,
        }
    }
}

#[test]
fn test_unknown_species_message_names_species() {
    let err = ValidationError::UnknownSpecies {
        record: "Collisions #0".to_string(),
        name: "electron3".to_string(),
    };
    assert_eq!(err.to_string(), "Collisions #0: unknown species `electron3`");
}

#[test]
fn test_deck_error_is_transparent() {
    let err: DeckError = EvalError::DivisionByZero { line: 4 }.into();
    assert_eq!(err.to_string(), "line 4: division by zero");
}
