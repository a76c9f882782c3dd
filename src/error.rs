use thiserror::Error;

// Lexical errors, one per token class the tokenizer can reject given the
// current flags mask.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    #[error("a number is not allowed here")]
    UnexpectedNumber,
    #[error("a string literal is not allowed here")]
    UnexpectedString,
    #[error("a word is not allowed here")]
    UnexpectedWord,
    #[error("unexpected parenthesis")]
    UnexpectedParen,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("missing expected operand before operator")]
    MissingOperand,
    #[error("unknown operator")]
    UnknownOperator,
}

// Syntax errors raised while building the AST.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("mismatched parentheses")]
    MismatchedParens,
    #[error("a call is not allowed here")]
    CallNotAllowed,
    #[error("$(...) macro definition requires at least one argument")]
    EmptyMacroDefinition,
    #[error("$(...) macro definition's first argument must be a variable")]
    MacroFirstArgNotVariable,
    #[error("assignment target must be a variable")]
    BadAssignmentTarget,
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("illegal identifier")]
    IllegalIdentifier,
    #[error("unexpected end of input")]
    UnexpectedEof,
}

// Evaluation errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("expected a number, found a string")]
    ExpectedNumber,
}
