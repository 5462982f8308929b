//! Diagnostic kinds reported by the parser

use super::token::InvalidTokenReason;
use thiserror::Error;

/// Errors, recoverable or fatal, found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("{reason}: '{text}'")]
    InvalidToken {
        reason: InvalidTokenReason,
        text: String,
    },
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },
    #[error("expected expression, found {0}")]
    ExpectedExpression(String),
    #[error("expected type, found {0}")]
    ExpectedType(String),
    #[error("expected pattern, found {0}")]
    ExpectedPattern(String),
    #[error("expected member name following '.', found {0}")]
    ExpectedMemberName(String),
    #[error("consecutive statements on a line must be separated by ';'")]
    MissingStatementSeparator,
    #[error("expected name in {0} declaration")]
    MissingDeclarationName(&'static str),
    #[error("expected '{{' in body of {0}")]
    MissingBody(&'static str),
    #[error("expected declaration, found {0}")]
    ExpectedDeclaration(String),
    #[error("'super' must be followed by a member, subscript or initializer")]
    BareSuper,
    #[error("unknown precedence group attribute '{0}'")]
    UnknownPrecedenceGroupAttribute(String),
    #[error("extra tokens after interpolated expression")]
    ExtraInterpolationTokens,
    #[error("'{0}' is not allowed in a switch case outside of a case block")]
    StatementOutsideCase(String),
}

/// Warnings; they never stop a parse below the warning limit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserWarning {
    #[error("redundant ';'")]
    RedundantSemicolon,
    #[error("'var' in a parameter list is deprecated")]
    VarParameter,
    #[error("'{0}' is deprecated: use '+= 1' or '-= 1' instead")]
    DeprecatedIncrement(String),
}
