//! Swift source code parser
//!
//! This module transforms Swift source text into an Abstract Syntax Tree:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`token`]: Token definitions
//! - [`Parser`]: Parsing (tokens → [`TopLevelDeclaration`])
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser. Binary operators are not given a
//! precedence here: chains of them come out as flat sequence expressions and
//! are nested later by [`folding`](crate::folding), once any custom
//! `precedencegroup` declarations in the file are known.
//!
//! Diagnostics go to a [`DiagnosticPool`]; the parser stops only when the
//! pool asks it to, or at a fatal structural error.

pub mod lexer;
pub mod token;

mod declarations;
mod error;
mod expressions;
mod parse;
mod patterns;
mod statements;
mod types;

pub use error::{ParserError, ParserWarning};
pub use parse::{PResult, Parser};

use crate::ast::TopLevelDeclaration;
use crate::diagnostic::DiagnosticPool;
use crate::source::SourceFile;

/// Lex and parse `file`, reporting into `pool`.
pub fn parse(file: &SourceFile, pool: &mut DiagnosticPool) -> PResult<TopLevelDeclaration> {
    let tokens = lexer::Lexer::new(file).tokenize();
    Parser::new(tokens, pool).parse()
}
