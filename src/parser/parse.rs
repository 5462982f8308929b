//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure:
//! the token cursor, speculation, node construction and error reporting.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: declarations, modifiers, attributes and generic clauses
//! - `statements`: statements, conditions and statement lists
//! - `expressions`: flat sequence expressions and their operands
//! - `types`: type annotations and generic argument clauses
//! - `patterns`: binding and matching patterns
//!
//! # Token cursor
//!
//! Trivia never reaches the grammar routines: it is folded into the
//! `space_before` / `newline_before` flags of the next significant token.
//! Invalid tokens are reported once, before parsing starts, and dropped.
//!
//! Closing a generic clause may split an operator such as `>>`. The
//! remainder is kept in a pending queue that belongs to the cursor, so
//! saving and restoring a [`Cursor`] also undoes a split.
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use super::error::{ParserError, ParserWarning};
use super::lexer::{classify_operator, Lexer};
use super::token::{Keyword, Punctuator, Token, TokenEntry};
use crate::ast::*;
use crate::diagnostic::{DiagnosticPool, StopSignal};
use crate::source::{Locatable, SourceLocation, SourceRange};

/// Result of a parsing routine; `Err` means the parse has been halted.
pub type PResult<T> = Result<T, StopSignal>;

/// A significant token with the trivia before it reduced to flags.
#[derive(Debug, Clone)]
pub(crate) struct Lexeme {
    pub token: Token,
    pub range: SourceRange,
    pub space_before: bool,
    pub newline_before: bool,
}

impl Locatable for Lexeme {
    fn source_range(&self) -> SourceRange {
        self.range.clone()
    }
}

/// Context-dependent grammar restrictions.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Restrictions {
    /// `{` after an expression opens a body, not a trailing closure
    pub no_trailing_closure: bool,
    /// `=` ends the expression (patterns, conditions)
    pub no_assignment: bool,
}

/// Saved cursor state for backtracking.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    position: usize,
    pending: Vec<Lexeme>,
    last_end: SourceLocation,
    needs_sync: bool,
    next_node_id: NodeId,
}

/// Recursive descent parser for Swift
pub struct Parser<'pool> {
    pub(crate) tokens: Vec<Lexeme>,
    pub(crate) position: usize,
    /// Split-off operator remainders, next token last
    pending: Vec<Lexeme>,
    invalid: Vec<TokenEntry>,
    last_end: SourceLocation,
    /// Set after a recoverable error until the next statement boundary
    needs_sync: bool,
    pub(crate) restrictions: Restrictions,
    pool: &'pool mut DiagnosticPool,
    next_node_id: NodeId,
}

impl<'pool> Parser<'pool> {
    pub fn new(tokens: Vec<TokenEntry>, pool: &'pool mut DiagnosticPool) -> Self {
        Self::starting_at(tokens, pool, 0)
    }

    /// Parser whose node ids start at `first_id`.
    pub(crate) fn starting_at(
        tokens: Vec<TokenEntry>,
        pool: &'pool mut DiagnosticPool,
        first_id: NodeId,
    ) -> Self {
        let (tokens, invalid) = significant_tokens(tokens);
        let last_end = tokens[0].range.start.clone();
        Self {
            tokens,
            position: 0,
            pending: Vec::new(),
            invalid,
            last_end,
            needs_sync: false,
            restrictions: Restrictions::default(),
            pool,
            next_node_id: first_id,
        }
    }

    /// Parse the whole token stream into a translation unit.
    pub fn parse(&mut self) -> PResult<TopLevelDeclaration> {
        self.report_invalid_tokens()?;

        let id = self.next_id();
        let start = self.current_start();
        let statements = self.parse_statements(|_| false)?;
        Ok(TopLevelDeclaration {
            id,
            statements,
            range: self.range_from(start),
            next_node_id: self.next_node_id,
        })
    }

    fn report_invalid_tokens(&mut self) -> PResult<()> {
        for entry in std::mem::take(&mut self.invalid) {
            if let Token::Invalid { reason, text } = &entry.token {
                let kind = ParserError::InvalidToken {
                    reason: *reason,
                    text: text.clone(),
                };
                self.pool.append_error(kind, &entry)?;
            }
        }
        Ok(())
    }

    /// Parse the source of an interpolated segment with a nested parser
    /// sharing this parser's pool and node-id counter.
    pub(crate) fn parse_interpolation(
        &mut self,
        source: &str,
        start: &SourceLocation,
    ) -> PResult<Expression> {
        let tokens =
            Lexer::at(start.identifier.clone(), source, start.line, start.column).tokenize();
        let mut nested = Parser::starting_at(tokens, &mut *self.pool, self.next_node_id);
        let result = nested.parse_interpolated_expression();
        self.next_node_id = nested.next_node_id;
        result
    }

    fn parse_interpolated_expression(&mut self) -> PResult<Expression> {
        self.report_invalid_tokens()?;
        let expression = self.parse_expression()?;
        if !self.is_at_end() {
            let at = self.peek().range.clone();
            self.error(ParserError::ExtraInterpolationTokens, &at)?;
        }
        Ok(expression)
    }

    // ===== Node construction =====

    pub(crate) fn next_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    /// Range from `start` to the end of the last consumed token.
    pub(crate) fn range_from(&self, start: SourceLocation) -> SourceRange {
        SourceRange::new(start, self.last_end.clone())
    }

    pub(crate) fn make_expression(&mut self, kind: ExpressionKind, start: SourceLocation) -> Expression {
        Expression {
            id: self.next_id(),
            range: self.range_from(start),
            kind,
        }
    }

    pub(crate) fn make_type(&mut self, kind: TypeKind, start: SourceLocation) -> Type {
        Type {
            id: self.next_id(),
            range: self.range_from(start),
            kind,
        }
    }

    pub(crate) fn make_pattern(&mut self, kind: PatternKind, start: SourceLocation) -> Pattern {
        Pattern {
            id: self.next_id(),
            range: self.range_from(start),
            kind,
        }
    }

    pub(crate) fn make_statement(&mut self, kind: StatementKind, start: SourceLocation) -> Statement {
        Statement {
            id: self.next_id(),
            range: self.range_from(start),
            kind,
        }
    }

    // ===== Diagnostics =====

    /// Record a recoverable error. Further errors are suppressed until the
    /// parser resynchronizes at a statement boundary.
    pub(crate) fn error(&mut self, kind: ParserError, at: &impl Locatable) -> PResult<()> {
        if self.needs_sync {
            return Ok(());
        }
        self.needs_sync = true;
        self.pool.append_error(kind, at)
    }

    pub(crate) fn warning(&mut self, kind: ParserWarning, at: &impl Locatable) -> PResult<()> {
        self.pool.append_warning(kind, at)
    }

    pub(crate) fn fatal(&mut self, kind: ParserError, at: &impl Locatable) -> StopSignal {
        self.pool.append_fatal(kind, at)
    }

    /// Report that the current token is not what `expected` describes.
    pub(crate) fn unexpected(&mut self, expected: &str) -> PResult<()> {
        let lexeme = self.peek().clone();
        self.error(
            ParserError::Expected {
                expected: expected.to_string(),
                found: lexeme.token.to_string(),
            },
            &lexeme,
        )
    }

    pub(crate) fn needs_sync(&self) -> bool {
        self.needs_sync
    }

    /// Skip to the next statement boundary: past a `;`, or up to a `}`, a
    /// line break or a declaration keyword. Bracketed groups are skipped whole.
    pub(crate) fn synchronize(&mut self) {
        self.needs_sync = false;
        loop {
            let lexeme = self.peek();
            match lexeme.token {
                Token::Eof | Token::Punctuator(Punctuator::RightBrace) => return,
                Token::Punctuator(Punctuator::Semicolon) => {
                    self.advance();
                    return;
                }
                _ if lexeme.newline_before || self.at_declaration_start() => return,
                Token::Punctuator(Punctuator::LeftBrace)
                | Token::Punctuator(Punctuator::LeftParen)
                | Token::Punctuator(Punctuator::LeftSquare) => self.skip_balanced(),
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Step over one token, or a whole bracketed group.
    pub(crate) fn skip_token(&mut self) {
        match self.peek().token {
            Token::Punctuator(
                Punctuator::LeftBrace | Punctuator::LeftParen | Punctuator::LeftSquare,
            ) => self.skip_balanced(),
            _ => {
                self.advance();
            }
        }
    }

    pub(crate) fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek().token {
                Token::Eof => return,
                Token::Punctuator(
                    Punctuator::LeftBrace | Punctuator::LeftParen | Punctuator::LeftSquare,
                ) => depth += 1,
                Token::Punctuator(
                    Punctuator::RightBrace | Punctuator::RightParen | Punctuator::RightSquare,
                ) => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
            if depth == 0 {
                return;
            }
        }
    }

    // ===== Speculation =====

    pub(crate) fn save(&self) -> Cursor {
        Cursor {
            position: self.position,
            pending: self.pending.clone(),
            last_end: self.last_end.clone(),
            needs_sync: self.needs_sync,
            next_node_id: self.next_node_id,
        }
    }

    pub(crate) fn restore(&mut self, cursor: Cursor) {
        self.position = cursor.position;
        self.pending = cursor.pending;
        self.last_end = cursor.last_end;
        self.needs_sync = cursor.needs_sync;
        self.next_node_id = cursor.next_node_id;
    }

    /// Run `attempt` tentatively. It is kept only if it returns `Some` without
    /// adding any diagnostic; otherwise the cursor and the pool are rolled back.
    pub(crate) fn speculate<T>(
        &mut self,
        attempt: impl FnOnce(&mut Self) -> PResult<Option<T>>,
    ) -> Option<T> {
        let cursor = self.save();
        let checkpoint = self.pool.checkpoint();
        let before = self.pool.len();

        match attempt(self) {
            Ok(Some(value)) if self.pool.len() == before && !self.needs_sync => {
                self.pool.discard(checkpoint);
                Some(value)
            }
            _ => {
                self.pool.restore(checkpoint);
                self.restore(cursor);
                None
            }
        }
    }

    /// Run `parse` under `restrictions`, restoring the previous ones after.
    pub(crate) fn with_restrictions<T>(
        &mut self,
        restrictions: Restrictions,
        parse: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        let saved = self.restrictions;
        self.restrictions = restrictions;
        let result = parse(self);
        self.restrictions = saved;
        result
    }

    // ===== Helper methods =====

    pub(crate) fn peek(&self) -> &Lexeme {
        self.peek_ahead(0)
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> &Lexeme {
        let pending = self.pending.len();
        if n < pending {
            return &self.pending[pending - 1 - n];
        }
        let index = (self.position + n - pending).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub(crate) fn advance(&mut self) -> Lexeme {
        let lexeme = match self.pending.pop() {
            Some(lexeme) => lexeme,
            None => {
                let lexeme = self.tokens[self.position].clone();
                if !matches!(lexeme.token, Token::Eof) {
                    self.position += 1;
                }
                lexeme
            }
        };
        if !matches!(lexeme.token, Token::Eof) {
            self.last_end = lexeme.range.end.clone();
        }
        lexeme
    }

    /// Identifies the cursor position, for progress checks.
    pub(crate) fn marker(&self) -> (usize, usize) {
        (self.position, self.pending.len())
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek().token, Token::Eof)
    }

    /// End of the last consumed token.
    pub(crate) fn last_end(&self) -> SourceLocation {
        self.last_end.clone()
    }

    pub(crate) fn current_start(&self) -> SourceLocation {
        self.peek().range.start.clone()
    }

    pub(crate) fn check(&self, punctuator: Punctuator) -> bool {
        self.peek().token.is_punctuator(punctuator)
    }

    pub(crate) fn eat(&mut self, punctuator: Punctuator) -> bool {
        if self.check(punctuator) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek().token.is_keyword(keyword)
    }

    pub(crate) fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// True when the current token is the plain identifier `word`.
    pub(crate) fn check_contextual(&self, word: &str) -> bool {
        matches!(&self.peek().token, Token::Identifier(name) if name == word)
    }

    pub(crate) fn eat_contextual(&mut self, word: &str) -> bool {
        if self.check_contextual(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// True when the current token is an operator spelled `text`.
    pub(crate) fn check_operator(&self, text: &str) -> bool {
        self.peek().token.operator_text() == Some(text)
    }

    pub(crate) fn expect(&mut self, punctuator: Punctuator, context: &str) -> PResult<bool> {
        if self.eat(punctuator) {
            return Ok(true);
        }
        self.unexpected(&format!("'{}' {}", punctuator.as_str(), context))?;
        Ok(false)
    }

    pub(crate) fn eat_identifier(&mut self) -> Option<String> {
        let name = self.peek().token.identifier_text()?.to_string();
        self.advance();
        Some(name)
    }

    pub(crate) fn expect_identifier(&mut self, context: &str) -> PResult<Option<String>> {
        if let Some(name) = self.eat_identifier() {
            return Ok(Some(name));
        }
        self.unexpected(&format!("identifier {context}"))?;
        Ok(None)
    }

    /// Name after `.` or before `:` in an argument list; keywords are
    /// accepted as plain names there.
    pub(crate) fn eat_member_name(&mut self) -> Option<String> {
        let name = match &self.peek().token {
            Token::Identifier(name) | Token::BacktickIdentifier(name) => name.clone(),
            Token::Keyword(keyword) => keyword.as_str().to_string(),
            _ => return None,
        };
        self.advance();
        Some(name)
    }

    pub(crate) fn is_member_name(&self, n: usize) -> bool {
        matches!(
            self.peek_ahead(n).token,
            Token::Identifier(_) | Token::BacktickIdentifier(_) | Token::Keyword(_)
        )
    }

    /// Name of a declaration; a missing one is fatal.
    pub(crate) fn declaration_name(&mut self, what: &'static str) -> PResult<String> {
        match self.eat_identifier() {
            Some(name) => Ok(name),
            None => {
                let at = self.peek().range.clone();
                Err(self.fatal(ParserError::MissingDeclarationName(what), &at))
            }
        }
    }

    /// `{` opening a required body; a missing one is fatal.
    pub(crate) fn expect_body(&mut self, what: &'static str) -> PResult<()> {
        if self.eat(Punctuator::LeftBrace) {
            return Ok(());
        }
        let at = self.peek().range.clone();
        Err(self.fatal(ParserError::MissingBody(what), &at))
    }

    /// True at `;`, `}`, end of file or the first token of a new line.
    pub(crate) fn at_statement_boundary(&self) -> bool {
        let lexeme = self.peek();
        lexeme.newline_before
            || matches!(
                lexeme.token,
                Token::Eof
                    | Token::Punctuator(Punctuator::Semicolon)
                    | Token::Punctuator(Punctuator::RightBrace)
            )
    }

    /// Consume a `<` opening a generic clause.
    pub(crate) fn eat_opening_angle(&mut self) -> bool {
        if self.check_operator("<") {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check_closing_angle(&self) -> bool {
        self.peek()
            .token
            .operator_text()
            .is_some_and(|text| text.starts_with('>'))
    }

    /// Consume a `>` closing a generic clause, splitting it off the front of
    /// a longer operator such as `>>` or `>?` when necessary.
    pub(crate) fn eat_closing_angle(&mut self) -> bool {
        if !self.check_closing_angle() {
            return false;
        }
        let lexeme = self.advance();
        let Some(text) = lexeme.token.operator_text() else {
            return false;
        };
        if text == ">" {
            return true;
        }

        let start = &lexeme.range.start;
        let rest_start = SourceLocation::new(start.identifier.clone(), start.line, start.column + 1);
        let next = self.peek();
        let right_bound = !next.space_before
            && !next.newline_before
            && !matches!(
                next.token,
                Token::Eof
                    | Token::Punctuator(
                        Punctuator::RightParen
                            | Punctuator::RightSquare
                            | Punctuator::RightBrace
                            | Punctuator::Comma
                            | Punctuator::Semicolon
                            | Punctuator::Colon
                    )
            );

        let split = classify_operator(&text[1..], &rest_start, true, right_bound);
        self.last_end = rest_start;
        for entry in split.into_iter().rev() {
            self.pending.push(Lexeme {
                token: entry.token,
                range: entry.range,
                space_before: false,
                newline_before: false,
            });
        }
        true
    }

    /// True when a declaration starts at the current token.
    pub(crate) fn at_declaration_start(&self) -> bool {
        self.declaration_starts_at(0)
    }

    pub(crate) fn declaration_starts_at(&self, n: usize) -> bool {
        match &self.peek_ahead(n).token {
            Token::Punctuator(Punctuator::At) => true,
            Token::Keyword(
                Keyword::Associatedtype
                | Keyword::Class
                | Keyword::Deinit
                | Keyword::Enum
                | Keyword::Extension
                | Keyword::Func
                | Keyword::Import
                | Keyword::Init
                | Keyword::Let
                | Keyword::Operator
                | Keyword::Precedencegroup
                | Keyword::Protocol
                | Keyword::Static
                | Keyword::Struct
                | Keyword::Subscript
                | Keyword::Typealias
                | Keyword::Var,
            ) => true,
            Token::Keyword(
                Keyword::Private
                | Keyword::Fileprivate
                | Keyword::Internal
                | Keyword::Public
                | Keyword::Open,
            ) => match &self.peek_ahead(n + 1).token {
                Token::Punctuator(Punctuator::LeftParen) => {
                    matches!(&self.peek_ahead(n + 2).token, Token::Identifier(word) if word == "set")
                }
                _ => self.declaration_starts_at(n + 1) || self.is_contextual_modifier_at(n + 1),
            },
            Token::Identifier(_) => self.is_contextual_modifier_at(n),
            _ => false,
        }
    }

    /// A contextual modifier word directly followed by more of a declaration.
    pub(crate) fn is_contextual_modifier_at(&self, n: usize) -> bool {
        let Token::Identifier(word) = &self.peek_ahead(n).token else {
            return false;
        };
        if DeclarationModifier::contextual(word).is_none() {
            return false;
        }
        let next = self.peek_ahead(n + 1);
        if next.newline_before && !matches!(next.token, Token::Keyword(_)) {
            return false;
        }
        match &next.token {
            Token::Punctuator(Punctuator::LeftParen) => word == "unowned",
            Token::Keyword(Keyword::Case) => word == "indirect",
            Token::Keyword(_) => self.declaration_starts_at(n + 1),
            Token::Identifier(_) => self.is_contextual_modifier_at(n + 1),
            _ => false,
        }
    }
}

/// Split a raw token stream into significant lexemes and invalid entries.
fn significant_tokens(entries: Vec<TokenEntry>) -> (Vec<Lexeme>, Vec<TokenEntry>) {
    let mut lexemes: Vec<Lexeme> = Vec::with_capacity(entries.len());
    let mut invalid = Vec::new();
    let mut space_before = false;
    let mut newline_before = false;

    for entry in entries {
        match &entry.token {
            Token::Whitespace(text) | Token::BlockComment(text) => {
                space_before = true;
                newline_before |= text.contains('\n');
            }
            Token::LineComment(_) => space_before = true,
            Token::Invalid { .. } => {
                space_before = true;
                invalid.push(entry);
            }
            _ => {
                let is_eof = matches!(entry.token, Token::Eof);
                lexemes.push(Lexeme {
                    token: entry.token,
                    range: entry.range,
                    space_before,
                    newline_before,
                });
                space_before = false;
                newline_before = false;
                if is_eof {
                    break;
                }
            }
        }
    }

    if !matches!(lexemes.last(), Some(Lexeme { token: Token::Eof, .. })) {
        let end = lexemes
            .last()
            .map(|lexeme| lexeme.range.end.clone())
            .unwrap_or_else(SourceLocation::invalid);
        lexemes.push(Lexeme {
            token: Token::Eof,
            range: SourceRange::new(end.clone(), end),
            space_before,
            newline_before,
        });
    }
    (lexemes, invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceFile;

    fn tokens(source: &str) -> Vec<TokenEntry> {
        Lexer::new(&SourceFile::in_memory(source)).tokenize()
    }

    #[test]
    fn test_trivia_becomes_flags() {
        let mut pool = DiagnosticPool::new();
        let parser = Parser::new(tokens("a b\n/* x */c"), &mut pool);

        assert_eq!(parser.tokens.len(), 4);
        assert!(!parser.tokens[0].space_before);
        assert!(parser.tokens[1].space_before && !parser.tokens[1].newline_before);
        assert!(parser.tokens[2].newline_before);
        assert!(matches!(parser.tokens[3].token, Token::Eof));
    }

    #[test]
    fn test_invalid_tokens_reported_up_front() {
        let mut pool = DiagnosticPool::new();
        let unit = Parser::new(tokens("let a = 0b\nlet b = 1"), &mut pool)
            .parse()
            .expect("parse should not halt");

        assert_eq!(pool.error_count(), 2); // the token itself, then the missing initializer
        assert_eq!(unit.statements.len(), 2);
    }

    #[test]
    fn test_split_closing_angle_and_restore() {
        let mut pool = DiagnosticPool::new();
        let mut parser = Parser::new(tokens("C>>"), &mut pool);
        parser.advance();
        let saved = parser.save();

        assert!(parser.eat_closing_angle());
        assert!(parser.check_closing_angle());
        assert_eq!(parser.peek().range.start.column, 3);
        assert!(parser.eat_closing_angle());
        assert!(parser.is_at_end());

        parser.restore(saved);
        assert_eq!(parser.peek().token.operator_text(), Some(">>"));
    }

    #[test]
    fn test_speculation_rolls_back_diagnostics() {
        let mut pool = DiagnosticPool::new();
        let mut parser = Parser::new(tokens("a b c"), &mut pool);

        let result: Option<()> = parser.speculate(|p| {
            p.advance();
            p.unexpected("nothing")?;
            Ok(Some(()))
        });
        assert!(result.is_none());
        assert!(matches!(parser.peek().token, Token::Identifier(ref s) if s == "a"));
        assert!(!parser.needs_sync());
        drop(parser);
        assert!(pool.is_empty());
    }
}
