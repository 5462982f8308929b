//! Statement parsing implementation
//!
//! This module handles the statement forms of Swift:
//!
//! - Loops: `for-in`, `while`, `repeat-while`
//! - Branches: `if`, `guard`, `switch`
//! - Control transfer: `break`, `continue`, `fallthrough`, `return`, `throw`
//! - `defer`, `do-catch`, labeled statements and `#if` compiler control
//! - Declarations and expressions as statements
//!
//! Statements on one line must be separated by `;`. After a recoverable
//! error the statement list resynchronizes at the next boundary, so one
//! mistake yields one diagnostic.
//!
//! # Grammar
//!
//! ```text
//! statement ::= label? loop | if | guard | switch | do
//!             | 'break' label? | 'continue' label? | 'fallthrough'
//!             | 'return' expression? | 'throw' expression | 'defer' block
//!             | compiler-control | declaration | expression
//! condition ::= expression | '#available' '(' ... ')'
//!             | 'case' pattern '=' expression | ('let' | 'var') pattern '=' expression
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::ast::*;
use crate::parser::error::{ParserError, ParserWarning};
use crate::parser::parse::{PResult, Parser, Restrictions};
use crate::parser::token::{Keyword, PoundKeyword, Punctuator, Token};

/// Conditions and loop headers end where a body `{` begins.
const HEADER: Restrictions = Restrictions {
    no_trailing_closure: true,
    no_assignment: false,
};

impl<'pool> Parser<'pool> {
    /// Parse statements until `is_terminator` holds or the input ends.
    pub(crate) fn parse_statements(
        &mut self,
        is_terminator: fn(&Self) -> bool,
    ) -> PResult<Vec<Statement>> {
        let mut statements = Vec::new();

        loop {
            while self.check(Punctuator::Semicolon) {
                let at = self.advance();
                self.warning(ParserWarning::RedundantSemicolon, &at)?;
            }
            if self.is_at_end() || is_terminator(self) {
                break;
            }

            let marker = self.marker();
            if self.check(Punctuator::RightBrace) {
                self.unexpected("statement")?;
                self.advance();
                self.synchronize();
                continue;
            }

            statements.push(self.parse_statement()?);
            self.finish_statement()?;

            if self.marker() == marker {
                self.advance();
            }
        }

        Ok(statements)
    }

    fn finish_statement(&mut self) -> PResult<()> {
        if self.needs_sync() {
            self.synchronize();
            return Ok(());
        }
        if self.eat(Punctuator::Semicolon) || self.at_statement_boundary() {
            return Ok(());
        }
        let at = self.peek().range.clone();
        self.error(ParserError::MissingStatementSeparator, &at)?;
        self.synchronize();
        Ok(())
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> PResult<Statement> {
        let start = self.current_start();

        if let Some(label) = self.statement_label() {
            self.advance();
            self.advance();
            let statement = self.parse_statement()?;
            return Ok(self.make_statement(
                StatementKind::Labeled {
                    label,
                    statement: Box::new(statement),
                },
                start,
            ));
        }

        let kind = match self.peek().token {
            Token::Keyword(Keyword::For) => self.parse_for_in_statement()?,
            Token::Keyword(Keyword::While) => {
                self.advance();
                let conditions = self.parse_condition_list()?;
                let body = self.parse_code_block("'while' loop")?;
                StatementKind::While { conditions, body }
            }
            Token::Keyword(Keyword::Repeat) => {
                self.advance();
                let body = self.parse_code_block("'repeat-while' loop")?;
                if !self.eat_keyword(Keyword::While) {
                    self.unexpected("'while' after 'repeat' body")?;
                }
                let condition = self.parse_expression()?;
                StatementKind::RepeatWhile { body, condition }
            }
            Token::Keyword(Keyword::If) => self.parse_if_statement()?,
            Token::Keyword(Keyword::Guard) => {
                self.advance();
                let conditions = self.parse_condition_list()?;
                if !self.eat_keyword(Keyword::Else) {
                    self.unexpected("'else' after 'guard' condition")?;
                }
                let body = self.parse_code_block("'guard' statement")?;
                StatementKind::Guard { conditions, body }
            }
            Token::Keyword(Keyword::Switch) => self.parse_switch_statement()?,
            Token::Keyword(Keyword::Do) => self.parse_do_statement()?,
            Token::Keyword(Keyword::Break) => {
                self.advance();
                StatementKind::Break(self.parse_target_label())
            }
            Token::Keyword(Keyword::Continue) => {
                self.advance();
                StatementKind::Continue(self.parse_target_label())
            }
            Token::Keyword(Keyword::Fallthrough) => {
                self.advance();
                StatementKind::Fallthrough
            }
            Token::Keyword(Keyword::Return) => {
                self.advance();
                if self.at_statement_boundary() {
                    StatementKind::Return(None)
                } else {
                    StatementKind::Return(Some(self.parse_expression()?))
                }
            }
            Token::Keyword(Keyword::Throw) => {
                self.advance();
                StatementKind::Throw(self.parse_expression()?)
            }
            Token::Keyword(Keyword::Defer) => {
                self.advance();
                StatementKind::Defer(self.parse_code_block("'defer' statement")?)
            }
            Token::PoundKeyword(
                PoundKeyword::If | PoundKeyword::ElseIf | PoundKeyword::Else | PoundKeyword::EndIf,
            ) => StatementKind::CompilerControl(self.parse_compiler_control()),
            _ if self.at_declaration_start() => {
                StatementKind::Declaration(self.parse_declaration()?)
            }
            _ => StatementKind::Expression(self.parse_expression()?),
        };

        Ok(self.make_statement(kind, start))
    }

    /// `name:` in front of a loop, `if`, `switch` or `do`
    fn statement_label(&self) -> Option<String> {
        let Token::Identifier(label) = &self.peek().token else {
            return None;
        };
        if !self.peek_ahead(1).token.is_punctuator(Punctuator::Colon) {
            return None;
        }
        match self.peek_ahead(2).token {
            Token::Keyword(
                Keyword::For
                | Keyword::While
                | Keyword::Repeat
                | Keyword::If
                | Keyword::Switch
                | Keyword::Do,
            ) => Some(label.clone()),
            _ => None,
        }
    }

    fn parse_target_label(&mut self) -> Option<String> {
        if self.at_statement_boundary() {
            return None;
        }
        self.eat_identifier()
    }

    /// `{ statements }` where the opening brace is required.
    pub(crate) fn parse_code_block(&mut self, what: &'static str) -> PResult<CodeBlock> {
        let start = self.current_start();
        self.expect_body(what)?;
        let statements = self.with_restrictions(Restrictions::default(), |p| {
            p.parse_statements(|p| p.check(Punctuator::RightBrace))
        })?;
        self.expect(Punctuator::RightBrace, &format!("to close {what}"))?;
        Ok(CodeBlock {
            statements,
            range: self.range_from(start),
        })
    }

    fn parse_if_statement(&mut self) -> PResult<StatementKind> {
        self.advance();
        let conditions = self.parse_condition_list()?;
        let then_block = self.parse_code_block("'if' statement")?;

        let else_clause = if self.eat_keyword(Keyword::Else) {
            if self.check_keyword(Keyword::If) {
                let start = self.current_start();
                let kind = self.parse_if_statement()?;
                Some(ElseClause::ElseIf(Box::new(self.make_statement(kind, start))))
            } else {
                Some(ElseClause::Else(self.parse_code_block("'else' clause")?))
            }
        } else {
            None
        };

        Ok(StatementKind::If {
            conditions,
            then_block,
            else_clause,
        })
    }

    fn parse_for_in_statement(&mut self) -> PResult<StatementKind> {
        self.advance();
        let is_case = self.eat_keyword(Keyword::Case);
        let pattern = if is_case {
            self.with_restrictions(HEADER, |p| p.parse_pattern())?
        } else {
            self.parse_binding_pattern()?
        };
        if !self.eat_keyword(Keyword::In) {
            self.unexpected("'in' after for-in pattern")?;
        }

        let collection = self.with_restrictions(HEADER, |p| p.parse_expression())?;
        let where_clause = if self.eat_keyword(Keyword::Where) {
            Some(self.with_restrictions(HEADER, |p| p.parse_expression())?)
        } else {
            None
        };
        let body = self.parse_code_block("'for-in' loop")?;

        Ok(StatementKind::ForIn {
            is_case,
            pattern,
            collection,
            where_clause,
            body,
        })
    }

    fn parse_switch_statement(&mut self) -> PResult<StatementKind> {
        self.advance();
        let subject = self.with_restrictions(HEADER, |p| p.parse_expression())?;
        self.expect_body("'switch' statement")?;

        let cases = self.with_restrictions(Restrictions::default(), |p| {
            let mut cases = Vec::new();
            while !p.check(Punctuator::RightBrace) && !p.is_at_end() {
                let marker = p.marker();
                match p.parse_switch_case()? {
                    Some(case) => cases.push(case),
                    None => p.skip_to_case_label(),
                }
                if p.marker() == marker {
                    p.advance();
                }
            }
            Ok(cases)
        })?;

        self.expect(Punctuator::RightBrace, "to close 'switch' statement")?;
        Ok(StatementKind::Switch { subject, cases })
    }

    fn parse_switch_case(&mut self) -> PResult<Option<SwitchCase>> {
        let start = self.current_start();
        let label = if self.eat_keyword(Keyword::Case) {
            let mut items = Vec::new();
            loop {
                let pattern = self.parse_pattern()?;
                let where_clause = if self.eat_keyword(Keyword::Where) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                items.push(CaseItem {
                    pattern,
                    where_clause,
                });
                if !self.eat(Punctuator::Comma) {
                    break;
                }
            }
            CaseLabel::Items(items)
        } else if self.eat_keyword(Keyword::Default) {
            CaseLabel::Default
        } else {
            let lexeme = self.peek().clone();
            self.error(
                ParserError::StatementOutsideCase(lexeme.token.spelling()),
                &lexeme,
            )?;
            return Ok(None);
        };

        self.expect(Punctuator::Colon, "after case label")?;
        if self.needs_sync() {
            self.synchronize();
        }
        let statements = self.parse_statements(|p| {
            p.check_keyword(Keyword::Case)
                || p.check_keyword(Keyword::Default)
                || p.check(Punctuator::RightBrace)
        })?;

        Ok(Some(SwitchCase {
            label,
            statements,
            range: self.range_from(start),
        }))
    }

    /// Recover from a stray statement in a switch body.
    fn skip_to_case_label(&mut self) {
        self.synchronize();
        while !(self.check_keyword(Keyword::Case)
            || self.check_keyword(Keyword::Default)
            || self.check(Punctuator::RightBrace)
            || self.is_at_end())
        {
            self.skip_token();
        }
    }

    fn parse_do_statement(&mut self) -> PResult<StatementKind> {
        self.advance();
        let body = self.parse_code_block("'do' statement")?;

        let mut catches = Vec::new();
        while self.check_keyword(Keyword::Catch) {
            let start = self.current_start();
            self.advance();
            let pattern = if self.check(Punctuator::LeftBrace) || self.check_keyword(Keyword::Where) {
                None
            } else {
                Some(self.with_restrictions(HEADER, |p| p.parse_pattern())?)
            };
            let where_clause = if self.eat_keyword(Keyword::Where) {
                Some(self.with_restrictions(HEADER, |p| p.parse_expression())?)
            } else {
                None
            };
            let body = self.parse_code_block("'catch' clause")?;
            catches.push(CatchClause {
                pattern,
                where_clause,
                body,
                range: self.range_from(start),
            });
        }

        Ok(StatementKind::Do { body, catches })
    }

    /// Comma-separated conditions of `if`, `guard` and `while`.
    fn parse_condition_list(&mut self) -> PResult<Vec<Condition>> {
        self.with_restrictions(HEADER, |p| {
            let mut conditions = Vec::new();
            // binding kind of the previous clause, for `if let a = x, b = y`
            let mut binding = None;
            loop {
                conditions.push(p.parse_condition(&mut binding)?);
                if p.eat_keyword(Keyword::Where) {
                    conditions.push(Condition::Expression(p.parse_expression()?));
                }
                if !p.eat(Punctuator::Comma) {
                    break;
                }
            }
            Ok(conditions)
        })
    }

    fn parse_condition(&mut self, binding: &mut Option<bool>) -> PResult<Condition> {
        match self.peek().token {
            Token::PoundKeyword(PoundKeyword::Available) => {
                *binding = None;
                self.advance();
                if !self.check(Punctuator::LeftParen) {
                    self.unexpected("'(' after '#available'")?;
                    return Ok(Condition::Availability(Vec::new()));
                }
                match self.parse_balanced_token() {
                    BalancedToken::Parens(arguments) => Ok(Condition::Availability(arguments)),
                    _ => Ok(Condition::Availability(Vec::new())),
                }
            }
            Token::Keyword(Keyword::Case) => {
                *binding = None;
                self.advance();
                let pattern = self.parse_pattern()?;
                self.expect(Punctuator::Equal, "after pattern in 'case' condition")?;
                let initializer = self.parse_expression()?;
                Ok(Condition::Case {
                    pattern,
                    initializer,
                })
            }
            Token::Keyword(keyword @ (Keyword::Let | Keyword::Var)) => {
                self.advance();
                let is_let = keyword == Keyword::Let;
                *binding = Some(is_let);
                self.parse_optional_binding(is_let)
            }
            Token::Identifier(_)
                if binding.is_some()
                    && matches!(
                        self.peek_ahead(1).token,
                        Token::Punctuator(Punctuator::Equal | Punctuator::Colon)
                    ) =>
            {
                let is_let = binding.unwrap_or(true);
                self.parse_optional_binding(is_let)
            }
            _ => {
                *binding = None;
                Ok(Condition::Expression(self.parse_expression()?))
            }
        }
    }

    fn parse_optional_binding(&mut self, is_let: bool) -> PResult<Condition> {
        let pattern = self.parse_binding_pattern()?;
        self.expect(Punctuator::Equal, "in optional binding")?;
        let initializer = self.parse_expression()?;
        Ok(Condition::OptionalBinding {
            is_let,
            pattern,
            initializer,
        })
    }

    /// `#if`, `#elseif`, `#else` and `#endif`; conditions run to the end of the line.
    fn parse_compiler_control(&mut self) -> CompilerControl {
        let keyword = self.advance();
        match keyword.token {
            Token::PoundKeyword(PoundKeyword::If) => CompilerControl::If(self.parse_line_tokens()),
            Token::PoundKeyword(PoundKeyword::ElseIf) => {
                CompilerControl::ElseIf(self.parse_line_tokens())
            }
            Token::PoundKeyword(PoundKeyword::Else) => CompilerControl::Else,
            _ => CompilerControl::EndIf,
        }
    }

    fn parse_line_tokens(&mut self) -> Vec<BalancedToken> {
        let mut tokens = Vec::new();
        while !self.peek().newline_before && !self.is_at_end() {
            tokens.push(self.parse_balanced_token());
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::diagnostic::DiagnosticPool;
    use crate::parser::lexer::Lexer;
    use crate::parser::parse::Parser;
    use crate::source::SourceFile;

    fn parse(source: &str) -> (TopLevelDeclaration, DiagnosticPool) {
        let mut pool = DiagnosticPool::new();
        let tokens = Lexer::new(&SourceFile::in_memory(source)).tokenize();
        let unit = Parser::new(tokens, &mut pool)
            .parse()
            .expect("parse should not halt");
        (unit, pool)
    }

    fn only_statement(source: &str) -> StatementKind {
        let (unit, pool) = parse(source);
        assert!(pool.is_empty(), "unexpected diagnostics: {:?}", pool.diagnostics());
        assert_eq!(unit.statements.len(), 1);
        unit.statements.into_iter().next().map(|s| s.kind).expect("one statement")
    }

    #[test]
    fn test_if_let_else_if_chain() {
        match only_statement("if let x = foo(), x > 0 { a() } else if b { } else { c() }") {
            StatementKind::If {
                conditions,
                else_clause: Some(ElseClause::ElseIf(nested)),
                ..
            } => {
                assert_eq!(conditions.len(), 2);
                assert!(matches!(conditions[0], Condition::OptionalBinding { is_let: true, .. }));
                assert!(matches!(
                    nested.kind,
                    StatementKind::If { else_clause: Some(ElseClause::Else(_)), .. }
                ));
            }
            other => panic!("Expected if statement, got {other:?}"),
        }
    }

    #[test]
    fn test_condition_does_not_take_trailing_closure() {
        match only_statement("while queue.isEmpty { wait() }") {
            StatementKind::While { conditions, body } => {
                assert!(matches!(
                    &conditions[0],
                    Condition::Expression(Expression { kind: ExpressionKind::ExplicitMember { .. }, .. })
                ));
                assert_eq!(body.statements.len(), 1);
            }
            other => panic!("Expected while statement, got {other:?}"),
        }
    }

    #[test]
    fn test_switch_with_cases_and_default() {
        let source = "switch shape {\ncase .circle(let r) where r > 0, .square:\n  area()\n  fallthrough\ndefault:\n  break\n}";
        match only_statement(source) {
            StatementKind::Switch { cases, .. } => {
                assert_eq!(cases.len(), 2);
                match &cases[0].label {
                    CaseLabel::Items(items) => {
                        assert_eq!(items.len(), 2);
                        assert!(items[0].where_clause.is_some());
                    }
                    other => panic!("Expected case items, got {other:?}"),
                }
                assert_eq!(cases[0].statements.len(), 2);
                assert_eq!(cases[1].label, CaseLabel::Default);
            }
            other => panic!("Expected switch statement, got {other:?}"),
        }
    }

    #[test]
    fn test_statement_before_first_case_is_reported() {
        let (unit, pool) = parse("switch x {\nfoo()\ncase 1: break\n}");
        assert_eq!(pool.error_count(), 1);
        assert!(matches!(
            &unit.statements[0].kind,
            StatementKind::Switch { cases, .. } if cases.len() == 1
        ));
    }

    #[test]
    fn test_labeled_loop_and_break() {
        match only_statement("outer: for (i, _) in pairs where i > 0 { break outer }") {
            StatementKind::Labeled { label, statement } => {
                assert_eq!(label, "outer");
                match statement.kind {
                    StatementKind::ForIn { pattern, where_clause, body, .. } => {
                        assert_eq!(pattern.bound_names(), vec!["i"]);
                        assert!(where_clause.is_some());
                        assert_eq!(
                            body.statements[0].kind,
                            StatementKind::Break(Some("outer".to_string()))
                        );
                    }
                    other => panic!("Expected for-in, got {other:?}"),
                }
            }
            other => panic!("Expected labeled statement, got {other:?}"),
        }
    }

    #[test]
    fn test_do_catch_and_guard() {
        let source = "do { try run() } catch let e as IOError { log(e) } catch { }";
        match only_statement(source) {
            StatementKind::Do { catches, .. } => {
                assert_eq!(catches.len(), 2);
                assert!(catches[0].pattern.is_some());
                assert!(catches[1].pattern.is_none());
            }
            other => panic!("Expected do statement, got {other:?}"),
        }

        assert!(matches!(
            only_statement("guard let x = y else { return }"),
            StatementKind::Guard { .. }
        ));
    }

    #[test]
    fn test_missing_separator_is_reported_once() {
        let (unit, pool) = parse("a b c\nd");
        assert_eq!(pool.error_count(), 1);
        assert_eq!(unit.statements.len(), 2);
    }

    #[test]
    fn test_redundant_semicolons_warn() {
        let (unit, pool) = parse("a();;\n;b()");
        assert_eq!(unit.statements.len(), 2);
        assert_eq!(pool.warning_count(), 2);
        assert_eq!(pool.error_count(), 0);
    }

    #[test]
    fn test_compiler_control_lines() {
        let (unit, pool) = parse("#if os(iOS) && DEBUG\nlet a = 1\n#else\nlet a = 2\n#endif");
        assert!(pool.is_empty());
        assert_eq!(unit.statements.len(), 5);
        match &unit.statements[0].kind {
            StatementKind::CompilerControl(CompilerControl::If(tokens)) => {
                assert_eq!(BalancedToken::spelling(tokens), "os (iOS) && DEBUG");
            }
            other => panic!("Expected #if, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_body_is_fatal() {
        let mut pool = DiagnosticPool::new();
        let tokens = Lexer::new(&SourceFile::in_memory("if x\nfoo()")).tokenize();
        let result = Parser::new(tokens, &mut pool).parse();
        assert!(result.is_err());
        assert!(pool.has_fatal());
    }

    #[test]
    fn test_repeat_while_and_return() {
        let (unit, pool) = parse("repeat { i += 1 } while i < 10\nfunc f() { return }");
        assert!(pool.is_empty());
        assert!(matches!(unit.statements[0].kind, StatementKind::RepeatWhile { .. }));
    }
}
