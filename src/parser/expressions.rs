//! Expression parsing implementation
//!
//! Binary, assignment, ternary and cast chains are not nested here: they are
//! collected into a flat [`ExpressionKind::Sequence`] of alternating operands
//! and operators and later restructured by [`folding`](crate::folding), once
//! every operator's precedence is known.
//!
//! # Grammar
//!
//! ```text
//! expression        ::= operand (binary-operator operand)*
//! operand           ::= 'try' ('?' | '!')? expression | prefix-expression
//! prefix-expression ::= prefix-operator? postfix-expression | '&' identifier
//! postfix-expression::= primary (call | trailing-closure | subscript
//!                      | '.' member | '?' | '!' | postfix-operator)*
//! binary-operator   ::= operator | '=' | '?' expression ':' | 'is' type
//!                     | 'as' ('?' | '!')? type
//! ```
//!
//! # Generic arguments
//!
//! After an identifier or member name, a `<` glued to the name starts a
//! speculative parse of a generic argument clause. The clause is kept only
//! if it closes cleanly and the token after it could not continue a
//! comparison; otherwise the cursor and the diagnostic pool are rolled back
//! and `<` is parsed as an operator.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::ast::*;
use crate::parser::error::{ParserError, ParserWarning};
use crate::parser::parse::{PResult, Parser, Restrictions};
use crate::parser::token::{Keyword, KeywordCategory, PoundKeyword, Punctuator, StringSegment, Token};

impl<'pool> Parser<'pool> {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> PResult<Expression> {
        let start = self.current_start();
        let mut elements = vec![SequenceElement::Operand(self.parse_operand()?)];

        loop {
            let token = self.peek().token.clone();
            let operator = match token {
                Token::BinaryOperator(op) => {
                    self.advance();
                    SequenceOperator::Binary(op)
                }
                Token::Punctuator(Punctuator::Equal) if !self.restrictions.no_assignment => {
                    self.advance();
                    SequenceOperator::Assignment
                }
                Token::Punctuator(Punctuator::Question) => {
                    self.advance();
                    let middle =
                        self.with_restrictions(Restrictions::default(), |p| p.parse_expression())?;
                    self.expect(Punctuator::Colon, "after '?' in ternary expression")?;
                    SequenceOperator::Ternary(Box::new(middle))
                }
                Token::Keyword(Keyword::Is) => {
                    self.advance();
                    SequenceOperator::Cast(CastKind::Is)
                }
                Token::Keyword(Keyword::As) => {
                    self.advance();
                    if self.eat(Punctuator::PostfixQuestion) {
                        SequenceOperator::Cast(CastKind::ConditionalAs)
                    } else if self.eat(Punctuator::PostfixExclaim) {
                        SequenceOperator::Cast(CastKind::ForcedAs)
                    } else {
                        SequenceOperator::Cast(CastKind::As)
                    }
                }
                _ => break,
            };

            let is_cast = matches!(operator, SequenceOperator::Cast(_));
            elements.push(SequenceElement::Operator(operator));
            if is_cast {
                let type_start = self.current_start();
                let ty = self.parse_type()?;
                let operand = self.make_expression(ExpressionKind::Type(ty), type_start);
                elements.push(SequenceElement::Operand(operand));
            } else {
                elements.push(SequenceElement::Operand(self.parse_operand()?));
            }
        }

        if elements.len() == 1 {
            if let Some(SequenceElement::Operand(operand)) = elements.pop() {
                return Ok(operand);
            }
        }
        Ok(self.make_expression(ExpressionKind::Sequence(elements), start))
    }

    /// `try` covers everything to its right, so it takes a whole expression.
    fn parse_operand(&mut self) -> PResult<Expression> {
        if !self.check_keyword(Keyword::Try) {
            return self.parse_prefix_expression();
        }
        let start = self.current_start();
        self.advance();
        let kind = if self.eat(Punctuator::PostfixQuestion) {
            TryKind::Optional
        } else if self.eat(Punctuator::PostfixExclaim) {
            TryKind::Forced
        } else {
            TryKind::Try
        };
        let expression = self.parse_expression()?;
        Ok(self.make_expression(
            ExpressionKind::Try {
                kind,
                expression: Box::new(expression),
            },
            start,
        ))
    }

    fn parse_prefix_expression(&mut self) -> PResult<Expression> {
        let start = self.current_start();
        let lexeme = self.peek().clone();
        match lexeme.token {
            Token::PrefixOperator(op) => {
                self.advance();
                self.warn_deprecated_increment(&op, &lexeme.range)?;
                let operand = self.parse_postfix_expression()?;
                Ok(self.make_expression(
                    ExpressionKind::PrefixOperator {
                        operator: op,
                        operand: Box::new(operand),
                    },
                    start,
                ))
            }
            Token::Punctuator(Punctuator::Ampersand) => {
                self.advance();
                let name = self
                    .expect_identifier("after '&'")?
                    .unwrap_or_default();
                Ok(self.make_expression(ExpressionKind::InOut(name), start))
            }
            _ => self.parse_postfix_expression(),
        }
    }

    fn warn_deprecated_increment(
        &mut self,
        op: &str,
        at: &crate::source::SourceRange,
    ) -> PResult<()> {
        if op == "++" || op == "--" {
            self.warning(ParserWarning::DeprecatedIncrement(op.to_string()), at)?;
        }
        Ok(())
    }

    pub(crate) fn parse_postfix_expression(&mut self) -> PResult<Expression> {
        let start = self.current_start();
        let mut expression = self.parse_primary_expression()?;

        loop {
            let lexeme = self.peek().clone();
            let kind = match lexeme.token {
                Token::Punctuator(Punctuator::LeftParen)
                    if !lexeme.newline_before && self.argument_names_follow() =>
                {
                    ExpressionKind::ArgumentNames {
                        base: Box::new(expression),
                        names: self.parse_argument_names(),
                    }
                }
                Token::Punctuator(Punctuator::LeftParen) if !lexeme.newline_before => {
                    let arguments = self.parse_argument_list(Punctuator::RightParen)?;
                    let trailing_closure = if self.trailing_closure_follows() {
                        Some(Box::new(self.parse_closure_expression()?))
                    } else {
                        None
                    };
                    ExpressionKind::FunctionCall {
                        callee: Box::new(expression),
                        arguments,
                        trailing_closure,
                    }
                }
                Token::Punctuator(Punctuator::LeftBrace) if self.trailing_closure_follows() => {
                    let closure = self.parse_closure_expression()?;
                    ExpressionKind::FunctionCall {
                        callee: Box::new(expression),
                        arguments: Vec::new(),
                        trailing_closure: Some(Box::new(closure)),
                    }
                }
                Token::Punctuator(Punctuator::LeftSquare) if !lexeme.newline_before => {
                    let arguments = self.parse_argument_list(Punctuator::RightSquare)?;
                    ExpressionKind::Subscript {
                        base: Box::new(expression),
                        arguments,
                    }
                }
                Token::Punctuator(Punctuator::Period) => {
                    self.advance();
                    match self.parse_member_suffix(expression)? {
                        Ok(kind) => kind,
                        Err(base) => {
                            expression = base;
                            break;
                        }
                    }
                }
                Token::Punctuator(Punctuator::PostfixQuestion) => {
                    self.advance();
                    ExpressionKind::OptionalChaining(Box::new(expression))
                }
                Token::Punctuator(Punctuator::PostfixExclaim) => {
                    self.advance();
                    ExpressionKind::ForcedValue(Box::new(expression))
                }
                Token::PostfixOperator(op) => {
                    self.advance();
                    self.warn_deprecated_increment(&op, &lexeme.range)?;
                    ExpressionKind::PostfixOperator {
                        operator: op,
                        operand: Box::new(expression),
                    }
                }
                _ => break,
            };
            expression = self.make_expression(kind, start.clone());
        }

        Ok(expression)
    }

    /// What follows `base.`; hands `base` back if no member name follows.
    fn parse_member_suffix(
        &mut self,
        base: Expression,
    ) -> PResult<Result<ExpressionKind, Expression>> {
        let lexeme = self.peek().clone();
        let kind = match lexeme.token {
            Token::DecimalIntegerLiteral(digits) => {
                self.advance();
                match digits.replace('_', "").parse::<usize>() {
                    Ok(index) => ExpressionKind::ExplicitMember {
                        base: Box::new(base),
                        member: Member::TupleIndex(index),
                    },
                    Err(_) => {
                        self.error(ParserError::ExpectedMemberName(digits), &lexeme.range)?;
                        return Ok(Err(base));
                    }
                }
            }
            Token::Keyword(Keyword::SelfValue) => {
                self.advance();
                ExpressionKind::PostfixSelf(Box::new(base))
            }
            Token::Keyword(Keyword::Init) => {
                self.advance();
                ExpressionKind::Initializer(Box::new(base))
            }
            _ => match self.eat_member_name() {
                Some(name) => {
                    let generic_arguments = self.parse_speculative_generic_arguments()?;
                    ExpressionKind::ExplicitMember {
                        base: Box::new(base),
                        member: Member::Named {
                            name,
                            generic_arguments,
                        },
                    }
                }
                None => {
                    self.error(
                        ParserError::ExpectedMemberName(lexeme.token.to_string()),
                        &lexeme,
                    )?;
                    return Ok(Err(base));
                }
            },
        };
        Ok(Ok(kind))
    }

    /// `(label:)`, `(_:_:)`: at least one name, each directly followed by `:`
    fn argument_names_follow(&self) -> bool {
        let mut n = 1;
        loop {
            if !self.is_member_name(n)
                || !self.peek_ahead(n + 1).token.is_punctuator(Punctuator::Colon)
            {
                return false;
            }
            n += 2;
            if self.peek_ahead(n).token.is_punctuator(Punctuator::RightParen) {
                return true;
            }
        }
    }

    fn parse_argument_names(&mut self) -> Vec<Option<String>> {
        self.advance();
        let mut names = Vec::new();
        while !self.check(Punctuator::RightParen) && !self.is_at_end() {
            let name = self.eat_member_name();
            names.push(name.filter(|name| name != "_"));
            self.advance();
        }
        self.advance();
        names
    }

    fn trailing_closure_follows(&self) -> bool {
        let lexeme = self.peek();
        lexeme.token.is_punctuator(Punctuator::LeftBrace)
            && !lexeme.newline_before
            && !self.restrictions.no_trailing_closure
            && !self.brace_starts_observer_block()
    }

    /// `<T, U>` directly after a name, kept only if it reads as a generic
    /// argument clause.
    pub(crate) fn parse_speculative_generic_arguments(&mut self) -> PResult<Option<Vec<Type>>> {
        let lexeme = self.peek();
        if lexeme.space_before || lexeme.token.operator_text() != Some("<") {
            return Ok(None);
        }
        Ok(self.speculate(|p| {
            let arguments = p.parse_generic_argument_clause()?;
            if arguments.is_some() && p.closes_generic_clause() {
                Ok(arguments)
            } else {
                Ok(None)
            }
        }))
    }

    /// Tokens that may follow a generic argument clause in an expression.
    fn closes_generic_clause(&self) -> bool {
        let lexeme = self.peek();
        if lexeme.newline_before {
            return true;
        }
        match &lexeme.token {
            Token::Eof => true,
            Token::Punctuator(punctuator) => matches!(
                punctuator,
                Punctuator::LeftParen
                    | Punctuator::RightParen
                    | Punctuator::RightSquare
                    | Punctuator::RightBrace
                    | Punctuator::Period
                    | Punctuator::Comma
                    | Punctuator::Colon
                    | Punctuator::Semicolon
                    | Punctuator::PostfixQuestion
                    | Punctuator::PostfixExclaim
            ),
            token => matches!(token.operator_text(), Some("==" | "!=")),
        }
    }

    /// `( [label:] expr, ... )` or `[ ... ]`, returning the arguments.
    fn parse_argument_list(&mut self, close: Punctuator) -> PResult<Vec<Argument>> {
        self.advance();
        self.with_restrictions(Restrictions::default(), |p| {
            let mut arguments = Vec::new();
            while !p.check(close) && !p.is_at_end() {
                let label = p.parse_element_label();
                let expression = p.parse_expression()?;
                arguments.push(Argument { label, expression });
                if !p.eat(Punctuator::Comma) {
                    break;
                }
            }
            p.expect(close, "to close argument list")?;
            Ok(arguments)
        })
    }

    /// `name:` in front of an argument or tuple element
    fn parse_element_label(&mut self) -> Option<String> {
        if self.is_member_name(0) && self.peek_ahead(1).token.is_punctuator(Punctuator::Colon) {
            let label = self.eat_member_name();
            self.advance();
            return label;
        }
        None
    }

    fn parse_primary_expression(&mut self) -> PResult<Expression> {
        let start = self.current_start();
        let lexeme = self.peek().clone();

        let kind = match lexeme.token {
            Token::BinaryIntegerLiteral(raw) => self.literal(Literal::Integer {
                raw,
                radix: Radix::Binary,
            }),
            Token::OctalIntegerLiteral(raw) => self.literal(Literal::Integer {
                raw,
                radix: Radix::Octal,
            }),
            Token::DecimalIntegerLiteral(raw) => self.literal(Literal::Integer {
                raw,
                radix: Radix::Decimal,
            }),
            Token::HexadecimalIntegerLiteral(raw) => self.literal(Literal::Integer {
                raw,
                radix: Radix::Hexadecimal,
            }),
            Token::DecimalFloatLiteral(raw) => self.literal(Literal::Float {
                raw,
                radix: Radix::Decimal,
            }),
            Token::HexadecimalFloatLiteral(raw) => self.literal(Literal::Float {
                raw,
                radix: Radix::Hexadecimal,
            }),
            Token::StaticStringLiteral { value, .. } => self.literal(Literal::String(value)),
            Token::InterpolatedStringLiteral { segments, .. } => {
                self.advance();
                self.parse_interpolated_segments(segments)?
            }
            Token::Keyword(Keyword::True) => self.literal(Literal::Boolean(true)),
            Token::Keyword(Keyword::False) => self.literal(Literal::Boolean(false)),
            Token::Keyword(Keyword::Nil) => self.literal(Literal::Nil),
            Token::Keyword(Keyword::SelfValue) => {
                self.advance();
                ExpressionKind::SelfExpression(self.parse_self_form()?)
            }
            Token::Keyword(Keyword::Super) => {
                self.advance();
                let form = self.parse_self_form()?;
                if form == SelfForm::Plain {
                    self.error(ParserError::BareSuper, &lexeme)?;
                }
                ExpressionKind::Super(form)
            }
            Token::Keyword(keyword @ (Keyword::SelfType | Keyword::Any)) => {
                self.advance();
                ExpressionKind::Identifier {
                    name: keyword.as_str().to_string(),
                    generic_arguments: None,
                }
            }
            Token::Keyword(Keyword::Underscore) => {
                self.advance();
                ExpressionKind::Wildcard
            }
            Token::Identifier(name) | Token::BacktickIdentifier(name) => {
                self.advance();
                let generic_arguments = self.parse_speculative_generic_arguments()?;
                ExpressionKind::Identifier {
                    name,
                    generic_arguments,
                }
            }
            Token::PoundKeyword(keyword) => match keyword {
                PoundKeyword::File => self.magic(MagicLiteral::File),
                PoundKeyword::Line => self.magic(MagicLiteral::Line),
                PoundKeyword::Column => self.magic(MagicLiteral::Column),
                PoundKeyword::Function => self.magic(MagicLiteral::Function),
                PoundKeyword::Selector => {
                    self.advance();
                    self.expect(Punctuator::LeftParen, "after '#selector'")?;
                    let inner = self
                        .with_restrictions(Restrictions::default(), |p| p.parse_expression())?;
                    self.expect(Punctuator::RightParen, "to close '#selector'")?;
                    ExpressionKind::Selector(Box::new(inner))
                }
                _ => {
                    self.error(
                        ParserError::ExpectedExpression(lexeme.token.to_string()),
                        &lexeme,
                    )?;
                    ExpressionKind::Wildcard
                }
            },
            Token::Punctuator(Punctuator::Period) => {
                self.advance();
                if self.eat_keyword(Keyword::Init) {
                    ExpressionKind::ImplicitMember("init".to_string())
                } else if let Some(name) = self.eat_member_name() {
                    ExpressionKind::ImplicitMember(name)
                } else {
                    let next = self.peek().clone();
                    self.error(ParserError::ExpectedMemberName(next.token.to_string()), &next)?;
                    ExpressionKind::Wildcard
                }
            }
            Token::Punctuator(Punctuator::LeftParen) => self.parse_parenthesized_expression()?,
            Token::Punctuator(Punctuator::LeftSquare) => self.parse_collection_literal()?,
            Token::Punctuator(Punctuator::LeftBrace) => return self.parse_closure_expression(),
            ref token
                if token.operator_text().is_some()
                    && matches!(
                        self.peek_ahead(1).token,
                        Token::Punctuator(Punctuator::RightParen | Punctuator::Comma)
                    ) =>
            {
                // an operator passed as a function value: `reduce(0, +)`
                let name = token.operator_text().unwrap_or_default().to_string();
                self.advance();
                ExpressionKind::Identifier {
                    name,
                    generic_arguments: None,
                }
            }
            ref token => {
                self.error(ParserError::ExpectedExpression(token.to_string()), &lexeme.range)?;
                ExpressionKind::Wildcard
            }
        };

        Ok(self.make_expression(kind, start))
    }

    fn literal(&mut self, literal: Literal) -> ExpressionKind {
        self.advance();
        ExpressionKind::Literal(literal)
    }

    fn magic(&mut self, magic: MagicLiteral) -> ExpressionKind {
        self.advance();
        ExpressionKind::Magic(magic)
    }

    fn parse_interpolated_segments(
        &mut self,
        segments: Vec<StringSegment>,
    ) -> PResult<ExpressionKind> {
        let mut parsed = Vec::with_capacity(segments.len());
        for segment in segments {
            parsed.push(match segment {
                StringSegment::Text(text) => InterpolatedSegment::Text(text),
                StringSegment::Interpolation { source, start } => {
                    InterpolatedSegment::Expression(self.parse_interpolation(&source, &start)?)
                }
            });
        }
        Ok(ExpressionKind::InterpolatedString(parsed))
    }

    /// What follows `self` or `super`
    fn parse_self_form(&mut self) -> PResult<SelfForm> {
        if self.check(Punctuator::Period) {
            if self.peek_ahead(1).token.is_keyword(Keyword::Init) {
                self.advance();
                self.advance();
                return Ok(SelfForm::Initializer);
            }
            if self.is_member_name(1) && !self.peek_ahead(1).token.is_keyword(Keyword::SelfValue) {
                self.advance();
                let name = self.eat_member_name().unwrap_or_default();
                return Ok(SelfForm::Member(name));
            }
        }
        if self.check(Punctuator::LeftSquare) && !self.peek().newline_before {
            let arguments = self.parse_argument_list(Punctuator::RightSquare)?;
            return Ok(SelfForm::Subscript(arguments));
        }
        Ok(SelfForm::Plain)
    }

    /// `(expr)` or `(label: a, b)`; `()` is the empty tuple
    fn parse_parenthesized_expression(&mut self) -> PResult<ExpressionKind> {
        self.advance();
        self.with_restrictions(Restrictions::default(), |p| {
            let mut elements = Vec::new();
            while !p.check(Punctuator::RightParen) && !p.is_at_end() {
                let label = p.parse_element_label();
                let expression = p.parse_expression()?;
                elements.push(TupleElement { label, expression });
                if !p.eat(Punctuator::Comma) {
                    break;
                }
            }
            p.expect(Punctuator::RightParen, "to close parenthesized expression")?;

            if elements.len() == 1 && elements[0].label.is_none() {
                if let Some(element) = elements.pop() {
                    return Ok(ExpressionKind::Parenthesized(Box::new(element.expression)));
                }
            }
            Ok(ExpressionKind::Tuple(elements))
        })
    }

    /// `[a, b]`, `[k: v]`, `[]` or `[:]`
    fn parse_collection_literal(&mut self) -> PResult<ExpressionKind> {
        self.advance();
        self.with_restrictions(Restrictions::default(), |p| {
            if p.eat(Punctuator::Colon) {
                p.expect(Punctuator::RightSquare, "to close dictionary literal")?;
                return Ok(ExpressionKind::Dictionary(Vec::new()));
            }
            if p.eat(Punctuator::RightSquare) {
                return Ok(ExpressionKind::Array(Vec::new()));
            }

            let first = p.parse_expression()?;
            if p.eat(Punctuator::Colon) {
                let value = p.parse_expression()?;
                let mut entries = vec![DictionaryEntry { key: first, value }];
                while p.eat(Punctuator::Comma) {
                    if p.check(Punctuator::RightSquare) {
                        break;
                    }
                    let key = p.parse_expression()?;
                    p.expect(Punctuator::Colon, "in dictionary literal")?;
                    let value = p.parse_expression()?;
                    entries.push(DictionaryEntry { key, value });
                }
                p.expect(Punctuator::RightSquare, "to close dictionary literal")?;
                return Ok(ExpressionKind::Dictionary(entries));
            }

            let mut elements = vec![first];
            while p.eat(Punctuator::Comma) {
                if p.check(Punctuator::RightSquare) {
                    break;
                }
                elements.push(p.parse_expression()?);
            }
            p.expect(Punctuator::RightSquare, "to close array literal")?;
            Ok(ExpressionKind::Array(elements))
        })
    }

    /// `{ [captures] signature in statements }`
    pub(crate) fn parse_closure_expression(&mut self) -> PResult<Expression> {
        let start = self.current_start();
        self.advance();
        let closure = self.with_restrictions(Restrictions::default(), |p| {
            let (captures, signature) = if p.closure_header_follows() {
                p.speculate(|p| p.parse_closure_header()).unwrap_or_default()
            } else {
                Default::default()
            };
            let statements = p.parse_statements(|p| p.check(Punctuator::RightBrace))?;
            p.expect(Punctuator::RightBrace, "to close closure")?;
            Ok(Closure {
                captures,
                signature,
                statements,
            })
        })?;
        Ok(self.make_expression(ExpressionKind::Closure(closure), start))
    }

    /// Token-level scan for the `in` ending a closure header. Only tokens
    /// up to the first statement boundary outside brackets are examined, so
    /// a closure without a header is never parsed twice.
    fn closure_header_follows(&self) -> bool {
        let mut depth = 0usize;
        let mut n = 0;
        loop {
            let token = &self.peek_ahead(n).token;
            n += 1;
            match token {
                Token::Eof => return false,
                Token::Punctuator(
                    Punctuator::LeftParen | Punctuator::LeftSquare | Punctuator::LeftBrace,
                ) => depth += 1,
                Token::Punctuator(
                    Punctuator::RightParen | Punctuator::RightSquare | Punctuator::RightBrace,
                ) => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                _ if depth > 0 => {}
                Token::Keyword(Keyword::In) => return true,
                Token::Punctuator(Punctuator::Semicolon | Punctuator::Equal) => return false,
                Token::Keyword(Keyword::Inout | Keyword::Rethrows) => {}
                Token::Keyword(keyword) => {
                    if matches!(
                        keyword.category(),
                        KeywordCategory::Statement | KeywordCategory::Declaration
                    ) {
                        return false;
                    }
                }
                _ => {}
            }
        }
    }

    /// Everything up to and including `in`; `None` if the closure has no header.
    fn parse_closure_header(
        &mut self,
    ) -> PResult<Option<(Vec<Capture>, Option<ClosureSignature>)>> {
        let captures = if self.check(Punctuator::LeftSquare) {
            match self.parse_capture_list()? {
                Some(captures) => captures,
                None => return Ok(None),
            }
        } else {
            Vec::new()
        };

        let signature = if self.check_keyword(Keyword::In) {
            None
        } else {
            match self.parse_closure_signature()? {
                Some(signature) => Some(signature),
                None => return Ok(None),
            }
        };

        if !self.eat_keyword(Keyword::In) {
            return Ok(None);
        }
        Ok(Some((captures, signature)))
    }

    fn parse_capture_list(&mut self) -> PResult<Option<Vec<Capture>>> {
        self.advance();
        let mut captures = Vec::new();
        while !self.check(Punctuator::RightSquare) && !self.is_at_end() {
            let specifier = if self.eat_contextual("weak") {
                Some(CaptureSpecifier::Weak)
            } else if self.eat_contextual("unowned") {
                if self.eat(Punctuator::LeftParen) {
                    let specifier = match self.eat_identifier().as_deref() {
                        Some("safe") => CaptureSpecifier::UnownedSafe,
                        Some("unsafe") => CaptureSpecifier::UnownedUnsafe,
                        _ => return Ok(None),
                    };
                    if !self.eat(Punctuator::RightParen) {
                        return Ok(None);
                    }
                    Some(specifier)
                } else {
                    Some(CaptureSpecifier::Unowned)
                }
            } else {
                None
            };
            let expression = self.parse_expression()?;
            captures.push(Capture {
                specifier,
                expression,
            });
            if !self.eat(Punctuator::Comma) {
                break;
            }
        }
        if !self.eat(Punctuator::RightSquare) {
            return Ok(None);
        }
        Ok(Some(captures))
    }

    fn parse_closure_signature(&mut self) -> PResult<Option<ClosureSignature>> {
        let parameters = if self.eat(Punctuator::LeftParen) {
            let mut parameters = Vec::new();
            while !self.check(Punctuator::RightParen) && !self.is_at_end() {
                let Some(name) = self.eat_closure_parameter_name() else {
                    return Ok(None);
                };
                let type_annotation = if self.eat(Punctuator::Colon) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let is_variadic = self.eat_operator("...");
                parameters.push(ClosureParameter {
                    name,
                    type_annotation,
                    is_variadic,
                });
                if !self.eat(Punctuator::Comma) {
                    break;
                }
            }
            if !self.eat(Punctuator::RightParen) {
                return Ok(None);
            }
            ClosureParameters::Clause(parameters)
        } else {
            let mut names = Vec::new();
            loop {
                let Some(name) = self.eat_closure_parameter_name() else {
                    return Ok(None);
                };
                names.push(name);
                if !self.eat(Punctuator::Comma) {
                    break;
                }
            }
            ClosureParameters::Names(names)
        };

        let throws = self.parse_throws();
        let result = if self.eat(Punctuator::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        Ok(Some(ClosureSignature {
            parameters,
            throws,
            result,
        }))
    }

    fn eat_closure_parameter_name(&mut self) -> Option<String> {
        if self.eat_keyword(Keyword::Underscore) {
            return Some("_".to_string());
        }
        self.eat_identifier()
    }

    pub(crate) fn eat_operator(&mut self, text: &str) -> bool {
        if self.check_operator(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn parse_throws(&mut self) -> ThrowsKind {
        if self.eat_keyword(Keyword::Throws) {
            ThrowsKind::Throwing
        } else if self.eat_keyword(Keyword::Rethrows) {
            ThrowsKind::Rethrowing
        } else {
            ThrowsKind::Nothrowing
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::diagnostic::DiagnosticPool;
    use crate::parser::lexer::Lexer;
    use crate::parser::parse::Parser;
    use crate::source::SourceFile;

    fn parse_expr(source: &str) -> (Expression, DiagnosticPool) {
        let mut pool = DiagnosticPool::new();
        let tokens = Lexer::new(&SourceFile::in_memory(source)).tokenize();
        let expression = Parser::new(tokens, &mut pool)
            .parse_expression()
            .expect("expression should parse");
        (expression, pool)
    }

    fn sequence(expression: &Expression) -> &[SequenceElement] {
        match &expression.kind {
            ExpressionKind::Sequence(elements) => elements,
            other => panic!("Expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_binary_chain_stays_flat() {
        let (expression, pool) = parse_expr("a + b * c");
        assert!(pool.is_empty());
        let elements = sequence(&expression);
        assert_eq!(elements.len(), 5);
        assert!(matches!(
            &elements[1],
            SequenceElement::Operator(SequenceOperator::Binary(op)) if op == "+"
        ));
        assert!(is_well_formed_sequence(elements));
    }

    #[test]
    fn test_cast_is_followed_by_type_operand() {
        let (expression, _) = parse_expr("x as? Int ?? 0");
        let elements = sequence(&expression);
        assert_eq!(elements.len(), 5);
        assert!(matches!(
            elements[1],
            SequenceElement::Operator(SequenceOperator::Cast(CastKind::ConditionalAs))
        ));
        assert!(matches!(
            &elements[2],
            SequenceElement::Operand(Expression { kind: ExpressionKind::Type(_), .. })
        ));
    }

    #[test]
    fn test_ternary_and_assignment() {
        let (expression, pool) = parse_expr("x = c ? 1 : 2");
        assert!(pool.is_empty());
        let elements = sequence(&expression);
        assert_eq!(elements.len(), 5);
        assert!(matches!(
            elements[1],
            SequenceElement::Operator(SequenceOperator::Assignment)
        ));
        assert!(matches!(
            elements[3],
            SequenceElement::Operator(SequenceOperator::Ternary(_))
        ));
    }

    #[test]
    fn test_generic_call_is_not_a_comparison() {
        let (expression, pool) = parse_expr("Array<Int>(repeating: 0, count: 3)");
        assert!(pool.is_empty());
        match &expression.kind {
            ExpressionKind::FunctionCall { callee, arguments, .. } => {
                assert!(matches!(
                    &callee.kind,
                    ExpressionKind::Identifier { generic_arguments: Some(args), .. } if args.len() == 1
                ));
                assert_eq!(arguments[0].label.as_deref(), Some("repeating"));
            }
            other => panic!("Expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_comparison_falls_back_after_failed_speculation() {
        let (expression, pool) = parse_expr("a<b && c>d");
        assert!(pool.is_empty());
        let elements = sequence(&expression);
        assert_eq!(elements.len(), 7);
    }

    #[test]
    fn test_postfix_chain() {
        let (expression, _) = parse_expr("a?.b!.c[0](x)");
        let mut kinds = Vec::new();
        let mut current = &expression;
        loop {
            kinds.push(NodeRef::Expression(current).kind_name());
            current = match &current.kind {
                ExpressionKind::FunctionCall { callee, .. } => callee,
                ExpressionKind::Subscript { base, .. } => base,
                ExpressionKind::ExplicitMember { base, .. } => base,
                ExpressionKind::ForcedValue(inner) | ExpressionKind::OptionalChaining(inner) => {
                    inner
                }
                _ => break,
            };
        }
        assert_eq!(
            kinds,
            vec![
                "FunctionCallExpression",
                "SubscriptExpression",
                "ExplicitMemberExpression",
                "ForcedValueExpression",
                "ExplicitMemberExpression",
                "OptionalChainingExpression",
                "IdentifierExpression",
            ]
        );
    }

    #[test]
    fn test_closure_with_signature_and_captures() {
        let (expression, pool) = parse_expr("{ [weak self] (a: Int, b) -> Int in a + b }");
        assert!(pool.is_empty());
        match &expression.kind {
            ExpressionKind::Closure(closure) => {
                assert_eq!(closure.captures.len(), 1);
                assert_eq!(closure.captures[0].specifier, Some(CaptureSpecifier::Weak));
                let signature = closure.signature.as_ref().expect("signature");
                assert!(matches!(&signature.parameters, ClosureParameters::Clause(p) if p.len() == 2));
                assert!(signature.result.is_some());
                assert_eq!(closure.statements.len(), 1);
            }
            other => panic!("Expected closure, got {other:?}"),
        }
    }

    #[test]
    fn test_closure_body_starting_with_array_literal() {
        let (expression, pool) = parse_expr("{ [1, 2].count }");
        assert!(pool.is_empty());
        match &expression.kind {
            ExpressionKind::Closure(closure) => {
                assert!(closure.captures.is_empty());
                assert!(closure.signature.is_none());
                assert_eq!(closure.statements.len(), 1);
            }
            other => panic!("Expected closure, got {other:?}"),
        }
    }

    #[test]
    fn test_deeply_nested_closures_parse_in_linear_time() {
        let depth = 25;
        let source = format!("{}1{}", "{ [".repeat(depth), "] }".repeat(depth));
        let started = std::time::Instant::now();
        let (mut expression, pool) = parse_expr(&source);
        assert!(pool.is_empty());
        assert!(started.elapsed() < std::time::Duration::from_secs(2));

        for _ in 0..depth {
            let closure = match expression.kind {
                ExpressionKind::Closure(closure) => closure,
                other => panic!("Expected closure, got {other:?}"),
            };
            assert!(closure.captures.is_empty());
            assert!(closure.signature.is_none());
            let statement = closure.statements.into_iter().next().expect("statement");
            expression = match statement.kind {
                StatementKind::Expression(Expression {
                    kind: ExpressionKind::Array(mut elements),
                    ..
                }) => elements.remove(0),
                other => panic!("Expected array literal, got {other:?}"),
            };
        }
        assert!(matches!(expression.kind, ExpressionKind::Literal(_)));
    }

    #[test]
    fn test_closure_without_header_containing_for_in() {
        let (expression, pool) = parse_expr("{ for x in xs { print(x) } }");
        assert!(pool.is_empty());
        match &expression.kind {
            ExpressionKind::Closure(closure) => {
                assert!(closure.signature.is_none());
                assert!(matches!(closure.statements[0].kind, StatementKind::ForIn { .. }));
            }
            other => panic!("Expected closure, got {other:?}"),
        }
    }

    #[test]
    fn test_selector_with_argument_names() {
        let (expression, pool) = parse_expr("#selector(foo(_:))");
        assert!(pool.is_empty());
        match &expression.kind {
            ExpressionKind::Selector(inner) => match &inner.kind {
                ExpressionKind::ArgumentNames { base, names } => {
                    assert!(matches!(&base.kind, ExpressionKind::Identifier { name, .. } if name == "foo"));
                    assert_eq!(names, &vec![None]);
                }
                other => panic!("Expected argument names, got {other:?}"),
            },
            other => panic!("Expected selector, got {other:?}"),
        }

        let (expression, pool) = parse_expr("#selector(Foo.bar(with:for:))");
        assert!(pool.is_empty());
        let ExpressionKind::Selector(inner) = &expression.kind else {
            panic!("Expected selector, got {:?}", expression.kind);
        };
        match &inner.kind {
            ExpressionKind::ArgumentNames { base, names } => {
                assert!(matches!(base.kind, ExpressionKind::ExplicitMember { .. }));
                assert_eq!(names, &vec![Some("with".to_string()), Some("for".to_string())]);
            }
            other => panic!("Expected argument names, got {other:?}"),
        }
    }

    #[test]
    fn test_labeled_call_is_not_argument_names() {
        let (expression, pool) = parse_expr("foo(x: y)");
        assert!(pool.is_empty());
        assert!(matches!(expression.kind, ExpressionKind::FunctionCall { .. }));
    }

    #[test]
    fn test_trailing_closure_and_operator_argument() {
        let (expression, pool) = parse_expr("xs.reduce(0, +)");
        assert!(pool.is_empty());
        match &expression.kind {
            ExpressionKind::FunctionCall { arguments, .. } => assert!(matches!(
                &arguments[1].expression.kind,
                ExpressionKind::Identifier { name, .. } if name == "+"
            )),
            other => panic!("Expected call, got {other:?}"),
        }

        let (expression, _) = parse_expr("xs.map { $0 * 2 }");
        assert!(matches!(
            expression.kind,
            ExpressionKind::FunctionCall { trailing_closure: Some(_), .. }
        ));
    }

    #[test]
    fn test_interpolation_is_parsed_in_place() {
        let (expression, pool) = parse_expr(r#""sum: \(a + b)!""#);
        assert!(pool.is_empty());
        match &expression.kind {
            ExpressionKind::InterpolatedString(segments) => {
                assert_eq!(segments.len(), 3);
                match &segments[1] {
                    InterpolatedSegment::Expression(inner) => {
                        assert!(inner.is_sequence());
                        assert_eq!(inner.range.start.column, 9);
                    }
                    other => panic!("Expected expression segment, got {other:?}"),
                }
            }
            other => panic!("Expected interpolated string, got {other:?}"),
        }
    }

    #[test]
    fn test_literals_and_collections() {
        let (expression, _) = parse_expr("[\"a\": 0x1F, \"b\": 1.5]");
        assert!(matches!(&expression.kind, ExpressionKind::Dictionary(entries) if entries.len() == 2));

        let (expression, _) = parse_expr("[:]");
        assert!(matches!(&expression.kind, ExpressionKind::Dictionary(entries) if entries.is_empty()));

        let (expression, _) = parse_expr("(1, label: true)");
        assert!(matches!(&expression.kind, ExpressionKind::Tuple(elements) if elements.len() == 2));
    }

    #[test]
    fn test_self_super_and_implicit_member() {
        let (expression, _) = parse_expr("super.init(frame: .zero)");
        match &expression.kind {
            ExpressionKind::FunctionCall { callee, arguments, .. } => {
                assert_eq!(callee.kind, ExpressionKind::Super(SelfForm::Initializer));
                assert!(matches!(
                    &arguments[0].expression.kind,
                    ExpressionKind::ImplicitMember(name) if name == "zero"
                ));
            }
            other => panic!("Expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_try_covers_rest_of_sequence() {
        let (expression, _) = parse_expr("try? load() ?? fallback");
        match &expression.kind {
            ExpressionKind::Try { kind, expression } => {
                assert_eq!(*kind, TryKind::Optional);
                assert!(expression.is_sequence());
            }
            other => panic!("Expected try, got {other:?}"),
        }
    }

    #[test]
    fn test_deprecated_increment_warns() {
        let (_, pool) = parse_expr("i++");
        assert_eq!(pool.warning_count(), 1);
    }

    #[test]
    fn test_missing_operand_reports_error() {
        let (expression, pool) = parse_expr("a + )");
        assert_eq!(pool.error_count(), 1);
        let elements = sequence(&expression);
        assert!(matches!(
            &elements[2],
            SequenceElement::Operand(Expression { kind: ExpressionKind::Wildcard, .. })
        ));
    }
}
