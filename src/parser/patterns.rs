//! Pattern parsing
//!
//! Two flavours exist. Binding patterns appear where names are introduced
//! (`let`/`var` declarations, `for-in`, optional binding) and only allow
//! names, wildcards and tuples. Matching patterns appear after `case` and
//! `catch`; anything not recognised as a pattern form is parsed as an
//! expression and matched with `~=`.
//!
//! # Grammar
//!
//! ```text
//! binding-pattern  ::= ('_' | identifier | '(' binding-pattern, ... ')') type-annotation?
//! matching-pattern ::= primary-pattern ('?' | 'as' type)*
//! primary-pattern  ::= '_' | ('let' | 'var') matching-pattern | 'is' type
//!                    | '(' ([label ':'] matching-pattern), ... ')'
//!                    | type-identifier? '.' name tuple-pattern?
//!                    | expression
//! ```

use crate::ast::*;
use crate::parser::error::ParserError;
use crate::parser::parse::{PResult, Parser, Restrictions};
use crate::parser::token::{Keyword, Punctuator, Token};

impl<'pool> Parser<'pool> {
    pub(crate) fn parse_binding_pattern(&mut self) -> PResult<Pattern> {
        let start = self.current_start();
        let lexeme = self.peek().clone();
        let kind = match lexeme.token {
            Token::Keyword(Keyword::Underscore) => {
                self.advance();
                PatternKind::Wildcard {
                    type_annotation: self.parse_type_annotation()?,
                }
            }
            Token::Identifier(name) | Token::BacktickIdentifier(name) => {
                self.advance();
                PatternKind::Identifier {
                    name,
                    type_annotation: self.parse_type_annotation()?,
                }
            }
            Token::Punctuator(Punctuator::LeftParen) => {
                let elements = self.parse_tuple_pattern_elements(|p| p.parse_binding_pattern())?;
                PatternKind::Tuple {
                    elements,
                    type_annotation: self.parse_type_annotation()?,
                }
            }
            ref token => {
                self.error(ParserError::ExpectedPattern(token.to_string()), &lexeme.range)?;
                PatternKind::Wildcard {
                    type_annotation: None,
                }
            }
        };
        Ok(self.make_pattern(kind, start))
    }

    /// `: T` after a binding pattern
    pub(crate) fn parse_type_annotation(&mut self) -> PResult<Option<Type>> {
        if self.eat(Punctuator::Colon) {
            Ok(Some(self.parse_type()?))
        } else {
            Ok(None)
        }
    }

    /// Pattern after `case`, `catch`, `if case` and `for case`.
    pub(crate) fn parse_pattern(&mut self) -> PResult<Pattern> {
        self.parse_matching_pattern(false)
    }

    /// Inside `let`/`var`, bare identifiers bind instead of being matched.
    fn parse_matching_pattern(&mut self, binding: bool) -> PResult<Pattern> {
        let start = self.current_start();
        let token = self.peek().token.clone();
        let kind = match token {
            Token::Keyword(keyword @ (Keyword::Let | Keyword::Var)) => {
                self.advance();
                let pattern = self.parse_matching_pattern(true)?;
                PatternKind::ValueBinding {
                    is_let: keyword == Keyword::Let,
                    pattern: Box::new(pattern),
                }
            }
            Token::Keyword(Keyword::Underscore) if !self.continues_expression(1) => {
                self.advance();
                PatternKind::Wildcard {
                    type_annotation: None,
                }
            }
            Token::Keyword(Keyword::Is) => {
                self.advance();
                PatternKind::Is(self.parse_type()?)
            }
            Token::Punctuator(Punctuator::LeftParen) => {
                let elements =
                    self.parse_tuple_pattern_elements(|p| p.parse_matching_pattern(binding))?;
                PatternKind::Tuple {
                    elements,
                    type_annotation: None,
                }
            }
            Token::Punctuator(Punctuator::Period) if self.is_member_name(1) => {
                self.advance();
                let name = self.eat_member_name().unwrap_or_default();
                let associated = self.parse_associated_pattern(binding)?;
                PatternKind::EnumCase {
                    type_identifier: None,
                    name,
                    associated,
                }
            }
            Token::Identifier(name) | Token::BacktickIdentifier(name)
                if binding && !self.peek_ahead(1).token.is_punctuator(Punctuator::Period) =>
            {
                self.advance();
                PatternKind::Identifier {
                    name,
                    type_annotation: None,
                }
            }
            Token::Identifier(_) if self.peek_ahead(1).token.is_punctuator(Punctuator::Period) => {
                match self.speculate(|p| p.parse_qualified_enum_case(binding)) {
                    Some(kind) => kind,
                    None => self.parse_expression_pattern()?,
                }
            }
            _ => self.parse_expression_pattern()?,
        };

        let mut pattern = self.make_pattern(kind, start.clone());
        loop {
            let kind = if self.eat(Punctuator::PostfixQuestion) {
                PatternKind::Optional(Box::new(pattern))
            } else if self.eat_keyword(Keyword::As) {
                let ty = self.parse_type()?;
                PatternKind::As {
                    pattern: Box::new(pattern),
                    ty,
                }
            } else {
                return Ok(pattern);
            };
            pattern = self.make_pattern(kind, start.clone());
        }
    }

    /// True when the token after a `_` makes it part of an expression
    fn continues_expression(&self, n: usize) -> bool {
        matches!(self.peek_ahead(n).token, Token::BinaryOperator(_))
    }

    fn parse_expression_pattern(&mut self) -> PResult<PatternKind> {
        let restrictions = Restrictions {
            no_assignment: true,
            ..self.restrictions
        };
        let expression = self.with_restrictions(restrictions, |p| p.parse_expression())?;
        Ok(PatternKind::Expression(expression))
    }

    /// `Type.Nested.case(...)`, accepted only when the pattern ends there.
    fn parse_qualified_enum_case(&mut self, binding: bool) -> PResult<Option<PatternKind>> {
        let type_start = self.current_start();
        let mut names = Vec::new();
        let mut type_end = self.last_end();
        loop {
            let Some(name) = self.eat_identifier() else {
                return Ok(None);
            };
            names.push(name);
            if !self.check(Punctuator::Period) {
                break;
            }
            type_end = self.last_end();
            self.advance();
            if self.peek().token.identifier_text().is_none() {
                match self.eat_member_name() {
                    Some(name) => names.push(name),
                    None => return Ok(None),
                }
                break;
            }
        }
        if names.len() < 2 {
            return Ok(None);
        }

        let associated = self.parse_associated_pattern(binding)?;
        if !self.ends_pattern() {
            return Ok(None);
        }

        let name = names.pop().unwrap_or_default();
        let type_identifier = Type {
            id: self.next_id(),
            range: crate::source::SourceRange::new(type_start, type_end),
            kind: TypeKind::Identifier(
                names
                    .into_iter()
                    .map(|name| TypeIdentifierName {
                        name,
                        generic_arguments: None,
                    })
                    .collect(),
            ),
        };
        Ok(Some(PatternKind::EnumCase {
            type_identifier: Some(type_identifier),
            name,
            associated,
        }))
    }

    fn ends_pattern(&self) -> bool {
        match &self.peek().token {
            Token::Punctuator(punctuator) => matches!(
                punctuator,
                Punctuator::Comma
                    | Punctuator::Colon
                    | Punctuator::Equal
                    | Punctuator::RightParen
                    | Punctuator::LeftBrace
                    | Punctuator::PostfixQuestion
            ),
            Token::Keyword(keyword) => {
                matches!(keyword, Keyword::Where | Keyword::In | Keyword::As)
            }
            Token::Eof => true,
            _ => false,
        }
    }

    fn parse_associated_pattern(&mut self, binding: bool) -> PResult<Option<Box<Pattern>>> {
        if !self.check(Punctuator::LeftParen) || self.peek().newline_before {
            return Ok(None);
        }
        let start = self.current_start();
        let elements = self.parse_tuple_pattern_elements(|p| p.parse_matching_pattern(binding))?;
        let pattern = self.make_pattern(
            PatternKind::Tuple {
                elements,
                type_annotation: None,
            },
            start,
        );
        Ok(Some(Box::new(pattern)))
    }

    fn parse_tuple_pattern_elements(
        &mut self,
        mut element: impl FnMut(&mut Self) -> PResult<Pattern>,
    ) -> PResult<Vec<TuplePatternElement>> {
        self.advance();
        let mut elements = Vec::new();
        while !self.check(Punctuator::RightParen) && !self.is_at_end() {
            let label = if self.peek().token.identifier_text().is_some()
                && self.peek_ahead(1).token.is_punctuator(Punctuator::Colon)
            {
                let label = self.eat_identifier();
                self.advance();
                label
            } else {
                None
            };
            let pattern = element(self)?;
            elements.push(TuplePatternElement { label, pattern });
            if !self.eat(Punctuator::Comma) {
                break;
            }
        }
        self.expect(Punctuator::RightParen, "to close tuple pattern")?;
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::diagnostic::DiagnosticPool;
    use crate::parser::lexer::Lexer;
    use crate::parser::parse::Parser;
    use crate::source::SourceFile;

    fn with_parser<T>(source: &str, parse: impl FnOnce(&mut Parser) -> T) -> (T, usize) {
        let mut pool = DiagnosticPool::new();
        let tokens = Lexer::new(&SourceFile::in_memory(source)).tokenize();
        let result = parse(&mut Parser::new(tokens, &mut pool));
        (result, pool.len())
    }

    fn matching(source: &str) -> Pattern {
        let (pattern, errors) = with_parser(source, |p| p.parse_pattern().expect("pattern"));
        assert_eq!(errors, 0, "unexpected diagnostics for {source}");
        pattern
    }

    #[test]
    fn test_binding_tuple_with_annotation() {
        let (pattern, errors) = with_parser("(a, _): (Int, Int)", |p| {
            p.parse_binding_pattern().expect("pattern")
        });
        assert_eq!(errors, 0);
        assert_eq!(pattern.bound_names(), vec!["a"]);
        assert!(matches!(
            pattern.kind,
            PatternKind::Tuple { type_annotation: Some(_), .. }
        ));
    }

    #[test]
    fn test_value_binding_enum_case() {
        let pattern = matching("let .some(x)");
        assert_eq!(pattern.bound_names(), vec!["x"]);
        match pattern.kind {
            PatternKind::ValueBinding { is_let, pattern } => {
                assert!(is_let);
                assert!(matches!(pattern.kind, PatternKind::EnumCase { ref name, .. } if name == "some"));
            }
            other => panic!("Expected value binding, got {other:?}"),
        }
    }

    #[test]
    fn test_qualified_enum_case() {
        let pattern = matching("Shape.circle(let radius)");
        match pattern.kind {
            PatternKind::EnumCase {
                type_identifier: Some(ty),
                name,
                associated: Some(_),
            } => {
                assert_eq!(name, "circle");
                assert_eq!(ty.identifier_names().map(|names| names.len()), Some(1));
                assert_eq!(ty.range.end.column, 6);
            }
            other => panic!("Expected enum case, got {other:?}"),
        }
    }

    #[test]
    fn test_member_expression_falls_back_to_expression_pattern() {
        let pattern = matching("limits.max + 1");
        assert!(matches!(pattern.kind, PatternKind::Expression(ref e) if e.is_sequence()));
    }

    #[test]
    fn test_is_as_and_optional_patterns() {
        assert!(matches!(matching("is String").kind, PatternKind::Is(_)));
        assert!(matches!(matching("let error as MyError").kind, PatternKind::ValueBinding { .. }));
        assert!(matches!(matching("x?").kind, PatternKind::Expression(_) | PatternKind::Optional(_)));
    }

    #[test]
    fn test_expression_pattern_stops_at_assignment() {
        let (pattern, errors) = with_parser("1...5 = x", |p| p.parse_pattern().expect("pattern"));
        assert_eq!(errors, 0);
        assert!(matches!(pattern.kind, PatternKind::Expression(_)));
    }
}
