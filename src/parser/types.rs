//! Type parsing
//!
//! # Grammar
//!
//! ```text
//! type            ::= attribute* 'inout'? composition (('throws' | 'rethrows')? '->' type)?
//! composition     ::= postfix-type ('&' postfix-type)*
//! postfix-type    ::= primary-type ('?' | '!' | '.Type' | '.Protocol')*
//! primary-type    ::= type-identifier | tuple-type | '[' type (':' type)? ']'
//!                   | 'Any' | 'Self' | 'protocol' '<' type (',' type)* '>'
//! type-identifier ::= name generic-arguments? ('.' name generic-arguments?)*
//! ```
//!
//! A `<` only opens a generic argument clause when it touches the preceding
//! name, so `x as Int < y` still reads as a comparison.

use crate::ast::*;
use crate::parser::error::ParserError;
use crate::parser::parse::{PResult, Parser};
use crate::parser::token::{Keyword, Punctuator, Token};

impl<'pool> Parser<'pool> {
    pub(crate) fn parse_type(&mut self) -> PResult<Type> {
        let start = self.current_start();

        if self.check(Punctuator::At) {
            let attributes = self.parse_attributes()?;
            let base = self.parse_type()?;
            return Ok(self.make_type(
                TypeKind::Attributed {
                    attributes,
                    base: Box::new(base),
                },
                start,
            ));
        }
        if self.eat_keyword(Keyword::Inout) {
            let base = self.parse_type()?;
            return Ok(self.make_type(TypeKind::InOut(Box::new(base)), start));
        }

        let mut ty = self.parse_postfix_type()?;
        if self.check_operator("&") {
            let mut members = vec![ty];
            while self.eat_operator("&") {
                members.push(self.parse_postfix_type()?);
            }
            ty = self.make_type(TypeKind::ProtocolComposition(members), start.clone());
        }

        let throws = self.parse_throws();
        if throws != ThrowsKind::Nothrowing || self.check(Punctuator::Arrow) {
            self.expect(Punctuator::Arrow, "in function type")?;
            let result = self.parse_type()?;
            let arguments = match ty.kind {
                TypeKind::Tuple(elements) => elements,
                _ => vec![TupleTypeElement {
                    label: None,
                    ty,
                    is_variadic: false,
                }],
            };
            ty = self.make_type(
                TypeKind::Function {
                    arguments,
                    throws,
                    result: Box::new(result),
                },
                start,
            );
        }
        Ok(ty)
    }

    fn parse_postfix_type(&mut self) -> PResult<Type> {
        let start = self.current_start();
        let mut ty = self.parse_primary_type()?;
        loop {
            let kind = if self.eat(Punctuator::PostfixQuestion) {
                TypeKind::Optional(Box::new(ty))
            } else if self.eat(Punctuator::PostfixExclaim) {
                TypeKind::ImplicitlyUnwrappedOptional(Box::new(ty))
            } else if let Some(kind) = self.metatype_suffix() {
                self.advance();
                self.advance();
                TypeKind::Metatype {
                    base: Box::new(ty),
                    kind,
                }
            } else {
                return Ok(ty);
            };
            ty = self.make_type(kind, start.clone());
        }
    }

    fn metatype_suffix(&self) -> Option<MetatypeKind> {
        if !self.check(Punctuator::Period) {
            return None;
        }
        match &self.peek_ahead(1).token {
            Token::Identifier(name) if name == "Type" => Some(MetatypeKind::Type),
            Token::Identifier(name) if name == "Protocol" => Some(MetatypeKind::Protocol),
            _ => None,
        }
    }

    fn parse_primary_type(&mut self) -> PResult<Type> {
        let start = self.current_start();
        let lexeme = self.peek().clone();
        let kind = match lexeme.token {
            Token::Identifier(_) | Token::BacktickIdentifier(_) => {
                TypeKind::Identifier(self.parse_type_identifier_names()?)
            }
            Token::Keyword(Keyword::Any) => {
                self.advance();
                TypeKind::Any
            }
            Token::Keyword(Keyword::SelfType) => {
                self.advance();
                TypeKind::SelfType
            }
            Token::Keyword(Keyword::Protocol) if self.peek_ahead(1).token.operator_text() == Some("<") => {
                self.advance();
                let members = self.parse_generic_argument_clause()?.unwrap_or_default();
                TypeKind::ProtocolComposition(members)
            }
            Token::Punctuator(Punctuator::LeftParen) => self.parse_tuple_type()?,
            Token::Punctuator(Punctuator::LeftSquare) => {
                self.advance();
                let element = self.parse_type()?;
                let kind = if self.eat(Punctuator::Colon) {
                    let value = self.parse_type()?;
                    TypeKind::Dictionary {
                        key: Box::new(element),
                        value: Box::new(value),
                    }
                } else {
                    TypeKind::Array(Box::new(element))
                };
                self.expect(Punctuator::RightSquare, "to close collection type")?;
                kind
            }
            ref token => {
                self.error(ParserError::ExpectedType(token.to_string()), &lexeme.range)?;
                TypeKind::Identifier(Vec::new())
            }
        };
        Ok(self.make_type(kind, start))
    }

    /// `A<B>.C`, stopping before `.Type` and `.Protocol`.
    pub(crate) fn parse_type_identifier_names(&mut self) -> PResult<Vec<TypeIdentifierName>> {
        let mut names = Vec::new();
        loop {
            let Some(name) = self.eat_identifier() else {
                self.unexpected("type name")?;
                break;
            };
            let generic_arguments = if self.peek().space_before {
                None
            } else {
                self.parse_generic_argument_clause()?
            };
            names.push(TypeIdentifierName {
                name,
                generic_arguments,
            });

            if !self.check(Punctuator::Period) || self.metatype_suffix().is_some() {
                break;
            }
            if self.peek_ahead(1).token.identifier_text().is_none() {
                break;
            }
            self.advance();
        }
        Ok(names)
    }

    /// `<T, U>`; `None` when no `<` is present.
    pub(crate) fn parse_generic_argument_clause(&mut self) -> PResult<Option<Vec<Type>>> {
        if !self.eat_opening_angle() {
            return Ok(None);
        }
        let mut arguments = Vec::new();
        loop {
            arguments.push(self.parse_type()?);
            if !self.eat(Punctuator::Comma) {
                break;
            }
        }
        if !self.eat_closing_angle() {
            self.unexpected("'>' to close generic argument clause")?;
        }
        Ok(Some(arguments))
    }

    fn parse_tuple_type(&mut self) -> PResult<TypeKind> {
        self.advance();
        let mut elements = Vec::new();
        while !self.check(Punctuator::RightParen) && !self.is_at_end() {
            let label = self.parse_tuple_type_label();
            let ty = self.parse_type()?;
            let is_variadic = self.eat_operator("...");
            elements.push(TupleTypeElement {
                label,
                ty,
                is_variadic,
            });
            if !self.eat(Punctuator::Comma) {
                break;
            }
        }
        self.expect(Punctuator::RightParen, "to close tuple type")?;
        Ok(TypeKind::Tuple(elements))
    }

    /// `label:` or `_ name:` in front of a tuple type element
    fn parse_tuple_type_label(&mut self) -> Option<String> {
        if self.is_member_name(0) && self.peek_ahead(1).token.is_punctuator(Punctuator::Colon) {
            let label = self.eat_member_name();
            self.advance();
            return label;
        }
        let external = matches!(
            self.peek().token,
            Token::Identifier(_) | Token::Keyword(Keyword::Underscore)
        );
        if external
            && self.peek_ahead(1).token.identifier_text().is_some()
            && self.peek_ahead(2).token.is_punctuator(Punctuator::Colon)
        {
            self.advance();
            let label = self.eat_identifier();
            self.advance();
            return label;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::diagnostic::DiagnosticPool;
    use crate::parser::lexer::Lexer;
    use crate::parser::parse::Parser;
    use crate::source::SourceFile;

    fn parse_type(source: &str) -> (Type, usize) {
        let mut pool = DiagnosticPool::new();
        let tokens = Lexer::new(&SourceFile::in_memory(source)).tokenize();
        let ty = Parser::new(tokens, &mut pool)
            .parse_type()
            .expect("type should parse");
        (ty, pool.len())
    }

    #[test]
    fn test_nested_generic_arguments_split_shift() {
        let (ty, errors) = parse_type("Array<Array<Int>>");
        assert_eq!(errors, 0);
        let names = ty.identifier_names().expect("type identifier");
        let inner = &names[0].generic_arguments.as_ref().expect("arguments")[0];
        let inner_names = inner.identifier_names().expect("inner identifier");
        assert_eq!(inner_names[0].name, "Array");
        assert!(inner_names[0].generic_arguments.is_some());
    }

    #[test]
    fn test_optional_after_generic_clause() {
        let (ty, errors) = parse_type("Optional<Int>?");
        assert_eq!(errors, 0);
        assert!(matches!(ty.kind, TypeKind::Optional(_)));
    }

    #[test]
    fn test_function_type() {
        let (ty, errors) = parse_type("(Int, label: String) throws -> [String: Int]");
        assert_eq!(errors, 0);
        match ty.kind {
            TypeKind::Function {
                arguments,
                throws,
                result,
            } => {
                assert_eq!(arguments.len(), 2);
                assert_eq!(arguments[1].label.as_deref(), Some("label"));
                assert_eq!(throws, ThrowsKind::Throwing);
                assert!(matches!(result.kind, TypeKind::Dictionary { .. }));
            }
            other => panic!("Expected function type, got {other:?}"),
        }
    }

    #[test]
    fn test_metatype_and_composition() {
        let (ty, _) = parse_type("Foo.Bar.Type");
        match ty.kind {
            TypeKind::Metatype { base, kind } => {
                assert_eq!(kind, MetatypeKind::Type);
                assert_eq!(base.identifier_names().map(|names| names.len()), Some(2));
            }
            other => panic!("Expected metatype, got {other:?}"),
        }

        let (ty, _) = parse_type("Hashable & Codable");
        assert!(matches!(ty.kind, TypeKind::ProtocolComposition(ref members) if members.len() == 2));
    }

    #[test]
    fn test_attributed_closure_type() {
        let (ty, errors) = parse_type("@escaping (Int) -> Void");
        assert_eq!(errors, 0);
        match ty.kind {
            TypeKind::Attributed { attributes, base } => {
                assert_eq!(attributes[0].name, "escaping");
                assert!(matches!(base.kind, TypeKind::Function { .. }));
            }
            other => panic!("Expected attributed type, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_type_reports_error() {
        let (ty, errors) = parse_type("= 1");
        assert_eq!(errors, 1);
        assert_eq!(ty.identifier_names().map(|names| names.len()), Some(0));
    }
}
