//! Declaration parsing implementation
//!
//! This module handles parsing of Swift declarations:
//!
//! - Imports, constants, variables and type aliases
//! - Functions, initializers, deinitializers and subscripts
//! - `enum`, `struct`, `class`, `protocol` and `extension` with their members
//! - `operator` and `precedencegroup` declarations
//! - Attributes, modifiers, generic parameter clauses and `where` clauses
//!
//! A declaration without a name, or a type without its `{`, cannot be
//! recovered from: those report a fatal diagnostic and halt the parse.
//!
//! # Grammar
//!
//! ```text
//! declaration ::= attribute* modifier* declaration-body
//! attribute   ::= '@' name ('(' balanced-token* ')')?
//! modifier    ::= access-level ('(' 'set' ')')? | 'static' | 'class'
//!               | contextual-modifier | 'unowned' ('(' ('safe' | 'unsafe') ')')?
//! declaration-body
//!             ::= 'import' import-kind? path
//!               | 'let' pattern-initializer, ...
//!               | 'var' (pattern-initializer, ... | name type-annotation? initializer? accessor-block)
//!               | 'typealias' name generic-parameters? '=' type
//!               | 'func' (name | operator) generic-parameters? parameters throws? ('->' type)? where? block?
//!               | ('enum' | 'struct' | 'class' | 'protocol') name generic-parameters?
//!                 inheritance? where? '{' declaration* '}'
//!               | 'extension' type inheritance? where? '{' declaration* '}'
//!               | 'case' enum-case-element, ...
//!               | 'init' ('?' | '!')? generic-parameters? parameters throws? where? block?
//!               | 'deinit' block
//!               | 'subscript' generic-parameters? parameters '->' type where? accessor-block
//!               | 'operator' operator (':' name)?
//!               | 'precedencegroup' name '{' precedence-attribute* '}'
//!               | 'associatedtype' name inheritance? ('=' type)?
//! ```

use crate::ast::*;
use crate::parser::error::{ParserError, ParserWarning};
use crate::parser::parse::{PResult, Parser, Restrictions};
use crate::parser::token::{Keyword, Punctuator, Token};

impl<'pool> Parser<'pool> {
    pub(crate) fn parse_declaration(&mut self) -> PResult<Declaration> {
        let start = self.current_start();
        let attributes = self.parse_attributes()?;
        let modifiers = self.parse_modifiers()?;

        let lexeme = self.peek().clone();
        let kind = match lexeme.token {
            Token::Keyword(Keyword::Import) => self.parse_import()?,
            Token::Keyword(Keyword::Let) => {
                self.advance();
                self.require_binding_name("constant")?;
                DeclarationKind::Constant(self.parse_pattern_initializers()?)
            }
            Token::Keyword(Keyword::Var) => {
                self.advance();
                self.require_binding_name("variable")?;
                DeclarationKind::Variable(self.parse_variable_body()?)
            }
            Token::Keyword(Keyword::Typealias) => {
                self.advance();
                let name = self.declaration_name("typealias")?;
                let generic_parameters = self.parse_generic_parameter_clause()?;
                self.expect(Punctuator::Equal, "in typealias declaration")?;
                let assignment = self.parse_type()?;
                DeclarationKind::TypeAlias {
                    name,
                    generic_parameters,
                    assignment,
                }
            }
            Token::Keyword(Keyword::Func) => DeclarationKind::Function(self.parse_function()?),
            Token::Keyword(Keyword::Enum) => DeclarationKind::Enum(self.parse_type_declaration("enum")?),
            Token::Keyword(Keyword::Struct) => {
                DeclarationKind::Struct(self.parse_type_declaration("struct")?)
            }
            Token::Keyword(Keyword::Class) => DeclarationKind::Class(self.parse_type_declaration("class")?),
            Token::Keyword(Keyword::Protocol) => {
                DeclarationKind::Protocol(self.parse_type_declaration("protocol")?)
            }
            Token::Keyword(Keyword::Case) => self.parse_enum_case()?,
            Token::Keyword(Keyword::Extension) => self.parse_extension()?,
            Token::Keyword(Keyword::Init) => self.parse_initializer()?,
            Token::Keyword(Keyword::Deinit) => {
                self.advance();
                DeclarationKind::Deinitializer(self.parse_code_block("deinitializer")?)
            }
            Token::Keyword(Keyword::Subscript) => self.parse_subscript()?,
            Token::Keyword(Keyword::Operator) => self.parse_operator(&modifiers)?,
            Token::Keyword(Keyword::Precedencegroup) => self.parse_precedence_group()?,
            Token::Keyword(Keyword::Associatedtype) => {
                self.advance();
                let name = self.declaration_name("associatedtype")?;
                let inheritance = self.parse_inheritance_clause()?;
                let default = if self.eat(Punctuator::Equal) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                DeclarationKind::AssociatedType {
                    name,
                    inheritance,
                    default,
                }
            }
            ref token => {
                return Err(self.fatal(
                    ParserError::ExpectedDeclaration(token.to_string()),
                    &lexeme.range,
                ))
            }
        };

        Ok(Declaration {
            id: self.next_id(),
            range: self.range_from(start),
            attributes,
            modifiers,
            kind,
        })
    }

    // ===== Attributes and modifiers =====

    pub(crate) fn parse_attributes(&mut self) -> PResult<Vec<Attribute>> {
        let mut attributes = Vec::new();
        while self.check(Punctuator::At) {
            let start = self.current_start();
            self.advance();
            let Some(name) = self.eat_member_name() else {
                self.unexpected("attribute name after '@'")?;
                break;
            };
            let arguments = if self.check(Punctuator::LeftParen) && !self.peek().space_before {
                match self.parse_balanced_token() {
                    BalancedToken::Parens(inner) => Some(inner),
                    _ => None,
                }
            } else {
                None
            };
            attributes.push(Attribute {
                name,
                arguments,
                range: self.range_from(start),
            });
        }
        Ok(attributes)
    }

    /// A token, or a whole bracketed group of them.
    pub(crate) fn parse_balanced_token(&mut self) -> BalancedToken {
        let lexeme = self.advance();
        let close = match lexeme.token {
            Token::Punctuator(Punctuator::LeftParen) => Punctuator::RightParen,
            Token::Punctuator(Punctuator::LeftSquare) => Punctuator::RightSquare,
            Token::Punctuator(Punctuator::LeftBrace) => Punctuator::RightBrace,
            token => return BalancedToken::Token(token),
        };
        let mut inner = Vec::new();
        while !self.check(close) && !self.is_at_end() {
            inner.push(self.parse_balanced_token());
        }
        self.eat(close);
        match close {
            Punctuator::RightParen => BalancedToken::Parens(inner),
            Punctuator::RightSquare => BalancedToken::Brackets(inner),
            _ => BalancedToken::Braces(inner),
        }
    }

    fn parse_modifiers(&mut self) -> PResult<Vec<DeclarationModifier>> {
        let mut modifiers = Vec::new();
        loop {
            let token = self.peek().token.clone();
            let modifier = match token {
                Token::Keyword(Keyword::Static) => {
                    self.advance();
                    DeclarationModifier::Static
                }
                Token::Keyword(Keyword::Class)
                    if self.declaration_starts_at(1) || self.is_contextual_modifier_at(1) =>
                {
                    self.advance();
                    DeclarationModifier::Class
                }
                Token::Keyword(keyword) => {
                    let level = match keyword {
                        Keyword::Private => AccessLevel::Private,
                        Keyword::Fileprivate => AccessLevel::FilePrivate,
                        Keyword::Internal => AccessLevel::Internal,
                        Keyword::Public => AccessLevel::Public,
                        Keyword::Open => AccessLevel::Open,
                        _ => break,
                    };
                    self.advance();
                    if self.check(Punctuator::LeftParen)
                        && self.peek_ahead(1).token.identifier_text() == Some("set")
                        && self.peek_ahead(2).token.is_punctuator(Punctuator::RightParen)
                    {
                        self.advance();
                        self.advance();
                        self.advance();
                        DeclarationModifier::AccessSet(level)
                    } else {
                        DeclarationModifier::Access(level)
                    }
                }
                Token::Identifier(word) if self.is_contextual_modifier_at(0) => {
                    let Some(modifier) = DeclarationModifier::contextual(&word) else {
                        break;
                    };
                    self.advance();
                    self.parse_unowned_specifier(modifier)?
                }
                _ => break,
            };
            modifiers.push(modifier);
        }
        Ok(modifiers)
    }

    /// `unowned(safe)` / `unowned(unsafe)`
    fn parse_unowned_specifier(
        &mut self,
        modifier: DeclarationModifier,
    ) -> PResult<DeclarationModifier> {
        if modifier != DeclarationModifier::Unowned || !self.eat(Punctuator::LeftParen) {
            return Ok(modifier);
        }
        let modifier = match self.eat_identifier().as_deref() {
            Some("safe") => DeclarationModifier::UnownedSafe,
            Some("unsafe") => DeclarationModifier::UnownedUnsafe,
            _ => {
                self.unexpected("'safe' or 'unsafe' after 'unowned('")?;
                DeclarationModifier::Unowned
            }
        };
        self.expect(Punctuator::RightParen, "after 'unowned' specifier")?;
        Ok(modifier)
    }

    // ===== Imports, constants and variables =====

    fn parse_import(&mut self) -> PResult<DeclarationKind> {
        self.advance();
        let kind = match self.peek().token {
            Token::Keyword(Keyword::Typealias) => Some(ImportKind::Typealias),
            Token::Keyword(Keyword::Struct) => Some(ImportKind::Struct),
            Token::Keyword(Keyword::Class) => Some(ImportKind::Class),
            Token::Keyword(Keyword::Enum) => Some(ImportKind::Enum),
            Token::Keyword(Keyword::Protocol) => Some(ImportKind::Protocol),
            Token::Keyword(Keyword::Var | Keyword::Let) => Some(ImportKind::Var),
            Token::Keyword(Keyword::Func) => Some(ImportKind::Func),
            _ => None,
        };
        if kind.is_some() {
            self.advance();
        }

        let mut path = vec![self.declaration_name("import")?];
        while self.eat(Punctuator::Period) {
            match self.eat_member_name() {
                Some(component) => path.push(component),
                None => {
                    self.unexpected("module name after '.'")?;
                    break;
                }
            }
        }
        Ok(DeclarationKind::Import { kind, path })
    }

    /// `let` and `var` must introduce at least one name.
    fn require_binding_name(&mut self, what: &'static str) -> PResult<()> {
        match self.peek().token {
            Token::Identifier(_)
            | Token::BacktickIdentifier(_)
            | Token::Keyword(Keyword::Underscore)
            | Token::Punctuator(Punctuator::LeftParen) => Ok(()),
            _ => {
                let at = self.peek().range.clone();
                Err(self.fatal(ParserError::MissingDeclarationName(what), &at))
            }
        }
    }

    fn parse_pattern_initializers(&mut self) -> PResult<Vec<PatternInitializer>> {
        let mut initializers = Vec::new();
        loop {
            let pattern = self.parse_binding_pattern()?;
            let initializer = if self.eat(Punctuator::Equal) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            initializers.push(PatternInitializer {
                pattern,
                initializer,
            });
            if !self.eat(Punctuator::Comma) {
                break;
            }
        }
        Ok(initializers)
    }

    /// Stored variables, or a single name followed by an accessor block.
    fn parse_variable_body(&mut self) -> PResult<VariableBody> {
        let mut initializers = self.parse_pattern_initializers()?;
        if initializers.len() != 1 || !self.check(Punctuator::LeftBrace) {
            return Ok(VariableBody::Initializers(initializers));
        }
        let has_initializer = initializers[0].initializer.is_some();
        if has_initializer && !self.brace_starts_observer_block() {
            return Ok(VariableBody::Initializers(initializers));
        }

        let Some(PatternInitializer {
            pattern,
            initializer,
        }) = initializers.pop()
        else {
            return Ok(VariableBody::Initializers(Vec::new()));
        };
        let PatternKind::Identifier {
            name,
            type_annotation,
        } = pattern.kind
        else {
            let at = self.peek().range.clone();
            self.error(
                ParserError::ExpectedPattern("a destructuring pattern with accessors".to_string()),
                &at,
            )?;
            return Ok(VariableBody::Initializers(vec![PatternInitializer {
                pattern,
                initializer,
            }]));
        };

        let accessors = self.parse_accessor_block("variable")?;
        Ok(VariableBody::Accessors {
            name,
            type_annotation,
            initializer,
            accessors,
        })
    }

    /// `{ willSet ...` or `{ didSet ...` after an initialized variable
    pub(crate) fn brace_starts_observer_block(&self) -> bool {
        self.check(Punctuator::LeftBrace)
            && matches!(
                self.peek_ahead(1).token.identifier_text(),
                Some("willSet" | "didSet")
            )
    }

    /// `{ statements }` getter shorthand or `{ get set willSet didSet }` clauses.
    fn parse_accessor_block(&mut self, what: &'static str) -> PResult<AccessorBlock> {
        if !self.starts_accessor_clauses() {
            return Ok(AccessorBlock::Getter(self.parse_code_block(what)?));
        }
        self.advance();

        let mut clauses = Vec::new();
        while !self.check(Punctuator::RightBrace) && !self.is_at_end() {
            let start = self.current_start();
            let attributes = self.parse_attributes()?;
            let mut modifiers = Vec::new();
            loop {
                if self.eat_contextual("mutating") {
                    modifiers.push(DeclarationModifier::Mutating);
                } else if self.eat_contextual("nonmutating") {
                    modifiers.push(DeclarationModifier::Nonmutating);
                } else {
                    break;
                }
            }

            let Some(kind) = self.peek().token.identifier_text().and_then(AccessorKind::lookup) else {
                self.unexpected("'get', 'set', 'willSet' or 'didSet'")?;
                self.synchronize();
                break;
            };
            self.advance();

            let parameter = if self.eat(Punctuator::LeftParen) {
                let name = self.expect_identifier("in accessor parameter")?;
                self.expect(Punctuator::RightParen, "after accessor parameter")?;
                name
            } else {
                None
            };
            let body = if self.check(Punctuator::LeftBrace) {
                Some(self.parse_code_block("accessor")?)
            } else {
                None
            };
            clauses.push(Accessor {
                kind,
                attributes,
                modifiers,
                parameter,
                body,
                range: self.range_from(start),
            });
        }

        self.expect(Punctuator::RightBrace, "to close accessor block")?;
        Ok(AccessorBlock::Clauses(clauses))
    }

    fn starts_accessor_clauses(&self) -> bool {
        if !self.check(Punctuator::LeftBrace) {
            return false;
        }
        match &self.peek_ahead(1).token {
            Token::Punctuator(Punctuator::At) => true,
            Token::Identifier(word) if word == "mutating" || word == "nonmutating" => true,
            Token::Identifier(word) if AccessorKind::lookup(word).is_some() => {
                match &self.peek_ahead(2).token {
                    Token::Punctuator(
                        Punctuator::LeftBrace | Punctuator::LeftParen | Punctuator::RightBrace,
                    ) => true,
                    Token::Identifier(next) => AccessorKind::lookup(next).is_some(),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    // ===== Functions =====

    fn parse_function(&mut self) -> PResult<FunctionDeclaration> {
        self.advance();
        let lexeme = self.peek().clone();
        let (name, is_operator) = if let Some(name) = lexeme.token.identifier_text() {
            (name.to_string(), false)
        } else if let Some(name) = lexeme.token.operator_text() {
            (name.to_string(), true)
        } else {
            return Err(self.fatal(ParserError::MissingDeclarationName("function"), &lexeme));
        };
        self.advance();

        let generic_parameters = self.parse_generic_parameter_clause()?;
        let parameters = self.parse_parameter_clause()?;
        let throws = self.parse_throws();
        let result = if self.eat(Punctuator::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let where_clause = self.parse_where_clause()?;
        let body = if self.check(Punctuator::LeftBrace) {
            Some(self.parse_code_block("function")?)
        } else {
            None
        };

        Ok(FunctionDeclaration {
            name,
            is_operator,
            generic_parameters,
            parameters,
            throws,
            result,
            where_clause,
            body,
        })
    }

    /// `(label name: Type = default, ...)`
    pub(crate) fn parse_parameter_clause(&mut self) -> PResult<Vec<Parameter>> {
        if !self.expect(Punctuator::LeftParen, "to begin parameter clause")? {
            return Ok(Vec::new());
        }
        self.with_restrictions(Restrictions::default(), |p| {
            let mut parameters = Vec::new();
            while !p.check(Punctuator::RightParen) && !p.is_at_end() {
                let start = p.current_start();
                if p.check_keyword(Keyword::Var) {
                    let at = p.advance();
                    p.warning(ParserWarning::VarParameter, &at)?;
                } else if p.check_keyword(Keyword::Let) {
                    p.advance();
                }

                let Some(first) = p.eat_parameter_name() else {
                    p.unexpected("parameter name")?;
                    break;
                };
                let second = if p.check(Punctuator::Colon) {
                    None
                } else {
                    p.eat_parameter_name()
                };
                let (external_name, local_name) = match second {
                    Some(local) => (Some(first), local),
                    None => (None, first),
                };

                p.expect(Punctuator::Colon, "after parameter name")?;
                let type_annotation = p.parse_type()?;
                let is_variadic = p.eat_operator("...");
                let default_argument = if p.eat(Punctuator::Equal) {
                    Some(p.parse_expression()?)
                } else {
                    None
                };
                parameters.push(Parameter {
                    external_name,
                    local_name,
                    type_annotation,
                    default_argument,
                    is_variadic,
                    range: p.range_from(start),
                });
                if !p.eat(Punctuator::Comma) {
                    break;
                }
            }
            p.expect(Punctuator::RightParen, "to close parameter clause")?;
            Ok(parameters)
        })
    }

    /// Parameter names may be any keyword other than `inout`, `var` and `let`.
    fn eat_parameter_name(&mut self) -> Option<String> {
        match self.peek().token {
            Token::Keyword(Keyword::Inout | Keyword::Var | Keyword::Let) => None,
            _ => self.eat_member_name(),
        }
    }

    // ===== Generic clauses =====

    /// `<T: P, U where T == U>`; `None` when no `<` is present.
    pub(crate) fn parse_generic_parameter_clause(
        &mut self,
    ) -> PResult<Option<GenericParameterClause>> {
        if !self.check_operator("<") {
            return Ok(None);
        }
        let start = self.current_start();
        self.advance();

        let mut parameters = Vec::new();
        loop {
            let Some(name) = self.expect_identifier("in generic parameter clause")? else {
                break;
            };
            let constraint = if self.eat(Punctuator::Colon) {
                Some(self.parse_type()?)
            } else {
                None
            };
            parameters.push(GenericParameter { name, constraint });
            if !self.eat(Punctuator::Comma) {
                break;
            }
        }
        let requirements = self.parse_where_clause()?;
        if !self.eat_closing_angle() {
            self.unexpected("'>' to close generic parameter clause")?;
        }

        Ok(Some(GenericParameterClause {
            parameters,
            requirements,
            range: self.range_from(start),
        }))
    }

    fn parse_where_clause(&mut self) -> PResult<Vec<Requirement>> {
        if !self.eat_keyword(Keyword::Where) {
            return Ok(Vec::new());
        }
        let mut requirements = Vec::new();
        loop {
            let left = self.parse_type()?;
            if self.eat(Punctuator::Colon) {
                requirements.push(Requirement::Conformance(left, self.parse_type()?));
            } else if self.eat_operator("==") {
                requirements.push(Requirement::SameType(left, self.parse_type()?));
            } else {
                self.unexpected("':' or '==' in requirement")?;
                break;
            }
            if !self.eat(Punctuator::Comma) {
                break;
            }
        }
        Ok(requirements)
    }

    /// `: A, B`; `class` is accepted as a protocol's class constraint.
    fn parse_inheritance_clause(&mut self) -> PResult<Vec<Type>> {
        if !self.eat(Punctuator::Colon) {
            return Ok(Vec::new());
        }
        let mut inheritance = Vec::new();
        loop {
            if self.check_keyword(Keyword::Class) {
                let start = self.current_start();
                self.advance();
                let names = vec![TypeIdentifierName {
                    name: "class".to_string(),
                    generic_arguments: None,
                }];
                inheritance.push(self.make_type(TypeKind::Identifier(names), start));
            } else {
                inheritance.push(self.parse_type()?);
            }
            if !self.eat(Punctuator::Comma) {
                break;
            }
        }
        Ok(inheritance)
    }

    // ===== Types and members =====

    fn parse_type_declaration(&mut self, what: &'static str) -> PResult<TypeDeclaration> {
        self.advance();
        let name = self.declaration_name(what)?;
        let generic_parameters = self.parse_generic_parameter_clause()?;
        let inheritance = self.parse_inheritance_clause()?;
        let where_clause = self.parse_where_clause()?;
        let members = self.parse_member_block(what)?;
        Ok(TypeDeclaration {
            name,
            generic_parameters,
            inheritance,
            where_clause,
            members,
        })
    }

    fn parse_extension(&mut self) -> PResult<DeclarationKind> {
        self.advance();
        if self.peek().token.identifier_text().is_none() {
            let at = self.peek().range.clone();
            return Err(self.fatal(ParserError::MissingDeclarationName("extension"), &at));
        }
        let extended = self.parse_type()?;
        let inheritance = self.parse_inheritance_clause()?;
        let where_clause = self.parse_where_clause()?;
        let members = self.parse_member_block("extension")?;
        Ok(DeclarationKind::Extension {
            extended,
            inheritance,
            where_clause,
            members,
        })
    }

    /// `{ declaration* }`; anything else inside is reported and skipped.
    fn parse_member_block(&mut self, what: &'static str) -> PResult<Vec<Declaration>> {
        self.expect_body(what)?;
        let members = self.with_restrictions(Restrictions::default(), |p| {
            let mut members = Vec::new();
            loop {
                while p.check(Punctuator::Semicolon) {
                    let at = p.advance();
                    p.warning(ParserWarning::RedundantSemicolon, &at)?;
                }
                if p.check(Punctuator::RightBrace) || p.is_at_end() {
                    break;
                }

                let marker = p.marker();
                if p.at_declaration_start() || p.check_keyword(Keyword::Case) {
                    members.push(p.parse_declaration()?);
                    if p.needs_sync() {
                        p.synchronize();
                    } else {
                        p.eat(Punctuator::Semicolon);
                    }
                } else {
                    let lexeme = p.peek().clone();
                    p.error(ParserError::ExpectedDeclaration(lexeme.token.to_string()), &lexeme)?;
                    p.skip_token();
                    p.synchronize();
                }
                if p.marker() == marker {
                    p.advance();
                }
            }
            Ok(members)
        })?;
        self.expect(Punctuator::RightBrace, &format!("to close {what}"))?;
        Ok(members)
    }

    fn parse_enum_case(&mut self) -> PResult<DeclarationKind> {
        self.advance();
        let mut elements = Vec::new();
        loop {
            let name = self.declaration_name("enum case")?;
            let associated = if self.check(Punctuator::LeftParen) {
                Some(self.parse_type()?)
            } else {
                None
            };
            let raw_value = if self.eat(Punctuator::Equal) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            elements.push(EnumCaseElement {
                name,
                associated,
                raw_value,
            });
            if !self.eat(Punctuator::Comma) {
                break;
            }
        }
        Ok(DeclarationKind::EnumCase(elements))
    }

    fn parse_initializer(&mut self) -> PResult<DeclarationKind> {
        self.advance();
        let kind = if self.eat(Punctuator::PostfixQuestion) {
            InitializerKind::Optional
        } else if self.eat(Punctuator::PostfixExclaim) {
            InitializerKind::ImplicitlyUnwrapped
        } else {
            InitializerKind::Nonfailable
        };
        let generic_parameters = self.parse_generic_parameter_clause()?;
        let parameters = self.parse_parameter_clause()?;
        let throws = self.parse_throws();
        let where_clause = self.parse_where_clause()?;
        let body = if self.check(Punctuator::LeftBrace) {
            Some(self.parse_code_block("initializer")?)
        } else {
            None
        };
        Ok(DeclarationKind::Initializer {
            kind,
            generic_parameters,
            parameters,
            throws,
            where_clause,
            body,
        })
    }

    fn parse_subscript(&mut self) -> PResult<DeclarationKind> {
        self.advance();
        let generic_parameters = self.parse_generic_parameter_clause()?;
        let parameters = self.parse_parameter_clause()?;
        self.expect(Punctuator::Arrow, "in subscript declaration")?;
        let result = self.parse_type()?;
        let where_clause = self.parse_where_clause()?;
        let accessors = self.parse_accessor_block("subscript")?;
        Ok(DeclarationKind::Subscript {
            generic_parameters,
            parameters,
            result,
            where_clause,
            accessors,
        })
    }

    // ===== Operators =====

    fn parse_operator(&mut self, modifiers: &[DeclarationModifier]) -> PResult<DeclarationKind> {
        self.advance();
        let lexeme = self.peek().clone();
        let Some(name) = lexeme.token.operator_text().map(str::to_string) else {
            return Err(self.fatal(ParserError::MissingDeclarationName("operator"), &lexeme));
        };
        self.advance();

        let fixity = if modifiers.contains(&DeclarationModifier::Prefix) {
            OperatorFixity::Prefix
        } else if modifiers.contains(&DeclarationModifier::Postfix) {
            OperatorFixity::Postfix
        } else {
            OperatorFixity::Infix
        };

        let precedence_group = if self.eat(Punctuator::Colon) {
            self.expect_identifier("naming a precedence group")?
        } else {
            if self.check(Punctuator::LeftBrace) {
                // legacy `{ associativity left precedence 140 }` body
                self.parse_balanced_token();
            }
            None
        };

        Ok(DeclarationKind::Operator {
            name,
            fixity,
            precedence_group,
        })
    }

    fn parse_precedence_group(&mut self) -> PResult<DeclarationKind> {
        self.advance();
        let name = self.declaration_name("precedencegroup")?;
        self.expect_body("precedencegroup")?;

        let mut attributes = Vec::new();
        while !self.check(Punctuator::RightBrace) && !self.is_at_end() {
            let marker = self.marker();
            let lexeme = self.peek().clone();
            let Some(attribute) = lexeme.token.identifier_text().map(str::to_string) else {
                self.unexpected("precedence group attribute")?;
                self.skip_token();
                self.synchronize();
                if self.marker() == marker {
                    self.advance();
                }
                continue;
            };
            self.advance();
            self.expect(Punctuator::Colon, "after precedence group attribute")?;

            let parsed = match attribute.as_str() {
                "higherThan" => Some(PrecedenceGroupAttribute::HigherThan(self.parse_group_names()?)),
                "lowerThan" => Some(PrecedenceGroupAttribute::LowerThan(self.parse_group_names()?)),
                "assignment" => {
                    if self.eat_keyword(Keyword::True) {
                        Some(PrecedenceGroupAttribute::Assignment(true))
                    } else if self.eat_keyword(Keyword::False) {
                        Some(PrecedenceGroupAttribute::Assignment(false))
                    } else {
                        self.unexpected("'true' or 'false'")?;
                        None
                    }
                }
                "associativity" => {
                    let associativity = match self.peek().token.identifier_text() {
                        Some("left") => Some(Associativity::Left),
                        Some("right") => Some(Associativity::Right),
                        Some("none") => Some(Associativity::None),
                        _ => None,
                    };
                    match associativity {
                        Some(associativity) => {
                            self.advance();
                            Some(PrecedenceGroupAttribute::Associativity(associativity))
                        }
                        None => {
                            self.unexpected("'left', 'right' or 'none'")?;
                            None
                        }
                    }
                }
                _ => {
                    self.error(ParserError::UnknownPrecedenceGroupAttribute(attribute), &lexeme)?;
                    None
                }
            };

            match parsed {
                Some(attribute) => attributes.push(attribute),
                None => self.synchronize(),
            }
            if self.marker() == marker {
                self.advance();
            }
        }
        self.expect(Punctuator::RightBrace, "to close precedencegroup")?;

        Ok(DeclarationKind::PrecedenceGroup { name, attributes })
    }

    fn parse_group_names(&mut self) -> PResult<Vec<String>> {
        let mut names = Vec::new();
        loop {
            match self.expect_identifier("naming a precedence group")? {
                Some(name) => names.push(name),
                None => break,
            }
            if !self.eat(Punctuator::Comma) {
                break;
            }
        }
        Ok(names)
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

    fn declaration(source: &str) -> Declaration {
        let (unit, pool) = parse(source);
        assert!(pool.is_empty(), "unexpected diagnostics: {:?}", pool.diagnostics());
        match unit.statements.into_iter().next().map(|s| s.kind) {
            Some(StatementKind::Declaration(declaration)) => declaration,
            other => panic!("Expected declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_modifiers_and_attributes() {
        let decl = declaration("@objc(run:) public private(set) final lazy var x = 0");
        assert_eq!(decl.attributes.len(), 1);
        assert!(decl.attributes[0].arguments.is_some());
        assert_eq!(
            decl.modifiers,
            vec![
                DeclarationModifier::Access(AccessLevel::Public),
                DeclarationModifier::AccessSet(AccessLevel::Private),
                DeclarationModifier::Final,
                DeclarationModifier::Lazy,
            ]
        );
    }

    #[test]
    fn test_generic_function_with_where_clause() {
        let decl = declaration(
            "func merge<T: Comparable, U>(_ a: [T], into b: inout U) throws -> U where U: Collection { return b }",
        );
        match decl.kind {
            DeclarationKind::Function(function) => {
                assert_eq!(function.name, "merge");
                assert!(!function.is_operator);
                assert_eq!(function.generic_parameters.map(|g| g.parameters.len()), Some(2));
                assert_eq!(function.parameters[0].external_name.as_deref(), Some("_"));
                assert_eq!(function.parameters[1].external_name.as_deref(), Some("into"));
                assert_eq!(function.parameters[1].local_name, "b");
                assert!(matches!(function.parameters[1].type_annotation.kind, TypeKind::InOut(_)));
                assert_eq!(function.throws, ThrowsKind::Throwing);
                assert_eq!(function.where_clause.len(), 1);
                assert!(function.body.is_some());
            }
            other => panic!("Expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_operator_function_and_declaration() {
        let (unit, pool) = parse("infix operator <> : AdditionPrecedence\nfunc <>(a: Int, b: Int) -> Int { a }");
        assert!(pool.is_empty());
        match &unit.statements[0].kind {
            StatementKind::Declaration(Declaration {
                kind: DeclarationKind::Operator { name, fixity, precedence_group },
                ..
            }) => {
                assert_eq!(name, "<>");
                assert_eq!(*fixity, OperatorFixity::Infix);
                assert_eq!(precedence_group.as_deref(), Some("AdditionPrecedence"));
            }
            other => panic!("Expected operator declaration, got {other:?}"),
        }
        assert!(matches!(
            &unit.statements[1].kind,
            StatementKind::Declaration(Declaration {
                kind: DeclarationKind::Function(FunctionDeclaration { is_operator: true, .. }),
                ..
            })
        ));
    }

    #[test]
    fn test_enum_with_cases_and_members() {
        let decl = declaration(
            "indirect enum Tree<T>: Equatable {\n  case leaf(T), node(Tree, Tree)\n  case empty = 0\n  var isEmpty: Bool { return false }\n}",
        );
        assert_eq!(decl.modifiers, vec![DeclarationModifier::Indirect]);
        match decl.kind {
            DeclarationKind::Enum(ty) => {
                assert_eq!(ty.name, "Tree");
                assert_eq!(ty.inheritance.len(), 1);
                assert_eq!(ty.members.len(), 3);
                assert!(matches!(
                    &ty.members[0].kind,
                    DeclarationKind::EnumCase(elements) if elements.len() == 2
                ));
                assert!(matches!(
                    &ty.members[2].kind,
                    DeclarationKind::Variable(VariableBody::Accessors {
                        accessors: AccessorBlock::Getter(_),
                        ..
                    })
                ));
            }
            other => panic!("Expected enum, got {other:?}"),
        }
    }

    #[test]
    fn test_protocol_requirements() {
        let decl = declaration(
            "protocol Shape: class {\n  associatedtype Unit = Double\n  var area: Unit { get }\n  mutating func scale(by factor: Unit)\n  init?(sides: Int)\n  subscript(i: Int) -> Unit { get set }\n}",
        );
        match decl.kind {
            DeclarationKind::Protocol(ty) => {
                assert_eq!(ty.members.len(), 5);
                assert!(matches!(
                    &ty.members[1].kind,
                    DeclarationKind::Variable(VariableBody::Accessors {
                        accessors: AccessorBlock::Clauses(clauses),
                        ..
                    }) if clauses.len() == 1 && clauses[0].body.is_none()
                ));
                assert!(matches!(
                    &ty.members[2].kind,
                    DeclarationKind::Function(FunctionDeclaration { body: None, .. })
                ));
                assert!(matches!(
                    &ty.members[3].kind,
                    DeclarationKind::Initializer { kind: InitializerKind::Optional, .. }
                ));
            }
            other => panic!("Expected protocol, got {other:?}"),
        }
    }

    #[test]
    fn test_observed_property() {
        let decl = declaration("var count = 0 {\n  willSet(next) { log(next) }\n  didSet { }\n}");
        match decl.kind {
            DeclarationKind::Variable(VariableBody::Accessors {
                name,
                initializer: Some(_),
                accessors: AccessorBlock::Clauses(clauses),
                ..
            }) => {
                assert_eq!(name, "count");
                assert_eq!(clauses[0].kind, AccessorKind::WillSet);
                assert_eq!(clauses[0].parameter.as_deref(), Some("next"));
                assert_eq!(clauses[1].kind, AccessorKind::DidSet);
            }
            other => panic!("Expected observed variable, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence_group() {
        let decl = declaration(
            "precedencegroup Exponent {\n  higherThan: MultiplicationPrecedence\n  associativity: right\n}",
        );
        match decl.kind {
            DeclarationKind::PrecedenceGroup { name, attributes } => {
                assert_eq!(name, "Exponent");
                assert_eq!(
                    attributes,
                    vec![
                        PrecedenceGroupAttribute::HigherThan(vec![
                            "MultiplicationPrecedence".to_string()
                        ]),
                        PrecedenceGroupAttribute::Associativity(Associativity::Right),
                    ]
                );
            }
            other => panic!("Expected precedence group, got {other:?}"),
        }
    }

    #[test]
    fn test_var_parameter_warns() {
        let (_, pool) = parse("func f(var x: Int) {}");
        assert_eq!(pool.warning_count(), 1);
        assert_eq!(pool.error_count(), 0);
    }

    #[test]
    fn test_missing_name_is_fatal() {
        let mut pool = DiagnosticPool::new();
        let tokens = Lexer::new(&SourceFile::in_memory("struct {}\nlet a = 1")).tokenize();
        assert!(Parser::new(tokens, &mut pool).parse().is_err());
        assert!(pool.has_fatal());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_stray_member_is_recovered() {
        let (unit, pool) = parse("class A {\n  1 + 2\n  func f() {}\n}");
        assert_eq!(pool.error_count(), 1);
        match &unit.statements[0].kind {
            StatementKind::Declaration(Declaration {
                kind: DeclarationKind::Class(ty),
                ..
            }) => assert_eq!(ty.members.len(), 1),
            other => panic!("Expected class, got {other:?}"),
        }
    }

    #[test]
    fn test_import_and_extension() {
        let (unit, pool) = parse("import struct Foundation.Date\nextension Array: Sortable where Element: Comparable { }");
        assert!(pool.is_empty());
        assert!(matches!(
            &unit.statements[0].kind,
            StatementKind::Declaration(Declaration {
                kind: DeclarationKind::Import { kind: Some(ImportKind::Struct), path },
                ..
            }) if path.len() == 2
        ));
        assert!(matches!(
            &unit.statements[1].kind,
            StatementKind::Declaration(Declaration {
                kind: DeclarationKind::Extension { where_clause, .. },
                ..
            }) if where_clause.len() == 1
        ));
    }
}
