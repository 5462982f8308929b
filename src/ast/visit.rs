//! Tree traversal
//!
//! [`Visitor`] walks a tree by shared reference and [`VisitorMut`] by
//! mutable reference. Each `visit_*` method defaults to the matching
//! `walk_*` function, which visits the node's direct children in source
//! order; override a method and call the walk function to keep descending.
//!
//! [`NodeRef`] is the read-only handle downstream consumers use: it exposes
//! the kind name, the direct children and the source range of any node.

use super::*;

pub trait Visitor<'ast>: Sized {
    fn visit_statement(&mut self, statement: &'ast Statement) {
        walk_statement(self, statement);
    }

    fn visit_declaration(&mut self, declaration: &'ast Declaration) {
        walk_declaration(self, declaration);
    }

    fn visit_expression(&mut self, expression: &'ast Expression) {
        walk_expression(self, expression);
    }

    fn visit_type(&mut self, ty: &'ast Type) {
        walk_type(self, ty);
    }

    fn visit_pattern(&mut self, pattern: &'ast Pattern) {
        walk_pattern(self, pattern);
    }
}

pub fn walk_top_level<'ast, V: Visitor<'ast>>(visitor: &mut V, unit: &'ast TopLevelDeclaration) {
    for statement in &unit.statements {
        visitor.visit_statement(statement);
    }
}

fn walk_block<'ast, V: Visitor<'ast>>(visitor: &mut V, block: &'ast CodeBlock) {
    for statement in &block.statements {
        visitor.visit_statement(statement);
    }
}

fn walk_conditions<'ast, V: Visitor<'ast>>(visitor: &mut V, conditions: &'ast [Condition]) {
    for condition in conditions {
        match condition {
            Condition::Expression(expression) => visitor.visit_expression(expression),
            Condition::Availability(_) => {}
            Condition::Case {
                pattern,
                initializer,
            }
            | Condition::OptionalBinding {
                pattern,
                initializer,
                ..
            } => {
                visitor.visit_pattern(pattern);
                visitor.visit_expression(initializer);
            }
        }
    }
}

pub fn walk_statement<'ast, V: Visitor<'ast>>(visitor: &mut V, statement: &'ast Statement) {
    match &statement.kind {
        StatementKind::Expression(expression) => visitor.visit_expression(expression),
        StatementKind::Declaration(declaration) => visitor.visit_declaration(declaration),
        StatementKind::ForIn {
            pattern,
            collection,
            where_clause,
            body,
            ..
        } => {
            visitor.visit_pattern(pattern);
            visitor.visit_expression(collection);
            if let Some(condition) = where_clause {
                visitor.visit_expression(condition);
            }
            walk_block(visitor, body);
        }
        StatementKind::While { conditions, body } | StatementKind::Guard { conditions, body } => {
            walk_conditions(visitor, conditions);
            walk_block(visitor, body);
        }
        StatementKind::RepeatWhile { body, condition } => {
            walk_block(visitor, body);
            visitor.visit_expression(condition);
        }
        StatementKind::If {
            conditions,
            then_block,
            else_clause,
        } => {
            walk_conditions(visitor, conditions);
            walk_block(visitor, then_block);
            match else_clause {
                Some(ElseClause::Else(block)) => walk_block(visitor, block),
                Some(ElseClause::ElseIf(statement)) => visitor.visit_statement(statement),
                None => {}
            }
        }
        StatementKind::Switch { subject, cases } => {
            visitor.visit_expression(subject);
            for case in cases {
                if let CaseLabel::Items(items) = &case.label {
                    for item in items {
                        visitor.visit_pattern(&item.pattern);
                        if let Some(condition) = &item.where_clause {
                            visitor.visit_expression(condition);
                        }
                    }
                }
                for statement in &case.statements {
                    visitor.visit_statement(statement);
                }
            }
        }
        StatementKind::Return(Some(expression)) | StatementKind::Throw(expression) => {
            visitor.visit_expression(expression)
        }
        StatementKind::Defer(body) => walk_block(visitor, body),
        StatementKind::Do { body, catches } => {
            walk_block(visitor, body);
            for catch in catches {
                if let Some(pattern) = &catch.pattern {
                    visitor.visit_pattern(pattern);
                }
                if let Some(condition) = &catch.where_clause {
                    visitor.visit_expression(condition);
                }
                walk_block(visitor, &catch.body);
            }
        }
        StatementKind::Labeled { statement, .. } => visitor.visit_statement(statement),
        StatementKind::Return(None)
        | StatementKind::Break(_)
        | StatementKind::Continue(_)
        | StatementKind::Fallthrough
        | StatementKind::CompilerControl(_) => {}
    }
}

fn walk_generics<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    clause: &'ast Option<GenericParameterClause>,
    where_clause: &'ast [Requirement],
) {
    if let Some(clause) = clause {
        for parameter in &clause.parameters {
            if let Some(constraint) = &parameter.constraint {
                visitor.visit_type(constraint);
            }
        }
        walk_requirements(visitor, &clause.requirements);
    }
    walk_requirements(visitor, where_clause);
}

fn walk_requirements<'ast, V: Visitor<'ast>>(visitor: &mut V, requirements: &'ast [Requirement]) {
    for requirement in requirements {
        let (Requirement::Conformance(left, right) | Requirement::SameType(left, right)) =
            requirement;
        visitor.visit_type(left);
        visitor.visit_type(right);
    }
}

fn walk_parameters<'ast, V: Visitor<'ast>>(visitor: &mut V, parameters: &'ast [Parameter]) {
    for parameter in parameters {
        visitor.visit_type(&parameter.type_annotation);
        if let Some(default) = &parameter.default_argument {
            visitor.visit_expression(default);
        }
    }
}

fn walk_accessors<'ast, V: Visitor<'ast>>(visitor: &mut V, accessors: &'ast AccessorBlock) {
    match accessors {
        AccessorBlock::Getter(body) => walk_block(visitor, body),
        AccessorBlock::Clauses(clauses) => {
            for body in clauses.iter().filter_map(|clause| clause.body.as_ref()) {
                walk_block(visitor, body);
            }
        }
    }
}

fn walk_pattern_initializers<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    initializers: &'ast [PatternInitializer],
) {
    for entry in initializers {
        visitor.visit_pattern(&entry.pattern);
        if let Some(initializer) = &entry.initializer {
            visitor.visit_expression(initializer);
        }
    }
}

pub fn walk_declaration<'ast, V: Visitor<'ast>>(visitor: &mut V, declaration: &'ast Declaration) {
    match &declaration.kind {
        DeclarationKind::Import { .. }
        | DeclarationKind::Operator { .. }
        | DeclarationKind::PrecedenceGroup { .. } => {}
        DeclarationKind::Constant(initializers)
        | DeclarationKind::Variable(VariableBody::Initializers(initializers)) => {
            walk_pattern_initializers(visitor, initializers)
        }
        DeclarationKind::Variable(VariableBody::Accessors {
            type_annotation,
            initializer,
            accessors,
            ..
        }) => {
            if let Some(ty) = type_annotation {
                visitor.visit_type(ty);
            }
            if let Some(initializer) = initializer {
                visitor.visit_expression(initializer);
            }
            walk_accessors(visitor, accessors);
        }
        DeclarationKind::TypeAlias {
            generic_parameters,
            assignment,
            ..
        } => {
            walk_generics(visitor, generic_parameters, &[]);
            visitor.visit_type(assignment);
        }
        DeclarationKind::Function(function) => {
            walk_generics(visitor, &function.generic_parameters, &[]);
            walk_parameters(visitor, &function.parameters);
            if let Some(result) = &function.result {
                visitor.visit_type(result);
            }
            walk_requirements(visitor, &function.where_clause);
            if let Some(body) = &function.body {
                walk_block(visitor, body);
            }
        }
        DeclarationKind::Enum(decl)
        | DeclarationKind::Struct(decl)
        | DeclarationKind::Class(decl)
        | DeclarationKind::Protocol(decl) => {
            walk_generics(visitor, &decl.generic_parameters, &[]);
            for ty in &decl.inheritance {
                visitor.visit_type(ty);
            }
            walk_requirements(visitor, &decl.where_clause);
            for member in &decl.members {
                visitor.visit_declaration(member);
            }
        }
        DeclarationKind::EnumCase(elements) => {
            for element in elements {
                if let Some(ty) = &element.associated {
                    visitor.visit_type(ty);
                }
                if let Some(raw_value) = &element.raw_value {
                    visitor.visit_expression(raw_value);
                }
            }
        }
        DeclarationKind::Extension {
            extended,
            inheritance,
            where_clause,
            members,
        } => {
            visitor.visit_type(extended);
            for ty in inheritance {
                visitor.visit_type(ty);
            }
            walk_requirements(visitor, where_clause);
            for member in members {
                visitor.visit_declaration(member);
            }
        }
        DeclarationKind::Initializer {
            generic_parameters,
            parameters,
            where_clause,
            body,
            ..
        } => {
            walk_generics(visitor, generic_parameters, &[]);
            walk_parameters(visitor, parameters);
            walk_requirements(visitor, where_clause);
            if let Some(body) = body {
                walk_block(visitor, body);
            }
        }
        DeclarationKind::Deinitializer(body) => walk_block(visitor, body),
        DeclarationKind::Subscript {
            generic_parameters,
            parameters,
            result,
            where_clause,
            accessors,
        } => {
            walk_generics(visitor, generic_parameters, &[]);
            walk_parameters(visitor, parameters);
            visitor.visit_type(result);
            walk_requirements(visitor, where_clause);
            walk_accessors(visitor, accessors);
        }
        DeclarationKind::AssociatedType {
            inheritance,
            default,
            ..
        } => {
            for ty in inheritance {
                visitor.visit_type(ty);
            }
            if let Some(ty) = default {
                visitor.visit_type(ty);
            }
        }
    }
}

fn walk_arguments<'ast, V: Visitor<'ast>>(visitor: &mut V, arguments: &'ast [Argument]) {
    for argument in arguments {
        visitor.visit_expression(&argument.expression);
    }
}

fn walk_generic_arguments<'ast, V: Visitor<'ast>>(visitor: &mut V, arguments: &'ast Option<Vec<Type>>) {
    for ty in arguments.iter().flatten() {
        visitor.visit_type(ty);
    }
}

pub fn walk_expression<'ast, V: Visitor<'ast>>(visitor: &mut V, expression: &'ast Expression) {
    match &expression.kind {
        ExpressionKind::Literal(_)
        | ExpressionKind::Magic(_)
        | ExpressionKind::ImplicitMember(_)
        | ExpressionKind::Wildcard
        | ExpressionKind::InOut(_) => {}
        ExpressionKind::InterpolatedString(segments) => {
            for segment in segments {
                if let InterpolatedSegment::Expression(expression) = segment {
                    visitor.visit_expression(expression);
                }
            }
        }
        ExpressionKind::Array(elements) => {
            for element in elements {
                visitor.visit_expression(element);
            }
        }
        ExpressionKind::Dictionary(entries) => {
            for entry in entries {
                visitor.visit_expression(&entry.key);
                visitor.visit_expression(&entry.value);
            }
        }
        ExpressionKind::Identifier {
            generic_arguments, ..
        } => walk_generic_arguments(visitor, generic_arguments),
        ExpressionKind::SelfExpression(form) | ExpressionKind::Super(form) => {
            if let SelfForm::Subscript(arguments) = form {
                walk_arguments(visitor, arguments);
            }
        }
        ExpressionKind::Closure(closure) => {
            for capture in &closure.captures {
                visitor.visit_expression(&capture.expression);
            }
            if let Some(signature) = &closure.signature {
                if let ClosureParameters::Clause(parameters) = &signature.parameters {
                    for ty in parameters.iter().filter_map(|p| p.type_annotation.as_ref()) {
                        visitor.visit_type(ty);
                    }
                }
                if let Some(result) = &signature.result {
                    visitor.visit_type(result);
                }
            }
            for statement in &closure.statements {
                visitor.visit_statement(statement);
            }
        }
        ExpressionKind::Tuple(elements) => {
            for element in elements {
                visitor.visit_expression(&element.expression);
            }
        }
        ExpressionKind::Parenthesized(inner)
        | ExpressionKind::Selector(inner)
        | ExpressionKind::PostfixSelf(inner)
        | ExpressionKind::Initializer(inner)
        | ExpressionKind::ArgumentNames { base: inner, .. }
        | ExpressionKind::OptionalChaining(inner)
        | ExpressionKind::ForcedValue(inner)
        | ExpressionKind::PrefixOperator { operand: inner, .. }
        | ExpressionKind::PostfixOperator { operand: inner, .. }
        | ExpressionKind::Try {
            expression: inner, ..
        } => visitor.visit_expression(inner),
        ExpressionKind::FunctionCall {
            callee,
            arguments,
            trailing_closure,
        } => {
            visitor.visit_expression(callee);
            walk_arguments(visitor, arguments);
            if let Some(closure) = trailing_closure {
                visitor.visit_expression(closure);
            }
        }
        ExpressionKind::ExplicitMember { base, member } => {
            visitor.visit_expression(base);
            if let Member::Named {
                generic_arguments, ..
            } = member
            {
                walk_generic_arguments(visitor, generic_arguments);
            }
        }
        ExpressionKind::Subscript { base, arguments } => {
            visitor.visit_expression(base);
            walk_arguments(visitor, arguments);
        }
        ExpressionKind::Type(ty) => visitor.visit_type(ty),
        ExpressionKind::Sequence(elements) => {
            for element in elements {
                match element {
                    SequenceElement::Operand(operand) => visitor.visit_expression(operand),
                    SequenceElement::Operator(SequenceOperator::Ternary(middle)) => {
                        visitor.visit_expression(middle)
                    }
                    SequenceElement::Operator(_) => {}
                }
            }
        }
        ExpressionKind::BinaryOperator { left, right, .. } => {
            visitor.visit_expression(left);
            visitor.visit_expression(right);
        }
        ExpressionKind::Assignment { target, value } => {
            visitor.visit_expression(target);
            visitor.visit_expression(value);
        }
        ExpressionKind::Ternary {
            condition,
            then_expression,
            else_expression,
        } => {
            visitor.visit_expression(condition);
            visitor.visit_expression(then_expression);
            visitor.visit_expression(else_expression);
        }
        ExpressionKind::TypeCasting { expression, ty, .. } => {
            visitor.visit_expression(expression);
            visitor.visit_type(ty);
        }
    }
}

fn walk_tuple_type_elements<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    elements: &'ast [TupleTypeElement],
) {
    for element in elements {
        visitor.visit_type(&element.ty);
    }
}

pub fn walk_type<'ast, V: Visitor<'ast>>(visitor: &mut V, ty: &'ast Type) {
    match &ty.kind {
        TypeKind::Identifier(names) => {
            for name in names {
                walk_generic_arguments(visitor, &name.generic_arguments);
            }
        }
        TypeKind::Array(inner)
        | TypeKind::Optional(inner)
        | TypeKind::ImplicitlyUnwrappedOptional(inner)
        | TypeKind::Metatype { base: inner, .. }
        | TypeKind::Attributed { base: inner, .. }
        | TypeKind::InOut(inner) => visitor.visit_type(inner),
        TypeKind::Dictionary { key, value } => {
            visitor.visit_type(key);
            visitor.visit_type(value);
        }
        TypeKind::Tuple(elements) => walk_tuple_type_elements(visitor, elements),
        TypeKind::Function {
            arguments, result, ..
        } => {
            walk_tuple_type_elements(visitor, arguments);
            visitor.visit_type(result);
        }
        TypeKind::ProtocolComposition(types) => {
            for ty in types {
                visitor.visit_type(ty);
            }
        }
        TypeKind::Any | TypeKind::SelfType => {}
    }
}

pub fn walk_pattern<'ast, V: Visitor<'ast>>(visitor: &mut V, pattern: &'ast Pattern) {
    match &pattern.kind {
        PatternKind::Wildcard { type_annotation } | PatternKind::Identifier { type_annotation, .. } => {
            if let Some(ty) = type_annotation {
                visitor.visit_type(ty);
            }
        }
        PatternKind::ValueBinding { pattern, .. } | PatternKind::Optional(pattern) => {
            visitor.visit_pattern(pattern)
        }
        PatternKind::Tuple {
            elements,
            type_annotation,
        } => {
            for element in elements {
                visitor.visit_pattern(&element.pattern);
            }
            if let Some(ty) = type_annotation {
                visitor.visit_type(ty);
            }
        }
        PatternKind::EnumCase {
            type_identifier,
            associated,
            ..
        } => {
            if let Some(ty) = type_identifier {
                visitor.visit_type(ty);
            }
            if let Some(pattern) = associated {
                visitor.visit_pattern(pattern);
            }
        }
        PatternKind::Is(ty) => visitor.visit_type(ty),
        PatternKind::As { pattern, ty } => {
            visitor.visit_pattern(pattern);
            visitor.visit_type(ty);
        }
        PatternKind::Expression(expression) => visitor.visit_expression(expression),
    }
}

// ===== Mutable traversal =====

pub trait VisitorMut: Sized {
    fn visit_statement_mut(&mut self, statement: &mut Statement) {
        walk_statement_mut(self, statement);
    }

    fn visit_declaration_mut(&mut self, declaration: &mut Declaration) {
        walk_declaration_mut(self, declaration);
    }

    fn visit_expression_mut(&mut self, expression: &mut Expression) {
        walk_expression_mut(self, expression);
    }

    fn visit_type_mut(&mut self, ty: &mut Type) {
        walk_type_mut(self, ty);
    }

    fn visit_pattern_mut(&mut self, pattern: &mut Pattern) {
        walk_pattern_mut(self, pattern);
    }
}

pub fn walk_top_level_mut<V: VisitorMut>(visitor: &mut V, unit: &mut TopLevelDeclaration) {
    for statement in &mut unit.statements {
        visitor.visit_statement_mut(statement);
    }
}

fn walk_block_mut<V: VisitorMut>(visitor: &mut V, block: &mut CodeBlock) {
    for statement in &mut block.statements {
        visitor.visit_statement_mut(statement);
    }
}

fn walk_conditions_mut<V: VisitorMut>(visitor: &mut V, conditions: &mut [Condition]) {
    for condition in conditions {
        match condition {
            Condition::Expression(expression) => visitor.visit_expression_mut(expression),
            Condition::Availability(_) => {}
            Condition::Case {
                pattern,
                initializer,
            }
            | Condition::OptionalBinding {
                pattern,
                initializer,
                ..
            } => {
                visitor.visit_pattern_mut(pattern);
                visitor.visit_expression_mut(initializer);
            }
        }
    }
}

pub fn walk_statement_mut<V: VisitorMut>(visitor: &mut V, statement: &mut Statement) {
    match &mut statement.kind {
        StatementKind::Expression(expression) => visitor.visit_expression_mut(expression),
        StatementKind::Declaration(declaration) => visitor.visit_declaration_mut(declaration),
        StatementKind::ForIn {
            pattern,
            collection,
            where_clause,
            body,
            ..
        } => {
            visitor.visit_pattern_mut(pattern);
            visitor.visit_expression_mut(collection);
            if let Some(condition) = where_clause {
                visitor.visit_expression_mut(condition);
            }
            walk_block_mut(visitor, body);
        }
        StatementKind::While { conditions, body } | StatementKind::Guard { conditions, body } => {
            walk_conditions_mut(visitor, conditions);
            walk_block_mut(visitor, body);
        }
        StatementKind::RepeatWhile { body, condition } => {
            walk_block_mut(visitor, body);
            visitor.visit_expression_mut(condition);
        }
        StatementKind::If {
            conditions,
            then_block,
            else_clause,
        } => {
            walk_conditions_mut(visitor, conditions);
            walk_block_mut(visitor, then_block);
            match else_clause {
                Some(ElseClause::Else(block)) => walk_block_mut(visitor, block),
                Some(ElseClause::ElseIf(statement)) => visitor.visit_statement_mut(statement),
                None => {}
            }
        }
        StatementKind::Switch { subject, cases } => {
            visitor.visit_expression_mut(subject);
            for case in cases {
                if let CaseLabel::Items(items) = &mut case.label {
                    for item in items {
                        visitor.visit_pattern_mut(&mut item.pattern);
                        if let Some(condition) = &mut item.where_clause {
                            visitor.visit_expression_mut(condition);
                        }
                    }
                }
                for statement in &mut case.statements {
                    visitor.visit_statement_mut(statement);
                }
            }
        }
        StatementKind::Return(Some(expression)) | StatementKind::Throw(expression) => {
            visitor.visit_expression_mut(expression)
        }
        StatementKind::Defer(body) => walk_block_mut(visitor, body),
        StatementKind::Do { body, catches } => {
            walk_block_mut(visitor, body);
            for catch in catches {
                if let Some(pattern) = &mut catch.pattern {
                    visitor.visit_pattern_mut(pattern);
                }
                if let Some(condition) = &mut catch.where_clause {
                    visitor.visit_expression_mut(condition);
                }
                walk_block_mut(visitor, &mut catch.body);
            }
        }
        StatementKind::Labeled { statement, .. } => visitor.visit_statement_mut(statement),
        StatementKind::Return(None)
        | StatementKind::Break(_)
        | StatementKind::Continue(_)
        | StatementKind::Fallthrough
        | StatementKind::CompilerControl(_) => {}
    }
}

fn walk_generics_mut<V: VisitorMut>(visitor: &mut V, clause: &mut Option<GenericParameterClause>) {
    if let Some(clause) = clause {
        for parameter in &mut clause.parameters {
            if let Some(constraint) = &mut parameter.constraint {
                visitor.visit_type_mut(constraint);
            }
        }
        walk_requirements_mut(visitor, &mut clause.requirements);
    }
}

fn walk_requirements_mut<V: VisitorMut>(visitor: &mut V, requirements: &mut [Requirement]) {
    for requirement in requirements {
        let (Requirement::Conformance(left, right) | Requirement::SameType(left, right)) =
            requirement;
        visitor.visit_type_mut(left);
        visitor.visit_type_mut(right);
    }
}

fn walk_parameters_mut<V: VisitorMut>(visitor: &mut V, parameters: &mut [Parameter]) {
    for parameter in parameters {
        visitor.visit_type_mut(&mut parameter.type_annotation);
        if let Some(default) = &mut parameter.default_argument {
            visitor.visit_expression_mut(default);
        }
    }
}

fn walk_accessors_mut<V: VisitorMut>(visitor: &mut V, accessors: &mut AccessorBlock) {
    match accessors {
        AccessorBlock::Getter(body) => walk_block_mut(visitor, body),
        AccessorBlock::Clauses(clauses) => {
            for body in clauses.iter_mut().filter_map(|clause| clause.body.as_mut()) {
                walk_block_mut(visitor, body);
            }
        }
    }
}

fn walk_pattern_initializers_mut<V: VisitorMut>(
    visitor: &mut V,
    initializers: &mut [PatternInitializer],
) {
    for entry in initializers {
        visitor.visit_pattern_mut(&mut entry.pattern);
        if let Some(initializer) = &mut entry.initializer {
            visitor.visit_expression_mut(initializer);
        }
    }
}

pub fn walk_declaration_mut<V: VisitorMut>(visitor: &mut V, declaration: &mut Declaration) {
    match &mut declaration.kind {
        DeclarationKind::Import { .. }
        | DeclarationKind::Operator { .. }
        | DeclarationKind::PrecedenceGroup { .. } => {}
        DeclarationKind::Constant(initializers)
        | DeclarationKind::Variable(VariableBody::Initializers(initializers)) => {
            walk_pattern_initializers_mut(visitor, initializers)
        }
        DeclarationKind::Variable(VariableBody::Accessors {
            type_annotation,
            initializer,
            accessors,
            ..
        }) => {
            if let Some(ty) = type_annotation {
                visitor.visit_type_mut(ty);
            }
            if let Some(initializer) = initializer {
                visitor.visit_expression_mut(initializer);
            }
            walk_accessors_mut(visitor, accessors);
        }
        DeclarationKind::TypeAlias {
            generic_parameters,
            assignment,
            ..
        } => {
            walk_generics_mut(visitor, generic_parameters);
            visitor.visit_type_mut(assignment);
        }
        DeclarationKind::Function(function) => {
            walk_generics_mut(visitor, &mut function.generic_parameters);
            walk_parameters_mut(visitor, &mut function.parameters);
            if let Some(result) = &mut function.result {
                visitor.visit_type_mut(result);
            }
            walk_requirements_mut(visitor, &mut function.where_clause);
            if let Some(body) = &mut function.body {
                walk_block_mut(visitor, body);
            }
        }
        DeclarationKind::Enum(decl)
        | DeclarationKind::Struct(decl)
        | DeclarationKind::Class(decl)
        | DeclarationKind::Protocol(decl) => {
            walk_generics_mut(visitor, &mut decl.generic_parameters);
            for ty in &mut decl.inheritance {
                visitor.visit_type_mut(ty);
            }
            walk_requirements_mut(visitor, &mut decl.where_clause);
            for member in &mut decl.members {
                visitor.visit_declaration_mut(member);
            }
        }
        DeclarationKind::EnumCase(elements) => {
            for element in elements {
                if let Some(ty) = &mut element.associated {
                    visitor.visit_type_mut(ty);
                }
                if let Some(raw_value) = &mut element.raw_value {
                    visitor.visit_expression_mut(raw_value);
                }
            }
        }
        DeclarationKind::Extension {
            extended,
            inheritance,
            where_clause,
            members,
        } => {
            visitor.visit_type_mut(extended);
            for ty in inheritance {
                visitor.visit_type_mut(ty);
            }
            walk_requirements_mut(visitor, where_clause);
            for member in members {
                visitor.visit_declaration_mut(member);
            }
        }
        DeclarationKind::Initializer {
            generic_parameters,
            parameters,
            where_clause,
            body,
            ..
        } => {
            walk_generics_mut(visitor, generic_parameters);
            walk_parameters_mut(visitor, parameters);
            walk_requirements_mut(visitor, where_clause);
            if let Some(body) = body {
                walk_block_mut(visitor, body);
            }
        }
        DeclarationKind::Deinitializer(body) => walk_block_mut(visitor, body),
        DeclarationKind::Subscript {
            generic_parameters,
            parameters,
            result,
            where_clause,
            accessors,
        } => {
            walk_generics_mut(visitor, generic_parameters);
            walk_parameters_mut(visitor, parameters);
            visitor.visit_type_mut(result);
            walk_requirements_mut(visitor, where_clause);
            walk_accessors_mut(visitor, accessors);
        }
        DeclarationKind::AssociatedType {
            inheritance,
            default,
            ..
        } => {
            for ty in inheritance {
                visitor.visit_type_mut(ty);
            }
            if let Some(ty) = default {
                visitor.visit_type_mut(ty);
            }
        }
    }
}

fn walk_arguments_mut<V: VisitorMut>(visitor: &mut V, arguments: &mut [Argument]) {
    for argument in arguments {
        visitor.visit_expression_mut(&mut argument.expression);
    }
}

fn walk_generic_arguments_mut<V: VisitorMut>(visitor: &mut V, arguments: &mut Option<Vec<Type>>) {
    for ty in arguments.iter_mut().flatten() {
        visitor.visit_type_mut(ty);
    }
}

pub fn walk_expression_mut<V: VisitorMut>(visitor: &mut V, expression: &mut Expression) {
    match &mut expression.kind {
        ExpressionKind::Literal(_)
        | ExpressionKind::Magic(_)
        | ExpressionKind::ImplicitMember(_)
        | ExpressionKind::Wildcard
        | ExpressionKind::InOut(_) => {}
        ExpressionKind::InterpolatedString(segments) => {
            for segment in segments {
                if let InterpolatedSegment::Expression(expression) = segment {
                    visitor.visit_expression_mut(expression);
                }
            }
        }
        ExpressionKind::Array(elements) => {
            for element in elements {
                visitor.visit_expression_mut(element);
            }
        }
        ExpressionKind::Dictionary(entries) => {
            for entry in entries {
                visitor.visit_expression_mut(&mut entry.key);
                visitor.visit_expression_mut(&mut entry.value);
            }
        }
        ExpressionKind::Identifier {
            generic_arguments, ..
        } => walk_generic_arguments_mut(visitor, generic_arguments),
        ExpressionKind::SelfExpression(form) | ExpressionKind::Super(form) => {
            if let SelfForm::Subscript(arguments) = form {
                walk_arguments_mut(visitor, arguments);
            }
        }
        ExpressionKind::Closure(closure) => {
            for capture in &mut closure.captures {
                visitor.visit_expression_mut(&mut capture.expression);
            }
            if let Some(signature) = &mut closure.signature {
                if let ClosureParameters::Clause(parameters) = &mut signature.parameters {
                    for ty in parameters
                        .iter_mut()
                        .filter_map(|p| p.type_annotation.as_mut())
                    {
                        visitor.visit_type_mut(ty);
                    }
                }
                if let Some(result) = &mut signature.result {
                    visitor.visit_type_mut(result);
                }
            }
            for statement in &mut closure.statements {
                visitor.visit_statement_mut(statement);
            }
        }
        ExpressionKind::Tuple(elements) => {
            for element in elements {
                visitor.visit_expression_mut(&mut element.expression);
            }
        }
        ExpressionKind::Parenthesized(inner)
        | ExpressionKind::Selector(inner)
        | ExpressionKind::PostfixSelf(inner)
        | ExpressionKind::Initializer(inner)
        | ExpressionKind::ArgumentNames { base: inner, .. }
        | ExpressionKind::OptionalChaining(inner)
        | ExpressionKind::ForcedValue(inner)
        | ExpressionKind::PrefixOperator { operand: inner, .. }
        | ExpressionKind::PostfixOperator { operand: inner, .. }
        | ExpressionKind::Try {
            expression: inner, ..
        } => visitor.visit_expression_mut(inner),
        ExpressionKind::FunctionCall {
            callee,
            arguments,
            trailing_closure,
        } => {
            visitor.visit_expression_mut(callee);
            walk_arguments_mut(visitor, arguments);
            if let Some(closure) = trailing_closure {
                visitor.visit_expression_mut(closure);
            }
        }
        ExpressionKind::ExplicitMember { base, member } => {
            visitor.visit_expression_mut(base);
            if let Member::Named {
                generic_arguments, ..
            } = member
            {
                walk_generic_arguments_mut(visitor, generic_arguments);
            }
        }
        ExpressionKind::Subscript { base, arguments } => {
            visitor.visit_expression_mut(base);
            walk_arguments_mut(visitor, arguments);
        }
        ExpressionKind::Type(ty) => visitor.visit_type_mut(ty),
        ExpressionKind::Sequence(elements) => {
            for element in elements {
                match element {
                    SequenceElement::Operand(operand) => visitor.visit_expression_mut(operand),
                    SequenceElement::Operator(SequenceOperator::Ternary(middle)) => {
                        visitor.visit_expression_mut(middle)
                    }
                    SequenceElement::Operator(_) => {}
                }
            }
        }
        ExpressionKind::BinaryOperator { left, right, .. } => {
            visitor.visit_expression_mut(left);
            visitor.visit_expression_mut(right);
        }
        ExpressionKind::Assignment { target, value } => {
            visitor.visit_expression_mut(target);
            visitor.visit_expression_mut(value);
        }
        ExpressionKind::Ternary {
            condition,
            then_expression,
            else_expression,
        } => {
            visitor.visit_expression_mut(condition);
            visitor.visit_expression_mut(then_expression);
            visitor.visit_expression_mut(else_expression);
        }
        ExpressionKind::TypeCasting { expression, ty, .. } => {
            visitor.visit_expression_mut(expression);
            visitor.visit_type_mut(ty);
        }
    }
}

pub fn walk_type_mut<V: VisitorMut>(visitor: &mut V, ty: &mut Type) {
    match &mut ty.kind {
        TypeKind::Identifier(names) => {
            for name in names {
                walk_generic_arguments_mut(visitor, &mut name.generic_arguments);
            }
        }
        TypeKind::Array(inner)
        | TypeKind::Optional(inner)
        | TypeKind::ImplicitlyUnwrappedOptional(inner)
        | TypeKind::Metatype { base: inner, .. }
        | TypeKind::Attributed { base: inner, .. }
        | TypeKind::InOut(inner) => visitor.visit_type_mut(inner),
        TypeKind::Dictionary { key, value } => {
            visitor.visit_type_mut(key);
            visitor.visit_type_mut(value);
        }
        TypeKind::Tuple(elements) => {
            for element in elements {
                visitor.visit_type_mut(&mut element.ty);
            }
        }
        TypeKind::Function {
            arguments, result, ..
        } => {
            for element in arguments {
                visitor.visit_type_mut(&mut element.ty);
            }
            visitor.visit_type_mut(result);
        }
        TypeKind::ProtocolComposition(types) => {
            for ty in types {
                visitor.visit_type_mut(ty);
            }
        }
        TypeKind::Any | TypeKind::SelfType => {}
    }
}

pub fn walk_pattern_mut<V: VisitorMut>(visitor: &mut V, pattern: &mut Pattern) {
    match &mut pattern.kind {
        PatternKind::Wildcard { type_annotation } | PatternKind::Identifier { type_annotation, .. } => {
            if let Some(ty) = type_annotation {
                visitor.visit_type_mut(ty);
            }
        }
        PatternKind::ValueBinding { pattern, .. } | PatternKind::Optional(pattern) => {
            visitor.visit_pattern_mut(pattern)
        }
        PatternKind::Tuple {
            elements,
            type_annotation,
        } => {
            for element in elements {
                visitor.visit_pattern_mut(&mut element.pattern);
            }
            if let Some(ty) = type_annotation {
                visitor.visit_type_mut(ty);
            }
        }
        PatternKind::EnumCase {
            type_identifier,
            associated,
            ..
        } => {
            if let Some(ty) = type_identifier {
                visitor.visit_type_mut(ty);
            }
            if let Some(pattern) = associated {
                visitor.visit_pattern_mut(pattern);
            }
        }
        PatternKind::Is(ty) => visitor.visit_type_mut(ty),
        PatternKind::As { pattern, ty } => {
            visitor.visit_pattern_mut(pattern);
            visitor.visit_type_mut(ty);
        }
        PatternKind::Expression(expression) => visitor.visit_expression_mut(expression),
    }
}

// ===== Read-only node handle =====

/// Borrowed handle to any AST node.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'ast> {
    TopLevel(&'ast TopLevelDeclaration),
    Statement(&'ast Statement),
    Declaration(&'ast Declaration),
    Expression(&'ast Expression),
    Type(&'ast Type),
    Pattern(&'ast Pattern),
}

/// Records direct children without descending further.
struct ChildCollector<'ast> {
    children: Vec<NodeRef<'ast>>,
}

impl<'ast> Visitor<'ast> for ChildCollector<'ast> {
    fn visit_statement(&mut self, statement: &'ast Statement) {
        self.children.push(NodeRef::Statement(statement));
    }

    fn visit_declaration(&mut self, declaration: &'ast Declaration) {
        self.children.push(NodeRef::Declaration(declaration));
    }

    fn visit_expression(&mut self, expression: &'ast Expression) {
        self.children.push(NodeRef::Expression(expression));
    }

    fn visit_type(&mut self, ty: &'ast Type) {
        self.children.push(NodeRef::Type(ty));
    }

    fn visit_pattern(&mut self, pattern: &'ast Pattern) {
        self.children.push(NodeRef::Pattern(pattern));
    }
}

impl<'ast> NodeRef<'ast> {
    pub fn id(&self) -> NodeId {
        match self {
            NodeRef::TopLevel(node) => node.id,
            NodeRef::Statement(node) => node.id,
            NodeRef::Declaration(node) => node.id,
            NodeRef::Expression(node) => node.id,
            NodeRef::Type(node) => node.id,
            NodeRef::Pattern(node) => node.id,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<NodeRef<'ast>> {
        let mut collector = ChildCollector {
            children: Vec::new(),
        };
        match *self {
            NodeRef::TopLevel(node) => walk_top_level(&mut collector, node),
            NodeRef::Statement(node) => walk_statement(&mut collector, node),
            NodeRef::Declaration(node) => walk_declaration(&mut collector, node),
            NodeRef::Expression(node) => walk_expression(&mut collector, node),
            NodeRef::Type(node) => walk_type(&mut collector, node),
            NodeRef::Pattern(node) => walk_pattern(&mut collector, node),
        }
        collector.children
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeRef::TopLevel(_) => "TopLevelDeclaration",
            NodeRef::Statement(node) => statement_kind_name(&node.kind),
            NodeRef::Declaration(node) => declaration_kind_name(&node.kind),
            NodeRef::Expression(node) => expression_kind_name(&node.kind),
            NodeRef::Type(node) => type_kind_name(&node.kind),
            NodeRef::Pattern(node) => pattern_kind_name(&node.kind),
        }
    }
}

impl Locatable for NodeRef<'_> {
    fn source_range(&self) -> SourceRange {
        match self {
            NodeRef::TopLevel(node) => node.range.clone(),
            NodeRef::Statement(node) => node.range.clone(),
            NodeRef::Declaration(node) => node.range.clone(),
            NodeRef::Expression(node) => node.range.clone(),
            NodeRef::Type(node) => node.range.clone(),
            NodeRef::Pattern(node) => node.range.clone(),
        }
    }
}

fn statement_kind_name(kind: &StatementKind) -> &'static str {
    match kind {
        StatementKind::Expression(_) => "ExpressionStatement",
        StatementKind::Declaration(_) => "DeclarationStatement",
        StatementKind::ForIn { .. } => "ForInStatement",
        StatementKind::While { .. } => "WhileStatement",
        StatementKind::RepeatWhile { .. } => "RepeatWhileStatement",
        StatementKind::If { .. } => "IfStatement",
        StatementKind::Guard { .. } => "GuardStatement",
        StatementKind::Switch { .. } => "SwitchStatement",
        StatementKind::Break(_) => "BreakStatement",
        StatementKind::Continue(_) => "ContinueStatement",
        StatementKind::Fallthrough => "FallthroughStatement",
        StatementKind::Return(_) => "ReturnStatement",
        StatementKind::Throw(_) => "ThrowStatement",
        StatementKind::Defer(_) => "DeferStatement",
        StatementKind::Do { .. } => "DoStatement",
        StatementKind::Labeled { .. } => "LabeledStatement",
        StatementKind::CompilerControl(_) => "CompilerControlStatement",
    }
}

fn declaration_kind_name(kind: &DeclarationKind) -> &'static str {
    match kind {
        DeclarationKind::Import { .. } => "ImportDeclaration",
        DeclarationKind::Constant(_) => "ConstantDeclaration",
        DeclarationKind::Variable(_) => "VariableDeclaration",
        DeclarationKind::TypeAlias { .. } => "TypealiasDeclaration",
        DeclarationKind::Function(_) => "FunctionDeclaration",
        DeclarationKind::Enum(_) => "EnumDeclaration",
        DeclarationKind::EnumCase(_) => "EnumCaseDeclaration",
        DeclarationKind::Struct(_) => "StructDeclaration",
        DeclarationKind::Class(_) => "ClassDeclaration",
        DeclarationKind::Protocol(_) => "ProtocolDeclaration",
        DeclarationKind::Extension { .. } => "ExtensionDeclaration",
        DeclarationKind::Initializer { .. } => "InitializerDeclaration",
        DeclarationKind::Deinitializer(_) => "DeinitializerDeclaration",
        DeclarationKind::Subscript { .. } => "SubscriptDeclaration",
        DeclarationKind::Operator { .. } => "OperatorDeclaration",
        DeclarationKind::PrecedenceGroup { .. } => "PrecedenceGroupDeclaration",
        DeclarationKind::AssociatedType { .. } => "AssociatedTypeDeclaration",
    }
}

fn expression_kind_name(kind: &ExpressionKind) -> &'static str {
    match kind {
        ExpressionKind::Literal(_) => "LiteralExpression",
        ExpressionKind::InterpolatedString(_) => "InterpolatedStringLiteralExpression",
        ExpressionKind::Array(_) => "ArrayLiteralExpression",
        ExpressionKind::Dictionary(_) => "DictionaryLiteralExpression",
        ExpressionKind::Magic(_) => "MagicLiteralExpression",
        ExpressionKind::Identifier { .. } => "IdentifierExpression",
        ExpressionKind::ImplicitMember(_) => "ImplicitMemberExpression",
        ExpressionKind::SelfExpression(_) => "SelfExpression",
        ExpressionKind::Super(_) => "SuperclassExpression",
        ExpressionKind::Closure(_) => "ClosureExpression",
        ExpressionKind::Parenthesized(_) => "ParenthesizedExpression",
        ExpressionKind::Tuple(_) => "TupleExpression",
        ExpressionKind::Wildcard => "WildcardExpression",
        ExpressionKind::Selector(_) => "SelectorExpression",
        ExpressionKind::PrefixOperator { .. } => "PrefixOperatorExpression",
        ExpressionKind::InOut(_) => "InOutExpression",
        ExpressionKind::Try { .. } => "TryOperatorExpression",
        ExpressionKind::FunctionCall { .. } => "FunctionCallExpression",
        ExpressionKind::ExplicitMember { .. } => "ExplicitMemberExpression",
        ExpressionKind::PostfixSelf(_) => "PostfixSelfExpression",
        ExpressionKind::Initializer(_) => "InitializerExpression",
        ExpressionKind::ArgumentNames { .. } => "ArgumentNamesExpression",
        ExpressionKind::Subscript { .. } => "SubscriptExpression",
        ExpressionKind::OptionalChaining(_) => "OptionalChainingExpression",
        ExpressionKind::ForcedValue(_) => "ForcedValueExpression",
        ExpressionKind::PostfixOperator { .. } => "PostfixOperatorExpression",
        ExpressionKind::Type(_) => "TypeExpression",
        ExpressionKind::Sequence(_) => "SequenceExpression",
        ExpressionKind::BinaryOperator { .. } => "BinaryOperatorExpression",
        ExpressionKind::Assignment { .. } => "AssignmentOperatorExpression",
        ExpressionKind::Ternary { .. } => "TernaryConditionalOperatorExpression",
        ExpressionKind::TypeCasting { .. } => "TypeCastingOperatorExpression",
    }
}

fn type_kind_name(kind: &TypeKind) -> &'static str {
    match kind {
        TypeKind::Identifier(_) => "TypeIdentifier",
        TypeKind::Array(_) => "ArrayType",
        TypeKind::Dictionary { .. } => "DictionaryType",
        TypeKind::Optional(_) => "OptionalType",
        TypeKind::ImplicitlyUnwrappedOptional(_) => "ImplicitlyUnwrappedOptionalType",
        TypeKind::Tuple(_) => "TupleType",
        TypeKind::Function { .. } => "FunctionType",
        TypeKind::ProtocolComposition(_) => "ProtocolCompositionType",
        TypeKind::Metatype { .. } => "MetatypeType",
        TypeKind::Any => "AnyType",
        TypeKind::SelfType => "SelfType",
        TypeKind::Attributed { .. } => "AttributedType",
        TypeKind::InOut(_) => "InOutType",
    }
}

fn pattern_kind_name(kind: &PatternKind) -> &'static str {
    match kind {
        PatternKind::Wildcard { .. } => "WildcardPattern",
        PatternKind::Identifier { .. } => "IdentifierPattern",
        PatternKind::ValueBinding { .. } => "ValueBindingPattern",
        PatternKind::Tuple { .. } => "TuplePattern",
        PatternKind::EnumCase { .. } => "EnumCasePattern",
        PatternKind::Optional(_) => "OptionalPattern",
        PatternKind::Is(_) => "IsPattern",
        PatternKind::As { .. } => "AsPattern",
        PatternKind::Expression(_) => "ExpressionPattern",
    }
}
