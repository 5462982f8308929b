// Integration tests for the translation pipeline

use swiftast::ast::*;
use swiftast::diagnostic::{Diagnostic, DiagnosticLimits, DiagnosticPool, Severity, StopSignal};
use swiftast::folding::{fold, PrecedenceTable};
use swiftast::parser::lexer::Lexer;
use swiftast::parser::ParserError;
use swiftast::source::{SourceFile, SourceLocation};
use swiftast::{translate, Translation, TranslationOptions};

fn translate_clean(source: &str) -> Translation {
    let file = SourceFile::in_memory(source);
    let mut pool = DiagnosticPool::new();
    let translation =
        translate(&file, &mut pool, &TranslationOptions::default()).expect("Translation failed");
    assert!(
        pool.is_empty(),
        "Unexpected diagnostics: {:?}",
        pool.diagnostics()
    );
    translation
}

fn only_expression(unit: &TopLevelDeclaration) -> &Expression {
    assert_eq!(unit.statements.len(), 1);
    match &unit.statements[0].kind {
        StatementKind::Expression(expression) => expression,
        other => panic!("Expected expression statement, got {other:?}"),
    }
}

fn annotation_of(unit: &TopLevelDeclaration) -> &Type {
    match &unit.statements[0].kind {
        StatementKind::Declaration(Declaration {
            kind: DeclarationKind::Constant(initializers),
            ..
        }) => match &initializers[0].pattern.kind {
            PatternKind::Identifier {
                type_annotation: Some(ty),
                ..
            } => ty,
            other => panic!("Expected annotated identifier, got {other:?}"),
        },
        other => panic!("Expected constant declaration, got {other:?}"),
    }
}

/// `A<B<C>>` rendered back from the type tree
fn render_type(ty: &Type) -> String {
    match &ty.kind {
        TypeKind::Identifier(names) => names
            .iter()
            .map(|name| match &name.generic_arguments {
                Some(arguments) => format!(
                    "{}<{}>",
                    name.name,
                    arguments.iter().map(render_type).collect::<Vec<_>>().join(", ")
                ),
                None => name.name.clone(),
            })
            .collect::<Vec<_>>()
            .join("."),
        other => panic!("Unexpected type: {other:?}"),
    }
}

fn integer(expression: &Expression) -> &str {
    match &expression.kind {
        ExpressionKind::Literal(Literal::Integer { raw, .. }) => raw,
        other => panic!("Expected integer literal, got {other:?}"),
    }
}

#[test]
fn test_arithmetic_folds_end_to_end() {
    let translation = translate_clean("1+2*3");
    let expression = only_expression(&translation.unit);

    match &expression.kind {
        ExpressionKind::BinaryOperator {
            operator,
            left,
            right,
        } => {
            assert_eq!(operator, "+");
            assert_eq!(integer(left), "1");
            match &right.kind {
                ExpressionKind::BinaryOperator {
                    operator,
                    left,
                    right,
                } => {
                    assert_eq!(operator, "*");
                    assert_eq!(integer(left), "2");
                    assert_eq!(integer(right), "3");
                }
                other => panic!("Expected multiplication, got {other:?}"),
            }
        }
        other => panic!("Expected addition, got {other:?}"),
    }
}

#[test]
fn test_nested_generic_type() {
    let translation = translate_clean("let x: A<B<C>> = y");
    let ty = annotation_of(&translation.unit);
    assert_eq!(render_type(ty), "A<B<C>>");

    let names = ty.identifier_names().expect("type identifier");
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].name, "A");
}

#[test]
fn test_deeply_nested_generic_type() {
    let translation = translate_clean("let x: A<B<C<D>>> = y");
    assert_eq!(render_type(annotation_of(&translation.unit)), "A<B<C<D>>>");

    let translation = translate_clean("let m: Dictionary<String, Array<Set<Int>>> = [:]");
    assert_eq!(
        render_type(annotation_of(&translation.unit)),
        "Dictionary<String, Array<Set<Int>>>"
    );
}

#[test]
fn test_less_than_is_a_comparison() {
    let translation = translate_clean("foo < bar");
    match &only_expression(&translation.unit).kind {
        ExpressionKind::BinaryOperator { operator, .. } => assert_eq!(operator, "<"),
        other => panic!("Expected comparison, got {other:?}"),
    }

    let translation = translate_clean("a < b && c > d");
    match &only_expression(&translation.unit).kind {
        ExpressionKind::BinaryOperator { operator, .. } => assert_eq!(operator, "&&"),
        other => panic!("Expected conjunction, got {other:?}"),
    }
}

#[test]
fn test_generic_call_in_expression() {
    let translation = translate_clean("Array<Set<Int>>()");
    match &only_expression(&translation.unit).kind {
        ExpressionKind::FunctionCall { callee, .. } => match &callee.kind {
            ExpressionKind::Identifier {
                name,
                generic_arguments: Some(arguments),
            } => {
                assert_eq!(name, "Array");
                assert_eq!(render_type(&arguments[0]), "Set<Int>");
            }
            other => panic!("Expected generic identifier, got {other:?}"),
        },
        other => panic!("Expected call, got {other:?}"),
    }
}

#[test]
fn test_folding_a_folded_tree_changes_nothing() {
    let translation = translate_clean(
        "var total = 0\nfor i in 0..<10 where i % 2 == 0 {\n  total += i * i\n}\nlet ok = total > 10 ? true : false",
    );
    let again = fold(translation.unit.clone(), &PrecedenceTable::standard());
    assert_eq!(again, translation.unit);
}

#[test]
fn test_custom_operator_declared_in_file() {
    let translation = translate_clean(
        "precedencegroup PowerPrecedence {\n  higherThan: MultiplicationPrecedence\n  associativity: right\n}\ninfix operator ** : PowerPrecedence\n2 * 3 ** 2",
    );
    let expression = match &translation.unit.statements[2].kind {
        StatementKind::Expression(expression) => expression,
        other => panic!("Expected expression statement, got {other:?}"),
    };
    match &expression.kind {
        ExpressionKind::BinaryOperator {
            operator, right, ..
        } => {
            assert_eq!(operator, "*");
            assert!(matches!(
                &right.kind,
                ExpressionKind::BinaryOperator { operator, .. } if operator == "**"
            ));
        }
        other => panic!("Expected multiplication, got {other:?}"),
    }
}

#[test]
fn test_lexical_parents_are_optional() {
    let translation = translate_clean("let x = f(1)");
    let parents = translation.parents.expect("parents assigned by default");
    let statement = &translation.unit.statements[0];
    assert_eq!(parents.parent_of(statement.id), Some(translation.unit.id));
    assert!(!parents.is_assigned(translation.unit.id));

    let file = SourceFile::in_memory("let x = f(1)");
    let mut pool = DiagnosticPool::new();
    let options = TranslationOptions {
        assign_parents: false,
        ..TranslationOptions::default()
    };
    let translation = translate(&file, &mut pool, &options).expect("Translation failed");
    assert!(translation.parents.is_none());
}

#[test]
fn test_tenth_error_stops_translation() {
    let source = "let x = 1 $\n".repeat(12);
    let file = SourceFile::in_memory(source);
    let mut pool = DiagnosticPool::new();

    let result = translate(&file, &mut pool, &TranslationOptions::default());
    assert!(matches!(result, Err(StopSignal)));
    assert_eq!(pool.error_count(), 10);
    assert!(!pool.has_fatal());
}

#[test]
fn test_lower_error_limit() {
    let file = SourceFile::in_memory("let x = 1 $\nlet y = 2 $\n");
    let mut pool = DiagnosticPool::with_limits(DiagnosticLimits {
        max_errors: 2,
        max_warnings: 50,
    });
    assert!(translate(&file, &mut pool, &TranslationOptions::default()).is_err());
    assert_eq!(pool.error_count(), 2);
}

#[test]
fn test_missing_declaration_name_is_fatal() {
    let file = SourceFile::in_memory("func (x: Int) {}");
    let mut pool = DiagnosticPool::new();

    let result = translate(&file, &mut pool, &TranslationOptions::default());
    assert!(result.is_err());
    assert!(pool.has_fatal());
}

#[test]
fn test_recoverable_error_keeps_the_tree() {
    let file = SourceFile::in_memory("let a = 1\nlet b = )\nlet c = 3");
    let mut pool = DiagnosticPool::new();

    let translation =
        translate(&file, &mut pool, &TranslationOptions::default()).expect("Translation failed");
    assert_eq!(pool.error_count(), 1);
    assert_eq!(translation.unit.statements.len(), 3);
}

#[test]
fn test_diagnostics_serialize_to_json() {
    let file = SourceFile::in_memory("let x = 1 $");
    let mut pool = DiagnosticPool::new();
    translate(&file, &mut pool, &TranslationOptions::default()).expect("Translation failed");

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    pool.report(&mut diagnostics);
    assert!(pool.is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);

    let json = serde_json::to_value(&diagnostics[0]).expect("serializable");
    assert_eq!(json["severity"], "error");
    assert_eq!(json["location"]["line"], 1);
    assert_eq!(json["location"]["column"], 11);
    assert!(json["message"].as_str().is_some_and(|m| m.contains('$')));
}

#[test]
fn test_checkpoint_restores_exact_contents() {
    let mut pool = DiagnosticPool::new();
    let at = SourceLocation::dummy();
    pool.append_error(ParserError::BareSuper, &at)
        .expect("below limit");

    let checkpoint = pool.checkpoint();
    pool.append_error(ParserError::MissingStatementSeparator, &at)
        .expect("below limit");
    assert_eq!(pool.len(), 2);

    assert!(pool.restore(checkpoint));
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.diagnostics()[0].message(), ParserError::BareSuper.to_string());
    assert!(!pool.restore(checkpoint));
    assert_eq!(pool.len(), 1);
}

#[test]
fn test_tokens_reconstruct_the_source() {
    let source = "/* header /* nested */ */\nimport Foundation\n\nlet name = \"Swift\" // inline\nprint(\"Hello, \\(name.uppercased())!\")\nlet x = 0x1F_FF + 1_000.5e-3\nlet s = \"\"\"\n    multi\n    line\n    \"\"\"\n";
    let file = SourceFile::in_memory(source);
    let tokens = Lexer::new(&file).tokenize();

    let rebuilt: String = tokens
        .iter()
        .map(|entry| file.text_in(&entry.range).expect("range inside file"))
        .collect();
    assert_eq!(rebuilt, source);
}

#[test]
fn test_emoji_identifier_translates() {
    let translation = translate_clean("let 🙂 = 1\n🙂 + 1");
    assert_eq!(translation.unit.statements.len(), 2);
}

#[test]
fn test_selector_argument_names_translate() {
    let translation = translate_clean("let action = #selector(ViewController.tapped(_:with:))");
    match &translation.unit.statements[0].kind {
        StatementKind::Declaration(Declaration {
            kind: DeclarationKind::Constant(initializers),
            ..
        }) => {
            let initializer = initializers[0].initializer.as_ref().expect("initializer");
            assert!(matches!(initializer.kind, ExpressionKind::Selector(_)));
        }
        other => panic!("Expected constant declaration, got {other:?}"),
    }
}

#[test]
fn test_nested_closure_literals_translate_quickly() {
    let depth = 25;
    let source = format!("let x = {}1{}", "{ [".repeat(depth), "] }".repeat(depth));
    let started = std::time::Instant::now();
    let translation = translate_clean(&source);
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
    assert_eq!(translation.unit.statements.len(), 1);
}
