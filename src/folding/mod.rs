//! Operator folding
//!
//! The parser leaves every chain of binary, assignment, ternary and cast
//! operators as a flat [`ExpressionKind::Sequence`]. [`fold`] rewrites each
//! of them, wherever it occurs in the tree, into nested
//! [`BinaryOperator`](ExpressionKind::BinaryOperator),
//! [`Assignment`](ExpressionKind::Assignment),
//! [`Ternary`](ExpressionKind::Ternary) and
//! [`TypeCasting`](ExpressionKind::TypeCasting) nodes.
//!
//! # Precedence groups
//!
//! Operators bind according to a [`PrecedenceTable`]: an ordered list of
//! named groups, lowest first, plus a map from operator spelling to group.
//! [`PrecedenceTable::standard`] holds the standard library groups:
//!
//! ```text
//! AssignmentPrecedence          right   =  *=  /=  %=  +=  -=  <<=  >>=  &=  |=  ^=
//! TernaryPrecedence             right   ?:
//! DefaultPrecedence             none    (operators without a group)
//! LogicalDisjunctionPrecedence  left    ||
//! LogicalConjunctionPrecedence  left    &&
//! ComparisonPrecedence          none    <  <=  >  >=  ==  !=  ===  !==  ~=
//! NilCoalescingPrecedence       right   ??
//! CastingPrecedence             none    is  as  as?  as!
//! RangeFormationPrecedence      none    ..<  ...
//! AdditionPrecedence            left    +  -  &+  &-  |  ^
//! MultiplicationPrecedence      left    *  /  %  &*  &
//! BitwiseShiftPrecedence        none    <<  >>  &<<  &>>
//! ```
//!
//! [`PrecedenceTable::with_declarations`] extends the table with the
//! `precedencegroup` and `infix operator` declarations of a file.
//!
//! # Algorithm
//!
//! Precedence climbing over the alternating operand/operator list. Right
//! associative groups climb at their own rank; left and non-associative
//! groups fold to the left. A cast wraps its left operand immediately with
//! the type that follows it. A sequence that does not alternate properly is
//! replaced by a [`Wildcard`](ExpressionKind::Wildcard) expression.

use crate::ast::visit::{walk_expression_mut, walk_top_level_mut};
use crate::ast::*;
use crate::source::SourceRange;
use rustc_hash::FxHashMap;
use std::iter::Peekable;
use std::vec::IntoIter;

pub const ASSIGNMENT_PRECEDENCE: &str = "AssignmentPrecedence";
pub const TERNARY_PRECEDENCE: &str = "TernaryPrecedence";
pub const DEFAULT_PRECEDENCE: &str = "DefaultPrecedence";
pub const CASTING_PRECEDENCE: &str = "CastingPrecedence";

/// A named precedence group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecedenceGroup {
    pub name: String,
    pub associativity: Associativity,
    /// Declared with `assignment: true`. Kept for consumers of the table;
    /// folding itself only looks at rank and associativity.
    pub assignment: bool,
}

impl PrecedenceGroup {
    pub fn new(name: impl Into<String>, associativity: Associativity) -> Self {
        Self {
            name: name.into(),
            associativity,
            assignment: false,
        }
    }
}

/// Ordered precedence groups and the operators that belong to them.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedenceTable {
    /// Lowest precedence first
    groups: Vec<PrecedenceGroup>,
    operators: FxHashMap<String, String>,
}

impl Default for PrecedenceTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl PrecedenceTable {
    /// The standard library groups and operators.
    pub fn standard() -> Self {
        use Associativity::{Left, None, Right};

        let mut assignment = PrecedenceGroup::new(ASSIGNMENT_PRECEDENCE, Right);
        assignment.assignment = true;
        let groups = vec![
            assignment,
            PrecedenceGroup::new(TERNARY_PRECEDENCE, Right),
            PrecedenceGroup::new(DEFAULT_PRECEDENCE, None),
            PrecedenceGroup::new("LogicalDisjunctionPrecedence", Left),
            PrecedenceGroup::new("LogicalConjunctionPrecedence", Left),
            PrecedenceGroup::new("ComparisonPrecedence", None),
            PrecedenceGroup::new("NilCoalescingPrecedence", Right),
            PrecedenceGroup::new(CASTING_PRECEDENCE, None),
            PrecedenceGroup::new("RangeFormationPrecedence", None),
            PrecedenceGroup::new("AdditionPrecedence", Left),
            PrecedenceGroup::new("MultiplicationPrecedence", Left),
            PrecedenceGroup::new("BitwiseShiftPrecedence", None),
        ];

        let members: [(&str, &[&str]); 10] = [
            (
                ASSIGNMENT_PRECEDENCE,
                &["=", "*=", "/=", "%=", "+=", "-=", "<<=", ">>=", "&=", "|=", "^="],
            ),
            ("LogicalDisjunctionPrecedence", &["||"]),
            ("LogicalConjunctionPrecedence", &["&&"]),
            (
                "ComparisonPrecedence",
                &["<", "<=", ">", ">=", "==", "!=", "===", "!==", "~="],
            ),
            ("NilCoalescingPrecedence", &["??"]),
            ("RangeFormationPrecedence", &["..<", "..."]),
            ("AdditionPrecedence", &["+", "-", "&+", "&-", "|", "^"]),
            ("MultiplicationPrecedence", &["*", "/", "%", "&*", "&"]),
            ("BitwiseShiftPrecedence", &["<<", ">>", "&<<", "&>>"]),
            (CASTING_PRECEDENCE, &[]),
        ];

        let mut table = Self {
            groups,
            operators: FxHashMap::default(),
        };
        for (group, operators) in members {
            for operator in operators {
                table.declare_operator(*operator, group);
            }
        }
        table
    }

    /// Groups from lowest to highest precedence.
    pub fn groups(&self) -> &[PrecedenceGroup] {
        &self.groups
    }

    pub fn rank_of(&self, group: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == group)
    }

    /// Group an infix operator belongs to; `DefaultPrecedence` when unknown.
    pub fn group_of(&self, operator: &str) -> &PrecedenceGroup {
        let rank = self.operator_rank(operator);
        &self.groups[rank]
    }

    pub fn declare_operator(&mut self, operator: impl Into<String>, group: impl Into<String>) {
        self.operators.insert(operator.into(), group.into());
    }

    /// Insert `group` above every group in `higher_than` and below every
    /// group in `lower_than`, as far as the existing order allows. Unknown
    /// relation names are ignored. Returns `false` if the name is taken.
    pub fn insert_group(
        &mut self,
        group: PrecedenceGroup,
        higher_than: &[String],
        lower_than: &[String],
    ) -> bool {
        if self.rank_of(&group.name).is_some() {
            return false;
        }
        let above = higher_than
            .iter()
            .filter_map(|name| self.rank_of(name))
            .max()
            .map(|rank| rank + 1);
        let below = lower_than.iter().filter_map(|name| self.rank_of(name)).min();

        let position = match (above, below) {
            (Some(above), Some(below)) => above.min(below),
            (Some(above), None) => above,
            (None, Some(below)) => below,
            (None, None) => self.default_rank() + 1,
        };
        self.groups.insert(position, group);
        true
    }

    /// Extend the table with the file-scope `precedencegroup` and
    /// `infix operator` declarations of `unit`. Groups may refer to groups
    /// declared later in the file.
    pub fn with_declarations(mut self, unit: &TopLevelDeclaration) -> Self {
        let mut pending = Vec::new();
        for statement in &unit.statements {
            let StatementKind::Declaration(declaration) = &statement.kind else {
                continue;
            };
            match &declaration.kind {
                DeclarationKind::PrecedenceGroup { name, attributes } => {
                    pending.push(GroupDeclaration::new(name, attributes));
                }
                DeclarationKind::Operator {
                    name,
                    fixity: OperatorFixity::Infix,
                    precedence_group,
                } => {
                    let group = precedence_group.as_deref().unwrap_or(DEFAULT_PRECEDENCE);
                    self.declare_operator(name.as_str(), group);
                }
                _ => {}
            }
        }

        // place groups whose relations are all known first, then the rest
        while !pending.is_empty() {
            let before = pending.len();
            pending.retain(|declaration| {
                if !declaration.relations().all(|name| self.rank_of(name).is_some()) {
                    return true;
                }
                self.insert_declared(declaration);
                false
            });
            if pending.len() == before {
                for declaration in &pending {
                    self.insert_declared(declaration);
                }
                break;
            }
        }
        self
    }

    fn insert_declared(&mut self, declaration: &GroupDeclaration) {
        self.insert_group(
            declaration.group.clone(),
            &declaration.higher_than,
            &declaration.lower_than,
        );
    }

    fn default_rank(&self) -> usize {
        self.rank_of(DEFAULT_PRECEDENCE).unwrap_or(0)
    }

    fn operator_rank(&self, operator: &str) -> usize {
        self.operators
            .get(operator)
            .and_then(|group| self.rank_of(group))
            .unwrap_or_else(|| self.default_rank())
    }

    /// Rank and associativity of a sequence operator.
    fn resolve(&self, operator: &SequenceOperator) -> (usize, Associativity) {
        let rank = match operator {
            SequenceOperator::Binary(name) => self.operator_rank(name),
            SequenceOperator::Assignment => self.operator_rank("="),
            SequenceOperator::Ternary(_) => self
                .rank_of(TERNARY_PRECEDENCE)
                .unwrap_or_else(|| self.default_rank()),
            SequenceOperator::Cast(_) => self
                .rank_of(CASTING_PRECEDENCE)
                .unwrap_or_else(|| self.default_rank()),
        };
        (rank, self.groups[rank].associativity)
    }
}

struct GroupDeclaration {
    group: PrecedenceGroup,
    higher_than: Vec<String>,
    lower_than: Vec<String>,
}

impl GroupDeclaration {
    fn new(name: &str, attributes: &[PrecedenceGroupAttribute]) -> Self {
        let mut declaration = Self {
            group: PrecedenceGroup::new(name, Associativity::None),
            higher_than: Vec::new(),
            lower_than: Vec::new(),
        };
        for attribute in attributes {
            match attribute {
                PrecedenceGroupAttribute::HigherThan(names) => {
                    declaration.higher_than.extend(names.iter().cloned())
                }
                PrecedenceGroupAttribute::LowerThan(names) => {
                    declaration.lower_than.extend(names.iter().cloned())
                }
                PrecedenceGroupAttribute::Assignment(flag) => declaration.group.assignment = *flag,
                PrecedenceGroupAttribute::Associativity(associativity) => {
                    declaration.group.associativity = *associativity
                }
            }
        }
        declaration
    }

    fn relations(&self) -> impl Iterator<Item = &String> {
        self.higher_than.iter().chain(self.lower_than.iter())
    }
}

/// Fold every sequence expression in `unit`.
pub fn fold(mut unit: TopLevelDeclaration, table: &PrecedenceTable) -> TopLevelDeclaration {
    let mut folder = Folder {
        table,
        next_node_id: unit.next_node_id,
    };
    walk_top_level_mut(&mut folder, &mut unit);
    unit.next_node_id = folder.next_node_id;
    unit
}

struct Folder<'t> {
    table: &'t PrecedenceTable,
    next_node_id: NodeId,
}

type Operators = Peekable<IntoIter<SequenceOperator>>;
type Operands = IntoIter<Expression>;

impl VisitorMut for Folder<'_> {
    fn visit_expression_mut(&mut self, expression: &mut Expression) {
        walk_expression_mut(self, expression);

        let ExpressionKind::Sequence(elements) = &mut expression.kind else {
            return;
        };
        let elements = std::mem::take(elements);
        let (id, range) = (expression.id, expression.range.clone());
        *expression = self.fold_sequence(elements, id, range);
    }
}

impl Folder<'_> {
    fn allocate_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    fn fold_sequence(
        &mut self,
        elements: Vec<SequenceElement>,
        id: NodeId,
        range: SourceRange,
    ) -> Expression {
        if !is_well_formed_sequence(&elements) {
            return Expression {
                id,
                range,
                kind: ExpressionKind::Wildcard,
            };
        }

        let mut operands = Vec::with_capacity(elements.len() / 2 + 1);
        let mut operators = Vec::with_capacity(elements.len() / 2);
        for element in elements {
            match element {
                SequenceElement::Operand(operand) => operands.push(operand),
                SequenceElement::Operator(operator) => operators.push(operator),
            }
        }

        let mut operands = operands.into_iter();
        let mut operators = operators.into_iter().peekable();
        let Some(first) = operands.next() else {
            return Expression {
                id,
                range,
                kind: ExpressionKind::Wildcard,
            };
        };

        let mut folded = self.climb(first, 0, &mut operators, &mut operands);
        folded.id = id;
        folded
    }

    fn climb(
        &mut self,
        mut lhs: Expression,
        min_rank: usize,
        operators: &mut Operators,
        operands: &mut Operands,
    ) -> Expression {
        while let Some(next) = operators.peek() {
            let (rank, associativity) = self.table.resolve(next);
            if rank < min_rank {
                break;
            }
            let Some(operator) = operators.next() else {
                break;
            };
            let Some(mut rhs) = operands.next() else {
                break;
            };

            if let SequenceOperator::Cast(kind) = operator {
                lhs = self.cast(lhs, kind, rhs);
                continue;
            }

            while let Some(next) = operators.peek() {
                let (next_rank, _) = self.table.resolve(next);
                if next_rank > rank {
                    rhs = self.climb(rhs, rank + 1, operators, operands);
                } else if next_rank == rank && associativity == Associativity::Right {
                    rhs = self.climb(rhs, rank, operators, operands);
                } else {
                    break;
                }
            }

            lhs = self.combine(lhs, operator, rhs);
        }
        lhs
    }

    fn combine(&mut self, lhs: Expression, operator: SequenceOperator, rhs: Expression) -> Expression {
        let range = SourceRange::spanning(&lhs.range, &rhs.range);
        let kind = match operator {
            SequenceOperator::Binary(operator) => ExpressionKind::BinaryOperator {
                operator,
                left: Box::new(lhs),
                right: Box::new(rhs),
            },
            SequenceOperator::Assignment => ExpressionKind::Assignment {
                target: Box::new(lhs),
                value: Box::new(rhs),
            },
            SequenceOperator::Ternary(middle) => ExpressionKind::Ternary {
                condition: Box::new(lhs),
                then_expression: middle,
                else_expression: Box::new(rhs),
            },
            SequenceOperator::Cast(kind) => return self.cast(lhs, kind, rhs),
        };
        Expression {
            id: self.allocate_id(),
            range,
            kind,
        }
    }

    fn cast(&mut self, lhs: Expression, kind: CastKind, rhs: Expression) -> Expression {
        let range = SourceRange::spanning(&lhs.range, &rhs.range);
        let ty = match rhs.kind {
            ExpressionKind::Type(ty) => ty,
            _ => Type {
                id: rhs.id,
                range: rhs.range,
                kind: TypeKind::Identifier(Vec::new()),
            },
        };
        Expression {
            id: self.allocate_id(),
            range,
            kind: ExpressionKind::TypeCasting {
                kind,
                expression: Box::new(lhs),
                ty,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::visit::{walk_expression, Visitor};
    use crate::diagnostic::DiagnosticPool;
    use crate::parser;
    use crate::source::{SourceFile, SourceLocation};

    fn parse(source: &str) -> TopLevelDeclaration {
        let mut pool = DiagnosticPool::new();
        let unit = parser::parse(&SourceFile::in_memory(source), &mut pool).expect("parse");
        assert!(pool.is_empty(), "unexpected diagnostics: {:?}", pool.diagnostics());
        unit
    }

    fn fold_source(source: &str) -> TopLevelDeclaration {
        let unit = parse(source);
        let table = PrecedenceTable::standard().with_declarations(&unit);
        fold(unit, &table)
    }

    /// Fully parenthesized rendering of a folded expression
    fn render(expression: &Expression) -> String {
        match &expression.kind {
            ExpressionKind::Literal(Literal::Integer { raw, .. }) => raw.clone(),
            ExpressionKind::Identifier { name, .. } => name.clone(),
            ExpressionKind::BinaryOperator {
                operator,
                left,
                right,
            } => format!("({} {} {})", render(left), operator, render(right)),
            ExpressionKind::Assignment { target, value } => {
                format!("({} = {})", render(target), render(value))
            }
            ExpressionKind::Ternary {
                condition,
                then_expression,
                else_expression,
            } => format!(
                "({} ? {} : {})",
                render(condition),
                render(then_expression),
                render(else_expression)
            ),
            ExpressionKind::TypeCasting { kind, expression, .. } => {
                format!("({} {} T)", render(expression), kind.as_str())
            }
            ExpressionKind::Wildcard => "_".to_string(),
            other => panic!("Unexpected expression in test: {other:?}"),
        }
    }

    fn first_expression(unit: &TopLevelDeclaration) -> &Expression {
        match unit.statements.last().map(|s| &s.kind) {
            Some(StatementKind::Expression(expression)) => expression,
            Some(StatementKind::Declaration(Declaration {
                kind: DeclarationKind::Constant(initializers),
                ..
            })) => initializers[0].initializer.as_ref().expect("initializer"),
            other => panic!("Expected expression statement, got {other:?}"),
        }
    }

    fn folded(source: &str) -> String {
        render(first_expression(&fold_source(source)))
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(folded("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(folded("1 * 2 + 3"), "((1 * 2) + 3)");
        assert_eq!(folded("a - b - c"), "((a - b) - c)");
    }

    #[test]
    fn test_assignment_and_ternary_are_right_associative() {
        assert_eq!(folded("a = b = c"), "(a = (b = c))");
        assert_eq!(folded("x = a ? b : c ? d : e"), "(x = (a ? b : (c ? d : e)))");
        assert_eq!(folded("x += 1 * 2"), "(x += (1 * 2))");
    }

    #[test]
    fn test_casts_and_nil_coalescing() {
        assert_eq!(folded("x as? T ?? 0"), "((x as? T) ?? 0)");
        assert_eq!(folded("a + b as T"), "((a + b) as T)");
        assert_eq!(folded("a ?? b ?? c"), "(a ?? (b ?? c))");
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(folded("a < b && c == d || e"), "(((a < b) && (c == d)) || e)");
        assert_eq!(folded("a..<b + 1"), "(a ..< (b + 1))");
    }

    #[test]
    fn test_unknown_operator_uses_default_group() {
        assert_eq!(folded("a <~> b + c"), "(a <~> (b + c))");
        assert_eq!(folded("a <~> b || c"), "(a <~> (b || c))");
    }

    #[test]
    fn test_custom_precedence_group() {
        let source = "precedencegroup Exponent {\n  higherThan: MultiplicationPrecedence\n  associativity: right\n}\ninfix operator ** : Exponent\nlet x = 2 * 3 ** 2 ** 2";
        assert_eq!(folded(source), "(2 * (3 ** (2 ** 2)))");
    }

    #[test]
    fn test_forward_referenced_groups() {
        let source = "precedencegroup B { higherThan: A }\nprecedencegroup A { higherThan: AdditionPrecedence }\ninfix operator +++ : B\ninfix operator *** : A\nlet x = a *** b +++ c";
        assert_eq!(folded(source), "(a *** (b +++ c))");
    }

    #[test]
    fn test_folded_ranges_span_operands() {
        let unit = fold_source("1 + 2 * 3");
        let expression = first_expression(&unit);
        assert_eq!(expression.range.start.column, 1);
        assert_eq!(expression.range.end.column, 10);
        match &expression.kind {
            ExpressionKind::BinaryOperator { right, .. } => {
                assert_eq!(right.range.start.column, 5);
                assert_eq!(right.range.end.column, 10);
            }
            other => panic!("Expected binary operator, got {other:?}"),
        }
    }

    #[test]
    fn test_root_keeps_sequence_id_and_new_ids_are_fresh() {
        let unit = parse("1 + 2 * 3");
        let sequence_id = first_expression(&unit).id;
        let next = unit.next_node_id;

        let unit = fold(unit, &PrecedenceTable::standard());
        let expression = first_expression(&unit);
        assert_eq!(expression.id, sequence_id);
        match &expression.kind {
            ExpressionKind::BinaryOperator { right, .. } => assert!(right.id >= next),
            other => panic!("Expected binary operator, got {other:?}"),
        }
        assert_eq!(unit.next_node_id, next + 2);
    }

    #[test]
    fn test_folding_is_idempotent() {
        let table = PrecedenceTable::standard();
        let once = fold(parse("let f = { a + b * c }\nx = f() ?? y"), &table);
        let twice = fold(once.clone(), &table);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_nested_sequences_are_folded() {
        struct NoSequences(usize);
        impl<'ast> Visitor<'ast> for NoSequences {
            fn visit_expression(&mut self, expression: &'ast Expression) {
                if expression.is_sequence() {
                    self.0 += 1;
                }
                walk_expression(self, expression);
            }
        }

        let unit = fold_source(
            "func f(x: Int = 1 + 2) -> Int {\n  let g = { (a: Int) in a * (x - 1) }\n  return g(x + 1) > 2 ? 1 : 0\n}",
        );
        let mut counter = NoSequences(0);
        crate::ast::visit::walk_top_level(&mut counter, &unit);
        assert_eq!(counter.0, 0);
    }

    #[test]
    fn test_malformed_sequence_becomes_wildcard() {
        let at = SourceLocation::dummy();
        let operand = |id| Expression {
            id,
            range: SourceRange::new(at.clone(), at.clone()),
            kind: ExpressionKind::Identifier {
                name: "a".to_string(),
                generic_arguments: None,
            },
        };
        let sequence = Expression {
            id: 7,
            range: SourceRange::new(at.clone(), at.clone()),
            kind: ExpressionKind::Sequence(vec![
                SequenceElement::Operand(operand(1)),
                SequenceElement::Operator(SequenceOperator::Binary("+".to_string())),
            ]),
        };
        let unit = TopLevelDeclaration {
            id: 0,
            statements: vec![Statement {
                id: 8,
                range: SourceRange::new(at.clone(), at),
                kind: StatementKind::Expression(sequence),
            }],
            range: SourceRange::empty(),
            next_node_id: 9,
        };

        let unit = fold(unit, &PrecedenceTable::standard());
        let expression = first_expression(&unit);
        assert_eq!(expression.id, 7);
        assert_eq!(expression.kind, ExpressionKind::Wildcard);
    }

    #[test]
    fn test_declared_group_attributes_are_recorded() {
        let unit = parse("precedencegroup Updating {\n  assignment: true\n  associativity: right\n  lowerThan: TernaryPrecedence\n}");
        let table = PrecedenceTable::standard().with_declarations(&unit);
        let rank = table.rank_of("Updating").expect("declared");
        let group = &table.groups()[rank];
        assert!(group.assignment);
        assert_eq!(group.associativity, Associativity::Right);
        assert!(rank < table.rank_of(TERNARY_PRECEDENCE).expect("standard"));
        assert!(table.groups()[0].assignment);
    }

    #[test]
    fn test_insert_group_respects_relations() {
        let mut table = PrecedenceTable::standard();
        let inserted = table.insert_group(
            PrecedenceGroup::new("Between", Associativity::Left),
            &["AdditionPrecedence".to_string()],
            &["MultiplicationPrecedence".to_string()],
        );
        assert!(inserted);
        let rank = table.rank_of("Between").expect("inserted");
        assert!(rank > table.rank_of("AdditionPrecedence").expect("standard"));
        assert!(rank < table.rank_of("MultiplicationPrecedence").expect("standard"));
        assert!(!table.insert_group(
            PrecedenceGroup::new("Between", Associativity::Left),
            &[],
            &[]
        ));
        assert_eq!(table.group_of("<~>").name, DEFAULT_PRECEDENCE);
    }
}
