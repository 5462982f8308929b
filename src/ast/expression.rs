use super::{NodeId, Statement, ThrowsKind, TryKind, Type};
use crate::source::SourceRange;

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub id: NodeId,
    pub range: SourceRange,
    pub kind: ExpressionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Literal(Literal),
    InterpolatedString(Vec<InterpolatedSegment>),
    Array(Vec<Expression>),
    Dictionary(Vec<DictionaryEntry>),
    Magic(MagicLiteral),
    /// `name` or `name<T>`; operator names appear here when passed as values
    Identifier {
        name: String,
        generic_arguments: Option<Vec<Type>>,
    },
    /// `.name`
    ImplicitMember(String),
    SelfExpression(SelfForm),
    Super(SelfForm),
    Closure(Closure),
    Parenthesized(Box<Expression>),
    Tuple(Vec<TupleElement>),
    /// `_`, also the placeholder left behind by a malformed sequence
    Wildcard,
    /// `#selector(expr)`
    Selector(Box<Expression>),
    PrefixOperator {
        operator: String,
        operand: Box<Expression>,
    },
    /// `&name`
    InOut(String),
    Try {
        kind: TryKind,
        expression: Box<Expression>,
    },
    FunctionCall {
        callee: Box<Expression>,
        arguments: Vec<Argument>,
        trailing_closure: Option<Box<Expression>>,
    },
    ExplicitMember {
        base: Box<Expression>,
        member: Member,
    },
    /// `expr.self`
    PostfixSelf(Box<Expression>),
    /// `expr.init`
    Initializer(Box<Expression>),
    /// `name(label:_:)`, a function named by its argument labels; `_` is `None`
    ArgumentNames {
        base: Box<Expression>,
        names: Vec<Option<String>>,
    },
    Subscript {
        base: Box<Expression>,
        arguments: Vec<Argument>,
    },
    /// `expr?`
    OptionalChaining(Box<Expression>),
    /// `expr!`
    ForcedValue(Box<Expression>),
    PostfixOperator {
        operator: String,
        operand: Box<Expression>,
    },
    /// Type operand of a cast inside an unfolded sequence
    Type(Type),
    /// Unfolded operand/operator chain: odd length, operands at even indices
    Sequence(Vec<SequenceElement>),
    BinaryOperator {
        operator: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Assignment {
        target: Box<Expression>,
        value: Box<Expression>,
    },
    Ternary {
        condition: Box<Expression>,
        then_expression: Box<Expression>,
        else_expression: Box<Expression>,
    },
    TypeCasting {
        kind: CastKind,
        expression: Box<Expression>,
        ty: Type,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer { raw: String, radix: Radix },
    Float { raw: String, radix: Radix },
    String(String),
    Boolean(bool),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Binary,
    Octal,
    Decimal,
    Hexadecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpolatedSegment {
    Text(String),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryEntry {
    pub key: Expression,
    pub value: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicLiteral {
    File,
    Line,
    Column,
    Function,
}

/// Forms of `self` and `super` expressions
#[derive(Debug, Clone, PartialEq)]
pub enum SelfForm {
    /// Bare `self`
    Plain,
    /// `self.name`
    Member(String),
    /// `self[args]`
    Subscript(Vec<Argument>),
    /// `self.init`
    Initializer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub captures: Vec<Capture>,
    pub signature: Option<ClosureSignature>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub specifier: Option<CaptureSpecifier>,
    pub expression: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSpecifier {
    Weak,
    Unowned,
    UnownedSafe,
    UnownedUnsafe,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosureSignature {
    pub parameters: ClosureParameters,
    pub throws: ThrowsKind,
    pub result: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClosureParameters {
    /// `a, b in`
    Names(Vec<String>),
    /// `(a: Int, b) in`
    Clause(Vec<ClosureParameter>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosureParameter {
    pub name: String,
    pub type_annotation: Option<Type>,
    pub is_variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleElement {
    pub label: Option<String>,
    pub expression: Expression,
}

/// Call or subscript argument
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub label: Option<String>,
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Named {
        name: String,
        generic_arguments: Option<Vec<Type>>,
    },
    /// `tuple.0`
    TupleIndex(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceElement {
    Operand(Expression),
    Operator(SequenceOperator),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceOperator {
    Binary(String),
    /// `=`
    Assignment,
    /// `? middle :`
    Ternary(Box<Expression>),
    Cast(CastKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    Is,
    As,
    ConditionalAs,
    ForcedAs,
}

impl CastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CastKind::Is => "is",
            CastKind::As => "as",
            CastKind::ConditionalAs => "as?",
            CastKind::ForcedAs => "as!",
        }
    }
}

impl Expression {
    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, ExpressionKind::Sequence(_))
    }
}

/// Whether a sequence has the unfolded shape: odd length, operands at even
/// indices, operators at odd ones, with every cast followed by a type.
pub fn is_well_formed_sequence(elements: &[SequenceElement]) -> bool {
    if elements.len() % 2 == 0 {
        return false;
    }
    elements.iter().enumerate().all(|(i, element)| match element {
        SequenceElement::Operand(_) => i % 2 == 0,
        SequenceElement::Operator(op) => {
            i % 2 == 1
                && (!matches!(op, SequenceOperator::Cast(_))
                    || matches!(
                        elements.get(i + 1),
                        Some(SequenceElement::Operand(Expression {
                            kind: ExpressionKind::Type(_),
                            ..
                        }))
                    ))
        }
    })
}

