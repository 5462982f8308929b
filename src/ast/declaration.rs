use super::{Attribute, CodeBlock, Expression, NodeId, Pattern, ThrowsKind, Type};
use crate::source::SourceRange;

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub id: NodeId,
    pub range: SourceRange,
    pub attributes: Vec<Attribute>,
    pub modifiers: Vec<DeclarationModifier>,
    pub kind: DeclarationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationKind {
    Import {
        kind: Option<ImportKind>,
        path: Vec<String>,
    },
    Constant(Vec<PatternInitializer>),
    Variable(VariableBody),
    TypeAlias {
        name: String,
        generic_parameters: Option<GenericParameterClause>,
        assignment: Type,
    },
    Function(FunctionDeclaration),
    Enum(TypeDeclaration),
    /// `case a, b(Int), c = 1` inside an enum
    EnumCase(Vec<EnumCaseElement>),
    Struct(TypeDeclaration),
    Class(TypeDeclaration),
    Protocol(TypeDeclaration),
    Extension {
        extended: Type,
        inheritance: Vec<Type>,
        where_clause: Vec<Requirement>,
        members: Vec<Declaration>,
    },
    Initializer {
        kind: InitializerKind,
        generic_parameters: Option<GenericParameterClause>,
        parameters: Vec<Parameter>,
        throws: ThrowsKind,
        where_clause: Vec<Requirement>,
        body: Option<CodeBlock>,
    },
    Deinitializer(CodeBlock),
    Subscript {
        generic_parameters: Option<GenericParameterClause>,
        parameters: Vec<Parameter>,
        result: Type,
        where_clause: Vec<Requirement>,
        accessors: AccessorBlock,
    },
    Operator {
        name: String,
        fixity: OperatorFixity,
        precedence_group: Option<String>,
    },
    PrecedenceGroup {
        name: String,
        attributes: Vec<PrecedenceGroupAttribute>,
    },
    AssociatedType {
        name: String,
        inheritance: Vec<Type>,
        default: Option<Type>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Private,
    FilePrivate,
    Internal,
    Public,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationModifier {
    Access(AccessLevel),
    /// `private(set)` and friends
    AccessSet(AccessLevel),
    Class,
    Convenience,
    Dynamic,
    Final,
    Indirect,
    Infix,
    Lazy,
    Mutating,
    Nonmutating,
    Optional,
    Override,
    Postfix,
    Prefix,
    Required,
    Static,
    Unowned,
    UnownedSafe,
    UnownedUnsafe,
    Weak,
}

impl DeclarationModifier {
    /// Modifiers spelled as plain identifiers.
    pub fn contextual(word: &str) -> Option<DeclarationModifier> {
        Some(match word {
            "convenience" => DeclarationModifier::Convenience,
            "dynamic" => DeclarationModifier::Dynamic,
            "final" => DeclarationModifier::Final,
            "indirect" => DeclarationModifier::Indirect,
            "infix" => DeclarationModifier::Infix,
            "lazy" => DeclarationModifier::Lazy,
            "mutating" => DeclarationModifier::Mutating,
            "nonmutating" => DeclarationModifier::Nonmutating,
            "optional" => DeclarationModifier::Optional,
            "override" => DeclarationModifier::Override,
            "postfix" => DeclarationModifier::Postfix,
            "prefix" => DeclarationModifier::Prefix,
            "required" => DeclarationModifier::Required,
            "unowned" => DeclarationModifier::Unowned,
            "weak" => DeclarationModifier::Weak,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Typealias,
    Struct,
    Class,
    Enum,
    Protocol,
    Var,
    Func,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternInitializer {
    pub pattern: Pattern,
    pub initializer: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariableBody {
    /// `var a = 1, b: Int`
    Initializers(Vec<PatternInitializer>),
    /// Computed, observed or protocol-requirement property
    Accessors {
        name: String,
        type_annotation: Option<Type>,
        initializer: Option<Expression>,
        accessors: AccessorBlock,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccessorBlock {
    /// `{ statements }` read-only getter shorthand
    Getter(CodeBlock),
    /// `get`/`set`/`willSet`/`didSet` clauses; bodies are absent in protocols
    Clauses(Vec<Accessor>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    pub kind: AccessorKind,
    pub attributes: Vec<Attribute>,
    pub modifiers: Vec<DeclarationModifier>,
    /// `set(newName)`
    pub parameter: Option<String>,
    pub body: Option<CodeBlock>,
    pub range: SourceRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Get,
    Set,
    WillSet,
    DidSet,
}

impl AccessorKind {
    pub fn lookup(word: &str) -> Option<AccessorKind> {
        Some(match word {
            "get" => AccessorKind::Get,
            "set" => AccessorKind::Set,
            "willSet" => AccessorKind::WillSet,
            "didSet" => AccessorKind::DidSet,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    /// Operator functions are named by their operator text
    pub is_operator: bool,
    pub generic_parameters: Option<GenericParameterClause>,
    pub parameters: Vec<Parameter>,
    pub throws: ThrowsKind,
    pub result: Option<Type>,
    pub where_clause: Vec<Requirement>,
    /// `None` for protocol requirements
    pub body: Option<CodeBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub external_name: Option<String>,
    pub local_name: String,
    pub type_annotation: Type,
    pub default_argument: Option<Expression>,
    pub is_variadic: bool,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericParameterClause {
    pub parameters: Vec<GenericParameter>,
    pub requirements: Vec<Requirement>,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericParameter {
    pub name: String,
    pub constraint: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    /// `T: P`
    Conformance(Type, Type),
    /// `T == U`
    SameType(Type, Type),
}

/// Shared shape of `struct`, `class`, `enum` and `protocol` declarations
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub name: String,
    pub generic_parameters: Option<GenericParameterClause>,
    pub inheritance: Vec<Type>,
    pub where_clause: Vec<Requirement>,
    pub members: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumCaseElement {
    pub name: String,
    /// Tuple type of the associated values
    pub associated: Option<Type>,
    pub raw_value: Option<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializerKind {
    Nonfailable,
    /// `init?`
    Optional,
    /// `init!`
    ImplicitlyUnwrapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorFixity {
    Prefix,
    Infix,
    Postfix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrecedenceGroupAttribute {
    HigherThan(Vec<String>),
    LowerThan(Vec<String>),
    Assignment(bool),
    Associativity(Associativity),
}
