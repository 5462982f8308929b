use super::{Attribute, NodeId, ThrowsKind};
use crate::source::SourceRange;

#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub id: NodeId,
    pub range: SourceRange,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// `A<B>.C`: one name per dot-separated component
    Identifier(Vec<TypeIdentifierName>),
    /// `[T]`
    Array(Box<Type>),
    /// `[K: V]`
    Dictionary { key: Box<Type>, value: Box<Type> },
    /// `T?`
    Optional(Box<Type>),
    /// `T!`
    ImplicitlyUnwrappedOptional(Box<Type>),
    /// `(label: T, U)`; `()` is the empty tuple
    Tuple(Vec<TupleTypeElement>),
    /// `(T) throws -> U`; the argument list is a tuple type
    Function {
        arguments: Vec<TupleTypeElement>,
        throws: ThrowsKind,
        result: Box<Type>,
    },
    /// `A & B`
    ProtocolComposition(Vec<Type>),
    /// `T.Type` / `T.Protocol`
    Metatype { base: Box<Type>, kind: MetatypeKind },
    Any,
    SelfType,
    /// `@escaping T`
    Attributed {
        attributes: Vec<Attribute>,
        base: Box<Type>,
    },
    /// `inout T` in a parameter position
    InOut(Box<Type>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeIdentifierName {
    pub name: String,
    pub generic_arguments: Option<Vec<Type>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleTypeElement {
    pub label: Option<String>,
    pub ty: Type,
    pub is_variadic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetatypeKind {
    Type,
    Protocol,
}

impl Type {
    /// Name components of a type identifier, `None` for other kinds.
    pub fn identifier_names(&self) -> Option<&[TypeIdentifierName]> {
        match &self.kind {
            TypeKind::Identifier(names) => Some(names),
            _ => None,
        }
    }
}
