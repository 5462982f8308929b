use super::{Expression, NodeId, Type};
use crate::source::SourceRange;

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub id: NodeId,
    pub range: SourceRange,
    pub kind: PatternKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    /// `_` with optional `: T`
    Wildcard { type_annotation: Option<Type> },
    /// `name` with optional `: T`
    Identifier {
        name: String,
        type_annotation: Option<Type>,
    },
    /// `let p` / `var p`
    ValueBinding { is_let: bool, pattern: Box<Pattern> },
    /// `(a, label: b)` with optional `: T`
    Tuple {
        elements: Vec<TuplePatternElement>,
        type_annotation: Option<Type>,
    },
    /// `.name(...)` or `Type.name(...)`
    EnumCase {
        type_identifier: Option<Type>,
        name: String,
        associated: Option<Box<Pattern>>,
    },
    /// `p?`
    Optional(Box<Pattern>),
    /// `is T`
    Is(Type),
    /// `p as T`
    As { pattern: Box<Pattern>, ty: Type },
    /// Any expression matched with `~=`
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuplePatternElement {
    pub label: Option<String>,
    pub pattern: Pattern,
}

impl Pattern {
    /// Names bound by this pattern, in source order.
    pub fn bound_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match &self.kind {
            PatternKind::Identifier { name, .. } => names.push(name),
            PatternKind::ValueBinding { pattern, .. } | PatternKind::Optional(pattern) => {
                pattern.collect_names(names)
            }
            PatternKind::As { pattern, .. } => pattern.collect_names(names),
            PatternKind::Tuple { elements, .. } => {
                for element in elements {
                    element.pattern.collect_names(names);
                }
            }
            PatternKind::EnumCase {
                associated: Some(pattern),
                ..
            } => pattern.collect_names(names),
            _ => {}
        }
    }
}
