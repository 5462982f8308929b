//! AST (Abstract Syntax Tree) definitions for Swift source
//!
//! Every construct is a record holding only its meaningful fields, a
//! [`SourceRange`] and a [`NodeId`]. The five node families are
//! [`Statement`], [`Declaration`], [`Expression`], [`Type`] and [`Pattern`],
//! rooted in one [`TopLevelDeclaration`] per file.
//!
//! Nodes carry no parent pointer. The enclosing construct of a node is
//! recorded after parsing in a side table, see
//! [`LexicalParents`](crate::lexical_parent::LexicalParents).
//!
//! Binary, ternary, cast and assignment chains come out of the parser as flat
//! [`ExpressionKind::Sequence`] nodes and are only nested by
//! [`folding`](crate::folding).

mod declaration;
mod expression;
mod pattern;
mod statement;
mod ty;
pub mod visit;

pub use declaration::*;
pub use expression::*;
pub use pattern::*;
pub use statement::*;
pub use ty::*;
pub use visit::{NodeRef, Visitor, VisitorMut};

use crate::parser::token::Token;
use crate::source::{Locatable, SourceRange};

/// Unique identifier for AST nodes within one translation unit
pub type NodeId = usize;

/// Root of one parsed file.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLevelDeclaration {
    pub id: NodeId,
    pub statements: Vec<Statement>,
    pub range: SourceRange,
    /// First id not yet handed out; later passes allocate from here.
    pub next_node_id: NodeId,
}

impl TopLevelDeclaration {
    /// Hand out a fresh node id.
    pub fn allocate_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }
}

/// `@name` or `@name(balanced tokens)`
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub arguments: Option<Vec<BalancedToken>>,
    pub range: SourceRange,
}

/// Raw token tree of an attribute argument or compiler-control condition.
#[derive(Debug, Clone, PartialEq)]
pub enum BalancedToken {
    Token(Token),
    Parens(Vec<BalancedToken>),
    Brackets(Vec<BalancedToken>),
    Braces(Vec<BalancedToken>),
}

impl BalancedToken {
    /// Source spelling of the tree with single spaces between tokens.
    pub fn spelling(tokens: &[BalancedToken]) -> String {
        let mut out = Vec::new();
        for token in tokens {
            out.push(match token {
                BalancedToken::Token(token) => token.spelling(),
                BalancedToken::Parens(inner) => format!("({})", Self::spelling(inner)),
                BalancedToken::Brackets(inner) => format!("[{}]", Self::spelling(inner)),
                BalancedToken::Braces(inner) => format!("{{{}}}", Self::spelling(inner)),
            });
        }
        out.join(" ")
    }
}

/// `try`, `try?` or `try!`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryKind {
    Try,
    Optional,
    Forced,
}

/// Whether a function, initializer or function type may throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThrowsKind {
    #[default]
    Nothrowing,
    Throwing,
    Rethrowing,
}

/// `{ statements }`
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub statements: Vec<Statement>,
    pub range: SourceRange,
}

macro_rules! locatable_nodes {
    ($($node:ty),*) => {
        $(
            impl Locatable for $node {
                fn source_range(&self) -> SourceRange {
                    self.range.clone()
                }
            }
        )*
    };
}

locatable_nodes!(
    TopLevelDeclaration,
    Statement,
    Declaration,
    Expression,
    Type,
    Pattern,
    Attribute,
    CodeBlock
);
