use super::{BalancedToken, CodeBlock, Declaration, Expression, NodeId, Pattern};
use crate::source::SourceRange;

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub id: NodeId,
    pub range: SourceRange,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Expression(Expression),
    Declaration(Declaration),
    ForIn {
        is_case: bool,
        pattern: Pattern,
        collection: Expression,
        where_clause: Option<Expression>,
        body: CodeBlock,
    },
    While {
        conditions: Vec<Condition>,
        body: CodeBlock,
    },
    RepeatWhile {
        body: CodeBlock,
        condition: Expression,
    },
    If {
        conditions: Vec<Condition>,
        then_block: CodeBlock,
        else_clause: Option<ElseClause>,
    },
    Guard {
        conditions: Vec<Condition>,
        body: CodeBlock,
    },
    Switch {
        subject: Expression,
        cases: Vec<SwitchCase>,
    },
    Break(Option<String>),
    Continue(Option<String>),
    Fallthrough,
    Return(Option<Expression>),
    Throw(Expression),
    Defer(CodeBlock),
    Do {
        body: CodeBlock,
        catches: Vec<CatchClause>,
    },
    Labeled {
        label: String,
        statement: Box<Statement>,
    },
    CompilerControl(CompilerControl),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseClause {
    Else(CodeBlock),
    /// `else if ...`, always an `If` statement
    ElseIf(Box<Statement>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Expression(Expression),
    /// `#available(...)` with its raw arguments
    Availability(Vec<BalancedToken>),
    /// `case pattern = expr`
    Case {
        pattern: Pattern,
        initializer: Expression,
    },
    /// `let x = expr` / `var x = expr`
    OptionalBinding {
        is_let: bool,
        pattern: Pattern,
        initializer: Expression,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub label: CaseLabel,
    pub statements: Vec<Statement>,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseLabel {
    Items(Vec<CaseItem>),
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseItem {
    pub pattern: Pattern,
    pub where_clause: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub pattern: Option<Pattern>,
    pub where_clause: Option<Expression>,
    pub body: CodeBlock,
    pub range: SourceRange,
}

/// `#if` family; conditions are kept as raw token trees.
#[derive(Debug, Clone, PartialEq)]
pub enum CompilerControl {
    If(Vec<BalancedToken>),
    ElseIf(Vec<BalancedToken>),
    Else,
    EndIf,
}
